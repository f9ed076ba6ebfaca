// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Split Gradle test classes across CI nodes.
//!
//! This crate contains the `test-splitter` command-line interface. The splitting logic lives in
//! [`splitter_runner`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::SplitterExitCode;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
