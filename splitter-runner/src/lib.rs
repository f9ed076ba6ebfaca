// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for test-splitter.
//!
//! test-splitter divides the test classes of a Gradle project across a fixed number of CI nodes.
//! When JUnit XML reports from a previous run are available and cover every test class, tests are
//! packed into shards of roughly equal total duration; otherwise test classes are assigned
//! round-robin.
//!
//! The basic flow is:
//!
//! 1. [`discovery`] finds test sources and report files.
//! 2. [`sync`] decides whether the reports can be trusted.
//! 3. [`partition`] produces the shard for this node.
//!
//! [`split`] ties these together.

pub mod config;
pub mod discovery;
pub mod errors;
mod helpers;
pub mod partition;
pub mod record;
pub mod split;
pub mod sync;
