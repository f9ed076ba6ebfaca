// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit reports in Rust.
//!
//! This crate reads the subset of the JUnit XML format that build tools like Gradle and Maven
//! Surefire emit: `<testsuites>`, `<testsuite>` and `<testcase>` elements, along with the status
//! markers nested inside test cases. Output sections and properties are skipped.

mod deserialize;
mod errors;
mod report;

pub use errors::*;
pub use report::*;
