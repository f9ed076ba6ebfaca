// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `test-splitter` failures.
///
/// `test-splitter` may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum SplitterExitCode {}

impl SplitterExitCode {
    /// No errors occurred and test-splitter exited normally.
    pub const OK: i32 = 0;

    /// A user issue happened while setting up a test-splitter invocation: an invalid node index
    /// or total, an empty test path, or an invalid config file.
    pub const SETUP_ERROR: i32 = 96;

    /// Test sources or test reports could not be discovered or read.
    pub const DISCOVERY_FAILED: i32 = 104;

    /// The timing-aware balancer failed to assign every test. This indicates a bug.
    pub const PACKING_DEFECT: i32 = 105;

    /// Writing data to stdout produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
