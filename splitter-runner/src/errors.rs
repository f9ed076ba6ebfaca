// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by test-splitter.

use crate::helpers::plural;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse test-splitter config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An invalid node index or node total was supplied.
///
/// These indicate a mistake in how the tool was invoked, not a problem with the tests.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum NodeSpecError {
    /// The node index was negative.
    #[error("invalid node-index: {node_index}")]
    InvalidIndex {
        /// The node index that was passed in.
        node_index: i64,
    },

    /// The node total was zero or negative.
    #[error("invalid node-total: {node_total}")]
    InvalidTotal {
        /// The node total that was passed in.
        node_total: i64,
    },

    /// The node index was not less than the node total.
    #[error("invalid node-index: {node_index} is out of bounds, node-total: {node_total}")]
    IndexOutOfBounds {
        /// The node index that was passed in.
        node_index: i64,

        /// The node total that was passed in.
        node_total: i64,
    },
}

/// An error that occurred while looking for test sources or test reports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// A glob pattern failed to compile.
    #[error("invalid {kind} pattern `{pattern}`")]
    InvalidPattern {
        /// What the pattern was used for.
        kind: &'static str,

        /// The pattern as written.
        pattern: String,

        /// The underlying error.
        #[source]
        err: globset::Error,
    },

    /// An error occurred while walking a directory.
    #[error("error reading files from `{root}`")]
    Walk {
        /// The directory being walked.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: walkdir::Error,
    },

    /// A path under the root was not valid UTF-8.
    #[error("error reading files from `{root}`: path `{}` is not valid UTF-8", .path.display())]
    NonUtf8Path {
        /// The directory being walked.
        root: Utf8PathBuf,

        /// The offending path.
        path: PathBuf,
    },
}

/// An error that occurred while reading timings out of a JUnit report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportReadError {
    /// The report file could not be opened.
    #[error("failed to open test report `{path}`")]
    Open {
        /// The report file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The report file was not valid JUnit XML.
    #[error("failed to parse test report `{path}`")]
    Parse {
        /// The report file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: junit_report::DeserializeError,
    },
}

/// The timing-aware balancer broke one of its own invariants.
///
/// This indicates a bug in the balancer, not bad input.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum PackingError {
    /// The final shard did not consume all remaining tests.
    #[error(
        "{remaining} {} not consumed by the final shard",
        plural::tests_were_str(*.remaining)
    )]
    Unconsumed {
        /// The number of tests left over.
        remaining: usize,
    },

    /// No shard was produced for the requested node.
    #[error("unable to create tests for node-index {node_index} (node-total {node_total})")]
    NoMatchingShard {
        /// The requested node index.
        node_index: usize,

        /// The total number of shards produced.
        node_total: usize,
    },
}

/// An error that occurred while computing the tests for a node.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SplitError {
    /// The test path was empty.
    #[error("test path must not be empty")]
    EmptyTestPath,

    /// Test sources or reports could not be discovered.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A test report could not be read.
    #[error(transparent)]
    ReportRead(#[from] ReportReadError),

    /// The balancer failed to produce a valid shard.
    #[error(transparent)]
    Packing(#[from] PackingError),
}
