// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{SplitterExitCode, output::NO_HEADING_TARGET, output::StderrStyles};
use owo_colors::OwoColorize;
use splitter_runner::errors::{ConfigParseError, NodeSpecError, SplitError};
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error: one caused by the environment or the input rather than by a bug.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("invalid node")]
    NodeSpecError {
        #[from]
        err: NodeSpecError,
    },
    #[error("split failed")]
    SplitError {
        #[from]
        err: SplitError,
    },
    #[error("writing output failed")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::NodeSpecError { .. } => {
                SplitterExitCode::SETUP_ERROR
            }
            Self::SplitError { err } => match err {
                SplitError::Discovery(_) | SplitError::ReportRead(_) => {
                    SplitterExitCode::DISCOVERY_FAILED
                }
                SplitError::Packing(_) => SplitterExitCode::PACKING_DEFECT,
                SplitError::EmptyTestPath => SplitterExitCode::SETUP_ERROR,
                _ => SplitterExitCode::SETUP_ERROR,
            },
            Self::WriteOutputError { .. } => SplitterExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse test-splitter config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::NodeSpecError { err } => {
                error!("{err}");
                err.source()
            }
            Self::SplitError { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output to stdout");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitter_runner::errors::PackingError;
    use test_case::test_case;

    #[test_case(
        NodeSpecError::InvalidTotal { node_total: 0 }.into(),
        SplitterExitCode::SETUP_ERROR
        ; "invalid node"
    )]
    #[test_case(SplitError::EmptyTestPath.into(), SplitterExitCode::SETUP_ERROR ; "empty test path")]
    #[test_case(
        SplitError::from(PackingError::Unconsumed { remaining: 1 }).into(),
        SplitterExitCode::PACKING_DEFECT
        ; "packing defect"
    )]
    #[test_case(
        ExpectedError::write_output_error(std::io::ErrorKind::BrokenPipe.into()),
        SplitterExitCode::WRITE_OUTPUT_ERROR
        ; "write output"
    )]
    fn exit_codes(error: ExpectedError, expected: i32) {
        assert_eq!(error.process_exit_code(), expected);
    }
}
