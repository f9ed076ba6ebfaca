// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use quick_xml::events::attributes::AttrError;
use std::{num::ParseFloatError, time::TryFromFloatSecsError};
use thiserror::Error;

/// An error that occurs while reading a [`Report`](crate::Report).
///
/// Returned by [`Report::deserialize`](crate::Report::deserialize) and
/// [`Report::from_xml_str`](crate::Report::from_xml_str).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The underlying XML was malformed or could not be read.
    #[error("error reading JUnit XML")]
    Xml(#[from] quick_xml::Error),

    /// An attribute on an element could not be parsed.
    #[error("malformed attribute in <{element}>")]
    Attribute {
        /// The element the attribute belongs to.
        element: &'static str,

        /// The underlying error.
        #[source]
        err: AttrError,
    },

    /// A required attribute was not present.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element the attribute was expected on.
        element: &'static str,

        /// The name of the attribute.
        attribute: &'static str,
    },

    /// A `time` attribute was not a valid non-negative number of seconds.
    #[error("invalid time `{input}` in <{element}>")]
    InvalidTime {
        /// The element the attribute belongs to.
        element: &'static str,

        /// The raw attribute value.
        input: String,

        /// The underlying error.
        #[source]
        err: TimeParseError,
    },

    /// The document ended while an element was still open.
    #[error("unexpected end of document inside <{element}>")]
    UnexpectedEof {
        /// The innermost element that was still open.
        element: &'static str,
    },
}

/// The reason a `time` attribute failed to parse.
#[derive(Debug, Error)]
pub enum TimeParseError {
    /// The value was not a floating-point number.
    #[error(transparent)]
    Float(#[from] ParseFloatError),

    /// The value was negative, not finite, or too large.
    #[error(transparent)]
    OutOfRange(#[from] TryFromFloatSecsError),
}
