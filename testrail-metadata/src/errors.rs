// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{error, fmt, num::ParseIntError};

/// An error that occurs while parsing an identifier such as [`CaseId`](crate::CaseId) from a
/// string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdParseError {
    /// The input was empty once its prefix was removed.
    Empty {
        /// The kind of identifier being parsed.
        kind: &'static str,
    },

    /// The numeric part of the input was not a valid integer.
    InvalidNumber {
        /// The kind of identifier being parsed.
        kind: &'static str,

        /// The input that failed to parse.
        input: String,

        /// The underlying error.
        err: ParseIntError,
    },

    /// The identifier was zero. TestRail identifiers start at 1.
    Zero {
        /// The kind of identifier being parsed.
        kind: &'static str,
    },
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} is empty"),
            Self::InvalidNumber { kind, input, .. } => {
                write!(f, "{kind} `{input}` is not a valid number")
            }
            Self::Zero { kind } => write!(f, "{kind} must be greater than zero"),
        }
    }
}

impl error::Error for IdParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Empty { .. } | Self::Zero { .. } => None,
            Self::InvalidNumber { err, .. } => Some(err),
        }
    }
}

/// An error that occurs while converting a numeric status id into a
/// [`ResultStatus`](crate::ResultStatus).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStatusError {
    status_id: u64,
}

impl UnknownStatusError {
    pub(crate) fn new(status_id: u64) -> Self {
        Self { status_id }
    }

    /// Returns the status id that was not recognized.
    pub fn status_id(&self) -> u64 {
        self.status_id
    }
}

impl fmt::Display for UnknownStatusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown result status id {}", self.status_id)
    }
}

impl error::Error for UnknownStatusError {}
