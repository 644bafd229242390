// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction of TestRail identifiers from test titles.
//!
//! Tests are linked to TestRail through their titles:
//!
//! * case ids are written as `C<digits>` or `TC<digits>` anywhere in the title, and a single test
//!   may reference several cases;
//! * the suite is written as `S<digits>` or `TS<digits>` somewhere in the full title (usually in
//!   the name of an enclosing `describe` block);
//! * the browser the test ran in is embedded in the full title as `<-browser->`.

use crate::errors::ParseError;
use regex::Regex;
use std::{fmt, sync::LazyLock};
use testrail_metadata::{CaseId, IdParseError, SuiteId};
use tracing::warn;

// Word boundaries are ASCII-only: `éC12` references case 12.
static CASE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)T?C([0-9]+)(?-u:\b)").expect("case id regex is valid")
});

static SUITE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)T?S[0-9]+(?-u:\b)").expect("suite id regex is valid")
});

static BROWSER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<-(.*)->").expect("browser regex is valid"));

/// Returns every case id referenced by `title`, in order of appearance.
///
/// Tokens whose numeric part is zero or does not fit in a `u64` are skipped.
pub fn extract_case_ids(title: &str) -> Vec<CaseId> {
    CASE_ID_REGEX
        .captures_iter(title)
        .filter_map(|captures| captures[1].parse::<u64>().ok())
        .filter(|&id| id != 0)
        .map(CaseId::new)
        .collect()
}

/// Returns the first suite token in `full_title`, verbatim.
///
/// Logs a warning if none is present; callers are expected to fall back to a configured suite.
pub fn extract_suite_token(full_title: &str) -> Option<SuiteToken> {
    match SUITE_ID_REGEX.find(full_title) {
        Some(m) => Some(SuiteToken::new(m.as_str())),
        None => {
            warn!("suite id is not detected in test name `{full_title}`");
            None
        }
    }
}

/// Returns the browser label enclosed in `<-` and `->` in `full_title`.
///
/// Unlike the suite token, the browser label is mandatory for any event that gets reported, so
/// its absence is an error.
pub fn extract_browser_name(full_title: &str) -> Result<&str, ParseError> {
    BROWSER_REGEX
        .captures(full_title)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ParseError::BrowserNameNotFound {
            full_title: full_title.to_owned(),
        })
}

/// A suite reference as written in a test title or in the configuration, e.g. `S10` or `TS10`.
///
/// Results are bucketed by the token verbatim, so `S10` and `TS10` form separate buckets even
/// though they refer to the same suite.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SuiteToken(String);

impl SuiteToken {
    /// Creates a new suite token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric suite id, with any leading marker characters stripped.
    pub fn suite_id(&self) -> Result<SuiteId, ParseError> {
        parse_suite_digits(&self.0).map_err(|err| ParseError::InvalidSuiteToken {
            token: self.0.clone(),
            err,
        })
    }
}

/// Parses the suite id of a token, ignoring leading non-digit characters.
pub(crate) fn parse_suite_digits(token: &str) -> Result<SuiteId, IdParseError> {
    token
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse()
}

impl fmt::Display for SuiteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
