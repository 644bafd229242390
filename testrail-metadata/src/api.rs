// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{IdParseError, UnknownStatusError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal, prefixes = [$($prefix:literal),*]) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from its numeric value.
            #[inline]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the numeric value of this identifier.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_id($kind, s, &[$($prefix),*]).map(Self)
            }
        }
    };
}

define_id!(
    /// The identifier of a test case, written as `C<digits>` (or `TC<digits>`) in test titles.
    CaseId,
    "case id",
    prefixes = ["TC", "C"]
);

define_id!(
    /// The identifier of a test suite, written as `S<digits>` (or `TS<digits>`) in test titles.
    SuiteId,
    "suite id",
    prefixes = ["TS", "S"]
);

define_id!(
    /// The identifier of a test run.
    RunId,
    "run id",
    prefixes = ["R"]
);

define_id!(
    /// The identifier of a project.
    ProjectId,
    "project id",
    prefixes = ["P"]
);

define_id!(
    /// The identifier of a section within a suite.
    SectionId,
    "section id",
    prefixes = []
);

define_id!(
    /// The identifier of a user, used as the assignee of created runs.
    UserId,
    "user id",
    prefixes = []
);

impl CaseId {
    /// Returns the tag used to reference this case in a test title, e.g. `C42`.
    pub fn title_tag(self) -> String {
        format!("C{}", self.0)
    }
}

fn parse_id(kind: &'static str, input: &str, prefixes: &[&str]) -> Result<u64, IdParseError> {
    let trimmed = input.trim();
    let digits = prefixes
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(IdParseError::Empty { kind });
    }
    let id: u64 = digits
        .parse()
        .map_err(|err| IdParseError::InvalidNumber {
            kind,
            input: input.to_owned(),
            err,
        })?;
    if id == 0 {
        return Err(IdParseError::Zero { kind });
    }
    Ok(id)
}

/// The status of a single test result.
///
/// TestRail's built-in statuses. The reporter only produces [`Passed`](Self::Passed),
/// [`Failed`](Self::Failed) and [`Retest`](Self::Retest); skipped tests are reported as
/// needing a retest.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResultStatus {
    /// The test passed.
    Passed,
    /// The test is blocked.
    Blocked,
    /// The test has not been run yet.
    Untested,
    /// The test needs to be retested.
    Retest,
    /// The test failed.
    Failed,
}

impl ResultStatus {
    /// Returns the numeric status id used on the wire.
    pub const fn id(self) -> u64 {
        match self {
            Self::Passed => 1,
            Self::Blocked => 2,
            Self::Untested => 3,
            Self::Retest => 4,
            Self::Failed => 5,
        }
    }

    /// Converts a numeric status id into a status.
    pub fn from_id(id: u64) -> Result<Self, UnknownStatusError> {
        match id {
            1 => Ok(Self::Passed),
            2 => Ok(Self::Blocked),
            3 => Ok(Self::Untested),
            4 => Ok(Self::Retest),
            5 => Ok(Self::Failed),
            other => Err(UnknownStatusError::new(other)),
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Blocked => write!(f, "blocked"),
            Self::Untested => write!(f, "untested"),
            Self::Retest => write!(f, "retest"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl Serialize for ResultStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.id())
    }
}

impl<'de> Deserialize<'de> for ResultStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = u64::deserialize(deserializer)?;
        Self::from_id(id).map_err(serde::de::Error::custom)
    }
}

/// A single entry of an `add_results_for_cases` request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// The case this result applies to.
    pub case_id: CaseId,
    /// The status of the result.
    pub status_id: ResultStatus,
    /// A free-form comment attached to the result.
    pub comment: String,
}

/// The body of an `add_results_for_cases` request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddResultsForCases {
    /// The results to add, in submission order.
    pub results: Vec<CaseResult>,
}

/// The body of an `add_run` request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddRun {
    /// The suite the run is created for.
    pub suite_id: SuiteId,
    /// The name of the run.
    pub name: String,
    /// The description of the run.
    pub description: String,
    /// The user the run is assigned to, if any.
    #[serde(rename = "assignedto_id", skip_serializing_if = "Option::is_none", default)]
    pub assigned_to_id: Option<UserId>,
    /// Whether the run includes every case of the suite.
    pub include_all: bool,
}

/// The fields of a run returned by `add_run` that the reporter reads.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The identifier of the run.
    pub id: RunId,
    /// The name of the run.
    #[serde(default)]
    pub name: Option<String>,
    /// The web URL of the run.
    #[serde(default)]
    pub url: Option<String>,
}

/// A suite as returned by `get_suites`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// The identifier of the suite.
    pub id: SuiteId,
    /// The name of the suite. May be absent or null.
    #[serde(default)]
    pub name: Option<String>,
}

/// A section as returned by `get_sections` and `add_section`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// The identifier of the section.
    pub id: SectionId,
    /// The name of the section.
    pub name: String,
    /// The suite the section belongs to.
    #[serde(default)]
    pub suite_id: Option<SuiteId>,
    /// The parent section, if this is a nested section.
    #[serde(default)]
    pub parent_id: Option<SectionId>,
}

/// The response of `get_sections`.
///
/// Older TestRail versions return a bare array; newer ones return a paginated object.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SectionsResponse {
    /// A bare array of sections.
    List(Vec<SectionSummary>),
    /// A paginated response.
    Paginated {
        /// The sections on this page.
        sections: Vec<SectionSummary>,
    },
}

impl SectionsResponse {
    /// Returns the sections contained in this response.
    pub fn into_sections(self) -> Vec<SectionSummary> {
        match self {
            Self::List(sections) | Self::Paginated { sections } => sections,
        }
    }
}

/// The body of an `add_section` request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddSection {
    /// The suite to add the section to.
    pub suite_id: SuiteId,
    /// The name of the section.
    pub name: String,
    /// The parent section, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<SectionId>,
}

/// The body of an `add_case` request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddCase {
    /// The title of the case.
    pub title: String,
}

/// A case as returned by `add_case`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    /// The identifier of the case.
    pub id: CaseId,
    /// The title of the case.
    pub title: String,
    /// The section the case was added to.
    #[serde(default)]
    pub section_id: Option<SectionId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("C42", 42 ; "plain prefix")]
    #[test_case("TC42", 42 ; "t prefix")]
    #[test_case("42", 42 ; "no prefix")]
    #[test_case(" C7 ", 7 ; "surrounding whitespace")]
    fn case_id_from_str(input: &str, expected: u64) {
        assert_eq!(input.parse::<CaseId>(), Ok(CaseId::new(expected)));
    }

    #[test]
    fn id_parse_errors() {
        assert_eq!(
            "C".parse::<CaseId>(),
            Err(IdParseError::Empty { kind: "case id" })
        );
        assert_eq!(
            "S0".parse::<SuiteId>(),
            Err(IdParseError::Zero { kind: "suite id" })
        );
        let err = "Sx1".parse::<SuiteId>().unwrap_err();
        assert!(
            matches!(err, IdParseError::InvalidNumber { ref input, .. } if input == "Sx1"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn result_status_wire_format() {
        let result = CaseResult {
            case_id: CaseId::new(3),
            status_id: ResultStatus::Retest,
            comment: "Logout".to_owned(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"case_id": 3, "status_id": 4, "comment": "Logout"})
        );

        let err = serde_json::from_value::<ResultStatus>(serde_json::json!(9)).unwrap_err();
        assert!(err.to_string().contains("unknown result status id 9"));
    }

    #[test]
    fn add_run_omits_missing_assignee() {
        let body = AddRun {
            suite_id: SuiteId::new(10),
            name: "run".to_owned(),
            description: "desc".to_owned(),
            assigned_to_id: None,
            include_all: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "suite_id": 10,
                "name": "run",
                "description": "desc",
                "include_all": true,
            })
        );

        let body = AddRun {
            assigned_to_id: Some(UserId::new(5)),
            ..body
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap()["assignedto_id"],
            serde_json::json!(5)
        );
    }

    #[test]
    fn sections_response_shapes() {
        let bare: SectionsResponse =
            serde_json::from_str(r#"[{"id": 1, "name": "Login", "suite_id": 10}]"#).unwrap();
        let paginated: SectionsResponse = serde_json::from_str(
            r#"{"offset": 0, "limit": 250, "sections": [{"id": 1, "name": "Login", "suite_id": 10}]}"#,
        )
        .unwrap();
        assert_eq!(bare.into_sections(), paginated.into_sections());
    }
}
