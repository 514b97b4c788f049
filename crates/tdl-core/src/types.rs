use crate::error::TdlError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// DocType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Analysis,
    Requirement,
    Adr,
    Task,
}

impl DocType {
    pub fn all() -> &'static [DocType] {
        &[
            DocType::Analysis,
            DocType::Requirement,
            DocType::Adr,
            DocType::Task,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Analysis => "analysis",
            DocType::Requirement => "requirement",
            DocType::Adr => "adr",
            DocType::Task => "task",
        }
    }

    /// Plural label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            DocType::Analysis => "Analyses",
            DocType::Requirement => "Requirements",
            DocType::Adr => "ADRs",
            DocType::Task => "Tasks",
        }
    }

    /// Subdirectory of `docs/` holding documents of this type.
    pub fn dir_name(self) -> &'static str {
        match self {
            DocType::Analysis => "analysis",
            DocType::Requirement => "requirements",
            DocType::Adr => "adr",
            DocType::Task => "tasks",
        }
    }

    pub fn prefixes(self) -> &'static [Prefix] {
        match self {
            DocType::Analysis => &[Prefix::An],
            DocType::Requirement => &[Prefix::Fr, Prefix::Nfr],
            DocType::Adr => &[Prefix::Adr],
            DocType::Task => &[Prefix::T],
        }
    }

    /// Legal status values, in lifecycle order.
    pub fn statuses(self) -> &'static [&'static str] {
        match self {
            DocType::Analysis => &["Draft", "Active", "Complete", "Archived"],
            DocType::Requirement => &[
                "Proposed",
                "Accepted",
                "Implemented",
                "Verified",
                "Deprecated",
            ],
            DocType::Adr => &["Proposed", "Accepted", "Rejected", "Deprecated", "Superseded"],
            DocType::Task => &[
                "Draft",
                "Not Started",
                "In Progress",
                "Blocked",
                "Under Review",
                "Completed",
            ],
        }
    }

    /// Whether `status` is a legal value for this type. Matching is
    /// case-insensitive; ADRs accept `Superseded by ADR-xxxxx` and tasks accept
    /// `Phase N In Progress`.
    pub fn is_known_status(self, status: &str) -> bool {
        let status = status.trim();
        if self
            .statuses()
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status))
        {
            return true;
        }
        let lower = status.to_ascii_lowercase();
        match self {
            DocType::Adr => lower.starts_with("superseded by "),
            DocType::Task => phase_status_re().is_match(status),
            _ => false,
        }
    }
}

static PHASE_STATUS_RE: OnceLock<Regex> = OnceLock::new();

fn phase_status_re() -> &'static Regex {
    PHASE_STATUS_RE.get_or_init(|| Regex::new(r"(?i)^phase\s+\d+\s+in\s+progress$").unwrap())
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocType {
    type Err = TdlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "analysis" | "an" => Ok(DocType::Analysis),
            "requirement" | "fr" | "nfr" => Ok(DocType::Requirement),
            "adr" => Ok(DocType::Adr),
            "task" | "t" => Ok(DocType::Task),
            _ => Err(TdlError::InvalidKind {
                what: "document type",
                value: s.to_string(),
                expected: "analysis, requirement, adr, task",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Prefix
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Prefix {
    An,
    Fr,
    Nfr,
    Adr,
    T,
}

impl Prefix {
    pub fn all() -> &'static [Prefix] {
        &[Prefix::An, Prefix::Fr, Prefix::Nfr, Prefix::Adr, Prefix::T]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::An => "AN",
            Prefix::Fr => "FR",
            Prefix::Nfr => "NFR",
            Prefix::Adr => "ADR",
            Prefix::T => "T",
        }
    }

    pub fn doc_type(self) -> DocType {
        match self {
            Prefix::An => DocType::Analysis,
            Prefix::Fr | Prefix::Nfr => DocType::Requirement,
            Prefix::Adr => DocType::Adr,
            Prefix::T => DocType::Task,
        }
    }

    /// Human-readable type name written into the Metadata `Type` field.
    pub fn type_name(self) -> &'static str {
        match self {
            Prefix::An => "Analysis",
            Prefix::Fr => "Functional Requirement",
            Prefix::Nfr => "Non-Functional Requirement",
            Prefix::Adr => "ADR",
            Prefix::T => "Task",
        }
    }

    /// Match a prefix at the start of a file or directory name (`FR-a3bf2-...`).
    pub fn from_name(name: &str) -> Option<Prefix> {
        let (head, _) = name.split_once('-')?;
        head.parse().ok()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Prefix {
    type Err = TdlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AN" => Ok(Prefix::An),
            "FR" => Ok(Prefix::Fr),
            "NFR" => Ok(Prefix::Nfr),
            "ADR" => Ok(Prefix::Adr),
            "T" => Ok(Prefix::T),
            _ => Err(TdlError::InvalidKind {
                what: "id prefix",
                value: s.to_string(),
                expected: "AN, FR, NFR, ADR, T",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// DocId
// ---------------------------------------------------------------------------

/// A normalized document identifier: upper-case prefix, lower-case payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

static DOC_ID_RE: OnceLock<Regex> = OnceLock::new();

fn doc_id_re() -> &'static Regex {
    DOC_ID_RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)-([0-9A-Za-z]{5})$").unwrap())
}

impl DocId {
    pub fn new(prefix: &str, payload: &str) -> Self {
        Self(format!(
            "{}-{}",
            prefix.to_ascii_uppercase(),
            payload.to_ascii_lowercase()
        ))
    }

    pub fn parse(s: &str) -> crate::Result<Self> {
        let caps = doc_id_re()
            .captures(s.trim())
            .ok_or_else(|| TdlError::InvalidId(s.to_string()))?;
        Ok(Self::new(&caps[1], &caps[2]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.0.split_once('-').map(|(p, _)| p).unwrap_or(&self.0)
    }

    pub fn payload(&self) -> &str {
        self.0.split_once('-').map(|(_, p)| p).unwrap_or("")
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
