use std::fmt;

use crate::model::{ItemType, ParseEnumError};

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SnapshotParseError,
    SnapshotReadFailed,
    ItemNotFound,
    DuplicateId,
    MissingParent,
    OrphanItem,
    InvalidEnumValue,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::SnapshotParseError => "E1002",
            Self::SnapshotReadFailed => "E1003",
            Self::ItemNotFound => "E2001",
            Self::DuplicateId => "E2002",
            Self::MissingParent => "E2003",
            Self::OrphanItem => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SnapshotParseError => "Snapshot parse error",
            Self::SnapshotReadFailed => "Snapshot could not be read",
            Self::ItemNotFound => "Item not found",
            Self::DuplicateId => "Duplicate item ID",
            Self::MissingParent => "Parent item does not exist",
            Self::OrphanItem => "Item has no parent reference",
            Self::InvalidEnumValue => "Invalid type/status/priority value",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .roadmap/config.toml and retry."),
            Self::SnapshotParseError => {
                Some("Re-export the snapshot; dates must be YYYY-MM-DD and enums lowercase.")
            }
            Self::SnapshotReadFailed => Some("Check the snapshot path and read permissions."),
            Self::ItemNotFound => None,
            Self::DuplicateId => Some("Every ID must be unique across all hierarchy tables."),
            Self::MissingParent => Some("Export the parent row or drop the dangling reference."),
            Self::OrphanItem => Some("Set the parent foreign key on the row."),
            Self::InvalidEnumValue => {
                Some("Status is done, in-progress, blocked, or not-started; priority is high, medium, or low.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced while loading and indexing a portfolio.
#[derive(Debug, thiserror::Error)]
pub enum RoadmapError {
    #[error("duplicate id '{id}' (first seen as {first}, again as {second})")]
    DuplicateId {
        id: String,
        first: ItemType,
        second: ItemType,
    },

    #[error("{item_type} '{id}' references missing {parent_type} '{parent_id}'")]
    MissingParent {
        id: String,
        item_type: ItemType,
        parent_id: String,
        parent_type: ItemType,
    },

    #[error("{item_type} '{id}' has no parent reference")]
    OrphanItem { id: String, item_type: ItemType },

    #[error("item not found: '{0}'")]
    ItemNotFound(String),

    #[error("item '{id}': {source}")]
    InvalidEnumValue {
        id: String,
        #[source]
        source: ParseEnumError,
    },

    #[error("failed to parse snapshot: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoadmapError {
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateId { .. } => ErrorCode::DuplicateId,
            Self::MissingParent { .. } => ErrorCode::MissingParent,
            Self::OrphanItem { .. } => ErrorCode::OrphanItem,
            Self::ItemNotFound(_) => ErrorCode::ItemNotFound,
            Self::InvalidEnumValue { .. } => ErrorCode::InvalidEnumValue,
            Self::SnapshotParse(_) => ErrorCode::SnapshotParseError,
            Self::ConfigParse(_) => ErrorCode::ConfigParseError,
            Self::Io(_) => ErrorCode::SnapshotReadFailed,
        }
    }

    /// Remediation text for terminal output; falls back to the code summary.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or(code.message()).to_string()
    }
}
