use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TdlError {
    #[error(
        "failed to generate a unique id after {attempts} attempts; check the docs/ directory for a corrupted or oversized id set"
    )]
    CollisionExhaustion { attempts: u32 },

    #[error("invalid id prefix '{0}': must be one or more ASCII letters")]
    InvalidPrefix(String),

    #[error("invalid document id '{0}': expected PREFIX-xxxxx")]
    InvalidId(String),

    #[error("invalid {what} '{value}': expected one of {expected}")]
    InvalidKind {
        what: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("docs directory not found: {}", .0.display())]
    DocsNotFound(PathBuf),

    #[error("document already exists: {0}")]
    DocumentExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, TdlError>;
