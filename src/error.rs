use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by command actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Invalid {kind} value '{raw}': {reason}")]
    Parse {
        kind: &'static str,
        raw: String,
        reason: String,
    },

    #[error("Could not parse '{raw}' as value for flag {flag}: {reason}")]
    InvalidValue {
        flag: String,
        raw: String,
        reason: String,
    },

    #[error("Mismatched type for key '{key}' in {origin}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        origin: String,
        expected: &'static str,
        found: String,
    },

    #[error("Key '{key}' not found in {origin}")]
    MissingKey { key: String, origin: String },

    #[error("Unable to create input source: {0}")]
    InputSource(#[source] Box<FlagError>),

    #[error("Failed to decode {format} document {origin}: {reason}")]
    Decode {
        format: &'static str,
        origin: String,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Flag provided but not defined: {0}")]
    UnknownFlag(String),

    #[error("Bad flag syntax: {0}")]
    BadFlagSyntax(String),

    #[error("Flag needs an argument: {0}")]
    MissingValue(String),

    #[error("Required flag(s) \"{}\" not set", .0.join("\", \""))]
    RequiredFlags(Vec<String>),

    #[error("Flag redefined: {0}")]
    DuplicateFlag(String),

    #[error("Action failed: {0}")]
    Action(#[source] BoxError),
}

impl FlagError {
    /// True for the "key absent" signal from an input source, which the
    /// merger treats as "no override" rather than a failure.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, FlagError::MissingKey { .. })
    }

    /// Wrap a cell-level error with the flag name and the raw text that failed.
    pub(crate) fn for_flag(self, flag: &str, raw: &str) -> FlagError {
        let reason = match self {
            FlagError::Parse { reason, .. } => reason,
            other => other.to_string(),
        };
        FlagError::InvalidValue {
            flag: flag.to_string(),
            raw: raw.to_string(),
            reason,
        }
    }
}
