#![forbid(unsafe_code)]

use std::fmt;

/// Every fallible outcome that can cross a component boundary in the core crate.
#[derive(Debug)]
pub enum CoreError {
    MissingRequiredFields { field: &'static str },
    NonConventionalSubject { subject: String },
    Json(serde_json::Error),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredFields { field } => {
                write!(f, "missing-required-fields: {field} is required")
            }
            Self::NonConventionalSubject { subject } => {
                write!(f, "non-conventional-subject: {subject:?}")
            }
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl CoreError {
    /// The stable machine-readable tag used in CLI `Error [tag]: ...` output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MissingRequiredFields { .. } => "missing-required-fields",
            Self::NonConventionalSubject { .. } => "non-conventional-subject",
            Self::Json(_) => "json-error",
        }
    }
}
