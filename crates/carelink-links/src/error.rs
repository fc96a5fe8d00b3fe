//! Error types for patient-link operations.

use std::fmt;

/// Errors returned by the link service and its stores.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// No live link carries the opaque id.
    #[error("Patient link not found")]
    NotFound,

    /// Several live links share one opaque id.
    #[error("Opaque id matches {count} live patient links")]
    Ambiguous { count: usize },

    /// A caller-supplied value is unusable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing store failed.
    #[error("Link storage error: {0}")]
    Storage(String),
}

impl LinkError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    #[must_use]
    pub fn category(&self) -> LinkErrorCategory {
        match self {
            Self::NotFound => LinkErrorCategory::NotFound,
            Self::Ambiguous { .. } => LinkErrorCategory::DataIntegrity,
            Self::InvalidArgument(_) => LinkErrorCategory::Validation,
            Self::Storage(_) => LinkErrorCategory::Storage,
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkErrorCategory {
    NotFound,
    DataIntegrity,
    Validation,
    Storage,
}

impl fmt::Display for LinkErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::DataIntegrity => write!(f, "data_integrity"),
            Self::Validation => write!(f, "validation"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Type alias for link results.
pub type LinkResult<T> = Result<T, LinkError>;
