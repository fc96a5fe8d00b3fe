use thiserror::Error;

/// Core error types for carelink record handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unsupported FHIR resource type: {0}")]
    InvalidResourceType(String),

    #[error("Unrecognized access level: {0}")]
    UnknownAccessLevel(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidResourceType error
    pub fn invalid_resource_type(resource_type: impl Into<String>) -> Self {
        Self::InvalidResourceType(resource_type.into())
    }

    /// Create a new UnknownAccessLevel error
    pub fn unknown_access_level(marker: impl Into<String>) -> Self {
        Self::UnknownAccessLevel(marker.into())
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidResourceType(_) => ErrorCategory::Validation,
            Self::UnknownAccessLevel(_) => ErrorCategory::Policy,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Policy,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Policy => write!(f, "policy"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
