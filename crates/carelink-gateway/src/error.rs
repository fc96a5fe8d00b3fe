//! Error types for gateway operations.

use std::fmt;

use carelink_core::ResourceType;

/// Maximum number of characters of an upstream error body kept for diagnostics.
const BODY_EXCERPT_CHARS: usize = 512;

/// Errors that can occur while talking to the FHIR store or assembling views.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (timeout, connection failure).
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The store answered with a status code of 300 or above.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        /// Leading excerpt of the response body.
        body: String,
    },

    /// The search response is not a well-formed searchset Bundle.
    #[error("Malformed search result: {0}")]
    MalformedBundle(String),

    /// A resource returned by the store does not fit its schema.
    #[error("Failed to decode {resource_type} resource: {source}")]
    Decode {
        resource_type: ResourceType,
        #[source]
        source: serde_json::Error,
    },

    /// A specific resource requested by id does not exist.
    #[error("Resource not found: {resource_type}/{id}")]
    NotFound {
        resource_type: ResourceType,
        id: String,
    },

    /// A stored record violates an invariant the gateway relies on.
    #[error("Data integrity error on {resource_type}/{id}: {message}")]
    DataIntegrity {
        resource_type: ResourceType,
        id: String,
        message: String,
    },

    /// The episode of care is not in the `active` state.
    #[error("Episode of care {id} is not active (status: {status})")]
    EpisodeNotActive { id: String, status: String },

    /// The episode carries an access-level marker outside the vocabulary.
    #[error("Episode of care {id} has unrecognized access level {marker:?}")]
    UnknownAccessLevel { id: String, marker: String },

    /// A caller-supplied search parameter is unusable.
    #[error("Invalid search parameter {name}: {message}")]
    InvalidSearchParam { name: String, message: String },

    /// A long-running provisioning operation failed or never finished.
    #[error("Operation {name} did not complete: {message}")]
    Operation { name: String, message: String },

    /// No bearer token could be obtained.
    #[error("Credential error: {0}")]
    Credential(String),

    /// The gateway is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A request body could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn transport(method: &reqwest::Method, url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source,
        }
    }

    /// Creates a `Status` error, keeping only an excerpt of `body`.
    pub fn status(method: &reqwest::Method, url: &str, status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let body = match text.char_indices().nth(BODY_EXCERPT_CHARS) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.into_owned(),
        };
        Self::Status {
            method: method.to_string(),
            url: url.to_string(),
            status,
            body,
        }
    }

    pub fn malformed_bundle(message: impl Into<String>) -> Self {
        Self::MalformedBundle(message.into())
    }

    pub fn decode(resource_type: ResourceType, source: serde_json::Error) -> Self {
        Self::Decode {
            resource_type,
            source,
        }
    }

    pub fn not_found(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    pub fn data_integrity(
        resource_type: ResourceType,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DataIntegrity {
            resource_type,
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn invalid_search_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSearchParam {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn operation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// HTTP status returned by the store, if this is a `Status` error.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the failure originates on the server side of the gateway
    /// (upstream store, its data, or the gateway itself) rather than in the
    /// caller's input.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::NotFound | ErrorCategory::Policy | ErrorCategory::Validation
        )
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport { .. } | Self::Status { .. } | Self::Operation { .. } => {
                ErrorCategory::Transport
            }
            Self::MalformedBundle(_) | Self::Decode { .. } => ErrorCategory::ContractViolation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DataIntegrity { .. } => ErrorCategory::DataIntegrity,
            Self::EpisodeNotActive { .. } | Self::UnknownAccessLevel { .. } => {
                ErrorCategory::Policy
            }
            Self::InvalidSearchParam { .. } => ErrorCategory::Validation,
            Self::Credential(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Json(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Timeout, connection failure or non-2xx response.
    Transport,
    /// The store broke the response contract.
    ContractViolation,
    /// A stored record is inconsistent.
    DataIntegrity,
    /// A specific resource does not exist.
    NotFound,
    /// Access policy refused the request.
    Policy,
    /// Caller input is invalid.
    Validation,
    Configuration,
    Serialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::ContractViolation => write!(f, "contract_violation"),
            Self::DataIntegrity => write!(f, "data_integrity"),
            Self::NotFound => write!(f, "not_found"),
            Self::Policy => write!(f, "policy"),
            Self::Validation => write!(f, "validation"),
            Self::Configuration => write!(f, "configuration"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}
