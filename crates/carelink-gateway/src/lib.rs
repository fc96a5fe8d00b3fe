//! # carelink-gateway
//!
//! Client-side gateway in front of a managed FHIR store.
//!
//! Requests flow through four layers:
//! - [`FhirStoreClient::send`] composes authenticated REST calls and
//!   classifies HTTP outcomes
//! - [`bundle::validate_search_bundle`] checks the searchset envelope
//! - the search facade ([`FhirStoreClient::search`] and the per-type
//!   wrappers) turns matches into typed [`Connection`]s
//! - [`FhirStoreClient::visit_summary`] and
//!   [`FhirStoreClient::patient_timeline`] assemble application views
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use carelink_gateway::{FhirStoreClient, GatewayConfig, StaticToken};
//!
//! let config = GatewayConfig::new("my-project", "europe-west2", "clinical", "records");
//! let client = FhirStoreClient::new(config, Arc::new(StaticToken::new(token)))?;
//! let timeline = client.patient_timeline("episode-123").await?;
//! ```

pub mod bootstrap;
pub mod bundle;
mod client;
pub mod config;
pub mod credentials;
mod error;
pub mod search;
pub mod summary;
pub mod timeline;
pub mod visit;

pub use bootstrap::BootstrapReport;
pub use client::{FhirStoreClient, RequestBody};
pub use config::GatewayConfig;
pub use credentials::{EnvToken, StaticToken, TokenSource};
pub use error::{ErrorCategory, GatewayError};
pub use search::{Connection, Edge, SearchParams};
pub use summary::SummaryEntry;
pub use timeline::{
    EpisodeAccess, LIMITED_PROFILE_ENCOUNTER_COUNT, MAX_CLINICAL_RECORD_PAGE_SIZE,
};
pub use visit::{VisitResource, VisitScope, VisitSummary};

/// Re-exported so callers can build JSON Patch documents for
/// [`FhirStoreClient::patch`].
pub use json_patch::Patch;
pub use reqwest::Method;

/// Type alias for a gateway result.
pub type GatewayResult<T> = Result<T, GatewayError>;
