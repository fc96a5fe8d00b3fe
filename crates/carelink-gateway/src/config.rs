//! Connection settings for the remote FHIR store.

use std::time::Duration;

/// Default root of the managed healthcare API.
pub const DEFAULT_BASE_URL: &str = "https://healthcare.googleapis.com/v1";

/// Where the FHIR store lives and how long a single call may take.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API root, e.g. `https://healthcare.googleapis.com/v1`.
    pub base_url: String,
    pub project: String,
    pub location: String,
    pub dataset: String,
    pub fhir_store: String,
    /// FHIR version used when the store has to be created (default: R4).
    pub fhir_version: String,
    /// Per-request timeout (default: 10 seconds).
    pub request_timeout: Duration,
    /// Delay between polls of a long-running provisioning operation.
    pub operation_poll_interval: Duration,
    /// Polls before a provisioning operation is given up on.
    pub operation_poll_attempts: u32,
}

impl GatewayConfig {
    /// Creates a configuration with default base URL, version and timeout.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        dataset: impl Into<String>,
        fhir_store: impl Into<String>,
    ) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project: project.into(),
            location: location.into(),
            dataset: dataset.into(),
            fhir_store: fhir_store.into(),
            fhir_version: "R4".to_string(),
            request_timeout: Duration::from_secs(10),
            operation_poll_interval: Duration::from_secs(1),
            operation_poll_attempts: 60,
        }
    }

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets how long-running provisioning operations are awaited.
    #[must_use]
    pub fn with_operation_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.operation_poll_interval = interval;
        self.operation_poll_attempts = attempts;
        self
    }

    /// `{base}/{name}` for an operation name returned by the service.
    pub fn operation_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }

    /// Sets the FHIR version for store creation.
    #[must_use]
    pub fn with_fhir_version(mut self, version: impl Into<String>) -> Self {
        self.fhir_version = version.into();
        self
    }

    /// `{base}/projects/{project}/locations/{location}`
    pub fn location_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}",
            self.base_url.trim_end_matches('/'),
            self.project,
            self.location
        )
    }

    /// `{location}/datasets/{dataset}`
    pub fn dataset_url(&self) -> String {
        format!("{}/datasets/{}", self.location_url(), self.dataset)
    }

    /// `{dataset}/fhirStores/{store}`
    pub fn store_url(&self) -> String {
        format!("{}/fhirStores/{}", self.dataset_url(), self.fhir_store)
    }

    /// FHIR REST base, the prefix of every resource URL.
    pub fn fhir_base_url(&self) -> String {
        format!("{}/fhir", self.store_url())
    }
}
