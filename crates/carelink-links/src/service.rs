//! Issue and resolve patient links.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{LinkError, LinkResult};
use crate::link::PatientLink;
use crate::store::{LinkQuery, PatientLinkStore};

/// Lifetime of a freshly issued link.
pub const DEFAULT_LINK_TTL: Duration = Duration::minutes(30);

/// 256 random bits from the thread-local CSPRNG, unpadded base64url.
#[must_use]
pub fn generate_opaque_id() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Patient link service over a [`PatientLinkStore`].
#[derive(Clone)]
pub struct PatientLinkService {
    store: Arc<dyn PatientLinkStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PatientLinkService {
    /// Creates a service using wall-clock time and [`DEFAULT_LINK_TTL`].
    pub fn new(store: Arc<dyn PatientLinkStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_LINK_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints and persists a new link for `patient_id`.
    pub async fn issue(&self, patient_id: &str) -> LinkResult<PatientLink> {
        if patient_id.trim().is_empty() {
            return Err(LinkError::invalid_argument("patient id must not be empty"));
        }

        let link = PatientLink {
            id: Uuid::new_v4(),
            patient_id: patient_id.to_string(),
            opaque_id: generate_opaque_id(),
            expires: self.clock.now() + self.ttl,
            deleted: false,
        };

        self.store.insert(&link).await.inspect_err(|e| {
            tracing::warn!(link_id = %link.id, error = %e, "failed to persist patient link");
        })?;

        tracing::info!(link_id = %link.id, expires = %link.expires, "issued patient link");
        Ok(link)
    }

    /// Returns the patient id behind a live link.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NotFound`] if no live link carries `opaque_id`
    /// - [`LinkError::Ambiguous`] if more than one does
    pub async fn resolve(&self, opaque_id: &str) -> LinkResult<String> {
        let query = LinkQuery::live(opaque_id, self.clock.now());
        let mut matches = self.store.find(&query).await?;

        match matches.len() {
            0 => {
                tracing::debug!("patient link lookup missed");
                Err(LinkError::NotFound)
            }
            1 => Ok(matches.remove(0).patient_id),
            count => {
                tracing::warn!(count, "opaque id matches several live patient links");
                Err(LinkError::Ambiguous { count })
            }
        }
    }

    /// Soft-deletes every link with this opaque id. Revoking an unknown or
    /// already revoked link is [`LinkError::NotFound`].
    pub async fn revoke(&self, opaque_id: &str) -> LinkResult<()> {
        match self.store.mark_deleted(opaque_id).await? {
            0 => Err(LinkError::NotFound),
            revoked => {
                tracing::info!(revoked, "revoked patient link");
                Ok(())
            }
        }
    }

    /// Removes dead links from the store. Returns how many were removed.
    pub async fn purge_expired(&self) -> LinkResult<u64> {
        let removed = self.store.purge_expired(self.clock.now()).await?;
        if removed > 0 {
            tracing::debug!(removed, "purged dead patient links");
        }
        Ok(removed)
    }
}
