//! Persistence interface for patient links.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::LinkResult;
use crate::link::PatientLink;

/// Lookup of live links by opaque id.
///
/// A record matches when its opaque id is equal, it is not deleted, and it
/// expires at or after `not_expired_at`. Stores apply the whole predicate
/// themselves so dead links never leave the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkQuery {
    pub opaque_id: String,
    pub not_expired_at: OffsetDateTime,
}

impl LinkQuery {
    pub fn live(opaque_id: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            opaque_id: opaque_id.into(),
            not_expired_at: now,
        }
    }

    #[must_use]
    pub fn matches(&self, link: &PatientLink) -> bool {
        link.opaque_id == self.opaque_id && link.is_live_at(self.not_expired_at)
    }
}

/// Storage for patient links.
///
/// Uniqueness of opaque ids is not assumed; [`find`](Self::find) returns
/// every match and the caller decides what several matches mean.
#[async_trait]
pub trait PatientLinkStore: Send + Sync {
    /// Persists a new link.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Storage`](crate::LinkError::Storage) if the link
    /// cannot be stored.
    async fn insert(&self, link: &PatientLink) -> LinkResult<()>;

    /// Returns every link matching `query`.
    async fn find(&self, query: &LinkQuery) -> LinkResult<Vec<PatientLink>>;

    /// Sets the deletion flag on every link with this opaque id. Returns the
    /// number of links newly flagged.
    async fn mark_deleted(&self, opaque_id: &str) -> LinkResult<u64>;

    /// Removes links that expired before `now` or are flagged deleted.
    /// Returns the number removed.
    async fn purge_expired(&self, now: OffsetDateTime) -> LinkResult<u64>;
}
