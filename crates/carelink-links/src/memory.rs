//! In-memory link store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{LinkError, LinkResult};
use crate::link::PatientLink;
use crate::store::{LinkQuery, PatientLinkStore};

/// Links held in a concurrent map keyed by record id. Contents are lost when
/// the process exits.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    links: DashMap<Uuid, PatientLink>,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, live or not.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl PatientLinkStore for InMemoryLinkStore {
    async fn insert(&self, link: &PatientLink) -> LinkResult<()> {
        match self.links.entry(link.id) {
            Entry::Occupied(_) => Err(LinkError::storage(format!(
                "link {} already exists",
                link.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(link.clone());
                Ok(())
            }
        }
    }

    async fn find(&self, query: &LinkQuery) -> LinkResult<Vec<PatientLink>> {
        Ok(self
            .links
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn mark_deleted(&self, opaque_id: &str) -> LinkResult<u64> {
        let mut flagged = 0;
        for mut entry in self.links.iter_mut() {
            let link = entry.value_mut();
            if link.opaque_id == opaque_id && !link.deleted {
                link.deleted = true;
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> LinkResult<u64> {
        let before = self.links.len();
        self.links.retain(|_, link| !link.deleted && link.expires >= now);
        Ok(before.saturating_sub(self.links.len()) as u64)
    }
}
