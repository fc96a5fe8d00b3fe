//! Access-gated patient timelines.
//!
//! A timeline starts from an episode of care. The episode decides whose
//! encounters are visible and how many of them: `FULL_ACCESS` episodes see up
//! to [`MAX_CLINICAL_RECORD_PAGE_SIZE`] encounters, limited episodes only the
//! [`LIMITED_PROFILE_ENCOUNTER_COUNT`] most recent ones. Each visible
//! encounter is expanded into a [`VisitSummary`], newest first.

use carelink_core::{AccessLevel, EpisodeOfCare, ResourceType};
use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::client::FhirStoreClient;
use crate::error::GatewayError;
use crate::search::SearchParams;
use crate::visit::VisitSummary;

/// Upper bound on encounters per timeline and records per visit bucket.
pub const MAX_CLINICAL_RECORD_PAGE_SIZE: usize = 50;

/// Encounters visible through a `PROFILE_AND_RECENT_VISITS_ACCESS` episode.
pub const LIMITED_PROFILE_ENCOUNTER_COUNT: usize = 5;

/// Visit summaries assembled at the same time.
const VISIT_CONCURRENCY: usize = 4;

/// A validated episode of care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeAccess {
    pub episode_id: String,
    pub patient_reference: String,
    pub access_level: AccessLevel,
}

impl EpisodeAccess {
    /// Validates an episode in order: active status, patient reference,
    /// exactly one `type` entry, recognized access-level marker.
    pub fn from_episode(episode_id: &str, episode: &EpisodeOfCare) -> Result<Self, GatewayError> {
        let patient_reference = active_patient(episode_id, episode)?;

        let [marker] = episode.kind.as_slice() else {
            return Err(GatewayError::data_integrity(
                ResourceType::EpisodeOfCare,
                episode_id,
                format!(
                    "expected exactly one access-level type entry, found {}",
                    episode.kind.len()
                ),
            ));
        };

        let text = marker.text.as_deref().unwrap_or_default();
        let access_level = text
            .parse::<AccessLevel>()
            .map_err(|_| GatewayError::UnknownAccessLevel {
                id: episode_id.to_string(),
                marker: text.to_string(),
            })?;

        Ok(Self {
            episode_id: episode_id.to_string(),
            patient_reference: patient_reference.to_string(),
            access_level,
        })
    }

    /// Number of encounters this episode may see.
    #[must_use]
    pub fn encounter_ceiling(&self) -> usize {
        match self.access_level {
            AccessLevel::FullAccess => MAX_CLINICAL_RECORD_PAGE_SIZE,
            AccessLevel::ProfileAndRecentVisitsAccess => LIMITED_PROFILE_ENCOUNTER_COUNT,
        }
    }
}

fn active_patient<'a>(
    episode_id: &str,
    episode: &'a EpisodeOfCare,
) -> Result<&'a str, GatewayError> {
    if !episode.is_active() {
        return Err(GatewayError::EpisodeNotActive {
            id: episode_id.to_string(),
            status: episode.status.clone().unwrap_or_else(|| "unknown".to_string()),
        });
    }
    episode.patient_reference().ok_or_else(|| {
        GatewayError::data_integrity(
            ResourceType::EpisodeOfCare,
            episode_id,
            "episode has no patient reference",
        )
    })
}

impl FhirStoreClient {
    /// Reads and validates an episode of care.
    pub async fn episode_access(&self, episode_id: &str) -> Result<EpisodeAccess, GatewayError> {
        let episode: EpisodeOfCare = self.read(episode_id).await?;
        EpisodeAccess::from_episode(episode_id, &episode)
    }

    /// The visit summaries of the episode's patient, most recent encounter
    /// first, bounded by the episode's access level.
    pub async fn patient_timeline(
        &self,
        episode_id: &str,
    ) -> Result<Vec<VisitSummary>, GatewayError> {
        let access = self.episode_access(episode_id).await?;
        tracing::debug!(
            episode_id,
            access_level = %access.access_level,
            ceiling = access.encounter_ceiling(),
            "episode access resolved"
        );
        self.timeline_for(&access.patient_reference, access.encounter_ceiling())
            .await
    }

    /// Like [`patient_timeline`](Self::patient_timeline) with a caller-chosen
    /// encounter count. The access-level marker is not consulted, but the
    /// episode must still be active and name its patient.
    ///
    /// For internal callers that have already established the ceiling.
    pub async fn patient_timeline_with_count(
        &self,
        episode_id: &str,
        count: usize,
    ) -> Result<Vec<VisitSummary>, GatewayError> {
        if count == 0 {
            return Err(GatewayError::invalid_search_param(
                "_count",
                "encounter count must be at least 1",
            ));
        }
        let episode: EpisodeOfCare = self.read(episode_id).await?;
        let patient_reference = active_patient(episode_id, &episode)?;
        self.timeline_for(patient_reference, count).await
    }

    async fn timeline_for(
        &self,
        patient_reference: &str,
        count: usize,
    ) -> Result<Vec<VisitSummary>, GatewayError> {
        let params = SearchParams::new()
            .with("patient", patient_reference)
            .with_sort("-date")
            .with_count(count);

        let encounter_ids: Vec<String> = self
            .search_encounter(&params)
            .await?
            .into_nodes()
            .into_iter()
            .take(count)
            .filter_map(|encounter| encounter.id)
            .collect();

        tracing::debug!(
            patient = patient_reference,
            encounters = encounter_ids.len(),
            "building timeline"
        );

        stream::iter(encounter_ids)
            .map(|id| async move {
                self.visit_summary(&id, MAX_CLINICAL_RECORD_PAGE_SIZE)
                    .await
            })
            .buffered(VISIT_CONCURRENCY)
            .try_collect()
            .await
    }
}
