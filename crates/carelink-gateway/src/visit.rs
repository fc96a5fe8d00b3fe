//! Visit summaries: every clinical record tied to one encounter, grouped by
//! resource type.

use std::collections::BTreeMap;

use carelink_core::{Encounter, FhirResource, ResourceType};
use futures_util::future::try_join_all;
use serde_json::{Map, Value};

use crate::client::FhirStoreClient;
use crate::error::GatewayError;
use crate::search::{Connection, SearchParams};

/// Resource type name to the records of that type. Types without records
/// are absent rather than mapped to an empty list.
pub type VisitSummary = BTreeMap<ResourceType, Vec<Map<String, Value>>>;

/// The resource types gathered into a visit summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitResource {
    Condition,
    AllergyIntolerance,
    Observation,
    Composition,
    MedicationRequest,
    ServiceRequest,
    Encounter,
}

/// How a visit resource is tied to the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitScope {
    /// `encounter=Encounter/{id}`
    Encounter,
    /// `patient={subject}`; the type carries no encounter reference.
    Patient,
    /// `_id={id}`; the encounter itself.
    SelfReference,
}

impl VisitResource {
    pub const ALL: [VisitResource; 7] = [
        Self::Condition,
        Self::AllergyIntolerance,
        Self::Observation,
        Self::Composition,
        Self::MedicationRequest,
        Self::ServiceRequest,
        Self::Encounter,
    ];

    pub const fn resource_type(self) -> ResourceType {
        match self {
            Self::Condition => ResourceType::Condition,
            Self::AllergyIntolerance => ResourceType::AllergyIntolerance,
            Self::Observation => ResourceType::Observation,
            Self::Composition => ResourceType::Composition,
            Self::MedicationRequest => ResourceType::MedicationRequest,
            Self::ServiceRequest => ResourceType::ServiceRequest,
            Self::Encounter => ResourceType::Encounter,
        }
    }

    pub const fn scope(self) -> VisitScope {
        match self {
            Self::AllergyIntolerance => VisitScope::Patient,
            Self::Encounter => VisitScope::SelfReference,
            Self::Condition
            | Self::Observation
            | Self::Composition
            | Self::MedicationRequest
            | Self::ServiceRequest => VisitScope::Encounter,
        }
    }
}

struct VisitFilters {
    encounter: SearchParams,
    patient: SearchParams,
    own: SearchParams,
}

impl VisitFilters {
    fn new(encounter_id: &str, subject: &str, page_count: usize) -> Self {
        Self {
            encounter: SearchParams::new()
                .with("encounter", format!("Encounter/{encounter_id}"))
                .with_count(page_count),
            patient: SearchParams::new()
                .with("patient", subject)
                .with_count(page_count),
            own: SearchParams::new()
                .with("_id", encounter_id)
                .with_count(page_count),
        }
    }

    fn for_scope(&self, scope: VisitScope) -> &SearchParams {
        match scope {
            VisitScope::Encounter => &self.encounter,
            VisitScope::Patient => &self.patient,
            VisitScope::SelfReference => &self.own,
        }
    }
}

fn project<R: FhirResource>(
    connection: Connection<R>,
) -> Result<Vec<Map<String, Value>>, GatewayError> {
    connection
        .nodes()
        .map(|node| node.to_json_map().map_err(GatewayError::from))
        .collect()
}

impl FhirStoreClient {
    /// Gathers the records of one encounter, searching every
    /// [`VisitResource`] concurrently with `page_count` results per type.
    ///
    /// The first failing search fails the whole summary.
    pub async fn visit_summary(
        &self,
        encounter_id: &str,
        page_count: usize,
    ) -> Result<VisitSummary, GatewayError> {
        if page_count == 0 {
            return Err(GatewayError::invalid_search_param(
                "_count",
                "page count must be at least 1",
            ));
        }

        let encounter: Encounter = self.read(encounter_id).await?;
        let subject = encounter.subject_reference().ok_or_else(|| {
            GatewayError::data_integrity(
                ResourceType::Encounter,
                encounter_id,
                "encounter has no subject reference",
            )
        })?;

        let filters = VisitFilters::new(encounter_id, subject, page_count);
        let buckets = try_join_all(
            VisitResource::ALL
                .into_iter()
                .map(|resource| self.visit_bucket(resource, filters.for_scope(resource.scope()))),
        )
        .await?;

        let summary: VisitSummary = buckets
            .into_iter()
            .filter(|(_, records)| !records.is_empty())
            .collect();

        tracing::debug!(
            encounter_id,
            resource_types = summary.len(),
            "visit summary assembled"
        );
        Ok(summary)
    }

    async fn visit_bucket(
        &self,
        resource: VisitResource,
        params: &SearchParams,
    ) -> Result<(ResourceType, Vec<Map<String, Value>>), GatewayError> {
        let records = match resource {
            VisitResource::Condition => project(self.search_condition(params).await?)?,
            VisitResource::AllergyIntolerance => {
                project(self.search_allergy_intolerance(params).await?)?
            }
            VisitResource::Observation => project(self.search_observation(params).await?)?,
            VisitResource::Composition => project(self.search_composition(params).await?)?,
            VisitResource::MedicationRequest => {
                project(self.search_medication_request(params).await?)?
            }
            VisitResource::ServiceRequest => {
                project(self.search_service_request(params).await?)?
            }
            VisitResource::Encounter => project(self.search_encounter(params).await?)?,
        };
        Ok((resource.resource_type(), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_set_is_distinct() {
        let mut types: Vec<_> = VisitResource::ALL.iter().map(|r| r.resource_type()).collect();
        types.sort();
        types.dedup();
        assert_eq!(types.len(), VisitResource::ALL.len());
    }

    #[test]
    fn test_scopes() {
        assert_eq!(VisitResource::AllergyIntolerance.scope(), VisitScope::Patient);
        assert_eq!(VisitResource::Encounter.scope(), VisitScope::SelfReference);
        assert_eq!(VisitResource::Observation.scope(), VisitScope::Encounter);
    }

    #[test]
    fn test_filters() {
        let filters = VisitFilters::new("e1", "Patient/p1", 50);
        let encounter = filters.for_scope(VisitScope::Encounter);
        assert_eq!(encounter.get("encounter"), Some("Encounter/e1"));
        assert_eq!(encounter.get("_count"), Some("50"));

        let patient = filters.for_scope(VisitScope::Patient);
        assert_eq!(patient.get("patient"), Some("Patient/p1"));
        assert_eq!(patient.get("encounter"), None);

        let own = filters.for_scope(VisitScope::SelfReference);
        assert_eq!(own.get("_id"), Some("e1"));
        assert_eq!(own.get("_count"), Some("50"));
    }
}
