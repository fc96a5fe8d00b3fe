//! Problem and allergy summaries.
//!
//! Both summaries are fixed-filter searches over patient-level records where
//! every confirmed, active record is expected to carry a coded description.
//! A record without one is reported, not skipped.

use carelink_core::{CodeableConcept, ResourceType};
use serde::Serialize;

use crate::client::FhirStoreClient;
use crate::error::GatewayError;
use crate::search::SearchParams;

/// Placeholder identity for records the store returned without an id.
const MISSING_ID: &str = "<missing id>";

/// One line of a problem or allergy summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub id: String,
    pub description: String,
}

fn confirmed_active(patient_id: &str) -> SearchParams {
    SearchParams::new()
        .with("clinical-status", "active")
        .with("verification-status", "confirmed")
        .with("patient", format!("Patient/{patient_id}"))
}

fn summary_entry(
    resource_type: ResourceType,
    id: Option<&str>,
    code: Option<&CodeableConcept>,
) -> Result<SummaryEntry, GatewayError> {
    let id = id.unwrap_or(MISSING_ID);
    let description = code.and_then(CodeableConcept::description).ok_or_else(|| {
        GatewayError::data_integrity(resource_type, id, "missing coded description")
    })?;
    Ok(SummaryEntry {
        id: id.to_string(),
        description: description.to_string(),
    })
}

impl FhirStoreClient {
    /// Active, confirmed problem-list conditions of a patient.
    pub async fn problem_summary(
        &self,
        patient_id: &str,
    ) -> Result<Vec<SummaryEntry>, GatewayError> {
        let params = confirmed_active(patient_id).with("category", "problem-list-item");
        self.search_condition(&params)
            .await?
            .nodes()
            .map(|c| summary_entry(ResourceType::Condition, c.id.as_deref(), c.code.as_ref()))
            .collect()
    }

    /// Active, confirmed allergies of a patient. Intolerances are excluded.
    pub async fn allergy_summary(
        &self,
        patient_id: &str,
    ) -> Result<Vec<SummaryEntry>, GatewayError> {
        let params = confirmed_active(patient_id).with("type", "allergy");
        self.search_allergy_intolerance(&params)
            .await?
            .nodes()
            .map(|a| {
                summary_entry(
                    ResourceType::AllergyIntolerance,
                    a.id.as_deref(),
                    a.code.as_ref(),
                )
            })
            .collect()
    }
}
