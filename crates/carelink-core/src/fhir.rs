use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// FHIR resource types the gateway reads and writes.
///
/// The set is closed: the gateway never addresses a resource type it has no
/// typed record for, so there is no catch-all variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Patient,
    Organization,
    Encounter,
    EpisodeOfCare,
    Appointment,
    Condition,
    AllergyIntolerance,
    Observation,
    Composition,
    MedicationRequest,
    ServiceRequest,
    Bundle,
    OperationOutcome,
}

impl ResourceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Organization => "Organization",
            ResourceType::Encounter => "Encounter",
            ResourceType::EpisodeOfCare => "EpisodeOfCare",
            ResourceType::Appointment => "Appointment",
            ResourceType::Condition => "Condition",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
            ResourceType::Observation => "Observation",
            ResourceType::Composition => "Composition",
            ResourceType::MedicationRequest => "MedicationRequest",
            ResourceType::ServiceRequest => "ServiceRequest",
            ResourceType::Bundle => "Bundle",
            ResourceType::OperationOutcome => "OperationOutcome",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(ResourceType::Patient),
            "Organization" => Ok(ResourceType::Organization),
            "Encounter" => Ok(ResourceType::Encounter),
            "EpisodeOfCare" => Ok(ResourceType::EpisodeOfCare),
            "Appointment" => Ok(ResourceType::Appointment),
            "Condition" => Ok(ResourceType::Condition),
            "AllergyIntolerance" => Ok(ResourceType::AllergyIntolerance),
            "Observation" => Ok(ResourceType::Observation),
            "Composition" => Ok(ResourceType::Composition),
            "MedicationRequest" => Ok(ResourceType::MedicationRequest),
            "ServiceRequest" => Ok(ResourceType::ServiceRequest),
            "Bundle" => Ok(ResourceType::Bundle),
            "OperationOutcome" => Ok(ResourceType::OperationOutcome),
            other => Err(CoreError::invalid_resource_type(other)),
        }
    }
}
