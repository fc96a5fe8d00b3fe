pub mod access;
pub mod datatypes;
pub mod error;
pub mod fhir;
pub mod fhir_reference;
pub mod resources;

pub use access::AccessLevel;
pub use datatypes::{CodeableConcept, Coding, HumanName, Identifier, Period, Reference};
pub use error::{CoreError, ErrorCategory, Result};
pub use fhir::ResourceType;
pub use fhir_reference::{FhirReference, UnresolvableReference, parse_reference};
pub use resources::{
    AllergyIntolerance, Appointment, AppointmentParticipant, Composition, Condition, Encounter,
    EpisodeOfCare, FhirResource, MedicationRequest, Observation, Organization, Patient,
    ServiceRequest,
};
