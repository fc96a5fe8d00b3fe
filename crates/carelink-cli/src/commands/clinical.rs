use anyhow::Result;
use carelink_gateway::FhirStoreClient;

use crate::cli::OutputFormat;
use crate::output::{print_summary, print_visits};

pub async fn visit(
    client: &FhirStoreClient,
    encounter_id: &str,
    count: usize,
    format: OutputFormat,
) -> Result<()> {
    let summary = client.visit_summary(encounter_id, count).await?;
    print_visits(&[summary], format)
}

pub async fn timeline(
    client: &FhirStoreClient,
    episode_id: &str,
    count: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let visits = match count {
        Some(count) => client.patient_timeline_with_count(episode_id, count).await?,
        None => client.patient_timeline(episode_id).await?,
    };
    print_visits(&visits, format)
}

pub async fn problems(client: &FhirStoreClient, patient_id: &str, format: OutputFormat) -> Result<()> {
    let entries = client.problem_summary(patient_id).await?;
    print_summary("Problems", &entries, format)
}

pub async fn allergies(
    client: &FhirStoreClient,
    patient_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let entries = client.allergy_summary(patient_id).await?;
    print_summary("Allergies", &entries, format)
}
