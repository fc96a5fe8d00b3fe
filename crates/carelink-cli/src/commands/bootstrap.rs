use anyhow::Result;
use carelink_gateway::FhirStoreClient;
use carelink_gateway::bootstrap::ensure_fhir_store;

use crate::output::print_success;

pub async fn bootstrap(client: &FhirStoreClient) -> Result<()> {
    let report = ensure_fhir_store(client).await?;
    let config = client.config();

    let dataset = if report.dataset_created {
        "created"
    } else {
        "already exists"
    };
    print_success(&format!("Dataset {}: {dataset}", config.dataset));

    let store = if report.store_created {
        "created"
    } else {
        "already exists"
    };
    print_success(&format!(
        "FHIR store {} ({}): {store}",
        config.fhir_store, config.fhir_version
    ));
    Ok(())
}
