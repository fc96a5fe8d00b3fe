//! One-time provisioning of the dataset and FHIR store.
//!
//! Run by the hosting process before serving traffic, never implicitly on a
//! request path.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::{FhirStoreClient, RequestBody, parse_url};
use crate::error::GatewayError;
use crate::search::SearchParams;

/// What [`ensure_fhir_store`] had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub dataset_created: bool,
    pub store_created: bool,
}

/// Long-running operation returned by dataset creation.
#[derive(Debug, Default, Deserialize)]
struct Operation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<Value>,
}

impl Operation {
    fn failure(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string),
        )
    }
}

/// Get-or-create for the configured dataset, then for the FHIR store inside
/// it. Existing resources are left untouched.
///
/// A freshly created dataset is provisioned asynchronously; its operation is
/// polled until done before the store is created.
pub async fn ensure_fhir_store(client: &FhirStoreClient) -> Result<BootstrapReport, GatewayError> {
    let config = client.config();

    let dataset_operation = ensure(
        client,
        &config.dataset_url(),
        &format!("{}/datasets", config.location_url()),
        SearchParams::new().with("datasetId", &config.dataset),
        json!({}),
    )
    .await?;
    let dataset_created = dataset_operation.is_some();
    if let Some(body) = dataset_operation {
        wait_for_operation(client, &body).await?;
        tracing::info!(dataset = %config.dataset, "created dataset");
    }

    let store_created = ensure(
        client,
        &config.store_url(),
        &format!("{}/fhirStores", config.dataset_url()),
        SearchParams::new().with("fhirStoreId", &config.fhir_store),
        json!({ "version": config.fhir_version }),
    )
    .await?
    .is_some();
    if store_created {
        tracing::info!(
            fhir_store = %config.fhir_store,
            version = %config.fhir_version,
            "created FHIR store"
        );
    }

    Ok(BootstrapReport {
        dataset_created,
        store_created,
    })
}

/// Returns the create response body if the resource had to be created.
async fn ensure(
    client: &FhirStoreClient,
    resource_url: &str,
    collection_url: &str,
    create_query: SearchParams,
    create_body: Value,
) -> Result<Option<Vec<u8>>, GatewayError> {
    let lookup = client
        .execute(
            Method::GET,
            parse_url(resource_url)?,
            &SearchParams::new(),
            RequestBody::Empty,
        )
        .await;

    match lookup {
        Ok(_) => {
            tracing::debug!(url = resource_url, "already provisioned");
            Ok(None)
        }
        Err(e) if e.status_code() == Some(404) => {
            let body = client
                .execute(
                    Method::POST,
                    parse_url(collection_url)?,
                    &create_query,
                    RequestBody::Json(create_body),
                )
                .await?;
            Ok(Some(body))
        }
        Err(e) => Err(e),
    }
}

/// Polls the operation in `created` until it reports `done`. A create
/// response that is not an operation needs no waiting.
async fn wait_for_operation(client: &FhirStoreClient, created: &[u8]) -> Result<(), GatewayError> {
    let mut operation: Operation = serde_json::from_slice(created).unwrap_or_default();
    let Some(name) = operation
        .name
        .clone()
        .filter(|name| name.contains("/operations/"))
    else {
        return Ok(());
    };
    let config = client.config();
    let url = parse_url(&config.operation_url(&name))?;

    for attempt in 0..=config.operation_poll_attempts {
        if operation.done {
            return match operation.failure() {
                Some(message) => Err(GatewayError::operation(name, message)),
                None => Ok(()),
            };
        }
        if attempt == config.operation_poll_attempts {
            break;
        }

        tokio::time::sleep(config.operation_poll_interval).await;
        tracing::debug!(operation = %name, attempt, "polling provisioning operation");
        let body = client
            .execute(Method::GET, url.clone(), &SearchParams::new(), RequestBody::Empty)
            .await?;
        operation = serde_json::from_slice(&body)?;
    }

    Err(GatewayError::operation(
        name,
        format!("not done after {} polls", config.operation_poll_attempts),
    ))
}
