//! Mock FHIR store shared by the gateway integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use carelink_gateway::{FhirStoreClient, GatewayConfig, StaticToken};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";
pub const DATASET_PATH: &str = "/projects/proj/locations/loc/datasets/ds";
pub const FHIR_BASE: &str = "/projects/proj/locations/loc/datasets/ds/fhirStores/store/fhir";

pub fn config_for(server: &MockServer) -> GatewayConfig {
    GatewayConfig::new("proj", "loc", "ds", "store").with_base_url(server.uri())
}

pub fn client_for(server: &MockServer) -> FhirStoreClient {
    FhirStoreClient::new(config_for(server), Arc::new(StaticToken::new(TOKEN)))
        .expect("client should build")
}

pub fn client_with_timeout(server: &MockServer, timeout: Duration) -> FhirStoreClient {
    let config = config_for(server).with_request_timeout(timeout);
    FhirStoreClient::new(config, Arc::new(StaticToken::new(TOKEN))).expect("client should build")
}

pub fn client_with(config: GatewayConfig) -> FhirStoreClient {
    FhirStoreClient::new(config, Arc::new(StaticToken::new(TOKEN))).expect("client should build")
}

/// `{FHIR_BASE}/{resource_type}`
pub fn type_path(resource_type: &str) -> String {
    format!("{FHIR_BASE}/{resource_type}")
}

/// `{FHIR_BASE}/{resource_type}/{id}`
pub fn instance_path(resource_type: &str, id: &str) -> String {
    format!("{FHIR_BASE}/{resource_type}/{id}")
}

/// A well-formed searchset around `resources`.
pub fn searchset(resources: Vec<Value>) -> Value {
    let entries: Vec<Value> = resources
        .into_iter()
        .map(|resource| {
            let full_url = format!(
                "https://store.example/fhir/{}/{}",
                resource["resourceType"].as_str().unwrap_or("Unknown"),
                resource["id"].as_str().unwrap_or("")
            );
            json!({
                "fullUrl": full_url,
                "resource": resource,
                "search": {"mode": "match"}
            })
        })
        .collect();

    let mut bundle = json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": entries.len(),
        "link": [{"relation": "self", "url": "https://store.example/fhir"}]
    });
    if !entries.is_empty() {
        bundle["entry"] = Value::Array(entries);
    }
    bundle
}

pub fn fhir_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/fhir+json")
        .set_body_json(body)
}

/// Answers every search on `resource_type` with no matches.
pub async fn mount_empty_search(server: &MockServer, resource_type: &str) {
    Mock::given(method("GET"))
        .and(path(type_path(resource_type)))
        .respond_with(fhir_json(searchset(vec![])))
        .mount(server)
        .await;
}

pub async fn mount_read(server: &MockServer, resource: Value) {
    let resource_type = resource["resourceType"].as_str().unwrap_or_default().to_string();
    let id = resource["id"].as_str().unwrap_or_default().to_string();
    Mock::given(method("GET"))
        .and(path(instance_path(&resource_type, &id)))
        .respond_with(fhir_json(resource))
        .mount(server)
        .await;
}

pub fn encounter(id: &str, patient: &str) -> Value {
    json!({
        "resourceType": "Encounter",
        "id": id,
        "status": "finished",
        "subject": {"reference": patient},
        "period": {"start": "2024-03-01T09:00:00Z"}
    })
}

pub fn episode(id: &str, status: &str, markers: &[&str]) -> Value {
    let kinds: Vec<Value> = markers.iter().map(|m| json!({"text": m})).collect();
    json!({
        "resourceType": "EpisodeOfCare",
        "id": id,
        "status": status,
        "type": kinds,
        "patient": {"reference": "Patient/p1"}
    })
}
