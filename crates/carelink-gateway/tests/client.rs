mod common;

use std::time::Duration;

use carelink_core::{CodeableConcept, Condition, Patient, Reference, ResourceType};
use carelink_gateway::bootstrap::ensure_fhir_store;
use carelink_gateway::{BootstrapReport, ErrorCategory, GatewayError, Patch, SearchParams};
use common::*;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn read_returns_typed_resource() {
    let server = MockServer::start().await;
    mount_read(
        &server,
        json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [{"family": "Okafor", "given": ["Ada"]}],
            "birthDate": "1980-04-12",
            "telecom": [{"system": "phone", "value": "555-0100"}]
        }),
    )
    .await;

    let patient: Patient = client_for(&server).read("p1").await.expect("read succeeds");

    assert_eq!(patient.birth_date.as_deref(), Some("1980-04-12"));
    assert!(patient.extra.contains_key("telecom"));
}

#[tokio::test]
async fn read_of_deleted_resource_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(instance_path("Patient", "p9")))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let err = client_for(&server).read::<Patient>("p9").await.unwrap_err();

    assert!(matches!(
        &err,
        GatewayError::NotFound { resource_type: ResourceType::Patient, id } if id == "p9"
    ));
}

#[tokio::test]
async fn create_posts_fhir_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(type_path("Condition")))
        .and(header("content-type", "application/fhir+json"))
        .and(body_partial_json(json!({
            "resourceType": "Condition",
            "code": {"text": "Migraine"},
            "subject": {"reference": "Patient/p1"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "resourceType": "Condition",
            "id": "new-1",
            "code": {"text": "Migraine"},
            "subject": {"reference": "Patient/p1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let condition = Condition {
        code: Some(CodeableConcept::from_text("Migraine")),
        subject: Some(Reference::to("Patient/p1")),
        ..Default::default()
    };
    let created = client_for(&server)
        .create(&condition)
        .await
        .expect("create succeeds");

    assert_eq!(created.id.as_deref(), Some("new-1"));
}

#[tokio::test]
async fn update_requires_an_id() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .update(&Patient::default())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[tokio::test]
async fn update_puts_to_the_instance() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(instance_path("Patient", "p1")))
        .and(body_partial_json(json!({"resourceType": "Patient", "id": "p1", "gender": "female"})))
        .respond_with(fhir_json(json!({"resourceType": "Patient", "id": "p1", "gender": "female"})))
        .expect(1)
        .mount(&server)
        .await;

    let patient = Patient {
        id: Some("p1".into()),
        gender: Some("female".into()),
        ..Default::default()
    };
    let updated = client_for(&server).update(&patient).await.expect("update succeeds");
    assert_eq!(updated.id, patient.id);
    assert_eq!(updated.gender, patient.gender);
}

#[tokio::test]
async fn read_modify_update_writes_back_nested_elements() {
    let server = MockServer::start().await;
    let stored = json!({
        "resourceType": "Patient",
        "id": "p1",
        "meta": {"versionId": "3"},
        "identifier": [{"use": "official", "type": {"text": "MRN"}, "system": "s", "value": "v"}],
        "name": [{"use": "official", "family": "Okafor", "prefix": ["Dr"]}],
        "gender": "female"
    });
    mount_read(&server, stored.clone()).await;

    let mut expected = stored.clone();
    expected["gender"] = json!("other");
    Mock::given(method("PUT"))
        .and(path(instance_path("Patient", "p1")))
        .and(body_json(expected.clone()))
        .respond_with(fhir_json(expected))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut patient: Patient = client.read("p1").await.expect("read succeeds");
    patient.gender = Some("other".into());
    let updated = client.update(&patient).await.expect("update succeeds");

    assert_eq!(updated.name[0].extra["prefix"], json!(["Dr"]));
    assert_eq!(updated.identifier[0].extra["use"], "official");
}

#[tokio::test]
async fn patch_sends_json_patch() {
    let server = MockServer::start().await;
    let ops = json!([{"op": "replace", "path": "/status", "value": "inactive"}]);
    Mock::given(method("PATCH"))
        .and(path(instance_path("Patient", "p1")))
        .and(header("content-type", "application/json-patch+json"))
        .and(body_json(ops.clone()))
        .respond_with(fhir_json(json!({"resourceType": "Patient", "id": "p1", "active": false})))
        .expect(1)
        .mount(&server)
        .await;

    let patch: Patch = serde_json::from_value(ops).expect("valid patch");
    let patched: Patient = client_for(&server)
        .patch("p1", patch)
        .await
        .expect("patch succeeds");

    assert_eq!(patched.active, Some(false));
}

#[tokio::test]
async fn delete_missing_resource_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(instance_path("Observation", "o1")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete(ResourceType::Observation, "o1")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn slow_store_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(type_path("Patient")))
        .respond_with(fhir_json(searchset(vec![])).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client_with_timeout(&server, Duration::from_millis(100));
    let err = client
        .search_patient(&SearchParams::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Transport { .. }), "{err}");
    assert_eq!(err.category(), ErrorCategory::Transport);
}

#[tokio::test]
async fn bootstrap_creates_only_what_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ds"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DATASET_PATH}/fhirStores/store")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DATASET_PATH}/fhirStores")))
        .and(query_param("fhirStoreId", "store"))
        .and(body_json(json!({"version": "R4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "store"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/proj/locations/loc/datasets"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = ensure_fhir_store(&client_for(&server))
        .await
        .expect("bootstrap succeeds");

    assert_eq!(
        report,
        BootstrapReport {
            dataset_created: false,
            store_created: true,
        }
    );
}

#[tokio::test]
async fn bootstrap_surfaces_permission_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = ensure_fhir_store(&client_for(&server)).await.unwrap_err();
    assert_eq!(err.status_code(), Some(403));
}

const OPERATION: &str = "projects/proj/locations/loc/datasets/ds/operations/op-1";

fn polling_client(server: &MockServer, attempts: u32) -> carelink_gateway::FhirStoreClient {
    client_with(config_for(server).with_operation_polling(Duration::from_millis(10), attempts))
}

async fn mount_dataset_creation(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(DATASET_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/proj/locations/loc/datasets"))
        .and(query_param("datasetId", "ds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn bootstrap_waits_for_dataset_operation() {
    let server = MockServer::start().await;
    mount_dataset_creation(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION, "done": true})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DATASET_PATH}/fhirStores/store")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DATASET_PATH}/fhirStores")))
        .and(query_param("fhirStoreId", "store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "store"})))
        .expect(1)
        .mount(&server)
        .await;

    let report = ensure_fhir_store(&polling_client(&server, 5))
        .await
        .expect("bootstrap succeeds");

    assert_eq!(
        report,
        BootstrapReport {
            dataset_created: true,
            store_created: true,
        }
    );
}

#[tokio::test]
async fn bootstrap_stops_when_dataset_operation_fails() {
    let server = MockServer::start().await;
    mount_dataset_creation(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": OPERATION,
            "done": true,
            "error": {"code": 7, "message": "permission denied on location"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DATASET_PATH}/fhirStores")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = ensure_fhir_store(&polling_client(&server, 5))
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        GatewayError::Operation { name, message }
            if name == OPERATION && message == "permission denied on location"
    ));
}

#[tokio::test]
async fn bootstrap_gives_up_on_unfinished_operation() {
    let server = MockServer::start().await;
    mount_dataset_creation(&server).await;
    Mock::given(method("GET"))
        .and(path(format!("/{OPERATION}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": OPERATION})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{DATASET_PATH}/fhirStores")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = ensure_fhir_store(&polling_client(&server, 2))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Transport);
    assert!(err.to_string().contains("not done after 2 polls"));
}
