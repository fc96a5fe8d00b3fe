mod common;

use carelink_core::ResourceType;
use carelink_gateway::GatewayError;
use common::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn visit_summary_is_sparse() {
    let server = MockServer::start().await;
    mount_read(&server, encounter("e1", "Patient/p1")).await;

    Mock::given(method("GET"))
        .and(path(type_path("Condition")))
        .and(query_param("encounter", "Encounter/e1"))
        .and(query_param("_count", "20"))
        .respond_with(fhir_json(searchset(vec![json!({
            "resourceType": "Condition",
            "id": "c1",
            "code": {"text": "Sprained ankle"}
        })])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(type_path("Observation")))
        .and(query_param("encounter", "Encounter/e1"))
        .respond_with(fhir_json(searchset(vec![
            json!({"resourceType": "Observation", "id": "o1", "status": "final"}),
            json!({"resourceType": "Observation", "id": "o2", "status": "final"}),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // The allergy search is patient-scoped.
    Mock::given(method("GET"))
        .and(path(type_path("AllergyIntolerance")))
        .and(query_param("patient", "Patient/p1"))
        .and(query_param("_count", "20"))
        .respond_with(fhir_json(searchset(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(type_path("Encounter")))
        .and(query_param("_id", "e1"))
        .respond_with(fhir_json(searchset(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    for resource_type in ["Composition", "MedicationRequest", "ServiceRequest"] {
        mount_empty_search(&server, resource_type).await;
    }

    let summary = client_for(&server)
        .visit_summary("e1", 20)
        .await
        .expect("visit summary succeeds");

    let types: Vec<ResourceType> = summary.keys().copied().collect();
    assert_eq!(types, [ResourceType::Condition, ResourceType::Observation]);
    assert_eq!(summary[&ResourceType::Observation].len(), 2);

    let condition = &summary[&ResourceType::Condition][0];
    assert_eq!(condition["resourceType"], "Condition");
    assert_eq!(condition["code"]["text"], "Sprained ankle");
}

#[tokio::test]
async fn visit_summary_includes_the_encounter_itself() {
    let server = MockServer::start().await;
    let own = encounter("e1", "Patient/p1");
    mount_read(&server, own.clone()).await;

    Mock::given(method("GET"))
        .and(path(type_path("Encounter")))
        .and(query_param("_id", "e1"))
        .respond_with(fhir_json(searchset(vec![own.clone()])))
        .mount(&server)
        .await;
    for resource_type in [
        "Condition",
        "AllergyIntolerance",
        "Observation",
        "Composition",
        "MedicationRequest",
        "ServiceRequest",
    ] {
        mount_empty_search(&server, resource_type).await;
    }

    let summary = client_for(&server)
        .visit_summary("e1", 10)
        .await
        .expect("visit summary succeeds");

    assert_eq!(summary.len(), 1);
    assert_eq!(
        serde_json::Value::Object(summary[&ResourceType::Encounter][0].clone()),
        own
    );
}

#[tokio::test]
async fn missing_encounter_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(instance_path("Encounter", "gone")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(type_path("Condition")))
        .respond_with(fhir_json(searchset(vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .visit_summary("gone", 10)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn encounter_without_subject_is_data_integrity() {
    let server = MockServer::start().await;
    mount_read(
        &server,
        json!({"resourceType": "Encounter", "id": "e1", "status": "finished"}),
    )
    .await;

    let err = client_for(&server).visit_summary("e1", 10).await.unwrap_err();

    assert!(matches!(&err, GatewayError::DataIntegrity { id, .. } if id == "e1"));
}

#[tokio::test]
async fn one_failing_search_fails_the_summary() {
    let server = MockServer::start().await;
    mount_read(&server, encounter("e1", "Patient/p1")).await;
    Mock::given(method("GET"))
        .and(path(type_path("Observation")))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;
    for resource_type in [
        "Condition",
        "AllergyIntolerance",
        "Composition",
        "MedicationRequest",
        "ServiceRequest",
        "Encounter",
    ] {
        mount_empty_search(&server, resource_type).await;
    }

    let err = client_for(&server).visit_summary("e1", 10).await.unwrap_err();

    assert_eq!(err.status_code(), Some(503));
}
