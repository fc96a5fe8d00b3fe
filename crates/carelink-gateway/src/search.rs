//! Per-resource-type search facade.
//!
//! Every search goes through the same pipeline: build string parameters,
//! issue the request, validate the searchset envelope, then decode each match
//! into its typed record. A match that fails to decode fails the search.

use std::collections::BTreeMap;

use carelink_core::{
    AllergyIntolerance, Appointment, Composition, Condition, Encounter, EpisodeOfCare,
    FhirResource, MedicationRequest, Observation, Organization, Patient, ServiceRequest,
};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::bundle::validate_search_bundle;
use crate::client::{FhirStoreClient, RequestBody};
use crate::error::GatewayError;

/// FHIR search parameters, one string value per parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchParams(BTreeMap<String, String>);

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `_count`.
    #[must_use]
    pub fn with_count(self, count: usize) -> Self {
        self.with("_count", count.to_string())
    }

    /// Sets `_sort`, e.g. `-date` for newest first.
    #[must_use]
    pub fn with_sort(self, sort: impl Into<String>) -> Self {
        self.with("_sort", sort)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn as_pairs(&self) -> Vec<(&str, &str)> {
        self.iter().collect()
    }

    /// Builds parameters from a loosely-typed JSON object, such as a filter
    /// arriving from an API layer.
    ///
    /// Values must already be strings; numbers, booleans, arrays, objects and
    /// nulls are rejected so nothing is silently stringified.
    pub fn try_from_json(value: &Value) -> Result<Self, GatewayError> {
        let Value::Object(map) = value else {
            return Err(GatewayError::invalid_search_param(
                "<root>",
                "search parameters must be a JSON object",
            ));
        };

        map.iter()
            .map(|(name, value)| match value {
                Value::String(s) => Ok((name.clone(), s.clone())),
                other => Err(GatewayError::invalid_search_param(
                    name.clone(),
                    format!("value must be a string, got {other}"),
                )),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<T> {
    pub node: T,
}

/// Ordered search results. An empty connection is a successful search with no
/// matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
}

impl<T> Connection<T> {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }

    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl FhirStoreClient {
    /// Searches resources of type `R`.
    pub async fn search<R: FhirResource>(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<R>, GatewayError> {
        let raw = self
            .send(Method::GET, R::RESOURCE_TYPE, None, params, RequestBody::Empty)
            .await?;

        let edges = validate_search_bundle(&raw)?
            .into_iter()
            .map(|resource| {
                serde_json::from_value::<R>(Value::Object(resource))
                    .map(|node| Edge { node })
                    .map_err(|e| GatewayError::decode(R::RESOURCE_TYPE, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            resource_type = %R::RESOURCE_TYPE,
            matches = edges.len(),
            "search completed"
        );
        Ok(Connection { edges })
    }

    pub async fn search_condition(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Condition>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_allergy_intolerance(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<AllergyIntolerance>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_observation(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Observation>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_composition(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Composition>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_medication_request(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<MedicationRequest>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_service_request(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<ServiceRequest>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_encounter(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Encounter>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_appointment(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Appointment>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_organization(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Organization>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_episode_of_care(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<EpisodeOfCare>, GatewayError> {
        self.search(params).await
    }

    pub async fn search_patient(
        &self,
        params: &SearchParams,
    ) -> Result<Connection<Patient>, GatewayError> {
        self.search(params).await
    }
}
