use std::sync::Arc;

use carelink_core::{FhirResource, ResourceType};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use crate::config::GatewayConfig;
use crate::credentials::TokenSource;
use crate::error::GatewayError;
use crate::search::SearchParams;

const FHIR_JSON: &str = "application/fhir+json";
const JSON_PATCH: &str = "application/json-patch+json";
const JSON: &str = "application/json";

/// Body of a request to the store.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// A FHIR resource, sent as `application/fhir+json`.
    Resource(Value),
    /// An RFC 6902 patch, sent as `application/json-patch+json`.
    JsonPatch(json_patch::Patch),
    /// Plain JSON for the store's administrative endpoints.
    Json(Value),
    /// Pre-encoded bytes with an explicit content type.
    Raw {
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// Authenticated client for one FHIR store.
///
/// Holds no per-request state; the inner HTTP client only pools connections.
#[derive(Clone)]
pub struct FhirStoreClient {
    http: reqwest::Client,
    config: GatewayConfig,
    tokens: Arc<dyn TokenSource>,
}

impl FhirStoreClient {
    /// Creates a client whose every request is bounded by
    /// `config.request_timeout`. Redirects are never followed.
    pub fn new(config: GatewayConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Sends one request to `{fhir base}/{resource_type}[/{sub_path}]` and
    /// returns the buffered response body.
    ///
    /// Any status of 300 or above is returned as [`GatewayError::Status`].
    pub async fn send(
        &self,
        method: Method,
        resource_type: ResourceType,
        sub_path: Option<&str>,
        query: &SearchParams,
        body: RequestBody,
    ) -> Result<Vec<u8>, GatewayError> {
        let url = self.resource_url(resource_type, sub_path)?;
        self.execute(method, url, query, body).await
    }

    /// Reads a resource by id as untyped JSON.
    pub async fn read_raw(
        &self,
        resource_type: ResourceType,
        id: &str,
    ) -> Result<Value, GatewayError> {
        require_id(id)?;
        let bytes = self
            .send(
                Method::GET,
                resource_type,
                Some(id),
                &SearchParams::new(),
                RequestBody::Empty,
            )
            .await
            .map_err(|e| not_found_on_missing(e, resource_type, id))?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::decode(resource_type, e))
    }

    /// Reads a typed resource by id. A missing resource is
    /// [`GatewayError::NotFound`], distinct from an empty search.
    pub async fn read<R: FhirResource>(&self, id: &str) -> Result<R, GatewayError> {
        require_id(id)?;
        let bytes = self
            .send(
                Method::GET,
                R::RESOURCE_TYPE,
                Some(id),
                &SearchParams::new(),
                RequestBody::Empty,
            )
            .await
            .map_err(|e| not_found_on_missing(e, R::RESOURCE_TYPE, id))?;
        decode(&bytes)
    }

    /// Creates a resource; the store assigns the id.
    pub async fn create<R: FhirResource>(&self, resource: &R) -> Result<R, GatewayError> {
        let body = Value::Object(resource.to_json_map()?);
        let bytes = self
            .send(
                Method::POST,
                R::RESOURCE_TYPE,
                None,
                &SearchParams::new(),
                RequestBody::Resource(body),
            )
            .await?;
        decode(&bytes)
    }

    /// Replaces a resource. The resource must carry its id.
    pub async fn update<R: FhirResource>(&self, resource: &R) -> Result<R, GatewayError> {
        let id = resource
            .id()
            .ok_or_else(|| {
                GatewayError::configuration(format!(
                    "cannot update a {} without an id",
                    R::RESOURCE_TYPE
                ))
            })?
            .to_string();
        require_id(&id)?;
        let body = Value::Object(resource.to_json_map()?);
        let bytes = self
            .send(
                Method::PUT,
                R::RESOURCE_TYPE,
                Some(&id),
                &SearchParams::new(),
                RequestBody::Resource(body),
            )
            .await
            .map_err(|e| not_found_on_missing(e, R::RESOURCE_TYPE, &id))?;
        decode(&bytes)
    }

    /// Applies a JSON Patch to a resource and returns the patched resource.
    pub async fn patch<R: FhirResource>(
        &self,
        id: &str,
        patch: json_patch::Patch,
    ) -> Result<R, GatewayError> {
        require_id(id)?;
        let bytes = self
            .send(
                Method::PATCH,
                R::RESOURCE_TYPE,
                Some(id),
                &SearchParams::new(),
                RequestBody::JsonPatch(patch),
            )
            .await
            .map_err(|e| not_found_on_missing(e, R::RESOURCE_TYPE, id))?;
        decode(&bytes)
    }

    pub async fn delete(&self, resource_type: ResourceType, id: &str) -> Result<(), GatewayError> {
        require_id(id)?;
        self.send(
            Method::DELETE,
            resource_type,
            Some(id),
            &SearchParams::new(),
            RequestBody::Empty,
        )
        .await
        .map_err(|e| not_found_on_missing(e, resource_type, id))?;
        Ok(())
    }

    fn resource_url(
        &self,
        resource_type: ResourceType,
        sub_path: Option<&str>,
    ) -> Result<Url, GatewayError> {
        let mut url = parse_url(&self.config.fhir_base_url())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GatewayError::configuration(format!(
                    "FHIR base URL cannot carry a path: {}",
                    self.config.fhir_base_url()
                ))
            })?;
            segments.pop_if_empty().push(resource_type.as_str());
            if let Some(sub_path) = sub_path {
                segments.extend(
                    sub_path
                        .split('/')
                        .filter(|s| !s.is_empty() && *s != "." && *s != ".."),
                );
            }
        }
        Ok(url)
    }

    /// Issues a request to an absolute URL. Shared by the resource calls and
    /// the store administration calls in [`crate::bootstrap`].
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        query: &SearchParams,
        body: RequestBody,
    ) -> Result<Vec<u8>, GatewayError> {
        let token = self.tokens.token().await?;

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token)
            .header(ACCEPT, FHIR_JSON);

        if !query.is_empty() {
            request = request.query(&query.as_pairs());
        }

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Resource(value) => request
                .header(CONTENT_TYPE, FHIR_JSON)
                .body(serde_json::to_vec(&value)?),
            RequestBody::JsonPatch(patch) => request
                .header(CONTENT_TYPE, JSON_PATCH)
                .body(serde_json::to_vec(&patch)?),
            RequestBody::Json(value) => request
                .header(CONTENT_TYPE, JSON)
                .body(serde_json::to_vec(&value)?),
            RequestBody::Raw {
                content_type,
                bytes,
            } => request.header(CONTENT_TYPE, content_type).body(bytes),
        };

        tracing::debug!(%method, url = %url, "sending FHIR store request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, url = %url, error = %e, "FHIR store request failed");
            GatewayError::transport(&method, url.as_str(), e)
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport(&method, url.as_str(), e))?;

        if status.as_u16() >= 300 {
            tracing::warn!(
                %method,
                url = %url,
                status = status.as_u16(),
                "FHIR store returned an error status"
            );
            return Err(GatewayError::status(
                &method,
                url.as_str(),
                status.as_u16(),
                &bytes,
            ));
        }

        tracing::debug!(%method, url = %url, status = status.as_u16(), bytes = bytes.len(), "FHIR store response");
        Ok(bytes.to_vec())
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url, GatewayError> {
    Url::parse(raw).map_err(|e| GatewayError::configuration(format!("invalid URL {raw}: {e}")))
}

/// An empty id would address the type endpoint instead of one resource.
fn require_id(id: &str) -> Result<(), GatewayError> {
    if id.trim().is_empty() {
        return Err(GatewayError::invalid_search_param(
            "id",
            "resource id must not be empty",
        ));
    }
    Ok(())
}

fn decode<R: FhirResource>(bytes: &[u8]) -> Result<R, GatewayError> {
    serde_json::from_slice(bytes).map_err(|e| GatewayError::decode(R::RESOURCE_TYPE, e))
}

/// 404 and 410 on an addressed resource mean it does not exist (or no
/// longer does); every other failure passes through unchanged.
fn not_found_on_missing(err: GatewayError, resource_type: ResourceType, id: &str) -> GatewayError {
    match err.status_code() {
        Some(404) | Some(410) => GatewayError::not_found(resource_type, id),
        _ => err,
    }
}
