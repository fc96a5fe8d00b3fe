use anyhow::{Context, Result, anyhow, bail};
use carelink_core::{
    AllergyIntolerance, Appointment, Composition, Condition, Encounter, EpisodeOfCare,
    FhirResource, MedicationRequest, Observation, Organization, Patient, ResourceType,
    ServiceRequest, parse_reference,
};
use carelink_gateway::{FhirStoreClient, Method, RequestBody, SearchParams};
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::output::{print_json, print_resources};

/// Reads `Type/id`, `Type/id/_history/v`, or an absolute URL under the
/// store's FHIR base.
pub async fn get(client: &FhirStoreClient, reference: &str, format: OutputFormat) -> Result<()> {
    let base = client.config().fhir_base_url();
    let parsed = parse_reference(reference, Some(&base)).map_err(|e| anyhow!("{e}"))?;
    let resource_type: ResourceType = parsed.resource_type.parse()?;

    let resource = match &parsed.version {
        None => client.read_raw(resource_type, &parsed.id).await?,
        Some(version) => {
            let sub_path = format!("{}/_history/{version}", parsed.id);
            let bytes = client
                .send(
                    Method::GET,
                    resource_type,
                    Some(&sub_path),
                    &SearchParams::new(),
                    RequestBody::Empty,
                )
                .await?;
            serde_json::from_slice(&bytes).context("store returned invalid JSON")?
        }
    };

    match resource {
        Value::Object(map) => print_resources(&[map], format),
        other => print_json(&other),
    }
}

pub async fn search(
    client: &FhirStoreClient,
    resource_type: &str,
    raw_params: &[String],
    count: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let resource_type: ResourceType = resource_type.parse()?;
    let mut params = parse_params(raw_params)?;
    if let Some(count) = count {
        params = params.with_count(count);
    }

    let records = match resource_type {
        ResourceType::Patient => search_as::<Patient>(client, &params).await?,
        ResourceType::Organization => search_as::<Organization>(client, &params).await?,
        ResourceType::Encounter => search_as::<Encounter>(client, &params).await?,
        ResourceType::EpisodeOfCare => search_as::<EpisodeOfCare>(client, &params).await?,
        ResourceType::Appointment => search_as::<Appointment>(client, &params).await?,
        ResourceType::Condition => search_as::<Condition>(client, &params).await?,
        ResourceType::AllergyIntolerance => {
            search_as::<AllergyIntolerance>(client, &params).await?
        }
        ResourceType::Observation => search_as::<Observation>(client, &params).await?,
        ResourceType::Composition => search_as::<Composition>(client, &params).await?,
        ResourceType::MedicationRequest => {
            search_as::<MedicationRequest>(client, &params).await?
        }
        ResourceType::ServiceRequest => search_as::<ServiceRequest>(client, &params).await?,
        ResourceType::Bundle | ResourceType::OperationOutcome => {
            bail!("{resource_type} cannot be searched")
        }
    };

    print_resources(&records, format)
}

async fn search_as<R: FhirResource>(
    client: &FhirStoreClient,
    params: &SearchParams,
) -> Result<Vec<Map<String, Value>>> {
    let connection = client.search::<R>(params).await?;
    let records = connection
        .nodes()
        .map(R::to_json_map)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Parses `key=value` arguments. Values may contain `=`.
pub fn parse_params(raw: &[String]) -> Result<SearchParams> {
    raw.iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("search parameter must be key=value: {pair}"))?;
            if key.is_empty() {
                bail!("search parameter name is empty: {pair}");
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}
