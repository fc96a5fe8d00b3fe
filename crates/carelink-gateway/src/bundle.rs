//! Search response envelope validation.
//!
//! A search response must be a `Bundle` of type `searchset` carrying
//! `resourceType`, `type`, `total` and `link`. Any deviation is a contract
//! violation by the store and fails the whole search; there is no
//! best-effort extraction of partial results.

use serde_json::{Map, Value};

use crate::error::GatewayError;

const REQUIRED_BUNDLE_KEYS: [&str; 4] = ["resourceType", "type", "total", "link"];
const REQUIRED_ENTRY_KEYS: [&str; 3] = ["fullUrl", "resource", "search"];

/// Validates a raw search response and returns the embedded resources in the
/// order the store returned them.
///
/// An absent or `null` `entry` is the valid "no matches" case and yields an
/// empty vector.
pub fn validate_search_bundle(raw: &[u8]) -> Result<Vec<Map<String, Value>>, GatewayError> {
    let document: Value = serde_json::from_slice(raw)
        .map_err(|e| GatewayError::malformed_bundle(format!("response is not JSON: {e}")))?;

    let Value::Object(mut bundle) = document else {
        return Err(GatewayError::malformed_bundle(
            "response is not a JSON object",
        ));
    };

    for key in REQUIRED_BUNDLE_KEYS {
        if !bundle.contains_key(key) {
            return Err(GatewayError::malformed_bundle(format!(
                "missing required key {key:?}"
            )));
        }
    }

    let resource_type = bundle.get("resourceType").and_then(Value::as_str);
    if resource_type != Some("Bundle") {
        return Err(GatewayError::malformed_bundle(format!(
            "expected resourceType \"Bundle\", got {}",
            bundle["resourceType"]
        )));
    }

    let bundle_type = bundle.get("type").and_then(Value::as_str);
    if bundle_type != Some("searchset") {
        return Err(GatewayError::malformed_bundle(format!(
            "expected type \"searchset\", got {}",
            bundle["type"]
        )));
    }

    let entries = match bundle.remove("entry") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(GatewayError::malformed_bundle(format!(
                "entry must be an array, got {}",
                json_kind(&other)
            )));
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| extract_resource(index, entry))
        .collect()
}

fn extract_resource(index: usize, entry: Value) -> Result<Map<String, Value>, GatewayError> {
    let Value::Object(mut entry) = entry else {
        return Err(GatewayError::malformed_bundle(format!(
            "entry[{index}] is not an object"
        )));
    };

    for key in REQUIRED_ENTRY_KEYS {
        if !entry.contains_key(key) {
            return Err(GatewayError::malformed_bundle(format!(
                "entry[{index}] is missing required key {key:?}"
            )));
        }
    }

    match entry.remove("resource").unwrap_or(Value::Null) {
        Value::Object(resource) => Ok(resource),
        other => Err(GatewayError::malformed_bundle(format!(
            "entry[{index}].resource must be an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
