//! Shared wire helpers.

use crate::{OpenmrsError, OpenmrsResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The `{ "results": [...] }` envelope used by OpenMRS list resources.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultsWire<T> {
    pub results: Vec<T>,
}

/// Parse JSON text into a wire struct, reporting the failing field path on mismatch.
///
/// `what` names the resource in the error message (for example `report definitions`).
pub(crate) fn parse_json<T: DeserializeOwned>(json_text: &str, what: &str) -> OpenmrsResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);

    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        OpenmrsError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}

/// Reject identifiers that are empty or whitespace-only.
pub(crate) fn require_identifier(value: String, field: &str) -> OpenmrsResult<String> {
    if value.trim().is_empty() {
        return Err(OpenmrsError::InvalidInput(format!("{field} cannot be empty")));
    }
    Ok(value)
}
