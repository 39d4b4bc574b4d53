//! Tool implementations, one module per feature area.
//!
//! Every tool follows the same contract: declared schema, validated typed
//! parameters, repository calls with bound SQL underneath, and a domain
//! JSON object for the success envelope.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use focal_core::errors::ToolError;

pub mod blog;
pub mod campaigns;
pub mod clients;
pub mod galleries;
pub mod invoices;
pub mod leads;
pub mod questionnaires;
pub mod sessions;

/// Deserializes the validated parameter object into the tool's typed
/// parameter struct. The schema guarantees shapes, so a failure here means
/// a schema/struct mismatch and is reported against `parameters`.
pub(crate) fn parse_params<P: DeserializeOwned>(params: Map<String, Value>) -> Result<P, ToolError> {
    serde_json::from_value(Value::Object(params))
        .map_err(|error| ToolError::validation("parameters", error.to_string()))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|error| ToolError::Storage(format!("could not serialize result: {error}")))
}
