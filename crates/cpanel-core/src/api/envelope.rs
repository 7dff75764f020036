//! Envelope interpretation for the two cPanel dialects
//!
//! A 2xx HTTP response does not mean the API call succeeded. Each dialect
//! embeds its own status indicator:
//!
//! ```json
//! // UAPI
//! { "status": 1, "errors": null, "data": { ... } }
//!
//! // API2
//! { "cpanelresult": { "data": [ ... ], "event": { "result": 1, "reason": "..." } } }
//! ```
//!
//! A body that is not JSON, or lacks the envelope entirely, is a
//! [`Error::MalformedResponse`]; a well-formed envelope reporting failure is
//! an [`Error::ApiRejected`].

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Reason reported when a failed UAPI envelope carries no errors
pub const UAPI_FALLBACK_REASON: &str = "unknown error";

/// Reason reported when a failed API2 envelope carries no reason
pub const API2_FALLBACK_REASON: &str = "API2 call reported failure";

/// Decode a UAPI body and return its `data` payload
pub fn interpret_uapi(call: &str, body: &str) -> Result<Value> {
    let mut doc = decode_object(call, body)?;

    if doc.get("status").is_some_and(is_one) {
        return Ok(doc.remove("data").unwrap_or(Value::Null));
    }

    let reason = doc
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .map(render_message)
        .unwrap_or_else(|| UAPI_FALLBACK_REASON.to_string());

    tracing::debug!("{call} rejected by UAPI: {reason}");
    Err(Error::rejected(call, reason))
}

/// Decode an API2 body and return its `cpanelresult.data` payload
pub fn interpret_api2(call: &str, body: &str) -> Result<Value> {
    let mut doc = decode_object(call, body)?;

    let Some(Value::Object(mut result)) = doc.remove("cpanelresult") else {
        return Err(Error::malformed(format!(
            "{call}: response has no `cpanelresult` object"
        )));
    };

    let event = result.get("event").and_then(Value::as_object);
    if event.and_then(|e| e.get("result")).is_some_and(is_one) {
        return Ok(result.remove("data").unwrap_or(Value::Null));
    }

    let reason = event
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .or_else(|| result.get("error").and_then(Value::as_str))
        .filter(|reason| !reason.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| API2_FALLBACK_REASON.to_string());

    tracing::debug!("{call} rejected by API2: {reason}");
    Err(Error::rejected(call, reason))
}

fn decode_object(call: &str, body: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::malformed(format!(
            "{call}: response body is not a JSON object"
        ))),
        Err(e) => Err(Error::malformed(format!(
            "{call}: response body is not JSON: {e}"
        ))),
    }
}

/// cPanel reports success as the number 1 (occasionally the string "1")
fn is_one(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_u64() == Some(1) || n.as_f64().is_some_and(|f| f == 1.0),
        Value::String(s) => s.trim() == "1",
        _ => false,
    }
}

fn render_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
