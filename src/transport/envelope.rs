//! The backend's uniform `{success, data, message}` response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform response wrapper returned by every backend area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T = Value> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of inspecting a decoded body.
#[derive(Debug, PartialEq)]
pub(crate) enum Unwrapped {
    Data(Value),
    Failure(Option<String>),
}

/// Strip the envelope from a 2xx body.
///
/// Bodies that are not envelopes (no boolean `success` field) pass through.
pub(crate) fn unwrap_body(body: Value) -> Unwrapped {
    let is_envelope = body
        .as_object()
        .is_some_and(|obj| obj.get("success").is_some_and(Value::is_boolean));
    if !is_envelope {
        return Unwrapped::Data(body);
    }

    match serde_json::from_value::<ApiEnvelope>(body) {
        Ok(env) if env.success => Unwrapped::Data(env.data.unwrap_or(Value::Null)),
        Ok(env) => Unwrapped::Failure(env.message),
        Err(_) => Unwrapped::Failure(None),
    }
}

/// Best-effort message extraction from an error body.
pub(crate) fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
