// protocol.rs
use serde::Serialize;
use serde_json::Value;

pub const RUNTIME_ENABLE: &str = "Runtime.enable";
pub const RUNTIME_EVALUATE: &str = "Runtime.evaluate";

// =========================
// Outgoing
// =========================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

pub fn serialize_request(req: &Request) -> serde_json::Result<String> {
    serde_json::to_string(req)
}

/// Params for `Runtime.evaluate` applying `function_source` to one JSON argument.
///
/// The source sits on its own lines so a trailing `//` comment cannot swallow
/// the closing paren or the call.
pub fn evaluate_params(function_source: &str, argument: &Value) -> Value {
    serde_json::json!({
        "expression": format!("(\n{function_source}\n)({argument})"),
        "returnByValue": true,
    })
}

// =========================
// Incoming
// =========================

/// How one inbound frame relates to the call currently in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// An `error` payload, for any id. Fails the call.
    Error(Value),
    /// Our response, carrying the completion marker.
    Completed(Value),
    /// Our response, but the injection procedure did not confirm dispatch.
    Rejected(Value),
    /// Anything else: acks for other ids, runtime events, unparseable text.
    Noise,
}

/// Classify a raw text frame against the in-flight request `pending_id`.
///
/// Frames carrying an `id` are matched on it. Frames without one are only
/// scanned for `marker`, for injectors that acknowledge via console events
/// instead of the evaluate result.
pub fn classify(text: &str, pending_id: u64, marker: &str) -> Inbound {
    let Ok(msg) = serde_json::from_str::<Value>(text) else {
        return Inbound::Noise;
    };
    if let Some(err) = msg.get("error") {
        return Inbound::Error(err.clone());
    }
    match msg.get("id").and_then(Value::as_u64) {
        Some(id) if id == pending_id => {
            let result = msg.get("result").cloned().unwrap_or(Value::Null);
            if text.contains(marker) {
                Inbound::Completed(result)
            } else {
                Inbound::Rejected(result)
            }
        }
        Some(_) => Inbound::Noise,
        None if text.contains(marker) => Inbound::Completed(msg),
        None => Inbound::Noise,
    }
}
