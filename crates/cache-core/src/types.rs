//! Core type definitions for the model deployment cache

use serde::{Deserialize, Serialize};

/// Unique identifier types
pub type EndpointId = String;
pub type DeviceId = String;
pub type ModelId = String;

/// Opaque structured payload of a status or result record.
///
/// Field order is preserved so records round-trip in the order writers
/// produced them.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Device identity reserved for the endpoint activation record
pub const RESERVED_ALL_DEVICES: &str = "fedml-all-devices";

/// Payload field holding the model identifier
pub const MODEL_ID_FIELD: &str = "model_id";

/// Status payload field holding the deployment state
pub const MODEL_STATUS_FIELD: &str = "model_status";

/// Activation payload field holding the enabled flag
pub const END_POINT_STATUS_FIELD: &str = "end_point_status";

/// String form of an id or status token as agents write it.
///
/// Agents write ids either as JSON strings or as integers; both compare
/// by their textual form.
pub fn id_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One monitoring sample for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorMetricsRecord {
    /// Accumulated latency over all requests
    pub total_latency: f64,

    /// Mean latency per request
    pub avg_latency: f64,

    /// Requests served so far
    pub total_request_num: f64,

    /// Requests per second over the last window
    pub current_qps: f64,

    /// Requests per second since start
    pub avg_qps: f64,

    /// Sample time as written by the reporter
    pub timestamp: f64,
}

impl MonitorMetricsRecord {
    pub fn new(
        total_latency: f64,
        avg_latency: f64,
        total_request_num: f64,
        current_qps: f64,
        avg_qps: f64,
        timestamp: f64,
    ) -> Self {
        Self {
            total_latency,
            avg_latency,
            total_request_num,
            current_qps,
            avg_qps,
            timestamp,
        }
    }
}
