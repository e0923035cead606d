//! Store key layout
//!
//! Every endpoint owns three lists, each addressed by a fixed tag followed
//! directly by the endpoint id.

/// Tag of the per-endpoint device status list
pub const STATUS_TAG: &str = "FEDML_MODEL_DEPLOYMENT_STATUS-";

/// Tag of the per-endpoint device result list
pub const RESULT_TAG: &str = "FEDML_MODEL_DEPLOYMENT_RESULT-";

/// Tag of the per-endpoint monitoring metrics list
pub const MONITOR_TAG: &str = "FEDML_MODEL_DEPLOYMENT_MONITOR-";

pub fn status_key(endpoint_id: &str) -> String {
    format!("{}{}", STATUS_TAG, endpoint_id)
}

pub fn result_key(endpoint_id: &str) -> String {
    format!("{}{}", RESULT_TAG, endpoint_id)
}

pub fn monitor_key(endpoint_id: &str) -> String {
    format!("{}{}", MONITOR_TAG, endpoint_id)
}
