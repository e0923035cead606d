//! Endpoint activation flag
//!
//! Stored as a status record under the reserved device id
//! [`RESERVED_ALL_DEVICES`], so it shares the status list with real devices.

use cache_core::{Error, Payload, Result, END_POINT_STATUS_FIELD, RESERVED_ALL_DEVICES};
use serde_json::Value;
use tracing::info;

use crate::tracker::StatusTracker;

/// Reads and writes the enabled flag of an endpoint
#[derive(Debug, Clone)]
pub struct EndpointActivation {
    status: StatusTracker,
}

impl EndpointActivation {
    pub fn new(status: StatusTracker) -> Self {
        Self { status }
    }

    /// Enable or disable an endpoint
    pub async fn set_active(&self, endpoint_id: &str, active: bool) -> Result<()> {
        let mut payload = Payload::new();
        payload.insert(END_POINT_STATUS_FIELD.to_string(), Value::Bool(active));

        self.status
            .upsert(endpoint_id, RESERVED_ALL_DEVICES, payload)
            .await?;

        info!(endpoint = endpoint_id, active, "Set endpoint activation");
        Ok(())
    }

    /// Whether an endpoint is enabled
    ///
    /// The first activation record in the status list wins. An endpoint
    /// without one is inactive.
    pub async fn is_active(&self, endpoint_id: &str) -> Result<bool> {
        for raw in self.status.list(endpoint_id).await? {
            let (device_id, payload) = StatusTracker::decode(&raw)?;
            if device_id != RESERVED_ALL_DEVICES {
                continue;
            }

            return match payload.get(END_POINT_STATUS_FIELD) {
                Some(Value::Bool(active)) => Ok(*active),
                other => Err(Error::decode(format!(
                    "activation record of endpoint {} has invalid `{}`: {:?}",
                    endpoint_id, END_POINT_STATUS_FIELD, other
                ))),
            };
        }

        Ok(false)
    }
}
