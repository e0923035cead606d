//! Idle device selection for inference routing
//!
//! Picks one device at random among those reporting the model as deployed,
//! then returns that device's published result payload.

use cache_core::{id_from_value, DeviceId, Error, Payload, Result, SelectorConfig};
use cache_core::{MODEL_ID_FIELD, MODEL_STATUS_FIELD, RESERVED_ALL_DEVICES};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument, warn};

use crate::activation::EndpointActivation;
use crate::record::required_id;
use crate::tracker::{ResultTracker, StatusTracker};

/// Selects a ready device for an endpoint and model
#[derive(Debug)]
pub struct IdleDeviceSelector {
    status: StatusTracker,
    results: ResultTracker,
    activation: EndpointActivation,

    /// `model_status` token meaning "deployed"
    deployed_status: String,

    /// Shuffle source
    rng: Mutex<ChaCha8Rng>,
}

impl IdleDeviceSelector {
    /// Create a selector from its collaborators
    ///
    /// Uses the configured seed, or a random one.
    pub fn new(
        status: StatusTracker,
        results: ResultTracker,
        activation: EndpointActivation,
        config: &SelectorConfig,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            status,
            results,
            activation,
            deployed_status: config.deployed_status.clone(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Devices reporting `model_id` as deployed, in status list order
    ///
    /// A `model_status` that is neither a string nor a number never equals
    /// the deployed token. A status without `model_status` is a decode error.
    pub async fn deployed_devices(
        &self,
        endpoint_id: &str,
        model_id: &str,
    ) -> Result<Vec<DeviceId>> {
        let mut devices = Vec::new();
        for raw in self.status.list(endpoint_id).await? {
            let (device_id, status) = StatusTracker::decode(&raw)?;
            if device_id == RESERVED_ALL_DEVICES {
                continue;
            }

            let status_model = required_id(&status, MODEL_ID_FIELD, &device_id)?;
            let model_status = status.get(MODEL_STATUS_FIELD).ok_or_else(|| {
                Error::decode(format!(
                    "status of device {} has no `{}`",
                    device_id, MODEL_STATUS_FIELD
                ))
            })?;
            let deployed = id_from_value(model_status)
                .is_some_and(|token| token == self.deployed_status);
            if status_model == model_id && deployed {
                devices.push(device_id);
            }
        }
        Ok(devices)
    }

    /// Result payload of a randomly chosen deployed device
    ///
    /// Returns `None` when the endpoint is inactive, when no device reports
    /// the model as deployed, or when the chosen device has not published a
    /// result for the model. A chosen device without a result is not
    /// replaced by another candidate; callers retry.
    #[instrument(skip(self))]
    pub async fn select(&self, endpoint_id: &str, model_id: &str) -> Result<Option<Payload>> {
        if !self.activation.is_active(endpoint_id).await? {
            debug!("Endpoint inactive");
            return Ok(None);
        }

        let mut candidates = self.deployed_devices(endpoint_id, model_id).await?;
        if candidates.is_empty() {
            debug!("No deployed device");
            return Ok(None);
        }

        let candidate_count = candidates.len();
        let chosen = {
            let mut rng = self.rng.lock();
            candidates.shuffle(&mut *rng);
            candidates.swap_remove(0)
        };
        debug!(candidates = candidate_count, device = %chosen, "Chose idle device");

        for raw in self.results.list(endpoint_id).await? {
            let (device_id, result) = ResultTracker::decode(&raw)?;
            let result_model = required_id(&result, MODEL_ID_FIELD, &device_id)?;
            if device_id == chosen && result_model == model_id {
                return Ok(Some(result));
            }
        }

        warn!(device = %chosen, "Chosen device has no result for model");
        Ok(None)
    }
}
