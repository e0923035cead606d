//! Model deployment cache facade
//!
//! Bundles every component over one shared store handle. Build one per
//! process at startup and pass it (or clones of it) to whoever needs it.

use std::sync::Arc;

use cache_core::{CacheConfig, DeviceId, MonitorMetricsRecord, Payload, Result, SelectorConfig};
use cache_store::{StoreHandle, StoreHandleRef};

use crate::activation::EndpointActivation;
use crate::metrics::{MetricsCursor, MetricsLog};
use crate::selector::IdleDeviceSelector;
use crate::tracker::{ResultTracker, StatusTracker};

/// Shared deployment bookkeeping for all endpoints
#[derive(Debug, Clone)]
pub struct ModelCache {
    handle: StoreHandleRef,
    status: StatusTracker,
    results: ResultTracker,
    activation: EndpointActivation,
    metrics: MetricsLog,
    selector: Arc<IdleDeviceSelector>,
}

impl ModelCache {
    /// Create a cache that connects to the configured store on first use
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let handle = StoreHandle::new(config.store).shared();
        Ok(Self::with_handle(handle, &config.selector))
    }

    /// Create a cache over an existing store handle
    pub fn with_handle(handle: StoreHandleRef, selector: &SelectorConfig) -> Self {
        let status = StatusTracker::new(Arc::clone(&handle));
        let results = ResultTracker::new(Arc::clone(&handle));
        let activation = EndpointActivation::new(status.clone());
        let metrics = MetricsLog::new(Arc::clone(&handle));
        let selector = Arc::new(IdleDeviceSelector::new(
            status.clone(),
            results.clone(),
            activation.clone(),
            selector,
        ));

        Self {
            handle,
            status,
            results,
            activation,
            metrics,
            selector,
        }
    }

    /// Cache over a fresh in-process memory store
    pub fn memory() -> Self {
        Self::with_handle(StoreHandle::memory().shared(), &SelectorConfig::default())
    }

    pub fn handle(&self) -> &StoreHandleRef {
        &self.handle
    }

    pub fn status_tracker(&self) -> &StatusTracker {
        &self.status
    }

    pub fn result_tracker(&self) -> &ResultTracker {
        &self.results
    }

    pub fn selector(&self) -> &IdleDeviceSelector {
        &self.selector
    }

    // Device status

    pub async fn upsert_status(
        &self,
        endpoint_id: &str,
        device_id: &str,
        status: Payload,
    ) -> Result<()> {
        self.status.upsert(endpoint_id, device_id, status).await
    }

    pub async fn list_status(&self, endpoint_id: &str) -> Result<Vec<String>> {
        self.status.list(endpoint_id).await
    }

    pub async fn list_status_count(&self, endpoint_id: &str) -> Result<usize> {
        self.status.count(endpoint_id).await
    }

    pub fn decode_status(raw: &str) -> Result<(DeviceId, Payload)> {
        StatusTracker::decode(raw)
    }

    // Deployment results

    pub async fn upsert_result(
        &self,
        endpoint_id: &str,
        device_id: &str,
        result: Payload,
    ) -> Result<()> {
        self.results.upsert(endpoint_id, device_id, result).await
    }

    pub async fn list_result(&self, endpoint_id: &str) -> Result<Vec<String>> {
        self.results.list(endpoint_id).await
    }

    pub async fn list_result_count(&self, endpoint_id: &str) -> Result<usize> {
        self.results.count(endpoint_id).await
    }

    pub fn decode_result(raw: &str) -> Result<(DeviceId, Payload)> {
        ResultTracker::decode(raw)
    }

    // Endpoint activation

    pub async fn set_endpoint_active(&self, endpoint_id: &str, active: bool) -> Result<()> {
        self.activation.set_active(endpoint_id, active).await
    }

    pub async fn is_endpoint_active(&self, endpoint_id: &str) -> Result<bool> {
        self.activation.is_active(endpoint_id).await
    }

    // Monitoring metrics

    pub async fn append_metrics(
        &self,
        endpoint_id: &str,
        record: &MonitorMetricsRecord,
    ) -> Result<()> {
        self.metrics.append(endpoint_id, record).await
    }

    pub async fn latest_metrics(&self, endpoint_id: &str) -> Result<Option<String>> {
        self.metrics.latest(endpoint_id).await
    }

    pub async fn metrics_at(&self, endpoint_id: &str, index: i64) -> Result<(Option<String>, i64)> {
        self.metrics.at(endpoint_id, index).await
    }

    pub fn decode_metrics(raw: &str) -> Result<MonitorMetricsRecord> {
        MetricsLog::decode(raw)
    }

    pub fn metrics_cursor(&self, endpoint_id: impl Into<String>) -> MetricsCursor {
        self.metrics.cursor(endpoint_id)
    }

    // Routing

    /// Result payload of a ready device serving `model_id`, if any
    pub async fn select_idle_device(
        &self,
        endpoint_id: &str,
        model_id: &str,
    ) -> Result<Option<Payload>> {
        self.selector.select(endpoint_id, model_id).await
    }
}
