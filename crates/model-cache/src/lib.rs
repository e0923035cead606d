//! Model deployment cache for federated model serving
//!
//! This crate tracks, per model endpoint:
//! - **Device status**: the last state each device reported for its model
//! - **Deployment results**: the routing payload each device published
//! - **Activation**: whether the endpoint serves traffic at all
//! - **Monitoring metrics**: an append-only latency/throughput series
//!
//! and selects a ready device for an inference request. Every record lives
//! in a shared ordered-list store so device agents, the coordinator and the
//! metrics reporter in separate processes see the same state.
//!
//! # Example
//!
//! ```rust
//! use model_cache::ModelCache;
//! use serde_json::json;
//!
//! # async fn example() -> cache_core::Result<()> {
//! let cache = ModelCache::memory();
//!
//! cache.set_endpoint_active("ep1", true).await?;
//! let status = json!({"model_id": "m1", "model_status": "DEPLOYED"});
//! cache.upsert_status("ep1", "d1", status.as_object().unwrap().clone()).await?;
//! let result = json!({"model_id": "m1", "model_url": "http://10.0.0.3:2345/predict"});
//! cache.upsert_result("ep1", "d1", result.as_object().unwrap().clone()).await?;
//!
//! let routed = cache.select_idle_device("ep1", "m1").await?;
//! assert!(routed.is_some());
//! # Ok(())
//! # }
//! ```

mod activation;
mod cache;
pub mod keys;
mod metrics;
pub mod record;
mod selector;
mod tracker;

// Re-export main types
pub use activation::EndpointActivation;
pub use cache::ModelCache;
pub use metrics::{MetricsCursor, MetricsLog};
pub use record::{RecordKind, ResultKind, StatusKind};
pub use selector::IdleDeviceSelector;
pub use tracker::{DeviceTracker, ResultTracker, StatusTracker};

// Re-export shared types for convenience
pub use cache_core::{
    CacheConfig, DeviceId, EndpointId, Error, ModelId, MonitorMetricsRecord, Payload, Result,
    SelectorConfig, StoreBackend, StoreConfig, UpsertMode, RESERVED_ALL_DEVICES,
};
pub use cache_store::{ListStore, MemoryStore, StoreHandle, StoreHandleRef};
