//! End-to-end serving simulation test
//!
//! Simulates the processes that share one deployment store:
//! - Device agents publishing status and results concurrently
//! - A coordinator activating the endpoint and routing requests
//! - A metrics reporter appending samples while a reader follows them
//! - Two writers racing on the same device record

use anyhow::Result;
use async_trait::async_trait;
use cache_core::{CacheConfig, SelectorConfig, StoreBackend, StoreConfig, UpsertMode};
use cache_store::{ListStore, MemoryStore, StoreHandle};
use model_cache::{ModelCache, MonitorMetricsRecord, Payload, StatusTracker};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio::time::sleep;

fn payload(value: serde_json::Value) -> Payload {
    value.as_object().cloned().expect("payload must be an object")
}

/// Memory store that holds every `range` caller at a barrier while armed,
/// so two upserts both finish their scan before either writes.
struct InterleavingStore {
    inner: MemoryStore,
    barrier: Barrier,
    armed: AtomicBool,
}

impl InterleavingStore {
    fn new(writers: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            barrier: Barrier::new(writers),
            armed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ListStore for InterleavingStore {
    fn backend_name(&self) -> &'static str {
        "interleaving"
    }

    async fn range(&self, key: &str) -> cache_core::Result<Vec<String>> {
        let items = self.inner.range(key).await?;
        if self.armed.load(Ordering::SeqCst) {
            self.barrier.wait().await;
        }
        Ok(items)
    }

    async fn remove(&self, key: &str, value: &str) -> cache_core::Result<u64> {
        self.inner.remove(key, value).await
    }

    async fn push(&self, key: &str, value: String) -> cache_core::Result<u64> {
        self.inner.push(key, value).await
    }

    async fn index(&self, key: &str, index: i64) -> cache_core::Result<Option<String>> {
        self.inner.index(key, index).await
    }

    async fn exists(&self, key: &str) -> cache_core::Result<bool> {
        self.inner.exists(key).await
    }

    async fn replace_where(
        &self,
        key: &str,
        field: &str,
        id: &str,
        value: String,
    ) -> cache_core::Result<Option<bool>> {
        self.inner.replace_where(key, field, id, value).await
    }
}

fn scan_then_write_config() -> StoreConfig {
    StoreConfig {
        backend: StoreBackend::Memory,
        upsert_mode: UpsertMode::ScanThenWrite,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_scan_then_write_race_duplicates_without_corruption() -> Result<()> {
    let store = Arc::new(InterleavingStore::new(2));
    let handle = StoreHandle::with_store(scan_then_write_config(), store.clone()).shared();
    let cache = ModelCache::with_handle(handle, &SelectorConfig::default());
    let ep = "ep-race";

    cache
        .upsert_status(ep, "d1", payload(json!({"model_id": "m1", "model_status": "DEPLOYING"})))
        .await?;
    cache
        .upsert_status(ep, "d2", payload(json!({"model_id": "m1", "model_status": "DEPLOYED"})))
        .await?;

    store.armed.store(true, Ordering::SeqCst);
    let writers: Vec<_> = ["agent", "coordinator"]
        .into_iter()
        .map(|writer| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let status = payload(json!({
                    "model_id": "m1",
                    "model_status": "DEPLOYED",
                    "writer": writer,
                }));
                cache.upsert_status(ep, "d1", status).await
            })
        })
        .collect();
    for writer in writers {
        writer.await??;
    }
    store.armed.store(false, Ordering::SeqCst);

    let records = StatusTracker::new(cache.handle().clone()).records(ep).await?;
    let d1: Vec<_> = records.iter().filter(|(id, _)| id == "d1").collect();
    let d2: Vec<_> = records.iter().filter(|(id, _)| id == "d2").collect();

    assert_eq!(d1.len(), 2, "both racing writers appended");
    let writers: HashSet<_> = d1.iter().map(|(_, p)| p["writer"].clone()).collect();
    assert_eq!(writers.len(), 2);
    assert_eq!(d2.len(), 1);
    assert_eq!(d2[0].1["model_status"], "DEPLOYED");
    Ok(())
}

#[tokio::test]
async fn test_atomic_upsert_closes_race() -> Result<()> {
    let store = Arc::new(InterleavingStore::new(2));
    store.armed.store(true, Ordering::SeqCst);
    let config = StoreConfig::new(StoreBackend::Memory, "local", 6379);
    let handle = StoreHandle::with_store(config, store.clone()).shared();
    let cache = ModelCache::with_handle(handle, &SelectorConfig::default());

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let status = payload(json!({
                    "model_id": "m1",
                    "model_status": "DEPLOYED",
                    "seq": i,
                }));
                cache.status_tracker().upsert("ep-atomic", "d1", status).await
            })
        })
        .collect();
    for writer in writers {
        writer.await??;
    }

    store.armed.store(false, Ordering::SeqCst);
    assert_eq!(cache.list_status_count("ep-atomic").await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_fleet_of_agents_and_router() -> Result<()> {
    let mut config = CacheConfig::default();
    config.store.backend = StoreBackend::Memory;
    config.selector.seed = Some(2024);
    let cache = ModelCache::new(config)?;
    let ep = uuid::Uuid::new_v4().to_string();

    cache.set_endpoint_active(&ep, true).await?;

    let agents: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            let ep = ep.clone();
            tokio::spawn(async move {
                let device = format!("device-{}", i);
                for state in ["INITIALIZING", "DEPLOYING", "DEPLOYED"] {
                    let status = payload(json!({"model_id": "yolo-v5", "model_status": state}));
                    cache.upsert_status(&ep, &device, status).await?;
                    sleep(Duration::from_millis(1)).await;
                }
                let result = payload(json!({
                    "model_id": "yolo-v5",
                    "model_url": format!("http://10.0.0.{}:2345/predict", i),
                }));
                cache.upsert_result(&ep, &device, result).await
            })
        })
        .collect();
    for agent in agents {
        agent.await??;
    }

    // 8 devices + activation record
    assert_eq!(cache.list_status_count(&ep).await?, 9);
    assert_eq!(cache.list_result_count(&ep).await?, 8);

    let mut urls = HashSet::new();
    for _ in 0..400 {
        let result = cache
            .select_idle_device(&ep, "yolo-v5")
            .await?
            .expect("every deployed device has a result");
        urls.insert(result["model_url"].as_str().unwrap_or_default().to_string());
    }
    assert_eq!(urls.len(), 8);

    assert!(cache.select_idle_device(&ep, "resnet").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_metrics_reporter_and_reader() -> Result<()> {
    let cache = ModelCache::memory();
    let reporter = {
        let cache = cache.clone();
        tokio::spawn(async move {
            for i in 1..=20 {
                let sample = MonitorMetricsRecord::new(
                    i as f64 * 12.5,
                    12.5,
                    i as f64,
                    2.0,
                    2.0,
                    1_700_000_000.0 + i as f64,
                );
                cache.append_metrics("ep-metrics", &sample).await?;
                sleep(Duration::from_millis(1)).await;
            }
            anyhow::Ok(())
        })
    };

    let mut cursor = cache.metrics_cursor("ep-metrics");
    let mut seen = Vec::new();
    while seen.len() < 20 {
        match cursor.next().await? {
            Some(sample) => seen.push(sample),
            None => sleep(Duration::from_millis(1)).await,
        }
    }
    reporter.await??;

    let requests: Vec<_> = seen.iter().map(|s| s.total_request_num).collect();
    let expected: Vec<_> = (1..=20).map(|i| i as f64).collect();
    assert_eq!(requests, expected);
    assert_eq!(cursor.position(), 20);
    Ok(())
}
