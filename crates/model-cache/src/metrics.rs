//! Append-only monitoring metrics log per endpoint

use cache_core::{MonitorMetricsRecord, Result};
use cache_store::StoreHandleRef;
use tracing::{debug, instrument};

use crate::keys::monitor_key;

/// Time series of serving metrics, oldest first
#[derive(Debug, Clone)]
pub struct MetricsLog {
    handle: StoreHandleRef,
}

impl MetricsLog {
    pub fn new(handle: StoreHandleRef) -> Self {
        Self { handle }
    }

    /// Append a sample; earlier samples are never replaced
    #[instrument(skip(self, record))]
    pub async fn append(&self, endpoint_id: &str, record: &MonitorMetricsRecord) -> Result<()> {
        let store = self.handle.store().await?;
        let raw = serde_json::to_string(record)?;
        let len = store.push(&monitor_key(endpoint_id), raw).await?;
        debug!(len, "Appended monitor metrics");
        Ok(())
    }

    /// Most recent raw sample, or `None` if nothing was ever appended
    pub async fn latest(&self, endpoint_id: &str) -> Result<Option<String>> {
        let store = self.handle.store().await?;
        let key = monitor_key(endpoint_id);
        if !store.exists(&key).await? {
            return Ok(None);
        }
        store.index(&key, -1).await
    }

    /// Raw sample at `index` plus the index to read next
    ///
    /// An endpoint without metrics yields `(None, 0)` so a caller's cursor
    /// starts over. Otherwise the sample (`None` past the end) is returned
    /// with `index + 1`, saturating at `i64::MAX`.
    pub async fn at(&self, endpoint_id: &str, index: i64) -> Result<(Option<String>, i64)> {
        let store = self.handle.store().await?;
        let key = monitor_key(endpoint_id);
        if !store.exists(&key).await? {
            return Ok((None, 0));
        }
        let item = store.index(&key, index).await?;
        Ok((item, index.saturating_add(1)))
    }

    /// Parse a raw sample
    pub fn decode(raw: &str) -> Result<MonitorMetricsRecord> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Forward cursor over the samples of an endpoint
    pub fn cursor(&self, endpoint_id: impl Into<String>) -> MetricsCursor {
        MetricsCursor {
            log: self.clone(),
            endpoint_id: endpoint_id.into(),
            position: 0,
        }
    }
}

/// Reads samples in append order, one per call
#[derive(Debug, Clone)]
pub struct MetricsCursor {
    log: MetricsLog,
    endpoint_id: String,
    position: i64,
}

impl MetricsCursor {
    /// Next decoded sample, if one has been appended
    ///
    /// Stays in place at the end of the log so later appends are picked up.
    /// Resets to the start if the endpoint has no metrics.
    pub async fn next(&mut self) -> Result<Option<MonitorMetricsRecord>> {
        let (item, next) = self.log.at(&self.endpoint_id, self.position).await?;
        match item {
            Some(raw) => {
                let record = MetricsLog::decode(&raw)?;
                self.position = next;
                Ok(Some(record))
            }
            None => {
                if next == 0 {
                    self.position = 0;
                }
                Ok(None)
            }
        }
    }

    /// Index of the next sample to read
    pub fn position(&self) -> i64 {
        self.position
    }
}
