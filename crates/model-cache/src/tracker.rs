//! Per-endpoint device record lists with per-device upsert
//!
//! One tracker type serves both the status list and the result list; the
//! [`RecordKind`] parameter picks the key tag and payload field.

use std::marker::PhantomData;

use cache_core::{DeviceId, Payload, Result, UpsertMode};
use cache_store::StoreHandleRef;
use tracing::{debug, instrument, warn};

use crate::record::{self, RecordKind, ResultKind, StatusKind, DEVICE_ID_FIELD};

/// Tracker of device status records
pub type StatusTracker = DeviceTracker<StatusKind>;

/// Tracker of device deployment result records
pub type ResultTracker = DeviceTracker<ResultKind>;

/// Ordered per-endpoint list holding at most one record per device
#[derive(Debug, Clone)]
pub struct DeviceTracker<K: RecordKind> {
    /// Shared store connection
    handle: StoreHandleRef,

    /// How upserts are written
    upsert_mode: UpsertMode,

    _kind: PhantomData<K>,
}

impl<K: RecordKind> DeviceTracker<K> {
    /// Create a tracker using the handle's configured upsert mode
    pub fn new(handle: StoreHandleRef) -> Self {
        let upsert_mode = handle.config().upsert_mode;
        Self::with_mode(handle, upsert_mode)
    }

    /// Create a tracker with an explicit upsert mode
    pub fn with_mode(handle: StoreHandleRef, upsert_mode: UpsertMode) -> Self {
        Self {
            handle,
            upsert_mode,
            _kind: PhantomData,
        }
    }

    pub fn upsert_mode(&self) -> UpsertMode {
        self.upsert_mode
    }

    /// Write `payload` as the record of `device_id`, replacing any earlier one
    ///
    /// The new record always lands at the end of the list. In
    /// [`UpsertMode::ScanThenWrite`] (or when the backend has no atomic
    /// replace) the scan, removal and append are separate store operations,
    /// so concurrent upserts for the same device may leave a duplicate until
    /// the next upsert. Other devices' records are never touched.
    #[instrument(skip(self, payload), fields(kind = K::NAME))]
    pub async fn upsert(&self, endpoint_id: &str, device_id: &str, payload: Payload) -> Result<()> {
        let store = self.handle.store().await?;
        let key = K::key(endpoint_id);
        let raw = record::encode::<K>(device_id, payload);

        if self.upsert_mode == UpsertMode::Atomic {
            if let Some(replaced) = store
                .replace_where(&key, DEVICE_ID_FIELD, device_id, raw.clone())
                .await?
            {
                debug!(replaced, "Upserted device record atomically");
                return Ok(());
            }
        }

        let mut previous = None;
        let mut matches = 0usize;
        for item in store.range(&key).await? {
            let (cached_id, _) = record::decode::<K>(&item)?;
            if cached_id == device_id {
                matches += 1;
                if previous.is_none() {
                    previous = Some(item);
                }
            }
        }

        if matches > 1 {
            warn!(matches, "Duplicate device records observed");
        }

        if let Some(previous) = previous {
            store.remove(&key, &previous).await?;
        }
        store.push(&key, raw).await?;

        debug!(replaced = matches > 0, "Upserted device record");
        Ok(())
    }

    /// Raw records of an endpoint in list order
    ///
    /// An endpoint nothing was ever written for yields an empty list.
    pub async fn list(&self, endpoint_id: &str) -> Result<Vec<String>> {
        let store = self.handle.store().await?;
        store.range(&K::key(endpoint_id)).await
    }

    /// Number of raw records of an endpoint
    pub async fn count(&self, endpoint_id: &str) -> Result<usize> {
        Ok(self.list(endpoint_id).await?.len())
    }

    /// Decoded records of an endpoint in list order
    ///
    /// Fails on the first malformed record.
    pub async fn records(&self, endpoint_id: &str) -> Result<Vec<(DeviceId, Payload)>> {
        self.list(endpoint_id)
            .await?
            .iter()
            .map(|raw| Self::decode(raw))
            .collect()
    }

    /// Split a raw record into device id and payload
    pub fn decode(raw: &str) -> Result<(DeviceId, Payload)> {
        record::decode::<K>(raw)
    }
}
