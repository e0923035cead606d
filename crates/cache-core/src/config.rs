//! Cache configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Error, Result};

/// Address sentinel meaning "the store on this host"
pub const LOCAL_ADDRESS: &str = "local";

/// Host used when the address is [`LOCAL_ADDRESS`]
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Default port of the store family
pub const DEFAULT_STORE_PORT: u16 = 6379;

/// Default value device agents write when a model is deployed
pub const DEFAULT_DEPLOYED_STATUS: &str = "DEPLOYED";

/// Main cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Store connection settings
    pub store: StoreConfig,

    /// Idle device selection settings
    pub selector: SelectorConfig,
}

impl CacheConfig {
    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.selector.validate()
    }
}

/// Store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend type
    pub backend: StoreBackend,

    /// Store address, or "local" for the loopback host
    pub address: String,

    /// Store port
    pub port: u16,

    /// Connection establishment timeout
    #[serde(with = "duration_ms")]
    pub connect_timeout: Duration,

    /// How per-device upserts are written
    pub upsert_mode: UpsertMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            address: LOCAL_ADDRESS.to_string(),
            port: DEFAULT_STORE_PORT,
            connect_timeout: Duration::from_secs(5),
            upsert_mode: UpsertMode::Atomic,
        }
    }
}

impl StoreConfig {
    /// Configuration for a store at `address:port`
    pub fn new(backend: StoreBackend, address: impl Into<String>, port: u16) -> Self {
        Self {
            backend,
            address: address.into(),
            port,
            ..Default::default()
        }
    }

    /// Host to dial, with the "local" sentinel resolved
    pub fn resolved_host(&self) -> &str {
        let address = self.address.trim();
        if address.is_empty() || address == LOCAL_ADDRESS {
            LOOPBACK_HOST
        } else {
            address
        }
    }

    /// `host:port` of the store
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.resolved_host(), self.port)
    }

    /// Reject settings that can never connect
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::InvalidConfig {
                message: "store port must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Store backend type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process list store
    Memory,

    /// Redis-compatible server (requires the `redis` feature)
    Redis,
}

impl Default for StoreBackend {
    /// Redis when built with the `redis` feature, in-process otherwise
    fn default() -> Self {
        if cfg!(feature = "redis") {
            StoreBackend::Redis
        } else {
            StoreBackend::Memory
        }
    }
}

/// Write strategy for per-device upserts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UpsertMode {
    /// Single store-side replace when the backend supports it,
    /// scan-then-write otherwise
    Atomic,

    /// Always scan, remove the old record, then append.
    /// Concurrent writers for one device may leave a transient duplicate.
    ScanThenWrite,
}

/// Idle device selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// `model_status` value that marks a device as deployed
    pub deployed_status: String,

    /// Fixed shuffle seed for reproducible selection
    pub seed: Option<u64>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            deployed_status: DEFAULT_DEPLOYED_STATUS.to_string(),
            seed: None,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.deployed_status.is_empty() {
            return Err(Error::InvalidConfig {
                message: "deployed status token must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Durations as integer milliseconds
mod duration_ms {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
