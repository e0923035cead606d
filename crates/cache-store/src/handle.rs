//! Process-wide store connection context
//!
//! One [`StoreHandle`] is built at startup and shared by reference with every
//! component that needs the store. The underlying connection is established
//! on first use and reused for the life of the handle.

use std::sync::Arc;

use cache_core::{Result, StoreBackend, StoreConfig};
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::{ListStore, MemoryStore};

/// Lazily connected, shareable store handle
pub struct StoreHandle {
    config: StoreConfig,
    store: OnceCell<Arc<dyn ListStore>>,
}

/// Thread-safe shared store handle
pub type StoreHandleRef = Arc<StoreHandle>;

impl StoreHandle {
    /// Create a handle that connects on first use
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    /// Create a handle for the default "local" address and port
    pub fn local(backend: StoreBackend) -> Self {
        Self::new(StoreConfig {
            backend,
            ..Default::default()
        })
    }

    /// Create a handle around an already connected store
    pub fn with_store(config: StoreConfig, store: Arc<dyn ListStore>) -> Self {
        Self {
            config,
            store: OnceCell::new_with(Some(store)),
        }
    }

    /// Handle over a fresh in-process memory store
    pub fn memory() -> Self {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        };
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Wrap in an `Arc` for sharing
    pub fn shared(self) -> StoreHandleRef {
        Arc::new(self)
    }

    /// Connection settings this handle was created with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// True once the connection has been established
    pub fn is_connected(&self) -> bool {
        self.store.initialized()
    }

    /// The connected store, connecting first if needed
    ///
    /// Concurrent first callers share one connection attempt. A failed
    /// attempt leaves the handle unconnected so a later call may try again.
    ///
    /// # Errors
    /// `Error::Connection` if the store is unreachable,
    /// `Error::StoreUnavailable` if the backend was not compiled in.
    pub async fn store(&self) -> Result<Arc<dyn ListStore>> {
        self.store
            .get_or_try_init(|| connect(&self.config))
            .await
            .cloned()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[instrument(skip(config), fields(backend = ?config.backend, endpoint = %config.endpoint()))]
async fn connect(config: &StoreConfig) -> Result<Arc<dyn ListStore>> {
    config.validate()?;

    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-process memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis => Ok(Arc::new(crate::RedisStore::connect(config).await?)),
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis => Err(cache_core::Error::StoreUnavailable {
            backend: "redis".to_string(),
        }),
    }
}
