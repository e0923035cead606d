//! Cache Store - Ordered list stores backing the model deployment cache
//!
//! Provides async list operations with support for:
//! - In-process memory store (always available)
//! - Redis / Redis-compatible servers (with `redis` feature)
//!
//! # Example
//!
//! ```no_run
//! use cache_store::{ListStore, MemoryStore};
//!
//! # async fn example() -> cache_core::Result<()> {
//! let store = MemoryStore::new();
//! store.push("FEDML_MODEL_DEPLOYMENT_MONITOR-ep1", "{}".to_string()).await?;
//! let items = store.range("FEDML_MODEL_DEPLOYMENT_MONITOR-ep1").await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod handle;
mod memory;

#[cfg(feature = "redis")]
mod redis_store;

pub use backend::ListStore;
pub use handle::{StoreHandle, StoreHandleRef};
pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
