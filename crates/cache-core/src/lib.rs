//! Cache Core - Foundation for the model deployment cache
//!
//! Provides core types, error handling, and configuration shared by the
//! store backends and the deployment trackers.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CacheConfig, SelectorConfig, StoreBackend, StoreConfig, UpsertMode};
pub use error::{Error, Result};
pub use types::*;
