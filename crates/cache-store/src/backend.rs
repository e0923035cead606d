//! List store trait definition
//!
//! Defines the async interface that all store backends must implement.

use async_trait::async_trait;
use cache_core::Result;

/// Async trait for ordered list stores
///
/// Every method is one atomic operation on the backing store. Sequences of
/// calls are not isolated from other writers.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// All elements of the list at `key`, oldest first
    ///
    /// A missing key yields an empty list.
    async fn range(&self, key: &str) -> Result<Vec<String>>;

    /// Remove every element equal to `value`
    ///
    /// # Returns
    /// Number of elements removed
    async fn remove(&self, key: &str, value: &str) -> Result<u64>;

    /// Append `value`, creating the list if needed
    ///
    /// # Returns
    /// Length of the list after the push
    async fn push(&self, key: &str, value: String) -> Result<u64>;

    /// Element at `index`; negative indices count from the end
    async fn index(&self, key: &str, index: i64) -> Result<Option<String>>;

    /// Check if a list exists at `key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Atomically replace the first JSON element whose `field` equals `id`
    ///
    /// Removes that element (and any byte-identical copies), then appends
    /// `value`, as one store operation. Ids compare by their string form.
    ///
    /// # Returns
    /// `Some(true)` if an element was replaced, `Some(false)` if `value` was
    /// only appended, `None` if the backend cannot do this atomically.
    async fn replace_where(
        &self,
        _key: &str,
        _field: &str,
        _id: &str,
        _value: String,
    ) -> Result<Option<bool>> {
        Ok(None)
    }
}
