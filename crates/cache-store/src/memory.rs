//! In-process memory store backend
//!
//! Each list lives behind its own map shard lock, so every trait method is
//! atomic with respect to other callers sharing the same store.

use async_trait::async_trait;
use cache_core::{id_from_value, Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::ListStore;

/// In-process list store
///
/// Mirrors the list semantics of a Redis-compatible server:
/// - Lists are created on first push
/// - A list whose last element is removed stops existing
/// - Negative indices count from the end
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: DashMap<String, Vec<String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lists currently held
    pub fn key_count(&self) -> usize {
        self.lists.len()
    }
}

fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

fn element_matches(element: &str, field: &str, id: &str) -> Result<bool> {
    let value: serde_json::Value = serde_json::from_str(element)?;
    let record = value
        .as_object()
        .ok_or_else(|| Error::decode(format!("list element is not an object: {}", element)))?;
    let found = record
        .get(field)
        .and_then(id_from_value)
        .ok_or_else(|| Error::decode(format!("list element has no usable `{}`", field)))?;
    Ok(found == id)
}

#[async_trait]
impl ListStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn range(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .lists
            .get(key)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    #[instrument(skip(self, value), fields(backend = "memory"))]
    async fn remove(&self, key: &str, value: &str) -> Result<u64> {
        let Entry::Occupied(mut entry) = self.lists.entry(key.to_string()) else {
            return Ok(0);
        };

        let before = entry.get().len();
        entry.get_mut().retain(|element| element != value);
        let removed = (before - entry.get().len()) as u64;

        if entry.get().is_empty() {
            entry.remove();
        }

        debug!(removed, "Removed list elements");
        Ok(removed)
    }

    #[instrument(skip(self, value), fields(backend = "memory"))]
    async fn push(&self, key: &str, value: String) -> Result<u64> {
        let mut list = self.lists.entry(key.to_string()).or_default();
        list.push(value);
        Ok(list.len() as u64)
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn index(&self, key: &str, index: i64) -> Result<Option<String>> {
        Ok(self.lists.get(key).and_then(|list| {
            resolve_index(list.len(), index).map(|position| list[position].clone())
        }))
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lists.contains_key(key))
    }

    #[instrument(skip(self, value), fields(backend = "memory"))]
    async fn replace_where(
        &self,
        key: &str,
        field: &str,
        id: &str,
        value: String,
    ) -> Result<Option<bool>> {
        let mut list = self.lists.entry(key.to_string()).or_default();

        let mut target = None;
        for element in list.iter() {
            if element_matches(element, field, id)? && target.is_none() {
                target = Some(element.clone());
            }
        }

        let replaced = match target {
            Some(old) => {
                list.retain(|element| *element != old);
                true
            }
            None => false,
        };
        list.push(value);

        debug!(replaced, "Replaced list element atomically");
        Ok(Some(replaced))
    }
}
