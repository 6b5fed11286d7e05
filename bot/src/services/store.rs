// ticketry-bot/src/services/store.rs

//! Persistent key-value storage, grouped in categories (`tickets`, `users`, ...).

use crate::errors::{BotError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{event, Level};

#[async_trait]
pub trait Store: Send + Sync {
  async fn get(&self, category: &str, key: &str) -> Result<Option<Value>>;

  /// Returns `true` when an existing value was overwritten.
  async fn set(&self, category: &str, key: &str, value: Value) -> Result<bool>;

  /// Returns `true` when a value was removed.
  async fn delete(&self, category: &str, key: &str) -> Result<bool>;

  /// All entries of a category, ordered by key.
  async fn get_category(&self, category: &str) -> Result<Vec<(String, Value)>>;
}

/// In-memory store. Categories passed to `fail_writes` reject `set` and `delete`.
#[derive(Default)]
pub struct MemoryStore {
  categories: RwLock<HashMap<String, BTreeMap<String, Value>>>,
  read_only: RwLock<HashSet<String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes writes to `category` fail with `BotError::Store`.
  pub fn fail_writes(&self, category: &str) {
    self.read_only.write().insert(category.to_string());
  }

  fn check_writable(&self, category: &str) -> Result<()> {
    if self.read_only.read().contains(category) {
      return Err(BotError::Store(format!("Category '{}' is read-only", category)));
    }
    Ok(())
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn get(&self, category: &str, key: &str) -> Result<Option<Value>> {
    Ok(self.categories.read().get(category).and_then(|entries| entries.get(key)).cloned())
  }

  async fn set(&self, category: &str, key: &str, value: Value) -> Result<bool> {
    self.check_writable(category)?;
    let replaced = self
      .categories
      .write()
      .entry(category.to_string())
      .or_default()
      .insert(key.to_string(), value)
      .is_some();
    event!(Level::TRACE, %category, %key, replaced, "Store value set.");
    Ok(replaced)
  }

  async fn delete(&self, category: &str, key: &str) -> Result<bool> {
    self.check_writable(category)?;
    let removed = self
      .categories
      .write()
      .get_mut(category)
      .map(|entries| entries.remove(key).is_some())
      .unwrap_or(false);
    Ok(removed)
  }

  async fn get_category(&self, category: &str) -> Result<Vec<(String, Value)>> {
    Ok(
      self
        .categories
        .read()
        .get(category)
        .map(|entries| entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default(),
    )
  }
}
