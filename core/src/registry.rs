// ticketry/src/registry.rs

//! Defines `Registry<K, T>`, the process-wide map from typed ids to actions,
//! responders, events and other startup-registered entries.
//!
//! A registry is an ordinary value: construct one at startup and pass it by
//! reference to whatever needs lookups. Tests build a fresh one each.

use crate::error::{TicketryError, TicketryResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{event, Level};

/// Entries that carry their own registry key.
pub trait Keyed<K> {
  fn key(&self) -> K;
}

/// What `Registry::add` does when the id is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
  /// Fail with `TicketryError::DuplicateId`.
  #[default]
  Reject,
  /// Replace the existing entry and log a warning. The entry keeps its original position.
  Replace,
}

/// Trait bound shorthand for registry keys.
pub trait RegistryKey: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static {}

impl<K> RegistryKey for K where K: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static {}

struct RegistryInner<K, T> {
  entries: HashMap<K, Arc<T>>,
  // registration order, used by `ids`, `all`, `find` and `loop_all`
  order: Vec<K>,
}

pub struct Registry<K, T>
where
  K: RegistryKey,
  T: Send + Sync + 'static,
{
  name: String,
  policy: DuplicatePolicy,
  inner: RwLock<RegistryInner<K, T>>,
}

impl<K, T> Registry<K, T>
where
  K: RegistryKey,
  T: Send + Sync + 'static,
{
  /// Creates an empty registry that rejects duplicate ids.
  pub fn new(name: impl Into<String>) -> Self {
    Self::with_policy(name, DuplicatePolicy::Reject)
  }

  pub fn with_policy(name: impl Into<String>, policy: DuplicatePolicy) -> Self {
    Self {
      name: name.into(),
      policy,
      inner: RwLock::new(RegistryInner {
        entries: HashMap::new(),
        order: Vec::new(),
      }),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn policy(&self) -> DuplicatePolicy {
    self.policy
  }

  /// Adds an entry under its own key and returns the shared handle.
  pub fn add(&self, entry: T) -> TicketryResult<Arc<T>>
  where
    T: Keyed<K>,
  {
    let key = entry.key();
    self.insert(key, entry)
  }

  /// Adds an entry under an explicit key.
  pub fn insert(&self, key: K, entry: T) -> TicketryResult<Arc<T>> {
    let entry = Arc::new(entry);
    let mut inner = self.inner.write();
    if inner.entries.contains_key(&key) {
      match self.policy {
        DuplicatePolicy::Reject => {
          event!(Level::ERROR, registry = %self.name, id = %key, "Duplicate id rejected.");
          return Err(TicketryError::DuplicateId {
            registry: self.name.clone(),
            id: key.to_string(),
          });
        }
        DuplicatePolicy::Replace => {
          event!(Level::WARN, registry = %self.name, id = %key, "Replacing existing entry with duplicate id.");
          inner.entries.insert(key, Arc::clone(&entry));
          return Ok(entry);
        }
      }
    }
    event!(Level::DEBUG, registry = %self.name, id = %key, "Entry added.");
    inner.order.push(key.clone());
    inner.entries.insert(key, Arc::clone(&entry));
    Ok(entry)
  }

  /// Looks up an entry. A missing id is a configuration error, not a runtime condition.
  pub fn get(&self, key: &K) -> TicketryResult<Arc<T>> {
    self.try_get(key).ok_or_else(|| {
      event!(Level::ERROR, registry = %self.name, id = %key, "Lookup of unregistered id.");
      TicketryError::NotFound {
        registry: self.name.clone(),
        id: key.to_string(),
      }
    })
  }

  pub fn try_get(&self, key: &K) -> Option<Arc<T>> {
    self.inner.read().entries.get(key).cloned()
  }

  pub fn exists(&self, key: &K) -> bool {
    self.inner.read().entries.contains_key(key)
  }

  pub fn remove(&self, key: &K) -> Option<Arc<T>> {
    let mut inner = self.inner.write();
    let removed = inner.entries.remove(key);
    if removed.is_some() {
      inner.order.retain(|k| k != key);
    }
    event!(Level::DEBUG, registry = %self.name, id = %key, found = removed.is_some(), "Entry removed.");
    removed
  }

  pub fn len(&self) -> usize {
    self.inner.read().order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Ids in registration order.
  pub fn ids(&self) -> Vec<K> {
    self.inner.read().order.clone()
  }

  /// Entries in registration order.
  pub fn all(&self) -> Vec<Arc<T>> {
    let inner = self.inner.read();
    inner
      .order
      .iter()
      .filter_map(|k| inner.entries.get(k).cloned())
      .collect()
  }

  /// First entry, in registration order, accepted by `predicate`.
  pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<Arc<T>> {
    let inner = self.inner.read();
    inner
      .order
      .iter()
      .filter_map(|k| inner.entries.get(k))
      .find(|entry| predicate(entry.as_ref()))
      .cloned()
  }

  /// Awaits `f` for every entry, one after another, in registration order.
  /// Works on a snapshot, so `f` may add or remove entries. Stops at the first error.
  pub async fn loop_all<F, Fut, Err>(&self, mut f: F) -> Result<(), Err>
  where
    F: FnMut(K, Arc<T>) -> Fut,
    Fut: Future<Output = Result<(), Err>>,
  {
    let snapshot: Vec<(K, Arc<T>)> = {
      let inner = self.inner.read();
      inner
        .order
        .iter()
        .filter_map(|k| inner.entries.get(k).map(|e| (k.clone(), Arc::clone(e))))
        .collect()
    }; // guard dropped before awaiting
    for (key, entry) in snapshot {
      f(key, entry).await?;
    }
    Ok(())
  }
}
