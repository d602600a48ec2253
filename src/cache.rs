//! Materialize-or-compute collaborators for fitted models.
//!
//! The engine never persists anything itself. A cache is handed a stable key
//! and a producer; it either returns a model it already holds or runs the
//! producer and keeps the result. Any closure with the right signature is a
//! cache, so callers can plug in their own storage.

use std::sync::{Arc, Mutex, MutexGuard};

use ahash::AHashMap;

use crate::error::Result;
use crate::model::FittedModel;

pub trait ModelCache {
    /// Return the model stored under `key`, or run `produce`, store and return its result.
    ///
    /// Producer errors are passed through and nothing is stored.
    fn materialize(
        &self,
        key: &str,
        produce: &mut dyn FnMut() -> Result<FittedModel>,
    ) -> Result<Arc<FittedModel>>;
}

impl<F> ModelCache for F
where
    F: Fn(&str, &mut dyn FnMut() -> Result<FittedModel>) -> Result<Arc<FittedModel>>,
{
    fn materialize(
        &self,
        key: &str,
        produce: &mut dyn FnMut() -> Result<FittedModel>,
    ) -> Result<Arc<FittedModel>> {
        self(key, produce)
    }
}

/// Always computes, never stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl ModelCache for NullCache {
    fn materialize(
        &self,
        key: &str,
        produce: &mut dyn FnMut() -> Result<FittedModel>,
    ) -> Result<Arc<FittedModel>> {
        log::debug!("No cache for '{}', fitting", key);
        Ok(Arc::new(produce()?))
    }
}

/// Process-local cache; each key is computed at most once.
///
/// The model map is only locked for lookups and inserts. A fit runs under a
/// per-key gate, so concurrent callers for the same key wait for it while
/// other keys, `contains` and `len` stay available.
#[derive(Debug, Default)]
pub struct MemoryCache {
    models: Mutex<AHashMap<String, Arc<FittedModel>>>,
    gates: Mutex<AHashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.models).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<Arc<FittedModel>> {
        lock(&self.models).get(key).cloned()
    }

    fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(lock(&self.gates).entry(key.to_string()).or_default())
    }
}

/// Lock, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ModelCache for MemoryCache {
    fn materialize(
        &self,
        key: &str,
        produce: &mut dyn FnMut() -> Result<FittedModel>,
    ) -> Result<Arc<FittedModel>> {
        if let Some(model) = self.lookup(key) {
            log::info!("Loaded fitted model '{}' from memory", key);
            return Ok(model);
        }

        let gate = self.gate(key);
        let _fitting = lock(&*gate);
        // Another caller may have finished this key while we waited.
        if let Some(model) = self.lookup(key) {
            log::info!("Loaded fitted model '{}' from memory", key);
            return Ok(model);
        }

        let model = Arc::new(produce()?);
        lock(&self.models).insert(key.to_string(), Arc::clone(&model));
        log::info!("Stored fitted model '{}' in memory", key);
        Ok(model)
    }
}
