//! Compilation batches.
//!
//! While at least one batch is open, compilers can share expensive intermediate
//! values (a parsed source scene, a decoded image atlas) through
//! [`CompilationBatchCache::get_or_insert`]. The cache is emptied when the last open
//! batch closes.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use vellum_core::alloc::HashMap;
use vellum_core::hash::stable_hash64;
use vellum_core::profiling;

#[derive(Default)]
struct BatchState {
    open: u32,
    values: HashMap<u64, Arc<dyn Any + Send + Sync>>,
}

/// Values shared between assets compiled in the same batch.
#[derive(Default)]
pub struct CompilationBatchCache {
    state: Mutex<BatchState>,
}

impl CompilationBatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a batch. Batches nest and may overlap across threads.
    pub fn started(&self) {
        let mut state = self.state.lock();
        state.open += 1;
        if state.open == 1 {
            tracing::debug!("Compilation batch opened");
        }
    }

    /// Close a batch, clearing shared values if it was the last one.
    ///
    /// # Panics
    ///
    /// Panics if no batch is open.
    pub fn finished(&self) {
        let mut state = self.state.lock();
        assert!(state.open > 0, "compilation batch finished without being started");
        state.open -= 1;
        if state.open == 0 {
            let released = state.values.len();
            state.values.clear();
            drop(state);
            tracing::debug!("Compilation batch closed, released {} shared values", released);
            profiling::new_frame();
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open > 0
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the value cached under `key`, computing it with `init` if absent.
    ///
    /// Outside of a batch nothing is cached and `init` always runs. `init` runs without
    /// the lock held, so two compilers racing on the same key may both compute it; the
    /// first value stored wins.
    ///
    /// # Panics
    ///
    /// Panics if `key` already holds a value of a different type.
    pub fn get_or_insert<T, F>(&self, key: &str, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let hash = stable_hash64(key.as_bytes());
        {
            let state = self.state.lock();
            if state.open == 0 {
                drop(state);
                return Arc::new(init());
            }
            if let Some(value) = state.values.get(&hash) {
                return downcast(value.clone(), key);
            }
        }

        let value = Arc::new(init());
        let mut state = self.state.lock();
        if state.open == 0 {
            return value;
        }
        let stored = state
            .values
            .entry(hash)
            .or_insert_with(|| value.clone() as Arc<dyn Any + Send + Sync>)
            .clone();
        downcast(stored, key)
    }
}

fn downcast<T: Any + Send + Sync>(value: Arc<dyn Any + Send + Sync>, key: &str) -> Arc<T> {
    value
        .downcast::<T>()
        .unwrap_or_else(|_| panic!("batch value '{}' is stored with a different type", key))
}

impl std::fmt::Debug for CompilationBatchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CompilationBatchCache")
            .field("open", &state.open)
            .field("values", &state.values.len())
            .finish()
    }
}

/// Keeps a compilation batch open until dropped.
#[must_use = "the batch closes as soon as the guard is dropped"]
pub struct CompilationBatch<'a> {
    cache: &'a CompilationBatchCache,
}

impl<'a> CompilationBatch<'a> {
    pub fn begin(cache: &'a CompilationBatchCache) -> Self {
        cache.started();
        Self { cache }
    }
}

impl Drop for CompilationBatch<'_> {
    fn drop(&mut self) {
        self.cache.finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_values_shared_within_batch() {
        let cache = CompilationBatchCache::new();
        let calls = AtomicUsize::new(0);
        let parse = || {
            calls.fetch_add(1, Ordering::SeqCst);
            vec![1u32, 2, 3]
        };

        let batch = CompilationBatch::begin(&cache);
        let a = cache.get_or_insert("Scenes/Level.gltf", parse);
        let b = cache.get_or_insert("Scenes/Level.gltf", parse);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        drop(batch);
        assert!(!cache.is_open());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_nothing_cached_outside_batch() {
        let cache = CompilationBatchCache::new();
        let a = cache.get_or_insert("key", || 1u8);
        let b = cache.get_or_insert("key", || 2u8);
        assert_eq!((*a, *b), (1, 2));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_nested_batches_clear_on_last_close() {
        let cache = CompilationBatchCache::new();
        cache.started();
        cache.started();
        cache.get_or_insert("key", || 5i64);

        cache.finished();
        assert!(cache.is_open());
        assert_eq!(cache.len(), 1);

        cache.finished();
        assert!(cache.is_empty());
    }

    #[test]
    #[should_panic(expected = "stored with a different type")]
    fn test_type_mismatch_panics() {
        let cache = CompilationBatchCache::new();
        let _batch = CompilationBatch::begin(&cache);
        cache.get_or_insert("key", || 1u32);
        cache.get_or_insert("key", || "text");
    }

    #[test]
    #[should_panic(expected = "without being started")]
    fn test_unbalanced_finish_panics() {
        CompilationBatchCache::new().finished();
    }
}
