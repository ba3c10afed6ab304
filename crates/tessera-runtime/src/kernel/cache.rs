//! Compiled kernel cache
//!
//! Kernels are keyed by name, arity and output shape. The first request compiles; later
//! requests share the same [`Arc<Kernel>`].

use crate::error::Result;
use crate::kernel::Kernel;
use crate::types::OutputShape;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A cache key for compiled kernels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelKey {
    /// Kernel name (e.g. "multiply_forward")
    pub name: String,
    pub arity: usize,
    pub shape: OutputShape,
}

impl KernelKey {
    pub fn new(name: impl Into<String>, arity: usize, shape: OutputShape) -> Self {
        Self {
            name: name.into(),
            arity,
            shape,
        }
    }
}

/// Thread-safe kernel cache
///
/// Lookups take a read lock; compilation happens outside any lock and the first result to
/// be inserted wins.
pub struct KernelCache {
    cache: OnceLock<parking_lot::RwLock<HashMap<KernelKey, Arc<Kernel>>>>,
}

impl KernelCache {
    /// Create a new empty kernel cache
    pub const fn new() -> Self {
        Self { cache: OnceLock::new() }
    }

    /// Get a kernel from the cache, compiling it with `f` if absent
    ///
    /// A failed compilation caches nothing.
    pub fn get_or_try_create<F>(&self, key: &KernelKey, f: F) -> Result<Arc<Kernel>>
    where
        F: FnOnce() -> Result<Kernel>,
    {
        let cache = self.cache.get_or_init(|| parking_lot::RwLock::new(HashMap::new()));

        {
            let read_guard = cache.read();
            if let Some(kernel) = read_guard.get(key) {
                tessera_tracing::perf_event!("kernel_cache_hit", kernel = key.name.as_str());
                return Ok(Arc::clone(kernel));
            }
        }

        let kernel = Arc::new(f()?);

        let mut write_guard = cache.write();
        let cached = write_guard.entry(key.clone()).or_insert_with(|| Arc::clone(&kernel));
        Ok(Arc::clone(cached))
    }

    /// Drop every cached kernel
    #[cfg(test)]
    pub fn clear(&self) {
        if let Some(cache) = self.cache.get() {
            cache.write().clear();
        }
    }

    /// Number of cached kernels
    pub fn len(&self) -> usize {
        self.cache.get().map(|c| c.read().len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KernelCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::device::{self, CpuDevice};
    use crate::error::RuntimeError;
    use crate::kernel::KernelSource;

    fn constant_kernel(value: f32, shape: OutputShape) -> Kernel {
        let source = KernelSource::new("constant", 1, move |_, _| value);
        Kernel::new(source, shape, &RuntimeConfig::simulated(), device::share(CpuDevice::new()))
    }

    #[test]
    fn test_cache_basic() {
        let cache = KernelCache::new();
        let shape = OutputShape::new(2, 2);
        let key = KernelKey::new("constant", 1, shape);

        let first = cache.get_or_try_create(&key, || Ok(constant_kernel(1.0, shape))).unwrap();
        let second = cache.get_or_try_create(&key, || Ok(constant_kernel(2.0, shape))).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shape_is_part_of_key() {
        let cache = KernelCache::new();
        let small = OutputShape::new(2, 2);
        let large = OutputShape::new(4, 4);

        cache
            .get_or_try_create(&KernelKey::new("constant", 1, small), || Ok(constant_kernel(1.0, small)))
            .unwrap();
        cache
            .get_or_try_create(&KernelKey::new("constant", 1, large), || Ok(constant_kernel(1.0, large)))
            .unwrap();

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_compile_not_cached() {
        let cache = KernelCache::new();
        let key = KernelKey::new("broken", 1, OutputShape::new(1, 1));

        let result = cache.get_or_try_create(&key, || Err(RuntimeError::compilation("nope")));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = KernelCache::new();
        let shape = OutputShape::new(1, 1);
        cache
            .get_or_try_create(&KernelKey::new("constant", 1, shape), || Ok(constant_kernel(0.0, shape)))
            .unwrap();

        cache.clear();
        assert!(cache.is_empty());
    }
}
