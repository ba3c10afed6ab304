//! Kernel runtime: compiles kernels and owns the device they run on

use crate::config::{RuntimeConfig, RuntimeMode};
use crate::device::{self, CpuDevice, DeviceStats, SharedDevice};
use crate::error::{Result, RuntimeError};
use crate::grid::{GridValue, HostGrid};
use crate::kernel::{Kernel, KernelCache, KernelKey, KernelSource};
use crate::texture::Texture;
use crate::types::OutputShape;
use std::sync::Arc;

/// Entry point for compiling kernels and moving data onto the device
pub struct KernelRuntime {
    device: SharedDevice,
    config: RuntimeConfig,
    cache: KernelCache,
}

impl KernelRuntime {
    /// Runtime on a fresh CPU device
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_device(device::share(CpuDevice::new()), config)
    }

    /// Runtime on a caller-provided device
    pub fn with_device(device: SharedDevice, config: RuntimeConfig) -> Self {
        tracing::debug!(
            device = device.read().name(),
            mode = %config.mode,
            parallel_min_elements = config.parallel_min_elements,
            "kernel_runtime_created"
        );
        Self {
            device,
            config,
            cache: KernelCache::new(),
        }
    }

    /// Device-resident outputs on a CPU device
    pub fn device() -> Self {
        Self::new(RuntimeConfig::device())
    }

    /// Host-grid outputs
    pub fn simulated() -> Self {
        Self::new(RuntimeConfig::simulated())
    }

    /// Configuration from `TESSERA_*` environment variables
    pub fn from_env() -> Self {
        Self::new(RuntimeConfig::from_env())
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn mode(&self) -> RuntimeMode {
        self.config.mode
    }

    pub fn shared_device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn stats(&self) -> DeviceStats {
        self.device.read().stats()
    }

    /// Number of kernels compiled so far
    pub fn cached_kernels(&self) -> usize {
        self.cache.len()
    }

    /// Compile `source` for `shape`, reusing a previous compilation of the same name, arity and shape
    #[tracing::instrument(skip(self, source), fields(kernel = %source.name(), shape = %shape))]
    pub fn compile(&self, source: &KernelSource, shape: OutputShape) -> Result<Arc<Kernel>> {
        shape.validate()?;
        if source.arity() == 0 {
            return Err(RuntimeError::compilation(format!("kernel {} takes no inputs", source.name())));
        }

        let key = KernelKey::new(source.name(), source.arity(), shape);
        self.cache.get_or_try_create(&key, || {
            tracing::debug!("kernel_compiled");
            Ok(Kernel::new(
                source.clone(),
                shape,
                &self.config,
                SharedDevice::clone(&self.device),
            ))
        })
    }

    /// Place host data where this runtime keeps kernel outputs
    pub fn upload(&self, grid: &HostGrid) -> Result<GridValue> {
        match self.config.mode {
            RuntimeMode::Device => Ok(GridValue::Texture(Texture::upload(&self.device, grid)?)),
            RuntimeMode::Simulated => Ok(GridValue::Host(grid.clone())),
        }
    }
}

impl Default for KernelRuntime {
    fn default() -> Self {
        Self::device()
    }
}

impl std::fmt::Debug for KernelRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelRuntime")
            .field("config", &self.config)
            .field("cached_kernels", &self.cache.len())
            .finish_non_exhaustive()
    }
}
