//! Runtime configuration
//!
//! Defaults overridden by environment variables, like `tessera_tracing::TracingConfig`.

use std::env;
use std::fmt;

/// Where kernel outputs live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    /// Outputs are device textures that must be released
    #[default]
    Device,
    /// Outputs are plain host grids (CPU simulation for tests)
    Simulated,
}

impl RuntimeMode {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "device" | "gpu" => Some(Self::Device),
            "simulated" | "cpu" => Some(Self::Simulated),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Device => write!(f, "device"),
            RuntimeMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// Kernel runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Output residency for kernel runs
    pub mode: RuntimeMode,
    /// Kernels with at least this many output cells evaluate rows on the rayon pool
    pub parallel_min_elements: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::device()
    }
}

impl RuntimeConfig {
    /// Default row-parallel cutoff
    pub const DEFAULT_PARALLEL_MIN_ELEMENTS: usize = 4096;

    /// Device-resident outputs
    pub fn device() -> Self {
        Self {
            mode: RuntimeMode::Device,
            parallel_min_elements: Self::DEFAULT_PARALLEL_MIN_ELEMENTS,
        }
    }

    /// Host-grid outputs
    pub fn simulated() -> Self {
        Self {
            mode: RuntimeMode::Simulated,
            ..Self::device()
        }
    }

    /// Build a configuration using environment hints.
    ///
    /// # Environment Variables
    ///
    /// - `TESSERA_RUNTIME_MODE` - `device` (default) or `simulated`
    /// - `TESSERA_PARALLEL_MIN_ELEMENTS` - row-parallel cutoff in output cells
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = env::var("TESSERA_RUNTIME_MODE") {
            match RuntimeMode::from_env_value(&mode) {
                Some(parsed) => config.mode = parsed,
                None => tracing::warn!(value = %mode, "ignoring unknown TESSERA_RUNTIME_MODE"),
            }
        }

        if let Ok(threshold) = env::var("TESSERA_PARALLEL_MIN_ELEMENTS") {
            if let Ok(parsed) = threshold.trim().parse::<usize>() {
                config.parallel_min_elements = parsed;
            }
        }

        config
    }
}
