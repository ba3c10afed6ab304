//! Error types for tessera-core operations

use crate::graph::LayerId;
use tessera_runtime::{OutputShape, RuntimeError};

/// Result type for tessera-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running layers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Inputs or assigned values disagree with the layer's shape
    #[error("{layer}: shape mismatch, expected {expected}, got {actual}")]
    ShapeMismatch {
        layer: &'static str,
        expected: OutputShape,
        actual: OutputShape,
    },

    /// Wrong number of inputs for the layer
    #[error("{layer}: expects {expected} inputs, got {actual}")]
    Arity {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Released or unknown texture used, or released twice
    #[error("resource misuse: {0}")]
    ResourceMisuse(String),

    /// Pass requested before `setup_kernels` compiled its kernels
    #[error("{layer}: {pass} kernels not compiled, call setup_kernels first")]
    KernelsNotReady { layer: &'static str, pass: &'static str },

    /// Graph id out of range
    #[error("unknown layer {0}")]
    UnknownLayer(LayerId),

    /// Layer output already consumed (or listed twice for one consumer)
    #[error("{input} already feeds {consumer}; a layer output may be consumed once")]
    FanOut { input: LayerId, consumer: LayerId },

    /// Kernel runtime failure
    #[error(transparent)]
    Runtime(RuntimeError),
}

impl Error {
    pub fn shape_mismatch(layer: &'static str, expected: OutputShape, actual: OutputShape) -> Self {
        Self::ShapeMismatch {
            layer,
            expected,
            actual,
        }
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        if err.is_resource_misuse() {
            Error::ResourceMisuse(err.to_string())
        } else {
            Error::Runtime(err)
        }
    }
}
