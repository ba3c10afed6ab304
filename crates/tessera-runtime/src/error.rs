//! Error types for runtime operations

use crate::types::OutputShape;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while compiling or running kernels and managing textures
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Handle is unknown to the device (never allocated, or already freed)
    #[error("invalid texture handle: {0}")]
    InvalidTexture(u64),

    /// Texture was used after its `release()`
    #[error("texture tex{0} used after release")]
    TextureReleased(u64),

    /// Host data does not fit the texture
    #[error("texture access out of bounds: {size} values for a texture of {texture_size}")]
    TextureOutOfBounds { size: usize, texture_size: usize },

    /// Grid shape disagrees with the shape a kernel or texture declares
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: OutputShape, actual: OutputShape },

    /// Zero-sized or ragged shape
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Kernel invoked with the wrong number of inputs
    #[error("kernel {kernel} expects {expected} inputs, got {actual}")]
    ArityMismatch {
        kernel: String,
        expected: usize,
        actual: usize,
    },

    /// Kernel source rejected at compile time
    #[error("kernel compilation failed: {0}")]
    KernelCompilation(String),

    /// Kernel failed while producing its output
    #[error("kernel execution failed: {0}")]
    KernelExecution(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RuntimeError {
    /// Create a kernel compilation error
    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::KernelCompilation(msg.into())
    }

    /// Create a kernel execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::KernelExecution(msg.into())
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: OutputShape, actual: OutputShape) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// True for contract violations on texture lifecycles (use-after-release, double release).
    pub fn is_resource_misuse(&self) -> bool {
        matches!(self, Self::InvalidTexture(_) | Self::TextureReleased(_))
    }
}
