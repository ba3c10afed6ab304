//! Device trait for texture storage

use crate::error::Result;
use crate::types::{OutputShape, TextureHandle};

/// Counters describing texture traffic on a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Textures currently allocated
    pub live_textures: usize,
    /// Total successful allocations
    pub allocations: u64,
    /// Total successful releases
    pub releases: u64,
    /// Bytes held by live textures
    pub live_bytes: usize,
}

/// Device trait for texture storage
///
/// Devices manage 2-D `f32` textures addressed by [`TextureHandle`]. A released handle is
/// unknown to the device; every later operation on it fails with
/// [`crate::RuntimeError::InvalidTexture`].
///
/// ```text
/// ┌────────────────────────────────────────┐
/// │              Device Trait               │
/// │  allocate / release / write / read      │
/// │  clear / texture_shape / stats          │
/// └───────────────────┬────────────────────┘
///                     │
///           ┌─────────┴─────────┐
///           ▼                   ▼
///     ┌───────────┐       ┌───────────┐
///     │    CPU    │       │  (future) │
///     │  Device   │       │    GPU    │
///     └───────────┘       └───────────┘
/// ```
pub trait Device {
    /// Short device name for logs
    fn name(&self) -> &'static str;

    /// Allocate a zero-initialized texture of the given shape
    fn allocate_texture(&mut self, shape: OutputShape) -> Result<TextureHandle>;

    /// Release a texture, returning its storage to the device
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unknown (never allocated or already released).
    fn release_texture(&mut self, handle: TextureHandle) -> Result<()>;

    /// Copy row-major host data into the texture
    ///
    /// `data` must hold exactly `width * height` values.
    fn write_texture(&mut self, handle: TextureHandle, data: &[f32]) -> Result<()>;

    /// Copy the texture contents into row-major host memory
    fn read_texture(&self, handle: TextureHandle, out: &mut [f32]) -> Result<()>;

    /// Zero every cell of the texture
    fn clear_texture(&mut self, handle: TextureHandle) -> Result<()>;

    /// Shape the texture was allocated with
    fn texture_shape(&self, handle: TextureHandle) -> Result<OutputShape>;

    /// Current allocation counters
    fn stats(&self) -> DeviceStats;

    /// Downcast support
    fn as_any(&self) -> &dyn std::any::Any;
}
