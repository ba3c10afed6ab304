//! CPU reference device

use crate::device::{Device, DeviceStats, MemoryManager};
use crate::error::Result;
use crate::types::{OutputShape, TextureHandle};

/// CPU device keeping textures in host memory
///
/// Behaves like a GPU device as far as ownership goes: textures must be released
/// explicitly and stale handles are rejected.
pub struct CpuDevice {
    memory: MemoryManager,
}

impl CpuDevice {
    /// Create a new CPU device
    pub fn new() -> Self {
        Self {
            memory: MemoryManager::new(),
        }
    }
}

impl Default for CpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for CpuDevice {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn allocate_texture(&mut self, shape: OutputShape) -> Result<TextureHandle> {
        let handle = self.memory.allocate_texture(shape)?;
        tessera_tracing::performance::record_texture_allocation(shape.width, shape.height, shape.size_bytes());
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) -> Result<()> {
        self.memory.release_texture(handle)
    }

    fn write_texture(&mut self, handle: TextureHandle, data: &[f32]) -> Result<()> {
        self.memory.write_texture(handle, data)
    }

    fn read_texture(&self, handle: TextureHandle, out: &mut [f32]) -> Result<()> {
        self.memory.read_texture(handle, out)
    }

    fn clear_texture(&mut self, handle: TextureHandle) -> Result<()> {
        self.memory.clear_texture(handle)
    }

    fn texture_shape(&self, handle: TextureHandle) -> Result<OutputShape> {
        self.memory.texture_shape(handle)
    }

    fn stats(&self) -> DeviceStats {
        self.memory.stats()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_device_creation() {
        let device = CpuDevice::new();
        assert_eq!(device.name(), "cpu");
        assert_eq!(device.stats(), DeviceStats::default());
    }

    #[test]
    fn test_texture_shape_roundtrip() {
        let mut device = CpuDevice::new();
        let handle = device.allocate_texture(OutputShape::new(4, 3)).unwrap();
        assert_eq!(device.texture_shape(handle).unwrap(), OutputShape::new(4, 3));

        device.release_texture(handle).unwrap();
        assert!(device.texture_shape(handle).is_err());
    }

    #[test]
    fn test_downcast() {
        let device: Box<dyn Device + Send + Sync> = Box::new(CpuDevice::new());
        assert!(device.as_any().downcast_ref::<CpuDevice>().is_some());
    }
}
