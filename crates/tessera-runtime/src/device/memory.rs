//! Memory manager for the CPU device
//!
//! Textures live in a `HashMap` keyed by handle id. Storage is raw bytes; `f32` data crosses
//! the boundary through `bytemuck` casts.

use crate::device::DeviceStats;
use crate::error::{Result, RuntimeError};
use crate::types::{OutputShape, TextureHandle};
use std::collections::HashMap;

struct TextureStorage {
    shape: OutputShape,
    bytes: Vec<u8>,
}

/// Memory manager for CPU textures
pub struct MemoryManager {
    textures: HashMap<u64, TextureStorage>,

    /// Next texture handle ID
    next_texture_id: u64,

    allocations: u64,
    releases: u64,
}

impl MemoryManager {
    /// Create an empty memory manager
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            next_texture_id: 1,
            allocations: 0,
            releases: 0,
        }
    }

    /// Allocate a zeroed texture
    pub fn allocate_texture(&mut self, shape: OutputShape) -> Result<TextureHandle> {
        shape.validate()?;

        let id = self.next_texture_id;
        self.next_texture_id += 1;

        self.textures.insert(
            id,
            TextureStorage {
                shape,
                bytes: vec![0u8; shape.size_bytes()],
            },
        );
        self.allocations += 1;

        Ok(TextureHandle::new(id))
    }

    /// Free a texture
    pub fn release_texture(&mut self, handle: TextureHandle) -> Result<()> {
        if self.textures.remove(&handle.id()).is_none() {
            return Err(RuntimeError::InvalidTexture(handle.id()));
        }
        self.releases += 1;
        Ok(())
    }

    /// Copy host values into a texture
    pub fn write_texture(&mut self, handle: TextureHandle, data: &[f32]) -> Result<()> {
        let storage = self.storage_mut(handle)?;
        let src: &[u8] = bytemuck::cast_slice(data);
        if src.len() != storage.bytes.len() {
            return Err(RuntimeError::TextureOutOfBounds {
                size: data.len(),
                texture_size: storage.shape.elements(),
            });
        }
        storage.bytes.copy_from_slice(src);
        Ok(())
    }

    /// Copy texture values to host memory
    pub fn read_texture(&self, handle: TextureHandle, out: &mut [f32]) -> Result<()> {
        let storage = self.storage(handle)?;
        let len = out.len();
        let dst: &mut [u8] = bytemuck::cast_slice_mut(out);
        if dst.len() != storage.bytes.len() {
            return Err(RuntimeError::TextureOutOfBounds {
                size: len,
                texture_size: storage.shape.elements(),
            });
        }
        dst.copy_from_slice(&storage.bytes);
        Ok(())
    }

    /// Zero a texture
    pub fn clear_texture(&mut self, handle: TextureHandle) -> Result<()> {
        self.storage_mut(handle)?.bytes.fill(0);
        Ok(())
    }

    /// Shape of a live texture
    pub fn texture_shape(&self, handle: TextureHandle) -> Result<OutputShape> {
        Ok(self.storage(handle)?.shape)
    }

    /// Allocation counters
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            live_textures: self.textures.len(),
            allocations: self.allocations,
            releases: self.releases,
            live_bytes: self.textures.values().map(|t| t.bytes.len()).sum(),
        }
    }

    fn storage(&self, handle: TextureHandle) -> Result<&TextureStorage> {
        self.textures
            .get(&handle.id())
            .ok_or(RuntimeError::InvalidTexture(handle.id()))
    }

    fn storage_mut(&mut self, handle: TextureHandle) -> Result<&mut TextureStorage> {
        self.textures
            .get_mut(&handle.id())
            .ok_or(RuntimeError::InvalidTexture(handle.id()))
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
