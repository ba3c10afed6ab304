//! Owned device textures

use crate::device::SharedDevice;
use crate::error::{Result, RuntimeError};
use crate::grid::HostGrid;
use crate::types::{OutputShape, TextureHandle};
use std::fmt;
use std::time::Instant;
use tessera_tracing::performance::{self, TransferDirection};

/// Exclusively-owned 2-D texture on a device
///
/// The owner releases storage with [`Texture::release`]. Any use after release, including a
/// second release, fails with [`RuntimeError::TextureReleased`]. A texture still live when
/// dropped is released then.
pub struct Texture {
    handle: TextureHandle,
    shape: OutputShape,
    device: SharedDevice,
    live: bool,
}

impl Texture {
    /// Allocate a zeroed texture on `device`
    pub fn allocate(device: &SharedDevice, shape: OutputShape) -> Result<Self> {
        let handle = device.write().allocate_texture(shape)?;
        Ok(Self {
            handle,
            shape,
            device: SharedDevice::clone(device),
            live: true,
        })
    }

    /// Allocate a texture and fill it with `grid`
    pub fn upload(device: &SharedDevice, grid: &HostGrid) -> Result<Self> {
        let mut texture = Self::allocate(device, grid.shape())?;
        if let Err(e) = texture.write(grid.as_slice()) {
            texture.release()?;
            return Err(e);
        }
        Ok(texture)
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Return the storage to the device
    ///
    /// The texture is no longer live afterwards even if the device rejects the handle.
    #[tracing::instrument(skip(self), fields(texture = %self.handle))]
    pub fn release(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.live = false;
        self.device.write().release_texture(self.handle)?;
        tracing::trace!("texture_released");
        Ok(())
    }

    /// Zero every cell
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.device.write().clear_texture(self.handle)
    }

    /// Overwrite contents from row-major host data
    pub fn write(&mut self, data: &[f32]) -> Result<()> {
        self.ensure_live()?;
        let start = Instant::now();
        self.device.write().write_texture(self.handle, data)?;
        performance::record_transfer(
            std::mem::size_of_val(data),
            TransferDirection::HostToDevice,
            start.elapsed().as_micros() as u64,
        );
        Ok(())
    }

    /// Download contents into a host grid
    pub fn read(&self) -> Result<HostGrid> {
        self.ensure_live()?;
        let start = Instant::now();
        let mut grid = HostGrid::zeros(self.shape);
        self.device.read().read_texture(self.handle, grid.as_mut_slice())?;
        performance::record_transfer(
            self.shape.size_bytes(),
            TransferDirection::DeviceToHost,
            start.elapsed().as_micros() as u64,
        );
        Ok(grid)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.live {
            Ok(())
        } else {
            Err(RuntimeError::TextureReleased(self.handle.id()))
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("shape", &self.shape)
            .field("live", &self.live)
            .finish()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.live {
            if let Err(e) = self.device.write().release_texture(self.handle) {
                tracing::warn!(texture = %self.handle, error = %e, "failed to release texture on drop");
            }
            self.live = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{self, CpuDevice};

    fn shared() -> SharedDevice {
        device::share(CpuDevice::new())
    }

    #[test]
    fn test_upload_and_read() {
        let device = shared();
        let grid = HostGrid::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();

        let texture = Texture::upload(&device, &grid).unwrap();
        assert_eq!(texture.read().unwrap(), grid);
        assert_eq!(device.read().stats().live_textures, 1);
    }

    #[test]
    fn test_release_exactly_once() {
        let device = shared();
        let mut texture = Texture::allocate(&device, OutputShape::new(2, 2)).unwrap();

        texture.release().unwrap();
        assert!(!texture.is_live());
        assert!(matches!(texture.release(), Err(RuntimeError::TextureReleased(_))));

        let stats = device.read().stats();
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.live_textures, 0);
    }

    #[test]
    fn test_release_rejected_by_device_still_retires_texture() {
        let device = shared();
        {
            let mut texture = Texture::allocate(&device, OutputShape::new(2, 2)).unwrap();
            device.write().release_texture(texture.handle()).unwrap();

            let err = texture.release().unwrap_err();
            assert!(matches!(err, RuntimeError::InvalidTexture(id) if id == texture.handle().id()));
            assert!(!texture.is_live());
            assert!(matches!(texture.release(), Err(RuntimeError::TextureReleased(_))));
            assert!(matches!(texture.read(), Err(RuntimeError::TextureReleased(_))));
        }
        let stats = device.read().stats();
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.live_textures, 0);
    }

    #[test]
    fn test_use_after_release() {
        let device = shared();
        let mut texture = Texture::allocate(&device, OutputShape::new(1, 1)).unwrap();
        texture.release().unwrap();

        assert!(matches!(texture.read(), Err(RuntimeError::TextureReleased(_))));
        assert!(matches!(texture.clear(), Err(RuntimeError::TextureReleased(_))));
        assert!(matches!(texture.write(&[1.0]), Err(RuntimeError::TextureReleased(_))));
    }

    #[test]
    fn test_clear() {
        let device = shared();
        let grid = HostGrid::from_rows(&[[5.0, 6.0, 7.0]]).unwrap();
        let mut texture = Texture::upload(&device, &grid).unwrap();

        texture.clear().unwrap();
        assert_eq!(texture.read().unwrap().as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_drop_releases_live_texture() {
        let device = shared();
        {
            let _texture = Texture::allocate(&device, OutputShape::new(4, 4)).unwrap();
            assert_eq!(device.read().stats().live_textures, 1);
        }
        let stats = device.read().stats();
        assert_eq!(stats.live_textures, 0);
        assert_eq!(stats.releases, 1);
    }

    #[test]
    fn test_drop_after_release_does_not_double_free() {
        let device = shared();
        {
            let mut texture = Texture::allocate(&device, OutputShape::new(4, 4)).unwrap();
            texture.release().unwrap();
        }
        assert_eq!(device.read().stats().releases, 1);
    }
}
