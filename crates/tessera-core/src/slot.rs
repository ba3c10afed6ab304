//! Layer-owned grid storage with release-before-overwrite

use crate::error::Result;
use tessera_runtime::{GridValue, HostGrid, OutputShape};

/// Storage for a layer's weights or deltas
///
/// The slot exclusively owns its value. Overwriting or releasing a slot that holds a live
/// texture releases that texture exactly once; the slot never keeps a released texture.
#[derive(Debug)]
pub struct GridSlot {
    value: GridValue,
}

impl GridSlot {
    /// Slot holding a zero host grid
    pub fn zeros(shape: OutputShape) -> Self {
        Self {
            value: GridValue::Host(HostGrid::zeros(shape)),
        }
    }

    pub fn get(&self) -> &GridValue {
        &self.value
    }

    pub fn shape(&self) -> OutputShape {
        self.value.shape()
    }

    pub fn holds_texture(&self) -> bool {
        self.value.is_texture()
    }

    /// Store `value`, releasing a live texture currently held
    pub fn replace(&mut self, value: GridValue) -> Result<()> {
        self.release_texture()?;
        self.value = value;
        Ok(())
    }

    /// Release a held texture, then store the value `produce` returns
    ///
    /// The old texture is gone before `produce` runs. If `produce` fails, the slot falls back
    /// to a zero host grid of the same shape.
    pub fn refill_with<F>(&mut self, produce: F) -> Result<()>
    where
        F: FnOnce() -> Result<GridValue>,
    {
        let released = self.release_texture()?;
        match produce() {
            Ok(value) => {
                self.value = value;
                Ok(())
            }
            Err(e) => {
                if released {
                    self.value = GridValue::Host(HostGrid::zeros(self.value.shape()));
                }
                Err(e)
            }
        }
    }

    /// Release a held texture and fall back to a zero host grid of the same shape
    ///
    /// Host grids are left untouched.
    pub fn release(&mut self) -> Result<()> {
        if self.release_texture()? {
            self.value = GridValue::Host(HostGrid::zeros(self.value.shape()));
        }
        Ok(())
    }

    /// Zero the contents without reallocating
    pub fn clear(&mut self) -> Result<()> {
        self.value.clear()?;
        Ok(())
    }

    fn release_texture(&mut self) -> Result<bool> {
        match &mut self.value {
            GridValue::Texture(texture) if texture.is_live() => {
                texture.release()?;
                Ok(true)
            }
            GridValue::Texture(_) => Ok(true),
            GridValue::Host(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tessera_runtime::{KernelRuntime, RuntimeError};

    fn texture(runtime: &KernelRuntime, rows: &[[f32; 2]]) -> GridValue {
        runtime.upload(&HostGrid::from_rows(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_replace_releases_previous_texture() {
        let runtime = KernelRuntime::device();
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));

        slot.replace(texture(&runtime, &[[1.0, 2.0]])).unwrap();
        slot.replace(texture(&runtime, &[[3.0, 4.0]])).unwrap();

        let stats = runtime.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.live_textures, 1);
        assert_eq!(slot.get().to_host().unwrap().as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn test_replace_host_releases_nothing() {
        let runtime = KernelRuntime::device();
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));

        slot.replace(GridValue::Host(HostGrid::from_rows(&[[5.0, 6.0]]).unwrap())).unwrap();
        assert_eq!(runtime.stats().releases, 0);
        assert!(!slot.holds_texture());
    }

    #[test]
    fn test_release_falls_back_to_zeros() {
        let runtime = KernelRuntime::device();
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));
        slot.replace(texture(&runtime, &[[1.0, 2.0]])).unwrap();

        slot.release().unwrap();
        slot.release().unwrap();

        assert!(!slot.holds_texture());
        assert_eq!(slot.get().to_host().unwrap().as_slice(), &[0.0, 0.0]);
        assert_eq!(runtime.stats().releases, 1);
        assert_eq!(runtime.stats().live_textures, 0);
    }

    #[test]
    fn test_refill_releases_before_producing() {
        let runtime = KernelRuntime::device();
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));
        slot.replace(texture(&runtime, &[[1.0, 2.0]])).unwrap();

        slot.refill_with(|| {
            assert_eq!(runtime.stats().live_textures, 0);
            Ok(texture(&runtime, &[[3.0, 4.0]]))
        })
        .unwrap();

        let stats = runtime.stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.live_textures, 1);
        assert_eq!(slot.get().to_host().unwrap().as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn test_refill_failure_leaves_zeros() {
        let runtime = KernelRuntime::device();
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));
        slot.replace(texture(&runtime, &[[1.0, 2.0]])).unwrap();

        let err = slot
            .refill_with(|| Err(RuntimeError::execution("boom").into()))
            .unwrap_err();

        assert!(matches!(err, Error::Runtime(RuntimeError::KernelExecution(_))));
        assert!(!slot.holds_texture());
        assert_eq!(slot.shape(), OutputShape::new(2, 1));
        assert_eq!(slot.get().to_host().unwrap().as_slice(), &[0.0, 0.0]);
        assert_eq!(runtime.stats().releases, 1);
        assert_eq!(runtime.stats().live_textures, 0);
    }

    #[test]
    fn test_refill_failure_keeps_host_grid() {
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));
        slot.replace(GridValue::Host(HostGrid::from_rows(&[[5.0, 6.0]]).unwrap())).unwrap();

        assert!(slot.refill_with(|| Err(RuntimeError::execution("boom").into())).is_err());
        assert_eq!(slot.get().to_host().unwrap().as_slice(), &[5.0, 6.0]);
    }

    #[test]
    fn test_clear_keeps_texture() {
        let runtime = KernelRuntime::device();
        let mut slot = GridSlot::zeros(OutputShape::new(2, 1));
        slot.replace(texture(&runtime, &[[1.0, 2.0]])).unwrap();

        slot.clear().unwrap();

        assert!(slot.holds_texture());
        assert_eq!(slot.get().to_host().unwrap().as_slice(), &[0.0, 0.0]);
        assert_eq!(runtime.stats().allocations, 1);
    }
}
