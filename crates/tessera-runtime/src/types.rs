//! Handle and shape types shared by devices, kernels and layers

use std::fmt;

/// Handle to an allocated device texture
///
/// Handles are opaque ids managed by the device. Use [`crate::Texture`] for owned access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

impl TextureHandle {
    /// Create a new texture handle
    pub const fn new(id: u64) -> Self {
        TextureHandle(id)
    }

    /// Get the internal ID
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex{}", self.0)
    }
}

/// Declared 2-D output shape of a kernel: `height` rows of `width` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputShape {
    pub width: usize,
    pub height: usize,
}

impl OutputShape {
    /// Create a shape from `[width, height]` order.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of cells
    pub const fn elements(&self) -> usize {
        self.width * self.height
    }

    /// Storage size for `f32` cells
    pub const fn size_bytes(&self) -> usize {
        self.elements() * std::mem::size_of::<f32>()
    }

    /// Storage size for `f32` cells, or `None` if it overflows `usize`
    pub const fn checked_size_bytes(&self) -> Option<usize> {
        match self.width.checked_mul(self.height) {
            Some(elements) => elements.checked_mul(std::mem::size_of::<f32>()),
            None => None,
        }
    }

    /// True if either dimension is zero
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Reject zero-sized shapes and shapes whose storage size overflows.
    pub fn validate(&self) -> crate::Result<()> {
        if self.is_empty() {
            return Err(crate::RuntimeError::InvalidShape(format!("zero-sized shape {self}")));
        }
        if self.checked_size_bytes().is_none() {
            return Err(crate::RuntimeError::InvalidShape(format!(
                "shape {self} overflows addressable storage"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_shape_sizes() {
        let shape = OutputShape::new(3, 2);
        assert_eq!(shape.elements(), 6);
        assert_eq!(shape.size_bytes(), 24);
        assert!(!shape.is_empty());
        assert!(OutputShape::new(0, 4).is_empty());
    }

    #[test]
    fn test_validate_rejects_overflowing_shapes() {
        assert_eq!(OutputShape::new(3, 2).checked_size_bytes(), Some(24));
        assert_eq!(OutputShape::new(usize::MAX, 2).checked_size_bytes(), None);
        assert_eq!(OutputShape::new(usize::MAX / 2, 1).checked_size_bytes(), None);

        assert!(OutputShape::new(3, 2).validate().is_ok());
        assert!(matches!(
            OutputShape::new(usize::MAX, 2).validate(),
            Err(crate::RuntimeError::InvalidShape(_))
        ));
        assert!(matches!(
            OutputShape::new(0, 2).validate(),
            Err(crate::RuntimeError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_texture_handle_display() {
        assert_eq!(TextureHandle::new(7).to_string(), "tex7");
        assert_eq!(TextureHandle::new(7).id(), 7);
    }
}
