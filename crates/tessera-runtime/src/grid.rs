//! Host grids and the values kernels consume and produce

use crate::error::{Result, RuntimeError};
use crate::texture::Texture;
use crate::types::OutputShape;
use std::borrow::Cow;

/// Row-major 2-D `f32` grid in host memory
#[derive(Debug, Clone, PartialEq)]
pub struct HostGrid {
    shape: OutputShape,
    data: Vec<f32>,
}

impl HostGrid {
    /// Grid of zeros
    pub fn zeros(shape: OutputShape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.elements()],
        }
    }

    /// Wrap row-major data
    pub fn from_vec(shape: OutputShape, data: Vec<f32>) -> Result<Self> {
        if data.len() != shape.elements() {
            return Err(RuntimeError::InvalidShape(format!(
                "{} values do not fill a {} grid",
                data.len(),
                shape
            )));
        }
        Ok(Self { shape, data })
    }

    /// Build from rows; every row must have the same non-zero length
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if width == 0 {
            return Err(RuntimeError::InvalidShape("grid needs at least one non-empty row".to_string()));
        }

        let mut data = Vec::with_capacity(width * rows.len());
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(RuntimeError::InvalidShape(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            shape: OutputShape::new(width, rows.len()),
            data,
        })
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    /// Value at `(row, col)`, `None` when out of range
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.shape.height || col >= self.shape.width {
            return None;
        }
        self.data.get(row * self.shape.width + col).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Nested rows, outer index is `y`
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.data.chunks(self.shape.width.max(1)).map(<[f32]>::to_vec).collect()
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn as_grid_ref(&self) -> GridRef<'_> {
        GridRef {
            data: &self.data,
            shape: self.shape,
        }
    }
}

/// Borrowed view of a kernel input
#[derive(Debug, Clone, Copy)]
pub struct GridRef<'a> {
    data: &'a [f32],
    shape: OutputShape,
}

impl<'a> GridRef<'a> {
    pub(crate) fn new(data: &'a [f32], shape: OutputShape) -> Self {
        Self { data, shape }
    }

    /// Value at row `y`, column `x`
    ///
    /// # Panics
    ///
    /// Panics when `(y, x)` lies outside the grid. Kernel inputs are shape-checked before
    /// dispatch so in-range threads never hit this.
    #[inline]
    pub fn at(&self, y: usize, x: usize) -> f32 {
        assert!(x < self.shape.width, "column {} outside {} grid", x, self.shape);
        self.data[y * self.shape.width + x]
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }
}

/// Value stored in a layer slot or passed to a kernel: host data or a device texture
#[derive(Debug)]
pub enum GridValue {
    Host(HostGrid),
    Texture(Texture),
}

impl GridValue {
    pub fn shape(&self) -> OutputShape {
        match self {
            GridValue::Host(grid) => grid.shape(),
            GridValue::Texture(texture) => texture.shape(),
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(self, GridValue::Texture(_))
    }

    /// True for host grids and for textures that have not been released
    pub fn is_live(&self) -> bool {
        match self {
            GridValue::Host(_) => true,
            GridValue::Texture(texture) => texture.is_live(),
        }
    }

    /// Release device storage; host grids have nothing to release
    pub fn release(&mut self) -> Result<()> {
        match self {
            GridValue::Host(_) => Ok(()),
            GridValue::Texture(texture) => texture.release(),
        }
    }

    /// Zero every cell in place
    pub fn clear(&mut self) -> Result<()> {
        match self {
            GridValue::Host(grid) => {
                grid.fill(0.0);
                Ok(())
            }
            GridValue::Texture(texture) => texture.clear(),
        }
    }

    /// Copy of the contents in host memory
    pub fn to_host(&self) -> Result<HostGrid> {
        match self {
            GridValue::Host(grid) => Ok(grid.clone()),
            GridValue::Texture(texture) => texture.read(),
        }
    }

    /// Row-major values, borrowed for host grids and downloaded for textures
    pub fn values(&self) -> Result<Cow<'_, [f32]>> {
        match self {
            GridValue::Host(grid) => Ok(Cow::Borrowed(grid.as_slice())),
            GridValue::Texture(texture) => Ok(Cow::Owned(texture.read()?.into_vec())),
        }
    }
}

impl From<HostGrid> for GridValue {
    fn from(grid: HostGrid) -> Self {
        GridValue::Host(grid)
    }
}

impl From<Texture> for GridValue {
    fn from(texture: Texture) -> Self {
        GridValue::Texture(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let grid = HostGrid::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(grid.shape(), OutputShape::new(3, 2));
        assert_eq!(grid.get(1, 0), Some(4.0));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_from_rows_ragged() {
        let rows: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(HostGrid::from_rows(&rows), Err(RuntimeError::InvalidShape(_))));
    }

    #[test]
    fn test_from_rows_empty() {
        let rows: Vec<Vec<f32>> = Vec::new();
        assert!(HostGrid::from_rows(&rows).is_err());
    }

    #[test]
    fn test_from_vec_length_checked() {
        assert!(HostGrid::from_vec(OutputShape::new(2, 2), vec![1.0; 3]).is_err());
        assert!(HostGrid::from_vec(OutputShape::new(2, 2), vec![1.0; 4]).is_ok());
    }

    #[test]
    fn test_grid_ref_indexing() {
        let grid = HostGrid::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let view = grid.as_grid_ref();
        assert_eq!(view.at(0, 1), 2.0);
        assert_eq!(view.at(1, 0), 3.0);
    }

    #[test]
    fn test_host_value_release_and_clear() {
        let mut value = GridValue::Host(HostGrid::from_rows(&[[1.0, 2.0]]).unwrap());
        value.release().unwrap();
        assert!(value.is_live());

        value.clear().unwrap();
        assert_eq!(value.to_host().unwrap().as_slice(), &[0.0, 0.0]);
        assert!(matches!(value.values().unwrap(), Cow::Borrowed(_)));
    }
}
