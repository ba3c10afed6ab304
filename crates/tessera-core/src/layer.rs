//! Layer contract
//!
//! Every layer owns an output grid (`weights`) and the gradient with respect to that output
//! (`deltas`), both `height × width`. Inputs are borrowed per call; a layer never owns them.
//!
//! ```text
//! setup_kernels ──► predict (inputs in order) ──► deltas injected ──► compare (reverse)
//! ```

use crate::error::{Error, Result};
use crate::slot::GridSlot;
use std::fmt;
use tessera_runtime::{GridValue, KernelRuntime, OutputShape};

/// Shape plus the two slots every layer carries
#[derive(Debug)]
pub struct LayerState {
    shape: OutputShape,
    pub weights: GridSlot,
    pub deltas: GridSlot,
}

impl LayerState {
    /// Zero-filled host weights and deltas
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let shape = OutputShape::new(width, height);
        shape.validate()?;
        Ok(Self {
            shape,
            weights: GridSlot::zeros(shape),
            deltas: GridSlot::zeros(shape),
        })
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    /// Release any live textures held in either slot
    pub fn release(&mut self) -> Result<()> {
        self.weights.release()?;
        self.deltas.release()
    }
}

/// A node in the layer graph
pub trait Layer: Send + fmt::Debug {
    /// Layer type name for logs and errors
    fn kind(&self) -> &'static str;

    /// Number of inputs `predict` and `compare` expect
    fn arity(&self) -> usize;

    fn state(&self) -> &LayerState;

    fn state_mut(&mut self) -> &mut LayerState;

    fn width(&self) -> usize {
        self.state().shape().width
    }

    fn height(&self) -> usize {
        self.state().shape().height
    }

    fn shape(&self) -> OutputShape {
        self.state().shape()
    }

    /// Forward output: a host grid before the first run, a texture after it in device mode
    fn weights(&self) -> &GridValue {
        self.state().weights.get()
    }

    /// Gradient of the loss with respect to `weights`
    fn deltas(&self) -> &GridValue {
        self.state().deltas.get()
    }

    /// Overwrite `weights`, releasing a live texture held there
    ///
    /// Rejects released textures and values of the wrong shape.
    fn set_weights(&mut self, value: GridValue) -> Result<()> {
        check_value(self.kind(), self.shape(), &value)?;
        self.state_mut().weights.replace(value)
    }

    /// Overwrite `deltas`, releasing a live texture held there
    fn set_deltas(&mut self, value: GridValue) -> Result<()> {
        check_value(self.kind(), self.shape(), &value)?;
        self.state_mut().deltas.replace(value)
    }

    /// Compile the forward kernel, plus the backward kernels when `use_derivative` is set
    fn setup_kernels(&mut self, runtime: &KernelRuntime, use_derivative: bool) -> Result<()>;

    /// Forward pass over the inputs' current weights
    fn predict(&mut self, inputs: &[&dyn Layer]) -> Result<()>;

    /// Backward pass writing each input's deltas
    fn compare(&mut self, inputs: &mut [&mut dyn Layer]) -> Result<()>;
}

fn check_value(kind: &'static str, expected: OutputShape, value: &GridValue) -> Result<()> {
    if !value.is_live() {
        return Err(Error::ResourceMisuse(format!("{}: cannot store a released texture", kind)));
    }
    if value.shape() != expected {
        return Err(Error::shape_mismatch(kind, expected, value.shape()));
    }
    Ok(())
}

/// Check input count and that every input shape equals `expected`
pub(crate) fn check_inputs<I>(kind: &'static str, arity: usize, expected: OutputShape, shapes: I) -> Result<()>
where
    I: ExactSizeIterator<Item = OutputShape>,
{
    if shapes.len() != arity {
        return Err(Error::Arity {
            layer: kind,
            expected: arity,
            actual: shapes.len(),
        });
    }
    for shape in shapes {
        if shape.width != expected.width || shape.height != expected.height {
            return Err(Error::shape_mismatch(kind, expected, shape));
        }
    }
    Ok(())
}
