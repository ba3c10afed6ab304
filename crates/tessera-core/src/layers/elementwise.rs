//! Element-wise binary layers
//!
//! `output[r][c] = f(a[r][c], b[r][c])` over two inputs of identical shape. Backward passes
//! use the operator's partial derivatives:
//!
//! ```text
//! grad(a) = ∂f/∂a(a, b) ⊙ deltas
//! grad(b) = ∂f/∂b(a, b) ⊙ deltas
//! ```
//!
//! | Layer              | f(a, b) | ∂f/∂a | ∂f/∂b |
//! |--------------------|---------|-------|-------|
//! | `MultiplyElement`  | a * b   | b     | a     |
//! | `AddElement`       | a + b   | 1     | 1     |
//! | `SubtractElement`  | a - b   | 1     | -1    |

use crate::error::{Error, Result};
use crate::layer::{check_inputs, Layer, LayerState};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tessera_runtime::{Kernel, KernelRuntime, KernelSource};

/// Scalar binary operator with both partial derivatives
pub trait BinaryOp: Send + Sync + 'static {
    /// Layer kind and kernel name prefix
    const NAME: &'static str;

    fn forward(a: f32, b: f32) -> f32;

    /// ∂f/∂a
    fn grad_a(a: f32, b: f32) -> f32;

    /// ∂f/∂b
    fn grad_b(a: f32, b: f32) -> f32;
}

/// `a * b`
#[derive(Debug, Clone, Copy)]
pub struct MulOp;

impl BinaryOp for MulOp {
    const NAME: &'static str = "multiply";

    #[inline]
    fn forward(a: f32, b: f32) -> f32 {
        a * b
    }

    #[inline]
    fn grad_a(_a: f32, b: f32) -> f32 {
        b
    }

    #[inline]
    fn grad_b(a: f32, _b: f32) -> f32 {
        a
    }
}

/// `a + b`
#[derive(Debug, Clone, Copy)]
pub struct AddOp;

impl BinaryOp for AddOp {
    const NAME: &'static str = "add";

    #[inline]
    fn forward(a: f32, b: f32) -> f32 {
        a + b
    }

    #[inline]
    fn grad_a(_a: f32, _b: f32) -> f32 {
        1.0
    }

    #[inline]
    fn grad_b(_a: f32, _b: f32) -> f32 {
        1.0
    }
}

/// `a - b`
#[derive(Debug, Clone, Copy)]
pub struct SubOp;

impl BinaryOp for SubOp {
    const NAME: &'static str = "subtract";

    #[inline]
    fn forward(a: f32, b: f32) -> f32 {
        a - b
    }

    #[inline]
    fn grad_a(_a: f32, _b: f32) -> f32 {
        1.0
    }

    #[inline]
    fn grad_b(_a: f32, _b: f32) -> f32 {
        -1.0
    }
}

pub type MultiplyElement = ElementwiseLayer<MulOp>;
pub type AddElement = ElementwiseLayer<AddOp>;
pub type SubtractElement = ElementwiseLayer<SubOp>;

struct Kernels {
    forward: Arc<Kernel>,
    backward: Option<BackwardKernels>,
}

struct BackwardKernels {
    grad_a: Arc<Kernel>,
    grad_b: Arc<Kernel>,
}

/// Two-input element-wise layer generic over its operator
pub struct ElementwiseLayer<O: BinaryOp> {
    state: LayerState,
    kernels: Option<Kernels>,
    _op: PhantomData<fn() -> O>,
}

impl<O: BinaryOp> ElementwiseLayer<O> {
    /// Layer shaped like its inputs
    ///
    /// Fails with [`Error::ShapeMismatch`] before allocating anything when the inputs differ
    /// in width or height.
    pub fn new(a: &dyn Layer, b: &dyn Layer) -> Result<Self> {
        if a.width() != b.width() || a.height() != b.height() {
            return Err(Error::shape_mismatch(O::NAME, a.shape(), b.shape()));
        }
        Ok(Self {
            state: LayerState::new(a.width(), a.height())?,
            kernels: None,
            _op: PhantomData,
        })
    }

    /// True once `setup_kernels` compiled the backward kernels
    pub fn has_backward_kernels(&self) -> bool {
        self.kernels.as_ref().is_some_and(|k| k.backward.is_some())
    }

    fn forward_source() -> KernelSource {
        KernelSource::new(format!("{}_forward", O::NAME), 2, |t, g| {
            O::forward(g[0].at(t.y, t.x), g[1].at(t.y, t.x))
        })
    }

    fn grad_a_source() -> KernelSource {
        KernelSource::new(format!("{}_backward_a", O::NAME), 3, |t, g| {
            O::grad_a(g[0].at(t.y, t.x), g[1].at(t.y, t.x)) * g[2].at(t.y, t.x)
        })
    }

    fn grad_b_source() -> KernelSource {
        KernelSource::new(format!("{}_backward_b", O::NAME), 3, |t, g| {
            O::grad_b(g[0].at(t.y, t.x), g[1].at(t.y, t.x)) * g[2].at(t.y, t.x)
        })
    }
}

impl<O: BinaryOp> Layer for ElementwiseLayer<O> {
    fn kind(&self) -> &'static str {
        O::NAME
    }

    fn arity(&self) -> usize {
        2
    }

    fn state(&self) -> &LayerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState {
        &mut self.state
    }

    #[tracing::instrument(skip(self, runtime), fields(layer = O::NAME, shape = %self.state.shape()))]
    fn setup_kernels(&mut self, runtime: &KernelRuntime, use_derivative: bool) -> Result<()> {
        let shape = self.state.shape();
        let forward = runtime.compile(&Self::forward_source(), shape)?;
        let backward = if use_derivative {
            Some(BackwardKernels {
                grad_a: runtime.compile(&Self::grad_a_source(), shape)?,
                grad_b: runtime.compile(&Self::grad_b_source(), shape)?,
            })
        } else {
            None
        };

        self.kernels = Some(Kernels { forward, backward });
        Ok(())
    }

    #[tracing::instrument(skip(self, inputs), fields(layer = O::NAME, shape = %self.state.shape()))]
    fn predict(&mut self, inputs: &[&dyn Layer]) -> Result<()> {
        check_inputs(O::NAME, 2, self.state.shape(), inputs.iter().map(|l| l.shape()))?;
        let kernels = self.kernels.as_ref().ok_or(Error::KernelsNotReady {
            layer: O::NAME,
            pass: "forward",
        })?;

        self.state
            .weights
            .refill_with(|| Ok(kernels.forward.run(&[inputs[0].weights(), inputs[1].weights()])?))?;
        self.state.deltas.clear()?;

        tracing::debug!("layer_predict_complete");
        Ok(())
    }

    #[tracing::instrument(skip(self, inputs), fields(layer = O::NAME, shape = %self.state.shape()))]
    fn compare(&mut self, inputs: &mut [&mut dyn Layer]) -> Result<()> {
        check_inputs(O::NAME, 2, self.state.shape(), inputs.iter().map(|l| l.shape()))?;
        let backward = self
            .kernels
            .as_ref()
            .and_then(|k| k.backward.as_ref())
            .ok_or(Error::KernelsNotReady {
                layer: O::NAME,
                pass: "backward",
            })?;

        let deltas = self.state.deltas.get();
        let (grad_a, grad_b) = {
            let (a, b) = (inputs[0].weights(), inputs[1].weights());
            (backward.grad_a.run(&[a, b, deltas])?, backward.grad_b.run(&[a, b, deltas])?)
        };

        inputs[0].set_deltas(grad_a)?;
        inputs[1].set_deltas(grad_b)?;

        tracing::debug!("layer_compare_complete");
        Ok(())
    }
}

impl<O: BinaryOp> fmt::Debug for ElementwiseLayer<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementwiseLayer")
            .field("op", &O::NAME)
            .field("state", &self.state)
            .field("kernels_ready", &self.kernels.is_some())
            .field("backward_ready", &self.has_backward_kernels())
            .finish()
    }
}
