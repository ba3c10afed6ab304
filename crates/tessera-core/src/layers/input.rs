//! Leaf layer fed by the trainer

use crate::error::Result;
use crate::layer::{check_inputs, Layer, LayerState};
use tessera_runtime::KernelRuntime;

/// Graph leaf holding externally supplied weights
///
/// Has no kernels. Gradients written into its deltas by downstream layers stay there for
/// the trainer to read.
#[derive(Debug)]
pub struct Input {
    state: LayerState,
}

impl Input {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            state: LayerState::new(width, height)?,
        })
    }
}

impl Layer for Input {
    fn kind(&self) -> &'static str {
        "input"
    }

    fn arity(&self) -> usize {
        0
    }

    fn state(&self) -> &LayerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState {
        &mut self.state
    }

    fn setup_kernels(&mut self, _runtime: &KernelRuntime, _use_derivative: bool) -> Result<()> {
        Ok(())
    }

    fn predict(&mut self, inputs: &[&dyn Layer]) -> Result<()> {
        check_inputs(self.kind(), 0, self.shape(), inputs.iter().map(|l| l.shape()))
    }

    fn compare(&mut self, inputs: &mut [&mut dyn Layer]) -> Result<()> {
        check_inputs(self.kind(), 0, self.shape(), inputs.iter().map(|l| l.shape()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tessera_runtime::{GridValue, HostGrid, OutputShape};

    #[test]
    fn test_input_predict_keeps_weights() {
        let mut input = Input::new(2, 1).unwrap();
        input
            .set_weights(GridValue::Host(HostGrid::from_rows(&[[1.0, 2.0]]).unwrap()))
            .unwrap();

        input.predict(&[]).unwrap();
        input.compare(&mut []).unwrap();

        assert_eq!(input.weights().to_host().unwrap().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_input_rejects_wrong_shape() {
        let mut input = Input::new(2, 1).unwrap();
        let err = input
            .set_weights(GridValue::Host(HostGrid::zeros(OutputShape::new(1, 2))))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { layer: "input", .. }));
    }
}
