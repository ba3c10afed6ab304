//! Per-element kernels
//!
//! A [`KernelSource`] is a function evaluated once per output cell. Compiling it against an
//! [`OutputShape`] yields a [`Kernel`] that accepts exactly `arity` inputs of that shape.

pub mod cache;

pub use cache::{KernelCache, KernelKey};

use crate::config::{RuntimeConfig, RuntimeMode};
use crate::device::SharedDevice;
use crate::error::{Result, RuntimeError};
use crate::grid::{GridRef, GridValue, HostGrid};
use crate::texture::Texture;
use crate::types::OutputShape;
use rayon::prelude::*;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Coordinates of the output cell a kernel invocation computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thread {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
}

type KernelBody = dyn Fn(Thread, &[GridRef<'_>]) -> f32 + Send + Sync;

/// Kernel function with its name and input count
#[derive(Clone)]
pub struct KernelSource {
    name: String,
    arity: usize,
    body: Arc<KernelBody>,
}

impl KernelSource {
    pub fn new<F>(name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(Thread, &[GridRef<'_>]) -> f32 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for KernelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelSource")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Kernel compiled for one output shape
pub struct Kernel {
    source: KernelSource,
    shape: OutputShape,
    mode: RuntimeMode,
    parallel_min_elements: usize,
    device: SharedDevice,
}

impl Kernel {
    pub(crate) fn new(source: KernelSource, shape: OutputShape, config: &RuntimeConfig, device: SharedDevice) -> Self {
        Self {
            source,
            shape,
            mode: config.mode,
            parallel_min_elements: config.parallel_min_elements,
            device,
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn arity(&self) -> usize {
        self.source.arity()
    }

    pub fn output_shape(&self) -> OutputShape {
        self.shape
    }

    /// Evaluate the kernel over every output cell
    ///
    /// Inputs must match the kernel arity and output shape. In device mode the result is a
    /// freshly allocated texture owned by the caller.
    #[tracing::instrument(skip(self, inputs), fields(kernel = %self.source.name, shape = %self.shape))]
    pub fn run(&self, inputs: &[&GridValue]) -> Result<GridValue> {
        if inputs.len() != self.source.arity {
            return Err(RuntimeError::ArityMismatch {
                kernel: self.source.name.clone(),
                expected: self.source.arity,
                actual: inputs.len(),
            });
        }
        for input in inputs {
            if input.shape() != self.shape {
                return Err(RuntimeError::shape_mismatch(self.shape, input.shape()));
            }
        }

        let start = Instant::now();

        let values = inputs.iter().map(|input| input.values()).collect::<Result<Vec<Cow<'_, [f32]>>>>()?;
        let grids: Vec<GridRef<'_>> = values.iter().map(|v| GridRef::new(v, self.shape)).collect();

        let mut output = HostGrid::zeros(self.shape);
        let parallel = self.shape.elements() >= self.parallel_min_elements;
        let width = self.shape.width;
        let body: &KernelBody = &*self.source.body;

        if parallel {
            output
                .as_mut_slice()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| fill_row(body, &grids, y, row));
        } else {
            output
                .as_mut_slice()
                .chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| fill_row(body, &grids, y, row));
        }

        let result = match self.mode {
            RuntimeMode::Device => GridValue::Texture(Texture::upload(&self.device, &output)?),
            RuntimeMode::Simulated => GridValue::Host(output),
        };

        let duration_us = start.elapsed().as_micros() as u64;
        tessera_tracing::performance::record_kernel_dispatch(
            &self.source.name,
            self.shape.elements(),
            parallel,
            duration_us,
        );
        tracing::debug!(duration_us = duration_us, parallel = parallel, "kernel_run_complete");

        Ok(result)
    }
}

fn fill_row(body: &KernelBody, grids: &[GridRef<'_>], y: usize, row: &mut [f32]) {
    for (x, cell) in row.iter_mut().enumerate() {
        *cell = body(Thread { x, y }, grids);
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.source.name)
            .field("arity", &self.source.arity)
            .field("shape", &self.shape)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
