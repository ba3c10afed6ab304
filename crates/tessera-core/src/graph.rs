//! Layer graph arena
//!
//! Layers live in a `Vec` and refer to their inputs by [`LayerId`]. A layer can only be
//! inserted after its inputs, so insertion order is a topological order: `predict` walks
//! it forwards and `compare` walks it backwards.
//!
//! Each layer output feeds at most one consumer. Accumulating gradients from several
//! consumers is not supported, so a second consumer is rejected at insertion time.

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::layers::{AddElement, Input, MultiplyElement, SubtractElement};
use std::fmt;
use tessera_runtime::{HostGrid, KernelRuntime};

/// Index of a layer inside a [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(usize);

impl LayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

struct Node {
    layer: Box<dyn Layer>,
    inputs: Vec<LayerId>,
    consumer: Option<LayerId>,
}

/// Arena of layers sharing one kernel runtime
pub struct Graph {
    runtime: KernelRuntime,
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new(runtime: KernelRuntime) -> Self {
        Self {
            runtime,
            nodes: Vec::new(),
        }
    }

    pub fn runtime(&self) -> &KernelRuntime {
        &self.runtime
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf layer fed through [`Graph::feed`]
    pub fn input(&mut self, width: usize, height: usize) -> Result<LayerId> {
        self.insert(&[], |_| Input::new(width, height))
    }

    pub fn multiply(&mut self, a: LayerId, b: LayerId) -> Result<LayerId> {
        self.insert(&[a, b], |inputs| MultiplyElement::new(inputs[0], inputs[1]))
    }

    pub fn add(&mut self, a: LayerId, b: LayerId) -> Result<LayerId> {
        self.insert(&[a, b], |inputs| AddElement::new(inputs[0], inputs[1]))
    }

    pub fn subtract(&mut self, a: LayerId, b: LayerId) -> Result<LayerId> {
        self.insert(&[a, b], |inputs| SubtractElement::new(inputs[0], inputs[1]))
    }

    /// Append a layer built from its (already inserted) inputs
    ///
    /// `build` sees the input layers in the order given. Nothing is inserted when an id is
    /// unknown, an input already has a consumer, or `build` fails.
    pub fn insert<L, F>(&mut self, inputs: &[LayerId], build: F) -> Result<LayerId>
    where
        L: Layer + 'static,
        F: FnOnce(&[&dyn Layer]) -> Result<L>,
    {
        let id = LayerId(self.nodes.len());

        for (i, input) in inputs.iter().enumerate() {
            let node = self.node(*input)?;
            if let Some(consumer) = node.consumer {
                return Err(Error::FanOut {
                    input: *input,
                    consumer,
                });
            }
            if inputs[..i].contains(input) {
                return Err(Error::FanOut {
                    input: *input,
                    consumer: id,
                });
            }
        }

        let layer = {
            let refs: Vec<&dyn Layer> = inputs.iter().map(|i| self.nodes[i.0].layer.as_ref()).collect();
            build(&refs)?
        };
        if layer.arity() != inputs.len() {
            return Err(Error::Arity {
                layer: layer.kind(),
                expected: layer.arity(),
                actual: inputs.len(),
            });
        }

        for input in inputs {
            self.nodes[input.0].consumer = Some(id);
        }
        tracing::debug!(layer = %id, kind = layer.kind(), inputs = inputs.len(), "layer_inserted");
        self.nodes.push(Node {
            layer: Box::new(layer),
            inputs: inputs.to_vec(),
            consumer: None,
        });

        Ok(id)
    }

    pub fn layer(&self, id: LayerId) -> Result<&dyn Layer> {
        Ok(self.node(id)?.layer.as_ref())
    }

    pub fn inputs_of(&self, id: LayerId) -> Result<&[LayerId]> {
        Ok(&self.node(id)?.inputs)
    }

    /// Compile kernels for every layer
    #[tracing::instrument(skip(self), fields(layers = self.nodes.len()))]
    pub fn setup_kernels(&mut self, use_derivative: bool) -> Result<()> {
        for node in &mut self.nodes {
            node.layer.setup_kernels(&self.runtime, use_derivative)?;
        }
        Ok(())
    }

    /// Set a layer's weights from host data
    pub fn feed(&mut self, id: LayerId, grid: &HostGrid) -> Result<()> {
        self.node(id)?;
        let value = self.runtime.upload(grid)?;
        self.nodes[id.0].layer.set_weights(value)
    }

    /// Write the loss gradient into a layer's deltas
    pub fn inject_deltas(&mut self, id: LayerId, grid: &HostGrid) -> Result<()> {
        self.node(id)?;
        let value = self.runtime.upload(grid)?;
        self.nodes[id.0].layer.set_deltas(value)
    }

    /// Forward pass over every layer in insertion order
    #[tracing::instrument(skip(self), fields(layers = self.nodes.len()))]
    pub fn predict(&mut self) -> Result<()> {
        let _span = tessera_tracing::perf_span!("graph_predict", layers = self.nodes.len());
        for i in 0..self.nodes.len() {
            let (before, rest) = self.nodes.split_at_mut(i);
            let Node { layer, inputs, .. } = &mut rest[0];
            let refs: Vec<&dyn Layer> = inputs.iter().map(|id| before[id.0].layer.as_ref()).collect();
            layer.predict(&refs)?;
        }
        Ok(())
    }

    /// Backward pass over every layer in reverse insertion order
    #[tracing::instrument(skip(self), fields(layers = self.nodes.len()))]
    pub fn compare(&mut self) -> Result<()> {
        let _span = tessera_tracing::perf_span!("graph_compare", layers = self.nodes.len());
        for i in (0..self.nodes.len()).rev() {
            let (before, rest) = self.nodes.split_at_mut(i);
            let Node { layer, inputs, .. } = &mut rest[0];

            let mut picked: Vec<Option<&mut dyn Layer>> = inputs.iter().map(|_| None).collect();
            for (j, node) in before.iter_mut().enumerate() {
                if let Some(pos) = inputs.iter().position(|id| id.0 == j) {
                    let input: &mut dyn Layer = node.layer.as_mut();
                    picked[pos] = Some(input);
                }
            }
            let mut refs = picked
                .into_iter()
                .zip(inputs.iter())
                .map(|(layer, id)| layer.ok_or(Error::UnknownLayer(*id)))
                .collect::<Result<Vec<_>>>()?;

            layer.compare(&mut refs)?;
        }
        Ok(())
    }

    pub fn weights(&self, id: LayerId) -> Result<HostGrid> {
        Ok(self.node(id)?.layer.weights().to_host()?)
    }

    pub fn deltas(&self, id: LayerId) -> Result<HostGrid> {
        Ok(self.node(id)?.layer.deltas().to_host()?)
    }

    /// Release every live texture held by any layer
    ///
    /// Layers fall back to zero host grids. Dropping the graph has the same effect.
    pub fn release(&mut self) -> Result<()> {
        for node in &mut self.nodes {
            node.layer.state_mut().release()?;
        }
        Ok(())
    }

    fn node(&self, id: LayerId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(Error::UnknownLayer(id))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for node in &self.nodes {
            list.entry(&format_args!("{}({:?})", node.layer.kind(), node.inputs));
        }
        list.finish()
    }
}
