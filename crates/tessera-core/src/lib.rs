//! # tessera-core - Layer Execution Contract
//!
//! Neural-network layers whose forward and backward passes run as compiled kernels on a
//! [`tessera_runtime::KernelRuntime`].
//!
//! ## Lifecycle
//!
//! 1. Build layers bottom-up in a [`Graph`]; inputs are referenced by [`LayerId`].
//! 2. `setup_kernels` compiles each layer's forward kernel and, for training, its backward
//!    kernels.
//! 3. `predict` runs layers in insertion order. Each layer releases its previous output
//!    texture, runs its forward kernel and zeroes its deltas.
//! 4. The trainer writes the loss gradient into the output layer's deltas.
//! 5. `compare` runs layers in reverse order, overwriting each input's deltas.
//!
//! Device textures are owned by exactly one [`GridSlot`]. Overwriting a slot releases the
//! texture it held; dropping a layer or graph releases whatever is still live.
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::Graph;
//! use tessera_runtime::{HostGrid, KernelRuntime};
//!
//! # fn main() -> tessera_core::Result<()> {
//! let mut graph = Graph::new(KernelRuntime::device());
//! let a = graph.input(3, 2)?;
//! let b = graph.input(3, 2)?;
//! let product = graph.multiply(a, b)?;
//! graph.setup_kernels(true)?;
//!
//! graph.feed(a, &HostGrid::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])?)?;
//! graph.feed(b, &HostGrid::from_rows(&[[7.0, 8.0, 9.0], [10.0, 11.0, 12.0]])?)?;
//! graph.predict()?;
//! assert_eq!(graph.weights(product)?.to_rows(), vec![vec![7.0, 16.0, 27.0], vec![40.0, 55.0, 72.0]]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layer Modules
//!
//! - [`layers::elementwise`] - Element-wise binary layers (multiply, add, subtract)
//! - [`layers::input`] - Graph leaves fed by the trainer

pub mod error;
pub mod graph;
pub mod layer;
pub mod layers;
pub mod slot;

pub use error::{Error, Result};
pub use graph::{Graph, LayerId};
pub use layer::{Layer, LayerState};
pub use layers::{AddElement, BinaryOp, ElementwiseLayer, Input, MultiplyElement, SubtractElement};
pub use slot::GridSlot;
