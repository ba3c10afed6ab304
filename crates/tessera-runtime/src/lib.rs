//! Kernel runtime for Tessera layers
//!
//! This crate provides:
//! - **Device Trait**: pluggable device memory interface for 2-D `f32` textures
//! - **CPU Device**: reference device keeping texture storage in a host-side memory manager
//! - **Textures**: exclusively-owned handles with explicit `release()` and `clear()`
//! - **Kernels**: per-element functions compiled against a fixed output shape
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 KernelRuntime                  │
//! │  compile(source, shape) → Kernel (cached)      │
//! └───────────────────────┬───────────────────────┘
//!                         │ kernel.run(&[a, b])
//!             ┌───────────┴───────────┐
//!             ▼                       ▼
//!      RuntimeMode::Device     RuntimeMode::Simulated
//!      GridValue::Texture      GridValue::Host
//!      (device memory)         (plain host grid)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use tessera_runtime::{GridValue, HostGrid, KernelRuntime, KernelSource, OutputShape};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = KernelRuntime::device();
//! let shape = OutputShape::new(3, 2);
//!
//! let multiply = KernelSource::new("multiply", 2, |t, inputs| {
//!     inputs[0].at(t.y, t.x) * inputs[1].at(t.y, t.x)
//! });
//! let kernel = runtime.compile(&multiply, shape)?;
//!
//! let a = GridValue::Host(HostGrid::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])?);
//! let b = GridValue::Host(HostGrid::from_rows(&[[7.0, 8.0, 9.0], [10.0, 11.0, 12.0]])?);
//!
//! let mut out = kernel.run(&[&a, &b])?;
//! assert!(out.is_texture());
//! assert_eq!(out.to_host()?.to_rows(), vec![vec![7.0, 16.0, 27.0], vec![40.0, 55.0, 72.0]]);
//!
//! out.release()?;
//! assert_eq!(runtime.stats().live_textures, 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod runtime;
pub mod texture;
pub mod types;

pub use config::{RuntimeConfig, RuntimeMode};
pub use device::{CpuDevice, Device, DeviceStats, SharedDevice};
pub use error::{Result, RuntimeError};
pub use grid::{GridRef, GridValue, HostGrid};
pub use kernel::{Kernel, KernelCache, KernelKey, KernelSource, Thread};
pub use runtime::KernelRuntime;
pub use texture::Texture;
pub use types::{OutputShape, TextureHandle};
