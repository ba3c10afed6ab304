//! Device memory for 2-D textures
//!
//! A [`Device`] owns texture storage; [`crate::Texture`] is the owned handle layers hold.
//! The runtime shares one device between every texture it hands out via [`SharedDevice`].

pub mod cpu;
pub mod memory;
pub mod traits;

pub use cpu::CpuDevice;
pub use memory::MemoryManager;
pub use traits::{Device, DeviceStats};

use parking_lot::RwLock;
use std::sync::Arc;

/// Device shared between the runtime and all textures it has produced
pub type SharedDevice = Arc<RwLock<Box<dyn Device + Send + Sync>>>;

/// Wrap a device for sharing
pub fn share<D>(device: D) -> SharedDevice
where
    D: Device + Send + Sync + 'static,
{
    let boxed: Box<dyn Device + Send + Sync> = Box::new(device);
    Arc::new(RwLock::new(boxed))
}
