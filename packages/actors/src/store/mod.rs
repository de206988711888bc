//! Job queue and device state store implementations.

mod file;
mod memory;

pub use file::{FileDeviceStateStore, FileJobQueue};
pub use memory::{MemoryDeviceStateStore, MemoryJobQueue};
