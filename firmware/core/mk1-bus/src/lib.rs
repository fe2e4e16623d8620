#![cfg_attr(not(test), no_std)]
#![allow(clippy::single_match)]
extern crate alloc;

pub mod map;
pub mod memory;
pub mod reset;

pub use map::MemoryMap;
pub use memory::{MmioSram, SharedMemory, SramImage};
pub use reset::{AvrPort, PortResetPins, ResetLine, ResetPins, ResetSignals};
