//! Save RAM checksumming.

use mk1_bus::SharedMemory;

/// Result of a checksum pass. `valid` is false when the pass may have raced
/// a write from the SNES and the value must not be trusted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Checked {
    pub value: u32,
    pub valid: bool,
}

impl Checked {
    pub const fn valid(value: u32) -> Self {
        Self { value, valid: true }
    }

    pub const fn disturbed(value: u32) -> Self {
        Self { value, valid: false }
    }
}

pub trait SaveChecksum<M: SharedMemory> {
    fn checksum(&mut self, memory: &mut M, base: u32, len: u32) -> Checked;
}

/// Bytes read from the shared memory per hasher update.
const CHUNK: usize = 64;

/// CRC-32 (IEEE 802.3) over the region, read through the shared memory in
/// small blocks. The pass counts as disturbed unless the read window was open
/// both before and after it.
#[derive(Debug, Default, Copy, Clone)]
pub struct SoftCrc32;

impl<M: SharedMemory> SaveChecksum<M> for SoftCrc32 {
    fn checksum(&mut self, memory: &mut M, base: u32, len: u32) -> Checked {
        let settled_before = memory.reliable();
        let mut hasher = crc32fast::Hasher::new();
        let mut chunk = [0u8; CHUNK];
        let mut offset = 0;
        while offset < len {
            let n = (len - offset).min(CHUNK as u32) as usize;
            memory.read_block(&mut chunk[..n], base.wrapping_add(offset));
            hasher.update(&chunk[..n]);
            offset += n as u32;
        }
        let settled_after = memory.reliable();

        Checked {
            value: hasher.finalize(),
            valid: settled_before && settled_after,
        }
    }
}
