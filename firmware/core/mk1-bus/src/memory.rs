use alloc::boxed::Box;
use alloc::vec;
use bit_field::BitField;
use log::warn;
use volatile_register::{RO, RW};

/// Byte addressed access to the SRAM shared with the SNES.
///
/// The SNES reads and writes this memory whenever it runs, so every read the
/// controller makes is only meaningful while [`SharedMemory::reliable`]
/// reports an open window.
pub trait SharedMemory {
    fn read_byte(&mut self, address: u32) -> u8;

    fn write_byte(&mut self, address: u32, data: u8);

    /// Whether a read issued right now returns settled data.
    fn reliable(&mut self) -> bool;

    /// Little endian 32-bit read, the byte order of the SNES side.
    fn read_long(&mut self, address: u32) -> u32 {
        let mut bytes = [0u8; 4];
        self.read_block(&mut bytes, address);
        u32::from_le_bytes(bytes)
    }

    fn read_block(&mut self, buf: &mut [u8], address: u32) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(address.wrapping_add(i as u32));
        }
    }

    /// Called once per iteration of a busy wait.
    #[inline(always)]
    fn relax(&mut self) {
        core::hint::spin_loop();
    }
}

/// Heap backed SRAM image covering `[base, base + len)`.
///
/// Reads outside the image float high like an unmapped bus. The reliability
/// gate can be closed outright or for a number of polls, which is how
/// simulations model the SNES being mid-write.
#[derive(Debug, Clone)]
pub struct SramImage {
    base: u32,
    data: Box<[u8]>,
    reliable: bool,
    unreliable_polls: u32,
}

impl SramImage {
    pub fn new(base: u32, len: usize) -> Self {
        Self {
            base,
            data: vec![0; len].into_boxed_slice(),
            reliable: true,
            unreliable_polls: 0,
        }
    }

    pub fn set_reliable(&mut self, reliable: bool) {
        self.reliable = reliable;
    }

    /// Report the window as unreliable for the next `polls` calls to `reliable`.
    pub fn hold_unreliable(&mut self, polls: u32) {
        self.unreliable_polls = polls;
    }

    /// Host side bulk write, bypasses the gate.
    pub fn load(&mut self, address: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.write_byte(address.wrapping_add(i as u32), b);
        }
    }

    #[inline(always)]
    fn index(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.base)? as usize;
        (offset < self.data.len()).then_some(offset)
    }
}

impl SharedMemory for SramImage {
    fn read_byte(&mut self, address: u32) -> u8 {
        match self.index(address) {
            Some(i) => self.data[i],
            None => 0xFF,
        }
    }

    fn write_byte(&mut self, address: u32, data: u8) {
        match self.index(address) {
            Some(i) => self.data[i] = data,
            None => {
                warn!("Attempted to write outside of the SRAM image at: ${:06X}", address);
            }
        }
    }

    fn reliable(&mut self) -> bool {
        if self.unreliable_polls > 0 {
            self.unreliable_polls -= 1;
            return false;
        }
        self.reliable
    }
}

/// SRAM aperture mapped into the controller's address space, with a status
/// register whose `ready_bit` is set while the bus arbiter grants a clean
/// read window.
pub struct MmioSram<'a> {
    base: u32,
    cells: &'a [RW<u8>],
    status: &'a RO<u8>,
    ready_bit: usize,
}

impl<'a> MmioSram<'a> {
    /// # Safety
    /// `window` must point at `len` byte registers and `status` at a readable
    /// register, both valid for `'a`.
    pub unsafe fn new(
        base: u32,
        window: *const RW<u8>,
        len: usize,
        status: *const RO<u8>,
        ready_bit: usize,
    ) -> Self {
        Self {
            base,
            cells: core::slice::from_raw_parts(window, len),
            status: &*status,
            ready_bit,
        }
    }

    #[inline(always)]
    fn cell(&self, address: u32) -> Option<&RW<u8>> {
        let offset = address.checked_sub(self.base)? as usize;
        self.cells.get(offset)
    }
}

impl SharedMemory for MmioSram<'_> {
    fn read_byte(&mut self, address: u32) -> u8 {
        self.cell(address).map_or(0xFF, |c| c.read())
    }

    fn write_byte(&mut self, address: u32, data: u8) {
        match self.cell(address) {
            Some(c) => unsafe { c.write(data) },
            None => {
                warn!("Attempted to write outside of the SRAM window at: ${:06X}", address);
            }
        }
    }

    fn reliable(&mut self) -> bool {
        self.status.read().get_bit(self.ready_bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_reads_outside_float_high() {
        let mut sram = SramImage::new(0x60_0000, 16);
        assert_eq!(sram.read_byte(0x5F_FFFF), 0xFF);
        assert_eq!(sram.read_byte(0x60_0010), 0xFF);
        sram.write_byte(0x60_000F, 0x42);
        assert_eq!(sram.read_byte(0x60_000F), 0x42);
    }

    #[test]
    fn long_reads_are_little_endian() {
        let mut sram = SramImage::new(0, 8);
        sram.load(2, &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(sram.read_long(2), 0x1234_5678);
    }

    #[test]
    fn held_unreliable_window_reopens() {
        let mut sram = SramImage::new(0, 1);
        sram.hold_unreliable(2);
        assert!(!sram.reliable());
        assert!(!sram.reliable());
        assert!(sram.reliable());

        sram.set_reliable(false);
        assert!(!sram.reliable());
    }
}
