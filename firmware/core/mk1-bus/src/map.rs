//! Shared SRAM slot addresses. These are fixed by the menu ROM running on the
//! SNES and have to match it byte for byte.

/// Base of the battery backed save RAM image.
pub const SRAM_SAVE_ADDR: u32 = 0x60_0000;
/// 32-bit pointer to the directory entry of the current menu selection.
pub const SRAM_FD_ADDR: u32 = 0x60_1000;
/// Single byte command mailbox, 0 = no command pending.
pub const SRAM_CMD_ADDR: u32 = 0x60_1004;
/// Base the menu ROM's directory pointers are relative to.
pub const SRAM_MENU_ADDR: u32 = 0x80_0000;

/// Offset of the long file name inside a directory entry.
pub const FD_NAME_OFFSET: u32 = 0x41;
/// Size of the name payload fetched for a selection.
pub const FD_NAME_LEN: usize = 256;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    pub save: u32,
    pub selection_pointer: u32,
    pub command: u32,
    pub menu: u32,
    pub name_offset: u32,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            save: SRAM_SAVE_ADDR,
            selection_pointer: SRAM_FD_ADDR,
            command: SRAM_CMD_ADDR,
            menu: SRAM_MENU_ADDR,
            name_offset: FD_NAME_OFFSET,
        }
    }
}

impl MemoryMap {
    /// Absolute address of the name payload for a directory pointer written by the menu.
    #[inline(always)]
    pub fn selection_name_addr(&self, fd_pointer: u32) -> u32 {
        fd_pointer
            .wrapping_add(self.name_offset)
            .wrapping_add(self.menu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_address_is_pointer_plus_offset_plus_menu_base() {
        let map = MemoryMap::default();
        assert_eq!(map.selection_name_addr(0x1200), 0x1200 + 0x41 + 0x80_0000);
    }

    #[test]
    fn default_slots_do_not_overlap() {
        let map = MemoryMap::default();
        assert!(map.command >= map.selection_pointer + 4);
        assert_ne!(map.command, map.save);
    }
}
