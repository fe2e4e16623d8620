//! Menu command mailbox and selection fetch.
//!
//! While the menu ROM runs, it talks to the controller through a single byte
//! in SRAM: the controller clears it, the menu writes a nonzero command. The
//! byte is only trusted while the console is out of reset and the read
//! window is open, since it holds garbage right after a reset transition.

use core::fmt;
use core::num::NonZeroU8;

use heapless::String;
use log::debug;
use mk1_bus::map::FD_NAME_LEN;
use mk1_bus::{MemoryMap, ResetLine, ResetPins, SharedMemory};

use crate::config::PollLimit;

/// A command byte written by the menu. Never zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MenuCommand(NonZeroU8);

impl MenuCommand {
    pub fn new(code: u8) -> Option<Self> {
        NonZeroU8::new(code).map(Self)
    }

    #[inline(always)]
    pub fn code(&self) -> u8 {
        self.0.get()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MenuError {
    /// A bounded poll ran out before the condition held.
    PollLimitReached { iterations: u32 },
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuError::PollLimitReached { iterations } => {
                write!(f, "gave up polling the menu mailbox after {iterations} iterations")
            }
        }
    }
}

/// Spin until the SRAM read window opens.
pub fn wait_reliable<M: SharedMemory>(memory: &mut M, limit: PollLimit) -> Result<(), MenuError> {
    let mut polls = 0;
    while !memory.reliable() {
        polls += 1;
        if !limit.allows(polls) {
            return Err(MenuError::PollLimitReached { iterations: polls });
        }
        memory.relax();
    }
    Ok(())
}

/// Clear the mailbox and block until the menu posts a command.
///
/// A value is only taken while the console is running and the window is
/// open, and is thrown away again if the console went into reset meanwhile.
pub fn await_command<M: SharedMemory, P: ResetPins>(
    memory: &mut M,
    reset: &mut ResetLine<P>,
    map: &MemoryMap,
    command_poll: PollLimit,
    reliable_poll: PollLimit,
) -> Result<MenuCommand, MenuError> {
    memory.write_byte(map.command, 0);

    let mut polls = 0;
    loop {
        let mut cmd = 0;
        if !reset.is_reset() {
            wait_reliable(memory, reliable_poll)?;
            cmd = memory.read_byte(map.command);
        }
        if reset.is_reset() {
            cmd = 0;
        }

        if let Some(command) = MenuCommand::new(cmd) {
            debug!("menu command {:02X}", command.code());
            return Ok(command);
        }

        polls += 1;
        if !command_poll.allows(polls) {
            return Err(MenuError::PollLimitReached { iterations: polls });
        }
        memory.relax();
    }
}

/// Raw directory entry name of the current selection, NUL padded.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectionName([u8; FD_NAME_LEN]);

impl SelectionName {
    pub fn from_bytes(bytes: [u8; FD_NAME_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FD_NAME_LEN] {
        &self.0
    }

    /// Bytes up to the first NUL.
    pub fn file_name(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(FD_NAME_LEN);
        &self.0[..end]
    }

    /// Printable form of [`Self::file_name`], anything outside ASCII shown as `?`.
    pub fn display_name(&self) -> String<FD_NAME_LEN> {
        let mut name = String::new();
        for &b in self.file_name() {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            // at most FD_NAME_LEN single byte chars
            let _ = name.push(c);
        }
        name
    }
}

impl fmt::Debug for SelectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SelectionName").field(&self.display_name()).finish()
    }
}

/// Follow the menu's directory pointer and read the selected entry's name.
pub fn fetch_selection_name<M: SharedMemory>(memory: &mut M, map: &MemoryMap) -> SelectionName {
    let fd = memory.read_long(map.selection_pointer);
    debug!("fd addr={:X}", fd);

    let mut name = [0u8; FD_NAME_LEN];
    memory.read_block(&mut name, map.selection_name_addr(fd));
    SelectionName(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mk1_bus::SramImage;

    struct Pins {
        low: bool,
    }

    impl ResetPins for Pins {
        fn set_direction(&mut self, _controller_drives: bool) {}
        fn drive_low(&mut self) {
            self.low = true;
        }
        fn release(&mut self) {
            self.low = false;
        }
        fn is_low(&mut self) -> bool {
            self.low
        }
    }

    fn sram() -> SramImage {
        SramImage::new(0x60_0000, 0x20_0100 + FD_NAME_LEN)
    }

    #[test]
    fn stale_command_is_cleared_before_polling() {
        let map = MemoryMap::default();
        let mut memory = sram();
        let mut reset = ResetLine::new(Pins { low: false });
        reset.release_reset();

        memory.write_byte(map.command, 0x07);
        // await_command clears first, so the stale 0x07 is gone
        let res = await_command(
            &mut memory,
            &mut reset,
            &map,
            PollLimit::Bounded(4),
            PollLimit::Unbounded,
        );
        assert_eq!(res, Err(MenuError::PollLimitReached { iterations: 4 }));
        assert_eq!(memory.read_byte(map.command), 0);
    }

    #[test]
    fn commands_are_ignored_while_in_reset() {
        struct Menu {
            inner: SramImage,
        }

        impl SharedMemory for Menu {
            fn read_byte(&mut self, address: u32) -> u8 {
                if address == MemoryMap::default().command {
                    return 0x01;
                }
                self.inner.read_byte(address)
            }
            fn write_byte(&mut self, address: u32, data: u8) {
                self.inner.write_byte(address, data)
            }
            fn reliable(&mut self) -> bool {
                true
            }
        }

        let map = MemoryMap::default();
        let mut memory = Menu { inner: sram() };
        let mut reset = ResetLine::new(Pins { low: false });

        let res = await_command(

            &mut memory,

            &mut reset,

            &map,

            PollLimit::Bounded(10),

            PollLimit::Unbounded,

        );
        assert!(res.is_err());

        reset.release_reset();
        let res = await_command(
            &mut memory,
            &mut reset,
            &map,
            PollLimit::Bounded(10),
            PollLimit::Unbounded,
        );
        assert_eq!(res.map(|c| c.code()), Ok(0x01));
    }

    #[test]
    fn closed_window_is_waited_out() {
        let map = MemoryMap::default();
        let mut memory = sram();
        memory.set_reliable(false);
        let mut reset = ResetLine::new(Pins { low: false });
        reset.release_reset();

        let res = await_command(

            &mut memory,

            &mut reset,

            &map,

            PollLimit::Unbounded,

            PollLimit::Bounded(3),

        );
        assert_eq!(res, Err(MenuError::PollLimitReached { iterations: 3 }));
    }

    #[test]
    fn selection_name_follows_the_directory_pointer() {
        let map = MemoryMap {
            menu: 0x60_0000,
            ..MemoryMap::default()
        };
        let mut memory = sram();
        memory.load(map.selection_pointer, &0x0001_0000u32.to_le_bytes());
        memory.load(0x60_0000 + 0x1_0000 + 0x41, b"Super Metroid (JU).sfc\0junk");

        let name = fetch_selection_name(&mut memory, &map);
        assert_eq!(name.file_name(), b"Super Metroid (JU).sfc");
        assert_eq!(name.display_name().as_str(), "Super Metroid (JU).sfc");
        assert_eq!(&name.as_bytes()[23..27], b"junk");
    }

    #[test]
    fn unterminated_and_non_ascii_names() {
        let mut raw = [b'A'; FD_NAME_LEN];
        raw[3] = 0xE9;
        let name = SelectionName::from_bytes(raw);
        assert_eq!(name.file_name().len(), FD_NAME_LEN);
        assert!(name.display_name().starts_with("AAA?A"));
        assert_eq!(name.display_name().len(), FD_NAME_LEN);
    }

    #[test]
    fn zero_is_not_a_command() {
        assert_eq!(MenuCommand::new(0), None);
        assert_eq!(MenuCommand::new(3).map(|c| c.code()), Some(3));
    }
}
