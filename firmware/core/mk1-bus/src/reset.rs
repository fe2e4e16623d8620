//! SNES /RESET ownership.
//!
//! /RESET is shared: the controller holds the console in reset while it owns
//! the SRAM, and lets go so the console (and its reset button) can drive the
//! line while a game or the menu runs. An external buffer whose direction is
//! set by RESET_DIR sits between the two.

use bit_field::BitField;
use bitfield::bitfield;
use log::debug;
use volatile_register::{RO, RW};

bitfield! {
    /// Shadow of the three sub-signals behind /RESET as last set by the controller.
    #[derive(Copy, Clone, PartialEq, Eq)]
    pub struct ResetSignals(u8);
    impl Debug;
    /// RESET_DIR asserted: the buffer passes the controller's level to the console.
    pub direction, set_direction: 0;
    /// /RESET configured as an output driving low.
    pub drive_low, set_drive_low: 1;
    /// /RESET released to the pull-up.
    pub pull_up, set_pull_up: 2;
}

impl ResetSignals {
    /// Never drive low against the pull-up, never drive without owning the buffer.
    #[inline(always)]
    pub fn is_sound(&self) -> bool {
        !(self.drive_low() && self.pull_up()) && (!self.drive_low() || self.direction())
    }
}

/// Pin level operations a board provides for the reset line.
pub trait ResetPins {
    /// Set RESET_DIR. `true` hands the buffer to the controller.
    fn set_direction(&mut self, controller_drives: bool);

    /// Switch /RESET to an output driving low.
    fn drive_low(&mut self);

    /// Stop driving /RESET and leave it to the pull-up.
    fn release(&mut self);

    /// Sample /RESET, whoever is driving it.
    fn is_low(&mut self) -> bool;
}

#[derive(Debug)]
pub struct ResetLine<P: ResetPins> {
    pins: P,
    signals: ResetSignals,
}

impl<P: ResetPins> ResetLine<P> {
    /// Take over the line and hold the console in reset.
    pub fn new(pins: P) -> Self {
        let mut line = Self {
            pins,
            signals: ResetSignals(0),
        };
        line.assert_reset();
        line
    }

    pub fn assert_reset(&mut self) {
        self.pins.set_direction(true);
        self.signals.set_direction(true);

        self.signals.set_pull_up(false);
        self.pins.drive_low();
        self.signals.set_drive_low(true);

        debug_assert!(self.signals.is_sound());
        debug!("snes reset asserted");
    }

    pub fn release_reset(&mut self) {
        self.pins.release();
        self.signals.set_drive_low(false);
        self.signals.set_pull_up(true);

        self.pins.set_direction(false);
        self.signals.set_direction(false);

        debug_assert!(self.signals.is_sound());
        debug!("snes reset released");
    }

    /// `true` puts the console in reset, `false` lets it run.
    pub fn set_reset(&mut self, state: bool) {
        if state {
            self.assert_reset()
        } else {
            self.release_reset()
        }
    }

    /// `true` while /RESET reads low, regardless of who drives it.
    #[inline(always)]
    pub fn is_reset(&mut self) -> bool {
        self.pins.is_low()
    }

    #[inline(always)]
    pub fn signals(&self) -> ResetSignals {
        self.signals
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }
}

/// AVR style GPIO port, registers in PINx, DDRx, PORTx order.
#[repr(C)]
pub struct AvrPort {
    pub pin: RO<u8>,
    pub ddr: RW<u8>,
    pub port: RW<u8>,
}

/// /RESET and RESET_DIR on two bits of the same AVR port.
pub struct PortResetPins<'a> {
    regs: &'a AvrPort,
    reset_bit: usize,
    dir_bit: usize,
}

impl<'a> PortResetPins<'a> {
    /// Configures RESET_DIR as an output. /RESET starts out floating on the
    /// pull-up until [`ResetLine::new`] takes it over.
    ///
    /// # Safety
    /// `regs` must point at the port's registers for `'a` and no one else may
    /// touch the two bits.
    pub unsafe fn new(regs: *const AvrPort, reset_bit: usize, dir_bit: usize) -> Self {
        let regs = &*regs;
        regs.ddr.modify(|mut ddr| {
            ddr.set_bit(dir_bit, true);
            ddr
        });
        Self {
            regs,
            reset_bit,
            dir_bit,
        }
    }
}

impl ResetPins for PortResetPins<'_> {
    fn set_direction(&mut self, controller_drives: bool) {
        let bit = self.dir_bit;
        unsafe {
            self.regs.port.modify(|mut port| {
                port.set_bit(bit, controller_drives);
                port
            });
        }
    }

    fn drive_low(&mut self) {
        let bit = self.reset_bit;
        unsafe {
            // pull-up off while still an input, then turn the output on
            self.regs.port.modify(|mut port| {
                port.set_bit(bit, false);
                port
            });
            self.regs.ddr.modify(|mut ddr| {
                ddr.set_bit(bit, true);
                ddr
            });
        }
    }

    fn release(&mut self) {
        let bit = self.reset_bit;
        unsafe {
            self.regs.ddr.modify(|mut ddr| {
                ddr.set_bit(bit, false);
                ddr
            });
            self.regs.port.modify(|mut port| {
                port.set_bit(bit, true);
                port
            });
        }
    }

    fn is_low(&mut self) -> bool {
        !self.regs.pin.read().get_bit(self.reset_bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Default)]
    struct TracePins {
        level_low: bool,
        trace: Vec<&'static str>,
    }

    impl ResetPins for TracePins {
        fn set_direction(&mut self, controller_drives: bool) {
            self.trace.push(if controller_drives { "dir" } else { "undir" });
        }

        fn drive_low(&mut self) {
            self.level_low = true;
            self.trace.push("drive");
        }

        fn release(&mut self) {
            self.level_low = false;
            self.trace.push("release");
        }

        fn is_low(&mut self) -> bool {
            self.level_low
        }
    }

    #[test]
    fn new_holds_console_in_reset() {
        let mut line = ResetLine::new(TracePins::default());
        assert!(line.is_reset());
        assert_eq!(line.pins().trace, ["dir", "drive"]);
        assert!(line.signals().direction());
        assert!(line.signals().drive_low());
        assert!(!line.signals().pull_up());
    }

    #[test]
    fn release_drops_drive_before_direction() {
        let mut line = ResetLine::new(TracePins::default());
        line.pins_mut().trace.clear();

        line.release_reset();
        assert!(!line.is_reset());
        assert_eq!(line.pins().trace, ["release", "undir"]);
        assert_eq!(line.signals(), {
            let mut s = ResetSignals(0);
            s.set_pull_up(true);
            s
        });
    }

    #[test]
    fn set_reset_toggles_and_stays_sound() {
        let mut line = ResetLine::new(TracePins::default());
        for state in [false, true, true, false, true] {
            line.set_reset(state);
            assert!(line.signals().is_sound());
            assert_eq!(line.is_reset(), state);
        }
    }

    #[test]
    fn unsound_combinations_are_flagged() {
        let mut s = ResetSignals(0);
        s.set_drive_low(true);
        assert!(!s.is_sound(), "driving without the buffer");
        s.set_direction(true);
        assert!(s.is_sound());
        s.set_pull_up(true);
        assert!(!s.is_sound(), "driving against the pull-up");
    }
}
