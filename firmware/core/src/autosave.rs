//! Save RAM change detection.
//!
//! The SNES writes its battery backed RAM in bursts and never says when a
//! burst is over. Once per main loop iteration the save region is checksummed
//! and compared with the previous checksum:
//!
//! * a change after a stable reading starts a new burst (`diffcount = 1`);
//! * a change right after another change extends the burst and counts a
//!   cycle that went by without a save (`didnotsave += 1`);
//! * `stable_cycles` unchanged readings after a change mean the burst is
//!   over and the region is persisted;
//! * more than `forced_save_after` unsaved cycles of continuous change force
//!   a save anyway, so a game that never stops writing still gets saved.
//!
//! `diffcount` is deliberately left alone by a settled save. It only drops
//! back to zero on a forced save.

use log::trace;

use crate::checksum::Checked;

/// Phase of the debouncer. `samecount` of the counter view is derived from it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DebounceState {
    /// No comparison since the region was configured.
    Idle,
    /// The last comparison saw a change.
    Changing,
    /// This many consecutive comparisons saw no change.
    Settling(u32),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveTrigger {
    /// The region held still for `stable_cycles` comparisons after a change.
    Settled,
    /// The region kept changing for too long.
    Forced,
}

/// What the monitor decided for one observation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No save region configured.
    Inactive,
    /// First checksum since configuration, stored as the reference.
    Seeded,
    /// Checksum disturbed or read window closed, nothing changed.
    Frozen,
    /// Compared, no save due.
    Hold,
    Persist(SaveTrigger),
}

/// Outcome of one autosave tick of the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AutosaveEvent {
    Inactive,
    Seeded,
    Frozen,
    Hold,
    Saved(SaveTrigger),
    /// The sink reported an error. Counters were updated as if it had saved.
    PersistFailed(SaveTrigger),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRamMonitor {
    size: u32,
    prev: Option<u32>,
    state: DebounceState,
    diffcount: u32,
    didnotsave: u32,

    stable_cycles: u32,
    forced_save_after: u32,
}

impl SaveRamMonitor {
    /// `stable_cycles` is raised to at least 1, a save never settles on the
    /// same cycle that saw a change.
    pub fn new(stable_cycles: u32, forced_save_after: u32) -> Self {
        let stable_cycles = stable_cycles.max(1);
        Self {
            size: 0,
            prev: None,
            state: DebounceState::Idle,
            diffcount: 0,
            didnotsave: 0,
            stable_cycles,
            forced_save_after,
        }
    }

    /// Start monitoring a save region of `size` bytes, 0 to stop. Any state
    /// from a previous region is dropped and the next observation reseeds.
    pub fn configure(&mut self, size: u32) {
        self.size = size;
        self.prev = None;
        self.state = DebounceState::Idle;
        self.diffcount = 0;
        self.didnotsave = 0;
    }

    #[inline(always)]
    pub fn region_size(&self) -> u32 {
        self.size
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.size != 0
    }

    /// Feed one checksum. `readable` is the read window state sampled right
    /// after the checksum pass.
    pub fn observe(&mut self, checked: Checked, readable: bool) -> Verdict {
        if !self.is_active() {
            return Verdict::Inactive;
        }

        let Some(prev) = self.prev else {
            self.prev = Some(checked.value);
            return Verdict::Seeded;
        };

        if !(checked.valid && readable) {
            trace!(
                "checksum {:08X} discarded, crc_valid={} sram_valid={}",
                checked.value,
                checked.valid,
                readable
            );
            return Verdict::Frozen;
        }

        if checked.value != prev {
            if self.samecount() != 0 {
                self.diffcount = 1;
            } else {
                self.diffcount += 1;
                self.didnotsave += 1;
            }
            self.state = DebounceState::Changing;
        } else {
            self.state = DebounceState::Settling(self.samecount().saturating_add(1));
        }

        let mut verdict = Verdict::Hold;

        if self.diffcount >= 1 && self.samecount() == self.stable_cycles {
            self.didnotsave = 0;
            verdict = Verdict::Persist(SaveTrigger::Settled);
        }

        if self.didnotsave > self.forced_save_after {
            self.diffcount = 0;
            self.didnotsave = 0;
            verdict = Verdict::Persist(SaveTrigger::Forced);
        }

        self.prev = Some(checked.value);
        verdict
    }

    #[inline(always)]
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Reference checksum the next observation is compared against.
    pub fn previous_checksum(&self) -> Option<u32> {
        self.prev
    }

    pub fn diffcount(&self) -> u32 {
        self.diffcount
    }

    pub fn samecount(&self) -> u32 {
        match self.state {
            DebounceState::Idle | DebounceState::Changing => 0,
            DebounceState::Settling(same) => same,
        }
    }

    pub fn didnotsave(&self) -> u32 {
        self.didnotsave
    }
}

impl Default for SaveRamMonitor {
    fn default() -> Self {
        Self::new(5, 50)
    }
}
