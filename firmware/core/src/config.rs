use mk1_bus::MemoryMap;

/// How long a busy wait may spin before giving up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PollLimit {
    /// Spin until the condition holds, the firmware's behaviour.
    #[default]
    Unbounded,
    /// Give up after this many unsuccessful polls.
    Bounded(u32),
}

impl PollLimit {
    /// Whether another poll is allowed after `polls` unsuccessful ones.
    #[inline(always)]
    pub fn allows(&self, polls: u32) -> bool {
        match self {
            PollLimit::Unbounded => true,
            PollLimit::Bounded(max) => polls < *max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mk1Config {
    pub map: MemoryMap,
    /// Consecutive unchanged checksums after a change that count as settled,
    /// at least 1.
    pub stable_cycles: u32,
    /// A save is forced once `didnotsave` exceeds this.
    pub forced_save_after: u32,
    /// Limit for the command mailbox rendezvous.
    pub command_poll: PollLimit,
    /// Limit for each wait on the SRAM read window.
    pub reliable_poll: PollLimit,
    pub telemetry_capacity: usize,
}

impl Default for Mk1Config {
    fn default() -> Self {
        Self {
            map: MemoryMap::default(),
            stable_cycles: 5,
            forced_save_after: 50,
            command_poll: PollLimit::Unbounded,
            reliable_poll: PollLimit::Unbounded,
            telemetry_capacity: 64,
        }
    }
}
