//! Where save RAM goes once it has settled, and the status LED that shows it.

use core::fmt::Debug;
use embedded_hal::digital::OutputPin;
use mk1_bus::SharedMemory;

/// Durable destination of the save RAM, typically the `.srm` file next to the
/// loaded ROM. Writing may be slow.
pub trait SaveSink<M: SharedMemory> {
    type Error: Debug;

    /// Copy `len` bytes of shared memory starting at `source` to the medium.
    fn persist(&mut self, memory: &mut M, source: u32, len: u32) -> Result<(), Self::Error>;
}

/// Lit while a save is being written.
pub trait BusyIndicator {
    fn set_busy(&mut self, busy: bool);
}

/// For boards without a status LED.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoIndicator;

impl BusyIndicator for NoIndicator {
    fn set_busy(&mut self, _busy: bool) {}
}

/// Busy LED on a GPIO, active high.
#[derive(Debug)]
pub struct BusyLed<P: OutputPin>(pub P);

impl<P: OutputPin> BusyIndicator for BusyLed<P> {
    fn set_busy(&mut self, busy: bool) {
        // LED errors are ignored
        let _ = if busy { self.0.set_high() } else { self.0.set_low() };
    }
}
