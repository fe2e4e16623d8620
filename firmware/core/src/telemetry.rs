//! Per-cycle autosave counters for whoever wants to watch them, e.g. a debug
//! UART task. Snapshots go through a lock-free SPSC ring; when nobody drains
//! it, new snapshots are dropped.

use log::trace;
use rtrb::{Consumer, Producer, RingBuffer};

use crate::autosave::AutosaveEvent;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub checksum: u32,
    pub crc_valid: bool,
    pub sram_valid: bool,
    pub diffcount: u32,
    pub samecount: u32,
    pub didnotsave: u32,
    pub event: AutosaveEvent,
}

pub struct Telemetry {
    producer: Producer<MonitorSnapshot>,
    dropped: u32,
}

impl Telemetry {
    pub fn new(capacity: usize) -> (Self, Consumer<MonitorSnapshot>) {
        let (producer, consumer) = RingBuffer::new(capacity);
        (Self { producer, dropped: 0 }, consumer)
    }

    pub fn record(&mut self, snapshot: MonitorSnapshot) {
        if self.producer.push(snapshot).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            trace!("telemetry ring full, {} snapshots dropped", self.dropped);
        }
    }

    /// Snapshots lost to a full ring so far.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(checksum: u32) -> MonitorSnapshot {
        MonitorSnapshot {
            checksum,
            crc_valid: true,
            sram_valid: true,
            diffcount: 0,
            samecount: 0,
            didnotsave: 0,
            event: AutosaveEvent::Hold,
        }
    }

    #[test]
    fn full_ring_drops_newest() {
        let (mut telemetry, mut consumer) = Telemetry::new(2);
        telemetry.record(snapshot(1));
        telemetry.record(snapshot(2));
        telemetry.record(snapshot(3));
        assert_eq!(telemetry.dropped(), 1);

        assert_eq!(consumer.pop().map(|s| s.checksum), Ok(1));
        assert_eq!(consumer.pop().map(|s| s.checksum), Ok(2));
        assert!(consumer.pop().is_err());
    }
}
