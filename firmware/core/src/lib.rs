#![cfg_attr(not(test), no_std)]
#![allow(clippy::single_match)]

pub mod autosave;
pub mod checksum;
pub mod config;
pub mod controller;
pub mod menu;
pub mod storage;
pub mod telemetry;

pub use autosave::{AutosaveEvent, DebounceState, SaveRamMonitor, SaveTrigger, Verdict};
pub use checksum::{Checked, SaveChecksum, SoftCrc32};
pub use config::{Mk1Config, PollLimit};
pub use controller::Controller;
pub use menu::{MenuCommand, MenuError, SelectionName};
pub use storage::{BusyIndicator, BusyLed, NoIndicator, SaveSink};
pub use telemetry::{MonitorSnapshot, Telemetry};

pub use mk1_bus;
