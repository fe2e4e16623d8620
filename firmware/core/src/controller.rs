use core::fmt::{Debug, Formatter};

use log::{debug, error, info, trace, warn};
use mk1_bus::{ResetLine, ResetPins, SharedMemory};
use rtrb::Consumer;

use crate::autosave::{AutosaveEvent, SaveRamMonitor, SaveTrigger, Verdict};
use crate::checksum::SaveChecksum;
use crate::config::Mk1Config;
use crate::menu::{self, MenuCommand, MenuError, SelectionName};
use crate::storage::{BusyIndicator, NoIndicator, SaveSink};
use crate::telemetry::{MonitorSnapshot, Telemetry};

/// Everything the controller firmware keeps between loop iterations.
///
/// Owned by the caller and driven from its main loop: call
/// [`Controller::snes_main_loop`] repeatedly while a game runs, and
/// [`Controller::menu_main_loop`] while the menu ROM runs.
pub struct Controller<M, P, C, S, B = NoIndicator>
where
    P: ResetPins,
{
    pub memory: M,
    pub reset: ResetLine<P>,
    pub checksum: C,
    pub sink: S,
    pub busy: B,

    pub monitor: SaveRamMonitor,
    pub config: Mk1Config,

    telemetry: Option<Telemetry>,
}

impl<M, P, C, S, B> Debug for Controller<M, P, C, S, B>
where
    P: ResetPins,
{
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("reset", &self.reset.signals())
            .field("monitor", &self.monitor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M, P, C, S, B> Controller<M, P, C, S, B>
where
    M: SharedMemory,
    P: ResetPins,
    C: SaveChecksum<M>,
    S: SaveSink<M>,
    B: BusyIndicator,
{
    /// Takes over the reset line, which leaves the console held in reset.
    pub fn init(memory: M, pins: P, checksum: C, sink: S, busy: B, config: Mk1Config) -> Self {
        let monitor = SaveRamMonitor::new(config.stable_cycles, config.forced_save_after);
        Self {
            memory,
            reset: ResetLine::new(pins),
            checksum,
            sink,
            busy,
            monitor,
            config,
            telemetry: None,
        }
    }

    /// Start recording a [`MonitorSnapshot`] per autosave tick.
    pub fn enable_telemetry(&mut self) -> Consumer<MonitorSnapshot> {
        let (telemetry, consumer) = Telemetry::new(self.config.telemetry_capacity);
        self.telemetry = Some(telemetry);
        consumer
    }

    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telemetry.as_ref()
    }

    /// Called when a ROM is loaded, with its save RAM size (0 for none).
    pub fn configure_save_region(&mut self, size: u32) {
        debug!("save ram region at ${:06X}, {} bytes", self.config.map.save, size);
        self.monitor.configure(size);
    }

    /// One autosave tick: checksum the save RAM, debounce, persist if due.
    pub fn snes_main_loop(&mut self) -> AutosaveEvent {
        if !self.monitor.is_active() {
            return AutosaveEvent::Inactive;
        }

        let size = self.monitor.region_size();
        let checked = self.checksum.checksum(&mut self.memory, self.config.map.save, size);
        let sram_valid = self.memory.reliable();

        let event = match self.monitor.observe(checked, sram_valid) {
            Verdict::Inactive => AutosaveEvent::Inactive,
            Verdict::Seeded => AutosaveEvent::Seeded,
            Verdict::Frozen => AutosaveEvent::Frozen,
            Verdict::Hold => AutosaveEvent::Hold,
            Verdict::Persist(trigger) => self.persist(trigger, checked.value),
        };

        trace!(
            "crc_valid={} sram_valid={} diffcount={} samecount={} didnotsave={}",
            checked.valid,
            sram_valid,
            self.monitor.diffcount(),
            self.monitor.samecount(),
            self.monitor.didnotsave()
        );

        if let Some(telemetry) = &mut self.telemetry {
            telemetry.record(MonitorSnapshot {
                checksum: checked.value,
                crc_valid: checked.valid,
                sram_valid,
                diffcount: self.monitor.diffcount(),
                samecount: self.monitor.samecount(),
                didnotsave: self.monitor.didnotsave(),
                event,
            });
        }

        event
    }

    fn persist(&mut self, trigger: SaveTrigger, crc: u32) -> AutosaveEvent {
        let size = self.monitor.region_size();
        match trigger {
            SaveTrigger::Settled => {
                info!("save ram settled (crc {:08X}), saving {} bytes", crc, size)
            }
            SaveTrigger::Forced => warn!(
                "save ram still changing after {} cycles, forcing save",
                self.config.forced_save_after + 1
            ),
        }

        self.busy.set_busy(true);
        let res = self.sink.persist(&mut self.memory, self.config.map.save, size);
        self.busy.set_busy(false);

        match res {
            Ok(()) => AutosaveEvent::Saved(trigger),
            Err(e) => {
                error!("failed to persist save ram: {:?}", e);
                AutosaveEvent::PersistFailed(trigger)
            }
        }
    }

    /// Block until the menu posts a command.
    pub fn menu_main_loop(&mut self) -> Result<MenuCommand, MenuError> {
        menu::await_command(
            &mut self.memory,
            &mut self.reset,
            &self.config.map,
            self.config.command_poll,
            self.config.reliable_poll,
        )
    }

    /// Name of the entry the menu's selection pointer refers to. Only
    /// meaningful right after [`Self::menu_main_loop`] returned.
    pub fn get_selected_name(&mut self) -> SelectionName {
        menu::fetch_selection_name(&mut self.memory, &self.config.map)
    }

    /// Wait for a command, then fetch the selection it refers to.
    pub fn menu_select(&mut self) -> Result<(MenuCommand, SelectionName), MenuError> {
        let command = self.menu_main_loop()?;
        let name = self.get_selected_name();
        debug!("menu selected {:?} with command {:02X}", name, command.code());
        Ok((command, name))
    }
}
