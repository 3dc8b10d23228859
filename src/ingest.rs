//! Entry points for everything that can ask the indicator to show something.
//!
//! Each call posts one event to the [`Mailbox`]; the worker picks it up on
//! its next step. None of these block.

use crate::mailbox::Mailbox;
use crate::types::AnimationEvent;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;

/// Cheap, copyable front end to the indicator for event sources.
pub struct IndicatorHandle<'m, M: RawMutex> {
    mailbox: &'m Mailbox<M>,
    critical_level: u8,
}

impl<M: RawMutex> Clone for IndicatorHandle<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for IndicatorHandle<'_, M> {}

impl<'m, M: RawMutex> IndicatorHandle<'m, M> {
    /// Creates a handle. `critical_level` is the battery percentage at or
    /// below which the discharged loop is forced.
    pub fn new(mailbox: &'m Mailbox<M>, critical_level: u8) -> Self {
        Self {
            mailbox,
            critical_level,
        }
    }

    /// Shows the battery tier once.
    pub fn show_battery_status(&self) {
        self.mailbox.post(AnimationEvent::ShowBatteryStatus);
    }

    /// Shows the connection status once.
    ///
    /// Currently renders the battery tier; no connection state is consulted.
    pub fn show_connection_status(&self) {
        self.mailbox.post(AnimationEvent::ShowConnectionStatus);
    }

    /// Reports a new battery level.
    ///
    /// Forces the discharged loop when the level is critical and the charger
    /// is not driving the charging loop. Returns true if that happened.
    pub fn battery_level_changed(&self, level: u8) -> bool {
        let forced = self.mailbox.post_low_battery(level, self.critical_level);
        if forced {
            info!("battery critical at {}%", level);
        }
        forced
    }

    /// Reports a new CPI value and shows its tier once.
    pub fn cpi_value_changed(&self, cpi: u16) {
        self.mailbox.post_cpi(cpi);
    }

    /// Enters the charging loop.
    pub fn charging_started(&self) {
        self.mailbox.post(AnimationEvent::StartCharging);
    }

    /// Leaves any ambient loop and goes dark.
    pub fn charging_stopped(&self) {
        self.mailbox.post(AnimationEvent::Stop);
    }
}

/// Dedicated consumer for the sensor's CPI feed.
///
/// Blocks on `feed` and shows every value it receives. Spawn in its own task.
pub async fn consume_cpi<M: RawMutex, F: RawMutex, const N: usize>(
    handle: IndicatorHandle<'_, M>,
    feed: Receiver<'_, F, u16, N>,
) -> ! {
    loop {
        let cpi = feed.receive().await;
        debug!("cpi reported: {}", cpi);
        handle.cpi_value_changed(cpi);
    }
}

/// The keymap behavior bound to a "show status" key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusTrigger {
    /// Show the battery tier on press.
    pub check_battery: bool,
    /// Show the connection status on press.
    pub check_connection: bool,
}

impl StatusTrigger {
    /// Fires the enabled glances.
    ///
    /// With both enabled the connection glance is posted last and wins.
    pub fn pressed<M: RawMutex>(&self, handle: &IndicatorHandle<'_, M>) {
        if self.check_battery {
            handle.show_battery_status();
        }
        if self.check_connection {
            handle.show_connection_status();
        }
    }

    /// Key release. Nothing to do; the glance runs to completion on its own.
    pub fn released<M: RawMutex>(&self, _handle: &IndicatorHandle<'_, M>) {}
}
