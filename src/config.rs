//! Composition-time tuning for the indicator.

use crate::classify::{ThresholdTable, Tier};
use crate::types::ChannelMask;
use crate::{CHARGE_DEBOUNCE_MS, STATUS_DURATION_MS, STEP_PERIOD_MS};

/// Battery percentage above which the battery reads as good.
pub const BATTERY_LEVEL_HIGH: u8 = 70;
/// Battery percentage above which the battery reads as medium.
pub const BATTERY_LEVEL_MID: u8 = 30;
/// Battery percentage at or below which the discharged loop is forced.
pub const BATTERY_LEVEL_CRITICAL: u8 = 10;

/// CPI above which the top tier is shown.
pub const CPI_LEVEL_ULTRA: u16 = 3200;
/// CPI above which the good tier is shown.
pub const CPI_LEVEL_HIGH: u16 = 1600;
/// CPI above which the medium tier is shown.
pub const CPI_LEVEL_MID: u16 = 800;

/// Indicator tuning, fixed once the firmware is composed.
///
/// `Default` gives the stock thresholds and timings; the `with_*` setters
/// override individual values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorConfig {
    /// Battery glance tiers.
    pub battery: ThresholdTable,
    /// CPI glance tiers.
    pub cpi: ThresholdTable,
    /// Battery level (inclusive) that forces the discharged loop.
    pub critical_level: u8,
    /// Duration of a one-shot status glance.
    pub glance_ms: u32,
    /// Duration of one iteration of an ambient loop.
    pub ambient_ms: u32,
    /// Time between two brightness steps.
    pub step_period_ms: u32,
    /// Charge pin settling time after an edge.
    pub debounce_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            battery: ThresholdTable::from_sorted(
                [
                    Tier::new(BATTERY_LEVEL_HIGH as u16, ChannelMask::GOOD),
                    Tier::new(BATTERY_LEVEL_MID as u16, ChannelMask::MEDIUM),
                ],
                ChannelMask::LOW,
            ),
            cpi: ThresholdTable::from_sorted(
                [
                    Tier::new(CPI_LEVEL_ULTRA, ChannelMask::ULTRA),
                    Tier::new(CPI_LEVEL_HIGH, ChannelMask::GOOD),
                    Tier::new(CPI_LEVEL_MID, ChannelMask::MEDIUM),
                ],
                ChannelMask::LOW,
            ),
            critical_level: BATTERY_LEVEL_CRITICAL,
            glance_ms: STATUS_DURATION_MS,
            ambient_ms: STATUS_DURATION_MS,
            step_period_ms: STEP_PERIOD_MS,
            debounce_ms: CHARGE_DEBOUNCE_MS,
        }
    }
}

impl IndicatorConfig {
    /// Replaces the battery tiers.
    pub fn with_battery_tiers(mut self, table: ThresholdTable) -> Self {
        self.battery = table;
        self
    }

    /// Replaces the CPI tiers.
    pub fn with_cpi_tiers(mut self, table: ThresholdTable) -> Self {
        self.cpi = table;
        self
    }

    /// Sets the critical battery level.
    pub fn with_critical_level(mut self, level: u8) -> Self {
        self.critical_level = level;
        self
    }

    /// Sets glance and ambient render durations.
    pub fn with_durations(mut self, glance_ms: u32, ambient_ms: u32) -> Self {
        self.glance_ms = glance_ms;
        self.ambient_ms = ambient_ms;
        self
    }

    /// Sets the brightness step period. Zero is raised to one millisecond.
    pub fn with_step_period(mut self, step_period_ms: u32) -> Self {
        self.step_period_ms = step_period_ms.max(1);
        self
    }

    /// Sets the charge pin debounce delay.
    pub fn with_debounce(mut self, debounce_ms: u32) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }
}
