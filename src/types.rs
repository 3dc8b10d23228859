//! Core types shared by the scheduler, the mailbox and the ingestion adapters.

/// Generation counter value used to detect stale renders.
///
/// Incremented on every posted event and never reset. Wraps on overflow; only
/// equality is ever compared.
pub type Generation = u32;

/// The ambient visual state the indicator returns to between status glances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationMode {
    /// Charger attached, slow medium-tier pulse loops.
    Charging,
    /// Battery critically low, slow low-tier pulse loops.
    Discharged,
    /// Nothing ambient, LEDs dark between glances.
    #[default]
    Idle,
}

/// The next action the scheduler must take.
///
/// Only the latest posted event is kept; posting overwrites whatever was pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationEvent {
    /// One-shot glance of the battery tier.
    ShowBatteryStatus,
    /// One-shot glance requested for the connection status.
    ///
    /// Renders the battery tier, like [`AnimationEvent::ShowBatteryStatus`].
    ShowConnectionStatus,
    /// One-shot glance of the last reported CPI tier.
    ShowCpiStatus,
    /// Enter the charging loop.
    StartCharging,
    /// Enter the discharged loop.
    StartDischarged,
    /// Turn everything off and go idle.
    Stop,
}

impl AnimationEvent {
    /// Returns the ambient mode this event leaves behind once dispatched,
    /// given the mode in effect before it.
    pub fn resulting_mode(self, current: AnimationMode) -> AnimationMode {
        match self {
            AnimationEvent::StartCharging => AnimationMode::Charging,
            AnimationEvent::StartDischarged => AnimationMode::Discharged,
            AnimationEvent::Stop => AnimationMode::Idle,
            AnimationEvent::ShowBatteryStatus
            | AnimationEvent::ShowConnectionStatus
            | AnimationEvent::ShowCpiStatus => current,
        }
    }

    /// Returns true for one-shot status glances.
    pub fn is_glance(self) -> bool {
        matches!(
            self,
            AnimationEvent::ShowBatteryStatus
                | AnimationEvent::ShowConnectionStatus
                | AnimationEvent::ShowCpiStatus
        )
    }
}

/// Selection of LED channels taking part in a render.
///
/// Bit `i` selects channel `i` of the bank. The named tiers are the
/// user-facing meaning of each combination and must not be reshuffled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(pub u8);

impl ChannelMask {
    /// Channel 0 alone: low.
    pub const LOW: Self = ChannelMask(0b001);
    /// Channel 1 alone: good.
    pub const GOOD: Self = ChannelMask(0b010);
    /// Channels 0 and 1: medium.
    pub const MEDIUM: Self = ChannelMask(0b011);
    /// Channels 0 and 2: top CPI tier.
    pub const ULTRA: Self = ChannelMask(0b101);
    /// Every channel.
    pub const ALL: Self = ChannelMask(0b111);

    /// Returns true if channel `index` is selected.
    #[inline]
    pub fn contains(self, index: usize) -> bool {
        index < u8::BITS as usize && self.0 & (1 << index) != 0
    }

    /// Returns the raw bits.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }
}

/// A single render: which channels, for how long, on behalf of which generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderRequest {
    /// Channels to ramp.
    pub mask: ChannelMask,
    /// Total ramp duration (up and down).
    pub duration_ms: u32,
    /// Generation the render belongs to.
    pub generation: Generation,
}

/// Optional or mandatory hardware the indicator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    /// The LED sink driving the three channels.
    Leds,
    /// The LED supply rail enable pin.
    PowerRail,
    /// The charger status input.
    ChargePin,
}

/// Startup errors. Runtime hardware failures are never reported, only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorError {
    /// The peripheral did not respond during setup; the feature it backs is disabled.
    NotReady(Peripheral),
}

impl core::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndicatorError::NotReady(peripheral) => {
                write!(f, "{:?} not ready", peripheral)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IndicatorError {}
