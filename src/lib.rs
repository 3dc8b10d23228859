#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Mailbox`**: Single-slot, generation-stamped hand-off from event sources to the worker
//! - **`Indicator`**: The worker; owns the LEDs and the ambient mode, renders one fade at a time
//! - **`IndicatorHandle`**: What event sources hold to post status requests
//! - **`Fade`**: One triangular brightness ramp, stepped cooperatively
//! - **`IndicatorConfig`**: Thresholds and timings fixed at composition time
//! - **`LedSink`**: Trait to implement for your LED hardware
//! - **`ChargeDetector`**: Debounced charger status input
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Any post bumps the mailbox generation. A render checks the generation
//! before every step and stops, LEDs off, as soon as it has moved on.

#[macro_use]
pub(crate) mod fmt;

pub mod charge;
pub mod classify;
pub mod config;
pub mod fade;
pub mod ingest;
pub mod led;
pub mod mailbox;
pub mod scheduler;
pub mod time;
pub mod types;

pub use charge::ChargeDetector;
pub use classify::{ThresholdError, ThresholdTable, ThresholdTableBuilder, Tier};
pub use config::IndicatorConfig;
pub use fade::{Fade, FadeStep};
pub use ingest::{IndicatorHandle, StatusTrigger, consume_cpi};
pub use led::{LedBank, LedSink, NoPin, PowerRail, PwmLedError, PwmLeds};
pub use mailbox::{Mailbox, Posted};
pub use scheduler::{BatteryGauge, Indicator, ServiceTiming};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use types::{
    AnimationEvent, AnimationMode, ChannelMask, Generation, IndicatorError, Peripheral,
    RenderRequest,
};

/// Number of indicator LEDs.
pub const LED_COUNT: usize = 3;

/// Full brightness, in percent.
pub const BRIGHTNESS_MAX: u8 = 100;

/// Time between two brightness steps of a fade.
pub const STEP_PERIOD_MS: u32 = 10;

/// Duration of a status glance and of one ambient loop iteration.
pub const STATUS_DURATION_MS: u32 = 2000;

/// Settling time of the charger status pin.
pub const CHARGE_DEBOUNCE_MS: u32 = 50;
