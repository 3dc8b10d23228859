//! Status classification: mapping a live metric onto a channel tier.
//!
//! A [`ThresholdTable`] is an ordered list of tiers scanned from the highest
//! bound down. The first tier whose bound the value strictly exceeds wins; a
//! value matching no tier falls through to the fallback mask, so every input
//! classifies.

use crate::config::IndicatorConfig;
use crate::types::ChannelMask;
use heapless::Vec;

/// Maximum number of tiers a table can hold (the fallback is not a tier).
pub const MAX_TIERS: usize = 4;

/// One threshold tier: values strictly above `above` select `mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tier {
    /// Exclusive lower bound.
    pub above: u16,
    /// Channels lit for this tier.
    pub mask: ChannelMask,
}

impl Tier {
    /// Creates a new tier.
    #[inline]
    pub const fn new(above: u16, mask: ChannelMask) -> Self {
        Self { above, mask }
    }
}

/// Threshold table validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThresholdError {
    /// More tiers than the table can hold.
    CapacityExceeded,

    /// A tier bound is not strictly below the previous one.
    NotDescending,

    /// No fallback mask was given.
    MissingFallback,
}

impl core::fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ThresholdError::CapacityExceeded => {
                write!(f, "threshold table capacity exceeded")
            }
            ThresholdError::NotDescending => {
                write!(f, "tier bounds must be strictly descending")
            }
            ThresholdError::MissingFallback => {
                write!(f, "threshold table needs a fallback mask")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ThresholdError {}

/// Ordered tiers evaluated high to low, plus the mask used when none match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdTable {
    tiers: Vec<Tier, MAX_TIERS>,
    fallback: ChannelMask,
}

impl ThresholdTable {
    /// Creates a new table builder.
    pub fn builder() -> ThresholdTableBuilder {
        ThresholdTableBuilder::new()
    }

    /// Builds a table from tiers known to be in descending order.
    pub(crate) fn from_sorted<const M: usize>(tiers: [Tier; M], fallback: ChannelMask) -> Self {
        Self {
            tiers: tiers.into_iter().collect(),
            fallback,
        }
    }

    /// Returns the mask for `value`.
    pub fn classify(&self, value: u16) -> ChannelMask {
        self.tiers
            .iter()
            .find(|tier| value > tier.above)
            .map_or(self.fallback, |tier| tier.mask)
    }

    /// Returns the tiers, highest bound first.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Returns the mask used when no tier matches.
    pub fn fallback(&self) -> ChannelMask {
        self.fallback
    }
}

/// Builder for constructing validated threshold tables.
#[derive(Debug, Default)]
pub struct ThresholdTableBuilder {
    tiers: Vec<Tier, MAX_TIERS>,
    fallback: Option<ChannelMask>,
}

impl ThresholdTableBuilder {
    /// Creates a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tier below the previous ones.
    ///
    /// # Errors
    /// * `NotDescending` - `above` is not lower than the previous tier's bound
    /// * `CapacityExceeded` - the table already holds [`MAX_TIERS`] tiers
    pub fn tier(mut self, above: u16, mask: ChannelMask) -> Result<Self, ThresholdError> {
        if let Some(last) = self.tiers.last() {
            if above >= last.above {
                return Err(ThresholdError::NotDescending);
            }
        }
        self.tiers
            .push(Tier::new(above, mask))
            .map_err(|_| ThresholdError::CapacityExceeded)?;
        Ok(self)
    }

    /// Sets the mask used when no tier matches.
    pub fn otherwise(mut self, mask: ChannelMask) -> Self {
        self.fallback = Some(mask);
        self
    }

    /// Builds and validates the table.
    pub fn build(self) -> Result<ThresholdTable, ThresholdError> {
        let fallback = self.fallback.ok_or(ThresholdError::MissingFallback)?;
        Ok(ThresholdTable {
            tiers: self.tiers,
            fallback,
        })
    }
}

impl IndicatorConfig {
    /// Classifies a battery charge percentage into a status glance.
    ///
    /// Returns the channels to light and the glance duration in milliseconds.
    pub fn classify_battery(&self, level: u8) -> (ChannelMask, u32) {
        (self.battery.classify(u16::from(level)), self.glance_ms)
    }

    /// Classifies a CPI value into a status glance.
    pub fn classify_cpi(&self, cpi: u16) -> (ChannelMask, u32) {
        (self.cpi.classify(cpi), self.glance_ms)
    }
}
