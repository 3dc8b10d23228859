//! Triangular brightness ramps rendered one step at a time.
//!
//! A fade climbs from 0 to [`BRIGHTNESS_MAX`] and back down in fixed steps,
//! then forces every channel off. The ramp up covers steps `0..=n` and the ramp
//! down `n-1..=0`, each computed as `step * MAX / n` on its own, where
//! `n = duration / 2 / step_period`. The caller sleeps one step period between
//! calls to [`Fade::step`] and tells it each time whether the render is still
//! current; a stale render switches everything off and stops at once.

use crate::BRIGHTNESS_MAX;
use crate::led::{LedBank, LedSink};
use crate::types::ChannelMask;

/// Result of one render step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FadeStep {
    /// A level was applied; sleep one step period and step again.
    Continue,
    /// The ramp finished and all channels were turned off.
    Completed,
    /// The render went stale and all channels were turned off.
    Aborted,
}

/// A single fade in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fade {
    mask: ChannelMask,
    steps: u32,
    position: u32,
}

impl Fade {
    /// Prepares a fade over `duration_ms` on the channels in `mask`.
    ///
    /// Durations shorter than two step periods produce a one-step ramp.
    pub fn new(mask: ChannelMask, duration_ms: u32, step_period_ms: u32) -> Self {
        let steps = (duration_ms / 2 / step_period_ms.max(1)).max(1);
        Self {
            mask,
            steps,
            position: 0,
        }
    }

    /// Channels this fade drives.
    pub fn mask(&self) -> ChannelMask {
        self.mask
    }

    /// Number of steps in each half of the ramp.
    pub fn half_steps(&self) -> u32 {
        self.steps
    }

    /// Number of levels the fade applies before switching off.
    pub fn len(&self) -> u32 {
        2 * self.steps + 1
    }

    /// Always false; a fade applies at least three levels.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true once every level has been applied.
    pub fn is_finished(&self) -> bool {
        self.position >= self.len()
    }

    /// Level applied at `position`, or `None` past the end.
    fn level_at(&self, position: u32) -> Option<u8> {
        let step = if position <= self.steps {
            position
        } else if position < self.len() {
            2 * self.steps - position
        } else {
            return None;
        };
        Some((u64::from(step) * u64::from(BRIGHTNESS_MAX) / u64::from(self.steps)) as u8)
    }

    /// The full level sequence this fade applies, from the current position on.
    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        (self.position..self.len()).filter_map(|position| self.level_at(position))
    }

    /// Advances the fade by one step.
    ///
    /// `still_current` is checked before anything is written: when false the
    /// bank is switched off and [`FadeStep::Aborted`] returned without applying
    /// another level. Otherwise the next level goes to the masked channels, or,
    /// once the ramp is done, every channel is turned off.
    pub fn step<S: LedSink>(&mut self, bank: &mut LedBank<S>, still_current: bool) -> FadeStep {
        if !still_current {
            bank.all_off();
            self.position = self.len();
            return FadeStep::Aborted;
        }

        match self.level_at(self.position) {
            Some(level) => {
                bank.apply(self.mask, level);
                self.position += 1;
                FadeStep::Continue
            }
            None => {
                bank.all_off();
                FadeStep::Completed
            }
        }
    }
}
