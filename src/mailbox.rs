//! Single-slot hand-off between event sources and the animation worker.
//!
//! Every event source writes into the same slot, and every write bumps the
//! generation in the same critical section as it replaces the pending event.
//! A render records the generation it started under and compares it against
//! [`Mailbox::generation`] before each step; any newer post makes it stale.
//! There is no queue: the last post wins.

use crate::types::{AnimationEvent, AnimationMode, Generation};
use core::cell::Cell;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// What the worker sees when it looks at the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Posted {
    /// Generation of the latest post.
    pub generation: Generation,
    /// Latest posted event.
    pub event: AnimationEvent,
    /// Latest reported CPI value.
    pub cpi: u16,
}

#[derive(Clone, Copy)]
struct Slot {
    generation: Generation,
    event: AnimationEvent,
    cpi: u16,
    ambient: AnimationMode,
}

impl Slot {
    fn post(&mut self, event: AnimationEvent) -> Generation {
        self.generation = self.generation.wrapping_add(1);
        self.event = event;
        self.generation
    }
}

/// The shared slot plus the worker's wake-up signal.
///
/// Starts at generation 0 with [`AnimationEvent::Stop`] pending, so a fresh
/// worker switches everything off on its first pass.
pub struct Mailbox<M: RawMutex> {
    slot: Mutex<M, Cell<Slot>>,
    wake: Signal<M, ()>,
}

impl<M: RawMutex> Mailbox<M> {
    /// Creates an empty mailbox. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                generation: 0,
                event: AnimationEvent::Stop,
                cpi: 0,
                ambient: AnimationMode::Idle,
            })),
            wake: Signal::new(),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut Slot) -> R) -> R {
        self.slot.lock(|cell| {
            let mut slot = cell.get();
            let result = f(&mut slot);
            cell.set(slot);
            result
        })
    }

    /// Replaces the pending event, invalidating any render in flight, and
    /// wakes the worker.
    pub fn post(&self, event: AnimationEvent) -> Generation {
        let generation = self.update(|slot| slot.post(event));
        self.wake.signal(());
        generation
    }

    /// Stores a new CPI value and posts [`AnimationEvent::ShowCpiStatus`].
    pub fn post_cpi(&self, cpi: u16) -> Generation {
        let generation = self.update(|slot| {
            slot.cpi = cpi;
            slot.post(AnimationEvent::ShowCpiStatus)
        });
        self.wake.signal(());
        generation
    }

    /// Forces the discharged loop when `level` is at or below `critical`,
    /// unless the indicator is, or is about to be, in the charging loop.
    ///
    /// The ambient mode is judged by what the pending event will leave
    /// behind, so a charge start that has not been dispatched yet still wins.
    /// Returns true if the event was posted.
    pub fn post_low_battery(&self, level: u8, critical: u8) -> bool {
        let posted = self.update(|slot| {
            let effective = slot.event.resulting_mode(slot.ambient);
            if effective != AnimationMode::Charging && level <= critical {
                slot.post(AnimationEvent::StartDischarged);
                true
            } else {
                false
            }
        });
        if posted {
            self.wake.signal(());
        }
        posted
    }

    /// Posts `event` only if nothing has been posted since `expected`.
    ///
    /// Used by the worker to re-arm an ambient loop without clobbering an
    /// event that arrived while the previous render was finishing.
    pub fn repost_if_current(&self, expected: Generation, event: AnimationEvent) -> bool {
        let posted = self.update(|slot| {
            if slot.generation == expected {
                slot.post(event);
                true
            } else {
                false
            }
        });
        if posted {
            self.wake.signal(());
        }
        posted
    }

    /// Returns the live generation.
    pub fn generation(&self) -> Generation {
        self.slot.lock(|cell| cell.get().generation)
    }

    /// Returns the latest post.
    pub fn snapshot(&self) -> Posted {
        self.slot.lock(|cell| {
            let slot = cell.get();
            Posted {
                generation: slot.generation,
                event: slot.event,
                cpi: slot.cpi,
            }
        })
    }

    /// Records the worker's ambient mode for event sources that need it.
    pub fn publish_mode(&self, mode: AnimationMode) {
        self.update(|slot| slot.ambient = mode);
    }

    /// Returns the ambient mode last published by the worker.
    pub fn ambient(&self) -> AnimationMode {
        self.slot.lock(|cell| cell.get().ambient)
    }

    /// Waits until something is posted.
    ///
    /// May return spuriously for a post the worker already consumed.
    pub async fn wait(&self) {
        self.wake.wait().await;
    }
}

impl<M: RawMutex> Default for Mailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}
