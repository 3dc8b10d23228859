//! Debounced charger status input.
//!
//! The charger toggles its status line when power is attached or removed, and
//! the line bounces. Every edge restarts a settling window; once the line has
//! been quiet for the whole window it is sampled once. High starts the
//! charging loop, low stops everything.

use crate::config::IndicatorConfig;
use crate::ingest::IndicatorHandle;
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::{IndicatorError, Peripheral};
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

/// Debouncer for the charger status pin.
///
/// # Type Parameters
/// * `'m` - Lifetime of the indicator mailbox
/// * `'t` - Lifetime of the time source reference
/// * `M` - Raw mutex guarding the mailbox
/// * `P` - Charge status pin
/// * `I` - Time instant type
/// * `T` - Time source
pub struct ChargeDetector<'m, 't, M: RawMutex, P: InputPin, I: TimeInstant, T: TimeSource<I>> {
    handle: IndicatorHandle<'m, M>,
    pin: P,
    time_source: &'t T,
    debounce_ms: u32,
    last_edge: Option<I>,
}

impl<'m, 't, M: RawMutex, P: InputPin, I: TimeInstant, T: TimeSource<I>>
    ChargeDetector<'m, 't, M, P, I, T>
{
    /// Creates a detector after checking that the pin can be read.
    ///
    /// The settling window is taken from `config.debounce_ms`.
    ///
    /// # Errors
    /// * `NotReady(ChargePin)` - reading the pin failed
    pub fn new(
        handle: IndicatorHandle<'m, M>,
        mut pin: P,
        time_source: &'t T,
        config: &IndicatorConfig,
    ) -> Result<Self, IndicatorError> {
        if pin.is_high().is_err() {
            warn!("charge pin not ready");
            return Err(IndicatorError::NotReady(Peripheral::ChargePin));
        }
        Ok(Self {
            handle,
            pin,
            time_source,
            debounce_ms: config.debounce_ms,
            last_edge: None,
        })
    }

    /// Records an edge on the pin, restarting the settling window.
    ///
    /// Safe to call from the edge interrupt path; nothing is sampled here.
    pub fn edge(&mut self) {
        self.last_edge = Some(self.time_source.now());
    }

    /// Returns true while a settling window is open.
    pub fn is_settling(&self) -> bool {
        self.last_edge.is_some()
    }

    /// Samples the pin once the settling window has elapsed.
    ///
    /// Returns the milliseconds left in the window, or `None` when there is
    /// no window open (either no edge was seen or the pin was just sampled).
    pub fn poll(&mut self) -> Option<u32> {
        let edge = self.last_edge?;
        let elapsed = self.time_source.now().duration_since(edge).as_millis();
        let window = u64::from(self.debounce_ms);
        if elapsed < window {
            return Some((window - elapsed) as u32);
        }

        self.last_edge = None;
        self.sample();
        None
    }

    fn sample(&mut self) {
        match self.pin.is_high() {
            Ok(true) => {
                info!("charging started");
                self.handle.charging_started();
            }
            Ok(false) => {
                info!("charging finished");
                self.handle.charging_stopped();
            }
            Err(_) => warn!("charge pin read failed, keeping current state"),
        }
    }

    /// Releases the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<'m, 't, M: RawMutex, P: InputPin + Wait, I: TimeInstant, T: TimeSource<I>>
    ChargeDetector<'m, 't, M, P, I, T>
{
    /// Watches the pin for edges forever. Spawn in its own task.
    pub async fn watch<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            if self.pin.wait_for_any_edge().await.is_err() {
                warn!("charge pin edge wait failed");
                delay.delay_ms(self.debounce_ms).await;
                continue;
            }
            self.edge();

            while let Some(remaining) = self.poll() {
                if let Either::Second(_) =
                    select(delay.delay_ms(remaining), self.pin.wait_for_any_edge()).await
                {
                    debug!("charge pin bounced");
                    self.edge();
                }
            }
        }
    }
}
