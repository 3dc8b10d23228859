//! The animation worker: one owner for the LEDs, the ambient mode and the
//! render in flight.
//!
//! [`Indicator::service`] does one cooperative step and says how long to
//! sleep before the next. Each step first checks whether the render in flight
//! is still current; if an event was posted since it started, the render is
//! abandoned with the LEDs off and the latest event is dispatched in its
//! place. That check is the only cancellation mechanism.
//!
//! Dispatch, per pending event:
//!
//! | Event                         | Mode after | Render                    | When done            |
//! |-------------------------------|------------|---------------------------|----------------------|
//! | `ShowBatteryStatus`           | unchanged  | battery tier, glance      | resume ambient loop  |
//! | `ShowConnectionStatus`        | unchanged  | battery tier, glance      | resume ambient loop  |
//! | `ShowCpiStatus`               | unchanged  | CPI tier, glance          | resume ambient loop  |
//! | `StartCharging`               | Charging   | [`ChannelMask::MEDIUM`]   | re-post itself       |
//! | `StartDischarged`             | Discharged | [`ChannelMask::LOW`]      | re-post itself       |
//! | `Stop`                        | Idle       | none, LEDs off            | -                    |
//!
//! Re-posting goes through [`Mailbox::repost_if_current`], so an event that
//! lands while a render is finishing is never overwritten.

use crate::config::IndicatorConfig;
use crate::fade::{Fade, FadeStep};
use crate::ingest::IndicatorHandle;
use crate::led::{LedBank, LedSink, NoPin, PowerRail};
use crate::mailbox::Mailbox;
use crate::types::{AnimationEvent, AnimationMode, ChannelMask, Generation, RenderRequest};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

/// Source of the current battery charge percentage.
pub trait BatteryGauge {
    /// Returns the state of charge, 0-100.
    fn state_of_charge(&mut self) -> u8;
}

impl<F: FnMut() -> u8> BatteryGauge for F {
    fn state_of_charge(&mut self) -> u8 {
        self()
    }
}

/// When the worker needs to run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceTiming {
    /// A render is in progress. Sleep this many milliseconds, then service again.
    Delay(u32),
    /// Nothing to do until the next post.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderKind {
    Glance,
    Ambient(AnimationEvent),
}

struct ActiveRender {
    fade: Fade,
    request: RenderRequest,
    kind: RenderKind,
}

/// The animation worker.
///
/// # Type Parameters
/// * `'m` - Lifetime of the shared mailbox
/// * `M` - Raw mutex guarding the mailbox
/// * `S` - LED sink
/// * `B` - Battery gauge
/// * `R` - Power rail pin, [`NoPin`] when the board has none
pub struct Indicator<'m, M: RawMutex, S: LedSink, B: BatteryGauge, R: OutputPin = NoPin> {
    mailbox: &'m Mailbox<M>,
    leds: LedBank<S>,
    rail: Option<PowerRail<R>>,
    battery: B,
    config: IndicatorConfig,
    mode: AnimationMode,
    active: Option<ActiveRender>,
    consumed: Option<Generation>,
}

impl<'m, M: RawMutex, S: LedSink, B: BatteryGauge> Indicator<'m, M, S, B, NoPin> {
    /// Creates an idle worker without a power rail.
    ///
    /// Nothing renders until the first [`service`](Self::service), which
    /// consumes whatever is pending in the mailbox.
    pub fn new(
        mailbox: &'m Mailbox<M>,
        leds: LedBank<S>,
        battery: B,
        config: IndicatorConfig,
    ) -> Self {
        Self {
            mailbox,
            leds,
            rail: None,
            battery,
            config,
            mode: AnimationMode::Idle,
            active: None,
            consumed: None,
        }
    }

    /// Adds an LED supply rail, raised only while rendering.
    ///
    /// If the pin cannot be driven the rail is left out and the indicator
    /// runs without it.
    pub fn with_power_rail<R: OutputPin>(self, pin: R) -> Indicator<'m, M, S, B, R> {
        let rail = match PowerRail::new(pin) {
            Ok(rail) => Some(rail),
            Err(err) => {
                warn!("power rail disabled: {:?}", err);
                None
            }
        };
        Indicator {
            mailbox: self.mailbox,
            leds: self.leds,
            rail,
            battery: self.battery,
            config: self.config,
            mode: self.mode,
            active: self.active,
            consumed: self.consumed,
        }
    }
}

impl<'m, M: RawMutex, S: LedSink, B: BatteryGauge, R: OutputPin> Indicator<'m, M, S, B, R> {
    /// Runs one cooperative step.
    ///
    /// Advances the render in flight, or dispatches the latest post if there
    /// is none (or it just ended).
    pub fn service(&mut self) -> ServiceTiming {
        loop {
            if let Some(timing) = self.step_active() {
                return timing;
            }
            if !self.dispatch() {
                return ServiceTiming::Idle;
            }
        }
    }

    /// Services until there is nothing left to render, sleeping on `delay`
    /// between steps.
    ///
    /// Never returns while an ambient loop is running.
    pub async fn drain<D: DelayNs>(&mut self, delay: &mut D) {
        while let ServiceTiming::Delay(ms) = self.service() {
            delay.delay_ms(ms).await;
        }
    }

    /// The worker loop. Spawn this in its own task.
    pub async fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        info!("indicator worker started");
        loop {
            self.drain(delay).await;
            self.mailbox.wait().await;
        }
    }

    /// Returns a handle for event sources.
    pub fn handle(&self) -> IndicatorHandle<'m, M> {
        IndicatorHandle::new(self.mailbox, self.config.critical_level)
    }

    /// Returns the ambient mode.
    pub fn mode(&self) -> AnimationMode {
        self.mode
    }

    /// Returns the render in flight, if any.
    pub fn current_render(&self) -> Option<RenderRequest> {
        self.active.as_ref().map(|active| active.request)
    }

    /// Returns true while a render is in flight.
    pub fn is_rendering(&self) -> bool {
        self.active.is_some()
    }

    /// Returns true while the power rail is raised. Always false without a rail.
    pub fn rail_active(&self) -> bool {
        self.rail.as_ref().is_some_and(PowerRail::is_active)
    }

    /// Returns the LED bank.
    pub fn leds(&self) -> &LedBank<S> {
        &self.leds
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Steps the render in flight. `None` once there is no render left.
    fn step_active(&mut self) -> Option<ServiceTiming> {
        let live = self.mailbox.generation();
        let active = self.active.as_mut()?;
        let generation = active.request.generation;
        let kind = active.kind;

        match active.fade.step(&mut self.leds, live == generation) {
            FadeStep::Continue => return Some(ServiceTiming::Delay(self.config.step_period_ms)),
            FadeStep::Aborted => {
                debug!("render of generation {} superseded by {}", generation, live);
                self.power_down();
            }
            FadeStep::Completed => self.finish(kind, generation),
        }
        self.active = None;
        None
    }

    fn finish(&mut self, kind: RenderKind, generation: Generation) {
        match kind {
            RenderKind::Glance => {
                self.power_down();
                let resume = match self.mode {
                    AnimationMode::Charging => Some(AnimationEvent::StartCharging),
                    AnimationMode::Discharged => Some(AnimationEvent::StartDischarged),
                    AnimationMode::Idle => None,
                };
                if let Some(event) = resume {
                    if self.mailbox.repost_if_current(generation, event) {
                        debug!("status glance done, resuming {:?}", self.mode);
                    }
                }
            }
            RenderKind::Ambient(event) => {
                self.mailbox.repost_if_current(generation, event);
            }
        }
    }

    /// Consumes the latest post. Returns true if a render was started.
    fn dispatch(&mut self) -> bool {
        let posted = self.mailbox.snapshot();
        if self.consumed == Some(posted.generation) {
            return false;
        }
        self.consumed = Some(posted.generation);

        match posted.event {
            AnimationEvent::ShowBatteryStatus | AnimationEvent::ShowConnectionStatus => {
                let level = self.battery.state_of_charge();
                debug!("battery level: {}%", level);
                let (mask, duration_ms) = self.config.classify_battery(level);
                self.begin(mask, duration_ms, posted.generation, RenderKind::Glance);
            }
            AnimationEvent::ShowCpiStatus => {
                debug!("cpi: {}", posted.cpi);
                let (mask, duration_ms) = self.config.classify_cpi(posted.cpi);
                self.begin(mask, duration_ms, posted.generation, RenderKind::Glance);
            }
            AnimationEvent::StartCharging => {
                self.set_mode(AnimationMode::Charging);
                self.begin(
                    ChannelMask::MEDIUM,
                    self.config.ambient_ms,
                    posted.generation,
                    RenderKind::Ambient(posted.event),
                );
            }
            AnimationEvent::StartDischarged => {
                self.set_mode(AnimationMode::Discharged);
                self.begin(
                    ChannelMask::LOW,
                    self.config.ambient_ms,
                    posted.generation,
                    RenderKind::Ambient(posted.event),
                );
            }
            AnimationEvent::Stop => {
                self.leds.all_off();
                self.power_down();
                self.set_mode(AnimationMode::Idle);
                return false;
            }
        }
        true
    }

    fn begin(&mut self, mask: ChannelMask, duration_ms: u32, generation: Generation, kind: RenderKind) {
        if let Some(rail) = self.rail.as_mut() {
            rail.enable();
        }
        self.active = Some(ActiveRender {
            fade: Fade::new(mask, duration_ms, self.config.step_period_ms),
            request: RenderRequest {
                mask,
                duration_ms,
                generation,
            },
            kind,
        });
    }

    fn power_down(&mut self) {
        if let Some(rail) = self.rail.as_mut() {
            rail.disable();
        }
    }

    fn set_mode(&mut self, mode: AnimationMode) {
        if self.mode != mode {
            info!("indicator mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
        self.mailbox.publish_mode(mode);
    }
}
