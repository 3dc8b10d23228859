//! Shared test infrastructure for vfx-indicator integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use std::collections::VecDeque;
use std::rc::Rc;
use vfx_indicator::{
    AnimationEvent, BatteryGauge, Indicator, IndicatorConfig, LedBank, LedSink, Mailbox,
    ServiceTiming, TimeDuration, TimeInstant, TimeSource,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock LED Sink
// ============================================================================

/// One call made on the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Set(u8, u8),
    Off(u8),
}

/// LED sink that records every call and tracks the current level per channel
#[derive(Default)]
pub struct RecordingSink {
    pub levels: [u8; 3],
    pub ops: Vec<Op>,
    pub failing_channel: Option<u8>,
    pub not_ready: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels written to `channel`, in order, starting at op `from`
    pub fn levels_written(&self, channel: u8, from: usize) -> Vec<u8> {
        self.ops[from..]
            .iter()
            .filter_map(|op| match *op {
                Op::Set(c, level) if c == channel => Some(level),
                _ => None,
            })
            .collect()
    }

    /// True when every channel is at zero
    pub fn all_dark(&self) -> bool {
        self.levels.iter().all(|&level| level == 0)
    }
}

impl LedSink for RecordingSink {
    type Error = ();

    fn set_brightness(&mut self, index: u8, percent: u8) -> Result<(), Self::Error> {
        if self.failing_channel == Some(index) {
            return Err(());
        }
        self.levels[usize::from(index)] = percent;
        self.ops.push(Op::Set(index, percent));
        Ok(())
    }

    fn turn_off(&mut self, index: u8) -> Result<(), Self::Error> {
        self.levels[usize::from(index)] = 0;
        self.ops.push(Op::Off(index));
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.not_ready
    }
}

// ============================================================================
// Mock Pins
// ============================================================================

/// Input pin whose level is shared with the test
#[derive(Clone)]
pub struct SharedPin {
    pub level: Rc<Cell<bool>>,
    pub broken: Rc<Cell<bool>>,
}

impl SharedPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
            broken: Rc::new(Cell::new(false)),
        }
    }
}

impl ErrorType for SharedPin {
    type Error = embedded_hal::digital::ErrorKind;
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.broken.get() {
            return Err(embedded_hal::digital::ErrorKind::Other);
        }
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Output pin recording its level and how often it was raised
#[derive(Clone, Default)]
pub struct RailPin {
    pub high: Rc<Cell<bool>>,
    pub raises: Rc<Cell<u32>>,
}

impl ErrorType for RailPin {
    type Error = Infallible;
}

impl OutputPin for RailPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        self.raises.set(self.raises.get() + 1);
        Ok(())
    }
}

/// Output pin that always fails
pub struct DeadPin;

impl ErrorType for DeadPin {
    type Error = embedded_hal::digital::ErrorKind;
}

impl OutputPin for DeadPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(embedded_hal::digital::ErrorKind::Other)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(embedded_hal::digital::ErrorKind::Other)
    }
}

// ============================================================================
// Virtual Delay
// ============================================================================

/// Delay that returns at once, advancing a virtual clock and firing scripted
/// posts whose time has come
pub struct VirtualDelay<'a> {
    pub now_ms: u64,
    mailbox: &'a Mailbox<NoopRawMutex>,
    script: VecDeque<(u64, AnimationEvent)>,
}

impl<'a> VirtualDelay<'a> {
    pub fn new(mailbox: &'a Mailbox<NoopRawMutex>) -> Self {
        Self {
            now_ms: 0,
            mailbox,
            script: VecDeque::new(),
        }
    }

    /// Posts `event` once the virtual clock reaches `at_ms`
    pub fn post_at(mut self, at_ms: u64, event: AnimationEvent) -> Self {
        self.script.push_back((at_ms, event));
        self
    }

    fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        while let Some(&(at, event)) = self.script.front() {
            if at > self.now_ms {
                break;
            }
            self.mailbox.post(event);
            self.script.pop_front();
        }
    }
}

impl DelayNs for VirtualDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns) / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us) / 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Builds an indicator over a fresh recording sink with the default config
pub fn indicator<'m, F: FnMut() -> u8>(
    mailbox: &'m Mailbox<NoopRawMutex>,
    battery: F,
) -> Indicator<'m, NoopRawMutex, RecordingSink, F> {
    let leds = LedBank::new(RecordingSink::new(), [0, 1, 2]).unwrap();
    Indicator::new(mailbox, leds, battery, IndicatorConfig::default())
}

/// Services until idle or until `budget_ms` of step delays have passed.
///
/// Returns the milliseconds of delay consumed and the last timing seen.
pub fn service_for<M, S, B, R>(
    indicator: &mut Indicator<'_, M, S, B, R>,
    budget_ms: u32,
) -> (u32, ServiceTiming)
where
    M: RawMutex,
    S: LedSink,
    B: BatteryGauge,
    R: OutputPin,
{
    let mut elapsed = 0;
    loop {
        match indicator.service() {
            ServiceTiming::Delay(ms) => {
                elapsed += ms;
                if elapsed >= budget_ms {
                    return (elapsed, ServiceTiming::Delay(ms));
                }
            }
            ServiceTiming::Idle => return (elapsed, ServiceTiming::Idle),
        }
    }
}

// ============================================================================
// Scripted Edge Pin
// ============================================================================

/// Virtual clock plus a script of pin level changes, shared by
/// [`ScriptedPin`] and [`BusDelay`]
pub struct EdgeBus {
    now_ms: Cell<u64>,
    level: Cell<bool>,
    edges: RefCell<VecDeque<(u64, bool)>>,
    edge_pending: Cell<bool>,
    parked: Cell<bool>,
}

impl EdgeBus {
    pub fn new(level: bool, edges: &[(u64, bool)]) -> Rc<Self> {
        Rc::new(Self {
            now_ms: Cell::new(0),
            level: Cell::new(level),
            edges: RefCell::new(edges.iter().copied().collect()),
            edge_pending: Cell::new(false),
            parked: Cell::new(false),
        })
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    /// True once the script is exhausted and a waiter is blocked on the pin
    pub fn parked(&self) -> bool {
        self.parked.get()
    }

    /// Fires the next scripted edge if it is due by `deadline`
    fn fire_until(&self, deadline: u64) -> bool {
        let next = self.edges.borrow().front().copied();
        match next {
            Some((at, level)) if at <= deadline => {
                self.edges.borrow_mut().pop_front();
                self.now_ms.set(self.now_ms.get().max(at));
                self.level.set(level);
                self.edge_pending.set(true);
                true
            }
            _ => false,
        }
    }
}

impl TimeSource<TestInstant> for EdgeBus {
    fn now(&self) -> TestInstant {
        TestInstant(self.now_ms.get())
    }
}

/// Input pin driven by an [`EdgeBus`] script
pub struct ScriptedPin(pub Rc<EdgeBus>);

impl ErrorType for ScriptedPin {
    type Error = Infallible;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.level.get())
    }
}

impl Wait for ScriptedPin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        while !self.0.level.get() {
            self.wait_for_any_edge().await?;
        }
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        while self.0.level.get() {
            self.wait_for_any_edge().await?;
        }
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        loop {
            self.wait_for_any_edge().await?;
            if self.0.level.get() {
                return Ok(());
            }
        }
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        loop {
            self.wait_for_any_edge().await?;
            if !self.0.level.get() {
                return Ok(());
            }
        }
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        // An edge fired while a racing delay was running.
        if self.0.edge_pending.replace(false) {
            return Ok(());
        }
        // Nothing else moves the clock: jump to the next edge.
        if self.0.fire_until(u64::MAX) {
            self.0.edge_pending.set(false);
            return Ok(());
        }
        self.0.parked.set(true);
        core::future::pending().await
    }
}

/// Delay over an [`EdgeBus`]: advances the clock, but stops at (and never
/// completes past) a scripted edge that falls inside the wait
pub struct BusDelay(pub Rc<EdgeBus>);

impl BusDelay {
    async fn advance(&mut self, ms: u64) {
        let deadline = self.0.now_ms.get() + ms;
        if self.0.fire_until(deadline) {
            core::future::pending::<()>().await;
        }
        self.0.now_ms.set(deadline);
    }
}

impl DelayNs for BusDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns) / 1_000_000).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us) / 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms)).await;
    }
}
