//! LED hardware abstraction: the channel sink, the bound channel bank and the
//! optional supply rail.

use crate::LED_COUNT;
use crate::types::{ChannelMask, IndicatorError, Peripheral};
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

/// Trait for abstracting an addressable, dimmable LED device.
///
/// Implement this for your LED driver (GPIO PWM, LED controller over I2C,
/// etc.). Errors are never propagated past the indicator; a failed write is
/// logged and the animation carries on.
pub trait LedSink {
    /// Error reported by the driver.
    type Error;

    /// Sets channel `index` to `percent` brightness (0-100).
    fn set_brightness(&mut self, index: u8, percent: u8) -> Result<(), Self::Error>;

    /// Turns channel `index` fully off.
    fn turn_off(&mut self, index: u8) -> Result<(), Self::Error>;

    /// Returns false if the device failed to initialize.
    fn is_ready(&self) -> bool {
        true
    }
}

/// A sink bound to the three logical indicator channels.
///
/// Channel `i` of a [`ChannelMask`] maps to `channels[i]` on the sink. The
/// mapping is fixed at construction.
pub struct LedBank<S: LedSink> {
    sink: S,
    channels: [u8; LED_COUNT],
}

impl<S: LedSink> LedBank<S> {
    /// Binds `sink` to the given device channel indices and turns them off.
    ///
    /// # Errors
    /// * `NotReady(Leds)` - the sink reports it is not ready
    pub fn new(sink: S, channels: [u8; LED_COUNT]) -> Result<Self, IndicatorError> {
        if !sink.is_ready() {
            warn!("LED device not ready");
            return Err(IndicatorError::NotReady(Peripheral::Leds));
        }
        let mut bank = Self { sink, channels };
        bank.all_off();
        Ok(bank)
    }

    /// Sets every channel selected by `mask` to `level`, leaving the rest untouched.
    pub fn apply(&mut self, mask: ChannelMask, level: u8) {
        for (i, &channel) in self.channels.iter().enumerate() {
            if mask.contains(i) && self.sink.set_brightness(channel, level).is_err() {
                trace!("brightness write failed on channel {}", channel);
            }
        }
    }

    /// Turns every channel off.
    pub fn all_off(&mut self) {
        for &channel in &self.channels {
            if self.sink.turn_off(channel).is_err() {
                trace!("turn off failed on channel {}", channel);
            }
        }
    }

    /// Returns the device channel indices.
    pub fn channels(&self) -> [u8; LED_COUNT] {
        self.channels
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

/// Error from [`PwmLeds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmLedError<E> {
    /// The channel index is not one of the three outputs.
    NoSuchChannel(u8),
    /// The PWM output rejected the duty cycle.
    Pwm(E),
}

/// [`LedSink`] over three independent PWM outputs, addressed 0, 1 and 2.
pub struct PwmLeds<P: SetDutyCycle> {
    outputs: [P; LED_COUNT],
}

impl<P: SetDutyCycle> PwmLeds<P> {
    /// Creates a sink from three PWM outputs.
    pub fn new(outputs: [P; LED_COUNT]) -> Self {
        Self { outputs }
    }

    /// Releases the outputs.
    pub fn into_inner(self) -> [P; LED_COUNT] {
        self.outputs
    }

    fn output(&mut self, index: u8) -> Result<&mut P, PwmLedError<P::Error>> {
        self.outputs
            .get_mut(usize::from(index))
            .ok_or(PwmLedError::NoSuchChannel(index))
    }
}

impl<P: SetDutyCycle> LedSink for PwmLeds<P> {
    type Error = PwmLedError<P::Error>;

    fn set_brightness(&mut self, index: u8, percent: u8) -> Result<(), Self::Error> {
        self.output(index)?
            .set_duty_cycle_percent(percent.min(100))
            .map_err(PwmLedError::Pwm)
    }

    fn turn_off(&mut self, index: u8) -> Result<(), Self::Error> {
        self.output(index)?
            .set_duty_cycle_fully_off()
            .map_err(PwmLedError::Pwm)
    }
}

/// The LED supply rail, held active only while something renders.
pub struct PowerRail<P: OutputPin> {
    pin: P,
    active: bool,
}

impl<P: OutputPin> PowerRail<P> {
    /// Takes the enable pin and drives it inactive.
    ///
    /// # Errors
    /// * `NotReady(PowerRail)` - the pin could not be driven
    pub fn new(mut pin: P) -> Result<Self, IndicatorError> {
        if pin.set_low().is_err() {
            warn!("LED power rail pin not ready");
            return Err(IndicatorError::NotReady(Peripheral::PowerRail));
        }
        Ok(Self { pin, active: false })
    }

    /// Raises the rail.
    pub fn enable(&mut self) {
        if !self.active {
            if self.pin.set_high().is_err() {
                warn!("failed to raise LED power rail");
            }
            self.active = true;
        }
    }

    /// Lowers the rail.
    pub fn disable(&mut self) {
        if self.active {
            if self.pin.set_low().is_err() {
                warn!("failed to lower LED power rail");
            }
            self.active = false;
        }
    }

    /// Returns true while the rail is raised.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Releases the pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

/// Placeholder for a pin the board does not have.
///
/// Reads low and ignores writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
