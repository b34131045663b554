//! Battery estimation.
//!
//! The battery rail is read through a divider on GPIO29 (ADC3). On the
//! wireless badge the same pin is the radio module's SPI clock and GPIO25
//! is its chip select, so a reading has to park the radio, borrow both pins
//! and hand them back afterwards. [`RadioPinGuard`] owns that borrow: the
//! pins and the radio's active state are restored when it drops, whichever
//! way the reading ends.

use core::ops::{Deref, DerefMut};

use embedded_hal::delay::DelayNs;

use crate::config::BatteryThresholds;

/// Chip select of the radio module; must be high while GPIO29 is sensed.
pub const RADIO_CONTROL_PIN: Pin = Pin::Gpio(25);
/// VSYS/3 through the divider, shared with the radio clock.
pub const SENSE_PIN: Pin = Pin::Gpio(29);
/// Alternate function GPIO29 runs in while the radio owns it.
pub const SENSE_ALT_FUNCTION: u8 = 7;
/// VBUS detect, routed through the radio module on wireless boards.
pub const VBUS_SENSE_RADIO: Pin = Pin::Radio(2);
pub const VBUS_SENSE_PLAIN: Pin = Pin::Gpio(24);

pub const SAMPLE_COUNT: u32 = 5;
pub const SAMPLE_INTERVAL_MS: u32 = 50;
pub const RADIO_SETTLE_MS: u32 = 100;
pub const PLAIN_SETTLE_MS: u32 = 500;

const ADC_REFERENCE_VOLTS: f32 = 3.3;
const ADC_FULL_SCALE: f32 = 65536.0;
/// Volts per raw count: the divider drops VSYS by three.
pub const CONVERSION_FACTOR: f32 = 3.0 * ADC_REFERENCE_VOLTS / ADC_FULL_SCALE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HardwareVariant {
    /// Plain badge, sense pin is dedicated.
    Plain,
    /// Badge with a radio module sharing the sense pin.
    Wireless,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pin {
    /// MCU GPIO.
    Gpio(u8),
    /// GPIO exposed by the radio module.
    Radio(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output { high: bool },
    Alternate(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

pub trait SenseHardware {
    type Error: core::fmt::Debug;

    fn variant(&self) -> HardwareVariant;
    /// One 16-bit sample of the sense ADC.
    fn read_raw_adc(&mut self) -> Result<u16, Self::Error>;
    fn read_digital(&mut self, pin: Pin) -> Result<bool, Self::Error>;
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode, pull: Pull) -> Result<(), Self::Error>;
    /// Switches the radio on or off and returns whether it was active before.
    fn radio_set_active(&mut self, active: bool) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BatteryLevel {
    /// Charge estimate. Capped at 100 but may be negative below the empty threshold.
    Percent(f32),
    ExternalPower,
    /// The reading failed; nothing is known about the battery.
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerReading {
    pub voltage: f32,
    pub level: BatteryLevel,
}

impl PowerReading {
    pub const fn unknown() -> Self {
        Self {
            voltage: 0.0,
            level: BatteryLevel::Unknown,
        }
    }
}

/// Radio parked and GPIO25/29 reconfigured for sensing for as long as the
/// guard lives.
pub struct RadioPinGuard<'a, H: SenseHardware> {
    hw: &'a mut H,
    radio_was_active: bool,
}

impl<'a, H: SenseHardware> RadioPinGuard<'a, H> {
    pub fn acquire(hw: &'a mut H) -> Result<Self, H::Error> {
        let radio_was_active = hw.radio_set_active(false);
        // Built before touching the pins so a failed reconfigure still restores.
        let mut guard = Self {
            hw,
            radio_was_active,
        };
        guard
            .hw
            .set_pin_mode(RADIO_CONTROL_PIN, PinMode::Output { high: true }, Pull::Down)?;
        guard.hw.set_pin_mode(SENSE_PIN, PinMode::Input, Pull::None)?;
        Ok(guard)
    }
}

impl<H: SenseHardware> Deref for RadioPinGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.hw
    }
}

impl<H: SenseHardware> DerefMut for RadioPinGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.hw
    }
}

impl<H: SenseHardware> Drop for RadioPinGuard<'_, H> {
    fn drop(&mut self) {
        if let Err(err) =
            self.hw
                .set_pin_mode(RADIO_CONTROL_PIN, PinMode::Output { high: false }, Pull::Down)
        {
            log::error!("Failed to restore radio control pin: {:?}", err);
        }
        if let Err(err) = self.hw.set_pin_mode(
            SENSE_PIN,
            PinMode::Alternate(SENSE_ALT_FUNCTION),
            Pull::Down,
        ) {
            log::error!("Failed to restore sense pin function: {:?}", err);
        }
        self.hw.radio_set_active(self.radio_was_active);
        log::trace!("Radio pins released, radio active={}", self.radio_was_active);
    }
}

pub struct PowerMonitor<H: SenseHardware> {
    hw: H,
    thresholds: BatteryThresholds,
}

impl<H: SenseHardware> PowerMonitor<H> {
    pub fn new(hw: H, thresholds: BatteryThresholds) -> Self {
        Self { hw, thresholds }
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// One best-effort reading. Hardware failures are logged and reported
    /// as [`BatteryLevel::Unknown`].
    pub fn read(&mut self, delay: &mut impl DelayNs) -> PowerReading {
        match self.try_read(delay) {
            Ok(reading) => {
                log::debug!("Battery {:.3} V, {:?}", reading.voltage, reading.level);
                reading
            }
            Err(err) => {
                log::warn!("Battery reading failed: {:?}", err);
                PowerReading::unknown()
            }
        }
    }

    fn try_read(&mut self, delay: &mut impl DelayNs) -> Result<PowerReading, H::Error> {
        let (external_power, mean) = match self.hw.variant() {
            HardwareVariant::Wireless => {
                let mut guard = RadioPinGuard::acquire(&mut self.hw)?;
                let vbus = guard.read_digital(VBUS_SENSE_RADIO)?;
                let mean = average_samples(&mut *guard, delay, RADIO_SETTLE_MS)?;
                (vbus, mean)
            }
            HardwareVariant::Plain => {
                self.hw
                    .set_pin_mode(RADIO_CONTROL_PIN, PinMode::Output { high: true }, Pull::Down)?;
                self.hw.set_pin_mode(SENSE_PIN, PinMode::Input, Pull::None)?;
                let vbus = self.hw.read_digital(VBUS_SENSE_PLAIN)?;
                let mean = average_samples(&mut self.hw, delay, PLAIN_SETTLE_MS)?;
                (vbus, mean)
            }
        };
        let voltage = mean * CONVERSION_FACTOR;
        let level = if external_power {
            BatteryLevel::ExternalPower
        } else {
            BatteryLevel::Percent(battery_percent(voltage, &self.thresholds))
        };
        Ok(PowerReading { voltage, level })
    }
}

/// Mean raw count of [`SAMPLE_COUNT`] samples, after one discarded sample
/// and `settle_ms` for the reference to stabilize.
pub fn average_samples<H: SenseHardware>(
    hw: &mut H,
    delay: &mut impl DelayNs,
    settle_ms: u32,
) -> Result<f32, H::Error> {
    hw.read_raw_adc()?;
    delay.delay_ms(settle_ms);
    let mut sum: u32 = 0;
    for _ in 0..SAMPLE_COUNT {
        let raw = hw.read_raw_adc()?;
        log::trace!("Battery sample {}", raw);
        sum += u32::from(raw);
        delay.delay_ms(SAMPLE_INTERVAL_MS);
    }
    Ok(sum as f32 / SAMPLE_COUNT as f32)
}

/// Linear charge estimate between the thresholds. Only the upper bound is clamped.
pub fn battery_percent(voltage: f32, thresholds: &BatteryThresholds) -> f32 {
    let percent = 100.0 * (voltage - thresholds.empty) / (thresholds.full - thresholds.empty);
    if percent > 100.0 { 100.0 } else { percent }
}
