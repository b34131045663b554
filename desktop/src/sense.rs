use std::{convert::Infallible, thread, time::Duration};

use badge_core::power::{
    CONVERSION_FACTOR, HardwareVariant, Pin, PinMode, Pull, SenseHardware, VBUS_SENSE_PLAIN, VBUS_SENSE_RADIO,
};
use embedded_hal::delay::DelayNs;
use serde::Deserialize;

/// The simulated board's battery and radio. Loaded from the `[board]`
/// table of `launcher.toml`, then overridden by `BADGE_*` variables.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub wireless: bool,
    /// Battery rail in volts.
    pub vbat: f32,
    pub usb: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            wireless: true,
            vbat: 3.9,
            usb: false,
        }
    }
}

impl BoardConfig {
    pub fn apply_env(&mut self) {
        if let Some(wireless) = env_flag("BADGE_WIRELESS") {
            self.wireless = wireless;
        }
        if let Some(usb) = env_flag("BADGE_USB") {
            self.usb = usb;
        }
        if let Ok(value) = std::env::var("BADGE_VBAT") {
            match value.parse() {
                Ok(vbat) => self.vbat = vbat,
                Err(err) => log::warn!("Ignoring BADGE_VBAT={}: {}", value, err),
            }
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    Some(matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

pub struct SimulatedSense {
    board: BoardConfig,
    radio_active: bool,
}

impl SimulatedSense {
    pub fn new(board: BoardConfig) -> Self {
        log::info!(
            "Simulated board: {}, battery {:.2} V, usb {}",
            if board.wireless { "wireless" } else { "plain" },
            board.vbat,
            board.usb
        );
        Self {
            radio_active: board.wireless,
            board,
        }
    }
}

impl SenseHardware for SimulatedSense {
    type Error = Infallible;

    fn variant(&self) -> HardwareVariant {
        if self.board.wireless {
            HardwareVariant::Wireless
        } else {
            HardwareVariant::Plain
        }
    }

    fn read_raw_adc(&mut self) -> Result<u16, Infallible> {
        let raw = (self.board.vbat / CONVERSION_FACTOR).clamp(0.0, u16::MAX as f32);
        Ok(raw as u16)
    }

    fn read_digital(&mut self, pin: Pin) -> Result<bool, Infallible> {
        Ok((pin == VBUS_SENSE_RADIO || pin == VBUS_SENSE_PLAIN) && self.board.usb)
    }

    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode, pull: Pull) -> Result<(), Infallible> {
        log::trace!("{:?} -> {:?} ({:?})", pin, mode, pull);
        Ok(())
    }

    fn radio_set_active(&mut self, active: bool) -> bool {
        std::mem::replace(&mut self.radio_active, active)
    }
}

/// Real-time delay on the host thread.
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
