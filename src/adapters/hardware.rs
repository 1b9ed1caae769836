//! Hardware adapter: bridges board peripherals to domain port traits.
//!
//! [`BoardAdapter`] exposes the lick electrode, water-level sensor, RFID
//! UART and feeder relay through [`ContactSensorPort`], [`ByteSource`] and
//! [`FeederPort`]. [`GpioPin`] wraps a raw GPIO number as an
//! `embedded-hal` output for the reader's reset line. Both sit on top of
//! [`hw_init`], so on non-espidf targets they run against its stubs.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;

use crate::app::ports::{ByteSource, ContactSensorPort, FeederPort};
use crate::drivers::hw_init;
use crate::pins;

// ── GpioPin ───────────────────────────────────────────────────

/// Push-pull output on an already-configured GPIO.
pub struct GpioPin {
    gpio: i32,
}

impl GpioPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

// ── BoardAdapter ──────────────────────────────────────────────

/// Concrete adapter that combines the board I/O behind port traits.
pub struct BoardAdapter {
    lick_threshold_mv: u32,
    feeder_on: bool,
}

impl Default for BoardAdapter {
    fn default() -> Self {
        Self::new(pins::LICK_THRESHOLD_MV)
    }
}

impl BoardAdapter {
    pub fn new(lick_threshold_mv: u32) -> Self {
        Self {
            lick_threshold_mv,
            feeder_on: false,
        }
    }

    pub fn is_feeder_on(&self) -> bool {
        self.feeder_on
    }
}

/// 12-bit raw ADC count to millivolts at the configured attenuation.
pub fn raw_to_mv(raw: u16) -> u32 {
    u32::from(raw.min(4095)) * pins::ADC_FULL_SCALE_MV / 4095
}

impl ContactSensorPort for BoardAdapter {
    fn read_contact(&mut self) -> bool {
        // A failed conversion reads as no contact.
        hw_init::adc1_read(pins::LICK_ADC_CHANNEL)
            .is_some_and(|raw| raw_to_mv(raw) < self.lick_threshold_mv)
    }

    fn read_water_level(&mut self) -> Option<f64> {
        hw_init::adc1_read(pins::WATER_LEVEL_ADC_CHANNEL).map(|raw| f64::from(raw_to_mv(raw)))
    }
}

impl ByteSource for BoardAdapter {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        hw_init::uart_read(buf)
    }
}

impl FeederPort for BoardAdapter {
    fn set_feeder(&mut self, on: bool) {
        if on != self.feeder_on {
            debug!("Feeder relay {}", if on { "on" } else { "off" });
        }
        hw_init::gpio_write(pins::FEEDER_RELAY_GPIO, on);
        self.feeder_on = on;
    }
}
