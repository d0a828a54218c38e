//! Driver configuration.

use crate::backend::bitbang::{self, DEFAULT_BITBANG_HZ};
use crate::backend::{EngineConfig, DEFAULT_CLOCK_HZ};
use crate::error::ConfigError;
use crate::pins::PinId;

/// Everything a [`crate::Dotstar`] needs to come up.
///
/// Defaults match the reference wiring: 25 pixels, data on GP9, clock on
/// GP28, half brightness, hardware clock 2 MHz, bit-bang 500 kHz.
///
/// ```
/// use dotstar::DriverConfig;
///
/// let config = DriverConfig::default()
///     .with_pixel_count(60)
///     .with_brightness(0.2)
///     .with_force_fallback(true);
/// assert!(config.validate().is_ok());
/// assert!(DriverConfig::default().with_pins(9, 9).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    /// Number of pixels on the strip.
    pub pixel_count: usize,
    /// Data GPIO number.
    pub data_pin: u8,
    /// Clock GPIO number.
    pub clock_pin: u8,
    /// Brightness applied to every pixel at construction; clamped.
    pub brightness: f32,
    /// Hardware engine clock in Hz.
    pub clock_hz: u32,
    /// Bit-bang clock in Hz.
    pub bitbang_hz: u32,
    /// Log backend selection and per-write byte counts.
    pub debug: bool,
    /// Skip the hardware engine and bit-bang from the start.
    pub force_fallback: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            pixel_count: 25,
            data_pin: 9,
            clock_pin: 28,
            brightness: 0.5,
            clock_hz: DEFAULT_CLOCK_HZ,
            bitbang_hz: DEFAULT_BITBANG_HZ,
            debug: false,
            force_fallback: false,
        }
    }
}

impl DriverConfig {
    /// Set the pixel count.
    #[must_use]
    pub fn with_pixel_count(mut self, pixel_count: usize) -> Self {
        self.pixel_count = pixel_count;
        self
    }

    /// Set the data and clock GPIOs.
    #[must_use]
    pub fn with_pins(mut self, data_pin: u8, clock_pin: u8) -> Self {
        self.data_pin = data_pin;
        self.clock_pin = clock_pin;
        self
    }

    /// Set the default brightness.
    #[must_use]
    pub fn with_brightness(mut self, brightness: f32) -> Self {
        self.brightness = brightness;
        self
    }

    /// Set the hardware clock.
    #[must_use]
    pub fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    /// Set the bit-bang clock.
    #[must_use]
    pub fn with_bitbang_hz(mut self, bitbang_hz: u32) -> Self {
        self.bitbang_hz = bitbang_hz;
        self
    }

    /// Enable selection and write logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Force the bit-bang backend.
    #[must_use]
    pub fn with_force_fallback(mut self, force_fallback: bool) -> Self {
        self.force_fallback = force_fallback;
        self
    }

    /// Check everything that cannot be clamped.
    ///
    /// Pixel capacity is checked separately, against the buffer the driver
    /// is built with. The hardware clock is not checked here: an
    /// unsupported rate is a hardware-init failure and falls back to
    /// bit-bang.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.checked().map(|_| ())
    }

    /// Validated pins, engine parameters and bit-bang half period.
    pub(crate) fn checked(&self) -> Result<(EngineConfig, u32), ConfigError> {
        if self.pixel_count == 0 {
            return Err(ConfigError::ZeroPixels);
        }
        let engine = EngineConfig {
            data: PinId::new(self.data_pin)?,
            clock: PinId::new(self.clock_pin)?,
            clock_hz: self.clock_hz,
        };
        if engine.data == engine.clock {
            return Err(ConfigError::SamePin(self.data_pin));
        }
        let half_period_ns = bitbang::half_period_ns(self.bitbang_hz)?;
        Ok((engine, half_period_ns))
    }
}
