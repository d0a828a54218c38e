//! [`ClockedEngine`] over an `embedded_hal` SPI bus.
//!
//! APA102 is SPI mode 0 with no chip select, so a bare [`SpiBus`] (MOSI to
//! data, SCK to clock) is enough. The bus is expected to be configured for
//! the requested frequency by the board before it is handed over.

use embedded_hal::spi::{Error as _, SpiBus};

use crate::backend::hardware::{ClockedEngine, EngineConfig};
use crate::error::{EngineInitError, TransmitError};

/// Shift engine backed by an SPI controller.
#[derive(Debug)]
pub struct SpiEngine<S> {
    spi: S,
    clock_hz: u32,
}

impl<S: SpiBus<u8>> SpiEngine<S> {
    /// Wrap a configured bus.
    ///
    /// # Errors
    ///
    /// [`EngineInitError::UnsupportedFrequency`] when `config` is outside the
    /// supported clock range, [`EngineInitError::UnsupportedPins`] when data
    /// and clock are the same GPIO.
    pub fn new(spi: S, config: &EngineConfig) -> Result<Self, EngineInitError> {
        if config.validate().is_err() {
            return Err(if config.data == config.clock {
                EngineInitError::UnsupportedPins {
                    data: config.data.get(),
                    clock: config.clock.get(),
                }
            } else {
                EngineInitError::UnsupportedFrequency(config.clock_hz)
            });
        }
        Ok(Self {
            spi,
            clock_hz: config.clock_hz,
        })
    }

    /// Configured clock in Hz.
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Hand the bus back.
    pub fn release(self) -> S {
        self.spi
    }
}

impl<S: SpiBus<u8>> ClockedEngine for SpiEngine<S> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransmitError> {
        self.spi
            .write(bytes)
            .map_err(|e| TransmitError::Bus(e.kind()))
    }

    /// Waits on [`SpiBus::flush`]. The bound on that wait is the HAL's; a
    /// bus that reports a fault surfaces as [`TransmitError::Bus`].
    fn flush(&mut self) -> Result<(), TransmitError> {
        self.spi.flush().map_err(|e| TransmitError::Bus(e.kind()))
    }
}
