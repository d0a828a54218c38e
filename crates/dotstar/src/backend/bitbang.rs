//! Software bit-bang backend.
//!
//! Per bit, MSB first:
//!
//! ```text
//! data  ──X═══════════════X════
//! clock ____/‾‾‾‾‾‾‾\_____/‾‾‾
//!         │ half    │ half
//! ```
//!
//! Data is set while the clock is low, then the clock pulses high for half
//! a period; APA102 samples data on the rising edge. Both lines idle low.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin, PinState};

use crate::backend::{BackendMode, OutputBackend, MAX_CLOCK_HZ};
use crate::error::{ConfigError, InitError, TransmitError};

/// Bit-bang clock used when none is configured (1 µs half period).
pub const DEFAULT_BITBANG_HZ: u32 = 500_000;

/// Fastest bit-bang clock; same ceiling as the hardware engine.
pub const MAX_BITBANG_HZ: u32 = MAX_CLOCK_HZ;

/// Half clock period in nanoseconds for `hz`.
///
/// # Errors
///
/// [`ConfigError::ZeroBitBangFrequency`] for `hz == 0`,
/// [`ConfigError::BitBangTooFast`] above [`MAX_BITBANG_HZ`].
pub fn half_period_ns(hz: u32) -> Result<u32, ConfigError> {
    if hz > MAX_BITBANG_HZ {
        return Err(ConfigError::BitBangTooFast {
            hz,
            max: MAX_BITBANG_HZ,
        });
    }
    let full = 1_000_000_000u32
        .checked_div(hz)
        .ok_or(ConfigError::ZeroBitBangFrequency)?;
    Ok(full / 2)
}

/// [`OutputBackend`] toggling two GPIOs.
#[derive(Debug)]
pub struct BitBangBackend<P, D> {
    data: P,
    clock: P,
    delay: D,
    half_period_ns: u32,
}

impl<P: OutputPin, D: DelayNs> BitBangBackend<P, D> {
    /// Take both pins and drive them low.
    ///
    /// # Errors
    ///
    /// [`InitError::BitBangPin`] if either pin refuses to go low.
    pub fn new(mut data: P, mut clock: P, delay: D, half_period_ns: u32) -> Result<Self, InitError> {
        data.set_low()
            .map_err(|e| InitError::BitBangPin(e.kind()))?;
        clock
            .set_low()
            .map_err(|e| InitError::BitBangPin(e.kind()))?;
        Ok(Self {
            data,
            clock,
            delay,
            half_period_ns,
        })
    }

    /// Half clock period in nanoseconds.
    pub fn half_period_ns(&self) -> u32 {
        self.half_period_ns
    }

    /// Hand back `(data, clock, delay)`.
    pub fn into_parts(mut self) -> (P, P, D) {
        self.shutdown();
        (self.data, self.clock, self.delay)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TransmitError> {
        for shift in (0..8u32).rev() {
            let level = PinState::from(byte.checked_shr(shift).unwrap_or(0) & 1 == 1);
            self.data
                .set_state(level)
                .map_err(|e| TransmitError::Pin(e.kind()))?;
            self.clock
                .set_high()
                .map_err(|e| TransmitError::Pin(e.kind()))?;
            self.delay.delay_ns(self.half_period_ns);
            self.clock
                .set_low()
                .map_err(|e| TransmitError::Pin(e.kind()))?;
            self.delay.delay_ns(self.half_period_ns);
        }
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> OutputBackend for BitBangBackend<P, D> {
    fn mode(&self) -> BackendMode {
        BackendMode::BitBang
    }

    fn transmit<I>(&mut self, bytes: I) -> Result<usize, TransmitError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut sent = 0usize;
        for byte in bytes {
            self.write_byte(byte)?;
            sent = sent.saturating_add(1);
        }
        self.data
            .set_low()
            .map_err(|e| TransmitError::Pin(e.kind()))?;
        Ok(sent)
    }

    fn shutdown(&mut self) {
        // Best effort: nothing useful to do if an idle pin faults.
        let _ = self.clock.set_low();
        let _ = self.data.set_low();
    }
}
