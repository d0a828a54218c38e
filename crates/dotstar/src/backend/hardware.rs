//! Hardware timing engine backend.
//!
//! A [`ClockedEngine`] is any peripheral that shifts bytes out MSB-first on
//! a data line while generating the matching clock: an SPI controller, an
//! RP2040 PIO state machine running a two-instruction shift program, a
//! DMA-fed timer. The driver only needs "write these bytes, then wait
//! until they are out".

use crate::backend::{BackendMode, OutputBackend};
use crate::error::{ConfigError, TransmitError};
use crate::pins::PinId;

/// Lowest supported hardware clock.
pub const MIN_CLOCK_HZ: u32 = 1_000;

/// Highest supported hardware clock. APA102 parts are specified to
/// roughly 20–30 MHz; longer strips degrade earlier.
pub const MAX_CLOCK_HZ: u32 = 20_000_000;

/// Hardware clock used when none is configured.
pub const DEFAULT_CLOCK_HZ: u32 = 2_000_000;

/// Bytes staged per engine write.
const CHUNK_LEN: usize = 64;

/// Parameters handed to [`crate::board::Board::engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Data GPIO.
    pub data: PinId,
    /// Clock GPIO.
    pub clock: PinId,
    /// Shift clock in Hz.
    pub clock_hz: u32,
}

impl EngineConfig {
    /// Check the clock range and that data and clock differ.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SamePin`] or [`ConfigError::ClockOutOfRange`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data == self.clock {
            return Err(ConfigError::SamePin(self.data.get()));
        }
        if !(MIN_CLOCK_HZ..=MAX_CLOCK_HZ).contains(&self.clock_hz) {
            return Err(ConfigError::ClockOutOfRange {
                hz: self.clock_hz,
                min: MIN_CLOCK_HZ,
                max: MAX_CLOCK_HZ,
            });
        }
        Ok(())
    }
}

/// A peripheral that shifts bytes out with a generated clock.
pub trait ClockedEngine {
    /// Queue `bytes` for output. May return before they are on the wire.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransmitError>;

    /// Block until every queued byte has been shifted out.
    ///
    /// Engines that poll their own status bound the wait and report
    /// [`TransmitError::Timeout`]. Engines wrapping a HAL driver inherit
    /// that driver's completion guarantee.
    fn flush(&mut self) -> Result<(), TransmitError>;

    /// Stop the engine and leave both lines low.
    fn stop(&mut self) {}
}

/// [`OutputBackend`] over a [`ClockedEngine`].
#[derive(Debug)]
pub struct HardwareBackend<E> {
    engine: E,
}

impl<E: ClockedEngine> HardwareBackend<E> {
    /// Wrap an engine the board has already brought up.
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Borrow the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Stop the engine and hand it back.
    pub fn into_inner(mut self) -> E {
        self.engine.stop();
        self.engine
    }
}

impl<E: ClockedEngine> OutputBackend for HardwareBackend<E> {
    fn mode(&self) -> BackendMode {
        BackendMode::Hardware
    }

    fn transmit<I>(&mut self, bytes: I) -> Result<usize, TransmitError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut chunk = [0u8; CHUNK_LEN];
        let mut filled = 0usize;
        let mut sent = 0usize;
        for byte in bytes {
            if let Some(slot) = chunk.get_mut(filled) {
                *slot = byte;
                filled = filled.saturating_add(1);
            }
            if filled == CHUNK_LEN {
                self.engine.write(&chunk)?;
                sent = sent.saturating_add(filled);
                filled = 0;
            }
        }
        if let Some(tail) = chunk.get(..filled) {
            if !tail.is_empty() {
                self.engine.write(tail)?;
                sent = sent.saturating_add(filled);
            }
        }
        self.engine.flush()?;
        Ok(sent)
    }

    fn shutdown(&mut self) {
        self.engine.stop();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<u8>>,
        flushes: usize,
        fail_flush: bool,
    }

    impl ClockedEngine for Recorder {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransmitError> {
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        fn flush(&mut self) -> Result<(), TransmitError> {
            self.flushes += 1;
            if self.fail_flush {
                Err(TransmitError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    fn pin(n: u8) -> PinId {
        PinId::new(n).unwrap()
    }

    #[test]
    fn long_streams_are_chunked_then_flushed_once() {
        let mut hw = HardwareBackend::new(Recorder::default());
        let sent = hw.transmit((0..150u32).map(|i| i as u8)).unwrap();
        assert_eq!(sent, 150);
        let lens: Vec<usize> = hw.engine().writes.iter().map(Vec::len).collect();
        assert_eq!(lens, [64, 64, 22]);
        assert_eq!(hw.engine().writes[2][0], 128);
        assert_eq!(hw.engine().flushes, 1);
    }

    #[test]
    fn flush_timeout_is_reported() {
        let mut hw = HardwareBackend::new(Recorder {
            fail_flush: true,
            ..Recorder::default()
        });
        assert_eq!(hw.transmit([1u8, 2, 3]), Err(TransmitError::Timeout));
    }

    #[test]
    fn engine_config_validation() {
        let ok = EngineConfig {
            data: pin(9),
            clock: pin(28),
            clock_hz: DEFAULT_CLOCK_HZ,
        };
        assert_eq!(ok.validate(), Ok(()));
        assert_eq!(
            EngineConfig { clock: pin(9), ..ok }.validate(),
            Err(ConfigError::SamePin(9))
        );
        assert_eq!(
            EngineConfig {
                clock_hz: 999,
                ..ok
            }
            .validate(),
            Err(ConfigError::ClockOutOfRange {
                hz: 999,
                min: MIN_CLOCK_HZ,
                max: MAX_CLOCK_HZ
            })
        );
    }
}
