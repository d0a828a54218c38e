//! Output backends: how encoded bytes reach the two wires.
//!
//! Two interchangeable implementations share the [`OutputBackend`]
//! contract:
//! - [`HardwareBackend`]: a hardware shift engine ([`ClockedEngine`]),
//!   e.g. [`SpiEngine`] over an `embedded_hal` SPI bus, or `PioEngine`
//!   on an RP2040 PIO state machine (`rp2040` feature)
//! - [`BitBangBackend`]: software-toggled data/clock GPIOs
//!
//! [`Backend`] is the per-board enum the driver holds once the selector has
//! picked one. The choice never changes during a driver's lifetime.

pub mod bitbang;
pub mod hardware;
pub mod pio;
pub mod spi;

pub use bitbang::BitBangBackend;
pub use hardware::{
    ClockedEngine, EngineConfig, HardwareBackend, DEFAULT_CLOCK_HZ, MAX_CLOCK_HZ, MIN_CLOCK_HZ,
};
#[cfg(feature = "rp2040")]
pub use pio::PioEngine;
pub use spi::SpiEngine;

use crate::board::Board;
use crate::error::TransmitError;

/// Which backend a driver is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendMode {
    /// Hardware timing engine.
    Hardware,
    /// Software bit-bang.
    BitBang,
}

impl BackendMode {
    /// Short lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::BitBang => "bitbang",
        }
    }
}

impl core::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocking byte-stream transmitter over data + clock.
///
/// `transmit` returns only after the last bit is on the wire. There is no
/// acknowledgement from the strip and a failed write is not retried.
pub trait OutputBackend {
    /// Backend kind.
    fn mode(&self) -> BackendMode;

    /// Send `bytes` MSB-first, returning the number of bytes sent.
    fn transmit<I>(&mut self, bytes: I) -> Result<usize, TransmitError>
    where
        I: IntoIterator<Item = u8>;

    /// Leave both lines idle (low) and stop any engine activity.
    fn shutdown(&mut self);
}

/// The backend a driver on board `B` ended up with.
pub enum Backend<B: Board> {
    /// Hardware engine.
    Hardware(HardwareBackend<B::Engine>),
    /// Software bit-bang.
    BitBang(BitBangBackend<B::Output, B::Delay>),
}

impl<B: Board> OutputBackend for Backend<B> {
    fn mode(&self) -> BackendMode {
        match self {
            Self::Hardware(hw) => hw.mode(),
            Self::BitBang(bb) => bb.mode(),
        }
    }

    fn transmit<I>(&mut self, bytes: I) -> Result<usize, TransmitError>
    where
        I: IntoIterator<Item = u8>,
    {
        match self {
            Self::Hardware(hw) => hw.transmit(bytes),
            Self::BitBang(bb) => bb.transmit(bytes),
        }
    }

    fn shutdown(&mut self) {
        match self {
            Self::Hardware(hw) => hw.shutdown(),
            Self::BitBang(bb) => bb.shutdown(),
        }
    }
}

impl<B: Board> core::fmt::Debug for Backend<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Backend").field(&self.mode()).finish()
    }
}
