//! Driver error taxonomy.
//!
//! Construction-time failures ([`ConfigError`], [`PinClaimError`],
//! [`InitError`]) are kept apart from write-time failures
//! ([`TransmitError`]) so a caller can decide between reconfiguring and
//! simply re-issuing the write. HAL errors are reduced to their
//! `embedded_hal` [`ErrorKind`](embedded_hal::digital::ErrorKind) so none of
//! these types are generic over the board.

use core::fmt;

use embedded_hal::{digital, spi};

/// Invalid driver settings, detected before any pin is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A strip must have at least one pixel.
    ZeroPixels,
    /// More pixels requested than the buffer was built to hold.
    TooManyPixels {
        /// Requested pixel count.
        requested: usize,
        /// Compile-time buffer capacity.
        capacity: usize,
    },
    /// GPIO number outside the addressable range.
    PinOutOfRange(u8),
    /// Data and clock were assigned the same GPIO.
    SamePin(u8),
    /// Hardware clock frequency outside the supported range.
    ClockOutOfRange {
        /// Requested frequency in Hz.
        hz: u32,
        /// Inclusive minimum in Hz.
        min: u32,
        /// Inclusive maximum in Hz.
        max: u32,
    },
    /// Bit-bang clock frequency must be non-zero.
    ZeroBitBangFrequency,
    /// Bit-bang clock faster than the strip accepts.
    BitBangTooFast {
        /// Requested frequency in Hz.
        hz: u32,
        /// Inclusive maximum in Hz.
        max: u32,
    },
    /// A pixel snapshot does not match the strip length.
    LengthMismatch {
        /// Strip length.
        expected: usize,
        /// Snapshot length.
        found: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPixels => write!(f, "pixel count must be at least 1"),
            Self::TooManyPixels {
                requested,
                capacity,
            } => write!(
                f,
                "pixel count {requested} exceeds buffer capacity {capacity}"
            ),
            Self::PinOutOfRange(pin) => write!(f, "GPIO {pin} is out of range"),
            Self::SamePin(pin) => write!(f, "data and clock both assigned to GPIO {pin}"),
            Self::ClockOutOfRange { hz, min, max } => {
                write!(f, "clock {hz} Hz outside supported range {min}..={max} Hz")
            }
            Self::ZeroBitBangFrequency => write!(f, "bit-bang frequency must be non-zero"),
            Self::BitBangTooFast { hz, max } => {
                write!(f, "bit-bang clock {hz} Hz above the {max} Hz strip limit")
            }
            Self::LengthMismatch { expected, found } => {
                write!(f, "snapshot holds {found} pixels, strip has {expected}")
            }
        }
    }
}

/// A GPIO is already owned by a live driver or probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinClaimError {
    /// The contested GPIO number.
    pub pin: u8,
}

impl fmt::Display for PinClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO {} is already claimed", self.pin)
    }
}

/// The board could not hand out a pin resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    /// The board has no such GPIO.
    NoSuchPin(u8),
    /// The GPIO exists but cannot be configured as requested.
    PinUnavailable(u8),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchPin(pin) => write!(f, "board has no GPIO {pin}"),
            Self::PinUnavailable(pin) => write!(f, "GPIO {pin} is unavailable"),
        }
    }
}

/// The hardware timing engine could not be brought up.
///
/// Recovered locally by falling back to bit-bang output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineInitError {
    /// The engine resource is already in use.
    Busy,
    /// The engine cannot produce the requested clock frequency.
    UnsupportedFrequency(u32),
    /// The engine cannot be routed to the requested pins.
    UnsupportedPins {
        /// Data GPIO.
        data: u8,
        /// Clock GPIO.
        clock: u8,
    },
    /// The board has no timing engine at all.
    Unavailable,
}

impl fmt::Display for EngineInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "timing engine busy"),
            Self::UnsupportedFrequency(hz) => write!(f, "timing engine cannot run at {hz} Hz"),
            Self::UnsupportedPins { data, clock } => write!(
                f,
                "timing engine cannot drive data GPIO {data} / clock GPIO {clock}"
            ),
            Self::Unavailable => write!(f, "no timing engine on this board"),
        }
    }
}

/// No output backend could be constructed. Fatal: no further fallback exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Bit-bang pins could not be claimed as outputs.
    BitBangUnavailable(BoardError),
    /// Bit-bang pins were claimed but could not be driven to idle.
    BitBangPin(digital::ErrorKind),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BitBangUnavailable(e) => write!(f, "bit-bang backend unavailable: {e}"),
            Self::BitBangPin(kind) => write!(f, "bit-bang pin fault during init: {kind}"),
        }
    }
}

/// A strip write failed part-way. Not retried by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// A bit-bang GPIO reported a fault.
    Pin(digital::ErrorKind),
    /// The SPI bus behind the hardware engine reported a fault.
    Bus(spi::ErrorKind),
    /// The timing engine reported a fault.
    Engine,
    /// The timing engine did not signal completion within its bounded wait.
    Timeout,
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(kind) => write!(f, "pin fault during transmit: {kind}"),
            Self::Bus(kind) => write!(f, "bus fault during transmit: {kind}"),
            Self::Engine => write!(f, "timing engine fault during transmit"),
            Self::Timeout => write!(f, "timing engine did not complete in time"),
        }
    }
}

/// Pixel index outside `0..len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndexError {
    /// Requested index.
    pub index: usize,
    /// Strip length.
    pub len: usize,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pixel index {} out of range 0..{}", self.index, self.len)
    }
}

/// Top-level driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Invalid settings.
    Config(ConfigError),
    /// Pins already owned.
    PinClaim(PinClaimError),
    /// No backend could be constructed.
    Init(InitError),
    /// A strip write failed.
    Transmit(TransmitError),
    /// Pixel index out of range.
    Index(IndexError),
    /// The board could not hand out a diagnostic probe pin.
    Board(BoardError),
    /// A diagnostic probe pin reported a fault.
    Probe(digital::ErrorKind),
}

impl Error {
    /// `true` for failures that can only happen while constructing a driver
    /// or probe; reconfigure rather than retry.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::PinClaim(_) | Self::Init(_) | Self::Board(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::PinClaim(e) => write!(f, "pin claim error: {e}"),
            Self::Init(e) => write!(f, "initialization error: {e}"),
            Self::Transmit(e) => write!(f, "transmit error: {e}"),
            Self::Index(e) => write!(f, "index error: {e}"),
            Self::Board(e) => write!(f, "board error: {e}"),
            Self::Probe(kind) => write!(f, "probe pin fault: {kind}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PinClaimError> for Error {
    fn from(e: PinClaimError) -> Self {
        Self::PinClaim(e)
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

impl From<TransmitError> for Error {
    fn from(e: TransmitError) -> Self {
        Self::Transmit(e)
    }
}

impl From<BoardError> for Error {
    fn from(e: BoardError) -> Self {
        Self::Board(e)
    }
}

impl From<IndexError> for Error {
    fn from(e: IndexError) -> Self {
        Self::Index(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
#[cfg(feature = "std")]
impl std::error::Error for PinClaimError {}
#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
#[cfg(feature = "std")]
impl std::error::Error for EngineInitError {}
#[cfg(feature = "std")]
impl std::error::Error for InitError {}
#[cfg(feature = "std")]
impl std::error::Error for TransmitError {}
#[cfg(feature = "std")]
impl std::error::Error for IndexError {}
#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_errors_are_distinguishable_from_transmit_errors() {
        assert!(Error::Config(ConfigError::ZeroPixels).is_construction());
        assert!(Error::PinClaim(PinClaimError { pin: 9 }).is_construction());
        assert!(
            Error::Init(InitError::BitBangUnavailable(BoardError::NoSuchPin(9))).is_construction()
        );
        assert!(!Error::Transmit(TransmitError::Timeout).is_construction());
        assert!(!Error::Index(IndexError { index: 3, len: 2 }).is_construction());
    }

    #[test]
    fn display_names_the_pin() {
        let msg = Error::PinClaim(PinClaimError { pin: 28 }).to_string();
        assert!(msg.contains("28"), "message should name GPIO 28: {msg}");
    }
}
