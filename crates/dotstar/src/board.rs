//! Board abstraction: where pins, the timing engine and delays come from.
//!
//! The driver never names a concrete HAL. A [`Board`] hands out the
//! resources each backend needs, by GPIO number, and the driver keeps them
//! for its lifetime. Firmware implements this once per target; host tests
//! use [`crate::mock::MockBoard`]. [`PinAuthority`] ties each board to the
//! registry that decides who owns its pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::backend::{ClockedEngine, EngineConfig};
use crate::error::{BoardError, EngineInitError};
use crate::pins::{PinId, PinRegistry};

/// Internal pull resistor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// No pull; the pin floats unless driven externally.
    None,
    /// Internal pull-up.
    Up,
    /// Internal pull-down.
    Down,
}

/// Direction of a reconfigurable diagnostic pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Input with the given pull.
    Input(Pull),
    /// Push-pull output.
    Output,
}

/// A pin the diagnostic probe can switch between input and output.
pub trait ProbePin: InputPin + OutputPin {
    /// Reconfigure the pin.
    fn set_mode(&mut self, mode: PinMode) -> Result<(), <Self as ErrorType>::Error>;
}

/// Source of every hardware resource the driver and probe use.
pub trait Board {
    /// Push-pull output used by the bit-bang backend.
    type Output: OutputPin;
    /// Reconfigurable pin used by the diagnostic probe.
    type ProbePin: ProbePin;
    /// Hardware timing engine.
    type Engine: ClockedEngine;
    /// Blocking delay provider.
    type Delay: DelayNs;

    /// Configure `pin` as a push-pull output, initially low.
    fn output(&mut self, pin: PinId) -> Result<Self::Output, BoardError>;

    /// Hand out `pin` for direct probing.
    fn probe_pin(&mut self, pin: PinId) -> Result<Self::ProbePin, BoardError>;

    /// Bring up the timing engine on the configured pins.
    ///
    /// Each call is one hardware-init attempt.
    fn engine(&mut self, config: &EngineConfig) -> Result<Self::Engine, EngineInitError>;

    /// A delay provider.
    fn delay(&mut self) -> Self::Delay;

    /// Monotonic microsecond timestamp, if the board has a clock.
    fn now_us(&self) -> Option<u64> {
        None
    }
}

/// Where claims on a board's GPIOs are recorded.
///
/// Every handle onto the same physical pins must return the same registry.
/// Firmware returns one `static`; the mock returns the registry owned by
/// its [`crate::mock::MockBus`].
pub trait PinAuthority<'r> {
    /// The registry arbitrating this board's pins.
    fn registry(&self) -> &'r PinRegistry;
}
