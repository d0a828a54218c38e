//! GPIO identifiers and exclusive pin ownership.
//!
//! A [`PinRegistry`] records which GPIO numbers are owned by a live driver
//! or probe. Claims are RAII guards: dropping a [`PinClaim`] (or releasing
//! the driver that holds it) frees the pin again.
//!
//! The bitmask lives behind a `critical_section::Mutex` rather than an
//! atomic because Cortex-M0+ (RP2040) has no compare-and-swap.
//!
//! ```
//! use dotstar::{PinId, PinRegistry};
//!
//! static PINS: PinRegistry = PinRegistry::new();
//!
//! let data = PinId::new(9).unwrap();
//! let claim = PINS.claim(data).unwrap();
//! assert!(PINS.claim(data).is_err());
//! drop(claim);
//! assert!(PINS.claim(data).is_ok());
//! ```

use core::cell::Cell;

use critical_section::Mutex;

use crate::error::{ConfigError, PinClaimError};

/// A validated GPIO number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct PinId(u8);

impl PinId {
    /// Highest GPIO number the registry can track.
    pub const MAX: u8 = 63;

    /// Validate a GPIO number.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PinOutOfRange`] above [`PinId::MAX`].
    pub const fn new(pin: u8) -> Result<Self, ConfigError> {
        if pin > Self::MAX {
            Err(ConfigError::PinOutOfRange(pin))
        } else {
            Ok(Self(pin))
        }
    }

    /// Raw GPIO number.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    fn mask(self) -> u64 {
        // `self.0 <= 63` by construction.
        1u64.checked_shl(u32::from(self.0)).unwrap_or(0)
    }
}

impl core::fmt::Display for PinId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GP{}", self.0)
    }
}

/// Set of GPIOs currently owned by a driver or probe.
pub struct PinRegistry {
    claimed: Mutex<Cell<u64>>,
}

impl PinRegistry {
    /// An empty registry, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            claimed: Mutex::new(Cell::new(0)),
        }
    }

    /// Take exclusive ownership of `pin`.
    ///
    /// # Errors
    ///
    /// Returns [`PinClaimError`] if the pin is already owned.
    pub fn claim(&self, pin: PinId) -> Result<PinClaim<'_>, PinClaimError> {
        critical_section::with(|cs| {
            let cell = self.claimed.borrow(cs);
            let bits = cell.get();
            if bits & pin.mask() != 0 {
                return Err(PinClaimError { pin: pin.get() });
            }
            cell.set(bits | pin.mask());
            Ok(PinClaim {
                registry: self,
                pin,
            })
        })
    }

    /// Claim a data/clock pair, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PinClaimError`] naming the first pin that is already owned;
    /// in that case neither pin is held afterwards.
    pub fn claim_pair(
        &self,
        data: PinId,
        clock: PinId,
    ) -> Result<(PinClaim<'_>, PinClaim<'_>), PinClaimError> {
        let data_claim = self.claim(data)?;
        let clock_claim = self.claim(clock)?;
        Ok((data_claim, clock_claim))
    }

    /// `true` while some live claim holds `pin`.
    pub fn is_claimed(&self, pin: PinId) -> bool {
        critical_section::with(|cs| self.claimed.borrow(cs).get() & pin.mask() != 0)
    }

    fn release(&self, pin: PinId) {
        critical_section::with(|cs| {
            let cell = self.claimed.borrow(cs);
            cell.set(cell.get() & !pin.mask());
        });
    }
}

impl Default for PinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PinRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let bits = critical_section::with(|cs| self.claimed.borrow(cs).get());
        f.debug_struct("PinRegistry")
            .field("claimed", &format_args!("{bits:#018x}"))
            .finish()
    }
}

/// Ownership of one GPIO. Released on drop.
#[derive(Debug)]
pub struct PinClaim<'r> {
    registry: &'r PinRegistry,
    pin: PinId,
}

impl PinClaim<'_> {
    /// The owned GPIO.
    pub fn pin(&self) -> PinId {
        self.pin
    }
}

impl Drop for PinClaim<'_> {
    fn drop(&mut self) {
        self.registry.release(self.pin);
    }
}
