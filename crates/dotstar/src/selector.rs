//! One-shot backend selection.
//!
//! ```text
//!        force_fallback?
//!         │yes      │no
//!         │         ▼
//!         │   clock in range? ──no──┐
//!         │         │yes            │
//!         │         ▼               │
//!         │   board.engine() ──ok───┼──► Hardware
//!         │         │err            │
//!         ▼         ▼               ▼
//!   board.output(data, clock) ──ok──► BitBang
//!                 │err
//!                 ▼
//!             InitError
//! ```
//!
//! Runs once, at driver construction. A hardware failure is recovered
//! locally and recorded in the [`Selection`]; only a bit-bang failure is
//! fatal.

use crate::backend::{
    Backend, BackendMode, BitBangBackend, EngineConfig, HardwareBackend, MAX_CLOCK_HZ,
    MIN_CLOCK_HZ,
};
use crate::board::Board;
use crate::error::{EngineInitError, InitError};

/// Why a backend was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectionReason {
    /// The hardware engine came up.
    HardwareReady,
    /// The hardware engine failed; bit-bang took over.
    HardwareFailed(EngineInitError),
    /// Bit-bang was forced by configuration.
    Forced,
}

/// Outcome of backend selection, kept by the driver for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Selection {
    /// Chosen backend.
    pub mode: BackendMode,
    /// Why it was chosen.
    pub reason: SelectionReason,
    /// How many times the hardware engine was asked to start (0 or 1).
    pub hardware_attempts: u8,
}

/// Picks between the hardware engine and bit-bang output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendSelector {
    /// Skip the hardware engine entirely.
    pub force_fallback: bool,
    /// Log the decision.
    pub debug: bool,
}

impl BackendSelector {
    /// Selector with the given flags.
    pub fn new(force_fallback: bool, debug: bool) -> Self {
        Self {
            force_fallback,
            debug,
        }
    }

    /// Construct the backend.
    ///
    /// A clock outside [`MIN_CLOCK_HZ`]`..=`[`MAX_CLOCK_HZ`] counts as a
    /// failed hardware attempt without reaching the board.
    ///
    /// # Errors
    ///
    /// [`InitError`] when the bit-bang fallback cannot be built either.
    pub fn select<B: Board>(
        &self,
        board: &mut B,
        engine: &EngineConfig,
        half_period_ns: u32,
    ) -> Result<(Backend<B>, Selection), InitError> {
        let mut attempts = 0u8;
        let reason = if self.force_fallback {
            if self.debug {
                log_info!("dotstar: bit-bang forced, skipping hardware engine");
            }
            SelectionReason::Forced
        } else {
            attempts = 1;
            let started = if (MIN_CLOCK_HZ..=MAX_CLOCK_HZ).contains(&engine.clock_hz) {
                board.engine(engine)
            } else {
                Err(EngineInitError::UnsupportedFrequency(engine.clock_hz))
            };
            match started {
                Ok(e) => {
                    if self.debug {
                        log_info!(
                            "dotstar: hardware engine up at {} Hz on {} / {}",
                            engine.clock_hz,
                            engine.data.get(),
                            engine.clock.get()
                        );
                    }
                    let selection = Selection {
                        mode: BackendMode::Hardware,
                        reason: SelectionReason::HardwareReady,
                        hardware_attempts: attempts,
                    };
                    return Ok((Backend::Hardware(HardwareBackend::new(e)), selection));
                }
                Err(e) => {
                    if self.debug {
                        log_warn!("dotstar: hardware engine failed ({}), using bit-bang", e);
                    }
                    SelectionReason::HardwareFailed(e)
                }
            }
        };

        let data = board
            .output(engine.data)
            .map_err(InitError::BitBangUnavailable)?;
        let clock = board
            .output(engine.clock)
            .map_err(InitError::BitBangUnavailable)?;
        let delay = board.delay();
        let bb = BitBangBackend::new(data, clock, delay, half_period_ns)?;
        if self.debug {
            log_info!(
                "dotstar: bit-bang backend ready, half period {} ns",
                half_period_ns
            );
        }
        let selection = Selection {
            mode: BackendMode::BitBang,
            reason,
            hardware_attempts: attempts,
        };
        Ok((Backend::BitBang(bb), selection))
    }
}
