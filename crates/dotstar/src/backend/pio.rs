//! RP2040 PIO shift engine.
//!
//! Two instructions, one bit per pass, clock on side-set:
//!
//! ```text
//! .side_set 1
//! .wrap_target
//!     out pins, 1   side 0   ; data = next bit, clock low
//!     nop           side 1   ; clock high, strip samples
//! .wrap
//! ```
//!
//! Autopull every 8 bits, shifting left, so each FIFO word carries one
//! byte in its top 8 bits. When the FIFO runs dry the state machine stalls
//! on `out` with the clock low. Any GPIO pair works, which is what the
//! reference wiring (data GP9, clock GP28) needs: no SPI block has that
//! SCK/TX pair.
//!
//! The engine itself is behind the `rp2040` feature; [`clock_divisor`] is
//! plain arithmetic and always available.

use crate::error::EngineInitError;

/// State-machine cycles per shifted bit.
pub const CYCLES_PER_BIT: u32 = 2;

/// 16.8 fixed-point clock divisor `(int, frac)` that runs the program at
/// `bit_hz` from a `sys_clk_hz` system clock.
///
/// # Errors
///
/// [`EngineInitError::UnsupportedFrequency`] when the divisor would be
/// below 1 or above 65535.
pub fn clock_divisor(sys_clk_hz: u32, bit_hz: u32) -> Result<(u16, u8), EngineInitError> {
    let unsupported = EngineInitError::UnsupportedFrequency(bit_hz);
    let per_bit = u64::from(bit_hz)
        .checked_mul(u64::from(CYCLES_PER_BIT))
        .ok_or(unsupported)?;
    let scaled = u64::from(sys_clk_hz)
        .checked_mul(256)
        .and_then(|s| s.checked_div(per_bit))
        .ok_or(unsupported)?;
    let int = u16::try_from(scaled.checked_shr(8).unwrap_or(0)).map_err(|_| unsupported)?;
    if int == 0 {
        return Err(unsupported);
    }
    let frac = u8::try_from(scaled & 0xFF).map_err(|_| unsupported)?;
    Ok((int, frac))
}

#[cfg(feature = "rp2040")]
pub use rp::PioEngine;

#[cfg(feature = "rp2040")]
mod rp {
    use rp2040_hal::pio::{
        Buffers, PIOBuilder, PIOExt, PinDir, Running, ShiftDirection, StateMachine,
        StateMachineIndex, Tx, UninitStateMachine, PIO,
    };

    use super::clock_divisor;
    use crate::backend::hardware::{ClockedEngine, EngineConfig};
    use crate::error::{EngineInitError, TransmitError};

    /// Polls of a FIFO or stall flag before giving up.
    const SPIN_LIMIT: u32 = 1_000_000;

    /// [`ClockedEngine`] on one PIO state machine.
    ///
    /// The board must have switched both GPIOs to the PIO function
    /// (`into_function::<FunctionPio0>()` or `Pio1`) before calling
    /// [`PioEngine::new`].
    pub struct PioEngine<P: PIOExt, SM: StateMachineIndex> {
        _sm: StateMachine<(P, SM), Running>,
        tx: Tx<(P, SM)>,
    }

    impl<P: PIOExt, SM: StateMachineIndex> PioEngine<P, SM> {
        /// Install the shift program and start `sm` at `config.clock_hz`.
        ///
        /// # Errors
        ///
        /// - [`EngineInitError::UnsupportedPins`] when data and clock match
        /// - [`EngineInitError::UnsupportedFrequency`] when the clock is out
        ///   of range or cannot be divided from `sys_clk_hz`
        /// - [`EngineInitError::Busy`] when the PIO has no room for the
        ///   program
        pub fn new(
            pio: &mut PIO<P>,
            sm: UninitStateMachine<(P, SM)>,
            config: &EngineConfig,
            sys_clk_hz: u32,
        ) -> Result<Self, EngineInitError> {
            let data = config.data.get();
            let clock = config.clock.get();
            if data == clock {
                return Err(EngineInitError::UnsupportedPins { data, clock });
            }
            if config.validate().is_err() {
                return Err(EngineInitError::UnsupportedFrequency(config.clock_hz));
            }
            let (int, frac) = clock_divisor(sys_clk_hz, config.clock_hz)?;

            let program = pio_proc::pio_asm!(
                ".side_set 1",
                ".wrap_target",
                "    out pins, 1    side 0",
                "    nop            side 1",
                ".wrap",
            );
            let installed = pio
                .install(&program.program)
                .map_err(|_| EngineInitError::Busy)?;

            let (mut sm, _rx, tx) = PIOBuilder::from_installed_program(installed)
                .out_pins(data, 1)
                .side_set_pin_base(clock)
                .out_shift_direction(ShiftDirection::Left)
                .autopull(true)
                .pull_threshold(8)
                .buffers(Buffers::OnlyTx)
                .clock_divisor_fixed_point(int, frac)
                .build(sm);
            sm.set_pindirs([(data, PinDir::Output), (clock, PinDir::Output)]);
            Ok(Self {
                _sm: sm.start(),
                tx,
            })
        }

        fn push(&mut self, byte: u8) -> Result<(), TransmitError> {
            let word = u32::from(byte).checked_shl(24).unwrap_or(0);
            for _ in 0..SPIN_LIMIT {
                if self.tx.write(word) {
                    return Ok(());
                }
            }
            Err(TransmitError::Timeout)
        }
    }

    impl<P: PIOExt, SM: StateMachineIndex> ClockedEngine for PioEngine<P, SM> {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransmitError> {
            bytes.iter().try_for_each(|&b| self.push(b))
        }

        fn flush(&mut self) -> Result<(), TransmitError> {
            let mut spins = 0u32;
            while !self.tx.is_empty() {
                spins = spins.saturating_add(1);
                if spins >= SPIN_LIMIT {
                    return Err(TransmitError::Timeout);
                }
            }
            // Stalled on `out` means the last word has been shifted out.
            self.tx.clear_stalled_flag();
            for _ in 0..SPIN_LIMIT {
                if self.tx.has_stalled() {
                    return Ok(());
                }
            }
            Err(TransmitError::Timeout)
        }
    }
}
