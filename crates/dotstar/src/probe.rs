//! Wiring diagnostics on the raw data/clock lines.
//!
//! The probe bypasses the frame encoder and both backends: it owns the two
//! GPIOs directly and never touches a pixel buffer. Use it on a board with
//! no live driver on those pins (release the driver first); the board's
//! pin registry enforces this.
//!
//! # Sequence
//!
//! ```text
//! phase          data / clock          recorded
//! ─────────────  ────────────────────  ─────────────────
//! floating       input, no pull        raw read
//! pull-up        input, pull-up        raw read
//! pull-down      input, pull-down      raw read
//! drive low      output low            read-back
//! drive high     output high           read-back, time driven high
//! drive low      output low            read-back, time driven low
//! ```
//!
//! Each phase settles for [`SETTLE_MS`] before reading. Both pins end as
//! outputs driven low, whether or not a phase failed.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::board::{Board, PinAuthority, PinMode, ProbePin, Pull};
use crate::error::{ConfigError, Error};
use crate::pins::{PinClaim, PinId};

/// Settle time before each read, in milliseconds.
pub const SETTLE_MS: u32 = 20;

/// Classified behavior of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLevel {
    /// Held low against the internal pull-up.
    Low,
    /// Held high against the internal pull-down.
    High,
    /// Follows the internal pull; nothing external is driving it.
    Floating,
    /// Reads against both pulls (low with pull-up, high with pull-down).
    /// Not a state a healthy pin reaches; suspect noise or a bad read.
    Indeterminate,
}

/// Which line a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// Data line.
    Data,
    /// Clock line.
    Clock,
}

/// Raw readings and classification for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinReport {
    /// Line role.
    pub role: PinRole,
    /// GPIO number.
    pub pin: PinId,
    /// Input, no pull.
    pub floating: bool,
    /// Input, internal pull-up.
    pub pull_up: bool,
    /// Input, internal pull-down.
    pub pull_down: bool,
    /// Read-back while driven low.
    pub drive_low: bool,
    /// Read-back while driven high.
    pub drive_high: bool,
    /// Classification from the pull readings.
    pub level: PinLevel,
    /// Read-back after being driven low again at the end.
    pub drive_low_after: bool,
    /// Board time (µs) when the high drive was issued, if the board has a
    /// clock. A command time, not an observed edge.
    pub drive_high_at_us: Option<u64>,
    /// Board time (µs) when the final low drive was issued.
    pub drive_low_at_us: Option<u64>,
}

impl PinReport {
    /// Every drive read-back matched the driven level.
    pub fn drive_ok(&self) -> bool {
        !self.drive_low && self.drive_high && !self.drive_low_after
    }
}

/// Reports for both lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeReport {
    /// Data line.
    pub data: PinReport,
    /// Clock line.
    pub clock: PinReport,
}

impl ProbeReport {
    /// Report for `role`.
    pub fn get(&self, role: PinRole) -> &PinReport {
        match role {
            PinRole::Data => &self.data,
            PinRole::Clock => &self.clock,
        }
    }
}

/// Classify a line from its pull-up and pull-down readings.
///
/// | pull-up | pull-down | level      |
/// |---------|-----------|------------|
/// | high    | low       | `Floating` |
/// | high    | high      | `High`     |
/// | low     | low       | `Low`      |
/// | low     | high      | `Indeterminate` |
pub fn classify(pull_up: bool, pull_down: bool) -> PinLevel {
    match (pull_up, pull_down) {
        (true, false) => PinLevel::Floating,
        (true, true) => PinLevel::High,
        (false, false) => PinLevel::Low,
        (false, true) => PinLevel::Indeterminate,
    }
}

#[derive(Default)]
struct Readings {
    floating: bool,
    pull_up: bool,
    pull_down: bool,
    drive_low: bool,
    drive_high: bool,
    drive_low_after: bool,
    drive_high_at_us: Option<u64>,
    drive_low_at_us: Option<u64>,
}

impl Readings {
    fn report(&self, role: PinRole, pin: PinId) -> PinReport {
        PinReport {
            role,
            pin,
            floating: self.floating,
            pull_up: self.pull_up,
            pull_down: self.pull_down,
            drive_low: self.drive_low,
            drive_high: self.drive_high,
            level: classify(self.pull_up, self.pull_down),
            drive_low_after: self.drive_low_after,
            drive_high_at_us: self.drive_high_at_us,
            drive_low_at_us: self.drive_low_at_us,
        }
    }
}

fn probe_err<E: embedded_hal::digital::Error>(e: E) -> Error {
    Error::Probe(e.kind())
}

/// Direct owner of the data and clock GPIOs for troubleshooting.
pub struct DiagnosticProbe<'r, B: Board> {
    board: B,
    data: B::ProbePin,
    clock: B::ProbePin,
    delay: B::Delay,
    data_claim: PinClaim<'r>,
    clock_claim: PinClaim<'r>,
}

impl<'r, B: Board> DiagnosticProbe<'r, B> {
    /// Claim both pins and take them from the board.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for out-of-range or identical pins
    /// - [`Error::PinClaim`] if a driver or probe already owns either pin
    /// - [`Error::Board`] if the board cannot hand the pins out
    pub fn new(mut board: B, data_pin: u8, clock_pin: u8) -> Result<Self, Error>
    where
        B: PinAuthority<'r>,
    {
        let registry = board.registry();
        let data_id = PinId::new(data_pin)?;
        let clock_id = PinId::new(clock_pin)?;
        if data_id == clock_id {
            return Err(ConfigError::SamePin(data_pin).into());
        }
        let (data_claim, clock_claim) = registry.claim_pair(data_id, clock_id)?;
        let data = board.probe_pin(data_id)?;
        let clock = board.probe_pin(clock_id)?;
        let delay = board.delay();
        Ok(Self {
            board,
            data,
            clock,
            delay,
            data_claim,
            clock_claim,
        })
    }

    /// Data and clock GPIOs.
    pub fn pins(&self) -> (PinId, PinId) {
        (self.data_claim.pin(), self.clock_claim.pin())
    }

    /// Run the full pull/drive sequence on both lines.
    ///
    /// # Errors
    ///
    /// [`Error::Probe`] if a pin faults. The pins are still restored.
    pub fn run(&mut self) -> Result<ProbeReport, Error> {
        let mut data = Readings::default();
        let mut clock = Readings::default();
        let outcome = self.sequence(&mut data, &mut clock);
        let restored = self.restore();
        outcome?;
        restored?;

        let (data_pin, clock_pin) = self.pins();
        let report = ProbeReport {
            data: data.report(PinRole::Data, data_pin),
            clock: clock.report(PinRole::Clock, clock_pin),
        };
        log_info!(
            "dotstar probe: data {} {} drive_ok={}, clock {} {} drive_ok={}",
            data_pin.get(),
            level_name(report.data.level),
            report.data.drive_ok(),
            clock_pin.get(),
            level_name(report.clock.level),
            report.clock.drive_ok()
        );
        Ok(report)
    }

    /// Drive both lines high then low, `cycles` times, holding each level
    /// for `half_period_ms`. Slow enough to follow with a meter or LED.
    ///
    /// # Errors
    ///
    /// [`Error::Probe`] if a pin faults. The pins are still restored.
    pub fn toggle(&mut self, cycles: u32, half_period_ms: u32) -> Result<(), Error> {
        log_info!(
            "dotstar probe: toggling data {} / clock {}",
            self.data_claim.pin().get(),
            self.clock_claim.pin().get()
        );
        let outcome = self.pulse(cycles, half_period_ms);
        let restored = self.restore();
        outcome?;
        restored
    }

    /// Release the pins and hand the board back.
    pub fn release(self) -> B {
        self.board
    }

    fn sequence(&mut self, data: &mut Readings, clock: &mut Readings) -> Result<(), Error> {
        let (d, c) = self.read_with(Pull::None)?;
        data.floating = d;
        clock.floating = c;
        let (d, c) = self.read_with(Pull::Up)?;
        data.pull_up = d;
        clock.pull_up = c;
        let (d, c) = self.read_with(Pull::Down)?;
        data.pull_down = d;
        clock.pull_down = c;

        self.set_mode(PinMode::Output)?;
        self.drive(false)?;
        self.delay.delay_ms(SETTLE_MS);
        let (d, c) = self.read()?;
        data.drive_low = d;
        clock.drive_low = c;

        let high_at = self.board.now_us();
        self.drive(true)?;
        self.delay.delay_ms(SETTLE_MS);
        let (d, c) = self.read()?;
        data.drive_high = d;
        clock.drive_high = c;
        data.drive_high_at_us = high_at;
        clock.drive_high_at_us = high_at;

        let low_at = self.board.now_us();
        self.drive(false)?;
        self.delay.delay_ms(SETTLE_MS);
        let (d, c) = self.read()?;
        data.drive_low_after = d;
        clock.drive_low_after = c;
        data.drive_low_at_us = low_at;
        clock.drive_low_at_us = low_at;
        Ok(())
    }

    fn pulse(&mut self, cycles: u32, half_period_ms: u32) -> Result<(), Error> {
        self.set_mode(PinMode::Output)?;
        for _ in 0..cycles {
            self.data.set_high().map_err(probe_err)?;
            self.clock.set_high().map_err(probe_err)?;
            self.delay.delay_ms(half_period_ms);
            self.clock.set_low().map_err(probe_err)?;
            self.data.set_low().map_err(probe_err)?;
            self.delay.delay_ms(half_period_ms);
        }
        Ok(())
    }

    fn read_with(&mut self, pull: Pull) -> Result<(bool, bool), Error> {
        self.set_mode(PinMode::Input(pull))?;
        self.delay.delay_ms(SETTLE_MS);
        self.read()
    }

    fn read(&mut self) -> Result<(bool, bool), Error> {
        let d = self.data.is_high().map_err(probe_err)?;
        let c = self.clock.is_high().map_err(probe_err)?;
        Ok((d, c))
    }

    fn set_mode(&mut self, mode: PinMode) -> Result<(), Error> {
        self.data.set_mode(mode).map_err(probe_err)?;
        self.clock.set_mode(mode).map_err(probe_err)
    }

    fn drive(&mut self, high: bool) -> Result<(), Error> {
        drive_pin(&mut self.data, high).map_err(probe_err)?;
        drive_pin(&mut self.clock, high).map_err(probe_err)
    }

    /// Output, low, on both lines. Attempts both even if one fails.
    fn restore(&mut self) -> Result<(), Error> {
        let data = restore_pin(&mut self.data);
        let clock = restore_pin(&mut self.clock);
        data.and(clock).map_err(probe_err)
    }
}

impl<B: Board> core::fmt::Debug for DiagnosticProbe<'_, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DiagnosticProbe")
            .field("pins", &self.pins())
            .finish_non_exhaustive()
    }
}

fn drive_pin<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

fn restore_pin<P: ProbePin>(pin: &mut P) -> Result<(), <P as ErrorType>::Error> {
    pin.set_mode(PinMode::Output)?;
    pin.set_low()
}

fn level_name(level: PinLevel) -> &'static str {
    match level {
        PinLevel::Low => "held-low",
        PinLevel::High => "held-high",
        PinLevel::Floating => "floating",
        PinLevel::Indeterminate => "indeterminate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify(true, false), PinLevel::Floating);
        assert_eq!(classify(true, true), PinLevel::High);
        assert_eq!(classify(false, false), PinLevel::Low);
        assert_eq!(classify(false, true), PinLevel::Indeterminate);
    }
}
