//! Mock board for host-side testing.
//!
//! [`MockBus`] is the shared wire model: every mock pin, engine and delay
//! handed out by a [`MockBoard`] borrows the same bus, so a test can keep a
//! `&MockBus` and inspect what happened after the driver is done.
//!
//! The bus doubles as a logic analyser on the configured data/clock pair:
//! on every rising clock edge it samples the data line and assembles bytes
//! MSB-first, exactly as a strip would. It also counts data edges that
//! happen while the clock is high (setup violations) and accumulates the
//! time spent in [`MockDelay`].
//!
//! Faults are injected on the bus: engine init failures, engine transmit
//! faults, unavailable pins, pins whose writes fail, and external loads
//! (pull resistors or hard shorts) that the probe should detect.
//!
//! Always compiled and `no_std`: captured bytes live in a fixed-size
//! `heapless::Vec` of [`CAPTURE_LEN`] bytes.

use core::cell::RefCell;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::backend::{ClockedEngine, EngineConfig};
use crate::board::{Board, PinAuthority, PinMode, ProbePin, Pull};
use crate::error::{BoardError, EngineInitError, TransmitError};
use crate::pins::{PinId, PinRegistry};

/// Capacity of each capture buffer.
pub const CAPTURE_LEN: usize = 2048;

/// Captured byte stream.
pub type Capture = heapless::Vec<u8, CAPTURE_LEN>;

// One slot per `PinId` (0..=63).
const PIN_COUNT: usize = 64;

/// Something outside the MCU connected to a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalLoad {
    /// Nothing; the pin floats when not driven.
    #[default]
    None,
    /// External pull-up resistor, stronger than the internal pulls.
    PullUp,
    /// External pull-down resistor, stronger than the internal pulls.
    PullDown,
    /// Shorted high; overrides even an output driver.
    HeldHigh,
    /// Shorted low; overrides even an output driver.
    HeldLow,
}

#[derive(Debug, Clone, Copy, Default)]
struct PinSim {
    mode: Option<PinMode>,
    driven: bool,
    load: ExternalLoad,
    unavailable: bool,
    faulty: bool,
}

impl PinSim {
    /// Level an observer on the wire would see.
    fn level(&self) -> bool {
        match self.load {
            ExternalLoad::HeldHigh => return true,
            ExternalLoad::HeldLow => return false,
            _ => {}
        }
        match self.mode {
            Some(PinMode::Output) => self.driven,
            Some(PinMode::Input(pull)) => match (self.load, pull) {
                (ExternalLoad::PullUp, _) | (ExternalLoad::None, Pull::Up) => true,
                (ExternalLoad::PullDown, _) | (ExternalLoad::None, Pull::Down) => false,
                // Truly floating inputs read low on this bus.
                _ => false,
            },
            None => matches!(self.load, ExternalLoad::PullUp),
        }
    }
}

#[derive(Debug)]
struct BusState {
    data: u8,
    clock: u8,
    pins: [PinSim; PIN_COUNT],
    engine_attempts: u32,
    engine_running: bool,
    engine_init_failure: Option<EngineInitError>,
    transmit_fault: Option<TransmitError>,
    engine_bytes: Capture,
    wire_bytes: Capture,
    shift: u8,
    bits: u8,
    clock_edges: u32,
    setup_violations: u32,
    elapsed_ns: u64,
    overflowed: bool,
}

impl BusState {
    fn pin(&self, pin: u8) -> PinSim {
        self.pins
            .get(usize::from(pin))
            .copied()
            .unwrap_or_default()
    }

    fn pin_mut(&mut self, pin: u8) -> Option<&mut PinSim> {
        self.pins.get_mut(usize::from(pin))
    }

    fn capture(buf: &mut Capture, overflowed: &mut bool, byte: u8) {
        if buf.push(byte).is_err() {
            *overflowed = true;
        }
    }

    #[allow(clippy::arithmetic_side_effects)] // Mock counters; overflow not a concern in tests
    fn drive(&mut self, pin: u8, high: bool) {
        let clock_before = self.pin(self.clock).level();
        let data_before = self.pin(self.data).level();
        if let Some(sim) = self.pin_mut(pin) {
            sim.driven = high;
        }
        let clock_after = self.pin(self.clock).level();
        let data_after = self.pin(self.data).level();

        if pin == self.data && data_before != data_after && clock_before {
            self.setup_violations += 1;
        }
        if pin == self.clock && !clock_before && clock_after {
            self.clock_edges += 1;
            self.shift = self.shift.wrapping_shl(1) | u8::from(data_after);
            self.bits += 1;
            if self.bits == 8 {
                let byte = self.shift;
                Self::capture(&mut self.wire_bytes, &mut self.overflowed, byte);
                self.shift = 0;
                self.bits = 0;
            }
        }
    }
}

/// Shared wire model and fault injector.
#[derive(Debug)]
pub struct MockBus {
    state: RefCell<BusState>,
    registry: PinRegistry,
}

impl MockBus {
    /// Bus decoding data on GP9 and clock on GP28.
    pub fn new() -> Self {
        Self::with_wiring(9, 28)
    }

    /// Bus decoding the given data/clock pair.
    pub fn with_wiring(data: u8, clock: u8) -> Self {
        Self {
            state: RefCell::new(BusState {
                data,
                clock,
                pins: [PinSim::default(); PIN_COUNT],
                engine_attempts: 0,
                engine_running: false,
                engine_init_failure: None,
                transmit_fault: None,
                engine_bytes: Capture::new(),
                wire_bytes: Capture::new(),
                shift: 0,
                bits: 0,
                clock_edges: 0,
                setup_violations: 0,
                elapsed_ns: 0,
                overflowed: false,
            }),
            registry: PinRegistry::new(),
        }
    }

    /// Claim registry shared by every [`MockBoard`] on this bus.
    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    // ─── Fault injection ─────────────────────────────────────────────────

    /// Make every subsequent engine bring-up fail with `error`.
    pub fn fail_engine_init(&self, error: EngineInitError) {
        self.state.borrow_mut().engine_init_failure = Some(error);
    }

    /// Make every subsequent engine write fail with `error`.
    pub fn fail_transmit(&self, error: TransmitError) {
        self.state.borrow_mut().transmit_fault = Some(error);
    }

    /// Remove injected engine faults.
    pub fn clear_faults(&self) {
        let mut s = self.state.borrow_mut();
        s.engine_init_failure = None;
        s.transmit_fault = None;
    }

    /// The board refuses to hand out `pin`.
    pub fn make_unavailable(&self, pin: u8) {
        if let Some(sim) = self.state.borrow_mut().pin_mut(pin) {
            sim.unavailable = true;
        }
    }

    /// Every write to `pin` fails.
    pub fn make_faulty(&self, pin: u8) {
        if let Some(sim) = self.state.borrow_mut().pin_mut(pin) {
            sim.faulty = true;
        }
    }

    /// Attach an external load to `pin`.
    pub fn set_load(&self, pin: u8, load: ExternalLoad) {
        if let Some(sim) = self.state.borrow_mut().pin_mut(pin) {
            sim.load = load;
        }
    }

    // ─── Observation ─────────────────────────────────────────────────────

    /// Times the board was asked to start the engine.
    pub fn engine_attempts(&self) -> u32 {
        self.state.borrow().engine_attempts
    }

    /// `true` between a successful bring-up and the engine's stop.
    pub fn engine_running(&self) -> bool {
        self.state.borrow().engine_running
    }

    /// Bytes written through the engine, in order.
    pub fn engine_bytes(&self) -> Capture {
        self.state.borrow().engine_bytes.clone()
    }

    /// Bytes decoded from the data/clock pins, in order.
    pub fn wire_bytes(&self) -> Capture {
        self.state.borrow().wire_bytes.clone()
    }

    /// Bits seen since the last complete decoded byte.
    pub fn partial_bits(&self) -> u8 {
        self.state.borrow().bits
    }

    /// Rising edges seen on the clock pin.
    pub fn clock_edges(&self) -> u32 {
        self.state.borrow().clock_edges
    }

    /// Data edges seen while the clock was high.
    pub fn setup_violations(&self) -> u32 {
        self.state.borrow().setup_violations
    }

    /// Total time spent in [`MockDelay`], in nanoseconds.
    pub fn elapsed_ns(&self) -> u64 {
        self.state.borrow().elapsed_ns
    }

    /// A capture buffer ran out of room.
    pub fn overflowed(&self) -> bool {
        self.state.borrow().overflowed
    }

    /// Wire level of `pin`.
    pub fn level(&self, pin: u8) -> bool {
        self.state.borrow().pin(pin).level()
    }

    /// Last configured mode of `pin`, `None` if never configured.
    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.state.borrow().pin(pin).mode
    }

    /// Forget captured bytes, edges, violations and elapsed time.
    pub fn clear_capture(&self) {
        let mut s = self.state.borrow_mut();
        s.engine_bytes.clear();
        s.wire_bytes.clear();
        s.shift = 0;
        s.bits = 0;
        s.clock_edges = 0;
        s.setup_violations = 0;
        s.elapsed_ns = 0;
        s.overflowed = false;
    }

    // ─── Internal hooks ──────────────────────────────────────────────────

    fn write_pin(&self, pin: u8, high: bool) -> Result<(), MockPinError> {
        let mut s = self.state.borrow_mut();
        if s.pin(pin).faulty {
            return Err(MockPinError);
        }
        s.drive(pin, high);
        Ok(())
    }

    fn read_pin(&self, pin: u8) -> Result<bool, MockPinError> {
        let s = self.state.borrow();
        let sim = s.pin(pin);
        if sim.faulty {
            return Err(MockPinError);
        }
        Ok(sim.level())
    }

    fn set_pin_mode(&self, pin: u8, mode: PinMode) -> Result<(), MockPinError> {
        let mut s = self.state.borrow_mut();
        match s.pin_mut(pin) {
            Some(sim) if !sim.faulty => {
                sim.mode = Some(mode);
                Ok(())
            }
            _ => Err(MockPinError),
        }
    }

    fn take_pin(&self, pin: PinId) -> Result<(), BoardError> {
        if self.state.borrow().pin(pin.get()).unavailable {
            Err(BoardError::PinUnavailable(pin.get()))
        } else {
            Ok(())
        }
    }

    #[allow(clippy::arithmetic_side_effects)] // Mock counter; overflow not a concern in tests
    fn start_engine(&self) -> Result<(), EngineInitError> {
        let mut s = self.state.borrow_mut();
        s.engine_attempts += 1;
        if let Some(e) = s.engine_init_failure {
            return Err(e);
        }
        s.engine_running = true;
        Ok(())
    }

    fn engine_write(&self, bytes: &[u8]) -> Result<(), TransmitError> {
        let mut s = self.state.borrow_mut();
        if let Some(e) = s.transmit_fault {
            return Err(e);
        }
        let BusState {
            engine_bytes,
            overflowed,
            ..
        } = &mut *s;
        for &b in bytes {
            BusState::capture(engine_bytes, overflowed, b);
        }
        Ok(())
    }

    fn advance(&self, ns: u64) {
        let mut s = self.state.borrow_mut();
        s.elapsed_ns = s.elapsed_ns.saturating_add(ns);
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by faulty mock pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Push-pull output on the bus.
#[derive(Debug)]
pub struct MockOutputPin<'a> {
    bus: &'a MockBus,
    pin: u8,
}

impl ErrorType for MockOutputPin<'_> {
    type Error = MockPinError;
}

impl OutputPin for MockOutputPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.write_pin(self.pin, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.write_pin(self.pin, true)
    }
}

/// Reconfigurable pin on the bus.
#[derive(Debug)]
pub struct MockProbePin<'a> {
    bus: &'a MockBus,
    pin: u8,
}

impl ErrorType for MockProbePin<'_> {
    type Error = MockPinError;
}

impl OutputPin for MockProbePin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.write_pin(self.pin, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.write_pin(self.pin, true)
    }
}

impl InputPin for MockProbePin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.bus.read_pin(self.pin)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.bus.read_pin(self.pin).map(|high| !high)
    }
}

impl ProbePin for MockProbePin<'_> {
    fn set_mode(&mut self, mode: PinMode) -> Result<(), <Self as ErrorType>::Error> {
        self.bus.set_pin_mode(self.pin, mode)
    }
}

/// Delay that advances bus time instead of sleeping.
#[derive(Debug)]
pub struct MockDelay<'a> {
    bus: &'a MockBus,
}

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.bus.advance(u64::from(ns));
    }
}

/// Shift engine that records into the bus.
#[derive(Debug)]
pub struct MockEngine<'a> {
    bus: &'a MockBus,
    config: EngineConfig,
}

impl MockEngine<'_> {
    /// Configuration the engine was started with.
    pub fn config(&self) -> EngineConfig {
        self.config
    }
}

impl ClockedEngine for MockEngine<'_> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransmitError> {
        self.bus.engine_write(bytes)
    }

    fn flush(&mut self) -> Result<(), TransmitError> {
        Ok(())
    }

    fn stop(&mut self) {
        self.bus.state.borrow_mut().engine_running = false;
    }
}

/// Board handing out bus-backed resources.
#[derive(Debug, Clone, Copy)]
pub struct MockBoard<'a> {
    bus: &'a MockBus,
}

impl<'a> MockBoard<'a> {
    /// Board on `bus`.
    pub fn new(bus: &'a MockBus) -> Self {
        Self { bus }
    }

    /// The shared bus.
    pub fn bus(&self) -> &'a MockBus {
        self.bus
    }
}

impl<'a> Board for MockBoard<'a> {
    type Output = MockOutputPin<'a>;
    type ProbePin = MockProbePin<'a>;
    type Engine = MockEngine<'a>;
    type Delay = MockDelay<'a>;

    fn output(&mut self, pin: PinId) -> Result<Self::Output, BoardError> {
        self.bus.take_pin(pin)?;
        self.bus
            .set_pin_mode(pin.get(), PinMode::Output)
            .map_err(|_| BoardError::PinUnavailable(pin.get()))?;
        Ok(MockOutputPin {
            bus: self.bus,
            pin: pin.get(),
        })
    }

    fn probe_pin(&mut self, pin: PinId) -> Result<Self::ProbePin, BoardError> {
        self.bus.take_pin(pin)?;
        Ok(MockProbePin {
            bus: self.bus,
            pin: pin.get(),
        })
    }

    fn engine(&mut self, config: &EngineConfig) -> Result<Self::Engine, EngineInitError> {
        self.bus.start_engine()?;
        Ok(MockEngine {
            bus: self.bus,
            config: *config,
        })
    }

    fn delay(&mut self) -> Self::Delay {
        MockDelay { bus: self.bus }
    }

    fn now_us(&self) -> Option<u64> {
        Some(self.bus.elapsed_ns() / 1_000)
    }
}

impl<'a> PinAuthority<'a> for MockBoard<'a> {
    fn registry(&self) -> &'a PinRegistry {
        let bus: &'a MockBus = self.bus;
        bus.registry()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn analyser_decodes_msb_first_on_rising_edges() {
        let bus = MockBus::new();
        let mut data = MockOutputPin { bus: &bus, pin: 9 };
        let mut clock = MockOutputPin { bus: &bus, pin: 28 };
        bus.set_pin_mode(9, PinMode::Output).unwrap();
        bus.set_pin_mode(28, PinMode::Output).unwrap();
        for bit in [true, false, true, false, false, false, false, true] {
            if bit {
                data.set_high().unwrap();
            } else {
                data.set_low().unwrap();
            }
            clock.set_high().unwrap();
            clock.set_low().unwrap();
        }
        assert_eq!(bus.wire_bytes().as_slice(), [0b1010_0001]);
        assert_eq!(bus.clock_edges(), 8);
        assert_eq!(bus.setup_violations(), 0);
    }

    #[test]
    fn data_edge_while_clock_high_is_a_violation() {
        let bus = MockBus::new();
        bus.set_pin_mode(9, PinMode::Output).unwrap();
        bus.set_pin_mode(28, PinMode::Output).unwrap();
        bus.write_pin(28, true).unwrap();
        bus.write_pin(9, true).unwrap();
        assert_eq!(bus.setup_violations(), 1);
    }

    #[test]
    fn loads_and_pulls_resolve_input_level() {
        let bus = MockBus::new();
        bus.set_pin_mode(3, PinMode::Input(Pull::Up)).unwrap();
        assert!(bus.level(3));
        bus.set_load(3, ExternalLoad::PullDown);
        assert!(!bus.level(3));
        bus.set_pin_mode(3, PinMode::Output).unwrap();
        bus.write_pin(3, true).unwrap();
        assert!(bus.level(3));
        bus.set_load(3, ExternalLoad::HeldLow);
        assert!(!bus.level(3));
    }
}
