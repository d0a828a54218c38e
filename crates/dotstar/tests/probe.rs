//! Diagnostic probe classification and pin restoration.
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use dotstar::mock::{ExternalLoad, MockBoard, MockBus};
use dotstar::probe::SETTLE_MS;
use dotstar::{
    ConfigError, DiagnosticProbe, Dotstar, DriverConfig, Error, PinLevel, PinMode,
    PinRole,
};

#[test]
fn unconnected_lines_read_floating() {
    let bus = MockBus::new();
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    let report = probe.run().unwrap();

    for role in [PinRole::Data, PinRole::Clock] {
        let pin = report.get(role);
        assert_eq!(pin.role, role);
        assert_eq!(pin.level, PinLevel::Floating);
        assert!(pin.pull_up);
        assert!(!pin.pull_down);
        assert!(pin.drive_ok());
    }
    assert_eq!(report.data.pin.get(), 9);
    assert_eq!(report.clock.pin.get(), 28);
}

#[test]
fn external_loads_are_classified() {
    let bus = MockBus::new();
    bus.set_load(9, ExternalLoad::PullUp);
    bus.set_load(28, ExternalLoad::PullDown);
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    let report = probe.run().unwrap();

    assert_eq!(report.data.level, PinLevel::High);
    assert_eq!(report.clock.level, PinLevel::Low);
    // A resistor does not beat the output driver.
    assert!(report.data.drive_ok());
    assert!(report.clock.drive_ok());
}

#[test]
fn shorted_line_fails_drive_check() {
    let bus = MockBus::new();
    bus.set_load(28, ExternalLoad::HeldLow);
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    let report = probe.run().unwrap();

    assert_eq!(report.clock.level, PinLevel::Low);
    assert!(!report.clock.drive_high);
    assert!(!report.clock.drive_ok());
    assert!(report.data.drive_ok());
}

#[test]
fn line_stuck_high_fails_every_low_read_back() {
    let bus = MockBus::new();
    bus.set_load(9, ExternalLoad::HeldHigh);
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    let report = probe.run().unwrap();

    assert_eq!(report.data.level, PinLevel::High);
    assert!(report.data.drive_low);
    assert!(report.data.drive_low_after);
    assert!(!report.data.drive_ok());
    assert!(!report.clock.drive_low_after);
    assert!(report.clock.drive_ok());
}

#[test]
fn pins_end_as_low_outputs() {
    let bus = MockBus::new();
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    probe.run().unwrap();
    for pin in [9, 28] {
        assert_eq!(bus.mode(pin), Some(PinMode::Output));
        assert!(!bus.level(pin));
    }
}

#[test]
fn transition_timestamps_follow_board_clock() {
    let bus = MockBus::new();
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    let report = probe.run().unwrap();

    // Three input phases and the drive-low phase settle before the rise.
    let settle_us = u64::from(SETTLE_MS) * 1_000;
    assert_eq!(report.data.drive_high_at_us, Some(4 * settle_us));
    assert_eq!(report.data.drive_low_at_us, Some(5 * settle_us));
    assert_eq!(report.clock.drive_high_at_us, report.data.drive_high_at_us);
    assert_eq!(report.clock.drive_low_at_us, report.data.drive_low_at_us);
    // The final low drive is read back after its own settle.
    assert_eq!(bus.elapsed_ns(), 6 * u64::from(SETTLE_MS) * 1_000_000);
}

#[test]
fn faulty_pin_is_reported_and_other_pin_restored() {
    let bus = MockBus::new();
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    bus.make_faulty(28);

    assert!(matches!(probe.run(), Err(Error::Probe(_))));
    assert_eq!(bus.mode(9), Some(PinMode::Output));
    assert!(!bus.level(9));
}

#[test]
fn toggle_pulses_both_lines() {
    let bus = MockBus::new();
    let mut probe = DiagnosticProbe::new(MockBoard::new(&bus), 9, 28).unwrap();
    probe.toggle(5, 100).unwrap();

    assert_eq!(bus.clock_edges(), 5);
    assert_eq!(bus.elapsed_ns(), 5 * 2 * 100 * 1_000_000);
    assert_eq!(bus.setup_violations(), 0);
    assert!(!bus.level(9));
    assert!(!bus.level(28));
}

#[test]
fn probe_rejects_bad_pins() {
    let bus = MockBus::new();
    assert_eq!(
        DiagnosticProbe::new(MockBoard::new(&bus), 9, 9).unwrap_err(),
        Error::Config(ConfigError::SamePin(9))
    );
    assert_eq!(
        DiagnosticProbe::new(MockBoard::new(&bus), 70, 9).unwrap_err(),
        Error::Config(ConfigError::PinOutOfRange(70))
    );
    bus.make_unavailable(28);
    assert!(matches!(
        DiagnosticProbe::new(MockBoard::new(&bus), 9, 28),
        Err(Error::Board(_))
    ));
    assert!(!bus.registry().is_claimed(dotstar::PinId::new(9).unwrap()));
}

#[test]
fn probe_runs_on_a_released_driver_board() {
    let bus = MockBus::new();
    let strip: Dotstar<'_, MockBoard<'_>> =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();
    let board = strip.release();

    let mut probe = DiagnosticProbe::new(board, 9, 28).unwrap();
    let report = probe.run().unwrap();
    assert_eq!(report.get(PinRole::Clock).level, PinLevel::Floating);
}
