//! End-to-end driver scenarios on the mock board.
// Integration test file: unwrap/indexing are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! Every scenario inspects the bytes that actually reached the mock bus:
//! `engine_bytes()` for the hardware backend, `wire_bytes()` (decoded from
//! the data/clock toggles) for bit-bang.
//!
//! Run with: cargo test -p dotstar --test driver_scenarios

use dotstar::frame::{self, PIXEL_BLOCK_LEN, START_FRAME_LEN};
use dotstar::mock::{MockBoard, MockBus};
use dotstar::{
    BackendMode, Color, ConfigError, Dotstar, DriverConfig, Error, IndexError, Level, Pixel,
    TransmitError,
};

type Strip<'r, 'b> = Dotstar<'r, MockBoard<'b>>;

fn blocks(bytes: &[u8], n: usize) -> Vec<[u8; 4]> {
    bytes[START_FRAME_LEN..START_FRAME_LEN + n * PIXEL_BLOCK_LEN]
        .chunks(PIXEL_BLOCK_LEN)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect()
}

#[test]
fn red_strip_at_sixty_percent_on_hardware() {
    let bus = MockBus::new();
    let config = DriverConfig::default()
        .with_pixel_count(25)
        .with_pins(9, 28);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    assert_eq!(strip.mode(), BackendMode::Hardware);

    strip.set_color((1.0, 0.0, 0.0));
    strip.set_brightness(0.6);
    strip.show().unwrap();

    let bytes = bus.engine_bytes();
    assert_eq!(bytes.len(), frame::frame_len(25));
    // 0.6 * 31 = 18.6 -> 18 -> 0b111_10010
    for block in blocks(&bytes, 25) {
        assert_eq!(block, [0xF2, 0x00, 0x00, 0xFF]);
    }
}

#[test]
fn red_strip_at_sixty_percent_on_bitbang() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_force_fallback(true);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    assert_eq!(strip.mode(), BackendMode::BitBang);

    strip.set_color(Color::RED);
    strip.set_brightness(0.6);
    strip.show().unwrap();

    let wire = bus.wire_bytes();
    let expected: Vec<u8> = strip.frame().collect();
    assert_eq!(wire.as_slice(), expected.as_slice());
    assert_eq!(bus.partial_bits(), 0, "final clock pulse must not be skipped");
    assert_eq!(bus.setup_violations(), 0);
    assert!(bus.engine_bytes().is_empty());
    for block in blocks(&wire, 25) {
        assert_eq!(block, [0xF2, 0x00, 0x00, 0xFF]);
    }
}

#[test]
fn bitbang_honours_configured_clock() {
    let bus = MockBus::new();
    let config = DriverConfig::default()
        .with_pixel_count(1)
        .with_force_fallback(true)
        .with_bitbang_hz(250_000);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    strip.show().unwrap();

    let bits = frame::frame_len(1) as u64 * 8;
    assert_eq!(bus.clock_edges() as u64, bits);
    // Two half periods of 2 µs per bit.
    assert_eq!(bus.elapsed_ns(), bits * 4_000);
}

#[test]
fn show_twice_sends_identical_frames() {
    let bus = MockBus::new();
    let mut strip: Strip =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();
    strip.set_pixel_color(3, Color::BLUE).unwrap();
    strip.set_pixel_brightness(3, 1.0).unwrap();

    strip.show().unwrap();
    let first = bus.engine_bytes();
    bus.clear_capture();
    strip.show().unwrap();
    assert_eq!(bus.engine_bytes(), first);
}

#[test]
fn setters_do_not_transmit() {
    let bus = MockBus::new();
    let mut strip: Strip =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();
    strip.set_color(Color::WHITE);
    strip.set_brightness(1.0);
    strip.set_pixel(0, Pixel::new(Color::GREEN, 0.2)).unwrap();
    strip.fill_on();
    strip.clear();
    assert!(bus.engine_bytes().is_empty());
}

#[test]
fn construction_applies_default_brightness_to_black_pixels() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_brightness(0.5);
    let strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    assert_eq!(strip.len(), 25);
    assert_eq!(strip.brightness(), Level::new(0.5));
    assert!(strip
        .iter()
        .all(|p| *p == Pixel::new(Color::BLACK, 0.5)));
}

#[test]
fn out_of_range_index_fails_without_touching_buffer() {
    let bus = MockBus::new();
    let mut strip: Strip =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();
    let before = strip.pixels().clone();

    assert_eq!(strip.pixel(25), Err(IndexError { index: 25, len: 25 }));
    assert_eq!(
        strip.set_pixel_color(99, Color::RED),
        Err(IndexError { index: 99, len: 25 })
    );
    assert_eq!(
        strip.set_pixel_brightness(25, 1.0),
        Err(IndexError { index: 25, len: 25 })
    );
    assert_eq!(strip.pixels(), &before);

    let err: Error = strip.set_pixel(25, Pixel::OFF).unwrap_err().into();
    assert!(!err.is_construction());
}

#[test]
fn whole_strip_and_per_pixel_setters_clamp_alike() {
    let bus = MockBus::new();
    let mut strip: Strip =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();

    strip.set_color((2.0, -1.0, f32::NAN));
    strip.set_brightness(9.0);
    let whole = strip.pixel(0).unwrap();

    strip.clear();
    strip.set_pixel_color(1, (2.0, -1.0, f32::NAN)).unwrap();
    strip.set_pixel_brightness(1, 9.0).unwrap();
    let single = strip.pixel(1).unwrap();

    assert_eq!(whole, single);
    assert_eq!(whole, Pixel::new(Color::RED, 1.0));
    assert_eq!(strip.brightness(), Level::FULL);
}

#[test]
fn average_color_reports_channel_means() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(4);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    strip.set_pixel_color(0, Color::WHITE).unwrap();
    strip.set_pixel_color(1, Color::RED).unwrap();
    assert_eq!(strip.average_color(), Color::new(0.5, 0.25, 0.25));
}

#[test]
fn test_pattern_lights_first_six_and_restores() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(8);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    strip.set_color(Color::WHITE);
    let original = strip.pixels().clone();

    let previous = strip.show_test_pattern().unwrap();
    assert_eq!(previous, original);

    let expected = [
        Color::RED,
        Color::GREEN,
        Color::BLUE,
        Color::RED,
        Color::GREEN,
        Color::BLUE,
        Color::BLACK,
        Color::BLACK,
    ];
    let colors: Vec<Color> = strip.iter().map(Pixel::color).collect();
    assert_eq!(colors, expected);
    let sent = blocks(&bus.engine_bytes(), 8);
    assert_eq!(sent[0][3], 0xFF);
    assert_eq!(sent[1][2], 0xFF);
    assert_eq!(sent[2][1], 0xFF);
    assert_eq!(sent[7][1..], [0, 0, 0]);

    strip.restore(&previous).unwrap();
    assert_eq!(strip.pixels(), &original);
}

#[test]
fn whole_buffer_assignment_sets_each_pixel() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(3);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();

    let pixels = [
        Pixel::new(Color::RED, 1.0),
        Pixel::new(Color::GREEN, 0.0),
        Pixel::new(Color::BLUE, 0.6),
    ];
    strip.set_pixels(&pixels).unwrap();
    strip.show().unwrap();
    let sent = blocks(&bus.engine_bytes(), 3);
    assert_eq!(sent[0], [0xFF, 0x00, 0x00, 0xFF]);
    assert_eq!(sent[1], [0xE0, 0x00, 0xFF, 0x00]);
    assert_eq!(sent[2], [0xF2, 0xFF, 0x00, 0x00]);

    strip
        .set_colors(&[Color::WHITE, Color::BLACK, Color::RED])
        .unwrap();
    assert_eq!(strip.pixel(0).unwrap().color(), Color::WHITE);
    assert_eq!(strip.pixel(2).unwrap().brightness(), Level::new(0.6));
}

#[test]
fn whole_buffer_assignment_rejects_wrong_length() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(3);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    let before = strip.pixels().clone();

    assert_eq!(
        strip.set_pixels(&[Pixel::new(Color::RED, 1.0); 4]),
        Err(ConfigError::LengthMismatch {
            expected: 3,
            found: 4
        })
    );
    assert_eq!(
        strip.set_colors(&[Color::RED]),
        Err(ConfigError::LengthMismatch {
            expected: 3,
            found: 1
        })
    );
    assert_eq!(strip.pixels(), &before);
    assert!(bus.engine_bytes().is_empty());
}

#[test]
fn test_pattern_on_short_strip() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(2);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    strip.show_test_pattern().unwrap();
    assert_eq!(strip.pixel(0).unwrap().color(), Color::RED);
    assert_eq!(strip.pixel(1).unwrap().color(), Color::GREEN);
}

#[test]
fn blank_clears_and_sends() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(3);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    strip.fill_on();
    strip.blank().unwrap();
    for block in blocks(&bus.engine_bytes(), 3) {
        assert_eq!(block[1..], [0, 0, 0]);
    }
}

#[test]
fn engine_fault_surfaces_as_transmit_error() {
    let bus = MockBus::new();
    let mut strip: Strip =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();

    bus.fail_transmit(TransmitError::Engine);
    assert_eq!(strip.show(), Err(TransmitError::Engine));
    let err: Error = TransmitError::Engine.into();
    assert!(!err.is_construction());

    // Not retried internally; the caller may simply re-issue the write.
    bus.clear_faults();
    strip.show().unwrap();
    assert_eq!(bus.engine_bytes().len(), frame::frame_len(25));
}

#[test]
fn bitbang_pin_fault_surfaces_as_transmit_error() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_force_fallback(true);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();

    bus.make_faulty(28);
    assert!(matches!(strip.show(), Err(TransmitError::Pin(_))));
}

#[test]
fn capacity_is_enforced_at_construction() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_pixel_count(65);
    let err = Dotstar::<MockBoard, 64>::new(MockBoard::new(&bus), config).unwrap_err();
    assert!(err.is_construction());
    assert_eq!(bus.engine_attempts(), 0);
    assert!(!bus.registry().is_claimed(dotstar::PinId::new(9).unwrap()));

    let small = DriverConfig::default().with_pixel_count(8);
    let strip = Dotstar::<MockBoard, 8>::new(MockBoard::new(&bus), small).unwrap();
    assert_eq!(strip.len(), 8);
}

#[test]
fn release_idles_the_engine() {
    let bus = MockBus::new();
    let strip: Strip =
        Dotstar::new(MockBoard::new(&bus), DriverConfig::default()).unwrap();
    assert!(bus.engine_running());
    let _board = strip.release();
    assert!(!bus.engine_running());
}

#[test]
fn release_leaves_bitbang_lines_low() {
    let bus = MockBus::new();
    let config = DriverConfig::default().with_force_fallback(true);
    let mut strip: Strip = Dotstar::new(MockBoard::new(&bus), config).unwrap();
    strip.fill_on();
    strip.set_brightness(1.0);
    strip.show().unwrap();
    let _board = strip.release();
    assert!(!bus.level(9));
    assert!(!bus.level(28));
}
