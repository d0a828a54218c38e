//! Backend contracts against `embedded-hal-mock` peripherals.
// Integration test file: expect/unwrap are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! `SpiEngine` must issue plain bus writes followed by one flush;
//! `BitBangBackend` must emit data-then-clock-high-then-clock-low per bit,
//! MSB first, and idle both lines low.
//!
//! Run with: cargo test -p dotstar --test hal_contract

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use embedded_hal_mock::eh1::MockError;

use dotstar::backend::{OutputBackend, SpiEngine};
use dotstar::frame;
use dotstar::{
    BackendMode, BitBangBackend, Color, EngineConfig, EngineInitError, HardwareBackend, Pixel,
    PinId, TransmitError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine_config(clock_hz: u32) -> EngineConfig {
    EngineConfig {
        data: PinId::new(9).unwrap(),
        clock: PinId::new(28).unwrap(),
        clock_hz,
    }
}

/// Data and clock expectations for one byte on the bit-bang backend.
fn bitbang_byte(byte: u8, data: &mut Vec<PinTransaction>, clock: &mut Vec<PinTransaction>) {
    for shift in (0..8).rev() {
        let state = if (byte >> shift) & 1 == 1 {
            PinState::High
        } else {
            PinState::Low
        };
        data.push(PinTransaction::set(state));
        clock.push(PinTransaction::set(PinState::High));
        clock.push(PinTransaction::set(PinState::Low));
    }
}

// ---------------------------------------------------------------------------
// SpiEngine
// ---------------------------------------------------------------------------

#[test]
fn spi_engine_writes_frame_then_flushes() {
    let pixels = [Pixel::new(Color::RED, 0.6)];
    let bytes: Vec<u8> = frame::encode(&pixels).collect();
    assert_eq!(bytes.len(), 13);

    let expectations = [
        SpiTransaction::write_vec(bytes.clone()),
        SpiTransaction::flush(),
    ];
    let spi = SpiMock::new(&expectations);
    let engine = SpiEngine::new(spi, &engine_config(2_000_000)).unwrap();
    let mut backend = HardwareBackend::new(engine);

    assert_eq!(backend.mode(), BackendMode::Hardware);
    assert_eq!(backend.transmit(frame::encode(&pixels)).unwrap(), 13);
    assert_eq!(&bytes[4..8], [0xF2, 0x00, 0x00, 0xFF]);

    let mut spi = backend.into_inner().release();
    spi.done();
}

#[test]
fn spi_engine_chunks_long_frames() {
    // 25 pixels -> 4 + 100 + 6 = 110 bytes -> one 64-byte chunk + 46 bytes.
    let pixels = [Pixel::new(Color::BLUE, 1.0); 25];
    let bytes: Vec<u8> = frame::encode(&pixels).collect();
    let expectations = [
        SpiTransaction::write_vec(bytes[..64].to_vec()),
        SpiTransaction::write_vec(bytes[64..].to_vec()),
        SpiTransaction::flush(),
    ];
    let spi = SpiMock::new(&expectations);
    let mut backend =
        HardwareBackend::new(SpiEngine::new(spi, &engine_config(8_000_000)).unwrap());
    assert_eq!(backend.transmit(frame::encode(&pixels)).unwrap(), 110);
    backend.into_inner().release().done();
}

#[test]
fn spi_engine_rejects_unsupported_configuration() {
    let mut spi = SpiMock::new(&[]);
    assert_eq!(
        SpiEngine::new(spi.clone(), &engine_config(40_000_000)).err(),
        Some(EngineInitError::UnsupportedFrequency(40_000_000))
    );
    let same = EngineConfig {
        clock: PinId::new(9).unwrap(),
        ..engine_config(2_000_000)
    };
    assert_eq!(
        SpiEngine::new(spi.clone(), &same).err(),
        Some(EngineInitError::UnsupportedPins { data: 9, clock: 9 })
    );
    spi.done();
}

// ---------------------------------------------------------------------------
// BitBangBackend
// ---------------------------------------------------------------------------

#[test]
fn bitbang_emits_msb_first_with_clock_pulse_per_bit() {
    let mut data_tx = vec![PinTransaction::set(PinState::Low)];
    let mut clock_tx = vec![PinTransaction::set(PinState::Low)];
    for byte in [0xA5u8, 0x01] {
        bitbang_byte(byte, &mut data_tx, &mut clock_tx);
    }
    // Data idles low after the last bit, then both idle again on teardown.
    data_tx.push(PinTransaction::set(PinState::Low));
    clock_tx.push(PinTransaction::set(PinState::Low));
    data_tx.push(PinTransaction::set(PinState::Low));

    let data = PinMock::new(&data_tx);
    let clock = PinMock::new(&clock_tx);
    let mut backend = BitBangBackend::new(data, clock, NoopDelay, 1_000).unwrap();
    assert_eq!(backend.mode(), BackendMode::BitBang);
    assert_eq!(backend.transmit([0xA5u8, 0x01]).unwrap(), 2);

    let (mut data, mut clock, _) = backend.into_parts();
    data.done();
    clock.done();
}

#[test]
fn bitbang_pin_error_aborts_transmit() {
    let data_tx = [
        PinTransaction::set(PinState::Low),
        PinTransaction::set(PinState::High)
            .with_error(MockError::Io(std::io::ErrorKind::NotConnected)),
    ];
    let clock_tx = [PinTransaction::set(PinState::Low)];
    let mut data = PinMock::new(&data_tx);
    let mut clock = PinMock::new(&clock_tx);

    let mut backend =
        BitBangBackend::new(data.clone(), clock.clone(), NoopDelay, 1_000).unwrap();
    assert!(matches!(
        backend.transmit([0x80u8]),
        Err(TransmitError::Pin(_))
    ));

    data.done();
    clock.done();
}
