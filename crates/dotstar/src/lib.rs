//! APA102 / DotStar LED strip driver
//!
//! Drives a two-wire (data + clock) addressable LED strip from a
//! microcontroller, with a per-pixel color and brightness model.
//!
//! # Architecture
//!
//! ```text
//! caller ──► Dotstar ──► PixelBuffer
//!               │            │ show()
//!               │            ▼
//!               │       frame::encode ──► Backend ──► data / clock
//!               │                           ▲
//!               └── BackendSelector ────────┘  (once, at construction)
//!
//! DiagnosticProbe ──► data / clock   (bypasses everything above)
//! ```
//!
//! # Backends
//!
//! - **Hardware**: a [`ClockedEngine`] from the [`Board`] (SPI controller,
//!   PIO state machine, ...). Tried first.
//! - **Bit-bang**: the two pins toggled in software through
//!   `embedded_hal` [`OutputPin`](embedded_hal::digital::OutputPin) and
//!   [`DelayNs`](embedded_hal::delay::DelayNs). Used when the engine cannot
//!   start, or when forced.
//!
//! The choice is made once and never changes; [`Dotstar::selection`]
//! reports it and why.
//!
//! # Value and write policy
//!
//! - Out-of-range color and brightness values are clamped into
//!   `[0.0, 1.0]` (`NaN` becomes `0.0`) by every setter.
//! - Setters never transmit. [`Dotstar::show`] sends the buffer.
//!
//! # Features
//!
//! - `std`: `std::error::Error` impls
//! - `defmt`: `defmt::Format` derives and defmt log output
//! - `tracing`: log output through `tracing` (host builds)
//! - `rp2040`: `PioEngine`, a [`ClockedEngine`] on an RP2040 PIO state
//!   machine that works on any data/clock GPIO pair
//!
//! # Example
//!
//! ```no_run
//! use dotstar::{Board, Color, Dotstar, DriverConfig, PinAuthority};
//!
//! fn run<B: Board + PinAuthority<'static>>(board: B) -> Result<(), dotstar::Error> {
//!     let mut tree: Dotstar<'static, B> = Dotstar::new(board, DriverConfig::default())?;
//!     tree.set_color(Color::RED);
//!     tree.set_pixel_color(1, Color::GREEN)?;
//!     tree.show()?;
//!     Ok(())
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in driver code
#![deny(clippy::expect_used)] // no .expect() in driver code
#![deny(clippy::panic)] // no panic!() in driver code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod log;

pub mod backend;
pub mod board;
pub mod buffer;
pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod mock;
pub mod pins;
pub mod probe;
pub mod selector;

pub use backend::{
    Backend, BackendMode, BitBangBackend, ClockedEngine, EngineConfig, HardwareBackend,
    OutputBackend, SpiEngine,
};
#[cfg(feature = "rp2040")]
pub use backend::PioEngine;
pub use board::{Board, PinAuthority, PinMode, ProbePin, Pull};
pub use buffer::PixelBuffer;
pub use color::{Color, Level, Pixel};
pub use config::DriverConfig;
pub use driver::Dotstar;
pub use error::{
    BoardError, ConfigError, EngineInitError, Error, IndexError, InitError, PinClaimError,
    TransmitError,
};
pub use pins::{PinClaim, PinId, PinRegistry};
pub use probe::{DiagnosticProbe, PinLevel, PinReport, PinRole, ProbeReport};
pub use selector::{BackendSelector, Selection, SelectionReason};
