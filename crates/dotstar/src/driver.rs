//! The strip driver.
//!
//! A [`Dotstar`] owns its two GPIOs (through [`PinClaim`]s in the board's
//! [`PinAuthority`] registry), the selected backend and the pixel buffer.
//! Every setter only touches the buffer; [`Dotstar::show`] is the one
//! place a frame is encoded and sent.
//!
//! ```
//! use dotstar::mock::{MockBoard, MockBus};
//! use dotstar::{BackendMode, Color, Dotstar, DriverConfig};
//!
//! let bus = MockBus::new();
//! let mut strip: Dotstar<'_, _> = Dotstar::new(MockBoard::new(&bus), DriverConfig::default())?;
//! assert_eq!(strip.mode(), BackendMode::Hardware);
//!
//! strip.set_color(Color::RED);
//! strip.set_brightness(0.6);
//! strip.show()?;
//! assert_eq!(bus.engine_bytes()[4..8], [0xF2, 0x00, 0x00, 0xFF]);
//! # Ok::<(), dotstar::Error>(())
//! ```

use crate::backend::{Backend, BackendMode, OutputBackend};
use crate::board::{Board, PinAuthority};
use crate::buffer::PixelBuffer;
use crate::color::{Color, Level, Pixel};
use crate::config::DriverConfig;
use crate::error::{ConfigError, Error, IndexError, TransmitError};
use crate::frame::{self, Frame};
use crate::pins::{PinClaim, PinId};
use crate::selector::{BackendSelector, Selection};

/// Pixels lit by [`Dotstar::show_test_pattern`].
pub const TEST_PATTERN_LEN: usize = 6;

const TEST_PATTERN: [Color; 3] = [Color::RED, Color::GREEN, Color::BLUE];

/// Default pixel capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// APA102 strip driver on board `B`, holding up to `N` pixels.
pub struct Dotstar<'r, B: Board, const N: usize = DEFAULT_CAPACITY> {
    board: B,
    backend: Backend<B>,
    pixels: PixelBuffer<N>,
    brightness: Level,
    selection: Selection,
    debug: bool,
    data: PinClaim<'r>,
    clock: PinClaim<'r>,
}

impl<'r, B: Board, const N: usize> Dotstar<'r, B, N> {
    /// Validate `config`, claim both pins and bring up a backend.
    ///
    /// The buffer starts black at `config.brightness`. Nothing is sent.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for invalid settings or `pixel_count > N`
    /// - [`Error::PinClaim`] if either pin is owned by a live driver or probe
    /// - [`Error::Init`] if neither backend can be built
    pub fn new(mut board: B, config: DriverConfig) -> Result<Self, Error>
    where
        B: PinAuthority<'r>,
    {
        let registry = board.registry();
        let (engine, half_period_ns) = config.checked()?;
        let mut pixels = PixelBuffer::new(config.pixel_count)?;
        let (data, clock) = registry.claim_pair(engine.data, engine.clock)?;

        let selector = BackendSelector::new(config.force_fallback, config.debug);
        let (backend, selection) = selector.select(&mut board, &engine, half_period_ns)?;

        let brightness = Level::new(config.brightness);
        pixels.fill(Pixel::new(Color::BLACK, brightness.get()));

        if config.debug {
            log_info!(
                "dotstar: {} pixels on data {} / clock {}, {} backend",
                config.pixel_count,
                engine.data.get(),
                engine.clock.get(),
                selection.mode
            );
        }

        Ok(Self {
            board,
            backend,
            pixels,
            brightness,
            selection,
            debug: config.debug,
            data,
            clock,
        })
    }

    // ─── Introspection ───────────────────────────────────────────────────

    /// Active backend. Fixed for the driver's lifetime.
    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    /// How the backend was chosen.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Data and clock GPIOs.
    pub fn pins(&self) -> (PinId, PinId) {
        (self.data.pin(), self.clock.pin())
    }

    /// Borrow the board.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Iterate pixels in strip order.
    pub fn iter(&self) -> core::slice::Iter<'_, Pixel> {
        self.pixels.iter()
    }

    /// The pixel buffer.
    pub fn pixels(&self) -> &PixelBuffer<N> {
        &self.pixels
    }

    /// Mean color across the strip.
    pub fn average_color(&self) -> Color {
        self.pixels.average_color()
    }

    /// Driver-wide default brightness.
    pub fn brightness(&self) -> Level {
        self.brightness
    }

    /// The frame [`Dotstar::show`] would send now.
    pub fn frame(&self) -> Frame<'_> {
        frame::encode(self.pixels.as_slice())
    }

    // ─── Whole strip ─────────────────────────────────────────────────────

    /// Set every pixel's color, keeping brightness.
    pub fn set_color(&mut self, color: impl Into<Color>) {
        let color = color.into();
        self.pixels.for_each(|p| p.set_color(color));
    }

    /// Overwrite every pixel.
    pub fn set_all(&mut self, pixel: Pixel) {
        self.pixels.fill(pixel);
    }

    /// Overwrite the whole strip, one pixel per entry.
    ///
    /// # Errors
    ///
    /// [`ConfigError::LengthMismatch`] unless `pixels` matches the strip
    /// length. Nothing is changed in that case.
    pub fn set_pixels(&mut self, pixels: &[Pixel]) -> Result<(), ConfigError> {
        self.pixels.assign(pixels)
    }

    /// Set each pixel's color from `colors`, keeping brightness.
    ///
    /// # Errors
    ///
    /// [`ConfigError::LengthMismatch`] unless `colors` matches the strip
    /// length. Nothing is changed in that case.
    pub fn set_colors(&mut self, colors: &[Color]) -> Result<(), ConfigError> {
        self.pixels.assign_colors(colors)
    }

    /// Set the default brightness and apply it to every pixel.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = Level::new(brightness);
        let level = self.brightness.get();
        self.pixels.for_each(|p| p.set_brightness(level));
    }

    /// Every pixel white.
    pub fn fill_on(&mut self) {
        self.pixels.for_each(Pixel::on);
    }

    /// Every pixel black.
    pub fn clear(&mut self) {
        self.pixels.for_each(Pixel::off);
    }

    // ─── Single pixel ────────────────────────────────────────────────────

    /// Read pixel `index`.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn pixel(&self, index: usize) -> Result<Pixel, IndexError> {
        self.pixels.get(index)
    }

    /// Overwrite pixel `index`.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn set_pixel(&mut self, index: usize, pixel: Pixel) -> Result<(), IndexError> {
        self.pixels.set(index, pixel)
    }

    /// Set pixel `index`'s color, keeping its brightness.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn set_pixel_color(
        &mut self,
        index: usize,
        color: impl Into<Color>,
    ) -> Result<(), IndexError> {
        let color = color.into();
        self.pixels.update(index, |p| p.set_color(color))
    }

    /// Set pixel `index`'s brightness, keeping its color.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn set_pixel_brightness(&mut self, index: usize, brightness: f32) -> Result<(), IndexError> {
        self.pixels.update(index, |p| p.set_brightness(brightness))
    }

    // ─── Output ──────────────────────────────────────────────────────────

    /// Encode the buffer and send it. Blocks until the frame is out.
    ///
    /// # Errors
    ///
    /// [`TransmitError`] if the backend faults; the write is not retried.
    pub fn show(&mut self) -> Result<(), TransmitError> {
        let frame = frame::encode(self.pixels.as_slice());
        let sent = self.backend.transmit(frame).map_err(|e| {
            log_warn!("dotstar: write failed: {}", e);
            e
        })?;
        if self.debug {
            log_debug!("dotstar: {} write {} bytes", self.backend.mode(), sent);
        }
        Ok(())
    }

    /// Clear the buffer and send it.
    ///
    /// # Errors
    ///
    /// See [`Dotstar::show`].
    pub fn blank(&mut self) -> Result<(), TransmitError> {
        self.clear();
        self.show()
    }

    /// Light the first six pixels red, green, blue, red, green, blue (the
    /// rest black) and send it.
    ///
    /// Returns the previous buffer; hold the pattern as long as needed,
    /// then [`Dotstar::restore`] and [`Dotstar::show`].
    ///
    /// # Errors
    ///
    /// See [`Dotstar::show`]. The buffer keeps the pattern either way.
    pub fn show_test_pattern(&mut self) -> Result<PixelBuffer<N>, TransmitError> {
        let previous = self.pixels.clone();
        let mut colors = TEST_PATTERN.iter().copied().cycle().take(TEST_PATTERN_LEN);
        self.pixels
            .for_each(|p| p.set_color(colors.next().unwrap_or(Color::BLACK)));
        self.show()?;
        Ok(previous)
    }

    /// Put back a buffer returned by [`Dotstar::show_test_pattern`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::LengthMismatch`] if it came from a different strip.
    pub fn restore(&mut self, snapshot: &PixelBuffer<N>) -> Result<(), ConfigError> {
        self.pixels.copy_from(snapshot)
    }

    /// Idle both lines, release the pins and hand the board back.
    pub fn release(mut self) -> B {
        self.backend.shutdown();
        if self.debug {
            log_info!(
                "dotstar: released data {} / clock {}",
                self.data.pin().get(),
                self.clock.pin().get()
            );
        }
        self.board
    }
}

impl<B: Board, const N: usize> core::fmt::Debug for Dotstar<'_, B, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dotstar")
            .field("pins", &self.pins())
            .field("selection", &self.selection)
            .field("len", &self.len())
            .field("brightness", &self.brightness)
            .finish_non_exhaustive()
    }
}

impl<'a, 'r, B: Board, const N: usize> IntoIterator for &'a Dotstar<'r, B, N> {
    type Item = &'a Pixel;
    type IntoIter = core::slice::Iter<'a, Pixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
