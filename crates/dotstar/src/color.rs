//! Pixel color and brightness model.
//!
//! Every channel is a [`Level`]: a normalized intensity in `[0.0, 1.0]`.
//! Out-of-range input is **clamped**, never rejected, and `NaN` becomes
//! `0.0`. All setters in the crate route through [`Level::new`], so
//! whole-strip and per-pixel assignment share one policy.

/// Normalized intensity, clamped to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Level(f32);

impl Level {
    /// Fully off.
    pub const ZERO: Self = Self(0.0);
    /// Fully on.
    pub const FULL: Self = Self(1.0);

    /// Clamp `value` into `[0.0, 1.0]`; `NaN` maps to `0.0`.
    #[must_use]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// The clamped value.
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }

    /// 8-bit wire value, truncating: `trunc(255 * level)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // in 0.0..=255.0
    pub fn to_u8(self) -> u8 {
        (self.0 * 255.0) as u8
    }

    /// 5-bit global-brightness value, truncating: `trunc(31 * level)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // in 0.0..=31.0
    pub fn to_5bit(self) -> u8 {
        ((self.0 * 31.0) as u8) & 0x1F
    }
}

impl From<f32> for Level {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// Logical red/green/blue triple.
///
/// Memory order is RGB; the wire order is BGR (see [`crate::frame`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    /// Red channel.
    pub red: Level,
    /// Green channel.
    pub green: Level,
    /// Blue channel.
    pub blue: Level,
}

impl Color {
    /// All channels off.
    pub const BLACK: Self = Self::splat(Level::ZERO);
    /// All channels full.
    pub const WHITE: Self = Self::splat(Level::FULL);
    /// Pure red.
    pub const RED: Self = Self {
        red: Level::FULL,
        green: Level::ZERO,
        blue: Level::ZERO,
    };
    /// Pure green.
    pub const GREEN: Self = Self {
        red: Level::ZERO,
        green: Level::FULL,
        blue: Level::ZERO,
    };
    /// Pure blue.
    pub const BLUE: Self = Self {
        red: Level::ZERO,
        green: Level::ZERO,
        blue: Level::FULL,
    };

    /// Build from raw channel values, clamping each.
    #[must_use]
    pub fn new(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red: Level::new(red),
            green: Level::new(green),
            blue: Level::new(blue),
        }
    }

    const fn splat(level: Level) -> Self {
        Self {
            red: level,
            green: level,
            blue: level,
        }
    }
}

impl From<(f32, f32, f32)> for Color {
    fn from((red, green, blue): (f32, f32, f32)) -> Self {
        Self::new(red, green, blue)
    }
}

/// One LED: color plus its own 5-bit global brightness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pixel {
    color: Color,
    brightness: Level,
}

impl Pixel {
    /// `(0, 0, 0)` at brightness `0`.
    pub const OFF: Self = Self {
        color: Color::BLACK,
        brightness: Level::ZERO,
    };

    /// Build a pixel, clamping every value.
    #[must_use]
    pub fn new(color: impl Into<Color>, brightness: f32) -> Self {
        Self {
            color: color.into(),
            brightness: Level::new(brightness),
        }
    }

    /// Red channel.
    pub fn red(&self) -> Level {
        self.color.red
    }

    /// Green channel.
    pub fn green(&self) -> Level {
        self.color.green
    }

    /// Blue channel.
    pub fn blue(&self) -> Level {
        self.color.blue
    }

    /// Color triple.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Global brightness.
    pub fn brightness(&self) -> Level {
        self.brightness
    }

    /// Replace the color, keeping brightness.
    pub fn set_color(&mut self, color: impl Into<Color>) {
        self.color = color.into();
    }

    /// Replace the brightness, keeping color.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = Level::new(brightness);
    }

    /// White, keeping brightness.
    pub fn on(&mut self) {
        self.color = Color::WHITE;
    }

    /// Black, keeping brightness.
    pub fn off(&mut self) {
        self.color = Color::BLACK;
    }
}
