//! Fixed-length pixel storage.

use crate::color::{Color, Pixel};
use crate::error::{ConfigError, IndexError};

/// Ordered, fixed-length sequence of [`Pixel`]s.
///
/// Backed by a `heapless::Vec` with compile-time capacity `N`; the runtime
/// length is chosen at construction and never changes afterwards. Every
/// slot always holds a valid pixel, starting at [`Pixel::OFF`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<const N: usize> {
    pixels: heapless::Vec<Pixel, N>,
}

impl<const N: usize> PixelBuffer<N> {
    /// A buffer of `len` pixels, all [`Pixel::OFF`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroPixels`] for `len == 0`,
    /// [`ConfigError::TooManyPixels`] for `len > N`.
    pub fn new(len: usize) -> Result<Self, ConfigError> {
        if len == 0 {
            return Err(ConfigError::ZeroPixels);
        }
        let too_many = ConfigError::TooManyPixels {
            requested: len,
            capacity: N,
        };
        if len > N {
            return Err(too_many);
        }
        let mut pixels = heapless::Vec::new();
        pixels.resize(len, Pixel::OFF).map_err(|_| too_many)?;
        Ok(Self { pixels })
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always `false`: a buffer holds at least one pixel.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Read one pixel.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn get(&self, index: usize) -> Result<Pixel, IndexError> {
        self.pixels.get(index).copied().ok_or(IndexError {
            index,
            len: self.len(),
        })
    }

    /// Mutate one pixel in place.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn update(&mut self, index: usize, f: impl FnOnce(&mut Pixel)) -> Result<(), IndexError> {
        let len = self.len();
        let pixel = self.pixels.get_mut(index).ok_or(IndexError { index, len })?;
        f(pixel);
        Ok(())
    }

    /// Overwrite one pixel.
    ///
    /// # Errors
    ///
    /// [`IndexError`] when `index >= len`.
    pub fn set(&mut self, index: usize, pixel: Pixel) -> Result<(), IndexError> {
        self.update(index, |p| *p = pixel)
    }

    /// Apply `f` to every pixel.
    pub fn for_each(&mut self, mut f: impl FnMut(&mut Pixel)) {
        self.pixels.iter_mut().for_each(|p| f(p));
    }

    /// Overwrite every pixel.
    pub fn fill(&mut self, pixel: Pixel) {
        self.for_each(|p| *p = pixel);
    }

    /// Overwrite the whole buffer from `pixels`, in strip order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::LengthMismatch`] unless `pixels.len() == self.len()`;
    /// the buffer is left untouched.
    pub fn assign(&mut self, pixels: &[Pixel]) -> Result<(), ConfigError> {
        self.check_len(pixels.len())?;
        for (slot, pixel) in self.pixels.iter_mut().zip(pixels) {
            *slot = *pixel;
        }
        Ok(())
    }

    /// Overwrite every pixel's color from `colors`, keeping brightness.
    ///
    /// # Errors
    ///
    /// [`ConfigError::LengthMismatch`] unless `colors.len() == self.len()`;
    /// the buffer is left untouched.
    pub fn assign_colors(&mut self, colors: &[Color]) -> Result<(), ConfigError> {
        self.check_len(colors.len())?;
        for (slot, color) in self.pixels.iter_mut().zip(colors) {
            slot.set_color(*color);
        }
        Ok(())
    }

    /// Copy `other` over this buffer.
    ///
    /// # Errors
    ///
    /// [`ConfigError::LengthMismatch`] when the lengths differ.
    pub fn copy_from(&mut self, other: &Self) -> Result<(), ConfigError> {
        self.assign(other.as_slice())
    }

    fn check_len(&self, found: usize) -> Result<(), ConfigError> {
        if found == self.len() {
            Ok(())
        } else {
            Err(ConfigError::LengthMismatch {
                expected: self.len(),
                found,
            })
        }
    }

    /// Mean color across the strip.
    #[allow(clippy::cast_precision_loss)] // pixel counts are tiny
    pub fn average_color(&self) -> Color {
        let (r, g, b) = self.pixels.iter().fold((0.0f32, 0.0f32, 0.0f32), |acc, p| {
            (
                acc.0 + p.red().get(),
                acc.1 + p.green().get(),
                acc.2 + p.blue().get(),
            )
        });
        let n = self.len().max(1) as f32;
        Color::new(r / n, g / n, b / n)
    }

    /// Borrow the pixels in strip order.
    pub fn as_slice(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Iterate pixels in strip order.
    pub fn iter(&self) -> core::slice::Iter<'_, Pixel> {
        self.pixels.iter()
    }
}

impl<'a, const N: usize> IntoIterator for &'a PixelBuffer<N> {
    type Item = &'a Pixel;
    type IntoIter = core::slice::Iter<'a, Pixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::color::Level;

    #[test]
    fn new_rejects_zero_and_over_capacity() {
        assert_eq!(PixelBuffer::<8>::new(0), Err(ConfigError::ZeroPixels));
        assert_eq!(
            PixelBuffer::<8>::new(9),
            Err(ConfigError::TooManyPixels {
                requested: 9,
                capacity: 8
            })
        );
    }

    #[test]
    fn assign_replaces_every_pixel_or_nothing() {
        let mut buf = PixelBuffer::<8>::new(3).unwrap();
        let pixels = [
            Pixel::new(Color::RED, 1.0),
            Pixel::new(Color::GREEN, 0.5),
            Pixel::new(Color::BLUE, 0.0),
        ];
        assert_eq!(
            buf.assign(&pixels[..2]),
            Err(ConfigError::LengthMismatch {
                expected: 3,
                found: 2
            })
        );
        assert!(buf.iter().all(|p| *p == Pixel::OFF));
        buf.assign(&pixels).unwrap();
        assert_eq!(buf.as_slice(), &pixels);

        assert_eq!(
            buf.assign_colors(&[Color::BLACK; 4]),
            Err(ConfigError::LengthMismatch {
                expected: 3,
                found: 4
            })
        );
        buf.assign_colors(&[Color::BLUE, Color::RED, Color::GREEN])
            .unwrap();
        assert_eq!(buf.get(0).unwrap().color(), Color::BLUE);
        assert_eq!(buf.get(1).unwrap().brightness(), Level::new(0.5));
    }

    #[test]
    fn new_fills_with_off_pixels() {
        let buf = PixelBuffer::<8>::new(5).unwrap();
        assert_eq!(buf.len(), 5);
        assert!(buf.iter().all(|p| *p == Pixel::OFF));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut buf = PixelBuffer::<8>::new(3).unwrap();
        assert_eq!(buf.get(3), Err(IndexError { index: 3, len: 3 }));
        assert_eq!(
            buf.set(7, Pixel::OFF),
            Err(IndexError { index: 7, len: 3 })
        );
        assert!(buf.set(2, Pixel::new(Color::RED, 1.0)).is_ok());
        assert_eq!(buf.get(2).unwrap().color(), Color::RED);
    }

    #[test]
    fn average_color_is_channel_mean() {
        let mut buf = PixelBuffer::<4>::new(2).unwrap();
        buf.set(0, Pixel::new(Color::RED, 1.0)).unwrap();
        buf.set(1, Pixel::new(Color::BLUE, 1.0)).unwrap();
        assert_eq!(buf.average_color(), Color::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn copy_from_requires_same_length() {
        let mut a = PixelBuffer::<4>::new(2).unwrap();
        let b = PixelBuffer::<4>::new(3).unwrap();
        assert_eq!(
            a.copy_from(&b),
            Err(ConfigError::LengthMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}
