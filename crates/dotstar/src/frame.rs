//! APA102 frame encoding.
//!
//! # Wire Format
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────┬─────────────────────┐
//! │ start marker │ one 4-byte block per pixel       │ end marker          │
//! │ 4 × 0x00     │ 111b bbbb │ blue │ green │ red  │ ⌈n/16⌉ + 4 × 0xFF   │
//! └──────────────┴──────────────────────────────────┴─────────────────────┘
//! ```
//!
//! The top three bits of the brightness byte are always set; the low five
//! carry `trunc(31 × brightness)`. Color bytes are `trunc(255 × channel)`
//! sent blue, green, red.
//!
//! Each pixel delays the clock it forwards by half a cycle, so the last
//! pixel only latches after `⌈n/2⌉` further clock edges. The end marker
//! therefore scales with the pixel count: `⌈n/16⌉` bytes cover the latch,
//! and the 4-byte floor doubles as the SK9822 reset frame.
//!
//! Encoding is pure and allocation-free: [`encode`] returns a byte
//! iterator over a pixel slice, recomputed on every write.

use crate::color::Pixel;

/// Length of the all-zero start marker.
pub const START_FRAME_LEN: usize = 4;

/// Fixed high bits of every brightness byte.
pub const BRIGHTNESS_MARKER: u8 = 0b1110_0000;

/// Bytes per pixel block.
pub const PIXEL_BLOCK_LEN: usize = 4;

/// End marker floor, independent of pixel count.
pub const END_FRAME_MIN_LEN: usize = 4;

/// Start marker byte value.
pub const START_BYTE: u8 = 0x00;

/// End marker byte value.
pub const END_BYTE: u8 = 0xFF;

/// End marker length in bytes for `pixel_count` pixels.
pub const fn end_frame_len(pixel_count: usize) -> usize {
    pixel_count.div_ceil(16).saturating_add(END_FRAME_MIN_LEN)
}

/// End marker length in bits; always `>= ⌈pixel_count / 2⌉`.
pub const fn end_frame_bits(pixel_count: usize) -> usize {
    end_frame_len(pixel_count).saturating_mul(8)
}

/// Total frame length in bytes for `pixel_count` pixels.
pub const fn frame_len(pixel_count: usize) -> usize {
    START_FRAME_LEN
        .saturating_add(pixel_count.saturating_mul(PIXEL_BLOCK_LEN))
        .saturating_add(end_frame_len(pixel_count))
}

/// Wire block for one pixel: `[brightness, blue, green, red]`.
pub fn encode_pixel(pixel: &Pixel) -> [u8; PIXEL_BLOCK_LEN] {
    [
        BRIGHTNESS_MARKER | pixel.brightness().to_5bit(),
        pixel.blue().to_u8(),
        pixel.green().to_u8(),
        pixel.red().to_u8(),
    ]
}

/// Byte iterator over one complete frame.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pixels: &'a [Pixel],
    block: [u8; PIXEL_BLOCK_LEN],
    pos: usize,
    len: usize,
}

/// Encode `pixels` into a frame iterator.
pub fn encode(pixels: &[Pixel]) -> Frame<'_> {
    Frame {
        pixels,
        block: [0; PIXEL_BLOCK_LEN],
        pos: 0,
        len: frame_len(pixels.len()),
    }
}

impl Frame<'_> {
    /// Total frame length in bytes.
    pub fn byte_len(&self) -> usize {
        self.len
    }

    fn byte_at(&mut self, pos: usize) -> u8 {
        let Some(offset) = pos.checked_sub(START_FRAME_LEN) else {
            return START_BYTE;
        };
        let index = offset / PIXEL_BLOCK_LEN;
        let within = offset % PIXEL_BLOCK_LEN;
        match self.pixels.get(index) {
            Some(pixel) => {
                if within == 0 {
                    self.block = encode_pixel(pixel);
                }
                self.block.get(within).copied().unwrap_or(END_BYTE)
            }
            None => END_BYTE,
        }
    }
}

impl Iterator for Frame<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.pos >= self.len {
            return None;
        }
        let byte = self.byte_at(self.pos);
        self.pos = self.pos.saturating_add(1);
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frame<'_> {}

impl core::iter::FusedIterator for Frame<'_> {}

/// Output buffer too small for the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferTooSmall {
    /// Bytes the frame needs.
    pub needed: usize,
    /// Bytes the buffer offers.
    pub available: usize,
}

/// Encode `pixels` into `out`, returning the number of bytes written.
///
/// # Errors
///
/// [`BufferTooSmall`] if `out.len() < frame_len(pixels.len())`; `out` is
/// left untouched in that case.
pub fn encode_into(pixels: &[Pixel], out: &mut [u8]) -> Result<usize, BufferTooSmall> {
    let frame = encode(pixels);
    let needed = frame.byte_len();
    if out.len() < needed {
        return Err(BufferTooSmall {
            needed,
            available: out.len(),
        });
    }
    for (slot, byte) in out.iter_mut().zip(frame) {
        *slot = byte;
    }
    Ok(needed)
}
