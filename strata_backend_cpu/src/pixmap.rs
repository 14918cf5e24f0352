// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers: premultiplied color surfaces and the clip stencil.

use core::fmt;

/// A premultiplied RGBA pixel.
pub type Rgba = [f32; 4];

/// A fully transparent pixel.
pub const TRANSPARENT: Rgba = [0.0; 4];

/// A `width × height` buffer of premultiplied RGBA `f32` pixels, row 0 at
/// the top.
#[derive(Clone, PartialEq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<Rgba>,
}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Pixmap {
    /// Creates a transparent pixmap.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![TRANSPARENT; width as usize * height as usize],
        }
    }

    /// Creates a pixmap from straight-alpha RGBA8 bytes, row-major.
    ///
    /// Returns `None` when `bytes` is not `width * height * 4` long.
    #[must_use]
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return None;
        }
        let data = bytes
            .chunks_exact(4)
            .map(|px| {
                let a = f32::from(px[3]) / 255.0;
                [
                    f32::from(px[0]) / 255.0 * a,
                    f32::from(px[1]) / 255.0 * a,
                    f32::from(px[2]) / 255.0 * a,
                    a,
                ]
            })
            .collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sets every pixel to `color`.
    pub fn fill(&mut self, color: Rgba) {
        self.data.fill(color);
    }

    /// Sets every pixel to transparent.
    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    /// The pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.data[self.offset(x, y)]
    }

    /// Overwrites the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let i = self.offset(x, y);
        self.data[i] = color;
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn data(&self) -> &[Rgba] {
        &self.data
    }

    /// Mutable access to all pixels, row-major.
    pub fn data_mut(&mut self) -> &mut [Rgba] {
        &mut self.data
    }

    /// Converts to straight-alpha RGBA8 bytes, row-major.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "channels are clamped to [0, 255] before the cast"
    )]
    pub fn to_rgba8(&self) -> Vec<u8> {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut out = Vec::with_capacity(self.data.len() * 4);
        for &[r, g, b, a] in &self.data {
            if a <= 0.0 {
                out.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                out.extend_from_slice(&[quantize(r / a), quantize(g / a), quantize(b / a), quantize(a)]);
            }
        }
        out
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} pixmap",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

/// One stencil bit per pixel, marking where the current clip lets draws
/// through.
#[derive(Clone, PartialEq, Eq)]
pub struct Stencil {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl fmt::Debug for Stencil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stencil")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("set", &self.count())
            .finish()
    }
}

impl Stencil {
    /// Creates a cleared stencil.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.bits.fill(false);
    }

    /// Sets the bit at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32) {
        let i = y as usize * self.width as usize + x as usize;
        self.bits[i] = true;
    }

    /// Whether the bit at `(x, y)` is set.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_premultiplies_and_back() {
        let pm = Pixmap::from_rgba8(2, 1, &[255, 0, 0, 255, 255, 255, 255, 0]).unwrap();
        assert_eq!(pm.pixel(0, 0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(pm.pixel(1, 0), TRANSPARENT);
        assert_eq!(pm.to_rgba8(), [255, 0, 0, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn rgba8_length_is_checked() {
        assert!(Pixmap::from_rgba8(2, 2, &[0; 15]).is_none());
    }

    #[test]
    fn half_alpha_round_trips() {
        let mut pm = Pixmap::new(1, 1);
        pm.set_pixel(0, 0, [0.25, 0.0, 0.5, 0.5]);
        assert_eq!(pm.to_rgba8(), [128, 0, 255, 128]);
    }

    #[test]
    #[should_panic(expected = "outside 2x2 pixmap")]
    fn out_of_bounds_panics() {
        let _ = Pixmap::new(2, 2).pixel(2, 0);
    }

    #[test]
    fn stencil_bits() {
        let mut s = Stencil::new(3, 3);
        s.set(1, 2);
        assert!(s.get(1, 2));
        assert!(!s.get(2, 1));
        assert_eq!(s.count(), 1);
        s.clear();
        assert_eq!(s.count(), 0);
    }
}
