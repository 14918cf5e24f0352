// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint and blend descriptions.
//!
//! Colors are straight (non-premultiplied) RGBA in `[0, 1]`. Backends
//! composite in premultiplied space.

use alloc::vec::Vec;

use kurbo::Point;

use crate::stroke::StrokeStyle;

/// A straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from straight components.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from 8-bit straight components.
    #[must_use]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Creates a color from a packed `0xAARRGGBB` value, the runtime's
    /// native color encoding.
    #[must_use]
    pub fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self::from_rgba8(r, g, b, a)
    }

    /// Returns this color with alpha multiplied by `factor`.
    #[must_use]
    pub fn with_alpha_factor(self, factor: f32) -> Self {
        Self {
            a: self.a * factor,
            ..self
        }
    }

    /// Premultiplied `[r, g, b, a]`.
    #[must_use]
    pub fn premultiplied(self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }

    /// Linear interpolation between two colors in straight space.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// A color at a position along a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position in `[0, 1]`.
    pub offset: f32,
    /// Color at the position.
    pub color: Color,
}

impl GradientStop {
    /// Creates a stop.
    #[must_use]
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// A gradient in path space. Stops are in ascending offset order.
#[derive(Clone, Debug, PartialEq)]
pub enum Gradient {
    /// Varies along the line from `start` to `end`.
    Linear {
        /// Position of offset 0.
        start: Point,
        /// Position of offset 1.
        end: Point,
        /// Color stops.
        stops: Vec<GradientStop>,
    },
    /// Varies with distance from `center`.
    Radial {
        /// Position of offset 0.
        center: Point,
        /// Distance of offset 1.
        radius: f64,
        /// Color stops.
        stops: Vec<GradientStop>,
    },
}

impl Gradient {
    /// The gradient's stops.
    #[must_use]
    pub fn stops(&self) -> &[GradientStop] {
        match self {
            Self::Linear { stops, .. } | Self::Radial { stops, .. } => stops,
        }
    }

    /// Gradient parameter at `p` (in the gradient's own space), before
    /// clamping.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "gradient parameters are single precision"
    )]
    pub fn parameter_at(&self, p: Point) -> f32 {
        match self {
            Self::Linear { start, end, .. } => {
                let axis = *end - *start;
                let len2 = axis.hypot2();
                if len2 <= 0.0 {
                    return 0.0;
                }
                ((p - *start).dot(axis) / len2) as f32
            }
            Self::Radial { center, radius, .. } => {
                if *radius <= 0.0 {
                    return 1.0;
                }
                (p.distance(*center) / radius) as f32
            }
        }
    }

    /// Color at parameter `t`, clamped to the first and last stop.
    #[must_use]
    pub fn color_at(&self, t: f32) -> Color {
        let stops = self.stops();
        let Some(first) = stops.first() else {
            return Color::TRANSPARENT;
        };
        if t.is_nan() || t <= first.offset {
            return first.color;
        }
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                if span <= 0.0 {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.offset) / span);
            }
        }
        stops[stops.len() - 1].color
    }
}

/// Whether a paint fills or strokes its path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaintStyle {
    /// Fill the enclosed region.
    #[default]
    Fill,
    /// Stroke the outline.
    Stroke,
}

/// How to draw a path.
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    /// Fill or stroke.
    pub style: PaintStyle,
    /// Solid color, ignored when a gradient is set.
    pub color: Color,
    /// Optional gradient.
    pub gradient: Option<Gradient>,
    /// Stroke parameters, used when [`style`](Self::style) is
    /// [`PaintStyle::Stroke`].
    pub stroke: StrokeStyle,
    /// How the draw composites onto what is already there.
    pub blend_mode: BlendMode,
}

impl Default for Paint {
    fn default() -> Self {
        Self::fill(Color::BLACK)
    }
}

impl Paint {
    /// A solid fill.
    #[must_use]
    pub fn fill(color: Color) -> Self {
        Self {
            style: PaintStyle::Fill,
            color,
            gradient: None,
            stroke: StrokeStyle::default(),
            blend_mode: BlendMode::SrcOver,
        }
    }

    /// A solid stroke.
    #[must_use]
    pub fn stroke(color: Color, stroke: StrokeStyle) -> Self {
        Self {
            style: PaintStyle::Stroke,
            stroke,
            ..Self::fill(color)
        }
    }

    /// Returns this paint with a gradient.
    #[must_use]
    pub fn with_gradient(mut self, gradient: Gradient) -> Self {
        self.gradient = Some(gradient);
        self
    }

    /// Returns this paint with a blend mode.
    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Whether the paint cannot produce any pixels: a gradient without stops
    /// or a stroke without width.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.gradient.as_ref().is_some_and(|g| g.stops().is_empty()) {
            return true;
        }
        self.style == PaintStyle::Stroke && !(self.stroke.width > 0.0 && self.stroke.width.is_finite())
    }
}

/// Separable and non-separable blend modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source over destination.
    #[default]
    SrcOver,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken (component-wise minimum).
    Darken,
    /// Lighten (component-wise maximum).
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Hard light.
    HardLight,
    /// Soft light.
    SoftLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// Multiply.
    Multiply,
    /// Hue.
    Hue,
    /// Saturation.
    Saturation,
    /// Color.
    Color,
    /// Luminosity.
    Luminosity,
}

impl BlendMode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::SrcOver,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Multiply,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    /// Whether fixed-function blending can express the mode.
    #[must_use]
    pub const fn is_native(self) -> bool {
        self.native_blend().is_some()
    }

    /// Stable numeric code, used by shaders and trace records.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        if (code as usize) < Self::ALL.len() {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Fixed-function state for premultiplied colors, or `None` when the
    /// mode needs a compositing pass.
    #[must_use]
    pub const fn native_blend(self) -> Option<NativeBlend> {
        const OVER: BlendComponent = BlendComponent {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        };
        const fn unit(operation: BlendOperation) -> BlendComponent {
            BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::One,
                operation,
            }
        }
        let color = match self {
            Self::SrcOver => OVER,
            Self::Multiply => BlendComponent {
                src_factor: BlendFactor::Dst,
                dst_factor: BlendFactor::OneMinusSrcAlpha,
                operation: BlendOperation::Add,
            },
            Self::Darken => unit(BlendOperation::Min),
            Self::Lighten => unit(BlendOperation::Max),
            Self::Difference => unit(BlendOperation::ReverseSubtract),
            _ => return None,
        };
        Some(NativeBlend { color, alpha: OVER })
    }
}

/// A fixed-function blend factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 0.
    Zero,
    /// 1.
    One,
    /// Source color.
    Src,
    /// 1 - source color.
    OneMinusSrc,
    /// Source alpha.
    SrcAlpha,
    /// 1 - source alpha.
    OneMinusSrcAlpha,
    /// Destination color.
    Dst,
    /// 1 - destination color.
    OneMinusDst,
    /// Destination alpha.
    DstAlpha,
    /// 1 - destination alpha.
    OneMinusDstAlpha,
}

/// A fixed-function blend operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    /// `src * sf + dst * df`.
    Add,
    /// `dst * df - src * sf`.
    ReverseSubtract,
    /// `min(src, dst)`, factors ignored.
    Min,
    /// `max(src, dst)`, factors ignored.
    Max,
}

/// Factors and operation for one channel group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Factor applied to the source.
    pub src_factor: BlendFactor,
    /// Factor applied to the destination.
    pub dst_factor: BlendFactor,
    /// How the weighted terms combine.
    pub operation: BlendOperation,
}

/// Fixed-function blend state shared by every backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeBlend {
    /// Applies to RGB.
    pub color: BlendComponent,
    /// Applies to alpha.
    pub alpha: BlendComponent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_modes() {
        let native: Vec<_> = BlendMode::ALL.iter().filter(|m| m.is_native()).collect();
        assert_eq!(
            native,
            [
                &BlendMode::SrcOver,
                &BlendMode::Darken,
                &BlendMode::Lighten,
                &BlendMode::Difference,
                &BlendMode::Multiply,
            ]
        );
    }

    #[test]
    fn codes_round_trip() {
        for mode in BlendMode::ALL {
            assert_eq!(BlendMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(BlendMode::from_code(16), None);
    }

    #[test]
    fn argb_unpacks() {
        let c = Color::from_argb(0xFF_FF_80_00);
        assert_eq!(c.a, 1.0);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn premultiply() {
        assert_eq!(Color::rgba(1.0, 0.5, 0.0, 0.5).premultiplied(), [0.5, 0.25, 0.0, 0.5]);
    }

    #[test]
    fn linear_gradient_samples() {
        let g = Gradient::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            stops: alloc::vec![
                GradientStop::new(0.0, Color::BLACK),
                GradientStop::new(1.0, Color::WHITE),
            ],
        };
        assert_eq!(g.parameter_at(Point::new(5.0, 3.0)), 0.5);
        assert_eq!(g.color_at(0.5), Color::rgba(0.5, 0.5, 0.5, 1.0));
        assert_eq!(g.color_at(-1.0), Color::BLACK);
        assert_eq!(g.color_at(2.0), Color::WHITE);
    }

    #[test]
    fn radial_gradient_parameter() {
        let g = Gradient::Radial {
            center: Point::new(1.0, 1.0),
            radius: 4.0,
            stops: alloc::vec![GradientStop::new(0.0, Color::BLACK)],
        };
        assert_eq!(g.parameter_at(Point::new(1.0, 3.0)), 0.5);
        assert_eq!(g.color_at(0.7), Color::BLACK);
    }

    #[test]
    fn empty_paints() {
        assert!(!Paint::fill(Color::BLACK).is_empty());
        assert!(Paint::stroke(Color::BLACK, StrokeStyle::new(0.0)).is_empty());
        let no_stops = Gradient::Linear {
            start: Point::ORIGIN,
            end: Point::new(1.0, 0.0),
            stops: Vec::new(),
        };
        assert!(Paint::fill(Color::BLACK).with_gradient(no_stops).is_empty());
    }
}
