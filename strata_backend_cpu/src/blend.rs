// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pixel blending of premultiplied colors.
//!
//! [`apply_native`] evaluates the fixed-function state a GPU would use for
//! natively blendable modes. [`composite`] is the compositing pass: the W3C
//! Compositing and Blending formulas for every mode, with source-over
//! alpha compositing.

use strata_core::paint::{BlendComponent, BlendFactor, BlendMode, BlendOperation, NativeBlend};

use crate::pixmap::Rgba;

/// `src` over `dst`.
#[must_use]
pub fn source_over(src: Rgba, dst: Rgba) -> Rgba {
    let inv = 1.0 - src[3];
    core::array::from_fn(|i| src[i] + dst[i] * inv)
}

/// Evaluates fixed-function blend state, clamping the result.
#[must_use]
pub fn apply_native(blend: &NativeBlend, src: Rgba, dst: Rgba) -> Rgba {
    core::array::from_fn(|i| {
        let component = if i < 3 { &blend.color } else { &blend.alpha };
        evaluate(component, src, dst, i).clamp(0.0, 1.0)
    })
}

fn factor(factor: BlendFactor, src: Rgba, dst: Rgba, i: usize) -> f32 {
    match factor {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::Src => src[i],
        BlendFactor::OneMinusSrc => 1.0 - src[i],
        BlendFactor::SrcAlpha => src[3],
        BlendFactor::OneMinusSrcAlpha => 1.0 - src[3],
        BlendFactor::Dst => dst[i],
        BlendFactor::OneMinusDst => 1.0 - dst[i],
        BlendFactor::DstAlpha => dst[3],
        BlendFactor::OneMinusDstAlpha => 1.0 - dst[3],
    }
}

fn evaluate(component: &BlendComponent, src: Rgba, dst: Rgba, i: usize) -> f32 {
    let (s, d) = (src[i], dst[i]);
    let sf = factor(component.src_factor, src, dst, i);
    let df = factor(component.dst_factor, src, dst, i);
    match component.operation {
        BlendOperation::Add => s * sf + d * df,
        BlendOperation::ReverseSubtract => d * df - s * sf,
        BlendOperation::Min => s.min(d),
        BlendOperation::Max => s.max(d),
    }
}

/// Composites `src` onto `backdrop` with `mode`.
///
/// Both colors are premultiplied. Where `src` is transparent the backdrop is
/// returned unchanged.
#[must_use]
pub fn composite(mode: BlendMode, src: Rgba, backdrop: Rgba) -> Rgba {
    let (sa, ba) = (src[3], backdrop[3]);
    if sa <= 0.0 {
        return backdrop;
    }
    let mixed = mix(mode, unpremultiply(backdrop), unpremultiply(src));
    let alpha = sa + ba - sa * ba;
    core::array::from_fn(|i| {
        let v = if i < 3 {
            src[i] * (1.0 - ba) + backdrop[i] * (1.0 - sa) + sa * ba * mixed[i]
        } else {
            alpha
        };
        v.clamp(0.0, 1.0)
    })
}

fn unpremultiply(c: Rgba) -> [f32; 3] {
    if c[3] <= 0.0 {
        return [0.0; 3];
    }
    [c[0] / c[3], c[1] / c[3], c[2] / c[3]]
}

/// The blend function `B(Cb, Cs)` on straight colors.
fn mix(mode: BlendMode, cb: [f32; 3], cs: [f32; 3]) -> [f32; 3] {
    match mode {
        BlendMode::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
        BlendMode::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
        BlendMode::Color => set_lum(cs, lum(cb)),
        BlendMode::Luminosity => set_lum(cb, lum(cs)),
        _ => core::array::from_fn(|i| separable(mode, cb[i], cs[i])),
    }
}

fn separable(mode: BlendMode, cb: f32, cs: f32) -> f32 {
    match mode {
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => screen(cb, cs),
        BlendMode::Overlay => hard_light(cs, cb),
        BlendMode::Darken => cb.min(cs),
        BlendMode::Lighten => cb.max(cs),
        BlendMode::ColorDodge => {
            if cb <= 0.0 {
                0.0
            } else if cs >= 1.0 {
                1.0
            } else {
                (cb / (1.0 - cs)).min(1.0)
            }
        }
        BlendMode::ColorBurn => {
            if cb >= 1.0 {
                1.0
            } else if cs <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - cb) / cs).min(1.0)
            }
        }
        BlendMode::HardLight => hard_light(cb, cs),
        BlendMode::SoftLight => soft_light(cb, cs),
        BlendMode::Difference => (cb - cs).abs(),
        BlendMode::Exclusion => cb + cs - 2.0 * cb * cs,
        BlendMode::SrcOver
        | BlendMode::Hue
        | BlendMode::Saturation
        | BlendMode::Color
        | BlendMode::Luminosity => cs,
    }
}

fn screen(cb: f32, cs: f32) -> f32 {
    cb + cs - cb * cs
}

fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

fn soft_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (d - cb)
    }
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut c = c;
    if n < 0.0 && l > n {
        c = c.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x > l {
        c = c.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    c
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut order = [0_usize, 1, 2];
    order.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let [min, mid, max] = order;
    let mut out = [0.0; 3];
    if c[max] > c[min] {
        out[mid] = (c[mid] - c[min]) * s / (c[max] - c[min]);
        out[max] = s;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgba, b: Rgba) {
        assert!(
            a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5),
            "{a:?} != {b:?}"
        );
    }

    const OPAQUE_SRC: Rgba = [0.2, 0.6, 0.8, 1.0];
    const OPAQUE_DST: Rgba = [0.5, 0.3, 0.9, 1.0];

    #[test]
    fn half_transparent_over_opaque() {
        let src = [0.5, 0.0, 0.0, 0.5];
        let dst = [0.0, 0.0, 1.0, 1.0];
        assert_close(source_over(src, dst), [0.5, 0.0, 0.5, 1.0]);
        let native = BlendMode::SrcOver.native_blend().unwrap();
        assert_close(apply_native(&native, src, dst), [0.5, 0.0, 0.5, 1.0]);
        assert_close(composite(BlendMode::SrcOver, src, dst), [0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn native_state_matches_formulas_on_opaque_colors() {
        for mode in [BlendMode::Multiply, BlendMode::Darken, BlendMode::Lighten] {
            let native = mode.native_blend().unwrap();
            assert_close(
                apply_native(&native, OPAQUE_SRC, OPAQUE_DST),
                composite(mode, OPAQUE_SRC, OPAQUE_DST),
            );
        }
        // Reverse subtraction matches while the backdrop is brighter.
        let native = BlendMode::Difference.native_blend().unwrap();
        let src = [0.1, 0.2, 0.3, 1.0];
        assert_close(
            apply_native(&native, src, OPAQUE_DST),
            composite(BlendMode::Difference, src, OPAQUE_DST),
        );
    }

    #[test]
    fn transparent_source_keeps_backdrop() {
        for mode in BlendMode::ALL {
            assert_eq!(composite(mode, [0.0; 4], OPAQUE_DST), OPAQUE_DST, "{mode:?}");
        }
    }

    #[test]
    fn transparent_backdrop_takes_source() {
        let src = [0.1, 0.2, 0.3, 0.5];
        for mode in BlendMode::ALL {
            assert_close(composite(mode, src, [0.0; 4]), src);
        }
    }

    #[test]
    fn separable_modes() {
        let gray = |v: f32| [v, v, v, 1.0];
        assert_close(composite(BlendMode::Screen, gray(0.5), gray(0.5)), gray(0.75));
        assert_close(composite(BlendMode::Overlay, gray(0.5), gray(0.25)), gray(0.25));
        assert_close(composite(BlendMode::HardLight, gray(0.25), gray(0.5)), gray(0.25));
        assert_close(composite(BlendMode::SoftLight, gray(0.5), gray(0.3)), gray(0.3));
        assert_close(composite(BlendMode::Exclusion, gray(1.0), gray(0.25)), gray(0.75));
        assert_close(composite(BlendMode::ColorDodge, gray(0.5), gray(0.25)), gray(0.5));
        assert_close(composite(BlendMode::ColorDodge, gray(1.0), gray(0.25)), gray(1.0));
        assert_close(composite(BlendMode::ColorBurn, gray(0.5), gray(0.75)), gray(0.5));
        assert_close(composite(BlendMode::ColorBurn, gray(0.0), gray(0.75)), gray(0.0));
    }

    #[test]
    fn luminosity_takes_source_luminance() {
        let red = [1.0, 0.0, 0.0, 1.0];
        let out = composite(BlendMode::Luminosity, [0.5, 0.5, 0.5, 1.0], red);
        assert!((lum([out[0], out[1], out[2]]) - 0.5).abs() < 1e-5, "{out:?}");
        assert!(out[0] > out[1] && (out[1] - out[2]).abs() < 1e-6, "{out:?}");
    }

    #[test]
    fn hue_and_color_keep_backdrop_luminance() {
        let backdrop = [0.2, 0.4, 0.6, 1.0];
        let src = [0.9, 0.1, 0.1, 1.0];
        for mode in [BlendMode::Hue, BlendMode::Color, BlendMode::Saturation] {
            let out = composite(mode, src, backdrop);
            let l = lum([out[0], out[1], out[2]]);
            assert!((l - lum([0.2, 0.4, 0.6])).abs() < 1e-5, "{mode:?}: {out:?}");
        }
    }

    #[test]
    fn saturation_of_gray_source_desaturates() {
        let out = composite(BlendMode::Saturation, [0.5, 0.5, 0.5, 1.0], [0.2, 0.4, 0.6, 1.0]);
        assert!((out[0] - out[1]).abs() < 1e-6 && (out[1] - out[2]).abs() < 1e-6, "{out:?}");
    }
}
