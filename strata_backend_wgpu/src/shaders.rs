// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! WGSL sources.

/// Paint kinds understood by [`NODE_SHADER`].
pub(crate) const KIND_SOLID: u32 = 0;
pub(crate) const KIND_LINEAR: u32 = 1;
pub(crate) const KIND_RADIAL: u32 = 2;
pub(crate) const KIND_IMAGE: u32 = 3;

/// Draws node geometry. Also used, with color writes masked off, to write
/// clip triangles into the stencil.
pub(crate) const NODE_SHADER: &str = r#"
const KIND_SOLID: u32 = 0u;
const KIND_LINEAR: u32 = 1u;
const KIND_RADIAL: u32 = 2u;
const KIND_IMAGE: u32 = 3u;

struct Draw {
    transform: mat4x4<f32>,
    color: vec4<f32>,
    gradient: vec4<f32>,
    kind: u32,
    opacity: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> draw: Draw;
@group(0) @binding(1) var paint_texture: texture_2d<f32>;
@group(0) @binding(2) var paint_sampler: sampler;

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec2<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.position = draw.transform * vec4<f32>(pos, 0.0, 1.0);
    out.local = pos;
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    var t = 0.0;
    if draw.kind == KIND_LINEAR {
        let axis = draw.gradient.zw - draw.gradient.xy;
        t = dot(in.local - draw.gradient.xy, axis) / max(dot(axis, axis), 1e-12);
    } else if draw.kind == KIND_RADIAL {
        t = distance(in.local, draw.gradient.xy) / max(draw.gradient.z, 1e-12);
    }
    let coord = select(vec2<f32>(clamp(t, 0.0, 1.0), 0.5), in.uv, draw.kind == KIND_IMAGE);
    let texel = textureSample(paint_texture, paint_sampler, coord);
    if draw.kind == KIND_SOLID {
        return draw.color;
    }
    return texel * draw.opacity;
}
"#;

/// Full-screen compositing pass: `target = composite(mode, source, backdrop)`.
pub(crate) const BLEND_SHADER: &str = r#"
const MODE_SRC_OVER: u32 = 0u;
const MODE_SCREEN: u32 = 1u;
const MODE_OVERLAY: u32 = 2u;
const MODE_DARKEN: u32 = 3u;
const MODE_LIGHTEN: u32 = 4u;
const MODE_COLOR_DODGE: u32 = 5u;
const MODE_COLOR_BURN: u32 = 6u;
const MODE_HARD_LIGHT: u32 = 7u;
const MODE_SOFT_LIGHT: u32 = 8u;
const MODE_DIFFERENCE: u32 = 9u;
const MODE_EXCLUSION: u32 = 10u;
const MODE_MULTIPLY: u32 = 11u;
const MODE_HUE: u32 = 12u;
const MODE_SATURATION: u32 = 13u;
const MODE_COLOR: u32 = 14u;
const MODE_LUMINOSITY: u32 = 15u;

struct BlendParams {
    mode: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0) var source_texture: texture_2d<f32>;
@group(0) @binding(1) var backdrop_texture: texture_2d<f32>;
@group(0) @binding(2) var<uniform> params: BlendParams;

@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let corner = vec2<f32>(f32((i << 1u) & 2u), f32(i & 2u));
    return vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
}

fn screen(b: vec3<f32>, s: vec3<f32>) -> vec3<f32> {
    return b + s - b * s;
}

fn hard_light(b: vec3<f32>, s: vec3<f32>) -> vec3<f32> {
    return select(screen(b, 2.0 * s - 1.0), b * 2.0 * s, s <= vec3<f32>(0.5));
}

fn color_dodge(b: vec3<f32>, s: vec3<f32>) -> vec3<f32> {
    let r = min(vec3<f32>(1.0), b / max(1.0 - s, vec3<f32>(1e-6)));
    return select(select(r, vec3<f32>(1.0), s >= vec3<f32>(1.0)), vec3<f32>(0.0), b <= vec3<f32>(0.0));
}

fn color_burn(b: vec3<f32>, s: vec3<f32>) -> vec3<f32> {
    let r = 1.0 - min(vec3<f32>(1.0), (1.0 - b) / max(s, vec3<f32>(1e-6)));
    return select(select(r, vec3<f32>(0.0), s <= vec3<f32>(0.0)), vec3<f32>(1.0), b >= vec3<f32>(1.0));
}

fn soft_light(b: vec3<f32>, s: vec3<f32>) -> vec3<f32> {
    let d = select(sqrt(b), ((16.0 * b - 12.0) * b + 4.0) * b, b <= vec3<f32>(0.25));
    return select(b + (2.0 * s - 1.0) * (d - b), b - (1.0 - 2.0 * s) * b * (1.0 - b), s <= vec3<f32>(0.5));
}

fn lum(c: vec3<f32>) -> f32 {
    return dot(c, vec3<f32>(0.3, 0.59, 0.11));
}

fn clip_color(c_in: vec3<f32>) -> vec3<f32> {
    var c = c_in;
    let l = lum(c);
    let n = min(min(c.r, c.g), c.b);
    let x = max(max(c.r, c.g), c.b);
    if n < 0.0 && l > n {
        c = l + (c - l) * l / (l - n);
    }
    if x > 1.0 && x > l {
        c = l + (c - l) * (1.0 - l) / (x - l);
    }
    return c;
}

fn set_lum(c: vec3<f32>, l: f32) -> vec3<f32> {
    return clip_color(c + (l - lum(c)));
}

fn sat(c: vec3<f32>) -> f32 {
    return max(max(c.r, c.g), c.b) - min(min(c.r, c.g), c.b);
}

fn set_sat(c: vec3<f32>, s: f32) -> vec3<f32> {
    let hi = max(max(c.r, c.g), c.b);
    let lo = min(min(c.r, c.g), c.b);
    if hi <= lo {
        return vec3<f32>(0.0);
    }
    return (c - lo) * s / (hi - lo);
}

fn mix_colors(mode: u32, b: vec3<f32>, s: vec3<f32>) -> vec3<f32> {
    switch mode {
        case MODE_SCREEN: { return screen(b, s); }
        case MODE_OVERLAY: { return hard_light(s, b); }
        case MODE_DARKEN: { return min(b, s); }
        case MODE_LIGHTEN: { return max(b, s); }
        case MODE_COLOR_DODGE: { return color_dodge(b, s); }
        case MODE_COLOR_BURN: { return color_burn(b, s); }
        case MODE_HARD_LIGHT: { return hard_light(b, s); }
        case MODE_SOFT_LIGHT: { return soft_light(b, s); }
        case MODE_DIFFERENCE: { return abs(b - s); }
        case MODE_EXCLUSION: { return b + s - 2.0 * b * s; }
        case MODE_MULTIPLY: { return b * s; }
        case MODE_HUE: { return set_lum(set_sat(s, sat(b)), lum(b)); }
        case MODE_SATURATION: { return set_lum(set_sat(b, sat(s)), lum(b)); }
        case MODE_COLOR: { return set_lum(s, lum(b)); }
        case MODE_LUMINOSITY: { return set_lum(b, lum(s)); }
        default: { return s; }
    }
}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let coord = vec2<i32>(position.xy);
    let src = textureLoad(source_texture, coord, 0);
    let dst = textureLoad(backdrop_texture, coord, 0);
    if src.a <= 0.0 {
        return dst;
    }
    let cs = src.rgb / src.a;
    let cb = select(vec3<f32>(0.0), dst.rgb / max(dst.a, 1e-6), dst.a > 0.0);
    let mixed = mix_colors(params.mode, cb, cs);
    let rgb = src.rgb * (1.0 - dst.a) + dst.rgb * (1.0 - src.a) + src.a * dst.a * mixed;
    let a = src.a + dst.a - src.a * dst.a;
    return clamp(vec4<f32>(rgb, a), vec4<f32>(0.0), vec4<f32>(1.0));
}
"#;

/// Draws a surface to the output through the present clip rect.
pub(crate) const PRESENT_SHADER: &str = r#"
struct PresentParams {
    clip: vec4<f32>,
    size: vec2<f32>,
    opacity: f32,
    flip_y: u32,
};

@group(0) @binding(0) var source_texture: texture_2d<f32>;
@group(0) @binding(1) var<uniform> params: PresentParams;

@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let corner = vec2<f32>(f32((i << 1u) & 2u), f32(i & 2u));
    return vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let n = position.xy / params.size;
    if n.x < params.clip.x || n.x > params.clip.z || n.y < params.clip.y || n.y > params.clip.w {
        discard;
    }
    var row = position.y;
    if params.flip_y != 0u {
        row = params.size.y - position.y;
    }
    let texel = textureLoad(source_texture, vec2<i32>(vec2<f32>(position.x, row)), 0);
    return texel * params.opacity;
}
"#;
