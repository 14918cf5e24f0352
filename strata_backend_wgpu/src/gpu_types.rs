// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer layouts shared with the WGSL in [`crate::shaders`], and the CPU
//! side packing into them.

use bytemuck::{Pod, Zeroable};
use kurbo::Point;
use strata_core::paint::Gradient;
use strata_core::transform::Transform3d;
use strata_render::node::{DrawTargetNode, NodePaint};
use strata_render::plan::PresentParams;
use strata_render::surface::SurfaceSize;

use crate::shaders::{KIND_IMAGE, KIND_LINEAR, KIND_RADIAL, KIND_SOLID};

/// Texels in a gradient ramp.
pub(crate) const RAMP_WIDTH: u32 = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct Vertex {
    pub(crate) pos: [f32; 2],
    pub(crate) uv: [f32; 2],
}

impl Vertex {
    pub(crate) const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-draw constants of the node pass.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DrawUniforms {
    /// Path space to clip space, column-major.
    pub(crate) transform: [f32; 16],
    /// Premultiplied solid color, opacity applied.
    pub(crate) color: [f32; 4],
    /// Linear: start and end. Radial: center and radius.
    pub(crate) gradient: [f32; 4],
    pub(crate) kind: u32,
    pub(crate) opacity: f32,
    pub(crate) _pad: [f32; 2],
}

impl DrawUniforms {
    /// Constants for drawing `node` under `projection`.
    pub(crate) fn for_node(node: &DrawTargetNode, projection: Transform3d) -> Self {
        let (kind, color, gradient) = match &node.paint {
            NodePaint::Solid(color) => (
                KIND_SOLID,
                color.with_alpha_factor(node.opacity).premultiplied(),
                [0.0; 4],
            ),
            NodePaint::Gradient(gradient) => {
                let kind = match gradient {
                    Gradient::Linear { .. } => KIND_LINEAR,
                    Gradient::Radial { .. } => KIND_RADIAL,
                };
                (kind, [0.0; 4], gradient_params(gradient))
            }
            NodePaint::Image(_) => (KIND_IMAGE, [0.0; 4], [0.0; 4]),
        };
        Self {
            transform: (projection * node.transform).to_cols_f32(),
            color,
            gradient,
            kind,
            opacity: node.opacity.clamp(0.0, 1.0),
            _pad: [0.0; 2],
        }
    }

    /// Constants for writing clip triangles, which are already in
    /// compositing space.
    pub(crate) fn for_clip(projection: Transform3d) -> Self {
        Self {
            transform: projection.to_cols_f32(),
            color: [0.0; 4],
            gradient: [0.0; 4],
            kind: KIND_SOLID,
            opacity: 1.0,
            _pad: [0.0; 2],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct BlendUniforms {
    pub(crate) mode: u32,
    pub(crate) _pad: [u32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct PresentUniforms {
    /// Normalized `[x0, y0, x1, y1]`.
    pub(crate) clip: [f32; 4],
    pub(crate) size: [f32; 2],
    pub(crate) opacity: f32,
    pub(crate) flip_y: u32,
}

impl PresentUniforms {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU uniforms are single precision"
    )]
    pub(crate) fn new(params: &PresentParams, size: SurfaceSize) -> Self {
        let c = params.clip;
        Self {
            clip: [c.x0 as f32, c.y0 as f32, c.x1 as f32, c.y1 as f32],
            size: [size.width as f32, size.height as f32],
            opacity: params.opacity.clamp(0.0, 1.0),
            flip_y: u32::from(params.flip_y),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "GPU uniforms are single precision"
)]
fn gradient_params(gradient: &Gradient) -> [f32; 4] {
    match gradient {
        Gradient::Linear { start, end, .. } => [start.x as f32, start.y as f32, end.x as f32, end.y as f32],
        Gradient::Radial { center, radius, .. } => [center.x as f32, center.y as f32, *radius as f32, 0.0],
    }
}

/// Packs positions and optional texture coordinates into vertices.
///
/// Coordinates are only used when there is exactly one per position.
#[expect(
    clippy::cast_possible_truncation,
    reason = "vertex positions are single precision"
)]
pub(crate) fn pack_vertices(positions: &[Point], uvs: &[[f32; 2]]) -> Vec<Vertex> {
    let textured = uvs.len() == positions.len();
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| Vertex {
            pos: [p.x as f32, p.y as f32],
            uv: if textured { uvs[i] } else { [0.0; 2] },
        })
        .collect()
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to the u8 range"
)]
fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Samples a gradient into a premultiplied RGBA8 ramp of [`RAMP_WIDTH`]
/// texels; texel 0 is offset 0 and the last texel offset 1.
pub(crate) fn gradient_ramp(gradient: &Gradient) -> Vec<u8> {
    let last = (RAMP_WIDTH - 1) as f32;
    (0..RAMP_WIDTH)
        .flat_map(|i| {
            gradient
                .color_at(i as f32 / last)
                .premultiplied()
                .map(unorm8)
        })
        .collect()
}

/// Premultiplies straight-alpha RGBA8 pixels in place.
pub(crate) fn premultiply_rgba8(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = f32::from(px[3]) / 255.0;
        for c in &mut px[..3] {
            *c = unorm8(f32::from(*c) / 255.0 * a);
        }
    }
}

/// Converts premultiplied RGBA8 pixels to straight alpha in place.
pub(crate) fn unpremultiply_rgba8(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = f32::from(px[3]) / 255.0;
        if a <= 0.0 {
            px.fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = unorm8(f32::from(*c) / 255.0 / a);
        }
    }
}

/// Bytes per row of a buffer receiving a texture copy of `width` RGBA8
/// texels.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use kurbo::Affine;
    use strata_core::paint::{Color, GradientStop};

    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(size_of::<Vertex>(), 16);
        assert_eq!(size_of::<DrawUniforms>(), 112);
        assert_eq!(size_of::<BlendUniforms>(), 16);
        assert_eq!(size_of::<PresentUniforms>(), 32);
    }

    #[test]
    fn solid_node_is_premultiplied_with_opacity() {
        let node = DrawTargetNode {
            paint: NodePaint::Solid(Color::rgba(1.0, 0.5, 0.0, 1.0)),
            opacity: 0.5,
            transform: Transform3d::from_affine(Affine::translate((2.0, 3.0))),
            ..Default::default()
        };
        let u = DrawUniforms::for_node(&node, Transform3d::IDENTITY);
        assert_eq!(u.kind, KIND_SOLID);
        assert_eq!(u.color, [0.5, 0.25, 0.0, 0.5]);
        assert_eq!(&u.transform[12..], &[2.0, 3.0, 0.0, 1.0]);
    }

    #[test]
    fn gradient_nodes_carry_geometry() {
        let stops = vec![GradientStop::new(0.0, Color::BLACK), GradientStop::new(1.0, Color::WHITE)];
        let linear = Gradient::Linear {
            start: Point::new(1.0, 2.0),
            end: Point::new(3.0, 4.0),
            stops: stops.clone(),
        };
        let radial = Gradient::Radial {
            center: Point::new(5.0, 6.0),
            radius: 7.0,
            stops,
        };
        let node = |g: Gradient| DrawTargetNode {
            paint: NodePaint::Gradient(g),
            ..Default::default()
        };
        let u = DrawUniforms::for_node(&node(linear), Transform3d::IDENTITY);
        assert_eq!((u.kind, u.gradient), (KIND_LINEAR, [1.0, 2.0, 3.0, 4.0]));
        let u = DrawUniforms::for_node(&node(radial), Transform3d::IDENTITY);
        assert_eq!((u.kind, u.gradient), (KIND_RADIAL, [5.0, 6.0, 7.0, 0.0]));
    }

    #[test]
    fn ramp_endpoints_match_stops() {
        let gradient = Gradient::Linear {
            start: Point::ZERO,
            end: Point::new(1.0, 0.0),
            stops: vec![
                GradientStop::new(0.0, Color::rgba(1.0, 0.0, 0.0, 1.0)),
                GradientStop::new(1.0, Color::rgba(0.0, 0.0, 1.0, 0.5)),
            ],
        };
        let ramp = gradient_ramp(&gradient);
        assert_eq!(ramp.len(), RAMP_WIDTH as usize * 4);
        assert_eq!(&ramp[..4], &[255, 0, 0, 255]);
        assert_eq!(&ramp[ramp.len() - 4..], &[0, 0, 128, 128]);
    }

    #[test]
    fn premultiply_and_back() {
        let mut px = [255, 128, 0, 128, 10, 20, 30, 0];
        premultiply_rgba8(&mut px);
        assert_eq!(px, [128, 64, 0, 128, 0, 0, 0, 0]);
        unpremultiply_rgba8(&mut px);
        let expected = [255, 128, 0, 128];
        assert!(
            px[..4].iter().zip(expected).all(|(&a, e)| a.abs_diff(e) <= 1),
            "{px:?}"
        );
        assert_eq!(&px[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn rows_are_padded_for_copies() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn uvs_are_used_only_when_complete() {
        let positions = [Point::new(1.0, 2.0), Point::new(3.0, 4.0)];
        let packed = pack_vertices(&positions, &[[0.5, 1.0], [1.0, 0.0]]);
        assert_eq!(packed[1], Vertex { pos: [3.0, 4.0], uv: [1.0, 0.0] });
        let packed = pack_vertices(&positions, &[[0.5, 1.0]]);
        assert!(packed.iter().all(|v| v.uv == [0.0; 2]), "{packed:?}");
    }
}
