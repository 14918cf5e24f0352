// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visitor protocol driven by the animation runtime.
//!
//! The runtime walks its scene once per frame and issues calls on a
//! [`Renderer`]. Calls arrive strictly in paint order and never re-enter:
//! the `&mut self` receivers enforce single-threaded use.
//!
//! Nothing recoverable is reported back. Implementations absorb invalid
//! input (stale paths, empty images) by logging and skipping the call.
//!
//! ```rust,ignore
//! renderer.save();
//! renderer.transform(Affine::translate((20.0, 20.0)));
//! renderer.clip_path(mask);
//! renderer.draw_path(shape, &Paint::fill(Color::WHITE));
//! renderer.restore();
//! ```

use kurbo::{Affine, Point};

use crate::paint::{BlendMode, Paint};
use crate::path::PathId;
use crate::resource::ResourceKey;

/// A decoded image owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Image {
    /// Backend texture the pixels live in.
    pub key: ResourceKey,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Image {
    /// Whether the image has no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Triangle mesh textured by an image, in path space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageMesh<'a> {
    /// Vertex positions.
    pub vertices: &'a [Point],
    /// Texture coordinates in `[0, 1]`, one per vertex.
    pub uvs: &'a [[f32; 2]],
    /// Triangle list indices into `vertices`.
    pub indices: &'a [u16],
}

impl ImageMesh<'_> {
    /// Whether the mesh draws nothing or is malformed: no triangles, a UV
    /// count that differs from the vertex count, or an out-of-range index.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.indices.len() < 3
            || self.uvs.len() != self.vertices.len()
            || self
                .indices
                .iter()
                .any(|&i| usize::from(i) >= self.vertices.len())
    }
}

/// Callbacks issued by the animation runtime, in paint order.
pub trait Renderer {
    /// Pushes a copy of the current transform, opacity and clip state.
    fn save(&mut self);

    /// Pops the state pushed by the matching [`save`](Self::save).
    ///
    /// Calling it without a matching save is a contract violation.
    fn restore(&mut self);

    /// Post-multiplies the current transform.
    fn transform(&mut self, transform: Affine);

    /// Multiplies the current opacity (layer opacity pushed by the runtime).
    fn modulate_opacity(&mut self, opacity: f32);

    /// Draws a path with a paint.
    fn draw_path(&mut self, path: PathId, paint: &Paint);

    /// Intersects the current clip with the filled region of a path.
    fn clip_path(&mut self, path: PathId);

    /// Draws an image as a `width × height` rectangle at the origin.
    fn draw_image(&mut self, image: &Image, blend_mode: BlendMode, opacity: f32);

    /// Draws an image through a triangle mesh.
    fn draw_image_mesh(&mut self, image: &Image, mesh: &ImageMesh<'_>, blend_mode: BlendMode, opacity: f32);
}
