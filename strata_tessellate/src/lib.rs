// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill tessellation for strata paths, on [`lyon_tessellation`].
//!
//! [`LyonTessellator`] implements [`FillTessellator`]: it rebuilds the
//! flattened contours as a lyon path, runs lyon's sweep-line fill
//! tessellator with the requested fill rule, and expands the indexed output
//! into the flat triangle list the path store caches.
//!
//! ```rust,ignore
//! let mut compositor = Compositor::new(CompositorConfig::new());
//! compositor.set_tessellator(LyonTessellator::new());
//! ```

use kurbo::Point;
use lyon_tessellation::geometry_builder::{BuffersBuilder, VertexBuffers};
use lyon_tessellation::math::point;
use lyon_tessellation::path::Path;
use lyon_tessellation::{
    FillOptions, FillVertex, GeometryBuilderError, TessellationError as LyonError,
};
use strata_core::path::{Contour, FillRule};
use strata_core::tessellate::{FillTessellator, TessellationError};

/// Fill tessellator backed by [`lyon_tessellation::FillTessellator`].
///
/// The lyon tessellator and its scratch buffers are reused across calls.
pub struct LyonTessellator {
    inner: lyon_tessellation::FillTessellator,
    buffers: VertexBuffers<Point, u32>,
    options: FillOptions,
}

impl std::fmt::Debug for LyonTessellator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyonTessellator")
            .field("tolerance", &self.options.tolerance)
            .finish_non_exhaustive()
    }
}

impl Default for LyonTessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl LyonTessellator {
    /// Creates a tessellator with lyon's default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: lyon_tessellation::FillTessellator::new(),
            buffers: VertexBuffers::new(),
            options: FillOptions::DEFAULT,
        }
    }

    /// Triangles emitted by the last call, as indices into
    /// [`last_vertices`](Self::last_vertices). Empty if that call failed.
    #[must_use]
    pub fn last_indices(&self) -> &[u32] {
        &self.buffers.indices
    }

    /// Distinct vertices emitted by the last call. Empty if that call failed.
    #[must_use]
    pub fn last_vertices(&self) -> &[Point] {
        &self.buffers.vertices
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "lyon tessellates in single precision"
)]
fn to_lyon(p: Point) -> lyon_tessellation::math::Point {
    point(p.x as f32, p.y as f32)
}

fn build_path(contours: &[Contour]) -> Path {
    let mut builder = Path::builder();
    for contour in contours {
        let Some((first, rest)) = contour.points.split_first() else {
            continue;
        };
        builder.begin(to_lyon(*first));
        for p in rest {
            builder.line_to(to_lyon(*p));
        }
        // Fills close every contour.
        builder.end(true);
    }
    builder.build()
}

fn map_error(e: LyonError) -> TessellationError {
    match e {
        LyonError::GeometryBuilder(GeometryBuilderError::InvalidVertex) => {
            TessellationError::InvalidVertex
        }
        LyonError::GeometryBuilder(GeometryBuilderError::TooManyVertices) => {
            TessellationError::TooManyVertices
        }
        _ => TessellationError::Internal,
    }
}

impl FillTessellator for LyonTessellator {
    fn triangulate(
        &mut self,
        contours: &[Contour],
        fill_rule: FillRule,
        out: &mut Vec<Point>,
    ) -> Result<(), TessellationError> {
        self.buffers.vertices.clear();
        self.buffers.indices.clear();
        if contours
            .iter()
            .flat_map(|c| &c.points)
            .any(|p| !p.is_finite())
        {
            return Err(TessellationError::InvalidVertex);
        }
        let path = build_path(contours);
        let options = self.options.with_fill_rule(match fill_rule {
            FillRule::NonZero => lyon_tessellation::FillRule::NonZero,
            FillRule::EvenOdd => lyon_tessellation::FillRule::EvenOdd,
        });

        let result = self.inner.tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut self.buffers, |v: FillVertex<'_>| {
                let p = v.position();
                Point::new(f64::from(p.x), f64::from(p.y))
            }),
        );
        if let Err(e) = result {
            // Lyon may have emitted part of the geometry before failing.
            self.buffers.vertices.clear();
            self.buffers.indices.clear();
            return Err(map_error(e));
        }

        out.extend(
            self.buffers
                .indices
                .iter()
                .map(|&i| self.buffers.vertices[i as usize]),
        );
        Ok(())
    }
}
