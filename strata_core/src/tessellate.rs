// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill tessellation contract.
//!
//! Triangulating a filled outline is a replaceable service. The core only
//! flattens curves, hands the resulting contours to a [`FillTessellator`],
//! and caches the triangle list it returns.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::path::{Contour, FillRule};

/// Turns flattened contours into a triangle list.
pub trait FillTessellator {
    /// Appends to `out` a flat triangle list (three vertices per triangle)
    /// covering the region enclosed by `contours` under `fill_rule` exactly
    /// once.
    ///
    /// Every contour is treated as closed. Triangles must not overlap.
    fn triangulate(
        &mut self,
        contours: &[Contour],
        fill_rule: FillRule,
        out: &mut Vec<Point>,
    ) -> Result<(), TessellationError>;
}

/// Why a tessellator could not produce triangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TessellationError {
    /// A vertex was NaN or infinite.
    InvalidVertex,
    /// The output exceeded the tessellator's vertex capacity.
    TooManyVertices,
    /// The tessellator failed internally.
    Internal,
}

impl fmt::Display for TessellationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVertex => f.write_str("outline contains a non-finite vertex"),
            Self::TooManyVertices => f.write_str("too many vertices in tessellated output"),
            Self::Internal => f.write_str("internal tessellator error"),
        }
    }
}

impl core::error::Error for TessellationError {}

/// Triangle-list area, summing absolute triangle areas.
#[must_use]
pub fn triangle_area(vertices: &[Point]) -> f64 {
    vertices
        .chunks_exact(3)
        .map(|t| ((t[1] - t[0]).cross(t[2] - t[0]) * 0.5).abs())
        .sum()
}
