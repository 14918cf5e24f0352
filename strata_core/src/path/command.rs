// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;

use crate::transform::Transform3d;

use super::id::PathId;

/// One drawing command of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    /// Starts a new contour at the point.
    MoveTo(Point),
    /// Straight line from the current point.
    LineTo(Point),
    /// Cubic Bézier from the current point: two control points, then the end
    /// point.
    CubicTo(Point, Point, Point),
    /// Closes the current contour back to its start point.
    Close,
}

/// Winding rule used when filling a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// A point is inside when its winding number is non-zero.
    #[default]
    NonZero,
    /// A point is inside when its winding number is odd.
    EvenOdd,
}

/// A child path embedded in a parent with its own transform.
///
/// The child's geometry is never copied; it is read through the store each
/// time the parent regenerates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubPath {
    /// The embedded path.
    pub child: PathId,
    /// Transform from the child's space into the parent's.
    pub transform: Transform3d,
}
