// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip accumulation.
//!
//! Every clip pushed in a scope contributes a [`ClipMask`]: the filled
//! outline of a path as triangles in compositing space. The *effective clip*
//! of a draw is the intersection of every mask on the stack.
//!
//! Fill triangles are convex and never overlap, so the intersection is
//! computed exactly as a set of convex pieces: each piece of the running
//! region is clipped against each triangle of the next mask with
//! Sutherland–Hodgman. Results only ever shrink, which makes pushing a clip
//! monotone.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::transform::Transform3d;

const AREA_EPSILON: f64 = 1e-12;

/// One pushed clip: a triangle list in compositing space.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipMask {
    triangles: Vec<[Point; 3]>,
    bounds: Rect,
}

impl ClipMask {
    /// Builds a mask from a flat triangle list, mapping every vertex through
    /// `transform`. A trailing partial triangle is ignored.
    #[must_use]
    pub fn from_triangles(vertices: &[Point], transform: &Transform3d) -> Self {
        let triangles: Vec<[Point; 3]> = vertices
            .chunks_exact(3)
            .map(|t| {
                [
                    transform.transform_point(t[0]),
                    transform.transform_point(t[1]),
                    transform.transform_point(t[2]),
                ]
            })
            .collect();
        let bounds = triangles
            .iter()
            .flatten()
            .fold(None, |acc: Option<Rect>, p| {
                Some(acc.map_or_else(|| Rect::from_points(*p, *p), |r| r.union_pt(*p)))
            })
            .unwrap_or(Rect::ZERO);
        Self { triangles, bounds }
    }

    /// Triangles of the mask.
    #[must_use]
    pub fn triangles(&self) -> &[[Point; 3]] {
        &self.triangles
    }

    /// Axis-aligned bounds, [`Rect::ZERO`] when empty.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(|t| triangle_area(t)).sum()
    }
}

/// A convex polygon with cached bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolygon {
    points: Vec<Point>,
    bounds: Rect,
}

impl ConvexPolygon {
    /// Wraps a convex vertex list. Returns `None` for fewer than three
    /// vertices or a degenerate area.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.len() < 3 || signed_area(&points).abs() <= AREA_EPSILON {
            return None;
        }
        let first = points[0];
        let bounds = points[1..]
            .iter()
            .fold(Rect::from_points(first, first), |r, p| r.union_pt(*p));
        Some(Self { points, bounds })
    }

    /// Vertices in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Axis-aligned bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.points).abs()
    }

    /// Whether `p` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let orientation = orientation(&self.points);
        let n = self.points.len();
        (0..n).all(|i| {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            (b - a).cross(p - a) * orientation >= -AREA_EPSILON
        })
    }

    /// Intersection with another convex polygon, `None` when it is empty or
    /// degenerate.
    #[must_use]
    pub fn intersect(&self, clipper: &Self) -> Option<Self> {
        if self.bounds.intersect(clipper.bounds).area() <= 0.0 {
            return None;
        }
        let orientation = orientation(&clipper.points);
        let n = clipper.points.len();
        let mut output = self.points.clone();
        let mut input = Vec::with_capacity(output.len() + n);
        for i in 0..n {
            if output.is_empty() {
                return None;
            }
            let a = clipper.points[i];
            let b = clipper.points[(i + 1) % n];
            let edge = b - a;
            let side = |p: Point| edge.cross(p - a) * orientation;

            core::mem::swap(&mut input, &mut output);
            output.clear();
            let mut prev = input[input.len() - 1];
            let mut prev_side = side(prev);
            for &cur in &input {
                let cur_side = side(cur);
                if cur_side >= 0.0 {
                    if prev_side < 0.0 {
                        output.push(crossing(prev, cur, prev_side, cur_side));
                    }
                    output.push(cur);
                } else if prev_side >= 0.0 {
                    output.push(crossing(prev, cur, prev_side, cur_side));
                }
                prev = cur;
                prev_side = cur_side;
            }
        }
        Self::new(output)
    }

    /// Appends a fan triangulation to `out`.
    pub fn triangulate_into(&self, out: &mut Vec<Point>) {
        let first = self.points[0];
        for w in self.points[1..].windows(2) {
            out.extend_from_slice(&[first, w[0], w[1]]);
        }
    }
}

/// The region a draw is restricted to.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EffectiveClip {
    /// No clip was pushed: everything is visible.
    #[default]
    Unclipped,
    /// Visible region as non-overlapping convex pieces. Empty means nothing
    /// is visible.
    Region(Vec<ConvexPolygon>),
}

impl EffectiveClip {
    /// Whether any clip restricts drawing.
    #[must_use]
    pub fn is_clipped(&self) -> bool {
        matches!(self, Self::Region(_))
    }

    /// Whether the clip hides everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Region(pieces) if pieces.is_empty())
    }

    /// Visible area, or `None` when unclipped (unbounded).
    #[must_use]
    pub fn area(&self) -> Option<f64> {
        match self {
            Self::Unclipped => None,
            Self::Region(pieces) => Some(pieces.iter().map(ConvexPolygon::area).sum()),
        }
    }

    /// Whether `p` is visible.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Self::Unclipped => true,
            Self::Region(pieces) => pieces.iter().any(|piece| piece.contains(p)),
        }
    }

    /// Convex pieces of the region, empty when unclipped.
    #[must_use]
    pub fn polygons(&self) -> &[ConvexPolygon] {
        match self {
            Self::Unclipped => &[],
            Self::Region(pieces) => pieces,
        }
    }

    /// Triangle list covering the region, for stencil upload.
    #[must_use]
    pub fn triangles(&self) -> Vec<Point> {
        let mut out = Vec::new();
        for piece in self.polygons() {
            piece.triangulate_into(&mut out);
        }
        out
    }

    /// Bounds of the visible region, `None` when unclipped.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Unclipped => None,
            Self::Region(pieces) => Some(
                pieces
                    .iter()
                    .map(ConvexPolygon::bounds)
                    .reduce(|a, b| a.union(b))
                    .unwrap_or(Rect::ZERO),
            ),
        }
    }
}

/// Intersects every mask, starting from the first.
#[must_use]
pub fn intersect_masks(masks: &[Rc<ClipMask>]) -> EffectiveClip {
    let Some((first, rest)) = masks.split_first() else {
        return EffectiveClip::Unclipped;
    };
    let mut region: Vec<ConvexPolygon> = first
        .triangles()
        .iter()
        .filter_map(|t| ConvexPolygon::new(t.to_vec()))
        .collect();
    for mask in rest {
        if region.is_empty() {
            break;
        }
        let clippers: Vec<ConvexPolygon> = mask
            .triangles()
            .iter()
            .filter_map(|t| ConvexPolygon::new(t.to_vec()))
            .collect();
        let mut next = Vec::new();
        for piece in &region {
            for clipper in &clippers {
                if let Some(p) = piece.intersect(clipper) {
                    next.push(p);
                }
            }
        }
        region = next;
    }
    EffectiveClip::Region(region)
}

fn crossing(a: Point, b: Point, side_a: f64, side_b: f64) -> Point {
    let t = side_a / (side_a - side_b);
    a.lerp(b, t)
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

fn orientation(points: &[Point]) -> f64 {
    if signed_area(points) < 0.0 { -1.0 } else { 1.0 }
}

fn triangle_area(t: &[Point; 3]) -> f64 {
    ((t[1] - t[0]).cross(t[2] - t[0]) * 0.5).abs()
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn rect_mask(x0: f64, y0: f64, x1: f64, y1: f64) -> Rc<ClipMask> {
        let a = Point::new(x0, y0);
        let b = Point::new(x1, y0);
        let c = Point::new(x1, y1);
        let d = Point::new(x0, y1);
        Rc::new(ClipMask::from_triangles(&[a, b, c, a, c, d], &Transform3d::IDENTITY))
    }

    fn area(clip: &EffectiveClip) -> f64 {
        clip.area().unwrap()
    }

    #[test]
    fn no_masks_is_unclipped() {
        let clip = intersect_masks(&[]);
        assert_eq!(clip, EffectiveClip::Unclipped);
        assert!(!clip.is_clipped());
        assert!(clip.contains(Point::new(1e9, -1e9)));
        assert!(clip.triangles().is_empty());
    }

    #[test]
    fn single_mask_is_its_own_region() {
        let clip = intersect_masks(&[rect_mask(0.0, 0.0, 10.0, 10.0)]);
        assert!((area(&clip) - 100.0).abs() < 1e-9);
        assert!(clip.contains(Point::new(5.0, 5.0)));
        assert!(!clip.contains(Point::new(11.0, 5.0)));
    }

    #[test]
    fn overlapping_rects_intersect() {
        let clip = intersect_masks(&[
            rect_mask(0.0, 0.0, 10.0, 10.0),
            rect_mask(5.0, 5.0, 15.0, 15.0),
        ]);
        assert!((area(&clip) - 25.0).abs() < 1e-9);
        assert!(clip.contains(Point::new(7.0, 7.0)));
        assert!(!clip.contains(Point::new(2.0, 2.0)));
        assert!(!clip.contains(Point::new(12.0, 12.0)));
        let bounds = clip.bounds().unwrap();
        assert!((bounds.x0 - 5.0).abs() < 1e-9 && (bounds.x1 - 10.0).abs() < 1e-9);
        assert!((bounds.y0 - 5.0).abs() < 1e-9 && (bounds.y1 - 10.0).abs() < 1e-9);
        let tris = clip.triangles();
        assert!((crate::tessellate::triangle_area(&tris) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_masks_hide_everything() {
        let clip = intersect_masks(&[
            rect_mask(0.0, 0.0, 10.0, 10.0),
            rect_mask(20.0, 20.0, 30.0, 30.0),
        ]);
        assert!(clip.is_clipped());
        assert!(clip.is_empty());
        assert!(!clip.contains(Point::new(5.0, 5.0)));
        assert_eq!(area(&clip), 0.0);
    }

    #[test]
    fn empty_mask_hides_everything() {
        let empty = Rc::new(ClipMask::from_triangles(&[], &Transform3d::IDENTITY));
        let clip = intersect_masks(&[empty]);
        assert!(clip.is_empty());
    }

    #[test]
    fn pushing_masks_never_grows_the_area() {
        let masks = vec![
            rect_mask(0.0, 0.0, 100.0, 100.0),
            rect_mask(10.0, -5.0, 60.0, 70.0),
            Rc::new(ClipMask::from_triangles(
                &[
                    Point::new(0.0, 0.0),
                    Point::new(80.0, 10.0),
                    Point::new(30.0, 90.0),
                ],
                &Transform3d::IDENTITY,
            )),
            rect_mask(-50.0, -50.0, 500.0, 500.0),
            rect_mask(20.0, 20.0, 40.0, 40.0),
        ];
        let mut previous = f64::INFINITY;
        for n in 1..=masks.len() {
            let a = area(&intersect_masks(&masks[..n]));
            assert!(a <= previous + 1e-9, "mask {n}: {a} > {previous}");
            previous = a;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn mask_transform_is_applied() {
        let mask = ClipMask::from_triangles(
            &[
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 1.0),
            ],
            &Transform3d::from_scale(4.0, 2.0, 1.0),
        );
        assert_eq!(mask.bounds(), Rect::new(0.0, 0.0, 4.0, 2.0));
        assert!((mask.area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn convex_intersection_handles_either_winding() {
        let cw = ConvexPolygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
        ])
        .unwrap();
        let ccw = ConvexPolygon::new(vec![
            Point::new(2.0, 2.0),
            Point::new(6.0, 2.0),
            Point::new(6.0, 6.0),
            Point::new(2.0, 6.0),
        ])
        .unwrap();
        let a = cw.intersect(&ccw).unwrap();
        let b = ccw.intersect(&cw).unwrap();
        assert!((a.area() - 4.0).abs() < 1e-9);
        assert!((b.area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_polygons_are_rejected() {
        assert!(ConvexPolygon::new(vec![Point::ORIGIN, Point::new(1.0, 1.0)]).is_none());
        assert!(
            ConvexPolygon::new(vec![
                Point::ORIGIN,
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0)
            ])
            .is_none()
        );
    }
}
