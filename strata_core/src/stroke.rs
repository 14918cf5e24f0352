// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke outlining.
//!
//! A stroke is emitted as a triangle list made of three parts:
//!
//! - a *ribbon* of two triangles per segment, offset by half the width along
//!   the segment's normal,
//! - *joins* between consecutive segments (and at the wrap-around vertex of a
//!   closed polyline),
//! - *caps* at the two ends of an open polyline.
//!
//! Miter joins emit both the miter wedge and the round fan. The overlap is
//! resolved by backends rasterizing each draw as a single coverage pass, so
//! over-drawn pixels are never blended twice.

use alloc::vec::Vec;
use core::ops::AddAssign;

use kurbo::{Point, Vec2};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::path::Contour;

/// Default number of line pieces per curve and per round join or cap.
pub const DEFAULT_CURVE_SEGMENTS: u32 = 16;

/// Largest accepted curve segment count.
pub const MAX_CURVE_SEGMENTS: u32 = 100;

/// Default miter limit, as the ratio of miter length to half the width.
pub const DEFAULT_MITER_LIMIT: f32 = 4.0;

const EPSILON: f64 = 1e-9;

/// Geometry between two stroke segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StrokeJoin {
    /// Sharp corner, with the round fan as a fallback.
    #[default]
    Miter,
    /// Circular arc around the joint.
    Round,
    /// Straight cut across the corner.
    Bevel,
}

/// Geometry at the ends of an open stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StrokeCap {
    /// The stroke ends exactly at the endpoint.
    #[default]
    Flat,
    /// Half-disk centred on the endpoint.
    Round,
    /// The stroke extends half the width past the endpoint.
    Square,
}

/// How to stroke a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Full stroke width.
    pub width: f32,
    /// Join style.
    pub join: StrokeJoin,
    /// Cap style.
    pub cap: StrokeCap,
    /// Line pieces per curve, per round join and per round cap (`1..=100`).
    pub curve_segments: u32,
    /// Miter length over half width beyond which the miter wedge is dropped.
    pub miter_limit: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl StrokeStyle {
    /// A stroke of `width` with miter joins and flat caps.
    #[must_use]
    pub const fn new(width: f32) -> Self {
        Self {
            width,
            join: StrokeJoin::Miter,
            cap: StrokeCap::Flat,
            curve_segments: DEFAULT_CURVE_SEGMENTS,
            miter_limit: DEFAULT_MITER_LIMIT,
        }
    }

    /// Returns this style with a different join.
    #[must_use]
    pub const fn with_join(mut self, join: StrokeJoin) -> Self {
        self.join = join;
        self
    }

    /// Returns this style with a different cap.
    #[must_use]
    pub const fn with_cap(mut self, cap: StrokeCap) -> Self {
        self.cap = cap;
        self
    }

    /// Returns this style with a different curve segment count, clamped to
    /// `1..=100`.
    #[must_use]
    pub const fn with_curve_segments(mut self, segments: u32) -> Self {
        self.curve_segments = clamp_segments(segments);
        self
    }

    /// Returns this style with a different miter limit.
    #[must_use]
    pub const fn with_miter_limit(mut self, limit: f32) -> Self {
        self.miter_limit = limit;
        self
    }

    /// The curve segment count actually used, clamped to `1..=100`.
    #[must_use]
    pub const fn segments(&self) -> u32 {
        clamp_segments(self.curve_segments)
    }

    /// A bitwise key identifying every input that affects the outline.
    #[must_use]
    pub fn cache_key(&self) -> StrokeKey {
        StrokeKey {
            width: self.width.to_bits(),
            join: self.join,
            cap: self.cap,
            segments: self.segments(),
            miter_limit: self.miter_limit.to_bits(),
        }
    }
}

pub(crate) const fn clamp_segments(segments: u32) -> u32 {
    if segments < 1 {
        1
    } else if segments > MAX_CURVE_SEGMENTS {
        MAX_CURVE_SEGMENTS
    } else {
        segments
    }
}

/// Hashable identity of a [`StrokeStyle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrokeKey {
    width: u32,
    join: StrokeJoin,
    cap: StrokeCap,
    segments: u32,
    miter_limit: u32,
}

/// How much work an outline took.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrokeStats {
    /// Ribbons emitted.
    pub segments: usize,
    /// Join computations, including joins that produced no triangles.
    pub joins: usize,
    /// Cap computations, including flat caps.
    pub caps: usize,
}

impl AddAssign for StrokeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.segments += rhs.segments;
        self.joins += rhs.joins;
        self.caps += rhs.caps;
    }
}

/// Strokes every contour, appending triangles to `out`.
pub fn stroke_contours(contours: &[Contour], style: &StrokeStyle, out: &mut Vec<Point>) -> StrokeStats {
    let mut stats = StrokeStats::default();
    for contour in contours {
        stats += stroke_polyline(&contour.points, contour.closed, style, out);
    }
    stats
}

/// Strokes one polyline, appending triangles to `out`.
///
/// Consecutive duplicate points are skipped, so zero-length segments emit
/// nothing. Fewer than two distinct points, or a width that is not positive
/// and finite, produce no geometry.
pub fn stroke_polyline(
    points: &[Point],
    closed: bool,
    style: &StrokeStyle,
    out: &mut Vec<Point>,
) -> StrokeStats {
    let mut stats = StrokeStats::default();
    let half = f64::from(style.width) * 0.5;
    if !(half > 0.0 && half.is_finite()) {
        return stats;
    }

    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if pts.last().is_none_or(|last| last.distance_squared(p) > EPSILON * EPSILON) {
            pts.push(p);
        }
    }
    if closed && pts.len() > 1 && pts[0].distance_squared(pts[pts.len() - 1]) <= EPSILON * EPSILON {
        pts.pop();
    }
    let n = pts.len();
    if n < 2 {
        return stats;
    }

    let segments = style.segments();
    let segment_count = if closed { n } else { n - 1 };
    let normals: Vec<Vec2> = (0..segment_count)
        .map(|i| unit_normal(pts[(i + 1) % n] - pts[i]))
        .collect();

    for (i, &normal) in normals.iter().enumerate() {
        let mut p1 = pts[i];
        let mut p2 = pts[(i + 1) % n];
        if !closed && style.cap == StrokeCap::Square {
            let dir = Vec2::new(normal.y, -normal.x) * half;
            if i == 0 {
                p1 -= dir;
            }
            if i == segment_count - 1 {
                p2 += dir;
            }
        }
        push_ribbon(out, p1, p2, normal * half);
        stats.segments += 1;
    }

    if !closed {
        let first = normals[0] * half;
        let last = normals[segment_count - 1] * half;
        if style.cap == StrokeCap::Round {
            let step = core::f64::consts::PI / f64::from(segments);
            push_fan(out, pts[0], first, step, segments);
            push_fan(out, pts[n - 1], -last, step, segments);
        }
        stats.caps += 2;
    }

    let join_count = if closed { segment_count } else { segment_count - 1 };
    for i in 0..join_count {
        let j = (i + 1) % segment_count;
        let vertex = pts[(i + 1) % n];
        push_join(out, vertex, normals[i], normals[j], half, style, segments);
        stats.joins += 1;
    }

    stats
}

/// Left-hand unit normal `(-dy, dx) / len`.
fn unit_normal(d: Vec2) -> Vec2 {
    let len = d.hypot();
    Vec2::new(-d.y / len, d.x / len)
}

fn push_ribbon(out: &mut Vec<Point>, p1: Point, p2: Point, offset: Vec2) {
    out.extend_from_slice(&[
        p1 + offset,
        p1 - offset,
        p2 + offset,
        p2 + offset,
        p1 - offset,
        p2 - offset,
    ]);
}

/// Emits `count` wedges around `center`, starting at `from` and rotating by
/// `step` radians per wedge.
fn push_fan(out: &mut Vec<Point>, center: Point, from: Vec2, step: f64, count: u32) {
    let mut prev = from;
    for k in 1..=count {
        let (s, c) = (step * f64::from(k)).sin_cos();
        let next = Vec2::new(from.x * c - from.y * s, from.x * s + from.y * c);
        out.extend_from_slice(&[center, center + prev, center + next]);
        prev = next;
    }
}

fn push_join(
    out: &mut Vec<Point>,
    vertex: Point,
    n1: Vec2,
    n2: Vec2,
    half: f64,
    style: &StrokeStyle,
    segments: u32,
) {
    let dot = n1.dot(n2).clamp(-1.0, 1.0);
    let angle = dot.acos();
    if angle < EPSILON {
        // Collinear segments share their ribbon edges.
        return;
    }
    let cross = n1.cross(n2);
    // The outer side of a left turn is the right-hand side.
    let outer = if cross > 0.0 { -1.0 } else { 1.0 };
    let o1 = n1 * half;
    let o2 = n2 * half;

    match style.join {
        StrokeJoin::Bevel => {
            out.extend_from_slice(&[vertex, vertex + o1, vertex + o2]);
            out.extend_from_slice(&[vertex, vertex - o1, vertex - o2]);
        }
        StrokeJoin::Round => {
            push_round_join(out, vertex, o1 * outer, cross, angle, segments);
        }
        StrokeJoin::Miter => {
            let a = o1 * outer;
            let b = o2 * outer;
            let bisector = a + b;
            let bisector_len = bisector.hypot();
            if bisector_len > EPSILON {
                let dir = bisector / bisector_len;
                let cos_half = dir.dot(a) / half;
                if cos_half > EPSILON {
                    let miter_len = half / cos_half;
                    if miter_len / half <= f64::from(style.miter_limit) {
                        let tip = vertex + dir * miter_len;
                        out.extend_from_slice(&[vertex, vertex + a, tip]);
                        out.extend_from_slice(&[vertex, tip, vertex + b]);
                    }
                }
            }
            push_round_join(out, vertex, a, cross, angle, segments);
        }
    }
}

/// Sweeps `segments` wedges from `from` through the turn angle, with the
/// rotation sign taken from the turn direction.
fn push_round_join(out: &mut Vec<Point>, vertex: Point, from: Vec2, cross: f64, angle: f64, segments: u32) {
    let signed = if cross < 0.0 { -angle } else { angle };
    push_fan(out, vertex, from, signed / f64::from(segments), segments);
}

/// Axis-aligned bounds of a triangle list, or `None` when empty.
#[must_use]
pub fn vertex_bounds(vertices: &[Point]) -> Option<kurbo::Rect> {
    let (first, rest) = vertices.split_first()?;
    Some(
        rest.iter()
            .fold(kurbo::Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        alloc::vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    fn assert_rect(actual: kurbo::Rect, expected: kurbo::Rect) {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(
            close(actual.x0, expected.x0)
                && close(actual.y0, expected.y0)
                && close(actual.x1, expected.x1)
                && close(actual.y1, expected.y1),
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn flat_segment_ribbon_bounds() {
        let mut out = Vec::new();
        let stats = stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            false,
            &StrokeStyle::new(2.0),
            &mut out,
        );
        assert_eq!(out.len(), 6);
        assert_eq!(stats, StrokeStats { segments: 1, joins: 0, caps: 2 });
        assert_rect(
            vertex_bounds(&out).unwrap(),
            kurbo::Rect::new(0.0, -1.0, 10.0, 1.0),
        );
    }

    #[test]
    fn ribbon_is_length_by_width_for_any_direction() {
        let mut out = Vec::new();
        stroke_polyline(
            &[Point::new(3.0, 1.0), Point::new(3.0, 8.0)],
            false,
            &StrokeStyle::new(4.0),
            &mut out,
        );
        assert_rect(
            vertex_bounds(&out).unwrap(),
            kurbo::Rect::new(1.0, 1.0, 5.0, 8.0),
        );
        assert!((crate::tessellate::triangle_area(&out) - 28.0).abs() < 1e-9);
    }

    #[test]
    fn square_cap_extends_by_half_width() {
        let mut out = Vec::new();
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            false,
            &StrokeStyle::new(2.0).with_cap(StrokeCap::Square),
            &mut out,
        );
        assert_rect(
            vertex_bounds(&out).unwrap(),
            kurbo::Rect::new(-1.0, -1.0, 11.0, 1.0),
        );
    }

    #[test]
    fn round_cap_covers_half_disks() {
        let mut out = Vec::new();
        let style = StrokeStyle::new(2.0)
            .with_cap(StrokeCap::Round)
            .with_curve_segments(32);
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            false,
            &style,
            &mut out,
        );
        assert_eq!(out.len(), 6 + 2 * 32 * 3);
        let bounds = vertex_bounds(&out).unwrap();
        assert!((bounds.x0 + 1.0).abs() < 1e-9, "{bounds:?}");
        assert!((bounds.x1 - 11.0).abs() < 1e-9, "{bounds:?}");
    }

    #[test]
    fn closed_polyline_counts_joins_not_caps() {
        let mut out = Vec::new();
        let style = StrokeStyle::new(1.0).with_cap(StrokeCap::Round);
        let stats = stroke_polyline(&square(), true, &style, &mut out);
        assert_eq!(stats, StrokeStats { segments: 4, joins: 4, caps: 0 });
    }

    #[test]
    fn closed_polyline_ignores_repeated_start_point() {
        let mut pts = square();
        pts.push(Point::new(0.0, 0.0));
        let mut out = Vec::new();
        let stats = stroke_polyline(&pts, true, &StrokeStyle::new(1.0), &mut out);
        assert_eq!(stats.joins, 4);
        assert_eq!(stats.segments, 4);
    }

    #[test]
    fn open_polyline_counts() {
        let mut out = Vec::new();
        let stats = stroke_polyline(&square(), false, &StrokeStyle::new(1.0), &mut out);
        assert_eq!(stats, StrokeStats { segments: 3, joins: 2, caps: 2 });
    }

    #[test]
    fn degenerate_inputs_emit_nothing() {
        let style = StrokeStyle::new(2.0);
        let mut out = Vec::new();
        assert_eq!(stroke_polyline(&[], false, &style, &mut out), StrokeStats::default());
        stroke_polyline(&[Point::new(1.0, 1.0)], false, &style, &mut out);
        stroke_polyline(&[Point::new(1.0, 1.0), Point::new(1.0, 1.0)], false, &style, &mut out);
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0)],
            false,
            &StrokeStyle::new(0.0),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        let style = StrokeStyle::new(2.0).with_join(StrokeJoin::Bevel);
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            false,
            &style,
            &mut a,
        );
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            false,
            &style,
            &mut b,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn bevel_join_emits_two_triangles() {
        let mut out = Vec::new();
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            false,
            &StrokeStyle::new(2.0).with_join(StrokeJoin::Bevel),
            &mut out,
        );
        assert_eq!(out.len(), 2 * 6 + 2 * 3);
    }

    #[test]
    fn round_join_stays_on_the_outer_side() {
        // Left turn in y-up terms: (0,0) -> (5,0) -> (5,5).
        let mut out = Vec::new();
        let style = StrokeStyle::new(2.0)
            .with_join(StrokeJoin::Round)
            .with_curve_segments(8);
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            false,
            &style,
            &mut out,
        );
        let join = &out[12..];
        assert_eq!(join.len(), 8 * 3);
        let corner = Point::new(5.0, 0.0);
        for p in join {
            assert!(p.x >= corner.x - 1e-9 && p.y <= corner.y + 1e-9, "{p:?}");
            assert!(p.distance(corner) <= 1.0 + 1e-9);
        }
        // Sweep ends at the next segment's outer offset.
        assert!(join[join.len() - 1].distance(Point::new(6.0, 0.0)) < 1e-9);
    }

    #[test]
    fn miter_join_emits_wedge_and_round_fallback() {
        let mut out = Vec::new();
        let style = StrokeStyle::new(2.0).with_curve_segments(4);
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
            false,
            &style,
            &mut out,
        );
        let join = &out[12..];
        assert_eq!(join.len(), 2 * 3 + 4 * 3);
        // Right-angle miter tip sits at the outer corner.
        assert!(join[2].distance(Point::new(6.0, -1.0)) < 1e-9, "{:?}", join[2]);
    }

    #[test]
    fn sharp_miter_falls_back_to_round_only() {
        let mut out = Vec::new();
        let style = StrokeStyle::new(2.0).with_curve_segments(4);
        stroke_polyline(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 0.5)],
            false,
            &style,
            &mut out,
        );
        assert_eq!(out.len(), 2 * 6 + 4 * 3);
    }

    #[test]
    fn cache_key_tracks_every_field() {
        let base = StrokeStyle::new(2.0);
        assert_eq!(base.cache_key(), StrokeStyle::new(2.0).cache_key());
        assert_ne!(base.cache_key(), StrokeStyle::new(3.0).cache_key());
        assert_ne!(base.cache_key(), base.with_join(StrokeJoin::Round).cache_key());
        assert_ne!(base.cache_key(), base.with_cap(StrokeCap::Square).cache_key());
        assert_ne!(base.cache_key(), base.with_curve_segments(3).cache_key());
        assert_ne!(base.cache_key(), base.with_miter_limit(10.0).cache_key());
    }

    #[test]
    fn curve_segments_are_clamped() {
        assert_eq!(StrokeStyle::new(1.0).with_curve_segments(0).segments(), 1);
        assert_eq!(StrokeStyle::new(1.0).with_curve_segments(1000).segments(), 100);
    }
}
