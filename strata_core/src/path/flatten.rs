// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve flattening.

use alloc::vec::Vec;

use kurbo::Point;

use crate::transform::Transform3d;

use super::command::PathCommand;

/// A flattened polyline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    /// Vertices in order. Never empty.
    pub points: Vec<Point>,
    /// Whether the contour ended with a close command.
    pub closed: bool,
}

/// Evaluates the cubic Bézier basis at `t`.
#[must_use]
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Flattens `commands` into contours, mapping every vertex through
/// `transform`.
///
/// Each cubic becomes `segments` lines sampled at `t = j / segments` for
/// `j = 1..=segments`. A line or cubic with no preceding move starts at the
/// origin, or at the start of the previously closed contour.
pub fn flatten_commands(
    commands: &[PathCommand],
    transform: &Transform3d,
    segments: u32,
    out: &mut Vec<Contour>,
) {
    let segments = segments.max(1);
    let mut current: Option<Contour> = None;
    let mut start = Point::ORIGIN;
    let mut last = Point::ORIGIN;

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => {
                finish(current.take(), out);
                current = Some(Contour {
                    points: alloc::vec![transform.transform_point(p)],
                    closed: false,
                });
                start = p;
                last = p;
            }
            PathCommand::LineTo(p) => {
                let contour = current.get_or_insert_with(|| begin_at(last, transform));
                contour.points.push(transform.transform_point(p));
                last = p;
            }
            PathCommand::CubicTo(c1, c2, p) => {
                let contour = current.get_or_insert_with(|| begin_at(last, transform));
                for j in 1..=segments {
                    let t = f64::from(j) / f64::from(segments);
                    let q = if j == segments {
                        p
                    } else {
                        cubic_point(last, c1, c2, p, t)
                    };
                    contour.points.push(transform.transform_point(q));
                }
                last = p;
            }
            PathCommand::Close => {
                if let Some(mut contour) = current.take() {
                    contour.closed = true;
                    finish(Some(contour), out);
                }
                last = start;
            }
        }
    }
    finish(current, out);
}

fn begin_at(p: Point, transform: &Transform3d) -> Contour {
    Contour {
        points: alloc::vec![transform.transform_point(p)],
        closed: false,
    }
}

fn finish(contour: Option<Contour>, out: &mut Vec<Contour>) {
    if let Some(contour) = contour {
        // A lone move produces nothing drawable.
        if contour.points.len() > 1 {
            out.push(contour);
        }
    }
}
