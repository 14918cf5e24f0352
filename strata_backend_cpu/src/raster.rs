// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangle rasterization by pixel-center sampling.
//!
//! A pixel is inside a triangle when its center is. Centers exactly on an
//! edge belong to the triangle only when the edge is a top or left edge, so
//! triangles sharing an edge never both claim a pixel and a mesh without
//! overlaps touches each pixel once.
//!
//! Coordinates are in pixels with y pointing down: pixel `(x, y)` spans
//! `[x, x + 1) × [y, y + 1)` and its center is `(x + 0.5, y + 0.5)`.

use core::fmt;

use kurbo::Point;

/// Twice the signed area of `(a, b, p)`; positive when `p` lies inside the
/// half-plane of a clockwise (on screen) edge `a → b`.
fn edge(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn is_top_left(a: Point, b: Point) -> bool {
    let d = b - a;
    (d.y == 0.0 && d.x > 0.0) || d.y < 0.0
}

/// Pixel indices whose centers lie in `[min, max]`, clamped to the surface.
#[expect(
    clippy::cast_possible_truncation,
    reason = "bounds are clamped to the surface before the cast"
)]
fn span(min: f64, max: f64, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 {
        return None;
    }
    let lo = (min - 0.5).ceil().max(0.0);
    let hi = (max - 0.5).floor().min(f64::from(limit - 1));
    if lo > hi {
        return None;
    }
    Some((lo as u32, hi as u32))
}

/// Calls `visit(x, y, barycentric)` for every pixel of a `width × height`
/// surface whose center the triangle covers.
///
/// The barycentric weights are in the order of `tri`. Degenerate and
/// non-finite triangles cover nothing. Winding does not matter.
pub fn rasterize_triangle(tri: [Point; 3], width: u32, height: u32, mut visit: impl FnMut(u32, u32, [f64; 3])) {
    if !tri.iter().all(|p| p.is_finite()) {
        return;
    }
    let [mut a, mut b, c] = tri;
    let mut area = edge(a, b, c);
    if area == 0.0 {
        return;
    }
    let swapped = area < 0.0;
    if swapped {
        core::mem::swap(&mut a, &mut b);
        area = -area;
    }

    let Some((x0, x1)) = span(a.x.min(b.x).min(c.x), a.x.max(b.x).max(c.x), width) else {
        return;
    };
    let Some((y0, y1)) = span(a.y.min(b.y).min(c.y), a.y.max(b.y).max(c.y), height) else {
        return;
    };

    let top_left = [is_top_left(b, c), is_top_left(c, a), is_top_left(a, b)];
    for y in y0..=y1 {
        let py = f64::from(y) + 0.5;
        for x in x0..=x1 {
            let p = Point::new(f64::from(x) + 0.5, py);
            let w = [edge(b, c, p), edge(c, a, p), edge(a, b, p)];
            let inside = w
                .iter()
                .zip(top_left)
                .all(|(&w, tl)| w > 0.0 || (w == 0.0 && tl));
            if inside {
                let mut bary = w.map(|w| w / area);
                if swapped {
                    bary.swap(0, 1);
                }
                visit(x, y, bary);
            }
        }
    }
}

/// Pixels covered by one draw.
///
/// A node's triangles are rasterized into a coverage mask before any color
/// is written, so overlapping triangles of the same node (stroke joins,
/// self-intersecting fills) blend once.
#[derive(Clone)]
pub struct Coverage {
    width: u32,
    height: u32,
    covered: Vec<bool>,
    uvs: Vec<[f32; 2]>,
    bounds: Option<[u32; 4]>,
}

impl fmt::Debug for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coverage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl Coverage {
    /// Creates an empty mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            covered: vec![false; len],
            uvs: vec![[0.0; 2]; len],
            bounds: None,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clears the mask.
    pub fn reset(&mut self) {
        if let Some([x0, y0, x1, y1]) = self.bounds.take() {
            let (start, end) = (self.index(x0, y0), self.index(x1, y1));
            self.covered[start..=end].fill(false);
        }
    }

    /// Marks `(x, y)` as covered, with a texture coordinate.
    pub fn mark(&mut self, x: u32, y: u32, uv: [f32; 2]) {
        let i = self.index(x, y);
        self.covered[i] = true;
        self.uvs[i] = uv;
        self.bounds = Some(match self.bounds {
            None => [x, y, x, y],
            Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
        });
    }

    /// Whether `(x, y)` is covered.
    #[must_use]
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.covered[self.index(x, y)]
    }

    /// Number of covered pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Covered pixels in row-major order, with their texture coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, [f32; 2])> + '_ {
        let [x0, y0, x1, y1] = self.bounds.unwrap_or([1, 1, 0, 0]);
        (y0..=y1).flat_map(move |y| {
            (x0..=x1).filter_map(move |x| {
                let i = self.index(x, y);
                self.covered[i].then(|| (x, y, self.uvs[i]))
            })
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(tri: [Point; 3], w: u32, h: u32) -> usize {
        let mut n = 0;
        rasterize_triangle(tri, w, h, |_, _, _| n += 1);
        n
    }

    #[test]
    fn shared_diagonal_is_claimed_once() {
        let (a, b, c, d) = (
            Point::new(0.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(8.0, 8.0),
            Point::new(0.0, 8.0),
        );
        let mut hits = [0_u8; 64];
        for tri in [[a, b, c], [a, c, d]] {
            rasterize_triangle(tri, 8, 8, |x, y, _| hits[(y * 8 + x) as usize] += 1);
        }
        assert!(hits.iter().all(|&h| h == 1), "{hits:?}");
    }

    #[test]
    fn winding_does_not_matter() {
        let tri = [Point::new(1.0, 1.0), Point::new(7.0, 2.0), Point::new(3.0, 6.0)];
        let reversed = [tri[2], tri[1], tri[0]];
        assert_eq!(count(tri, 8, 8), count(reversed, 8, 8));
        assert!(count(tri, 8, 8) > 0);
    }

    #[test]
    fn centers_on_edges_follow_top_left_rule() {
        // Pixel centers of column 0 lie on the left edge x = 0.5, and the
        // centers of column 2 on the right edge x = 2.5.
        let quad = [
            [Point::new(0.5, 0.0), Point::new(2.5, 0.0), Point::new(2.5, 4.0)],
            [Point::new(0.5, 0.0), Point::new(2.5, 4.0), Point::new(0.5, 4.0)],
        ];
        let mut columns = Vec::new();
        for tri in quad {
            rasterize_triangle(tri, 4, 4, |x, _, _| columns.push(x));
        }
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns, [0, 1]);
    }

    #[test]
    fn clamps_to_surface() {
        let big = [Point::new(-50.0, -50.0), Point::new(100.0, -50.0), Point::new(-50.0, 100.0)];
        assert_eq!(count(big, 4, 4), 16);
    }

    #[test]
    fn degenerate_and_nan_cover_nothing() {
        let line = [Point::new(0.0, 0.0), Point::new(4.0, 4.0), Point::new(2.0, 2.0)];
        assert_eq!(count(line, 4, 4), 0);
        let nan = [Point::new(f64::NAN, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
        assert_eq!(count(nan, 4, 4), 0);
    }

    #[test]
    fn barycentric_weights_follow_input_order() {
        let tri = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 0.0)];
        let mut seen = None;
        rasterize_triangle(tri, 10, 10, |x, y, bary| {
            if (x, y) == (0, 0) {
                seen = Some(bary);
            }
        });
        let bary = seen.unwrap();
        assert!((bary[0] - 0.9).abs() < 1e-12, "{bary:?}");
        assert!((bary[1] - 0.05).abs() < 1e-12, "{bary:?}");
        assert!((bary[2] - 0.05).abs() < 1e-12, "{bary:?}");
    }

    #[test]
    fn coverage_marks_once_and_resets() {
        let mut coverage = Coverage::new(4, 4);
        coverage.mark(1, 1, [0.5, 0.5]);
        coverage.mark(1, 1, [0.25, 0.5]);
        coverage.mark(3, 2, [0.0, 0.0]);
        assert_eq!(coverage.count(), 2);
        assert!(coverage.is_covered(3, 2));
        assert_eq!(coverage.iter().next(), Some((1, 1, [0.25, 0.5])));
        coverage.reset();
        assert_eq!(coverage.count(), 0);
        assert!(!coverage.is_covered(1, 1));
    }
}
