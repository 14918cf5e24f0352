// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fitting content into the output.
//!
//! Content is authored at a fixed size. [`FitMode`] decides how it is scaled
//! into the output: stretched, letterboxed or cropped. The same mapping is
//! used in reverse to bring pointer positions back into content space.

use kurbo::{Affine, Point, Rect, Size};

/// How content is scaled into the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Scale each axis independently to fill the output.
    Stretch,
    /// Preserve the aspect ratio and show all content, letterboxed.
    #[default]
    Contain,
    /// Preserve the aspect ratio and fill the output, cropping content.
    Cover,
}

fn is_degenerate(size: Size) -> bool {
    !(size.width > 0.0 && size.height > 0.0 && size.is_finite())
}

/// Maps content space to output space.
///
/// Degenerate sizes produce the identity.
#[must_use]
pub fn fit_transform(mode: FitMode, content: Size, output: Size) -> Affine {
    if is_degenerate(content) || is_degenerate(output) {
        return Affine::IDENTITY;
    }
    let sx = output.width / content.width;
    let sy = output.height / content.height;
    let (sx, sy) = match mode {
        FitMode::Stretch => (sx, sy),
        FitMode::Contain => (sx.min(sy), sx.min(sy)),
        FitMode::Cover => (sx.max(sy), sx.max(sy)),
    };
    let tx = (output.width - content.width * sx) * 0.5;
    let ty = (output.height - content.height * sy) * 0.5;
    Affine::new([sx, 0.0, 0.0, sy, tx, ty])
}

/// The part of the output covered by content, normalized to `[0, 1]`.
///
/// This is the present pass's clip rectangle: letterbox bars for
/// [`FitMode::Contain`], the full output otherwise.
#[must_use]
pub fn present_clip(mode: FitMode, content: Size, output: Size) -> Rect {
    let unit = Rect::new(0.0, 0.0, 1.0, 1.0);
    if is_degenerate(content) || is_degenerate(output) {
        return unit;
    }
    let covered = fit_transform(mode, content, output).transform_rect_bbox(content.to_rect());
    let normalized = Rect::new(
        covered.x0 / output.width,
        covered.y0 / output.height,
        covered.x1 / output.width,
        covered.y1 / output.height,
    );
    normalized.intersect(unit)
}

/// Maps a pointer position in output space into content space.
///
/// Returns `None` when the pointer is outside the content, for example on a
/// letterbox bar.
#[must_use]
pub fn map_pointer(mode: FitMode, content: Size, output: Size, pointer: Point) -> Option<Point> {
    if is_degenerate(content) || is_degenerate(output) {
        return None;
    }
    let local = fit_transform(mode, content, output).inverse() * pointer;
    let bounds = content.to_rect();
    (local.x >= bounds.x0 && local.x <= bounds.x1 && local.y >= bounds.y0 && local.y <= bounds.y1)
        .then_some(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: Size = Size::new(100.0, 50.0);
    const OUTPUT: Size = Size::new(200.0, 200.0);

    fn assert_rect(a: Rect, b: Rect) {
        assert!(
            (a.x0 - b.x0).abs() < 1e-9
                && (a.y0 - b.y0).abs() < 1e-9
                && (a.x1 - b.x1).abs() < 1e-9
                && (a.y1 - b.y1).abs() < 1e-9,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn contain_letterboxes() {
        let t = fit_transform(FitMode::Contain, CONTENT, OUTPUT);
        assert_eq!(t, Affine::new([2.0, 0.0, 0.0, 2.0, 0.0, 50.0]));
        assert_rect(
            present_clip(FitMode::Contain, CONTENT, OUTPUT),
            Rect::new(0.0, 0.25, 1.0, 0.75),
        );
    }

    #[test]
    fn cover_crops() {
        let t = fit_transform(FitMode::Cover, CONTENT, OUTPUT);
        assert_eq!(t, Affine::new([4.0, 0.0, 0.0, 4.0, -100.0, 0.0]));
        assert_rect(
            present_clip(FitMode::Cover, CONTENT, OUTPUT),
            Rect::new(0.0, 0.0, 1.0, 1.0),
        );
    }

    #[test]
    fn stretch_fills_both_axes() {
        let t = fit_transform(FitMode::Stretch, CONTENT, OUTPUT);
        assert_eq!(t, Affine::new([2.0, 0.0, 0.0, 4.0, 0.0, 0.0]));
        assert_rect(
            present_clip(FitMode::Stretch, CONTENT, OUTPUT),
            Rect::new(0.0, 0.0, 1.0, 1.0),
        );
    }

    #[test]
    fn degenerate_sizes_are_identity() {
        assert_eq!(
            fit_transform(FitMode::Contain, Size::ZERO, OUTPUT),
            Affine::IDENTITY
        );
        assert_eq!(
            map_pointer(FitMode::Contain, CONTENT, Size::ZERO, Point::ORIGIN),
            None
        );
    }

    #[test]
    fn pointer_maps_into_content() {
        let p = map_pointer(FitMode::Contain, CONTENT, OUTPUT, Point::new(100.0, 100.0));
        assert_eq!(p, Some(Point::new(50.0, 25.0)));
        // On the top letterbox bar.
        assert_eq!(
            map_pointer(FitMode::Contain, CONTENT, OUTPUT, Point::new(100.0, 10.0)),
            None
        );
    }
}
