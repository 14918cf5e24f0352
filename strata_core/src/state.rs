// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render-state stack: transform, opacity and clips per save scope.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::Affine;

use crate::clip::{ClipMask, EffectiveClip, intersect_masks};
use crate::transform::Transform3d;

/// State of one save scope.
#[derive(Clone, Debug)]
pub struct ClipFrame {
    transform: Transform3d,
    clips: Vec<Rc<ClipMask>>,
    opacity: f32,
    effective: Option<Rc<EffectiveClip>>,
}

impl ClipFrame {
    fn base(transform: Transform3d) -> Self {
        Self {
            transform,
            clips: Vec::new(),
            opacity: 1.0,
            effective: None,
        }
    }

    /// Cumulative transform from path space to compositing space.
    #[must_use]
    pub fn transform(&self) -> Transform3d {
        self.transform
    }

    /// Product of every opacity pushed in this and enclosing scopes.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Clip masks active in this scope, outermost first.
    #[must_use]
    pub fn clips(&self) -> &[Rc<ClipMask>] {
        &self.clips
    }
}

impl PartialEq for ClipFrame {
    /// Frames are equal when they hold the same transform, the same opacity
    /// and the very same clip masks.
    fn eq(&self, other: &Self) -> bool {
        self.transform == other.transform
            && self.opacity == other.opacity
            && self.clips.len() == other.clips.len()
            && self
                .clips
                .iter()
                .zip(&other.clips)
                .all(|(a, b)| Rc::ptr_eq(a, b))
    }
}

/// Stack of [`ClipFrame`]s, one per open save scope.
///
/// A base frame always exists. [`restore`](Self::restore) at depth 1 is a
/// contract violation and panics.
#[derive(Clone, Debug)]
pub struct RenderStateStack {
    frames: Vec<ClipFrame>,
}

impl Default for RenderStateStack {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderStateStack {
    /// A stack holding only an identity base frame.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_transform(Transform3d::IDENTITY)
    }

    /// A stack whose base frame starts from `transform`.
    #[must_use]
    pub fn with_base_transform(transform: Transform3d) -> Self {
        Self {
            frames: alloc::vec![ClipFrame::base(transform)],
        }
    }

    /// Drops every scope and restarts from a fresh base frame.
    pub fn reset(&mut self, base: Transform3d) {
        self.frames.truncate(1);
        self.frames[0] = ClipFrame::base(base);
    }

    /// Pushes a copy of the current frame.
    pub fn save(&mut self) {
        let top = self.current().clone();
        self.frames.push(top);
    }

    /// Pops the current frame.
    ///
    /// # Panics
    ///
    /// Panics when only the base frame is left.
    pub fn restore(&mut self) {
        assert!(self.frames.len() > 1, "restore() without matching save()");
        self.frames.pop();
    }

    /// Post-multiplies the current transform by `affine`.
    pub fn transform(&mut self, affine: Affine) {
        let top = self.top_mut();
        top.transform = top.transform * Transform3d::from_affine(affine);
    }

    /// Multiplies the current opacity by `opacity` (clamped to `[0, 1]`).
    pub fn modulate_opacity(&mut self, opacity: f32) {
        let opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        self.top_mut().opacity *= opacity;
    }

    /// Adds a clip to the current scope.
    ///
    /// The mask must already be in compositing space.
    pub fn push_clip(&mut self, mask: ClipMask) {
        let top = self.top_mut();
        top.clips.push(Rc::new(mask));
        top.effective = None;
    }

    /// The innermost frame.
    #[must_use]
    pub fn current(&self) -> &ClipFrame {
        // The base frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Number of frames, at least 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Intersection of every clip in the current scope.
    ///
    /// Computed once per frame and shared until the next push.
    pub fn effective_clip(&mut self) -> Rc<EffectiveClip> {
        let top = self.top_mut();
        if let Some(effective) = &top.effective {
            return effective.clone();
        }
        let effective = Rc::new(intersect_masks(&top.clips));
        top.effective = Some(effective.clone());
        effective
    }

    fn top_mut(&mut self) -> &mut ClipFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}
