// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays path storage with allocation, composition, and cached
//! geometry.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::stroke::{DEFAULT_CURVE_SEGMENTS, StrokeKey, StrokeStyle, clamp_segments, stroke_contours};
use crate::tessellate::{FillTessellator, TessellationError};
use crate::transform::Transform3d;

use super::command::{FillRule, PathCommand, SubPath};
use super::flatten::{Contour, flatten_commands};
use super::id::PathId;

/// Recoverable failures of path composition and geometry generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathError {
    /// The handle refers to a destroyed path.
    StalePath(PathId),
    /// Embedding `child` in `parent` would make a path contain itself.
    SubPathCycle {
        /// The path that would receive the sub-path.
        parent: PathId,
        /// The path that would be embedded.
        child: PathId,
    },
    /// The fill tessellator rejected the outline.
    Tessellation(TessellationError),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StalePath(id) => write!(f, "stale path handle {id:?}"),
            Self::SubPathCycle { parent, child } => {
                write!(f, "embedding {child:?} in {parent:?} would create a cycle")
            }
            Self::Tessellation(e) => write!(f, "fill tessellation failed: {e}"),
        }
    }
}

impl core::error::Error for PathError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Tessellation(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct StrokeCacheKey {
    generation: u64,
    style: StrokeKey,
}

/// Struct-of-arrays storage for all paths.
///
/// Paths are addressed by [`PathId`] handles. Each path occupies a slot in
/// parallel arrays. Destroyed paths are recycled via a free list, and
/// generation counters prevent stale handle access.
///
/// Fill triangles and stroke outlines are cached per path. A cache is valid
/// only while the path and everything it embeds are unchanged; mutations mark
/// the path dirty and the next geometry query regenerates.
#[derive(Debug)]
pub struct PathStore {
    // -- Path data (set by callers) --
    commands: Vec<Vec<PathCommand>>,
    fill_rule: Vec<FillRule>,
    sub_paths: Vec<Vec<SubPath>>,
    curve_segments: Vec<u32>,

    // -- Composition --
    referrers: Vec<u32>,

    // -- Geometry caches --
    content_generation: Vec<u64>,
    fill_triangles: Vec<Vec<Point>>,
    fill_valid: Vec<bool>,
    stroke_outline: Vec<Vec<Point>>,
    stroke_key: Vec<Option<StrokeCacheKey>>,

    // -- Allocation --
    generation: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,

    // -- Dirty tracking --
    dirty: DirtyTracker<u32>,

    default_curve_segments: u32,
    fill_regenerations: u64,
    stroke_regenerations: u64,
}

impl Default for PathStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PathStore {
    /// Creates an empty path store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_curve_segments(DEFAULT_CURVE_SEGMENTS)
    }

    /// Creates an empty store whose new paths flatten curves into `segments`
    /// pieces (clamped to `1..=100`).
    #[must_use]
    pub fn with_curve_segments(segments: u32) -> Self {
        Self {
            commands: Vec::new(),
            fill_rule: Vec::new(),
            sub_paths: Vec::new(),
            curve_segments: Vec::new(),
            referrers: Vec::new(),
            content_generation: Vec::new(),
            fill_triangles: Vec::new(),
            fill_valid: Vec::new(),
            stroke_outline: Vec::new(),
            stroke_key: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            default_curve_segments: clamp_segments(segments),
            fill_regenerations: 0,
            stroke_regenerations: 0,
        }
    }

    // -- Allocation API --

    /// Creates an empty path and returns its handle.
    pub fn create_path(&mut self) -> PathId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.commands[i].clear();
            self.fill_rule[i] = FillRule::default();
            self.sub_paths[i].clear();
            self.curve_segments[i] = self.default_curve_segments;
            self.referrers[i] = 0;
            self.fill_triangles[i].clear();
            self.fill_valid[i] = false;
            self.stroke_outline[i].clear();
            self.stroke_key[i] = None;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.commands.push(Vec::new());
            self.fill_rule.push(FillRule::default());
            self.sub_paths.push(Vec::new());
            self.curve_segments.push(self.default_curve_segments);
            self.referrers.push(0);
            self.content_generation.push(0);
            self.fill_triangles.push(Vec::new());
            self.fill_valid.push(false);
            self.stroke_outline.push(Vec::new());
            self.stroke_key.push(None);
            self.generation.push(0);
            idx
        };

        self.mark_geometry(idx);

        PathId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a path, freeing its slot for reuse.
    ///
    /// Sub-paths it embeds are released.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or another path still embeds this one.
    pub fn destroy_path(&mut self, id: PathId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.referrers[idx as usize] == 0,
            "cannot destroy {id:?}: still embedded as a sub-path"
        );

        self.release_sub_paths(idx);
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live path.
    #[must_use]
    pub fn is_alive(&self, id: PathId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Number of live paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Whether no path is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Mutation API (auto-marks dirty) --

    /// Clears all commands and sub-paths.
    pub fn rewind(&mut self, id: PathId) {
        self.validate(id);
        self.commands[id.idx as usize].clear();
        self.release_sub_paths(id.idx);
        self.mark_geometry(id.idx);
    }

    /// Starts a new contour at `p`.
    pub fn move_to(&mut self, id: PathId, p: impl Into<Point>) {
        self.push_command(id, PathCommand::MoveTo(p.into()));
    }

    /// Adds a straight line to `p`.
    pub fn line_to(&mut self, id: PathId, p: impl Into<Point>) {
        self.push_command(id, PathCommand::LineTo(p.into()));
    }

    /// Adds a cubic Bézier through control points `c1`, `c2` to `p`.
    pub fn cubic_to(
        &mut self,
        id: PathId,
        c1: impl Into<Point>,
        c2: impl Into<Point>,
        p: impl Into<Point>,
    ) {
        self.push_command(id, PathCommand::CubicTo(c1.into(), c2.into(), p.into()));
    }

    /// Closes the current contour.
    pub fn close(&mut self, id: PathId) {
        self.push_command(id, PathCommand::Close);
    }

    /// Sets the fill rule used by [`to_fill_triangles`](Self::to_fill_triangles).
    pub fn set_fill_rule(&mut self, id: PathId, rule: FillRule) {
        self.validate(id);
        if self.fill_rule[id.idx as usize] != rule {
            self.fill_rule[id.idx as usize] = rule;
            self.mark_geometry(id.idx);
        }
    }

    /// Sets how many line pieces each cubic flattens into for fills
    /// (clamped to `1..=100`).
    pub fn set_curve_segments(&mut self, id: PathId, segments: u32) {
        self.validate(id);
        let segments = clamp_segments(segments);
        if self.curve_segments[id.idx as usize] != segments {
            self.curve_segments[id.idx as usize] = segments;
            self.mark_geometry(id.idx);
        }
    }

    /// Embeds `child` in `parent` under `transform`.
    ///
    /// The child is referenced, not copied: later edits to the child
    /// invalidate the parent's caches.
    ///
    /// # Errors
    ///
    /// [`PathError::StalePath`] if either handle is stale, and
    /// [`PathError::SubPathCycle`] if `parent` is `child` or is already
    /// embedded, directly or transitively, in `child`.
    pub fn add_sub_path(
        &mut self,
        parent: PathId,
        child: PathId,
        transform: Transform3d,
    ) -> Result<(), PathError> {
        for id in [parent, child] {
            if !self.is_alive(id) {
                return Err(PathError::StalePath(id));
            }
        }
        if parent == child || self.embeds(child.idx, parent.idx) {
            return Err(PathError::SubPathCycle { parent, child });
        }

        // The parent depends on the child: editing the child dirties it.
        let _ = self
            .dirty
            .add_dependency(parent.idx, child.idx, dirty::GEOMETRY);
        self.sub_paths[parent.idx as usize].push(SubPath { child, transform });
        self.referrers[child.idx as usize] += 1;
        self.mark_geometry(parent.idx);
        Ok(())
    }

    // -- Getters (read-only) --

    /// Returns the path's own commands.
    #[must_use]
    pub fn commands(&self, id: PathId) -> &[PathCommand] {
        self.validate(id);
        &self.commands[id.idx as usize]
    }

    /// Returns the fill rule.
    #[must_use]
    pub fn fill_rule(&self, id: PathId) -> FillRule {
        self.validate(id);
        self.fill_rule[id.idx as usize]
    }

    /// Returns the embedded sub-paths in insertion order.
    #[must_use]
    pub fn sub_paths(&self, id: PathId) -> &[SubPath] {
        self.validate(id);
        &self.sub_paths[id.idx as usize]
    }

    /// Returns the curve segment count used for fills.
    #[must_use]
    pub fn curve_segments(&self, id: PathId) -> u32 {
        self.validate(id);
        self.curve_segments[id.idx as usize]
    }

    /// Returns the path's content generation.
    ///
    /// The counter advances every time pending changes to the path, or to
    /// anything it embeds, are observed. Two equal readings mean the
    /// geometry did not change in between.
    #[must_use]
    pub fn generation(&mut self, id: PathId) -> u64 {
        self.validate(id);
        self.sync_dirty();
        self.content_generation[id.idx as usize]
    }

    /// How many times fill triangles were regenerated since creation.
    #[must_use]
    pub fn fill_regenerations(&self) -> u64 {
        self.fill_regenerations
    }

    /// How many times stroke outlines were regenerated since creation.
    #[must_use]
    pub fn stroke_regenerations(&self) -> u64 {
        self.stroke_regenerations
    }

    // -- Geometry --

    /// Flattens the path and every sub-path into contours, using the path's
    /// curve segment count.
    ///
    /// # Errors
    ///
    /// [`PathError::StalePath`] if the handle is stale.
    pub fn contours(&self, id: PathId) -> Result<Vec<Contour>, PathError> {
        if !self.is_alive(id) {
            return Err(PathError::StalePath(id));
        }
        let mut out = Vec::new();
        self.collect_contours(
            id.idx,
            &Transform3d::IDENTITY,
            self.curve_segments[id.idx as usize],
            &mut out,
        );
        Ok(out)
    }

    /// Returns the fill triangles, regenerating them through `tessellator`
    /// only if the path changed since the last call.
    ///
    /// # Errors
    ///
    /// [`PathError::StalePath`] if the handle is stale, and
    /// [`PathError::Tessellation`] if the tessellator fails. A failed
    /// tessellation leaves the cache empty and invalid.
    pub fn to_fill_triangles(
        &mut self,
        id: PathId,
        tessellator: &mut dyn FillTessellator,
    ) -> Result<&[Point], PathError> {
        if !self.is_alive(id) {
            return Err(PathError::StalePath(id));
        }
        self.sync_dirty();
        let i = id.idx as usize;
        if !self.fill_valid[i] {
            let mut contours = Vec::new();
            self.collect_contours(id.idx, &Transform3d::IDENTITY, self.curve_segments[i], &mut contours);
            let mut triangles = core::mem::take(&mut self.fill_triangles[i]);
            triangles.clear();
            let result = tessellator.triangulate(&contours, self.fill_rule[i], &mut triangles);
            self.fill_regenerations += 1;
            if let Err(e) = result {
                triangles.clear();
                self.fill_triangles[i] = triangles;
                return Err(PathError::Tessellation(e));
            }
            self.fill_triangles[i] = triangles;
            self.fill_valid[i] = true;
        }
        Ok(&self.fill_triangles[i])
    }

    /// Returns the stroke outline for `style`, regenerating it only if the
    /// path or the style changed since the last call.
    ///
    /// Curves are flattened with the style's curve segment count.
    ///
    /// # Errors
    ///
    /// [`PathError::StalePath`] if the handle is stale.
    pub fn to_stroke_outline(&mut self, id: PathId, style: &StrokeStyle) -> Result<&[Point], PathError> {
        if !self.is_alive(id) {
            return Err(PathError::StalePath(id));
        }
        self.sync_dirty();
        let i = id.idx as usize;
        let key = StrokeCacheKey {
            generation: self.content_generation[i],
            style: style.cache_key(),
        };
        if self.stroke_key[i] != Some(key) {
            let mut contours = Vec::new();
            self.collect_contours(id.idx, &Transform3d::IDENTITY, style.segments(), &mut contours);
            let mut outline = core::mem::take(&mut self.stroke_outline[i]);
            outline.clear();
            stroke_contours(&contours, style, &mut outline);
            self.stroke_outline[i] = outline;
            self.stroke_key[i] = Some(key);
            self.stroke_regenerations += 1;
        }
        Ok(&self.stroke_outline[i])
    }

    // -- Internal helpers --

    fn validate(&self, id: PathId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale PathId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn push_command(&mut self, id: PathId, command: PathCommand) {
        self.validate(id);
        self.commands[id.idx as usize].push(command);
        self.mark_geometry(id.idx);
    }

    fn mark_geometry(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
    }

    /// Drains the geometry channel into the per-path cache flags.
    fn sync_dirty(&mut self) {
        let dirty: Vec<u32> = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in dirty {
            let i = idx as usize;
            if i >= self.len as usize {
                continue;
            }
            self.fill_valid[i] = false;
            self.stroke_key[i] = None;
            self.content_generation[i] += 1;
        }
    }

    fn release_sub_paths(&mut self, idx: u32) {
        let mut subs = core::mem::take(&mut self.sub_paths[idx as usize]);
        for sub in &subs {
            self.referrers[sub.child.idx as usize] -= 1;
        }
        // Repeated embeddings of one child share a single edge.
        subs.sort_unstable_by_key(|s| s.child.idx);
        subs.dedup_by_key(|s| s.child.idx);
        for sub in &subs {
            self.dirty.remove_dependency(idx, sub.child.idx, dirty::GEOMETRY);
        }
        subs.clear();
        self.sub_paths[idx as usize] = subs;
    }

    /// Whether `ancestor` embeds `target`, directly or transitively.
    fn embeds(&self, ancestor: u32, target: u32) -> bool {
        let mut stack = alloc::vec![ancestor];
        let mut seen = alloc::vec![false; self.len as usize];
        while let Some(idx) = stack.pop() {
            if idx == target {
                return true;
            }
            if core::mem::replace(&mut seen[idx as usize], true) {
                continue;
            }
            stack.extend(self.sub_paths[idx as usize].iter().map(|s| s.child.idx));
        }
        false
    }

    fn collect_contours(&self, idx: u32, transform: &Transform3d, segments: u32, out: &mut Vec<Contour>) {
        flatten_commands(&self.commands[idx as usize], transform, segments, out);
        for sub in &self.sub_paths[idx as usize] {
            let child_transform = *transform * sub.transform;
            self.collect_contours(sub.child.idx, &child_transform, segments, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tessellate::triangle_area;

    /// Fan-triangulates each contour and counts calls.
    #[derive(Default)]
    struct CountingTessellator {
        calls: usize,
        fail: bool,
    }

    impl FillTessellator for CountingTessellator {
        fn triangulate(
            &mut self,
            contours: &[Contour],
            _fill_rule: FillRule,
            out: &mut Vec<Point>,
        ) -> Result<(), TessellationError> {
            self.calls += 1;
            if self.fail {
                return Err(TessellationError::Internal);
            }
            for c in contours {
                for w in c.points.windows(2).skip(1) {
                    out.extend_from_slice(&[c.points[0], w[0], w[1]]);
                }
            }
            Ok(())
        }
    }

    fn square(store: &mut PathStore, size: f64) -> PathId {
        let id = store.create_path();
        store.move_to(id, (0.0, 0.0));
        store.line_to(id, (size, 0.0));
        store.line_to(id, (size, size));
        store.line_to(id, (0.0, size));
        store.close(id);
        id
    }

    #[test]
    fn create_and_destroy() {
        let mut store = PathStore::new();
        let id = store.create_path();
        assert!(store.is_alive(id));
        assert_eq!(store.len(), 1);
        store.destroy_path(id);
        assert!(!store.is_alive(id));
        assert!(store.is_empty());
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = PathStore::new();
        let id1 = store.create_path();
        store.destroy_path(id1);
        let id2 = store.create_path();
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
        assert!(store.commands(id2).is_empty());
    }

    #[test]
    #[should_panic(expected = "stale PathId")]
    fn stale_handle_panics_on_mutation() {
        let mut store = PathStore::new();
        let id = store.create_path();
        store.destroy_path(id);
        store.line_to(id, (1.0, 1.0));
    }

    #[test]
    fn stale_handle_is_an_error_for_geometry() {
        let mut store = PathStore::new();
        let id = store.create_path();
        store.destroy_path(id);
        let mut tess = CountingTessellator::default();
        assert_eq!(
            store.to_fill_triangles(id, &mut tess).unwrap_err(),
            PathError::StalePath(id)
        );
        assert!(store.to_stroke_outline(id, &StrokeStyle::new(1.0)).is_err());
    }

    #[test]
    fn fill_is_idempotent_between_mutations() {
        let mut store = PathStore::new();
        let id = square(&mut store, 10.0);
        let mut tess = CountingTessellator::default();
        let first = store.to_fill_triangles(id, &mut tess).unwrap().to_vec();
        let second = store.to_fill_triangles(id, &mut tess).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(tess.calls, 1);
        assert!((triangle_area(&first) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stroke_is_idempotent_between_mutations() {
        let mut store = PathStore::new();
        let id = square(&mut store, 10.0);
        let style = StrokeStyle::new(2.0);
        let first = store.to_stroke_outline(id, &style).unwrap().to_vec();
        let second = store.to_stroke_outline(id, &style).unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(store.stroke_regenerations(), 1);
    }

    #[test]
    fn every_mutation_invalidates_caches() {
        let mut store = PathStore::new();
        let id = square(&mut store, 10.0);
        let child = square(&mut store, 2.0);
        let mut tess = CountingTessellator::default();
        let style = StrokeStyle::new(1.0);

        let mutations: [&dyn Fn(&mut PathStore); 6] = [
            &|s| s.move_to(id, (20.0, 20.0)),
            &|s| s.line_to(id, (30.0, 20.0)),
            &|s| s.cubic_to(id, (31.0, 21.0), (32.0, 22.0), (33.0, 20.0)),
            &|s| s.close(id),
            &|s| s.add_sub_path(id, child, Transform3d::IDENTITY).unwrap(),
            &|s| s.rewind(id),
        ];
        for (n, mutate) in mutations.iter().enumerate() {
            store.to_fill_triangles(id, &mut tess).unwrap();
            store.to_stroke_outline(id, &style).unwrap();
            let generation = store.generation(id);
            mutate(&mut store);
            assert_ne!(store.generation(id), generation, "mutation {n}");
            store.to_fill_triangles(id, &mut tess).unwrap();
            store.to_stroke_outline(id, &style).unwrap();
            assert_eq!(tess.calls, n + 2, "mutation {n}");
            assert_eq!(store.stroke_regenerations(), n as u64 + 2, "mutation {n}");
        }
    }

    #[test]
    fn stroke_style_change_regenerates() {
        let mut store = PathStore::new();
        let id = square(&mut store, 10.0);
        store.to_stroke_outline(id, &StrokeStyle::new(1.0)).unwrap();
        store.to_stroke_outline(id, &StrokeStyle::new(3.0)).unwrap();
        store.to_stroke_outline(id, &StrokeStyle::new(3.0)).unwrap();
        assert_eq!(store.stroke_regenerations(), 2);
    }

    #[test]
    fn editing_a_child_invalidates_its_parents() {
        let mut store = PathStore::new();
        let leaf = square(&mut store, 1.0);
        let mid = store.create_path();
        let top = store.create_path();
        store.add_sub_path(mid, leaf, Transform3d::IDENTITY).unwrap();
        store
            .add_sub_path(top, mid, Transform3d::from_translation(5.0, 0.0, 0.0))
            .unwrap();

        let mut tess = CountingTessellator::default();
        store.to_fill_triangles(top, &mut tess).unwrap();
        store.line_to(leaf, (0.5, 2.0));
        store.to_fill_triangles(top, &mut tess).unwrap();
        assert_eq!(tess.calls, 2);
    }

    #[test]
    fn sub_paths_are_transformed_into_the_parent() {
        let mut store = PathStore::new();
        let child = square(&mut store, 1.0);
        let parent = store.create_path();
        store
            .add_sub_path(parent, child, Transform3d::from_translation(10.0, 0.0, 0.0))
            .unwrap();
        store
            .add_sub_path(parent, child, Transform3d::from_scale(3.0, 3.0, 1.0))
            .unwrap();
        let contours = store.contours(parent).unwrap();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].points[0], Point::new(10.0, 0.0));
        assert_eq!(contours[1].points[2], Point::new(3.0, 3.0));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut store = PathStore::new();
        let a = store.create_path();
        let b = store.create_path();
        let c = store.create_path();
        store.add_sub_path(a, b, Transform3d::IDENTITY).unwrap();
        store.add_sub_path(b, c, Transform3d::IDENTITY).unwrap();
        assert_eq!(
            store.add_sub_path(c, a, Transform3d::IDENTITY),
            Err(PathError::SubPathCycle { parent: c, child: a })
        );
        assert_eq!(
            store.add_sub_path(a, a, Transform3d::IDENTITY),
            Err(PathError::SubPathCycle { parent: a, child: a })
        );
        // Diamonds are fine.
        store.add_sub_path(a, c, Transform3d::IDENTITY).unwrap();
    }

    #[test]
    #[should_panic(expected = "still embedded")]
    fn destroying_an_embedded_path_panics() {
        let mut store = PathStore::new();
        let parent = store.create_path();
        let child = store.create_path();
        store.add_sub_path(parent, child, Transform3d::IDENTITY).unwrap();
        store.destroy_path(child);
    }

    #[test]
    fn rewind_releases_sub_paths() {
        let mut store = PathStore::new();
        let parent = store.create_path();
        let child = store.create_path();
        store.add_sub_path(parent, child, Transform3d::IDENTITY).unwrap();
        store.add_sub_path(parent, child, Transform3d::IDENTITY).unwrap();
        store.rewind(parent);
        assert!(store.sub_paths(parent).is_empty());
        store.destroy_path(child);
    }

    #[test]
    fn failed_tessellation_is_retried() {
        let mut store = PathStore::new();
        let id = square(&mut store, 4.0);
        let mut tess = CountingTessellator {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            store.to_fill_triangles(id, &mut tess),
            Err(PathError::Tessellation(TessellationError::Internal))
        ));
        tess.fail = false;
        assert!(!store.to_fill_triangles(id, &mut tess).unwrap().is_empty());
        assert_eq!(tess.calls, 2);
    }

    #[test]
    fn curve_segments_control_fill_flattening() {
        let mut store = PathStore::with_curve_segments(4);
        let id = store.create_path();
        store.move_to(id, (0.0, 0.0));
        store.cubic_to(id, (0.0, 10.0), (10.0, 10.0), (10.0, 0.0));
        assert_eq!(store.contours(id).unwrap()[0].points.len(), 5);
        store.set_curve_segments(id, 500);
        assert_eq!(store.curve_segments(id), 100);
        assert_eq!(store.contours(id).unwrap()[0].points.len(), 101);
    }
}
