// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the compositor.
//!
//! [`TraceSink`] has one method per event the compositor emits while it
//! records and replays a frame. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] counts what happened during a frame and produces a
//! [`FrameSummary`] once it has been rendered.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use strata_core::paint::BlendMode;

use crate::node::NodeIndex;
use crate::surface::{SurfaceRole, SurfaceSize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How a draw reaches the active ping-pong surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawRoute {
    /// Fixed-function blending straight into the active surface.
    Native,
    /// Drawn into the intern surface, then merged by a compositing pass.
    Emulated,
}

/// Why a draw call produced no draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// No viewport has been set, or it is zero-sized.
    InvalidViewport,
    /// The path handle no longer refers to a live path.
    StalePath,
    /// The paint or opacity cannot produce visible output.
    EmptyPaint,
    /// The effective clip is empty.
    ClippedOut,
    /// The node was taken but its geometry is empty.
    EmptyGeometry,
    /// The backend cannot draw image meshes.
    MeshUnsupported,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the compositor starts recording a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Output size the frame is recorded for.
    pub size: SurfaceSize,
}

/// Emitted for every recorded draw.
#[derive(Clone, Copy, Debug)]
pub struct DrawEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The node holding the draw.
    pub node: NodeIndex,
    /// Native or emulated.
    pub route: DrawRoute,
    /// Blend mode of the draw.
    pub blend_mode: BlendMode,
    /// Number of geometry vertices.
    pub vertex_count: u32,
    /// Surface the node is drawn into.
    pub target: SurfaceRole,
}

/// Emitted for a draw call that produces nothing.
#[derive(Clone, Copy, Debug)]
pub struct SkipEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Emitted for each compositing pass of an emulated blend.
#[derive(Clone, Copy, Debug)]
pub struct BlendPassEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Blend mode evaluated by the pass.
    pub mode: BlendMode,
    /// Surface read as backdrop.
    pub backdrop: SurfaceRole,
    /// Surface written.
    pub target: SurfaceRole,
}

/// Emitted when the backend recreated its surfaces.
#[derive(Clone, Copy, Debug)]
pub struct SurfacesEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// New surface size.
    pub size: SurfaceSize,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Draws blended natively.
    pub native_draws: u32,
    /// Draws routed through the intern surface.
    pub emulated_draws: u32,
    /// Compositing passes run.
    pub blend_passes: u32,
    /// Draw calls that produced no draw.
    pub skipped: u32,
    /// Nodes taken from the pool.
    pub nodes_taken: u32,
    /// Surface presented to the output.
    pub presented: Option<SurfaceRole>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the compositor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when recording of a frame starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called for every recorded draw.
    fn on_draw(&mut self, e: &DrawEvent) {
        _ = e;
    }

    /// Called for every skipped draw call.
    fn on_skip(&mut self, e: &SkipEvent) {
        _ = e;
    }

    /// Called for every compositing pass.
    fn on_blend_pass(&mut self, e: &BlendPassEvent) {
        _ = e;
    }

    /// Called when the backend recreated its surfaces.
    fn on_surfaces(&mut self, e: &SurfacesEvent) {
        _ = e;
    }

    /// Called once a frame has been rendered.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        (**self).on_frame_begin(e);
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        (**self).on_draw(e);
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        (**self).on_skip(e);
    }

    fn on_blend_pass(&mut self, e: &BlendPassEvent) {
        (**self).on_blend_pass(e);
    }

    fn on_surfaces(&mut self, e: &SurfacesEvent) {
        (**self).on_surfaces(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        (**self).on_frame_summary(s);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DrawEvent`].
    #[inline]
    pub fn draw(&mut self, e: &DrawEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_draw(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SkipEvent`].
    #[inline]
    pub fn skip(&mut self, e: &SkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_skip(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BlendPassEvent`].
    #[inline]
    pub fn blend_pass(&mut self, e: &BlendPassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_blend_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SurfacesEvent`].
    #[inline]
    pub fn surfaces(&mut self, e: &SurfacesEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_surfaces(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Counts draws, passes and skips during a frame and produces a
/// [`FrameSummary`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSummaryBuilder {
    native_draws: u32,
    emulated_draws: u32,
    blend_passes: u32,
    skipped: u32,
}

impl FrameSummaryBuilder {
    /// Starts an empty count.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a recorded draw.
    pub fn record_draw(&mut self, route: DrawRoute) {
        match route {
            DrawRoute::Native => self.native_draws += 1,
            DrawRoute::Emulated => self.emulated_draws += 1,
        }
    }

    /// Counts a compositing pass.
    pub fn record_blend_pass(&mut self) {
        self.blend_passes += 1;
    }

    /// Counts a skipped draw call.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(
        self,
        frame_index: u64,
        nodes_taken: u32,
        presented: Option<SurfaceRole>,
    ) -> FrameSummary {
        FrameSummary {
            frame_index,
            native_draws: self.native_draws,
            emulated_draws: self.emulated_draws,
            blend_passes: self.blend_passes,
            skipped: self.skipped,
            nodes_taken,
            presented,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draw() -> DrawEvent {
        DrawEvent {
            frame_index: 42,
            node: NodeIndex(3),
            route: DrawRoute::Emulated,
            blend_mode: BlendMode::Screen,
            vertex_count: 6,
            target: SurfaceRole::Intern,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_draw(&sample_draw());
        sink.on_skip(&SkipEvent {
            frame_index: 0,
            reason: SkipReason::ClippedOut,
        });
        sink.on_frame_summary(&FrameSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.draw(&sample_draw());
        tracer.frame_begin(&FrameBeginEvent {
            frame_index: 0,
            size: SurfaceSize::new(1, 1),
        });
    }

    #[test]
    fn summary_builder_counts() {
        let mut builder = FrameSummaryBuilder::new();
        builder.record_draw(DrawRoute::Native);
        builder.record_draw(DrawRoute::Native);
        builder.record_draw(DrawRoute::Emulated);
        builder.record_blend_pass();
        builder.record_skip();
        let summary = builder.finish(7, 4, Some(SurfaceRole::B));
        assert_eq!(
            summary,
            FrameSummary {
                frame_index: 7,
                native_draws: 2,
                emulated_draws: 1,
                blend_passes: 1,
                skipped: 1,
                nodes_taken: 4,
                presented: Some(SurfaceRole::B),
            }
        );
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            draws: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_draw(&mut self, e: &DrawEvent) {
                self.draws.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { draws: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.draw(&sample_draw());
        drop(tracer);
        assert_eq!(sink.draws, &[42]);
    }
}
