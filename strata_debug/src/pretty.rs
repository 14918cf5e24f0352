// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_render::surface::SurfaceRole;
use strata_render::trace::{
    BlendPassEvent, DrawEvent, DrawRoute, FrameBeginEvent, FrameSummary, SkipEvent, SkipReason,
    SurfacesEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: true,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: true,
        }
    }

    /// Returns this sink printing only frame boundaries, skips and summaries.
    #[must_use]
    pub fn summaries_only(mut self) -> Self {
        self.verbose = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn role_name(role: SurfaceRole) -> &'static str {
    match role {
        SurfaceRole::A => "A",
        SurfaceRole::B => "B",
        SurfaceRole::Intern => "intern",
    }
}

fn skip_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::InvalidViewport => "no-viewport",
        SkipReason::StalePath => "stale-path",
        SkipReason::EmptyPaint => "empty-paint",
        SkipReason::ClippedOut => "clipped-out",
        SkipReason::EmptyGeometry => "empty-geometry",
        SkipReason::MeshUnsupported => "mesh-unsupported",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} size={}x{}",
            e.frame_index, e.size.width, e.size.height,
        );
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        if !self.verbose {
            return;
        }
        let route = match e.route {
            DrawRoute::Native => "native",
            DrawRoute::Emulated => "emulated",
        };
        let _ = writeln!(
            self.writer,
            "[draw] frame={} node={} {route} {:?} verts={} -> {}",
            e.frame_index,
            e.node.get(),
            e.blend_mode,
            e.vertex_count,
            role_name(e.target),
        );
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={} {}",
            e.frame_index,
            skip_name(e.reason),
        );
    }

    fn on_blend_pass(&mut self, e: &BlendPassEvent) {
        if !self.verbose {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[blend] frame={} {:?} intern+{} -> {}",
            e.frame_index,
            e.mode,
            role_name(e.backdrop),
            role_name(e.target),
        );
    }

    fn on_surfaces(&mut self, e: &SurfacesEvent) {
        let _ = writeln!(
            self.writer,
            "[surfaces] frame={} recreated at {}x{}",
            e.frame_index, e.size.width, e.size.height,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let presented = s.presented.map_or("none", role_name);
        let _ = writeln!(
            self.writer,
            "[summary] frame={} native={} emulated={} passes={} skipped={} nodes={} present={presented}",
            s.frame_index, s.native_draws, s.emulated_draws, s.blend_passes, s.skipped, s.nodes_taken,
        );
    }
}

#[cfg(test)]
mod tests {
    use strata_core::paint::BlendMode;
    use strata_render::node::NodeIndex;

    use super::*;

    fn sample_draw() -> DrawEvent {
        DrawEvent {
            frame_index: 1,
            node: NodeIndex::from_raw(4),
            route: DrawRoute::Emulated,
            blend_mode: BlendMode::Overlay,
            vertex_count: 12,
            target: SurfaceRole::Intern,
        }
    }

    #[test]
    fn pretty_print_draw() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_draw(&sample_draw());
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[draw]"), "got: {output}");
        assert!(output.contains("node=4 emulated Overlay"), "got: {output}");
        assert!(output.contains("-> intern"), "got: {output}");
    }

    #[test]
    fn summaries_only_drops_draws() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).summaries_only();
        sink.on_draw(&sample_draw());
        sink.on_frame_summary(&FrameSummary {
            frame_index: 1,
            presented: Some(SurfaceRole::B),
            ..FrameSummary::default()
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(!output.contains("[draw]"), "got: {output}");
        assert!(output.contains("present=B"), "got: {output}");
    }
}
