// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use strata_core::paint::BlendMode;
use strata_render::node::NodeIndex;
use strata_render::surface::{SurfaceRole, SurfaceSize};
use strata_render::trace::{
    BlendPassEvent, DrawEvent, DrawRoute, FrameBeginEvent, FrameSummary, SkipEvent, SkipReason,
    SurfacesEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_DRAW: u8 = 2;
const TAG_SKIP: u8 = 3;
const TAG_BLEND_PASS: u8 = 4;
const TAG_SURFACES: u8 = 5;
const TAG_FRAME_SUMMARY: u8 = 6;

const NO_SURFACE: u8 = 0xff;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_size(&mut self, size: SurfaceSize) {
        self.write_u32(size.width);
        self.write_u32(size.height);
    }

    fn write_role(&mut self, role: SurfaceRole) {
        self.write_u8(match role {
            SurfaceRole::A => 0,
            SurfaceRole::B => 1,
            SurfaceRole::Intern => 2,
        });
    }

    fn write_blend_mode(&mut self, mode: BlendMode) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "blend mode codes fit in a byte"
        )]
        self.write_u8(mode.code() as u8);
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_size(e.size);
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        self.write_u8(TAG_DRAW);
        self.write_u64(e.frame_index);
        self.write_u32(e.node.get());
        self.write_u8(match e.route {
            DrawRoute::Native => 0,
            DrawRoute::Emulated => 1,
        });
        self.write_blend_mode(e.blend_mode);
        self.write_u32(e.vertex_count);
        self.write_role(e.target);
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        self.write_u8(TAG_SKIP);
        self.write_u64(e.frame_index);
        self.write_u8(match e.reason {
            SkipReason::InvalidViewport => 0,
            SkipReason::StalePath => 1,
            SkipReason::EmptyPaint => 2,
            SkipReason::ClippedOut => 3,
            SkipReason::EmptyGeometry => 4,
            SkipReason::MeshUnsupported => 5,
        });
    }

    fn on_blend_pass(&mut self, e: &BlendPassEvent) {
        self.write_u8(TAG_BLEND_PASS);
        self.write_u64(e.frame_index);
        self.write_blend_mode(e.mode);
        self.write_role(e.backdrop);
        self.write_role(e.target);
    }

    fn on_surfaces(&mut self, e: &SurfacesEvent) {
        self.write_u8(TAG_SURFACES);
        self.write_u64(e.frame_index);
        self.write_size(e.size);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.native_draws);
        self.write_u32(s.emulated_draws);
        self.write_u32(s.blend_passes);
        self.write_u32(s.skipped);
        self.write_u32(s.nodes_taken);
        match s.presented {
            Some(role) => self.write_role(role),
            None => self.write_u8(NO_SURFACE),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`DrawEvent`].
    Draw(DrawEvent),
    /// A [`SkipEvent`].
    Skip(SkipEvent),
    /// A [`BlendPassEvent`].
    BlendPass(BlendPassEvent),
    /// A [`SurfacesEvent`].
    Surfaces(SurfacesEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_size(&mut self) -> Option<SurfaceSize> {
        Some(SurfaceSize::new(self.read_u32()?, self.read_u32()?))
    }

    fn read_role(&mut self) -> Option<SurfaceRole> {
        match self.read_u8()? {
            0 => Some(SurfaceRole::A),
            1 => Some(SurfaceRole::B),
            2 => Some(SurfaceRole::Intern),
            _ => None,
        }
    }

    fn read_blend_mode(&mut self) -> Option<BlendMode> {
        BlendMode::from_code(u32::from(self.read_u8()?))
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            size: self.read_size()?,
        }))
    }

    fn decode_draw(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Draw(DrawEvent {
            frame_index: self.read_u64()?,
            node: NodeIndex::from_raw(self.read_u32()?),
            route: match self.read_u8()? {
                0 => DrawRoute::Native,
                _ => DrawRoute::Emulated,
            },
            blend_mode: self.read_blend_mode()?,
            vertex_count: self.read_u32()?,
            target: self.read_role()?,
        }))
    }

    fn decode_skip(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let reason = match self.read_u8()? {
            0 => SkipReason::InvalidViewport,
            1 => SkipReason::StalePath,
            2 => SkipReason::EmptyPaint,
            3 => SkipReason::ClippedOut,
            4 => SkipReason::EmptyGeometry,
            _ => SkipReason::MeshUnsupported,
        };
        Some(RecordedEvent::Skip(SkipEvent {
            frame_index,
            reason,
        }))
    }

    fn decode_blend_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BlendPass(BlendPassEvent {
            frame_index: self.read_u64()?,
            mode: self.read_blend_mode()?,
            backdrop: self.read_role()?,
            target: self.read_role()?,
        }))
    }

    fn decode_surfaces(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Surfaces(SurfacesEvent {
            frame_index: self.read_u64()?,
            size: self.read_size()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            native_draws: self.read_u32()?,
            emulated_draws: self.read_u32()?,
            blend_passes: self.read_u32()?,
            skipped: self.read_u32()?,
            nodes_taken: self.read_u32()?,
            presented: match self.read_u8()? {
                NO_SURFACE => None,
                0 => Some(SurfaceRole::A),
                1 => Some(SurfaceRole::B),
                _ => Some(SurfaceRole::Intern),
            },
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_DRAW => self.decode_draw(),
            TAG_SKIP => self.decode_skip(),
            TAG_BLEND_PASS => self.decode_blend_pass(),
            TAG_SURFACES => self.decode_surfaces(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            _ => None, // unknown tag → stop iteration
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
            frame_index: 7,
            node: NodeIndex::from_raw(2),
            route: DrawRoute::Emulated,
            blend_mode: BlendMode::SoftLight,
            vertex_count: 96,
            target: SurfaceRole::Intern,
        }
    }

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            native_draws: 3,
            emulated_draws: 2,
            blend_passes: 2,
            skipped: 1,
            nodes_taken: 6,
            presented: Some(SurfaceRole::A),
        }
    }

    #[test]
    fn draw_event_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_draw();
        rec.on_draw(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Draw(e) => {
                assert_eq!(e.frame_index, orig.frame_index);
                assert_eq!(e.node, orig.node);
                assert_eq!(e.route, orig.route);
                assert_eq!(e.blend_mode, orig.blend_mode);
                assert_eq!(e.vertex_count, orig.vertex_count);
                assert_eq!(e.target, orig.target);
            }
            other => panic!("expected Draw, got {other:?}"),
        }
    }

    #[test]
    fn frame_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&sample_summary());
        rec.on_frame_summary(&FrameSummary::default());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (RecordedEvent::FrameSummary(a), RecordedEvent::FrameSummary(b)) => {
                assert_eq!(*a, sample_summary());
                assert_eq!(b.presented, None);
            }
            other => panic!("expected two FrameSummary events, got {other:?}"),
        }
    }

    #[test]
    fn mixed_frame_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 7,
            size: SurfaceSize::new(64, 32),
        });
        rec.on_surfaces(&SurfacesEvent {
            frame_index: 7,
            size: SurfaceSize::new(64, 32),
        });
        rec.on_draw(&sample_draw());
        rec.on_blend_pass(&BlendPassEvent {
            frame_index: 7,
            mode: BlendMode::SoftLight,
            backdrop: SurfaceRole::A,
            target: SurfaceRole::B,
        });
        rec.on_skip(&SkipEvent {
            frame_index: 7,
            reason: SkipReason::ClippedOut,
        });
        rec.on_frame_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        assert!(matches!(&events[0], RecordedEvent::FrameBegin(e) if e.size == SurfaceSize::new(64, 32)));
        assert!(matches!(events[1], RecordedEvent::Surfaces(_)));
        assert!(matches!(events[2], RecordedEvent::Draw(_)));
        assert!(matches!(
            &events[3],
            RecordedEvent::BlendPass(e) if e.target == SurfaceRole::B
        ));
        assert!(matches!(
            &events[4],
            RecordedEvent::Skip(e) if e.reason == SkipReason::ClippedOut
        ));
        assert!(matches!(events[5], RecordedEvent::FrameSummary(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_draw(&sample_draw());
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert!(events.is_empty());
    }
}
