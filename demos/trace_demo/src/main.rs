// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animated scene that exercises the compositor's tracing pipeline.
//!
//! Renders 30 frames on the [`CpuBackend`] while events go to both a
//! [`PrettyPrintSink`] (summaries on stdout) and a [`RecorderSink`]. The
//! recording is written to `trace.bin` and decoded again to print totals;
//! the last frame is written to `frame.ppm`.

use std::fs::File;
use std::io::{BufWriter, Write};

use kurbo::{Affine, Point, Size};
use strata_backend_cpu::CpuBackend;
use strata_core::paint::{BlendMode, Color, Gradient, GradientStop, Paint};
use strata_core::path::{PathId, PathStore};
use strata_core::renderer::Renderer;
use strata_core::resource::ResourceKey;
use strata_core::stroke::{StrokeJoin, StrokeStyle};
use strata_debug::pretty::PrettyPrintSink;
use strata_debug::recorder::{RecordedEvent, RecorderSink, decode};
use strata_render::fit::FitMode;
use strata_render::surface::SurfaceSize;
use strata_render::trace::{
    BlendPassEvent, DrawEvent, FrameBeginEvent, FrameSummary, SkipEvent, SurfacesEvent, TraceSink,
};
use strata_render::{Compositor, CompositorConfig};
use strata_tessellate::LyonTessellator;

const FRAME_COUNT: u32 = 30;
const CONTENT: Size = Size::new(320.0, 240.0);
const OUTPUT: SurfaceSize = SurfaceSize::new(400, 240);

/// Forwards every event to two sinks.
struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.first.on_frame_begin(e);
        self.second.on_frame_begin(e);
    }

    fn on_draw(&mut self, e: &DrawEvent) {
        self.first.on_draw(e);
        self.second.on_draw(e);
    }

    fn on_skip(&mut self, e: &SkipEvent) {
        self.first.on_skip(e);
        self.second.on_skip(e);
    }

    fn on_blend_pass(&mut self, e: &BlendPassEvent) {
        self.first.on_blend_pass(e);
        self.second.on_blend_pass(e);
    }

    fn on_surfaces(&mut self, e: &SurfacesEvent) {
        self.first.on_surfaces(e);
        self.second.on_surfaces(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.first.on_frame_summary(s);
        self.second.on_frame_summary(s);
    }
}

fn rect(paths: &mut PathStore, x0: f64, y0: f64, x1: f64, y1: f64) -> PathId {
    let id = paths.create_path();
    paths.move_to(id, (x0, y0));
    paths.line_to(id, (x1, y0));
    paths.line_to(id, (x1, y1));
    paths.line_to(id, (x0, y1));
    paths.close(id);
    id
}

/// A circle of four cubics.
fn circle(paths: &mut PathStore, center: Point, r: f64) -> PathId {
    const K: f64 = 0.552_284_749_8;
    let (cx, cy, k) = (center.x, center.y, r * K);
    let id = paths.create_path();
    paths.move_to(id, (cx + r, cy));
    paths.cubic_to(id, (cx + r, cy + k), (cx + k, cy + r), (cx, cy + r));
    paths.cubic_to(id, (cx - k, cy + r), (cx - r, cy + k), (cx - r, cy));
    paths.cubic_to(id, (cx - r, cy - k), (cx - k, cy - r), (cx, cy - r));
    paths.cubic_to(id, (cx + k, cy - r), (cx + r, cy - k), (cx + r, cy));
    paths.close(id);
    id
}

fn checkerboard(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / 4 + y / 4) % 2 == 0 {
                [240, 200, 40, 255]
            } else {
                [40, 40, 160, 255]
            }
        })
        .collect()
}

fn write_ppm(path: &str, width: u32, height: u32, rgba: &[u8]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{width} {height}\n255\n")?;
    for px in rgba.chunks_exact(4) {
        out.write_all(&px[..3])?;
    }
    out.flush()
}

fn main() {
    let sink = Tee {
        first: PrettyPrintSink::new(Box::new(std::io::stdout())).summaries_only(),
        second: RecorderSink::new(),
    };
    let config = CompositorConfig::fitted(CONTENT, FitMode::Contain)
        .with_clear_color(Color::rgba(0.1, 0.1, 0.12, 1.0));
    let mut compositor = Compositor::with_trace_sink(config, sink);
    compositor.set_tessellator(LyonTessellator::new());
    compositor.update_viewport(OUTPUT);

    let mut backend = CpuBackend::new();
    let image = backend
        .register_image(ResourceKey(1), 16, 16, &checkerboard(16))
        .expect("checkerboard has 16x16 pixels");

    let paths = compositor.paths_mut();
    let background = rect(paths, 0.0, 0.0, CONTENT.width, CONTENT.height);
    let disc = circle(paths, Point::ZERO, 50.0);
    let bar = rect(paths, -80.0, -12.0, 80.0, 12.0);
    let window = rect(paths, 40.0, 40.0, 280.0, 200.0);

    let sky = Gradient::Linear {
        start: Point::ZERO,
        end: Point::new(0.0, CONTENT.height),
        stops: vec![
            GradientStop::new(0.0, Color::rgba(0.2, 0.4, 0.8, 1.0)),
            GradientStop::new(1.0, Color::rgba(0.9, 0.5, 0.3, 1.0)),
        ],
    };
    let outline = StrokeStyle::new(6.0).with_join(StrokeJoin::Round);

    for frame in 0..FRAME_COUNT {
        let t = f64::from(frame) / f64::from(FRAME_COUNT);
        let c = &mut compositor;
        c.recycle_nodes();

        c.draw_path(background, &Paint::fill(Color::WHITE).with_gradient(sky.clone()));

        c.save();
        c.clip_path(window);
        c.save();
        c.transform(Affine::translate((160.0, 120.0)) * Affine::rotate(t * std::f64::consts::TAU));
        c.draw_path(bar, &Paint::fill(Color::rgba(0.1, 0.8, 0.3, 1.0)));
        c.draw_path(
            bar,
            &Paint::stroke(Color::rgba(1.0, 1.0, 1.0, 0.8), outline),
        );
        c.restore();
        c.restore();

        c.save();
        c.transform(Affine::translate((60.0 + 200.0 * t, 120.0)));
        c.draw_path(
            disc,
            &Paint::fill(Color::rgba(1.0, 0.3, 0.2, 1.0)).with_blend_mode(BlendMode::Screen),
        );
        c.restore();

        c.save();
        c.transform(Affine::translate((240.0, 24.0)) * Affine::scale(4.0));
        c.modulate_opacity(0.5 + 0.5 * frame as f32 / FRAME_COUNT as f32);
        c.draw_image(&image, BlendMode::Multiply, 1.0);
        c.restore();

        c.render(&mut backend);
    }

    let out = backend.output();
    let rgba = out.to_rgba8();
    write_ppm("frame.ppm", out.width(), out.height(), &rgba).expect("failed to write frame.ppm");

    let recording = compositor.into_trace_sink().second.into_bytes();
    File::create("trace.bin")
        .and_then(|mut f| f.write_all(&recording))
        .expect("failed to write trace.bin");

    let (mut draws, mut passes, mut frames) = (0_u32, 0_u32, 0_u32);
    for event in decode(&recording) {
        match event {
            RecordedEvent::Draw(_) => draws += 1,
            RecordedEvent::BlendPass(_) => passes += 1,
            RecordedEvent::FrameSummary(_) => frames += 1,
            _ => {}
        }
    }
    println!(
        "Wrote frame.ppm and trace.bin ({} bytes): {frames} frames, {draws} draws, {passes} blend passes",
        recording.len()
    );
}
