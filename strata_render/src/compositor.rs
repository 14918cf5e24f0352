// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositor state machine.
//!
//! [`Compositor`] implements the [`Renderer`] visitor. While the animation
//! runtime walks its scene, every draw call is turned into a
//! [`DrawTargetNode`](crate::node::DrawTargetNode) and routed to a surface:
//!
//! - Natively blendable draws go straight into the active ping-pong surface.
//! - Every other blend mode is drawn into the cleared intern surface, merged
//!   with the active surface by a compositing pass that writes the inactive
//!   one, and the two swap.
//!
//! Routing only records [`RenderCommand`]s. [`Compositor::render`] replays
//! them on a [`RenderBackend`] and presents the active surface.
//!
//! # Frame lifecycle
//!
//! ```rust,ignore
//! compositor.update_viewport(size);          // once, or on resize
//! loop {
//!     compositor.recycle_nodes();             // start a frame
//!     scene.visit(&mut compositor);           // save / draw_path / ...
//!     compositor.render(&mut backend);        // replay and present
//! }
//! ```

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Affine, Point, Size};
use strata_core::clip::ClipMask;
use strata_core::paint::{BlendMode, Paint, PaintStyle};
use strata_core::path::{PathId, PathStore};
use strata_core::renderer::{Image, ImageMesh, Renderer};
use strata_core::state::RenderStateStack;
use strata_core::tessellate::FillTessellator;
use strata_core::transform::Transform3d;

use crate::backend::{FrameSetup, Origin, RenderBackend};
use crate::config::CompositorConfig;
use crate::fit;
use crate::node::{NodeIndex, NodePaint, NodePool};
use crate::plan::{BlendPass, FramePlan, PresentParams, RenderCommand};
use crate::surface::{PingPong, SurfaceRole, SurfaceSize};
use crate::trace::{
    BlendPassEvent, DrawEvent, DrawRoute, FrameBeginEvent, FrameSummaryBuilder, NoopSink, SkipEvent,
    SkipReason, SurfacesEvent, TraceSink, Tracer,
};

/// Records draw calls into surface operations and replays them on a backend.
pub struct Compositor<S: TraceSink = NoopSink> {
    config: CompositorConfig,
    paths: PathStore,
    tessellator: Option<Box<dyn FillTessellator>>,
    state: RenderStateStack,
    nodes: NodePool,
    plan: FramePlan,
    ping_pong: PingPong,
    viewport: SurfaceSize,
    projection: Option<Transform3d>,
    frame_index: u64,
    summary: FrameSummaryBuilder,
    sink: S,
}

impl<S: TraceSink> fmt::Debug for Compositor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("config", &self.config)
            .field("paths", &self.paths.len())
            .field("tessellator", &self.tessellator.is_some())
            .field("depth", &self.state.depth())
            .field("nodes", &self.nodes.taken())
            .field("ping_pong", &self.ping_pong)
            .field("viewport", &self.viewport)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Creates a compositor without tracing.
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self::with_trace_sink(config, NoopSink)
    }
}

impl<S: TraceSink> Compositor<S> {
    /// Creates a compositor that reports to `sink`.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn with_trace_sink(config: CompositorConfig, sink: S) -> Self {
        let mut compositor = Self {
            config,
            paths: PathStore::with_curve_segments(config.default_curve_segments),
            tessellator: None,
            state: RenderStateStack::new(),
            nodes: NodePool::new(),
            plan: FramePlan::new(),
            ping_pong: PingPong::new(),
            viewport: SurfaceSize::default(),
            projection: None,
            frame_index: 0,
            summary: FrameSummaryBuilder::new(),
            sink,
        };
        compositor.recycle_nodes();
        compositor
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// The path store draw calls read from.
    #[must_use]
    pub fn paths(&self) -> &PathStore {
        &self.paths
    }

    /// Mutable access to the path store, for building paths.
    pub fn paths_mut(&mut self) -> &mut PathStore {
        &mut self.paths
    }

    /// Installs the fill tessellator used by fills and clips.
    pub fn set_tessellator(&mut self, tessellator: impl FillTessellator + 'static) {
        self.tessellator = Some(Box::new(tessellator));
    }

    /// The trace sink.
    #[must_use]
    pub fn trace_sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the trace sink.
    pub fn trace_sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the compositor, returning its trace sink.
    pub fn into_trace_sink(self) -> S {
        self.sink
    }

    // -- Host interface --

    /// Sets the output size and restarts the frame being recorded.
    pub fn update_viewport(&mut self, size: SurfaceSize) {
        if size != self.viewport {
            log::debug!("viewport {}x{}", size.width, size.height);
        }
        self.viewport = size;
        self.recycle_nodes();
    }

    /// The output size.
    #[must_use]
    pub fn viewport(&self) -> SurfaceSize {
        self.viewport
    }

    /// Overrides the projection from compositing space to clip space.
    ///
    /// Non-finite matrices are ignored.
    pub fn update_projection_matrix(&mut self, projection: Transform3d) {
        if !projection.is_finite() {
            log::warn!("update_projection_matrix: non-finite matrix ignored");
            return;
        }
        self.projection = Some(projection);
    }

    /// Returns to the default orthographic projection of the viewport.
    pub fn reset_projection_matrix(&mut self) {
        self.projection = None;
    }

    /// The projection from compositing space to clip space.
    #[must_use]
    pub fn projection(&self) -> Transform3d {
        self.projection.unwrap_or_else(|| {
            let size = self.viewport.to_kurbo();
            Transform3d::orthographic(size.width, size.height, true)
        })
    }

    /// Starts a new frame: every node returns to the pool, the state stack
    /// and ping-pong pair reset, and the active surface is cleared.
    pub fn recycle_nodes(&mut self) {
        if self.state.depth() > 1 {
            log::debug!(
                "recycle_nodes: {} unbalanced save() calls dropped",
                self.state.depth() - 1
            );
        }
        self.nodes.recycle();
        self.plan.clear();
        self.state.reset(self.base_transform());
        self.ping_pong.reset();
        self.summary = FrameSummaryBuilder::new();

        let active = self.ping_pong.active();
        self.plan.push(RenderCommand::Clear(active));
        self.ping_pong.mark_written(active);
        self.plan.present_source = active;

        Tracer::new(&mut self.sink).frame_begin(&FrameBeginEvent {
            frame_index: self.frame_index,
            size: self.viewport,
        });
    }

    /// Replays the recorded frame on `backend` and presents it.
    ///
    /// The frame is skipped when there is no viewport or the backend cannot
    /// prepare its surfaces.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.viewport.is_empty() {
            log::debug!("render: no viewport, frame {} skipped", self.frame_index);
            return;
        }
        match backend.prepare(self.viewport) {
            Ok(true) => Tracer::new(&mut self.sink).surfaces(&SurfacesEvent {
                frame_index: self.frame_index,
                size: self.viewport,
            }),
            Ok(false) => {}
            Err(e) => {
                log::debug!("render: {e}, frame {} skipped", self.frame_index);
                return;
            }
        }

        backend.begin_frame(&FrameSetup {
            frame_index: self.frame_index,
            size: self.viewport,
            projection: self.projection(),
            clear_color: self.config.clear_color,
        });

        let supports_mesh = backend.supports_mesh();
        let mut summary = self.summary;
        for command in &self.plan.commands {
            match *command {
                RenderCommand::Clear(role) => backend.clear(role),
                RenderCommand::Draw { node, target } => {
                    let node = self.nodes.get(node);
                    if node.geometry.is_mesh() && !supports_mesh {
                        log::warn!("draw_image_mesh: backend has no mesh support, draw skipped");
                        summary.record_skip();
                        Tracer::new(&mut self.sink).skip(&SkipEvent {
                            frame_index: self.frame_index,
                            reason: SkipReason::MeshUnsupported,
                        });
                        continue;
                    }
                    backend.draw(target, node);
                }
                RenderCommand::Blend(pass) => backend.blend(&pass),
            }
        }

        let source = self.plan.present_source;
        backend.present(source, &self.present_params(backend.origin()));

        let taken = u32::try_from(self.nodes.taken()).unwrap_or(u32::MAX);
        let summary = summary.finish(self.frame_index, taken, Some(source));
        Tracer::new(&mut self.sink).frame_summary(&summary);
        self.frame_index += 1;
    }

    /// Parameters of the present pass for a backend with `origin`.
    #[must_use]
    pub fn present_params(&self, origin: Origin) -> PresentParams {
        PresentParams {
            opacity: unit_opacity(self.config.item_opacity),
            flip_y: origin == Origin::BottomLeft,
            clip: fit::present_clip(self.config.fit, self.content_size(), self.viewport.to_kurbo()),
        }
    }

    /// Maps a pointer position in output pixels into content space.
    ///
    /// Returns `None` outside the content.
    #[must_use]
    pub fn map_pointer(&self, pointer: Point) -> Option<Point> {
        fit::map_pointer(
            self.config.fit,
            self.content_size(),
            self.viewport.to_kurbo(),
            pointer,
        )
    }

    // -- Inspection --

    /// The render state stack.
    #[must_use]
    pub fn state(&self) -> &RenderStateStack {
        &self.state
    }

    /// The ping-pong state.
    #[must_use]
    pub fn ping_pong(&self) -> &PingPong {
        &self.ping_pong
    }

    /// The commands recorded this frame.
    #[must_use]
    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    /// The node pool.
    #[must_use]
    pub fn nodes(&self) -> &NodePool {
        &self.nodes
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // -- Internal helpers --

    fn content_size(&self) -> Size {
        self.config
            .content_size
            .unwrap_or_else(|| self.viewport.to_kurbo())
    }

    fn base_transform(&self) -> Transform3d {
        Transform3d::from_affine(fit::fit_transform(
            self.config.fit,
            self.content_size(),
            self.viewport.to_kurbo(),
        ))
    }

    fn skip(&mut self, reason: SkipReason) {
        self.summary.record_skip();
        Tracer::new(&mut self.sink).skip(&SkipEvent {
            frame_index: self.frame_index,
            reason,
        });
    }

    fn viewport_ready(&mut self, op: &str) -> bool {
        if self.viewport.is_empty() {
            log::debug!("{op}: no viewport, draw skipped");
            self.skip(SkipReason::InvalidViewport);
            return false;
        }
        true
    }

    /// Takes a node carrying the current state, or `None` when nothing would
    /// be visible.
    fn take_node(&mut self, blend_mode: BlendMode, opacity: f32) -> Option<NodeIndex> {
        let opacity = self.state.current().opacity() * opacity;
        if opacity <= 0.0 {
            self.skip(SkipReason::EmptyPaint);
            return None;
        }
        let clip = self.state.effective_clip();
        if clip.is_empty() {
            self.skip(SkipReason::ClippedOut);
            return None;
        }
        let index = self.nodes.take();
        let node = self.nodes.get_mut(index);
        node.blend_mode = blend_mode;
        node.opacity = opacity;
        node.transform = self.state.current().transform();
        node.clip = clip.is_clipped().then_some(clip);
        node.emulated = !blend_mode.is_native();
        Some(index)
    }

    /// Records the surface operations for a populated node.
    fn route(&mut self, index: NodeIndex) {
        let node = self.nodes.get(index);
        if node.geometry.is_empty() {
            self.skip(SkipReason::EmptyGeometry);
            return;
        }
        let blend_mode = node.blend_mode;
        let emulated = node.emulated;
        let vertex_count = u32::try_from(node.geometry.vertices.len()).unwrap_or(u32::MAX);

        let active = self.ping_pong.active();
        let (route, target) = if emulated {
            (DrawRoute::Emulated, SurfaceRole::Intern)
        } else {
            (DrawRoute::Native, active)
        };
        if emulated {
            self.plan.push(RenderCommand::Clear(SurfaceRole::Intern));
        }
        self.plan.push(RenderCommand::Draw {
            node: index,
            target,
        });
        self.summary.record_draw(route);
        Tracer::new(&mut self.sink).draw(&DrawEvent {
            frame_index: self.frame_index,
            node: index,
            route,
            blend_mode,
            vertex_count,
            target,
        });

        if emulated {
            let pass = BlendPass {
                mode: blend_mode,
                source: SurfaceRole::Intern,
                backdrop: active,
                target: self.ping_pong.inactive(),
            };
            self.plan.push(RenderCommand::Blend(pass));
            self.ping_pong.mark_written(pass.target);
            self.ping_pong.swap();
            self.summary.record_blend_pass();
            Tracer::new(&mut self.sink).blend_pass(&BlendPassEvent {
                frame_index: self.frame_index,
                mode: blend_mode,
                backdrop: pass.backdrop,
                target: pass.target,
            });
        } else {
            self.ping_pong.mark_written(active);
        }
        self.plan.present_source = self.ping_pong.active();
    }
}

fn unit_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) }
}

impl<S: TraceSink> Renderer for Compositor<S> {
    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn transform(&mut self, transform: Affine) {
        if !transform.is_finite() {
            log::warn!("transform: non-finite matrix ignored");
            return;
        }
        self.state.transform(transform);
    }

    fn modulate_opacity(&mut self, opacity: f32) {
        self.state.modulate_opacity(opacity);
    }

    fn draw_path(&mut self, path: PathId, paint: &Paint) {
        if !self.viewport_ready("draw_path") {
            return;
        }
        if !self.paths.is_alive(path) {
            log::warn!("draw_path: {path:?} is stale, draw skipped");
            self.skip(SkipReason::StalePath);
            return;
        }
        if paint.is_empty() {
            log::warn!("draw_path: empty paint, draw skipped");
            self.skip(SkipReason::EmptyPaint);
            return;
        }
        let Some(index) = self.take_node(paint.blend_mode, 1.0) else {
            return;
        };

        let node = self.nodes.get_mut(index);
        node.paint = match &paint.gradient {
            Some(gradient) => NodePaint::Gradient(gradient.clone()),
            None => NodePaint::Solid(paint.color),
        };
        let vertices = match paint.style {
            PaintStyle::Fill => match self.tessellator.as_deref_mut() {
                Some(tessellator) => self.paths.to_fill_triangles(path, tessellator),
                None => {
                    log::warn!("draw_path: no fill tessellator installed");
                    Ok(&[][..])
                }
            },
            PaintStyle::Stroke => self.paths.to_stroke_outline(path, &paint.stroke),
        };
        match vertices {
            Ok(vertices) => node.geometry.vertices.extend_from_slice(vertices),
            Err(e) => log::warn!("draw_path: {e}"),
        }
        self.route(index);
    }

    fn clip_path(&mut self, path: PathId) {
        let Some(tessellator) = self.tessellator.as_deref_mut() else {
            log::warn!("clip_path: no fill tessellator installed, clip ignored");
            return;
        };
        match self.paths.to_fill_triangles(path, tessellator) {
            Ok(triangles) => {
                let mask = ClipMask::from_triangles(triangles, &self.state.current().transform());
                self.state.push_clip(mask);
            }
            Err(e) => log::warn!("clip_path: {e}, clip ignored"),
        }
    }

    fn draw_image(&mut self, image: &Image, blend_mode: BlendMode, opacity: f32) {
        if !self.viewport_ready("draw_image") {
            return;
        }
        if image.is_empty() {
            log::warn!("draw_image: empty image {:?}, draw skipped", image.key);
            self.skip(SkipReason::EmptyPaint);
            return;
        }
        let Some(index) = self.take_node(blend_mode, unit_opacity(opacity)) else {
            return;
        };

        let node = self.nodes.get_mut(index);
        node.paint = NodePaint::Image(*image);
        let (w, h) = (f64::from(image.width), f64::from(image.height));
        let corners = [
            (Point::new(0.0, 0.0), [0.0, 0.0]),
            (Point::new(w, 0.0), [1.0, 0.0]),
            (Point::new(w, h), [1.0, 1.0]),
            (Point::new(0.0, h), [0.0, 1.0]),
        ];
        for i in [0, 1, 2, 0, 2, 3] {
            let (p, uv) = corners[i];
            node.geometry.vertices.push(p);
            node.geometry.uvs.push(uv);
        }
        self.route(index);
    }

    fn draw_image_mesh(&mut self, image: &Image, mesh: &ImageMesh<'_>, blend_mode: BlendMode, opacity: f32) {
        if !self.viewport_ready("draw_image_mesh") {
            return;
        }
        if image.is_empty() {
            log::warn!("draw_image_mesh: empty image {:?}, draw skipped", image.key);
            self.skip(SkipReason::EmptyPaint);
            return;
        }
        if mesh.is_degenerate() {
            log::warn!("draw_image_mesh: degenerate mesh, draw skipped");
            self.skip(SkipReason::EmptyGeometry);
            return;
        }
        let Some(index) = self.take_node(blend_mode, unit_opacity(opacity)) else {
            return;
        };

        let node = self.nodes.get_mut(index);
        node.paint = NodePaint::Image(*image);
        node.geometry.vertices.extend_from_slice(mesh.vertices);
        node.geometry.uvs.extend_from_slice(mesh.uvs);
        node.geometry.indices.extend_from_slice(mesh.indices);
        self.route(index);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use kurbo::Rect;
    use strata_core::clip::EffectiveClip;
    use strata_core::paint::Color;
    use strata_core::path::{Contour, FillRule};
    use strata_core::resource::ResourceKey;
    use strata_core::stroke::StrokeStyle;
    use strata_core::tessellate::TessellationError;

    use super::*;
    use crate::fit::FitMode;
    use crate::node::DrawTargetNode;
    use crate::surface::SurfaceError;

    /// Fan triangulation, exact for convex contours.
    struct FanTessellator;

    impl FillTessellator for FanTessellator {
        fn triangulate(
            &mut self,
            contours: &[Contour],
            _fill_rule: FillRule,
            out: &mut Vec<Point>,
        ) -> Result<(), TessellationError> {
            for contour in contours {
                let pts = &contour.points;
                for i in 1..pts.len().saturating_sub(1) {
                    out.extend_from_slice(&[pts[0], pts[i], pts[i + 1]]);
                }
            }
            Ok(())
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Op {
        Begin(u64),
        Clear(SurfaceRole),
        Draw(SurfaceRole, usize),
        Blend(BlendPass),
        Present(SurfaceRole, PresentParams),
    }

    #[derive(Debug, Default)]
    struct MockBackend {
        ops: Vec<Op>,
        size: SurfaceSize,
        bottom_left: bool,
        no_mesh: bool,
        fail: bool,
    }

    impl RenderBackend for MockBackend {
        fn origin(&self) -> Origin {
            if self.bottom_left {
                Origin::BottomLeft
            } else {
                Origin::TopLeft
            }
        }

        fn supports_mesh(&self) -> bool {
            !self.no_mesh
        }

        fn prepare(&mut self, size: SurfaceSize) -> Result<bool, SurfaceError> {
            if self.fail {
                return Err(SurfaceError::Allocation);
            }
            let changed = size != self.size;
            self.size = size;
            Ok(changed)
        }

        fn begin_frame(&mut self, setup: &FrameSetup) {
            self.ops.push(Op::Begin(setup.frame_index));
        }

        fn clear(&mut self, role: SurfaceRole) {
            self.ops.push(Op::Clear(role));
        }

        fn draw(&mut self, target: SurfaceRole, node: &DrawTargetNode) {
            self.ops.push(Op::Draw(target, node.geometry.triangle_count()));
        }

        fn blend(&mut self, pass: &BlendPass) {
            self.ops.push(Op::Blend(*pass));
        }

        fn present(&mut self, source: SurfaceRole, params: &PresentParams) {
            self.ops.push(Op::Present(source, *params));
        }
    }

    fn rect_path(paths: &mut PathStore, r: Rect) -> PathId {
        let id = paths.create_path();
        paths.move_to(id, (r.x0, r.y0));
        paths.line_to(id, (r.x1, r.y0));
        paths.line_to(id, (r.x1, r.y1));
        paths.line_to(id, (r.x0, r.y1));
        paths.close(id);
        id
    }

    fn compositor() -> Compositor {
        let mut c = Compositor::new(CompositorConfig::new());
        c.set_tessellator(FanTessellator);
        c.update_viewport(SurfaceSize::new(100, 100));
        c
    }

    fn red() -> Paint {
        Paint::fill(Color::rgba(1.0, 0.0, 0.0, 1.0))
    }

    fn assert_ping_pong_consistent(c: &Compositor) {
        let pp = c.ping_pong();
        assert_eq!(pp.last_written(), Some(pp.active()), "active surface is stale");
        assert_eq!(c.plan().present_source, pp.active());
    }

    #[test]
    fn draws_are_noops_without_viewport() {
        let mut c = Compositor::new(CompositorConfig::new());
        c.set_tessellator(FanTessellator);
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.draw_path(square, &red());
        assert_eq!(c.nodes().taken(), 0);
        assert_eq!(c.plan().commands, [RenderCommand::Clear(SurfaceRole::A)]);

        let mut backend = MockBackend::default();
        c.render(&mut backend);
        assert!(backend.ops.is_empty());
        assert_eq!(c.frame_index(), 0);
    }

    #[test]
    fn native_draw_targets_active_surface() {
        let mut c = compositor();
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.draw_path(square, &red());
        assert_eq!(
            c.plan().commands,
            [
                RenderCommand::Clear(SurfaceRole::A),
                RenderCommand::Draw {
                    node: NodeIndex(0),
                    target: SurfaceRole::A,
                },
            ]
        );
        let node = c.nodes().get(NodeIndex(0));
        assert_eq!(node.geometry.vertices.len(), 6);
        assert!(!node.emulated);
        assert!(node.clip.is_none());
        assert_ping_pong_consistent(&c);
    }

    #[test]
    fn emulated_draw_blends_through_intern() {
        let mut c = compositor();
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.draw_path(square, &red().with_blend_mode(BlendMode::Screen));
        assert_eq!(
            c.plan().commands,
            [
                RenderCommand::Clear(SurfaceRole::A),
                RenderCommand::Clear(SurfaceRole::Intern),
                RenderCommand::Draw {
                    node: NodeIndex(0),
                    target: SurfaceRole::Intern,
                },
                RenderCommand::Blend(BlendPass {
                    mode: BlendMode::Screen,
                    source: SurfaceRole::Intern,
                    backdrop: SurfaceRole::A,
                    target: SurfaceRole::B,
                }),
            ]
        );
        assert!(c.nodes().get(NodeIndex(0)).emulated);
        assert_eq!(c.ping_pong().active(), SurfaceRole::B);
        assert_ping_pong_consistent(&c);
    }

    #[test]
    fn ping_pong_stays_consistent_across_mixed_modes() {
        let mut c = compositor();
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        let modes = [
            BlendMode::SrcOver,
            BlendMode::Overlay,
            BlendMode::Multiply,
            BlendMode::Hue,
            BlendMode::Exclusion,
            BlendMode::Darken,
        ];
        for mode in modes {
            c.draw_path(square, &red().with_blend_mode(mode));
            assert_ping_pong_consistent(&c);
        }
        assert_eq!(c.ping_pong().swaps(), 3);
        assert_eq!(c.ping_pong().active(), SurfaceRole::B);
        assert_eq!(c.plan().blend_passes().count(), 3);
        assert_eq!(c.plan().draw_count(), 6);
    }

    #[test]
    fn nested_clips_intersect_per_scope() {
        let mut c = compositor();
        let paths = c.paths_mut();
        let a = rect_path(paths, Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = rect_path(paths, Rect::new(25.0, 25.0, 75.0, 75.0));
        let shape = rect_path(paths, Rect::new(0.0, 0.0, 100.0, 100.0));

        c.save();
        c.clip_path(a);
        c.save();
        c.clip_path(b);
        c.draw_path(shape, &red());
        c.restore();
        c.draw_path(shape, &red());
        c.restore();
        c.draw_path(shape, &red());

        let clip_p = c.nodes().get(NodeIndex(0)).effective_clip();
        let clip_q = c.nodes().get(NodeIndex(1)).effective_clip();
        let clip_r = c.nodes().get(NodeIndex(2)).effective_clip();
        assert!((clip_p.area().unwrap() - 625.0).abs() < 1e-6);
        assert!((clip_q.area().unwrap() - 2500.0).abs() < 1e-6);
        assert_eq!(*clip_r, EffectiveClip::Unclipped);
        assert!(clip_p.contains(Point::new(30.0, 30.0)));
        assert!(!clip_p.contains(Point::new(10.0, 10.0)));
        assert!(clip_q.contains(Point::new(10.0, 10.0)));
        assert_eq!(c.state().depth(), 1);
    }

    #[test]
    fn clips_follow_the_current_transform() {
        let mut c = compositor();
        let unit = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.save();
        c.transform(Affine::translate((20.0, 0.0)));
        c.clip_path(unit);
        c.restore();
        // The clip was popped with its scope.
        assert!(c.state().current().clips().is_empty());

        c.transform(Affine::translate((20.0, 0.0)));
        c.clip_path(unit);
        c.draw_path(unit, &red());
        let clip = c.nodes().get(NodeIndex(0)).effective_clip();
        assert!(clip.contains(Point::new(25.0, 5.0)));
        assert!(!clip.contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn disjoint_clips_take_no_node() {
        let mut c = compositor();
        let paths = c.paths_mut();
        let a = rect_path(paths, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = rect_path(paths, Rect::new(20.0, 20.0, 30.0, 30.0));
        c.clip_path(a);
        c.clip_path(b);
        c.draw_path(a, &red());
        assert_eq!(c.nodes().taken(), 0);
        assert_eq!(c.plan().draw_count(), 0);
    }

    #[test]
    fn empty_geometry_takes_a_node_without_drawing() {
        let mut c = compositor();
        let dot = c.paths_mut().create_path();
        c.paths_mut().move_to(dot, (5.0, 5.0));
        c.draw_path(dot, &red());
        assert_eq!(c.nodes().taken(), 1);
        assert_eq!(c.plan().draw_count(), 0);
    }

    #[test]
    fn stale_paths_and_empty_paints_are_skipped() {
        let mut c = compositor();
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        let gone = c.paths_mut().create_path();
        c.paths_mut().destroy_path(gone);
        c.draw_path(gone, &red());
        c.draw_path(square, &Paint::stroke(Color::BLACK, StrokeStyle::new(0.0)));
        c.modulate_opacity(0.0);
        c.draw_path(square, &red());
        assert_eq!(c.nodes().taken(), 0);
    }

    #[test]
    fn stroke_draw_uses_outline() {
        let mut c = compositor();
        let line = c.paths_mut().create_path();
        c.paths_mut().move_to(line, (0.0, 0.0));
        c.paths_mut().line_to(line, (10.0, 0.0));
        c.draw_path(line, &Paint::stroke(Color::BLACK, StrokeStyle::new(2.0)));
        let node = c.nodes().get(NodeIndex(0));
        assert_eq!(node.geometry.vertices.len(), 6);
    }

    #[test]
    fn save_restore_restores_transform_and_opacity() {
        let mut c = compositor();
        let before = c.state().current().clone();
        c.save();
        c.transform(Affine::scale(3.0));
        c.modulate_opacity(0.5);
        c.restore();
        assert_eq!(*c.state().current(), before);
    }

    #[test]
    #[should_panic(expected = "restore() without matching save()")]
    fn unbalanced_restore_panics() {
        let mut c = compositor();
        c.restore();
    }

    #[test]
    fn image_draws_carry_opacity_and_uvs() {
        let mut c = compositor();
        let image = Image {
            key: ResourceKey(7),
            width: 4,
            height: 2,
        };
        c.modulate_opacity(0.5);
        c.draw_image(&image, BlendMode::SrcOver, 0.5);
        let node = c.nodes().get(NodeIndex(0));
        assert_eq!(node.opacity, 0.25);
        assert_eq!(node.paint, NodePaint::Image(image));
        assert_eq!(node.geometry.vertices[2], Point::new(4.0, 2.0));
        assert_eq!(node.geometry.uvs[2], [1.0, 1.0]);
        assert_eq!(node.geometry.triangle_count(), 2);
    }

    #[test]
    fn degenerate_meshes_are_rejected() {
        let mut c = compositor();
        let image = Image {
            key: ResourceKey(1),
            width: 1,
            height: 1,
        };
        let vertices = [Point::ORIGIN, Point::new(1.0, 0.0)];
        let mesh = ImageMesh {
            vertices: &vertices,
            uvs: &[[0.0, 0.0], [1.0, 0.0]],
            indices: &[0, 1, 2],
        };
        c.draw_image_mesh(&image, &mesh, BlendMode::SrcOver, 1.0);
        assert_eq!(c.nodes().taken(), 0);
    }

    #[test]
    fn render_replays_and_presents() {
        let mut c = compositor();
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.draw_path(square, &red());
        c.draw_path(square, &red().with_blend_mode(BlendMode::ColorDodge));

        let mut backend = MockBackend {
            bottom_left: true,
            ..Default::default()
        };
        c.render(&mut backend);
        let params = PresentParams {
            opacity: 1.0,
            flip_y: true,
            clip: Rect::new(0.0, 0.0, 1.0, 1.0),
        };
        assert_eq!(
            backend.ops,
            [
                Op::Begin(0),
                Op::Clear(SurfaceRole::A),
                Op::Draw(SurfaceRole::A, 2),
                Op::Clear(SurfaceRole::Intern),
                Op::Draw(SurfaceRole::Intern, 2),
                Op::Blend(BlendPass {
                    mode: BlendMode::ColorDodge,
                    source: SurfaceRole::Intern,
                    backdrop: SurfaceRole::A,
                    target: SurfaceRole::B,
                }),
                Op::Present(SurfaceRole::B, params),
            ]
        );
        assert_eq!(c.frame_index(), 1);
    }

    #[test]
    fn mesh_draws_are_skipped_without_mesh_support() {
        let mut c = compositor();
        let image = Image {
            key: ResourceKey(1),
            width: 8,
            height: 8,
        };
        let vertices = [Point::ORIGIN, Point::new(8.0, 0.0), Point::new(0.0, 8.0)];
        let mesh = ImageMesh {
            vertices: &vertices,
            uvs: &[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: &[0, 1, 2],
        };
        c.draw_image_mesh(&image, &mesh, BlendMode::Luminosity, 1.0);

        let mut backend = MockBackend {
            no_mesh: true,
            ..Default::default()
        };
        c.render(&mut backend);
        assert!(!backend.ops.iter().any(|op| matches!(op, Op::Draw(..))));
        // The pass still runs so the ping-pong pair stays consistent.
        assert!(backend.ops.iter().any(|op| matches!(op, Op::Blend(..))));
        assert!(matches!(
            backend.ops.last(),
            Some(Op::Present(SurfaceRole::B, _))
        ));
    }

    #[test]
    fn failed_prepare_skips_the_frame() {
        let mut c = compositor();
        let mut backend = MockBackend {
            fail: true,
            ..Default::default()
        };
        c.render(&mut backend);
        assert!(backend.ops.is_empty());
        assert_eq!(c.frame_index(), 0);
    }

    #[test]
    fn recycle_starts_a_fresh_frame() {
        let mut c = compositor();
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.save();
        c.draw_path(square, &red().with_blend_mode(BlendMode::Overlay));
        c.recycle_nodes();
        assert_eq!(c.nodes().taken(), 0);
        assert_eq!(c.nodes().allocated(), 1);
        assert_eq!(c.state().depth(), 1);
        assert_eq!(c.ping_pong().active(), SurfaceRole::A);
        assert_eq!(c.plan().commands, [RenderCommand::Clear(SurfaceRole::A)]);
    }

    #[test]
    fn fitted_content_sets_base_transform_and_present_clip() {
        let mut c = Compositor::new(CompositorConfig::fitted(
            Size::new(100.0, 50.0),
            FitMode::Contain,
        ));
        c.update_viewport(SurfaceSize::new(200, 200));
        let expected = Transform3d::from_affine(Affine::new([2.0, 0.0, 0.0, 2.0, 0.0, 50.0]));
        assert_eq!(c.state().current().transform(), expected);
        assert_eq!(
            c.present_params(Origin::TopLeft).clip,
            Rect::new(0.0, 0.25, 1.0, 0.75)
        );
        assert_eq!(c.map_pointer(Point::new(100.0, 100.0)), Some(Point::new(50.0, 25.0)));
        assert_eq!(c.map_pointer(Point::new(100.0, 5.0)), None);
    }

    #[test]
    fn projection_override() {
        let mut c = compositor();
        assert_eq!(c.projection(), Transform3d::orthographic(100.0, 100.0, true));
        let custom = Transform3d::from_scale(2.0, 2.0, 1.0);
        c.update_projection_matrix(custom);
        let mut bad = custom;
        bad.cols[0][0] = f64::NAN;
        c.update_projection_matrix(bad);
        assert_eq!(c.projection(), custom);
        c.reset_projection_matrix();
        assert_eq!(c.projection(), Transform3d::orthographic(100.0, 100.0, true));
    }

    #[test]
    fn without_tessellator_fills_are_empty() {
        let mut c = Compositor::new(CompositorConfig::new());
        c.update_viewport(SurfaceSize::new(10, 10));
        let square = rect_path(c.paths_mut(), Rect::new(0.0, 0.0, 10.0, 10.0));
        c.clip_path(square);
        c.draw_path(square, &red());
        assert!(c.state().current().clips().is_empty());
        assert_eq!(c.nodes().taken(), 1);
        assert_eq!(c.plan().draw_count(), 0);
    }
}
