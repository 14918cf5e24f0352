// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for rasterizer integrations.
//!
//! Stroke outlining, clip accumulation and the ping-pong bookkeeping all live
//! above this trait in the [`Compositor`](crate::Compositor). A backend only
//! executes the recorded [`RenderCommand`](crate::plan::RenderCommand)s:
//!
//! - **Surfaces** are usually held in a [`SurfacePool`](crate::surface::SurfacePool)
//!   and (re)created in [`prepare`](RenderBackend::prepare).
//! - **Draws** rasterize a node's triangles into one surface, through the
//!   node's clip, with its fixed-function blend state. Emulated nodes are
//!   drawn source-over into a cleared intern surface.
//! - **Blend passes** read two surfaces and write a third with one of the
//!   separable or non-separable blend formulas.
//! - **Present** draws one surface to the output.
//!
//! # Frame replay pseudocode
//!
//! ```rust,ignore
//! if backend.prepare(size)? {
//!     // surfaces were recreated
//! }
//! backend.begin_frame(&setup);
//! for command in &plan.commands {
//!     match *command {
//!         RenderCommand::Clear(role) => backend.clear(role),
//!         RenderCommand::Draw { node, target } => backend.draw(target, nodes.get(node)),
//!         RenderCommand::Blend(pass) => backend.blend(&pass),
//!     }
//! }
//! backend.present(plan.present_source, &params);
//! ```

use strata_core::paint::Color;
use strata_core::transform::Transform3d;

use crate::node::DrawTargetNode;
use crate::plan::{BlendPass, PresentParams};
use crate::surface::{SurfaceError, SurfaceRole, SurfaceSize};

/// Where row 0 of the output framebuffer is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Row 0 is the top row.
    #[default]
    TopLeft,
    /// Row 0 is the bottom row.
    BottomLeft,
}

/// Per-frame constants handed to [`RenderBackend::begin_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSetup {
    /// Frame counter.
    pub frame_index: u64,
    /// Surface size.
    pub size: SurfaceSize,
    /// Compositing space to clip space.
    pub projection: Transform3d,
    /// Color the output is cleared to before presenting.
    pub clear_color: Color,
}

/// Executes recorded surface operations.
pub trait RenderBackend {
    /// Framebuffer origin of the output.
    fn origin(&self) -> Origin {
        Origin::TopLeft
    }

    /// Whether indexed image meshes can be drawn.
    fn supports_mesh(&self) -> bool {
        true
    }

    /// Makes the surfaces ready for `size`.
    ///
    /// Returns `true` when they were (re)created.
    ///
    /// # Errors
    ///
    /// Returns an error when surfaces of that size cannot be allocated. The
    /// compositor then skips the frame.
    fn prepare(&mut self, size: SurfaceSize) -> Result<bool, SurfaceError>;

    /// Starts replaying a frame.
    fn begin_frame(&mut self, setup: &FrameSetup);

    /// Clears a surface and its clip stencil to transparent.
    fn clear(&mut self, role: SurfaceRole);

    /// Draws a node into a surface.
    fn draw(&mut self, target: SurfaceRole, node: &DrawTargetNode);

    /// Runs a full-screen compositing pass.
    fn blend(&mut self, pass: &BlendPass);

    /// Draws a surface to the output.
    fn present(&mut self, source: SurfaceRole, params: &PresentParams);
}
