// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame plan: the ordered surface operations recorded for one frame.

use alloc::vec::Vec;

use kurbo::Rect;
use strata_core::paint::BlendMode;

use crate::node::NodeIndex;
use crate::surface::SurfaceRole;

/// A compositing pass merging the intern surface into the ping-pong pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendPass {
    /// Blend mode evaluated per pixel.
    pub mode: BlendMode,
    /// Surface holding the layer being blended in.
    pub source: SurfaceRole,
    /// Surface holding the composite so far.
    pub backdrop: SurfaceRole,
    /// Surface receiving the result.
    pub target: SurfaceRole,
}

/// A single surface operation.
///
/// Commands are recorded in issue order and replayed in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// Clear a surface to transparent.
    Clear(SurfaceRole),
    /// Draw a node into a surface.
    Draw {
        /// The node to draw.
        node: NodeIndex,
        /// Surface receiving the draw.
        target: SurfaceRole,
    },
    /// Run a full-screen compositing pass.
    Blend(BlendPass),
}

/// Everything recorded for one frame.
#[derive(Clone, Debug)]
pub struct FramePlan {
    /// Commands in issue order.
    pub commands: Vec<RenderCommand>,
    /// Surface presented at the end of the frame.
    pub present_source: SurfaceRole,
}

impl Default for FramePlan {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePlan {
    /// Creates an empty plan presenting [`SurfaceRole::A`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            present_source: SurfaceRole::A,
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.present_source = SurfaceRole::A;
    }

    /// Appends a command.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Number of [`RenderCommand::Draw`] commands.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Draw { .. }))
            .count()
    }

    /// The compositing passes in order.
    pub fn blend_passes(&self) -> impl Iterator<Item = &BlendPass> {
        self.commands.iter().filter_map(|c| match c {
            RenderCommand::Blend(pass) => Some(pass),
            _ => None,
        })
    }
}

/// Parameters of the final full-screen pass to the output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresentParams {
    /// Overall opacity of the item.
    pub opacity: f32,
    /// Whether to flip y when sampling the surface.
    pub flip_y: bool,
    /// Region of the output covered by the content, normalized to `[0, 1]`.
    pub clip: Rect,
}

impl Default for PresentParams {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            flip_y: false,
            clip: Rect::new(0.0, 0.0, 1.0, 1.0),
        }
    }
}
