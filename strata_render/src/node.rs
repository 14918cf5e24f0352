// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-draw-call nodes and their frame pool.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use strata_core::clip::EffectiveClip;
use strata_core::paint::{BlendMode, Color, Gradient};
use strata_core::renderer::Image;
use strata_core::transform::Transform3d;

/// Index of a node taken from a [`NodePool`] this frame.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub(crate) u32);

impl NodeIndex {
    /// Raw index (for diagnostics only).
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Rebuilds an index from [`get`](Self::get), for decoding recorded
    /// traces.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({})", self.0)
    }
}

/// Geometry buffers of a node, in path space.
///
/// Without indices, `vertices` is a triangle list. With indices, the
/// indices form the triangle list. `uvs` is empty for path draws and holds
/// one texture coordinate per vertex for image draws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeGeometry {
    /// Vertex positions.
    pub vertices: Vec<Point>,
    /// Texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices (image meshes only).
    pub indices: Vec<u16>,
}

impl NodeGeometry {
    /// Whether nothing would be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.indices.is_empty() {
            self.vertices.len() < 3
        } else {
            self.indices.len() < 3
        }
    }

    /// Whether the node is an indexed image mesh.
    #[must_use]
    pub fn is_mesh(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Iterates the triangles as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let indexed = self
            .indices
            .chunks_exact(3)
            .map(|t| [usize::from(t[0]), usize::from(t[1]), usize::from(t[2])]);
        let listed = (0..self.vertices.len() / 3).map(|i| [i * 3, i * 3 + 1, i * 3 + 2]);
        let use_indices = !self.indices.is_empty();
        indexed
            .filter(move |_| use_indices)
            .chain(listed.filter(move |_| !use_indices))
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.uvs.clear();
        self.indices.clear();
    }
}

/// What a node is colored with.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePaint {
    /// A straight-alpha color.
    Solid(Color),
    /// A gradient in path space.
    Gradient(Gradient),
    /// An image sampled through the geometry's texture coordinates.
    Image(Image),
}

/// Everything needed to replay one draw call.
#[derive(Clone, Debug)]
pub struct DrawTargetNode {
    /// Geometry in path space.
    pub geometry: NodeGeometry,
    /// Color source.
    pub paint: NodePaint,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Cumulative opacity, multiplied into the paint.
    pub opacity: f32,
    /// Path space to compositing space.
    pub transform: Transform3d,
    /// Clip in compositing space, `None` when unclipped.
    pub clip: Option<Rc<EffectiveClip>>,
    /// Whether the blend mode needs a compositing pass.
    pub emulated: bool,
}

impl Default for DrawTargetNode {
    fn default() -> Self {
        Self {
            geometry: NodeGeometry::default(),
            paint: NodePaint::Solid(Color::TRANSPARENT),
            blend_mode: BlendMode::SrcOver,
            opacity: 1.0,
            transform: Transform3d::IDENTITY,
            clip: None,
            emulated: false,
        }
    }
}

impl DrawTargetNode {
    /// Returns the node to its blank state, keeping buffer capacity.
    pub fn reset(&mut self) {
        self.geometry.clear();
        self.paint = NodePaint::Solid(Color::TRANSPARENT);
        self.blend_mode = BlendMode::SrcOver;
        self.opacity = 1.0;
        self.transform = Transform3d::IDENTITY;
        self.clip = None;
        self.emulated = false;
    }

    /// The clip the node is drawn through, [`EffectiveClip::Unclipped`] when
    /// none.
    #[must_use]
    pub fn effective_clip(&self) -> &EffectiveClip {
        const UNCLIPPED: &EffectiveClip = &EffectiveClip::Unclipped;
        self.clip.as_deref().unwrap_or(UNCLIPPED)
    }
}

/// Frame-scoped pool of [`DrawTargetNode`]s.
///
/// Nodes are taken in draw order during a frame and all returned at once by
/// [`recycle`](Self::recycle). Recycled nodes are reset and reused, never
/// freed, so their buffers keep their capacity.
#[derive(Debug, Default)]
pub struct NodePool {
    nodes: Vec<DrawTargetNode>,
    taken: usize,
}

impl NodePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a blank node, reusing a recycled one when available.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` nodes are taken in one frame.
    pub fn take(&mut self) -> NodeIndex {
        if self.taken < self.nodes.len() {
            self.nodes[self.taken].reset();
        } else {
            self.nodes.push(DrawTargetNode::default());
        }
        let index = NodeIndex(
            u32::try_from(self.taken).expect("node pool holds at most u32::MAX nodes per frame"),
        );
        self.taken += 1;
        index
    }

    /// Returns every node to the pool.
    pub fn recycle(&mut self) {
        self.taken = 0;
    }

    /// A node taken this frame.
    ///
    /// # Panics
    ///
    /// Panics if the index was not taken since the last recycle.
    #[must_use]
    pub fn get(&self, index: NodeIndex) -> &DrawTargetNode {
        self.check(index);
        &self.nodes[index.0 as usize]
    }

    /// Mutable access to a node taken this frame.
    ///
    /// # Panics
    ///
    /// Panics if the index was not taken since the last recycle.
    #[must_use]
    pub fn get_mut(&mut self, index: NodeIndex) -> &mut DrawTargetNode {
        self.check(index);
        &mut self.nodes[index.0 as usize]
    }

    /// Nodes taken this frame.
    #[must_use]
    pub fn taken(&self) -> usize {
        self.taken
    }

    /// Nodes ever allocated.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates the nodes taken this frame, in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &DrawTargetNode)> + '_ {
        self.nodes[..self.taken]
            .iter()
            .zip(0_u32..)
            .map(|(node, i)| (NodeIndex(i), node))
    }

    fn check(&self, index: NodeIndex) {
        assert!(
            (index.0 as usize) < self.taken,
            "{index:?} was not taken this frame ({} taken)",
            self.taken
        );
    }
}
