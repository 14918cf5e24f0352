// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core geometry and state for the strata vector compositor.
//!
//! `strata_core` is `no_std` (with `alloc`) and provides:
//!
//! - **[`path`]**: path storage with generational handles, composed sub-paths
//!   and cached fill/stroke geometry invalidated through [`dirty`] tracking.
//! - **[`tessellate`]**: the fill tessellator contract.
//! - **[`stroke`]**: stroke outlining with joins and caps.
//! - **[`clip`]**: clip masks and their exact intersection.
//! - **[`state`]**: the save/restore stack of transform, opacity and clips.
//! - **[`paint`]**: colors, gradients and blend modes.
//! - **[`renderer`]**: the visitor protocol the animation runtime drives.
//! - **[`transform`]**: a column-major 4×4 transform.
//!
//! # Architecture
//!
//! ```text
//!   animation runtime
//!       │  save / restore / transform / clip_path / draw_path
//!       ▼
//!   Renderer (visitor) ──► RenderStateStack ──► EffectiveClip
//!       │
//!       ▼
//!   PathStore ──► contours ──► FillTessellator ──► fill triangles
//!                          └─► stroke outliner ──► stroke triangles
//! ```
//!
//! Compositing onto render surfaces lives in `strata_render`.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod clip;
pub mod dirty;
pub mod paint;
pub mod path;
pub mod renderer;
pub mod resource;
pub mod state;
pub mod stroke;
pub mod tessellate;
pub mod transform;
