// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing state machine and backend contract for strata.
//!
//! `strata_render` sits between the animation runtime's draw calls and a
//! rasterizer. It is `no_std` compatible (with `alloc`) and provides:
//!
//! - **[`Compositor`]**: implements the [`Renderer`](strata_core::renderer::Renderer)
//!   visitor, records one [`DrawTargetNode`](node::DrawTargetNode) per draw
//!   call and routes it to a surface.
//! - **[`node`]**: draw-call nodes, pooled per frame.
//! - **[`surface`]**: the three offscreen surface roles, a lazily allocating
//!   surface pool and the ping-pong state.
//! - **[`plan`]**: the recorded surface operations for one frame.
//! - **[`backend`]**: the [`RenderBackend`](backend::RenderBackend) trait that
//!   rasterizers implement.
//! - **[`fit`]**: stretch, letterbox and crop fitting of content into the output.
//! - **[`trace`]**: [`TraceSink`](trace::TraceSink) events for compositor
//!   instrumentation, with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Architecture
//!
//! ```text
//!   Renderer calls ──► Compositor ──► NodePool + FramePlan
//!                          │              │
//!                          │ native       │ emulated
//!                          ▼              ▼
//!                     active surface   Intern ──► BlendPass ──► inactive, swap
//!                          │
//!                          ▼
//!   Compositor::render ──► RenderBackend ──► present(active)
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
mod compositor;
mod config;
pub mod fit;
pub mod node;
pub mod plan;
pub mod surface;
pub mod trace;

pub use compositor::Compositor;
pub use config::CompositorConfig;
