// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! wgpu backend for strata.
//!
//! [`WgpuBackend`] implements [`RenderBackend`](strata_render::backend::RenderBackend)
//! with one render pass per recorded command:
//!
//! - Draws use a pipeline per natively blendable mode. Clips are written
//!   into a shared stencil buffer by a color-masked pass over the clip
//!   triangles, and the node pass only touches pixels whose stencil is set.
//! - Blend passes run a full-screen shader evaluating every blend mode on
//!   two offscreen surfaces.
//! - Present draws the final surface through the content clip, with
//!   opacity and an optional vertical flip, over the clear color.
//!
//! The whole frame is recorded into one command encoder and submitted in
//! `present`. Uniform, vertex and index buffers, gradient ramps and bind
//! groups live in per-frame slots that later frames refill in place;
//! [`ResourceStats`] counts what had to be created.
//!
//! ```rust,ignore
//! let mut backend = WgpuBackend::headless()?;
//! compositor.render(&mut backend);
//! let rgba = backend.read_output()?;
//! ```

mod arena;
mod backend;
mod error;
mod gpu_types;
mod pipelines;
mod shaders;

pub use arena::ResourceStats;
pub use backend::{GpuSurface, TextureFactory, WgpuBackend};
pub use error::BackendError;
