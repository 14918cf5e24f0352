// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software rasterizer backend for strata.
//!
//! [`CpuBackend`] implements [`RenderBackend`](strata_render::backend::RenderBackend)
//! on premultiplied `f32` pixmaps. It needs no GPU, so it serves headless
//! rendering and pixel-exact tests of the compositor.
//!
//! - **[`pixmap`]**: color surfaces and the clip stencil.
//! - **[`raster`]**: pixel-center triangle rasterization with the top-left
//!   rule, and the per-draw coverage mask.
//! - **[`blend`]**: fixed-function blend evaluation and the compositing
//!   formulas of every blend mode.
//!
//! ```rust,ignore
//! let mut backend = CpuBackend::new();
//! compositor.render(&mut backend);
//! let rgba = backend.output().to_rgba8();
//! ```

mod backend;
pub mod blend;
pub mod pixmap;
pub mod raster;

pub use backend::{CpuBackend, DEFAULT_MAX_DIMENSION, PixmapFactory};
