// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor configuration.

use kurbo::Size;
use strata_core::paint::Color;
use strata_core::stroke::DEFAULT_CURVE_SEGMENTS;

use crate::fit::FitMode;

/// Configuration for the [`Compositor`](crate::Compositor).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorConfig {
    /// How content is scaled into the output.
    pub fit: FitMode,
    /// Authored content size. `None` uses the viewport size, so content is
    /// drawn 1:1 in output pixels.
    pub content_size: Option<Size>,
    /// Color the output is cleared to before the present pass.
    pub clear_color: Color,
    /// Overall opacity of the item, applied by the present pass.
    pub item_opacity: f32,
    /// Curve segments for paths that have not set their own count.
    pub default_curve_segments: u32,
}

impl CompositorConfig {
    /// Content drawn 1:1 in output pixels over a transparent output.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fit: FitMode::Contain,
            content_size: None,
            clear_color: Color::TRANSPARENT,
            item_opacity: 1.0,
            default_curve_segments: DEFAULT_CURVE_SEGMENTS,
        }
    }

    /// Fixed-size content scaled into the output with `fit`.
    #[must_use]
    pub const fn fitted(content: Size, fit: FitMode) -> Self {
        Self {
            fit,
            content_size: Some(content),
            ..Self::new()
        }
    }

    /// Returns this configuration with a clear color.
    #[must_use]
    pub const fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Returns this configuration with an item opacity.
    #[must_use]
    pub const fn with_item_opacity(mut self, opacity: f32) -> Self {
        self.item_opacity = opacity;
        self
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::new()
    }
}
