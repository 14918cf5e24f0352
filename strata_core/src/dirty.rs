// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel for path geometry.
//!
//! [`PathStore`](crate::path::PathStore) uses [`understory_dirty`] to
//! invalidate cached fill triangles and stroke outlines. Every mutation marks
//! the [`GEOMETRY`] channel with [`EagerPolicy`](understory_dirty::EagerPolicy).
//!
//! # Propagation semantics
//!
//! A path that embeds another path as a sub-path registers a dependency edge
//! from itself (the dependent) to the child. Marking the child therefore marks
//! every ancestor that composes it, because an ancestor's flattened outline
//! contains the child's contours.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Geometry accessors drain the
//! channel, clear the cache-valid flags of every drained path, and bump its
//! content generation before deciding whether to regenerate.

use understory_dirty::Channel;

/// Path commands, fill rule, curve segment count or sub-path list changed.
pub const GEOMETRY: Channel = Channel::new(0);
