// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path data model.
//!
//! A *path* is an ordered list of [`PathCommand`]s plus a fill rule and an
//! ordered list of [`SubPath`]s. Each path has:
//!
//! - An identity ([`PathId`]): a generational handle that becomes stale when
//!   the path is destroyed.
//! - Commands and sub-paths set by the caller through [`PathStore`].
//! - Cached geometry produced on demand:
//!   [`to_fill_triangles`](PathStore::to_fill_triangles) and
//!   [`to_stroke_outline`](PathStore::to_stroke_outline).
//!
//! Sub-paths reference other paths in the same store and form a DAG. The
//! store rejects any insertion that would close a cycle.
//!
//! # Dirty tracking
//!
//! Mutations mark the [`GEOMETRY`](crate::dirty::GEOMETRY) channel. The mark
//! propagates to every path that embeds the mutated one, so cached geometry
//! of ancestors is regenerated too.

mod command;
mod flatten;
mod id;
mod store;

pub use command::{FillRule, PathCommand, SubPath};
pub use flatten::{Contour, cubic_point, flatten_commands};
pub use id::PathId;
pub use store::{PathError, PathStore};
