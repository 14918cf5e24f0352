// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque resource keys for backend-managed resources.

use core::fmt;

/// An opaque handle to a backend-managed resource (an image texture).
///
/// Keys are assigned by the embedding and passed through the compositor
/// without interpretation; backends map them to their own storage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}
