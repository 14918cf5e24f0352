// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen render surfaces and the ping-pong state.
//!
//! Every frame composites into three offscreen targets of the output size:
//!
//! - [`SurfaceRole::A`] and [`SurfaceRole::B`] form the ping-pong pair. The
//!   *active* one holds the latest composite.
//! - [`SurfaceRole::Intern`] receives a draw whose blend mode needs a
//!   compositing pass, before that pass merges it with the active surface.
//!
//! Surfaces are created lazily on first use and dropped and recreated when
//! the output size changes. One depth-stencil buffer, shared by all three,
//! holds clip masks.

use core::fmt;

/// Which offscreen target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    /// First ping-pong surface.
    A,
    /// Second ping-pong surface.
    B,
    /// Scratch target for draws about to be blended in.
    Intern,
}

impl SurfaceRole {
    /// All roles, in storage order.
    pub const ALL: [Self; 3] = [Self::A, Self::B, Self::Intern];

    /// Storage index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::Intern => 2,
        }
    }

    /// The other ping-pong surface; `Intern` maps to itself.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::Intern => Self::Intern,
        }
    }
}

/// Pixel dimensions of the output and its surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Creates a size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// As a floating-point size.
    #[must_use]
    pub fn to_kurbo(self) -> kurbo::Size {
        kurbo::Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Why surfaces could not be made ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    /// The requested size has a zero dimension.
    ZeroSize,
    /// The requested size exceeds the backend's limit.
    TooLarge {
        /// Requested size.
        requested: SurfaceSize,
        /// Largest supported dimension.
        max: u32,
    },
    /// The backend failed to allocate a resource.
    Allocation,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => f.write_str("surface size has a zero dimension"),
            Self::TooLarge { requested, max } => write!(
                f,
                "surface size {}x{} exceeds the {max} pixel limit",
                requested.width, requested.height
            ),
            Self::Allocation => f.write_str("surface allocation failed"),
        }
    }
}

impl core::error::Error for SurfaceError {}

/// Creates backend resources for a [`SurfacePool`].
pub trait SurfaceFactory {
    /// A color render target that can also be sampled.
    type Surface;
    /// A depth-stencil buffer.
    type DepthStencil;

    /// Creates the surface for `role`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot allocate the surface.
    fn create_surface(&mut self, role: SurfaceRole, size: SurfaceSize) -> Result<Self::Surface, SurfaceError>;

    /// Creates the depth-stencil buffer shared by every surface of `size`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot allocate the buffer.
    fn create_depth_stencil(&mut self, size: SurfaceSize) -> Result<Self::DepthStencil, SurfaceError>;
}

/// Allocation counters of a [`SurfacePool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Color surfaces created.
    pub surfaces_created: u64,
    /// Depth-stencil buffers created.
    pub depth_stencils_created: u64,
    /// Times the pool was resized, dropping its resources.
    pub resizes: u64,
}

/// Lazily created surfaces for the three roles plus a shared depth-stencil
/// buffer, all at one size.
pub struct SurfacePool<F: SurfaceFactory> {
    factory: F,
    size: SurfaceSize,
    surfaces: [Option<F::Surface>; 3],
    depth_stencil: Option<F::DepthStencil>,
    stats: PoolStats,
}

impl<F: SurfaceFactory> fmt::Debug for SurfacePool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfacePool")
            .field("size", &self.size)
            .field(
                "live",
                &[
                    self.surfaces[0].is_some(),
                    self.surfaces[1].is_some(),
                    self.surfaces[2].is_some(),
                ],
            )
            .field("depth_stencil", &self.depth_stencil.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<F: SurfaceFactory> SurfacePool<F> {
    /// Creates an empty pool; nothing is allocated until first use.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            size: SurfaceSize::default(),
            surfaces: [None, None, None],
            depth_stencil: None,
            stats: PoolStats::default(),
        }
    }

    /// Makes the pool target `size`, dropping every resource when the size
    /// changed.
    ///
    /// Returns whether the size changed.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::ZeroSize`] for an empty size. The pool is released.
    pub fn ensure(&mut self, size: SurfaceSize) -> Result<bool, SurfaceError> {
        if size.is_empty() {
            self.release();
            self.size = SurfaceSize::default();
            return Err(SurfaceError::ZeroSize);
        }
        if size == self.size {
            return Ok(false);
        }
        if !self.size.is_empty() {
            self.stats.resizes += 1;
        }
        self.release();
        self.size = size;
        Ok(true)
    }

    /// Current target size.
    #[must_use]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// The surface for `role`, created on first use.
    ///
    /// # Errors
    ///
    /// Propagates factory failures, and [`SurfaceError::ZeroSize`] before
    /// the first [`ensure`](Self::ensure).
    pub fn surface(&mut self, role: SurfaceRole) -> Result<&mut F::Surface, SurfaceError> {
        self.create_missing(role)?;
        self.surfaces[role.index()]
            .as_mut()
            .ok_or(SurfaceError::Allocation)
    }

    /// The surface for `role` together with the shared depth-stencil buffer.
    ///
    /// # Errors
    ///
    /// Same as [`surface`](Self::surface).
    pub fn surface_with_depth(
        &mut self,
        role: SurfaceRole,
    ) -> Result<(&mut F::Surface, &mut F::DepthStencil), SurfaceError> {
        self.create_missing(role)?;
        self.create_depth_stencil()?;
        match (&mut self.surfaces[role.index()], &mut self.depth_stencil) {
            (Some(surface), Some(depth)) => Ok((surface, depth)),
            _ => Err(SurfaceError::Allocation),
        }
    }

    /// Two surfaces to read and one to write, all distinct.
    ///
    /// # Errors
    ///
    /// Same as [`surface`](Self::surface).
    ///
    /// # Panics
    ///
    /// Panics if the roles are not pairwise distinct.
    pub fn split(
        &mut self,
        read_a: SurfaceRole,
        read_b: SurfaceRole,
        write: SurfaceRole,
    ) -> Result<(&F::Surface, &F::Surface, &mut F::Surface), SurfaceError> {
        assert!(
            read_a != read_b && read_a != write && read_b != write,
            "split roles must be distinct: {read_a:?}, {read_b:?}, {write:?}"
        );
        for role in [read_a, read_b, write] {
            self.create_missing(role)?;
        }
        let [a, b, w] = self
            .surfaces
            .get_disjoint_mut([read_a.index(), read_b.index(), write.index()])
            .map_err(|_| SurfaceError::Allocation)?;
        match (a, b, w) {
            (Some(a), Some(b), Some(w)) => Ok((&*a, &*b, w)),
            _ => Err(SurfaceError::Allocation),
        }
    }

    /// The shared depth-stencil buffer, created on first use.
    ///
    /// # Errors
    ///
    /// Same as [`surface`](Self::surface).
    pub fn depth_stencil(&mut self) -> Result<&mut F::DepthStencil, SurfaceError> {
        self.create_depth_stencil()?;
        self.depth_stencil.as_mut().ok_or(SurfaceError::Allocation)
    }

    /// A surface if it exists, without creating it.
    #[must_use]
    pub fn existing(&self, role: SurfaceRole) -> Option<&F::Surface> {
        self.surfaces[role.index()].as_ref()
    }

    /// Drops every resource. The size is kept, so the next access recreates
    /// them.
    pub fn release(&mut self) {
        self.surfaces = [None, None, None];
        self.depth_stencil = None;
    }

    /// Allocation counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// The resource factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Mutable access to the resource factory.
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    fn create_missing(&mut self, role: SurfaceRole) -> Result<(), SurfaceError> {
        if self.size.is_empty() {
            return Err(SurfaceError::ZeroSize);
        }
        if self.surfaces[role.index()].is_none() {
            let surface = self.factory.create_surface(role, self.size)?;
            self.surfaces[role.index()] = Some(surface);
            self.stats.surfaces_created += 1;
            log::debug!(
                "created {role:?} surface at {}x{}",
                self.size.width,
                self.size.height
            );
        }
        Ok(())
    }

    fn create_depth_stencil(&mut self) -> Result<(), SurfaceError> {
        if self.size.is_empty() {
            return Err(SurfaceError::ZeroSize);
        }
        if self.depth_stencil.is_none() {
            self.depth_stencil = Some(self.factory.create_depth_stencil(self.size)?);
            self.stats.depth_stencils_created += 1;
        }
        Ok(())
    }
}

/// Which ping-pong surface holds the latest composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingPong {
    active: SurfaceRole,
    last_written: Option<SurfaceRole>,
    swaps: u32,
}

impl Default for PingPong {
    fn default() -> Self {
        Self::new()
    }
}

impl PingPong {
    /// Starts with [`SurfaceRole::A`] active and nothing written.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: SurfaceRole::A,
            last_written: None,
            swaps: 0,
        }
    }

    /// The surface holding the latest composite.
    #[must_use]
    pub const fn active(&self) -> SurfaceRole {
        self.active
    }

    /// The surface a compositing pass writes next.
    #[must_use]
    pub const fn inactive(&self) -> SurfaceRole {
        self.active.other()
    }

    /// Records a write to `role`.
    ///
    /// # Panics
    ///
    /// Panics if `role` is [`SurfaceRole::Intern`].
    pub fn mark_written(&mut self, role: SurfaceRole) {
        assert!(role != SurfaceRole::Intern, "Intern is not a ping-pong surface");
        self.last_written = Some(role);
    }

    /// Makes the inactive surface active.
    pub fn swap(&mut self) {
        self.active = self.active.other();
        self.swaps += 1;
    }

    /// The ping-pong surface written most recently.
    #[must_use]
    pub const fn last_written(&self) -> Option<SurfaceRole> {
        self.last_written
    }

    /// Swaps since the last reset.
    #[must_use]
    pub const fn swaps(&self) -> u32 {
        self.swaps
    }

    /// Back to [`SurfaceRole::A`] with nothing written.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
