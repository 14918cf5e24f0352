// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`RenderBackend`] implementation on CPU pixmaps.

use std::collections::HashMap;

use kurbo::{Affine, Point};
use strata_core::paint::{Color, Gradient};
use strata_core::renderer::Image;
use strata_core::resource::ResourceKey;
use strata_core::transform::Transform3d;
use strata_render::backend::{FrameSetup, Origin, RenderBackend};
use strata_render::node::{DrawTargetNode, NodePaint};
use strata_render::plan::{BlendPass, PresentParams};
use strata_render::surface::{PoolStats, SurfaceError, SurfaceFactory, SurfacePool, SurfaceRole, SurfaceSize};

use crate::blend;
use crate::pixmap::{Pixmap, Rgba, Stencil, TRANSPARENT};
use crate::raster::{Coverage, rasterize_triangle};

/// Largest surface dimension accepted by default.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// Allocates pixmaps and stencils for a [`SurfacePool`].
#[derive(Clone, Copy, Debug)]
pub struct PixmapFactory {
    max_dimension: u32,
}

impl PixmapFactory {
    /// A factory refusing dimensions above `max_dimension`.
    #[must_use]
    pub const fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Largest accepted dimension.
    #[must_use]
    pub const fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn check(&self, size: SurfaceSize) -> Result<(), SurfaceError> {
        if size.is_empty() {
            return Err(SurfaceError::ZeroSize);
        }
        if size.width > self.max_dimension || size.height > self.max_dimension {
            return Err(SurfaceError::TooLarge {
                requested: size,
                max: self.max_dimension,
            });
        }
        Ok(())
    }
}

impl SurfaceFactory for PixmapFactory {
    type Surface = Pixmap;
    type DepthStencil = Stencil;

    fn create_surface(&mut self, role: SurfaceRole, size: SurfaceSize) -> Result<Pixmap, SurfaceError> {
        self.check(size)?;
        log::debug!("cpu: {role:?} surface {}x{}", size.width, size.height);
        Ok(Pixmap::new(size.width, size.height))
    }

    fn create_depth_stencil(&mut self, size: SurfaceSize) -> Result<Stencil, SurfaceError> {
        self.check(size)?;
        Ok(Stencil::new(size.width, size.height))
    }
}

/// How a node's covered pixels get their color.
enum Shader<'a> {
    Solid(Rgba),
    Gradient {
        gradient: &'a Gradient,
        /// Pixel space to path space.
        inverse: Affine,
        opacity: f32,
    },
    Image {
        pixmap: &'a Pixmap,
        opacity: f32,
    },
}

impl Shader<'_> {
    fn shade(&self, x: u32, y: u32, uv: [f32; 2]) -> Rgba {
        match self {
            Self::Solid(color) => *color,
            Self::Gradient {
                gradient,
                inverse,
                opacity,
            } => {
                let p = *inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                gradient
                    .color_at(gradient.parameter_at(p))
                    .with_alpha_factor(*opacity)
                    .premultiplied()
            }
            Self::Image { pixmap, opacity } => sample_nearest(pixmap, uv).map(|c| c * opacity),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "texel coordinates are clamped to the image"
)]
fn sample_nearest(pixmap: &Pixmap, uv: [f32; 2]) -> Rgba {
    let (w, h) = (pixmap.width(), pixmap.height());
    if w == 0 || h == 0 {
        return TRANSPARENT;
    }
    let texel = |t: f32, n: u32| (f64::from(t) * f64::from(n)).floor().clamp(0.0, f64::from(n - 1)) as u32;
    pixmap.pixel(texel(uv[0], w), texel(uv[1], h))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "texture coordinates are single precision"
)]
fn interpolate_uv(uvs: [[f32; 2]; 3], bary: [f64; 3]) -> [f32; 2] {
    core::array::from_fn(|i| {
        (0..3)
            .map(|v| f64::from(uvs[v][i]) * bary[v])
            .sum::<f64>() as f32
    })
}

/// Clip space to pixels, row 0 at the top.
fn viewport_transform(size: SurfaceSize) -> Transform3d {
    let (w, h) = (f64::from(size.width), f64::from(size.height));
    Transform3d::from_cols(
        [w / 2.0, 0.0, 0.0, 0.0],
        [0.0, -h / 2.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [w / 2.0, h / 2.0, 0.0, 1.0],
    )
}

/// A software [`RenderBackend`].
///
/// Surfaces are [`Pixmap`]s held in a [`SurfacePool`]; clips are written to
/// the pool's shared [`Stencil`] before each clipped draw. Images are
/// registered up front with [`register_image`](Self::register_image) and
/// sampled nearest-neighbor. After [`present`](RenderBackend::present) the
/// frame is available from [`output`](Self::output).
#[derive(Debug)]
pub struct CpuBackend {
    pool: SurfacePool<PixmapFactory>,
    output: Pixmap,
    coverage: Coverage,
    images: HashMap<ResourceKey, Pixmap>,
    origin: Origin,
    to_pixels: Transform3d,
    clear_color: Color,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    /// Creates a backend with a top-left origin.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_dimension(DEFAULT_MAX_DIMENSION)
    }

    /// Creates a backend refusing surfaces wider or taller than
    /// `max_dimension`.
    #[must_use]
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            pool: SurfacePool::new(PixmapFactory::new(max_dimension)),
            output: Pixmap::new(0, 0),
            coverage: Coverage::new(0, 0),
            images: HashMap::new(),
            origin: Origin::TopLeft,
            to_pixels: Transform3d::IDENTITY,
            clear_color: Color::TRANSPARENT,
        }
    }

    /// Returns this backend with an output whose row 0 is at `origin`.
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Registers straight-alpha RGBA8 pixels under `key`, replacing any
    /// previous image with that key.
    ///
    /// Returns `None` when `rgba` is not `width * height * 4` bytes.
    pub fn register_image(&mut self, key: ResourceKey, width: u32, height: u32, rgba: &[u8]) -> Option<Image> {
        let pixmap = Pixmap::from_rgba8(width, height, rgba)?;
        self.images.insert(key, pixmap);
        Some(Image { key, width, height })
    }

    /// Drops a registered image.
    pub fn remove_image(&mut self, key: ResourceKey) -> bool {
        self.images.remove(&key).is_some()
    }

    /// The last presented frame, row 0 at the [`origin`](RenderBackend::origin).
    #[must_use]
    pub fn output(&self) -> &Pixmap {
        &self.output
    }

    /// An offscreen surface, if it has been created.
    #[must_use]
    pub fn surface(&self, role: SurfaceRole) -> Option<&Pixmap> {
        self.pool.existing(role)
    }

    /// Surface allocation counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn shader<'a>(images: &'a HashMap<ResourceKey, Pixmap>, node: &'a DrawTargetNode, to_pixels: Transform3d) -> Option<Shader<'a>> {
        match &node.paint {
            NodePaint::Solid(color) => Some(Shader::Solid(color.with_alpha_factor(node.opacity).premultiplied())),
            NodePaint::Gradient(gradient) => {
                let forward = (to_pixels * node.transform).to_affine();
                if forward.determinant().abs() < 1e-12 {
                    log::debug!("cpu: gradient under a singular transform, draw skipped");
                    return None;
                }
                Some(Shader::Gradient {
                    gradient,
                    inverse: forward.inverse(),
                    opacity: node.opacity,
                })
            }
            NodePaint::Image(image) => match images.get(&image.key) {
                Some(pixmap) => Some(Shader::Image {
                    pixmap,
                    opacity: node.opacity,
                }),
                None => {
                    log::warn!("cpu: image {:?} is not registered, draw skipped", image.key);
                    None
                }
            },
        }
    }
}

impl RenderBackend for CpuBackend {
    fn origin(&self) -> Origin {
        self.origin
    }

    fn prepare(&mut self, size: SurfaceSize) -> Result<bool, SurfaceError> {
        self.pool.factory().check(size)?;
        let changed = self.pool.ensure(size)?;
        if changed || self.output.width() != size.width || self.output.height() != size.height {
            self.output = Pixmap::new(size.width, size.height);
            self.coverage = Coverage::new(size.width, size.height);
        }
        Ok(changed)
    }

    fn begin_frame(&mut self, setup: &FrameSetup) {
        self.to_pixels = viewport_transform(setup.size) * setup.projection;
        self.clear_color = setup.clear_color;
    }

    fn clear(&mut self, role: SurfaceRole) {
        match self.pool.surface(role) {
            Ok(surface) => surface.clear(),
            Err(e) => log::warn!("cpu: clear {role:?}: {e}"),
        }
    }

    fn draw(&mut self, target: SurfaceRole, node: &DrawTargetNode) {
        let clip = node.effective_clip();
        if clip.is_empty() {
            return;
        }
        let to_pixels = self.to_pixels;
        let Some(shader) = Self::shader(&self.images, node, to_pixels) else {
            return;
        };
        let (surface, stencil) = match self.pool.surface_with_depth(target) {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("cpu: draw into {target:?}: {e}");
                return;
            }
        };
        let (width, height) = (surface.width(), surface.height());

        let clipped = clip.is_clipped();
        if clipped {
            stencil.clear();
            for tri in clip.triangles().chunks_exact(3) {
                let tri = [tri[0], tri[1], tri[2]].map(|p| to_pixels.transform_point(p));
                rasterize_triangle(tri, width, height, |x, y, _| stencil.set(x, y));
            }
        }

        let geometry = &node.geometry;
        let path_to_pixels = to_pixels * node.transform;
        let textured = geometry.uvs.len() == geometry.vertices.len();
        let coverage = &mut self.coverage;
        coverage.reset();
        for [i0, i1, i2] in geometry.triangles() {
            let (Some(&a), Some(&b), Some(&c)) = (
                geometry.vertices.get(i0),
                geometry.vertices.get(i1),
                geometry.vertices.get(i2),
            ) else {
                continue;
            };
            let tri = [a, b, c].map(|p| path_to_pixels.transform_point(p));
            let uvs = if textured {
                [geometry.uvs[i0], geometry.uvs[i1], geometry.uvs[i2]]
            } else {
                [[0.0; 2]; 3]
            };
            rasterize_triangle(tri, width, height, |x, y, bary| {
                if !clipped || stencil.get(x, y) {
                    coverage.mark(x, y, interpolate_uv(uvs, bary));
                }
            });
        }

        // Emulated draws land source-over in the cleared intern surface; the
        // compositing pass applies their mode.
        let native = if node.emulated {
            None
        } else {
            node.blend_mode.native_blend()
        };
        for (x, y, uv) in coverage.iter() {
            let src = shader.shade(x, y, uv);
            let dst = surface.pixel(x, y);
            let out = match &native {
                Some(state) => blend::apply_native(state, src, dst),
                None => blend::source_over(src, dst),
            };
            surface.set_pixel(x, y, out);
        }
    }

    fn blend(&mut self, pass: &BlendPass) {
        let (source, backdrop, target) = match self.pool.split(pass.source, pass.backdrop, pass.target) {
            Ok(surfaces) => surfaces,
            Err(e) => {
                log::warn!("cpu: {:?} pass: {e}", pass.mode);
                return;
            }
        };
        for ((out, &src), &dst) in target
            .data_mut()
            .iter_mut()
            .zip(source.data())
            .zip(backdrop.data())
        {
            *out = blend::composite(pass.mode, src, dst);
        }
    }

    fn present(&mut self, source: SurfaceRole, params: &PresentParams) {
        let clear = self.clear_color.premultiplied();
        self.output.fill(clear);
        let Some(surface) = self.pool.existing(source) else {
            log::debug!("cpu: present of {source:?} before it was drawn");
            return;
        };
        let (width, height) = (self.output.width(), self.output.height());
        let opacity = params.opacity.clamp(0.0, 1.0);
        let clip = params.clip;
        for y in 0..height {
            // The clip is in output rows; only sampling flips.
            let ny = (f64::from(y) + 0.5) / f64::from(height);
            if ny < clip.y0 || ny > clip.y1 {
                continue;
            }
            let row = if params.flip_y { height - 1 - y } else { y };
            for x in 0..width {
                let nx = (f64::from(x) + 0.5) / f64::from(width);
                if nx < clip.x0 || nx > clip.x1 {
                    continue;
                }
                let src = surface.pixel(x, row).map(|c| c * opacity);
                self.output.set_pixel(x, y, blend::source_over(src, clear));
            }
        }
    }
}
