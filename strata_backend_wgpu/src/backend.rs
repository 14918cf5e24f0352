// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`RenderBackend`] implementation on wgpu.

use std::collections::HashMap;
use std::sync::mpsc;

use core::fmt;

use strata_core::paint::{BlendMode, Color};
use strata_core::renderer::Image;
use strata_core::resource::ResourceKey;
use strata_core::transform::Transform3d;
use strata_render::backend::{FrameSetup, Origin, RenderBackend};
use strata_render::node::{DrawTargetNode, NodePaint};
use strata_render::plan::{BlendPass, PresentParams};
use strata_render::surface::{PoolStats, SurfaceError, SurfaceFactory, SurfacePool, SurfaceRole, SurfaceSize};

use crate::arena::{BlendSlot, DrawSlot, FrameArena, Keyed, PaintBinding, ResourceStats, uniform_buffer};
use crate::error::BackendError;
use crate::gpu_types::{
    BlendUniforms, DrawUniforms, PresentUniforms, RAMP_WIDTH, gradient_ramp, pack_vertices, padded_bytes_per_row,
    premultiply_rgba8, unpremultiply_rgba8,
};
use crate::pipelines::{Pipelines, STENCIL_FORMAT, SURFACE_FORMAT};

/// A texture with its default view.
#[derive(Clone, Debug)]
pub struct GpuSurface {
    /// The texture.
    pub texture: wgpu::Texture,
    /// View of the whole texture.
    pub view: wgpu::TextureView,
}

impl GpuSurface {
    pub(crate) fn new(
        device: &wgpu::Device,
        label: &str,
        size: SurfaceSize,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

fn extent(size: SurfaceSize) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    let [r, g, b, a] = color.premultiplied();
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: f64::from(a),
    }
}

/// Allocates offscreen textures for a [`SurfacePool`].
pub struct TextureFactory {
    device: wgpu::Device,
    max_dimension: u32,
}

impl fmt::Debug for TextureFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureFactory")
            .field("max_dimension", &self.max_dimension)
            .finish_non_exhaustive()
    }
}

impl TextureFactory {
    /// A factory bounded by the device's 2D texture limit.
    #[must_use]
    pub fn new(device: wgpu::Device) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        Self {
            device,
            max_dimension,
        }
    }

    /// Largest accepted dimension.
    #[must_use]
    pub fn max_dimension(&self) -> u32 {
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

impl SurfaceFactory for TextureFactory {
    type Surface = GpuSurface;
    type DepthStencil = GpuSurface;

    fn create_surface(&mut self, role: SurfaceRole, size: SurfaceSize) -> Result<GpuSurface, SurfaceError> {
        self.check(size)?;
        log::debug!("wgpu: {role:?} surface {}x{}", size.width, size.height);
        Ok(GpuSurface::new(
            &self.device,
            "strata surface",
            size,
            SURFACE_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        ))
    }

    fn create_depth_stencil(&mut self, size: SurfaceSize) -> Result<GpuSurface, SurfaceError> {
        self.check(size)?;
        Ok(GpuSurface::new(
            &self.device,
            "strata stencil",
            size,
            STENCIL_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        ))
    }
}

/// An uploaded image; the generation changes on every upload.
#[derive(Debug)]
struct UploadedImage {
    surface: GpuSurface,
    generation: u64,
}

/// The frame's command encoder, created on first use.
fn encoder<'a>(slot: &'a mut Option<wgpu::CommandEncoder>, device: &wgpu::Device) -> &'a mut wgpu::CommandEncoder {
    slot.get_or_insert_with(|| {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("strata frame"),
        })
    })
}

/// A [`RenderBackend`] recording every frame into one command buffer.
///
/// Offscreen surfaces are `Rgba8Unorm` textures in a [`SurfacePool`],
/// sharing one `Stencil8` buffer for clips. The frame is submitted in
/// [`present`](RenderBackend::present), drawn either into an external
/// [`target`](Self::set_target) view or an owned output texture that
/// [`read_output`](Self::read_output) copies back.
///
/// Per-pass buffers and bind groups are kept in slots reused by later
/// frames, so a steady scene allocates nothing after its first frame.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: Pipelines,
    pool: SurfacePool<TextureFactory>,
    images: HashMap<ResourceKey, UploadedImage>,
    uploads: u64,
    blank: GpuSurface,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
    draws: FrameArena<DrawSlot>,
    blends: FrameArena<BlendSlot>,
    /// Projection-only uniforms shared by every clip pass of a frame.
    clip_uniforms: wgpu::Buffer,
    clip_group: wgpu::BindGroup,
    present_uniforms: wgpu::Buffer,
    present_binding: Keyed<SurfaceRole, wgpu::BindGroup>,
    stats: ResourceStats,
    output_format: wgpu::TextureFormat,
    output: Option<GpuSurface>,
    target: Option<wgpu::TextureView>,
    encoder: Option<wgpu::CommandEncoder>,
    origin: Origin,
    size: SurfaceSize,
    projection: Transform3d,
    clear_color: Color,
    presented: bool,
}

impl fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("pool", &self.pool)
            .field("images", &self.images.len())
            .field("output_format", &self.output_format)
            .field("external_target", &self.target.is_some())
            .field("origin", &self.origin)
            .field("size", &self.size)
            .field("draw_slots", &self.draws.len())
            .field("blend_slots", &self.blends.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl WgpuBackend {
    /// Creates a backend presenting to views of `output_format`.
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, output_format: wgpu::TextureFormat) -> Self {
        let pipelines = Pipelines::new(&device, output_format);
        let blank = GpuSurface::new(
            &device,
            "strata blank",
            SurfaceSize::new(1, 1),
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        write_rgba8(&queue, &blank.texture, SurfaceSize::new(1, 1), &[255; 4]);
        let sampler = |label, filter| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                mag_filter: filter,
                min_filter: filter,
                ..Default::default()
            })
        };
        let nearest = sampler("strata nearest", wgpu::FilterMode::Nearest);
        let linear = sampler("strata linear", wgpu::FilterMode::Linear);
        let mut stats = ResourceStats::default();
        let clip_uniforms = uniform_buffer::<DrawUniforms>(&device, &mut stats, "strata clip uniforms");
        let clip_group = node_bind_group(&device, &pipelines.node_layout, &clip_uniforms, &blank.view, &nearest);
        let present_uniforms = uniform_buffer::<PresentUniforms>(&device, &mut stats, "strata present uniforms");
        Self {
            pool: SurfacePool::new(TextureFactory::new(device.clone())),
            device,
            queue,
            pipelines,
            images: HashMap::new(),
            uploads: 0,
            blank,
            nearest,
            linear,
            draws: FrameArena::default(),
            blends: FrameArena::default(),
            clip_uniforms,
            clip_group,
            present_uniforms,
            present_binding: Keyed::default(),
            stats,
            output_format,
            output: None,
            target: None,
            encoder: None,
            origin: Origin::TopLeft,
            size: SurfaceSize::default(),
            projection: Transform3d::IDENTITY,
            clear_color: Color::TRANSPARENT,
            presented: false,
        }
    }

    /// Creates a backend on the default adapter with an `Rgba8Unorm` output
    /// texture and no window surface.
    ///
    /// # Errors
    ///
    /// [`BackendError::NoAdapter`] when no adapter is available, or the
    /// device request error.
    pub fn headless() -> Result<Self, BackendError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .ok_or(BackendError::NoAdapter)?;
        log::info!("wgpu: headless on {}", adapter.get_info().name);
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("strata"),
                ..Default::default()
            },
            None,
        ))?;
        Ok(Self::new(device, queue, wgpu::TextureFormat::Rgba8Unorm))
    }

    /// Returns this backend with an output whose row 0 is at `origin`.
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// The device.
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue frames are submitted to.
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Presents into `view` (of the output format) instead of the owned
    /// output texture; `None` goes back to the owned texture.
    pub fn set_target(&mut self, view: Option<wgpu::TextureView>) {
        self.target = view;
    }

    /// Uploads straight-alpha RGBA8 pixels under `key`, replacing any
    /// previous image with that key.
    ///
    /// # Errors
    ///
    /// [`BackendError::ImageSize`] when `rgba` is not `width * height * 4`
    /// bytes or a dimension is zero, [`BackendError::ImageTooLarge`] past
    /// the device limit.
    pub fn upload_image(&mut self, key: ResourceKey, width: u32, height: u32, rgba: &[u8]) -> Result<Image, BackendError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if width == 0 || height == 0 || expected != Some(rgba.len()) {
            return Err(BackendError::ImageSize {
                width,
                height,
                len: rgba.len(),
            });
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(BackendError::ImageTooLarge { max });
        }
        let size = SurfaceSize::new(width, height);
        let image = GpuSurface::new(
            &self.device,
            "strata image",
            size,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let mut pixels = rgba.to_vec();
        premultiply_rgba8(&mut pixels);
        write_rgba8(&self.queue, &image.texture, size, &pixels);
        self.uploads += 1;
        self.images.insert(
            key,
            UploadedImage {
                surface: image,
                generation: self.uploads,
            },
        );
        Ok(Image { key, width, height })
    }

    /// Drops an uploaded image.
    pub fn remove_image(&mut self, key: ResourceKey) -> bool {
        self.images.remove(&key).is_some()
    }

    /// The owned output texture, once a size has been prepared.
    #[must_use]
    pub fn output_texture(&self) -> Option<&wgpu::Texture> {
        self.output.as_ref().map(|o| &o.texture)
    }

    /// An offscreen surface, if it has been created.
    #[must_use]
    pub fn surface(&self, role: SurfaceRole) -> Option<&GpuSurface> {
        self.pool.existing(role)
    }

    /// Surface allocation counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Counters of the buffers, textures and bind groups created for
    /// frames, surfaces excluded.
    #[must_use]
    pub fn resource_stats(&self) -> ResourceStats {
        self.stats
    }

    /// Copies the owned output texture back as straight-alpha RGBA8 rows,
    /// row 0 first. Blocks until the GPU is done. Assumes a four-byte RGBA
    /// output format.
    ///
    /// # Errors
    ///
    /// [`BackendError::NothingPresented`] before the first present to the
    /// owned texture, or a mapping failure.
    pub fn read_output(&self) -> Result<Vec<u8>, BackendError> {
        let Some(output) = self.output.as_ref().filter(|_| self.presented) else {
            return Err(BackendError::NothingPresented);
        };
        let (width, height) = (self.size.width, self.size.height);
        let padded = padded_bytes_per_row(width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata readback"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &output.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            extent(self.size),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| BackendError::ReadbackLost)?
            .map_err(BackendError::Readback)?;

        let row_bytes = width as usize * 4;
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks_exact(padded as usize) {
                pixels.extend_from_slice(&row[..row_bytes]);
            }
        }
        buffer.unmap();
        unpremultiply_rgba8(&mut pixels);
        Ok(pixels)
    }
}

fn node_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("strata node"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn write_rgba8(queue: &wgpu::Queue, texture: &wgpu::Texture, size: SurfaceSize, pixels: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width * 4),
            rows_per_image: Some(size.height),
        },
        extent(size),
    );
}

fn single_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    stencil: Option<(&wgpu::TextureView, u32)>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: stencil.map(|(view, clear)| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: None,
            stencil_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            }),
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

impl RenderBackend for WgpuBackend {
    fn origin(&self) -> Origin {
        self.origin
    }

    fn prepare(&mut self, size: SurfaceSize) -> Result<bool, SurfaceError> {
        self.pool.factory().check(size)?;
        let changed = self.pool.ensure(size)?;
        if changed {
            // Cached bind groups point at the old surfaces.
            for slot in self.blends.iter_mut() {
                slot.binding.invalidate();
            }
            self.present_binding.invalidate();
        }
        if changed || self.output.is_none() {
            self.stats.textures += 1;
            self.output = Some(GpuSurface::new(
                &self.device,
                "strata output",
                size,
                self.output_format,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            ));
            self.presented = false;
        }
        self.size = size;
        Ok(changed)
    }

    fn begin_frame(&mut self, setup: &FrameSetup) {
        self.projection = setup.projection;
        self.clear_color = setup.clear_color;
        if self.encoder.take().is_some() {
            log::debug!("wgpu: unsubmitted frame {} dropped", setup.frame_index.wrapping_sub(1));
        }
        self.draws.begin_frame();
        self.blends.begin_frame();
        self.queue.write_buffer(
            &self.clip_uniforms,
            0,
            bytemuck::bytes_of(&DrawUniforms::for_clip(self.projection)),
        );
        encoder(&mut self.encoder, &self.device);
    }

    fn clear(&mut self, role: SurfaceRole) {
        let view = match self.pool.surface(role) {
            Ok(surface) => surface.view.clone(),
            Err(e) => {
                log::warn!("wgpu: clear {role:?}: {e}");
                return;
            }
        };
        let encoder = encoder(&mut self.encoder, &self.device);
        single_pass(
            encoder,
            "strata clear",
            &view,
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            None,
        );
    }

    fn draw(&mut self, target: SurfaceRole, node: &DrawTargetNode) {
        let clip = node.effective_clip();
        let geometry = &node.geometry;
        if clip.is_empty() || geometry.is_empty() {
            return;
        }
        let count = if geometry.is_mesh() {
            geometry.indices.len()
        } else {
            geometry.vertices.len()
        };
        let Ok(count) = u32::try_from(count) else {
            log::warn!("wgpu: {count} vertices exceed one draw, skipped");
            return;
        };
        let binding = match &node.paint {
            NodePaint::Solid(_) => PaintBinding::Solid,
            NodePaint::Gradient(_) => PaintBinding::Ramp,
            NodePaint::Image(image) => match self.images.get(&image.key) {
                Some(uploaded) => PaintBinding::Image(image.key, uploaded.generation),
                None => {
                    log::warn!("wgpu: image {:?} is not uploaded, draw skipped", image.key);
                    return;
                }
            },
        };
        let clip_triangles = clip.is_clipped().then(|| clip.triangles());
        let clip_count = match clip_triangles.as_ref().map(|t| u32::try_from(t.len())) {
            Some(Ok(n)) => n,
            Some(Err(_)) => return,
            None => 0,
        };
        let (view, stencil) = match self.pool.surface_with_depth(target) {
            Ok((surface, stencil)) => (surface.view.clone(), stencil.view.clone()),
            Err(e) => {
                log::warn!("wgpu: draw into {target:?}: {e}");
                return;
            }
        };

        let (device, queue, stats) = (&self.device, &self.queue, &mut self.stats);
        let slot = self.draws.next_with(|| DrawSlot::new(device, stats));
        queue.write_buffer(
            &slot.uniforms,
            0,
            bytemuck::bytes_of(&DrawUniforms::for_node(node, self.projection)),
        );
        if let NodePaint::Gradient(gradient) = &node.paint {
            let ramp = slot.ramp_texture(device, stats);
            write_rgba8(queue, &ramp.texture, SurfaceSize::new(RAMP_WIDTH, 1), &gradient_ramp(gradient));
        }
        let (layout, blank, images) = (&self.pipelines.node_layout, &self.blank, &self.images);
        let (nearest, linear) = (&self.nearest, &self.linear);
        let (uniforms, ramp) = (&slot.uniforms, &slot.ramp);
        let node_group = slot.binding.get_or_build(binding, || {
            stats.bind_groups += 1;
            let (view, sampler) = match binding {
                PaintBinding::Solid => (&blank.view, nearest),
                PaintBinding::Ramp => (ramp.as_ref().map_or(&blank.view, |r| &r.view), linear),
                PaintBinding::Image(key, _) => (images.get(&key).map_or(&blank.view, |i| &i.surface.view), nearest),
            };
            node_bind_group(device, layout, uniforms, view, sampler)
        });
        let vertices = slot.vertices.write(
            device,
            queue,
            stats,
            bytemuck::cast_slice(&pack_vertices(&geometry.vertices, &geometry.uvs)),
        );
        let indices = if geometry.is_mesh() {
            // Buffer writes are in 4-byte units.
            let mut indices = geometry.indices.clone();
            if indices.len() % 2 == 1 {
                indices.push(0);
            }
            Some(slot.indices.write(device, queue, stats, bytemuck::cast_slice(&indices)))
        } else {
            None
        };
        let clip_vertices = match &clip_triangles {
            Some(triangles) => Some(slot.clip_vertices.write(
                device,
                queue,
                stats,
                bytemuck::cast_slice(&pack_vertices(triangles, &[])),
            )),
            None => None,
        };

        let mode = if node.emulated {
            BlendMode::SrcOver
        } else {
            node.blend_mode
        };
        let pipelines = &self.pipelines;
        let encoder = encoder(&mut self.encoder, device);
        let stencil_clear = if clip_vertices.is_some() { 0 } else { 1 };
        let mut pass = single_pass(
            encoder,
            "strata draw",
            &view,
            wgpu::LoadOp::Load,
            Some((&stencil, stencil_clear)),
        );
        pass.set_stencil_reference(1);
        if let Some(buffer) = clip_vertices {
            pass.set_pipeline(&pipelines.clip);
            pass.set_bind_group(0, &self.clip_group, &[]);
            pass.set_vertex_buffer(0, buffer.slice(..));
            pass.draw(0..clip_count, 0..1);
        }
        pass.set_pipeline(pipelines.draw(mode));
        pass.set_bind_group(0, node_group, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        match indices {
            Some(buffer) => {
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..count, 0, 0..1);
            }
            None => pass.draw(0..count, 0..1),
        }
    }

    fn blend(&mut self, pass: &BlendPass) {
        let (source, backdrop, target) = match self.pool.split(pass.source, pass.backdrop, pass.target) {
            Ok((s, b, t)) => (s.view.clone(), b.view.clone(), t.view.clone()),
            Err(e) => {
                log::warn!("wgpu: {:?} pass: {e}", pass.mode);
                return;
            }
        };
        let uniforms = BlendUniforms {
            mode: pass.mode.code(),
            _pad: [0; 3],
        };
        let (device, stats) = (&self.device, &mut self.stats);
        let slot = self.blends.next_with(|| BlendSlot::new(device, stats));
        self.queue.write_buffer(&slot.uniforms, 0, bytemuck::bytes_of(&uniforms));
        let (layout, buffer) = (&self.pipelines.blend_layout, &slot.uniforms);
        let group = slot.binding.get_or_build((pass.source, pass.backdrop), || {
            stats.bind_groups += 1;
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("strata blend"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&backdrop),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        });
        let pipeline = &self.pipelines.blend;
        let encoder = encoder(&mut self.encoder, device);
        let mut render = single_pass(
            encoder,
            "strata blend",
            &target,
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            None,
        );
        render.set_pipeline(pipeline);
        render.set_bind_group(0, group, &[]);
        render.draw(0..3, 0..1);
    }

    fn present(&mut self, source: SurfaceRole, params: &PresentParams) {
        let view = match (&self.target, &self.output) {
            (Some(view), _) => view.clone(),
            (None, Some(output)) => output.view.clone(),
            (None, None) => {
                log::warn!("wgpu: present before prepare");
                return;
            }
        };
        let group = match self.pool.existing(source) {
            Some(surface) => {
                self.queue.write_buffer(
                    &self.present_uniforms,
                    0,
                    bytemuck::bytes_of(&PresentUniforms::new(params, self.size)),
                );
                let (device, layout, buffer) = (&self.device, &self.pipelines.present_layout, &self.present_uniforms);
                let stats = &mut self.stats;
                Some(self.present_binding.get_or_build(source, || {
                    stats.bind_groups += 1;
                    device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("strata present"),
                        layout,
                        entries: &[
                            wgpu::BindGroupEntry {
                                binding: 0,
                                resource: wgpu::BindingResource::TextureView(&surface.view),
                            },
                            wgpu::BindGroupEntry {
                                binding: 1,
                                resource: buffer.as_entire_binding(),
                            },
                        ],
                    })
                }))
            }
            None => {
                log::debug!("wgpu: present of {source:?} before it was drawn");
                None
            }
        };

        let pipeline = &self.pipelines.present;
        let mut frame = self.encoder.take().unwrap_or_else(|| {
            self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strata frame"),
            })
        });
        {
            let mut pass = single_pass(
                &mut frame,
                "strata present",
                &view,
                wgpu::LoadOp::Clear(to_wgpu_color(self.clear_color)),
                None,
            );
            if let Some(group) = group {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        self.queue.submit(Some(frame.finish()));
        self.presented = self.presented || self.target.is_none();
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect};
    use strata_core::paint::{Gradient, GradientStop, Paint};
    use strata_core::path::PathId;
    use strata_core::renderer::Renderer;
    use strata_render::{Compositor, CompositorConfig};

    use super::*;

    #[test]
    fn clear_color_is_premultiplied() {
        let c = to_wgpu_color(Color::rgba(1.0, 0.5, 0.0, 0.5));
        assert_eq!((c.r, c.g, c.b, c.a), (0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn extent_is_single_layer() {
        let e = extent(SurfaceSize::new(3, 4));
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (3, 4, 1));
    }

    fn headless_or_skip() -> Option<WgpuBackend> {
        match WgpuBackend::headless() {
            Ok(backend) => Some(backend),
            Err(BackendError::NoAdapter) => {
                eprintln!("no GPU adapter, skipped");
                None
            }
            Err(e) => panic!("{e}"),
        }
    }

    fn rect_path(c: &mut Compositor, r: Rect) -> PathId {
        let paths = c.paths_mut();
        let id = paths.create_path();
        paths.move_to(id, (r.x0, r.y0));
        paths.line_to(id, (r.x1, r.y0));
        paths.line_to(id, (r.x1, r.y1));
        paths.line_to(id, (r.x0, r.y1));
        paths.close(id);
        id
    }

    fn compositor(size: u32) -> Compositor {
        let mut c = Compositor::new(CompositorConfig::new());
        c.set_tessellator(strata_tessellate::LyonTessellator::new());
        c.update_viewport(SurfaceSize::new(size, size));
        c
    }

    #[test]
    fn fills_a_square_on_the_gpu() {
        let Some(mut backend) = headless_or_skip() else {
            return;
        };
        let mut c = compositor(16);
        let id = rect_path(&mut c, Rect::new(4.0, 4.0, 12.0, 12.0));
        c.draw_path(id, &Paint::fill(Color::rgba(1.0, 0.0, 0.0, 1.0)));
        c.render(&mut backend);

        let pixels = backend.read_output().unwrap();
        let red = pixels.chunks_exact(4).filter(|px| *px == [255, 0, 0, 255]).count();
        assert_eq!(red, 64);
    }

    #[test]
    fn repeated_frames_reuse_gpu_resources() {
        let Some(mut backend) = headless_or_skip() else {
            return;
        };
        let mut c = compositor(16);
        let full = rect_path(&mut c, Rect::new(0.0, 0.0, 16.0, 16.0));
        let left = rect_path(&mut c, Rect::new(0.0, 0.0, 8.0, 16.0));
        let gradient = Gradient::Linear {
            start: Point::new(0.0, 0.0),
            end: Point::new(16.0, 0.0),
            stops: vec![
                GradientStop::new(0.0, Color::BLACK),
                GradientStop::new(1.0, Color::WHITE),
            ],
        };
        c.draw_path(full, &Paint::fill(Color::BLACK).with_gradient(gradient));
        c.save();
        c.clip_path(left);
        c.draw_path(full, &Paint::fill(Color::rgba(1.0, 0.0, 0.0, 1.0)));
        c.restore();
        c.draw_path(
            full,
            &Paint::fill(Color::rgba(0.5, 0.5, 0.5, 1.0)).with_blend_mode(BlendMode::Overlay),
        );

        c.render(&mut backend);
        let first = backend.resource_stats();
        let first_pixels = backend.read_output().unwrap();
        assert!(first.buffers > 0 && first.bind_groups > 0);
        assert_eq!(first.textures, 2, "one ramp and the output");

        c.render(&mut backend);
        assert_eq!(backend.resource_stats(), first);
        assert_eq!(backend.read_output().unwrap(), first_pixels);
    }

    #[test]
    fn resizing_rebinds_blend_and_present() {
        let Some(mut backend) = headless_or_skip() else {
            return;
        };
        let mut c = compositor(8);
        let full = rect_path(&mut c, Rect::new(0.0, 0.0, 32.0, 32.0));
        let record = |c: &mut Compositor| {
            c.draw_path(full, &Paint::fill(Color::rgba(0.0, 0.0, 1.0, 1.0)));
            c.draw_path(
                full,
                &Paint::fill(Color::rgba(1.0, 1.0, 1.0, 1.0)).with_blend_mode(BlendMode::Overlay),
            );
        };
        record(&mut c);
        c.render(&mut backend);
        let before = backend.resource_stats();

        c.update_viewport(SurfaceSize::new(16, 16));
        record(&mut c);
        c.render(&mut backend);
        assert!(backend.resource_stats().bind_groups > before.bind_groups);
        // Overlay keeps a saturated backdrop.
        let pixels = backend.read_output().unwrap();
        assert_eq!(pixels.len(), 16 * 16 * 4);
        assert!(pixels.chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
    }
}
