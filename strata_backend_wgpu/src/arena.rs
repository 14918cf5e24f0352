// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU resources reused from frame to frame.
//!
//! A frame is recorded into one command buffer, and `Queue::write_buffer`
//! and `Queue::write_texture` take effect before that buffer runs. Two
//! passes of the same frame can therefore not share a uniform or vertex
//! buffer: each pass gets a slot of a [`FrameArena`], indexed by its order
//! in the frame, and the next frame rewrites the same slots in place.

use strata_render::surface::{SurfaceRole, SurfaceSize};

use crate::backend::GpuSurface;
use crate::gpu_types::{BlendUniforms, DrawUniforms, RAMP_WIDTH};

/// Smallest vertex or index buffer allocated.
const MIN_BUFFER_SIZE: u64 = 256;

/// GPU objects created while preparing and recording frames.
///
/// Steady-state frames of the same scene add nothing to these counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Uniform, vertex and index buffers.
    pub buffers: u64,
    /// Gradient ramps and output textures.
    pub textures: u64,
    /// Bind groups.
    pub bind_groups: u64,
}

/// Slots handed out in order during a frame and reused by later frames.
#[derive(Debug)]
pub(crate) struct FrameArena<T> {
    slots: Vec<T>,
    used: usize,
}

impl<T> Default for FrameArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            used: 0,
        }
    }
}

impl<T> FrameArena<T> {
    /// Makes every slot available again.
    pub(crate) fn begin_frame(&mut self) {
        self.used = 0;
    }

    /// The next slot of this frame, built with `create` the first time a
    /// frame needs this many.
    pub(crate) fn next_with(&mut self, create: impl FnOnce() -> T) -> &mut T {
        if self.used == self.slots.len() {
            self.slots.push(create());
        }
        self.used += 1;
        &mut self.slots[self.used - 1]
    }

    /// Slots allocated so far.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Every allocated slot, used this frame or not.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}

/// A value built for a key and rebuilt only when asked for another key.
#[derive(Debug)]
pub(crate) struct Keyed<K, T> {
    entry: Option<(K, T)>,
}

impl<K, T> Default for Keyed<K, T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<K: PartialEq, T> Keyed<K, T> {
    pub(crate) fn get_or_build(&mut self, key: K, build: impl FnOnce() -> T) -> &T {
        if !matches!(&self.entry, Some((built_for, _)) if *built_for == key) {
            self.entry = Some((key, build()));
        }
        match &self.entry {
            Some((_, value)) => value,
            None => unreachable!("entry was just built"),
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Capacity of a buffer that has to hold `needed` bytes.
pub(crate) fn grown_capacity(needed: u64) -> u64 {
    needed.max(MIN_BUFFER_SIZE).next_power_of_two()
}

/// A buffer rewritten every frame, reallocated only when outgrown.
#[derive(Debug)]
pub(crate) struct StreamBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
}

impl StreamBuffer {
    pub(crate) fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            buffer: None,
        }
    }

    /// Writes `bytes` at offset 0. The length must be a multiple of
    /// [`wgpu::COPY_BUFFER_ALIGNMENT`].
    pub(crate) fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        stats: &mut ResourceStats,
        bytes: &[u8],
    ) -> &wgpu::Buffer {
        let needed = bytes.len() as wgpu::BufferAddress;
        debug_assert_eq!(needed % wgpu::COPY_BUFFER_ALIGNMENT, 0, "unaligned write");
        if self.buffer.as_ref().is_some_and(|b| b.size() < needed) {
            self.buffer = None;
        }
        let (label, usage) = (self.label, self.usage);
        let buffer = self.buffer.get_or_insert_with(|| {
            stats.buffers += 1;
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: grown_capacity(needed),
                usage,
                mapped_at_creation: false,
            })
        });
        queue.write_buffer(buffer, 0, bytes);
        buffer
    }
}

/// What a node bind group samples besides its uniforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PaintBinding {
    Solid,
    Ramp,
    /// An uploaded image and its upload generation.
    Image(strata_core::resource::ResourceKey, u64),
}

/// Resources of one draw of a frame.
#[derive(Debug)]
pub(crate) struct DrawSlot {
    pub(crate) uniforms: wgpu::Buffer,
    pub(crate) vertices: StreamBuffer,
    pub(crate) indices: StreamBuffer,
    pub(crate) clip_vertices: StreamBuffer,
    pub(crate) ramp: Option<GpuSurface>,
    pub(crate) binding: Keyed<PaintBinding, wgpu::BindGroup>,
}

impl DrawSlot {
    pub(crate) fn new(device: &wgpu::Device, stats: &mut ResourceStats) -> Self {
        Self {
            uniforms: uniform_buffer::<DrawUniforms>(device, stats, "strata draw uniforms"),
            vertices: StreamBuffer::new("strata vertices", wgpu::BufferUsages::VERTEX),
            indices: StreamBuffer::new("strata indices", wgpu::BufferUsages::INDEX),
            clip_vertices: StreamBuffer::new("strata clip vertices", wgpu::BufferUsages::VERTEX),
            ramp: None,
            binding: Keyed::default(),
        }
    }

    /// This slot's gradient ramp texture, created on first use.
    pub(crate) fn ramp_texture(&mut self, device: &wgpu::Device, stats: &mut ResourceStats) -> &GpuSurface {
        self.ramp.get_or_insert_with(|| {
            stats.textures += 1;
            GpuSurface::new(
                device,
                "strata gradient",
                SurfaceSize::new(RAMP_WIDTH, 1),
                wgpu::TextureFormat::Rgba8Unorm,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            )
        })
    }
}

/// Resources of one blend pass of a frame.
#[derive(Debug)]
pub(crate) struct BlendSlot {
    pub(crate) uniforms: wgpu::Buffer,
    /// Bound to the (source, backdrop) surfaces.
    pub(crate) binding: Keyed<(SurfaceRole, SurfaceRole), wgpu::BindGroup>,
}

impl BlendSlot {
    pub(crate) fn new(device: &wgpu::Device, stats: &mut ResourceStats) -> Self {
        Self {
            uniforms: uniform_buffer::<BlendUniforms>(device, stats, "strata blend uniforms"),
            binding: Keyed::default(),
        }
    }
}

/// A uniform buffer sized for `T`.
pub(crate) fn uniform_buffer<T>(device: &wgpu::Device, stats: &mut ResourceStats, label: &str) -> wgpu::Buffer {
    stats.buffers += 1;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size_of::<T>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
