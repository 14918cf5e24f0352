// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render pipelines and their bind group layouts.
//!
//! Node pipelines test the stencil for `1` and zero it where they pass, so
//! a pixel covered by several triangles of one node blends once. A draw
//! clears the stencil to `1` when unclipped; clipped draws clear it to `0`
//! and run the clip pipeline over the clip triangles first.

use strata_core::paint::{BlendComponent, BlendFactor, BlendMode, BlendOperation, NativeBlend};

use crate::gpu_types::Vertex;
use crate::shaders::{BLEND_SHADER, NODE_SHADER, PRESENT_SHADER};

/// Color format of the offscreen surfaces.
pub(crate) const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Format of the shared clip stencil.
pub(crate) const STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Stencil8;

fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::Src => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::Dst => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

fn blend_component(component: &BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: blend_factor(component.src_factor),
        dst_factor: blend_factor(component.dst_factor),
        operation: match component.operation {
            BlendOperation::Add => wgpu::BlendOperation::Add,
            BlendOperation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
            BlendOperation::Min => wgpu::BlendOperation::Min,
            BlendOperation::Max => wgpu::BlendOperation::Max,
        },
    }
}

/// Fixed-function state for a natively blendable mode.
pub(crate) fn blend_state(native: &NativeBlend) -> wgpu::BlendState {
    wgpu::BlendState {
        color: blend_component(&native.color),
        alpha: blend_component(&native.alpha),
    }
}

fn stencil_state(compare: wgpu::CompareFunction, pass_op: wgpu::StencilOperation) -> wgpu::DepthStencilState {
    let face = wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    wgpu::DepthStencilState {
        format: STENCIL_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Always,
        stencil: wgpu::StencilState {
            front: face,
            back: face,
            read_mask: 0xff,
            write_mask: 0xff,
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    layout: &'a wgpu::PipelineLayout,
    vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    write_mask: wgpu::ColorWrites,
    depth_stencil: Option<wgpu::DepthStencilState>,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some("vs_main"),
            buffers: desc.vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: desc.blend,
                write_mask: desc.write_mask,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: desc.depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Every pipeline the backend uses.
pub(crate) struct Pipelines {
    pub(crate) node_layout: wgpu::BindGroupLayout,
    pub(crate) blend_layout: wgpu::BindGroupLayout,
    pub(crate) present_layout: wgpu::BindGroupLayout,
    /// One per natively blendable mode.
    draw: Vec<(BlendMode, wgpu::RenderPipeline)>,
    pub(crate) clip: wgpu::RenderPipeline,
    pub(crate) blend: wgpu::RenderPipeline,
    pub(crate) present: wgpu::RenderPipeline,
}

impl Pipelines {
    pub(crate) fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata node"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata blend"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let present_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("strata present"),
            entries: &[texture_entry(0), uniform_entry(1, wgpu::ShaderStages::FRAGMENT)],
        });

        let pipeline_layout = |label: &str, layout: &wgpu::BindGroupLayout| {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            })
        };
        let module = |label: &str, source: &'static str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };

        let node_module = module("strata node", NODE_SHADER);
        let node_pipeline_layout = pipeline_layout("strata node", &node_layout);
        let vertex_buffers = [Vertex::layout()];
        let node_desc = |label, blend, write_mask, depth_stencil| PipelineDesc {
            label,
            module: &node_module,
            layout: &node_pipeline_layout,
            vertex_buffers: &vertex_buffers,
            format: SURFACE_FORMAT,
            blend,
            write_mask,
            depth_stencil: Some(depth_stencil),
        };

        let draw = BlendMode::ALL
            .iter()
            .filter_map(|&mode| {
                let native = mode.native_blend()?;
                let pipeline = create_pipeline(
                    device,
                    node_desc(
                        "strata draw",
                        Some(blend_state(&native)),
                        wgpu::ColorWrites::ALL,
                        stencil_state(wgpu::CompareFunction::Equal, wgpu::StencilOperation::Zero),
                    ),
                );
                Some((mode, pipeline))
            })
            .collect();
        let clip = create_pipeline(
            device,
            node_desc(
                "strata clip",
                None,
                wgpu::ColorWrites::empty(),
                stencil_state(wgpu::CompareFunction::Always, wgpu::StencilOperation::Replace),
            ),
        );

        let blend_module = module("strata blend", BLEND_SHADER);
        let blend = create_pipeline(
            device,
            PipelineDesc {
                label: "strata blend",
                module: &blend_module,
                layout: &pipeline_layout("strata blend", &blend_layout),
                vertex_buffers: &[],
                format: SURFACE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
                depth_stencil: None,
            },
        );

        let present_module = module("strata present", PRESENT_SHADER);
        let present = create_pipeline(
            device,
            PipelineDesc {
                label: "strata present",
                module: &present_module,
                layout: &pipeline_layout("strata present", &present_layout),
                vertex_buffers: &[],
                format: output_format,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
                depth_stencil: None,
            },
        );

        Self {
            node_layout,
            blend_layout,
            present_layout,
            draw,
            clip,
            blend,
            present,
        }
    }

    /// The node pipeline for `mode`; emulated modes draw source-over.
    pub(crate) fn draw(&self, mode: BlendMode) -> &wgpu::RenderPipeline {
        let find = |m: BlendMode| self.draw.iter().find(|(candidate, _)| *candidate == m);
        match find(mode).or_else(|| find(BlendMode::SrcOver)) {
            Some((_, pipeline)) => pipeline,
            None => &self.draw[0].1,
        }
    }
}
