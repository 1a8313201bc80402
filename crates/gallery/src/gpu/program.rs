use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::error::GalleryError;
use crate::shader::{reflect_program, ProgramBindings};

/// Byte stride of one quad vertex: `vec2 a_position` then `vec2 a_texcoord`.
pub(crate) const QUAD_VERTEX_STRIDE: u64 = 4 * std::mem::size_of::<f32>() as u64;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

/// A linked vertex/fragment pair ready to draw the gallery quad.
pub(crate) struct GpuProgram {
    pub pipeline: wgpu::RenderPipeline,
    pub bindings: ProgramBindings,
}

impl GpuProgram {
    pub(crate) fn build(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, GalleryError> {
        // Reflection catches parse, validation and interface errors with
        // readable diagnostics before anything reaches the device.
        let bindings = reflect_program(vertex_source, fragment_source)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gallery quad vertex"),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(vertex_source.to_string()),
                stage: ShaderStage::Vertex,
                defines: &[],
            },
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gallery effect fragment"),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(fragment_source.to_string()),
                stage: ShaderStage::Fragment,
                defines: &[],
            },
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gallery pipeline layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gallery pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: QUAD_VERTEX_STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!(error = %error, "gallery pipeline failed validation");
            return Err(GalleryError::ShaderLink {
                diagnostics: error.to_string(),
            });
        }

        tracing::debug!("gallery pipeline linked");
        Ok(Self { pipeline, bindings })
    }
}
