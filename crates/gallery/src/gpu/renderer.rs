use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::effect::Effect;
use crate::error::GalleryError;
use crate::shader::VERTEX_SHADER;

use super::context::GpuContext;
use super::program::GpuProgram;
use super::slots::GpuTextureSlots;
use super::uniforms::GalleryUniforms;

/// Full-screen quad as a 4-vertex strip: `x, y, u, v` per vertex.
const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 1.0, //
    1.0, -1.0, 1.0, 1.0, //
    -1.0, 1.0, 0.0, 0.0, //
    1.0, 1.0, 1.0, 0.0,
];

pub(crate) struct Quad {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl Quad {
    fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gallery quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            vertex_count: 4,
        }
    }
}

pub(crate) struct UniformBinding {
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gallery params layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gallery params"),
            size: std::mem::size_of::<GalleryUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gallery params bind group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            layout,
            buffer,
            bind_group,
        }
    }
}

/// GPU side of one gallery: surface, program, quad, uniforms and both slots.
pub(crate) struct Renderer {
    context: GpuContext,
    program: GpuProgram,
    quad: Quad,
    uniforms: UniformBinding,
    slots: GpuTextureSlots,
}

impl Renderer {
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        effect: &Effect,
    ) -> Result<Self, GalleryError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, wgpu::PowerPreference::LowPower)?;
        let uniforms = UniformBinding::new(&context.device);
        let slots = GpuTextureSlots::new(
            &context.device,
            &context.queue,
            context.max_texture_dimension,
        );
        let program = build_program(&context, &uniforms, &slots, effect)?;
        let quad = Quad::new(&context.device);

        tracing::info!(
            effect = effect.name(),
            resources = program.bindings.resources().count(),
            width = context.size.width,
            height = context.size.height,
            format = ?context.surface_format,
            "gallery renderer ready"
        );

        Ok(Self {
            context,
            program,
            quad,
            uniforms,
            slots,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn slots_mut(&mut self) -> &mut GpuTextureSlots {
        &mut self.slots
    }

    /// Draws one frame; `draw` false clears to black without touching the quad.
    pub(crate) fn render(
        &mut self,
        params: &GalleryUniforms,
        draw: bool,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("gallery frame encoder"),
                });

        if draw {
            self.context
                .queue
                .write_buffer(&self.uniforms.buffer, 0, bytemuck::bytes_of(params));
            encode_draw(
                &mut encoder,
                &view,
                &self.program,
                &self.quad,
                &self.uniforms,
                &self.slots,
            );
        } else {
            encode_clear(&mut encoder, &view);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

fn build_program(
    context: &GpuContext,
    uniforms: &UniformBinding,
    slots: &GpuTextureSlots,
    effect: &Effect,
) -> Result<GpuProgram, GalleryError> {
    let fragment = effect.fragment_source();
    GpuProgram::build(
        &context.device,
        context.surface_format,
        &[&uniforms.layout, slots.layout()],
        VERTEX_SHADER,
        &fragment,
    )
    .inspect_err(|error| {
        tracing::error!(effect = effect.name(), error = %error, "failed to build gallery program")
    })
}

fn encode_draw(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    program: &GpuProgram,
    quad: &Quad,
    uniforms: &UniformBinding,
    slots: &GpuTextureSlots,
) {
    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("gallery pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    render_pass.set_pipeline(&program.pipeline);
    render_pass.set_bind_group(0, &uniforms.bind_group, &[]);
    render_pass.set_bind_group(1, slots.bind_group(), &[]);
    render_pass.set_vertex_buffer(0, quad.buffer.slice(..));
    render_pass.draw(0..quad.vertex_count, 0..1);
}

fn encode_clear(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("gallery clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
}
