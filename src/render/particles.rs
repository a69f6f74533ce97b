//! Instanced particle rendering.
//!
//! One pipeline, one draw call. A shared six-vertex quad is stretched per
//! instance by radius and rotated by angle in the vertex stage; the fragment
//! stage carves an anti-aliased disc (or polygon) out of it.
//!
//! Instance attributes come from two GPU buffers that mirror the slab
//! layout: a dynamic buffer (positions then angles) rewritten every frame
//! for the active body count, and a static buffer (radii then colors)
//! rewritten only on structural changes. Keeping the split means the
//! per-frame bus traffic is exactly the data that moved.

use glam::Mat4;

use crate::physics::PIXELS_PER_METER;
use crate::slabs::BodySlabs;

const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    shape_sides: u32,
    aa_margin: f32,
    _pad: [u32; 2],
}

pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    quad_vertex_buffer: wgpu::Buffer,
    /// Positions at offset 0, angles at `capacity * 8` bytes.
    dynamic_buffer: wgpu::Buffer,
    /// Radii at offset 0, colors at `capacity * 4` bytes.
    static_buffer: wgpu::Buffer,
    capacity: usize,
}

impl ParticleRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, capacity: usize) -> Self {
        use wgpu::util::DeviceExt;

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("particle globals layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("particle globals bind group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Sized for the fixed capacity; the draw range never reads past the
        // active count.
        let dynamic_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle dynamic attributes"),
            size: (capacity * 12) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let static_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle static attributes"),
            size: (capacity * 8) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/particle.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particle pipeline layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let quad_layout = wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
        };
        let position_layout = wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![1 => Float32x2],
        };
        let angle_layout = wgpu::VertexBufferLayout {
            array_stride: 4,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![2 => Float32],
        };
        let radius_layout = wgpu::VertexBufferLayout {
            array_stride: 4,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![3 => Float32],
        };
        let color_layout = wgpu::VertexBufferLayout {
            array_stride: 4,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![4 => Uint32],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    quad_layout,
                    position_layout,
                    angle_layout,
                    radius_layout,
                    color_layout,
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            globals_buffer,
            globals_bind_group,
            quad_vertex_buffer,
            dynamic_buffer,
            static_buffer,
            capacity,
        }
    }

    /// Rewrite the projection and shape uniforms. Called on resize and on
    /// rendering-settings changes; cheap enough that callers do not need to
    /// dedupe.
    pub fn set_globals(
        &self,
        queue: &wgpu::Queue,
        width_px: f32,
        height_px: f32,
        shape_sides: u32,
    ) {
        // Physics space is meters with the origin at the bottom-left;
        // fold the pixels-per-meter scale into the orthographic projection
        // so slab data uploads untouched.
        let view_proj = Mat4::orthographic_rh(
            0.0,
            width_px.max(1.0) / PIXELS_PER_METER,
            0.0,
            height_px.max(1.0) / PIXELS_PER_METER,
            -1.0,
            1.0,
        );
        let globals = Globals {
            view_proj: view_proj.to_cols_array_2d(),
            shape_sides,
            aa_margin: 1.0 / PIXELS_PER_METER,
            _pad: [0; 2],
        };
        queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
    }

    /// Upload positions and angles for the active bodies.
    pub fn upload_dynamic(&self, queue: &wgpu::Queue, slabs: &BodySlabs) {
        if slabs.active() == 0 {
            return;
        }
        queue.write_buffer(&self.dynamic_buffer, 0, slabs.position_bytes());
        queue.write_buffer(
            &self.dynamic_buffer,
            (self.capacity * 8) as u64,
            slabs.angle_bytes(),
        );
    }

    /// Upload radii and colors; only needed after body recreation or a
    /// recolor.
    pub fn upload_static(&self, queue: &wgpu::Queue, slabs: &BodySlabs) {
        if slabs.active() == 0 {
            return;
        }
        queue.write_buffer(&self.static_buffer, 0, slabs.radius_bytes());
        queue.write_buffer(
            &self.static_buffer,
            (self.capacity * 4) as u64,
            slabs.color_bytes(),
        );
    }

    /// Record the particle pass. Zero instances still clears the target.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        instance_count: u32,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("particle pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.012,
                        g: 0.014,
                        b: 0.035,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if instance_count == 0 {
            return;
        }

        let cap = self.capacity as u64;
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.dynamic_buffer.slice(0..cap * 8));
        pass.set_vertex_buffer(2, self.dynamic_buffer.slice(cap * 8..cap * 12));
        pass.set_vertex_buffer(3, self.static_buffer.slice(0..cap * 4));
        pass.set_vertex_buffer(4, self.static_buffer.slice(cap * 4..cap * 8));
        pass.draw(0..6, 0..instance_count);
    }
}
