//! Draws the GUI canvas onto the world-space panel

use glam::Mat4;
use wgpu::{BindGroup, BindGroupLayout, Device, Queue, RenderPass, RenderPipeline, Sampler, TextureView};

use super::mesh::{Mesh, Vertex};
use super::shader::{
    UniformBuffer, linear_sampler, shader_module, texture_bind_group, texture_bind_group_layout,
};
use super::swapchain::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::camera::Eye;

const QUAD_SHADER: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var canvas: texture_2d<f32>;
@group(1) @binding(1)
var canvas_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.mvp * vec4<f32>(in.position, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(canvas, canvas_sampler, in.uv) * in.color;
}
"#;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadUniforms {
    mvp: [[f32; 4]; 4],
}

pub struct QuadRenderer {
    pipeline: RenderPipeline,
    mesh: Mesh,
    uniforms: [UniformBuffer<QuadUniforms>; 2],
    texture_layout: BindGroupLayout,
    sampler: Sampler,
    texture_bind_group: Option<BindGroup>,
}

impl QuadRenderer {
    pub fn new(device: &Device) -> Self {
        let identity = QuadUniforms {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let uniforms = Eye::BOTH.map(|_| {
            UniformBuffer::new(device, "Quad Uniforms", &identity, wgpu::ShaderStages::VERTEX)
        });
        let texture_layout = texture_bind_group_layout(device, "Quad Texture Layout");
        let sampler = linear_sampler(device, "Quad Sampler");
        let shader = shader_module(device, "Quad Shader", QUAD_SHADER);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[uniforms[0].layout(), &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quad Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Visible from both sides
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            mesh: Mesh::panel_quad(device),
            uniforms,
            texture_layout,
            sampler,
            texture_bind_group: None,
        }
    }

    /// Points the quad at the canvas texture for this frame
    pub fn set_texture(&mut self, device: &Device, view: &TextureView) {
        self.texture_bind_group = Some(texture_bind_group(
            device,
            "Quad Texture",
            &self.texture_layout,
            view,
            &self.sampler,
        ));
    }

    /// `mvp` is `projection * view * scaled_model` for `eye`
    pub fn prepare(&self, queue: &Queue, eye: Eye, mvp: Mat4) {
        self.uniforms[eye.index()].write(
            queue,
            &QuadUniforms {
                mvp: mvp.to_cols_array_2d(),
            },
        );
    }

    pub fn draw(&self, rpass: &mut RenderPass<'_>, eye: Eye) {
        let Some(texture) = &self.texture_bind_group else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, self.uniforms[eye.index()].bind_group(), &[]);
        rpass.set_bind_group(1, texture, &[]);
        self.mesh.draw(rpass);
    }
}
