//! World-space line list for the controller ray and floor grid

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, Queue, RenderPass, RenderPipeline};

use super::mesh::Vertex;
use super::shader::{UniformBuffer, shader_module};
use super::swapchain::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::camera::Eye;

const LINE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(3) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(in.position, 1.0);
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LineUniforms {
    view_proj: [[f32; 4]; 4],
}

/// Line segment in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub from: Vec3,
    pub to: Vec3,
    pub color: [f32; 4],
}

impl LineSegment {
    pub fn new(from: Vec3, to: Vec3, color: [f32; 3]) -> Self {
        Self {
            from,
            to,
            color: [color[0], color[1], color[2], 1.0],
        }
    }

    fn to_vertices(self) -> [Vertex; 2] {
        [
            Vertex::colored(self.from.to_array(), self.color),
            Vertex::colored(self.to.to_array(), self.color),
        ]
    }
}

/// Square grid on the y = 0 plane, `half_cells` cells each side of the origin
pub fn floor_grid(half_cells: i32, spacing: f32, color: [f32; 3]) -> Vec<LineSegment> {
    let extent = half_cells as f32 * spacing;
    (-half_cells..=half_cells)
        .flat_map(|i| {
            let offset = i as f32 * spacing;
            [
                LineSegment::new(
                    Vec3::new(offset, 0.0, -extent),
                    Vec3::new(offset, 0.0, extent),
                    color,
                ),
                LineSegment::new(
                    Vec3::new(-extent, 0.0, offset),
                    Vec3::new(extent, 0.0, offset),
                    color,
                ),
            ]
        })
        .collect()
}

pub struct LineRenderer {
    pipeline: RenderPipeline,
    uniforms: [UniformBuffer<LineUniforms>; 2],
    vertex_buffer: Option<Buffer>,
    vertex_count: u32,
}

impl LineRenderer {
    pub fn new(device: &Device) -> Self {
        let identity = LineUniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let uniforms = Eye::BOTH.map(|_| {
            UniformBuffer::new(device, "Line Uniforms", &identity, wgpu::ShaderStages::VERTEX)
        });
        let shader = shader_module(device, "Line Shader", LINE_SHADER);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[uniforms[0].layout()],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Render Pipeline"),
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
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
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
            uniforms,
            vertex_buffer: None,
            vertex_count: 0,
        }
    }

    /// Uploads this frame's segments
    pub fn set_lines(&mut self, device: &Device, lines: &[LineSegment]) {
        let vertices: Vec<Vertex> = lines.iter().flat_map(|line| line.to_vertices()).collect();
        self.vertex_count = vertices.len() as u32;

        if vertices.is_empty() {
            self.vertex_buffer = None;
            return;
        }

        self.vertex_buffer = Some(
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Line Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
        );
    }

    pub fn prepare(&self, queue: &Queue, eye: Eye, view_proj: Mat4) {
        self.uniforms[eye.index()].write(
            queue,
            &LineUniforms {
                view_proj: view_proj.to_cols_array_2d(),
            },
        );
    }

    pub fn draw(&self, rpass: &mut RenderPass<'_>, eye: Eye) {
        let Some(vertex_buffer) = &self.vertex_buffer else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, self.uniforms[eye.index()].bind_group(), &[]);
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
        rpass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_two_lines_per_row() {
        let grid = floor_grid(5, 1.0, [0.4; 3]);
        assert_eq!(grid.len(), 22);
        assert!(grid.iter().all(|line| line.from.y == 0.0 && line.to.y == 0.0));
    }

    #[test]
    fn grid_spans_the_requested_extent() {
        let grid = floor_grid(2, 0.5, [0.4; 3]);
        let max_x = grid
            .iter()
            .flat_map(|line| [line.from.x, line.to.x])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_x, 1.0);
    }

    #[test]
    fn segment_is_opaque_in_its_colour() {
        let line = LineSegment::new(Vec3::ZERO, Vec3::X, [1.0, 0.0, 0.0]);
        let [a, b] = line.to_vertices();
        assert_eq!(a.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(b.position, [1.0, 0.0, 0.0]);
    }
}
