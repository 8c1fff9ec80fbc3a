//! Indexed vertex/index buffer pair

use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, RenderPass};

use crate::raycast::{QUAD_CORNERS, QUAD_INDICES};

/// Vertex layout shared by the panel and line pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Untextured coloured point, used by line lists
    pub fn colored(position: [f32; 3], color: [f32; 4]) -> Self {
        Self {
            position,
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 0.0],
            color,
        }
    }
}

/// Vertices of the unit panel quad
///
/// UVs put the canvas's top-left pixel at the (-1, 1) corner.
pub fn panel_quad_vertices() -> [Vertex; 4] {
    QUAD_CORNERS.map(|corner| Vertex {
        position: corner.to_array(),
        normal: [0.0, 0.0, 1.0],
        uv: [(corner.x + 1.0) * 0.5, (1.0 - corner.y) * 0.5],
        color: [1.0; 4],
    })
}

pub struct Mesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn new(device: &Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn panel_quad(device: &Device) -> Self {
        Self::new(device, "Panel Quad", &panel_quad_vertices(), &QUAD_INDICES)
    }

    pub fn draw(&self, rpass: &mut RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
