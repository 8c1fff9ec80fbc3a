//! Shows the committed eye images on the desktop window

use glam::Vec2;
use wgpu::{BindGroupLayout, CommandEncoder, Device, RenderPipeline, Sampler, TextureView};

use super::MirrorMode;
use super::shader::{linear_sampler, shader_module, texture_bind_group, texture_bind_group_layout};
use super::swapchain::StereoSwapchain;
use crate::camera::Eye;

const MIRROR_SHADER: &str = r#"
@group(0) @binding(0)
var eye_image: texture_2d<f32>;
@group(0) @binding(1)
var eye_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

// Single triangle covering the viewport
@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.clip_position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(eye_image, eye_sampler, in.uv);
}
"#;

/// Viewport rectangle `[x, y, width, height]` in surface pixels
pub type MirrorViewport = [f32; 4];

/// Where each eye lands on a `width` x `height` surface
pub fn mirror_layout(mode: MirrorMode, width: u32, height: u32) -> Vec<(Eye, MirrorViewport)> {
    layout_rects(mode, width as f32, height as f32)
}

/// The eye shown under `cursor` and the cursor's position within that eye image
///
/// Both positions are normalised to `[0, 1]`, y down; `cursor` spans the window.
pub fn eye_under_cursor(mode: MirrorMode, cursor: Vec2) -> Option<(Eye, Vec2)> {
    let cursor = cursor.clamp(Vec2::ZERO, Vec2::splat(1.0 - f32::EPSILON));
    layout_rects(mode, 1.0, 1.0)
        .into_iter()
        .find_map(|(eye, [x, y, w, h])| {
            let local = (cursor - Vec2::new(x, y)) / Vec2::new(w, h);
            (local.cmpge(Vec2::ZERO).all() && local.cmplt(Vec2::ONE).all()).then_some((eye, local))
        })
}

fn layout_rects(mode: MirrorMode, w: f32, h: f32) -> Vec<(Eye, MirrorViewport)> {
    match mode {
        MirrorMode::SideBySide => vec![
            (Eye::Left, [0.0, 0.0, w * 0.5, h]),
            (Eye::Right, [w * 0.5, 0.0, w * 0.5, h]),
        ],
        MirrorMode::Left => vec![(Eye::Left, [0.0, 0.0, w, h])],
        MirrorMode::Right => vec![(Eye::Right, [0.0, 0.0, w, h])],
    }
}

pub struct MirrorRenderer {
    pipeline: RenderPipeline,
    layout: BindGroupLayout,
    sampler: Sampler,
    mode: MirrorMode,
}

impl MirrorRenderer {
    pub fn new(device: &Device, surface_format: wgpu::TextureFormat, mode: MirrorMode) -> Self {
        let layout = texture_bind_group_layout(device, "Mirror Texture Layout");
        let sampler = linear_sampler(device, "Mirror Sampler");
        let shader = shader_module(device, "Mirror Shader", MIRROR_SHADER);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mirror Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mirror Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            layout,
            sampler,
            mode,
        }
    }

    pub fn mode(&self) -> MirrorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MirrorMode) {
        self.mode = mode;
    }

    pub fn draw(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        target_size: (u32, u32),
        swapchain: &StereoSwapchain,
    ) {
        let bind_groups: Vec<_> = mirror_layout(self.mode, target_size.0, target_size.1)
            .into_iter()
            .filter_map(|(eye, viewport)| {
                let view = swapchain.last_committed(eye)?;
                let bind_group =
                    texture_bind_group(device, "Mirror Texture", &self.layout, view, &self.sampler);
                Some((bind_group, viewport))
            })
            .collect();

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mirror Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_pipeline(&self.pipeline);
        for (bind_group, [x, y, w, h]) in &bind_groups {
            rpass.set_viewport(*x, *y, *w, *h, 0.0, 1.0);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_by_side_splits_the_window() {
        let layout = mirror_layout(MirrorMode::SideBySide, 800, 600);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0], (Eye::Left, [0.0, 0.0, 400.0, 600.0]));
        assert_eq!(layout[1], (Eye::Right, [400.0, 0.0, 400.0, 600.0]));
    }

    #[test]
    fn single_eye_fills_the_window() {
        let layout = mirror_layout(MirrorMode::Right, 800, 600);
        assert_eq!(layout, vec![(Eye::Right, [0.0, 0.0, 800.0, 600.0])]);
    }

    #[test]
    fn cursor_on_left_half_maps_into_left_eye() {
        let (eye, local) =
            eye_under_cursor(MirrorMode::SideBySide, Vec2::new(0.25, 0.5)).expect("eye");
        assert_eq!(eye, Eye::Left);
        assert!(local.distance(Vec2::new(0.5, 0.5)) < 1e-6);
    }

    #[test]
    fn cursor_on_right_half_maps_into_right_eye() {
        let (eye, local) =
            eye_under_cursor(MirrorMode::SideBySide, Vec2::new(0.9, 0.2)).expect("eye");
        assert_eq!(eye, Eye::Right);
        assert!(local.distance(Vec2::new(0.8, 0.2)) < 1e-5);
    }

    #[test]
    fn single_eye_mode_uses_the_whole_window() {
        let (eye, local) = eye_under_cursor(MirrorMode::Left, Vec2::new(0.25, 0.5)).expect("eye");
        assert_eq!(eye, Eye::Left);
        assert_eq!(local, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn cursor_on_the_far_edge_stays_in_the_last_eye() {
        let (eye, _) = eye_under_cursor(MirrorMode::SideBySide, Vec2::ONE).expect("eye");
        assert_eq!(eye, Eye::Right);
    }
}
