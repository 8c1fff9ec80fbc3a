//! wgpu glue for the stereo scene and the desktop mirror
//!
//! ## Architecture
//!
//! - `swapchain`: per-eye ring of render targets the headset images live in
//! - `quad`: GUI canvas drawn onto the world-space panel
//! - `line`: controller ray and floor grid
//! - `mirror`: committed eye images shown on the desktop window
//! - `mesh` / `shader`: vertex, index and uniform buffer helpers

use std::sync::Arc;

use egui::Context;
use glam::{Mat4, UVec2};
use serde::{Deserialize, Serialize};
use tracing::info;
use wgpu::{CommandEncoder, Device, Queue, Surface, SurfaceConfiguration, TextureView};
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::{Eye, EyeView};
use crate::config::{GraphicsConfig, HmdConfig};
use crate::error::Result;

pub mod line;
pub mod mesh;
pub mod mirror;
pub mod quad;
pub mod shader;
pub mod swapchain;

use line::{LineRenderer, LineSegment};
use mirror::MirrorRenderer;
use quad::QuadRenderer;
use swapchain::StereoSwapchain;

const SCENE_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

/// Which eye images the desktop window shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMode {
    #[default]
    SideBySide,
    Left,
    Right,
}

impl MirrorMode {
    pub const ALL: [MirrorMode; 3] = [MirrorMode::SideBySide, MirrorMode::Left, MirrorMode::Right];

    pub fn label(self) -> &'static str {
        match self {
            MirrorMode::SideBySide => "side by side",
            MirrorMode::Left => "left eye",
            MirrorMode::Right => "right eye",
        }
    }
}

/// Everything the eye passes draw this frame
pub struct StereoScene<'a> {
    pub eyes: [EyeView; 2],
    /// Panel model with the canvas scale applied
    pub panel_model: Mat4,
    pub canvas: &'a TextureView,
    pub lines: &'a [LineSegment],
}

/// Renderer owns the GPU device, the eye targets and the mirror window surface
pub struct Renderer {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    adapter_info: wgpu::AdapterInfo,
    swapchain: StereoSwapchain,
    quad: QuadRenderer,
    lines: LineRenderer,
    mirror: MirrorRenderer,
    egui_ctx: Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn config(&self) -> &SurfaceConfiguration {
        &self.config
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub fn swapchain(&self) -> &StereoSwapchain {
        &self.swapchain
    }

    pub fn mirror_mode(&self) -> MirrorMode {
        self.mirror.mode()
    }

    pub fn set_mirror_mode(&mut self, mode: MirrorMode) {
        self.mirror.set_mode(mode);
    }

    /// Creates a renderer for the mirror window with eye targets of `eye_resolution`
    pub async fn new(
        window: Arc<Window>,
        graphics: &GraphicsConfig,
        hmd: &HmdConfig,
        eye_resolution: UVec2,
    ) -> Result<Self> {
        info!(backend = ?graphics.backend, "Initializing wgpu renderer");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: graphics.backend.to_backends(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: graphics.power_preference(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let adapter_info = adapter.get_info();
        info!(
            adapter.name = adapter_info.name,
            adapter.backend = ?adapter_info.backend,
            "Found GPU adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Main Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: Default::default(),
            })
            .await?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: graphics.present_mode(),
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        info!(
            surface.width = config.width,
            surface.height = config.height,
            surface.format = ?config.format,
            "Surface configured"
        );

        let max_dimension = device.limits().max_texture_dimension_2d;
        let swapchain = StereoSwapchain::new(
            &device,
            eye_resolution.min(UVec2::splat(max_dimension)),
            hmd.swapchain_length,
        );
        let quad = QuadRenderer::new(&device);
        let lines = LineRenderer::new(&device);
        let mirror = MirrorRenderer::new(&device, config.format, hmd.mirror);

        let egui_ctx = Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                ..Default::default()
            },
        );

        info!("Renderer initialized");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_info,
            swapchain,
            quad,
            lines,
            mirror,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    /// Handles window events for the desktop overlay
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        response.consumed
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            info!(
                width = new_size.width,
                height = new_size.height,
                "Surface resized"
            );
        }
    }

    pub fn create_encoder(&self) -> CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
    }

    /// Records both eye passes into the current swapchain images and commits them
    pub fn render_eyes(&mut self, encoder: &mut CommandEncoder, scene: &StereoScene<'_>) {
        self.quad.set_texture(&self.device, scene.canvas);
        self.lines.set_lines(&self.device, scene.lines);

        for eye in Eye::BOTH {
            let eye_view = &scene.eyes[eye.index()];
            let view_proj = eye_view.view_projection();
            self.quad.prepare(&self.queue, eye, view_proj * scene.panel_model);
            self.lines.prepare(&self.queue, eye, view_proj);

            {
                let mut rpass = self.swapchain.begin_eye(encoder, eye, SCENE_CLEAR);
                self.lines.draw(&mut rpass, eye);
                self.quad.draw(&mut rpass, eye);
            }

            self.swapchain.commit(eye);
        }
    }

    /// Mirrors the eye images to the window, draws the overlay on top and presents
    pub fn present(
        &mut self,
        window: &Window,
        mut encoder: CommandEncoder,
        mut overlay_ui: impl FnMut(&Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                // Eye images were committed, keep them consistent with the ring
                self.queue.submit(std::iter::once(encoder.finish()));
                return Err(e);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.mirror.draw(
            &self.device,
            &mut encoder,
            &view,
            (self.config.width, self.config.height),
            &self.swapchain,
        );

        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| overlay_ui(ctx));

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );

        // Render pass - use forget_lifetime() for egui_wgpu compatibility
        {
            let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut rpass.forget_lifetime(), &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        window.pre_present_notify();
        output.present();

        Ok(())
    }
}
