//! egui backend for a GUI panel floating in the VR scene
//!
//! The panel is an off-screen canvas of a virtual pixel size, mapped onto a
//! quad placed by a model matrix. Each frame:
//!
//! 1. [`PanelBackend::new_frame`] casts the controller ray against the quad and
//!    turns the hit point and controller buttons into egui input
//! 2. [`PanelBackend::run`] runs the GUI and draws it into the canvas
//! 3. the eye passes sample [`PanelBackend::canvas_view`] on the quad and draw
//!    [`PanelBackend::controller_line`]

use std::time::Instant;

use egui::{Context, Event, Pos2, RawInput, Rect};
use glam::{Mat4, UVec2, Vec2};
use tracing::{debug, info};
use wgpu::{CommandEncoder, Device, Queue};

use crate::camera::Camera;
use crate::config::PanelConfig;
use crate::hmd::ControllerState;
use crate::raycast::{CanvasHit, CanvasQuad, Ray};
use crate::render::line::LineSegment;

pub mod canvas;
pub mod input;

pub use canvas::GuiCanvas;
pub use input::{ControllerMapper, map_analog_input};

/// GPU objects that live between `init` and `shutdown`
struct DeviceObjects {
    canvas: GuiCanvas,
    renderer: egui_wgpu::Renderer,
    max_texture_side: usize,
}

pub struct PanelBackend {
    ctx: Context,
    canvas_size: UVec2,
    pixels_per_unit: f32,
    max_raycast_distance: f32,
    model: Mat4,
    background: [f32; 4],
    line_color: [f32; 3],
    mapper: ControllerMapper,
    ray: Option<Ray>,
    pointer: Option<CanvasHit>,
    last_pointer_pos: Pos2,
    device_objects: Option<DeviceObjects>,
    started: Instant,
}

impl PanelBackend {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            ctx: Context::default(),
            canvas_size: config.canvas_size(),
            pixels_per_unit: config.pixels_per_unit,
            max_raycast_distance: config.max_raycast_distance,
            model: config.model(),
            background: config.background,
            line_color: config.line_color,
            mapper: ControllerMapper::new(config.thumbstick_deadzone),
            ray: None,
            pointer: None,
            last_pointer_pos: Pos2::ZERO,
            device_objects: None,
            started: Instant::now(),
        }
    }

    /// Creates the canvas texture and the draw-list renderer
    pub fn init(&mut self, device: &Device) {
        let canvas = GuiCanvas::new(device, self.canvas_size);
        let renderer = egui_wgpu::Renderer::new(
            device,
            GuiCanvas::FORMAT,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                ..Default::default()
            },
        );
        self.device_objects = Some(DeviceObjects {
            canvas,
            renderer,
            max_texture_side: device.limits().max_texture_dimension_2d as usize,
        });

        info!(
            canvas.width = self.canvas_size.x,
            canvas.height = self.canvas_size.y,
            pixels_per_unit = self.pixels_per_unit,
            "GUI panel initialized"
        );
    }

    /// Releases GPU objects; `init` may be called again afterwards
    pub fn shutdown(&mut self) {
        if self.device_objects.take().is_some() {
            info!("GUI panel shut down");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.device_objects.is_some()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn set_virtual_canvas_size(&mut self, size: UVec2) {
        self.canvas_size = size.max(UVec2::ONE);
    }

    pub fn set_thumbstick_deadzone(&mut self, deadzone: f32) {
        self.mapper.set_deadzone(deadzone);
    }

    pub fn set_max_raycast_distance(&mut self, distance: f32) {
        self.max_raycast_distance = distance.max(0.0);
    }

    pub fn set_pixels_per_unit(&mut self, pixels_per_unit: f32) {
        self.pixels_per_unit = pixels_per_unit;
    }

    /// Places the panel; the canvas scale is applied on top of `model`
    pub fn set_model(&mut self, model: Mat4) {
        self.model = model;
    }

    pub fn set_background(&mut self, background: [f32; 4]) {
        self.background = background;
    }

    pub fn set_line_color(&mut self, color: [f32; 3]) {
        self.line_color = color;
    }

    pub fn canvas_size(&self) -> UVec2 {
        self.canvas_size
    }

    pub fn thumbstick_deadzone(&self) -> f32 {
        self.mapper.deadzone()
    }

    pub fn max_raycast_distance(&self) -> f32 {
        self.max_raycast_distance
    }

    pub fn quad(&self) -> CanvasQuad {
        CanvasQuad::new(self.model, self.canvas_size, self.pixels_per_unit)
    }

    /// Where the controller ray hits the canvas this frame
    pub fn pointer(&self) -> Option<CanvasHit> {
        self.pointer
    }

    /// Controller ray ending at the hit point, or at the max distance on a miss
    pub fn controller_line(&self) -> Option<LineSegment> {
        let ray = self.ray?;
        let end = match self.pointer {
            Some(hit) => hit.world_pos,
            None => ray.at(self.max_raycast_distance),
        };
        Some(LineSegment::new(ray.origin, end, self.line_color))
    }

    pub fn canvas_view(&self) -> Option<&wgpu::TextureView> {
        self.device_objects.as_ref().map(|objects| &objects.canvas.view)
    }

    /// Builds this frame's GUI input from the controller
    ///
    /// `controller.pose` is in tracking space; `camera` places it in the world.
    pub fn new_frame(&mut self, controller: &ControllerState, camera: &Camera) -> RawInput {
        let mut events = Vec::new();

        self.ray = controller
            .active
            .then(|| Ray::from_pose(&camera.to_world(&controller.pose)));

        let hit = self
            .ray
            .and_then(|ray| self.quad().raycast(&ray, self.max_raycast_distance));

        match hit {
            Some(hit) => {
                let pos = Pos2::new(hit.canvas_pos.x, hit.canvas_pos.y);
                self.last_pointer_pos = pos;
                events.push(Event::PointerMoved(pos));
            }
            None if self.pointer.is_some() => {
                debug!("Controller ray left the panel");
                events.push(Event::PointerGone);
            }
            None => {}
        }
        self.pointer = hit;

        let mut mapped = self.mapper.update(controller, self.last_pointer_pos);
        if hit.is_none() {
            // Off the panel a trigger pull must not land on the last hovered widget
            mapped.retain(|event| !matches!(event, Event::PointerButton { pressed: true, .. }));
        }
        events.extend(mapped);

        let size = self.canvas_size.as_vec2();
        RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, egui::vec2(size.x, size.y))),
            max_texture_side: self
                .device_objects
                .as_ref()
                .map(|objects| objects.max_texture_side),
            time: Some(self.started.elapsed().as_secs_f64()),
            events,
            focused: true,
            ..Default::default()
        }
    }

    /// Runs the GUI and draws it into the canvas
    pub fn run(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        raw_input: RawInput,
        mut ui: impl FnMut(&Context),
    ) {
        let full_output = self.ctx.run(raw_input, |ctx| ui(ctx));
        let primitives = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        self.render_draw_data(
            device,
            queue,
            encoder,
            &primitives,
            &full_output.textures_delta,
            full_output.pixels_per_point,
        );
    }

    /// Uploads textures and draws tessellated GUI output into the canvas
    pub fn render_draw_data(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) {
        let Some(objects) = self.device_objects.as_mut() else {
            debug!("GUI panel not initialized, skipping draw");
            return;
        };

        if objects.canvas.resize(device, self.canvas_size) {
            info!(
                width = self.canvas_size.x,
                height = self.canvas_size.y,
                "GUI canvas resized"
            );
        }

        // A canvas clamped to the device limit draws the same layout at a lower density
        let texture_size = objects.canvas.size();
        let density = texture_size.x as f32 / self.canvas_size.x.max(1) as f32;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: texture_size.to_array(),
            pixels_per_point: pixels_per_point * density,
        };

        for (id, image_delta) in &textures_delta.set {
            objects
                .renderer
                .update_texture(device, queue, *id, image_delta);
        }

        objects
            .renderer
            .update_buffers(device, queue, encoder, primitives, &screen_descriptor);

        {
            let rpass = objects.canvas.begin_pass(encoder, self.background);
            objects
                .renderer
                .render(&mut rpass.forget_lifetime(), primitives, &screen_descriptor);
        }

        for id in &textures_delta.free {
            objects.renderer.free_texture(id);
        }
    }
}

/// Canvas pixel where a ray from `origin` along `direction` meets the panel
pub fn project_pointer(
    config: &PanelConfig,
    origin: glam::Vec3,
    direction: glam::Vec3,
) -> Option<Vec2> {
    let quad = CanvasQuad::new(config.model(), config.canvas_size(), config.pixels_per_unit);
    quad.raycast(&Ray::new(origin, direction), config.max_raycast_distance)
        .map(|hit| hit.canvas_pos)
}
