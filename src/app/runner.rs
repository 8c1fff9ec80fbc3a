//! Main application handler: mirror window, HMD session and panel

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use super::debug_ui::{DebugInfo, DebugUi, DebugUiResponse};
use super::input::InputCollector;
use super::panel::{DemoPanel, PanelInfo};
use super::window::window_attributes_from_config;
use crate::camera::{Camera, Eye, EyeView};
use crate::config::AppConfig;
use crate::error::Result;
use crate::gui::PanelBackend;
use crate::hmd::{self, HmdRuntime, SessionStatus, TrackingState};
use crate::render::line::{LineSegment, floor_grid};
use crate::render::{Renderer, StereoScene};

const GRID_HALF_CELLS: i32 = 10;
const GRID_SPACING: f32 = 1.0;
const GRID_COLOR: [f32; 3] = [0.25, 0.25, 0.3];

/// Desktop host driving the VR frame loop
pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    hmd: Option<Box<dyn HmdRuntime>>,
    adapter_info: Option<wgpu::AdapterInfo>,
    panel: PanelBackend,
    demo: DemoPanel,
    debug_ui: DebugUi,
    camera: Camera,
    input_collector: InputCollector,
    floor_grid: Vec<LineSegment>,
    last_tracking: Option<TrackingState>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        info!(profile = %config.profile, runtime = config.hmd.runtime.label(), "Starting VR GUI");
        info!(?config.window, "Window configuration");

        let floor_grid = if config.panel.floor_grid {
            floor_grid(GRID_HALF_CELLS, GRID_SPACING, GRID_COLOR)
        } else {
            Vec::new()
        };

        Self {
            panel: PanelBackend::new(&config.panel),
            config,
            window: None,
            renderer: None,
            hmd: None,
            adapter_info: None,
            demo: DemoPanel::default(),
            debug_ui: DebugUi::default(),
            camera: Camera::default(),
            input_collector: InputCollector::new(),
            floor_grid,
            last_tracking: None,
            error: None,
        }
    }

    pub fn from_env() -> Self {
        let config = AppConfig::load_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using default configuration");
            AppConfig::default()
        });
        Self::new(config)
    }

    /// Startup failure that ended the event loop, if any
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        error!(error = %format!("{error:#}"), "Startup failed");
        self.error = Some(error);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes =
            window_attributes_from_config(&self.config.window, self.config.hmd.runtime);
        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        info!(
            window.width = size.width,
            window.height = size.height,
            "Window created successfully"
        );
        self.input_collector.set_window_size(size);

        let hmd = hmd::create_runtime(&self.config.hmd)?;
        let eye_resolution = hmd.description().eye_resolution;

        // winit's event loop is synchronous, so block on wgpu's async setup
        let runtime = tokio::runtime::Runtime::new()?;
        let renderer = runtime.block_on(Renderer::new(
            window.clone(),
            &self.config.graphics,
            &self.config.hmd,
            eye_resolution,
        ))?;

        self.panel.init(renderer.device());
        self.adapter_info = Some(renderer.adapter_info().clone());
        self.hmd = Some(hmd);
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.panel.shutdown();
        self.hmd = None;
        self.renderer = None;
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(window), Some(hmd)) =
            (&mut self.renderer, &self.window, &mut self.hmd)
        else {
            return;
        };

        hmd.feed_desktop_input(self.input_collector.state());
        self.input_collector.advance_frame();

        let tracking = match hmd.begin_frame() {
            Ok(tracking) => tracking,
            Err(e) => {
                error!(error = %e, runtime = hmd.name(), "begin_frame failed, skipping frame");
                return;
            }
        };
        self.last_tracking = Some(tracking);

        let controller = *tracking.controller(self.config.hmd.hand);
        let raw_input = self.panel.new_frame(&controller, &self.camera);

        let mut encoder = renderer.create_encoder();

        let panel_info = PanelInfo {
            runtime: hmd.name(),
            frame_index: tracking.frame_index,
            pointer: self.panel.pointer(),
            trigger: controller.index_trigger,
        };
        let demo = &mut self.demo;
        self.panel.run(
            renderer.device(),
            renderer.queue(),
            &mut encoder,
            raw_input,
            |ctx| demo.ui(ctx, &panel_info),
        );

        let mut lines = self.floor_grid.clone();
        lines.extend(self.panel.controller_line());

        if let Some(canvas) = self.panel.canvas_view() {
            let description = hmd.description();
            let eyes = Eye::BOTH.map(|eye| {
                EyeView::new(
                    &self.camera,
                    &tracking.eyes[eye.index()],
                    &description.fov[eye.index()],
                    self.config.hmd.near,
                    self.config.hmd.far,
                )
            });
            renderer.render_eyes(
                &mut encoder,
                &StereoScene {
                    eyes,
                    panel_model: self.panel.quad().scaled_model(),
                    canvas,
                    lines: &lines,
                },
            );
        }

        let status = hmd.end_frame().unwrap_or_else(|e| {
            error!(error = %e, runtime = hmd.name(), "end_frame failed");
            SessionStatus::default()
        });

        let surface = renderer.config();
        let debug_info = DebugInfo {
            runtime: hmd.name(),
            description: hmd.description(),
            tracking: self.last_tracking.as_ref(),
            hand: self.config.hmd.hand,
            pointer: self.panel.pointer(),
            quad: self.panel.quad(),
            thumbstick_deadzone: self.panel.thumbstick_deadzone(),
            max_raycast_distance: self.panel.max_raycast_distance(),
            adapter: self.adapter_info.as_ref(),
            surface_size: (surface.width, surface.height),
            surface_format: surface.format,
            mirror_mode: renderer.mirror_mode(),
        };

        let debug_ui = &mut self.debug_ui;
        let mut response = DebugUiResponse::default();
        match renderer.present(window, encoder, |ctx| {
            response = debug_ui.render(ctx, &debug_info);
        }) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => {
                warn!("Surface lost, reconfiguring");
                let size = window.inner_size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("Out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => {
                error!(error = %e, "Render error");
            }
        }

        if let Some(mode) = response.mirror_mode {
            info!(mode = mode.label(), "Mirror mode changed");
            renderer.set_mirror_mode(mode);
            hmd.set_mirror_mode(mode);
        }

        if status.should_recenter || response.recenter {
            match hmd.recenter() {
                Ok(()) => info!("Tracking origin recentered"),
                Err(e) => error!(error = %e, "Recenter failed"),
            }
        }

        if status.should_quit {
            info!("HMD session asked to quit, exiting");
            event_loop.exit();
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && self.error.is_none()
            && let Err(e) = self.start(event_loop)
        {
            self.fail(event_loop, e.into());
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Overlay first so clicks on its widgets do not reach the simulated controller
        let consumed = match (&mut self.renderer, &self.window) {
            (Some(renderer), Some(window)) => renderer.handle_event(window, &event),
            _ => false,
        };
        self.input_collector.handle_window_event(&event, consumed);

        if let WindowEvent::KeyboardInput { event, .. } = &event
            && event.state.is_pressed()
            && !event.repeat
        {
            match event.physical_key {
                PhysicalKey::Code(KeyCode::Backquote) => {
                    self.debug_ui.toggle_window();
                    return;
                }
                PhysicalKey::Code(KeyCode::Escape) => {
                    info!("Escape pressed, exiting");
                    event_loop.exit();
                    return;
                }
                _ => {}
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

impl App {
    /// Runs the event loop until the window closes or the session quits
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = winit::event_loop::EventLoop::new()
            .map_err(|e| anyhow!("failed to create event loop: {e}"))?;
        event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        match self.take_error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
