//! Desktop overlay with runtime, tracking and panel diagnostics

use std::time::Instant;

use sysinfo::System;

use crate::hmd::{Hand, HmdDescription, TrackingState};
use crate::raycast::{CanvasHit, CanvasQuad};
use crate::render::MirrorMode;

/// Frames averaged for the FPS readout
const FRAME_WINDOW: usize = 100;

/// Snapshot of everything the overlay shows this frame
pub struct DebugInfo<'a> {
    pub runtime: &'a str,
    pub description: &'a HmdDescription,
    pub tracking: Option<&'a TrackingState>,
    pub hand: Hand,
    pub pointer: Option<CanvasHit>,
    pub quad: CanvasQuad,
    pub thumbstick_deadzone: f32,
    pub max_raycast_distance: f32,
    pub adapter: Option<&'a wgpu::AdapterInfo>,
    pub surface_size: (u32, u32),
    pub surface_format: wgpu::TextureFormat,
    pub mirror_mode: MirrorMode,
}

/// What the user asked for through the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugUiResponse {
    pub mirror_mode: Option<MirrorMode>,
    pub recenter: bool,
}

#[derive(Debug, Clone)]
struct SystemSummary {
    os: String,
    kernel: String,
    physical_cores: usize,
    logical_cores: usize,
    memory_gb: f64,
}

impl SystemSummary {
    fn gather() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let os_name = System::name().unwrap_or_else(|| "Unknown".to_string());
        let os_version = System::os_version().unwrap_or_else(|| "Unknown".to_string());

        Self {
            os: format!("{os_name} {os_version}"),
            kernel: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            physical_cores: System::physical_core_count().unwrap_or(0),
            logical_cores: sys.cpus().len(),
            memory_gb: sys.total_memory() as f64 / 1_073_741_824.0,
        }
    }
}

/// Debug overlay state for toggling different sections
#[derive(Debug, Clone)]
pub struct DebugUi {
    pub show_window: bool,
    pub show_fps: bool,
    pub show_runtime: bool,
    pub show_tracking: bool,
    pub show_panel: bool,
    pub show_renderer: bool,
    pub show_system_info: bool,
    frame_times: Vec<f32>,
    last_frame_time: Instant,
    system: Option<SystemSummary>,
}

impl Default for DebugUi {
    fn default() -> Self {
        Self {
            show_window: cfg!(debug_assertions),
            show_fps: true,
            show_runtime: true,
            show_tracking: true,
            show_panel: true,
            show_renderer: true,
            show_system_info: false,
            frame_times: Vec::with_capacity(FRAME_WINDOW),
            last_frame_time: Instant::now(),
            system: None,
        }
    }
}

impl DebugUi {
    pub fn toggle_window(&mut self) {
        self.show_window = !self.show_window;
    }

    pub fn update_frame_time(&mut self) {
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.push_frame_time(frame_time);
    }

    fn push_frame_time(&mut self, frame_time: f32) {
        self.frame_times.push(frame_time);
        if self.frame_times.len() > FRAME_WINDOW {
            self.frame_times.remove(0);
        }
    }

    pub fn fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg_frame_time: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        if avg_frame_time > 0.0 {
            1.0 / avg_frame_time
        } else {
            0.0
        }
    }

    pub fn render(&mut self, ctx: &egui::Context, info: &DebugInfo<'_>) -> DebugUiResponse {
        let mut response = DebugUiResponse::default();

        self.update_frame_time();

        if !self.show_window {
            return response;
        }

        egui::Window::new("Debug Info")
            .default_pos([10.0, 40.0])
            .default_width(320.0)
            .resizable(true)
            .scroll([false, true])
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.checkbox(&mut self.show_fps, "FPS");
                    ui.checkbox(&mut self.show_runtime, "Runtime");
                    ui.checkbox(&mut self.show_tracking, "Tracking");
                    ui.checkbox(&mut self.show_panel, "Panel");
                    ui.checkbox(&mut self.show_renderer, "Renderer");
                    ui.checkbox(&mut self.show_system_info, "System");
                });
                ui.separator();

                if self.show_fps {
                    ui.heading("FPS");
                    ui.label(format!("FPS: {:.1}", self.fps()));
                    let last = self.frame_times.last().copied().unwrap_or(0.0);
                    ui.label(format!("Frame time: {:.2}ms", last * 1000.0));
                    ui.separator();
                }

                if self.show_runtime {
                    let d = info.description;
                    ui.heading("HMD Runtime");
                    ui.label(format!("Runtime: {}", info.runtime));
                    ui.label(format!("Display: {}", d.display_name));
                    ui.label(format!(
                        "Eye target: {}x{}",
                        d.eye_resolution.x, d.eye_resolution.y
                    ));
                    ui.label(format!("IPD: {:.1} mm", d.ipd() * 1000.0));
                    ui.label(format!("Refresh: {:.0} Hz", d.refresh_rate));
                    if ui.button("Recenter").clicked() {
                        response.recenter = true;
                    }
                    ui.separator();
                }

                if self.show_tracking {
                    ui.heading("Tracking");
                    match info.tracking {
                        Some(tracking) => {
                            let head = tracking.head.position;
                            ui.label(format!("Frame: {}", tracking.frame_index));
                            ui.label(format!(
                                "Head: ({:.2}, {:.2}, {:.2})",
                                head.x, head.y, head.z
                            ));
                            let controller = tracking.controller(info.hand);
                            if controller.active {
                                let p = controller.pose.position;
                                ui.label(format!(
                                    "Controller ({:?}): ({:.2}, {:.2}, {:.2})",
                                    info.hand, p.x, p.y, p.z
                                ));
                                ui.label(format!(
                                    "Trigger {:.2}  Grip {:.2}  Stick ({:.2}, {:.2})",
                                    controller.index_trigger,
                                    controller.hand_trigger,
                                    controller.thumbstick.x,
                                    controller.thumbstick.y
                                ));
                            } else {
                                ui.label(format!("Controller ({:?}): inactive", info.hand));
                            }
                        }
                        None => {
                            ui.label("No tracking yet");
                        }
                    }
                    ui.separator();
                }

                if self.show_panel {
                    let extent = info.quad.world_extent();
                    ui.heading("Panel");
                    ui.label(format!(
                        "Canvas: {}x{} px at {:.0} px/unit",
                        info.quad.canvas_size.x, info.quad.canvas_size.y, info.quad.pixels_per_unit
                    ));
                    ui.label(format!("Quad: {:.2} x {:.2} m", extent.x, extent.y));
                    ui.label(format!("Deadzone: {:.2}", info.thumbstick_deadzone));
                    ui.label(format!("Max ray: {:.1} m", info.max_raycast_distance));
                    match info.pointer {
                        Some(hit) => ui.label(format!(
                            "Pointer: ({:.1}, {:.1}) at {:.2} m",
                            hit.canvas_pos.x, hit.canvas_pos.y, hit.distance
                        )),
                        None => ui.label("Pointer: none"),
                    };
                    ui.separator();
                }

                if self.show_renderer {
                    ui.heading("Renderer");
                    if let Some(adapter) = info.adapter {
                        ui.label(format!("Adapter: {}", adapter.name));
                        ui.label(format!("Backend: {:?}", adapter.backend));
                    }
                    ui.label(format!(
                        "Surface: {}x{} {:?}",
                        info.surface_size.0, info.surface_size.1, info.surface_format
                    ));
                    let mut mode = info.mirror_mode;
                    egui::ComboBox::from_label("Mirror")
                        .selected_text(mode.label())
                        .show_ui(ui, |ui| {
                            for option in MirrorMode::ALL {
                                ui.selectable_value(&mut mode, option, option.label());
                            }
                        });
                    if mode != info.mirror_mode {
                        response.mirror_mode = Some(mode);
                    }
                    ui.separator();
                }

                if self.show_system_info {
                    let system = self.system.get_or_insert_with(SystemSummary::gather);
                    ui.heading("System Info");
                    ui.label(format!("OS: {}", system.os));
                    ui.label(format!("Kernel: {}", system.kernel));
                    ui.label(format!("Physical cores: {}", system.physical_cores));
                    ui.label(format!("Logical cores: {}", system.logical_cores));
                    ui.label(format!("Memory: {:.1} GB", system.memory_gb));
                }
            });

        response
    }
}
