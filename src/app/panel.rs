//! Sample GUI shown on the VR panel

use crate::raycast::CanvasHit;

/// Per-frame facts the demo panel displays
#[derive(Debug, Clone, Copy)]
pub struct PanelInfo<'a> {
    pub runtime: &'a str,
    pub frame_index: u64,
    pub pointer: Option<CanvasHit>,
    pub trigger: f32,
}

#[derive(Debug, Clone)]
pub struct DemoPanel {
    clicks: u32,
    volume: f32,
    show_details: bool,
    progress: f32,
    accent: [f32; 3],
}

impl Default for DemoPanel {
    fn default() -> Self {
        Self {
            clicks: 0,
            volume: 0.5,
            show_details: true,
            progress: 0.0,
            accent: [0.9, 0.4, 0.1],
        }
    }
}

impl DemoPanel {
    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    /// Advances the progress bar by `step`, wrapping back to zero past full
    pub fn advance_progress(&mut self, step: f32) {
        self.progress += step;
        if self.progress > 1.0 {
            self.progress = 0.0;
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, info: &PanelInfo<'_>) {
        self.advance_progress(0.002);

        egui::SidePanel::left("panel_status")
            .resizable(false)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.heading("VR GUI");
                ui.separator();
                ui.label(format!("Runtime: {}", info.runtime));
                ui.label(format!("Frame: {}", info.frame_index));
                match info.pointer {
                    Some(hit) => {
                        ui.label(format!(
                            "Pointer: ({:.0}, {:.0}) at {:.2} m",
                            hit.canvas_pos.x, hit.canvas_pos.y, hit.distance
                        ));
                    }
                    None => {
                        ui.label("Pointer: off panel");
                    }
                }
                ui.add(egui::ProgressBar::new(info.trigger).text("Trigger"));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Click me").clicked() {
                    self.clicks += 1;
                }
                if ui.button("Reset").clicked() {
                    self.clicks = 0;
                }
                ui.label(format!("Clicked {} times", self.clicks));
            });
            ui.separator();

            ui.add(egui::Slider::new(&mut self.volume, 0.0..=1.0).text("Volume"));
            ui.checkbox(&mut self.show_details, "Show details");
            ui.color_edit_button_rgb(&mut self.accent);
            ui.add(egui::ProgressBar::new(self.progress).show_percentage());

            if self.show_details {
                ui.separator();
                ui.label("Point with the controller and pull the trigger to click.");
                ui.label("Thumbstick moves focus, Y and X cycle widgets, grip cancels.");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_wraps_after_full() {
        let mut panel = DemoPanel::default();
        panel.advance_progress(0.6);
        panel.advance_progress(0.6);
        assert_eq!(panel.progress, 0.0);
    }

    #[test]
    fn panel_draws_without_a_gpu() {
        let ctx = egui::Context::default();
        let mut panel = DemoPanel::default();
        let info = PanelInfo {
            runtime: "simulated",
            frame_index: 1,
            pointer: None,
            trigger: 0.0,
        };

        let output = ctx.run(egui::RawInput::default(), |ctx| panel.ui(ctx, &info));
        assert!(!output.shapes.is_empty());
        assert_eq!(panel.clicks(), 0);
    }
}
