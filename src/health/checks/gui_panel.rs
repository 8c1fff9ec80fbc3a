//! GUI panel health check

use glam::{Vec2, Vec3};

use crate::app::{DemoPanel, PanelInfo};
use crate::camera::{Camera, Pose};
use crate::gui::{PanelBackend, project_pointer};
use crate::health::check::{CheckContext, CheckResult, Findings, SystemCheck};
use crate::hmd::ControllerState;

/// Allowed distance in canvas pixels between the expected and projected pointer
const POINTER_TOLERANCE: f32 = 0.5;

/// Aims a controller at the panel centre and runs one GUI frame on the CPU
pub struct GuiPanelCheck;

impl GuiPanelCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GuiPanelCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for GuiPanelCheck {
    fn name(&self) -> &'static str {
        "GUI Panel"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates controller ray projection and a GUI frame on the panel")
    }

    fn check(&self, ctx: &CheckContext) -> CheckResult {
        let config = &ctx.config.panel;
        let mut findings = Findings::new();
        let mut panel = PanelBackend::new(config);

        let quad = panel.quad();
        let extent = quad.world_extent();
        findings.info(format!(
            "Canvas {}x{} px on a {:.2} x {:.2} m quad",
            quad.canvas_size.x, quad.canvas_size.y, extent.x, extent.y
        ));

        // One metre in front of the panel, looking straight at its centre
        let model = config.model();
        let (_, rotation, _) = model.to_scale_rotation_translation();
        let origin = model.transform_point3(Vec3::Z);
        let controller = ControllerState {
            pose: Pose::new(origin, rotation),
            active: true,
            ..ControllerState::default()
        };

        let expected = quad.canvas_size.as_vec2() * 0.5;
        let raw_input = panel.new_frame(&controller, &Camera::default());

        match panel.pointer() {
            Some(hit) if hit.canvas_pos.distance(expected) <= POINTER_TOLERANCE => {
                findings.ok(format!(
                    "Centre ray hit ({:.1}, {:.1}) at {:.2} m",
                    hit.canvas_pos.x, hit.canvas_pos.y, hit.distance
                ));
            }
            Some(hit) => findings.fail(format!(
                "Centre ray hit ({:.1}, {:.1}), expected ({:.1}, {:.1})",
                hit.canvas_pos.x, hit.canvas_pos.y, expected.x, expected.y
            )),
            None => findings.fail("Centre ray missed the panel"),
        }

        let projected = project_pointer(config, origin, model.transform_vector3(-Vec3::Z));
        if projected.is_none_or(|pos: Vec2| pos.distance(expected) > POINTER_TOLERANCE) {
            findings.fail(format!("project_pointer disagrees: {projected:?}"));
        }

        let mut demo = DemoPanel::default();
        let info = PanelInfo {
            runtime: "health-check",
            frame_index: 0,
            pointer: panel.pointer(),
            trigger: controller.index_trigger,
        };
        let output = panel.context().run(raw_input, |ctx| demo.ui(ctx, &info));
        let primitives = panel
            .context()
            .tessellate(output.shapes, output.pixels_per_point);

        if primitives.is_empty() {
            findings.fail("GUI frame produced no geometry");
        } else {
            findings.ok(format!("GUI frame tessellated into {} primitives", primitives.len()));
        }

        findings.finish(
            "Pointer projection and GUI frame operational",
            "GUI panel operational with warnings",
            "GUI panel check failed",
        )
    }
}
