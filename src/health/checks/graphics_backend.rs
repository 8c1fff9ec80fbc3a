//! Graphics backend health check

use std::collections::BTreeSet;

use crate::gui::GuiCanvas;
use crate::health::check::{CheckContext, CheckResult, Findings, SystemCheck};
use crate::render::swapchain::COLOR_FORMAT;

/// Checks that the configured wgpu backend offers an adapter able to render
/// the eye targets and the GUI canvas
pub struct GraphicsBackendCheck;

impl GraphicsBackendCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GraphicsBackendCheck {
    fn default() -> Self {
        Self::new()
    }
}

fn device_type_label(device_type: wgpu::DeviceType) -> &'static str {
    match device_type {
        wgpu::DeviceType::DiscreteGpu => "Discrete GPU",
        wgpu::DeviceType::IntegratedGpu => "Integrated GPU",
        wgpu::DeviceType::VirtualGpu => "Virtual GPU",
        wgpu::DeviceType::Cpu => "CPU",
        wgpu::DeviceType::Other => "Other",
    }
}

impl SystemCheck for GraphicsBackendCheck {
    fn name(&self) -> &'static str {
        "Graphics Backend"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates wgpu adapters against eye target and canvas requirements")
    }

    fn check(&self, ctx: &CheckContext) -> CheckResult {
        let mut findings = Findings::new();
        let backends = ctx.config.graphics.backend.to_backends();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        findings.ok(format!("wgpu instance created for {backends:?}"));

        let adapters: Vec<_> = instance.enumerate_adapters(backends).into_iter().collect();
        if adapters.is_empty() {
            // Headless CI machines have no adapter at all
            findings.warn("No graphics adapters found");
            return findings.finish("", "No graphics adapters available", "");
        }
        findings.ok(format!("Found {} adapter(s)", adapters.len()));

        let eye = ctx.config.hmd.eye_resolution();
        let canvas = ctx.config.panel.canvas_size();
        let needed_side = eye.max_element().max(canvas.max_element());

        let mut backend_names = BTreeSet::new();
        let mut has_hardware = false;
        let mut usable = 0;

        for (i, adapter) in adapters.iter().enumerate() {
            let info = adapter.get_info();
            backend_names.insert(format!("{:?}", info.backend));
            has_hardware |= matches!(
                info.device_type,
                wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu
            );

            findings.info(format!(
                "[{i}] {} - {} ({:?})",
                info.name,
                device_type_label(info.device_type),
                info.backend
            ));

            let max_side = adapter.limits().max_texture_dimension_2d;
            let required = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
            let formats_ok = [COLOR_FORMAT, GuiCanvas::FORMAT].iter().all(|format| {
                adapter
                    .get_texture_format_features(*format)
                    .allowed_usages
                    .contains(required)
            });

            if max_side >= needed_side && formats_ok {
                usable += 1;
            } else {
                findings.info(format!(
                    "    cannot render {needed_side}px targets (max {max_side}px, formats ok: {formats_ok})"
                ));
            }
        }

        findings.info(format!(
            "Backends available: {}",
            backend_names.into_iter().collect::<Vec<_>>().join(", ")
        ));

        if usable == 0 {
            findings.fail(format!(
                "No adapter supports {}x{} eye targets and a {}x{} canvas",
                eye.x, eye.y, canvas.x, canvas.y
            ));
        } else if !has_hardware {
            findings.warn("No hardware GPU detected, expect low frame rates");
        }

        findings.finish(
            format!("{usable} of {} adapters usable", adapters.len()),
            format!("{usable} of {} adapters usable (software only)", adapters.len()),
            "No usable graphics adapter",
        )
    }
}
