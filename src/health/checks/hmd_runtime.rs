//! HMD runtime health check

use crate::hmd::{self, Hand, HmdError, RuntimeKind};
use crate::health::check::{CheckContext, CheckResult, Findings, SystemCheck};

/// Creates the configured runtime and drives one frame through it
pub struct HmdRuntimeCheck {
    runtime: Option<RuntimeKind>,
}

impl HmdRuntimeCheck {
    /// Checks the runtime named by the configuration
    pub fn new() -> Self {
        Self { runtime: None }
    }

    /// Checks `runtime` regardless of configuration
    pub fn with_runtime(runtime: RuntimeKind) -> Self {
        Self {
            runtime: Some(runtime),
        }
    }
}

impl Default for HmdRuntimeCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for HmdRuntimeCheck {
    fn name(&self) -> &'static str {
        "HMD Runtime"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates HMD runtime creation and one tracked frame")
    }

    fn check(&self, ctx: &CheckContext) -> CheckResult {
        let mut config = ctx.config.hmd.clone();
        if let Some(runtime) = self.runtime {
            config.runtime = runtime;
        }

        let mut findings = Findings::new();
        let mut runtime = match hmd::create_runtime(&config) {
            Ok(runtime) => runtime,
            Err(HmdError::Unavailable(reason)) => {
                findings.warn(format!("{}: {reason}", config.runtime.label()));
                return findings.finish("", "HMD runtime unavailable", "");
            }
            Err(e) => {
                findings.fail(e.to_string());
                return findings.finish("", "", "HMD runtime failed to start");
            }
        };

        let description = runtime.description();
        findings.ok(format!("{} runtime created", runtime.name()));
        findings.info(format!("Display: {}", description.display_name));
        findings.info(format!(
            "Eye target: {}x{}, IPD {:.1} mm, {:.0} Hz",
            description.eye_resolution.x,
            description.eye_resolution.y,
            description.ipd() * 1000.0,
            description.refresh_rate
        ));

        match runtime.begin_frame() {
            Ok(tracking) => {
                findings.ok(format!("Frame {} tracked", tracking.frame_index));
                for hand in Hand::BOTH {
                    let controller = tracking.controller(hand);
                    findings.info(format!(
                        "{hand:?} controller: {}",
                        if controller.active { "active" } else { "inactive" }
                    ));
                }
            }
            Err(e) => findings.fail(format!("begin_frame: {e}")),
        }

        match runtime.end_frame() {
            Ok(status) if status.should_quit => findings.warn("Session asked to quit"),
            Ok(_) => findings.ok("Frame submitted"),
            Err(e) => findings.fail(format!("end_frame: {e}")),
        }

        findings.finish(
            format!("{} runtime operational", runtime.name()),
            format!("{} runtime operational with warnings", runtime.name()),
            format!("{} runtime frame loop failed", runtime.name()),
        )
    }
}
