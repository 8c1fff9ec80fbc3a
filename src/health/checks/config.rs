//! Configuration system health check

use crate::config::AppConfig;
use crate::health::check::{CheckContext, CheckResult, Findings, SystemCheck};

/// Checks that every profile loads and that the active one holds usable values
pub struct ConfigCheck {
    profiles: Vec<&'static str>,
}

impl ConfigCheck {
    pub fn new() -> Self {
        Self {
            profiles: vec!["debug", "release"],
        }
    }

    pub fn with_profiles(profiles: Vec<&'static str>) -> Self {
        Self { profiles }
    }
}

impl Default for ConfigCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Range checks on values the panel and renderer divide by or clamp with
pub fn validate(config: &AppConfig, findings: &mut Findings) {
    let panel = &config.panel;
    if panel.pixels_per_unit <= 0.0 {
        findings.fail(format!(
            "panel.pixels_per_unit must be positive, got {}",
            panel.pixels_per_unit
        ));
    }
    if panel.canvas_size.contains(&0) {
        findings.warn(format!(
            "panel.canvas_size {:?} has a zero side, clamped to 1",
            panel.canvas_size
        ));
    }
    if !(0.0..1.0).contains(&panel.thumbstick_deadzone) {
        findings.fail(format!(
            "panel.thumbstick_deadzone {} outside [0, 1)",
            panel.thumbstick_deadzone
        ));
    }
    if panel.max_raycast_distance <= 0.0 {
        findings.fail(format!(
            "panel.max_raycast_distance must be positive, got {}",
            panel.max_raycast_distance
        ));
    }

    let hmd = &config.hmd;
    if !(hmd.near > 0.0 && hmd.far > hmd.near) {
        findings.fail(format!(
            "hmd clip planes invalid: near {} far {}",
            hmd.near, hmd.far
        ));
    }
    if hmd.fov_degrees.iter().any(|fov| !(1.0..180.0).contains(fov)) {
        findings.fail(format!("hmd.fov_degrees {:?} outside (1, 180)", hmd.fov_degrees));
    }
    if hmd.swapchain_length == 0 {
        findings.warn("hmd.swapchain_length is 0, one image per eye will be used");
    }
}

impl SystemCheck for ConfigCheck {
    fn name(&self) -> &'static str {
        "Configuration"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates profile loading and configured value ranges")
    }

    fn check(&self, ctx: &CheckContext) -> CheckResult {
        let mut findings = Findings::new();

        for profile in &self.profiles {
            match AppConfig::load(profile) {
                Ok(config) => findings.ok(format!(
                    "Profile '{}': canvas {}x{} at {} px/unit, runtime {}",
                    profile,
                    config.panel.canvas_size[0],
                    config.panel.canvas_size[1],
                    config.panel.pixels_per_unit,
                    config.hmd.runtime.label()
                )),
                Err(e) => findings.fail(format!("Profile '{profile}': failed to load - {e}")),
            }
        }

        let before = findings.status();
        validate(&ctx.config, &mut findings);
        if findings.status() == before {
            findings.ok(format!("Active profile '{}' values in range", ctx.config.profile));
        }

        findings.finish(
            format!("{} profiles validated", self.profiles.len()),
            "Config loaded with warnings",
            "Configuration is invalid",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::check::CheckStatus;

    #[test]
    fn defaults_are_in_range() {
        let mut findings = Findings::new();
        validate(&AppConfig::default(), &mut findings);
        assert_eq!(findings.status(), CheckStatus::Pass);
    }

    #[test]
    fn zero_pixels_per_unit_fails() {
        let mut config = AppConfig::default();
        config.panel.pixels_per_unit = 0.0;
        let mut findings = Findings::new();
        validate(&config, &mut findings);
        assert_eq!(findings.status(), CheckStatus::Fail);
    }

    #[test]
    fn out_of_range_deadzone_fails() {
        let mut config = AppConfig::default();
        config.panel.thumbstick_deadzone = 1.5;
        let mut findings = Findings::new();
        validate(&config, &mut findings);
        assert_eq!(findings.status(), CheckStatus::Fail);
    }
}
