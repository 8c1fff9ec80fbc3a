//! Build information health check

use crate::build_info;
use crate::health::check::{CheckContext, CheckResult, Findings, SystemCheck};

/// Checks that build metadata was captured
pub struct BuildInfoCheck;

impl BuildInfoCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuildInfoCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for BuildInfoCheck {
    fn name(&self) -> &'static str {
        "Build Info"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates build metadata (git, rustc, timestamps)")
    }

    fn check(&self, _ctx: &CheckContext) -> CheckResult {
        let mut findings = Findings::new();

        for line in build_info::detailed_info().lines() {
            findings.info(line);
        }

        if build_info::GIT_SHA.is_none() {
            findings.warn("Built outside a git checkout, commit unknown");
        } else if build_info::is_git_dirty() {
            findings.info("Working tree had uncommitted changes");
        }

        findings.finish(
            format!("Build {}", build_info::version_string()),
            "Build metadata incomplete",
            "Build metadata missing",
        )
    }
}
