//! Health check system for validating startup without opening a window
//!
//! Runs from `vr_gui --check` and from the integration tests. Checks receive
//! the configuration of the profile under test through [`CheckContext`].
//!
//! # Example
//!
//! ```no_run
//! use vr_gui::config::AppConfig;
//! use vr_gui::health::{CheckContext, HealthCheckRunner, checks::*};
//!
//! let config = AppConfig::load("debug").unwrap_or_default();
//! let report = HealthCheckRunner::with_context(CheckContext::new(config))
//!     .add_check(ConfigCheck::new())
//!     .add_check(HmdRuntimeCheck::new())
//!     .add_check(GuiPanelCheck::new())
//!     .run();
//!
//! if report.is_healthy() {
//!     println!("All systems operational!");
//! }
//! ```

pub mod check;
pub mod checks;
pub mod reporter;
pub mod runner;

pub use check::{CheckContext, CheckResult, CheckStatus, Findings, SystemCheck};
pub use reporter::{format_report, print_report};
pub use runner::{HealthCheckReport, HealthCheckRunner};

use crate::config::AppConfig;

/// Runs all default health checks against `config`
pub fn run_all_checks(config: AppConfig) -> HealthCheckReport {
    HealthCheckRunner::with_context(CheckContext::new(config))
        .add_check(checks::ConfigCheck::new())
        .add_check(checks::BuildInfoCheck::new())
        .add_check(checks::SystemInfoCheck::new())
        .add_check(checks::GraphicsBackendCheck::new())
        .add_check(checks::HmdRuntimeCheck::new())
        .add_check(checks::GuiPanelCheck::new())
        .run()
}
