//! Integration tests for the health check system

use vr_gui::config::AppConfig;
use vr_gui::health::{self, CheckContext, CheckStatus, HealthCheckRunner, SystemCheck, checks::*};
use vr_gui::hmd::RuntimeKind;

fn context() -> CheckContext {
    CheckContext::new(AppConfig::defaults_for("test"))
}

#[test]
fn test_all_health_checks() {
    let report = health::run_all_checks(AppConfig::defaults_for("test"));

    if !report.is_healthy() {
        eprintln!("\n{}", health::format_report(&report));
    }

    assert!(
        report.is_healthy(),
        "Health checks failed: {} failures, {} warnings",
        report.failed,
        report.warned
    );
    assert_eq!(report.total, 6);
    assert_eq!(report.profile, "test");
}

#[test]
fn test_config_check() {
    let result = ConfigCheck::new().check(&context());

    assert!(
        result.status.is_ok(),
        "Config check failed: {}",
        result.message
    );
}

#[test]
fn test_config_check_rejects_bad_values() {
    let mut config = AppConfig::defaults_for("test");
    config.panel.max_raycast_distance = -1.0;

    let result = ConfigCheck::new().check(&CheckContext::new(config));
    assert_eq!(result.status, CheckStatus::Fail);
}

#[test]
fn test_build_info_check() {
    let result = BuildInfoCheck::new().check(&context());

    assert!(
        result.status.is_ok(),
        "Build info check failed: {}",
        result.message
    );
}

#[test]
fn test_system_info_check() {
    let result = SystemInfoCheck::new().check(&context());

    assert!(
        result.status.is_ok(),
        "System info check failed: {}",
        result.message
    );
}

#[test]
fn test_graphics_backend_check() {
    let result = GraphicsBackendCheck::new().check(&context());

    assert!(
        result.status.is_ok(),
        "Graphics backend check failed: {}",
        result.message
    );
}

#[test]
fn test_simulated_runtime_passes() {
    let result = HmdRuntimeCheck::with_runtime(RuntimeKind::Simulated).check(&context());

    assert_eq!(result.status, CheckStatus::Pass, "{:?}", result.details);
}

#[cfg(not(feature = "openxr"))]
#[test]
fn test_openxr_runtime_warns_when_not_built_in() {
    let result = HmdRuntimeCheck::with_runtime(RuntimeKind::OpenXr).check(&context());

    assert_eq!(result.status, CheckStatus::Warn);
    assert_eq!(result.message, "HMD runtime unavailable");
}

#[test]
fn test_gui_panel_check() {
    let result = GuiPanelCheck::new().check(&context());

    assert_eq!(
        result.status,
        CheckStatus::Pass,
        "GUI panel check failed: {:?}",
        result.details
    );
}

#[test]
fn test_gui_panel_check_with_rotated_panel() {
    let mut config = AppConfig::defaults_for("test");
    config.panel.yaw_degrees = 60.0;
    config.panel.pitch_degrees = -20.0;
    config.panel.position = [2.0, 1.0, -1.0];

    let result = GuiPanelCheck::new().check(&CheckContext::new(config));
    assert_eq!(result.status, CheckStatus::Pass, "{:?}", result.details);
}

#[test]
fn test_runner_collects_all_checks() {
    let report = HealthCheckRunner::with_context(context())
        .add_check(ConfigCheck::new())
        .add_check(GuiPanelCheck::new())
        .run();

    assert_eq!(report.total, 2, "Expected 2 checks in report");
    assert_eq!(report.passed + report.warned + report.failed, report.total);
    assert!(report.result("GUI Panel").is_some());
}

#[test]
fn test_report_exit_codes() {
    let report = HealthCheckRunner::with_context(context())
        .add_check(ConfigCheck::new())
        .run();

    if report.failed > 0 {
        assert_eq!(report.exit_code(), 1);
    } else if report.warned > 0 {
        assert_eq!(report.exit_code(), 2);
    } else {
        assert_eq!(report.exit_code(), 0);
    }
}
