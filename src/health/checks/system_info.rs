//! System information health check

use sysinfo::System;

use crate::health::check::{CheckContext, CheckResult, Findings, SystemCheck};

/// Below this the GPU driver, compositor and app compete for memory
const MIN_MEMORY_GB: f64 = 4.0;

/// Checks that the host can be described and has headroom for a VR session
pub struct SystemInfoCheck;

impl SystemInfoCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemInfoCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for SystemInfoCheck {
    fn name(&self) -> &'static str {
        "System Info"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates OS, CPU, and memory information gathering")
    }

    fn check(&self, _ctx: &CheckContext) -> CheckResult {
        let mut sys = System::new_all();
        sys.refresh_all();

        let mut findings = Findings::new();

        let os_name = System::name().unwrap_or_else(|| "Unknown".to_string());
        let os_version = System::os_version().unwrap_or_else(|| "Unknown".to_string());
        findings.info(format!("OS: {os_name} {os_version}"));
        findings.info(format!(
            "Kernel: {}",
            System::kernel_version().unwrap_or_else(|| "Unknown".to_string())
        ));
        if let Some(hostname) = System::host_name() {
            findings.info(format!("Hostname: {hostname}"));
        }

        let physical_cores = System::physical_core_count().unwrap_or(0);
        let logical_cores = sys.cpus().len();
        if physical_cores == 0 || logical_cores == 0 {
            findings.warn("Unable to detect CPU cores");
        } else {
            findings.ok(format!(
                "CPU cores: {physical_cores} physical, {logical_cores} logical"
            ));
        }

        let total_memory_gb = sys.total_memory() as f64 / 1_073_741_824.0;
        if total_memory_gb < MIN_MEMORY_GB {
            findings.warn(format!("Memory: {total_memory_gb:.1} GB total, below {MIN_MEMORY_GB} GB"));
        } else {
            findings.ok(format!("Memory: {total_memory_gb:.1} GB total"));
        }

        findings.finish(
            "System info gathered successfully",
            "System info gathered with warnings",
            "System info unavailable",
        )
    }
}
