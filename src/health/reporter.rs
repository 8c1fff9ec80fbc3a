//! Formatting and reporting for health check results

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::runner::HealthCheckReport;
use crate::build_info;

/// Formats a health check report as a table under a version header
pub fn format_report(report: &HealthCheckReport) -> String {
    let mut builder = Builder::default();

    builder.push_record(["System", "Status", "Duration", "Message"]);

    for (name, result) in &report.results {
        let duration_str = format!("{:.2?}", result.duration);
        builder.push_record([
            name.as_str(),
            &result.status.as_colored_str(),
            &duration_str,
            &result.message,
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    let mut output = format!(
        "{} {} (profile: {})\n",
        "vr-gui".bold(),
        build_info::version_string(),
        report.profile
    );
    output.push_str(&table.to_string());
    output.push('\n');

    output.push_str(&format_summary(report));

    output
}

/// Formats the summary section of the report
fn format_summary(report: &HealthCheckReport) -> String {
    let mut summary = String::new();

    summary.push_str(&format!("\n{}\n", "Summary".bold().underline()));
    summary.push_str(&format!("  Total checks: {}\n", report.total));
    summary.push_str(&format!("  {} Passed: {}\n", "✓".green(), report.passed));

    if report.warned > 0 {
        summary.push_str(&format!("  {} Warned: {}\n", "⚠".yellow(), report.warned));
    }

    if report.failed > 0 {
        summary.push_str(&format!("  {} Failed: {}\n", "✗".red(), report.failed));
    }

    // Overall status
    summary.push('\n');
    if report.is_healthy() {
        if report.has_warnings() {
            summary.push_str(&format!(
                "  {}\n",
                "Overall: HEALTHY (with warnings)".yellow().bold()
            ));
        } else {
            summary.push_str(&format!("  {}\n", "Overall: HEALTHY".green().bold()));
        }
    } else {
        summary.push_str(&format!("  {}\n", "Overall: UNHEALTHY".red().bold()));
    }

    summary
}

/// Prints a health check report to stdout
pub fn print_report(report: &HealthCheckReport) {
    println!("{}", format_report(report));

    for (name, result) in &report.results {
        if let Some(details) = result.details.as_deref().filter(|d| !d.is_empty()) {
            println!("\n{} [{}]", name.bold(), result.status.as_colored_str());
            println!("{details}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::check::{CheckContext, CheckResult, SystemCheck};
    use crate::health::runner::HealthCheckRunner;

    struct Warns;

    impl SystemCheck for Warns {
        fn name(&self) -> &'static str {
            "Flaky"
        }

        fn check(&self, _ctx: &CheckContext) -> CheckResult {
            CheckResult::warn("almost")
        }
    }

    #[test]
    fn report_names_profile_and_checks() {
        let report = HealthCheckRunner::new().add_check(Warns).run();
        let text = format_report(&report);
        assert!(text.contains("profile: default"));
        assert!(text.contains("Flaky"));
        assert!(text.contains("HEALTHY (with warnings)"));
    }
}
