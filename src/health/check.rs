//! Core health check trait and types

use std::time::Duration;

use crate::config::AppConfig;

/// Status of a system check, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    /// Returns true if the check passed (Pass or Warn)
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckStatus::Pass | CheckStatus::Warn)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, CheckStatus::Fail)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }

    pub fn as_colored_str(&self) -> String {
        use colored::Colorize;
        match self {
            CheckStatus::Pass => self.label().green().to_string(),
            CheckStatus::Warn => self.label().yellow().to_string(),
            CheckStatus::Fail => self.label().red().to_string(),
        }
    }
}

/// Result of a system check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub status: CheckStatus,
    /// Brief message describing the result
    pub message: String,
    /// Optional detailed information
    pub details: Option<String>,
    /// How long the check took
    pub duration: Duration,
}

impl CheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            duration: Duration::ZERO,
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warn, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Fail, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Detail lines collected while a check runs, tracking the worst status seen
#[derive(Debug, Clone)]
pub struct Findings {
    lines: Vec<String>,
    worst: CheckStatus,
}

impl Default for Findings {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            worst: CheckStatus::Pass,
        }
    }
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&mut self, line: impl AsRef<str>) {
        self.lines.push(format!("  ✓ {}", line.as_ref()));
    }

    pub fn info(&mut self, line: impl AsRef<str>) {
        self.lines.push(format!("    {}", line.as_ref()));
    }

    pub fn warn(&mut self, line: impl AsRef<str>) {
        self.lines.push(format!("  ⚠ {}", line.as_ref()));
        self.worst = self.worst.max(CheckStatus::Warn);
    }

    pub fn fail(&mut self, line: impl AsRef<str>) {
        self.lines.push(format!("  ✗ {}", line.as_ref()));
        self.worst = CheckStatus::Fail;
    }

    pub fn status(&self) -> CheckStatus {
        self.worst
    }

    /// Builds the result with the message matching the worst status seen
    pub fn finish(self, pass: impl Into<String>, warn: impl Into<String>, fail: impl Into<String>) -> CheckResult {
        let message = match self.worst {
            CheckStatus::Pass => pass.into(),
            CheckStatus::Warn => warn.into(),
            CheckStatus::Fail => fail.into(),
        };
        CheckResult::new(self.worst, message).with_details(self.lines.join("\n"))
    }
}

/// Shared input for all checks in a run
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Configuration of the profile under test
    pub config: AppConfig,
}

impl CheckContext {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl Default for CheckContext {
    fn default() -> Self {
        Self::new(AppConfig::defaults_for("default"))
    }
}

/// Trait for system health checks
pub trait SystemCheck {
    /// Name of the system being checked
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &CheckContext) -> CheckResult;

    /// Optional description of what this check validates
    fn description(&self) -> Option<&'static str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_keep_the_worst_status() {
        let mut findings = Findings::new();
        findings.ok("fine");
        findings.warn("meh");
        findings.ok("fine again");
        assert_eq!(findings.status(), CheckStatus::Warn);

        findings.fail("broken");
        findings.warn("meh again");
        let result = findings.finish("p", "w", "f");
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.message, "f");
        assert_eq!(result.details.as_deref().map(|d| d.lines().count()), Some(5));
    }

    #[test]
    fn empty_findings_pass() {
        let result = Findings::new().finish("all good", "w", "f");
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.message, "all good");
    }
}
