//! Runs health checks against one configuration and collects the results

use std::time::Instant;

use tracing::{debug, error, warn};

use super::check::{CheckContext, CheckResult, CheckStatus, SystemCheck};

/// Results from running a health check suite
#[derive(Debug)]
pub struct HealthCheckReport {
    /// Profile the checks ran against
    pub profile: String,
    /// Individual check results with their system names
    pub results: Vec<(String, CheckResult)>,
    pub total: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
}

impl HealthCheckReport {
    /// Returns true if no check failed
    pub fn is_healthy(&self) -> bool {
        self.failed == 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warned > 0
    }

    /// 0 = all pass, 1 = any fail, 2 = any warn (but no fail)
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            1
        } else if self.warned > 0 {
            2
        } else {
            0
        }
    }

    pub fn result(&self, name: &str) -> Option<&CheckResult> {
        self.results
            .iter()
            .find(|(check, _)| check == name)
            .map(|(_, result)| result)
    }
}

/// Orchestrates running health checks and collecting results
pub struct HealthCheckRunner {
    context: CheckContext,
    checks: Vec<Box<dyn SystemCheck>>,
}

impl HealthCheckRunner {
    /// Runner using built-in defaults for the configuration
    pub fn new() -> Self {
        Self::with_context(CheckContext::default())
    }

    pub fn with_context(context: CheckContext) -> Self {
        Self {
            context,
            checks: Vec::new(),
        }
    }

    pub fn add_check<C: SystemCheck + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Runs all registered checks in order and returns a report
    pub fn run(self) -> HealthCheckReport {
        let mut report = HealthCheckReport {
            profile: self.context.config.profile.clone(),
            results: Vec::with_capacity(self.checks.len()),
            total: 0,
            passed: 0,
            warned: 0,
            failed: 0,
        };

        for check in &self.checks {
            let name = check.name();
            debug!(check = name, description = check.description(), "Running health check");

            let start = Instant::now();
            let result = check.check(&self.context).with_duration(start.elapsed());

            match result.status {
                CheckStatus::Pass => {
                    report.passed += 1;
                    debug!(check = name, message = %result.message, "Health check passed");
                }
                CheckStatus::Warn => {
                    report.warned += 1;
                    warn!(check = name, message = %result.message, "Health check warning");
                }
                CheckStatus::Fail => {
                    report.failed += 1;
                    error!(check = name, message = %result.message, "Health check failed");
                }
            }

            report.results.push((name.to_string(), result));
        }

        report.total = report.results.len();
        report
    }
}

impl Default for HealthCheckRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(CheckStatus);

    impl SystemCheck for Fixed {
        fn name(&self) -> &'static str {
            match self.0 {
                CheckStatus::Pass => "pass",
                CheckStatus::Warn => "warn",
                CheckStatus::Fail => "fail",
            }
        }

        fn check(&self, _ctx: &CheckContext) -> CheckResult {
            CheckResult::new(self.0, "fixed")
        }
    }

    #[test]
    fn counts_each_status() {
        let report = HealthCheckRunner::new()
            .add_check(Fixed(CheckStatus::Pass))
            .add_check(Fixed(CheckStatus::Warn))
            .add_check(Fixed(CheckStatus::Fail))
            .run();

        assert_eq!(report.total, 3);
        assert_eq!((report.passed, report.warned, report.failed), (1, 1, 1));
        assert_eq!(report.exit_code(), 1);
        assert!(report.result("warn").is_some());
    }

    #[test]
    fn warnings_alone_exit_with_two() {
        let report = HealthCheckRunner::new()
            .add_check(Fixed(CheckStatus::Pass))
            .add_check(Fixed(CheckStatus::Warn))
            .run();
        assert!(report.is_healthy());
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn empty_run_is_healthy() {
        let report = HealthCheckRunner::new().run();
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.profile, "default");
    }
}
