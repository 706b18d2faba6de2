//! Result accumulation for a single test run.

use serde::{Deserialize, Serialize};

/// Summary printed when every check passed.
pub const PASSED_SUMMARY: &str = "-=< All tests passed >=-";

/// Summary printed when at least one check failed.
pub const FAILED_SUMMARY: &str = "-=< Failure >=-";

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    /// Check name
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Failure detail, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Accumulates check outcomes. Any failure marks the whole run failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    checks: Vec<CheckRecord>,
}

impl TestResults {
    /// Create an empty accumulator. An empty run counts as passed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check and hand its outcome back to the caller.
    pub fn record(&mut self, name: impl Into<String>, passed: bool) -> bool {
        self.checks.push(CheckRecord {
            name: name.into(),
            passed,
            detail: None,
        });
        passed
    }

    /// Record a failed check with a detail message.
    pub fn fail(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.checks.push(CheckRecord {
            name: name.into(),
            passed: false,
            detail: Some(detail.into()),
        });
    }

    /// Whether no recorded check has failed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// All recorded checks, in order.
    pub fn checks(&self) -> &[CheckRecord] {
        &self.checks
    }

    /// Failed checks, in order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckRecord> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

/// Final result of a test run, produced by teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Whether all checks passed
    pub passed: bool,
    /// Every recorded check
    pub checks: Vec<CheckRecord>,
    /// PID of the launcher that teardown signalled, if any
    pub terminated_child: Option<u32>,
}

impl RunOutcome {
    /// Build an outcome from accumulated results.
    pub fn new(results: &TestResults, terminated_child: Option<u32>) -> Self {
        Self {
            passed: results.passed(),
            checks: results.checks().to_vec(),
            terminated_child,
        }
    }

    /// Numeric exit status: 0 on success, 1 on failure.
    pub fn status_code(&self) -> u8 {
        if self.passed {
            0
        } else {
            1
        }
    }

    /// Human-readable summary line.
    pub fn summary_line(&self) -> &'static str {
        if self.passed {
            PASSED_SUMMARY
        } else {
            FAILED_SUMMARY
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
