//! JSON run report.

use std::path::Path;

use tracing::{error, info};

use pelagicontain_test_core::{Result, RunOutcome};

/// Write `outcome` to `path` as pretty-printed JSON.
pub fn write_report(outcome: &RunOutcome, path: &Path) -> Result<()> {
    std::fs::write(path, outcome.to_json()?)?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Write the report if one was requested and return the run's status code.
///
/// The summary line has already been printed by the time the report is
/// written, so a failed write is logged and does not change the status.
pub fn finish_run(outcome: &RunOutcome, report: Option<&Path>) -> u8 {
    if let Some(path) = report {
        if let Err(e) = write_report(outcome, path) {
            error!("Failed to write report to {}: {}", path.display(), e);
        }
    }
    outcome.status_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pelagicontain_test_core::TestResults;

    fn outcome(passed: bool) -> RunOutcome {
        let mut results = TestResults::new();
        results.record("Launch", passed);
        RunOutcome::new(&results, Some(42))
    }

    fn unwritable_path() -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("pc-missing-{}", uuid::Uuid::new_v4()))
            .join("report.json")
    }

    #[test]
    fn test_write_report() {
        let path = std::env::temp_dir().join(format!("pc-report-{}.json", uuid::Uuid::new_v4()));
        write_report(&outcome(true), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["passed"], true);
        assert_eq!(value["terminated_child"], 42);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_report_unwritable() {
        assert!(write_report(&outcome(true), &unwritable_path()).is_err());
    }

    #[test]
    fn test_failed_report_keeps_passing_status() {
        assert_eq!(finish_run(&outcome(true), Some(&unwritable_path())), 0);
    }

    #[test]
    fn test_failed_report_keeps_failing_status() {
        assert_ne!(finish_run(&outcome(false), Some(&unwritable_path())), 0);
    }

    #[test]
    fn test_no_report_requested() {
        assert_eq!(finish_run(&outcome(true), None), 0);
    }
}
