//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Starts the Pelagicontain launcher, finds it on the session bus and drives
/// its lifecycle. Exits 0 when every check passes, 1 otherwise.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "pelagicontain-test")]
#[command(version)]
#[command(
    after_help = "Environment:\n  PC_BINARY  Launcher binary, or the directory containing it\n  RUST_LOG   Log filter (overrides logging.level)"
)]
pub struct CliArgs {
    /// YAML driver configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Command to run inside the container
    #[arg(long, value_name = "CMD", allow_hyphen_values = true)]
    pub command: Option<String>,

    /// Write the run outcome as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("pelagicontain-test").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_all_options() {
        let args = parse(&[
            "--config",
            "driver.yaml",
            "--command",
            "/bin/sh",
            "--report",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("driver.yaml")));
        assert_eq!(args.command.as_deref(), Some("/bin/sh"));
        assert_eq!(args.report, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_equals_form() {
        let args = parse(&["--config=x.yaml", "--report=out.json"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.yaml")));
        assert_eq!(args.report, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_command_starting_with_dashes() {
        let args = parse(&["--command", "--version"]).unwrap();
        assert_eq!(args.command.as_deref(), Some("--version"));

        let args = parse(&["--command=--verbose"]).unwrap();
        assert_eq!(args.command.as_deref(), Some("--verbose"));
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&["--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse(&["-h"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_missing_value() {
        let err = parse(&["--config"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_unknown_argument() {
        let err = parse(&["--headless"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(err.exit_code(), 2);
    }
}
