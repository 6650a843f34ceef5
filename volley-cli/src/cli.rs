//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Files describing one load test
#[derive(Args, Debug, Clone)]
pub struct TestInputs {
    /// Scenario JSON: name and ordered steps
    #[arg(long, value_name = "PATH")]
    pub scenario: PathBuf,

    /// Variables JSON: mode, counts, durations and environment
    #[arg(long, value_name = "PATH")]
    pub variables: PathBuf,

    /// User data CSV, one row per virtual user
    #[arg(long, value_name = "PATH")]
    pub users: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a load test and print the execution response
    Run {
        #[command(flatten)]
        inputs: TestInputs,

        /// Also write the condensed summary to this path
        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,

        /// Test identifier (default: test_<unix seconds>)
        #[arg(long, value_name = "ID")]
        test_id: Option<String>,
    },

    /// Validate test inputs without running them
    Validate {
        #[command(flatten)]
        inputs: TestInputs,
    },

    /// Manage stored test reports
    Reports {
        #[command(subcommand)]
        reports_cmd: ReportCommands,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// List stored report files
    List,

    /// Print a stored report
    Show {
        /// Report file name or path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete reports older than a given age
    Cleanup {
        /// Maximum age, e.g. 7d or 12h (default: reports.retention)
        #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
        max_age: Option<Duration>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "volley",
            "--log-level",
            "debug",
            "run",
            "--scenario",
            "s.json",
            "--variables",
            "v.json",
            "--users",
            "u.csv",
            "--test-id",
            "test_1",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run { inputs, test_id, summary } => {
                assert_eq!(inputs.scenario, PathBuf::from("s.json"));
                assert_eq!(inputs.users, Some(PathBuf::from("u.csv")));
                assert_eq!(test_id.as_deref(), Some("test_1"));
                assert!(summary.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_cleanup_duration() {
        let cli = Cli::try_parse_from(["volley", "reports", "cleanup", "--max-age", "2h"]).unwrap();
        match cli.command {
            Commands::Reports {
                reports_cmd: ReportCommands::Cleanup { max_age },
            } => assert_eq!(max_age, Some(Duration::from_secs(7200))),
            _ => panic!("expected reports cleanup"),
        }

        assert!(Cli::try_parse_from(["volley", "reports", "cleanup", "--max-age", "soon"]).is_err());
    }
}
