use std::io::IsTerminal;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use strum::Display;
use tracing::Level;

use crate::cli::commands::{list::ListArgs, report::ReportArgs};

#[deny(missing_docs)]
#[derive(Parser, Debug)]
#[command(version = env!("CARGO_PKG_VERSION"))]
/// iam-user-report - Audit IAM users for console and programmatic access
pub struct CommandLineArgs {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Global arguments that apply to all subcommands
    #[command(flatten)]
    pub global_args: GlobalArgs,
}

impl CommandLineArgs {
    /// Parse command-line arguments.
    ///
    /// Automatically respects `NO_COLOR` and maps `--quiet` into disabling progress bars.
    pub fn parse_args() -> Self {
        let mut args = CommandLineArgs::parse();

        if std::env::var("NO_COLOR").is_ok() {
            args.global_args.color = Mode::Never;
        }

        if args.global_args.quiet {
            args.global_args.progress = Mode::Never;
        }

        args
    }
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify IAM users and report access type, permissions and removal eligibility
    Report(ReportArgs),

    /// List IAM users
    #[command(alias = "users")]
    List(ListArgs),
}

/// Top-level global CLI arguments
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Global Options")]
pub struct GlobalArgs {
    /// Enable verbose output (up to 3 times for more detail)
    #[arg(global = true, long = "verbose", short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error messages and disable progress bars
    #[arg(global = true, long, short)]
    pub quiet: bool,

    /// Use colors in the console table
    #[arg(global = true, long, value_name = "MODE", default_value_t = Mode::Auto)]
    pub color: Mode,

    // Internal fields (not CLI arguments)
    #[clap(skip)]
    pub progress: Mode,
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self { verbose: 0, quiet: false, color: Mode::Auto, progress: Mode::Auto }
    }
}

impl GlobalArgs {
    pub fn use_color<T: IsTerminal>(&self, out: T) -> bool {
        match self.color {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => out.is_terminal(),
        }
    }

    pub fn use_progress(&self) -> bool {
        match self.progress {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => std::io::stderr().is_terminal(),
        }
    }

    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::INFO,  // Default level if no `-v` is provided
                1 => Level::DEBUG, // `-v`
                _ => Level::TRACE, // `-vv` or more
            }
        }
    }
}

/// Generic mode with `auto/never/always`.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum Mode {
    #[default]
    Auto,
    Never,
    Always,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::commands::{output::ReportOutputFormat, report::DEFAULT_XLSX_PATH};

    #[test]
    fn cli_definition_is_valid() {
        CommandLineArgs::command().debug_assert();
    }

    #[test]
    fn report_defaults() {
        let args = CommandLineArgs::try_parse_from(["iam-user-report", "report"]).unwrap();
        let Command::Report(report) = args.command else { panic!("expected report command") };
        assert_eq!(report.inactivity_days, 90);
        assert_eq!(report.xlsx_out, None);
        assert_eq!(report.output_args.format, ReportOutputFormat::Pretty);
    }

    #[test]
    fn xlsx_out_without_value_uses_default_path() {
        let args =
            CommandLineArgs::try_parse_from(["iam-user-report", "report", "--xlsx-out"]).unwrap();
        let Command::Report(report) = args.command else { panic!("expected report command") };
        assert_eq!(report.xlsx_out, Some(PathBuf::from(DEFAULT_XLSX_PATH)));

        let args = CommandLineArgs::try_parse_from([
            "iam-user-report",
            "report",
            "--xlsx-out",
            "/tmp/users.xlsx",
        ])
        .unwrap();
        let Command::Report(report) = args.command else { panic!("expected report command") };
        assert_eq!(report.xlsx_out, Some(PathBuf::from("/tmp/users.xlsx")));
    }

    #[test]
    fn inactivity_days_must_be_positive() {
        let result = CommandLineArgs::try_parse_from([
            "iam-user-report",
            "report",
            "--inactivity-days",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_maps_to_log_level() {
        let args = CommandLineArgs::try_parse_from(["iam-user-report", "-vv", "list"]).unwrap();
        assert_eq!(args.global_args.log_level(), Level::TRACE);

        let args = CommandLineArgs::try_parse_from(["iam-user-report", "list", "-q"]).unwrap();
        assert_eq!(args.global_args.log_level(), Level::ERROR);
    }
}
