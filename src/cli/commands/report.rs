use std::path::PathBuf;

use clap::{Args, ValueHint};

use crate::{
    classifier::DEFAULT_INACTIVITY_DAYS,
    cli::commands::{aws::AwsArgs, output::OutputArgs},
};

/// File written by `--xlsx-out` when no path is given
pub const DEFAULT_XLSX_PATH: &str = "iam_users_report.xlsx";

/// Classify every IAM user by access type, permissions and recent activity
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Days without console or access key use before a user is eligible for removal
    #[arg(
        long,
        value_name = "DAYS",
        default_value_t = DEFAULT_INACTIVITY_DAYS,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub inactivity_days: i64,

    /// Also export the report as an XLSX workbook
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_XLSX_PATH,
        value_hint = ValueHint::FilePath
    )]
    pub xlsx_out: Option<PathBuf>,

    #[command(flatten)]
    pub output_args: OutputArgs,

    #[command(flatten)]
    pub aws_args: AwsArgs,
}
