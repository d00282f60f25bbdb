use std::{io::IsTerminal, path::PathBuf};

use clap::{Args, ValueEnum, ValueHint};
use strum::Display;

use crate::util::get_writer_for_file_or_stdout;

/// Where and how the report is written
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    /// Write output to the specified path instead of stdout
    #[arg(long, short, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value_t = ReportOutputFormat::Pretty)]
    pub format: ReportOutputFormat,
}

impl OutputArgs {
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Color is only worth emitting for pretty output going to a terminal.
    pub fn use_color(&self, color_requested: bool) -> bool {
        color_requested
            && self.format == ReportOutputFormat::Pretty
            && !self.has_output()
            && std::io::stdout().is_terminal()
    }

    pub fn get_writer(&self) -> std::io::Result<Box<dyn std::io::Write>> {
        get_writer_for_file_or_stdout(self.output.as_ref())
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum ReportOutputFormat {
    /// Human-readable table
    #[default]
    Pretty,
    /// A single JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}
