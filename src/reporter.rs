use std::{fmt, io::Write, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::{
    classifier::{LastActivity, Principal, ReportRecord},
    cli::{
        commands::output::{OutputArgs, ReportOutputFormat},
        global::GlobalArgs,
    },
    util::Counted,
};

mod json_format;
mod pretty_format;
pub mod styles;
mod xlsx_format;

use styles::Styles;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(u64),
    Flag(bool),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Flag(true) => f.write_str("True"),
            Cell::Flag(false) => f.write_str("False"),
        }
    }
}

/// A row type that can be rendered as a table, a JSON document and a worksheet.
pub trait TableRow: Serialize {
    const COLUMNS: &'static [&'static str];

    /// One cell per entry in [`TableRow::COLUMNS`].
    fn cells(&self) -> Vec<Cell>;

    /// Whether the row deserves highlighting in the console table.
    fn flagged(&self) -> bool {
        false
    }
}

impl TableRow for ReportRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Name",
        "UserType",
        "AccessType",
        "Permissions",
        "LastActivityDays",
        "EligibleForRemoval",
    ];

    fn cells(&self) -> Vec<Cell> {
        let last_activity = match self.last_activity_days {
            LastActivity::DaysAgo(days) => Cell::Number(days),
            other => Cell::Text(other.to_string()),
        };
        vec![
            Cell::Text(self.name.clone()),
            Cell::Text(self.user_type.to_string()),
            Cell::Text(self.access_type.to_string()),
            Cell::Text(self.permissions.to_string()),
            last_activity,
            Cell::Flag(self.eligible_for_removal),
        ]
    }

    fn flagged(&self) -> bool {
        self.eligible_for_removal
    }
}

impl TableRow for Principal {
    const COLUMNS: &'static [&'static str] =
        &["Name", "UserId", "Arn", "Path", "CreateDate", "PasswordLastUsed"];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.name.clone()),
            Cell::Text(self.user_id.clone()),
            Cell::Text(self.arn.clone()),
            Cell::Text(self.path.clone()),
            Cell::Text(self.create_date.format(TIMESTAMP_FORMAT).to_string()),
            Cell::Text(
                self.password_last_used
                    .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                    .unwrap_or_else(|| "Never".to_string()),
            ),
        ]
    }
}

/// A trait for things that can be output as a document.
///
/// This trait is used to factor output-related code, such as friendly handling
/// of buffering, into one place.
pub trait Reportable {
    type Format;
    fn report<W: std::io::Write>(&self, format: Self::Format, writer: W) -> Result<()>;
}

/// Renders a collection of rows in any of the supported output formats.
pub struct TableReporter<'a, T> {
    pub rows: &'a [T],
    pub styles: Styles,
}

impl<'a, T: TableRow> TableReporter<'a, T> {
    pub fn new(rows: &'a [T], use_color: bool) -> Self {
        Self { rows, styles: Styles::new(use_color) }
    }
}

impl<'a, T: TableRow> Reportable for TableReporter<'a, T> {
    type Format = ReportOutputFormat;

    fn report<W: std::io::Write>(&self, format: Self::Format, writer: W) -> Result<()> {
        match format {
            ReportOutputFormat::Pretty => self.pretty_format(writer),
            ReportOutputFormat::Json => self.json_format(writer),
            ReportOutputFormat::Jsonl => self.jsonl_format(writer),
        }
    }
}

/// Writes rows to stdout or the `--output` file in the selected format.
pub fn run<T: TableRow>(
    global_args: &GlobalArgs,
    rows: &[T],
    output_args: &OutputArgs,
) -> Result<()> {
    let use_color = output_args.use_color(global_args.use_color(std::io::stdout()));
    let reporter = TableReporter::new(rows, use_color);
    let mut writer = output_args.get_writer().context("Failed to open report output")?;
    reporter.report(output_args.format, &mut writer)?;
    writer.flush().context("Failed to flush report output")?;
    if let Some(path) = &output_args.output {
        info!("Wrote {} to {}", Counted::regular(rows.len(), "row"), path.display());
    }
    Ok(())
}

/// Exports rows as an XLSX workbook at `path`.
pub fn export_xlsx<T: TableRow>(rows: &[T], path: &Path) -> Result<()> {
    xlsx_format::write_workbook(rows, path)
        .with_context(|| format!("Failed to write XLSX report to {}", path.display()))?;
    info!("Exported {} to {}", Counted::regular(rows.len(), "user"), path.display());
    Ok(())
}
