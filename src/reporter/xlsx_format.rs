use rust_xlsxwriter::{Format, FormatAlign, Workbook};

use super::*;

const SHEET_NAME: &str = "IAM Users";

/// Writes one worksheet: bold header row, one row per record, columns fitted to content.
pub(super) fn write_workbook<T: TableRow>(rows: &[T], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();
    let wrap_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);
    let top_format = Format::new().set_align(FormatAlign::Top);

    for (col, header) in T::COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .with_context(|| format!("Failed to write header at column {col}"))?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.cells().into_iter().enumerate() {
            let col = col_idx as u16;
            let written = match cell {
                Cell::Text(text) if text.contains('\n') => {
                    worksheet.write_string_with_format(excel_row, col, text, &wrap_format)
                }
                Cell::Text(text) => {
                    worksheet.write_string_with_format(excel_row, col, text, &top_format)
                }
                Cell::Number(n) => {
                    worksheet.write_number_with_format(excel_row, col, n as f64, &top_format)
                }
                Cell::Flag(flag) => {
                    worksheet.write_boolean_with_format(excel_row, col, flag, &top_format)
                }
            };
            written.with_context(|| format!("Failed to write cell at ({excel_row}, {col_idx})"))?;
        }
    }

    worksheet.autofit();
    workbook.save(path)?;
    Ok(())
}
