//! Excel workbook output.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::warn;

use crate::error::ReportError;
use crate::policy::types::PolicyType;
use crate::report::{Cell, POLICY_EXPLANATION, ReportRow, SheetLayout, TableRow, sheet_name};

pub const UNIFIED_SHEET: &str = "DLP Policies";
pub const EXPLANATION_SHEET: &str = "Policy Explanation";

const COLUMN_WIDTH: f64 = 28.0;

/// Excel's per-cell character limit.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Cut text to what a cell can hold, warning when anything is dropped.
fn fit_cell(text: String, line: u32, col: u16) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text;
    }
    warn!(
        row = line,
        col,
        chars = text.chars().count(),
        "Cell text exceeds the workbook limit, truncating"
    );
    text.chars().take(MAX_CELL_CHARS).collect()
}

/// Write a header row and data rows starting at A1.
fn write_rows<T: TableRow>(worksheet: &mut Worksheet, rows: &[T]) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    for (col, header) in T::headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        worksheet.set_column_width(col as u16, COLUMN_WIDTH)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (index, row) in rows.iter().enumerate() {
        let line = (index + 1) as u32;
        for (col, cell) in row.cells().into_iter().enumerate() {
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(line, col as u16, fit_cell(s, line, col as u16))?;
                }
                Cell::Count(n) => {
                    worksheet.write_number(line, col as u16, n as f64)?;
                }
                Cell::Blank => {}
            }
        }
    }
    Ok(())
}

fn write_explanation(workbook: &mut Workbook, generated_at: DateTime<Utc>) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPLANATION_SHEET)?;
    worksheet.set_column_width(0, 120)?;
    for (index, line) in POLICY_EXPLANATION.iter().enumerate() {
        if !line.is_empty() {
            worksheet.write_string(index as u32, 0, *line)?;
        }
    }
    worksheet.write_string(
        (POLICY_EXPLANATION.len() + 1) as u32,
        0,
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    )?;
    Ok(())
}

/// Write the policy report workbook, followed by the explanation sheet.
pub fn write_policy_workbook(
    rows: &[ReportRow],
    layout: SheetLayout,
    path: &Path,
    generated_at: DateTime<Utc>,
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();

    match layout {
        SheetLayout::PerPolicyType => {
            for policy_type in PolicyType::ALL {
                let sheet_rows: Vec<ReportRow> = rows
                    .iter()
                    .filter(|r| r.policy_type == policy_type)
                    .cloned()
                    .collect();
                if sheet_rows.is_empty() {
                    continue;
                }
                let worksheet = workbook.add_worksheet();
                worksheet.set_name(sheet_name(policy_type))?;
                write_rows(worksheet, &sheet_rows)?;
            }
        }
        SheetLayout::Unified => {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(UNIFIED_SHEET)?;
            write_rows(worksheet, rows)?;
        }
    }

    write_explanation(&mut workbook, generated_at)?;
    workbook.save(path)?;
    Ok(())
}

/// Write a single-sheet workbook for any table.
pub fn write_table_workbook<T: TableRow>(
    rows: &[T],
    sheet: &str,
    path: &Path,
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;
    write_rows(worksheet, rows)?;
    workbook.save(path)?;
    Ok(())
}
