// Excel file import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: first non-empty row of the chosen sheet is the header row.
// Export: one sheet, bold frozen header, autofilter over the data.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use ordercheck_recon::{Cell, Table};

/// Excel caps a sheet at 16,384 columns.
const MAX_COLS: usize = 16_384;

/// Sheet name written by [`export`].
pub const EXPORT_SHEET_NAME: &str = "Validated";

/// Import one worksheet (default: the first) as a [`Table`].
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file {}: {}", path.display(), e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(format!("{}: workbook contains no sheets", path.display()));
    }

    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .or_else(|| sheet_names.iter().find(|name| name.eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| {
                format!(
                    "{}: no sheet named '{}' (available: {})",
                    path.display(),
                    wanted,
                    sheet_names.join(", ")
                )
            })?
            .clone(),
        None => sheet_names[0].clone(),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let (height, width) = range.get_size();
    if width > MAX_COLS {
        log::warn!(
            "sheet '{}' has {} columns, only the first {} are read",
            sheet_name,
            width,
            MAX_COLS
        );
    }
    log::debug!("sheet '{}': {}x{} used range", sheet_name, height, width);

    let mut rows = range
        .rows()
        .map(|row| row.iter().take(MAX_COLS).map(convert).collect::<Vec<Cell>>());

    // Header: first row with any content
    let headers = loop {
        match rows.next() {
            Some(row) if row.iter().all(Cell::is_blank) => continue,
            Some(row) => break row,
            None => return Ok(Table::default()),
        }
    };

    let mut table = Table::new(headers.iter().map(|c| c.render().trim().to_string()));
    for row in rows {
        table.push_row(row);
    }

    // Trailing fully-empty rows are formatting leftovers; interior ones are kept
    while table.rows.last().is_some_and(|row| row.iter().all(Cell::is_blank)) {
        table.rows.pop();
    }

    Ok(table)
}

fn convert(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        // Serial date number (1900 system assumed)
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Export a table as a single-sheet `.xlsx`.
pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(EXPORT_SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet: {}", e))?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| format!("Failed to write header: {}", e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = col_idx as u16;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string(r, c, s).map(|_| ()),
                Cell::Number(n) => worksheet.write_number(r, c, *n).map(|_| ()),
                Cell::Bool(b) => worksheet.write_boolean(r, c, *b).map(|_| ()),
            };
            written.map_err(|e| format!("Failed to write cell ({}, {}): {}", r, c, e))?;
        }
    }

    if !table.headers.is_empty() {
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| format!("Failed to freeze header: {}", e))?;
        worksheet
            .autofilter(0, 0, table.len() as u32, (table.headers.len() - 1) as u16)
            .map_err(|e| format!("Failed to set autofilter: {}", e))?;
        worksheet.autofit();
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save {}: {}", path.display(), e))?;
    Ok(())
}
