// Table I/O: load ERP / partner exports, save the annotated result

pub mod csv;
pub mod xlsx;

use std::path::Path;

use ordercheck_recon::Table;

/// File formats understood by [`load_table`] / [`save_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Excel,
    Csv,
    Tsv,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Excel),
            "csv" | "txt" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            _ => None,
        }
    }
}

fn unsupported(path: &Path) -> String {
    format!(
        "unsupported file type: {} (expected .xlsx, .xls, .ods, .csv or .tsv)",
        path.display()
    )
}

/// Load a table. For workbooks, `sheet` selects a worksheet by name
/// (default: the first one).
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let format = TableFormat::from_path(path).ok_or_else(|| unsupported(path))?;
    if sheet.is_some() && format != TableFormat::Excel {
        log::warn!("{}: sheet selection ignored for delimited files", path.display());
    }

    let table = match format {
        TableFormat::Excel => xlsx::import(path, sheet)?,
        TableFormat::Csv => csv::import(path)?,
        TableFormat::Tsv => csv::import_tsv(path)?,
    };

    log::info!(
        "loaded {}: {} columns, {} rows",
        path.display(),
        table.headers.len(),
        table.len()
    );
    Ok(table)
}

/// Save a table as `.xlsx` or `.csv`/`.tsv`, chosen by extension.
pub fn save_table(table: &Table, path: &Path) -> Result<(), String> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Excel) => {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !ext.eq_ignore_ascii_case("xlsx") {
                return Err(format!("can only write .xlsx workbooks, got {}", path.display()));
            }
            xlsx::export(table, path)
        }
        Some(TableFormat::Csv) => csv::export(table, path),
        Some(TableFormat::Tsv) => csv::export_tsv(table, path),
        None => Err(unsupported(path)),
    }
}
