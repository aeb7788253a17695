// CSV/TSV import/export

use std::io::Read;
use std::path::Path;

use ordercheck_recon::{Cell, Table};

pub fn import(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, b'\t')
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    // Excel writes a BOM in front of "CSV UTF-8" exports
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// First record is the header row; every later record becomes a data row.
/// Empty fields become `Cell::Empty`, everything else stays text.
fn import_from_string(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(result) => result.map_err(|e| e.to_string())?,
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(headers.iter().map(|h| h.trim()));
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::text(field)
                }
            })
            .collect();
        table.push_row(row);
    }

    Ok(table)
}

pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &Table, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    writer.write_record(&table.headers).map_err(|e| e.to_string())?;

    for row in 0..table.len() {
        let record: Vec<String> = (0..table.headers.len())
            .map(|col| table.cell(row, col).render())
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2,5;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3\n"), b'|');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn header_row_and_empty_cells() {
        let table = import_from_string(
            "Shopify Order Id,Customer,Amount\n123,Ann,10.5\n,,4\n",
            b',',
        )
        .unwrap();
        assert_eq!(table.headers, vec!["Shopify Order Id", "Customer", "Amount"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), &Cell::text("123"));
        assert_eq!(table.cell(1, 0), &Cell::Empty);
        assert_eq!(table.cell(1, 2), &Cell::text("4"));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = import_from_string("a,b,c\n1\n1,2,3,4\n", b',').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 2), &Cell::Empty);
        assert_eq!(table.cell(1, 2), &Cell::text("3"));
    }

    #[test]
    fn quoted_json_survives() {
        let content = "Id,Courier State\n1,\"{\"\"courier_vouchers\"\":[{\"\"state_friendly\"\":\"\"Delivered\"\"}]}\"\n";
        let table = import_from_string(content, b',').unwrap();
        assert_eq!(
            table.cell(0, 1),
            &Cell::text(r#"{"courier_vouchers":[{"state_friendly":"Delivered"}]}"#)
        );
    }

    #[test]
    fn empty_file_is_empty_table() {
        let table = import_from_string("", b',').unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn windows_1252_and_bom_are_handled() {
        let dir = tempdir().unwrap();

        let latin = dir.path().join("latin.csv");
        // "Café" in Windows-1252
        fs::write(&latin, b"Customer,Amount\nCaf\xe9,1\n").unwrap();
        let table = import(&latin).unwrap();
        assert_eq!(table.cell(0, 0), &Cell::text("Café"));

        let bom = dir.path().join("bom.csv");
        fs::write(&bom, "\u{feff}Advertiser Id;Amount\n7;2\n").unwrap();
        let table = import(&bom).unwrap();
        assert_eq!(table.headers, vec!["Advertiser Id", "Amount"]);
        assert_eq!(table.cell(0, 1), &Cell::text("2"));
    }

    #[test]
    fn export_writes_header_and_rendered_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut table = Table::new(["Advertiser Id", "Amount", "Status"]);
        table.push_row(vec![Cell::Number(123.0), Cell::Number(10.5), Cell::text("valid")]);
        table.push_row(vec![Cell::text("124"), Cell::Empty, Cell::text("a, b")]);
        export(&table, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Advertiser Id,Amount,Status\n123,10.5,valid\n124,,\"a, b\"\n"
        );

        let back = import(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.cell(1, 2), &Cell::text("a, b"));
    }

    #[test]
    fn tsv_export_uses_tabs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        let mut table = Table::new(["a", "b"]);
        table.push_row(vec![Cell::text("1"), Cell::text("2")]);
        export_tsv(&table, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\tb\n1\t2\n");
        assert_eq!(import_tsv(&path).unwrap().cell(0, 1), &Cell::text("2"));
    }
}
