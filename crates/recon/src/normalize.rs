//! Cleanup applied before grouping and matching.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::model::{Cell, Table};

/// Forward-fill blank cells in `columns` from the nearest non-blank cell
/// above. Blanks before the first value stay blank. Unknown column names
/// are skipped; presence is checked when the table is bound.
pub fn fill_down(table: &Table, columns: &[&str]) -> Table {
    let mut out = table.clone();

    for name in columns {
        let Some(col) = table.column_index(name) else {
            continue;
        };

        let mut last: Option<Cell> = None;
        for row in &mut out.rows {
            if row.len() <= col {
                row.resize(col + 1, Cell::Empty);
            }
            if row[col].is_blank() {
                if let Some(ref value) = last {
                    row[col] = value.clone();
                }
            } else {
                last = Some(row[col].clone());
            }
        }
    }

    out
}

/// Canonical string form of an order identifier.
///
/// Spreadsheet tools like to turn `123` into `123.0`; both sides of the
/// match go through this so the representations agree.
pub fn canonical_key(cell: &Cell) -> String {
    let rendered = cell.render();
    let trimmed = rendered.trim();

    if let Some((int_part, frac)) = trimmed.split_once('.') {
        let numeric = !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit());
        if numeric && !frac.is_empty() && frac.bytes().all(|b| b == b'0') {
            return int_part.to_string();
        }
    }

    trimmed.to_string()
}

/// Trimmed, lowercased text for case-insensitive comparisons.
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Best-effort decimal coercion. Returns `None` for blanks and for text that
/// is not a number; callers decide what that means.
pub fn try_decimal(cell: &Cell) -> Option<Decimal> {
    if cell.is_blank() {
        return None;
    }

    let rendered = cell.render();
    let cleaned: String = rendered
        .trim()
        .trim_start_matches(['€', '$'])
        .trim_end_matches(['€', '$'])
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Decimal coercion where anything unparseable counts as zero.
pub fn parse_decimal(cell: &Cell) -> Decimal {
    try_decimal(cell).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn erp_table(order_ids: &[Option<&str>]) -> Table {
        let mut table = Table::new(["Shopify Order Id", "Customer"]);
        for id in order_ids {
            let cell = id.map(Cell::text).unwrap_or(Cell::Empty);
            table.push_row(vec![cell, Cell::Empty]);
        }
        table
    }

    #[test]
    fn fill_down_copies_nearest_value() {
        let table = erp_table(&[None, Some("100"), None, Some("  "), Some("101"), None]);
        let filled = fill_down(&table, &["Shopify Order Id"]);

        let ids: Vec<String> = filled.rows.iter().map(|r| r[0].render()).collect();
        assert_eq!(ids, vec!["", "100", "100", "100", "101", "101"]);
        // Input untouched
        assert_eq!(table.cell(2, 0), &Cell::Empty);
    }

    #[test]
    fn fill_down_ignores_unknown_columns_and_pads_short_rows() {
        let mut table = Table::new(["Shopify Order Id", "Status"]);
        table.push_row(vec![Cell::text("1"), Cell::text("open")]);
        table.push_row(vec![Cell::Empty]);

        let filled = fill_down(&table, &["Status", "Nope"]);
        assert_eq!(filled.cell(1, 1), &Cell::text("open"));
    }

    #[test]
    fn fold_trims_and_lowercases() {
        assert_eq!(fold("  Cancelled "), "cancelled");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn canonical_key_strips_float_artifacts() {
        assert_eq!(canonical_key(&Cell::Number(123.0)), "123");
        assert_eq!(canonical_key(&Cell::text("123.0")), "123");
        assert_eq!(canonical_key(&Cell::text(" 124 ")), "124");
        assert_eq!(canonical_key(&Cell::text("125.00")), "125");
        assert_eq!(canonical_key(&Cell::text("125.50")), "125.50");
        assert_eq!(canonical_key(&Cell::text("#1001.0")), "#1001.0");
        assert_eq!(canonical_key(&Cell::Empty), "");
    }

    #[test]
    fn decimal_coercion_policy() {
        assert_eq!(parse_decimal(&Cell::Number(49.9)), Decimal::from_str("49.9").unwrap());
        assert_eq!(parse_decimal(&Cell::text(" 1 250.50 € ")), Decimal::from_str("1250.50").unwrap());
        assert_eq!(parse_decimal(&Cell::text("1.5e2")), Decimal::from(150));
        assert_eq!(parse_decimal(&Cell::text("n/a")), Decimal::ZERO);
        assert_eq!(parse_decimal(&Cell::Empty), Decimal::ZERO);
        assert_eq!(try_decimal(&Cell::Empty), None);
    }
}
