use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// One spreadsheet cell as handed over by a loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Empty, or text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Display text. Integral numbers render without a decimal part.
    pub fn render(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

/// A header row plus data rows. Rows may be shorter than the header;
/// missing trailing cells read as [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Overwrite the named column, appending it when the header is absent.
    /// `values` is indexed by row; rows beyond its length get [`Cell::Empty`].
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        let col = match self.column_index(name) {
            Some(col) => col,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };

        let mut values = values.into_iter();
        for row in &mut self.rows {
            if row.len() <= col {
                row.resize(col + 1, Cell::Empty);
            }
            row[col] = values.next().unwrap_or_default();
        }
    }
}

// ---------------------------------------------------------------------------
// Bound records
// ---------------------------------------------------------------------------

/// One normalized line of the ERP order export.
#[derive(Debug, Clone, PartialEq)]
pub struct ErpLine {
    /// Zero-based data row in the ERP table.
    pub row: usize,
    pub order_id: String,
    pub customer: String,
    pub handling_status: String,
    pub order_status: String,
    /// Lowercased courier state label; empty when absent or unparseable.
    pub courier_state: String,
    pub product_name: String,
    pub untaxed_amount: Decimal,
    pub delivery_quantity: Decimal,
    pub ordered_quantity: Option<Decimal>,
}

/// One row of the partner sales feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRecord {
    pub row: usize,
    pub advertiser_id: String,
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Validation outcome for a partner record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unmatched,
    Cancel,
    Pending,
    Valid,
    /// Legitimate sale whose reported amount differs from the ERP total.
    ValidWithCorrection(Decimal),
}

impl Status {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Cancel => "cancel",
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::ValidWithCorrection(_) => "valid_with_correction",
        }
    }
}

/// Round half away from zero and pin the scale to two places.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidWithCorrection(total) => {
                write!(f, "valid - correct amount: {}", format_amount(*total))
            }
            other => f.write_str(other.kind()),
        }
    }
}

#[derive(Serialize)]
struct StatusRepr {
    label: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    corrected_amount: Option<String>,
}

impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let corrected_amount = match self {
            Self::ValidWithCorrection(total) => Some(format_amount(*total)),
            _ => None,
        };
        StatusRepr {
            label: self.to_string(),
            kind: self.kind(),
            corrected_amount,
        }
        .serialize(serializer)
    }
}

/// The classification rules. `Unmatched` always runs first and `Amount`
/// always last; the rest run in policy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Unmatched,
    OrderStatus,
    HandlingStatus,
    Customer,
    Courier,
    Checked,
    Amount,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unmatched => "unmatched",
            Self::OrderStatus => "order_status",
            Self::HandlingStatus => "handling_status",
            Self::Customer => "customer",
            Self::Courier => "courier",
            Self::Checked => "checked",
            Self::Amount => "amount",
        };
        f.write_str(name)
    }
}

/// A status plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: Status,
    pub rule: Rule,
    /// Set only when the amount rule ran.
    pub erp_total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRow {
    pub row: usize,
    pub advertiser_id: String,
    pub status: Status,
    pub rule: Rule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_total: Option<Decimal>,
    pub partner_amount: Decimal,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub total_rows: usize,
    pub unmatched: usize,
    pub cancel: usize,
    pub pending: usize,
    pub valid: usize,
    pub corrected: usize,
    /// Sum of `erp_total - amount` over corrected rows.
    pub corrected_delta: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub policy_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub erp_lines: usize,
    pub erp_orders: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub rows: Vec<ClassifiedRow>,
    /// Partner table with the status column populated.
    #[serde(skip)]
    pub output: Table,
}
