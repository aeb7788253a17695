//! Binding raw tables to typed records.
//!
//! Every required column is resolved before the first row is read, so a
//! shape problem fails the run up front instead of halfway through.

use rust_decimal::Decimal;

use crate::config::{ErpColumns, PartnerColumns};
use crate::courier::extract_state;
use crate::error::ReconError;
use crate::model::{ErpLine, PartnerRecord, Table};
use crate::normalize::{canonical_key, try_decimal};

pub const ERP_TABLE: &str = "erp";
pub const PARTNER_TABLE: &str = "partner";

fn require(table: &Table, table_name: &str, column: &str) -> Result<usize, ReconError> {
    table
        .column_index(column)
        .ok_or_else(|| ReconError::missing_column(table_name, column))
}

/// Check that the table has a header row and every required column.
pub fn check_erp_columns(table: &Table, cols: &ErpColumns) -> Result<(), ReconError> {
    if table.headers.is_empty() {
        return Err(ReconError::EmptyTable { table: ERP_TABLE.into() });
    }
    for column in [
        &cols.order_id,
        &cols.customer,
        &cols.handling_status,
        &cols.order_status,
        &cols.courier_state,
        &cols.product_name,
        &cols.untaxed_amount,
        &cols.delivery_quantity,
    ] {
        require(table, ERP_TABLE, column)?;
    }
    Ok(())
}

/// Numeric field with the zero-on-failure policy; non-blank garbage is logged.
fn number(table: &Table, row: usize, col: usize, what: &str) -> Decimal {
    let cell = table.cell(row, col);
    match try_decimal(cell) {
        Some(value) => value,
        None => {
            if !cell.is_blank() {
                log::debug!("{what} row {}: non-numeric {:?}, using 0", row + 1, cell.render());
            }
            Decimal::ZERO
        }
    }
}

fn text(table: &Table, row: usize, col: usize) -> String {
    table.cell(row, col).render().trim().to_string()
}

/// Bind a (normalized) ERP table. Courier payloads are reduced to their
/// state label here.
pub fn bind_erp(table: &Table, cols: &ErpColumns) -> Result<Vec<ErpLine>, ReconError> {
    check_erp_columns(table, cols)?;

    let order_id_idx = require(table, ERP_TABLE, &cols.order_id)?;
    let customer_idx = require(table, ERP_TABLE, &cols.customer)?;
    let handling_idx = require(table, ERP_TABLE, &cols.handling_status)?;
    let status_idx = require(table, ERP_TABLE, &cols.order_status)?;
    let courier_idx = require(table, ERP_TABLE, &cols.courier_state)?;
    let product_idx = require(table, ERP_TABLE, &cols.product_name)?;
    let untaxed_idx = require(table, ERP_TABLE, &cols.untaxed_amount)?;
    let delivered_idx = require(table, ERP_TABLE, &cols.delivery_quantity)?;
    let ordered_idx = table.column_index(&cols.ordered_quantity);

    let mut lines = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let ordered_quantity = ordered_idx.and_then(|col| {
            let cell = table.cell(row, col);
            if cell.is_blank() {
                None
            } else {
                Some(number(table, row, col, "ordered quantity"))
            }
        });

        lines.push(ErpLine {
            row,
            order_id: canonical_key(table.cell(row, order_id_idx)),
            customer: text(table, row, customer_idx),
            handling_status: text(table, row, handling_idx),
            order_status: text(table, row, status_idx),
            courier_state: extract_state(&table.cell(row, courier_idx).render()),
            product_name: text(table, row, product_idx),
            untaxed_amount: number(table, row, untaxed_idx, "untaxed amount"),
            delivery_quantity: number(table, row, delivered_idx, "delivery quantity"),
            ordered_quantity,
        });
    }

    Ok(lines)
}

/// Bind the partner feed. The status column is output-only and not read.
pub fn bind_partner(table: &Table, cols: &PartnerColumns) -> Result<Vec<PartnerRecord>, ReconError> {
    if table.headers.is_empty() {
        return Err(ReconError::EmptyTable { table: PARTNER_TABLE.into() });
    }
    let id_idx = require(table, PARTNER_TABLE, &cols.advertiser_id)?;
    let amount_idx = require(table, PARTNER_TABLE, &cols.amount)?;

    Ok((0..table.len())
        .map(|row| PartnerRecord {
            row,
            advertiser_id: canonical_key(table.cell(row, id_idx)),
            amount: number(table, row, amount_idx, "partner amount"),
        })
        .collect())
}

/// Header names that occur more than once; lookups use the first.
pub fn duplicate_headers(table: &Table) -> Vec<String> {
    let mut dupes = Vec::new();
    for (i, header) in table.headers.iter().enumerate() {
        let h = header.trim();
        if !h.is_empty()
            && table.headers[..i].iter().any(|prev| prev.trim() == h)
            && !dupes.iter().any(|d: &String| d == h)
        {
            dupes.push(h.to_string());
        }
    }
    dupes
}
