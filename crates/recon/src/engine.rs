use crate::classify::classify;
use crate::config::ReconPolicy;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::index::OrderIndex;
use crate::model::{Cell, ClassifiedRow, ReconMeta, ReconResult, Table};
use crate::normalize::fill_down;
use crate::schema::{bind_erp, bind_partner, check_erp_columns, duplicate_headers};

/// Run reconciliation per policy. Returns one classified row per partner
/// row plus the annotated partner table.
///
/// Fails only on input-shape problems; per-field problems are recovered
/// during binding.
pub fn run(policy: &ReconPolicy, erp: &Table, partner: &Table) -> Result<ReconResult, ReconError> {
    let erp_cols = &policy.columns.erp;
    let partner_cols = &policy.columns.partner;

    // Shape checks before touching any row
    check_erp_columns(erp, erp_cols)?;
    let records = bind_partner(partner, partner_cols)?;

    for (name, table) in [("erp", erp), ("partner", partner)] {
        let dupes = duplicate_headers(table);
        if !dupes.is_empty() {
            log::warn!("{name} table: duplicate column(s) {dupes:?}, using the first occurrence");
        }
    }
    if records.is_empty() {
        log::warn!("partner table has no data rows");
    }

    let normalized = fill_down(erp, &erp_cols.fill_down());
    let lines = bind_erp(&normalized, erp_cols)?;
    let erp_lines = lines.len();
    let index = OrderIndex::build(lines);
    log::info!(
        "indexed {} ERP lines into {} orders",
        erp_lines,
        index.order_count()
    );

    let rows: Vec<ClassifiedRow> = records
        .iter()
        .map(|record| {
            let verdict = classify(record, index.get(&record.advertiser_id), policy);
            log::debug!(
                "partner row {} ({}): {} by rule {}",
                record.row + 1,
                record.advertiser_id,
                verdict.status,
                verdict.rule
            );
            ClassifiedRow {
                row: record.row,
                advertiser_id: record.advertiser_id.clone(),
                status: verdict.status,
                rule: verdict.rule,
                erp_total: verdict.erp_total,
                partner_amount: record.amount,
            }
        })
        .collect();

    let mut output = partner.clone();
    output.set_column(
        &partner_cols.status,
        rows.iter().map(|r| Cell::Text(r.status.to_string())).collect(),
    );

    let summary = compute_summary(&rows);
    log::info!("{}", summary.line());

    Ok(ReconResult {
        meta: ReconMeta {
            policy_name: policy.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            erp_lines,
            erp_orders: index.order_count(),
        },
        summary,
        rows,
        output,
    })
}
