use crate::model::{ClassifiedRow, ReconSummary, Status};

/// Compute summary statistics from classified rows.
pub fn compute_summary(rows: &[ClassifiedRow]) -> ReconSummary {
    let mut summary = ReconSummary {
        total_rows: rows.len(),
        ..ReconSummary::default()
    };

    for r in rows {
        match r.status {
            Status::Unmatched => summary.unmatched += 1,
            Status::Cancel => summary.cancel += 1,
            Status::Pending => summary.pending += 1,
            Status::Valid => summary.valid += 1,
            Status::ValidWithCorrection(total) => {
                summary.corrected += 1;
                // Unrepresentable deltas leave the running sum as it was
                if let Some(delta) = total
                    .checked_sub(r.partner_amount)
                    .and_then(|d| summary.corrected_delta.checked_add(d))
                {
                    summary.corrected_delta = delta;
                }
            }
        }
    }

    summary
}

impl ReconSummary {
    /// One-line human summary.
    pub fn line(&self) -> String {
        format!(
            "reconciled {} partner rows: {} valid, {} corrected, {} pending, {} cancel, {} unmatched",
            self.total_rows, self.valid, self.corrected, self.pending, self.cancel, self.unmatched,
        )
    }
}
