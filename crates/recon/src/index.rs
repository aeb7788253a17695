use std::collections::HashMap;

use crate::courier::group_state;
use crate::model::ErpLine;

/// All ERP lines sharing one order id, in original row order.
#[derive(Debug, Clone)]
pub struct OrderGroup {
    pub order_id: String,
    pub lines: Vec<ErpLine>,
}

impl OrderGroup {
    /// Customer of the order (taken from its first line).
    pub fn customer(&self) -> &str {
        self.lines.first().map(|l| l.customer.as_str()).unwrap_or("")
    }

    /// First non-empty courier state among the lines.
    pub fn courier_state(&self) -> &str {
        group_state(self.lines.iter().map(|l| l.courier_state.as_str()))
    }
}

/// Lookup from canonical order id to its group. Built once per run.
#[derive(Debug, Default)]
pub struct OrderIndex {
    groups: HashMap<String, OrderGroup>,
}

impl OrderIndex {
    /// Group lines by order id. Lines with a blank id (before the first
    /// filled value) cannot be matched and are left out.
    pub fn build(lines: Vec<ErpLine>) -> Self {
        let mut groups: HashMap<String, OrderGroup> = HashMap::new();
        let mut skipped = 0usize;

        for line in lines {
            if line.order_id.is_empty() {
                skipped += 1;
                continue;
            }
            groups
                .entry(line.order_id.clone())
                .or_insert_with(|| OrderGroup {
                    order_id: line.order_id.clone(),
                    lines: Vec::new(),
                })
                .lines
                .push(line);
        }

        if skipped > 0 {
            log::warn!("{skipped} ERP line(s) before the first order id were ignored");
        }

        Self { groups }
    }

    pub fn get(&self, key: &str) -> Option<&OrderGroup> {
        if key.is_empty() {
            return None;
        }
        self.groups.get(key)
    }

    pub fn order_count(&self) -> usize {
        self.groups.len()
    }
}
