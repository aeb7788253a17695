use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Rule;

// ---------------------------------------------------------------------------
// Top-level policy
// ---------------------------------------------------------------------------

/// Everything the engine needs beyond the two tables. Every field has a
/// default, so an empty document is a valid policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconPolicy {
    pub name: String,
    pub columns: ColumnsConfig,
    pub rules: RulesConfig,
    pub amount: AmountConfig,
}

impl Default for ReconPolicy {
    fn default() -> Self {
        Self {
            name: "default".into(),
            columns: ColumnsConfig::default(),
            rules: RulesConfig::default(),
            amount: AmountConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnsConfig {
    pub erp: ErpColumns,
    pub partner: PartnerColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErpColumns {
    pub order_id: String,
    pub customer: String,
    pub handling_status: String,
    pub order_status: String,
    pub courier_state: String,
    pub product_name: String,
    pub untaxed_amount: String,
    pub delivery_quantity: String,
    /// Optional in the input; falls back to `delivery_quantity`.
    pub ordered_quantity: String,
}

impl Default for ErpColumns {
    fn default() -> Self {
        Self {
            order_id: "Shopify Order Id".into(),
            customer: "Customer".into(),
            handling_status: "Handling Status".into(),
            order_status: "Status".into(),
            courier_state: "Courier State".into(),
            product_name: "Order Lines/Product/Name".into(),
            untaxed_amount: "Order Lines/Untaxed Invoiced Amount".into(),
            delivery_quantity: "Order Lines/Delivery Quantity".into(),
            ordered_quantity: "Order Lines/Product/Quantity".into(),
        }
    }
}

impl ErpColumns {
    /// Columns carrying order-header values that are only present on the
    /// first line of a multi-line order.
    pub fn fill_down(&self) -> [&str; 4] {
        [
            &self.order_id,
            &self.customer,
            &self.handling_status,
            &self.order_status,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartnerColumns {
    pub advertiser_id: String,
    pub amount: String,
    /// Output column; created when the feed does not have it.
    pub status: String,
}

impl Default for PartnerColumns {
    fn default() -> Self {
        Self {
            advertiser_id: "Advertiser Id".into(),
            amount: "Amount".into(),
            status: "Status".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Cascade order between the unmatched check and the amount check.
    /// Omitting a rule disables it.
    pub order: Vec<Rule>,
    pub cancel_order_statuses: Vec<String>,
    pub cancel_handling_statuses: Vec<String>,
    /// Customer names (substring, case-insensitive) whose orders are void.
    pub cancel_customers: Vec<String>,
    pub courier_cancel_states: Vec<String>,
    pub courier_delivered_states: Vec<String>,
    pub pending_handling_statuses: Vec<String>,
    /// Lines whose product name contains this token are shipping fees.
    pub excluded_product_token: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            order: vec![
                Rule::OrderStatus,
                Rule::HandlingStatus,
                Rule::Customer,
                Rule::Courier,
                Rule::Checked,
            ],
            cancel_order_statuses: strings(&["canceled", "cancelled", "undelivered", "undeliverd"]),
            cancel_handling_statuses: strings(&["canceled", "cancelled"]),
            cancel_customers: strings(&["kalikatzarakis"]),
            courier_cancel_states: strings(&["returned to shipper", "canceled", "lost"]),
            courier_delivered_states: strings(&["delivered"]),
            pending_handling_statuses: strings(&["checked"]),
            excluded_product_token: "courier".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Amount comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmountConfig {
    /// Largest absolute difference still treated as equal.
    pub absolute_tolerance: Decimal,
    /// Largest difference relative to the partner amount still treated as equal.
    pub relative_tolerance: Decimal,
    /// ERP totals below this (in absolute value) count as zero.
    pub zero_threshold: Decimal,
    pub zero_total: ZeroTotalOutcome,
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: Decimal::new(1, 2),
            relative_tolerance: Decimal::new(1, 2),
            zero_threshold: Decimal::new(1, 2),
            zero_total: ZeroTotalOutcome::Cancel,
        }
    }
}

/// What an order whose ERP total is effectively zero classifies as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroTotalOutcome {
    #[default]
    Cancel,
    Unmatched,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconPolicy {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let policy: ReconPolicy =
            toml::from_str(input).map_err(|e| ReconError::PolicyParse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::PolicyParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let mut seen = HashSet::new();
        for rule in &self.rules.order {
            if matches!(rule, Rule::Unmatched | Rule::Amount) {
                return Err(ReconError::PolicyValidation(format!(
                    "rules.order: '{rule}' always runs and cannot be reordered"
                )));
            }
            if !seen.insert(*rule) {
                return Err(ReconError::PolicyValidation(format!(
                    "rules.order: '{rule}' listed more than once"
                )));
            }
        }

        if self.rules.excluded_product_token.trim().is_empty() {
            return Err(ReconError::PolicyValidation(
                "rules.excluded_product_token must not be empty".into(),
            ));
        }

        let tolerances = [
            ("absolute_tolerance", self.amount.absolute_tolerance),
            ("relative_tolerance", self.amount.relative_tolerance),
            ("zero_threshold", self.amount.zero_threshold),
        ];
        for (field, value) in tolerances {
            if value.is_sign_negative() {
                return Err(ReconError::PolicyValidation(format!(
                    "amount.{field} must not be negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn empty_document_is_default_policy() {
        let policy = ReconPolicy::from_toml("").unwrap();
        assert_eq!(policy, ReconPolicy::default());
        assert_eq!(policy.columns.erp.order_id, "Shopify Order Id");
        assert_eq!(policy.rules.order.len(), 5);
        assert_eq!(policy.amount.zero_total, ZeroTotalOutcome::Cancel);
    }

    #[test]
    fn parse_partial_overrides() {
        let input = r#"
name = "handling first"

[columns.partner]
advertiser_id = "Order Ref"

[rules]
order = ["order_status", "handling_status", "checked", "courier"]
cancel_customers = ["test customer", "kalikatzarakis"]

[amount]
relative_tolerance = "0.02"
zero_total = "unmatched"
"#;
        let policy = ReconPolicy::from_toml(input).unwrap();
        assert_eq!(policy.name, "handling first");
        assert_eq!(policy.columns.partner.advertiser_id, "Order Ref");
        assert_eq!(policy.columns.partner.amount, "Amount");
        assert_eq!(policy.rules.order[2], Rule::Checked);
        assert!(!policy.rules.order.contains(&Rule::Customer));
        assert_eq!(policy.rules.cancel_customers.len(), 2);
        assert_eq!(policy.amount.relative_tolerance, Decimal::from_str("0.02").unwrap());
        assert_eq!(policy.amount.absolute_tolerance, Decimal::from_str("0.01").unwrap());
        assert_eq!(policy.amount.zero_total, ZeroTotalOutcome::Unmatched);
    }

    #[test]
    fn reject_duplicate_rule() {
        let input = r#"
[rules]
order = ["courier", "order_status", "courier"]
"#;
        let err = ReconPolicy::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'courier' listed more than once"));
    }

    #[test]
    fn reject_fixed_rule_in_order() {
        let input = r#"
[rules]
order = ["amount", "order_status"]
"#;
        let err = ReconPolicy::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'amount' always runs"));
    }

    #[test]
    fn reject_unknown_rule_name() {
        let input = r#"
[rules]
order = ["courrier"]
"#;
        let err = ReconPolicy::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::PolicyParse(_)));
    }

    #[test]
    fn reject_unknown_field() {
        let err = ReconPolicy::from_toml("tolerance = 3").unwrap_err();
        assert!(matches!(err, ReconError::PolicyParse(_)));
    }

    #[test]
    fn reject_negative_tolerance() {
        let input = r#"
[amount]
absolute_tolerance = "-0.5"
"#;
        let err = ReconPolicy::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("amount.absolute_tolerance"));
    }

    #[test]
    fn rendered_default_parses_back() {
        let rendered = ReconPolicy::default().to_toml().unwrap();
        assert!(rendered.contains("Shopify Order Id"));
        let parsed = ReconPolicy::from_toml(&rendered).unwrap();
        assert_eq!(parsed, ReconPolicy::default());
    }
}
