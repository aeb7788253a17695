use rust_decimal::Decimal;

use crate::config::{AmountConfig, ReconPolicy, RulesConfig, ZeroTotalOutcome};
use crate::index::OrderGroup;
use crate::model::{PartnerRecord, Rule, Status, Verdict};
use crate::normalize::fold;
use crate::value::erp_total;

fn listed(values: &[String], candidate: &str) -> bool {
    let candidate = fold(candidate);
    values.iter().any(|v| fold(v) == candidate)
}

fn any_order_status(group: &OrderGroup, values: &[String]) -> bool {
    group.lines.iter().any(|l| listed(values, &l.order_status))
}

fn any_handling_status(group: &OrderGroup, values: &[String]) -> bool {
    group.lines.iter().any(|l| listed(values, &l.handling_status))
}

fn verdict(status: Status, rule: Rule) -> Verdict {
    Verdict { status, rule, erp_total: None }
}

/// Apply one cascade rule. `None` means the rule did not decide.
fn apply_rule(rule: Rule, group: &OrderGroup, rules: &RulesConfig) -> Option<Status> {
    match rule {
        Rule::OrderStatus => {
            any_order_status(group, &rules.cancel_order_statuses).then_some(Status::Cancel)
        }
        Rule::HandlingStatus => {
            any_handling_status(group, &rules.cancel_handling_statuses).then_some(Status::Cancel)
        }
        Rule::Customer => {
            let hit = group.lines.iter().any(|line| {
                let customer = fold(&line.customer);
                rules
                    .cancel_customers
                    .iter()
                    .map(|name| fold(name))
                    .any(|name| !name.is_empty() && customer.contains(&name))
            });
            hit.then_some(Status::Cancel)
        }
        Rule::Courier => {
            let state = group.courier_state();
            if state.is_empty() {
                None
            } else if listed(&rules.courier_cancel_states, state) {
                Some(Status::Cancel)
            } else if listed(&rules.courier_delivered_states, state) {
                Some(Status::Valid)
            } else {
                None
            }
        }
        Rule::Checked => {
            let pending = any_handling_status(group, &rules.pending_handling_statuses)
                && !any_order_status(group, &rules.cancel_order_statuses);
            pending.then_some(Status::Pending)
        }
        Rule::Unmatched | Rule::Amount => None,
    }
}

/// Compare the ERP total with the partner-reported amount.
pub fn compare_amounts(erp_total: Decimal, amount: Decimal, config: &AmountConfig) -> Status {
    if erp_total.abs() < config.zero_threshold {
        return match config.zero_total {
            ZeroTotalOutcome::Cancel => Status::Cancel,
            ZeroTotalOutcome::Unmatched => Status::Unmatched,
        };
    }

    // Difference too large to represent is a mismatch
    let Some(diff) = erp_total.checked_sub(amount).map(|d| d.abs()) else {
        return Status::ValidWithCorrection(erp_total);
    };
    if diff <= config.absolute_tolerance {
        return Status::Valid;
    }

    if !amount.is_zero() {
        if let Some(ratio) = diff.checked_div(amount.abs()) {
            if ratio <= config.relative_tolerance {
                return Status::Valid;
            }
        }
    }

    Status::ValidWithCorrection(erp_total)
}

/// Classify one partner record against its ERP order group.
///
/// First match wins: unmatched, then the policy's rule order, then the
/// amount comparison.
pub fn classify(record: &PartnerRecord, group: Option<&OrderGroup>, policy: &ReconPolicy) -> Verdict {
    let Some(group) = group else {
        return verdict(Status::Unmatched, Rule::Unmatched);
    };

    for &rule in &policy.rules.order {
        if let Some(status) = apply_rule(rule, group, &policy.rules) {
            return verdict(status, rule);
        }
    }

    let total = erp_total(&group.lines, &policy.rules.excluded_product_token);
    Verdict {
        status: compare_amounts(total, record.amount, &policy.amount),
        rule: Rule::Amount,
        erp_total: Some(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ErpLine;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(order_status: &str, handling: &str, courier: &str) -> ErpLine {
        ErpLine {
            row: 0,
            order_id: "1".into(),
            customer: "Jane Doe".into(),
            handling_status: handling.into(),
            order_status: order_status.into(),
            courier_state: courier.into(),
            product_name: "Shoes".into(),
            untaxed_amount: dec("100"),
            delivery_quantity: dec("1"),
            ordered_quantity: Some(dec("1")),
        }
    }

    fn group(lines: Vec<ErpLine>) -> OrderGroup {
        OrderGroup { order_id: "1".into(), lines }
    }

    fn record(amount: &str) -> PartnerRecord {
        PartnerRecord { row: 0, advertiser_id: "1".into(), amount: dec(amount) }
    }

    fn run(lines: Vec<ErpLine>, amount: &str) -> Verdict {
        classify(&record(amount), Some(&group(lines)), &ReconPolicy::default())
    }

    #[test]
    fn no_group_is_unmatched() {
        let v = classify(&record("10"), None, &ReconPolicy::default());
        assert_eq!(v.status, Status::Unmatched);
        assert_eq!(v.rule, Rule::Unmatched);
    }

    #[test]
    fn cancelled_order_beats_delivered_courier() {
        let v = run(vec![line("Cancelled", "", "delivered")], "100");
        assert_eq!(v.status, Status::Cancel);
        assert_eq!(v.rule, Rule::OrderStatus);
    }

    #[test]
    fn undelivered_typo_is_cancel() {
        let v = run(vec![line("open", "", ""), line("UNDELIVERD", "", "")], "100");
        assert_eq!(v.status, Status::Cancel);
    }

    #[test]
    fn cancelled_handling_is_cancel() {
        let v = run(vec![line("open", "canceled", "delivered")], "100");
        assert_eq!(v.status, Status::Cancel);
        assert_eq!(v.rule, Rule::HandlingStatus);
    }

    #[test]
    fn blocklisted_customer_is_cancel() {
        let mut l = line("open", "checked", "delivered");
        l.customer = "Maria KALIKATZARAKIS".into();
        let v = run(vec![l], "100");
        assert_eq!(v.status, Status::Cancel);
        assert_eq!(v.rule, Rule::Customer);
    }

    #[test]
    fn courier_failure_is_cancel() {
        for state in ["returned to shipper", "canceled", "lost"] {
            let v = run(vec![line("open", "checked", state)], "100");
            assert_eq!(v.status, Status::Cancel, "state {state}");
            assert_eq!(v.rule, Rule::Courier);
        }
    }

    #[test]
    fn courier_delivered_beats_checked_and_amount() {
        let v = run(vec![line("open", "checked", "delivered")], "1");
        assert_eq!(v.status, Status::Valid);
        assert_eq!(v.rule, Rule::Courier);
        assert_eq!(v.erp_total, None);
    }

    #[test]
    fn checked_without_courier_is_pending() {
        let v = run(vec![line("open", "Checked", "")], "100");
        assert_eq!(v.status, Status::Pending);
        assert_eq!(v.rule, Rule::Checked);
    }

    #[test]
    fn unknown_courier_state_falls_through() {
        let v = run(vec![line("open", "", "in transit")], "100");
        assert_eq!(v.rule, Rule::Amount);
        assert_eq!(v.status, Status::Valid);
    }

    #[test]
    fn reordered_policy_lets_checked_win_over_courier() {
        let mut policy = ReconPolicy::default();
        policy.rules.order = vec![Rule::OrderStatus, Rule::HandlingStatus, Rule::Checked, Rule::Courier];
        let g = group(vec![line("open", "checked", "delivered")]);
        let v = classify(&record("100"), Some(&g), &policy);
        assert_eq!(v.status, Status::Pending);
    }

    #[test]
    fn checked_guard_holds_when_reordered_first() {
        let mut policy = ReconPolicy::default();
        policy.rules.order = vec![Rule::Checked, Rule::OrderStatus];
        let g = group(vec![line("cancelled", "checked", "")]);
        let v = classify(&record("100"), Some(&g), &policy);
        assert_eq!(v.status, Status::Cancel);
        assert_eq!(v.rule, Rule::OrderStatus);
    }

    #[test]
    fn omitted_rule_is_skipped() {
        let mut policy = ReconPolicy::default();
        policy.rules.order = vec![Rule::OrderStatus];
        let g = group(vec![line("open", "canceled", "")]);
        let v = classify(&record("100"), Some(&g), &policy);
        assert_eq!(v.rule, Rule::Amount);
    }

    #[test]
    fn amount_rule_reports_total() {
        let v = run(vec![line("open", "", "")], "80");
        assert_eq!(v.status, Status::ValidWithCorrection(dec("100")));
        assert_eq!(v.erp_total, Some(dec("100")));
        assert_eq!(v.status.to_string(), "valid - correct amount: 100.00");
    }

    // -- amount comparison -------------------------------------------------

    fn cmp(total: &str, amount: &str) -> Status {
        compare_amounts(dec(total), dec(amount), &AmountConfig::default())
    }

    #[test]
    fn exact_and_near_amounts_are_valid() {
        assert_eq!(cmp("100", "100"), Status::Valid);
        assert_eq!(cmp("100.01", "100"), Status::Valid);
        assert_eq!(cmp("101", "100"), Status::Valid); // 1%
        assert_eq!(cmp("0.50", "0.49"), Status::Valid);
    }

    #[test]
    fn outside_one_percent_is_corrected() {
        assert_eq!(cmp("101.50", "100"), Status::ValidWithCorrection(dec("101.50")));
        assert_eq!(cmp("100", "80"), Status::ValidWithCorrection(dec("100")));
    }

    #[test]
    fn zero_total_is_cancel_by_default() {
        assert_eq!(cmp("0", "50"), Status::Cancel);
        assert_eq!(cmp("0.009", "0"), Status::Cancel);
        assert_eq!(cmp("-0.005", "10"), Status::Cancel);
    }

    #[test]
    fn zero_total_can_be_unmatched() {
        let config = AmountConfig { zero_total: ZeroTotalOutcome::Unmatched, ..AmountConfig::default() };
        assert_eq!(compare_amounts(Decimal::ZERO, dec("50"), &config), Status::Unmatched);
    }

    #[test]
    fn overflowing_difference_is_a_correction_not_a_panic() {
        let huge = dec("70000000000000000000000000000");
        assert_eq!(
            compare_amounts(huge, -huge, &AmountConfig::default()),
            Status::ValidWithCorrection(huge)
        );
        assert_eq!(
            compare_amounts(-huge, huge, &AmountConfig::default()),
            Status::ValidWithCorrection(-huge)
        );
    }

    #[test]
    fn zero_partner_amount_does_not_divide() {
        assert_eq!(cmp("25", "0"), Status::ValidWithCorrection(dec("25")));
    }
}
