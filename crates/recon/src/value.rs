use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::model::ErpLine;

/// Value of one merchandise line, prorated to the delivered quantity.
///
/// Invoice amounts are computed against the ordered quantity, but only the
/// delivered part earns commission. Over-delivery is left as invoiced.
pub fn line_value(line: &ErpLine) -> Decimal {
    let delivered = line.delivery_quantity;
    let ordered = line.ordered_quantity.unwrap_or(delivered);
    let invoiced = line.untaxed_amount;

    match ordered.cmp(&delivered) {
        Ordering::Equal | Ordering::Less => invoiced,
        Ordering::Greater => {
            if ordered.is_zero() {
                return Decimal::ZERO;
            }
            let unit_price = invoiced.checked_div(ordered).unwrap_or(Decimal::ZERO);
            unit_price.checked_mul(delivered).unwrap_or(Decimal::ZERO)
        }
    }
}

/// Whether the product name marks a shipping-fee line.
pub fn is_excluded(line: &ErpLine, token: &str) -> bool {
    line.product_name
        .to_lowercase()
        .contains(&token.trim().to_lowercase())
}

/// ERP-side order total: sum of prorated line values, shipping lines excluded.
pub fn erp_total<'a>(lines: impl IntoIterator<Item = &'a ErpLine>, excluded_token: &str) -> Decimal {
    lines
        .into_iter()
        .filter(|line| !is_excluded(line, excluded_token))
        .fold(Decimal::ZERO, |total, line| {
            total.checked_add(line_value(line)).unwrap_or(total)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(product: &str, untaxed: &str, delivered: &str, ordered: Option<&str>) -> ErpLine {
        ErpLine {
            row: 0,
            order_id: "1".into(),
            customer: String::new(),
            handling_status: String::new(),
            order_status: String::new(),
            courier_state: String::new(),
            product_name: product.into(),
            untaxed_amount: dec(untaxed),
            delivery_quantity: dec(delivered),
            ordered_quantity: ordered.map(dec),
        }
    }

    #[test]
    fn partial_delivery_is_prorated() {
        assert_eq!(line_value(&line("Shoes", "100.00", "5", Some("10"))), dec("50.00"));
    }

    #[test]
    fn full_delivery_uses_invoiced_amount() {
        assert_eq!(line_value(&line("Shoes", "100.00", "5", Some("5"))), dec("100.00"));
    }

    #[test]
    fn missing_ordered_quantity_means_full_delivery() {
        assert_eq!(line_value(&line("Shoes", "100.00", "3", None)), dec("100.00"));
    }

    #[test]
    fn over_delivery_is_not_extrapolated() {
        assert_eq!(line_value(&line("Shoes", "100.00", "7", Some("5"))), dec("100.00"));
    }

    #[test]
    fn nothing_delivered_is_worth_nothing() {
        assert_eq!(line_value(&line("Shoes", "100.00", "0", Some("4"))), Decimal::ZERO);
    }

    #[test]
    fn courier_lines_are_excluded_case_insensitively() {
        let lines = vec![
            line("Shoes", "30", "1", Some("1")),
            line("ACS COURIER fee", "4.50", "1", Some("1")),
            line("Socks", "70", "1", Some("1")),
        ];
        assert_eq!(erp_total(&lines, "courier"), dec("100"));
    }

    #[test]
    fn empty_group_totals_zero() {
        let lines: Vec<ErpLine> = Vec::new();
        assert_eq!(erp_total(&lines, "courier"), Decimal::ZERO);
    }
}
