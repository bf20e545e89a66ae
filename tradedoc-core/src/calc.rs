use serde::Serialize;

use crate::model::LineItem;

/// Derived amounts for one line. Built once by [`compute`] and never
/// modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineComputation {
    pub gross_before_discount: f64,
    pub discount_amount: f64,
    pub net_after_discount: f64,
    pub tax_amount: f64,
    pub gross_after_tax: f64,
}

/// Compute the amounts of one line.
///
/// Each of net, tax and gross takes the line's override when present and
/// falls back to recomputation otherwise. Tax is derived from the resolved
/// net and gross from the resolved net and tax, so a pre-rounded net with no
/// pre-rounded tax still drives the tax amount.
pub fn compute(item: &LineItem) -> LineComputation {
    let gross_before_discount = item.quantity * item.unit_price;
    let discount_amount = gross_before_discount * (item.discount_percent / 100.0);

    let net_after_discount = item
        .line_net
        .unwrap_or(gross_before_discount - discount_amount);
    let tax_amount = item
        .line_tax
        .unwrap_or(net_after_discount * (item.tax_rate_percent / 100.0));
    let gross_after_tax = item.line_gross.unwrap_or(net_after_discount + tax_amount);

    LineComputation {
        gross_before_discount,
        discount_amount,
        net_after_discount,
        tax_amount,
        gross_after_tax,
    }
}

/// Compute every line, preserving order.
pub fn compute_all(items: &[LineItem]) -> Vec<LineComputation> {
    items.iter().map(compute).collect()
}
