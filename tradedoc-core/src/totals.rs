use serde::Serialize;
use tracing::debug;

use crate::model::ExternalTotals;
use crate::tax::TaxAggregate;

/// Document-level totals shown in the summary block.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DocumentTotals {
    pub total_gross_before_discount: f64,
    pub total_discount: f64,
    pub total_net: f64,
    pub total_tax: f64,
    pub total_gross: f64,
    pub average_discount_percent: f64,
}

/// Decide the document totals.
///
/// Net, tax and gross each take the external value when it is finite and the
/// bucket sums otherwise; computed gross is the resolved net plus the
/// resolved tax. An external value is trusted verbatim, even when it
/// disagrees with the lines. Discount is always derived.
pub fn reconcile(aggregate: &TaxAggregate, external: &ExternalTotals) -> DocumentTotals {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

    let total_net = finite(external.total_net).unwrap_or_else(|| aggregate.bucket_net());
    let total_tax = finite(external.total_tax).unwrap_or_else(|| aggregate.bucket_tax());
    let total_gross = finite(external.total_gross).unwrap_or(total_net + total_tax);

    let total_gross_before_discount = aggregate.total_gross_before_discount;
    let average_discount_percent = if total_gross_before_discount > 0.0 {
        aggregate.discount_weighted_sum / total_gross_before_discount
    } else {
        0.0
    };

    debug!(
        total_net,
        total_tax,
        total_gross,
        external_net = finite(external.total_net).is_some(),
        external_tax = finite(external.total_tax).is_some(),
        external_gross = finite(external.total_gross).is_some(),
        "Reconciled document totals"
    );

    DocumentTotals {
        total_gross_before_discount,
        total_discount: total_gross_before_discount - total_net,
        total_net,
        total_tax,
        total_gross,
        average_discount_percent,
    }
}
