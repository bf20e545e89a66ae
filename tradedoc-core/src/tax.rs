use std::collections::BTreeMap;

use serde::Serialize;

use crate::calc::LineComputation;
use crate::model::LineItem;

/// Net and tax accumulated across all lines sharing one tax rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBucket {
    /// Rate formatted to two decimals; the grouping key.
    pub key: String,
    pub rate_percent: f64,
    pub net: f64,
    pub tax: f64,
}

/// Per-rate buckets plus the sums the reconciler needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TaxAggregate {
    /// Ascending by rate.
    pub buckets: Vec<TaxBucket>,
    pub total_gross_before_discount: f64,
    pub total_discount: f64,
    /// Σ gross_before_discount × discount_percent.
    pub discount_weighted_sum: f64,
}

impl TaxAggregate {
    pub fn bucket_net(&self) -> f64 {
        self.buckets.iter().map(|b| b.net).sum()
    }

    pub fn bucket_tax(&self) -> f64 {
        self.buckets.iter().map(|b| b.tax).sum()
    }
}

/// Grouping key of a rate: two decimals, so 19.0 and 19.000000001 share one
/// bucket.
pub fn rate_key(rate_percent: f64) -> String {
    format!("{:.2}", rate_percent)
}

/// Group line results by tax rate.
///
/// `computations[i]` must belong to `items[i]`; extra entries on either side
/// are ignored. Buckets come back sorted ascending by numeric rate whatever
/// the input order.
pub fn aggregate(computations: &[LineComputation], items: &[LineItem]) -> TaxAggregate {
    let mut buckets: BTreeMap<String, TaxBucket> = BTreeMap::new();
    let mut agg = TaxAggregate::default();

    for (c, item) in computations.iter().zip(items) {
        let key = rate_key(item.tax_rate_percent);
        let bucket = buckets.entry(key.clone()).or_insert_with(|| TaxBucket {
            key,
            rate_percent: item.tax_rate_percent,
            net: 0.0,
            tax: 0.0,
        });
        bucket.net += c.net_after_discount;
        bucket.tax += c.tax_amount;

        agg.total_gross_before_discount += c.gross_before_discount;
        agg.total_discount += c.discount_amount;
        agg.discount_weighted_sum += c.gross_before_discount * item.discount_percent;
    }

    // String keys sort "7.00" after "19.00"; order by the number instead.
    let mut buckets: Vec<TaxBucket> = buckets.into_values().collect();
    buckets.sort_by(|a, b| a.rate_percent.total_cmp(&b.rate_percent));
    agg.buckets = buckets;
    agg
}
