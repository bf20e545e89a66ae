//! Property-based tests for the calculation core and pagination.

use proptest::prelude::*;
use tradedoc_core::layout::PageLayout;
use tradedoc_core::{
    aggregate, compute, compute_all, reconcile, render_document, Document, ExternalTotals,
    LineItem, PageGeometry, PageMetrics, PageSink, Paginator, RenderConfig, RenderError,
};

fn item_strategy() -> impl Strategy<Value = LineItem> {
    (
        0u32..500,
        0.0f64..5000.0,
        0u32..=100,
        prop::sample::select(vec![0.0, 7.0, 13.0, 19.0, 19.000000001]),
    )
        .prop_map(|(qty, price, discount, rate)| {
            LineItem::new("Article", qty as f64, price, discount as f64, rate)
        })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    /// Bucket sums equal the document totals when nothing is overridden.
    #[test]
    fn buckets_sum_to_totals(items in prop::collection::vec(item_strategy(), 0..40)) {
        let lines = compute_all(&items);
        let agg = aggregate(&lines, &items);
        let totals = reconcile(&agg, &ExternalTotals::default());
        let net: f64 = agg.buckets.iter().map(|b| b.net).sum();
        let tax: f64 = agg.buckets.iter().map(|b| b.tax).sum();
        prop_assert!(close(net, totals.total_net));
        prop_assert!(close(tax, totals.total_tax));
        prop_assert!(close(totals.total_net + totals.total_tax, totals.total_gross));
    }

    /// Without overrides every line satisfies net + tax = gross.
    #[test]
    fn line_identity(item in item_strategy()) {
        let line = compute(&item);
        prop_assert_eq!(line.net_after_discount + line.tax_amount, line.gross_after_tax);
        prop_assert!(line.net_after_discount <= line.gross_before_discount + 1e-9);
    }

    #[test]
    fn reconcile_is_idempotent(
        items in prop::collection::vec(item_strategy(), 0..20),
        external_gross in prop::option::of(0.0f64..1e6),
    ) {
        let lines = compute_all(&items);
        let agg = aggregate(&lines, &items);
        let external = ExternalTotals { total_gross: external_gross, ..ExternalTotals::default() };
        prop_assert_eq!(reconcile(&agg, &external), reconcile(&agg, &external));
    }

    #[test]
    fn average_discount_is_zero_without_gross(
        prices in prop::collection::vec(0.0f64..1000.0, 0..10),
        discount in 0.0f64..100.0,
    ) {
        let items: Vec<_> = prices
            .iter()
            .map(|&p| LineItem::new("Vide", 0.0, p, discount, 19.0))
            .collect();
        let agg = aggregate(&compute_all(&items), &items);
        let totals = reconcile(&agg, &ExternalTotals::default());
        prop_assert_eq!(totals.average_discount_percent, 0.0);
        prop_assert!(totals.average_discount_percent.is_finite());
    }

    /// Buckets come out in ascending rate order whatever the item order.
    #[test]
    fn bucket_order_ignores_input_order(items in prop::collection::vec(item_strategy(), 0..20)) {
        let forward = aggregate(&compute_all(&items), &items);
        let reversed: Vec<_> = items.iter().rev().cloned().collect();
        let backward = aggregate(&compute_all(&reversed), &reversed);
        let keys = |a: &tradedoc_core::TaxAggregate| {
            a.buckets.iter().map(|b| b.key.clone()).collect::<Vec<_>>()
        };
        prop_assert_eq!(keys(&forward), keys(&backward));
        let rates: Vec<f64> = forward.buckets.iter().map(|b| b.rate_percent).collect();
        prop_assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }
}

/// Remembers the page of every drawing call.
#[derive(Default)]
struct PageTracker {
    current: usize,
    totals_page: Option<usize>,
    totals_calls: usize,
    pages_begun: usize,
    stamps: Vec<(usize, usize)>,
}

impl PageSink for PageTracker {
    fn begin_page(&mut self, page_no: usize) -> Result<(), RenderError> {
        self.current = page_no;
        self.pages_begun += 1;
        Ok(())
    }
    fn draw_header(&mut self, _page_no: usize) -> Result<(), RenderError> {
        Ok(())
    }
    fn draw_table_heading(&mut self, _y: f64) -> Result<(), RenderError> {
        Ok(())
    }
    fn draw_row(&mut self, _index: usize, _y: f64) -> Result<(), RenderError> {
        Ok(())
    }
    fn draw_totals(&mut self, _y: f64) -> Result<(), RenderError> {
        self.totals_page = Some(self.current);
        self.totals_calls += 1;
        Ok(())
    }
    fn end_page(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
    fn stamp_page_number(&mut self, page_no: usize, count: usize) -> Result<(), RenderError> {
        self.stamps.push((page_no, count));
        Ok(())
    }
}

proptest! {
    /// The totals block is drawn exactly once, whole, on the last page.
    #[test]
    fn totals_always_on_last_page(
        row_heights in prop::collection::vec(18.2f64..60.0, 0..200),
        totals_height in 100.0f64..236.0,
    ) {
        let layout = PageLayout::new(&PageGeometry::default());
        let metrics = PageMetrics { heading_height: 18.2, row_heights, totals_height };
        let mut tracker = PageTracker::default();
        let result = Paginator::new(&mut tracker, layout).run(&metrics).unwrap();

        prop_assert_eq!(tracker.totals_calls, 1);
        prop_assert_eq!(tracker.totals_page, Some(result.page_count));
        prop_assert_eq!(tracker.pages_begun, result.page_count);
        prop_assert!(result.row_pages.iter().all(|&p| p <= result.totals_page));
        let expected: Vec<_> = (1..=result.page_count).map(|i| (i, result.page_count)).collect();
        prop_assert_eq!(tracker.stamps, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn rendered_document_has_one_totals_block(n in 0usize..90) {
        let items = (0..n)
            .map(|i| LineItem::new(format!("Article {}", i), 1.0, 12.5, 5.0, 19.0))
            .collect();
        let document = Document { reference: "DV-P".into(), items, ..Document::default() };
        let config = RenderConfig { compress: false, ..RenderConfig::default() };
        let out = render_document(&document, &config, None).unwrap();
        let needle = b"(Net \xe0 payer) Tj";
        let drawn = out.bytes.windows(needle.len()).filter(|w| w == needle).count();
        prop_assert_eq!(drawn, 1);
        let last_stamp = format!("(Page {}/{}) Tj", out.page_count, out.page_count);
        prop_assert!(out.bytes.windows(last_stamp.len()).any(|w| w == last_stamp.as_bytes()));
    }
}
