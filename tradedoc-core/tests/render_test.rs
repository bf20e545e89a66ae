use serde_json::json;
use tradedoc_core::{
    render_document, render_json, Document, DocumentKind, ExternalTotals, LineItem, Party,
    RenderConfig,
};

/// Check whether a byte pattern exists in the buffer.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn uncompressed() -> RenderConfig {
    RenderConfig {
        compress: false,
        issuer: Party {
            name: "Atlas Matériaux".into(),
            address: Some("12 rue de Tunis".into()),
            phone: Some("74 000 000".into()),
            tax_id: Some("1234567/A/M/000".into()),
            ..Party::default()
        },
        ..RenderConfig::default()
    }
}

fn quote_json() -> serde_json::Value {
    json!({
        "reference": "DV-2024-0042",
        "issueDate": "2024-06-14T09:30:00Z",
        "validUntil": "2024-07-14",
        "client": {"name": "Société Nour", "city": "Sousse"},
        "items": [
            {"designation": "Ciment CPJ 45", "quantity": 2, "unitPrice": 100, "discount": 10, "tvaRate": 19},
            {"designation": "Sable lavé", "quantity": 1, "price": 50, "tvaRate": 7}
        ]
    })
}

// -------------------------------------------------------
// Structure
// -------------------------------------------------------

#[test]
fn quote_renders_valid_pdf() {
    let out = render_json(&quote_json(), &uncompressed(), None).unwrap();
    assert!(out.bytes.starts_with(b"%PDF-1.7"));
    assert!(contains(&out.bytes, b"%%EOF"));
    assert!(contains(&out.bytes, b"/Type /Catalog"));
    assert!(contains(&out.bytes, b"/Title (DEVIS DV-2024-0042)"));
    assert_eq!(out.page_count, 1);
    assert!(contains(&out.bytes, b"/Count 1"));
}

#[test]
fn header_carries_issuer_counterparty_and_dates() {
    let out = render_json(&quote_json(), &uncompressed(), None).unwrap();
    assert!(contains(&out.bytes, b"(Atlas Mat\xe9riaux) Tj"));
    assert!(contains(&out.bytes, b"(T\xe9l : 74 000 000) Tj"));
    assert!(contains(&out.bytes, b"(MF : 1234567/A/M/000) Tj"));
    assert!(contains(&out.bytes, b"(Soci\xe9t\xe9 Nour) Tj"));
    assert!(contains(&out.bytes, b"(Client) Tj"));
    assert!(contains(&out.bytes, b"(14/06/2024) Tj"));
    assert!(contains(&out.bytes, b"(Valable jusqu'au 14/07/2024) Tj"));
}

#[test]
fn item_rows_and_totals_use_french_format() {
    let out = render_json(&quote_json(), &uncompressed(), None).unwrap();
    assert!(contains(&out.bytes, b"(100,000 DT) Tj"));
    assert!(contains(&out.bytes, b"(10,00 %) Tj"));
    assert!(contains(&out.bytes, b"(19,00 %) Tj"));
    assert!(contains(&out.bytes, b"(214,200 DT) Tj"));
    assert!(contains(&out.bytes, b"(53,500 DT) Tj"));
    assert!(contains(&out.bytes, b"(230,000 DT) Tj"));
    assert!(contains(&out.bytes, b"(37,700 DT) Tj"));
    assert!(contains(&out.bytes, b"(267,700 DT) Tj"));
    assert!(contains(&out.bytes, b"(Remise \\(8,00 %\\)) Tj"));
}

#[test]
fn per_rate_breakdown_is_ascending() {
    let out = render_json(&quote_json(), &uncompressed(), None).unwrap();
    let rates: Vec<f64> = out.buckets.iter().map(|b| b.rate_percent).collect();
    assert_eq!(rates, vec![7.0, 19.0]);
    // Last occurrence of the rate is the breakdown row, after the item rows.
    let seven = out.bytes.windows(8).rposition(|w| w == b"(7,00 %)").unwrap();
    let nineteen_base = out.bytes.windows(12).position(|w| w == b"(180,000 DT)").unwrap();
    assert!(seven < nineteen_base);
}

#[test]
fn zero_discount_and_zero_rate_print_dash() {
    let doc = json!({
        "items": [{"designation": "Livre", "quantity": 1, "unitPrice": 30, "tvaRate": 0}]
    });
    let out = render_json(&doc, &uncompressed(), None).unwrap();
    // Discount cell, tax cell and the breakdown rate.
    assert_eq!(count(&out.bytes, b"(\x97) Tj"), 3);
    assert!(!contains(&out.bytes, b"(0,00 %)"));
}

// -------------------------------------------------------
// Totals reconciliation
// -------------------------------------------------------

#[test]
fn external_gross_is_printed_verbatim() {
    let mut doc = quote_json();
    doc["totalTTC"] = json!(300);
    let out = render_json(&doc, &uncompressed(), None).unwrap();
    assert_eq!(out.totals.total_gross, 300.0);
    assert!((out.totals.total_net - 230.0).abs() < 1e-9);
    assert!(contains(&out.bytes, b"(300,000 DT) Tj"));
    assert!(!contains(&out.bytes, b"(267,700 DT)"));
}

#[test]
fn non_numeric_external_totals_are_ignored() {
    let mut doc = quote_json();
    doc["totalHT"] = json!("n/a");
    doc["totalTVA"] = json!(null);
    let out = render_json(&doc, &uncompressed(), None).unwrap();
    assert!((out.totals.total_net - 230.0).abs() < 1e-9);
    assert!((out.totals.total_tax - 37.7).abs() < 1e-9);
}

#[test]
fn typed_document_with_overrides() {
    let doc = Document {
        kind: DocumentKind::SalesOrder,
        reference: "CC-9".into(),
        items: vec![LineItem::new("Peinture", 3.0, 33.333, 0.0, 19.0)
            .with_overrides(Some(100.0), None, None)],
        external_totals: ExternalTotals::default(),
        ..Document::default()
    };
    let out = render_document(&doc, &uncompressed(), None).unwrap();
    assert!((out.totals.total_net - 100.0).abs() < 1e-9);
    assert!((out.totals.total_tax - 19.0).abs() < 1e-9);
    assert!(contains(&out.bytes, b"(COMMANDE CLIENT) Tj"));
    assert!(contains(&out.bytes, b"(119,000 DT) Tj"));
}

// -------------------------------------------------------
// Pagination
// -------------------------------------------------------

fn many_items(n: usize) -> serde_json::Value {
    let items: Vec<_> = (0..n)
        .map(|i| json!({"designation": format!("Article {}", i), "quantity": 1, "unitPrice": 10, "tvaRate": 19}))
        .collect();
    json!({"reference": "DV-1", "items": items})
}

#[test]
fn long_document_spans_pages() {
    let out = render_json(&many_items(120), &uncompressed(), None).unwrap();
    let n = out.page_count;
    assert!(n >= 3);
    assert!(contains(&out.bytes, format!("/Count {}", n).as_bytes()));
    for i in 1..=n {
        let stamp = format!("(Page {}/{}) Tj", i, n);
        assert_eq!(count(&out.bytes, stamp.as_bytes()), 1, "missing {}", stamp);
    }
    // Header and column titles repeat on every page.
    assert_eq!(count(&out.bytes, b"(DEVIS) Tj"), n);
    assert_eq!(count(&out.bytes, b"(D\xe9signation) Tj"), n);
    assert!(contains(&out.bytes, b"(Article 119) Tj"));
}

#[test]
fn totals_block_is_drawn_once_on_last_page() {
    let out = render_json(&many_items(120), &uncompressed(), None).unwrap();
    assert_eq!(count(&out.bytes, b"(Net \xe0 payer) Tj"), 1);
    let net_due = out.bytes.windows(15).position(|w| w == b"(Net \xe0 payer) T").unwrap();
    let last_row = out.bytes.windows(13).position(|w| w == b"(Article 119)").unwrap();
    assert!(net_due > last_row);
}

#[test]
fn compressed_output_hides_content() {
    let mut config = uncompressed();
    config.compress = true;
    let out = render_json(&quote_json(), &config, None).unwrap();
    assert!(contains(&out.bytes, b"/FlateDecode"));
    assert!(!contains(&out.bytes, b"(DEVIS) Tj"));
}

// -------------------------------------------------------
// Edge cases
// -------------------------------------------------------

#[test]
fn empty_items_render_marker() {
    let out = render_json(&json!({"reference": "DV-0", "items": []}), &uncompressed(), None)
        .unwrap();
    assert_eq!(out.page_count, 1);
    assert!(contains(&out.bytes, b"(Aucun article) Tj"));
    assert_eq!(out.totals.total_gross, 0.0);
    assert_eq!(out.totals.average_discount_percent, 0.0);
}

#[test]
fn non_object_input_still_renders() {
    let out = render_json(&json!("garbage"), &uncompressed(), None).unwrap();
    assert_eq!(out.page_count, 1);
    assert!(contains(&out.bytes, b"(Aucun article) Tj"));
}

#[test]
fn delivery_note_trailer() {
    let doc = json!({
        "documentType": "delivery_note",
        "number": "BL-2024-17",
        "customer": {"Name": "Garage Salem"},
        "deliveryDate": "2024-06-20",
        "deliveryAddress": "Route de Gabès km 4",
        "orderItems": {"$id": "7", "$values": [{"productName": "Pneu 195/65", "qty": 4, "price": 180, "tvaRate": 19}]}
    });
    let out = render_json(&doc, &uncompressed(), None).unwrap();
    assert!(contains(&out.bytes, b"(BON DE LIVRAISON) Tj"));
    assert!(contains(&out.bytes, b"(Garage Salem) Tj"));
    assert!(contains(&out.bytes, b"(Date de livraison : 20/06/2024) Tj"));
    assert!(contains(&out.bytes, b"(Adresse de livraison : Route de Gab\xe8s km 4) Tj"));
    assert!(contains(&out.bytes, b"(Signature livreur) Tj"));
    assert!(contains(&out.bytes, b"(Signature client) Tj"));
}

#[test]
fn typed_documents_with_negative_percentages_are_coerced() {
    let document: Document = serde_json::from_value(json!({
        "reference": "DV-NEG",
        "items": [{
            "designation": "Vis",
            "quantity": 1.0,
            "unit_price": 100.0,
            "discount_percent": -50.0,
            "tax_rate_percent": -19.0
        }]
    }))
    .unwrap();
    let out = render_document(&document, &uncompressed(), None).unwrap();
    assert_eq!(out.totals.total_net, 100.0);
    assert_eq!(out.totals.total_tax, 0.0);
    assert_eq!(out.totals.average_discount_percent, 0.0);
    assert!(!contains(&out.bytes, b"(-50,00 %) Tj"));
}

#[test]
fn literal_lines_are_coerced_before_computation() {
    let mut line = LineItem::new("Vis", 1.0, 100.0, 0.0, 19.0);
    line.discount_percent = 150.0;
    line.quantity = f64::NAN;
    let document = Document {
        reference: "DV-LIT".into(),
        items: vec![line, LineItem::new("Clou", 2.0, 10.0, 0.0, 19.0)],
        ..Document::default()
    };
    let out = render_document(&document, &uncompressed(), None).unwrap();
    assert!((out.totals.total_net - 20.0).abs() < 1e-9);
    assert!(out.totals.total_gross.is_finite());
}
