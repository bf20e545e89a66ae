use serde_json::json;
use tradedoc_core::{normalize_document, normalize_items, DocumentKind};

#[test]
fn mixed_alias_shapes_normalize_alike() {
    let items = normalize_items(&json!([
        {"designation": "A", "quantity": 2, "unitPrice": 5, "discount": 10, "tvaRate": 19},
        {"Designation": "A", "Quantity": "2", "Price": "5", "DiscountPercent": 10, "TaxRate": "19"},
        {"productName": "A", "qty": 2, "price": 5.0, "discountPercent": "10", "taxRatePercent": 19}
    ]));
    assert_eq!(items.len(), 3);
    assert_eq!(items[0], items[1]);
    assert_eq!(items[1], items[2]);
}

#[test]
fn nested_envelopes_are_unwrapped() {
    let items = normalize_items(&json!({
        "$id": "1",
        "$values": {"$id": "2", "$values": [{"name": "X"}, {"name": "Y"}]}
    }));
    let names: Vec<_> = items.iter().map(|i| i.designation.as_str()).collect();
    assert_eq!(names, vec!["X", "Y"]);
}

#[test]
fn bare_object_is_one_item() {
    let items = normalize_items(&json!({"name": "Seul", "qty": 1}));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].designation, "Seul");
}

#[test]
fn garbage_numbers_default_to_zero() {
    let items = normalize_items(&json!([
        {"quantity": "beaucoup", "price": true, "discount": [], "tvaRate": {"v": 1}}
    ]));
    let item = &items[0];
    assert_eq!(item.quantity, 0.0);
    assert_eq!(item.unit_price, 0.0);
    assert_eq!(item.discount_percent, 0.0);
    assert_eq!(item.tax_rate_percent, 0.0);
    assert_eq!(item.designation, "Product #1");
}

#[test]
fn placeholder_prefers_product_id() {
    let items = normalize_items(&json!([{"qty": 1}, {"product": {"id": 42}}, {"ProductId": "P-7"}]));
    let names: Vec<_> = items.iter().map(|i| i.designation.as_str()).collect();
    assert_eq!(names, vec!["Product #1", "Product #42", "Product #P-7"]);
}

#[test]
fn nested_product_name_is_designation() {
    let items = normalize_items(&json!([{"Product": {"Name": "Peinture blanche"}, "qty": 3}]));
    assert_eq!(items[0].designation, "Peinture blanche");
}

#[test]
fn document_fields_and_totals() {
    let doc = normalize_document(&json!({
        "Type": "Bon de commande",
        "Code": "BC-88",
        "Date": "2024-01-31",
        "supplier": {"name": "Fournitures Sahel", "matriculeFiscal": "998877/B"},
        "Lines": [{"name": "Papier", "qty": 10, "price": 4.2, "tvaRate": 19}],
        "TotalHT": "42,000",
        "totalTVA": "NaN",
        "TotalTTC": 49.98
    }));
    // "Bon de commande" is not a known kind name.
    assert_eq!(doc.kind, DocumentKind::Quote);
    assert_eq!(doc.reference, "BC-88");
    assert_eq!(doc.issue_date, "2024-01-31");
    assert_eq!(doc.counterparty.name, "Fournitures Sahel");
    assert_eq!(doc.counterparty.tax_id.as_deref(), Some("998877/B"));
    assert_eq!(doc.items.len(), 1);
    assert_eq!(doc.external_totals.total_net, Some(42.0));
    assert_eq!(doc.external_totals.total_tax, None);
    assert_eq!(doc.external_totals.total_gross, Some(49.98));
}

#[test]
fn kind_codes_are_recognized() {
    for (name, kind) in [
        ("devis", DocumentKind::Quote),
        ("BC", DocumentKind::PurchaseOrder),
        ("purchase-order", DocumentKind::PurchaseOrder),
        ("SalesOrder", DocumentKind::SalesOrder),
        ("commande", DocumentKind::SalesOrder),
        ("bl", DocumentKind::DeliveryNote),
    ] {
        let doc = normalize_document(&json!({"kind": name}));
        assert_eq!(doc.kind, kind, "kind name {}", name);
    }
}

#[test]
fn flat_counterparty_name() {
    let doc = normalize_document(&json!({"counterpartyName": "M. Ben Ali"}));
    assert_eq!(doc.counterparty.name, "M. Ben Ali");
}
