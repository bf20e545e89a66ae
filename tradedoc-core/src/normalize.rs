//! Turning loosely-shaped upstream records into canonical types.
//!
//! Upstream systems name the same concept several ways (`price`, `Price`,
//! `unitPrice`, ...) and sometimes wrap arrays in a `{"$values": [...]}`
//! envelope. Every canonical field has one ordered alias list below; the first
//! alias holding a non-null value wins. Nothing in here fails: unusable values
//! fall back to the documented default.

use serde_json::{Map, Value};

use crate::model::{Document, DocumentKind, ExternalTotals, LineItem, Party};

/// Marker key of a reference-preserving array envelope.
pub const ENVELOPE_KEY: &str = "$values";

const DESIGNATION: &[&str] = &[
    "designation",
    "Designation",
    "productName",
    "ProductName",
    "name",
    "Name",
    "description",
    "Description",
];
const ITEM_ID: &[&str] = &["productId", "ProductId", "id", "Id"];
const NESTED_PRODUCT: &[&str] = &["product", "Product"];
const QUANTITY: &[&str] = &["quantity", "Quantity", "qty", "Qty"];
const UNIT_PRICE: &[&str] = &["unitPrice", "UnitPrice", "price", "Price"];
const DISCOUNT: &[&str] = &["discount", "Discount", "discountPercent", "DiscountPercent"];
const TAX_RATE: &[&str] = &[
    "tvaRate",
    "TvaRate",
    "taxRatePercent",
    "TaxRatePercent",
    "taxRate",
    "TaxRate",
];
const LINE_NET: &[&str] = &["lineTotalHT", "LineTotalHT", "lineNet", "LineNet"];
const LINE_TAX: &[&str] = &["lineTotalTVA", "LineTotalTVA", "lineTax", "LineTax"];
const LINE_GROSS: &[&str] = &["lineTotalTTC", "LineTotalTTC", "lineGross", "LineGross"];

const KIND: &[&str] = &["kind", "Kind", "type", "Type", "documentType", "DocumentType"];
const REFERENCE: &[&str] = &["reference", "Reference", "number", "Number", "code", "Code"];
const ISSUE_DATE: &[&str] = &["issueDate", "IssueDate", "date", "Date", "createdAt", "CreatedAt"];
const VALID_UNTIL: &[&str] = &["validUntil", "ValidUntil", "expiryDate", "ExpiryDate"];
const DELIVERY_DATE: &[&str] = &["deliveryDate", "DeliveryDate"];
const DELIVERY_ADDRESS: &[&str] = &["deliveryAddress", "DeliveryAddress"];
const NOTES: &[&str] = &["notes", "Notes", "comment", "Comment"];
const COUNTERPARTY: &[&str] = &[
    "client",
    "Client",
    "customer",
    "Customer",
    "supplier",
    "Supplier",
    "counterparty",
    "Counterparty",
];
const COUNTERPARTY_NAME: &[&str] = &[
    "counterpartyName",
    "clientName",
    "ClientName",
    "supplierName",
    "SupplierName",
];
const ITEMS: &[&str] = &["items", "Items", "lines", "Lines", "orderItems", "OrderItems"];
const TOTAL_NET: &[&str] = &["totalHT", "TotalHT", "totalNet", "TotalNet"];
const TOTAL_TAX: &[&str] = &["totalTVA", "TotalTVA", "totalTax", "TotalTax"];
const TOTAL_GROSS: &[&str] = &["totalTTC", "TotalTTC", "totalGross", "TotalGross"];

const PARTY_NAME: &[&str] = &["name", "Name", "companyName", "CompanyName"];
const PARTY_ADDRESS: &[&str] = &["address", "Address"];
const PARTY_CITY: &[&str] = &["city", "City"];
const PARTY_PHONE: &[&str] = &["phone", "Phone", "telephone", "Telephone"];
const PARTY_EMAIL: &[&str] = &["email", "Email"];
const PARTY_TAX_ID: &[&str] = &[
    "taxId",
    "TaxId",
    "matriculeFiscal",
    "MatriculeFiscal",
    "vatNumber",
    "VatNumber",
];

/// First alias present with a non-null value.
fn lookup<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

/// Coerce a JSON value to a finite number. Accepts numbers and numeric
/// strings with either decimal separator, grouped with spaces or not.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect::<String>()
            .parse::<f64>()
            .ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    lookup(obj, aliases).and_then(coerce_number)
}

fn string_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    lookup(obj, aliases).and_then(coerce_string)
}

fn nested_object<'a>(
    obj: &'a Map<String, Value>,
    aliases: &[&str],
) -> Option<&'a Map<String, Value>> {
    lookup(obj, aliases).and_then(Value::as_object)
}

/// Flatten a collection into an ordered sequence of records.
///
/// Arrays pass through, `$values` envelopes are unwrapped (recursively),
/// `null` is empty, and any other value is a one-element sequence.
pub fn unwrap_sequence(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get(ENVELOPE_KEY) {
            Some(inner) => unwrap_sequence(inner),
            None => vec![value],
        },
        other => vec![other],
    }
}

/// Normalize one item record. `position` is 1-based and only feeds the
/// placeholder designation when the record carries no id.
pub fn normalize_item(value: &Value, position: usize) -> LineItem {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);
    let product = nested_object(obj, NESTED_PRODUCT);

    let designation = string_field(obj, DESIGNATION)
        .or_else(|| product.and_then(|p| string_field(p, DESIGNATION)))
        .unwrap_or_else(|| {
            let id = string_field(obj, ITEM_ID)
                .or_else(|| product.and_then(|p| string_field(p, ITEM_ID)))
                .unwrap_or_else(|| position.to_string());
            format!("Product #{}", id)
        });

    LineItem::new(
        designation,
        number_field(obj, QUANTITY).unwrap_or(0.0),
        number_field(obj, UNIT_PRICE).unwrap_or(0.0),
        number_field(obj, DISCOUNT).unwrap_or(0.0),
        number_field(obj, TAX_RATE).unwrap_or(0.0),
    )
    .with_overrides(
        number_field(obj, LINE_NET),
        number_field(obj, LINE_TAX),
        number_field(obj, LINE_GROSS),
    )
}

/// Normalize an item collection in its original order.
pub fn normalize_items(value: &Value) -> Vec<LineItem> {
    unwrap_sequence(value)
        .into_iter()
        .enumerate()
        .map(|(i, item)| normalize_item(item, i + 1))
        .collect()
}

/// Normalize a party block (issuer or counterparty).
pub fn normalize_party(value: &Value) -> Party {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);
    Party {
        name: string_field(obj, PARTY_NAME).unwrap_or_default(),
        address: string_field(obj, PARTY_ADDRESS),
        city: string_field(obj, PARTY_CITY),
        phone: string_field(obj, PARTY_PHONE),
        email: string_field(obj, PARTY_EMAIL),
        tax_id: string_field(obj, PARTY_TAX_ID),
    }
}

/// Normalize a whole document. A non-object input yields an empty document.
pub fn normalize_document(value: &Value) -> Document {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let kind = string_field(obj, KIND)
        .and_then(|k| DocumentKind::from_name(&k))
        .unwrap_or_default();

    let mut counterparty = lookup(obj, COUNTERPARTY)
        .filter(|v| v.is_object())
        .map(normalize_party)
        .unwrap_or_default();
    if counterparty.name.is_empty() {
        if let Some(name) = string_field(obj, COUNTERPARTY_NAME) {
            counterparty.name = name;
        }
    }

    let items = lookup(obj, ITEMS).map(normalize_items).unwrap_or_default();

    Document {
        kind,
        reference: string_field(obj, REFERENCE).unwrap_or_default(),
        issue_date: string_field(obj, ISSUE_DATE).unwrap_or_default(),
        valid_until: string_field(obj, VALID_UNTIL),
        delivery_date: string_field(obj, DELIVERY_DATE),
        delivery_address: string_field(obj, DELIVERY_ADDRESS),
        notes: string_field(obj, NOTES),
        counterparty,
        items,
        external_totals: ExternalTotals {
            total_net: number_field(obj, TOTAL_NET),
            total_tax: number_field(obj, TOTAL_TAX),
            total_gross: number_field(obj, TOTAL_GROSS),
        },
    }
}
