use serde::{Deserialize, Serialize};

/// Which commercial document is being printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    Quote,
    PurchaseOrder,
    SalesOrder,
    DeliveryNote,
}

impl DocumentKind {
    /// Title printed at the top of every page.
    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "DEVIS",
            DocumentKind::PurchaseOrder => "BON DE COMMANDE",
            DocumentKind::SalesOrder => "COMMANDE CLIENT",
            DocumentKind::DeliveryNote => "BON DE LIVRAISON",
        }
    }

    /// Label above the counterparty block.
    pub fn counterparty_label(&self) -> &'static str {
        match self {
            DocumentKind::PurchaseOrder => "Fournisseur",
            _ => "Client",
        }
    }

    /// Resolve a kind from the loose names upstream systems use.
    pub fn from_name(name: &str) -> Option<DocumentKind> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "quote" | "devis" => Some(DocumentKind::Quote),
            "purchaseorder" | "bc" => Some(DocumentKind::PurchaseOrder),
            "salesorder" | "commande" => Some(DocumentKind::SalesOrder),
            "deliverynote" | "bl" => Some(DocumentKind::DeliveryNote),
            _ => None,
        }
    }
}

/// A company or person printed in one of the header blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

impl Party {
    /// Non-empty lines of the block, name first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.name.is_empty() {
            lines.push(self.name.clone());
        }
        for part in [&self.address, &self.city].into_iter().flatten() {
            if !part.is_empty() {
                lines.push(part.clone());
            }
        }
        if let Some(phone) = self.phone.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("T\u{e9}l : {}", phone));
        }
        if let Some(email) = self.email.as_deref().filter(|s| !s.is_empty()) {
            lines.push(email.to_string());
        }
        if let Some(tax_id) = self.tax_id.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("MF : {}", tax_id));
        }
        lines
    }
}

/// One canonical line of a document, after normalization.
///
/// The four numeric inputs are always finite, and the two percentages are
/// never negative. The `line_*` overrides are only `Some` when the upstream
/// system shipped a finite pre-rounded value. Deserialization goes through
/// [`LineItem::new`], so typed input obeys the same rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawLineItem")]
pub struct LineItem {
    pub designation: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount_percent: f64,
    pub tax_rate_percent: f64,
    pub line_net: Option<f64>,
    pub line_tax: Option<f64>,
    pub line_gross: Option<f64>,
}

impl LineItem {
    /// Build a line from plain numbers, applying the coercion rules.
    pub fn new(
        designation: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        discount_percent: f64,
        tax_rate_percent: f64,
    ) -> Self {
        LineItem {
            designation: designation.into(),
            quantity: finite_or_zero(quantity).max(0.0),
            unit_price: finite_or_zero(unit_price).max(0.0),
            discount_percent: finite_or_zero(discount_percent).clamp(0.0, 100.0),
            tax_rate_percent: finite_or_zero(tax_rate_percent).max(0.0),
            line_net: None,
            line_tax: None,
            line_gross: None,
        }
    }

    /// Attach pre-computed line totals. Non-finite values are dropped.
    pub fn with_overrides(
        mut self,
        line_net: Option<f64>,
        line_tax: Option<f64>,
        line_gross: Option<f64>,
    ) -> Self {
        self.line_net = line_net.filter(|v| v.is_finite());
        self.line_tax = line_tax.filter(|v| v.is_finite());
        self.line_gross = line_gross.filter(|v| v.is_finite());
        self
    }

    /// Re-apply the coercion rules, for lines assembled field by field.
    pub fn coerced(&self) -> LineItem {
        LineItem::new(
            self.designation.clone(),
            self.quantity,
            self.unit_price,
            self.discount_percent,
            self.tax_rate_percent,
        )
        .with_overrides(self.line_net, self.line_tax, self.line_gross)
    }
}

/// Wire shape of [`LineItem`] before coercion.
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawLineItem {
    designation: String,
    quantity: f64,
    unit_price: f64,
    discount_percent: f64,
    tax_rate_percent: f64,
    line_net: Option<f64>,
    line_tax: Option<f64>,
    line_gross: Option<f64>,
}

impl From<RawLineItem> for LineItem {
    fn from(raw: RawLineItem) -> Self {
        LineItem::new(
            raw.designation,
            raw.quantity,
            raw.unit_price,
            raw.discount_percent,
            raw.tax_rate_percent,
        )
        .with_overrides(raw.line_net, raw.line_tax, raw.line_gross)
    }
}

/// Document totals persisted by the system of record, if any.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalTotals {
    pub total_net: Option<f64>,
    pub total_tax: Option<f64>,
    pub total_gross: Option<f64>,
}

/// The input to a render: header metadata plus canonical lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub kind: DocumentKind,
    pub reference: String,
    pub issue_date: String,
    pub valid_until: Option<String>,
    pub delivery_date: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub counterparty: Party,
    pub items: Vec<LineItem>,
    pub external_totals: ExternalTotals,
}

pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
