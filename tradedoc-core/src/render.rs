use serde_json::Value;
use tracing::info;

use crate::calc::{compute_all, LineComputation};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::format::{format_date, NumberFormat};
use crate::layout::{PageLayout, HEADER_HEIGHT};
use crate::model::{Document, DocumentKind, LineItem, Party};
use crate::normalize::normalize_document;
use crate::paginate::{PageMetrics, PageSink, Paginator};
use crate::pdf::document::{ImageId, PdfDocument};
use crate::pdf::fonts::Font;
use crate::pdf::graphics::Color;
use crate::pdf::images::LogoImage;
use crate::pdf::table::{wrap_text, Cell, CellStyle, Row, Table, TextAlign};
use crate::tax::{aggregate, TaxBucket};
use crate::totals::{reconcile, DocumentTotals};

/// Inner padding of the page frame.
const PAD: f64 = 8.0;
const LOGO_MAX_W: f64 = 120.0;
const LOGO_MAX_H: f64 = 50.0;
/// Width of the reference and counterparty boxes.
const BOX_WIDTH: f64 = 210.0;
const REFERENCE_BOX_HEIGHT: f64 = 46.0;
const COUNTERPARTY_BOX_HEIGHT: f64 = 64.0;
const COUNTERPARTY_MAX_LINES: usize = 5;
const COUNTERPARTY_LINE: f64 = 10.0;
const COUNTERPARTY_FONT_SIZE: f64 = 8.0;
const COUNTERPARTY_NAME_LINES: usize = 2;

const TOTALS_WIDTH: f64 = 230.0;
const TOTALS_LINE: f64 = 15.0;
const NET_DUE_HEIGHT: f64 = 22.0;
const BLOCK_GAP: f64 = 12.0;
const TEXT_LINE: f64 = 12.0;
const SIGNATURE_HEIGHT: f64 = 60.0;

/// Share of the content width for designation, quantity, unit price,
/// discount, tax rate and line total.
const COLUMN_SHARES: [f64; 6] = [0.40, 0.09, 0.15, 0.09, 0.09, 0.18];
const COLUMN_TITLES: [&str; 6] = ["Désignation", "Qté", "P.U. HT", "Remise", "TVA", "Total TTC"];
const BREAKDOWN_COLUMNS: [f64; 3] = [60.0, 90.0, 90.0];
const BREAKDOWN_TITLES: [&str; 3] = ["Taux", "Base HT", "Montant TVA"];
const NO_ITEMS_MARKER: &str = "Aucun article";

/// Output of a render: the PDF plus the figures printed on it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub totals: DocumentTotals,
    /// Ascending by rate, as printed in the breakdown.
    pub buckets: Vec<TaxBucket>,
    pub page_count: usize,
}

/// Normalize a raw JSON document, then render it.
pub fn render_json(
    value: &Value,
    config: &RenderConfig,
    logo: Option<&LogoImage>,
) -> Result<RenderedDocument, RenderError> {
    let document = normalize_document(value);
    render_document(&document, config, logo)
}

/// Compute totals and lay the document out into PDF pages.
///
/// The logo, when given, must already be decoded; it is embedded once and
/// drawn in every page header.
pub fn render_document(
    document: &Document,
    config: &RenderConfig,
    logo: Option<&LogoImage>,
) -> Result<RenderedDocument, RenderError> {
    config.validate()?;

    let document = &Document {
        items: document.items.iter().map(LineItem::coerced).collect(),
        ..document.clone()
    };
    let computations = compute_all(&document.items);
    let agg = aggregate(&computations, &document.items);
    let totals = reconcile(&agg, &document.external_totals);

    let mut pdf = PdfDocument::new(Vec::new())?;
    pdf.set_compression(config.compress);
    pdf.set_info("Title", &document_title(document));
    pdf.set_info("Creator", concat!("tradedoc ", env!("CARGO_PKG_VERSION")));
    let logo = logo.map(|image| {
        let (width, height) = image.fit_within(LOGO_MAX_W, LOGO_MAX_H);
        PlacedLogo {
            id: pdf.add_image(image),
            width,
            height,
        }
    });

    let layout = PageLayout::new(&config.page);
    let mut renderer = PageRenderer::new(
        pdf,
        layout.clone(),
        document,
        config,
        &computations,
        &agg.buckets,
        totals,
        logo,
    );
    let metrics = renderer.metrics();
    let pagination = Paginator::new(&mut renderer, layout).run(&metrics)?;
    let bytes = renderer.finish()?;

    info!(
        kind = ?document.kind,
        reference = %document.reference,
        items = document.items.len(),
        pages = pagination.page_count,
        bytes = bytes.len(),
        "Document rendered"
    );

    Ok(RenderedDocument {
        bytes,
        totals,
        buckets: agg.buckets,
        page_count: pagination.page_count,
    })
}

/// `Title` entry of the PDF info dictionary.
fn document_title(document: &Document) -> String {
    let title = document.kind.title();
    if document.reference.is_empty() {
        title.to_string()
    } else {
        format!("{} {}", title, document.reference)
    }
}

#[derive(Debug, Clone, Copy)]
struct PlacedLogo {
    id: ImageId,
    width: f64,
    height: f64,
}

/// Draws one document onto PDF pages as the paginator directs.
///
/// Every y handed in by the paginator is measured down from the top edge of
/// the page; drawing converts it to PDF space.
struct PageRenderer<'a> {
    pdf: PdfDocument<Vec<u8>>,
    layout: PageLayout,
    document: &'a Document,
    config: &'a RenderConfig,
    buckets: &'a [TaxBucket],
    totals: DocumentTotals,
    logo: Option<PlacedLogo>,
    items_table: Table,
    heading: Row,
    rows: Vec<Row>,
    breakdown: Table,
}

impl<'a> PageRenderer<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        pdf: PdfDocument<Vec<u8>>,
        layout: PageLayout,
        document: &'a Document,
        config: &'a RenderConfig,
        computations: &[LineComputation],
        buckets: &'a [TaxBucket],
        totals: DocumentTotals,
        logo: Option<PlacedLogo>,
    ) -> Self {
        let content_width = layout.content_width();
        let fmt = &config.number_format;
        let rows = if document.items.is_empty() {
            vec![no_items_row()]
        } else {
            document
                .items
                .iter()
                .zip(computations)
                .enumerate()
                .map(|(i, (item, line))| item_row(fmt, item, line, i))
                .collect()
        };
        PageRenderer {
            pdf,
            layout,
            document,
            config,
            buckets,
            totals,
            logo,
            items_table: Table::new(COLUMN_SHARES.iter().map(|s| s * content_width).collect()),
            heading: heading_row(&COLUMN_TITLES),
            rows,
            breakdown: Table::new(BREAKDOWN_COLUMNS.to_vec()),
        }
    }

    fn metrics(&self) -> PageMetrics {
        PageMetrics {
            heading_height: self.items_table.row_height(&self.heading),
            row_heights: self
                .rows
                .iter()
                .map(|row| self.items_table.row_height(row))
                .collect(),
            totals_height: self.totals_height(),
        }
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.pdf.end_document()
    }

    fn left(&self) -> f64 {
        self.layout.margin
    }

    fn right(&self) -> f64 {
        self.layout.page_width - self.layout.margin
    }

    /// Text with its baseline `baseline` points below the top edge.
    fn text(&mut self, s: &str, x: f64, baseline: f64, font: Font, size: f64, color: Color) {
        let y = self.layout.page_height - baseline;
        self.pdf
            .save_state()
            .set_fill_color(color)
            .place_text(s, x, y, font, size)
            .restore_state();
    }

    fn text_right(&mut self, s: &str, right: f64, baseline: f64, font: Font, size: f64, color: Color) {
        let y = self.layout.page_height - baseline;
        self.pdf
            .save_state()
            .set_fill_color(color)
            .place_text_right(s, right, y, font, size)
            .restore_state();
    }

    /// Stroked box whose top-left corner is `top` below the top edge.
    fn outline(&mut self, x: f64, top: f64, w: f64, h: f64, line_width: f64) {
        let y = self.layout.page_height - top - h;
        self.pdf
            .save_state()
            .set_stroke_color(Color::RULE)
            .set_line_width(line_width)
            .rect(x, y, w, h)
            .stroke()
            .restore_state();
    }

    fn draw_issuer(&mut self, top: f64) {
        let left = self.left() + PAD;
        let mut y = top + PAD;
        if let Some(logo) = self.logo {
            let bottom = self.layout.page_height - y - logo.height;
            self.pdf.draw_image(logo.id, left, bottom, logo.width, logo.height);
            y += logo.height + 6.0;
        }
        for (i, line) in self.config.issuer.lines().iter().enumerate() {
            if i == 0 {
                y += 11.0;
                self.text(line, left, y, Font::HelveticaBold, 11.0, Color::BRAND);
            } else {
                y += 10.0;
                self.text(line, left, y, Font::Helvetica, 8.0, Color::MUTED);
            }
        }
    }

    /// Reference, date and the kind-specific date in a box under the title.
    fn draw_reference_box(&mut self, top: f64) {
        let document = self.document;
        let box_left = self.right() - PAD - BOX_WIDTH;
        self.outline(box_left, top, BOX_WIDTH, REFERENCE_BOX_HEIGHT, 0.5);

        let mut entries = vec![
            ("N° :", document.reference.clone()),
            ("Date :", format_date(&document.issue_date)),
        ];
        match document.kind {
            DocumentKind::Quote => {
                if let Some(date) = &document.valid_until {
                    entries.push(("Validité :", format_date(date)));
                }
            }
            DocumentKind::DeliveryNote => {
                if let Some(date) = &document.delivery_date {
                    entries.push(("Livraison :", format_date(date)));
                }
            }
            DocumentKind::PurchaseOrder | DocumentKind::SalesOrder => {}
        }

        let mut baseline = top + 4.0;
        for (label, value) in entries {
            baseline += TEXT_LINE;
            self.text(label, box_left + 6.0, baseline, Font::HelveticaBold, 8.5, Color::MUTED);
            self.text(&value, box_left + 62.0, baseline, Font::Helvetica, 8.5, Color::BLACK);
        }
    }

    fn draw_counterparty_box(&mut self, top: f64) {
        let document = self.document;
        let box_left = self.right() - PAD - BOX_WIDTH;
        self.outline(box_left, top, BOX_WIDTH, COUNTERPARTY_BOX_HEIGHT, 0.5);

        let x = box_left + 6.0;
        let mut baseline = top + 11.0;
        self.text(
            document.kind.counterparty_label(),
            x,
            baseline,
            Font::HelveticaBold,
            8.0,
            Color::MUTED,
        );
        for (line, bold) in counterparty_lines(&document.counterparty, BOX_WIDTH - 12.0) {
            baseline += COUNTERPARTY_LINE;
            let font = if bold { Font::HelveticaBold } else { Font::Helvetica };
            self.text(&line, x, baseline, font, COUNTERPARTY_FONT_SIZE, Color::BLACK);
        }
    }

    fn breakdown_rows(&self) -> Vec<Row> {
        let fmt = &self.config.number_format;
        let right = |text: String| Cell::styled(text, cell_style(Font::Helvetica, TextAlign::Right));
        let mut rows = vec![heading_row(&BREAKDOWN_TITLES)];
        for bucket in self.buckets {
            rows.push(Row::new(vec![
                Cell::styled(fmt.percent(bucket.rate_percent), cell_style(Font::Helvetica, TextAlign::Left)),
                right(fmt.money(bucket.net)),
                right(fmt.money(bucket.tax)),
            ]));
        }
        rows
    }

    fn breakdown_height(&self) -> f64 {
        self.breakdown_rows()
            .iter()
            .map(|row| self.breakdown.row_height(row))
            .sum()
    }

    fn summary_height(&self) -> f64 {
        let lines = 5.0 * TOTALS_LINE + 2.0 + NET_DUE_HEIGHT;
        lines.max(self.breakdown_height())
    }

    fn notes_lines(&self) -> Vec<String> {
        match self.document.notes.as_deref() {
            Some(notes) if !notes.trim().is_empty() => wrap_text(
                notes,
                self.layout.content_width() - 2.0 * PAD,
                Font::Helvetica,
                8.5,
            ),
            _ => Vec::new(),
        }
    }

    fn notes_height(&self) -> f64 {
        match self.notes_lines().len() {
            0 => 0.0,
            n => BLOCK_GAP + TEXT_LINE * (n + 1) as f64,
        }
    }

    /// Delivery date and address lines printed above delivery signatures.
    fn delivery_lines(&self) -> Vec<String> {
        let document = self.document;
        let mut lines = Vec::new();
        if let Some(date) = &document.delivery_date {
            lines.push(format!("Date de livraison : {}", format_date(date)));
        }
        if let Some(address) = &document.delivery_address {
            lines.push(format!("Adresse de livraison : {}", address));
        }
        lines
    }

    fn trailing_height(&self) -> f64 {
        match self.document.kind {
            DocumentKind::Quote => match self.document.valid_until {
                Some(_) => BLOCK_GAP + TEXT_LINE,
                None => 0.0,
            },
            DocumentKind::DeliveryNote => {
                BLOCK_GAP + TEXT_LINE * self.delivery_lines().len() as f64 + 4.0 + SIGNATURE_HEIGHT
            }
            DocumentKind::PurchaseOrder | DocumentKind::SalesOrder => BLOCK_GAP + SIGNATURE_HEIGHT,
        }
    }

    /// Height of everything `draw_totals` draws.
    fn totals_height(&self) -> f64 {
        BLOCK_GAP + self.summary_height() + self.notes_height() + self.trailing_height()
    }

    fn draw_summary(&mut self, top: f64) {
        let totals = self.totals;
        let config = self.config;
        let fmt = &config.number_format;
        let right = self.right();
        let left = right - TOTALS_WIDTH;

        let discount_label = if totals.average_discount_percent > 0.0 {
            format!("Remise ({})", fmt.percent(totals.average_discount_percent))
        } else {
            "Remise".to_string()
        };
        let lines = [
            ("Total HT brut", totals.total_gross_before_discount),
            (discount_label.as_str(), totals.total_discount),
            ("Total HT", totals.total_net),
            ("TVA", totals.total_tax),
            ("Total TTC", totals.total_gross),
        ];
        let mut baseline = top;
        for (label, amount) in lines {
            baseline += TOTALS_LINE;
            self.text(label, left + 6.0, baseline - 4.0, Font::Helvetica, 9.0, Color::BLACK);
            self.text_right(&fmt.money(amount), right - 6.0, baseline - 4.0, Font::Helvetica, 9.0, Color::BLACK);
        }
        self.outline(left, top, TOTALS_WIDTH, 5.0 * TOTALS_LINE, 0.5);

        let box_top = top + 5.0 * TOTALS_LINE + 2.0;
        let y = self.layout.page_height - box_top - NET_DUE_HEIGHT;
        self.pdf
            .save_state()
            .set_fill_color(Color::BRAND)
            .rect(left, y, TOTALS_WIDTH, NET_DUE_HEIGHT)
            .fill()
            .restore_state();
        let baseline = box_top + 15.0;
        self.text("Net à payer", left + 6.0, baseline, Font::HelveticaBold, 10.0, Color::WHITE);
        self.text_right(
            &fmt.money(totals.total_gross),
            right - 6.0,
            baseline,
            Font::HelveticaBold,
            10.0,
            Color::WHITE,
        );
    }

    fn draw_notes(&mut self, top: f64) -> f64 {
        let lines = self.notes_lines();
        if lines.is_empty() {
            return top;
        }
        let x = self.left() + PAD;
        let mut baseline = top + BLOCK_GAP + 9.0;
        self.text("Observations", x, baseline, Font::HelveticaBold, 8.5, Color::MUTED);
        for line in &lines {
            baseline += TEXT_LINE;
            self.text(line, x, baseline, Font::Helvetica, 8.5, Color::BLACK);
        }
        top + self.notes_height()
    }

    fn signature_box(&mut self, label: &str, x: f64, top: f64, width: f64) {
        self.outline(x, top, width, SIGNATURE_HEIGHT, 0.5);
        self.text(label, x + 6.0, top + 11.0, Font::HelveticaBold, 8.0, Color::MUTED);
    }

    fn draw_trailing(&mut self, top: f64) {
        let document = self.document;
        let left = self.left();
        let right = self.right();
        let mut y = top + BLOCK_GAP;
        match document.kind {
            DocumentKind::Quote => {
                if let Some(date) = &document.valid_until {
                    let line = format!("Valable jusqu'au {}", format_date(date));
                    self.text(&line, left + PAD, y + 9.0, Font::HelveticaOblique, 9.0, Color::BLACK);
                }
            }
            DocumentKind::DeliveryNote => {
                for line in self.delivery_lines() {
                    self.text(&line, left + PAD, y + 9.0, Font::Helvetica, 9.0, Color::BLACK);
                    y += TEXT_LINE;
                }
                y += 4.0;
                let width = (right - left - 3.0 * PAD) / 2.0;
                self.signature_box("Signature livreur", left + PAD, y, width);
                self.signature_box("Signature client", left + 2.0 * PAD + width, y, width);
            }
            DocumentKind::PurchaseOrder | DocumentKind::SalesOrder => {
                self.signature_box("Cachet et signature", right - PAD - BOX_WIDTH, y, BOX_WIDTH);
            }
        }
    }
}

impl PageSink for PageRenderer<'_> {
    fn begin_page(&mut self, _page_no: usize) -> Result<(), RenderError> {
        self.pdf
            .begin_page(self.layout.page_width, self.layout.page_height);
        Ok(())
    }

    fn draw_header(&mut self, _page_no: usize) -> Result<(), RenderError> {
        let top = self.layout.margin;
        let frame_height = self.layout.page_height - 2.0 * self.layout.margin;
        let frame_width = self.layout.content_width();
        self.outline(self.left(), top, frame_width, frame_height, 0.75);

        self.draw_issuer(top);
        let right = self.right() - PAD;
        self.text_right(
            self.document.kind.title(),
            right,
            top + PAD + 16.0,
            Font::HelveticaBold,
            16.0,
            Color::BRAND,
        );
        let reference_top = top + PAD + 26.0;
        self.draw_reference_box(reference_top);
        let counterparty_top = reference_top + REFERENCE_BOX_HEIGHT + 8.0;
        debug_assert!(counterparty_top + COUNTERPARTY_BOX_HEIGHT <= top + HEADER_HEIGHT);
        self.draw_counterparty_box(counterparty_top);
        Ok(())
    }

    fn draw_table_heading(&mut self, y: f64) -> Result<(), RenderError> {
        let left = self.left();
        let page_height = self.layout.page_height;
        place_row(&mut self.pdf, page_height, &self.items_table, &self.heading, left, y);
        Ok(())
    }

    fn draw_row(&mut self, index: usize, y: f64) -> Result<(), RenderError> {
        let left = self.left();
        let page_height = self.layout.page_height;
        if let Some(row) = self.rows.get(index) {
            place_row(&mut self.pdf, page_height, &self.items_table, row, left, y);
        }
        Ok(())
    }

    fn draw_totals(&mut self, y: f64) -> Result<(), RenderError> {
        let top = y + BLOCK_GAP;
        let left = self.left();
        let page_height = self.layout.page_height;
        let mut row_top = top;
        for row in self.breakdown_rows() {
            row_top += place_row(&mut self.pdf, page_height, &self.breakdown, &row, left, row_top);
        }
        self.draw_summary(top);
        let after_notes = self.draw_notes(top + self.summary_height());
        self.draw_trailing(after_notes);
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), RenderError> {
        self.pdf.end_page()
    }

    fn stamp_page_number(&mut self, page_no: usize, page_count: usize) -> Result<(), RenderError> {
        let config = self.config;
        self.pdf.open_page(page_no)?;
        let baseline = self.layout.page_number_y();
        if let Some(note) = config.footer_note.as_deref().filter(|n| !n.is_empty()) {
            self.text(note, self.left() + PAD, baseline - 9.0, Font::Helvetica, 7.0, Color::MUTED);
        }
        let stamp = format!("Page {}/{}", page_no, page_count);
        self.text_right(&stamp, self.right() - PAD, baseline, Font::Helvetica, 8.0, Color::MUTED);
        self.pdf.end_page()
    }
}

/// Draw `row` of `table` with its top edge `top` below the page's top edge.
/// Returns the row height.
fn place_row(
    pdf: &mut PdfDocument<Vec<u8>>,
    page_height: f64,
    table: &Table,
    row: &Row,
    x: f64,
    top: f64,
) -> f64 {
    let (ops, height) = table.row_ops(row, x, page_height - top);
    pdf.raw_ops(&ops);
    height
}

fn cell_style(font: Font, text_align: TextAlign) -> CellStyle {
    CellStyle {
        font,
        text_align,
        ..CellStyle::default()
    }
}

/// White bold titles on the brand band; the first column is left-aligned.
fn heading_row(titles: &[&str]) -> Row {
    let cells = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let align = if i == 0 {
                TextAlign::Left
            } else {
                TextAlign::Right
            };
            Cell::styled(
                *title,
                CellStyle {
                    text_color: Color::WHITE,
                    ..cell_style(Font::HelveticaBold, align)
                },
            )
        })
        .collect();
    Row::new(cells).with_background(Some(Color::BRAND))
}

fn item_row(fmt: &NumberFormat, item: &LineItem, line: &LineComputation, index: usize) -> Row {
    let right = |text: String| Cell::styled(text, cell_style(Font::Helvetica, TextAlign::Right));
    Row::new(vec![
        Cell::styled(
            item.designation.clone(),
            cell_style(Font::Helvetica, TextAlign::Left),
        ),
        right(fmt.quantity(item.quantity)),
        right(fmt.money(item.unit_price)),
        right(fmt.percent(item.discount_percent)),
        right(fmt.percent(item.tax_rate_percent)),
        right(fmt.money(line.gross_after_tax)),
    ])
    .with_background((index % 2 == 1).then_some(Color::STRIPE))
}

/// Stands in for the item table when a document has no lines.
/// Lines of the counterparty box, wrapped to `avail` points, paired with
/// whether they print bold. The tax id comes before the contact details so
/// it survives when the box runs out of lines.
fn counterparty_lines(party: &Party, avail: f64) -> Vec<(String, bool)> {
    let mut lines: Vec<(String, bool)> =
        wrap_text(&party.name, avail, Font::HelveticaBold, COUNTERPARTY_FONT_SIZE)
            .into_iter()
            .filter(|l| !l.is_empty())
            .take(COUNTERPARTY_NAME_LINES)
            .map(|l| (l, true))
            .collect();

    let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
    let location: Vec<String> = [non_empty(&party.address), non_empty(&party.city)]
        .into_iter()
        .flatten()
        .collect();
    let contact: Vec<String> = [
        non_empty(&party.phone).map(|p| format!("T\u{e9}l : {}", p)),
        non_empty(&party.email),
    ]
    .into_iter()
    .flatten()
    .collect();
    let details = [
        (!location.is_empty()).then(|| location.join(", ")),
        non_empty(&party.tax_id).map(|t| format!("MF : {}", t)),
        (!contact.is_empty()).then(|| contact.join(" / ")),
    ];
    for detail in details.into_iter().flatten() {
        for line in wrap_text(&detail, avail, Font::Helvetica, COUNTERPARTY_FONT_SIZE) {
            lines.push((line, false));
        }
    }
    lines.truncate(COUNTERPARTY_MAX_LINES);
    lines
}

fn no_items_row() -> Row {
    let mut cells = vec![Cell::styled(
        NO_ITEMS_MARKER,
        CellStyle {
            text_color: Color::MUTED,
            ..cell_style(Font::HelveticaOblique, TextAlign::Left)
        },
    )];
    cells.extend((1..COLUMN_SHARES.len()).map(|_| Cell::styled("", CellStyle::default())));
    Row::new(cells)
}
