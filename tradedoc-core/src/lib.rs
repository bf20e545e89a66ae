//! PDF rendering of commercial documents: quotes, purchase and sales orders,
//! delivery notes.
//!
//! Raw JSON is normalized into a [`Document`], line totals are computed,
//! grouped by tax rate and reconciled with any totals the upstream system
//! persisted, and the result is laid out over as many pages as needed.

pub mod calc;
pub mod config;
pub mod error;
pub mod format;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod paginate;
pub mod pdf;
pub mod render;
pub mod tax;
pub mod totals;

pub use calc::{compute, compute_all, LineComputation};
pub use config::{PageGeometry, RenderConfig};
pub use error::{ConfigError, ImageError, RenderError};
pub use format::{format_date, NumberFormat};
pub use model::{Document, DocumentKind, ExternalTotals, LineItem, Party};
pub use normalize::{normalize_document, normalize_item, normalize_items};
pub use paginate::{PageMetrics, PageSink, Pagination, Paginator, PaginatorState};
pub use pdf::document::PdfDocument;
pub use pdf::images::{resolve_logo, LogoImage};
pub use render::{render_document, render_json, RenderedDocument};
pub use tax::{aggregate, TaxAggregate, TaxBucket};
pub use totals::{reconcile, DocumentTotals};
