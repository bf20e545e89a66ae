use crate::config::PageGeometry;

/// Height of the header block (frame, title, party blocks, reference box)
/// below the top margin.
pub const HEADER_HEIGHT: f64 = 160.0;

/// Space kept free at the bottom of every page, measured from the page edge.
/// Sized so the totals block, the per-rate breakdown, the signature area and
/// the page-number band always fit after the last row.
pub const RESERVED_FOOTER_HEIGHT: f64 = 290.0;

/// Slack between the last row of a page and the reserved footer.
pub const SAFETY_MARGIN: f64 = 10.0;

/// Band above the bottom margin holding the footer note and "Page i/N".
pub const PAGE_NUMBER_BAND: f64 = 24.0;

/// Outcome of asking whether a block fits below the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Place it here.
    Fits,
    /// The page already holds content; start a new page.
    PageFull,
    /// Nothing is on the page yet and it still does not fit. Placing it
    /// anyway is the only way forward.
    PageEmpty,
}

/// Vertical bookkeeping for one render.
///
/// Coordinates run top-down from the page's top edge; the renderer converts
/// to PDF's bottom-up space when drawing.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    cursor_y: f64,
    /// Nothing has been placed below the header on this page yet.
    fresh: bool,
}

impl PageLayout {
    pub fn new(geometry: &PageGeometry) -> Self {
        let mut layout = PageLayout {
            page_width: geometry.width,
            page_height: geometry.height,
            margin: geometry.margin,
            cursor_y: 0.0,
            fresh: true,
        };
        layout.reset();
        layout
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    /// First y below the header block.
    pub fn content_top(&self) -> f64 {
        self.margin + HEADER_HEIGHT
    }

    /// Rows must end above this y.
    pub fn rows_limit(&self) -> f64 {
        self.page_height - RESERVED_FOOTER_HEIGHT - SAFETY_MARGIN
    }

    /// The totals block must end above this y.
    pub fn block_limit(&self) -> f64 {
        self.page_height - self.margin - PAGE_NUMBER_BAND
    }

    /// Baseline of the "Page i/N" stamp.
    pub fn page_number_y(&self) -> f64 {
        self.page_height - self.margin - 6.0
    }

    pub fn cursor_y(&self) -> f64 {
        self.cursor_y
    }

    /// Move the cursor back under the header of a new page.
    pub fn reset(&mut self) {
        self.cursor_y = self.content_top();
        self.fresh = true;
    }

    /// Move down by `height` after something was drawn at the cursor. The
    /// table heading advances without marking the page as used.
    pub fn advance(&mut self, height: f64) {
        self.cursor_y += height;
    }

    /// Like [`advance`](Self::advance), for content that counts as placed.
    pub fn place(&mut self, height: f64) {
        self.cursor_y += height;
        self.fresh = false;
    }

    pub fn fit_row(&self, height: f64) -> Fit {
        self.fit(height, self.rows_limit())
    }

    pub fn fit_block(&self, height: f64) -> Fit {
        self.fit(height, self.block_limit())
    }

    fn fit(&self, height: f64, limit: f64) -> Fit {
        if self.cursor_y + height <= limit {
            Fit::Fits
        } else if self.fresh {
            Fit::PageEmpty
        } else {
            Fit::PageFull
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> PageLayout {
        PageLayout::new(&PageGeometry::default())
    }

    #[test]
    fn cursor_starts_below_header() {
        let layout = a4();
        assert_eq!(layout.cursor_y(), 40.0 + HEADER_HEIGHT);
        assert!((layout.content_width() - 515.28).abs() < 1e-9);
    }

    #[test]
    fn reserved_footer_leaves_room_for_totals() {
        let layout = a4();
        // Space guaranteed between the last possible row and the block limit.
        let guaranteed = layout.block_limit() - layout.rows_limit();
        assert!(guaranteed >= 230.0, "only {guaranteed}pt after rows");
    }

    #[test]
    fn fit_row_reports_full_page() {
        let mut layout = a4();
        assert_eq!(layout.fit_row(20.0), Fit::Fits);
        layout.place(layout.rows_limit() - layout.cursor_y() - 5.0);
        assert_eq!(layout.fit_row(20.0), Fit::PageFull);
    }

    #[test]
    fn oversized_block_on_fresh_page_is_page_empty() {
        let mut layout = a4();
        layout.advance(18.0);
        assert_eq!(layout.fit_block(5000.0), Fit::PageEmpty);
        layout.reset();
        layout.place(1.0);
        assert_eq!(layout.fit_block(5000.0), Fit::PageFull);
    }
}
