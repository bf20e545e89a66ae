use tracing::{debug, warn};

use crate::error::RenderError;
use crate::layout::{Fit, PageLayout};

/// Where the paginator is in the page lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    /// Nothing laid out yet.
    Idle,
    /// A page was begun and its header drawn; no rows on it yet.
    HeaderDrawn,
    EmittingRows,
    /// The current page was finalized and a new one is being started.
    PageBreak,
    /// The totals block was drawn on the final page.
    FooterDrawn,
    /// Every page carries its "Page i/N" stamp.
    Done,
}

/// Drawing side of pagination.
///
/// The paginator decides what goes on which page and at which y (top-down,
/// from the page's top edge); the sink only draws. Every method is called in
/// page order, and `stamp_page_number` runs after the last `end_page`.
pub trait PageSink {
    fn begin_page(&mut self, page_no: usize) -> Result<(), RenderError>;

    /// Draw the fixed header block. Called identically for every page.
    fn draw_header(&mut self, page_no: usize) -> Result<(), RenderError>;

    /// Column titles above the first row of a page.
    fn draw_table_heading(&mut self, y: f64) -> Result<(), RenderError>;

    fn draw_row(&mut self, index: usize, y: f64) -> Result<(), RenderError>;

    /// Totals, per-rate breakdown and the trailing block, drawn once.
    fn draw_totals(&mut self, y: f64) -> Result<(), RenderError>;

    fn end_page(&mut self) -> Result<(), RenderError>;

    /// Second pass: re-open `page_no` and stamp it.
    fn stamp_page_number(&mut self, page_no: usize, page_count: usize)
        -> Result<(), RenderError>;
}

/// Heights of everything the paginator places, measured up front.
#[derive(Debug, Clone, Default)]
pub struct PageMetrics {
    pub heading_height: f64,
    pub row_heights: Vec<f64>,
    pub totals_height: f64,
}

/// Where everything ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page_count: usize,
    /// 1-based page of each row.
    pub row_pages: Vec<usize>,
    pub totals_page: usize,
}

pub struct Paginator<'a, S: PageSink> {
    sink: &'a mut S,
    layout: PageLayout,
    state: PaginatorState,
    page: usize,
}

impl<'a, S: PageSink> Paginator<'a, S> {
    pub fn new(sink: &'a mut S, layout: PageLayout) -> Self {
        Paginator {
            sink,
            layout,
            state: PaginatorState::Idle,
            page: 0,
        }
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Lay out all rows and the totals block, then stamp page numbers.
    pub fn run(&mut self, metrics: &PageMetrics) -> Result<Pagination, RenderError> {
        let mut row_pages = Vec::with_capacity(metrics.row_heights.len());
        self.start_page()?;

        for (index, &height) in metrics.row_heights.iter().enumerate() {
            self.ensure_heading(metrics.heading_height)?;
            match self.layout.fit_row(height) {
                Fit::Fits => {}
                Fit::PageFull => {
                    debug!(
                        page = self.page,
                        row = index,
                        cursor_y = self.layout.cursor_y(),
                        "Page break"
                    );
                    self.break_page()?;
                    self.ensure_heading(metrics.heading_height)?;
                }
                Fit::PageEmpty => {
                    warn!(row = index, height, "Row taller than a page, placing anyway");
                }
            }
            self.sink.draw_row(index, self.layout.cursor_y())?;
            self.layout.place(height);
            row_pages.push(self.page);
        }

        if self.layout.fit_block(metrics.totals_height) == Fit::PageFull {
            debug!(
                page = self.page,
                cursor_y = self.layout.cursor_y(),
                totals_height = metrics.totals_height,
                "Forced page break before totals"
            );
            self.break_page()?;
        }
        if self.layout.fit_block(metrics.totals_height) != Fit::Fits {
            warn!(
                totals_height = metrics.totals_height,
                "Totals block taller than a blank page"
            );
        }
        self.sink.draw_totals(self.layout.cursor_y())?;
        self.layout.place(metrics.totals_height);
        self.sink.end_page()?;
        self.state = PaginatorState::FooterDrawn;
        let totals_page = self.page;

        for page_no in 1..=self.page {
            self.sink.stamp_page_number(page_no, self.page)?;
        }
        self.state = PaginatorState::Done;
        debug!(page_count = self.page, "Pagination done");

        Ok(Pagination {
            page_count: self.page,
            row_pages,
            totals_page,
        })
    }

    fn start_page(&mut self) -> Result<(), RenderError> {
        self.page += 1;
        self.layout.reset();
        self.sink.begin_page(self.page)?;
        self.sink.draw_header(self.page)?;
        self.state = PaginatorState::HeaderDrawn;
        debug!(page = self.page, "Page begun");
        Ok(())
    }

    fn break_page(&mut self) -> Result<(), RenderError> {
        self.state = PaginatorState::PageBreak;
        self.sink.end_page()?;
        self.start_page()
    }

    /// Column titles go on a page right before its first row.
    fn ensure_heading(&mut self, heading_height: f64) -> Result<(), RenderError> {
        if self.state == PaginatorState::HeaderDrawn {
            self.sink.draw_table_heading(self.layout.cursor_y())?;
            self.layout.advance(heading_height);
            self.state = PaginatorState::EmittingRows;
        }
        Ok(())
    }
}
