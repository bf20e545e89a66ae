use crate::pdf::fonts::Font;
use crate::pdf::graphics::Color;
use crate::pdf::writer::{encode_text, format_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct CellStyle {
    pub font: Font,
    pub font_size: f64,
    /// Applied to all four sides, in points.
    pub padding: f64,
    pub text_align: TextAlign,
    pub text_color: Color,
    pub background_color: Option<Color>,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            font: Font::Helvetica,
            font_size: 8.5,
            padding: 4.0,
            text_align: TextAlign::Left,
            text_color: Color::BLACK,
            background_color: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn styled(text: impl Into<String>, style: CellStyle) -> Self {
        Cell {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Behind the whole row; a cell's own background wins.
    pub background_color: Option<Color>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row {
            cells,
            background_color: None,
        }
    }

    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.background_color = color;
        self
    }
}

/// Column layout and border style. Holds no rows: each row is measured and
/// drawn on its own, so the paginator can decide placement one row at a time.
#[derive(Debug, Clone)]
pub struct Table {
    /// Column widths in points.
    pub columns: Vec<f64>,
    pub border_color: Color,
    /// `0.0` disables borders.
    pub border_width: f64,
}

impl Table {
    pub fn new(columns: Vec<f64>) -> Self {
        Table {
            columns,
            border_color: Color::RULE,
            border_width: 0.5,
        }
    }

    pub fn width(&self) -> f64 {
        self.columns.iter().sum()
    }

    /// Height of `row`: the tallest wrapped cell plus padding.
    pub fn row_height(&self, row: &Row) -> f64 {
        self.columns
            .iter()
            .zip(&row.cells)
            .map(|(&width, cell)| {
                let style = &cell.style;
                let lines = wrap_text(
                    &cell.text,
                    width - 2.0 * style.padding,
                    style.font,
                    style.font_size,
                )
                .len();
                lines as f64 * style.font.line_height(style.font_size) + 2.0 * style.padding
            })
            .fold(0.0_f64, f64::max)
    }

    /// Content-stream bytes for `row` with its top-left corner at `(x, top)`
    /// in PDF coordinates. Returns the bytes and the row height.
    pub fn row_ops(&self, row: &Row, x: f64, top: f64) -> (Vec<u8>, f64) {
        let height = self.row_height(row);
        let bottom = top - height;
        let mut out = Vec::new();

        if let Some(bg) = row.background_color {
            fill_rect(&mut out, bg, x, bottom, self.width(), height);
        }
        let mut col_x = x;
        for (&width, cell) in self.columns.iter().zip(&row.cells) {
            if let Some(bg) = cell.style.background_color {
                fill_rect(&mut out, bg, col_x, bottom, width, height);
            }
            render_cell(&mut out, cell, col_x, top, width);
            col_x += width;
        }
        if self.border_width > 0.0 {
            self.draw_borders(&mut out, x, top, height);
        }
        (out, height)
    }

    /// Outer rectangle plus vertical column dividers.
    fn draw_borders(&self, out: &mut Vec<u8>, x: f64, top: f64, height: f64) {
        let c = self.border_color;
        out.extend_from_slice(
            format!(
                "q\n{} {} {} RG\n{} w\n{} {} {} {} re\nS\n",
                format_number(c.r),
                format_number(c.g),
                format_number(c.b),
                format_number(self.border_width),
                format_number(x),
                format_number(top - height),
                format_number(self.width()),
                format_number(height),
            )
            .as_bytes(),
        );
        let mut col_x = x;
        for &width in &self.columns[..self.columns.len().saturating_sub(1)] {
            col_x += width;
            out.extend_from_slice(
                format!(
                    "{} {} m\n{} {} l\nS\n",
                    format_number(col_x),
                    format_number(top),
                    format_number(col_x),
                    format_number(top - height),
                )
                .as_bytes(),
            );
        }
        out.extend_from_slice(b"Q\n");
    }
}

fn fill_rect(out: &mut Vec<u8>, c: Color, x: f64, y: f64, w: f64, h: f64) {
    out.extend_from_slice(
        format!(
            "{} {} {} rg\n{} {} {} {} re\nf\n",
            format_number(c.r),
            format_number(c.g),
            format_number(c.b),
            format_number(x),
            format_number(y),
            format_number(w),
            format_number(h),
        )
        .as_bytes(),
    );
}

fn render_cell(out: &mut Vec<u8>, cell: &Cell, cell_x: f64, top: f64, width: f64) {
    let style = &cell.style;
    if cell.text.is_empty() {
        return;
    }
    let avail = (width - 2.0 * style.padding).max(0.0);
    let lh = style.font.line_height(style.font_size);
    // Baseline of the first line sits one font size below the padded top.
    let mut baseline = top - style.padding - style.font_size;

    let c = style.text_color;
    out.extend_from_slice(
        format!(
            "BT\n{} {} {} rg\n/{} {} Tf\n",
            format_number(c.r),
            format_number(c.g),
            format_number(c.b),
            style.font.resource_name(),
            format_number(style.font_size),
        )
        .as_bytes(),
    );
    for line in wrap_text(&cell.text, avail, style.font, style.font_size) {
        let line_w = style.font.measure(&line, style.font_size);
        let x = match style.text_align {
            TextAlign::Left => cell_x + style.padding,
            TextAlign::Right => cell_x + width - style.padding - line_w,
        };
        // Absolute positioning per line keeps alignment independent.
        out.extend_from_slice(
            format!("1 0 0 1 {} {} Tm\n(", format_number(x), format_number(baseline)).as_bytes(),
        );
        out.extend_from_slice(&encode_text(&line));
        out.extend_from_slice(b") Tj\n");
        baseline -= lh;
    }
    out.extend_from_slice(b"ET\n0 0 0 rg\n");
}

/// Greedy word wrap into lines no wider than `avail`. Words wider than a
/// whole line are broken between characters.
pub fn wrap_text(text: &str, avail: f64, font: Font, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for para in text.split('\n') {
        let mut current = String::new();
        for word in para.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if font.measure(&candidate, size) <= avail {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if font.measure(word, size) <= avail {
                current = word.to_string();
            } else {
                let mut pieces = break_word(word, avail, font, size);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Split an oversized word into pieces that each fit `avail`. Every piece
/// holds at least one character.
fn break_word(word: &str, avail: f64, font: Font, size: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut next = current.clone();
        next.push(ch);
        if !current.is_empty() && font.measure(&next, size) > avail {
            pieces.push(std::mem::replace(&mut current, ch.to_string()));
        } else {
            current = next;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> Cell {
        Cell::styled(text, CellStyle::default())
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("Ciment", 100.0, Font::Helvetica, 10.0), vec!["Ciment"]);
    }

    #[test]
    fn long_text_wraps_on_words() {
        let lines = wrap_text("aaa bbb ccc", 40.0, Font::Helvetica, 10.0);
        // "aaa bbb" = 6*5.56 + 2.78 = 36.14pt fits; adding " ccc" does not.
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn oversized_word_is_broken() {
        let lines = wrap_text("WWWWWWWWWW", 30.0, Font::Helvetica, 10.0);
        // W = 9.44pt, three per line.
        assert_eq!(lines, vec!["WWW", "WWW", "WWW", "W"]);
    }

    #[test]
    fn empty_text_is_one_blank_line() {
        assert_eq!(wrap_text("", 50.0, Font::Helvetica, 10.0), vec![""]);
    }

    #[test]
    fn explicit_newlines_split_lines() {
        assert_eq!(
            wrap_text("a\nb", 100.0, Font::Helvetica, 10.0),
            vec!["a", "b"]
        );
    }

    #[test]
    fn row_height_follows_tallest_cell() {
        let table = Table::new(vec![40.0, 100.0]);
        let one_line = table.row_height(&Row::new(vec![cell("x"), cell("y")]));
        let style = CellStyle::default();
        let expected = style.font.line_height(style.font_size) + 2.0 * style.padding;
        assert!((one_line - expected).abs() < 1e-9);

        let tall = table.row_height(&Row::new(vec![cell("aaa bbb ccc ddd"), cell("y")]));
        assert!(tall > one_line);
    }

    #[test]
    fn row_ops_draw_text_and_borders() {
        let table = Table::new(vec![100.0, 60.0]);
        let right = CellStyle {
            text_align: TextAlign::Right,
            ..CellStyle::default()
        };
        let row = Row::new(vec![cell("Vis"), Cell::styled("12", right)])
            .with_background(Some(Color::STRIPE));
        let (ops, height) = table.row_ops(&row, 40.0, 700.0);
        let out = String::from_utf8_lossy(&ops);
        assert!(height > 0.0);
        assert!(out.contains("(Vis) Tj"));
        assert!(out.contains("(12) Tj"));
        assert!(out.contains("0.95 0.97 1 rg\n40 "));
        assert!(out.contains(" re\nS\n"));
        // One divider between two columns.
        assert_eq!(out.matches(" m\n").count(), 1);
    }
}
