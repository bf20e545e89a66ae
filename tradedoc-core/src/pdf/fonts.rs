/// The three built-in faces the document layout uses. All are standard PDF
/// fonts, so nothing is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Helvetica, Font::HelveticaBold, Font::HelveticaOblique];

    /// Resource name used in content streams.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
            Font::HelveticaOblique => "F3",
        }
    }

    /// PDF `BaseFont` name.
    pub fn base_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    /// Width of `text` in points at `size`.
    pub fn measure(&self, text: &str, size: f64) -> f64 {
        let units: u32 = text.chars().map(|ch| self.char_width(ch) as u32).sum();
        units as f64 * size / 1000.0
    }

    /// Baseline-to-baseline distance.
    pub fn line_height(&self, size: f64) -> f64 {
        size * 1.2
    }

    /// Glyph advance in 1/1000 em (Adobe AFM metrics).
    pub fn char_width(&self, ch: char) -> u16 {
        let bold = matches!(self, Font::HelveticaBold);
        let ascii = match ch {
            ' '..='~' => ch,
            '\u{a0}' | '\u{202f}' => ' ',
            '\u{2014}' | '\u{2026}' => return 1000,
            '\u{2013}' | '\u{20ac}' | '\u{ab}' | '\u{bb}' => return 556,
            '\u{b0}' => return 400,
            '\u{2019}' | '\u{2018}' => return if bold { 278 } else { 222 },
            other => match base_letter(other) {
                Some(base) => base,
                None => return DEFAULT_WIDTH,
            },
        };
        let index = ascii as usize - 32;
        if bold {
            HELVETICA_BOLD_WIDTHS[index]
        } else {
            HELVETICA_WIDTHS[index]
        }
    }
}

/// Accented Latin letters share the advance of their base letter.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'À' | 'Â' | 'Ä' | 'Á' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'î' | 'ï' | 'í' => 'i',
        'Î' | 'Ï' | 'Í' => 'I',
        'ô' | 'ö' | 'ó' => 'o',
        'Ô' | 'Ö' | 'Ó' => 'O',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

/// Map a character to its byte in `WinAnsiEncoding`. Characters outside the
/// encoding print as `?`.
pub fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        ' '..='~' => ch as u8,
        '\u{202f}' | '\u{2009}' => 0xA0,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{2026}' => 0x85,
        '\u{152}' => 0x8C,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{153}' => 0x9C,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        _ => b'?',
    }
}

const DEFAULT_WIDTH: u16 = 278;

/// Helvetica advances for ASCII 32..=126, one row per 16 codes.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advances for ASCII 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
