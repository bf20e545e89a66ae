/// RGB color, each component in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// Header band and table heading fill.
    pub const BRAND: Color = Color::rgb(0.118, 0.227, 0.373);
    /// Secondary text (labels, footer).
    pub const MUTED: Color = Color::gray(0.45);
    /// Frame and separator strokes.
    pub const RULE: Color = Color::gray(0.75);
    /// Alternate item row background.
    pub const STRIPE: Color = Color::rgb(0.95, 0.97, 1.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    pub const fn gray(level: f64) -> Self {
        Color {
            r: level,
            g: level,
            b: level,
        }
    }
}
