use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Locale rules for every number printed on a document.
///
/// Passed into the renderer through [`RenderConfig`](crate::RenderConfig);
/// two documents rendered with different formats never interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub group_separator: char,
    /// Decimal places for monetary amounts.
    pub money_decimals: usize,
    /// Decimal places for discount and tax percentages.
    pub percent_decimals: usize,
    /// Appended after every monetary amount, separated by a space.
    pub currency_suffix: String,
    /// Printed instead of a percentage that is exactly zero.
    pub zero_marker: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            decimal_separator: ',',
            group_separator: ' ',
            money_decimals: 3,
            percent_decimals: 2,
            currency_suffix: "DT".to_string(),
            zero_marker: "\u{2014}".to_string(),
        }
    }
}

impl NumberFormat {
    /// Format a monetary amount: `1234.5` → `"1 234,500 DT"`.
    pub fn money(&self, amount: f64) -> String {
        let body = self.fixed(amount, self.money_decimals, true);
        if self.currency_suffix.is_empty() {
            body
        } else {
            format!("{} {}", body, self.currency_suffix)
        }
    }

    /// Format a percentage: `19.0` → `"19,00 %"`, `0.0` → `"—"`.
    pub fn percent(&self, value: f64) -> String {
        if !value.is_finite() || value == 0.0 {
            return self.zero_marker.clone();
        }
        format!("{} %", self.fixed(value, self.percent_decimals, false))
    }

    /// Format a quantity: whole numbers print bare, fractions keep up to
    /// three significant decimals with trailing zeros trimmed.
    pub fn quantity(&self, value: f64) -> String {
        let s = self.fixed(value, 3, false);
        match s.find(self.decimal_separator) {
            Some(_) => s
                .trim_end_matches('0')
                .trim_end_matches(self.decimal_separator)
                .to_string(),
            None => s,
        }
    }

    /// Fixed-point rendering, rounding half away from zero.
    fn fixed(&self, value: f64, decimals: usize, grouped: bool) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        let scale = 10u64.pow(decimals as u32);
        // Nudge absorbs binary noise such as 1.0005 * 1000 = 1000.4999...
        let units = (value.abs() * scale as f64 + 1e-7).round() as u64;
        let int_part = units / scale;
        let frac_part = units % scale;

        let mut out = String::new();
        if value < 0.0 && units > 0 {
            out.push('-');
        }
        if grouped {
            out.push_str(&group_digits(int_part, self.group_separator));
        } else {
            out.push_str(&int_part.to_string());
        }
        if decimals > 0 {
            out.push(self.decimal_separator);
            out.push_str(&format!("{:0width$}", frac_part, width = decimals));
        }
        out
    }
}

/// Insert `sep` between every group of three digits, counting from the right.
fn group_digits(n: u64, sep: char) -> String {
    let digits = n.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Print an ISO date or timestamp as `dd/mm/yyyy`. Anything unparseable is
/// returned verbatim.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%d/%m/%Y").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%d/%m/%Y").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%d/%m/%Y").to_string();
    }
    raw.to_string()
}
