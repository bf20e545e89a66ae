use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::format::NumberFormat;
use crate::layout::{HEADER_HEIGHT, RESERVED_FOOTER_HEIGHT, SAFETY_MARGIN};
use crate::model::Party;

/// Page size and outer margin, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for PageGeometry {
    /// A4 portrait.
    fn default() -> Self {
        PageGeometry {
            width: 595.28,
            height: 841.89,
            margin: 40.0,
        }
    }
}

/// Everything the renderer needs besides the document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Printed top-left on every page.
    pub issuer: Party,
    pub page: PageGeometry,
    pub number_format: NumberFormat,
    /// Flate-compress page content streams.
    pub compress: bool,
    /// Legal line printed above the page number on every page.
    pub footer_note: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            issuer: Party::default(),
            page: PageGeometry::default(),
            number_format: NumberFormat::default(),
            compress: true,
            footer_note: None,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON config; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry the fixed layout cannot be drawn on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let page = &self.page;
        if !(page.width.is_finite() && page.width > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "page.width",
                reason: format!("must be a positive number, got {}", page.width),
            });
        }
        if !(page.height.is_finite() && page.height > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "page.height",
                reason: format!("must be a positive number, got {}", page.height),
            });
        }
        if !(page.margin.is_finite() && page.margin >= 0.0) || 2.0 * page.margin >= page.width {
            return Err(ConfigError::InvalidValue {
                field: "page.margin",
                reason: format!(
                    "must leave room for content on a {}pt wide page, got {}",
                    page.width, page.margin
                ),
            });
        }
        let min_height = page.margin + HEADER_HEIGHT + RESERVED_FOOTER_HEIGHT + SAFETY_MARGIN;
        if page.height <= min_height {
            return Err(ConfigError::InvalidValue {
                field: "page.height",
                reason: format!(
                    "must exceed {}pt to fit the header, rows and totals, got {}",
                    min_height, page.height
                ),
            });
        }
        if self.number_format.money_decimals > 6 || self.number_format.percent_decimals > 6 {
            return Err(ConfigError::InvalidValue {
                field: "number_format",
                reason: "at most 6 decimal places are supported".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_a4_french() {
        let config = RenderConfig::default();
        assert_eq!(config.page.width, 595.28);
        assert_eq!(config.number_format.money_decimals, 3);
        assert_eq!(config.number_format.currency_suffix, "DT");
        assert!(config.compress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RenderConfig::from_json_str(
            r#"{"issuer": {"name": "Atlas SARL", "tax_id": "1234567/A"}, "compress": false}"#,
        )
        .unwrap();
        assert_eq!(config.issuer.name, "Atlas SARL");
        assert!(!config.compress);
        assert_eq!(config.page, PageGeometry::default());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            RenderConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn margin_wider_than_page_is_rejected() {
        let err = RenderConfig::from_json_str(r#"{"page": {"margin": 400}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "page.margin", .. }));
    }

    #[test]
    fn negative_height_is_rejected() {
        let mut config = RenderConfig::default();
        config.page.height = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn height_without_room_for_rows_is_rejected() {
        let mut config = RenderConfig::default();
        config.page.height = 420.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "page.height", .. })
        ));

        // A5 portrait still leaves a band for rows.
        config.page = PageGeometry { width: 419.53, height: 595.28, margin: 40.0 };
        assert!(config.validate().is_ok());
    }
}
