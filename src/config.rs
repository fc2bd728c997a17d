//! Export settings
//!
//! Defaults can be overridden from the environment; command-line flags win
//! over both.

use std::path::PathBuf;

use crate::date::DateStyle;
use crate::layout::{LayoutMode, PageDimensions};

/// Where and how the two papers are produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Directory the PDFs are written into
    pub output_dir: PathBuf,
    /// Paper size
    pub page_size: PageDimensions,
    /// Starting layout of the preview
    pub layout: LayoutMode,
    /// How resolved header dates are written
    pub date_style: DateStyle,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            page_size: PageDimensions::a4(),
            layout: LayoutMode::Vertical,
            date_style: DateStyle::Iso,
        }
    }
}

impl ExportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unknown or unparseable values fall back to the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();
        Self {
            output_dir: lookup("EXAM_PAPERS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output_dir),
            page_size: lookup("EXAM_PAPERS_PAGE_SIZE")
                .and_then(|v| PageDimensions::from_name(&v))
                .unwrap_or(default.page_size),
            layout: lookup("EXAM_PAPERS_LAYOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.layout),
            date_style: lookup("EXAM_PAPERS_DATE_STYLE")
                .and_then(|v| DateStyle::from_name(&v))
                .unwrap_or(default.date_style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ExportConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ExportConfig::default());
        assert_eq!(config.output_dir, PathBuf::from("exports"));
        assert_eq!(config.layout, LayoutMode::Vertical);
    }

    #[test]
    fn test_overrides() {
        let config = ExportConfig::from_lookup(lookup(&[
            ("EXAM_PAPERS_OUTPUT_DIR", "/tmp/papers"),
            ("EXAM_PAPERS_PAGE_SIZE", "letter"),
            ("EXAM_PAPERS_LAYOUT", "horizontal"),
            ("EXAM_PAPERS_DATE_STYLE", "long"),
        ]));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/papers"));
        assert_eq!(config.page_size, PageDimensions::letter());
        assert_eq!(config.layout, LayoutMode::Horizontal);
        assert_eq!(config.date_style, DateStyle::Long);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ExportConfig::from_lookup(lookup(&[
            ("EXAM_PAPERS_PAGE_SIZE", "tabloid"),
            ("EXAM_PAPERS_LAYOUT", "diagonal"),
        ]));
        assert_eq!(config.page_size, PageDimensions::a4());
        assert_eq!(config.layout, LayoutMode::Vertical);
    }
}
