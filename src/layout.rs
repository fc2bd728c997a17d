//! Layout modes and page geometry
//!
//! The layout mode decides how question sections flow across the page. It is
//! a closed set: adding a mode means adding a variant and handling it in every
//! `match` below.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// Look up a named page size (`a4` or `letter`, case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Self::a4()),
            "letter" | "us-letter" => Some(Self::letter()),
            _ => None,
        }
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::a4()
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }
}

/// How question sections are arranged on a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// One section per row, stacked top to bottom
    #[default]
    Vertical,
    /// Sections wrap left to right, two per row
    Horizontal,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Vertical => "vertical",
            LayoutMode::Horizontal => "horizontal",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertical" => Ok(LayoutMode::Vertical),
            "horizontal" => Ok(LayoutMode::Horizontal),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}

/// Main axis of the section flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowDirection {
    Row,
    Column,
}

/// Whether sections wrap onto a new line when the main axis is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowWrap {
    NoWrap,
    Wrap,
}

/// Distribution of free space between sections on the main axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Justify {
    FlexStart,
    SpaceBetween,
}

/// Flow attributes for the question container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowStyle {
    pub direction: FlowDirection,
    pub wrap: FlowWrap,
    pub justify: Justify,
}

/// Flow attributes for a layout mode
pub fn flow_style(layout: LayoutMode) -> FlowStyle {
    match layout {
        LayoutMode::Vertical => FlowStyle {
            direction: FlowDirection::Column,
            wrap: FlowWrap::Wrap,
            justify: Justify::FlexStart,
        },
        LayoutMode::Horizontal => FlowStyle {
            direction: FlowDirection::Row,
            wrap: FlowWrap::Wrap,
            justify: Justify::SpaceBetween,
        },
    }
}

/// Share of the content width taken by one question section
pub const SECTION_WIDTH_RATIO: f64 = 0.48;

/// Where a question section sits within the content area
///
/// Offsets and widths are fractions of the content width, so the slot is
/// independent of the page size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionSlot {
    /// Row in flow order (one section per row when vertical)
    pub row: usize,
    /// Column within the row
    pub column: usize,
    /// Left edge as a fraction of the content width
    pub x: f64,
    /// Width as a fraction of the content width
    pub width: f64,
}

/// Slot for the section at `index` (zero-based)
pub fn section_slot(layout: LayoutMode, index: usize) -> SectionSlot {
    match layout {
        LayoutMode::Vertical => SectionSlot {
            row: index,
            column: 0,
            x: 0.0,
            width: SECTION_WIDTH_RATIO,
        },
        LayoutMode::Horizontal => {
            // Two 48% sections per row; space-between pushes the second one
            // against the right edge.
            let column = index % 2;
            SectionSlot {
                row: index / 2,
                column,
                x: column as f64 * (1.0 - SECTION_WIDTH_RATIO),
                width: SECTION_WIDTH_RATIO,
            }
        }
    }
}

/// Fixed measurements of the printed page
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub page: PageDimensions,
    /// Padding between the page edge and the content
    pub padding: Margins,
    /// Distance from the bottom edge to the footer text baseline area
    pub footer_bottom: Length,
    /// Horizontal inset of the footer from each side
    pub footer_inset: Length,
    /// Space between the footer rule and the footer text
    pub footer_rule_gap: Length,
    /// Space below the header block
    pub header_gap: Length,
    /// Space below each question section
    pub section_gap: Length,
}

impl PageGeometry {
    pub fn new(page: PageDimensions) -> Self {
        Self {
            page,
            padding: Margins::uniform(Length::from_pt(20.0)),
            footer_bottom: Length::from_pt(30.0),
            footer_inset: Length::from_pt(40.0),
            footer_rule_gap: Length::from_pt(10.0),
            header_gap: Length::from_pt(20.0),
            section_gap: Length::from_pt(10.0),
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(PageDimensions::a4())
    }
}

/// Content area in points, origin at the bottom-left of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ContentArea {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Calculate the area that flowing content may use without touching the footer
///
/// `footer_height` is the height of the footer band (text plus rule) measured
/// up from `geometry.footer_bottom`.
pub fn calculate_safe_area(geometry: &PageGeometry, footer_height: Length) -> ContentArea {
    let page = &geometry.page;
    let left = geometry.padding.left.pt();
    let right = page.width.pt() - geometry.padding.right.pt();
    let top = page.height.pt() - geometry.padding.top.pt();
    let footer_top = geometry.footer_bottom.pt() + footer_height.pt();
    let bottom = footer_top.max(geometry.padding.bottom.pt());

    ContentArea { left, top, right, bottom }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let len = Length::from_mm(25.4);
        assert!((len.pt() - 72.0).abs() < 0.01);

        let len = Length::from_pt(72.0);
        assert!((len.mm() - 25.4).abs() < 0.01);
    }

    #[test]
    fn test_a4_size() {
        let a4 = PageDimensions::a4();
        assert!((a4.width.pt() - 595.28).abs() < 0.01);
        assert!((a4.height.pt() - 841.89).abs() < 0.01);
        assert_eq!(PageDimensions::from_name("Letter"), Some(PageDimensions::letter()));
        assert_eq!(PageDimensions::from_name("legal"), None);
    }

    #[test]
    fn test_vertical_flow() {
        let style = flow_style(LayoutMode::Vertical);
        assert_eq!(style.direction, FlowDirection::Column);
        assert_eq!(style.wrap, FlowWrap::Wrap);
        assert_eq!(style.justify, Justify::FlexStart);
    }

    #[test]
    fn test_horizontal_flow() {
        let style = flow_style(LayoutMode::Horizontal);
        assert_eq!(style.direction, FlowDirection::Row);
        assert_eq!(style.wrap, FlowWrap::Wrap);
        assert_eq!(style.justify, Justify::SpaceBetween);
    }

    #[test]
    fn test_vertical_slots_stack() {
        for index in 0..5 {
            let slot = section_slot(LayoutMode::Vertical, index);
            assert_eq!(slot.row, index);
            assert_eq!(slot.column, 0);
            assert_eq!(slot.x, 0.0);
        }
    }

    #[test]
    fn test_horizontal_slots_pair_up() {
        let first = section_slot(LayoutMode::Horizontal, 0);
        let second = section_slot(LayoutMode::Horizontal, 1);
        let third = section_slot(LayoutMode::Horizontal, 2);

        assert_eq!((first.row, first.column), (0, 0));
        assert_eq!((second.row, second.column), (0, 1));
        assert_eq!((third.row, third.column), (1, 0));

        // Second section ends flush with the right edge
        assert!((second.x + second.width - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_layout() {
        assert_eq!("vertical".parse::<LayoutMode>().unwrap(), LayoutMode::Vertical);
        assert_eq!(" Horizontal ".parse::<LayoutMode>().unwrap(), LayoutMode::Horizontal);
        assert!(matches!("grid".parse::<LayoutMode>(), Err(Error::UnknownLayout(_))));
        assert_eq!(LayoutMode::default(), LayoutMode::Vertical);
    }

    #[test]
    fn test_calculate_safe_area() {
        let geometry = PageGeometry::default();
        let footer_height = Length::from_pt(22.0);

        let area = calculate_safe_area(&geometry, footer_height);

        assert!((area.left - 20.0).abs() < 1e-6);
        assert!((area.right - (geometry.page.width.pt() - 20.0)).abs() < 1e-6);
        assert!((area.top - (geometry.page.height.pt() - 20.0)).abs() < 1e-6);
        // Content stops above the footer band
        assert!((area.bottom - 52.0).abs() < 1e-6);
    }
}
