//! Exam Papers Library
//!
//! Composes an exam paper from a selected set of questions and exports it as
//! two PDFs: one for students without answers and one answer key.
//! This library provides functionality to:
//! - Load question collections from JSON
//! - Compose the page description for either variant
//! - Lay questions out vertically or in a two-column grid
//! - Render page descriptions to PDF
//! - Export both variants concurrently and deliver them under fixed names
//! - Hold the shared preview state the export is taken from
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use exam_papers::export::{DirectoryDelivery, Exporter};
//! use exam_papers::pdf::PdfRenderer;
//! use exam_papers::preview::PreviewHost;
//! use exam_papers::{fonts, question};
//!
//! # async fn run() -> exam_papers::Result<()> {
//! let questions = question::load_questions("selected.json".as_ref())?;
//! let host = PreviewHost::new(questions);
//! host.set_school_name("Lincoln High");
//! host.set_subject("Math");
//!
//! let exporter = Exporter::new(
//!     Arc::new(PdfRenderer::new(fonts::register())),
//!     Arc::new(DirectoryDelivery::new("exports")),
//! );
//! host.export(&exporter).await?.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod date;
pub mod document;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod logging;
pub mod pdf;
pub mod preview;
pub mod question;

// Re-export commonly used items
pub use document::{compose, PageDescription};
pub use error::{Error, Result};
pub use export::{ExportReport, ExportSnapshot, Exporter, Variant};
pub use layout::LayoutMode;
pub use preview::PreviewHost;
pub use question::{HeaderMetadata, Question};
