//! Error types for the exam papers library

use std::path::PathBuf;
use thiserror::Error;

use crate::export::Variant;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the exam papers library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Question file could not be parsed
    #[error("Invalid question data: {0}")]
    Json(#[from] serde_json::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Date parsing error
    #[error("Invalid date expression: {0}")]
    InvalidDateExpression(String),

    /// Unknown layout name
    #[error("Unknown layout: {0} (expected \"vertical\" or \"horizontal\")")]
    UnknownLayout(String),

    /// A question carries more options than can be lettered A-Z
    #[error("Question {question_id} has {count} options; at most 26 can be lettered")]
    TooManyOptions { question_id: String, count: usize },

    /// The rendering engine failed for one variant
    #[error("Rendering {variant} failed: {message}")]
    Render { variant: Variant, message: String },

    /// Handing an artifact to the delivery target failed
    #[error("Delivering {filename} failed: {message}")]
    Delivery { filename: String, message: String },

    /// The export was abandoned before delivery
    #[error("Export cancelled")]
    Cancelled,

    /// One or both variants were not delivered
    #[error("Export incomplete: {0}")]
    ExportIncomplete(String),

    /// General error
    #[error("{0}")]
    General(String),
}
