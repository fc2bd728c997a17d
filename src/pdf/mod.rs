//! PDF output

pub mod metadata;
pub mod render;

// Re-export commonly used items
pub use metadata::{
    count_pages, extract_metadata, extract_metadata_from_file, page_contents, PdfMetadata,
};
pub use render::PdfRenderer;
