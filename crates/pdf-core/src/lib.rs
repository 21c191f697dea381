//! Byte-in, byte-out PDF operations on top of `lopdf`
//!
//! - [`PdfDocument`]: blank pages and positioned text in a base-14 font
//! - [`inspect_form_fields`] / [`fill_form_fields`]: AcroForm read and write
//! - [`merge_overlay`]: paint the first page of one PDF over page 1 of another
//!
//! ```ignore
//! let mut overlay = PdfDocument::blank(A4_WIDTH, A4_HEIGHT)?;
//! overlay.set_font(StandardFont::Helvetica, 10.0);
//! overlay.insert_text("Jean Dupont", 1, 268.0, 684.0, Align::Left)?;
//! let filled = merge_overlay(&template, &overlay.to_bytes()?)?;
//! ```

mod document;
mod font;
pub mod forms;
pub mod merge;
mod objects;
mod text;

pub use document::{Color, PdfDocument, A4_HEIGHT, A4_WIDTH};
pub use font::StandardFont;
pub use forms::{fill_form_fields, inspect_form_fields, FieldDescriptor, FilledForm, FormInspection};
pub use merge::merge_overlay;
pub use objects::{decode_text_string, encode_text_string};
pub use text::{encode_win_ansi, encode_win_ansi_hex, TextRun};

use thiserror::Error;

/// Failures of the PDF layer
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Document has no pages")]
    NoPages,

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Horizontal anchoring of a text run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
