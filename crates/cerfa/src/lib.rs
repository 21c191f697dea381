//! CERFA 13757 - mandate form filling
//!
//! This crate provides:
//! - The applicant record and its eleven optional slots
//! - Mapping of loosely-keyed upstream records onto that shape
//! - The overlay layout (coordinate table) as JSON configuration
//! - Overlay rendering and the native-field / overlay fill strategy
//!
//! # Example
//!
//! ```ignore
//! use cerfa::{map_record, CerfaFiller, FillStrategy, Layout};
//!
//! let raw: serde_json::Value = serde_json::from_str(body)?;
//! let record = map_record(raw.as_object().unwrap());
//! let filler = CerfaFiller::new(Layout::cerfa_13757()?, FillStrategy::AlwaysOverlay);
//! let outcome = filler.fill(Some(&template_bytes), &record)?;
//! ```

pub mod aliases;
pub mod filler;
pub mod layout;
pub mod mapper;
mod overlay;
mod record;

pub use filler::{blank_template, fill_named_fields, CerfaFiller, FillMethod, FillOutcome, FillStrategy};
pub use layout::{Layout, Origin, Placement, PostalCityLayout, StaticBlock, StaticContent};
pub use mapper::{map_record, raw_records, RawInboundRecord};
pub use overlay::render_overlay;
pub use record::{format_cp_ville, parse_cp_ville, ApplicantRecord, Slot};

use thiserror::Error;

/// Errors that can occur while filling a CERFA
#[derive(Debug, Error)]
pub enum CerfaError {
    #[error("Invalid layout: {0}")]
    LayoutError(String),

    #[error("Invalid input: {0}")]
    InputError(String),

    #[error("Unknown fill strategy: {0}")]
    UnknownStrategy(String),

    #[error("Render error: {0}")]
    RenderError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for CERFA operations
pub type Result<T> = std::result::Result<T, CerfaError>;
