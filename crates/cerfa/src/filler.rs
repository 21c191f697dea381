//! Fill strategy: native form fields or overlay

use crate::aliases::slot_for_field_name;
use crate::{render_overlay, ApplicantRecord, CerfaError, Layout, Result};
use chrono::{Local, NaiveDate};
use pdf_core::{fill_form_fields, inspect_form_fields, merge_overlay, Align, PdfDocument, StandardFont};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Font size of the heading on a generated template
const TITLE_FONT_SIZE: f32 = 14.0;
/// Distance of the heading baseline from the top edge
const TITLE_TOP_MARGIN: f64 = 50.0;

/// How a request picks between native fields and the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillStrategy {
    /// Always draw the overlay, even on documents with form fields
    #[default]
    AlwaysOverlay,
    /// Inspect first; fill native fields when the document has any
    PreferNativeFields,
    /// Try native fields straight away, overlay when nothing matched
    NativeWithFallback,
}

impl FillStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            FillStrategy::AlwaysOverlay => "always_overlay",
            FillStrategy::PreferNativeFields => "prefer_native_fields",
            FillStrategy::NativeWithFallback => "native_with_fallback",
        }
    }
}

impl FromStr for FillStrategy {
    type Err = CerfaError;

    /// Accepts snake_case or kebab-case, in any case
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "always_overlay" => Ok(FillStrategy::AlwaysOverlay),
            "prefer_native_fields" => Ok(FillStrategy::PreferNativeFields),
            "native_with_fallback" => Ok(FillStrategy::NativeWithFallback),
            _ => Err(CerfaError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path that produced the filled document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMethod {
    Overlay,
    NativeFields,
}

impl FillMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            FillMethod::Overlay => "overlay",
            FillMethod::NativeFields => "native-fields",
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub pdf: Vec<u8>,
    pub method: FillMethod,
}

/// Write the record into the document's own form fields
///
/// A field is filled when its name (trimmed, any case) is one of the
/// spellings of a populated slot. When no field matches, the record is
/// drawn as an overlay instead, so the caller always gets a filled
/// document back.
pub fn fill_named_fields(
    pdf: &[u8],
    record: &ApplicantRecord,
    layout: &Layout,
    today: NaiveDate,
) -> Result<FillOutcome> {
    let filled = fill_form_fields(pdf, |field_name| {
        slot_for_field_name(field_name)
            .and_then(|slot| record.get(slot))
            .map(str::to_string)
    })?;

    if filled.matched.is_empty() {
        info!("no form field matched, falling back to overlay");
        return overlay_and_merge(pdf, record, layout, today);
    }

    info!(fields = ?filled.matched, "filled native form fields");
    Ok(FillOutcome {
        pdf: filled.pdf,
        method: FillMethod::NativeFields,
    })
}

fn overlay_and_merge(
    pdf: &[u8],
    record: &ApplicantRecord,
    layout: &Layout,
    today: NaiveDate,
) -> Result<FillOutcome> {
    let overlay = render_overlay(record, layout, today)?;
    let merged = merge_overlay(pdf, &overlay)?;
    Ok(FillOutcome {
        pdf: merged,
        method: FillMethod::Overlay,
    })
}

/// Stand-in template: one blank page of the layout size with its title
pub fn blank_template(layout: &Layout) -> Result<Vec<u8>> {
    let width = layout.page_size.width;
    let height = layout.page_size.height;
    let mut doc = PdfDocument::blank(width, height)?;

    if let Some(title) = &layout.title {
        doc.set_font(StandardFont::Helvetica, TITLE_FONT_SIZE);
        doc.insert_text(title, 1, width / 2.0, height - TITLE_TOP_MARGIN, Align::Center)?;
    }

    Ok(doc.to_bytes()?)
}

/// Fills CERFA documents with a fixed layout and strategy
///
/// Holds no per-request state, so one instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct CerfaFiller {
    layout: Layout,
    strategy: FillStrategy,
    template: Option<Vec<u8>>,
}

impl CerfaFiller {
    pub fn new(layout: Layout, strategy: FillStrategy) -> Self {
        Self {
            layout,
            strategy,
            template: None,
        }
    }

    /// Template used when a request does not upload one
    pub fn with_template(mut self, template: Vec<u8>) -> Self {
        self.template = Some(template);
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn strategy(&self) -> FillStrategy {
        self.strategy
    }

    /// Fill `upload` (or the default template) with today's date
    pub fn fill(&self, upload: Option<&[u8]>, record: &ApplicantRecord) -> Result<FillOutcome> {
        self.fill_on(upload, record, Local::now().date_naive())
    }

    /// Fill with an explicit signature date
    pub fn fill_on(
        &self,
        upload: Option<&[u8]>,
        record: &ApplicantRecord,
        today: NaiveDate,
    ) -> Result<FillOutcome> {
        let template: Cow<'_, [u8]> = match (upload, &self.template) {
            (Some(bytes), _) => Cow::Borrowed(bytes),
            (None, Some(bytes)) => Cow::Borrowed(bytes.as_slice()),
            (None, None) => {
                debug!(layout = %self.layout.name, "generating blank template");
                Cow::Owned(blank_template(&self.layout)?)
            }
        };

        let outcome = match self.strategy {
            FillStrategy::AlwaysOverlay => {
                overlay_and_merge(&template, record, &self.layout, today)?
            }
            FillStrategy::PreferNativeFields => {
                let inspection = inspect_form_fields(&template);
                if inspection.has_fields {
                    debug!(count = inspection.count, "document has form fields");
                    fill_named_fields(&template, record, &self.layout, today)?
                } else {
                    overlay_and_merge(&template, record, &self.layout, today)?
                }
            }
            FillStrategy::NativeWithFallback => {
                fill_named_fields(&template, record, &self.layout, today)?
            }
        };

        info!(
            strategy = %self.strategy,
            method = %outcome.method,
            bytes = outcome.pdf.len(),
            "CERFA filled"
        );
        Ok(outcome)
    }
}
