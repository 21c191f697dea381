//! Overlay layout (coordinate table) JSON schema

use crate::{CerfaError, Result, Slot};
use chrono::NaiveDate;
use pdf_core::{Align, Color, StandardFont, A4_HEIGHT, A4_WIDTH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Layout of the CERFA 13757 mandate, compiled in
pub const CERFA_13757_LAYOUT: &str = include_str!("../data/cerfa-13757.json");

/// Where text goes on the overlay page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout {
    /// Layout identifier (used in logs)
    pub name: String,

    /// Heading printed on the generated blank template
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub page_size: PageSize,

    /// Corner the coordinates are measured from
    #[serde(default)]
    pub origin: Origin,

    #[serde(default)]
    pub font: FontSpec,

    /// Slot wire name -> placement
    #[serde(default)]
    pub fields: BTreeMap<String, Placement>,

    /// Split placement of `cp_ville`; takes precedence over `fields.cp_ville`
    #[serde(default)]
    pub postal_city: Option<PostalCityLayout>,

    /// Text drawn on every overlay regardless of the record
    #[serde(default)]
    pub statics: Vec<StaticBlock>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// PDF native: y grows upwards from the bottom edge
    #[default]
    BottomLeft,
    /// Screen style: y grows downwards from the top edge
    TopLeft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default = "default_font_family")]
    pub family: String,
    #[serde(default = "default_font_size")]
    pub size: f32,
    #[serde(default)]
    pub color: RgbColor,
}

fn default_font_family() -> String {
    StandardFont::Helvetica.base_font().to_string()
}

fn default_font_size() -> f32 {
    10.0
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: default_font_family(),
            size: default_font_size(),
            color: RgbColor::default(),
        }
    }
}

/// RGB color, components 0.0 - 1.0
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl From<RgbColor> for Color {
    fn from(c: RgbColor) -> Self {
        Color::rgb(c.r, c.g, c.b)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl From<TextAlign> for Align {
    fn from(a: TextAlign) -> Self {
        match a {
            TextAlign::Left => Align::Left,
            TextAlign::Center => Align::Center,
            TextAlign::Right => Align::Right,
        }
    }
}

/// Anchor point of one piece of text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub align: TextAlign,
    /// Overrides the layout font size
    #[serde(default)]
    pub size: Option<f32>,
}

impl Placement {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            align: TextAlign::Left,
            size: None,
        }
    }
}

/// `cp_ville` drawn as two pieces plus a country
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostalCityLayout {
    pub code: Placement,
    pub city: Placement,
    #[serde(default)]
    pub country: Option<CountryLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryLabel {
    #[serde(default = "default_country")]
    pub text: String,
    #[serde(flatten)]
    pub at: Placement,
}

fn default_country() -> String {
    "France".to_string()
}

/// Canned text not taken from the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticBlock {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(flatten)]
    pub content: StaticContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StaticContent {
    /// Fixed text, e.g. the place of signature
    Text { text: String },
    /// The rendering day, as a chrono format string (e.g. `%d/%m/%Y`)
    Date { format: String },
}

impl Layout {
    /// The built-in CERFA 13757 layout
    pub fn cerfa_13757() -> Result<Self> {
        Self::from_json(CERFA_13757_LAYOUT)
    }

    /// Parse and validate a layout
    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Layout =
            serde_json::from_str(json).map_err(|e| CerfaError::LayoutError(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check everything rendering relies on
    pub fn validate(&self) -> Result<()> {
        let PageSize { width, height } = self.page_size;
        if !(width > 0.0 && height > 0.0) {
            return Err(CerfaError::LayoutError(format!(
                "page size must be positive, got {width}x{height}"
            )));
        }
        if StandardFont::from_name(&self.font.family).is_none() {
            return Err(CerfaError::LayoutError(format!(
                "unsupported font '{}' (expected Helvetica or Courier)",
                self.font.family
            )));
        }
        check_size(self.font.size, "font")?;

        for (name, placement) in &self.fields {
            if Slot::from_name(name).is_none() {
                return Err(CerfaError::LayoutError(format!("unknown field '{name}'")));
            }
            self.check_placement(placement, name)?;
        }

        if let Some(postal_city) = &self.postal_city {
            self.check_placement(&postal_city.code, "postal_city.code")?;
            self.check_placement(&postal_city.city, "postal_city.city")?;
            if let Some(country) = &postal_city.country {
                self.check_placement(&country.at, "postal_city.country")?;
            }
        }

        for (i, block) in self.statics.iter().enumerate() {
            let label = format!("statics[{i}]");
            self.check_placement(&block.at, &label)?;
            if let StaticContent::Date { format } = &block.content {
                format_date(NaiveDate::default(), format)
                    .map_err(|e| CerfaError::LayoutError(format!("{label}: {e}")))?;
            }
        }

        Ok(())
    }

    fn check_placement(&self, placement: &Placement, label: &str) -> Result<()> {
        let inside_x = (0.0..=self.page_size.width).contains(&placement.x);
        let inside_y = (0.0..=self.page_size.height).contains(&placement.y);
        if !(inside_x && inside_y) {
            return Err(CerfaError::LayoutError(format!(
                "{label}: ({}, {}) is outside the page",
                placement.x, placement.y
            )));
        }
        if let Some(size) = placement.size {
            check_size(size, label)?;
        }
        Ok(())
    }

    /// The layout font (validated at load time)
    pub fn standard_font(&self) -> StandardFont {
        StandardFont::from_name(&self.font.family).unwrap_or_default()
    }

    /// Placement of a slot drawn as a single string
    pub fn placement(&self, slot: Slot) -> Option<&Placement> {
        self.fields.get(slot.as_str())
    }

    /// Convert a layout `y` into PDF space
    pub fn pdf_y(&self, y: f64) -> f64 {
        match self.origin {
            Origin::BottomLeft => y,
            Origin::TopLeft => self.page_size.height - y,
        }
    }
}

fn check_size(size: f32, label: &str) -> Result<()> {
    if size > 0.0 && size.is_finite() {
        Ok(())
    } else {
        Err(CerfaError::LayoutError(format!(
            "{label}: font size must be positive, got {size}"
        )))
    }
}

/// Render `date` with a strftime `format`
///
/// Time and zone specifiers have nothing to render from a date and are
/// reported as an error, as are malformed specifiers.
pub(crate) fn format_date(date: NaiveDate, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| CerfaError::LayoutError(format!("invalid date format '{format}'")))?;
    Ok(out)
}
