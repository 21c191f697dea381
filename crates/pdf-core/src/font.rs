//! Standard (non-embedded) PDF fonts

use lopdf::{Dictionary, Object};

/// Helvetica advance widths for WinAnsi codes 0x20..=0x7E, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Width used for codes outside the printable ASCII range (accented letters mostly)
const HELVETICA_DEFAULT_WIDTH: u16 = 556;

/// One of the base-14 fonts every PDF reader ships with
///
/// These are referenced by name only, so nothing has to be embedded and
/// the text is encoded with `WinAnsiEncoding` (a Latin-1 superset that
/// covers French).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StandardFont {
    #[default]
    Helvetica,
    Courier,
}

impl StandardFont {
    /// PostScript base font name
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::Courier => "Courier",
        }
    }

    /// Parse a base font name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "helvetica" => Some(StandardFont::Helvetica),
            "courier" => Some(StandardFont::Courier),
            _ => None,
        }
    }

    /// Advance width of one WinAnsi code, in 1/1000 em
    fn code_width(self, code: u8) -> u16 {
        match self {
            StandardFont::Courier => 600,
            StandardFont::Helvetica => match code {
                0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
                0xA0 => 278,
                _ => HELVETICA_DEFAULT_WIDTH,
            },
        }
    }

    /// Width of already-encoded text in points
    pub fn encoded_width_points(self, codes: &[u8], font_size: f32) -> f64 {
        let units: u32 = codes.iter().map(|&c| self.code_width(c) as u32).sum();
        units as f64 * font_size as f64 / 1000.0
    }

    /// Font dictionary for the page Resources
    pub fn to_pdf_dictionary(self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Font".to_vec()));
        dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        dict.set("BaseFont", Object::Name(self.base_font().as_bytes().to_vec()));
        dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        dict
    }
}
