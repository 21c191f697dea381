//! WinAnsi text encoding and text-showing operators

use crate::document::Color;
use crate::Align;

/// Map a character to its WinAnsiEncoding code
///
/// Latin-1 maps onto itself; the 0x80-0x9F block holds the typographic
/// extras (curly quotes, euro sign, oe ligature...). Anything else becomes `?`.
fn win_ansi_code(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        '\t' | '\n' | '\r' => b' ',
        _ => b'?',
    }
}

/// Encode text as WinAnsi bytes
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_code).collect()
}

/// Hex string operand for already-encoded bytes
pub(crate) fn hex_operand(codes: &[u8]) -> String {
    let mut hex = String::with_capacity(codes.len() * 2 + 2);
    hex.push('<');
    for code in codes {
        hex.push_str(&format!("{code:02X}"));
    }
    hex.push('>');
    hex
}

/// Encode text as a WinAnsi hex string operand (e.g., "<4869>")
pub fn encode_win_ansi_hex(text: &str) -> String {
    hex_operand(&encode_win_ansi(text))
}

/// One line of encoded text ready to be painted
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    /// Font resource name on the page, e.g. "F1"
    pub font_name: &'a str,
    pub font_size: f32,
    /// WinAnsi codes
    pub codes: &'a [u8],
    /// Advance width of `codes` in points
    pub width: f64,
    pub color: Color,
}

impl TextRun<'_> {
    /// Left edge of the run when it is anchored at `x`
    pub fn start_x(&self, x: f64, align: Align) -> f64 {
        match align {
            Align::Left => x,
            Align::Center => x - self.width / 2.0,
            Align::Right => x - self.width,
        }
    }

    /// `BT ... ET` block painting the run with its anchor at `(x, y)`
    pub fn operators(&self, x: f64, y: f64, align: Align) -> Vec<u8> {
        let Color { r, g, b } = self.color;
        format!(
            "BT\n{r} {g} {b} rg\n/{} {} Tf\n{} {y} Td\n{} Tj\nET\n",
            self.font_name,
            self.font_size,
            self.start_x(x, align),
            hex_operand(self.codes),
        )
        .into_bytes()
    }
}
