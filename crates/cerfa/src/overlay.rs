//! Overlay rendering

use crate::layout::{format_date, Layout, Placement, StaticContent};
use crate::{parse_cp_ville, ApplicantRecord, Result, Slot};
use chrono::NaiveDate;
use pdf_core::PdfDocument;
use tracing::{debug, info};

/// Draw a record on a transparent page sized by the layout
///
/// Populated slots are drawn at their placements, absent ones are skipped.
/// Static blocks are always drawn, dates use `today`. The result is a
/// valid one-page PDF even when nothing is drawn.
pub fn render_overlay(record: &ApplicantRecord, layout: &Layout, today: NaiveDate) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::blank(layout.page_size.width, layout.page_size.height)?;
    doc.set_text_color(layout.font.color.into());

    let mut painter = Painter {
        doc: &mut doc,
        layout,
        drawn: 0,
    };

    for (slot, value) in record.populated() {
        match (slot, &layout.postal_city) {
            (Slot::CpVille, Some(postal_city)) => {
                let (code, city) = parse_cp_ville(value);
                painter.draw(code, &postal_city.code)?;
                painter.draw(city, &postal_city.city)?;
                if let Some(country) = &postal_city.country {
                    painter.draw(&country.text, &country.at)?;
                }
            }
            _ => match layout.placement(slot) {
                Some(placement) => {
                    debug!(field = %slot, x = placement.x, y = placement.y, "drawing field");
                    painter.draw(value, placement)?;
                }
                None => debug!(field = %slot, "no placement for field"),
            },
        }
    }

    for block in &layout.statics {
        let text = match &block.content {
            StaticContent::Text { text } => text.clone(),
            StaticContent::Date { format } => format_date(today, format)?,
        };
        painter.draw(&text, &block.at)?;
    }

    let drawn = painter.drawn;
    info!(layout = %layout.name, drawn, "overlay rendered");
    Ok(doc.to_bytes()?)
}

struct Painter<'a> {
    doc: &'a mut PdfDocument,
    layout: &'a Layout,
    drawn: usize,
}

impl Painter<'_> {
    fn draw(&mut self, text: &str, placement: &Placement) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let size = placement.size.unwrap_or(self.layout.font.size);
        self.doc.set_font(self.layout.standard_font(), size);
        self.doc.insert_text(
            text,
            1,
            placement.x,
            self.layout.pdf_y(placement.y),
            placement.align.into(),
        )?;
        self.drawn += 1;
        Ok(())
    }
}
