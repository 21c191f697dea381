//! PDF Document wrapper

use crate::objects::{catalog, resolve_dict};
use crate::text::{encode_win_ansi, TextRun};
use crate::{Align, PdfError, Result, StandardFont};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// A4 width in points
pub const A4_WIDTH: f64 = 595.28;
/// A4 height in points
pub const A4_HEIGHT: f64 = 841.89;

/// Parent chains deeper than this are considered malformed
const MAX_PARENT_DEPTH: usize = 10;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// PDF Document wrapper providing high-level operations
///
/// Text is drawn with one of the standard PDF fonts. Content operators are
/// buffered per page and written in a single stream when the document is
/// serialized with [`PdfDocument::to_bytes`].
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Current font
    current_font: StandardFont,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Font objects already added to the document
    font_objects: HashMap<StandardFont, ObjectId>,
    /// Page font resources (page number -> font -> resource name)
    page_font_resources: HashMap<usize, HashMap<StandardFont, String>>,
    /// Next font resource number
    next_font_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            current_font: StandardFont::default(),
            current_font_size: 10.0,
            current_text_color: Color::default(),
            font_objects: HashMap::new(),
            page_font_resources: HashMap::new(),
            next_font_resource: 1,
            page_content_buffer: HashMap::new(),
        }
    }

    /// Create a new document holding one blank page of the given size
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::blank(A4_WIDTH, A4_HEIGHT)?;
    /// assert_eq!(doc.page_count(), 1);
    /// ```
    pub fn blank(width: f64, height: f64) -> Result<Self> {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.new_object_id();
        inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => Object::Integer(0),
            }),
        );
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        let mut doc = Self::from_document(inner);
        doc.add_blank_page(width, height)?;
        Ok(doc)
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Set the current font and size
    pub fn set_font(&mut self, font: StandardFont, size: f32) {
        self.current_font = font;
        self.current_font_size = size;
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate in points (PDF space, from the bottom edge)
    /// * `align` - Text alignment relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        if text.is_empty() {
            return Ok(());
        }

        let codes = encode_win_ansi(text);
        let text_width = self
            .current_font
            .encoded_width_points(&codes, self.current_font_size);

        let font_resource_name = self.get_or_create_font_ref(page)?;

        let run = TextRun {
            font_name: &font_resource_name,
            font_size: self.current_font_size,
            codes: &codes,
            width: text_width,
            color: self.current_text_color,
        };
        let operators = run.operators(x, y, align);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;
        self.finalize_page_font_resources()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Object id of a page (1-indexed)
    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Page size `(width, height)` in points
    ///
    /// Reads the MediaBox (or CropBox), following the parent chain for
    /// inherited boxes. Falls back to A4 when none is found.
    #[cfg(test)]
    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;
        let media_box = media_box(&self.inner, page_id)?;
        Ok((media_box[2] - media_box[0], media_box[3] - media_box[1]))
    }

    /// Append a blank page of the given size and return its page number
    fn add_blank_page(&mut self, width: f64, height: f64) -> Result<usize> {
        let contents_id = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), vec![])));

        let page_count = self.page_count();

        let (_, catalog_dict) = catalog(&self.inner)?;
        let pages_id = catalog_dict
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages reference".to_string()))?;

        let new_page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        });

        let pages_dict = self
            .inner
            .get_object_mut(pages_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;

        let mut kids = match pages_dict.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => Vec::new(),
        };
        kids.push(Object::Reference(new_page_id));
        let count = kids.len() as i64;

        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(count));

        Ok(page_count + 1)
    }

    /// Get or create the resource name of the current font on a page
    ///
    /// Returns the resource name (e.g., "F1") used in content streams. Names
    /// already present in the page's resources are skipped.
    fn get_or_create_font_ref(&mut self, page: usize) -> Result<String> {
        if let Some(name) = self
            .page_font_resources
            .get(&page)
            .and_then(|fonts| fonts.get(&self.current_font))
        {
            return Ok(name.clone());
        }

        let page_id = self.page_id(page)?;
        let existing = effective_resources(&self.inner, page_id)?;
        let existing_fonts = sub_dictionary(&self.inner, &existing, b"Font");

        let resource_name = loop {
            let candidate = format!("F{}", self.next_font_resource);
            self.next_font_resource += 1;
            if !existing_fonts.has(candidate.as_bytes()) {
                break candidate;
            }
        };

        self.page_font_resources
            .entry(page)
            .or_default()
            .insert(self.current_font, resource_name.clone());

        Ok(resource_name)
    }

    /// Add font references to the Resources of every page that uses them
    fn finalize_page_font_resources(&mut self) -> Result<()> {
        let page_resources: Vec<(usize, Vec<(StandardFont, String)>)> = self
            .page_font_resources
            .iter()
            .map(|(&page, fonts)| {
                let font_list = fonts
                    .iter()
                    .map(|(font, resource_name)| (*font, resource_name.clone()))
                    .collect();
                (page, font_list)
            })
            .collect();

        for (page, fonts) in page_resources {
            let page_id = self.page_id(page)?;
            let mut resources = effective_resources(&self.inner, page_id)?;
            let mut font_dict = sub_dictionary(&self.inner, &resources, b"Font");

            for (font, resource_name) in fonts {
                let font_id = match self.font_objects.get(&font) {
                    Some(id) => *id,
                    None => {
                        let id = self.inner.add_object(font.to_pdf_dictionary());
                        self.font_objects.insert(font, id);
                        id
                    }
                };
                font_dict.set(resource_name.as_bytes(), Object::Reference(font_id));
            }

            resources.set("Font", Object::Dictionary(font_dict));
            set_page_entry(&mut self.inner, page_id, "Resources", Object::Dictionary(resources))?;
        }

        Ok(())
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    ///
    /// Reads each page's existing content, appends the buffered operators and
    /// writes a single new stream object per page.
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();

        for (page, content) in buffers {
            if content.is_empty() {
                continue;
            }
            let page_id = self.page_id(page)?;
            let mut new_content = read_page_content(&self.inner, page_id)?;
            if !new_content.is_empty() && !new_content.ends_with(b"\n") {
                new_content.push(b'\n');
            }
            new_content.extend_from_slice(&content);
            replace_page_content(&mut self.inner, page_id, new_content)?;
        }

        Ok(())
    }
}

/// MediaBox `[x1, y1, x2, y2]`, following the parent inheritance chain
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4]> {
    let mut current_id = page_id;

    for _ in 0..MAX_PARENT_DEPTH {
        let dict = doc
            .get_object(current_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

        if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
            let values = crate::objects::resolve_array(doc, media_box)?;
            if values.len() < 4 {
                return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
            }
            let mut out = [0.0; 4];
            for (slot, value) in out.iter_mut().zip(values.iter()) {
                *slot = number(value)
                    .ok_or_else(|| PdfError::ParseError("Invalid MediaBox value".to_string()))?;
            }
            return Ok(out);
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => break,
        }
    }

    Ok([0.0, 0.0, A4_WIDTH, A4_HEIGHT])
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Resources dictionary in effect for a page (own, referenced or inherited)
pub(crate) fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut current_id = page_id;

    for _ in 0..MAX_PARENT_DEPTH {
        let dict = doc
            .get_object(current_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

        if let Ok(resources) = dict.get(b"Resources") {
            return Ok(resolve_dict(doc, resources)?.clone());
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => break,
        }
    }

    Ok(Dictionary::new())
}

/// A sub-dictionary of Resources (Font, XObject...), resolved and cloned
pub(crate) fn sub_dictionary(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    resources
        .get(key)
        .ok()
        .and_then(|obj| resolve_dict(doc, obj).ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

pub(crate) fn set_page_entry(
    doc: &mut Document,
    page_id: ObjectId,
    key: &str,
    value: Object,
) -> Result<()> {
    doc.get_object_mut(page_id)?
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
        .set(key, value);
    Ok(())
}

/// Decoded content of a page, concatenating content arrays
pub(crate) fn read_page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_object(page_id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?;

    let stream_bytes = |stream: &Stream| {
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())
    };

    let content = match page_dict.get(b"Contents") {
        Ok(Object::Stream(stream)) => stream_bytes(stream),
        Ok(Object::Reference(ref_id)) => match doc.get_object(*ref_id) {
            Ok(Object::Stream(stream)) => stream_bytes(stream),
            Ok(Object::Array(parts)) => concat_streams(doc, parts, &stream_bytes),
            _ => Vec::new(),
        },
        Ok(Object::Array(parts)) => concat_streams(doc, parts, &stream_bytes),
        _ => Vec::new(),
    };

    Ok(content)
}

fn concat_streams(
    doc: &Document,
    parts: &[Object],
    stream_bytes: &dyn Fn(&Stream) -> Vec<u8>,
) -> Vec<u8> {
    let mut combined = Vec::new();
    for part in parts {
        let data = match part {
            Object::Reference(ref_id) => match doc.get_object(*ref_id) {
                Ok(Object::Stream(stream)) => stream_bytes(stream),
                _ => continue,
            },
            Object::Stream(stream) => stream_bytes(stream),
            _ => continue,
        };
        combined.extend_from_slice(&data);
        combined.push(b'\n');
    }
    combined
}

/// Point a page at a single new content stream
pub(crate) fn replace_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<()> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));
    set_page_entry(doc, page_id, "Contents", Object::Reference(stream_id))
}
