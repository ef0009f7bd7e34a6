//! PDF Document wrapper

use crate::font::{encode_text_hex, StandardFont};
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

/// A4 page height in points, used when a page has no MediaBox
pub const A4_HEIGHT: f64 = 841.89;

/// Maximum depth followed up the page tree for inherited attributes
const MAX_INHERITANCE_DEPTH: usize = 10;

/// A buffered text operation for deferred encoding
///
/// Text is buffered during rendering and encoded during save, once every
/// font used on a page is known and resource names can be assigned.
#[derive(Debug, Clone)]
struct BufferedTextOp {
    /// The text to render
    text: String,
    /// Font to render with
    font: StandardFont,
    /// Page number (1-indexed)
    page: usize,
    /// X coordinate (PDF coordinates)
    x: f64,
    /// Y coordinate (PDF coordinates)
    y: f64,
    /// Font size in points
    font_size: f32,
    /// Text color
    color: Color,
}

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

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
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

/// A parsed PDF kept read-only as the source for filled copies
///
/// Parsing happens once; [`SourcePdf::instantiate`] hands out independent
/// documents that can be drawn on without touching the source.
#[derive(Debug, Clone)]
pub struct SourcePdf {
    inner: Document,
    page_count: usize,
}

impl SourcePdf {
    /// Parse a source PDF from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Self::from_document(inner)
    }

    /// Parse a source PDF from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Self::from_document(inner)
    }

    fn from_document(inner: Document) -> Result<Self> {
        let page_count = inner.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::OpenError("document has no pages".to_string()));
        }
        Ok(Self { inner, page_count })
    }

    /// Number of pages in the source document
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Create an independent, drawable copy of the source
    pub fn instantiate(&self) -> PdfDocument {
        PdfDocument::from_document(self.inner.clone())
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Current font
    current_font: StandardFont,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Font dictionaries added to the document (font -> PDF object ID)
    font_objects: BTreeMap<StandardFont, ObjectId>,
    /// Buffered text operations (encoded during save)
    buffered_text_ops: Vec<BufferedTextOp>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            current_font: StandardFont::default(),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            font_objects: BTreeMap::new(),
            buffered_text_ops: Vec::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Set the current font and size
    ///
    /// # Arguments
    /// * `font` - Standard font to draw with
    /// * `size` - Font size in points (must be positive)
    pub fn set_font(&mut self, font: StandardFont, size: f32) -> Result<()> {
        self.set_font_size(size)?;
        self.current_font = font;
        Ok(())
    }

    /// Set only the font size (keeps the current font)
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if !size.is_finite() || size <= 0.0 {
            return Err(PdfError::InvalidFontSize(size));
        }
        self.current_font_size = size;
        Ok(())
    }

    /// Set the text color
    ///
    /// # Example
    /// ```ignore
    /// doc.set_text_color(Color::from_rgb(0, 0, 128));
    /// ```
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points (from left)
    /// * `y` - Y coordinate in points (from bottom)
    pub fn insert_text(&mut self, text: &str, page: usize, x: f64, y: f64) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        if text.is_empty() {
            return Ok(());
        }

        self.buffered_text_ops.push(BufferedTextOp {
            text: text.to_string(),
            font: self.current_font,
            page,
            x,
            y,
            font_size: self.current_font_size,
            color: self.current_text_color,
        });

        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_text_ops()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Y coordinate of the page's top edge in points
    ///
    /// Reads the page's MediaBox, following the parent chain for inherited
    /// values. The MediaBox corners may come in either order and need not
    /// start at the origin. Pages without a MediaBox are treated as A4.
    pub fn page_top(&self, page: usize) -> Result<f64> {
        let page_id = self.page_id(page)?;

        let media_box = match self.get_inherited(page_id, b"MediaBox")? {
            Some(Object::Reference(id)) => self.inner.get_object(id)?.clone(),
            Some(obj) => obj,
            None => return Ok(A4_HEIGHT),
        };
        let media_box = media_box
            .as_array()
            .map_err(|_| PdfError::ParseError("MediaBox is not an array".to_string()))?;

        if media_box.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }
        let y1 = as_number(&media_box[1])
            .ok_or_else(|| PdfError::ParseError("Invalid MediaBox y1".to_string()))?;
        let y2 = as_number(&media_box[3])
            .ok_or_else(|| PdfError::ParseError("Invalid MediaBox y2".to_string()))?;

        Ok(y1.max(y2))
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        let page_num = u32::try_from(page).map_err(|_| PdfError::InvalidPage(page, pages.len()))?;
        pages
            .get(&page_num)
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Look up a page attribute, following the parent chain if needed
    fn get_inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
        let mut current_id = page_id;

        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page tree node is not a dictionary".to_string()))?;

            if let Ok(value) = dict.get(key) {
                return Ok(Some(value.clone()));
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(None)
    }

    /// Resolve an object that is either a dictionary or a reference to one
    fn resolve_dict(&self, obj: &Object) -> Result<Dictionary> {
        let dict = match obj {
            Object::Reference(id) => self.inner.get_object(*id)?,
            other => other,
        };
        dict.as_dict()
            .cloned()
            .map_err(|_| PdfError::ParseError("Expected a dictionary".to_string()))
    }

    /// Get or add the font dictionary object for a standard font
    fn font_object(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.font_objects.get(&font) {
            return *id;
        }
        let id = self.inner.add_object(font.to_pdf_dictionary());
        self.font_objects.insert(font, id);
        id
    }

    /// Encode buffered text operations into the page content streams
    ///
    /// Called once during save/to_bytes. Pages are processed in order and
    /// fonts in a fixed order, so identical input yields identical output.
    fn flush_text_ops(&mut self) -> Result<()> {
        let text_ops = std::mem::take(&mut self.buffered_text_ops);
        if text_ops.is_empty() {
            return Ok(());
        }

        let mut ops_by_page: BTreeMap<usize, Vec<BufferedTextOp>> = BTreeMap::new();
        for op in text_ops {
            ops_by_page.entry(op.page).or_default().push(op);
        }

        for (page, ops) in ops_by_page {
            let fonts: BTreeSet<StandardFont> = ops.iter().map(|op| op.font).collect();
            let resource_names = self.register_page_fonts(page, &fonts)?;

            let mut content = Vec::new();
            for op in &ops {
                let ctx = TextRenderContext {
                    font_name: resource_names[&op.font].clone(),
                    font_size: op.font_size,
                    color: op.color,
                };
                let operators = generate_text_operators(&encode_text_hex(&op.text), op.x, op.y, &ctx);
                content.extend_from_slice(&operators);
            }

            self.append_to_content_stream(page, &content)?;
            tracing::trace!(page, operations = ops.len(), "flushed text overlay");
        }

        Ok(())
    }

    /// Add font references to a page's Resources dictionary
    ///
    /// Resource names are chosen so they never collide with fonts the page
    /// already uses. Inherited or indirect Resources are copied onto the
    /// page itself before being extended.
    fn register_page_fonts(
        &mut self,
        page: usize,
        fonts: &BTreeSet<StandardFont>,
    ) -> Result<BTreeMap<StandardFont, String>> {
        let page_id = self.page_id(page)?;

        let mut resources_dict = match self.get_inherited(page_id, b"Resources")? {
            Some(obj) => self.resolve_dict(&obj)?,
            None => Dictionary::new(),
        };

        let mut font_dict = match resources_dict.get(b"Font") {
            Ok(font) => self.resolve_dict(font)?,
            Err(_) => Dictionary::new(),
        };

        let mut resource_names = BTreeMap::new();
        let mut next_resource = 1u32;
        for font in fonts {
            let font_id = self.font_object(*font);

            let resource_name = loop {
                let candidate = format!("FF{next_resource}");
                next_resource += 1;
                if !font_dict.has(candidate.as_bytes()) {
                    break candidate;
                }
            };

            font_dict.set(resource_name.as_bytes(), Object::Reference(font_id));
            resource_names.insert(*font, resource_name);
        }

        resources_dict.set("Font", Object::Dictionary(font_dict));

        let mut page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?
            .clone();
        page_dict.set("Resources", Object::Dictionary(resources_dict));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(resource_names)
    }

    /// Append overlay content to a page
    ///
    /// The page's existing content streams are left untouched and bracketed
    /// by `q`/`Q`, so any transformation they leave behind does not shift the
    /// overlay. The overlay itself is written as a new Flate-compressed stream.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();

        let existing: Vec<Object> = match page_dict.get(b"Contents") {
            Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id)? {
                Object::Array(arr) => arr.clone(),
                _ => vec![Object::Reference(*ref_id)],
            },
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Stream(stream)) => {
                let stream = stream.clone();
                vec![Object::Reference(self.inner.add_object(stream))]
            }
            _ => Vec::new(),
        };

        let mut overlay = b"\nQ\n".to_vec();
        overlay.extend_from_slice(content);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&overlay)?;
        let compressed = encoder.finish()?;

        let mut overlay_dict = Dictionary::new();
        overlay_dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

        let save_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = self.inner.add_object(Stream::new(overlay_dict, compressed));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));

        page_dict.set("Contents", Object::Array(contents));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}

fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn single_page(media_box: Option<Vec<Object>>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        };
        if let Some(media_box) = media_box {
            page.set("MediaBox", media_box);
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_page_top_from_media_box() {
        let doc = PdfDocument::from_document(single_page(Some(vec![
            0.into(),
            0.into(),
            612.into(),
            792.into(),
        ])));
        assert_eq!(doc.page_top(1).unwrap(), 792.0);
    }

    #[test]
    fn test_page_top_with_offset_media_box() {
        let doc = PdfDocument::from_document(single_page(Some(vec![
            0.into(),
            100.into(),
            612.into(),
            892.into(),
        ])));
        assert_eq!(doc.page_top(1).unwrap(), 892.0);

        let flipped = PdfDocument::from_document(single_page(Some(vec![
            0.into(),
            892.into(),
            612.into(),
            100.into(),
        ])));
        assert_eq!(flipped.page_top(1).unwrap(), 892.0);
    }

    #[test]
    fn test_page_top_defaults_to_a4() {
        let doc = PdfDocument::from_document(single_page(None));
        assert_eq!(doc.page_top(1).unwrap(), A4_HEIGHT);
    }

    #[test]
    fn test_invalid_font_size() {
        let mut doc = PdfDocument::from_document(single_page(None));
        assert!(matches!(
            doc.set_font(StandardFont::Courier, 0.0),
            Err(PdfError::InvalidFontSize(_))
        ));
        assert!(doc.set_font_size(f32::NAN).is_err());
    }

    #[test]
    fn test_page_without_contents_gets_overlay() {
        let mut doc = PdfDocument::from_document(single_page(None));
        doc.insert_text("A", 1, 10.0, 20.0).unwrap();
        doc.flush_text_ops().unwrap();

        let page_id = doc.page_id(1).unwrap();
        let content = doc.inner.get_page_content(page_id).unwrap();
        let content = String::from_utf8_lossy(&content);
        assert!(content.starts_with("q\n"));
        assert!(content.contains("10 20 Td"));
        assert!(content.contains("<41> Tj"));
    }

    #[test]
    fn test_color_from_rgb() {
        assert_eq!(Color::from_rgb(255, 0, 0), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::default(), Color::black());
    }
}
