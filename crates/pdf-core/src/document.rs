//! PDF Document wrapper

use crate::overlay::Overlay;
use crate::{PdfError, Result, StandardFont, DEFAULT_PAGE_SIZE};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

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

/// PDF Document wrapper providing overlay operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Flate-compress content streams written by merges
    compress_streams: bool,
    /// Font dictionaries already added to the document
    font_objects: HashMap<StandardFont, ObjectId>,
}

impl PdfDocument {
    /// Open a PDF document from a file path
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("blank.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            compress_streams: true,
            font_objects: HashMap::new(),
        }
    }

    /// Enable or disable Flate compression of merged content streams
    pub fn set_compress_streams(&mut self, compress: bool) {
        self.compress_streams = compress;
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get page width and height in points
    ///
    /// Reads the MediaBox (or CropBox), following the parent chain when the
    /// page inherits it. Pages with no box anywhere are treated as A4.
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;

        let keys = [b"MediaBox".as_slice(), b"CropBox".as_slice()];
        match self.get_inherited_attribute(page_id, &keys)? {
            Some(media_box) => {
                let media_box_array = match media_box {
                    Object::Array(arr) => arr,
                    Object::Reference(ref_id) => self
                        .inner
                        .get_object(ref_id)?
                        .as_array()
                        .map_err(|_| {
                            PdfError::ParseError("MediaBox reference is not an array".to_string())
                        })?
                        .clone(),
                    _ => return Err(PdfError::ParseError("MediaBox is not an array".to_string())),
                };
                extract_size_from_media_box(&media_box_array)
            }
            None => Ok(DEFAULT_PAGE_SIZE),
        }
    }

    /// Merge an overlay onto its page in place
    ///
    /// The page's original content streams are kept as they are, whatever
    /// their filters, and referenced from a new `Contents` array:
    /// `[q, original..., Q + overlay]`. The overlay therefore draws in
    /// untransformed page coordinates, on top of the original. Returns
    /// `false` (page untouched) when the overlay is empty.
    pub fn merge_overlay(&mut self, overlay: &Overlay) -> Result<bool> {
        if overlay.is_empty() {
            return Ok(false);
        }

        let page_id = self.page_id(overlay.page())?;

        let fonts: Vec<StandardFont> = overlay.fonts().collect();
        if !fonts.is_empty() {
            self.add_fonts_to_page_resources(page_id, &fonts)?;
        }

        let original = self.page_content_ids(page_id)?;

        let save_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

        let mut closing = Vec::with_capacity(overlay.content().len() + 3);
        closing.extend_from_slice(b"\nQ\n");
        closing.extend_from_slice(overlay.content());
        let closing = self.build_content_stream(closing)?;
        let closing_id = self.inner.add_object(closing);

        let mut contents = Vec::with_capacity(original.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(original.into_iter().map(Object::Reference));
        contents.push(Object::Reference(closing_id));

        let mut page_dict = self.page_dict(page_id)?.clone();
        page_dict.set("Contents", Object::Array(contents));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(true)
    }

    /// Save the document to a file, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
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

    /// Get all page object IDs in page order
    pub fn get_page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 || page > pages.len() {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
    }

    /// Look up a page attribute, following the parent chain if needed
    ///
    /// The first key found wins at each level.
    fn get_inherited_attribute(
        &self,
        page_id: ObjectId,
        keys: &[&[u8]],
    ) -> Result<Option<Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            for key in keys {
                if let Ok(value) = dict.get(key) {
                    return Ok(Some(value.clone()));
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(None)
    }

    /// Resolve an object that is either a dictionary or a reference to one
    fn deref_dict(&self, object: &Object) -> Dictionary {
        match object {
            Object::Dictionary(dict) => dict.clone(),
            Object::Reference(ref_id) => self
                .inner
                .get_object(*ref_id)
                .ok()
                .and_then(|obj| obj.as_dict().ok())
                .cloned()
                .unwrap_or_default(),
            _ => Dictionary::new(),
        }
    }

    fn font_object_id(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.font_objects.get(&font) {
            return *id;
        }
        let id = self.inner.add_object(font.to_pdf_dictionary());
        self.font_objects.insert(font, id);
        id
    }

    /// Add overlay fonts to the page's own Resources dictionary
    ///
    /// Inherited or referenced resources are copied onto the page so the
    /// existing entries stay visible alongside the new fonts.
    fn add_fonts_to_page_resources(
        &mut self,
        page_id: ObjectId,
        fonts: &[StandardFont],
    ) -> Result<()> {
        let keys = [b"Resources".as_slice()];
        let mut resources_dict = match self.get_inherited_attribute(page_id, &keys)? {
            Some(resources) => self.deref_dict(&resources),
            None => Dictionary::new(),
        };

        let mut font_dict = match resources_dict.get(b"Font") {
            Ok(font) => self.deref_dict(font),
            Err(_) => Dictionary::new(),
        };

        for font in fonts {
            let font_id = self.font_object_id(*font);
            font_dict.set(font.resource_name(), Object::Reference(font_id));
        }

        resources_dict.set("Font", Object::Dictionary(font_dict));

        let mut page_dict = self.page_dict(page_id)?.clone();
        page_dict.set("Resources", Object::Dictionary(resources_dict));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }

    /// Object ids of a page's content streams, in drawing order
    ///
    /// Inline streams are moved into their own objects so every entry can
    /// be referenced from a `Contents` array.
    fn page_content_ids(&mut self, page_id: ObjectId) -> Result<Vec<ObjectId>> {
        let contents = match self.page_dict(page_id)?.get(b"Contents") {
            Ok(contents) => contents.clone(),
            Err(_) => return Ok(Vec::new()),
        };

        let items = match contents {
            Object::Reference(id) => match self.inner.get_object(id) {
                Ok(Object::Array(arr)) => arr.clone(),
                _ => vec![Object::Reference(id)],
            },
            Object::Array(arr) => arr,
            other => vec![other],
        };

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Object::Reference(id) => ids.push(id),
                Object::Stream(stream) => ids.push(self.inner.add_object(stream)),
                _ => {}
            }
        }
        Ok(ids)
    }

    fn build_content_stream(&self, content: Vec<u8>) -> Result<Stream> {
        if !self.compress_streams {
            return Ok(Stream::new(Dictionary::new(), content));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&content)?;
        let compressed = encoder.finish()?;

        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        Ok(Stream::new(dict, compressed))
    }
}

/// Extract width and height from a MediaBox array
fn extract_size_from_media_box(media_box_array: &[Object]) -> Result<(f64, f64)> {
    if media_box_array.len() < 4 {
        return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
    }

    let mut coords = [0.0f64; 4];
    for (i, coord) in coords.iter_mut().enumerate() {
        *coord = object_to_f64(&media_box_array[i])
            .ok_or_else(|| PdfError::ParseError(format!("Invalid MediaBox entry {i}")))?;
    }

    Ok(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
}

fn object_to_f64(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}
