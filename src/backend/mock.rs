//! An in-memory [`PdfBackend`] used by the test suite so that layout-pipeline
//! tests don't need a native PDFium build or a bundled fixture file.

use super::{PdfBackend, RawAnnotation, RawChar};
use crate::error::{Error, Result};

/// One synthetic page: raw characters plus raw link annotations.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    /// Media box, `(x_start, y_start, x_end, y_end)`.
    pub media_bbox: (f64, f64, f64, f64),
    /// Page rotation in degrees.
    pub rotation: i32,
    /// Characters in native order.
    pub chars: Vec<RawChar>,
    /// Link annotations.
    pub annotations: Vec<RawAnnotation>,
}

/// A document built entirely from in-memory [`MockPage`]s.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    pages: Vec<MockPage>,
    flattened: Vec<bool>,
}

impl MockBackend {
    /// Build a backend from a fixed set of pages.
    pub fn new(pages: Vec<MockPage>) -> Self {
        let flattened = vec![false; pages.len()];
        Self { pages, flattened }
    }

    /// Whether `flatten_page` was called for `page`.
    pub fn was_flattened(&self, page: usize) -> bool {
        self.flattened.get(page).copied().unwrap_or(false)
    }
}

impl PdfBackend for MockBackend {
    fn open(_path: &str) -> Result<Self> {
        Err(Error::Input(
            "MockBackend has no file format, build it with MockBackend::new".into(),
        ))
    }

    fn open_bytes(_bytes: Vec<u8>) -> Result<Self> {
        Err(Error::Input(
            "MockBackend has no file format, build it with MockBackend::new".into(),
        ))
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_rotation(&self, page: usize) -> Result<i32> {
        Ok(self.page_ref(page)?.rotation)
    }

    fn page_media_bbox(&self, page: usize) -> Result<(f64, f64, f64, f64)> {
        Ok(self.page_ref(page)?.media_bbox)
    }

    fn page_char_count(&self, page: usize) -> Result<usize> {
        Ok(self.page_ref(page)?.chars.len())
    }

    fn char_at(&self, page: usize, index: usize, _loose: bool) -> Result<RawChar> {
        self.page_ref(page)?
            .chars
            .get(index)
            .cloned()
            .ok_or_else(|| Error::Input(format!("char index {index} out of range on page {page}")))
    }

    fn flatten_page(&mut self, page: usize) -> Result<()> {
        if page >= self.pages.len() {
            return Err(Error::Input(format!("page {page} out of range")));
        }
        self.flattened[page] = true;
        Ok(())
    }

    fn page_annotations(&self, page: usize) -> Result<Vec<RawAnnotation>> {
        Ok(self.page_ref(page)?.annotations.clone())
    }
}

impl MockBackend {
    fn page_ref(&self, page: usize) -> Result<&MockPage> {
        self.pages
            .get(page)
            .ok_or_else(|| Error::Input(format!("page {page} out of range")))
    }
}
