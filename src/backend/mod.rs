//! The extractor contract: the trait boundary every low-level PDF text
//! extractor must satisfy, plus the concrete backends that implement it.

pub mod mock;
pub mod pdfium;

use crate::error::Result;

/// A link or intra-document destination enumerated from a page's
/// annotation dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    /// Annotation rectangle in raw PDF page coordinates.
    pub rect: (f64, f64, f64, f64),
    /// External URI, if the annotation's action is a URI action.
    pub uri: Option<String>,
    /// Intra-document destination: `(page_index, (x, y))`, if the
    /// annotation's action or `/Dest` resolves to one.
    pub dest: Option<(usize, (f64, f64))>,
}

/// One glyph's raw geometry and font attributes, as read from the native
/// extractor before any layout-pipeline normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChar {
    /// The glyph's code point.
    pub unicode: char,
    /// Glyph rotation, in degrees.
    pub rotation: f64,
    /// Font size in text space units.
    pub font_size: f64,
    /// Font weight.
    pub font_weight: f64,
    /// Font name, empty if it failed to decode.
    pub font_name: String,
    /// Font descriptor flags.
    pub font_flags: i32,
    /// Glyph bounding box, `(left, bottom, right, top)` in raw page space
    /// (origin bottom-left, as PDF defines it), before any top-left-origin
    /// normalisation.
    pub bbox: (f64, f64, f64, f64),
}

/// The contract a low-level PDF text extractor must satisfy for the layout
/// pipeline to run against it.
///
/// A single backend instance owns exactly one open document; it must not be
/// shared across threads (see the page driver's worker-pool design, which
/// opens one backend instance per worker).
pub trait PdfBackend: Sized {
    /// Open a document from a file path.
    fn open(path: &str) -> Result<Self>;

    /// Open a document from an in-memory byte buffer.
    fn open_bytes(bytes: Vec<u8>) -> Result<Self>;

    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Page rotation in degrees: one of 0/90/180/270.
    fn page_rotation(&self, page: usize) -> Result<i32>;

    /// Page media box, `(x_start, y_start, x_end, y_end)`, unrotated.
    fn page_media_bbox(&self, page: usize) -> Result<(f64, f64, f64, f64)>;

    /// Number of characters on the text page.
    fn page_char_count(&self, page: usize) -> Result<usize>;

    /// Read one character's attributes. `loose` selects a loose (side
    /// bearing included) versus tight glyph box.
    fn char_at(&self, page: usize, index: usize, loose: bool) -> Result<RawChar>;

    /// Flatten annotations/form fields into page content. Must be called,
    /// if at all, before any other per-page read for that page.
    fn flatten_page(&mut self, page: usize) -> Result<()>;

    /// Enumerate link-bearing annotations on a page.
    fn page_annotations(&self, page: usize) -> Result<Vec<RawAnnotation>>;
}
