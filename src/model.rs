//! The character/span/line/block/page data model.

use rustc_hash::FxHashMap;

use crate::geometry::Bbox;

/// Font attributes attached to every character.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Font {
    /// PostScript font name, empty string if it could not be decoded.
    pub name: String,
    /// PDF font descriptor flags.
    pub flags: i32,
    /// Font size in text space units.
    pub size: f64,
    /// Font weight (100-900 scale; 400 regular, 700 bold).
    pub weight: f64,
}

/// A single positioned glyph emitted by the extractor.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Character {
    /// Glyph bounding box in page display coordinates.
    pub bbox: Bbox,
    /// The glyph's code point.
    pub unicode: char,
    /// Glyph rotation in degrees.
    pub rotation: f64,
    /// Font attributes in effect for this glyph.
    pub font: Font,
    /// Stable index into the page's native character stream.
    pub char_idx: usize,
}

/// A maximal run of characters sharing font and rotation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Span {
    /// Union of this span's character boxes.
    pub bbox: Bbox,
    /// Concatenated text, possibly rewritten by the renderer.
    pub text: String,
    /// Font shared by every character in the span.
    pub font: Font,
    /// Rotation shared by every character in the span.
    pub rotation: f64,
    /// The characters making up this span, in native order.
    pub chars: Vec<Character>,
    /// First native character index covered by this span.
    pub char_start_idx: usize,
    /// Last native character index covered by this span.
    pub char_end_idx: usize,
    /// Hyperlink URL covering this span, if any.
    pub url: String,
    /// Set by the script detector when this span sits above the line
    /// baseline at reduced size.
    pub superscript: bool,
    /// Set by the script detector when this span sits below the line
    /// baseline at reduced size.
    pub subscript: bool,
}

/// A maximal run of spans sharing rotation with no forced break.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Line {
    /// The spans making up this line, in reading order.
    pub spans: Vec<Span>,
    /// Union of this line's span boxes.
    pub bbox: Bbox,
}

/// A group of lines judged to belong to one visual paragraph/cell.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Block {
    /// The lines making up this block, in reading order.
    pub lines: Vec<Line>,
    /// Union of this block's line boxes.
    pub bbox: Bbox,
}

/// One intra-document anchor target, addressable as `#page-<page>-<idx>`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Reference {
    /// Destination page index.
    pub page: usize,
    /// Index disambiguating multiple references on the same page.
    pub idx: usize,
    /// Destination coordinate on that page, used for deduplication.
    pub coord: (i64, i64),
}

impl Reference {
    /// The `#page-<page>-<idx>` anchor URL for this reference.
    pub fn url(&self) -> String {
        format!("#page-{}-{}", self.page, self.idx)
    }
}

/// Per-document registry of intra-document references, deduplicated by
/// `(page, coord)` so that repeated links to the same destination share a
/// URL.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    by_coord: FxHashMap<(usize, (i64, i64)), Reference>,
    by_page: FxHashMap<usize, Vec<Reference>>,
}

impl ReferenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (or create) the reference for `(dest_page, coord)`, returning
    /// its URL. Calling this twice with the same `(dest_page, coord)`
    /// always returns the same URL.
    pub fn resolve(&mut self, dest_page: usize, coord: (i64, i64)) -> String {
        let key = (dest_page, coord);
        if let Some(existing) = self.by_coord.get(&key) {
            return existing.url();
        }
        let idx = self.by_page.get(&dest_page).map(|v| v.len()).unwrap_or(0);
        let reference = Reference {
            page: dest_page,
            idx,
            coord,
        };
        self.by_coord.insert(key, reference);
        self.by_page.entry(dest_page).or_default().push(reference);
        reference.url()
    }

    /// References targeting `page`, in insertion order.
    pub fn for_page(&self, page: usize) -> &[Reference] {
        self.by_page.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One page's layout tree plus its display geometry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Page {
    /// 0-based page index.
    pub page: usize,
    /// Page bounding box in display coordinates.
    pub bbox: Bbox,
    /// Display width (axes swapped relative to the media box at 90/270).
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Page rotation in degrees, one of 0/90/180/270.
    pub rotation: i32,
    /// Top-level blocks, in document order (reordered by the renderer's
    /// reading-order sort when requested).
    pub blocks: Vec<Block>,
    /// Intra-document references whose destination is this page.
    pub refs: Vec<Reference>,
}
