//! A [`PdfBackend`] implementation on top of the `pdfium-render` crate.

use std::sync::Arc;

use pdfium_render::prelude::*;

use super::{PdfBackend, RawAnnotation, RawChar};
use crate::error::{Error, Result};

/// Backend that drives Google's PDFium library through `pdfium-render`.
///
/// Holds the document's bytes rather than a long-lived `PdfDocument`
/// borrow, re-opening a short-lived document handle for each read. This
/// keeps the backend free of self-referential lifetimes (and therefore of
/// `unsafe`) at the cost of re-parsing the document per call; the page
/// driver's worker pool amortises this by giving each worker its own
/// backend instance and a contiguous run of pages to work through.
pub struct PdfiumBackend {
    pdfium: Pdfium,
    bytes: Arc<Vec<u8>>,
}

fn map_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Extractor(e.to_string())
}

impl PdfiumBackend {
    fn bind() -> Result<Pdfium> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(".")))
            .map_err(map_err)?;
        Ok(Pdfium::new(bindings))
    }

    fn document(&self) -> Result<PdfDocument<'_>> {
        self.pdfium
            .load_pdf_from_byte_vec((*self.bytes).clone(), None)
            .map_err(map_err)
    }
}

impl PdfBackend for PdfiumBackend {
    fn open(path: &str) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::Input(e.to_string()))?;
        Self::open_bytes(bytes)
    }

    fn open_bytes(bytes: Vec<u8>) -> Result<Self> {
        let pdfium = Self::bind()?;
        // Validate once up front so `open`/`open_bytes` fail fast on a
        // malformed document rather than on the first per-page read.
        pdfium
            .load_pdf_from_byte_vec(bytes.clone(), None)
            .map_err(map_err)?;
        Ok(Self {
            pdfium,
            bytes: Arc::new(bytes),
        })
    }

    fn page_count(&self) -> usize {
        self.document().map(|d| d.pages().len() as usize).unwrap_or(0)
    }

    fn page_rotation(&self, page: usize) -> Result<i32> {
        let document = self.document()?;
        let page = document.pages().get(page as u16).map_err(map_err)?;
        let degrees = match page.rotation().map_err(map_err)? {
            PdfPageRenderRotation::None => 0,
            PdfPageRenderRotation::Degrees90 => 90,
            PdfPageRenderRotation::Degrees180 => 180,
            PdfPageRenderRotation::Degrees270 => 270,
        };
        Ok(degrees)
    }

    fn page_media_bbox(&self, page: usize) -> Result<(f64, f64, f64, f64)> {
        let document = self.document()?;
        let page = document.pages().get(page as u16).map_err(map_err)?;
        let bounds = page.page_size();
        Ok((
            bounds.left().value as f64,
            bounds.bottom().value as f64,
            bounds.right().value as f64,
            bounds.top().value as f64,
        ))
    }

    fn page_char_count(&self, page: usize) -> Result<usize> {
        let document = self.document()?;
        let page = document.pages().get(page as u16).map_err(map_err)?;
        let text = page.text().map_err(map_err)?;
        Ok(text.chars().len() as usize)
    }

    fn char_at(&self, page: usize, index: usize, loose: bool) -> Result<RawChar> {
        let document = self.document()?;
        let page = document.pages().get(page as u16).map_err(map_err)?;
        let text = page.text().map_err(map_err)?;
        let chars = text.chars();
        let c = chars.get(index as u32).map_err(map_err)?;

        let unicode = c.unicode_char().unwrap_or('\u{FFFD}');
        let rotation = c.rotation_clockwise_degrees() as f64;
        let font_size = c.unscaled_font_size().value as f64;
        let font_weight = c.font_weight().map(|w| w as f64).unwrap_or(400.0);
        let font_name = c.font_name().unwrap_or_default();
        let font_flags = c.font_flags().map(|f| f.bits() as i32).unwrap_or(0);

        let bounds = if loose {
            c.loose_bounds().map_err(map_err)?
        } else {
            c.tight_bounds().map_err(map_err)?
        };

        Ok(RawChar {
            unicode,
            rotation,
            font_size,
            font_weight,
            font_name,
            font_flags,
            bbox: (
                bounds.left().value as f64,
                bounds.bottom().value as f64,
                bounds.right().value as f64,
                bounds.top().value as f64,
            ),
        })
    }

    fn flatten_page(&mut self, page: usize) -> Result<()> {
        let mut document = self.document()?;
        document
            .pages_mut()
            .get(page as u16)
            .map_err(map_err)?
            .flatten()
            .map_err(map_err)?;
        let flattened = document.save_to_bytes().map_err(map_err)?;
        self.bytes = Arc::new(flattened);
        Ok(())
    }

    fn page_annotations(&self, page: usize) -> Result<Vec<RawAnnotation>> {
        let document = self.document()?;
        let page = document.pages().get(page as u16).map_err(map_err)?;
        let mut out = Vec::new();
        for annot in page.annotations().iter() {
            if annot.annotation_type() != PdfPageAnnotationType::Link {
                continue;
            }
            let rect = annot
                .bounds()
                .map(|b| {
                    (
                        b.left().value as f64,
                        b.bottom().value as f64,
                        b.right().value as f64,
                        b.top().value as f64,
                    )
                })
                .unwrap_or((0.0, 0.0, 0.0, 0.0));

            let mut uri = None;
            let mut dest = None;
            if let Some(link) = annot.as_link_annotation() {
                if let Ok(action) = link.action() {
                    if let Some(uri_action) = action.as_uri_action() {
                        uri = uri_action.uri().ok();
                    }
                }
                if let Ok(Some(destination)) = link.destination() {
                    if let (Ok(page_index), Ok(view_x), Ok(view_y)) = (
                        destination.page_index(),
                        destination.view_x(),
                        destination.view_y(),
                    ) {
                        dest = Some((
                            page_index as usize,
                            (view_x.unwrap_or_default() as f64, view_y.unwrap_or_default() as f64),
                        ));
                    }
                }
            }

            out.push(RawAnnotation { rect, uri, dest });
        }
        Ok(out)
    }
}
