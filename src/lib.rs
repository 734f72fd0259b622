#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Layout reconstruction for PDF text extraction.
//!
//! Turns the flat glyph stream a low-level PDF text extractor produces into
//! a `Page` tree of blocks, lines, and spans with hyperlinks resolved, then
//! renders that tree to reading-order plain text.

mod backend;
mod config;
mod driver;
mod error;
mod geometry;
mod group;
mod ingest;
mod links;
mod model;
mod render;
mod table;

pub use backend::mock::{MockBackend, MockPage};
pub use backend::pdfium::PdfiumBackend;
pub use backend::{PdfBackend, RawAnnotation, RawChar};
pub use config::Config;
pub use driver::{extract_document, extract_pages, ExtractOptions};
pub use error::{Error, Result};
pub use geometry::Bbox;
pub use model::{Block, Character, Font, Line, Page, Reference, ReferenceRegistry, Span};
pub use render::{handle_hyphens, merge, postprocess_text, sort_blocks};
pub use table::{table_cell_text, Cell, Table};

/// Options for [`dictionary`].
#[derive(Debug, Clone)]
pub struct DictionaryOptions {
    /// Whether to reorder blocks into reading order before returning them.
    pub sort: bool,
    /// Pages to extract; defaults to every page when `None`.
    pub page_range: Option<Vec<usize>>,
    /// Keep per-span character detail in the result.
    pub keep_chars: bool,
    /// Flatten annotations/form fields before ingestion.
    pub flatten_pdf: bool,
    /// See [`crate::ingest::ingest_page`]'s `quote_loosebox` parameter.
    pub quote_loosebox: bool,
    /// Skip the link-overlay pass entirely.
    pub disable_links: bool,
    /// Requested worker count.
    pub workers: Option<usize>,
    /// See [`crate::driver::ExtractOptions::dedup_overprinted`].
    pub dedup_overprinted: bool,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            sort: false,
            page_range: None,
            keep_chars: false,
            flatten_pdf: false,
            quote_loosebox: true,
            disable_links: false,
            workers: None,
            dedup_overprinted: false,
        }
    }
}

/// Options for [`plain_text`]/[`paginated_plain_text`].
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    /// Reorder blocks into reading order before rendering.
    pub sort: bool,
    /// Keep hyphenation sentinels as literal `"-\n"` instead of rejoining
    /// the hyphenated word.
    pub hyphens: bool,
    /// Pages to extract; defaults to every page when `None`.
    pub page_range: Option<Vec<usize>>,
    /// Flatten annotations/form fields before ingestion.
    pub flatten_pdf: bool,
    /// Requested worker count.
    pub workers: Option<usize>,
    /// See [`crate::driver::ExtractOptions::dedup_overprinted`].
    pub dedup_overprinted: bool,
}

/// Options for [`table`].
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Pages to extract; defaults to every page when `None`.
    pub page_range: Option<Vec<usize>>,
    /// Flatten annotations/form fields before ingestion.
    pub flatten_pdf: bool,
    /// See [`crate::ingest::ingest_page`]'s `quote_loosebox` parameter.
    pub quote_loosebox: bool,
    /// Requested worker count.
    pub workers: Option<usize>,
    /// Minimum line/table-rect overlap fraction for a line to count as
    /// inside the table. Falls back to [`Config::block_threshold`] when
    /// unset.
    pub table_thresh: Option<f64>,
    /// Floor for the per-page dynamic gap threshold that drives cell
    /// segmentation; see [`crate::table::table_cell_text`].
    pub space_thresh: f64,
    /// See [`crate::driver::ExtractOptions::dedup_overprinted`].
    pub dedup_overprinted: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_range: None,
            flatten_pdf: false,
            quote_loosebox: true,
            workers: None,
            table_thresh: None,
            space_thresh: 0.01,
            dedup_overprinted: false,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn extract_opts_from(
    page_range: Option<Vec<usize>>,
    flatten_pdf: bool,
    quote_loosebox: bool,
    disable_links: bool,
    workers: Option<usize>,
    dedup_overprinted: bool,
) -> ExtractOptions {
    ExtractOptions {
        page_range,
        flatten_pdf,
        quote_loosebox,
        disable_links,
        workers,
        dedup_overprinted,
    }
}

/// Extract a full document's structured layout.
pub fn dictionary<B: PdfBackend + 'static>(
    path: &str,
    opts: &DictionaryOptions,
    config: &Config,
) -> Result<Vec<Page>> {
    let extract_opts = extract_opts_from(
        opts.page_range.clone(),
        opts.flatten_pdf,
        opts.quote_loosebox,
        opts.disable_links,
        opts.workers,
        opts.dedup_overprinted,
    );
    let mut pages = extract_document::<B>(path, &extract_opts, config)?;

    if opts.sort {
        for page in pages.iter_mut() {
            page.blocks = sort_blocks(std::mem::take(&mut page.blocks), 1.25);
        }
    }
    if !opts.keep_chars {
        for page in pages.iter_mut() {
            for block in page.blocks.iter_mut() {
                for line in block.lines.iter_mut() {
                    for span in line.spans.iter_mut() {
                        span.chars.clear();
                    }
                }
            }
        }
    }

    Ok(pages)
}

/// Render every requested page to plain text, one entry per page.
pub fn paginated_plain_text<B: PdfBackend + 'static>(
    path: &str,
    opts: &TextOptions,
    config: &Config,
) -> Result<Vec<String>> {
    let extract_opts = extract_opts_from(
        opts.page_range.clone(),
        opts.flatten_pdf,
        true,
        false,
        opts.workers,
        opts.dedup_overprinted,
    );
    let pages = extract_document::<B>(path, &extract_opts, config)?;
    Ok(pages
        .iter()
        .map(|p| merge(p, opts.sort, opts.hyphens))
        .collect())
}

/// Render every requested page to a single plain-text string, joined by
/// `"\n"`.
pub fn plain_text<B: PdfBackend + 'static>(
    path: &str,
    opts: &TextOptions,
    config: &Config,
) -> Result<String> {
    Ok(paginated_plain_text::<B>(path, opts, config)?.join("\n"))
}

/// Reconstruct table cells for `table_inputs` (`(page_index, table_rect)`
/// pairs expressed in `img_size` pixel coordinates).
pub fn table<B: PdfBackend + 'static>(
    path: &str,
    table_inputs: &[(usize, Bbox)],
    img_size: (f64, f64),
    opts: &TableOptions,
    config: &Config,
) -> Result<Vec<Table>> {
    let extract_opts = extract_opts_from(
        opts.page_range.clone(),
        opts.flatten_pdf,
        opts.quote_loosebox,
        true,
        opts.workers,
        opts.dedup_overprinted,
    );
    let pages = extract_document::<B>(path, &extract_opts, config)?;
    let table_thresh = opts.table_thresh.unwrap_or(config.block_threshold);
    Ok(table_cell_text(
        &pages,
        table_inputs,
        img_size,
        table_thresh,
        opts.space_thresh,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_options_default_to_no_chars_and_all_pages() {
        let opts = DictionaryOptions::default();
        assert!(!opts.keep_chars);
        assert!(opts.page_range.is_none());
        assert!(opts.quote_loosebox);
    }

    #[test]
    fn extract_opts_from_carries_every_field_through() {
        let opts = extract_opts_from(Some(vec![2, 0, 1]), true, false, true, Some(4), true);
        assert_eq!(opts.page_range, Some(vec![2, 0, 1]));
        assert!(opts.flatten_pdf);
        assert!(!opts.quote_loosebox);
        assert!(opts.disable_links);
        assert_eq!(opts.workers, Some(4));
        assert!(opts.dedup_overprinted);
    }
}
