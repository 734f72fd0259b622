//! The page driver: runs the per-page pipeline and shards page ranges
//! across a worker pool for larger documents.

use log::{debug, warn};

use crate::backend::PdfBackend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::group::group_page;
use crate::ingest::{dedup_overprinted_chars, ingest_page};
use crate::links::overlay_links;
use crate::model::{Page, ReferenceRegistry};

/// Options controlling one `extract` call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Pages to extract, 0-based, in the order they should appear in the
    /// result. Defaults to every page, in order, when `None`.
    pub page_range: Option<Vec<usize>>,
    /// Flatten annotations/form fields into page content before ingestion.
    pub flatten_pdf: bool,
    /// See [`crate::ingest::ingest_page`]'s `quote_loosebox` parameter.
    pub quote_loosebox: bool,
    /// Whether to run the link-overlay pass.
    pub disable_links: bool,
    /// Requested worker count; the effective count is clamped by
    /// [`Config::worker_page_threshold`].
    pub workers: Option<usize>,
    /// Run [`crate::ingest::dedup_overprinted_chars`] after ingestion, for
    /// documents that overprint glyphs to simulate bold text. Off by
    /// default.
    pub dedup_overprinted: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_range: None,
            flatten_pdf: false,
            quote_loosebox: true,
            disable_links: false,
            workers: None,
            dedup_overprinted: false,
        }
    }
}

/// Ingest and group exactly `pages` over an already-open backend, with no
/// link overlay and no worker sharding. `refs`/span `url`s are left at their
/// defaults; callers that need links must run [`resolve_links`] themselves,
/// with one [`ReferenceRegistry`] shared across every page of the document.
fn build_pages<B: PdfBackend>(
    backend: &mut B,
    pages: &[usize],
    opts: &ExtractOptions,
    config: &Config,
) -> Result<Vec<Page>> {
    let mut out = Vec::with_capacity(pages.len());

    for &page_idx in pages {
        if opts.flatten_pdf {
            backend.flatten_page(page_idx)?;
        }
        let mut chars = ingest_page(backend, page_idx, opts.quote_loosebox, config)?;
        if opts.dedup_overprinted {
            chars = dedup_overprinted_chars(chars);
        }
        let blocks = group_page(&chars);
        let (x_s, y_s, x_e, y_e) = backend.page_media_bbox(page_idx)?;
        let rotation = backend.page_rotation(page_idx)?;
        let (width, height) = if rotation == 90 || rotation == 270 {
            ((y_e - y_s).abs().ceil(), (x_e - x_s).abs().ceil())
        } else {
            ((x_e - x_s).abs().ceil(), (y_e - y_s).abs().ceil())
        };

        out.push(Page {
            page: page_idx,
            bbox: crate::geometry::Bbox::new(0.0, 0.0, width, height),
            width,
            height,
            rotation,
            blocks,
            refs: vec![],
        });
    }

    Ok(out)
}

/// Resolve intra-document references across `pages` with a single
/// document-wide [`ReferenceRegistry`], mutating span `url`s and each page's
/// `refs` in place. Must run single-threaded, after every page of the
/// document has been built, so that a link in one page whose destination
/// lives on another page always resolves to the same registry entry.
fn resolve_links<B: PdfBackend>(backend: &B, pages: &mut [Page]) -> Result<()> {
    let mut registry = ReferenceRegistry::new();
    for page in pages.iter_mut() {
        overlay_links(backend, page.page, page, &mut registry)?;
    }
    for page in pages.iter_mut() {
        page.refs = registry.for_page(page.page).to_vec();
    }
    Ok(())
}

/// Run the per-page pipeline over an already-open backend for exactly
/// `pages`, with no worker sharding. Useful for callers that already hold a
/// backend instance (e.g. an in-memory test fixture). Resolves links with a
/// single registry scoped to `pages`, since there is no sharding here for
/// that registry to fragment across.
pub fn extract_pages<B: PdfBackend>(
    backend: &mut B,
    pages: &[usize],
    opts: &ExtractOptions,
    config: &Config,
) -> Result<Vec<Page>> {
    let mut out = build_pages(backend, pages, opts, config)?;
    if !opts.disable_links {
        resolve_links(backend, &mut out)?;
    }
    Ok(out)
}

fn default_page_range(total: usize) -> Vec<usize> {
    (0..total).collect()
}

fn effective_workers(requested: Option<usize>, page_count: usize, config: &Config) -> usize {
    let requested = requested.unwrap_or(1);
    let by_threshold = page_count / config.worker_page_threshold.max(1);
    requested.min(by_threshold).max(1)
}

fn chunk_contiguous(pages: &[usize], workers: usize) -> Vec<Vec<usize>> {
    if workers <= 1 || pages.is_empty() {
        return vec![pages.to_vec()];
    }
    let chunk_size = pages.len().div_ceil(workers);
    pages.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

/// Extract structured pages for `path` according to `opts`.
///
/// Runs inline when the effective worker count is 1; otherwise shards
/// `opts.page_range` into contiguous chunks and dispatches one thread per
/// chunk, each opening its own backend instance, to ingest and group pages
/// in parallel. A single worker's failure aborts the whole call with
/// [`Error::WorkerFailed`]. Link resolution always runs as a single-threaded
/// post-pass over the reassembled, page-ordered document, since the
/// [`ReferenceRegistry`] is a per-document singleton: a link on one page can
/// target a destination on another page in a different chunk, and reference
/// indices are assigned in document order, not per-chunk order.
pub fn extract_document<B: PdfBackend + 'static>(
    path: &str,
    opts: &ExtractOptions,
    config: &Config,
) -> Result<Vec<Page>> {
    let mut backend = B::open(path)?;
    let total_pages = backend.page_count();
    let pages = opts
        .page_range
        .clone()
        .unwrap_or_else(|| default_page_range(total_pages));
    for &p in &pages {
        if p >= total_pages {
            return Err(Error::Input(format!(
                "page index {p} out of range (document has {total_pages} pages)"
            )));
        }
    }

    let workers = effective_workers(opts.workers, pages.len(), config);
    if workers <= 1 {
        debug!("running extraction inline for {} page(s)", pages.len());
        let mut all_pages = build_pages(&mut backend, &pages, opts, config)?;
        if !opts.disable_links {
            resolve_links(&backend, &mut all_pages)?;
        }
        return Ok(all_pages);
    }

    // The worker pool owns one backend per thread; the coordinator's handle
    // is no longer needed once chunks are dispatched.
    drop(backend);

    let chunks = chunk_contiguous(&pages, workers);
    let path = path.to_string();
    let opts = opts.clone();
    let config = *config;

    let handles: Vec<_> = chunks
        .into_iter()
        .map(|chunk| {
            let path = path.clone();
            let opts = opts.clone();
            std::thread::spawn(move || -> Result<Vec<Page>> {
                let mut backend = B::open(&path)?;
                build_pages(&mut backend, &chunk, &opts, &config)
            })
        })
        .collect();

    let mut all_pages = Vec::with_capacity(pages.len());
    for handle in handles {
        match handle.join() {
            Ok(Ok(mut pages)) => all_pages.append(&mut pages),
            Ok(Err(e)) => return Err(Error::WorkerFailed(e.to_string())),
            Err(_) => {
                warn!("a page-shard worker panicked");
                return Err(Error::WorkerFailed("worker thread panicked".into()));
            }
        }
    }
    all_pages.sort_by_key(|p| p.page);

    if !opts.disable_links {
        let link_backend = B::open(&path)?;
        resolve_links(&link_backend, &mut all_pages)?;
    }

    Ok(all_pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_is_contiguous_and_covers_all_pages() {
        let pages: Vec<usize> = (0..23).collect();
        let chunks = chunk_contiguous(&pages, 3);
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), 23);
        let flat: Vec<usize> = chunks.into_iter().flatten().collect();
        assert_eq!(flat, pages);
    }

    #[test]
    fn worker_count_is_clamped_by_threshold() {
        let cfg = Config {
            worker_page_threshold: 10,
            ..Config::default()
        };
        assert_eq!(effective_workers(Some(8), 25, &cfg), 2);
        assert_eq!(effective_workers(Some(1), 1000, &cfg), 1);
        assert_eq!(effective_workers(None, 1000, &cfg), 1);
    }

    #[test]
    fn resolve_links_attaches_cross_page_reference() {
        use crate::backend::mock::{MockBackend, MockPage};
        use crate::backend::RawChar;
        use crate::backend::RawAnnotation;

        let char_at = |unicode: char, x: f64| RawChar {
            unicode,
            rotation: 0.0,
            font_size: 12.0,
            font_weight: 400.0,
            font_name: "F".into(),
            font_flags: 0,
            bbox: (x, 0.0, x + 8.0, 10.0),
        };

        // Page 0 has an internal link pointing at page 1; in the sharded
        // worker path these two pages are built by different threads with
        // no shared registry, and only a single-threaded post-pass can
        // attach the reference to page 1's `refs`.
        let page0 = MockPage {
            media_bbox: (0.0, 0.0, 100.0, 100.0),
            rotation: 0,
            chars: vec![char_at('a', 0.0)],
            annotations: vec![RawAnnotation {
                rect: (0.0, 0.0, 8.0, 10.0),
                uri: None,
                dest: Some((1, (12.0, 34.0))),
            }],
        };
        let page1 = MockPage {
            media_bbox: (0.0, 0.0, 100.0, 100.0),
            rotation: 0,
            chars: vec![char_at('b', 0.0)],
            annotations: vec![],
        };
        let backend = MockBackend::new(vec![page0, page1]);
        let opts = ExtractOptions::default();
        let cfg = Config::default();

        // Simulate two separate worker chunks, each building one page with
        // no link overlay, the way `extract_document`'s multi-worker branch
        // does.
        let mut backend_for_chunk = backend.clone();
        let mut built0 = build_pages(&mut backend_for_chunk, &[0], &opts, &cfg).unwrap();
        let mut built1 = build_pages(&mut backend_for_chunk, &[1], &opts, &cfg).unwrap();
        let mut all_pages = Vec::new();
        all_pages.append(&mut built0);
        all_pages.append(&mut built1);

        resolve_links(&backend, &mut all_pages).unwrap();

        assert!(
            !all_pages[1].refs.is_empty(),
            "page 1 must receive the reference created while resolving page 0's link"
        );
    }
}
