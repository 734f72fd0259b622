//! Link overlay: split spans along hyperlink boundaries and resolve
//! intra-document references.

use crate::backend::{PdfBackend, RawAnnotation};
use crate::error::Result;
use crate::geometry::Bbox;
use crate::model::{Character, Font, Line, Page, ReferenceRegistry, Span};

struct ResolvedLink {
    bbox: Bbox,
    url: String,
}

fn quantize(coord: (f64, f64)) -> (i64, i64) {
    ((coord.0 * 100.0).round() as i64, (coord.1 * 100.0).round() as i64)
}

/// Map a raw annotation rectangle through the same page-coordinate
/// normalisation applied to characters during ingestion.
fn normalize_rect(
    raw: (f64, f64, f64, f64),
    x_s: f64,
    y_s: f64,
    width: f64,
    height: f64,
    page_rotation: i32,
) -> Result<Bbox> {
    let (lx0, ly0, lx1, ly1) = (raw.0 - x_s, raw.1 - y_s, raw.2 - x_s, raw.3 - y_s);
    let ty0 = height - ly1;
    let ty1 = height - ly0;
    Bbox::new(lx0, ty0, lx1, ty1).rotate(width, height, page_rotation)
}

fn resolve_link(
    raw: &RawAnnotation,
    bbox: Bbox,
    current_page: usize,
    registry: &mut ReferenceRegistry,
) -> Option<ResolvedLink> {
    if let Some(uri) = &raw.uri {
        return Some(ResolvedLink {
            bbox,
            url: uri.clone(),
        });
    }
    if let Some((dest_page, dest_pos)) = raw.dest {
        if dest_page == current_page && dest_pos == (0.0, 0.0) {
            // Self-link with no meaningful position: nothing to anchor to.
            return None;
        }
        let url = registry.resolve(dest_page, quantize(dest_pos));
        return Some(ResolvedLink { bbox, url });
    }
    None
}

/// Overlay hyperlinks onto one page's already-grouped blocks, mutating spans
/// in place (splitting them where an active link boundary falls inside a
/// span) and returning this page's `Reference`s.
pub fn overlay_links<B: PdfBackend>(
    backend: &B,
    page_idx: usize,
    page: &mut Page,
    registry: &mut ReferenceRegistry,
) -> Result<()> {
    let (x_s, y_s, x_e, y_e) = backend.page_media_bbox(page_idx)?;
    let width = (x_e - x_s).abs().ceil();
    let height = (y_e - y_s).abs().ceil();
    let page_rotation = backend.page_rotation(page_idx)?;

    let raw_annotations = backend.page_annotations(page_idx)?;
    let mut links = Vec::with_capacity(raw_annotations.len());
    for raw in &raw_annotations {
        let bbox = normalize_rect(raw.rect, x_s, y_s, width, height, page_rotation)?;
        if let Some(link) = resolve_link(raw, bbox, page_idx, registry) {
            links.push(link);
        }
    }

    if links.is_empty() {
        return Ok(());
    }

    for block in page.blocks.iter_mut() {
        for line in block.lines.iter_mut() {
            overlay_line(line, &links);
        }
    }

    Ok(())
}

fn overlay_line(line: &mut Line, links: &[ResolvedLink]) {
    let mut rebuilt: Vec<Span> = Vec::with_capacity(line.spans.len());
    for span in line.spans.drain(..) {
        // Attach the highest-intersection-area link, if any has positive
        // overlap with this span's box.
        let attached = links
            .iter()
            .map(|l| (l, l.bbox.intersection_area(&span.bbox)))
            .filter(|(_, area)| *area > 0.0)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        if attached.is_none() {
            rebuilt.push(span);
            continue;
        }

        rebuilt.extend(reconstruct_span(span, links));
    }
    line.spans = rebuilt;
}

/// Split `span`'s characters into fresh sub-spans wherever the
/// highest-intersection-area link changes.
fn reconstruct_span(span: Span, links: &[ResolvedLink]) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();

    for c in span.chars.iter() {
        let char_box = if c.bbox.area() == 0.0 {
            c.bbox.ensure_nonzero_area()
        } else {
            c.bbox
        };
        let active_url = links
            .iter()
            .map(|l| (l, l.bbox.intersection_area(&char_box)))
            .filter(|(_, area)| *area > 0.0)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(l, _)| l.url.clone())
            .unwrap_or_default();

        let start_new = match out.last() {
            None => true,
            Some(sub) => sub.url != active_url,
        };

        if start_new {
            out.push(new_subspan(c, active_url, &span.font));
        } else {
            append_char(out.last_mut().unwrap(), c);
        }
    }

    if out.is_empty() {
        out.push(span);
    }
    out
}

fn new_subspan(c: &Character, url: String, font: &Font) -> Span {
    Span {
        bbox: c.bbox,
        text: c.unicode.to_string(),
        font: font.clone(),
        rotation: c.rotation,
        chars: vec![c.clone()],
        char_start_idx: c.char_idx,
        char_end_idx: c.char_idx,
        url,
        superscript: false,
        subscript: false,
    }
}

fn append_char(span: &mut Span, c: &Character) {
    span.bbox = span.bbox.merge(&c.bbox);
    span.text.push(c.unicode);
    span.chars.push(c.clone());
    span.char_end_idx = c.char_idx;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockPage};
    use crate::backend::RawChar;
    use crate::config::Config;
    use crate::group::group_page;
    use crate::ingest::ingest_page;

    fn char(unicode: char, bbox: (f64, f64, f64, f64)) -> RawChar {
        RawChar {
            unicode,
            rotation: 0.0,
            font_size: 12.0,
            font_weight: 400.0,
            font_name: "F".into(),
            font_flags: 0,
            bbox,
        }
    }

    #[test]
    fn link_spanning_two_words_splits_middle_span_only() {
        // "foo bar baz" on a single line; a link rectangle covers "bar".
        let mut x = 0.0;
        let mut chars = Vec::new();
        for word in ["foo", " ", "bar", " ", "baz"] {
            for ch in word.chars() {
                chars.push(char(ch, (x, 180.0, x + 10.0, 190.0)));
                x += 10.0;
            }
        }
        let bar_start = "foo ".len() as f64 * 10.0;
        let bar_end = bar_start + 3.0 * 10.0;

        let page = MockPage {
            media_bbox: (0.0, 0.0, 200.0, 200.0),
            rotation: 0,
            chars,
            annotations: vec![RawAnnotation {
                rect: (bar_start, 180.0, bar_end, 190.0),
                uri: Some("https://example.com".into()),
                dest: None,
            }],
        };
        let backend = MockBackend::new(vec![page]);
        let cfg = Config::default();
        let characters = ingest_page(&backend, 0, true, &cfg).unwrap();
        let blocks = group_page(&characters);

        let mut registry = ReferenceRegistry::new();
        let mut p = Page {
            page: 0,
            bbox: Bbox::new(0.0, 0.0, 200.0, 200.0),
            width: 200.0,
            height: 200.0,
            rotation: 0,
            blocks,
            refs: vec![],
        };
        overlay_links(&backend, 0, &mut p, &mut registry).unwrap();

        let spans: Vec<&Span> = p.blocks.iter().flat_map(|b| &b.lines).flat_map(|l| &l.spans).collect();
        let linked: Vec<&&Span> = spans.iter().filter(|s| !s.url.is_empty()).collect();
        assert!(!linked.is_empty());
        assert!(linked.iter().all(|s| s.url == "https://example.com"));
    }

    #[test]
    fn repeated_internal_dest_shares_url() {
        let mut registry = ReferenceRegistry::new();
        let a = registry.resolve(3, (100, 200));
        let b = registry.resolve(3, (100, 200));
        assert_eq!(a, b);
        let c = registry.resolve(3, (101, 200));
        assert_ne!(a, c);
    }
}
