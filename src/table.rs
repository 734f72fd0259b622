//! Table helper: regroups characters inside caller-supplied table
//! rectangles into cell-like runs.

use crate::geometry::Bbox;
use crate::model::{Character, Page};
use crate::render::postprocess_text;

/// A reconstructed table cell/run.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Cell bbox in table-local coordinates (origin at the table rect's
    /// top-left corner).
    pub bbox: Bbox,
    /// Cell text.
    pub text: String,
}

/// A page's worth of reconstructed cells for one input table rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Source page index.
    pub page: usize,
    /// Reconstructed cells, in reading order.
    pub cells: Vec<Cell>,
}

fn percentile(values: &mut [f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((values.len() - 1) as f64 * pct).round() as usize;
    values[idx]
}

fn dim_or_one(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        1.0
    }
}

/// 80th-percentile consecutive-character gap *within each span* (gaps across
/// a span boundary are not sampled), normalised by image size and measured
/// along the axis the page's rotation makes the reading axis. Falls back to
/// `default_thresh` unless more than 100 gaps were sampled.
fn dynamic_gap_thresh(page: &Page, img_w: f64, img_h: f64, default_thresh: f64) -> f64 {
    let img_w = dim_or_one(img_w);
    let img_h = dim_or_one(img_h);
    let mut gaps = Vec::new();
    for block in &page.blocks {
        for line in &block.lines {
            for span in &line.spans {
                for w in span.chars.windows(2) {
                    let (c1, c2) = (&w[0], &w[1]);
                    let gap = match page.rotation {
                        90 => (c2.bbox.x_min - c1.bbox.x_max) / img_w,
                        180 => (c2.bbox.y_min - c1.bbox.y_max) / img_h,
                        270 => (c1.bbox.x_min - c2.bbox.x_max) / img_w,
                        _ => (c1.bbox.y_min - c2.bbox.y_max) / img_h,
                    };
                    gaps.push(gap);
                }
            }
        }
    }
    if gaps.len() > 100 {
        percentile(&mut gaps, 0.8)
    } else {
        default_thresh
    }
}

/// `(a - b) / dim`, optionally signed, compared against `thresh * mult`.
fn normalized_diff(a: f64, b: f64, dim_size: f64, thresh: f64, mult: f64, use_abs: bool) -> bool {
    let raw = a - b;
    let v = if use_abs { raw.abs() } else { raw };
    v / dim_or_one(dim_size) < thresh * mult
}

/// Whether a char at (rescaled) `bbox` continues the run accumulated in
/// `curr_box`, per rotation. Each rotation has its own three-condition test:
/// reading-axis adjacency (signed, catches runs going "backwards"), cross-axis
/// alignment, and a looser reading-axis bound — matching the reference
/// tool's `is_same_span` including its cross-axis-divisor quirk on the third
/// condition (rotations 0/180/270 divide by image height there, not width).
fn is_same_span(curr_box: &Bbox, bbox: &Bbox, rotation: i32, space_thresh: f64, img_w: f64, img_h: f64) -> bool {
    match rotation {
        90 => {
            normalized_diff(bbox.x_min, curr_box.x_min, img_w, space_thresh, 1.0, false)
                && normalized_diff(bbox.y_min, curr_box.y_max, img_h, space_thresh, 1.0, true)
                && normalized_diff(bbox.x_min, curr_box.x_min, img_w, space_thresh, 5.0, true)
        }
        180 => {
            normalized_diff(bbox.x_max, curr_box.x_min, img_w, space_thresh, 1.0, false)
                && normalized_diff(bbox.y_min, curr_box.y_min, img_h, space_thresh, 1.0, true)
                && normalized_diff(bbox.x_max, curr_box.x_min, img_h, space_thresh, 5.0, true)
        }
        270 => {
            normalized_diff(bbox.x_min, curr_box.x_min, img_w, space_thresh, 1.0, false)
                && normalized_diff(bbox.y_max, curr_box.y_min, img_h, space_thresh, 1.0, true)
                && normalized_diff(bbox.x_min, curr_box.x_min, img_h, space_thresh, 5.0, true)
        }
        _ => {
            normalized_diff(bbox.x_min, curr_box.x_max, img_w, space_thresh, 1.0, false)
                && normalized_diff(bbox.y_min, curr_box.y_min, img_h, space_thresh, 1.0, true)
                && normalized_diff(bbox.x_min, curr_box.x_max, img_h, space_thresh, 5.0, true)
        }
    }
}

fn union_bbox(a: &Bbox, b: &Bbox) -> Bbox {
    Bbox::new(
        a.x_min.min(b.x_min),
        a.y_min.min(b.y_min),
        a.x_max.max(b.x_max),
        a.y_max.max(b.y_max),
    )
}

/// Reconstruct table cells for each `(page_index, table_rect)` pair.
///
/// `img_size` is the pixel size the caller's table rectangles are expressed
/// in; table rectangles are already in that space, page-space geometry
/// (line boxes, characters) is rescaled into it before comparison.
/// `table_thresh` is the minimum line/table overlap fraction for a line to
/// be considered inside the table. `space_thresh` is the floor for the
/// dynamic per-page gap threshold: the effective threshold is
/// `max(space_thresh, dynamic_gap_thresh(page))`, so a caller-supplied
/// `space_thresh` only ever tightens cell segmentation relative to the
/// page's own measured character spacing, never loosens it.
pub fn table_cell_text(
    pages: &[Page],
    tables: &[(usize, Bbox)],
    img_size: (f64, f64),
    table_thresh: f64,
    space_thresh: f64,
) -> Vec<Table> {
    let mut out = Vec::with_capacity(tables.len());

    for &(page_idx, table_rect) in tables {
        let Some(page) = pages.iter().find(|p| p.page == page_idx) else {
            out.push(Table {
                page: page_idx,
                cells: vec![],
            });
            continue;
        };

        let gap_thresh = space_thresh.max(dynamic_gap_thresh(page, img_size.0, img_size.1, space_thresh));

        let mut cells = Vec::new();
        for block in &page.blocks {
            for line in &block.lines {
                let rescaled_line = line.bbox.rescale(img_size.0, img_size.1, page);
                if rescaled_line.intersection_pct(&table_rect) < table_thresh {
                    continue;
                }

                let line_chars: Vec<Character> =
                    line.spans.iter().flat_map(|s| s.chars.iter().cloned()).collect();
                for (text, bbox) in
                    chunk_into_cells(&line_chars, page, page.rotation, gap_thresh, img_size.0, img_size.1)
                {
                    let local = Bbox::new(
                        bbox.x_min - table_rect.x_min,
                        bbox.y_min - table_rect.y_min,
                        bbox.x_max - table_rect.x_min,
                        bbox.y_max - table_rect.y_min,
                    );
                    cells.push(Cell {
                        bbox: local,
                        text: postprocess_text(&text),
                    });
                }
            }
        }

        cells.sort_by(|a, b| {
            a.bbox
                .y_min
                .partial_cmp(&b.bbox.y_min)
                .unwrap()
                .then(a.bbox.x_min.partial_cmp(&b.bbox.x_min).unwrap())
        });

        out.push(Table {
            page: page_idx,
            cells,
        });
    }

    out
}

/// Greedily run-length-encode one line's characters into cell-like runs,
/// breaking wherever [`is_same_span`] fails. A run whose text is entirely
/// whitespace is dropped rather than emitted as an empty cell, matching the
/// reference tool's `.strip()` guard. Runs may span multiple [`Span`]s, since
/// a line's text can legitimately split into several grouping spans without
/// that being a cell boundary.
///
/// [`Span`]: crate::model::Span
fn chunk_into_cells(
    chars: &[Character],
    page: &Page,
    rotation: i32,
    gap_thresh: f64,
    img_w: f64,
    img_h: f64,
) -> Vec<(String, Bbox)> {
    let mut out = Vec::new();
    let mut current: Option<(String, Bbox)> = None;

    for c in chars {
        let bbox = c.bbox.rescale(img_w, img_h, page);
        match &mut current {
            None => current = Some((c.unicode.to_string(), bbox)),
            Some((text, curr_box)) => {
                if is_same_span(curr_box, &bbox, rotation, gap_thresh, img_w, img_h) {
                    text.push(c.unicode);
                    *curr_box = union_bbox(curr_box, &bbox);
                } else {
                    if !text.trim().is_empty() {
                        out.push((std::mem::take(text), *curr_box));
                    }
                    *text = c.unicode.to_string();
                    *curr_box = bbox;
                }
            }
        }
    }
    if let Some((text, bbox)) = current {
        if !text.trim().is_empty() {
            out.push((text, bbox));
        }
    }

    out
}
