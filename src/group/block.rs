//! Two-stage grouping of lines into blocks.

use crate::model::{Block, Line};

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.1;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Group a page's lines into blocks.
///
/// Stage 1 greedily merges lines using dynamic gap tolerances derived from
/// the median center-to-center gap between consecutive lines, with four
/// additional exception rules (indented first lines, ragged last lines,
/// small inline continuations, and bbox overlap) alongside the base
/// within-tolerance rule. Stage 2 walks the resulting blocks and coalesces
/// any that overlap, to recover blocks split by an out-of-order glyph
/// stream.
pub fn build_blocks(lines: Vec<Line>) -> Vec<Block> {
    if lines.is_empty() {
        return Vec::new();
    }

    let centers: Vec<(f64, f64)> = lines.iter().map(|l| l.bbox.center()).collect();
    let mut dx = Vec::new();
    let mut dy = Vec::new();
    for w in centers.windows(2) {
        dx.push((w[1].0 - w[0].0).abs());
        dy.push((w[1].1 - w[0].1).abs());
    }
    let mx = median(&mut dx);
    let my = median(&mut dy);
    let gx = 1.5 * mx;
    let gy = 1.5 * my;

    let mut blocks: Vec<Block> = Vec::new();

    for (i, line) in lines.into_iter().enumerate() {
        let center = centers[i];
        let merge_target = blocks.last().and_then(|block| {
            let prev_line = block.lines.last().unwrap();
            let prev_center = prev_line.bbox.center();
            let delta_x = (center.0 - prev_center.0).abs();
            let delta_y = (center.1 - prev_center.1).abs();

            let rule1 = delta_x <= gx && delta_y <= gy;
            let rule2 = block.lines.len() == 1
                && prev_line.bbox.x_min > line.bbox.x_min
                && delta_y <= gy;
            let rule3 = prev_line.bbox.x_max > line.bbox.x_max && delta_y <= gy;
            let rule4 = delta_y < 0.2 * gy && prev_line.bbox.x_max > line.bbox.x_min;
            let rule5 = block.bbox.intersection_pct(&line.bbox) > 0.0;

            (rule1 || rule2 || rule3 || rule4 || rule5).then_some(())
        });

        if merge_target.is_some() {
            let block = blocks.last_mut().unwrap();
            block.bbox = block.bbox.merge(&line.bbox);
            block.lines.push(line);
        } else {
            blocks.push(Block {
                bbox: line.bbox,
                lines: vec![line],
            });
        }
    }

    coalesce_overlaps(blocks)
}

fn coalesce_overlaps(blocks: Vec<Block>) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::new();
    for block in blocks {
        if let Some(prev) = out.last_mut() {
            if prev.bbox.intersection_area(&block.bbox) > 0.0 {
                prev.bbox = prev.bbox.merge(&block.bbox);
                prev.lines.extend(block.lines);
                continue;
            }
        }
        out.push(block);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bbox;
    use crate::model::{Font, Span};

    fn line(bbox: (f64, f64, f64, f64)) -> Line {
        let b = Bbox::new(bbox.0, bbox.1, bbox.2, bbox.3);
        Line {
            bbox: b,
            spans: vec![Span {
                bbox: b,
                text: "x".into(),
                font: Font {
                    name: "F".into(),
                    flags: 0,
                    size: 12.0,
                    weight: 400.0,
                },
                rotation: 0.0,
                chars: vec![],
                char_start_idx: 0,
                char_end_idx: 0,
                url: String::new(),
                superscript: false,
                subscript: false,
            }],
        }
    }

    #[test]
    fn groups_tightly_stacked_lines_into_one_block() {
        let lines = vec![
            line((0.0, 0.0, 100.0, 10.0)),
            line((0.0, 12.0, 100.0, 22.0)),
            line((0.0, 24.0, 100.0, 34.0)),
        ];
        let blocks = build_blocks(lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 3);
    }

    #[test]
    fn splits_far_apart_lines_into_separate_blocks() {
        let lines = vec![
            line((0.0, 0.0, 100.0, 10.0)),
            line((0.0, 12.0, 100.0, 22.0)),
            line((0.0, 500.0, 100.0, 510.0)),
        ];
        let blocks = build_blocks(lines);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn coalesces_overlapping_blocks() {
        let lines = vec![line((0.0, 0.0, 50.0, 50.0)), line((400.0, 400.0, 450.0, 450.0))];
        let mut blocks = build_blocks(lines);
        // force an artificial overlap to exercise stage 2 directly
        blocks.push(Block {
            bbox: Bbox::new(10.0, 10.0, 40.0, 40.0),
            lines: vec![],
        });
        let merged = coalesce_overlaps(blocks);
        assert!(merged.len() <= 2);
    }
}
