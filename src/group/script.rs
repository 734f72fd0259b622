//! Superscript/subscript detection, applied after line assembly.
//!
//! This runs *after* the span builder's own superscript-split heuristic
//! (`group::span::is_superscript_split`), which only decides where to break
//! a span; this pass decides whether an already-built span, now sitting in
//! its line, should be flagged as reduced-size raised or lowered text.

use icu_properties::{maps, GeneralCategory};

use crate::model::Line;

/// Maximum height (fraction of line height) for a span to be considered a
/// superscript/subscript candidate.
const TAU_SH: f64 = 0.8;
/// Minimum vertical offset (fraction of the neighbour's height) for a span
/// to be considered raised/lowered relative to that neighbour.
const TAU_LD: f64 = 0.1;

/// Flag superscript/subscript spans in place across every line of a page.
///
/// For each candidate span, "full-height" is tested against its *immediate*
/// neighbour specifically (previous or next, whichever side the candidate is
/// raised/lowered relative to) rather than either neighbour indiscriminately
/// — a span sitting low next to a full-height predecessor but a short
/// successor should still be judged against the predecessor it's actually
/// offset from.
pub fn assign_scripts(lines: &mut [Line]) {
    for line in lines.iter_mut() {
        let n = line.spans.len();
        if n < 2 {
            continue;
        }
        let line_height = line.bbox.height();
        if line.bbox.height() > line.bbox.width() {
            continue;
        }

        let heights: Vec<f64> = line.spans.iter().map(|s| s.bbox.height()).collect();
        let y_mins: Vec<f64> = line.spans.iter().map(|s| s.bbox.y_min).collect();
        let y_maxs: Vec<f64> = line.spans.iter().map(|s| s.bbox.y_max).collect();
        let texts: Vec<String> = line.spans.iter().map(|s| s.text.clone()).collect();

        for i in 0..n {
            if !is_script_candidate_text(&texts[i]) {
                continue;
            }

            let is_first = i == 0 || texts[i - 1].trim().is_empty();
            let is_last = i + 1 == n || texts[i + 1].trim().is_empty();
            let span_height = heights[i];
            let span_top = y_mins[i];
            let span_bottom = y_maxs[i];

            let line_fullheight = span_height / line_height.max(1.0) <= TAU_SH;
            let next_fullheight = is_last || span_height / heights[i + 1].max(1.0) <= TAU_SH;
            let prev_fullheight = is_first || span_height / heights[i - 1].max(1.0) <= TAU_SH;

            let above = (0..n).any(|j| j != i && span_top < y_mins[j] - heights[j] * TAU_LD);
            let prev_above = is_first || span_top < y_mins[i - 1];
            let next_above = is_last || span_top < y_mins[i + 1];

            let below = (0..n).any(|j| j != i && span_bottom > y_maxs[j] + heights[j] * TAU_LD);
            let prev_below = is_first || span_bottom > y_maxs[i - 1];
            let next_below = is_last || span_bottom > y_maxs[i + 1];

            if line_fullheight && (prev_fullheight || next_fullheight) && (prev_above || next_above) && above {
                line.spans[i].superscript = true;
            } else if line_fullheight && (prev_fullheight || next_fullheight) && (prev_below || next_below) && below {
                line.spans[i].subscript = true;
            }
        }
    }
}

/// A single char, or a run of digits, that is itself alphanumeric (or, for a
/// single char, a math symbol).
fn is_script_candidate_text(text: &str) -> bool {
    let stripped = text.trim();
    if stripped.is_empty() {
        return false;
    }
    let char_count = stripped.chars().count();
    let is_digit_run = stripped.chars().all(|c| c.is_ascii_digit());
    let is_alnum_run = stripped.chars().all(|c| c.is_alphanumeric());
    let single_math_symbol = char_count == 1 && is_math_symbol(stripped.chars().next().unwrap());

    (char_count == 1 || is_digit_run) && (is_alnum_run || single_math_symbol)
}

fn is_math_symbol(c: char) -> bool {
    maps::general_category().get(c) == GeneralCategory::MathSymbol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bbox;
    use crate::model::{Font, Span};

    fn span(text: &str, y_min: f64, y_max: f64, x_min: f64, x_max: f64) -> Span {
        Span {
            bbox: Bbox::new(x_min, y_min, x_max, y_max),
            text: text.into(),
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
        }
    }

    #[test]
    fn flags_raised_digit_as_superscript() {
        let mut lines = vec![Line {
            bbox: Bbox::new(0.0, 0.0, 100.0, 20.0),
            spans: vec![
                span("x", 0.0, 20.0, 0.0, 15.0),
                span("2", 0.0, 8.0, 15.0, 20.0),
            ],
        }];
        assign_scripts(&mut lines);
        assert!(lines[0].spans[1].superscript);
        assert!(!lines[0].spans[0].superscript);
    }

    #[test]
    fn ignores_vertical_lines() {
        let mut lines = vec![Line {
            bbox: Bbox::new(0.0, 0.0, 5.0, 100.0),
            spans: vec![span("a", 0.0, 50.0, 0.0, 5.0), span("2", 50.0, 60.0, 0.0, 5.0)],
        }];
        assign_scripts(&mut lines);
        assert!(!lines[0].spans[1].superscript);
    }
}
