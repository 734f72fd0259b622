//! Greedy single-pass grouping of spans into lines.

use crate::model::{Line, Span};

/// Group a page's spans into lines.
///
/// Starts a new line on a hard line break or hyphenation sentinel at the end
/// of the previous span's text, on a rotation change, or when the next span
/// starts below the current line's lowest extent (a vertical gap).
pub fn build_lines(spans: Vec<Span>) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for span in spans {
        let should_break = match lines.last() {
            None => true,
            Some(line) => {
                let prev = line.spans.last().unwrap();
                prev.text.ends_with('\n')
                    || prev.text.ends_with('\u{2}')
                    || prev.rotation != span.rotation
                    || span.bbox.y_min > line.bbox.y_max
            }
        };

        if should_break {
            lines.push(Line {
                bbox: span.bbox,
                spans: vec![span],
            });
        } else {
            let line = lines.last_mut().unwrap();
            line.bbox = line.bbox.merge(&span.bbox);
            line.spans.push(span);
        }
    }

    lines
}
