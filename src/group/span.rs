//! Greedy single-pass grouping of characters into spans.

use crate::geometry::Bbox;
use crate::model::{Character, Span};

/// Vertical headroom (fraction of span height) a character must clear above
/// the span before it's considered superscript-split material.
const TAU_LD: f64 = 0.1;
/// Maximum height (fraction of span height) for the superscript-split
/// heuristic's "short character" test.
const TAU_SH: f64 = 0.8;

/// Group a page's characters into spans.
///
/// Starts a new span whenever the font, rotation, hyphenation sentinel, or
/// superscript-split heuristic says the run has ended; otherwise the
/// character is appended to the current span.
pub fn build_spans(chars: &[Character]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();

    for c in chars {
        let should_break = match spans.last() {
            None => true,
            Some(span) => {
                span.font != c.font
                    || span.rotation != c.rotation
                    || span.text.ends_with('\u{2}')
                    || is_superscript_split(span, c)
            }
        };

        if should_break {
            spans.push(Span {
                bbox: c.bbox,
                text: c.unicode.to_string(),
                font: c.font.clone(),
                rotation: c.rotation,
                chars: vec![c.clone()],
                char_start_idx: c.char_idx,
                char_end_idx: c.char_idx,
                url: String::new(),
                superscript: false,
                subscript: false,
            });
        } else {
            let span = spans.last_mut().unwrap();
            span.bbox = span.bbox.merge(&c.bbox);
            span.text.push(c.unicode);
            span.chars.push(c.clone());
            span.char_end_idx = c.char_idx;
        }
    }

    spans
}

fn is_superscript_split(span: &Span, c: &Character) -> bool {
    let height = span.bbox.height();
    if height <= 0.0 {
        return false;
    }
    let clears_above = c.bbox.y_min < span.bbox.y_min - height * TAU_LD;
    let is_short = c.bbox.y_max < span.bbox.y_min + height * TAU_SH;
    let to_the_right = c.bbox.x_min > span.bbox.x_max;
    clears_above && is_short && to_the_right
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Font;

    fn ch(idx: usize, text: char, bbox: (f64, f64, f64, f64), font: &str) -> Character {
        Character {
            bbox: Bbox::new(bbox.0, bbox.1, bbox.2, bbox.3),
            unicode: text,
            rotation: 0.0,
            font: Font {
                name: font.to_string(),
                flags: 0,
                size: 12.0,
                weight: 400.0,
            },
            char_idx: idx,
        }
    }

    #[test]
    fn merges_same_font_run() {
        let chars = vec![
            ch(0, 'a', (0.0, 0.0, 5.0, 10.0), "F"),
            ch(1, 'b', (5.0, 0.0, 10.0, 10.0), "F"),
        ];
        let spans = build_spans(&chars);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "ab");
    }

    #[test]
    fn breaks_on_font_change() {
        let chars = vec![
            ch(0, 'a', (0.0, 0.0, 5.0, 10.0), "F"),
            ch(1, 'b', (5.0, 0.0, 10.0, 10.0), "G"),
        ];
        let spans = build_spans(&chars);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn breaks_after_hyphen_sentinel() {
        let chars = vec![
            ch(0, 'a', (0.0, 0.0, 5.0, 10.0), "F"),
            ch(1, '\u{2}', (5.0, 0.0, 10.0, 10.0), "F"),
            ch(2, 'b', (10.0, 0.0, 15.0, 10.0), "F"),
        ];
        let spans = build_spans(&chars);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "a\u{2}");
        assert_eq!(spans[1].text, "b");
    }
}
