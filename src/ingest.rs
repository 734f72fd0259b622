//! Per-page character ingestion: reads raw glyphs from a [`PdfBackend`] and
//! normalises them into top-left-origin, rotation-applied [`Character`]s.

use log::debug;
use rustc_hash::FxHashSet;

use crate::backend::{PdfBackend, RawChar};
use crate::config::Config;
use crate::error::Result;
use crate::geometry::Bbox;
use crate::model::{Character, Font};

/// Ingest every character on `page`.
///
/// `quote_loosebox` controls whether an apostrophe glyph gets a loose
/// (side-bearing-included) box; without it apostrophes use the tight box,
/// working around an over-wide loose-box quirk some extractors have for
/// that glyph.
pub fn ingest_page<B: PdfBackend>(
    backend: &B,
    page: usize,
    quote_loosebox: bool,
    config: &Config,
) -> Result<Vec<Character>> {
    let (x_s, y_s, x_e, y_e) = backend.page_media_bbox(page)?;
    let page_rotation = backend.page_rotation(page)?;
    let width = (x_e - x_s).abs().ceil();
    let height = (y_e - y_s).abs().ceil();
    let count = backend.page_char_count(page)?;

    let mut chars = Vec::with_capacity(count);
    let mut last_sampled: Option<(String, i32)> = None;
    let mut backfill_from = 0usize;

    for i in 0..count {
        // We don't yet know the glyph's own character to decide the
        // apostrophe exception, so peek via a tight read first; pdfium
        // exposes `unicode_char` independent of the bbox kind requested.
        let peek = backend.char_at(page, i, false)?;
        let is_quote = peek.unicode == '\'';
        let loose = page_rotation == 0 && (!is_quote || quote_loosebox);
        let raw = if loose { backend.char_at(page, i, true)? } else { peek };

        let (font_name, font_flags) = sample_font(
            page,
            i,
            config.fontname_sample_freq,
            &mut last_sampled,
            &mut backfill_from,
            &mut chars,
            &raw,
        )?;

        let (lx0, ly0, lx1, ly1) = (
            raw.bbox.0 - x_s,
            raw.bbox.1 - y_s,
            raw.bbox.2 - x_s,
            raw.bbox.3 - y_s,
        );
        let ty0 = height - ly1;
        let ty1 = height - ly0;
        let bbox = Bbox::new(lx0, ty0, lx1, ty1).rotate(width, height, page_rotation)?;

        chars.push(Character {
            bbox,
            unicode: raw.unicode,
            rotation: raw.rotation,
            font: Font {
                name: font_name,
                flags: font_flags,
                size: raw.font_size,
                weight: raw.font_weight,
            },
            char_idx: i,
        });
    }

    Ok(chars)
}

/// Optional de-duplication pass for documents that overprint glyphs to
/// simulate bold text.
///
/// Groups characters into synthetic "words" (breaking on font change,
/// rotation change, or a word-break character), drops any word whose
/// `(rounded bbox, text, rotation, font)` key has already been seen, and
/// returns the flattened characters of the words that survive, in original
/// order. Not part of the default pipeline; callers opt in via
/// [`crate::driver::ExtractOptions::dedup_overprinted`].
pub fn dedup_overprinted_chars(chars: Vec<Character>) -> Vec<Character> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::with_capacity(chars.len());
    for word in group_words(chars) {
        if seen.insert(word_key(&word)) {
            out.extend(word);
        }
    }
    out
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || c == '\u{2}'
}

fn group_words(chars: Vec<Character>) -> Vec<Vec<Character>> {
    let mut words: Vec<Vec<Character>> = Vec::new();
    for c in chars {
        let start_new = match words.last() {
            None => true,
            Some(word) => {
                let last = word.last().unwrap();
                last.font != c.font
                    || last.rotation != c.rotation
                    || is_word_break(last.unicode)
                    || is_word_break(c.unicode)
            }
        };
        if start_new {
            words.push(vec![c]);
        } else {
            words.last_mut().unwrap().push(c);
        }
    }
    words
}

type WordKey = (i64, i64, i64, i64, String, i64, String, i32);

fn word_key(word: &[Character]) -> WordKey {
    let bbox = Bbox::union_all(word.iter().map(|c| &c.bbox)).unwrap_or_else(Bbox::zero);
    let text: String = word.iter().map(|c| c.unicode).collect();
    let font = &word[0].font;
    (
        bbox.x_min.round() as i64,
        bbox.y_min.round() as i64,
        bbox.x_max.round() as i64,
        bbox.y_max.round() as i64,
        text,
        word[0].rotation.round() as i64,
        font.name.clone(),
        font.flags,
    )
}

/// Implements the font-name-sampling/backfill optimization: only every
/// `freq`-th glyph triggers a real font-name/flags read; the glyphs in
/// between reuse the last sampled value, and a changed sample backfills the
/// glyphs since the previous sample.
#[allow(clippy::too_many_arguments)]
fn sample_font(
    page: usize,
    i: usize,
    freq: usize,
    last_sampled: &mut Option<(String, i32)>,
    backfill_from: &mut usize,
    chars_so_far: &mut [Character],
    raw: &RawChar,
) -> Result<(String, i32)> {
    let freq = freq.max(1);
    if i % freq != 0 && last_sampled.is_some() {
        return Ok(last_sampled.clone().unwrap());
    }

    let name = raw.font_name.clone();
    let flags = raw.font_flags;
    if name.is_empty() && i > 0 {
        debug!("font-name decode failed on page {page} char {i}, treating as unnamed");
    }

    if let Some((prev_name, prev_flags)) = last_sampled {
        if *prev_name != name || *prev_flags != flags {
            let start = (*backfill_from).max(i.saturating_sub(freq));
            for c in chars_so_far.iter_mut().skip(start) {
                c.font.name = name.clone();
                c.font.flags = flags;
            }
        }
    }

    *last_sampled = Some((name.clone(), flags));
    *backfill_from = i;
    Ok((name, flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockPage;

    fn char(unicode: char, bbox: (f64, f64, f64, f64), font_name: &str) -> RawChar {
        RawChar {
            unicode,
            rotation: 0.0,
            font_size: 12.0,
            font_weight: 400.0,
            font_name: font_name.to_string(),
            font_flags: 0,
            bbox,
        }
    }

    #[test]
    fn ingests_and_flips_to_top_left_origin() {
        let page = MockPage {
            media_bbox: (0.0, 0.0, 100.0, 200.0),
            rotation: 0,
            chars: vec![char('a', (10.0, 180.0, 20.0, 190.0), "Helvetica")],
            annotations: vec![],
        };
        let backend = crate::backend::mock::MockBackend::new(vec![page]);
        let chars = ingest_page(&backend, 0, true, &Config::default()).unwrap();
        assert_eq!(chars.len(), 1);
        // y=180..190 in bottom-left space, page height 200 -> top-left y = 10..20
        assert_eq!(chars[0].bbox.y_min, 10.0);
        assert_eq!(chars[0].bbox.y_max, 20.0);
        assert_eq!(chars[0].font.name, "Helvetica");
    }

    #[test]
    fn font_sampling_backfills_on_change() {
        let chars: Vec<RawChar> = (0..8)
            .map(|i| {
                let name = if i < 5 { "A" } else { "B" };
                char('x', (0.0, 0.0, 1.0, 1.0), name)
            })
            .collect();
        let page = MockPage {
            media_bbox: (0.0, 0.0, 100.0, 100.0),
            rotation: 0,
            chars,
            annotations: vec![],
        };
        let backend = crate::backend::mock::MockBackend::new(vec![page]);
        let cfg = Config {
            fontname_sample_freq: 6,
            ..Config::default()
        };
        let out = ingest_page(&backend, 0, true, &cfg).unwrap();
        // sampled at 0 and 6; char 6 changed font to "B" and should backfill
        // back to (at most) the previous sample point.
        assert_eq!(out[6].font.name, "B");
        assert_eq!(out[7].font.name, "B");
    }

    fn synthetic_char(idx: usize, unicode: char, bbox: (f64, f64, f64, f64)) -> Character {
        Character {
            bbox: Bbox::new(bbox.0, bbox.1, bbox.2, bbox.3),
            unicode,
            rotation: 0.0,
            font: Font {
                name: "F".into(),
                flags: 0,
                size: 12.0,
                weight: 400.0,
            },
            char_idx: idx,
        }
    }

    #[test]
    fn dedup_drops_repeated_overprinted_word() {
        // "hi hi" where the second "hi" exactly overprints the first.
        let chars = vec![
            synthetic_char(0, 'h', (0.0, 0.0, 5.0, 10.0)),
            synthetic_char(1, 'i', (5.0, 0.0, 10.0, 10.0)),
            synthetic_char(2, ' ', (10.0, 0.0, 15.0, 10.0)),
            synthetic_char(3, 'h', (0.0, 0.0, 5.0, 10.0)),
            synthetic_char(4, 'i', (5.0, 0.0, 10.0, 10.0)),
        ];
        let deduped = dedup_overprinted_chars(chars);
        let text: String = deduped.iter().map(|c| c.unicode).collect();
        assert_eq!(text, "hi ");
    }

    #[test]
    fn dedup_keeps_distinct_words() {
        let chars = vec![
            synthetic_char(0, 'h', (0.0, 0.0, 5.0, 10.0)),
            synthetic_char(1, 'i', (5.0, 0.0, 10.0, 10.0)),
            synthetic_char(2, ' ', (10.0, 0.0, 15.0, 10.0)),
            synthetic_char(3, 'y', (20.0, 0.0, 25.0, 10.0)),
            synthetic_char(4, 'o', (25.0, 0.0, 30.0, 10.0)),
        ];
        let deduped = dedup_overprinted_chars(chars);
        let text: String = deduped.iter().map(|c| c.unicode).collect();
        assert_eq!(text, "hi yo");
    }
}
