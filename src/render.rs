//! Text rendering: reading-order sort, whitespace/control normalisation,
//! ligature expansion, and hyphenation fixup.

use icu_properties::{maps, GeneralCategoryGroup};

use crate::model::{Block, Page};

const SPACE_EQUIVALENTS: [char; 4] = ['\u{0020}', '\u{FFFE}', '\u{FEFF}', '\u{00A0}'];
const LINE_BREAK_EQUIVALENTS: [char; 3] = ['\u{000A}', '\u{000D}', '\u{000C}'];
const HYPHEN_SENTINEL: char = '\u{0002}';

const LIGATURES: &[(&str, &str)] = &[
    ("\u{FB00}", "ff"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB06}", "st"),
    ("\u{FB05}", "st"),
];

/// Bucket-and-sort a page's blocks into reading order: top-to-bottom by
/// `y_min` bucketed to a `tolerance`-wide band, left-to-right within a
/// bucket.
pub fn sort_blocks(mut blocks: Vec<Block>, tolerance: f64) -> Vec<Block> {
    blocks.sort_by(|a, b| {
        let bucket_a = (a.bbox.y_min / tolerance).round() * tolerance;
        let bucket_b = (b.bbox.y_min / tolerance).round() * tolerance;
        bucket_a
            .partial_cmp(&bucket_b)
            .unwrap()
            .then(a.bbox.x_min.partial_cmp(&b.bbox.x_min).unwrap())
    });
    blocks
}

/// Normalise whitespace/control characters and expand ligatures.
///
/// Replaces `\r\n` with `\n`, maps space- and line-break-equivalent code
/// points to their canonical forms, strips any remaining Unicode "C*"
/// (control/format/surrogate/private-use/unassigned) character that isn't
/// plain whitespace or the hyphenation sentinel, then expands ligatures.
pub fn postprocess_text(input: &str) -> String {
    let normalised = input.replace("\r\n", "\n");
    let mut out = String::with_capacity(normalised.len());

    for c in normalised.chars() {
        if SPACE_EQUIVALENTS.contains(&c) {
            out.push(' ');
            continue;
        }
        if LINE_BREAK_EQUIVALENTS.contains(&c) {
            out.push('\n');
            continue;
        }
        if c == '\t' {
            out.push('\t');
            continue;
        }
        if c == HYPHEN_SENTINEL {
            out.push(c);
            continue;
        }
        if is_stripped_control(c) {
            continue;
        }
        out.push(c);
    }

    expand_ligatures(&out)
}

fn is_stripped_control(c: char) -> bool {
    if c.is_whitespace() {
        return false;
    }
    GeneralCategoryGroup::from(maps::general_category().get(c))
        .contains(GeneralCategoryGroup::Other)
}

fn expand_ligatures(input: &str) -> String {
    let mut out = input.to_string();
    for (lig, expansion) in LIGATURES {
        if out.contains(lig) {
            out = out.replace(lig, expansion);
        }
    }
    out
}

/// Apply the hyphenation-sentinel policy to fully rendered text.
///
/// With `keep_hyphens`, every sentinel becomes a literal `"-\n"`. Otherwise
/// the sentinel and any line breaks immediately following it are swallowed,
/// joining the word across the break; the next space terminates the join by
/// emitting a single `\n`.
pub fn handle_hyphens(input: &str, keep_hyphens: bool) -> String {
    if keep_hyphens {
        return input.replace(HYPHEN_SENTINEL, "-\n");
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != HYPHEN_SENTINEL {
            out.push(c);
            continue;
        }
        while matches!(chars.peek(), Some('\n') | Some('\r')) {
            chars.next();
        }
        match chars.peek() {
            Some(' ') => {
                chars.next();
                out.push('\n');
            }
            Some(_) => {}
            None => {}
        }
    }
    out
}

/// Render a page to a single string.
///
/// When `sort` is set, blocks are reordered via [`sort_blocks`] (tolerance
/// `1.25`) before rendering. `keep_hyphens` controls [`handle_hyphens`].
pub fn merge(page: &Page, sort: bool, keep_hyphens: bool) -> String {
    if sort {
        let sorted = sort_blocks(page.blocks.clone(), 1.25);
        merge_blocks(&sorted.iter().collect::<Vec<_>>(), keep_hyphens)
    } else {
        merge_blocks(&page.blocks.iter().collect::<Vec<_>>(), keep_hyphens)
    }
}

fn merge_blocks(blocks: &[&Block], keep_hyphens: bool) -> String {
    let mut page_text = String::new();
    for block in blocks {
        let mut block_text = String::new();
        for line in &block.lines {
            let raw: String = line.spans.iter().map(|s| s.text.as_str()).collect();
            let mut line_text = postprocess_text(&raw);
            while line_text.ends_with(|c: char| c.is_whitespace()) {
                line_text.pop();
            }
            line_text.push('\n');
            block_text.push_str(&line_text);
        }
        while block_text.ends_with(|c: char| c.is_whitespace()) {
            block_text.pop();
        }
        block_text.push_str("\n\n");
        page_text.push_str(&block_text);
    }
    handle_hyphens(&page_text, keep_hyphens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bbox;

    #[test]
    fn postprocess_maps_space_equivalents() {
        let out = postprocess_text("a\u{00A0}b");
        assert_eq!(out, "a b");
    }

    #[test]
    fn postprocess_strips_control_but_keeps_hyphen_sentinel() {
        let out = postprocess_text("a\u{0002}b\u{0007}c");
        assert_eq!(out, "a\u{0002}bc");
    }

    #[test]
    fn postprocess_expands_ligatures() {
        assert_eq!(postprocess_text("\u{FB01}sh"), "fish");
    }

    #[test]
    fn handle_hyphens_keep_true_inserts_literal_break() {
        let out = handle_hyphens("hy\u{0002}phen", true);
        assert_eq!(out, "hy-\nphen");
    }

    #[test]
    fn handle_hyphens_keep_false_joins_across_break() {
        let out = handle_hyphens("hy\u{0002}\nphen more", false);
        assert_eq!(out, "hyphen more");
    }

    #[test]
    fn sort_blocks_is_permutation_ordered_top_to_bottom() {
        let blocks = vec![
            Block {
                bbox: Bbox::new(0.0, 100.0, 10.0, 110.0),
                lines: vec![],
            },
            Block {
                bbox: Bbox::new(0.0, 0.0, 10.0, 10.0),
                lines: vec![],
            },
        ];
        let sorted = sort_blocks(blocks, 1.25);
        assert_eq!(sorted[0].bbox.y_min, 0.0);
        assert_eq!(sorted[1].bbox.y_min, 100.0);
    }
}
