//! The character → span → line → block grouping pipeline.

pub mod block;
pub mod line;
pub mod script;
pub mod span;

use crate::model::{Block, Character};

/// Run the full grouping pipeline over one page's characters: spans, then
/// lines, then the superscript/subscript pass, then blocks.
pub fn group_page(chars: &[Character]) -> Vec<Block> {
    let spans = span::build_spans(chars);
    let mut lines = line::build_lines(spans);
    script::assign_scripts(&mut lines);
    block::build_blocks(lines)
}
