use crate::model::line::LineId;
use crate::model::outline::Outline;

use super::outline_parser::TAB;

/// Serialize the whole document: every line under the root, folded or not,
/// with `level - 1` leading tabs and a trailing `\n` per line.
pub fn serialize_outline(outline: &Outline) -> String {
    let mut out = String::new();
    for id in outline.descendants(outline.root()) {
        push_line(&mut out, outline.text(id), outline.level(id).saturating_sub(1));
        out.push('\n');
    }
    out
}

/// Serialize a list of lines relative to `base_level` (that level gets no tabs).
/// Lines are joined with `\n`, without a trailing newline.
pub fn serialize_lines(outline: &Outline, lines: &[LineId], base_level: usize) -> String {
    let mut out = String::new();
    for (i, &id) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        push_line(&mut out, outline.text(id), outline.level(id).saturating_sub(base_level));
    }
    out
}

fn push_line(out: &mut String, text: &str, tabs: usize) {
    for _ in 0..tabs {
        out.push(TAB);
    }
    out.push_str(text);
}
