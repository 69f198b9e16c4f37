use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Number of grapheme clusters; carets are counted in these units.
pub fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Byte offset of caret position `caret`, clamped to the end of `s`.
pub fn caret_to_byte(s: &str, caret: usize) -> usize {
    s.grapheme_indices(true)
        .nth(caret)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Split `s` at a caret position.
pub fn split_at_caret(s: &str, caret: usize) -> (&str, &str) {
    s.split_at(caret_to_byte(s, caret))
}

/// Insert `text` at `caret`. Returns the new string and the caret after the
/// inserted text.
pub fn insert_at_caret(s: &str, caret: usize, text: &str) -> (String, usize) {
    let (before, after) = split_at_caret(s, caret);
    let caret = grapheme_len(before) + grapheme_len(text);
    (format!("{}{}{}", before, text, after), caret)
}

/// Text fit for a single outline line: line breaks removed, leading tabs
/// trimmed.
pub fn single_line(s: &str) -> String {
    s.trim_start_matches('\t')
        .chars()
        .filter(|&c| c != '\n' && c != '\r')
        .collect()
}

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.split('\t')
        .enumerate()
        .map(|(i, part)| {
            let w = UnicodeWidthStr::width(part);
            if i > 0 { w + 4 } else { w }
        })
        .sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells <= 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}
