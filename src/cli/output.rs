use serde::Serialize;

use crate::model::line::LineId;
use crate::model::outline::Outline;
use crate::model::tag::TagIndex;
use crate::util::unicode::truncate_to_width;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LineJson {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LineJson>,
}

#[derive(Serialize)]
pub struct OutlineJson {
    pub name: String,
    pub lines: Vec<LineJson>,
}

#[derive(Serialize)]
pub struct TagJson {
    pub name: String,
    pub pinned: bool,
    pub repeat: bool,
    pub active: Vec<String>,
    pub done: Vec<String>,
}

#[derive(Serialize)]
pub struct ApplyJson {
    pub events: usize,
    pub clipboard: Vec<String>,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn line_to_json(outline: &Outline, line: LineId, depth: Option<usize>) -> LineJson {
    let children = match depth {
        Some(0) | Some(1) => Vec::new(),
        _ => outline
            .children(line)
            .iter()
            .map(|&child| line_to_json(outline, child, depth.map(|d| d - 1)))
            .collect(),
    };
    LineJson {
        text: outline.text(line).to_string(),
        tags: outline.line(line).tags().iter().cloned().collect(),
        children,
    }
}

pub fn outline_to_json(outline: &Outline, depth: Option<usize>) -> OutlineJson {
    let root = outline.root();
    OutlineJson {
        name: outline.text(root).to_string(),
        lines: outline
            .children(root)
            .iter()
            .map(|&line| line_to_json(outline, line, depth))
            .collect(),
    }
}

pub fn tags_to_json(index: &TagIndex, outline: &Outline) -> Vec<TagJson> {
    index
        .iter()
        .map(|(name, entry)| TagJson {
            name: name.to_string(),
            pinned: entry.pinned,
            repeat: entry.repeat,
            active: entry
                .active
                .iter()
                .map(|&id| outline.text(id).to_string())
                .collect(),
            done: entry
                .done
                .iter()
                .map(|&id| outline.text(id).to_string())
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One row per line, two spaces per level, `+` marking lines with children.
pub fn format_outline(outline: &Outline, depth: Option<usize>, width: Option<usize>) -> Vec<String> {
    let mut rows = Vec::new();
    for line in outline.descendants(outline.root()) {
        let level = outline.level(line);
        if depth.is_some_and(|d| level > d) {
            continue;
        }
        let marker = if outline.count(line) > 0 { '+' } else { '-' };
        let row = format!("{}{} {}", "  ".repeat(level - 1), marker, outline.text(line));
        rows.push(match width {
            Some(w) => truncate_to_width(&row, w),
            None => row,
        });
    }
    rows
}

pub fn format_tag(name: &str, index: &TagIndex, outline: &Outline) -> Vec<String> {
    let Some(entry) = index.get(name) else {
        return Vec::new();
    };
    let mut flags = Vec::new();
    if entry.pinned {
        flags.push("pinned");
    }
    if entry.repeat {
        flags.push("repeat");
    }
    let header = if flags.is_empty() {
        format!("#{} ({})", name, entry.len())
    } else {
        format!("#{} ({}) [{}]", name, entry.len(), flags.join(", "))
    };
    let mut lines = vec![header];
    for &id in &entry.active {
        lines.push(format!("  [ ] {}", outline.text(id)));
    }
    for &id in &entry.done {
        lines.push(format!("  [x] {}", outline.text(id)));
    }
    lines
}
