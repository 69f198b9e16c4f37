use crate::model::line::LineId;
use crate::model::outline::Outline;
use crate::model::tag::TagIndex;

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Index `line` under one tag. A line already present stays where it is.
pub fn bind_tag(index: &mut TagIndex, outline: &Outline, line: LineId, tag: &str) {
    if line == outline.root() {
        return;
    }
    let is_done = outline.line(line).is_done;
    let entry = index.entry(tag);
    if entry.contains(line) {
        return;
    }
    if is_done {
        entry.done.push(line);
    } else {
        entry.active.push(line);
    }
}

/// Remove `line` from one tag. Empty, unpinned tags disappear.
pub fn unbind_tag(index: &mut TagIndex, line: LineId, tag: &str) {
    let Some(entry) = index.get_mut(tag) else {
        return;
    };
    entry.active.retain(|&l| l != line);
    entry.done.retain(|&l| l != line);
    if entry.is_empty() && !entry.pinned {
        index.entries.shift_remove(tag);
    }
}

/// Index `line` under every tag it carries.
pub fn bind(index: &mut TagIndex, outline: &Outline, line: LineId) {
    let tags: Vec<String> = outline.line(line).tags().iter().cloned().collect();
    for tag in &tags {
        bind_tag(index, outline, line, tag);
    }
}

/// Drop `line` from every tag.
pub fn unbind(index: &mut TagIndex, line: LineId) {
    let tags: Vec<String> = index.tags().map(str::to_string).collect();
    for tag in &tags {
        unbind_tag(index, line, tag);
    }
}

/// Bind a line and all its descendants (after they join the document).
pub fn bind_subtree(index: &mut TagIndex, outline: &Outline, top: LineId) {
    bind(index, outline, top);
    for id in outline.descendants(top) {
        bind(index, outline, id);
    }
}

/// Unbind a line and all its descendants (after they leave the document).
pub fn unbind_subtree(index: &mut TagIndex, outline: &Outline, top: LineId) {
    unbind(index, top);
    for id in outline.descendants(top) {
        unbind(index, id);
    }
}

/// Rebuild every tag's lists from the tree in document order.
/// Tag flags and tag order are kept.
pub fn rebuild(index: &mut TagIndex, outline: &Outline) {
    for entry in index.entries.values_mut() {
        entry.active.clear();
        entry.done.clear();
    }
    for id in outline.descendants(outline.root()) {
        bind(index, outline, id);
    }
    index
        .entries
        .retain(|_, entry| !entry.is_empty() || entry.pinned);
}

// ---------------------------------------------------------------------------
// Done / active partition
// ---------------------------------------------------------------------------

/// Relocate a line after its done flag changed: newly done lines go to the
/// head of the done list, reopened ones to the tail of the active list.
pub fn on_done_changed(index: &mut TagIndex, outline: &Outline, line: LineId) {
    let is_done = outline.line(line).is_done;
    let tags: Vec<String> = outline.line(line).tags().iter().cloned().collect();
    for tag in &tags {
        if !is_done && !index.get(tag).is_some_and(|entry| entry.contains(line)) {
            // Dropped by "remove all done" while it was done
            bind_tag(index, outline, line, tag);
            continue;
        }
        let Some(entry) = index.get_mut(tag) else {
            continue;
        };
        if is_done {
            if let Some(pos) = entry.active.iter().position(|&l| l == line) {
                entry.active.remove(pos);
                entry.done.insert(0, line);
            }
        } else if let Some(pos) = entry.done.iter().position(|&l| l == line) {
            entry.done.remove(pos);
            entry.active.push(line);
        }
    }
}

/// Position of `line` in whichever list of `tag` holds it
pub fn list_position(index: &TagIndex, tag: &str, line: LineId) -> Option<usize> {
    let entry = index.get(tag)?;
    entry
        .active
        .iter()
        .position(|&l| l == line)
        .or_else(|| entry.done.iter().position(|&l| l == line))
}

/// Where `line` sits under `tag`: its list position and the tag's position
/// in the tag list.
pub fn mark(index: &TagIndex, tag: &str, line: LineId) -> Option<(usize, usize)> {
    Some((list_position(index, tag, line)?, index.entries.get_index_of(tag)?))
}

/// Move `tag` to `pos` (clamped) in the tag list.
pub fn restore_tag_position(index: &mut TagIndex, tag: &str, pos: usize) {
    let Some(current) = index.entries.get_index_of(tag) else {
        return;
    };
    let last = index.entries.len() - 1;
    index.entries.move_index(current, pos.min(last));
}

/// Put `line` back at `pos` (clamped) inside whichever list holds it.
pub fn restore_position(index: &mut TagIndex, tag: &str, line: LineId, pos: usize) {
    let Some(entry) = index.get_mut(tag) else {
        return;
    };
    for list in [&mut entry.active, &mut entry.done] {
        if let Some(current) = list.iter().position(|&l| l == line) {
            list.remove(current);
            list.insert(pos.min(list.len()), line);
            return;
        }
    }
}

/// Manually move an active line to `new_index`. Done lines are never
/// reordered by hand; returns `false` for them and for out-of-range targets.
pub fn reorder(index: &mut TagIndex, tag: &str, line: LineId, new_index: usize) -> bool {
    let Some(entry) = index.get_mut(tag) else {
        return false;
    };
    let Some(old_index) = entry.active.iter().position(|&l| l == line) else {
        return false;
    };
    if new_index >= entry.active.len() {
        return false;
    }
    if old_index != new_index {
        entry.active.remove(old_index);
        entry.active.insert(new_index, line);
    }
    true
}

/// Clear the done list of `tag` unless it is a repeat tag.
/// Returns how many lines were dropped from the index.
pub fn remove_all_done(index: &mut TagIndex, tag: &str) -> usize {
    let Some(entry) = index.get_mut(tag) else {
        return 0;
    };
    if entry.repeat {
        return 0;
    }
    let removed = entry.done.len();
    entry.done.clear();
    if entry.is_empty() && !entry.pinned {
        index.entries.shift_remove(tag);
    }
    removed
}

// ---------------------------------------------------------------------------
// Tag flags
// ---------------------------------------------------------------------------

pub fn set_pinned(index: &mut TagIndex, tag: &str, pinned: bool) {
    if pinned {
        index.entry(tag).pinned = true;
    } else if let Some(entry) = index.get_mut(tag) {
        entry.pinned = false;
        if entry.is_empty() {
            index.entries.shift_remove(tag);
        }
    }
}

pub fn set_repeat(index: &mut TagIndex, tag: &str, repeat: bool) {
    if let Some(entry) = index.get_mut(tag) {
        entry.repeat = repeat;
    }
}

pub fn set_folded(index: &mut TagIndex, tag: &str, folded: bool) {
    if let Some(entry) = index.get_mut(tag) {
        entry.folded = folded;
    }
}

// ---------------------------------------------------------------------------
// Persisted manual order
// ---------------------------------------------------------------------------

/// Snapshot the active list of `tag` as line texts.
pub fn line_order(index: &TagIndex, outline: &Outline, tag: &str) -> Vec<String> {
    index
        .get(tag)
        .map(|entry| {
            entry
                .active
                .iter()
                .map(|&id| outline.text(id).to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Reorder the active list of `tag` to follow a saved text order. Each
/// snippet claims the first unclaimed line with equal text; lines that
/// match nothing keep their encounter order after the matched ones.
pub fn apply_line_order(index: &mut TagIndex, outline: &Outline, tag: &str, order: &[String]) {
    let Some(entry) = index.get_mut(tag) else {
        return;
    };
    let mut remaining: Vec<LineId> = entry.active.clone();
    let mut sorted = Vec::with_capacity(remaining.len());
    for text in order {
        if let Some(pos) = remaining.iter().position(|&id| outline.text(id) == text) {
            sorted.push(remaining.remove(pos));
        }
    }
    sorted.extend(remaining);
    entry.active = sorted;
}

/// Put tags in a saved order. Unknown names are skipped; tags missing
/// from `order` keep their relative order after the listed ones.
pub fn apply_tag_order(index: &mut TagIndex, order: &[String]) {
    let rank = |tag: &str| order.iter().position(|t| t == tag).unwrap_or(usize::MAX);
    index
        .entries
        .sort_by(|a, _, b, _| rank(a.as_str()).cmp(&rank(b.as_str())));
}
