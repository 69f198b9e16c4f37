use std::cmp::Ordering;

use indexmap::IndexSet;

use super::line::LineId;
use super::outline::Outline;

/// Selected lines plus the anchors used to grow and shrink the range.
///
/// Membership is kept as a set; iteration order is derived from the
/// current document position of each line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub(crate) lines: IndexSet<LineId>,
    /// Where a range selection started
    pub start: Option<LineId>,
    /// The moving end of a range selection
    pub end: Option<LineId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn contains(&self, id: LineId) -> bool {
        self.lines.contains(&id)
    }

    pub fn set(&mut self, id: LineId, selected: bool) {
        if selected {
            self.lines.insert(id);
        } else {
            self.lines.shift_remove(&id);
        }
    }

    /// Clear the selected lines; anchors are kept unless `anchors` is set.
    pub fn clear(&mut self, anchors: bool) {
        self.lines.clear();
        if anchors {
            self.start = None;
            self.end = None;
        }
    }

    /// Keep only the lines (and anchors) `keep` accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(LineId) -> bool) {
        self.lines.retain(|&id| keep(id));
        if self.start.is_some_and(|id| !keep(id)) {
            self.start = None;
        }
        if self.end.is_some_and(|id| !keep(id)) {
            self.end = None;
        }
    }

    /// Selected lines still in the document
    fn attached<'a>(&'a self, outline: &'a Outline) -> impl Iterator<Item = LineId> + 'a {
        self.lines
            .iter()
            .copied()
            .filter(|&id| outline.contains(id) && outline.is_attached(id))
    }

    /// Selected lines in document order (top first when `ascending`).
    pub fn ordered(&self, outline: &Outline, ascending: bool) -> Vec<LineId> {
        let mut keyed: Vec<(Vec<usize>, LineId)> = self
            .attached(outline)
            .map(|id| (outline.document_path(id), id))
            .collect();
        keyed.sort();
        let mut ordered: Vec<LineId> = keyed.into_iter().map(|(_, id)| id).collect();
        if !ascending {
            ordered.reverse();
        }
        ordered
    }

    /// Topmost selected line
    pub fn top(&self, outline: &Outline) -> Option<LineId> {
        self.attached(outline)
            .min_by(|&a, &b| outline.cmp_position(a, b))
    }

    /// Position of `end` relative to `start`: `Less` when the range grows
    /// upward, `Greater` when it grows downward.
    pub fn direction(&self, outline: &Outline) -> Ordering {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start != end => outline.cmp_position(end, start),
            _ => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_outline;

    #[test]
    fn ordered_follows_document_not_insertion() {
        let outline = parse_outline("a\nb\n\tc\nd\n", "doc");
        let ids: Vec<LineId> = outline.descendants(outline.root()).collect();
        let mut selection = Selection::default();
        selection.set(ids[3], true);
        selection.set(ids[0], true);
        selection.set(ids[2], true);
        assert_eq!(selection.ordered(&outline, true), vec![ids[0], ids[2], ids[3]]);
        assert_eq!(selection.ordered(&outline, false), vec![ids[3], ids[2], ids[0]]);
        assert_eq!(selection.top(&outline), Some(ids[0]));
    }

    #[test]
    fn detached_lines_are_skipped_and_can_be_dropped() {
        let mut outline = parse_outline("a\nb\n\tc\n", "doc");
        let ids: Vec<LineId> = outline.descendants(outline.root()).collect();
        let mut selection = Selection::default();
        selection.set(ids[0], true);
        selection.set(ids[2], true);
        selection.start = Some(ids[2]);
        outline.detach(ids[1]);
        assert_eq!(selection.top(&outline), Some(ids[0]));
        assert_eq!(selection.ordered(&outline, true), vec![ids[0]]);

        selection.retain(|id| outline.is_attached(id));
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.start, None);
    }

    #[test]
    fn direction_of_range() {
        let outline = parse_outline("a\nb\nc\n", "doc");
        let ids: Vec<LineId> = outline.descendants(outline.root()).collect();
        let mut selection = Selection {
            start: Some(ids[1]),
            end: Some(ids[2]),
            ..Default::default()
        };
        assert_eq!(selection.direction(&outline), Ordering::Greater);
        selection.end = Some(ids[0]);
        assert_eq!(selection.direction(&outline), Ordering::Less);
        selection.end = Some(ids[1]);
        assert_eq!(selection.direction(&outline), Ordering::Equal);
    }

    #[test]
    fn clear_can_keep_anchors() {
        let mut selection = Selection::default();
        selection.set(LineId(1), true);
        selection.start = Some(LineId(1));
        selection.clear(false);
        assert!(selection.is_empty());
        assert_eq!(selection.start, Some(LineId(1)));
        selection.clear(true);
        assert_eq!(selection.start, None);
    }
}
