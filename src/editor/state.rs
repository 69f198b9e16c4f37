use crate::model::line::LineId;
use crate::model::outline::Outline;
use crate::model::selection::Selection;
use crate::model::tag::TagIndex;
use crate::ops::tag_ops;

/// Focused line plus caret position (in grapheme clusters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub line: LineId,
    pub pos: usize,
}

impl Caret {
    pub fn new(line: LineId, pos: usize) -> Self {
        Caret { line, pos }
    }
}

/// Everything an [`Action`](super::undo::Action) can touch.
///
/// Owned by exactly one [`Document`](super::Document); actions receive it
/// by `&mut` and nothing else mutates it while an action runs.
#[derive(Debug, Clone)]
pub struct EditState {
    pub outline: Outline,
    pub tags: TagIndex,
    pub selection: Selection,
    pub focus: Option<Caret>,
    /// Set by fold-all, cleared by unfold-all
    pub all_folded: bool,
    /// Lines whose layout must be recomputed, oldest request first
    pub(crate) layout: Vec<LineId>,
}

impl EditState {
    /// Wrap a loaded outline and index its tags.
    pub fn new(outline: Outline) -> Self {
        let mut tags = TagIndex::default();
        tag_ops::rebuild(&mut tags, &outline);
        EditState {
            outline,
            tags,
            selection: Selection::default(),
            focus: None,
            all_folded: false,
            layout: Vec::new(),
        }
    }

    pub fn focused_line(&self) -> Option<LineId> {
        self.focus.map(|caret| caret.line)
    }

    pub fn request_layout(&mut self, line: LineId) {
        if !self.layout.contains(&line) {
            self.layout.push(line);
        }
    }

    /// Take the queued layout requests, dropping lines that left the document.
    pub(crate) fn take_layout(&mut self) -> Vec<LineId> {
        let queued = std::mem::take(&mut self.layout);
        queued
            .into_iter()
            .filter(|&line| self.outline.is_attached(line))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_outline;

    #[test]
    fn new_state_indexes_tags() {
        let state = EditState::new(parse_outline("a #x\nb\n\tc #x #y\n", "doc"));
        assert_eq!(state.tags.get("x").map(|e| e.len()), Some(2));
        assert_eq!(state.tags.get("y").map(|e| e.len()), Some(1));
        assert!(state.focus.is_none());
    }

    #[test]
    fn layout_requests_are_deduplicated() {
        let mut state = EditState::new(parse_outline("a\nb\n", "doc"));
        let a = state.outline.first_line().unwrap();
        state.request_layout(a);
        state.request_layout(a);
        let detached = state.outline.create_line("gone");
        state.request_layout(detached);
        assert_eq!(state.take_layout(), vec![a]);
        assert!(state.take_layout().is_empty());
    }
}
