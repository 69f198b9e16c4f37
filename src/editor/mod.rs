//! Document controller: turns edit gestures into chains of [`Action`]s.
//!
//! Every structural change goes through the [`ActionLog`]; focus moves and
//! selection gestures change state directly and are not part of history.
//! Typing is applied at once and folded into one pending text edit per
//! line, committed as a single undo step when anything else happens.

pub mod clipboard;
pub mod edit;
pub mod fold;
pub mod input;
pub mod select;
pub mod state;
pub mod undo;

use crate::model::config::EditorConfig;
use crate::model::line::LineId;
use crate::model::outline::Outline;
use crate::model::selection::Selection;
use crate::model::tag::TagIndex;
use crate::ops::tag_ops;
use crate::parse::{parse_outline, serialize_outline};
use crate::util::unicode::grapheme_len;

pub use input::{InputEvent, KeyRepeat};
pub use state::{Caret, EditState};
pub use undo::{Action, ActionError, ActionLog, Slot, TagMark};

/// Notifications for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Lines from this one down need to be laid out again
    LayoutFrom(LineId),
    /// An undo step was committed, undone or redone
    ChainEnded,
}

/// Typing not yet turned into an undo step
#[derive(Debug, Clone)]
struct PendingText {
    line: LineId,
    old: String,
    marks: Vec<TagMark>,
    idle_ms: u64,
}

/// Slot and visible predecessor of the focused line
#[derive(Debug, Clone, Copy)]
struct FocusAnchor {
    parent: LineId,
    index: usize,
    above: Option<LineId>,
}

/// One open document: tree, tag index, selection and history.
#[derive(Debug)]
pub struct Document {
    state: EditState,
    log: ActionLog,
    config: EditorConfig,
    pending: Option<PendingText>,
    events: Vec<DocumentEvent>,
}

impl Document {
    pub fn new(outline: Outline, config: EditorConfig) -> Self {
        let log = ActionLog::with_limit(config.undo_limit);
        let mut state = EditState::new(outline);
        state.focus = state.outline.first_line().map(|line| Caret::new(line, 0));
        Document {
            state,
            log,
            config,
            pending: None,
            events: Vec::new(),
        }
    }

    /// Load a document from the tab-indented text format.
    pub fn from_text(source: &str, name: &str, config: EditorConfig) -> Self {
        Self::new(parse_outline(source, name), config)
    }

    /// Serialize to the tab-indented text format.
    pub fn to_text(&self) -> String {
        serialize_outline(&self.state.outline)
    }

    pub fn name(&self) -> &str {
        self.state.outline.text(self.state.outline.root())
    }

    pub fn outline(&self) -> &Outline {
        &self.state.outline
    }

    pub fn tags(&self) -> &TagIndex {
        &self.state.tags
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn focus(&self) -> Option<Caret> {
        self.state.focus
    }

    pub fn focused_line(&self) -> Option<LineId> {
        self.state.focused_line()
    }

    pub fn is_all_folded(&self) -> bool {
        self.state.all_folded
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.pending.is_some() || self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn has_pending_text(&self) -> bool {
        self.pending.is_some()
    }

    /// Hand queued notifications to the presentation layer.
    pub fn drain_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // History plumbing
    // -----------------------------------------------------------------------

    pub(crate) fn start_chain(&mut self) {
        if !self.log.in_chain() {
            self.commit_text();
        }
        self.log.start_chain();
    }

    pub(crate) fn end_chain(&mut self) {
        if self.log.end_chain() {
            self.flush_layout(true);
        }
    }

    /// Execute one action; outside a chain it is its own undo step.
    pub(crate) fn run(&mut self, action: Action) {
        if !self.log.in_chain() {
            self.commit_text();
        }
        if let Err(err) = self.log.execute(action, &mut self.state) {
            fatal(err);
        }
        if !self.log.in_chain() {
            self.flush_layout(true);
        }
    }

    /// Record a focus change as part of the current chain.
    pub(crate) fn run_focus(&mut self, new: Option<Caret>) {
        if self.state.focus != new {
            self.run(Action::Focus {
                old: self.state.focus,
                new,
            });
        }
    }

    fn flush_layout(&mut self, chain_ended: bool) {
        for line in self.state.take_layout() {
            self.events.push(DocumentEvent::LayoutFrom(line));
        }
        if chain_ended {
            self.events.push(DocumentEvent::ChainEnded);
        }
    }

    /// Turn pending typing into an undo step.
    pub fn commit_text(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let new = self.state.outline.text(pending.line).to_string();
        if new == pending.old {
            return;
        }
        log::debug!("commit typing on {}", pending.line);
        self.log.record(Action::SetText {
            line: pending.line,
            old: pending.old,
            new,
            marks: pending.marks,
        });
    }

    /// Advance the idle timer of pending typing; long enough pauses split
    /// typing into separate undo steps.
    pub fn tick(&mut self, elapsed_ms: u64) {
        let interval = self.config.text_input_fix_interval_ms;
        let due = match self.pending.as_mut() {
            Some(pending) => {
                pending.idle_ms = pending.idle_ms.saturating_add(elapsed_ms);
                pending.idle_ms >= interval
            }
            None => false,
        };
        if due {
            self.commit_text();
        }
    }

    pub fn undo(&mut self) -> bool {
        self.commit_text();
        let anchor = self.focus_anchor();
        match self.log.undo(&mut self.state) {
            Ok(true) => {
                self.settle_after_history(anchor);
                self.flush_layout(true);
                true
            }
            Ok(false) => false,
            Err(err) => fatal(err),
        }
    }

    pub fn redo(&mut self) -> bool {
        self.commit_text();
        let anchor = self.focus_anchor();
        match self.log.redo(&mut self.state) {
            Ok(true) => {
                self.settle_after_history(anchor);
                self.flush_layout(true);
                true
            }
            Ok(false) => false,
            Err(err) => fatal(err),
        }
    }

    /// Where the focused line sits, for finding a replacement if history
    /// takes it out of the document.
    fn focus_anchor(&self) -> Option<FocusAnchor> {
        let line = self.state.focused_line()?;
        let outline = &self.state.outline;
        Some(FocusAnchor {
            parent: outline.parent(line)?,
            index: outline.index(line)?,
            above: outline.prev_visible(line),
        })
    }

    /// Undo and redo do not record focus moves, so the caret or selection
    /// can be left on lines that just left the document.
    fn settle_after_history(&mut self, anchor: Option<FocusAnchor>) {
        let outline = &self.state.outline;
        let root = outline.root();
        self.state
            .selection
            .retain(|line| line != root && outline.contains(line) && outline.is_attached(line));

        let Some(caret) = self.state.focus else {
            return;
        };
        if self.state.outline.is_visible(caret.line) {
            return;
        }
        let outline = &self.state.outline;
        let replacement = anchor
            .and_then(|anchor| {
                let at_slot = outline
                    .child(anchor.parent, anchor.index)
                    .or_else(|| outline.children(anchor.parent).last().copied());
                at_slot
                    .filter(|&line| outline.is_visible(line))
                    .or(anchor.above.filter(|&line| outline.is_visible(line)))
            })
            .or_else(|| outline.first_line());
        log::debug!("focus moved off {} after history step", caret.line);
        self.state.focus = replacement.map(|line| {
            let len = grapheme_len(outline.text(line));
            Caret::new(line, caret.pos.min(len))
        });
    }

    // -----------------------------------------------------------------------
    // Focus & navigation
    // -----------------------------------------------------------------------

    fn is_editable(&self, line: LineId) -> bool {
        self.state.outline.contains(line)
            && line != self.state.outline.root()
            && self.state.outline.is_attached(line)
    }

    /// Move the text focus. The caret is clamped to the line length.
    pub fn focus_line(&mut self, line: LineId, caret: usize) -> bool {
        if !self.is_editable(line) {
            return false;
        }
        if self.pending.as_ref().is_some_and(|p| p.line != line) {
            self.commit_text();
        }
        let len = grapheme_len(self.state.outline.text(line));
        self.state.focus = Some(Caret::new(line, caret.min(len)));
        true
    }

    /// Move the caret within the focused line.
    pub fn set_caret(&mut self, pos: usize) {
        if let Some(caret) = self.state.focus {
            self.focus_line(caret.line, pos);
        }
    }

    /// Plain arrows drop the selection, leaving focus at its moving end.
    fn collapse_selection(&mut self) {
        if self.state.selection.is_empty() {
            return;
        }
        if let Some(end) = self.state.selection.end {
            let pos = self.state.focus.map(|c| c.pos).unwrap_or(0);
            self.focus_line(end, pos);
        }
        self.state.selection.clear(true);
    }

    pub fn move_up(&mut self) {
        self.collapse_selection();
        let Some(caret) = self.state.focus else {
            return;
        };
        if let Some(prev) = self.state.outline.prev_visible(caret.line) {
            self.focus_line(prev, caret.pos);
        }
    }

    pub fn move_down(&mut self) {
        self.collapse_selection();
        let Some(caret) = self.state.focus else {
            return;
        };
        if let Some(next) = self.state.outline.next_visible(caret.line) {
            self.focus_line(next, caret.pos);
        }
    }

    /// Caret left; at the start of a line, jump to the end of the previous one.
    pub fn move_left(&mut self) {
        self.collapse_selection();
        let Some(caret) = self.state.focus else {
            return;
        };
        if caret.pos > 0 {
            self.focus_line(caret.line, caret.pos - 1);
        } else if let Some(prev) = self.state.outline.prev_visible(caret.line) {
            let end = grapheme_len(self.state.outline.text(prev));
            self.focus_line(prev, end);
        }
    }

    /// Caret right; at the end of a line, jump to the start of the next one.
    pub fn move_right(&mut self) {
        self.collapse_selection();
        let Some(caret) = self.state.focus else {
            return;
        };
        let len = grapheme_len(self.state.outline.text(caret.line));
        if caret.pos < len {
            self.focus_line(caret.line, caret.pos + 1);
        } else if let Some(next) = self.state.outline.next_visible(caret.line) {
            self.focus_line(next, 0);
        }
    }

    /// Selected lines in document order, or just the focused line.
    pub(crate) fn selected_or_focused(&self, ascending: bool) -> Vec<LineId> {
        if self.state.selection.is_empty() {
            self.state.focused_line().into_iter().collect()
        } else {
            self.state.selection.ordered(&self.state.outline, ascending)
        }
    }

    // -----------------------------------------------------------------------
    // Tag list
    // -----------------------------------------------------------------------

    // Tag list gestures act on the index only and are not undoable.

    pub fn reorder_tag(&mut self, tag: &str, line: LineId, new_index: usize) -> bool {
        tag_ops::reorder(&mut self.state.tags, tag, line, new_index)
    }

    pub fn remove_all_done(&mut self, tag: &str) -> usize {
        let removed = tag_ops::remove_all_done(&mut self.state.tags, tag);
        if removed > 0 {
            log::debug!("dropped {} done line(s) from #{}", removed, tag);
        }
        removed
    }

    pub fn set_tag_pinned(&mut self, tag: &str, pinned: bool) {
        tag_ops::set_pinned(&mut self.state.tags, tag, pinned);
    }

    pub fn set_tag_repeat(&mut self, tag: &str, repeat: bool) {
        tag_ops::set_repeat(&mut self.state.tags, tag, repeat);
    }

    pub fn set_tag_folded(&mut self, tag: &str, folded: bool) {
        tag_ops::set_folded(&mut self.state.tags, tag, folded);
    }

    /// Restore a saved manual order for a tag's active list.
    pub fn apply_line_order(&mut self, tag: &str, order: &[String]) {
        tag_ops::apply_line_order(&mut self.state.tags, &self.state.outline, tag, order);
    }

    /// Index access for loaders restoring saved tag state
    pub(crate) fn tags_mut(&mut self) -> &mut TagIndex {
        &mut self.state.tags
    }
}

/// An action did not match the state it was built for. History can no
/// longer be trusted, so this never returns.
fn fatal(err: ActionError) -> ! {
    log::error!("internal consistency error: {}", err);
    panic!("internal consistency error: {}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(source: &str) -> Document {
        Document::from_text(source, "doc", EditorConfig::default())
    }

    fn id(doc: &Document, text: &str) -> LineId {
        doc.outline()
            .descendants(doc.outline().root())
            .find(|&id| doc.outline().text(id) == text)
            .unwrap()
    }

    #[test]
    fn new_document_focuses_first_line() {
        let d = doc("a\nb\n");
        assert_eq!(d.focus(), Some(Caret::new(id(&d, "a"), 0)));
        assert_eq!(d.name(), "doc");
        assert!(!d.can_undo());
    }

    #[test]
    fn focus_clamps_caret_and_rejects_root() {
        let mut d = doc("abc\n");
        let a = id(&d, "abc");
        assert!(d.focus_line(a, 99));
        assert_eq!(d.focus(), Some(Caret::new(a, 3)));
        let root = d.outline().root();
        assert!(!d.focus_line(root, 0));
    }

    #[test]
    fn arrows_cross_line_boundaries() {
        let mut d = doc("ab\ncd\n");
        let (ab, cd) = (id(&d, "ab"), id(&d, "cd"));
        d.focus_line(ab, 2);
        d.move_right();
        assert_eq!(d.focus(), Some(Caret::new(cd, 0)));
        d.move_left();
        assert_eq!(d.focus(), Some(Caret::new(ab, 2)));
        d.move_left();
        assert_eq!(d.focus(), Some(Caret::new(ab, 1)));
        d.move_down();
        assert_eq!(d.focus(), Some(Caret::new(cd, 1)));
        d.move_down();
        assert_eq!(d.focus(), Some(Caret::new(cd, 1)));
        d.move_up();
        assert_eq!(d.focus_line_text(), "ab");
    }

    #[test]
    fn arrows_skip_folded_children() {
        let mut d = doc("a\n\tb\nc\n");
        let (a, c) = (id(&d, "a"), id(&d, "c"));
        d.set_folded(a, true);
        d.focus_line(a, 0);
        d.move_down();
        assert_eq!(d.focused_line(), Some(c));
    }

    #[test]
    fn plain_arrow_collapses_selection_to_end() {
        let mut d = doc("a\nb\nc\n");
        let a = id(&d, "a");
        d.focus_line(a, 0);
        d.extend_down();
        assert_eq!(d.selection().len(), 2);
        // Focus jumps to the selection end ("b"), then moves down
        d.move_down();
        assert!(d.selection().is_empty());
        assert_eq!(d.focused_line(), Some(id(&d, "c")));
    }

    #[test]
    fn single_action_emits_layout_then_chain_end() {
        let mut d = doc("a\nb\n");
        let b = id(&d, "b");
        d.drain_events();
        d.set_folded(b, true);
        assert!(d.drain_events().is_empty());
        d.focus_line(b, 1);
        d.split_line();
        let events = d.drain_events();
        assert_eq!(events.last(), Some(&DocumentEvent::ChainEnded));
        assert!(events.contains(&DocumentEvent::LayoutFrom(b)));
    }

    #[test]
    fn tick_commits_idle_typing() {
        let mut d = doc("a\n");
        let a = id(&d, "a");
        d.focus_line(a, 1);
        d.type_text("b");
        d.tick(400);
        assert!(d.has_pending_text());
        d.tick(600);
        assert!(!d.has_pending_text());
        d.type_text("c");
        assert!(d.undo());
        assert_eq!(d.outline().text(a), "ab");
        assert!(d.undo());
        assert_eq!(d.outline().text(a), "a");
    }

    #[test]
    fn tag_list_gestures_skip_history() {
        let mut d = doc("a #t\nb #t\n");
        let b = id(&d, "b #t");
        assert!(d.reorder_tag("t", b, 0));
        assert_eq!(d.tags().get("t").unwrap().active[0], b);
        d.set_tag_pinned("t", true);
        assert!(d.tags().get("t").unwrap().pinned);
        assert!(!d.can_undo());
    }

    impl Document {
        fn focus_line_text(&self) -> &str {
            self.focused_line()
                .map(|line| self.outline().text(line))
                .unwrap_or("")
        }
    }
}
