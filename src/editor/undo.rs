use crate::model::line::{LineFlag, LineId};
use crate::model::outline::OutlineError;
use crate::model::selection::Selection;
use crate::ops::tag_ops;
use crate::parse::scan_tags;
use crate::util::unicode::grapheme_len;

use super::state::{Caret, EditState};

const UNDO_STACK_LIMIT: usize = 500;

/// A position among a parent's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub parent: LineId,
    pub index: usize,
}

impl Slot {
    pub fn new(parent: LineId, index: usize) -> Self {
        Slot { parent, index }
    }
}

/// Where a line sat under one tag before an edit took it out of the lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMark {
    pub line: LineId,
    pub tag: String,
    /// Index in the active or done list
    pub pos: usize,
    /// Index of the tag itself in the tag list
    pub tag_pos: usize,
}

/// A reversible edit. Each variant carries what it needs to run in both
/// directions.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A detached line (with its subtree) is placed at `at`
    Insert { line: LineId, at: Slot },
    /// The line at `at` (with its subtree) is detached. `marks` is filled
    /// in when the action first runs.
    Remove {
        line: LineId,
        at: Slot,
        marks: Vec<TagMark>,
    },
    /// A line moves from one slot to another, keeping its subtree.
    /// `to.index` is read after the line has left `from`.
    Move { line: LineId, from: Slot, to: Slot },
    /// Children of `from` (with their original indices, ascending) move
    /// under `to` as a contiguous run starting at `at`
    Reparent {
        lines: Vec<(LineId, usize)>,
        from: LineId,
        to: LineId,
        at: usize,
    },
    /// `marks` covers the tags the new text drops
    SetText {
        line: LineId,
        old: String,
        new: String,
        marks: Vec<TagMark>,
    },
    SetFold { line: LineId, old: bool, new: bool },
    /// A flag change. For `Done`, `positions` holds where the line sat in
    /// each tag list beforehand so undo can put it back.
    SetFlag {
        line: LineId,
        flag: LineFlag,
        old: bool,
        new: bool,
        positions: Vec<(String, usize)>,
    },
    SetAllFolded { old: bool, new: bool },
    Select { old: Selection, new: Selection },
    Focus {
        old: Option<Caret>,
        new: Option<Caret>,
    },
}

impl Action {
    pub fn remove(line: LineId, at: Slot) -> Self {
        Action::Remove {
            line,
            at,
            marks: Vec::new(),
        }
    }

    pub fn set_text(line: LineId, old: impl Into<String>, new: impl Into<String>) -> Self {
        Action::SetText {
            line,
            old: old.into(),
            new: new.into(),
            marks: Vec::new(),
        }
    }

    /// Short name for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Insert { .. } => "insert",
            Action::Remove { .. } => "remove",
            Action::Move { .. } => "move",
            Action::Reparent { .. } => "reparent",
            Action::SetText { .. } => "set-text",
            Action::SetFold { .. } => "set-fold",
            Action::SetFlag { .. } => "set-flag",
            Action::SetAllFolded { .. } => "set-all-folded",
            Action::Select { .. } => "select",
            Action::Focus { .. } => "focus",
        }
    }
}

/// An action found the state different from what it recorded.
///
/// Only reachable through a bug in the code that built the action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{action}: {source}")]
    Structure {
        action: &'static str,
        source: OutlineError,
    },
    #[error("{action}: expected {line} at {parent}[{index}]")]
    Inconsistent {
        action: &'static str,
        line: LineId,
        parent: LineId,
        index: usize,
    },
}

/// Undo history made of chains: each chain is one undo step.
#[derive(Debug)]
pub struct ActionLog {
    undo: Vec<Vec<Action>>,
    redo: Vec<Vec<Action>>,
    /// Actions of the chain currently being recorded
    chain: Vec<Action>,
    /// Nesting depth of `start_chain` calls
    depth: usize,
    limit: usize,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    pub fn new() -> Self {
        Self::with_limit(UNDO_STACK_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        ActionLog {
            undo: Vec::new(),
            redo: Vec::new(),
            chain: Vec::new(),
            depth: 0,
            limit: limit.max(1),
        }
    }

    pub fn start_chain(&mut self) {
        self.depth += 1;
    }

    /// Close a chain. Returns `true` when the outermost chain closed.
    pub fn end_chain(&mut self) -> bool {
        if self.depth == 0 {
            log::warn!("end_chain without a matching start_chain");
            return false;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return false;
        }
        let chain = std::mem::take(&mut self.chain);
        self.commit(chain);
        true
    }

    pub fn in_chain(&self) -> bool {
        self.depth > 0
    }

    /// Apply `action` and record it.
    pub fn execute(&mut self, mut action: Action, state: &mut EditState) -> Result<(), ActionError> {
        mark_departures(&mut action, state);
        apply_forward(&action, state)?;
        self.record(action);
        Ok(())
    }

    /// Record an action whose effect is already in the state (text typed
    /// straight into a line). Clears the redo history.
    pub fn record(&mut self, action: Action) {
        self.redo.clear();
        if self.in_chain() {
            self.chain.push(action);
        } else {
            self.commit(vec![action]);
        }
    }

    /// Revert the most recent chain. `Ok(false)` when there is nothing to
    /// undo or a chain is still open.
    pub fn undo(&mut self, state: &mut EditState) -> Result<bool, ActionError> {
        if self.in_chain() {
            log::warn!("undo refused while a chain is open");
            return Ok(false);
        }
        let Some(chain) = self.undo.pop() else {
            return Ok(false);
        };
        for action in chain.iter().rev() {
            apply_inverse(action, state)?;
        }
        log::debug!("undo: reverted {} action(s)", chain.len());
        self.redo.push(chain);
        Ok(true)
    }

    /// Re-apply the most recently undone chain.
    pub fn redo(&mut self, state: &mut EditState) -> Result<bool, ActionError> {
        if self.in_chain() {
            log::warn!("redo refused while a chain is open");
            return Ok(false);
        }
        let Some(chain) = self.redo.pop() else {
            return Ok(false);
        };
        for action in &chain {
            apply_forward(action, state)?;
        }
        log::debug!("redo: reapplied {} action(s)", chain.len());
        self.undo.push(chain);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo steps held
    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    fn commit(&mut self, chain: Vec<Action>) {
        if chain.is_empty() {
            return;
        }
        log::debug!(
            "commit chain: {}",
            chain.iter().map(Action::kind).collect::<Vec<_>>().join(",")
        );
        self.undo.push(chain);
        if self.undo.len() > self.limit {
            self.undo.drain(..self.undo.len() - self.limit);
        }
    }
}

// ---------------------------------------------------------------------------
// Applying actions
// ---------------------------------------------------------------------------

fn structure(action: &'static str) -> impl Fn(OutlineError) -> ActionError {
    move |source| ActionError::Structure { action, source }
}

/// Detach the line expected at `at`.
fn take_from(state: &mut EditState, action: &'static str, line: LineId, at: Slot) -> Result<(), ActionError> {
    if state.outline.child(at.parent, at.index) != Some(line) {
        return Err(ActionError::Inconsistent {
            action,
            line,
            parent: at.parent,
            index: at.index,
        });
    }
    state
        .outline
        .remove(at.parent, line)
        .map_err(structure(action))?;
    Ok(())
}

/// Line that ends up at `at` after a structural change, or its parent.
fn layout_from_slot(state: &mut EditState, at: Slot) {
    let line = state.outline.child(at.parent, at.index).unwrap_or(at.parent);
    state.request_layout(line);
}

fn insert(state: &mut EditState, line: LineId, at: Slot) -> Result<(), ActionError> {
    state
        .outline
        .insert(at.parent, at.index, line)
        .map_err(structure("insert"))?;
    if state.outline.is_attached(line) {
        tag_ops::bind_subtree(&mut state.tags, &state.outline, line);
    }
    state.request_layout(line);
    Ok(())
}

fn remove(state: &mut EditState, line: LineId, at: Slot) -> Result<(), ActionError> {
    let was_attached = state.outline.is_attached(line);
    take_from(state, "remove", line, at)?;
    if was_attached {
        tag_ops::unbind_subtree(&mut state.tags, &state.outline, line);
    }
    layout_from_slot(state, at);
    Ok(())
}

fn relocate(state: &mut EditState, line: LineId, from: Slot, to: Slot) -> Result<(), ActionError> {
    let was_attached = state.outline.is_attached(line);
    take_from(state, "move", line, from)?;
    state
        .outline
        .insert(to.parent, to.index, line)
        .map_err(structure("move"))?;
    let attached = state.outline.is_attached(line);
    if was_attached && !attached {
        tag_ops::unbind_subtree(&mut state.tags, &state.outline, line);
    } else if attached && !was_attached {
        tag_ops::bind_subtree(&mut state.tags, &state.outline, line);
    }
    layout_from_slot(state, from);
    state.request_layout(line);
    Ok(())
}

fn set_text(state: &mut EditState, line: LineId, text: &str) {
    let diff = state.outline.set_text(line, text);
    if state.outline.is_attached(line) {
        for tag in &diff.removed {
            tag_ops::unbind_tag(&mut state.tags, line, tag);
        }
        for tag in &diff.added {
            tag_ops::bind_tag(&mut state.tags, &state.outline, line, tag);
        }
    }
    if let Some(caret) = state.focus.as_mut().filter(|caret| caret.line == line) {
        caret.pos = caret.pos.min(grapheme_len(text));
    }
    state.request_layout(line);
}

/// Record where the lines an action takes out of tag lists sit right now.
pub(crate) fn mark_departures(action: &mut Action, state: &EditState) {
    match action {
        Action::Remove { line, marks, .. } => {
            if !state.outline.is_attached(*line) {
                return;
            }
            for id in std::iter::once(*line).chain(state.outline.descendants(*line)) {
                marks.extend(tag_marks(state, id, state.outline.line(id).tags().iter()));
            }
        }
        Action::SetText {
            line, new, marks, ..
        } => {
            if !state.outline.is_attached(*line) {
                return;
            }
            let kept = scan_tags(new);
            let dropped = state
                .outline
                .line(*line)
                .tags()
                .iter()
                .filter(|tag| !kept.contains(*tag));
            marks.extend(tag_marks(state, *line, dropped));
        }
        _ => {}
    }
}

fn tag_marks<'a>(
    state: &EditState,
    line: LineId,
    tags: impl Iterator<Item = &'a String>,
) -> Vec<TagMark> {
    tags.filter_map(|tag| {
        let (pos, tag_pos) = tag_ops::mark(&state.tags, tag, line)?;
        Some(TagMark {
            line,
            tag: tag.clone(),
            pos,
            tag_pos,
        })
    })
    .collect()
}

/// Put re-bound lines and re-created tags back where they were.
fn restore_marks(state: &mut EditState, marks: &[TagMark]) {
    let mut ordered: Vec<&TagMark> = marks.iter().collect();
    // Ascending targets so each move lands before the later ones
    ordered.sort_by_key(|mark| mark.tag_pos);
    for mark in &ordered {
        tag_ops::restore_tag_position(&mut state.tags, &mark.tag, mark.tag_pos);
    }
    ordered.sort_by_key(|mark| mark.pos);
    for mark in ordered {
        tag_ops::restore_position(&mut state.tags, &mark.tag, mark.line, mark.pos);
    }
}

fn set_flag(state: &mut EditState, line: LineId, flag: LineFlag, value: bool) {
    state.outline.set_flag(line, flag, value);
    if flag == LineFlag::Done && state.outline.is_attached(line) {
        tag_ops::on_done_changed(&mut state.tags, &state.outline, line);
    }
    state.request_layout(line);
}

/// Apply an action (for execute and redo)
pub(crate) fn apply_forward(action: &Action, state: &mut EditState) -> Result<(), ActionError> {
    match action {
        Action::Insert { line, at } => insert(state, *line, *at),
        Action::Remove { line, at, .. } => remove(state, *line, *at),
        Action::Move { line, from, to } => relocate(state, *line, *from, *to),
        Action::Reparent {
            lines,
            from,
            to,
            at,
        } => {
            for (offset, (line, index)) in lines.iter().enumerate() {
                // Earlier entries already left `from`
                let current = Slot::new(*from, index - offset);
                relocate(state, *line, current, Slot::new(*to, at + offset))?;
            }
            Ok(())
        }
        Action::SetText { line, new, .. } => {
            set_text(state, *line, new);
            Ok(())
        }
        Action::SetFold { line, new, .. } => {
            state.outline.set_folded(*line, *new);
            state.request_layout(*line);
            Ok(())
        }
        Action::SetFlag {
            line, flag, new, ..
        } => {
            set_flag(state, *line, *flag, *new);
            Ok(())
        }
        Action::SetAllFolded { new, .. } => {
            state.all_folded = *new;
            Ok(())
        }
        Action::Select { new, .. } => {
            state.selection = new.clone();
            Ok(())
        }
        Action::Focus { new, .. } => {
            state.focus = *new;
            Ok(())
        }
    }
}

/// Apply the inverse of an action (for undo)
pub(crate) fn apply_inverse(action: &Action, state: &mut EditState) -> Result<(), ActionError> {
    match action {
        Action::Insert { line, at } => remove(state, *line, *at),
        Action::Remove { line, at, marks } => {
            insert(state, *line, *at)?;
            restore_marks(state, marks);
            Ok(())
        }
        Action::Move { line, from, to } => relocate(state, *line, *to, *from),
        Action::Reparent {
            lines,
            from,
            to,
            at,
        } => {
            // Leave `to` last-first so each index stays valid, then go back
            // into `from` in ascending original order
            for (offset, (line, _)) in lines.iter().enumerate().rev() {
                take_from(state, "reparent", *line, Slot::new(*to, at + offset))?;
            }
            for (line, index) in lines {
                state
                    .outline
                    .insert(*from, *index, *line)
                    .map_err(structure("reparent"))?;
            }
            reconcile_tags(state, lines, *from, *to);
            state.request_layout(*from);
            Ok(())
        }
        Action::SetText {
            line, old, marks, ..
        } => {
            set_text(state, *line, old);
            restore_marks(state, marks);
            Ok(())
        }
        Action::SetFold { line, old, .. } => {
            state.outline.set_folded(*line, *old);
            state.request_layout(*line);
            Ok(())
        }
        Action::SetFlag {
            line,
            flag,
            old,
            positions,
            ..
        } => {
            set_flag(state, *line, *flag, *old);
            for (tag, pos) in positions {
                tag_ops::restore_position(&mut state.tags, tag, *line, *pos);
            }
            Ok(())
        }
        Action::SetAllFolded { old, .. } => {
            state.all_folded = *old;
            Ok(())
        }
        Action::Select { old, .. } => {
            state.selection = old.clone();
            Ok(())
        }
        Action::Focus { old, .. } => {
            state.focus = *old;
            Ok(())
        }
    }
}

/// Fix tag bindings after lines returned from `to` to `from`, for the rare
/// case where one of the two parents is outside the document.
fn reconcile_tags(state: &mut EditState, lines: &[(LineId, usize)], from: LineId, to: LineId) {
    let now = state.outline.is_attached(from);
    let before = state.outline.is_attached(to);
    if now == before {
        return;
    }
    for (line, _) in lines {
        if now {
            tag_ops::bind_subtree(&mut state.tags, &state.outline, *line);
        } else {
            tag_ops::unbind_subtree(&mut state.tags, &state.outline, *line);
        }
    }
}
