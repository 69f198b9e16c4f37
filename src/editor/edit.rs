use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::model::line::{LineFlag, LineId};
use crate::model::selection::Selection;
use crate::ops::tag_ops;
use crate::parse::{append_tag, strip_tag};
use crate::util::unicode::{
    caret_to_byte, grapheme_len, insert_at_caret, single_line, split_at_caret,
};

use super::undo::{Action, Slot, apply_forward, mark_departures};
use super::{Caret, Document, PendingText, fatal};

impl Document {
    // -----------------------------------------------------------------------
    // Typing
    // -----------------------------------------------------------------------

    /// Apply a raw text change from the line's text field.
    ///
    /// Takes effect at once (tags included) but is only recorded in history
    /// when the typing burst is committed.
    ///
    /// Line breaks are dropped and leading tabs trimmed, since both would
    /// change the structure on the next load.
    pub fn edit_text(&mut self, line: LineId, text: &str, caret: usize) {
        if !self.is_editable(line) || self.log.in_chain() {
            return;
        }
        if self.pending.as_ref().is_some_and(|p| p.line != line) {
            self.commit_text();
        }
        let (before, _) = split_at_caret(text, caret);
        let caret = grapheme_len(&single_line(before));
        let text = single_line(text);
        let old = self.state.outline.text(line).to_string();
        if old != text {
            let mut change = Action::set_text(line, old.clone(), text);
            mark_departures(&mut change, &self.state);
            if let Err(err) = apply_forward(&change, &mut self.state) {
                fatal(err);
            }
            let pending = self.pending.get_or_insert(PendingText {
                line,
                old,
                marks: Vec::new(),
                idle_ms: 0,
            });
            if let Action::SetText { marks, .. } = change {
                // The first departure of a tag in a burst is where it sat
                for mark in marks {
                    if !pending.marks.iter().any(|m| m.tag == mark.tag) {
                        pending.marks.push(mark);
                    }
                }
            }
            pending.idle_ms = 0;
            self.flush_layout(false);
        }
        self.focus_line(line, caret);
    }

    /// Type `text` at the caret of the focused line.
    pub fn type_text(&mut self, text: &str) {
        let Some(caret) = self.state.focus else {
            return;
        };
        let (new, pos) = insert_at_caret(self.state.outline.text(caret.line), caret.pos, text);
        self.edit_text(caret.line, &new, pos);
    }

    /// Insert text at the caret as its own undo step.
    fn insert_snippet(&mut self, snippet: &str) {
        if !self.state.selection.is_empty() || snippet.is_empty() {
            return;
        }
        let Some(caret) = self.state.focus else {
            return;
        };
        let old = self.state.outline.text(caret.line).to_string();
        let (new, pos) = insert_at_caret(&old, caret.pos, &single_line(snippet));
        self.start_chain();
        self.run(Action::set_text(caret.line, old, new));
        self.run_focus(Some(Caret::new(caret.line, pos)));
        self.end_chain();
    }

    /// Insert `now` formatted with the configured time format.
    pub fn insert_time(&mut self, now: NaiveDateTime) {
        let format = self.config.time_format.clone();
        self.insert_stamp(now, &format);
    }

    /// Insert `now` formatted with the configured date format.
    pub fn insert_date(&mut self, now: NaiveDateTime) {
        let format = self.config.date_format.clone();
        self.insert_stamp(now, &format);
    }

    fn insert_stamp(&mut self, now: NaiveDateTime, format: &str) {
        let mut stamp = String::new();
        if write!(stamp, "{}", now.format(format)).is_err() {
            log::warn!("invalid time format {:?}", format);
            return;
        }
        self.insert_snippet(&stamp);
    }

    // -----------------------------------------------------------------------
    // Enter / Backspace / Delete
    // -----------------------------------------------------------------------

    /// Enter: split the focused line at the caret.
    pub fn split_line(&mut self) {
        let Some(caret) = self.state.focus else {
            return;
        };
        let line = caret.line;
        let outline = &self.state.outline;
        let (Some(parent), Some(index)) = (outline.parent(line), outline.index(line)) else {
            return;
        };
        let text = outline.text(line).to_string();

        if caret.pos == 0 && !text.is_empty() {
            // Caret at the start: open an empty line above
            let new = self.state.outline.create_line("");
            self.run(Action::Insert {
                line: new,
                at: Slot::new(parent, index),
            });
            return;
        }

        let (before, after) = split_at_caret(&text, caret.pos);
        let (before, after) = (before.to_string(), after.to_string());
        // Visible children stay below the text they belonged to
        let at = if outline.has_visible_child(line) {
            Slot::new(line, 0)
        } else {
            Slot::new(parent, index + 1)
        };
        let new = self.state.outline.create_line(after);

        self.start_chain();
        self.run(Action::set_text(line, text, before));
        self.run(Action::Insert { line: new, at });
        self.run_focus(Some(Caret::new(new, 0)));
        self.end_chain();
    }

    /// Backspace: delete the selection, a character, or join with the
    /// previous line when the caret is at the start.
    pub fn backspace(&mut self) {
        if !self.state.selection.is_empty() {
            self.delete_selection();
            return;
        }
        let Some(caret) = self.state.focus else {
            return;
        };
        if caret.pos > 0 {
            let text = self.state.outline.text(caret.line);
            let start = caret_to_byte(text, caret.pos - 1);
            let end = caret_to_byte(text, caret.pos);
            let new = format!("{}{}", &text[..start], &text[end..]);
            self.edit_text(caret.line, &new, caret.pos - 1);
            return;
        }

        let line = caret.line;
        let outline = &self.state.outline;
        let Some(prev) = outline.prev_visible(line) else {
            return;
        };
        let same_parent = outline.parent(prev) == outline.parent(line);

        if same_parent && outline.text(prev).is_empty() {
            let at = self.slot_of(prev);
            self.run(Action::remove(prev, at));
        } else if same_parent && outline.text(line).is_empty() {
            let end = grapheme_len(outline.text(prev));
            self.start_chain();
            self.run_focus(Some(Caret::new(prev, end)));
            let at = self.slot_of(line);
            self.run(Action::remove(line, at));
            self.end_chain();
        } else {
            let end = grapheme_len(outline.text(prev));
            self.start_chain();
            self.run_focus(Some(Caret::new(prev, end)));
            self.merge_into(prev, line);
            self.end_chain();
        }
    }

    /// Delete: delete the selection, a character, or pull the next line up
    /// when the caret is at the end.
    pub fn delete_forward(&mut self) {
        if !self.state.selection.is_empty() {
            self.delete_selection();
            return;
        }
        let Some(caret) = self.state.focus else {
            return;
        };
        let line = caret.line;
        let text = self.state.outline.text(line);
        if caret.pos < grapheme_len(text) {
            let start = caret_to_byte(text, caret.pos);
            let end = caret_to_byte(text, caret.pos + 1);
            let new = format!("{}{}", &text[..start], &text[end..]);
            self.edit_text(line, &new, caret.pos);
            return;
        }

        let outline = &self.state.outline;
        let Some(next) = outline.next_visible(line) else {
            return;
        };
        let same_parent = outline.parent(next) == outline.parent(line);

        if same_parent && outline.text(next).is_empty() {
            let at = self.slot_of(next);
            self.run(Action::remove(next, at));
        } else if same_parent && outline.text(line).is_empty() {
            self.start_chain();
            self.run_focus(Some(Caret::new(next, 0)));
            let at = self.slot_of(line);
            self.run(Action::remove(line, at));
            self.end_chain();
        } else {
            self.start_chain();
            self.merge_into(line, next);
            self.end_chain();
        }
    }

    /// Append `from`'s text to `into`, hand `from`'s children to `into`
    /// (first, in order) and remove `from`. Runs inside an open chain.
    fn merge_into(&mut self, into: LineId, from: LineId) {
        let old = self.state.outline.text(into).to_string();
        let new = format!("{}{}", old, self.state.outline.text(from));
        self.run(Action::set_text(into, old, new));

        if self.state.outline.count(from) > 0 {
            for line in [from, into] {
                if self.state.outline.is_folded(line) {
                    self.run(Action::SetFold {
                        line,
                        old: true,
                        new: false,
                    });
                }
            }
            let lines = self
                .state
                .outline
                .children(from)
                .iter()
                .copied()
                .enumerate()
                .map(|(index, child)| (child, index))
                .collect();
            self.run(Action::Reparent {
                lines,
                from,
                to: into,
                at: 0,
            });
        }

        let at = self.slot_of(from);
        self.run(Action::remove(from, at));
    }

    pub(crate) fn slot_of(&self, line: LineId) -> Slot {
        let outline = &self.state.outline;
        Slot::new(
            outline.parent(line).unwrap_or(outline.root()),
            outline.index(line).unwrap_or(0),
        )
    }

    // -----------------------------------------------------------------------
    // Delete selection
    // -----------------------------------------------------------------------

    /// Remove the selected lines, leaving one fresh empty line (focused) where
    /// the selection started. Unselected children of removed lines are handed
    /// to the nearest surviving line above. Returns the fresh line.
    pub fn delete_selection(&mut self) -> Option<LineId> {
        let top = self.state.selection.top(&self.state.outline)?;
        let (old_parent, old_index) = (self.state.outline.parent(top)?, self.state.outline.index(top)?);
        let bottom_up = self.state.selection.ordered(&self.state.outline, false);

        self.start_chain();

        for &line in &bottom_up {
            if !self.state.outline.has_visible_child(line) {
                continue;
            }
            let lost: Vec<(LineId, usize)> = self
                .state
                .outline
                .children(line)
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, child)| !self.state.selection.contains(*child))
                .map(|(index, child)| (child, index))
                .collect();
            if lost.is_empty() {
                continue;
            }
            let heir = self.surviving_predecessor(line);
            self.run(Action::Reparent {
                lines: lost,
                from: line,
                to: heir,
                at: 0,
            });
        }

        for &line in &bottom_up {
            let at = self.slot_of(line);
            self.run(Action::remove(line, at));
        }

        self.run(Action::Select {
            old: self.state.selection.clone(),
            new: Selection::default(),
        });

        let fresh = self.state.outline.create_line("");
        let index = old_index.min(self.state.outline.count(old_parent));
        self.run(Action::Insert {
            line: fresh,
            at: Slot::new(old_parent, index),
        });
        self.run_focus(Some(Caret::new(fresh, 0)));
        self.end_chain();
        Some(fresh)
    }

    /// Closest visible line above `line` that is not selected, or the root.
    fn surviving_predecessor(&self, line: LineId) -> LineId {
        let outline = &self.state.outline;
        let mut current = outline.prev_visible(line);
        while let Some(prev) = current {
            if !self.state.selection.contains(prev) {
                return prev;
            }
            current = outline.prev_visible(prev);
        }
        outline.root()
    }

    // -----------------------------------------------------------------------
    // Indent / outdent
    // -----------------------------------------------------------------------

    /// Tab: make each selected (or the focused) line the last child of its
    /// previous sibling. Stops at the first line that has no previous sibling.
    pub fn indent(&mut self) {
        let lines = self.selected_or_focused(true);
        if lines.is_empty() {
            return;
        }
        self.start_chain();
        for line in lines {
            let from = self.slot_of(line);
            if from.index == 0 {
                break;
            }
            let Some(new_parent) = self.state.outline.child(from.parent, from.index - 1) else {
                break;
            };
            if self.state.outline.is_folded(new_parent) {
                self.run(Action::SetFold {
                    line: new_parent,
                    old: true,
                    new: false,
                });
            }
            let to = Slot::new(new_parent, self.state.outline.count(new_parent));
            self.run(Action::Move { line, from, to });
        }
        self.end_chain();
    }

    /// Shift+Tab: move each selected (or the focused) line out of its parent,
    /// right after that parent. Lines directly under the root stay, and a
    /// line whose parent is promoted in the same batch travels with it.
    pub fn outdent(&mut self) {
        let top_down = self.selected_or_focused(true);
        if top_down.is_empty() {
            return;
        }
        let root = self.state.outline.root();
        let selected: HashSet<LineId> = top_down.iter().copied().collect();
        // Decided on the tree as it is before any move; parents come first
        let mut promoted: HashSet<LineId> = HashSet::new();
        for &line in &top_down {
            let Some(parent) = self.state.outline.parent(line) else {
                continue;
            };
            if parent == root {
                continue;
            }
            if selected.contains(&parent) && promoted.contains(&parent) {
                continue;
            }
            promoted.insert(line);
        }

        self.start_chain();
        for &line in top_down.iter().rev() {
            if !promoted.contains(&line) {
                continue;
            }
            let from = self.slot_of(line);
            let parent = from.parent;
            let (Some(grand), Some(parent_index)) = (
                self.state.outline.parent(parent),
                self.state.outline.index(parent),
            ) else {
                continue;
            };
            let to = Slot::new(grand, parent_index + 1);
            self.run(Action::Move { line, from, to });
        }
        self.end_chain();
    }

    // -----------------------------------------------------------------------
    // Flags & tags
    // -----------------------------------------------------------------------

    /// Toggle a flag on the selected (or focused) lines. The first line
    /// decides the new value for all of them.
    pub fn toggle_flag(&mut self, flag: LineFlag) {
        let lines = self.selected_or_focused(true);
        let Some(&first) = lines.first() else {
            return;
        };
        let value = !self.state.outline.line(first).flag(flag);
        self.start_chain();
        for line in lines {
            let old = self.state.outline.line(line).flag(flag);
            if old == value {
                continue;
            }
            let positions = if flag == LineFlag::Done {
                self.state
                    .outline
                    .line(line)
                    .tags()
                    .iter()
                    .filter_map(|tag| {
                        tag_ops::list_position(&self.state.tags, tag, line)
                            .map(|pos| (tag.clone(), pos))
                    })
                    .collect()
            } else {
                Vec::new()
            };
            self.run(Action::SetFlag {
                line,
                flag,
                old,
                new: value,
                positions,
            });
        }
        self.end_chain();
    }

    /// Append `#tag` to a line's text (undoable).
    pub fn add_tag_to_line(&mut self, line: LineId, tag: &str) {
        if !self.is_editable(line) {
            return;
        }
        let old = self.state.outline.text(line).to_string();
        let new = append_tag(&old, tag);
        if new != old {
            self.run(Action::set_text(line, old, new));
        }
    }

    /// Append the configured default tag.
    pub fn add_default_tag(&mut self, line: LineId) {
        let tag = self.config.default_tag.clone();
        self.add_tag_to_line(line, &tag);
    }

    /// Strip `#tag` from a line's text (undoable).
    pub fn remove_tag_from_line(&mut self, line: LineId, tag: &str) {
        if !self.is_editable(line) {
            return;
        }
        let old = self.state.outline.text(line).to_string();
        let new = strip_tag(&old, tag);
        if new != old {
            self.run(Action::set_text(line, old, new));
        }
    }
}
