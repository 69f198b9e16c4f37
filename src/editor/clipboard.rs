use crate::model::line::LineId;
use crate::parse::{serialize_lines, split_indented};
use crate::util::unicode::insert_at_caret;

use super::undo::{Action, Slot};
use super::{Caret, Document};

impl Document {
    /// Clipboard text for the selection, tab-indented relative to the
    /// topmost selected line. Folded lines bring their hidden descendants.
    pub fn copy(&self) -> Option<String> {
        let outline = &self.state.outline;
        let selected = self.state.selection.ordered(outline, true);
        let top = *selected.first()?;
        let mut lines: Vec<LineId> = Vec::with_capacity(selected.len());
        for &line in &selected {
            lines.push(line);
            if outline.is_folded(line) {
                lines.extend(
                    outline
                        .descendants(line)
                        .filter(|id| !self.state.selection.contains(*id)),
                );
            }
        }
        Some(serialize_lines(outline, &lines, outline.level(top)))
    }

    /// Copy, then delete the selection.
    pub fn cut(&mut self) -> Option<String> {
        let text = self.copy()?;
        self.delete_selection();
        Some(text)
    }

    /// Paste tab-indented text at the caret.
    ///
    /// The first line is inserted into the focused line's text; the rest
    /// become new lines nested by their tab count relative to the first.
    /// A selection is deleted first and the paste lands in its place.
    pub fn paste(&mut self, text: &str) {
        let text = text
            .strip_suffix("\r\n")
            .or_else(|| text.strip_suffix('\n'))
            .unwrap_or(text);
        if text.is_empty() || self.state.focus.is_none() {
            return;
        }

        self.start_chain();
        if !self.state.selection.is_empty() {
            self.delete_selection();
        }
        let Some(caret) = self.state.focus else {
            self.end_chain();
            return;
        };
        let target = caret.line;

        let rows = split_indented(text);
        let Some(&(first_level, first_text)) = rows.first() else {
            self.end_chain();
            return;
        };
        let old = self.state.outline.text(target).to_string();
        let (new, pos) = insert_at_caret(&old, caret.pos, first_text);
        self.run(Action::set_text(target, old, new));
        self.run_focus(Some(Caret::new(target, pos)));

        let Some(mut parent) = self.state.outline.parent(target) else {
            self.end_chain();
            return;
        };
        let mut brother = target;
        let mut old_level = first_level;

        for &(level, row) in &rows[1..] {
            let at = if level > old_level {
                parent = brother;
                Slot::new(brother, self.state.outline.count(brother))
            } else {
                for _ in level..old_level {
                    match self.state.outline.parent(parent) {
                        Some(grand) => {
                            brother = parent;
                            parent = grand;
                        }
                        None => break,
                    }
                }
                let index = self.state.outline.index(brother).map_or(0, |i| i + 1);
                Slot::new(parent, index)
            };
            let line = self.state.outline.create_line(row);
            self.run(Action::Insert { line, at });
            brother = line;
            old_level = level;
        }
        self.end_chain();
    }
}
