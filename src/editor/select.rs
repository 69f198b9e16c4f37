use std::cmp::Ordering;

use crate::model::line::LineId;
use crate::util::unicode::grapheme_len;

use super::Document;

// Selection gestures change state directly; they are not undo steps.
// Deleting a selection records the selection it removed.

impl Document {
    /// Plain click: focus the line, drop the selection and anchor a new range there.
    pub fn click(&mut self, line: LineId, caret: usize) {
        if !self.focus_line(line, caret) {
            return;
        }
        self.state.selection.clear(true);
        self.state.selection.start = Some(line);
    }

    /// Ctrl+click: add one line and re-anchor at it.
    pub fn ctrl_click(&mut self, line: LineId) {
        if !self.is_editable(line) {
            return;
        }
        let selection = &mut self.state.selection;
        selection.set(line, true);
        selection.start = Some(line);
        selection.end = Some(line);
    }

    /// Shift+click: select everything from the anchor to the clicked
    /// position. Without `additive` the previous selection is dropped first.
    ///
    /// `locate` reports where the click lies relative to a line (see
    /// [`Outline::get_until`](crate::model::outline::Outline::get_until)).
    pub fn shift_click<F>(&mut self, locate: F, additive: bool)
    where
        F: Fn(LineId) -> Ordering,
    {
        if !additive {
            self.state.selection.clear(false);
        }
        let Some(start) = self.state.selection.start else {
            return;
        };
        let lines: Vec<LineId> = self.state.outline.get_until(start, locate).collect();
        for line in lines {
            self.state.selection.set(line, true);
            self.state.selection.end = Some(line);
        }
    }

    /// Mouse drag with the button held. Moving away from the anchor grows
    /// the range; moving back toward it releases the lines passed over.
    pub fn drag_to<F>(&mut self, locate: F)
    where
        F: Fn(LineId) -> Ordering,
    {
        let Some(start) = self.state.selection.start else {
            return;
        };
        let end = *self.state.selection.end.get_or_insert(start);
        let movement = locate(end);
        if movement == Ordering::Equal {
            return;
        }
        let lines: Vec<LineId> = self.state.outline.get_until(end, locate).collect();
        for line in lines {
            let direction = self.state.selection.direction(&self.state.outline);
            let keep = direction == movement || direction == Ordering::Equal || line == start;
            self.state.selection.set(line, keep);
            self.state.selection.end = Some(line);
        }
        if let Some(end) = self.state.selection.end {
            self.state.selection.set(end, true);
        }
    }

    /// Button released: a click that selected nothing forgets its anchors.
    pub fn mouse_up(&mut self) {
        if self.state.selection.is_empty() {
            self.state.selection.clear(true);
        }
    }

    /// Shift+Up
    pub fn extend_up(&mut self) {
        self.extend(Ordering::Less);
    }

    /// Shift+Down
    pub fn extend_down(&mut self) {
        self.extend(Ordering::Greater);
    }

    fn extend(&mut self, movement: Ordering) {
        let Some(focused) = self.state.focused_line() else {
            return;
        };
        self.ensure_anchors(focused);
        let (Some(start), Some(end)) = (self.state.selection.start, self.state.selection.end) else {
            return;
        };
        let outline = &self.state.outline;
        let target = match movement {
            Ordering::Less => outline.prev_visible(end),
            _ => outline.next_visible(end),
        };
        if let Some(target) = target {
            // Moving back toward the anchor releases the old end
            if self.state.selection.direction(outline) == movement.reverse() {
                self.state.selection.set(end, false);
            }
            self.state.selection.end = Some(target);
            if self.state.selection.direction(&self.state.outline) == movement {
                self.state.selection.set(target, true);
            }
        }
        self.state.selection.set(start, true);
    }

    /// Shift+Left at the start or Shift+Right at the end of the focused
    /// line selects that line.
    pub fn select_current(&mut self, forward: bool) {
        let Some(caret) = self.state.focus else {
            return;
        };
        self.ensure_anchors(caret.line);
        if self.state.selection.contains(caret.line) {
            return;
        }
        let at_boundary = if forward {
            caret.pos >= grapheme_len(self.state.outline.text(caret.line))
        } else {
            caret.pos == 0
        };
        if at_boundary {
            self.state.selection.set(caret.line, true);
        }
    }

    /// Select every visible line.
    pub fn select_all(&mut self) {
        let lines: Vec<LineId> = self.state.outline.visible_lines().collect();
        let selection = &mut self.state.selection;
        selection.clear(true);
        selection.start = lines.first().copied();
        selection.end = lines.last().copied();
        for line in lines {
            selection.set(line, true);
        }
    }

    pub fn clear_selection(&mut self) {
        self.state.selection.clear(true);
    }

    fn ensure_anchors(&mut self, line: LineId) {
        let selection = &mut self.state.selection;
        if selection.start.is_none() || selection.end.is_none() {
            selection.start = Some(line);
            selection.end = Some(line);
        }
    }
}
