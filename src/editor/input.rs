use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::config::EditorConfig;
use crate::model::line::{LineFlag, LineId};

use super::Document;

/// A user gesture, as delivered by a front end or an edit script.
///
/// Scripts are JSON arrays of these, e.g.
/// `[{"type": "focus", "line": 1, "caret": 0}, {"type": "enter"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Focus { line: LineId, caret: usize },
    Caret { pos: usize },
    Type { text: String },
    /// The text field reported its whole content
    SetText { text: String, caret: usize },
    Enter,
    Backspace,
    Delete,
    Tab,
    ShiftTab,
    Up,
    Down,
    Left,
    Right,
    ShiftUp,
    ShiftDown,
    ShiftLeft,
    ShiftRight,
    Click { line: LineId, caret: usize },
    CtrlClick { line: LineId },
    ShiftClick {
        line: LineId,
        #[serde(default)]
        additive: bool,
    },
    DragTo { line: LineId },
    MouseUp,
    SelectAll,
    ClearSelection,
    Copy,
    Cut,
    Paste { text: String },
    Undo,
    Redo,
    ToggleFold,
    ToggleFoldAll,
    ToggleFlag { flag: LineFlag },
    InsertTime { at: NaiveDateTime },
    InsertDate { at: NaiveDateTime },
    /// Without a tag, the configured default tag is added
    AddTag {
        line: LineId,
        #[serde(default)]
        tag: Option<String>,
    },
    RemoveTag { line: LineId, tag: String },
    /// Time passed with no input
    Tick { ms: u64 },
    CommitText,
}

impl InputEvent {
    /// Keys that repeat while held
    pub fn is_repeatable(&self) -> bool {
        matches!(
            self,
            InputEvent::Up
                | InputEvent::Down
                | InputEvent::Left
                | InputEvent::Right
                | InputEvent::Enter
                | InputEvent::Backspace
                | InputEvent::Delete
        )
    }
}

impl Document {
    /// Dispatch one gesture. Copy and cut return the clipboard text.
    pub fn handle(&mut self, event: &InputEvent) -> Option<String> {
        log::trace!("input {:?}", event);
        match event {
            InputEvent::Focus { line, caret } => {
                self.focus_line(*line, *caret);
            }
            InputEvent::Caret { pos } => self.set_caret(*pos),
            InputEvent::Type { text } => self.type_text(text),
            InputEvent::SetText { text, caret } => {
                if let Some(line) = self.focused_line() {
                    self.edit_text(line, text, *caret);
                }
            }
            InputEvent::Enter => self.split_line(),
            InputEvent::Backspace => self.backspace(),
            InputEvent::Delete => self.delete_forward(),
            InputEvent::Tab => self.indent(),
            InputEvent::ShiftTab => self.outdent(),
            InputEvent::Up => self.move_up(),
            InputEvent::Down => self.move_down(),
            InputEvent::Left => self.move_left(),
            InputEvent::Right => self.move_right(),
            InputEvent::ShiftUp => self.extend_up(),
            InputEvent::ShiftDown => self.extend_down(),
            InputEvent::ShiftLeft => self.select_current(false),
            InputEvent::ShiftRight => self.select_current(true),
            InputEvent::Click { line, caret } => self.click(*line, *caret),
            InputEvent::CtrlClick { line } => self.ctrl_click(*line),
            InputEvent::ShiftClick { line, additive } => {
                if self.is_editable(*line) {
                    let outline = self.outline().clone();
                    let target = *line;
                    self.shift_click(|l| outline.cmp_position(target, l), *additive);
                }
            }
            InputEvent::DragTo { line } => {
                if self.is_editable(*line) {
                    let outline = self.outline().clone();
                    let target = *line;
                    self.drag_to(|l| outline.cmp_position(target, l));
                }
            }
            InputEvent::MouseUp => self.mouse_up(),
            InputEvent::SelectAll => self.select_all(),
            InputEvent::ClearSelection => self.clear_selection(),
            InputEvent::Copy => return self.copy(),
            InputEvent::Cut => return self.cut(),
            InputEvent::Paste { text } => self.paste(text),
            InputEvent::Undo => {
                self.undo();
            }
            InputEvent::Redo => {
                self.redo();
            }
            InputEvent::ToggleFold => self.toggle_fold(),
            InputEvent::ToggleFoldAll => self.toggle_fold_all(),
            InputEvent::ToggleFlag { flag } => self.toggle_flag(*flag),
            InputEvent::InsertTime { at } => self.insert_time(*at),
            InputEvent::InsertDate { at } => self.insert_date(*at),
            InputEvent::AddTag { line, tag } => match tag {
                Some(tag) => self.add_tag_to_line(*line, tag),
                None => self.add_default_tag(*line),
            },
            InputEvent::RemoveTag { line, tag } => self.remove_tag_from_line(*line, tag),
            InputEvent::Tick { ms } => self.tick(*ms),
            InputEvent::CommitText => self.commit_text(),
        }
        None
    }
}

/// Auto-repeat timing for a held key.
///
/// The first repeat fires after `delay_ms`, then one every `interval_ms`.
#[derive(Debug, Clone)]
pub struct KeyRepeat {
    delay_ms: u64,
    interval_ms: u64,
    held: Option<(InputEvent, u64)>,
}

impl KeyRepeat {
    pub fn new(delay_ms: u64, interval_ms: u64) -> Self {
        KeyRepeat {
            delay_ms,
            interval_ms: interval_ms.max(1),
            held: None,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.key_repeat_delay_ms, config.key_repeat_interval_ms)
    }

    /// A key went down. Returns whether it will repeat.
    pub fn press(&mut self, event: &InputEvent) -> bool {
        if event.is_repeatable() {
            self.held = Some((event.clone(), 0));
            true
        } else {
            self.held = None;
            false
        }
    }

    pub fn release(&mut self) {
        self.held = None;
    }

    pub fn held(&self) -> Option<&InputEvent> {
        self.held.as_ref().map(|(event, _)| event)
    }

    /// Let time pass while the key stays down; returns how many repeats fired.
    pub fn advance(&mut self, elapsed_ms: u64) -> u32 {
        let (delay, interval) = (self.delay_ms, self.interval_ms);
        let repeats_by = |held_ms: u64| {
            if held_ms < delay {
                0
            } else {
                (held_ms - delay) / interval + 1
            }
        };
        let Some((_, held_ms)) = self.held.as_mut() else {
            return 0;
        };
        let before = repeats_by(*held_ms);
        *held_ms = held_ms.saturating_add(elapsed_ms);
        let after = repeats_by(*held_ms);
        u32::try_from(after - before).unwrap_or(u32::MAX)
    }
}
