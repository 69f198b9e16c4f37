use crate::model::line::LineId;

use super::undo::Action;
use super::{Caret, Document};

impl Document {
    /// Fold or unfold one line. Lines without children have nothing to fold.
    ///
    /// Folding a line that hides the caret moves focus onto the line.
    pub fn set_folded(&mut self, line: LineId, folded: bool) {
        if !self.is_editable(line) {
            return;
        }
        let outline = &self.state.outline;
        if outline.count(line) == 0 || outline.is_folded(line) == folded {
            return;
        }
        let hides_focus = folded
            && self
                .state
                .focused_line()
                .is_some_and(|focused| outline.is_ancestor(line, focused));

        self.start_chain();
        self.run(Action::SetFold {
            line,
            old: !folded,
            new: folded,
        });
        if hides_focus {
            self.run_focus(Some(Caret::new(line, 0)));
        }
        self.end_chain();
    }

    /// Ctrl+Enter on the focused line
    pub fn toggle_fold(&mut self) {
        let Some(line) = self.state.focused_line() else {
            return;
        };
        let folded = self.state.outline.is_folded(line);
        self.set_folded(line, !folded);
    }

    /// Fold every line with children, or unfold everything when the
    /// document is already folded. One undo step either way.
    pub fn toggle_fold_all(&mut self) {
        self.state.selection.clear(true);
        self.start_chain();
        if self.state.all_folded {
            self.unfold_all();
        } else {
            self.fold_all();
        }
        self.end_chain();
    }

    fn unfold_all(&mut self) {
        let mut cursor = self.state.outline.first_line();
        while let Some(line) = cursor {
            if self.state.outline.is_folded(line) && self.state.outline.count(line) > 0 {
                self.run(Action::SetFold {
                    line,
                    old: true,
                    new: false,
                });
            }
            // Unfolded children come next in visible order
            cursor = self.state.outline.next_visible(line);
        }
        self.run(Action::SetAllFolded {
            old: true,
            new: false,
        });
        log::debug!("unfolded all lines");
    }

    fn fold_all(&mut self) {
        let outline = &self.state.outline;
        let mut targets = Vec::new();
        let mut cursor = Some(outline.last_visible(outline.root())).filter(|&l| l != outline.root());
        while let Some(line) = cursor {
            if outline.count(line) > 0 && !outline.is_folded(line) {
                targets.push(line);
            }
            cursor = outline.prev_visible(line);
        }
        let count = targets.len();
        for line in targets {
            self.run(Action::SetFold {
                line,
                old: false,
                new: true,
            });
        }
        self.run(Action::SetAllFolded {
            old: false,
            new: true,
        });

        if let Some(caret) = self.state.focus {
            if let Some(top) = self.topmost_folded_ancestor(caret.line) {
                self.run_focus(Some(Caret::new(top, 0)));
            }
        }
        log::debug!("folded {} line(s)", count);
    }

    fn topmost_folded_ancestor(&self, line: LineId) -> Option<LineId> {
        let outline = &self.state.outline;
        let root = outline.root();
        let mut found = None;
        let mut cursor = outline.parent(line);
        while let Some(ancestor) = cursor {
            if ancestor == root {
                break;
            }
            if outline.is_folded(ancestor) {
                found = Some(ancestor);
            }
            cursor = outline.parent(ancestor);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::EditorConfig;
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

    fn visible(doc: &Document) -> Vec<&str> {
        doc.outline()
            .visible_lines()
            .map(|id| doc.outline().text(id))
            .collect()
    }

    #[test]
    fn fold_hides_children_and_undoes() {
        let mut d = doc("a\n\tb\nc\n");
        let a = id(&d, "a");
        d.set_folded(a, true);
        assert_eq!(visible(&d), vec!["a", "c"]);
        assert!(d.undo());
        assert_eq!(visible(&d), vec!["a", "b", "c"]);
        assert!(d.redo());
        assert!(d.outline().is_folded(a));
    }

    #[test]
    fn fold_leaf_is_noop() {
        let mut d = doc("a\nb\n");
        let a = id(&d, "a");
        d.set_folded(a, true);
        assert!(!d.outline().is_folded(a));
        assert!(!d.can_undo());
    }

    #[test]
    fn folding_over_caret_moves_focus() {
        let mut d = doc("a\n\tb\n");
        let (a, b) = (id(&d, "a"), id(&d, "b"));
        d.focus_line(b, 1);
        d.set_folded(a, true);
        assert_eq!(d.focus(), Some(Caret::new(a, 0)));
        d.undo();
        assert_eq!(d.focus(), Some(Caret::new(b, 1)));
    }

    #[test]
    fn toggle_fold_on_focused_line() {
        let mut d = doc("a\n\tb\n");
        let a = id(&d, "a");
        d.focus_line(a, 0);
        d.toggle_fold();
        assert!(d.outline().is_folded(a));
        d.toggle_fold();
        assert!(!d.outline().is_folded(a));
    }

    #[test]
    fn fold_all_then_unfold_all() {
        let mut d = doc("a\n\tb\n\t\tc\nd\n\te\nf\n");
        let c = id(&d, "c");
        d.focus_line(c, 0);
        d.toggle_fold_all();
        assert!(d.is_all_folded());
        assert_eq!(visible(&d), vec!["a", "d", "f"]);
        assert!(d.outline().is_folded(id(&d, "b")));
        assert_eq!(d.focused_line(), Some(id(&d, "a")));

        d.toggle_fold_all();
        assert!(!d.is_all_folded());
        assert_eq!(visible(&d), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn fold_all_is_one_undo_step() {
        let mut d = doc("a\n\tb\n\t\tc\nd\n\te\n");
        d.toggle_fold_all();
        assert!(d.undo());
        assert!(!d.is_all_folded());
        assert_eq!(visible(&d), vec!["a", "b", "c", "d", "e"]);
        assert!(!d.can_undo());
    }

    #[test]
    fn unfold_all_opens_nested_folds() {
        let mut d = doc("a\n\tb\n\t\tc\n");
        let (a, b) = (id(&d, "a"), id(&d, "b"));
        d.set_folded(b, true);
        d.set_folded(a, true);
        d.toggle_fold_all();
        d.toggle_fold_all();
        assert_eq!(visible(&d), vec!["a", "b", "c"]);
    }
}
