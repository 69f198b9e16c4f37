//! Document-order navigation over an [`Outline`].
//!
//! "Visible" traversal skips the descendants of folded lines; the plain
//! descendant walk ignores folding (used for save and for copying folded
//! subtrees).

use std::cmp::Ordering;

use super::line::LineId;
use super::outline::Outline;

impl Outline {
    /// First line of the document, if any
    pub fn first_line(&self) -> Option<LineId> {
        self.child(self.root(), 0)
    }

    /// Depth-first successor, skipping folded subtrees.
    pub fn next_visible(&self, id: LineId) -> Option<LineId> {
        if self.has_visible_child(id) {
            return self.child(id, 0);
        }
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            let index = self.index(current)?;
            if let Some(next) = self.child(parent, index + 1) {
                return Some(next);
            }
            current = parent;
        }
    }

    /// Depth-first predecessor, skipping folded subtrees. Never returns the root.
    pub fn prev_visible(&self, id: LineId) -> Option<LineId> {
        let parent = self.parent(id)?;
        let index = self.index(id)?;
        if index > 0 {
            let prev = self.child(parent, index - 1)?;
            Some(self.last_visible(prev))
        } else if parent == self.root() {
            None
        } else {
            Some(parent)
        }
    }

    /// Deepest last visible descendant (or `id` itself when nothing is visible below it).
    pub fn last_visible(&self, id: LineId) -> LineId {
        let mut current = id;
        while self.has_visible_child(current) {
            match self.children(current).last() {
                Some(&last) => current = last,
                None => break,
            }
        }
        current
    }

    /// All visible lines in document order, root excluded.
    pub fn visible_lines(&self) -> VisibleLines<'_> {
        VisibleLines {
            outline: self,
            next: self.first_line(),
        }
    }

    /// Whether `id` is in the document and no folded line hides it.
    pub fn is_visible(&self, id: LineId) -> bool {
        if id == self.root() {
            return false;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent != self.root() && self.is_folded(parent) {
                return false;
            }
            current = parent;
        }
        current == self.root()
    }

    /// Every descendant of `id` in document order, regardless of folding.
    pub fn descendants(&self, id: LineId) -> Descendants<'_> {
        let mut stack: Vec<LineId> = self.children(id).to_vec();
        stack.reverse();
        Descendants {
            outline: self,
            stack,
        }
    }

    /// Walk visible lines from `from` toward a target position.
    ///
    /// `locate(line)` reports where the target lies relative to `line`:
    /// `Less` above it, `Equal` on it, `Greater` below it. Both `from` and
    /// the line reached are yielded; the walk also ends at a document boundary.
    pub fn get_until<F>(&self, from: LineId, locate: F) -> GetUntil<'_, F>
    where
        F: Fn(LineId) -> Ordering,
    {
        let direction = locate(from);
        GetUntil {
            outline: self,
            next: Some(from),
            direction,
            locate,
        }
    }

    /// Compare two lines by document position.
    pub fn cmp_position(&self, a: LineId, b: LineId) -> Ordering {
        self.document_path(a).cmp(&self.document_path(b))
    }
}

pub struct VisibleLines<'a> {
    outline: &'a Outline,
    next: Option<LineId>,
}

impl Iterator for VisibleLines<'_> {
    type Item = LineId;

    fn next(&mut self) -> Option<LineId> {
        let current = self.next?;
        self.next = self.outline.next_visible(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    outline: &'a Outline,
    stack: Vec<LineId>,
}

impl Iterator for Descendants<'_> {
    type Item = LineId;

    fn next(&mut self) -> Option<LineId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.outline.children(current).iter().rev().copied());
        Some(current)
    }
}

pub struct GetUntil<'a, F> {
    outline: &'a Outline,
    next: Option<LineId>,
    direction: Ordering,
    locate: F,
}

impl<F> Iterator for GetUntil<'_, F>
where
    F: Fn(LineId) -> Ordering,
{
    type Item = LineId;

    fn next(&mut self) -> Option<LineId> {
        let current = self.next.take()?;
        let here = (self.locate)(current);
        if here == self.direction {
            self.next = match here {
                Ordering::Greater => self.outline.next_visible(current),
                Ordering::Less => self.outline.prev_visible(current),
                Ordering::Equal => None,
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_outline;

    // a
    //   b
    //     c
    //   d
    // e
    fn sample() -> Outline {
        parse_outline("a\n\tb\n\t\tc\n\td\ne\n", "doc")
    }

    fn id_of(outline: &Outline, text: &str) -> LineId {
        outline
            .descendants(outline.root())
            .find(|&id| outline.text(id) == text)
            .unwrap()
    }

    fn texts(outline: &Outline, ids: impl Iterator<Item = LineId>) -> Vec<String> {
        ids.map(|id| outline.text(id).to_string()).collect()
    }

    #[test]
    fn visible_walk_visits_every_line_once() {
        let outline = sample();
        assert_eq!(
            texts(&outline, outline.visible_lines()),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn folded_descendants_are_skipped() {
        let mut outline = sample();
        let b = id_of(&outline, "b");
        outline.set_folded(b, true);
        assert_eq!(
            texts(&outline, outline.visible_lines()),
            vec!["a", "b", "d", "e"]
        );
        // descendants ignore folding
        assert_eq!(
            texts(&outline, outline.descendants(outline.root())),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn visibility_follows_folds_and_attachment() {
        let mut outline = sample();
        let (b, c, d) = (id_of(&outline, "b"), id_of(&outline, "c"), id_of(&outline, "d"));
        assert!(outline.is_visible(c));
        outline.set_folded(b, true);
        assert!(!outline.is_visible(c));
        assert!(outline.is_visible(b));
        outline.detach(d);
        assert!(!outline.is_visible(d));
        assert!(!outline.is_visible(outline.root()));
    }

    #[test]
    fn prev_visible_mirrors_next() {
        let outline = sample();
        let e = id_of(&outline, "e");
        let mut seen = Vec::new();
        let mut current = Some(e);
        while let Some(id) = current {
            seen.push(outline.text(id).to_string());
            current = outline.prev_visible(id);
        }
        assert_eq!(seen, vec!["e", "d", "c", "b", "a"]);
    }

    #[test]
    fn prev_visible_skips_folded_subtree() {
        let mut outline = sample();
        let a = id_of(&outline, "a");
        let e = id_of(&outline, "e");
        outline.set_folded(a, true);
        assert_eq!(outline.prev_visible(e), Some(a));
        assert_eq!(outline.next_visible(a), Some(e));
    }

    #[test]
    fn boundaries_return_none() {
        let outline = sample();
        assert_eq!(outline.prev_visible(id_of(&outline, "a")), None);
        assert_eq!(outline.next_visible(id_of(&outline, "e")), None);
    }

    #[test]
    fn last_visible_takes_last_child_while_unfolded() {
        let mut outline = sample();
        let a = id_of(&outline, "a");
        assert_eq!(outline.last_visible(a), id_of(&outline, "d"));
        assert_eq!(outline.last_visible(outline.root()), id_of(&outline, "e"));
        outline.set_folded(a, true);
        assert_eq!(outline.last_visible(a), a);
    }

    #[test]
    fn get_until_walks_down_and_up() {
        let outline = sample();
        let b = id_of(&outline, "b");
        let d = id_of(&outline, "d");
        let target = outline.document_path(d);
        let down: Vec<_> = outline
            .get_until(b, |id| target.cmp(&outline.document_path(id)))
            .collect();
        assert_eq!(texts(&outline, down.into_iter()), vec!["b", "c", "d"]);

        let target = outline.document_path(b);
        let up: Vec<_> = outline
            .get_until(d, |id| target.cmp(&outline.document_path(id)))
            .collect();
        assert_eq!(texts(&outline, up.into_iter()), vec!["d", "c", "b"]);
    }

    #[test]
    fn get_until_stops_at_document_end() {
        let outline = sample();
        let d = id_of(&outline, "d");
        let walked: Vec<_> = outline.get_until(d, |_| Ordering::Greater).collect();
        assert_eq!(texts(&outline, walked.into_iter()), vec!["d", "e"]);
    }
}
