use super::line::{Line, LineFlag, LineId, TagDiff};
use crate::parse::tags::scan_tags;

/// Error type for structural outline operations.
///
/// These only fire on programmer error; edit operations never produce them
/// for valid gestures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutlineError {
    #[error("line {child} already belongs to {parent}")]
    AlreadyAttached { child: LineId, parent: LineId },
    #[error("line {child} is not a child of {parent}")]
    NotAChild { child: LineId, parent: LineId },
    #[error("cannot place {child} under its own descendant {parent}")]
    WouldCycle { child: LineId, parent: LineId },
    #[error("index {index} out of range for {parent} ({len} children)")]
    IndexOutOfRange {
        parent: LineId,
        index: usize,
        len: usize,
    },
    #[error("the root line cannot be moved")]
    RootNotMovable,
    #[error("unknown line {0}")]
    UnknownLine(LineId),
}

/// A document tree stored as an arena of lines.
///
/// Index 0 is the root. Lines removed from the tree stay in the arena so
/// undo can put them back.
#[derive(Debug, Clone)]
pub struct Outline {
    pub(crate) lines: Vec<Line>,
}

impl Outline {
    /// Create an outline whose root carries `name` (usually the file name)
    pub fn new(name: impl Into<String>) -> Self {
        Outline {
            lines: vec![Line::new(name)],
        }
    }

    pub fn root(&self) -> LineId {
        LineId(0)
    }

    /// Allocate a detached line.
    pub fn create_line(&mut self, text: impl Into<String>) -> LineId {
        let id = LineId(self.lines.len());
        self.lines.push(Line::new(text));
        id
    }

    /// Allocate a line and append it under `parent`. Used by loaders, where
    /// the new line cannot violate any structural rule.
    pub(crate) fn append_new(&mut self, parent: LineId, text: impl Into<String>) -> LineId {
        let id = self.create_line(text);
        self.line_mut(parent).children.push(id);
        self.line_mut(id).parent = Some(parent);
        id
    }

    pub fn contains(&self, id: LineId) -> bool {
        id.0 < self.lines.len()
    }

    /// Access a line. Panics on a handle that did not come from this outline.
    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.0]
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.lines[id.0]
    }

    pub fn text(&self, id: LineId) -> &str {
        &self.lines[id.0].text
    }

    pub fn parent(&self, id: LineId) -> Option<LineId> {
        self.lines[id.0].parent
    }

    pub fn children(&self, id: LineId) -> &[LineId] {
        &self.lines[id.0].children
    }

    pub fn child(&self, id: LineId, index: usize) -> Option<LineId> {
        self.lines[id.0].children.get(index).copied()
    }

    pub fn count(&self, id: LineId) -> usize {
        self.lines[id.0].children.len()
    }

    pub fn is_folded(&self, id: LineId) -> bool {
        self.lines[id.0].is_folded
    }

    pub fn has_visible_child(&self, id: LineId) -> bool {
        let line = &self.lines[id.0];
        !line.children.is_empty() && !line.is_folded
    }

    /// Position among siblings; `None` for the root and detached lines
    pub fn index(&self, id: LineId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Depth from the root (root = 0). A detached subtree counts from its own top.
    pub fn level(&self, id: LineId) -> usize {
        let mut level = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            level += 1;
            current = parent;
        }
        level
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: LineId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    pub fn is_ancestor(&self, ancestor: LineId, id: LineId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Index path from the root; orders lines by document position.
    pub fn document_path(&self, id: LineId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|&c| c == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    // -----------------------------------------------------------------------
    // Structural mutation
    // -----------------------------------------------------------------------

    pub fn add(&mut self, parent: LineId, child: LineId) -> Result<(), OutlineError> {
        let index = if self.parent(child) == Some(parent) {
            self.count(parent) - 1
        } else {
            self.count(parent)
        };
        self.insert(parent, index, child)
    }

    /// Insert `child` at `index` under `parent`.
    ///
    /// The child must be detached, or already a child of `parent` (in which
    /// case it is repositioned).
    pub fn insert(
        &mut self,
        parent: LineId,
        index: usize,
        child: LineId,
    ) -> Result<(), OutlineError> {
        for id in [parent, child] {
            if !self.contains(id) {
                return Err(OutlineError::UnknownLine(id));
            }
        }
        if child == self.root() {
            return Err(OutlineError::RootNotMovable);
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(OutlineError::WouldCycle { child, parent });
        }
        match self.parent(child) {
            Some(current) if current == parent => {
                let len = self.count(parent);
                if index >= len {
                    return Err(OutlineError::IndexOutOfRange { parent, index, len });
                }
                let children = &mut self.line_mut(parent).children;
                children.retain(|&c| c != child);
                children.insert(index, child);
                Ok(())
            }
            Some(current) => Err(OutlineError::AlreadyAttached {
                child,
                parent: current,
            }),
            None => {
                let len = self.count(parent);
                if index > len {
                    return Err(OutlineError::IndexOutOfRange { parent, index, len });
                }
                self.line_mut(parent).children.insert(index, child);
                self.line_mut(child).parent = Some(parent);
                Ok(())
            }
        }
    }

    /// Detach `child` from `parent`. Returns the index it occupied.
    pub fn remove(&mut self, parent: LineId, child: LineId) -> Result<usize, OutlineError> {
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == child)
            .ok_or(OutlineError::NotAChild { child, parent })?;
        self.line_mut(parent).children.remove(index);
        self.line_mut(child).parent = None;
        Ok(index)
    }

    /// Detach from whatever parent the line has, returning `(parent, index)`.
    pub fn detach(&mut self, child: LineId) -> Option<(LineId, usize)> {
        let parent = self.parent(child)?;
        let index = self.remove(parent, child).ok()?;
        Some((parent, index))
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// Replace a line's text and rescan its tags.
    pub fn set_text(&mut self, id: LineId, text: impl Into<String>) -> TagDiff {
        let text = text.into();
        let new_tags = scan_tags(&text);
        let line = self.line_mut(id);
        let diff = TagDiff::between(&line.tags, &new_tags);
        line.text = text;
        line.tags = new_tags;
        diff
    }

    pub fn set_folded(&mut self, id: LineId, folded: bool) {
        self.line_mut(id).is_folded = folded;
    }

    pub fn set_flag(&mut self, id: LineId, flag: LineFlag, value: bool) {
        self.line_mut(id).set_flag(flag, value);
    }

    /// Number of lines in the tree, root excluded
    pub fn len(&self) -> usize {
        self.descendants(self.root()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count(self.root()) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> (Outline, LineId, LineId, LineId) {
        let mut outline = Outline::new("doc");
        let root = outline.root();
        let a = outline.create_line("a");
        let b = outline.create_line("b");
        let c = outline.create_line("c");
        outline.add(root, a).unwrap();
        outline.add(root, b).unwrap();
        outline.add(root, c).unwrap();
        (outline, a, b, c)
    }

    #[test]
    fn insert_shifts_later_indices_up() {
        let (mut outline, a, b, c) = abc();
        let x = outline.create_line("x");
        outline.insert(outline.root(), 1, x).unwrap();
        assert_eq!(outline.index(a), Some(0));
        assert_eq!(outline.index(x), Some(1));
        assert_eq!(outline.index(b), Some(2));
        assert_eq!(outline.index(c), Some(3));
        assert_eq!(outline.parent(x), Some(outline.root()));
    }

    #[test]
    fn remove_shifts_later_indices_down() {
        let (mut outline, a, b, c) = abc();
        let root = outline.root();
        assert_eq!(outline.remove(root, b), Ok(1));
        assert_eq!(outline.index(a), Some(0));
        assert_eq!(outline.index(c), Some(1));
        assert!(outline.parent(b).is_none());
        assert!(!outline.is_attached(b));
    }

    #[test]
    fn insert_rejects_line_with_other_parent() {
        let (mut outline, a, b, _) = abc();
        let err = outline.insert(a, 0, b).unwrap_err();
        assert_eq!(
            err,
            OutlineError::AlreadyAttached {
                child: b,
                parent: outline.root()
            }
        );
    }

    #[test]
    fn insert_rejects_cycles() {
        let (mut outline, a, _, _) = abc();
        let root = outline.root();
        let child = outline.create_line("child");
        outline.add(a, child).unwrap();
        outline.remove(root, a).unwrap();
        assert_eq!(
            outline.insert(child, 0, a),
            Err(OutlineError::WouldCycle { child: a, parent: child })
        );
        assert_eq!(
            outline.insert(a, 0, root),
            Err(OutlineError::RootNotMovable)
        );
    }

    #[test]
    fn insert_same_parent_repositions() {
        let (mut outline, a, b, c) = abc();
        let root = outline.root();
        outline.insert(root, 0, c).unwrap();
        assert_eq!(outline.children(root), &[c, a, b]);
    }

    #[test]
    fn remove_non_child_fails() {
        let (mut outline, a, b, _) = abc();
        assert_eq!(
            outline.remove(a, b),
            Err(OutlineError::NotAChild { child: b, parent: a })
        );
    }

    #[test]
    fn level_and_path() {
        let (mut outline, _, b, _) = abc();
        let d = outline.create_line("d");
        outline.add(b, d).unwrap();
        assert_eq!(outline.level(outline.root()), 0);
        assert_eq!(outline.level(b), 1);
        assert_eq!(outline.level(d), 2);
        assert_eq!(outline.document_path(d), vec![1, 0]);
        assert!(outline.is_ancestor(b, d));
    }

    #[test]
    fn set_text_returns_tag_diff() {
        let (mut outline, a, _, _) = abc();
        outline.set_text(a, "a #one");
        let diff = outline.set_text(a, "a #two");
        assert_eq!(diff.added, vec!["two"]);
        assert_eq!(diff.removed, vec!["one"]);
    }
}
