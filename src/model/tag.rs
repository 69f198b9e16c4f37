use indexmap::IndexMap;

use super::line::LineId;

/// One tag's view over the lines carrying it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEntry {
    /// Not-done lines, manually orderable
    pub active: Vec<LineId>,
    /// Done lines, most recently completed first
    pub done: Vec<LineId>,
    /// Pinned tags stay listed while empty
    pub pinned: bool,
    /// Repeat tags keep their done history on "remove all done"
    pub repeat: bool,
    /// Collapsed in the tag list
    pub folded: bool,
}

impl TagEntry {
    pub fn contains(&self, id: LineId) -> bool {
        self.active.contains(&id) || self.done.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.done.is_empty()
    }

    /// Active lines followed by done lines
    pub fn iter(&self) -> impl Iterator<Item = LineId> + '_ {
        self.active.iter().chain(self.done.iter()).copied()
    }
}

/// Secondary index: tag name → ordered active/done lists.
///
/// Tags keep the order they were first seen in (or the restored order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    pub(crate) entries: IndexMap<String, TagEntry>,
}

impl TagIndex {
    pub fn get(&self, tag: &str) -> Option<&TagEntry> {
        self.entries.get(tag)
    }

    pub(crate) fn get_mut(&mut self, tag: &str) -> Option<&mut TagEntry> {
        self.entries.get_mut(tag)
    }

    pub(crate) fn entry(&mut self, tag: &str) -> &mut TagEntry {
        self.entries.entry(tag.to_string()).or_default()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
