use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::parse::tags::scan_tags;

/// Handle of a line inside an [`Outline`](super::outline::Outline) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub usize);

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Boolean attributes a line can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFlag {
    Done,
    Comment,
    Bold,
    LinkText,
    Clone,
}

/// A single outline line (node)
#[derive(Debug, Clone)]
pub struct Line {
    /// Line content
    pub(crate) text: String,
    /// Owned children, in document order
    pub(crate) children: Vec<LineId>,
    /// Navigation-only back reference; `None` for the root and detached lines
    pub(crate) parent: Option<LineId>,
    pub is_folded: bool,
    pub is_done: bool,
    pub is_comment: bool,
    pub is_bold: bool,
    pub is_link_text: bool,
    /// Mirrors another line's content without owning it
    pub is_clone: bool,
    /// Tags found in `text` (without the `#` prefix)
    pub(crate) tags: IndexSet<String>,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tags = scan_tags(&text);
        Line {
            text,
            children: Vec::new(),
            parent: None,
            is_folded: false,
            is_done: false,
            is_comment: false,
            is_bold: false,
            is_link_text: false,
            is_clone: false,
            tags,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[LineId] {
        &self.children
    }

    pub fn parent(&self) -> Option<LineId> {
        self.parent
    }

    pub fn tags(&self) -> &IndexSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn flag(&self, flag: LineFlag) -> bool {
        match flag {
            LineFlag::Done => self.is_done,
            LineFlag::Comment => self.is_comment,
            LineFlag::Bold => self.is_bold,
            LineFlag::LinkText => self.is_link_text,
            LineFlag::Clone => self.is_clone,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: LineFlag, value: bool) {
        match flag {
            LineFlag::Done => self.is_done = value,
            LineFlag::Comment => self.is_comment = value,
            LineFlag::Bold => self.is_bold = value,
            LineFlag::LinkText => self.is_link_text = value,
            LineFlag::Clone => self.is_clone = value,
        }
    }
}

/// Tags that appeared and disappeared after a text change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TagDiff {
    pub fn between(old: &IndexSet<String>, new: &IndexSet<String>) -> Self {
        TagDiff {
            added: new.iter().filter(|t| !old.contains(*t)).cloned().collect(),
            removed: old.iter().filter(|t| !new.contains(*t)).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
