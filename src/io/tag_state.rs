use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::editor::Document;
use crate::ops::tag_ops;

/// Tag list state saved next to a document (`<file>.tags.json`).
///
/// Membership is always rebuilt from the text; only what the text cannot
/// carry is kept here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagState {
    /// In tag-list order
    #[serde(default)]
    pub tags: Vec<SavedTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTag {
    pub name: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub folded: bool,
    /// Texts of the active lines in manual order
    #[serde(default)]
    pub line_order: Vec<String>,
}

pub fn tag_state_path(document_path: &Path) -> PathBuf {
    let mut name = document_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tags.json");
    document_path.with_file_name(name)
}

/// Snapshot the tag list of a document.
pub fn capture(doc: &Document) -> TagState {
    let tags = doc
        .tags()
        .iter()
        .map(|(name, entry)| SavedTag {
            name: name.to_string(),
            pinned: entry.pinned,
            repeat: entry.repeat,
            folded: entry.folded,
            line_order: tag_ops::line_order(doc.tags(), doc.outline(), name),
        })
        .collect();
    TagState { tags }
}

/// Apply saved tag state to a freshly loaded document.
pub fn restore(doc: &mut Document, state: &TagState) {
    for tag in &state.tags {
        // Pinned tags are listed even with no lines
        doc.set_tag_pinned(&tag.name, tag.pinned);
        doc.set_tag_repeat(&tag.name, tag.repeat);
        doc.set_tag_folded(&tag.name, tag.folded);
        doc.apply_line_order(&tag.name, &tag.line_order);
    }
    let order: Vec<String> = state.tags.iter().map(|t| t.name.clone()).collect();
    tag_ops::apply_tag_order(doc.tags_mut(), &order);
}

/// Read saved tag state. Missing or unreadable state is `None`.
pub fn read_tag_state(document_path: &Path) -> Option<TagState> {
    let path = tag_state_path(document_path);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            log::warn!("ignoring tag state {}: {}", path.display(), e);
            None
        }
    }
}

pub fn to_json(state: &TagState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::EditorConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn doc(source: &str) -> Document {
        Document::from_text(source, "doc", EditorConfig::default())
    }

    #[test]
    fn path_sits_next_to_document() {
        assert_eq!(
            tag_state_path(Path::new("/notes/todo.txt")),
            PathBuf::from("/notes/todo.txt.tags.json")
        );
    }

    #[test]
    fn capture_and_restore_keep_order_and_flags() {
        let mut d = doc("a #t\nb #t\nc #u\n");
        let b = d.tags().get("t").unwrap().active[1];
        d.reorder_tag("t", b, 0);
        d.set_tag_repeat("t", true);
        d.set_tag_pinned("empty", true);
        let state = capture(&d);
        assert_eq!(
            state.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["t", "u", "empty"]
        );
        assert_eq!(state.tags[0].line_order, vec!["b #t", "a #t"]);

        let mut reloaded = doc(&d.to_text());
        let mut saved = state.clone();
        saved.tags.swap(0, 1);
        restore(&mut reloaded, &saved);
        assert_eq!(
            reloaded.tags().tags().collect::<Vec<_>>(),
            vec!["u", "t", "empty"]
        );
        let t = reloaded.tags().get("t").unwrap();
        assert!(t.repeat);
        assert_eq!(reloaded.outline().text(t.active[0]), "b #t");
        assert!(reloaded.tags().get("empty").unwrap().pinned);
    }

    #[test]
    fn json_shape_is_stable() {
        let state = TagState {
            tags: vec![SavedTag {
                name: "t".into(),
                pinned: true,
                line_order: vec!["a #t".into()],
                ..Default::default()
            }],
        };
        insta::assert_snapshot!(
            serde_json::to_string(&state).unwrap(),
            @r#"{"tags":[{"name":"t","pinned":true,"repeat":false,"folded":false,"line_order":["a #t"]}]}"#
        );
    }

    #[test]
    fn malformed_state_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let doc_path = tmp.path().join("todo.txt");
        fs::write(tag_state_path(&doc_path), "{ not json").unwrap();
        assert_eq!(read_tag_state(&doc_path), None);
    }

    #[test]
    fn minimal_entry_uses_defaults() {
        let state: TagState = serde_json::from_str(r#"{"tags":[{"name":"x"}]}"#).unwrap();
        assert_eq!(state.tags[0].name, "x");
        assert!(!state.tags[0].pinned);
        assert!(state.tags[0].line_order.is_empty());
    }
}
