use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::editor::Document;
use crate::io::tag_state::{self, tag_state_path};
use crate::model::config::EditorConfig;

/// Error type for document load/save
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not encode tag state for {path}: {source}")]
    TagState {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Document name shown for a path: the file stem.
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load a document and the tag list state saved beside it.
pub fn load_document(path: &Path, config: EditorConfig) -> Result<Document, DocumentError> {
    let source = fs::read_to_string(path).map_err(|e| DocumentError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut doc = Document::from_text(&source, &document_name(path), config);
    if let Some(state) = tag_state::read_tag_state(path) {
        tag_state::restore(&mut doc, &state);
    }
    log::debug!(
        "loaded {} ({} lines)",
        path.display(),
        doc.outline().descendants(doc.outline().root()).count()
    );
    Ok(doc)
}

/// Save the text and the tag list state. Both files are replaced atomically.
pub fn save_document(doc: &Document, path: &Path) -> Result<(), DocumentError> {
    atomic_write(path, doc.to_text().as_bytes()).map_err(|e| DocumentError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    let state_path = tag_state_path(path);
    let state = tag_state::capture(doc);
    if state.tags.is_empty() {
        match fs::remove_file(&state_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DocumentError::Write {
                    path: state_path,
                    source: e,
                });
            }
        }
    } else {
        let json = tag_state::to_json(&state).map_err(|e| DocumentError::TagState {
            path: path.to_path_buf(),
            source: e,
        })?;
        atomic_write(&state_path, json.as_bytes()).map_err(|e| DocumentError::Write {
            path: state_path.clone(),
            source: e,
        })?;
    }
    log::debug!("saved {}", path.display());
    Ok(())
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
