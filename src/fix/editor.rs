use crate::lint::TextEdit;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("Edit range {start}..{end} is outside of {} ({len} bytes)", file.display())]
    OutOfBounds {
        file: PathBuf,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Overlapping edits in {}", file.display())]
    Overlapping { file: PathBuf },

    #[error("Failed to read or write {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Apply text edits to the contents of one file
///
/// Edits are applied from the end of the file towards the start so earlier
/// byte offsets stay valid.
pub fn apply_edits(file: &Path, contents: &str, edits: &[&TextEdit]) -> Result<String, FixError> {
    let mut sorted: Vec<&TextEdit> = edits.to_vec();
    sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start).then(b.range.end.cmp(&a.range.end)));

    let mut result = contents.to_string();
    let mut limit = contents.len();
    for edit in sorted {
        let (start, end) = (edit.range.start, edit.range.end);
        if start > end || end > contents.len() || !contents.is_char_boundary(start) || !contents.is_char_boundary(end) {
            return Err(FixError::OutOfBounds {
                file: file.to_path_buf(),
                start,
                end,
                len: contents.len(),
            });
        }
        if end > limit {
            return Err(FixError::Overlapping { file: file.to_path_buf() });
        }
        result.replace_range(start..end, &edit.replacement);
        limit = start;
    }
    Ok(result)
}

/// File editor that applies fix edits on disk
pub struct FileEditor {
    root: PathBuf,
}

impl FileEditor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Apply edits to a file relative to the editor root and write it back
    pub fn apply(&self, relative: &Path, edits: &[&TextEdit]) -> Result<(), FixError> {
        let path = self.root.join(relative);
        let contents = std::fs::read_to_string(&path).map_err(|source| FixError::Io {
            file: path.clone(),
            source,
        })?;
        let updated = apply_edits(relative, &contents, edits)?;
        std::fs::write(&path, updated).map_err(|source| FixError::Io { file: path, source })
    }
}
