//! Choosing the deck to upload.
//!
//! A file can be picked by path or dropped as part of a list; both end up
//! as the same in-memory selection. Nothing here checks the file type, the
//! server does that.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Shown when nothing is selected.
pub const NO_FILE_LABEL: &str = "No file selected";

/// A selected file, read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    /// File name without directories, as sent in the upload.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileSelection {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self { name, bytes })
    }
}

/// Holds at most one selected file.
#[derive(Debug, Default)]
pub struct InputAcquisition {
    selected: Option<FileSelection>,
}

impl InputAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single file, replacing any previous selection.
    pub fn pick(&mut self, path: &Path) -> Result<&FileSelection> {
        let selection = FileSelection::from_path(path)?;
        log::debug!("Selected {} ({} bytes)", selection.name, selection.bytes.len());
        Ok(self.selected.insert(selection))
    }

    /// Take the first of several dropped files.
    ///
    /// An empty drop leaves the current selection alone.
    pub fn drop_files(&mut self, paths: &[PathBuf]) -> Result<Option<&FileSelection>> {
        let Some((first, rest)) = paths.split_first() else {
            return Ok(self.selected.as_ref());
        };
        if !rest.is_empty() {
            log::warn!(
                "Only one file can be uploaded; ignoring {} other file(s)",
                rest.len()
            );
        }
        self.pick(first).map(Some)
    }

    pub fn selected(&self) -> Option<&FileSelection> {
        self.selected.as_ref()
    }

    /// Name of the selected file, or [`NO_FILE_LABEL`].
    pub fn display_name(&self) -> &str {
        self.selected
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(NO_FILE_LABEL)
    }
}
