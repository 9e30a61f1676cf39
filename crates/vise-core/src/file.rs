//! Open files.
//!
//! ## Learning: Newtype IDs
//!
//! `FileId` wraps a `Uuid`, so a file id can never be confused with a
//! window id or a byte offset even though windows store one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;
use vise_buffer::Text;

use crate::{CoreError, CoreResult};

/// Unique identifier for an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A text plus the name it is shown under. Any number of windows may
/// display the same file.
#[derive(Debug)]
pub struct File {
    id: FileId,
    text: Text,
    name: String,
}

impl File {
    /// An unnamed, empty file.
    pub fn new() -> Self {
        Self::from_text(Text::new())
    }

    pub fn from_text(text: Text) -> Self {
        let name = text
            .path()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("[No Name]")
            .to_string();
        Self {
            id: FileId::new(),
            text,
            name,
        }
    }

    /// Loads a file from disk. A path that does not exist yet gives an
    /// empty text that will be created on the first save.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = if path.exists() {
            Text::load(path)?
        } else {
            let mut text = Text::new();
            text.set_path(path);
            text
        };
        Ok(Self::from_text(text))
    }

    // ==================== Getters ====================

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.text.path()
    }

    pub fn text(&self) -> &Text {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut Text {
        &mut self.text
    }

    pub fn is_modified(&self) -> bool {
        self.text.is_modified()
    }

    // ==================== File Operations ====================

    pub fn save(&mut self) -> CoreResult<()> {
        self.text.save()?;
        Ok(())
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        self.text.save_as(path)?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.name = name.to_string();
        }
        Ok(())
    }
}

impl Default for File {
    fn default() -> Self {
        Self::new()
    }
}

/// All open files, in opening order.
#[derive(Debug, Default)]
pub struct Files {
    files: HashMap<FileId, File>,
    order: Vec<FileId>,
}

impl Files {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: File) -> FileId {
        let id = file.id();
        self.files.insert(id, file);
        self.order.push(id);
        id
    }

    /// Removes a file and hands it back.
    pub fn close(&mut self, id: FileId) -> CoreResult<File> {
        let file = self.files.remove(&id).ok_or(CoreError::FileNotFound(id))?;
        self.order.retain(|&i| i != id);
        Ok(file)
    }

    pub fn get(&self, id: FileId) -> Option<&File> {
        self.files.get(&id)
    }

    pub fn get_mut(&mut self, id: FileId) -> Option<&mut File> {
        self.files.get_mut(&id)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<FileId> {
        self.files
            .iter()
            .find(|(_, file)| file.path() == Some(path))
            .map(|(&id, _)| id)
    }

    /// Files in opening order.
    pub fn iter(&self) -> impl Iterator<Item = &File> {
        self.order.iter().filter_map(|id| self.files.get(id))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
