//! Windows: a view with its own cursor onto a shared file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use uuid::Uuid;
use vise_buffer::PieceChain;

use crate::file::FileId;
use crate::{CoreError, CoreResult};

/// Unique identifier for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(Uuid);

impl WindowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A view of one file.
///
/// Windows only read the chain. Every edit goes through the editor, which
/// then clamps the cursors of all windows showing the edited file.
#[derive(Debug, Clone)]
pub struct Window {
    id: WindowId,
    file: FileId,
    /// Byte offset of the cursor
    cursor: usize,
    /// Fixed end of the visual selection, if any
    anchor: Option<usize>,
}

impl Window {
    pub fn new(file: FileId) -> Self {
        Self {
            id: WindowId::new(),
            file,
            cursor: 0,
            anchor: None,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos;
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Option<usize>) {
        self.anchor = anchor;
    }

    /// Swaps cursor and anchor.
    pub fn flip(&mut self) {
        if let Some(anchor) = self.anchor {
            self.anchor = Some(self.cursor);
            self.cursor = anchor;
        }
    }

    /// Selected bytes, from the first selected character through the
    /// last one.
    pub fn selection(&self, chain: &PieceChain) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let start = anchor.min(self.cursor);
        let last = anchor.max(self.cursor);
        Some(start..chain.char_next(last).max(start))
    }

    /// Selected lines, including the final newline.
    pub fn line_selection(&self, chain: &PieceChain) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let start = chain.line_begin(anchor.min(self.cursor));
        let end = chain.line_next(anchor.max(self.cursor));
        Some(start..end)
    }

    /// Keeps cursor and anchor inside a chain of `len` bytes.
    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len);
        if let Some(anchor) = &mut self.anchor {
            *anchor = (*anchor).min(len);
        }
    }
}

/// All windows, with one of them focused.
#[derive(Debug, Default)]
pub struct Windows {
    windows: HashMap<WindowId, Window>,
    order: Vec<WindowId>,
    active: Option<WindowId>,
}

impl Windows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window and focuses it.
    pub fn add(&mut self, window: Window) -> WindowId {
        let id = window.id();
        self.windows.insert(id, window);
        self.order.push(id);
        self.active = Some(id);
        id
    }

    /// Removes a window. Focus moves to the most recently opened one left.
    pub fn close(&mut self, id: WindowId) -> CoreResult<Window> {
        let window = self
            .windows
            .remove(&id)
            .ok_or(CoreError::WindowNotFound(id))?;
        self.order.retain(|&i| i != id);
        if self.active == Some(id) {
            self.active = self.order.last().copied();
        }
        Ok(window)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    pub fn active_id(&self) -> Option<WindowId> {
        self.active
    }

    pub fn active(&self) -> Option<&Window> {
        self.active.and_then(|id| self.windows.get(&id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Window> {
        self.active.and_then(|id| self.windows.get_mut(&id))
    }

    pub fn set_active(&mut self, id: WindowId) -> CoreResult<()> {
        if !self.windows.contains_key(&id) {
            return Err(CoreError::WindowNotFound(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Windows displaying `file`.
    pub fn showing(&self, file: FileId) -> impl Iterator<Item = &Window> {
        self.iter().filter(move |w| w.file() == file)
    }

    pub fn showing_mut(&mut self, file: FileId) -> impl Iterator<Item = &mut Window> {
        self.windows.values_mut().filter(move |w| w.file() == file)
    }

    /// Windows in opening order.
    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.order.iter().filter_map(|id| self.windows.get(id))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        let chain = PieceChain::from("one\ntwo\nthree\n");
        let mut window = Window::new(FileId::new());
        assert_eq!(window.selection(&chain), None);

        window.set_cursor(5);
        window.set_anchor(Some(1));
        assert_eq!(window.selection(&chain), Some(1..6));
        assert_eq!(window.line_selection(&chain), Some(0..8));

        window.flip();
        assert_eq!(window.cursor(), 1);
        assert_eq!(window.anchor(), Some(5));
        assert_eq!(window.selection(&chain), Some(1..6));
    }

    #[test]
    fn test_clamp() {
        let mut window = Window::new(FileId::new());
        window.set_cursor(10);
        window.set_anchor(Some(12));
        window.clamp(4);
        assert_eq!(window.cursor(), 4);
        assert_eq!(window.anchor(), Some(4));
    }

    #[test]
    fn test_focus_follows_close() {
        let file = FileId::new();
        let mut windows = Windows::new();
        let first = windows.add(Window::new(file));
        let second = windows.add(Window::new(file));
        let other = windows.add(Window::new(FileId::new()));
        assert_eq!(windows.active_id(), Some(other));
        assert_eq!(windows.showing(file).count(), 2);

        windows.set_active(first).unwrap();
        windows.close(first).unwrap();
        assert_eq!(windows.active_id(), Some(other));
        windows.close(other).unwrap();
        assert_eq!(windows.active_id(), Some(second));
        assert!(windows.set_active(first).is_err());
    }
}
