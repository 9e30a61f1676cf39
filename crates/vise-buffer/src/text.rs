//! The editable text of one file: piece chain, history and backing path.
//!
//! ## Learning: Keeping Two Structures in Step
//!
//! An edit touches the chain *and* the history. If the chain accepted the
//! splice but the history then failed to grow, undo would silently lose
//! that edit. So the history reserves its slot first:
//!
//! ```rust,ignore
//! self.history.reserve()?;          // may fail, nothing changed yet
//! let splice = self.chain.insert(pos, bytes)?;  // may fail, nothing changed
//! self.history.record(splice);      // cannot fail any more
//! ```

use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::chain::PieceChain;
use crate::history::{History, RevisionId};
use crate::{BufferError, BufferResult};

/// Buffer content with branching undo and an optional file on disk.
#[derive(Debug, Clone, Default)]
pub struct Text {
    chain: PieceChain,
    history: History,
    path: Option<PathBuf>,
}

impl Text {
    /// Creates an empty, unnamed text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unnamed text with initial content.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self {
            chain: PieceChain::open(content),
            history: History::new(),
            path: None,
        }
    }

    /// Loads a file. The whole file becomes the chain's original content.
    pub fn load(path: impl AsRef<Path>) -> BufferResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        tracing::info!(path = %path.display(), bytes = content.len(), "loaded file");

        Ok(Self {
            chain: PieceChain::open(content),
            history: History::new(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Saves to the associated path.
    pub fn save(&mut self) -> BufferResult<()> {
        let path = self.path.clone().ok_or(BufferError::NoPath)?;
        self.save_as(&path)
    }

    /// Saves to `path` and makes it the associated path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> BufferResult<()> {
        let path = path.as_ref();

        // Write to a temporary file first, then rename (atomic write)
        let temp_path = path.with_extension("vise-tmp");
        {
            let mut file = std::io::BufWriter::new(std::fs::File::create(&temp_path)?);
            for chunk in self.chain.chunks() {
                file.write_all(chunk)?;
            }
            file.flush()?;
        }
        std::fs::rename(&temp_path, path)?;

        self.commit_pending()?;
        self.history.mark_saved();
        self.path = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), bytes = self.chain.len(), "saved file");
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    // ==================== Editing ====================

    /// Inserts `bytes` at `pos` into the pending revision.
    ///
    /// Returns false for an empty insertion.
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> BufferResult<bool> {
        self.history.reserve()?;
        match self.chain.insert(pos, bytes)? {
            Some(splice) => {
                self.history.record(splice);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deletes `range` as part of the pending revision.
    ///
    /// Returns false for an empty range.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<bool> {
        self.history.reserve()?;
        match self.chain.delete(range)? {
            Some(splice) => {
                self.history.record(splice);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replaces `range` with `bytes`.
    ///
    /// All or nothing: if the insertion fails, the deletion is taken back
    /// out of the chain and the pending group.
    pub fn replace(&mut self, range: Range<usize>, bytes: &[u8]) -> BufferResult<()> {
        let start = range.start;
        let deleted = self.delete(range)?;
        if let Err(e) = self.insert(start, bytes) {
            if deleted {
                self.history.discard_last(&mut self.chain);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Closes the pending group of edits as one revision.
    pub fn commit(
        &mut self,
        cursor_before: usize,
        cursor_after: usize,
    ) -> BufferResult<Option<RevisionId>> {
        self.history.commit(cursor_before, cursor_after)
    }

    /// Commits pending edits, deriving cursors from the first and last splice.
    fn commit_pending(&mut self) -> BufferResult<()> {
        let pending = self.history.pending();
        let (Some(first), Some(last)) = (pending.first(), pending.last()) else {
            return Ok(());
        };
        let before = first.pos();
        let after = last.pos() + last.inserted();
        self.history.commit(before, after)?;
        Ok(())
    }

    // ==================== History ====================

    /// Undoes the current revision, returning the cursor to restore.
    ///
    /// `Ok(None)` means there was nothing to undo.
    pub fn undo(&mut self) -> BufferResult<Option<usize>> {
        self.commit_pending()?;
        Ok(self.history.undo(&mut self.chain))
    }

    pub fn redo(&mut self) -> BufferResult<Option<usize>> {
        self.commit_pending()?;
        Ok(self.history.redo(&mut self.chain))
    }

    /// Moves `count` revisions back in creation order.
    pub fn earlier(&mut self, count: usize) -> BufferResult<Option<usize>> {
        self.commit_pending()?;
        Ok(self.history.earlier(count, &mut self.chain))
    }

    /// Moves `count` revisions forward in creation order.
    pub fn later(&mut self, count: usize) -> BufferResult<Option<usize>> {
        self.commit_pending()?;
        Ok(self.history.later(count, &mut self.chain))
    }

    pub fn goto(&mut self, revision: RevisionId) -> BufferResult<Option<usize>> {
        self.commit_pending()?;
        Ok(self.history.goto(revision, &mut self.chain))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_modified(&self) -> bool {
        self.history.is_modified()
    }

    // ==================== Reading ====================

    /// Read-only access to the chain, for motions and rendering.
    #[inline]
    pub fn chain(&self) -> &PieceChain {
        &self.chain
    }

    pub fn read(&self, range: Range<usize>) -> BufferResult<Vec<u8>> {
        self.chain.read(range)
    }

    pub fn content(&self) -> Vec<u8> {
        self.chain.content()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}
