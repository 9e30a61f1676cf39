//! # Vise Buffer
//!
//! Text storage for the vise editing core: a piece chain that never
//! rewrites bytes, plus a branching undo tree built on top of it.
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Ownership & Borrowing
//! - `Text` owns both the `PieceChain` and its `History`
//! - Iterators such as `chunks()` and `bytes_from()` borrow the chain, so
//!   the borrow checker rules out editing while a motion is scanning
//! - Undo needs `&mut` access to both halves at once, which is why they
//!   live side by side in one struct instead of behind shared pointers
//!
//! ### Fallible Allocation
//! - Every growth of the edit log, the piece arena or the revision list
//!   goes through `try_reserve` first
//! - `TryReserveError` converts into [`BufferError::OutOfMemory`] via `?`,
//!   and nothing has been mutated when it is returned

mod chain;
mod history;
mod iter;
mod text;

pub use chain::{Chunks, PieceChain, PieceId, PieceInfo, Source, Splice};
pub use history::{History, Revision, RevisionId};
pub use iter::{ByteCursor, Bytes, RevBytes};
pub use text::Text;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Position {pos} is out of bounds (length {len})")]
    PositionOutOfBounds { pos: usize, len: usize },

    #[error("Invalid range {start}..{end} (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),

    #[error("No file path set")]
    NoPath,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = Text::new();
        assert!(text.is_empty());
        assert!(!text.is_modified());
    }

    #[test]
    fn test_insert_delete_undo() {
        let mut text = Text::from("Hello");
        text.insert(5, b", World!").unwrap();
        text.commit(5, 13).unwrap();
        text.delete(5..7).unwrap();
        assert_eq!(text.content(), b"HelloWorld!");

        assert_eq!(text.undo().unwrap(), Some(5));
        assert_eq!(text.content(), b"Hello, World!");
        text.undo().unwrap();
        assert_eq!(text.content(), b"Hello");
        assert_eq!(text.undo().unwrap(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = BufferError::InvalidRange {
            start: 4,
            end: 2,
            len: 3,
        };
        assert_eq!(err.to_string(), "Invalid range 4..2 (length 3)");
    }
}
