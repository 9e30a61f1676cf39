//! Piece chain text storage.
//!
//! ## Why a Piece Chain?
//!
//! The buffer content is never rewritten in place. It is described by an
//! ordered, doubly linked chain of *pieces*, each one pointing at an
//! immutable run of bytes in one of two stores:
//!
//! - the **original** content, loaded once when the buffer is opened
//! - the **edit log**, an append-only byte vector holding every byte ever
//!   inserted during the session
//!
//! ```text
//!  HEAD ─▶ [orig 0..5] ─▶ [log 0..3] ─▶ [orig 5..12] ─▶ TAIL
//! ```
//!
//! Inserting or deleting creates *new* pieces and links them in place of
//! the old ones. The old pieces stay in the arena, untouched, so a
//! [`Splice`] can later swap them back in. This is what makes undo cheap:
//! a revision only stores the two spans it swapped.
//!
//! ## Learning: Arenas instead of pointers
//!
//! Pieces live in a `Vec<Piece>` and refer to each other by [`PieceId`]
//! (an index). Nothing is ever removed from the arena, so an id stays valid
//! for the whole lifetime of the chain and no reference counting is needed.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::{BufferError, BufferResult};

/// Handle of a piece inside the chain's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceId(usize);

const HEAD: PieceId = PieceId(0);
const TAIL: PieceId = PieceId(1);

/// Where the bytes of a piece live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// Read-only content loaded at open time
    Original,
    /// Append-only log of inserted text
    EditLog,
    /// Zero-length head/tail marker
    Sentinel,
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    prev: PieceId,
    next: PieceId,
    source: Source,
    offset: usize,
    len: usize,
}

/// Public view of a live piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceInfo {
    pub source: Source,
    pub offset: usize,
    pub len: usize,
}

/// A run of consecutive pieces, possibly empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    ends: Option<(PieceId, PieceId)>,
    len: usize,
}

impl Span {
    const EMPTY: Span = Span { ends: None, len: 0 };

    fn new(start: PieceId, end: PieceId, len: usize) -> Self {
        Self {
            ends: Some((start, end)),
            len,
        }
    }
}

/// One structural edit: the `old` span was replaced by the `new` span.
///
/// Applying a splice links `new` in; reverting it links `old` back.
/// Neither operation touches any byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splice {
    pub(crate) old: Span,
    pub(crate) new: Span,
    pos: usize,
    inserted: usize,
    removed: usize,
}

impl Splice {
    /// Byte position the edit happened at.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Number of bytes this edit added.
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Number of bytes this edit removed.
    pub fn removed(&self) -> usize {
        self.removed
    }
}

/// The piece chain itself.
#[derive(Debug, Clone)]
pub struct PieceChain {
    original: Box<[u8]>,
    log: Vec<u8>,
    pieces: Vec<Piece>,
    len: usize,
}

impl PieceChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::open(Vec::new())
    }

    /// Loads `content` as a single piece referencing read-only storage.
    pub fn open(content: impl Into<Vec<u8>>) -> Self {
        let original = content.into().into_boxed_slice();
        let len = original.len();
        let sentinel = Piece {
            prev: HEAD,
            next: TAIL,
            source: Source::Sentinel,
            offset: 0,
            len: 0,
        };
        let mut pieces = vec![sentinel, sentinel];

        if len > 0 {
            let id = PieceId(pieces.len());
            pieces.push(Piece {
                prev: HEAD,
                next: TAIL,
                source: Source::Original,
                offset: 0,
                len,
            });
            pieces[HEAD.0].next = id;
            pieces[TAIL.0].prev = id;
        }

        Self {
            original,
            log: Vec::new(),
            pieces,
            len,
        }
    }

    /// Logical length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the append-only edit log.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    // ==================== Mutations ====================

    /// Inserts `bytes` at `pos`.
    ///
    /// The bytes are appended to the edit log and a piece covering them is
    /// spliced in. If `pos` falls inside a piece, that piece is replaced by
    /// three new ones (before, inserted, after); the original stays in the
    /// arena for undo.
    ///
    /// Returns `None` for an empty insertion.
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> BufferResult<Option<Splice>> {
        if pos > self.len {
            return Err(BufferError::PositionOutOfBounds { pos, len: self.len });
        }
        if bytes.is_empty() {
            return Ok(None);
        }

        // Reserve everything up front so a failure leaves the chain untouched.
        self.log.try_reserve(bytes.len())?;
        self.pieces.try_reserve(3)?;

        let offset = self.log.len();
        self.log.extend_from_slice(bytes);

        let (id, off) = self.locate(pos);
        let splice = if off == 0 {
            let prev = self.pieces[id.0].prev;
            let new = self.alloc(Piece {
                prev,
                next: id,
                source: Source::EditLog,
                offset,
                len: bytes.len(),
            });
            Splice {
                old: Span::EMPTY,
                new: Span::new(new, new, bytes.len()),
                pos,
                inserted: bytes.len(),
                removed: 0,
            }
        } else {
            let old = self.pieces[id.0];
            let before = self.alloc(Piece {
                prev: old.prev,
                next: TAIL,
                source: old.source,
                offset: old.offset,
                len: off,
            });
            let middle = self.alloc(Piece {
                prev: before,
                next: TAIL,
                source: Source::EditLog,
                offset,
                len: bytes.len(),
            });
            let after = self.alloc(Piece {
                prev: middle,
                next: old.next,
                source: old.source,
                offset: old.offset + off,
                len: old.len - off,
            });
            self.pieces[before.0].next = middle;
            self.pieces[middle.0].next = after;
            Splice {
                old: Span::new(id, id, old.len),
                new: Span::new(before, after, old.len + bytes.len()),
                pos,
                inserted: bytes.len(),
                removed: 0,
            }
        };

        self.swap(&splice.old, &splice.new);
        tracing::trace!(pos, len = bytes.len(), "piece chain insert");
        Ok(Some(splice))
    }

    /// Deletes the bytes in `range`.
    ///
    /// Boundary pieces are split so that only the covered fragments drop
    /// out of the chain. Returns `None` for an empty range.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<Option<Splice>> {
        let Range { start, end } = range;
        if start > end || end > self.len {
            return Err(BufferError::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }
        if start == end {
            return Ok(None);
        }

        self.pieces.try_reserve(2)?;

        let (first, off_start) = self.locate(start);
        let mut last = first;
        let mut old_len = 0;
        // Bytes still to cover, measured from the beginning of `last`.
        let mut remaining = end - start + off_start;
        loop {
            let piece = self.pieces[last.0];
            old_len += piece.len;
            if remaining <= piece.len {
                break;
            }
            remaining -= piece.len;
            last = piece.next;
        }
        let end_off = remaining;

        let first_piece = self.pieces[first.0];
        let last_piece = self.pieces[last.0];

        let before = (off_start > 0).then(|| {
            self.alloc(Piece {
                prev: first_piece.prev,
                next: last_piece.next,
                source: first_piece.source,
                offset: first_piece.offset,
                len: off_start,
            })
        });
        let after = (end_off < last_piece.len).then(|| {
            self.alloc(Piece {
                prev: before.unwrap_or(first_piece.prev),
                next: last_piece.next,
                source: last_piece.source,
                offset: last_piece.offset + end_off,
                len: last_piece.len - end_off,
            })
        });

        let new = match (before, after) {
            (None, None) => Span::EMPTY,
            (Some(b), None) => Span::new(b, b, off_start),
            (None, Some(a)) => Span::new(a, a, last_piece.len - end_off),
            (Some(b), Some(a)) => {
                self.pieces[b.0].next = a;
                Span::new(b, a, off_start + last_piece.len - end_off)
            }
        };

        let splice = Splice {
            old: Span::new(first, last, old_len),
            new,
            pos: start,
            inserted: 0,
            removed: end - start,
        };
        self.swap(&splice.old, &splice.new);
        tracing::trace!(start, end, "piece chain delete");
        Ok(Some(splice))
    }

    /// Links `new` into the place currently held by `old`.
    ///
    /// Only the neighbouring link fields change; piece contents never do.
    pub(crate) fn swap(&mut self, old: &Span, new: &Span) {
        match (old.ends, new.ends) {
            (None, None) => {}
            (None, Some((start, end))) => {
                let prev = self.pieces[start.0].prev;
                let next = self.pieces[end.0].next;
                self.pieces[prev.0].next = start;
                self.pieces[next.0].prev = end;
            }
            (Some((start, end)), None) => {
                let prev = self.pieces[start.0].prev;
                let next = self.pieces[end.0].next;
                self.pieces[prev.0].next = next;
                self.pieces[next.0].prev = prev;
            }
            (Some((old_start, old_end)), Some((start, end))) => {
                let prev = self.pieces[old_start.0].prev;
                let next = self.pieces[old_end.0].next;
                self.pieces[prev.0].next = start;
                self.pieces[next.0].prev = end;
            }
        }
        self.len = self.len - old.len + new.len;
    }

    fn alloc(&mut self, piece: Piece) -> PieceId {
        let id = PieceId(self.pieces.len());
        self.pieces.push(piece);
        id
    }

    /// Finds the piece holding `pos` and the offset inside it.
    ///
    /// A position on a piece boundary resolves to the piece that starts
    /// there; `pos == len` resolves to the tail sentinel.
    pub(crate) fn locate(&self, pos: usize) -> (PieceId, usize) {
        let mut cur = self.pieces[HEAD.0].next;
        let mut start = 0;
        while cur != TAIL {
            let piece = &self.pieces[cur.0];
            if pos < start + piece.len {
                return (cur, pos - start);
            }
            start += piece.len;
            cur = piece.next;
        }
        (TAIL, 0)
    }

    // ==================== Reading ====================

    /// Copies the bytes in `range` out of the chain.
    pub fn read(&self, range: Range<usize>) -> BufferResult<Vec<u8>> {
        let Range { start, end } = range;
        if start > end || end > self.len {
            return Err(BufferError::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }

        let mut out = Vec::new();
        out.try_reserve(end - start)?;

        let mut pos = 0;
        for chunk in self.chunks() {
            let chunk_end = pos + chunk.len();
            if chunk_end > start && pos < end {
                let from = start.saturating_sub(pos);
                let to = (end - pos).min(chunk.len());
                out.extend_from_slice(&chunk[from..to]);
            }
            if chunk_end >= end {
                break;
            }
            pos = chunk_end;
        }
        Ok(out)
    }

    /// Copies the whole buffer.
    pub fn content(&self) -> Vec<u8> {
        self.chunks().flat_map(|c| c.iter().copied()).collect()
    }

    /// Iterates over the byte slices of the live pieces, in order.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            chain: self,
            cur: self.pieces[HEAD.0].next,
        }
    }

    /// Describes the live pieces, in order.
    pub fn pieces(&self) -> impl Iterator<Item = PieceInfo> + '_ {
        let mut cur = self.pieces[HEAD.0].next;
        std::iter::from_fn(move || {
            if cur == TAIL {
                return None;
            }
            let piece = self.pieces[cur.0];
            cur = piece.next;
            Some(PieceInfo {
                source: piece.source,
                offset: piece.offset,
                len: piece.len,
            })
        })
    }

    pub(crate) fn piece_bytes(&self, id: PieceId) -> &[u8] {
        let piece = &self.pieces[id.0];
        match piece.source {
            Source::Original => &self.original[piece.offset..piece.offset + piece.len],
            Source::EditLog => &self.log[piece.offset..piece.offset + piece.len],
            Source::Sentinel => &[],
        }
    }

    pub(crate) fn next_of(&self, id: PieceId) -> PieceId {
        self.pieces[id.0].next
    }

    pub(crate) fn prev_of(&self, id: PieceId) -> PieceId {
        self.pieces[id.0].prev
    }

    pub(crate) fn is_tail(id: PieceId) -> bool {
        id == TAIL
    }

    pub(crate) fn is_head(id: PieceId) -> bool {
        id == HEAD
    }
}

impl Default for PieceChain {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PieceChain {
    fn from(s: &str) -> Self {
        Self::open(s.as_bytes().to_vec())
    }
}

/// Iterator over live piece slices.
pub struct Chunks<'a> {
    chain: &'a PieceChain,
    cur: PieceId,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == TAIL {
            return None;
        }
        let id = self.cur;
        self.cur = self.chain.next_of(id);
        Some(self.chain.piece_bytes(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(chain: &PieceChain) -> String {
        String::from_utf8(chain.content()).unwrap()
    }

    #[test]
    fn test_open_is_single_piece() {
        let chain = PieceChain::from("hello");
        assert_eq!(chain.len(), 5);
        let pieces: Vec<_> = chain.pieces().collect();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].source, Source::Original);
    }

    #[test]
    fn test_empty_chain_has_no_pieces() {
        let chain = PieceChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.pieces().count(), 0);
        assert_eq!(chain.read(0..0).unwrap(), b"");
    }

    #[test]
    fn test_insert_middle_splits_piece() {
        let mut chain = PieceChain::from("Hello World");
        chain.insert(5, b",").unwrap();
        assert_eq!(text(&chain), "Hello, World");
        assert_eq!(chain.pieces().count(), 3);
    }

    #[test]
    fn test_insert_at_boundaries() {
        let mut chain = PieceChain::from("bc");
        chain.insert(0, b"a").unwrap();
        chain.insert(3, b"d").unwrap();
        assert_eq!(text(&chain), "abcd");
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let mut chain = PieceChain::from("abc");
        let err = chain.insert(4, b"x").unwrap_err();
        assert!(matches!(err, BufferError::PositionOutOfBounds { pos: 4, len: 3 }));
        assert_eq!(text(&chain), "abc");
    }

    #[test]
    fn test_delete_across_pieces() {
        let mut chain = PieceChain::from("Hello World");
        chain.insert(5, b", dear").unwrap();
        assert_eq!(text(&chain), "Hello, dear World");
        chain.delete(3..13).unwrap();
        assert_eq!(text(&chain), "Helorld");
        let total: usize = chain.pieces().map(|p| p.len).sum();
        assert_eq!(total, chain.len());
    }

    #[test]
    fn test_delete_whole_piece() {
        let mut chain = PieceChain::from("abc");
        chain.insert(3, b"def").unwrap();
        chain.delete(3..6).unwrap();
        assert_eq!(text(&chain), "abc");
        assert_eq!(chain.pieces().count(), 1);
    }

    #[test]
    fn test_delete_invalid_range() {
        let mut chain = PieceChain::from("abc");
        assert!(chain.delete(2..1).is_err());
        assert!(chain.delete(0..4).is_err());
        assert_eq!(chain.delete(1..1).unwrap(), None);
    }

    #[test]
    fn test_swap_back_restores_content() {
        let mut chain = PieceChain::from("Hello World");
        let splice = chain.delete(0..6).unwrap().unwrap();
        assert_eq!(text(&chain), "World");
        chain.swap(&splice.new, &splice.old);
        assert_eq!(text(&chain), "Hello World");
        assert_eq!(chain.len(), 11);
    }

    #[test]
    fn test_read_partial() {
        let mut chain = PieceChain::from("abcdef");
        chain.insert(3, b"XYZ").unwrap();
        assert_eq!(chain.read(2..7).unwrap(), b"cXYZd");
        assert_eq!(chain.read(0..chain.len()).unwrap(), b"abcXYZdef");
    }

    #[test]
    fn test_original_is_never_rewritten() {
        let mut chain = PieceChain::from("abc");
        chain.delete(0..3).unwrap();
        chain.insert(0, b"xyz").unwrap();
        assert_eq!(&chain.original[..], b"abc");
        assert_eq!(chain.log_len(), 3);
    }
}
