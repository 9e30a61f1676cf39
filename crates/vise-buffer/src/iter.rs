//! Byte-level iteration and line navigation over a [`PieceChain`].
//!
//! Motions and text objects never materialise the buffer. They walk it
//! with a [`ByteCursor`], which steps from piece to piece as it crosses
//! boundaries.

use crate::chain::{PieceChain, PieceId};

/// A position in the chain that can step one byte forward or backward.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    chain: &'a PieceChain,
    piece: PieceId,
    offset: usize,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Places a cursor at `pos`, clamped to the buffer length.
    pub fn new(chain: &'a PieceChain, pos: usize) -> Self {
        let pos = pos.min(chain.len());
        let (piece, offset) = chain.locate(pos);
        Self {
            chain,
            piece,
            offset,
            pos,
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Byte under the cursor, `None` at the end of the buffer.
    pub fn byte(&self) -> Option<u8> {
        self.chain.piece_bytes(self.piece).get(self.offset).copied()
    }

    /// Byte just before the cursor.
    pub fn prev_byte(&self) -> Option<u8> {
        let mut before = self.clone();
        before.retreat().then(|| before.byte()).flatten()
    }

    /// Moves one byte forward. Returns false at the end of the buffer.
    pub fn advance(&mut self) -> bool {
        if PieceChain::is_tail(self.piece) {
            return false;
        }
        self.offset += 1;
        self.pos += 1;
        if self.offset >= self.chain.piece_bytes(self.piece).len() {
            self.piece = self.chain.next_of(self.piece);
            self.offset = 0;
        }
        true
    }

    /// Moves one byte backward. Returns false at the start of the buffer.
    pub fn retreat(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        if self.offset > 0 {
            self.offset -= 1;
        } else {
            let mut prev = self.chain.prev_of(self.piece);
            while !PieceChain::is_head(prev) && self.chain.piece_bytes(prev).is_empty() {
                prev = self.chain.prev_of(prev);
            }
            self.piece = prev;
            self.offset = self.chain.piece_bytes(prev).len() - 1;
        }
        self.pos -= 1;
        true
    }
}

/// Forward iterator over `(pos, byte)` pairs starting at a position.
pub struct Bytes<'a> {
    cursor: ByteCursor<'a>,
}

impl Iterator for Bytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        let byte = self.cursor.byte()?;
        let pos = self.cursor.pos();
        self.cursor.advance();
        Some((pos, byte))
    }
}

/// Backward iterator over `(pos, byte)` pairs strictly before a position.
pub struct RevBytes<'a> {
    cursor: ByteCursor<'a>,
}

impl Iterator for RevBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.retreat() {
            return None;
        }
        self.cursor.byte().map(|b| (self.cursor.pos(), b))
    }
}

#[inline]
fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

impl PieceChain {
    /// Places a [`ByteCursor`] at `pos`.
    pub fn cursor_at(&self, pos: usize) -> ByteCursor<'_> {
        ByteCursor::new(self, pos)
    }

    /// Iterates forward from `pos` (inclusive).
    pub fn bytes_from(&self, pos: usize) -> Bytes<'_> {
        Bytes {
            cursor: ByteCursor::new(self, pos),
        }
    }

    /// Iterates backward from `pos` (exclusive).
    pub fn bytes_before(&self, pos: usize) -> RevBytes<'_> {
        RevBytes {
            cursor: ByteCursor::new(self, pos),
        }
    }

    /// Byte at `pos`, if any.
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        if pos >= self.len() {
            return None;
        }
        ByteCursor::new(self, pos).byte()
    }

    // ==================== Characters ====================

    /// Start of the UTF-8 character following the one at `pos`.
    pub fn char_next(&self, pos: usize) -> usize {
        let mut cursor = self.cursor_at(pos);
        if !cursor.advance() {
            return cursor.pos();
        }
        while cursor.byte().is_some_and(is_continuation) {
            cursor.advance();
        }
        cursor.pos()
    }

    /// Start of the UTF-8 character preceding `pos`.
    pub fn char_prev(&self, pos: usize) -> usize {
        let mut cursor = self.cursor_at(pos);
        while cursor.retreat() {
            if !cursor.byte().is_some_and(is_continuation) {
                break;
            }
        }
        cursor.pos()
    }

    // ==================== Lines ====================

    /// Start of the line containing `pos`.
    pub fn line_begin(&self, pos: usize) -> usize {
        self.bytes_before(pos.min(self.len()))
            .find(|&(_, b)| b == b'\n')
            .map_or(0, |(p, _)| p + 1)
    }

    /// Position of the newline ending the line containing `pos`,
    /// or the buffer length for the last line.
    pub fn line_end(&self, pos: usize) -> usize {
        self.bytes_from(pos)
            .find(|&(_, b)| b == b'\n')
            .map_or(self.len(), |(p, _)| p)
    }

    /// Start of the line after the one containing `pos`, or the buffer
    /// length if there is none.
    pub fn line_next(&self, pos: usize) -> usize {
        let end = self.line_end(pos);
        (end + 1).min(self.len())
    }

    /// Start of the line before the one containing `pos`.
    pub fn line_prev_begin(&self, pos: usize) -> Option<usize> {
        let begin = self.line_begin(pos);
        (begin > 0).then(|| self.line_begin(begin - 1))
    }

    /// First non-blank byte of the line containing `pos`.
    pub fn line_start(&self, pos: usize) -> usize {
        let begin = self.line_begin(pos);
        self.bytes_from(begin)
            .find(|&(_, b)| b != b' ' && b != b'\t')
            .map_or(self.len(), |(p, _)| p)
    }

    /// True when the line containing `pos` holds only whitespace.
    pub fn line_is_blank(&self, pos: usize) -> bool {
        self.bytes_from(self.line_begin(pos))
            .take_while(|&(_, b)| b != b'\n')
            .all(|(_, b)| b == b' ' || b == b'\t' || b == b'\r')
    }

    /// Zero-based line number of `pos`.
    pub fn line_number(&self, pos: usize) -> usize {
        let limit = pos.min(self.len());
        self.chunks()
            .scan(0usize, |start, chunk| {
                let from = *start;
                *start += chunk.len();
                (from < limit).then(|| {
                    let take = (limit - from).min(chunk.len());
                    chunk[..take].iter().filter(|&&b| b == b'\n').count()
                })
            })
            .sum()
    }

    /// Start of zero-based line `line`, clamped to the last line.
    pub fn line_start_of(&self, line: usize) -> usize {
        let mut seen = 0;
        let mut last_begin = 0;
        if line == 0 {
            return 0;
        }
        for (pos, byte) in self.bytes_from(0) {
            // A trailing newline does not open another line.
            if byte == b'\n' && pos + 1 < self.len() {
                seen += 1;
                last_begin = pos + 1;
                if seen == line {
                    break;
                }
            }
        }
        last_begin
    }

    /// Number of lines; a trailing newline does not start a new line.
    pub fn line_count(&self) -> usize {
        let newlines: usize = self
            .chunks()
            .map(|c| c.iter().filter(|&&b| b == b'\n').count())
            .sum();
        match self.byte_at(self.len().saturating_sub(1)) {
            Some(b'\n') => newlines,
            Some(_) => newlines + 1,
            None => 1,
        }
    }
}
