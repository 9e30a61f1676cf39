//! Cursor motions.
//!
//! A motion is a pure function of the chain and a position. It never edits.
//! The dispatcher decides what the resulting position means: a new cursor
//! in normal mode, the moving end of a selection in visual mode, or the far
//! end of an operator range.
//!
//! ## Learning: Byte Classes instead of `char`
//!
//! Word motions classify *bytes*. Every byte of a multi-byte UTF-8
//! character is `>= 0x80` and counts as a word byte, so scanning byte by
//! byte never stops in the middle of a character.

use std::ops::Range;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use vise_buffer::PieceChain;

/// All built-in motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motion {
    CharPrev,
    CharNext,
    LineUp,
    LineDown,
    /// `0`
    LineBegin,
    /// `^`, first non-blank
    LineStart,
    /// `g_`, last non-blank
    LineFinish,
    /// `$`
    LineEnd,
    /// `gg`, or line `count`
    LineFirst,
    /// `G`, or line `count`
    LineLast,
    /// `|`, column `count`
    Column,
    WordStartNext,
    WordStartPrev,
    WordEndNext,
    WordEndPrev,
    LongwordStartNext,
    LongwordStartPrev,
    LongwordEndNext,
    LongwordEndPrev,
    ParagraphNext,
    ParagraphPrev,
    SentenceNext,
    SentencePrev,
    /// `%`
    BracketMatch,
    /// `[{`
    BlockStart,
    /// `]}`
    BlockEnd,
    /// `[(`
    ParenStart,
    /// `])`
    ParenEnd,
    /// `f`
    ToRight,
    /// `F`
    ToLeft,
    /// `t`
    TillRight,
    /// `T`
    TillLeft,
    /// `;`
    TotillRepeat,
    /// `,`
    TotillReverse,
    SearchNext,
    SearchPrev,
    /// `*`
    SearchWordForward,
    /// `#`
    SearchWordBackward,
}

impl Motion {
    pub const ALL: [Motion; 38] = [
        Motion::CharPrev,
        Motion::CharNext,
        Motion::LineUp,
        Motion::LineDown,
        Motion::LineBegin,
        Motion::LineStart,
        Motion::LineFinish,
        Motion::LineEnd,
        Motion::LineFirst,
        Motion::LineLast,
        Motion::Column,
        Motion::WordStartNext,
        Motion::WordStartPrev,
        Motion::WordEndNext,
        Motion::WordEndPrev,
        Motion::LongwordStartNext,
        Motion::LongwordStartPrev,
        Motion::LongwordEndNext,
        Motion::LongwordEndPrev,
        Motion::ParagraphNext,
        Motion::ParagraphPrev,
        Motion::SentenceNext,
        Motion::SentencePrev,
        Motion::BracketMatch,
        Motion::BlockStart,
        Motion::BlockEnd,
        Motion::ParenStart,
        Motion::ParenEnd,
        Motion::ToRight,
        Motion::ToLeft,
        Motion::TillRight,
        Motion::TillLeft,
        Motion::TotillRepeat,
        Motion::TotillReverse,
        Motion::SearchNext,
        Motion::SearchPrev,
        Motion::SearchWordForward,
        Motion::SearchWordBackward,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Motion::CharPrev => "cursor-char-prev",
            Motion::CharNext => "cursor-char-next",
            Motion::LineUp => "cursor-line-up",
            Motion::LineDown => "cursor-line-down",
            Motion::LineBegin => "cursor-line-begin",
            Motion::LineStart => "cursor-line-start",
            Motion::LineFinish => "cursor-line-finish",
            Motion::LineEnd => "cursor-line-end",
            Motion::LineFirst => "cursor-line-first",
            Motion::LineLast => "cursor-line-last",
            Motion::Column => "cursor-column",
            Motion::WordStartNext => "cursor-word-start-next",
            Motion::WordStartPrev => "cursor-word-start-prev",
            Motion::WordEndNext => "cursor-word-end-next",
            Motion::WordEndPrev => "cursor-word-end-prev",
            Motion::LongwordStartNext => "cursor-longword-start-next",
            Motion::LongwordStartPrev => "cursor-longword-start-prev",
            Motion::LongwordEndNext => "cursor-longword-end-next",
            Motion::LongwordEndPrev => "cursor-longword-end-prev",
            Motion::ParagraphNext => "cursor-paragraph-next",
            Motion::ParagraphPrev => "cursor-paragraph-prev",
            Motion::SentenceNext => "cursor-sentence-next",
            Motion::SentencePrev => "cursor-sentence-prev",
            Motion::BracketMatch => "cursor-match-bracket",
            Motion::BlockStart => "cursor-block-start",
            Motion::BlockEnd => "cursor-block-end",
            Motion::ParenStart => "cursor-parenthesis-start",
            Motion::ParenEnd => "cursor-parenthesis-end",
            Motion::ToRight => "to-right",
            Motion::ToLeft => "to-left",
            Motion::TillRight => "till-right",
            Motion::TillLeft => "till-left",
            Motion::TotillRepeat => "totill-repeat",
            Motion::TotillReverse => "totill-reverse",
            Motion::SearchNext => "cursor-search-next",
            Motion::SearchPrev => "cursor-search-prev",
            Motion::SearchWordForward => "cursor-search-word-forward",
            Motion::SearchWordBackward => "cursor-search-word-backward",
        }
    }

    /// Linewise motions make operators act on whole lines.
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            Motion::LineUp | Motion::LineDown | Motion::LineFirst | Motion::LineLast
        )
    }

    /// Inclusive motions make operators include the character at the target.
    pub fn is_inclusive(self) -> bool {
        matches!(
            self,
            Motion::LineEnd
                | Motion::LineFinish
                | Motion::WordEndNext
                | Motion::WordEndPrev
                | Motion::LongwordEndNext
                | Motion::LongwordEndPrev
                | Motion::BracketMatch
                | Motion::BlockEnd
                | Motion::ParenEnd
                | Motion::ToRight
                | Motion::TillRight
        )
    }

    /// f, F, t and T read one more key as their target character.
    pub fn needs_char(self) -> bool {
        matches!(
            self,
            Motion::ToRight | Motion::ToLeft | Motion::TillRight | Motion::TillLeft
        )
    }

    /// Motions that use the count as an absolute target instead of
    /// repeating.
    pub fn is_absolute(self) -> bool {
        matches!(self, Motion::LineFirst | Motion::LineLast | Motion::Column)
    }

    /// The f/t motion going the other way, for `,`.
    pub fn reversed(self) -> Motion {
        match self {
            Motion::ToRight => Motion::ToLeft,
            Motion::ToLeft => Motion::ToRight,
            Motion::TillRight => Motion::TillLeft,
            Motion::TillLeft => Motion::TillRight,
            other => other,
        }
    }
}

/// Inputs some motions need beyond the chain and a position.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionContext<'a> {
    /// Active search pattern, for n/N/*/#
    pub search: Option<&'a Regex>,
    /// Target character, for f/F/t/T
    pub target: Option<char>,
    /// Explicit count, for gg/G/|
    pub count: Option<usize>,
}

impl Motion {
    /// Applies the motion once. Returns `None` when it cannot move at all
    /// (f without a match, n without a pattern).
    pub fn apply(self, chain: &PieceChain, pos: usize, ctx: &MotionContext<'_>) -> Option<usize> {
        let pos = pos.min(chain.len());
        let target = match self {
            Motion::CharPrev => {
                if pos == chain.line_begin(pos) {
                    pos
                } else {
                    chain.char_prev(pos)
                }
            }
            Motion::CharNext => {
                let next = chain.char_next(pos);
                if chain.byte_at(pos) == Some(b'\n') {
                    pos
                } else {
                    next
                }
            }
            Motion::LineUp => line_up(chain, pos),
            Motion::LineDown => line_down(chain, pos),
            Motion::LineBegin => chain.line_begin(pos),
            Motion::LineStart => chain.line_start(pos),
            Motion::LineFinish => line_finish(chain, pos),
            Motion::LineEnd => chain.line_end(pos),
            Motion::LineFirst => {
                chain.line_start(chain.line_start_of(ctx.count.unwrap_or(1).saturating_sub(1)))
            }
            Motion::LineLast => {
                let line = match ctx.count {
                    Some(n) => n.saturating_sub(1),
                    None => chain.line_count().saturating_sub(1),
                };
                chain.line_start(chain.line_start_of(line))
            }
            Motion::Column => column(chain, pos, ctx.count.unwrap_or(1).saturating_sub(1)),
            Motion::WordStartNext => word_start_next(chain, pos, word_class),
            Motion::WordStartPrev => word_start_prev(chain, pos, word_class),
            Motion::WordEndNext => word_end_next(chain, pos, word_class),
            Motion::WordEndPrev => word_end_prev(chain, pos, word_class),
            Motion::LongwordStartNext => word_start_next(chain, pos, longword_class),
            Motion::LongwordStartPrev => word_start_prev(chain, pos, longword_class),
            Motion::LongwordEndNext => word_end_next(chain, pos, longword_class),
            Motion::LongwordEndPrev => word_end_prev(chain, pos, longword_class),
            Motion::ParagraphNext => paragraph_next(chain, pos),
            Motion::ParagraphPrev => paragraph_prev(chain, pos),
            Motion::SentenceNext => sentence_next(chain, pos),
            Motion::SentencePrev => sentence_prev(chain, pos),
            Motion::BracketMatch => bracket_match(chain, pos)?,
            Motion::BlockStart => enclosing_open(chain, pos, b'{', b'}')?,
            Motion::BlockEnd => enclosing_close(chain, pos, b'{', b'}')?,
            Motion::ParenStart => enclosing_open(chain, pos, b'(', b')')?,
            Motion::ParenEnd => enclosing_close(chain, pos, b'(', b')')?,
            Motion::ToRight => to_right(chain, pos, ctx.target?)?,
            Motion::ToLeft => to_left(chain, pos, ctx.target?)?,
            Motion::TillRight => chain.char_prev(to_right(chain, pos, ctx.target?)?),
            Motion::TillLeft => chain.char_next(to_left(chain, pos, ctx.target?)?),
            // Resolved to a concrete f/t motion by the caller.
            Motion::TotillRepeat | Motion::TotillReverse => return None,
            Motion::SearchNext | Motion::SearchWordForward => search_next(chain, pos, ctx.search?)?,
            Motion::SearchPrev | Motion::SearchWordBackward => search_prev(chain, pos, ctx.search?)?,
        };
        Some(target)
    }
}

// ==================== Character Classes ====================

/// Byte classes used by word motions and word text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Newline,
    Blank,
    Word,
    Punct,
}

pub fn word_class(b: u8) -> Class {
    match b {
        b'\n' => Class::Newline,
        b' ' | b'\t' | b'\r' => Class::Blank,
        b if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80 => Class::Word,
        _ => Class::Punct,
    }
}

pub fn longword_class(b: u8) -> Class {
    match word_class(b) {
        Class::Punct => Class::Word,
        other => other,
    }
}

pub(crate) fn is_space(b: u8) -> bool {
    matches!(word_class(b), Class::Blank | Class::Newline)
}

// ==================== Lines ====================

/// Number of characters between the line start and `pos`.
fn column_of(chain: &PieceChain, pos: usize) -> usize {
    let begin = chain.line_begin(pos);
    chain
        .bytes_from(begin)
        .take_while(|&(p, _)| p < pos)
        .filter(|&(_, b)| b & 0xC0 != 0x80)
        .count()
}

/// Position of character `col` on the line starting at `begin`, clamped
/// to the line's last character.
fn column(chain: &PieceChain, begin: usize, col: usize) -> usize {
    let begin = chain.line_begin(begin);
    let end = chain.line_end(begin);
    let mut pos = begin;
    for _ in 0..col {
        let next = chain.char_next(pos);
        if next >= end {
            break;
        }
        pos = next;
    }
    pos
}

fn line_up(chain: &PieceChain, pos: usize) -> usize {
    match chain.line_prev_begin(pos) {
        Some(prev) => column(chain, prev, column_of(chain, pos)),
        None => pos,
    }
}

fn line_down(chain: &PieceChain, pos: usize) -> usize {
    let end = chain.line_end(pos);
    if end >= chain.len() || end + 1 >= chain.len() {
        return pos;
    }
    column(chain, end + 1, column_of(chain, pos))
}

pub(crate) fn line_finish(chain: &PieceChain, pos: usize) -> usize {
    let begin = chain.line_begin(pos);
    let end = chain.line_end(pos);
    chain
        .bytes_before(end)
        .take_while(|&(p, _)| p >= begin)
        .find(|&(_, b)| !is_space(b))
        .map_or(begin, |(p, _)| utf8_start(chain, p))
}

/// Start of the character whose last byte is at `pos`.
fn utf8_start(chain: &PieceChain, pos: usize) -> usize {
    chain.char_prev(chain.char_next(pos))
}

// ==================== Words ====================

pub(crate) fn word_start_next(chain: &PieceChain, pos: usize, class: fn(u8) -> Class) -> usize {
    let mut cursor = chain.cursor_at(pos);
    let Some(first) = cursor.byte() else {
        return pos;
    };

    match class(first) {
        Class::Word | Class::Punct => {
            let cls = class(first);
            while cursor.byte().is_some_and(|b| class(b) == cls) {
                cursor.advance();
            }
        }
        Class::Newline => {
            cursor.advance();
            if cursor.byte() == Some(b'\n') {
                return cursor.pos();
            }
        }
        Class::Blank => {}
    }

    // Skip whitespace; an empty line counts as a word.
    loop {
        match cursor.byte().map(class) {
            Some(Class::Blank) => {
                cursor.advance();
            }
            Some(Class::Newline) => {
                cursor.advance();
                if cursor.byte() == Some(b'\n') {
                    return cursor.pos();
                }
            }
            _ => break,
        }
    }
    cursor.pos()
}

pub(crate) fn word_start_prev(chain: &PieceChain, pos: usize, class: fn(u8) -> Class) -> usize {
    let mut cursor = chain.cursor_at(pos);
    if !cursor.retreat() {
        return 0;
    }

    loop {
        match cursor.byte().map(class) {
            Some(Class::Blank) => {}
            Some(Class::Newline) => {
                let prev = cursor.prev_byte();
                if prev.is_none() || prev == Some(b'\n') {
                    // Empty line.
                    return cursor.pos();
                }
            }
            _ => break,
        }
        if !cursor.retreat() {
            return 0;
        }
    }

    let Some(cls) = cursor.byte().map(class) else {
        return cursor.pos();
    };
    while cursor.prev_byte().is_some_and(|b| class(b) == cls) {
        cursor.retreat();
    }
    cursor.pos()
}

pub(crate) fn word_end_next(chain: &PieceChain, pos: usize, class: fn(u8) -> Class) -> usize {
    let mut cursor = chain.cursor_at(pos);
    if !cursor.advance() {
        return pos;
    }
    // Skip to the start of the next run if we were at the end of one.
    let run_ends_here = chain
        .byte_at(pos)
        .zip(cursor.byte())
        .is_none_or(|(a, b)| class(a) != class(b));
    if run_ends_here {
        while cursor.byte().is_some_and(is_space) {
            cursor.advance();
        }
    }
    let Some(cls) = cursor.byte().map(class) else {
        return chain.char_prev(cursor.pos()).max(pos);
    };
    loop {
        let mut ahead = cursor.clone();
        if !ahead.advance() || ahead.byte().is_none_or(|b| class(b) != cls) {
            break;
        }
        cursor = ahead;
    }
    utf8_start(chain, cursor.pos())
}

pub(crate) fn word_end_prev(chain: &PieceChain, pos: usize, class: fn(u8) -> Class) -> usize {
    let mut cursor = chain.cursor_at(pos);
    if let Some(cls) = cursor.byte().map(class) {
        if !matches!(cls, Class::Blank | Class::Newline) {
            while cursor.byte().is_some_and(|b| class(b) == cls) {
                if !cursor.retreat() {
                    return 0;
                }
            }
        }
    }
    while cursor.byte().is_none_or(is_space) {
        if !cursor.retreat() {
            return 0;
        }
    }
    utf8_start(chain, cursor.pos())
}

// ==================== Paragraphs & Sentences ====================

pub(crate) fn paragraph_next(chain: &PieceChain, pos: usize) -> usize {
    let mut seen_text = !chain.line_is_blank(pos);
    let mut line = chain.line_next(pos);
    while line < chain.len() {
        if chain.line_is_blank(line) {
            if seen_text {
                return line;
            }
        } else {
            seen_text = true;
        }
        line = chain.line_next(line);
    }
    chain.len()
}

pub(crate) fn paragraph_prev(chain: &PieceChain, pos: usize) -> usize {
    let mut seen_text = !chain.line_is_blank(pos);
    let mut line = chain.line_begin(pos);
    while let Some(prev) = chain.line_prev_begin(line) {
        if chain.line_is_blank(prev) {
            if seen_text {
                return prev;
            }
        } else {
            seen_text = true;
        }
        line = prev;
    }
    0
}

pub(crate) fn sentence_next(chain: &PieceChain, pos: usize) -> usize {
    let mut after_punct = false;
    let mut after_space = false;
    let mut prev = None;
    for (p, b) in chain.bytes_from(pos) {
        if p > pos {
            // A blank line both ends and starts a sentence.
            if b == b'\n' && prev == Some(b'\n') {
                return p;
            }
            if after_punct && after_space && !is_space(b) {
                return p;
            }
            if prev == Some(b'\n') && !is_space(b) && chain.line_is_blank(p - 1) {
                return p;
            }
        }
        match b {
            b'.' | b'!' | b'?' => {
                after_punct = true;
                after_space = false;
            }
            b')' | b']' | b'"' | b'\'' if after_punct && !after_space => {}
            b if is_space(b) => after_space = after_punct,
            _ => {
                after_punct = false;
                after_space = false;
            }
        }
        prev = Some(b);
    }
    chain.len()
}

pub(crate) fn sentence_prev(chain: &PieceChain, pos: usize) -> usize {
    let mut start = paragraph_prev(chain, pos);
    if start == pos && pos > 0 {
        start = paragraph_prev(chain, pos - 1);
    }
    let mut last = start;
    let mut s = start;
    while s < pos {
        last = s;
        let next = sentence_next(chain, s);
        if next <= s {
            break;
        }
        s = next;
    }
    last
}

// ==================== Brackets ====================

/// Opening delimiter of the innermost `open`/`close` pair around `pos`.
///
/// A cursor on the opening delimiter belongs to that pair; a cursor on the
/// closing one belongs to the pair it closes.
pub(crate) fn enclosing_open(chain: &PieceChain, pos: usize, open: u8, close: u8) -> Option<usize> {
    if chain.byte_at(pos) == Some(open) {
        return Some(pos);
    }
    open_before(chain, pos, open, close)
}

/// Nearest unbalanced `open` strictly before `pos`.
pub(crate) fn open_before(chain: &PieceChain, pos: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (p, b) in chain.bytes_before(pos) {
        if b == close {
            depth += 1;
        } else if b == open {
            if depth == 0 {
                return Some(p);
            }
            depth -= 1;
        }
    }
    None
}

/// Closing delimiter matching the opening one at `open_pos`.
pub(crate) fn matching_close(chain: &PieceChain, open_pos: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (p, b) in chain.bytes_from(open_pos + 1) {
        if b == open {
            depth += 1;
        } else if b == close {
            if depth == 0 {
                return Some(p);
            }
            depth -= 1;
        }
    }
    None
}

fn enclosing_close(chain: &PieceChain, pos: usize, open: u8, close: u8) -> Option<usize> {
    if chain.byte_at(pos) == Some(close) {
        return Some(pos);
    }
    let start = enclosing_open(chain, pos, open, close)?;
    matching_close(chain, start, open, close)
}

/// `%`: jump from the next bracket on the line to its partner.
fn bracket_match(chain: &PieceChain, pos: usize) -> Option<usize> {
    const PAIRS: [(u8, u8); 3] = [(b'(', b')'), (b'[', b']'), (b'{', b'}')];

    let (at, byte) = chain
        .bytes_from(pos)
        .take_while(|&(_, b)| b != b'\n')
        .find(|&(_, b)| PAIRS.iter().any(|&(o, c)| b == o || b == c))?;

    for (open, close) in PAIRS {
        if byte == open {
            return matching_close(chain, at, open, close);
        }
        if byte == close {
            // Searching back from the closer itself finds its opener.
            return enclosing_open(chain, at, open, close).filter(|&o| o != at);
        }
    }
    None
}

// ==================== f / t ====================

fn to_right(chain: &PieceChain, pos: usize, target: char) -> Option<usize> {
    let mut buf = [0u8; 4];
    let needle = target.encode_utf8(&mut buf).as_bytes();
    let end = chain.line_end(pos);
    let mut p = chain.char_next(pos);
    while p < end {
        if chain.read(p..(p + needle.len()).min(chain.len())).ok()?.as_slice() == needle {
            return Some(p);
        }
        p = chain.char_next(p);
    }
    None
}

fn to_left(chain: &PieceChain, pos: usize, target: char) -> Option<usize> {
    let mut buf = [0u8; 4];
    let needle = target.encode_utf8(&mut buf).as_bytes();
    let begin = chain.line_begin(pos);
    let mut p = pos;
    while p > begin {
        p = chain.char_prev(p);
        if chain.read(p..(p + needle.len()).min(chain.len())).ok()?.as_slice() == needle {
            return Some(p);
        }
    }
    None
}

// ==================== Search ====================

/// Bytes read by the first attempt of a search; doubled until a match fits
/// or the window covers the buffer.
const SEARCH_WINDOW: usize = 64 * 1024;

/// First match starting at or after `at` that `accept` takes.
///
/// Only the text from the line containing `at` onwards is read, in windows
/// that end on a line boundary. A match touching the end of a window is
/// retried with a larger one, since the bytes after it may change it.
pub(crate) fn first_match(
    chain: &PieceChain,
    at: usize,
    regex: &Regex,
    accept: impl Fn(&Range<usize>) -> bool,
) -> Option<Range<usize>> {
    let len = chain.len();
    let at = at.min(len);
    let begin = chain.line_begin(at);
    let mut size = SEARCH_WINDOW;
    loop {
        let end = if size >= len - begin {
            len
        } else {
            chain.line_next(begin + size)
        };
        let haystack = chain.read(begin..end).ok()?;

        let mut offset = at - begin;
        let mut found = None;
        while offset <= haystack.len() {
            let Some(m) = regex.find_at(&haystack, offset) else {
                break;
            };
            let range = begin + m.start()..begin + m.end();
            if accept(&range) {
                found = Some(range);
                break;
            }
            offset = if m.is_empty() { m.end() + 1 } else { m.end() };
        }

        match found {
            Some(range) if range.end < end || end == len => return Some(range),
            None if end == len => return None,
            _ => size = size.saturating_mul(2),
        }
    }
}

/// Last match `accept` takes among those found in the text up to the end
/// of the line containing `at`, read backwards in growing windows.
pub(crate) fn last_match(
    chain: &PieceChain,
    at: usize,
    regex: &Regex,
    accept: impl Fn(&Range<usize>) -> bool,
) -> Option<Range<usize>> {
    let end = chain.line_next(at.min(chain.len()));
    let mut size = SEARCH_WINDOW;
    loop {
        let begin = if size >= end {
            0
        } else {
            chain.line_begin(end - size)
        };
        let haystack = chain.read(begin..end).ok()?;
        let found = regex
            .find_iter(&haystack)
            .map(|m| begin + m.start()..begin + m.end())
            .filter(|r| accept(r))
            .last();
        if found.is_some() || begin == 0 {
            return found;
        }
        size = size.saturating_mul(2);
    }
}

/// Start of the first match after `pos`, wrapping around the end.
pub(crate) fn search_next(chain: &PieceChain, pos: usize, regex: &Regex) -> Option<usize> {
    let from = (pos + 1).min(chain.len());
    first_match(chain, from, regex, |_| true)
        .or_else(|| first_match(chain, 0, regex, |_| true))
        .map(|m| m.start)
}

/// Start of the last match before `pos`, wrapping around the start.
pub(crate) fn search_prev(chain: &PieceChain, pos: usize, regex: &Regex) -> Option<usize> {
    last_match(chain, pos, regex, |m| m.start < pos)
        .or_else(|| last_match(chain, chain.len(), regex, |_| true))
        .map(|m| m.start)
}

/// Bytes of the word under (or after) the cursor on the current line.
pub fn word_at(chain: &PieceChain, pos: usize) -> Option<Vec<u8>> {
    let (start, _) = chain
        .bytes_from(pos)
        .take_while(|&(_, b)| b != b'\n')
        .find(|&(_, b)| word_class(b) == Class::Word)?;
    let mut begin = start;
    while begin > 0 && chain.byte_at(begin - 1).is_some_and(|b| word_class(b) == Class::Word) {
        begin -= 1;
    }
    let end = chain
        .bytes_from(start)
        .find(|&(_, b)| word_class(b) != Class::Word)
        .map_or(chain.len(), |(p, _)| p);
    chain.read(begin..end).ok()
}
