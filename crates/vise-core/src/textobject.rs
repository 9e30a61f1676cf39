//! Text objects: ranges around a position.
//!
//! Where a motion answers "where does the cursor go", a text object answers
//! "which bytes does the operator cover". Every object is a pure function of
//! the chain and a position, and the result is an `Option<Range<usize>>`:
//! `None` means there is no such object here and the caller does nothing.
//!
//! ## Learning: Closed Enum plus a Side Table
//!
//! Built-in objects are a closed `enum`, so a `match` covers them all and the
//! compiler catches a forgotten case. Objects registered by scripts cannot be
//! enum variants, so they live in a [`DynArray`] and share one numeric id
//! space with the built-ins:
//!
//! ```text
//! 0 .. TextObject::ALL.len()        built-in, resolved by `match`
//! TextObject::ALL.len() ..          user object at index id - ALL.len()
//! ```

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use vise_buffer::PieceChain;

use crate::motion::{
    enclosing_open, first_match, is_space, last_match, line_finish, longword_class,
    matching_close, open_before, paragraph_next, paragraph_prev, sentence_next, sentence_prev,
    word_class, Class,
};
use crate::registry::DynArray;
use crate::{CoreError, CoreResult};

/// Whether an object includes its delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Excludes delimiters and surrounding whitespace
    Inner,
    /// Includes delimiters and surrounding whitespace
    Outer,
    /// Search based, direction dependent
    Split,
}

/// Numeric id shared by built-in and registered text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextObjectId(pub usize);

impl fmt::Display for TextObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// All built-in text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextObject {
    InnerWord,
    OuterWord,
    InnerLongword,
    OuterLongword,
    Sentence,
    Paragraph,
    OuterSquareBracket,
    InnerSquareBracket,
    OuterCurlyBracket,
    InnerCurlyBracket,
    OuterAngleBracket,
    InnerAngleBracket,
    OuterParenthesis,
    InnerParenthesis,
    OuterQuote,
    InnerQuote,
    OuterSingleQuote,
    InnerSingleQuote,
    OuterBacktick,
    InnerBacktick,
    OuterEntire,
    InnerEntire,
    OuterLine,
    InnerLine,
    Indentation,
    /// `gn`
    SearchForward,
    /// `gN`
    SearchBackward,
}

impl TextObject {
    /// Built-ins in id order.
    pub const ALL: [TextObject; 27] = [
        TextObject::InnerWord,
        TextObject::OuterWord,
        TextObject::InnerLongword,
        TextObject::OuterLongword,
        TextObject::Sentence,
        TextObject::Paragraph,
        TextObject::OuterSquareBracket,
        TextObject::InnerSquareBracket,
        TextObject::OuterCurlyBracket,
        TextObject::InnerCurlyBracket,
        TextObject::OuterAngleBracket,
        TextObject::InnerAngleBracket,
        TextObject::OuterParenthesis,
        TextObject::InnerParenthesis,
        TextObject::OuterQuote,
        TextObject::InnerQuote,
        TextObject::OuterSingleQuote,
        TextObject::InnerSingleQuote,
        TextObject::OuterBacktick,
        TextObject::InnerBacktick,
        TextObject::OuterEntire,
        TextObject::InnerEntire,
        TextObject::OuterLine,
        TextObject::InnerLine,
        TextObject::Indentation,
        TextObject::SearchForward,
        TextObject::SearchBackward,
    ];

    pub const fn id(self) -> TextObjectId {
        TextObjectId(self as usize)
    }

    pub fn from_id(id: TextObjectId) -> Option<TextObject> {
        Self::ALL.get(id.0).copied()
    }

    /// Action name, as used in `<vise-...>` keys.
    pub fn name(self) -> &'static str {
        match self {
            TextObject::InnerWord => "text-object-word-inner",
            TextObject::OuterWord => "text-object-word-outer",
            TextObject::InnerLongword => "text-object-longword-inner",
            TextObject::OuterLongword => "text-object-longword-outer",
            TextObject::Sentence => "text-object-sentence",
            TextObject::Paragraph => "text-object-paragraph",
            TextObject::OuterSquareBracket => "text-object-square-bracket-outer",
            TextObject::InnerSquareBracket => "text-object-square-bracket-inner",
            TextObject::OuterCurlyBracket => "text-object-curly-bracket-outer",
            TextObject::InnerCurlyBracket => "text-object-curly-bracket-inner",
            TextObject::OuterAngleBracket => "text-object-angle-bracket-outer",
            TextObject::InnerAngleBracket => "text-object-angle-bracket-inner",
            TextObject::OuterParenthesis => "text-object-parenthesis-outer",
            TextObject::InnerParenthesis => "text-object-parenthesis-inner",
            TextObject::OuterQuote => "text-object-quote-outer",
            TextObject::InnerQuote => "text-object-quote-inner",
            TextObject::OuterSingleQuote => "text-object-single-quote-outer",
            TextObject::InnerSingleQuote => "text-object-single-quote-inner",
            TextObject::OuterBacktick => "text-object-backtick-outer",
            TextObject::InnerBacktick => "text-object-backtick-inner",
            TextObject::OuterEntire => "text-object-entire-outer",
            TextObject::InnerEntire => "text-object-entire-inner",
            TextObject::OuterLine => "text-object-line-outer",
            TextObject::InnerLine => "text-object-line-inner",
            TextObject::Indentation => "text-object-indentation",
            TextObject::SearchForward => "text-object-search-forward",
            TextObject::SearchBackward => "text-object-search-backward",
        }
    }

    pub fn kind(self) -> ObjectKind {
        use TextObject::*;
        match self {
            InnerWord | InnerLongword | InnerSquareBracket | InnerCurlyBracket
            | InnerAngleBracket | InnerParenthesis | InnerQuote | InnerSingleQuote
            | InnerBacktick | InnerEntire | InnerLine => ObjectKind::Inner,
            SearchForward | SearchBackward => ObjectKind::Split,
            _ => ObjectKind::Outer,
        }
    }

    /// Objects that always cover whole lines.
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            TextObject::Paragraph
                | TextObject::OuterLine
                | TextObject::InnerEntire
                | TextObject::Indentation
        )
    }

    fn delimiters(self) -> Option<(u8, u8)> {
        use TextObject::*;
        match self {
            OuterSquareBracket | InnerSquareBracket => Some((b'[', b']')),
            OuterCurlyBracket | InnerCurlyBracket => Some((b'{', b'}')),
            OuterAngleBracket | InnerAngleBracket => Some((b'<', b'>')),
            OuterParenthesis | InnerParenthesis => Some((b'(', b')')),
            OuterQuote | InnerQuote => Some((b'"', b'"')),
            OuterSingleQuote | InnerSingleQuote => Some((b'\'', b'\'')),
            OuterBacktick | InnerBacktick => Some((b'`', b'`')),
            _ => None,
        }
    }

    /// Resolves the object around `pos`.
    ///
    /// A count widens the result: bracket objects move out to the `count`-th
    /// enclosing pair, quote and search objects ignore it, and all others
    /// extend over `count` consecutive objects.
    pub fn resolve(
        self,
        chain: &PieceChain,
        pos: usize,
        count: usize,
        search: Option<&Regex>,
    ) -> Option<Range<usize>> {
        if chain.is_empty() {
            return None;
        }
        let pos = pos.min(chain.len() - 1);
        let outer = self.kind() == ObjectKind::Outer;

        match self.delimiters() {
            Some((open, close)) if open == close => return quote(chain, pos, open, outer),
            Some((open, close)) => return bracket(chain, pos, open, close, outer, count),
            None => {}
        }

        match self {
            TextObject::SearchForward => search_forward(chain, pos, search?),
            TextObject::SearchBackward => search_backward(chain, pos, search?),
            _ => repeat(chain, pos, count, |p| self.resolve_once(chain, p)),
        }
    }

    fn resolve_once(self, chain: &PieceChain, pos: usize) -> Option<Range<usize>> {
        match self {
            TextObject::InnerWord => word(chain, pos, word_class, false),
            TextObject::OuterWord => word(chain, pos, word_class, true),
            TextObject::InnerLongword => word(chain, pos, longword_class, false),
            TextObject::OuterLongword => word(chain, pos, longword_class, true),
            TextObject::Sentence => sentence(chain, pos),
            TextObject::Paragraph => paragraph(chain, pos),
            TextObject::OuterEntire => Some(0..chain.len()),
            TextObject::InnerEntire => entire_inner(chain),
            TextObject::OuterLine => Some(chain.line_begin(pos)..chain.line_next(pos)),
            TextObject::InnerLine => line_inner(chain, pos),
            TextObject::Indentation => indentation(chain, pos),
            _ => None,
        }
    }
}

/// Unions `count` consecutive objects starting with the one at `pos`.
fn repeat(
    chain: &PieceChain,
    pos: usize,
    count: usize,
    resolve: impl Fn(usize) -> Option<Range<usize>>,
) -> Option<Range<usize>> {
    let mut range = resolve(pos)?;
    for _ in 1..count.max(1) {
        if range.end >= chain.len() {
            break;
        }
        match resolve(range.end) {
            Some(next) if next.end > range.end => range.end = next.end,
            _ => break,
        }
    }
    Some(range)
}

// ==================== Words ====================

fn run_start(chain: &PieceChain, pos: usize, mut same: impl FnMut(u8) -> bool) -> usize {
    chain
        .bytes_before(pos)
        .find(|&(_, b)| !same(b))
        .map_or(0, |(p, _)| p + 1)
}

fn run_end(chain: &PieceChain, pos: usize, mut same: impl FnMut(u8) -> bool) -> usize {
    chain
        .bytes_from(pos)
        .find(|&(_, b)| !same(b))
        .map_or(chain.len(), |(p, _)| p)
}

fn word(
    chain: &PieceChain,
    pos: usize,
    class: fn(u8) -> Class,
    outer: bool,
) -> Option<Range<usize>> {
    let cls = class(chain.byte_at(pos)?);
    if cls == Class::Newline {
        return None;
    }
    let start = run_start(chain, pos, |b| class(b) == cls);
    let end = run_end(chain, pos, |b| class(b) == cls);
    if !outer {
        return Some(start..end);
    }

    if cls == Class::Blank {
        // Leading blanks plus the word after them.
        return match chain.byte_at(end).map(class) {
            Some(next @ (Class::Word | Class::Punct)) => {
                Some(start..run_end(chain, end, |b| class(b) == next))
            }
            _ => Some(start..end),
        };
    }

    let blank = |b: u8| class(b) == Class::Blank;
    let tail = run_end(chain, end, blank);
    if tail > end {
        Some(start..tail)
    } else {
        Some(run_start(chain, start, blank)..end)
    }
}

// ==================== Sentences & Paragraphs ====================

fn sentence(chain: &PieceChain, pos: usize) -> Option<Range<usize>> {
    let start = sentence_prev(chain, pos + 1);
    let end = sentence_next(chain, start);
    (end > start).then_some(start..end)
}

fn paragraph(chain: &PieceChain, pos: usize) -> Option<Range<usize>> {
    if chain.line_is_blank(pos) {
        // A run of blank lines is a paragraph of its own.
        let mut start = chain.line_begin(pos);
        while let Some(prev) = chain.line_prev_begin(start) {
            if !chain.line_is_blank(prev) {
                break;
            }
            start = prev;
        }
        let mut end = chain.line_next(pos);
        while end < chain.len() && chain.line_is_blank(end) {
            end = chain.line_next(end);
        }
        return Some(start..end);
    }

    let prev = paragraph_prev(chain, pos);
    let start = if chain.line_is_blank(prev) {
        chain.line_next(prev)
    } else {
        prev
    };
    let end = paragraph_next(chain, pos);
    (end > start).then_some(start..end)
}

// ==================== Lines ====================

fn line_inner(chain: &PieceChain, pos: usize) -> Option<Range<usize>> {
    if chain.line_is_blank(pos) {
        return None;
    }
    let start = chain.line_start(pos);
    let end = chain.char_next(line_finish(chain, pos));
    Some(start..end)
}

fn entire_inner(chain: &PieceChain) -> Option<Range<usize>> {
    let (first, _) = chain.bytes_from(0).find(|&(_, b)| !is_space(b))?;
    let (last, _) = chain.bytes_before(chain.len()).find(|&(_, b)| !is_space(b))?;
    Some(chain.line_begin(first)..chain.line_next(last))
}

fn indentation(chain: &PieceChain, pos: usize) -> Option<Range<usize>> {
    if chain.line_is_blank(pos) {
        return None;
    }
    let indent = |p: usize| chain.line_start(p) - chain.line_begin(p);
    let level = indent(pos);
    let belongs = |p: usize| chain.line_is_blank(p) || indent(p) >= level;

    let mut start = chain.line_begin(pos);
    while let Some(prev) = chain.line_prev_begin(start) {
        if !belongs(prev) {
            break;
        }
        start = prev;
    }
    let mut end = chain.line_next(pos);
    while end < chain.len() && belongs(end) {
        end = chain.line_next(end);
    }
    Some(start..end)
}

// ==================== Delimited ====================

fn bracket(
    chain: &PieceChain,
    pos: usize,
    open: u8,
    close: u8,
    outer: bool,
    count: usize,
) -> Option<Range<usize>> {
    let mut start = enclosing_open(chain, pos, open, close)?;
    let mut end = matching_close(chain, start, open, close)?;
    for _ in 1..count.max(1) {
        let Some(s) = open_before(chain, start, open, close) else {
            break;
        };
        let Some(e) = matching_close(chain, s, open, close) else {
            break;
        };
        start = s;
        end = e;
    }
    Some(if outer { start..end + 1 } else { start + 1..end })
}

/// Quote pairs are matched left to right within the cursor's line. Only a
/// pair containing the cursor counts.
fn quote(chain: &PieceChain, pos: usize, quote: u8, outer: bool) -> Option<Range<usize>> {
    let begin = chain.line_begin(pos);
    let end = chain.line_end(pos);

    let mut marks = Vec::new();
    let mut prev = 0u8;
    for (p, b) in chain.bytes_from(begin).take_while(|&(p, _)| p < end) {
        if b == quote && prev != b'\\' {
            marks.push(p);
        }
        prev = b;
    }

    let (start, close) = marks
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .find(|&(open, close)| open <= pos && pos <= close)?;
    Some(if outer { start..close + 1 } else { start + 1..close })
}

// ==================== Search ====================

fn search_forward(chain: &PieceChain, pos: usize, regex: &Regex) -> Option<Range<usize>> {
    first_match(chain, chain.line_begin(pos), regex, |m| !m.is_empty() && m.end > pos)
        .or_else(|| first_match(chain, 0, regex, |m| !m.is_empty()))
}

fn search_backward(chain: &PieceChain, pos: usize, regex: &Regex) -> Option<Range<usize>> {
    last_match(chain, pos, regex, |m| !m.is_empty() && m.start <= pos)
        .or_else(|| last_match(chain, chain.len(), regex, |m| !m.is_empty()))
}

// ==================== Registered Objects ====================

/// Resolver signature for runtime-registered text objects.
pub type ResolveFn = dyn Fn(&PieceChain, usize) -> Option<Range<usize>> + Send + Sync;

/// A text object registered at runtime.
#[derive(Clone)]
pub struct UserTextObject {
    pub name: String,
    pub kind: ObjectKind,
    resolve: Arc<ResolveFn>,
}

impl fmt::Debug for UserTextObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserTextObject")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Built-in objects plus everything registered at runtime.
#[derive(Debug, Clone, Default)]
pub struct TextObjects {
    user: DynArray<UserTextObject>,
}

impl TextObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new object. Its id follows all built-in ids.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: ObjectKind,
        resolve: impl Fn(&PieceChain, usize) -> Option<Range<usize>> + Send + Sync + 'static,
    ) -> CoreResult<TextObjectId> {
        let name = name.into();
        let idx = self.user.push(UserTextObject {
            name: name.clone(),
            kind,
            resolve: Arc::new(resolve),
        })?;
        let id = TextObjectId(TextObject::ALL.len() + idx);
        tracing::debug!(%name, %id, "registered text object");
        Ok(id)
    }

    pub fn user(&self, id: TextObjectId) -> Option<&UserTextObject> {
        id.0
            .checked_sub(TextObject::ALL.len())
            .and_then(|idx| self.user.get(idx))
    }

    /// Number of objects, built-in and registered.
    pub fn len(&self) -> usize {
        TextObject::ALL.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn kind(&self, id: TextObjectId) -> CoreResult<ObjectKind> {
        if let Some(builtin) = TextObject::from_id(id) {
            return Ok(builtin.kind());
        }
        self.user(id)
            .map(|obj| obj.kind)
            .ok_or(CoreError::UnknownTextObject(id.0))
    }

    pub fn is_linewise(&self, id: TextObjectId) -> bool {
        TextObject::from_id(id).is_some_and(TextObject::is_linewise)
    }

    /// Resolves object `id` around `pos`. Built-ins are checked first, then
    /// the registered set by offset.
    pub fn resolve(
        &self,
        id: TextObjectId,
        chain: &PieceChain,
        pos: usize,
        count: usize,
        search: Option<&Regex>,
    ) -> CoreResult<Option<Range<usize>>> {
        if let Some(builtin) = TextObject::from_id(id) {
            return Ok(builtin.resolve(chain, pos, count, search));
        }
        let obj = self.user(id).ok_or(CoreError::UnknownTextObject(id.0))?;
        let range = repeat(chain, pos, count, |p| (obj.resolve)(chain, p))
            .filter(|r| r.start <= r.end && r.end <= chain.len());
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(obj: TextObject, text: &str, pos: usize) -> Option<String> {
        let chain = PieceChain::from(text);
        obj.resolve(&chain, pos, 1, None)
            .map(|r| text[r].to_string())
    }

    #[test]
    fn test_ids_follow_declaration_order() {
        for (i, obj) in TextObject::ALL.iter().enumerate() {
            assert_eq!(obj.id(), TextObjectId(i));
            assert_eq!(TextObject::from_id(TextObjectId(i)), Some(*obj));
        }
        assert_eq!(TextObject::from_id(TextObjectId(TextObject::ALL.len())), None);
    }

    #[test]
    fn test_words() {
        let text = "foo bar.baz  qux";
        assert_eq!(resolve(TextObject::InnerWord, text, 5).as_deref(), Some("bar"));
        assert_eq!(resolve(TextObject::OuterWord, text, 0).as_deref(), Some("foo "));
        assert_eq!(resolve(TextObject::InnerLongword, text, 5).as_deref(), Some("bar.baz"));
        assert_eq!(resolve(TextObject::OuterLongword, text, 5).as_deref(), Some("bar.baz  "));
        // No trailing blanks: take the leading ones.
        assert_eq!(resolve(TextObject::OuterWord, text, 14).as_deref(), Some("  qux"));
        // On blanks: the blanks plus the next word.
        assert_eq!(resolve(TextObject::OuterWord, text, 11).as_deref(), Some("  qux"));
        assert_eq!(resolve(TextObject::InnerWord, "a\nb", 1), None);
    }

    #[test]
    fn test_word_count_extends() {
        let chain = PieceChain::from("one two three");
        let range = TextObject::OuterWord.resolve(&chain, 0, 2, None);
        assert_eq!(range, Some(0..8));
    }

    #[test]
    fn test_bracket_on_delimiter_matches_inside() {
        let text = "x = (a, (b)) + c";
        let chain = PieceChain::from(text);
        for obj in [TextObject::InnerParenthesis, TextObject::OuterParenthesis] {
            let on = obj.resolve(&chain, 4, 1, None);
            let inside = obj.resolve(&chain, 5, 1, None);
            assert!(on.is_some());
            assert_eq!(on, inside, "{}", obj.name());
        }
        assert_eq!(resolve(TextObject::InnerParenthesis, text, 4).as_deref(), Some("a, (b)"));
        assert_eq!(resolve(TextObject::OuterParenthesis, text, 9).as_deref(), Some("(b)"));
        // On the closer: the pair it closes.
        assert_eq!(resolve(TextObject::OuterParenthesis, text, 11).as_deref(), Some("(a, (b))"));
        assert_eq!(resolve(TextObject::InnerParenthesis, text, 0), None);
    }

    #[test]
    fn test_bracket_count_moves_outward() {
        let chain = PieceChain::from("{a {b {c}}}");
        assert_eq!(TextObject::InnerCurlyBracket.resolve(&chain, 7, 2, None), Some(4..9));
        assert_eq!(TextObject::OuterCurlyBracket.resolve(&chain, 7, 9, None), Some(0..11));
    }

    #[test]
    fn test_unbalanced_bracket_is_none() {
        assert_eq!(resolve(TextObject::InnerSquareBracket, "[abc", 2), None);
        assert_eq!(resolve(TextObject::InnerAngleBracket, "<>", 0).as_deref(), Some(""));
    }

    #[test]
    fn test_quotes() {
        let text = r#"say "hi" and "bye" now"#;
        assert_eq!(resolve(TextObject::InnerQuote, text, 5).as_deref(), Some("hi"));
        assert_eq!(resolve(TextObject::OuterQuote, text, 4).as_deref(), Some("\"hi\""));
        assert_eq!(resolve(TextObject::InnerQuote, text, 7).as_deref(), Some("hi"));
        // Outside every pair there is nothing to select.
        assert_eq!(resolve(TextObject::InnerQuote, text, 0), None);
        assert_eq!(resolve(TextObject::InnerQuote, text, 9), None);
        assert_eq!(resolve(TextObject::InnerQuote, text, 20), None);
        assert_eq!(resolve(TextObject::InnerSingleQuote, r"'it\'s'", 1).as_deref(), Some(r"it\'s"));
    }

    #[test]
    fn test_lines_and_entire() {
        let text = "\n  one  \ntwo\n\n";
        assert_eq!(resolve(TextObject::OuterLine, text, 3).as_deref(), Some("  one  \n"));
        assert_eq!(resolve(TextObject::InnerLine, text, 3).as_deref(), Some("one"));
        assert_eq!(resolve(TextObject::InnerLine, text, 0), None);
        assert_eq!(resolve(TextObject::OuterEntire, text, 0).as_deref(), Some(text));
        assert_eq!(resolve(TextObject::InnerEntire, text, 0).as_deref(), Some("  one  \ntwo\n"));
        assert_eq!(TextObject::OuterEntire.resolve(&PieceChain::new(), 0, 1, None), None);
    }

    #[test]
    fn test_paragraph() {
        let text = "a\nb\n\n\nc\n";
        assert_eq!(resolve(TextObject::Paragraph, text, 2).as_deref(), Some("a\nb\n"));
        assert_eq!(resolve(TextObject::Paragraph, text, 5).as_deref(), Some("\n\n"));
        assert_eq!(resolve(TextObject::Paragraph, text, 6).as_deref(), Some("c\n"));
    }

    #[test]
    fn test_sentence() {
        let text = "One. Two three. Four";
        assert_eq!(resolve(TextObject::Sentence, text, 6).as_deref(), Some("Two three. "));
        assert_eq!(resolve(TextObject::Sentence, text, 0).as_deref(), Some("One. "));
    }

    #[test]
    fn test_indentation() {
        let text = "fn\n  a\n\n    b\n  c\nd\n";
        assert_eq!(resolve(TextObject::Indentation, text, 4).as_deref(), Some("  a\n\n    b\n  c\n"));
        assert_eq!(resolve(TextObject::Indentation, text, 7), None);
    }

    #[test]
    fn test_search_objects() {
        let chain = PieceChain::from("ab xx ab xx");
        let regex = Regex::new("xx").unwrap();
        assert_eq!(TextObject::SearchForward.resolve(&chain, 0, 1, Some(&regex)), Some(3..5));
        assert_eq!(TextObject::SearchForward.resolve(&chain, 4, 1, Some(&regex)), Some(3..5));
        assert_eq!(TextObject::SearchForward.resolve(&chain, 10, 1, Some(&regex)), Some(9..11));
        assert_eq!(TextObject::SearchBackward.resolve(&chain, 8, 1, Some(&regex)), Some(3..5));
        assert_eq!(TextObject::SearchBackward.resolve(&chain, 1, 1, Some(&regex)), Some(9..11));
        // Without a pattern there is nothing to select.
        assert_eq!(TextObject::SearchForward.resolve(&chain, 0, 1, None), None);
    }

    #[test]
    fn test_registered_objects_follow_builtins() {
        let mut objects = TextObjects::new();
        let digits = objects
            .register("digits", ObjectKind::Inner, |chain, pos| {
                let start = run_start(chain, pos, |b| b.is_ascii_digit());
                let end = run_end(chain, pos, |b| b.is_ascii_digit());
                (end > start).then_some(start..end)
            })
            .unwrap();
        assert_eq!(digits, TextObjectId(TextObject::ALL.len()));
        assert_eq!(objects.len(), TextObject::ALL.len() + 1);
        assert_eq!(objects.kind(digits).unwrap(), ObjectKind::Inner);

        let chain = PieceChain::from("ab 1234 cd");
        assert_eq!(objects.resolve(digits, &chain, 4, 1, None).unwrap(), Some(3..7));
        assert_eq!(
            objects.resolve(TextObject::InnerWord.id(), &chain, 0, 1, None).unwrap(),
            Some(0..2)
        );
        assert!(matches!(
            objects.resolve(TextObjectId(999), &chain, 0, 1, None),
            Err(CoreError::UnknownTextObject(999))
        ));
    }
}
