//! Canonical key tokens.
//!
//! Terminal decoding happens elsewhere; the core only ever sees already
//! normalised tokens. A token is either a single character or a named key
//! written in angle brackets:
//!
//! ```text
//! "d2w"          -> [d] [2] [w]
//! "<C-w>j"       -> [<C-w>] [j]
//! "<lt>"         -> [<]        (a literal less-than)
//! "a<"           -> [a] [<]    (unterminated brackets are literal)
//! ```

use serde::{Deserialize, Serialize};

/// A single canonical key token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// A printable character typed as-is
    Char(char),
    /// A named key such as `Escape`, `C-w` or `vise-undo`
    Named(Box<str>),
}

impl Key {
    pub fn named(name: &str) -> Self {
        Key::Named(name.into())
    }

    pub fn escape() -> Self {
        Key::named("Escape")
    }

    /// Parses one or more tokens from a key string.
    ///
    /// Never fails: anything that is not a well-formed `<...>` group is
    /// taken character by character.
    pub fn parse_sequence(s: &str) -> Vec<Key> {
        let mut keys = Vec::new();
        let mut rest = s;
        while let Some(c) = rest.chars().next() {
            if c == '<' {
                if let Some(end) = rest[1..].find('>') {
                    let name = &rest[1..=end];
                    // "<>" or "<<" are literal characters, not groups.
                    if !name.is_empty() && !name.contains('<') {
                        keys.push(Key::from_name(name));
                        rest = &rest[end + 2..];
                        continue;
                    }
                }
            }
            keys.push(Key::Char(c));
            rest = &rest[c.len_utf8()..];
        }
        keys
    }

    fn from_name(name: &str) -> Self {
        match name {
            "lt" => Key::Char('<'),
            _ => Key::named(name),
        }
    }

    /// The text this key produces when typed in insert mode, if any.
    pub fn text(&self) -> Option<char> {
        match self {
            Key::Char(c) if !c.is_control() => Some(*c),
            Key::Named(name) => match name.as_ref() {
                "Space" => Some(' '),
                _ => None,
            },
            Key::Char(_) => None,
        }
    }

    /// Name of the action this key invokes directly, for `<vise-...>` keys.
    pub fn action_name(&self) -> Option<&str> {
        match self {
            Key::Named(name) => name.strip_prefix("vise-"),
            Key::Char(_) => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, Key::Named(name) if name.as_ref() == "Escape")
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char('<') => write!(f, "<lt>"),
            Key::Char(c) => write!(f, "{}", c),
            Key::Named(name) => write!(f, "<{}>", name),
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::Char(c)
    }
}

/// Renders a token sequence back into its string form.
///
/// `parse_sequence(&render(keys)) == keys` for every sequence.
pub fn render(keys: &[Key]) -> String {
    keys.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_named() {
        let keys = Key::parse_sequence("d<C-w>x<Escape>");
        assert_eq!(
            keys,
            vec![
                Key::Char('d'),
                Key::named("C-w"),
                Key::Char('x'),
                Key::escape(),
            ]
        );
    }

    #[test]
    fn test_parse_literal_angle_brackets() {
        assert_eq!(Key::parse_sequence("a<"), vec![Key::Char('a'), Key::Char('<')]);
        assert_eq!(Key::parse_sequence("<<"), vec![Key::Char('<'), Key::Char('<')]);
        assert_eq!(Key::parse_sequence("<lt>"), vec![Key::Char('<')]);
        assert_eq!(
            Key::parse_sequence("<>"),
            vec![Key::Char('<'), Key::Char('>')]
        );
    }

    #[test]
    fn test_render_round_trips() {
        let source = "i<lt>b<Enter>é<Escape>";
        let keys = Key::parse_sequence(source);
        assert_eq!(render(&keys), source);
        assert_eq!(Key::parse_sequence(&render(&keys)), keys);
    }

    #[test]
    fn test_action_keys() {
        let key = Key::parse_sequence("<vise-operator-delete>").remove(0);
        assert_eq!(key.action_name(), Some("operator-delete"));
        assert_eq!(Key::Char('x').action_name(), None);
    }

    #[test]
    fn test_text() {
        assert_eq!(Key::Char('a').text(), Some('a'));
        assert_eq!(Key::named("Space").text(), Some(' '));
        assert_eq!(Key::escape().text(), None);
    }
}
