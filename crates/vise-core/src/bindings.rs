//! Default key binding tables.
//!
//! Each table groups related bindings. A mode is a list of tables, searched
//! in order; a key sequence bound in an earlier table shadows the same
//! sequence in a later one.

use crate::action::{Action, Mode, Operator, Put};
use crate::keymap::{Bind, BindingTable};
use crate::motion::Motion;
use crate::textobject::TextObject;

const fn motion(m: Motion) -> Bind {
    Bind::Action(Action::Motion(m))
}

const fn object(t: TextObject) -> Bind {
    Bind::Action(Action::TextObject(t.id()))
}

const fn operator(op: Operator) -> Bind {
    Bind::Action(Action::Operator(op))
}

const fn mode(m: Mode) -> Bind {
    Bind::Action(Action::Mode(m))
}

const fn act(a: Action) -> Bind {
    Bind::Action(a)
}

const fn alias(keys: &'static str) -> Bind {
    Bind::Alias(keys)
}

pub static BASIC: BindingTable = BindingTable {
    name: "basic",
    bindings: &[
        ("<Down>", motion(Motion::LineDown)),
        ("<End>", motion(Motion::LineEnd)),
        ("<Home>", motion(Motion::LineBegin)),
        ("<Left>", motion(Motion::CharPrev)),
        ("<Right>", motion(Motion::CharNext)),
        ("<S-Left>", motion(Motion::LongwordStartPrev)),
        ("<S-Right>", motion(Motion::LongwordStartNext)),
        ("<Up>", motion(Motion::LineUp)),
    ],
};

pub static MOTIONS: BindingTable = BindingTable {
    name: "motions",
    bindings: &[
        ("|", motion(Motion::Column)),
        ("[{", motion(Motion::BlockStart)),
        ("]}", motion(Motion::BlockEnd)),
        ("[(", motion(Motion::ParenStart)),
        ("])", motion(Motion::ParenEnd)),
        ("$", motion(Motion::LineEnd)),
        ("^", motion(Motion::LineStart)),
        ("}", motion(Motion::ParagraphNext)),
        ("{", motion(Motion::ParagraphPrev)),
        ("%", motion(Motion::BracketMatch)),
        ("#", motion(Motion::SearchWordBackward)),
        ("*", motion(Motion::SearchWordForward)),
        (")", motion(Motion::SentenceNext)),
        ("(", motion(Motion::SentencePrev)),
        (";", motion(Motion::TotillRepeat)),
        (",", motion(Motion::TotillReverse)),
        ("+", alias("j^")),
        ("-", alias("k^")),
        (" ", alias("<Space>")),
        ("<Space>", alias("l")),
        ("<Backspace>", alias("h")),
        ("B", motion(Motion::LongwordStartPrev)),
        ("b", motion(Motion::WordStartPrev)),
        ("<C-h>", alias("<Backspace>")),
        ("<C-j>", alias("j")),
        ("<C-n>", alias("j")),
        ("<C-p>", alias("k")),
        ("E", motion(Motion::LongwordEndNext)),
        ("e", motion(Motion::WordEndNext)),
        ("<Enter>", alias("j")),
        ("F", motion(Motion::ToLeft)),
        ("f", motion(Motion::ToRight)),
        ("g_", motion(Motion::LineFinish)),
        ("G", motion(Motion::LineLast)),
        ("gE", motion(Motion::LongwordEndPrev)),
        ("ge", motion(Motion::WordEndPrev)),
        ("gg", motion(Motion::LineFirst)),
        ("h", motion(Motion::CharPrev)),
        ("j", motion(Motion::LineDown)),
        ("k", motion(Motion::LineUp)),
        ("l", motion(Motion::CharNext)),
        ("n", motion(Motion::SearchNext)),
        ("N", motion(Motion::SearchPrev)),
        ("T", motion(Motion::TillLeft)),
        ("t", motion(Motion::TillRight)),
        ("W", motion(Motion::LongwordStartNext)),
        ("w", motion(Motion::WordStartNext)),
    ],
};

pub static TEXT_OBJECTS: BindingTable = BindingTable {
    name: "text-objects",
    bindings: &[
        ("a<", object(TextObject::OuterAngleBracket)),
        ("a`", object(TextObject::OuterBacktick)),
        ("a{", object(TextObject::OuterCurlyBracket)),
        ("a(", object(TextObject::OuterParenthesis)),
        ("a\"", object(TextObject::OuterQuote)),
        ("a'", object(TextObject::OuterSingleQuote)),
        ("a[", object(TextObject::OuterSquareBracket)),
        ("a>", alias("a<lt>")),
        ("a)", alias("a(")),
        ("a]", alias("a[")),
        ("a}", alias("a{")),
        ("ab", alias("a(")),
        ("aB", alias("a{")),
        ("ae", object(TextObject::OuterEntire)),
        ("al", object(TextObject::OuterLine)),
        ("ap", object(TextObject::Paragraph)),
        ("as", object(TextObject::Sentence)),
        ("a<Tab>", object(TextObject::Indentation)),
        ("aW", object(TextObject::OuterLongword)),
        ("aw", object(TextObject::OuterWord)),
        ("gN", object(TextObject::SearchBackward)),
        ("gn", object(TextObject::SearchForward)),
        ("i<", object(TextObject::InnerAngleBracket)),
        ("i`", object(TextObject::InnerBacktick)),
        ("i{", object(TextObject::InnerCurlyBracket)),
        ("i(", object(TextObject::InnerParenthesis)),
        ("i\"", object(TextObject::InnerQuote)),
        ("i'", object(TextObject::InnerSingleQuote)),
        ("i[", object(TextObject::InnerSquareBracket)),
        ("i>", alias("i<lt>")),
        ("i)", alias("i(")),
        ("i]", alias("i[")),
        ("i}", alias("i{")),
        ("ib", alias("i(")),
        ("iB", alias("i{")),
        ("ie", object(TextObject::InnerEntire)),
        ("il", object(TextObject::InnerLine)),
        ("ip", object(TextObject::Paragraph)),
        ("is", object(TextObject::Sentence)),
        ("i<Tab>", object(TextObject::Indentation)),
        ("iW", object(TextObject::InnerLongword)),
        ("iw", object(TextObject::InnerWord)),
    ],
};

pub static OPERATORS: BindingTable = BindingTable {
    name: "operators",
    bindings: &[
        ("0", act(Action::Count)),
        ("1", act(Action::Count)),
        ("2", act(Action::Count)),
        ("3", act(Action::Count)),
        ("4", act(Action::Count)),
        ("5", act(Action::Count)),
        ("6", act(Action::Count)),
        ("7", act(Action::Count)),
        ("8", act(Action::Count)),
        ("9", act(Action::Count)),
        ("~", operator(Operator::CaseSwap)),
        ("<lt>", operator(Operator::ShiftLeft)),
        (">", operator(Operator::ShiftRight)),
        ("\"", act(Action::Register)),
        ("c", operator(Operator::Change)),
        ("d", operator(Operator::Delete)),
        ("g~", operator(Operator::CaseSwap)),
        ("gp", act(Action::Put(Put::AfterEnd))),
        ("gP", act(Action::Put(Put::BeforeEnd))),
        ("gu", operator(Operator::CaseLower)),
        ("gU", operator(Operator::CaseUpper)),
        ("p", act(Action::Put(Put::After))),
        ("P", act(Action::Put(Put::Before))),
        ("y", operator(Operator::Yank)),
    ],
};

pub static OPERATOR_OPTIONS: BindingTable = BindingTable {
    name: "operator-options",
    bindings: &[
        ("v", act(Action::MotionCharwise)),
        ("V", act(Action::MotionLinewise)),
        ("<Escape>", act(Action::Cancel)),
    ],
};

pub static NORMAL: BindingTable = BindingTable {
    name: "normal",
    bindings: &[
        ("a", act(Action::AppendCharNext)),
        ("A", act(Action::AppendLineEnd)),
        ("@", act(Action::MacroReplay)),
        ("~", alias("<vise-operator-case-swap>ll")),
        ("<C-r>", act(Action::Redo)),
        ("C", alias("c$")),
        ("D", alias("d$")),
        ("<Delete>", alias("x")),
        ("<Escape>", act(Action::Cancel)),
        ("g-", act(Action::Earlier)),
        ("g+", act(Action::Later)),
        ("gn", alias("vgn")),
        ("gN", alias("vgN")),
        ("I", act(Action::InsertLineStart)),
        ("i", mode(Mode::Insert)),
        ("J", act(Action::JoinLineBelow)),
        ("O", act(Action::OpenLineAbove)),
        ("o", act(Action::OpenLineBelow)),
        ("q", act(Action::MacroRecord)),
        ("R", mode(Mode::Replace)),
        ("r", act(Action::ReplaceChar)),
        ("S", alias("^c$")),
        ("s", alias("cl")),
        ("u", act(Action::Undo)),
        ("v", mode(Mode::Visual)),
        ("V", mode(Mode::VisualLine)),
        ("x", act(Action::DeleteCharNext)),
        ("X", alias("dh")),
        ("Y", alias("y$")),
    ],
};

pub static VISUAL: BindingTable = BindingTable {
    name: "visual",
    bindings: &[
        ("<Backspace>", alias("d")),
        ("<C-h>", alias("<Backspace>")),
        ("<Delete>", alias("<Backspace>")),
        ("<Escape>", mode(Mode::Normal)),
        ("J", act(Action::JoinLineBelow)),
        ("o", act(Action::SelectionFlip)),
        ("r", alias("c")),
        ("s", alias("c")),
        ("V", mode(Mode::VisualLine)),
        ("v", alias("<Escape>")),
        ("x", alias("d")),
    ],
};

pub static VISUAL_LINE: BindingTable = BindingTable {
    name: "visual-line",
    bindings: &[("v", mode(Mode::Visual)), ("V", mode(Mode::Normal))],
};

pub static READLINE: BindingTable = BindingTable {
    name: "readline",
    bindings: &[
        ("<Backspace>", act(Action::DeleteCharPrev)),
        ("<C-c>", alias("<Escape>")),
        ("<C-d>", act(Action::DeleteCharNext)),
        ("<C-h>", alias("<Backspace>")),
        ("<C-u>", act(Action::DeleteLineBegin)),
        ("<C-w>", act(Action::DeleteWordPrev)),
        ("<Delete>", act(Action::DeleteCharNext)),
        ("<Escape>", mode(Mode::Normal)),
    ],
};

pub static INSERT: BindingTable = BindingTable {
    name: "insert",
    bindings: &[
        ("<C-d>", alias("<Escape><lt><lt>i")),
        ("<C-i>", alias("<Tab>")),
        ("<C-j>", alias("<Enter>")),
        ("<C-m>", alias("<Enter>")),
        ("<C-t>", alias("<Escape>>>i")),
        ("<Enter>", act(Action::InsertNewline)),
        ("<Escape>", mode(Mode::Normal)),
        ("<Tab>", act(Action::InsertTab)),
    ],
};

/// Replace mode types over text but otherwise behaves like insert mode.
pub static REPLACE: BindingTable = BindingTable {
    name: "replace",
    bindings: &[],
};

static OPERATOR_PENDING_TABLES: [&BindingTable; 5] =
    [&OPERATOR_OPTIONS, &OPERATORS, &TEXT_OBJECTS, &MOTIONS, &BASIC];
static NORMAL_TABLES: [&BindingTable; 4] = [&NORMAL, &OPERATORS, &MOTIONS, &BASIC];
static VISUAL_TABLES: [&BindingTable; 5] = [&VISUAL, &TEXT_OBJECTS, &OPERATORS, &MOTIONS, &BASIC];
static VISUAL_LINE_TABLES: [&BindingTable; 6] = [
    &VISUAL_LINE,
    &VISUAL,
    &TEXT_OBJECTS,
    &OPERATORS,
    &MOTIONS,
    &BASIC,
];
static INSERT_TABLES: [&BindingTable; 3] = [&INSERT, &READLINE, &BASIC];
static REPLACE_TABLES: [&BindingTable; 4] = [&REPLACE, &INSERT, &READLINE, &BASIC];

/// Tables composing each mode, highest priority first.
pub fn tables(m: Mode) -> &'static [&'static BindingTable] {
    match m {
        Mode::OperatorPending => &OPERATOR_PENDING_TABLES,
        Mode::Normal => &NORMAL_TABLES,
        Mode::Visual => &VISUAL_TABLES,
        Mode::VisualLine => &VISUAL_LINE_TABLES,
        Mode::Insert => &INSERT_TABLES,
        Mode::Replace => &REPLACE_TABLES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::keymap::{Binding, KeyTrie, Lookup};

    fn names(m: Mode) -> Vec<&'static str> {
        tables(m).iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_mode_composition() {
        assert_eq!(
            names(Mode::OperatorPending),
            ["operator-options", "operators", "text-objects", "motions", "basic"]
        );
        assert_eq!(names(Mode::Normal), ["normal", "operators", "motions", "basic"]);
        assert_eq!(
            names(Mode::VisualLine),
            ["visual-line", "visual", "text-objects", "operators", "motions", "basic"]
        );
        assert_eq!(names(Mode::Replace), ["replace", "insert", "readline", "basic"]);
        for mode in Mode::ALL {
            assert_eq!(tables(mode).last().map(|t| t.name), Some("basic"));
        }
    }

    #[test]
    fn test_aliases_parse_to_bound_keys() {
        // Every alias in normal mode expands to keys that mean something.
        let trie = KeyTrie::from_tables(tables(Mode::Normal));
        for table in tables(Mode::Normal) {
            for (_, bind) in table.bindings {
                if let Bind::Alias(keys) = bind {
                    let keys = Key::parse_sequence(keys);
                    let first = &keys[..1];
                    let known = first[0].action_name().is_some()
                        || trie.lookup(first) != Lookup::NoMatch;
                    assert!(known, "alias {:?} starts with an unbound key", keys);
                }
            }
        }
    }

    #[test]
    fn test_angle_bracket_keys() {
        let trie = KeyTrie::from_tables(tables(Mode::OperatorPending));
        assert!(matches!(
            trie.lookup(&Key::parse_sequence("<lt>")),
            Lookup::Exact(Binding::Action(Action::Operator(Operator::ShiftLeft)))
        ));
        assert!(matches!(
            trie.lookup(&Key::parse_sequence("i>")),
            Lookup::Exact(Binding::Alias(_))
        ));
    }

    #[test]
    fn test_zero_is_a_count() {
        let trie = KeyTrie::from_tables(tables(Mode::Normal));
        assert_eq!(
            trie.lookup(&[Key::Char('0')]),
            Lookup::Exact(&Binding::Action(Action::Count))
        );
    }
}
