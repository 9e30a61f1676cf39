//! Modes, actions and the in-progress command.
//!
//! ## Learning: A Closed Enum instead of Function Pointers
//!
//! Every key binding ends in an [`Action`]. Built-in actions are enum
//! variants, dispatched with one `match`; actions added by scripts are
//! `Action::User(id)` and look their handler up in a side table. Because
//! `Action` is `Copy` and its constructors are `const`, the default binding
//! tables can be plain `static` data.

use serde::{Deserialize, Serialize};

use crate::motion::Motion;
use crate::register::RegisterRef;
use crate::textobject::{TextObject, TextObjectId};

// ==================== Mode ====================

/// Editor modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Normal,
    /// An operator waits for its motion or text object
    OperatorPending,
    Visual,
    VisualLine,
    Insert,
    Replace,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Normal,
        Mode::OperatorPending,
        Mode::Visual,
        Mode::VisualLine,
        Mode::Insert,
        Mode::Replace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::OperatorPending => "operator-pending",
            Mode::Visual => "visual",
            Mode::VisualLine => "visual-line",
            Mode::Insert => "insert",
            Mode::Replace => "replace",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine)
    }

    /// Modes in which unbound printable keys become text.
    pub fn is_insert(self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ==================== Operators ====================

/// Operators act on the range a following motion or text object yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    CaseSwap,
    CaseLower,
    CaseUpper,
    ShiftLeft,
    ShiftRight,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Operator::Delete,
        Operator::Change,
        Operator::Yank,
        Operator::CaseSwap,
        Operator::CaseLower,
        Operator::CaseUpper,
        Operator::ShiftLeft,
        Operator::ShiftRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operator::Delete => "operator-delete",
            Operator::Change => "operator-change",
            Operator::Yank => "operator-yank",
            Operator::CaseSwap => "operator-case-swap",
            Operator::CaseLower => "operator-case-lower",
            Operator::CaseUpper => "operator-case-upper",
            Operator::ShiftLeft => "operator-shift-left",
            Operator::ShiftRight => "operator-shift-right",
        }
    }

    /// Shifting always works on whole lines.
    pub fn is_linewise(self) -> bool {
        matches!(self, Operator::ShiftLeft | Operator::ShiftRight)
    }
}

/// Where a put places register content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Put {
    /// `p`
    After,
    /// `P`
    Before,
    /// `gp`, cursor ends after the new text
    AfterEnd,
    /// `gP`, cursor ends after the new text
    BeforeEnd,
}

impl Put {
    pub const ALL: [Put; 4] = [Put::After, Put::Before, Put::AfterEnd, Put::BeforeEnd];

    pub fn name(self) -> &'static str {
        match self {
            Put::After => "put-after",
            Put::Before => "put-before",
            Put::AfterEnd => "put-after-end",
            Put::BeforeEnd => "put-before-end",
        }
    }

    pub fn is_after(self) -> bool {
        matches!(self, Put::After | Put::AfterEnd)
    }

    pub fn cursor_at_end(self) -> bool {
        matches!(self, Put::AfterEnd | Put::BeforeEnd)
    }
}

// ==================== Actions ====================

/// What a key binding does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// A digit of a count; the digit is the key that triggered it
    Count,
    /// `"`: the next key names a register
    Register,
    Operator(Operator),
    Motion(Motion),
    TextObject(TextObjectId),
    Mode(Mode),
    Put(Put),
    Undo,
    Redo,
    Earlier,
    Later,
    MacroRecord,
    MacroReplay,
    DeleteCharNext,
    DeleteCharPrev,
    DeleteWordPrev,
    DeleteLineBegin,
    InsertNewline,
    InsertTab,
    AppendCharNext,
    AppendLineEnd,
    InsertLineStart,
    OpenLineBelow,
    OpenLineAbove,
    ReplaceChar,
    JoinLineBelow,
    /// Forces the pending operator's motion to be charwise
    MotionCharwise,
    /// Forces the pending operator's motion to be linewise
    MotionLinewise,
    SelectionFlip,
    Cancel,
    /// Registered at runtime, index into the editor's handler table
    User(usize),
}

/// Actions that are neither motions, text objects, operators, modes nor puts.
const SIMPLE: [Action; 24] = [
    Action::Count,
    Action::Register,
    Action::Undo,
    Action::Redo,
    Action::Earlier,
    Action::Later,
    Action::MacroRecord,
    Action::MacroReplay,
    Action::DeleteCharNext,
    Action::DeleteCharPrev,
    Action::DeleteWordPrev,
    Action::DeleteLineBegin,
    Action::InsertNewline,
    Action::InsertTab,
    Action::AppendCharNext,
    Action::AppendLineEnd,
    Action::InsertLineStart,
    Action::OpenLineBelow,
    Action::OpenLineAbove,
    Action::ReplaceChar,
    Action::JoinLineBelow,
    Action::MotionCharwise,
    Action::MotionLinewise,
    Action::SelectionFlip,
];

impl Action {
    /// Every built-in action, in no particular order.
    pub fn builtins() -> impl Iterator<Item = Action> {
        SIMPLE
            .into_iter()
            .chain(std::iter::once(Action::Cancel))
            .chain(Operator::ALL.into_iter().map(Action::Operator))
            .chain(Motion::ALL.into_iter().map(Action::Motion))
            .chain(TextObject::ALL.into_iter().map(|t| Action::TextObject(t.id())))
            .chain(Mode::ALL.into_iter().map(Action::Mode))
            .chain(Put::ALL.into_iter().map(Action::Put))
    }

    /// Looks up a built-in action by name.
    pub fn from_name(name: &str) -> Option<Action> {
        Self::builtins().find(|a| a.name() == Some(name))
    }

    /// Name of a built-in action, `None` for user actions and text objects
    /// registered at runtime.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Action::Count => "count",
            Action::Register => "register",
            Action::Operator(op) => op.name(),
            Action::Motion(m) => m.name(),
            Action::TextObject(id) => return TextObject::from_id(id).map(TextObject::name),
            Action::Mode(Mode::Normal) => "mode-normal",
            Action::Mode(Mode::OperatorPending) => "mode-operator-pending",
            Action::Mode(Mode::Visual) => "mode-visual",
            Action::Mode(Mode::VisualLine) => "mode-visual-line",
            Action::Mode(Mode::Insert) => "mode-insert",
            Action::Mode(Mode::Replace) => "mode-replace",
            Action::Put(put) => put.name(),
            Action::Undo => "undo",
            Action::Redo => "redo",
            Action::Earlier => "earlier",
            Action::Later => "later",
            Action::MacroRecord => "macro-record",
            Action::MacroReplay => "macro-replay",
            Action::DeleteCharNext => "delete-char-next",
            Action::DeleteCharPrev => "delete-char-prev",
            Action::DeleteWordPrev => "delete-word-prev",
            Action::DeleteLineBegin => "delete-line-begin",
            Action::InsertNewline => "insert-newline",
            Action::InsertTab => "insert-tab",
            Action::AppendCharNext => "append-char-next",
            Action::AppendLineEnd => "append-line-end",
            Action::InsertLineStart => "insert-line-start",
            Action::OpenLineBelow => "open-line-below",
            Action::OpenLineAbove => "open-line-above",
            Action::ReplaceChar => "replace-char",
            Action::JoinLineBelow => "join-line-below",
            Action::MotionCharwise => "motion-charwise",
            Action::MotionLinewise => "motion-linewise",
            Action::SelectionFlip => "selection-flip",
            Action::Cancel => "cancel",
            Action::User(_) => return None,
        };
        Some(name)
    }

    /// Actions that read one more key as their argument.
    pub fn needs_char(self) -> bool {
        match self {
            Action::Register
            | Action::MacroRecord
            | Action::MacroReplay
            | Action::ReplaceChar => true,
            Action::Motion(m) => m.needs_char(),
            _ => false,
        }
    }
}

// ==================== Action State ====================

/// Forced motion type from `v`/`V` after an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Force {
    Charwise,
    Linewise,
}

/// The command being assembled from keys.
///
/// Reset completely after every command, so nothing leaks into the next
/// key sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionState {
    /// Count typed after the operator, or the only count
    pub count: Option<usize>,
    /// Count typed before the operator
    pub operator_count: Option<usize>,
    pub register: Option<RegisterRef>,
    pub operator: Option<Operator>,
    pub force: Option<Force>,
    /// Action waiting for its character argument
    pub awaiting: Option<Action>,
}

impl ActionState {
    /// Appends a digit to the count, saturating at `max`.
    pub fn push_digit(&mut self, digit: u32, max: usize) {
        let count = self.count.unwrap_or(0);
        let next = count.saturating_mul(10).saturating_add(digit as usize);
        self.count = Some(next.min(max));
    }

    /// Starts an operator; the count typed so far belongs to it.
    pub fn set_operator(&mut self, op: Operator) {
        self.operator = Some(op);
        self.operator_count = self.count.take();
    }

    /// Combined count: both counts multiply, capped at `max`.
    pub fn effective_count(&self, max: usize) -> Option<usize> {
        match (self.operator_count, self.count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1)).min(max)),
        }
    }

    /// Effective count, defaulting to 1.
    pub fn count_or_one(&self, max: usize) -> usize {
        self.effective_count(max).unwrap_or(1).max(1)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
