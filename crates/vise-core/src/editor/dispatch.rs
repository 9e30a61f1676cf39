//! Key dispatch: from key tokens to executed actions.
//!
//! ## Learning: A Work Queue instead of Recursion
//!
//! Aliases and macro replays both produce more keys. Instead of calling
//! back into the dispatcher (and growing the stack with every nested
//! alias), the produced keys are pushed to the *front* of an input queue
//! and the dispatch loop picks them up next. Every queued key remembers how
//! many alias expansions and macro replays it came out of, which is what
//! bounds runaway loops like `a -> b -> a`.
//!
//! ```text
//!   feed(key) ──▶ queue ──▶ pending ──▶ keymap lookup
//!                   ▲                       │
//!                   │  alias / macro keys   ├─ Partial:   wait
//!                   └───────────────────────┤─ Exact:     resolve
//!                                           ├─ Ambiguous: remember, wait
//!                                           └─ NoMatch:   text or abort
//! ```

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use super::{Editor, Recording};
use crate::action::{Action, Force, Mode};
use crate::event::EditorEvent;
use crate::key::{render, Key};
use crate::keymap::{Binding, Lookup};
use crate::motion::Motion;
use crate::register::RegisterRef;
use crate::window::WindowId;
use crate::{CoreError, CoreResult};

/// A key waiting to be dispatched.
#[derive(Debug, Clone)]
pub(super) struct Queued {
    key: Key,
    /// Alias expansions this key came out of
    alias_depth: usize,
    /// Nested macro replays this key came out of
    macro_depth: usize,
    /// Index in the macro being recorded, for keys typed by the user
    seq: Option<usize>,
}

impl Queued {
    fn derived(key: Key, alias_depth: usize, macro_depth: usize) -> Self {
        Self {
            key,
            alias_depth,
            macro_depth,
            seq: None,
        }
    }
}

/// Keys between the key source and the keymap.
#[derive(Debug, Default)]
pub(super) struct Input {
    queue: VecDeque<Queued>,
    /// Keys of the sequence being matched
    pending: Vec<Queued>,
    /// Length and binding of the longest pending prefix that is bound
    /// itself but also starts longer bindings
    ambiguous: Option<(usize, Binding)>,
}

/// Whether the command assembled so far is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    /// More keys are needed; count, register and operator stay
    Pending,
    Done,
}

/// Owned copy of a lookup result, so the keymap borrow ends early.
enum Found {
    NoMatch,
    Partial,
    Ambiguous(Binding),
    Exact(Binding),
}

impl Editor {
    // ==================== Input ====================

    /// Feeds one key and dispatches everything it completes.
    pub fn feed(&mut self, key: Key) -> CoreResult<()> {
        let seq = match &mut self.recording {
            Some(recording) => {
                recording.keys.try_reserve(1)?;
                recording.keys.push(key.clone());
                Some(recording.keys.len() - 1)
            }
            None => None,
        };
        self.input.queue.try_reserve(1)?;
        self.input.queue.push_back(Queued {
            key,
            alias_depth: 0,
            macro_depth: 0,
            seq,
        });
        self.process()
    }

    /// Feeds a key string such as `"d2w"` or `"ihello<Escape>"`.
    pub fn feed_str(&mut self, keys: &str) -> CoreResult<()> {
        for key in Key::parse_sequence(keys) {
            self.feed(key)?;
        }
        Ok(())
    }

    /// Resolves keys still waiting for a longer binding, as if no more keys
    /// were coming. Called at the end of input.
    pub fn flush(&mut self) -> CoreResult<()> {
        if self.input.pending.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.unmatched() {
            self.abort();
            return Err(e);
        }
        self.process()
    }

    fn process(&mut self) -> CoreResult<()> {
        while let Some(queued) = self.input.queue.pop_front() {
            if let Err(e) = self.step(queued) {
                self.abort();
                return Err(e);
            }
            if self.should_quit {
                self.input = Input::default();
                break;
            }
        }
        Ok(())
    }

    fn step(&mut self, queued: Queued) -> CoreResult<()> {
        if let Some(action) = self.state.awaiting.take() {
            return self.command(|editor| editor.complete(action, &queued));
        }

        if self.input.pending.is_empty() {
            if let (Some(recording), Some(seq)) = (&mut self.recording, queued.seq) {
                recording.mark = seq;
            }
        }
        self.input.pending.try_reserve(1)?;
        self.input.pending.push(queued);

        let keys: Vec<Key> = self.input.pending.iter().map(|q| q.key.clone()).collect();
        let found = match self.keymap.lookup(self.mode, &keys) {
            Lookup::NoMatch => Found::NoMatch,
            Lookup::Partial => Found::Partial,
            Lookup::Ambiguous(binding) => Found::Ambiguous(binding.clone()),
            Lookup::Exact(binding) => Found::Exact(binding.clone()),
        };

        match found {
            Found::Partial => Ok(()),
            Found::Ambiguous(binding) => {
                trace!(keys = %render(&keys), "ambiguous prefix, waiting");
                self.input.ambiguous = Some((keys.len(), binding));
                Ok(())
            }
            Found::Exact(binding) => {
                self.input.ambiguous = None;
                let pending = std::mem::take(&mut self.input.pending);
                self.resolve(binding, pending)
            }
            Found::NoMatch => self.unmatched(),
        }
    }

    /// The pending keys cannot be extended to a binding.
    fn unmatched(&mut self) -> CoreResult<()> {
        let mut pending = std::mem::take(&mut self.input.pending);

        // Fall back to the longest bound prefix and retry the rest.
        if let Some((len, binding)) = self.input.ambiguous.take() {
            let rest = pending.split_off(len.min(pending.len()));
            self.requeue(rest);
            return self.resolve(binding, pending);
        }

        if self.mode.is_insert() {
            let rest = pending.split_off(1.min(pending.len()));
            self.requeue(rest);
            return match pending.first().and_then(|q| q.key.text()) {
                Some(c) => self.command(|editor| editor.type_char(c)),
                None => Ok(()),
            };
        }

        let keys: Vec<Key> = pending.into_iter().map(|q| q.key).collect();
        debug!(keys = %render(&keys), mode = %self.mode, "unbound keys");
        if self.state.is_empty() && self.mode != Mode::OperatorPending {
            return Ok(());
        }
        self.command(|editor| Ok(editor.cancel()))
    }

    /// Puts keys back at the front of the queue, keeping their order.
    fn requeue(&mut self, keys: Vec<Queued>) {
        for queued in keys.into_iter().rev() {
            self.input.queue.push_front(queued);
        }
    }

    fn resolve(&mut self, binding: Binding, keys: Vec<Queued>) -> CoreResult<()> {
        let alias_depth = keys.iter().map(|q| q.alias_depth).max().unwrap_or(0);
        let macro_depth = keys.iter().map(|q| q.macro_depth).max().unwrap_or(0);

        match binding {
            Binding::Alias(alias) => {
                let depth = alias_depth + 1;
                let max = self.config.editor.max_alias_depth;
                if depth > max {
                    let typed: Vec<Key> = keys.into_iter().map(|q| q.key).collect();
                    let typed = render(&typed);
                    warn!(keys = %typed, depth, "alias expansion too deep, dropping keys");
                    self.input.queue.retain(|q| q.alias_depth == 0);
                    self.emit(EditorEvent::Warning(format!(
                        "alias expansion of {} exceeded depth {}",
                        typed, max
                    )));
                    return self.command(|editor| Ok(editor.cancel()));
                }
                trace!(alias = %render(&alias), depth, "expanding alias");
                let mut expanded = Vec::new();
                expanded.try_reserve(alias.len())?;
                expanded.extend(
                    alias
                        .into_iter()
                        .map(|key| Queued::derived(key, depth, macro_depth)),
                );
                self.requeue(expanded);
                Ok(())
            }
            Binding::Action(action) => {
                let Some(trigger) = keys.last().cloned() else {
                    return Ok(());
                };
                trace!(?action, mode = %self.mode, "dispatching");
                self.command(|editor| editor.execute(action, &trigger))
            }
        }
    }

    /// Drops everything in flight after a failed command.
    fn abort(&mut self) {
        self.input = Input::default();
        self.cancel();
    }

    /// Forgets the command assembled so far.
    pub(super) fn cancel(&mut self) -> Flow {
        self.state.reset();
        if self.mode == Mode::OperatorPending {
            self.set_mode(Mode::Normal);
        }
        Flow::Done
    }

    // ==================== Commands ====================

    /// Runs one dispatch step and publishes what it changed.
    fn command(&mut self, run: impl FnOnce(&mut Self) -> CoreResult<Flow>) -> CoreResult<()> {
        let window = self.windows.active_id();
        let before = self.windows.active().map(|w| (w.cursor(), w.anchor()));
        self.command_start = before.map_or(0, |(cursor, _)| cursor);

        let result = run(self);
        if !matches!(result, Ok(Flow::Pending)) {
            self.cancel();
        }
        let finished = self.finish_command(window, before);
        result.and(finished)
    }

    fn finish_command(
        &mut self,
        window: Option<WindowId>,
        before: Option<(usize, Option<usize>)>,
    ) -> CoreResult<()> {
        let Some(id) = self.windows.active_id() else {
            self.dirty = false;
            return Ok(());
        };
        let file = self.active_file_id()?;

        // Insert sessions commit once, when they end.
        if !self.mode.is_insert() {
            let (start, cursor) = (self.command_start, self.cursor());
            self.file_mut(file)?.text_mut().commit(start, cursor)?;
        }
        self.clamp_cursor();

        if std::mem::take(&mut self.dirty) {
            let len = self.file(file)?.text().len();
            for other in self.windows.showing_mut(file) {
                other.clamp(len);
            }
            self.emit(EditorEvent::FileChanged(file));
        }

        if window != Some(id) {
            return Ok(());
        }
        let after = self.windows.active().map(|w| (w.cursor(), w.anchor()));
        if let (Some((cursor, anchor)), Some((new_cursor, new_anchor))) = (before, after) {
            if cursor != new_cursor {
                self.emit(EditorEvent::CursorMoved(id));
            }
            if anchor != new_anchor || (new_anchor.is_some() && cursor != new_cursor) {
                self.emit(EditorEvent::SelectionChanged(id));
            }
        }
        Ok(())
    }

    /// Ends any insert session or selection before focus changes.
    pub(super) fn leave_window(&mut self) -> CoreResult<()> {
        if self.windows.active().is_none() {
            return Ok(());
        }
        if self.mode.is_insert() {
            self.finish_insert()?;
        }
        self.set_anchor(None);
        self.state.reset();
        self.set_mode(Mode::Normal);
        Ok(())
    }

    // ==================== Actions ====================

    fn execute(&mut self, action: Action, trigger: &Queued) -> CoreResult<Flow> {
        let max = self.config.editor.max_count;
        match action {
            Action::Count => {
                let digit = match trigger.key {
                    Key::Char(c) => c.to_digit(10),
                    Key::Named(_) => None,
                };
                match digit {
                    // A leading zero is the line-begin motion.
                    Some(0) if self.state.count.is_none() => {
                        self.motion(Motion::LineBegin, None)
                    }
                    Some(digit) => {
                        self.state.push_digit(digit, max);
                        Ok(Flow::Pending)
                    }
                    None => Ok(Flow::Done),
                }
            }
            Action::MacroRecord if self.recording.is_some() => {
                self.stop_recording()?;
                Ok(Flow::Done)
            }
            action if action.needs_char() => {
                self.state.awaiting = Some(action);
                Ok(Flow::Pending)
            }
            Action::Operator(op) => self.operator(op),
            Action::Motion(motion) => self.motion(motion, None),
            Action::TextObject(id) => self.text_object(id),
            Action::Mode(mode) => self.switch_mode(mode),
            Action::Put(put) => self.put(put),
            Action::Undo | Action::Redo | Action::Earlier | Action::Later => self.travel(action),
            Action::DeleteCharNext => self.delete_char_next(),
            Action::DeleteCharPrev => self.delete_char_prev(),
            Action::DeleteWordPrev => self.delete_word_prev(),
            Action::DeleteLineBegin => self.delete_line_begin(),
            Action::InsertNewline => self.insert_text(b"\n"),
            Action::InsertTab => self.insert_tab(),
            Action::AppendCharNext
            | Action::AppendLineEnd
            | Action::InsertLineStart
            | Action::OpenLineBelow
            | Action::OpenLineAbove => self.begin_insert(action),
            Action::JoinLineBelow => self.join(),
            Action::MotionCharwise => {
                self.state.force = Some(Force::Charwise);
                Ok(Flow::Pending)
            }
            Action::MotionLinewise => {
                self.state.force = Some(Force::Linewise);
                Ok(Flow::Pending)
            }
            Action::SelectionFlip => {
                if let Some(window) = self.windows.active_mut() {
                    window.flip();
                }
                Ok(Flow::Done)
            }
            Action::Cancel => Ok(self.cancel()),
            Action::User(idx) => self.user_action(idx),
            // Handled above, they wait for their character first.
            Action::Register | Action::MacroRecord | Action::MacroReplay | Action::ReplaceChar => {
                Ok(Flow::Done)
            }
        }
    }

    /// Runs an action that waited for one more key.
    fn complete(&mut self, action: Action, queued: &Queued) -> CoreResult<Flow> {
        let Some(c) = key_char(&queued.key) else {
            trace!(?action, key = %queued.key, "argument cancelled");
            return Ok(self.cancel());
        };
        match action {
            Action::Register => {
                let register = RegisterRef::parse(c)
                    .ok_or_else(|| CoreError::InvalidRegister(c.to_string()))?;
                self.state.register = Some(register);
                Ok(Flow::Pending)
            }
            Action::Motion(motion) => {
                self.last_totill = Some((motion, c));
                self.motion(motion, Some(c))
            }
            Action::ReplaceChar => self.replace_char(c),
            Action::MacroRecord => {
                self.start_recording(c)?;
                Ok(Flow::Done)
            }
            Action::MacroReplay => self.replay(c, queued.macro_depth),
            _ => Ok(Flow::Done),
        }
    }

    fn user_action(&mut self, idx: usize) -> CoreResult<Flow> {
        let action = self
            .actions
            .get(idx)
            .cloned()
            .ok_or_else(|| CoreError::UnknownAction(format!("#{}", idx)))?;
        let count = self.state.effective_count(self.config.editor.max_count);
        self.state.reset();
        debug!(name = %action.name, ?count, "running user action");
        action.handler.execute(self, count)?;
        Ok(Flow::Done)
    }

    // ==================== Macros ====================

    fn start_recording(&mut self, c: char) -> CoreResult<()> {
        let register =
            RegisterRef::parse(c).ok_or_else(|| CoreError::InvalidRegister(c.to_string()))?;
        debug!(register = %c, "recording macro");
        self.recording = Some(Recording {
            register,
            keys: Vec::new(),
            mark: 0,
        });
        Ok(())
    }

    /// Stores the recorded keys, minus the sequence that stopped recording.
    fn stop_recording(&mut self) -> CoreResult<()> {
        let Some(mut recording) = self.recording.take() else {
            return Ok(());
        };
        recording.keys.truncate(recording.mark);
        debug!(keys = %render(&recording.keys), "recorded macro");
        self.registers.put_keys(recording.register, recording.keys)
    }

    fn replay(&mut self, c: char, depth: usize) -> CoreResult<Flow> {
        let register = if c == '@' {
            self.last_macro
                .ok_or_else(|| CoreError::InvalidRegister("@".to_string()))?
        } else {
            RegisterRef::parse(c).ok_or_else(|| CoreError::InvalidRegister(c.to_string()))?
        };

        if self
            .recording
            .as_ref()
            .is_some_and(|r| r.register.name == register.name)
        {
            warn!(register = %c, "refusing to replay the register being recorded");
            self.emit(EditorEvent::Warning(format!(
                "cannot replay register {} while recording it",
                c
            )));
            return Ok(Flow::Done);
        }

        let depth = depth + 1;
        let max = self.config.editor.max_macro_depth;
        if depth > max {
            warn!(register = %c, depth, "macro replay too deep, aborting");
            self.input.queue.retain(|q| q.macro_depth == 0);
            self.emit(EditorEvent::Warning(format!(
                "macro replay exceeded depth {}",
                max
            )));
            return Ok(Flow::Done);
        }

        let keys = self.registers.get(register.name)?.keys();
        let count = self.state.count_or_one(self.config.editor.max_count);
        self.last_macro = Some(register);

        let mut queued = Vec::new();
        queued.try_reserve(keys.len().saturating_mul(count))?;
        for _ in 0..count {
            queued.extend(keys.iter().cloned().map(|key| Queued::derived(key, 0, depth)));
        }
        debug!(register = %c, keys = keys.len(), count, "replaying macro");
        self.requeue(queued);
        Ok(Flow::Done)
    }
}

/// The character a key stands for as an argument to f, r, q, @ or `"`.
fn key_char(key: &Key) -> Option<char> {
    match key {
        Key::Char(c) => Some(*c),
        Key::Named(name) => match name.as_ref() {
            "Space" => Some(' '),
            "Tab" => Some('\t'),
            "Enter" => Some('\n'),
            _ => None,
        },
    }
}
