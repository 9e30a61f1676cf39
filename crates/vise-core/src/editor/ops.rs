//! What actions do to the text: motions, operators, puts and the small
//! editing commands of insert and normal mode.

use std::ops::Range;

use tracing::{debug, trace};
use vise_buffer::{BufferResult, PieceChain, Text};

use super::dispatch::Flow;
use super::Editor;
use crate::action::{Action, Force, Mode, Operator, Put};
use crate::event::EditorEvent;
use crate::motion::{self, longword_class, word_class, Class, Motion, MotionContext};
use crate::register::{RegisterName, RegisterRef};
use crate::textobject::TextObjectId;
use crate::{CoreError, CoreResult};

impl Editor {
    // ==================== Text Access ====================

    fn chain(&self) -> CoreResult<&PieceChain> {
        self.active_text()
            .map(Text::chain)
            .ok_or(CoreError::NoActiveWindow)
    }

    fn text_mut(&mut self) -> CoreResult<&mut Text> {
        let id = self.active_file_id()?;
        Ok(self.file_mut(id)?.text_mut())
    }

    fn insert_bytes(&mut self, pos: usize, bytes: &[u8]) -> CoreResult<()> {
        if self.text_mut()?.insert(pos, bytes)? {
            self.dirty = true;
        }
        Ok(())
    }

    fn delete_bytes(&mut self, range: Range<usize>) -> CoreResult<()> {
        if self.text_mut()?.delete(range)? {
            self.dirty = true;
        }
        Ok(())
    }

    fn replace_bytes(&mut self, range: Range<usize>, bytes: &[u8]) -> CoreResult<()> {
        let changed = !range.is_empty() || !bytes.is_empty();
        self.text_mut()?.replace(range, bytes)?;
        self.dirty |= changed;
        Ok(())
    }

    /// Inserts into the active file. The edit joins the undo group of the
    /// command that is running.
    pub fn insert_at(&mut self, pos: usize, bytes: &[u8]) -> CoreResult<()> {
        self.insert_bytes(pos, bytes)
    }

    /// Deletes from the active file, see [`Editor::insert_at`].
    pub fn delete_range(&mut self, range: Range<usize>) -> CoreResult<()> {
        self.delete_bytes(range)
    }

    // ==================== Cursor & Mode ====================

    /// Moves the active window's cursor, clamped to the text.
    pub fn set_cursor(&mut self, pos: usize) {
        let len = self.active_text().map_or(0, Text::len);
        if let Some(window) = self.windows.active_mut() {
            window.set_cursor(pos.min(len));
        }
    }

    pub(super) fn set_anchor(&mut self, anchor: Option<usize>) {
        if let Some(window) = self.windows.active_mut() {
            window.set_anchor(anchor);
        }
    }

    pub(super) fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        debug!(from = %self.mode, to = %mode, "mode changed");
        self.mode = mode;
        self.emit(EditorEvent::ModeChanged(mode));
    }

    /// Keeps the cursor where the current mode allows it. Only insert
    /// modes may rest on a line's newline or at the end of the text.
    pub(super) fn clamp_cursor(&mut self) {
        let Some(text) = self.active_text() else {
            return;
        };
        let chain = text.chain();
        let len = chain.len();
        let cursor = self.cursor();
        let pos = match self.mode {
            Mode::Insert | Mode::Replace => cursor.min(len),
            Mode::Visual | Mode::VisualLine if cursor >= len => chain.char_prev(len),
            Mode::Visual | Mode::VisualLine => cursor,
            Mode::Normal | Mode::OperatorPending => {
                let mut pos = if cursor >= len { chain.char_prev(len) } else { cursor };
                if chain.byte_at(pos) == Some(b'\n') && pos > chain.line_begin(pos) {
                    pos = chain.char_prev(pos);
                }
                pos
            }
        };
        if pos != cursor {
            if let Some(window) = self.windows.active_mut() {
                window.set_cursor(pos);
            }
        }
    }

    pub(super) fn switch_mode(&mut self, target: Mode) -> CoreResult<Flow> {
        let from = self.mode;
        match target {
            Mode::OperatorPending => return Ok(Flow::Done),
            Mode::Normal if from.is_insert() => self.finish_insert()?,
            Mode::Normal => {}
            Mode::Insert | Mode::Replace => {
                if !from.is_insert() {
                    self.insert_start = Some(self.command_start);
                }
            }
            Mode::Visual | Mode::VisualLine => {
                if from.is_insert() {
                    self.finish_insert()?;
                }
                if !from.is_visual() {
                    let cursor = self.cursor();
                    self.set_anchor(Some(cursor));
                }
            }
        }
        if !target.is_visual() {
            self.set_anchor(None);
        }
        self.set_mode(target);
        Ok(Flow::Done)
    }

    /// Ends an insert session: everything typed becomes one revision and
    /// the cursor steps back onto the last inserted character.
    pub(super) fn finish_insert(&mut self) -> CoreResult<()> {
        let start = self.insert_start.take().unwrap_or(self.command_start);
        let cursor = self.cursor();
        self.text_mut()?.commit(start, cursor)?;
        let chain = self.chain()?;
        if cursor > chain.line_begin(cursor) {
            let prev = chain.char_prev(cursor);
            self.set_cursor(prev);
        }
        Ok(())
    }

    /// The visual selection and whether it is linewise.
    fn visual_range(&self) -> Option<(Range<usize>, bool)> {
        let range = self.selection()?;
        Some((range, self.mode == Mode::VisualLine))
    }

    // ==================== Motions ====================

    pub(super) fn motion(&mut self, motion: Motion, target: Option<char>) -> CoreResult<Flow> {
        let (motion, target, repeat) = match motion {
            Motion::TotillRepeat | Motion::TotillReverse => {
                let Some((last, c)) = self.last_totill else {
                    return Ok(Flow::Done);
                };
                let last = if motion == Motion::TotillReverse {
                    last.reversed()
                } else {
                    last
                };
                (last, Some(c), true)
            }
            Motion::SearchWordForward | Motion::SearchWordBackward => {
                self.search_word()?;
                (motion, target, false)
            }
            _ => (motion, target, false),
        };

        let count = self.state.effective_count(self.config.editor.max_count);
        let cursor = self.cursor();
        let chain = self.chain()?;
        let ctx = MotionContext {
            search: self.search.as_ref(),
            target,
            count,
        };
        let Some(dest) = repeat_motion(chain, cursor, motion, &ctx, repeat) else {
            trace!(motion = motion.name(), "motion failed");
            return Ok(Flow::Done);
        };

        match self.state.operator {
            Some(op) => {
                let (range, linewise) = operator_range(
                    chain,
                    op,
                    motion,
                    cursor..dest,
                    count.unwrap_or(1),
                    self.state.force,
                );
                self.apply_operator(op, range, linewise)
            }
            None => {
                self.set_cursor(dest);
                Ok(Flow::Done)
            }
        }
    }

    /// Makes the word under the cursor the search pattern, for `*` and `#`.
    fn search_word(&mut self) -> CoreResult<()> {
        let cursor = self.cursor();
        let Some(word) = motion::word_at(self.chain()?, cursor) else {
            return Ok(());
        };
        let word = String::from_utf8_lossy(&word);
        self.set_search(&format!(r"\b{}\b", regex::escape(&word)))
    }

    pub(super) fn text_object(&mut self, id: TextObjectId) -> CoreResult<Flow> {
        let count = self.state.count_or_one(self.config.editor.max_count);
        let cursor = self.cursor();
        let chain = self.chain()?;
        let Some(range) = self
            .objects
            .resolve(id, chain, cursor, count, self.search.as_ref())?
        else {
            debug!(%id, "no text object at cursor");
            return Ok(Flow::Done);
        };

        if let Some(op) = self.state.operator {
            let linewise = match self.state.force {
                Some(Force::Linewise) => true,
                Some(Force::Charwise) => op.is_linewise(),
                None => op.is_linewise() || self.objects.is_linewise(id),
            };
            let range = if linewise && !range.is_empty() {
                chain.line_begin(range.start)..chain.line_next(chain.char_prev(range.end))
            } else {
                range
            };
            if range.is_empty() && op != Operator::Change {
                return Ok(Flow::Done);
            }
            return self.apply_operator(op, range, linewise);
        }

        if self.mode.is_visual() && !range.is_empty() {
            let last = chain.char_prev(range.end);
            let anchor = self.windows.active().and_then(|w| w.anchor()).unwrap_or(cursor);
            let (anchor, cursor) = if anchor == cursor {
                (range.start, last)
            } else {
                (
                    anchor.min(cursor).min(range.start),
                    anchor.max(cursor).max(last),
                )
            };
            self.set_anchor(Some(anchor));
            self.set_cursor(cursor);
        }
        Ok(Flow::Done)
    }

    // ==================== Operators ====================

    pub(super) fn operator(&mut self, op: Operator) -> CoreResult<Flow> {
        if let Some((range, linewise)) = self.visual_range() {
            return self.apply_operator(op, range, linewise || op.is_linewise());
        }
        match self.state.operator {
            None => {
                self.state.set_operator(op);
                self.set_mode(Mode::OperatorPending);
                Ok(Flow::Pending)
            }
            // dd, yy, >>, g~~ ...
            Some(pending) if pending == op => self.operate_lines(op),
            Some(_) => Ok(self.cancel()),
        }
    }

    /// Applies a doubled operator to `count` lines from the cursor down.
    fn operate_lines(&mut self, op: Operator) -> CoreResult<Flow> {
        let count = self.state.count_or_one(self.config.editor.max_count);
        let chain = self.chain()?;
        let start = chain.line_begin(self.cursor());
        let mut end = start;
        for _ in 0..count {
            let next = chain.line_next(end);
            if next == end {
                break;
            }
            end = next;
        }
        self.apply_operator(op, start..end, true)
    }

    pub(super) fn apply_operator(
        &mut self,
        op: Operator,
        range: Range<usize>,
        linewise: bool,
    ) -> CoreResult<Flow> {
        debug!(operator = op.name(), ?range, linewise, "applying operator");
        match op {
            Operator::Yank => self.yank(range, linewise)?,
            Operator::Delete => self.delete_op(range, linewise)?,
            Operator::Change => self.change_op(range, linewise)?,
            Operator::CaseSwap | Operator::CaseLower | Operator::CaseUpper => {
                self.change_case(op, range)?
            }
            Operator::ShiftLeft | Operator::ShiftRight => {
                self.shift(op == Operator::ShiftRight, range)?
            }
        }
        self.set_anchor(None);
        if op == Operator::Change {
            self.switch_mode(Mode::Insert)
        } else {
            self.set_mode(Mode::Normal);
            Ok(Flow::Done)
        }
    }

    /// Register content for `range`; linewise content always ends in a
    /// newline.
    fn register_data(&self, range: Range<usize>, linewise: bool) -> CoreResult<Vec<u8>> {
        let mut data = self.chain()?.read(range)?;
        if linewise && !data.ends_with(b"\n") {
            data.try_reserve(1)?;
            data.push(b'\n');
        }
        Ok(data)
    }

    /// Writes to the selected register (unnamed by default).
    ///
    /// Writes to a named register also land in the unnamed one, and yanks
    /// also fill register 0. The blackhole swallows everything.
    fn store_register(&mut self, data: &[u8], linewise: bool, yank: bool) -> CoreResult<()> {
        let register = self
            .state
            .register
            .unwrap_or(RegisterRef::new(RegisterName::Unnamed));
        if register.name == RegisterName::Blackhole || data.is_empty() {
            return Ok(());
        }
        self.registers.store(register, data, linewise)?;
        if register.name != RegisterName::Unnamed {
            let stored = self.registers.get(register.name)?.into_owned();
            self.registers
                .put(RegisterName::Unnamed, stored.data(), stored.linewise())?;
        }
        if yank {
            self.registers.put(RegisterName::Yank, data, linewise)?;
        }
        Ok(())
    }

    fn yank(&mut self, range: Range<usize>, linewise: bool) -> CoreResult<()> {
        let data = self.register_data(range.clone(), linewise)?;
        self.store_register(&data, linewise, true)?;
        let chain = self.chain()?;
        let cursor = self.cursor();
        if !linewise || range.start < chain.line_begin(cursor) {
            self.set_cursor(range.start);
        }
        Ok(())
    }

    fn delete_op(&mut self, range: Range<usize>, linewise: bool) -> CoreResult<()> {
        let data = self.register_data(range.clone(), linewise)?;
        self.store_register(&data, linewise, false)?;

        let chain = self.chain()?;
        let len = chain.len();
        let mut range = range;
        // The last line has no newline of its own; take the one before it.
        if linewise && range.end == len && range.start > 0 && chain.byte_at(len - 1) != Some(b'\n')
        {
            range.start -= 1;
        }
        self.delete_bytes(range.clone())?;

        let chain = self.chain()?;
        let pos = if linewise {
            chain.line_start(range.start.min(chain.len()))
        } else {
            range.start
        };
        self.set_cursor(pos);
        Ok(())
    }

    fn change_op(&mut self, range: Range<usize>, linewise: bool) -> CoreResult<()> {
        let data = self.register_data(range.clone(), linewise)?;
        self.store_register(&data, linewise, false)?;

        let chain = self.chain()?;
        let mut range = range;
        // cc keeps an empty line to type into.
        if linewise && range.end > range.start && chain.byte_at(range.end - 1) == Some(b'\n') {
            range.end -= 1;
        }
        self.delete_bytes(range.clone())?;
        self.set_cursor(range.start);
        Ok(())
    }

    fn change_case(&mut self, op: Operator, range: Range<usize>) -> CoreResult<()> {
        let data = self.chain()?.read(range.clone())?;
        let changed = transform_case(op, &data);
        if changed != data {
            self.replace_bytes(range.clone(), &changed)?;
        }
        self.set_cursor(range.start);
        Ok(())
    }

    /// Shifts every line touched by `range` by one indentation level.
    fn shift(&mut self, right: bool, range: Range<usize>) -> CoreResult<()> {
        let config = &self.config.editor;
        let width = config.shift_width.max(1);
        let indent: Vec<u8> = if config.expand_tab {
            vec![b' '; width]
        } else {
            b"\t".to_vec()
        };

        let chain = self.chain()?;
        let mut edits = Vec::new();
        let mut begin = chain.line_begin(range.start);
        loop {
            let first = chain.byte_at(begin);
            if right {
                if first.is_some_and(|b| b != b'\n') {
                    edits.push((begin..begin, true));
                }
            } else {
                let spaces = chain
                    .bytes_from(begin)
                    .take(width)
                    .take_while(|&(_, b)| b == b' ')
                    .count();
                let remove = if spaces == 0 && first == Some(b'\t') { 1 } else { spaces };
                if remove > 0 {
                    edits.push((begin..begin + remove, false));
                }
            }
            let next = chain.line_next(begin);
            if next >= range.end || next == begin {
                break;
            }
            begin = next;
        }

        // Back to front, so earlier offsets stay valid.
        for (at, insert) in edits.into_iter().rev() {
            if insert {
                self.insert_bytes(at.start, &indent)?;
            } else {
                self.delete_bytes(at)?;
            }
        }
        let start = self.chain()?.line_start(range.start);
        self.set_cursor(start);
        Ok(())
    }

    // ==================== Put ====================

    pub(super) fn put(&mut self, put: Put) -> CoreResult<Flow> {
        let count = self.state.count_or_one(self.config.editor.max_count);
        let name = self
            .state
            .register
            .map_or(RegisterName::Unnamed, |r| r.name);
        let register = self.registers.get(name)?.into_owned();

        let mut data = Vec::new();
        data.try_reserve(register.data().len().saturating_mul(count))?;
        for _ in 0..count {
            data.extend_from_slice(register.data());
        }

        if let Some((range, linewise)) = self.visual_range() {
            return self.put_over_selection(range, linewise, &data, register.linewise());
        }
        if data.is_empty() {
            return Ok(Flow::Done);
        }

        let chain = self.chain()?;
        let cursor = self.cursor();
        if register.linewise() {
            let (pos, first_line) = if put.is_after() {
                let next = chain.line_next(cursor);
                // After a last line without newline, open a line first.
                if next > 0 && chain.byte_at(next - 1) != Some(b'\n') {
                    let mut lines = Vec::new();
                    lines.try_reserve(data.len())?;
                    lines.push(b'\n');
                    lines.extend_from_slice(data.strip_suffix(b"\n").unwrap_or(&data));
                    data = lines;
                    (next, next + 1)
                } else {
                    (next, next)
                }
            } else {
                let begin = chain.line_begin(cursor);
                (begin, begin)
            };
            self.insert_bytes(pos, &data)?;
            let after = if put.cursor_at_end() {
                pos + data.len()
            } else {
                self.chain()?.line_start(first_line)
            };
            self.set_cursor(after);
        } else {
            let pos = if put.is_after() && chain.byte_at(cursor).is_some_and(|b| b != b'\n') {
                chain.char_next(cursor)
            } else {
                cursor
            };
            self.insert_bytes(pos, &data)?;
            let end = pos + data.len();
            let after = if put.cursor_at_end() {
                end
            } else {
                self.chain()?.char_prev(end)
            };
            self.set_cursor(after);
        }
        Ok(Flow::Done)
    }

    /// Replaces the selection with register content; the replaced text
    /// goes to the unnamed register.
    fn put_over_selection(
        &mut self,
        range: Range<usize>,
        linewise: bool,
        data: &[u8],
        data_linewise: bool,
    ) -> CoreResult<Flow> {
        let replaced = self.register_data(range.clone(), linewise)?;
        let mut data = data.to_vec();
        // Lines put into the middle of a line get a line of their own.
        if data_linewise && !linewise {
            data.try_reserve(1)?;
            data.insert(0, b'\n');
        }
        if linewise && !data_linewise && !data.is_empty() {
            data.try_reserve(1)?;
            data.push(b'\n');
        }
        self.replace_bytes(range.clone(), &data)?;
        self.registers
            .put(RegisterName::Unnamed, &replaced, linewise)?;

        let chain = self.chain()?;
        let pos = if linewise || data_linewise {
            chain.line_start(range.start + usize::from(data_linewise && !linewise))
        } else {
            chain.char_prev(range.start + data.len()).max(range.start)
        };
        self.set_anchor(None);
        self.set_mode(Mode::Normal);
        self.set_cursor(pos);
        Ok(Flow::Done)
    }

    // ==================== History ====================

    pub(super) fn travel(&mut self, action: Action) -> CoreResult<Flow> {
        let count = self.state.count_or_one(self.config.editor.max_count);
        let text = self.text_mut()?;
        let pos = match action {
            Action::Undo => repeat_step(count, || text.undo())?,
            Action::Redo => repeat_step(count, || text.redo())?,
            Action::Earlier => text.earlier(count)?,
            Action::Later => text.later(count)?,
            _ => None,
        };
        match pos {
            Some(pos) => {
                self.dirty = true;
                self.set_cursor(pos);
            }
            None => debug!(?action, "already at the end of history"),
        }
        Ok(Flow::Done)
    }

    // ==================== Insert Mode ====================

    /// Types one character. Replace mode overwrites up to the line end.
    pub(super) fn type_char(&mut self, c: char) -> CoreResult<Flow> {
        let mut buf = [0u8; 4];
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        let cursor = self.cursor();
        let chain = self.chain()?;
        if self.mode == Mode::Replace && chain.byte_at(cursor).is_some_and(|b| b != b'\n') {
            let next = chain.char_next(cursor);
            self.replace_bytes(cursor..next, bytes)?;
        } else {
            self.insert_bytes(cursor, bytes)?;
        }
        self.set_cursor(cursor + bytes.len());
        Ok(Flow::Done)
    }

    pub(super) fn insert_text(&mut self, bytes: &[u8]) -> CoreResult<Flow> {
        let cursor = self.cursor();
        self.insert_bytes(cursor, bytes)?;
        self.set_cursor(cursor + bytes.len());
        Ok(Flow::Done)
    }

    pub(super) fn insert_tab(&mut self) -> CoreResult<Flow> {
        if !self.config.editor.expand_tab {
            return self.insert_text(b"\t");
        }
        let width = self.config.editor.tab_width.max(1);
        let cursor = self.cursor();
        let column = cursor - self.chain()?.line_begin(cursor);
        self.insert_text(&vec![b' '; width - column % width])
    }

    pub(super) fn delete_char_next(&mut self) -> CoreResult<Flow> {
        let count = self.state.count_or_one(self.config.editor.max_count);
        let cursor = self.cursor();
        let chain = self.chain()?;
        if self.mode.is_insert() {
            let next = chain.char_next(cursor);
            self.delete_bytes(cursor..next)?;
            return Ok(Flow::Done);
        }

        let line_end = chain.line_end(cursor);
        let mut end = cursor;
        for _ in 0..count {
            if end >= line_end {
                break;
            }
            end = chain.char_next(end);
        }
        if end == cursor {
            return Ok(Flow::Done);
        }
        let data = chain.read(cursor..end)?;
        self.store_register(&data, false, false)?;
        self.delete_bytes(cursor..end)?;
        Ok(Flow::Done)
    }

    pub(super) fn delete_char_prev(&mut self) -> CoreResult<Flow> {
        let cursor = self.cursor();
        if cursor == 0 {
            return Ok(Flow::Done);
        }
        let prev = self.chain()?.char_prev(cursor);
        if self.mode != Mode::Replace {
            self.delete_bytes(prev..cursor)?;
        }
        self.set_cursor(prev);
        Ok(Flow::Done)
    }

    pub(super) fn delete_word_prev(&mut self) -> CoreResult<Flow> {
        let cursor = self.cursor();
        let start = motion::word_start_prev(self.chain()?, cursor, word_class);
        if start < cursor {
            self.delete_bytes(start..cursor)?;
            self.set_cursor(start);
        }
        Ok(Flow::Done)
    }

    pub(super) fn delete_line_begin(&mut self) -> CoreResult<Flow> {
        let cursor = self.cursor();
        let chain = self.chain()?;
        let begin = chain.line_begin(cursor);
        // At the line begin, join with the previous line.
        let start = if begin == cursor { chain.char_prev(cursor) } else { begin };
        if start < cursor {
            self.delete_bytes(start..cursor)?;
            self.set_cursor(start);
        }
        Ok(Flow::Done)
    }

    /// a, A, I, o and O: place the cursor, then enter insert mode.
    pub(super) fn begin_insert(&mut self, action: Action) -> CoreResult<Flow> {
        let cursor = self.cursor();
        let chain = self.chain()?;
        match action {
            Action::AppendCharNext => {
                if chain.byte_at(cursor).is_some_and(|b| b != b'\n') {
                    let next = chain.char_next(cursor);
                    self.set_cursor(next);
                }
            }
            Action::AppendLineEnd => {
                let end = chain.line_end(cursor);
                self.set_cursor(end);
            }
            Action::InsertLineStart => {
                let start = chain.line_start(cursor);
                self.set_cursor(start);
            }
            Action::OpenLineBelow => {
                let end = chain.line_end(cursor);
                self.insert_bytes(end, b"\n")?;
                self.set_cursor(end + 1);
            }
            Action::OpenLineAbove => {
                let begin = chain.line_begin(cursor);
                self.insert_bytes(begin, b"\n")?;
                self.set_cursor(begin);
            }
            _ => {}
        }
        self.switch_mode(Mode::Insert)
    }

    // ==================== Normal Mode Edits ====================

    /// `r`: replaces `count` characters, failing when the line is too short.
    pub(super) fn replace_char(&mut self, c: char) -> CoreResult<Flow> {
        let count = self.state.count_or_one(self.config.editor.max_count);
        let cursor = self.cursor();
        let chain = self.chain()?;
        let line_end = chain.line_end(cursor);
        let mut end = cursor;
        for _ in 0..count {
            if end >= line_end {
                trace!(count, "not enough characters to replace");
                return Ok(Flow::Done);
            }
            end = chain.char_next(end);
        }

        if c == '\n' {
            self.replace_bytes(cursor..end, b"\n")?;
            self.set_cursor(cursor + 1);
        } else {
            let text = c.to_string().repeat(count);
            self.replace_bytes(cursor..end, text.as_bytes())?;
            self.set_cursor(cursor + text.len() - c.len_utf8());
        }
        Ok(Flow::Done)
    }

    /// `J`: joins lines, separating them with one space.
    pub(super) fn join(&mut self) -> CoreResult<Flow> {
        let (from, joins) = match self.visual_range() {
            Some((range, _)) => {
                let chain = self.chain()?;
                let last = chain.char_prev(range.end).max(range.start);
                let lines = chain.line_number(last) - chain.line_number(range.start);
                (range.start, lines.max(1))
            }
            None => {
                let count = self.state.count_or_one(self.config.editor.max_count);
                (self.cursor(), count.max(2) - 1)
            }
        };
        if self.mode.is_visual() {
            self.set_anchor(None);
            self.set_mode(Mode::Normal);
        }

        let mut cursor = from;
        for _ in 0..joins {
            let chain = self.chain()?;
            let newline = chain.line_end(cursor);
            if newline + 1 >= chain.len() {
                break;
            }
            let next = chain
                .bytes_from(newline + 1)
                .find(|&(_, b)| b != b' ' && b != b'\t')
                .map_or(chain.len(), |(p, _)| p);
            let begin = chain.line_begin(newline);
            let ends_blank = newline > begin
                && chain
                    .byte_at(newline - 1)
                    .is_some_and(|b| b == b' ' || b == b'\t');
            let space = newline > begin
                && !ends_blank
                && chain
                    .byte_at(next)
                    .is_some_and(|b| b != b'\n' && b != b')');
            let separator: &[u8] = if space { b" " } else { b"" };
            self.replace_bytes(newline..next, separator)?;
            cursor = newline;
        }
        self.set_cursor(cursor);
        Ok(Flow::Done)
    }
}

// ==================== Helpers ====================

fn repeat_step(
    count: usize,
    mut step: impl FnMut() -> BufferResult<Option<usize>>,
) -> BufferResult<Option<usize>> {
    let mut last = None;
    for _ in 0..count {
        match step()? {
            Some(pos) => last = Some(pos),
            None => break,
        }
    }
    Ok(last)
}

/// Applies `motion` `count` times, stopping early once it no longer moves.
///
/// A repeated `t`/`T` that would stay put is retried one character further,
/// so `;` moves on to the next match.
fn repeat_motion(
    chain: &PieceChain,
    pos: usize,
    motion: Motion,
    ctx: &MotionContext<'_>,
    repeated: bool,
) -> Option<usize> {
    if motion.is_absolute() {
        return motion.apply(chain, pos, ctx);
    }
    let once = MotionContext { count: None, ..*ctx };
    let mut cursor = pos;
    for _ in 0..ctx.count.unwrap_or(1).max(1) {
        let mut next = motion.apply(chain, cursor, &once)?;
        if repeated && next == cursor {
            let nudged = match motion {
                Motion::TillRight => Some(chain.char_next(cursor)),
                Motion::TillLeft => Some(chain.char_prev(cursor)),
                _ => None,
            };
            if let Some(from) = nudged {
                next = motion.apply(chain, from, &once)?;
            }
        }
        if next == cursor {
            break;
        }
        cursor = next;
    }
    Some(cursor)
}

/// The range an operator acts on when combined with a motion from
/// `moved.start` to `moved.end`, and whether it is linewise.
fn operator_range(
    chain: &PieceChain,
    op: Operator,
    motion: Motion,
    moved: Range<usize>,
    count: usize,
    force: Option<Force>,
) -> (Range<usize>, bool) {
    let mut linewise = motion.is_linewise() || op.is_linewise();
    let mut inclusive = motion.is_inclusive();
    match force {
        Some(Force::Linewise) => linewise = true,
        Some(Force::Charwise) if !op.is_linewise() => {
            if linewise {
                linewise = false;
            } else {
                inclusive = !inclusive;
            }
        }
        _ => {}
    }

    let (from, to) = (moved.start, moved.end);
    let (start, end) = (from.min(to), from.max(to));
    if linewise {
        return (chain.line_begin(start)..chain.line_next(end), true);
    }

    let word_motion = matches!(motion, Motion::WordStartNext | Motion::LongwordStartNext);
    let on_word = chain.byte_at(from).is_some_and(|b| !motion::is_space(b));
    // cw changes to the end of the word, like ce.
    if op == Operator::Change && word_motion && force.is_none() && on_word {
        let class = if motion == Motion::WordStartNext {
            word_class
        } else {
            longword_class
        };
        return (from..change_word_end(chain, from, count, class), false);
    }

    let mut end = end;
    if inclusive && chain.byte_at(end).is_some_and(|b| b != b'\n') {
        end = chain.char_next(end);
    }
    // dw on the last word of a line keeps the newline.
    if word_motion
        && end > start
        && chain.line_number(end) > chain.line_number(start)
        && chain.line_start(end) == end
    {
        end = chain.line_begin(end).saturating_sub(1).max(start);
    }
    (start..end, false)
}

/// End of the `count`-th word run starting at `pos`, exclusive.
fn change_word_end(chain: &PieceChain, pos: usize, count: usize, class: fn(u8) -> Class) -> usize {
    let first = chain.byte_at(pos).map(class);
    let mut end = chain
        .bytes_from(pos)
        .find(|&(_, b)| Some(class(b)) != first)
        .map_or(chain.len(), |(p, _)| p);
    for _ in 1..count {
        let last = chain.char_prev(end);
        end = chain.char_next(motion::word_end_next(chain, last, class));
    }
    end
}

fn transform_case(op: Operator, data: &[u8]) -> Vec<u8> {
    match std::str::from_utf8(data) {
        Ok(s) => {
            let mut out = String::with_capacity(s.len());
            for c in s.chars() {
                match op {
                    Operator::CaseUpper => out.extend(c.to_uppercase()),
                    Operator::CaseLower => out.extend(c.to_lowercase()),
                    _ if c.is_uppercase() => out.extend(c.to_lowercase()),
                    _ => out.extend(c.to_uppercase()),
                }
            }
            out.into_bytes()
        }
        // Invalid UTF-8: only touch ASCII letters.
        Err(_) => data
            .iter()
            .map(|&b| match op {
                Operator::CaseUpper => b.to_ascii_uppercase(),
                Operator::CaseLower => b.to_ascii_lowercase(),
                _ if b.is_ascii_uppercase() => b.to_ascii_lowercase(),
                _ => b.to_ascii_uppercase(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(content: &str) -> Editor {
        let mut editor = Editor::new();
        editor.open_text(Text::from(content)).unwrap();
        editor
    }

    fn run(content: &str, keys: &str) -> Editor {
        let mut editor = editor(content);
        editor.feed_str(keys).unwrap();
        editor
    }

    fn text(editor: &Editor) -> String {
        String::from_utf8(editor.content()).unwrap()
    }

    fn register(editor: &mut Editor, name: RegisterName) -> (String, bool) {
        let reg = editor.registers_mut().get(name).unwrap();
        (String::from_utf8_lossy(reg.data()).into_owned(), reg.linewise())
    }

    // ==================== Motions ====================

    #[test]
    fn test_motions_move_cursor() {
        let editor = run("one two three\n", "w");
        assert_eq!(editor.cursor(), 4);
        let editor = run("one two three\n", "$");
        assert_eq!(editor.cursor(), 12);
        let editor = run("one two three\n", "2e");
        assert_eq!(editor.cursor(), 6);
        let editor = run("one\ntwo\nthree\n", "G");
        assert_eq!(editor.cursor(), 8);
        let editor = run("one\ntwo\nthree\n", "2gg");
        assert_eq!(editor.cursor(), 4);
    }

    #[test]
    fn test_count_stops_at_end() {
        let editor = run("one two\n", "99w");
        assert_eq!(editor.cursor(), 6);
    }

    #[test]
    fn test_find_and_repeat() {
        let mut editor = editor("a,b,c,d\n");
        editor.feed_str("f,").unwrap();
        assert_eq!(editor.cursor(), 1);
        editor.feed_str(";").unwrap();
        assert_eq!(editor.cursor(), 3);
        editor.feed_str(",").unwrap();
        assert_eq!(editor.cursor(), 1);

        editor.feed_str("0t,").unwrap();
        assert_eq!(editor.cursor(), 0);
        editor.feed_str(";").unwrap();
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn test_search_word_under_cursor() {
        let mut editor = editor("foo bar foobar foo\n");
        editor.feed_str("*").unwrap();
        assert_eq!(editor.cursor(), 15);
        editor.feed_str("n").unwrap();
        assert_eq!(editor.cursor(), 0);
        editor.feed_str("N").unwrap();
        assert_eq!(editor.cursor(), 15);
    }

    // ==================== Operators ====================

    #[test]
    fn test_delete_word() {
        let editor = run("one two three\n", "dw");
        assert_eq!(text(&editor), "two three\n");
        assert_eq!(editor.cursor(), 0);

        // The newline after the last word stays.
        let editor = run("one two\nthree\n", "wdw");
        assert_eq!(text(&editor), "one \nthree\n");
    }

    #[test]
    fn test_change_word() {
        let mut editor = run("one two\n", "cwxy<Escape>");
        assert_eq!(text(&editor), "xy two\n");
        assert_eq!(editor.mode(), Mode::Normal);
        assert_eq!(register(&mut editor, RegisterName::Unnamed).0, "one");

        // One undo step for the whole change.
        editor.feed_str("u").unwrap();
        assert_eq!(text(&editor), "one two\n");
    }

    #[test]
    fn test_inclusive_motion() {
        let editor = run("one two\n", "de");
        assert_eq!(text(&editor), " two\n");
        let editor = run("one two\n", "dfw");
        assert_eq!(text(&editor), "o\n");
        let editor = run("one two\n", "d$");
        assert_eq!(text(&editor), "\n");
    }

    #[test]
    fn test_delete_lines() {
        let editor = run("one\ntwo\nthree\n", "jdd");
        assert_eq!(text(&editor), "one\nthree\n");
        assert_eq!(editor.cursor(), 4);

        let editor = run("one\ntwo\nthree\n", "2dd");
        assert_eq!(text(&editor), "three\n");

        let editor = run("one\ntwo\nthree\n", "dj");
        assert_eq!(text(&editor), "three\n");
    }

    #[test]
    fn test_delete_last_line_without_newline() {
        let mut editor = run("one\n  two", "jdd");
        assert_eq!(text(&editor), "one");
        assert_eq!(register(&mut editor, RegisterName::Unnamed), ("  two\n".into(), true));
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_forced_motion_type() {
        let editor = run("one\ntwo\n", "dvj");
        assert_eq!(text(&editor), "two\n");
        let editor = run("one two\n", "dVw");
        assert!(text(&editor).is_empty());
    }

    #[test]
    fn test_change_line_keeps_newline() {
        let editor = run("one\ntwo\n", "ccx<Escape>");
        assert_eq!(text(&editor), "x\ntwo\n");
    }

    #[test]
    fn test_case_operators() {
        let editor = run("hello world\n", "gUiw");
        assert_eq!(text(&editor), "HELLO world\n");
        let editor = run("Hello World\n", "g~~");
        assert_eq!(text(&editor), "hELLO wORLD\n");
        let editor = run("ABC\n", "gugu");
        assert_eq!(text(&editor), "abc\n");
        let editor = run("straße\n", "gUgU");
        assert_eq!(text(&editor), "STRASSE\n");
        let editor = run("abc\n", "~");
        assert_eq!(text(&editor), "Abc\n");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_shift() {
        let editor = run("a\n\nb\n", "3>>");
        assert_eq!(text(&editor), "\ta\n\n\tb\n");

        let mut editor = Editor::new();
        editor.open_text(Text::from("          a\n\tb\n")).unwrap();
        editor.feed_str("<lt>j").unwrap();
        assert_eq!(text(&editor), "  a\nb\n");
    }

    #[test]
    fn test_text_objects_with_operators() {
        let editor = run("f(a, b)\n", "fadi(");
        assert_eq!(text(&editor), "f()\n");
        let editor = run("f(a, b)\n", "fada(");
        assert_eq!(text(&editor), "f\n");
        // On the delimiter itself.
        let editor = run("f(a, b)\n", "f(di(");
        assert_eq!(text(&editor), "f()\n");
        let editor = run("one two three\n", "wdaw");
        assert_eq!(text(&editor), "one three\n");
    }

    #[test]
    fn test_change_empty_object() {
        let editor = run("f()\n", "f(ci(x<Escape>");
        assert_eq!(text(&editor), "f(x)\n");
    }

    #[test]
    fn test_change_quote_outside_pair_does_nothing() {
        let editor = run("say \"hi\" x\n", "ci\"");
        assert_eq!(text(&editor), "say \"hi\" x\n");
        assert_eq!(editor.mode(), Mode::Normal);
        assert_eq!(editor.cursor(), 0);

        let editor = run("say \"hi\" x\n", "fhci\"X<Escape>");
        assert_eq!(text(&editor), "say \"X\" x\n");
    }

    // ==================== Registers & Put ====================

    #[test]
    fn test_yank_and_put() {
        let mut editor = run("one two\n", "yw$p");
        assert_eq!(text(&editor), "one twoone \n");
        assert_eq!(register(&mut editor, RegisterName::Yank).0, "one ");

        let editor = run("one\ntwo\n", "yyjp");
        assert_eq!(text(&editor), "one\ntwo\none\n");
        assert_eq!(editor.cursor(), 8);

        let editor = run("one\ntwo\n", "yyP");
        assert_eq!(text(&editor), "one\none\ntwo\n");
        assert_eq!(editor.cursor(), 0);

        let editor = run("ab\n", "yl3p");
        assert_eq!(text(&editor), "aaaab\n");
    }

    #[test]
    fn test_put_line_after_last_line_without_newline() {
        let editor = run("one\ntwo", "yyjp");
        assert_eq!(text(&editor), "one\ntwo\none");
        assert_eq!(editor.cursor(), 8);
    }

    #[test]
    fn test_named_registers() {
        let mut editor = run("one two three\n", "\"ayw");
        assert_eq!(register(&mut editor, RegisterName::Named('a')).0, "one ");
        editor.feed_str("w\"Ayw").unwrap();
        assert_eq!(register(&mut editor, RegisterName::Named('a')).0, "one two ");
        assert_eq!(register(&mut editor, RegisterName::Unnamed).0, "one two ");

        editor.feed_str("0\"ap").unwrap();
        assert_eq!(text(&editor), "oone two ne two three\n");
    }

    #[test]
    fn test_blackhole_register() {
        let mut editor = run("one\ntwo\n", "yy\"_dd");
        assert_eq!(text(&editor), "two\n");
        assert_eq!(register(&mut editor, RegisterName::Unnamed), ("one\n".into(), true));
    }

    #[test]
    fn test_delete_char_fills_register() {
        let mut editor = run("abcdef\n", "3x");
        assert_eq!(text(&editor), "def\n");
        assert_eq!(register(&mut editor, RegisterName::Unnamed).0, "abc");
        // x never crosses the line end.
        editor.feed_str("$9x").unwrap();
        assert_eq!(text(&editor), "de\n");
    }

    // ==================== Insert Mode ====================

    #[test]
    fn test_insert_commands() {
        assert_eq!(text(&run("abc\n", "ax<Escape>")), "axbc\n");
        assert_eq!(text(&run("abc\n", "Ax<Escape>")), "abcx\n");
        assert_eq!(text(&run("  abc\n", "$Ix<Escape>")), "  xabc\n");
        assert_eq!(text(&run("a\nb\n", "ox<Escape>")), "a\nx\nb\n");
        assert_eq!(text(&run("a\nb\n", "jOx<Escape>")), "a\nx\nb\n");
    }

    #[test]
    fn test_escape_steps_back() {
        let editor = run("", "iabc<Escape>");
        assert_eq!(editor.cursor(), 2);
        let editor = run("", "i<Escape>");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_readline_edits() {
        let editor = run("", "ione two<C-w>x<Escape>");
        assert_eq!(text(&editor), "one x");
        let editor = run("", "ione<C-u>two<Escape>");
        assert_eq!(text(&editor), "two");
        let editor = run("", "iabc<Backspace><Backspace>x<Escape>");
        assert_eq!(text(&editor), "ax");
    }

    #[test]
    fn test_expand_tab() {
        let mut editor = Editor::with_config({
            let mut config = crate::config::Config::default();
            config.editor.expand_tab = true;
            config.editor.tab_width = 4;
            config
        });
        editor.new_file().unwrap();
        editor.feed_str("iab<Tab>c<Escape>").unwrap();
        assert_eq!(text(&editor), "ab  c");
    }

    // ==================== Normal Mode Edits ====================

    #[test]
    fn test_replace_char() {
        assert_eq!(text(&run("abcd\n", "3rx")), "xxxd\n");
        // Too few characters: nothing happens.
        assert_eq!(text(&run("ab\n", "3rx")), "ab\n");
        assert_eq!(text(&run("ab cd\n", "2lr<Enter>")), "ab\ncd\n");
    }

    #[test]
    fn test_join() {
        let editor = run("one\n   two\nthree\n", "J");
        assert_eq!(text(&editor), "one two\nthree\n");
        assert_eq!(editor.cursor(), 3);

        assert_eq!(text(&run("a\nb\nc\n", "3J")), "a b c\n");
        assert_eq!(text(&run("a \nb\n", "J")), "a b\n");
        assert_eq!(text(&run("f(\n)\n", "J")), "f()\n");
        assert_eq!(text(&run("only\n", "J")), "only\n");
    }

    // ==================== Visual Mode ====================

    #[test]
    fn test_visual_delete() {
        let mut editor = editor("one two three\n");
        editor.feed_str("wve").unwrap();
        assert_eq!(editor.selection(), Some(4..7));
        editor.feed_str("d").unwrap();
        assert_eq!(text(&editor), "one  three\n");
        assert_eq!(editor.mode(), Mode::Normal);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_visual_line_yank() {
        let mut editor = run("one\ntwo\nthree\n", "jVjy");
        assert_eq!(register(&mut editor, RegisterName::Unnamed), ("two\nthree\n".into(), true));
        assert_eq!(editor.cursor(), 4);
    }

    #[test]
    fn test_visual_text_object_extends() {
        let mut editor = editor("f(a, b)\n");
        editor.feed_str("fbvi(").unwrap();
        assert_eq!(editor.selection(), Some(2..6));
        editor.feed_str("o").unwrap();
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn test_visual_put_swaps() {
        let mut editor = run("one two\n", "yiwwviwp");
        assert_eq!(text(&editor), "one one\n");
        assert_eq!(register(&mut editor, RegisterName::Unnamed).0, "two");
    }

    #[test]
    fn test_visual_join() {
        assert_eq!(text(&run("a\nb\nc\nd\n", "VjjJ")), "a b c\nd\n");
    }

    // ==================== History ====================

    #[test]
    fn test_undo_redo() {
        let mut editor = run("abc\n", "xx");
        assert_eq!(text(&editor), "c\n");
        editor.feed_str("u").unwrap();
        assert_eq!(text(&editor), "bc\n");
        editor.feed_str("2u").unwrap();
        assert_eq!(text(&editor), "abc\n");
        editor.feed_str("<C-r>").unwrap();
        assert_eq!(text(&editor), "bc\n");
    }

    #[test]
    fn test_earlier_later_walk_branches() {
        let mut editor = run("abc\n", "xuu");
        editor.feed_str("$x").unwrap();
        assert_eq!(text(&editor), "ab\n");
        editor.feed_str("u").unwrap();
        assert_eq!(text(&editor), "abc\n");
        // Redo only follows the newest branch; g+ walks creation order.
        editor.feed_str("g+").unwrap();
        assert_eq!(text(&editor), "bc\n");
        editor.feed_str("g+").unwrap();
        assert_eq!(text(&editor), "ab\n");
        editor.feed_str("g-").unwrap();
        assert_eq!(text(&editor), "bc\n");
    }

    // ==================== Helpers ====================

    #[test]
    fn test_transform_case_invalid_utf8() {
        assert_eq!(transform_case(Operator::CaseUpper, b"a\xffb"), b"A\xffB");
        assert_eq!(transform_case(Operator::CaseSwap, b"aB"), b"Ab");
    }

    #[test]
    fn test_operator_range_word_end_of_line() {
        let chain = PieceChain::from("foo\n  bar\n");
        let (range, linewise) =
            operator_range(&chain, Operator::Delete, Motion::WordStartNext, 0..6, 1, None);
        assert_eq!(range, 0..3);
        assert!(!linewise);
    }
}
