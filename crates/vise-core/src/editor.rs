//! Main editor orchestration.
//!
//! ## Learning: The Facade Pattern
//!
//! `Editor` acts as a facade over files, windows, registers, the keymap and
//! the dispatcher. A frontend feeds it key tokens and listens on its event
//! bus; it never reaches into the subsystems directly.
//!
//! The `impl Editor` is split over three files:
//! - `editor.rs`: files, windows, extension points, the control loop
//! - `editor/dispatch.rs`: keys to actions
//! - `editor/ops.rs`: what actions do to the text

mod dispatch;
mod ops;

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use regex::bytes::Regex;
use tokio::sync::broadcast;
use vise_buffer::Text;

use crate::action::{ActionState, Mode};
use crate::config::Config;
use crate::event::{EditorEvent, EventBus};
use crate::file::{File, FileId, Files};
use crate::key::Key;
use crate::keymap::{Binding, Keymap};
use crate::motion::Motion;
use crate::register::{Clipboard, RegisterName, RegisterRef, Registers};
use crate::registry::DynArray;
use crate::script::{ActionHandler, ScriptHost};
use crate::textobject::{ObjectKind, TextObjectId, TextObjects};
use crate::window::{Window, WindowId, Windows};
use crate::{Action, CoreError, CoreResult};

use dispatch::Input;

// ==================== Key Sources ====================

/// Where the control loop reads canonical key tokens from.
pub trait KeySource {
    /// The next key, or `None` at the end of input.
    fn next_key(&mut self) -> Option<Key>;
}

/// A fixed list of keys, e.g. from `--keys` or a test.
#[derive(Debug, Clone, Default)]
pub struct KeyQueue {
    keys: VecDeque<Key>,
}

impl KeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a key string such as `"d2w<Escape>"`.
    pub fn parse(keys: &str) -> Self {
        Self {
            keys: Key::parse_sequence(keys).into(),
        }
    }

    pub fn push(&mut self, key: Key) {
        self.keys.push_back(key);
    }

    pub fn push_str(&mut self, keys: &str) {
        self.keys.extend(Key::parse_sequence(keys));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeySource for KeyQueue {
    fn next_key(&mut self) -> Option<Key> {
        self.keys.pop_front()
    }
}

// ==================== Editor ====================

/// An action registered at runtime.
#[derive(Clone)]
struct UserAction {
    name: String,
    handler: Arc<dyn ActionHandler>,
}

impl fmt::Debug for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A macro being recorded.
#[derive(Debug)]
struct Recording {
    register: RegisterRef,
    keys: Vec<Key>,
    /// Index of the first key of the sequence being dispatched, so the
    /// keys that stop the recording can be cut off again
    mark: usize,
}

/// The main editor state.
///
/// ## Thread Safety
///
/// `Editor` is owned by a single thread. The only thing shared with other
/// threads is the resize flag, an `Arc<AtomicBool>` that a signal handler
/// may set at any time; the control loop consumes it between keys.
pub struct Editor {
    config: Config,
    keymap: Keymap,

    files: Files,
    windows: Windows,

    registers: Registers,
    objects: TextObjects,
    actions: DynArray<UserAction>,

    mode: Mode,
    state: ActionState,
    input: Input,

    /// Pattern for n, N, gn and gN
    search: Option<Regex>,
    /// Last f/F/t/T and its character, for ; and ,
    last_totill: Option<(Motion, char)>,
    /// Last replayed macro, for @@
    last_macro: Option<RegisterRef>,
    recording: Option<Recording>,

    /// Cursor when the current command started
    command_start: usize,
    /// Cursor when the current insert session started
    insert_start: Option<usize>,
    /// The active file changed during the current command
    dirty: bool,

    event_bus: EventBus,
    script: Option<Box<dyn ScriptHost>>,
    resized: Arc<AtomicBool>,
    should_quit: bool,
}

impl Editor {
    /// Creates an editor with the default configuration and no files.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let keymap = Keymap::from_config(&config.keyboard);
        Self {
            config,
            keymap,
            files: Files::new(),
            windows: Windows::new(),
            registers: Registers::new(),
            objects: TextObjects::new(),
            actions: DynArray::new(),
            mode: Mode::default(),
            state: ActionState::default(),
            input: Input::default(),
            search: None,
            last_totill: None,
            last_macro: None,
            recording: None,
            command_start: 0,
            insert_start: None,
            dirty: false,
            event_bus: EventBus::new(),
            script: None,
            resized: Arc::new(AtomicBool::new(false)),
            should_quit: false,
        }
    }

    // ==================== Files ====================

    /// Opens an empty, unnamed file in a new window.
    pub fn new_file(&mut self) -> CoreResult<WindowId> {
        self.open_text(Text::new())
    }

    /// Opens `text` as a new file in a new window.
    pub fn open_text(&mut self, text: Text) -> CoreResult<WindowId> {
        let id = self.add_file(File::from_text(text));
        self.window_open(id)
    }

    /// Opens a file in a new window. A file that is already open gets
    /// another window onto the same text.
    pub fn open_file(&mut self, path: impl AsRef<Path>) -> CoreResult<WindowId> {
        let path = path.as_ref();
        let id = match self.files.find_by_path(path) {
            Some(id) => id,
            None => self.add_file(File::open(path)?),
        };
        self.window_open(id)
    }

    fn add_file(&mut self, file: File) -> FileId {
        let id = self.files.add(file);
        tracing::info!(file = %id, "opened file");
        self.emit(EditorEvent::FileOpened(id));
        self.notify_script(|host, editor| host.file_open(editor, id));
        id
    }

    /// Saves the file of the active window.
    pub fn save(&mut self) -> CoreResult<()> {
        let id = self.active_file_id()?;
        self.file_mut(id)?.save()?;
        self.saved(id);
        Ok(())
    }

    /// Saves the file of the active window under a new path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> CoreResult<()> {
        let id = self.active_file_id()?;
        self.file_mut(id)?.save_as(path)?;
        self.saved(id);
        Ok(())
    }

    fn saved(&mut self, id: FileId) {
        self.emit(EditorEvent::FileSaved(id));
        self.notify_script(|host, editor| host.file_save(editor, id));
    }

    /// Closes a file together with every window showing it.
    pub fn close_file(&mut self, id: FileId) -> CoreResult<()> {
        if self.files.get(id).is_none() {
            return Err(CoreError::FileNotFound(id));
        }
        let windows: Vec<WindowId> = self.windows.showing(id).map(Window::id).collect();
        for window in windows {
            self.remove_window(window)?;
        }
        self.remove_file(id)
    }

    fn remove_file(&mut self, id: FileId) -> CoreResult<()> {
        self.notify_script(|host, editor| host.file_close(editor, id));
        self.files.close(id)?;
        self.emit(EditorEvent::FileClosed(id));
        Ok(())
    }

    pub fn file(&self, id: FileId) -> CoreResult<&File> {
        self.files.get(id).ok_or(CoreError::FileNotFound(id))
    }

    fn file_mut(&mut self, id: FileId) -> CoreResult<&mut File> {
        self.files.get_mut(id).ok_or(CoreError::FileNotFound(id))
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.iter()
    }

    /// Returns true if any file has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.files.iter().any(File::is_modified)
    }

    // ==================== Windows ====================

    /// Opens another window onto an open file and focuses it.
    pub fn window_open(&mut self, file: FileId) -> CoreResult<WindowId> {
        if self.files.get(file).is_none() {
            return Err(CoreError::FileNotFound(file));
        }
        self.leave_window()?;
        let id = self.windows.add(Window::new(file));
        self.emit(EditorEvent::WindowOpened(id));
        self.notify_script(|host, editor| host.window_open(editor, id));
        Ok(id)
    }

    /// Closes a window. The file goes with it once no window shows it.
    pub fn window_close(&mut self, id: WindowId) -> CoreResult<()> {
        if self.windows.active_id() == Some(id) {
            self.leave_window()?;
        }
        let file = self.remove_window(id)?;
        if self.windows.showing(file).next().is_none() {
            self.remove_file(file)?;
        }
        Ok(())
    }

    fn remove_window(&mut self, id: WindowId) -> CoreResult<FileId> {
        if self.windows.get(id).is_none() {
            return Err(CoreError::WindowNotFound(id));
        }
        self.notify_script(|host, editor| host.window_close(editor, id));
        let window = self.windows.close(id)?;
        self.emit(EditorEvent::WindowClosed(id));
        Ok(window.file())
    }

    /// Focuses another window.
    pub fn focus(&mut self, id: WindowId) -> CoreResult<()> {
        if self.windows.active_id() == Some(id) {
            return Ok(());
        }
        if self.windows.get(id).is_none() {
            return Err(CoreError::WindowNotFound(id));
        }
        self.leave_window()?;
        self.windows.set_active(id)
    }

    pub fn window(&self, id: WindowId) -> CoreResult<&Window> {
        self.windows.get(id).ok_or(CoreError::WindowNotFound(id))
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    pub fn active_window(&self) -> Option<&Window> {
        self.windows.active()
    }

    fn active_file_id(&self) -> CoreResult<FileId> {
        self.windows
            .active()
            .map(Window::file)
            .ok_or(CoreError::NoActiveWindow)
    }

    /// Returns the text shown in the active window.
    pub fn active_text(&self) -> Option<&Text> {
        let file = self.windows.active()?.file();
        self.files.get(file).map(File::text)
    }

    // ==================== Queries ====================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Cursor of the active window, 0 without one.
    pub fn cursor(&self) -> usize {
        self.windows.active().map_or(0, Window::cursor)
    }

    /// Content of the active window's file.
    pub fn content(&self) -> Vec<u8> {
        self.active_text().map(Text::content).unwrap_or_default()
    }

    /// Bytes covered by the visual selection, in visual modes only.
    pub fn selection(&self) -> Option<Range<usize>> {
        let window = self.windows.active()?;
        let chain = self.active_text()?.chain();
        match self.mode {
            Mode::Visual => window.selection(chain),
            Mode::VisualLine => window.line_selection(chain),
            _ => None,
        }
    }

    /// The command assembled so far.
    pub fn action_state(&self) -> &ActionState {
        &self.state
    }

    /// Register a macro is being recorded into.
    pub fn recording(&self) -> Option<RegisterRef> {
        self.recording.as_ref().map(|r| r.register)
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn search(&self) -> Option<&Regex> {
        self.search.as_ref()
    }

    // ==================== Extension Points ====================

    /// Sets the pattern used by n, N, gn and gN.
    pub fn set_search(&mut self, pattern: &str) -> CoreResult<()> {
        self.search = Some(Regex::new(pattern)?);
        tracing::debug!(%pattern, "search pattern set");
        Ok(())
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    /// Adds a binding to one mode. Returns false if `keys` is already
    /// bound there.
    pub fn map(&mut self, mode: Mode, keys: &str, binding: Binding) -> bool {
        self.keymap.map(mode, keys, binding)
    }

    /// Registers a text object, reachable as `<vise-NAME>` in every mode.
    pub fn register_text_object(
        &mut self,
        name: &str,
        kind: ObjectKind,
        resolve: impl Fn(&vise_buffer::PieceChain, usize) -> Option<Range<usize>>
        + Send
        + Sync
        + 'static,
    ) -> CoreResult<TextObjectId> {
        let id = self.objects.register(name, kind, resolve)?;
        self.keymap.map_all(
            &format!("<vise-{}>", name),
            Binding::Action(Action::TextObject(id)),
        );
        Ok(id)
    }

    /// Registers an action, reachable as `<vise-NAME>` in every mode.
    pub fn register_action(&mut self, handler: impl ActionHandler + 'static) -> CoreResult<Action> {
        let name = handler.name().to_string();
        let idx = self.actions.push(UserAction {
            name: name.clone(),
            handler: Arc::new(handler),
        })?;
        let action = Action::User(idx);
        self.keymap
            .map_all(&format!("<vise-{}>", name), Binding::Action(action));
        tracing::debug!(%name, "registered action");
        Ok(action)
    }

    /// Adds a register that can only be reached through the API.
    pub fn add_register(&mut self) -> CoreResult<RegisterName> {
        self.registers.add()
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.registers.set_clipboard(clipboard);
    }

    /// Attaches a scripting runtime and runs its init hook.
    pub fn set_script_host(&mut self, host: Box<dyn ScriptHost>) {
        self.script = Some(host);
        self.notify_script(|host, editor| host.init(editor));
    }

    /// Runs a hook with the host taken out of the editor, so the hook can
    /// borrow the editor mutably.
    fn notify_script(
        &mut self,
        hook: impl FnOnce(&mut dyn ScriptHost, &mut Editor) -> CoreResult<()>,
    ) {
        let Some(mut host) = self.script.take() else {
            return;
        };
        if let Err(e) = hook(host.as_mut(), self) {
            tracing::warn!(error = %e, "script hook failed");
            self.emit(EditorEvent::Warning(e.to_string()));
        }
        // A hook may have installed a different host.
        if self.script.is_none() {
            self.script = Some(host);
        }
    }

    // ==================== Control Loop ====================

    /// Flag a signal handler sets when the terminal was resized.
    pub fn resize_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.resized)
    }

    /// Reads keys from `source` until it runs dry or the editor quits.
    ///
    /// A failing command is reported as a warning; the loop keeps going.
    pub fn run(&mut self, source: &mut dyn KeySource) -> CoreResult<()> {
        self.notify_script(|host, editor| host.start(editor));
        while !self.should_quit {
            if self.resized.swap(false, Ordering::AcqRel) {
                self.emit(EditorEvent::Resized);
            }
            let Some(key) = source.next_key() else {
                break;
            };
            if let Err(e) = self.feed(key) {
                tracing::warn!(error = %e, "command failed");
                self.emit(EditorEvent::Warning(e.to_string()));
            }
        }
        if !self.should_quit {
            self.flush()?;
        }
        Ok(())
    }

    /// Signals that the editor should quit.
    pub fn quit(&mut self) {
        if self.should_quit {
            return;
        }
        self.notify_script(|host, editor| host.quit(editor));
        self.should_quit = true;
        self.emit(EditorEvent::Quit);
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    // ==================== Events ====================

    /// Subscribes to editor events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.event_bus.subscribe()
    }

    fn emit(&self, event: EditorEvent) {
        self.event_bus.emit(event);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
