//! Hooks for an embedded scripting runtime.
//!
//! ## Learning: Default Trait Methods
//!
//! Every hook of [`ScriptHost`] has an empty default body, so a host only
//! implements the notifications it cares about:
//!
//! ```rust,ignore
//! struct Greeter;
//!
//! impl ScriptHost for Greeter {
//!     fn start(&mut self, editor: &mut Editor) -> CoreResult<()> {
//!         editor.map(Mode::Normal, "Q", Binding::Alias(Key::parse_sequence("@q")));
//!         Ok(())
//!     }
//! }
//! ```
//!
//! ## Trait Objects
//!
//! The editor stores the host as `Box<dyn ScriptHost>` and user actions as
//! `Arc<dyn ActionHandler>`. Both receive `&mut Editor`, which is why the
//! editor takes the host out of its own field while a hook runs.

use crate::editor::Editor;
use crate::file::FileId;
use crate::window::WindowId;
use crate::CoreResult;

/// Lifecycle notifications delivered by the editor.
#[allow(unused_variables)]
pub trait ScriptHost: Send {
    /// The host was attached to an editor.
    fn init(&mut self, editor: &mut Editor) -> CoreResult<()> {
        Ok(())
    }

    /// The control loop is about to read its first key.
    fn start(&mut self, editor: &mut Editor) -> CoreResult<()> {
        Ok(())
    }

    fn quit(&mut self, editor: &mut Editor) -> CoreResult<()> {
        Ok(())
    }

    fn file_open(&mut self, editor: &mut Editor, file: FileId) -> CoreResult<()> {
        Ok(())
    }

    fn file_save(&mut self, editor: &mut Editor, file: FileId) -> CoreResult<()> {
        Ok(())
    }

    /// Called before the file is removed, so it can still be inspected.
    fn file_close(&mut self, editor: &mut Editor, file: FileId) -> CoreResult<()> {
        Ok(())
    }

    fn window_open(&mut self, editor: &mut Editor, window: WindowId) -> CoreResult<()> {
        Ok(())
    }

    fn window_close(&mut self, editor: &mut Editor, window: WindowId) -> CoreResult<()> {
        Ok(())
    }
}

/// An action registered at runtime, reachable as `<vise-NAME>`.
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the action. `count` is the typed count, if any.
    fn execute(&self, editor: &mut Editor, count: Option<usize>) -> CoreResult<()>;

    fn description(&self) -> &str {
        self.name()
    }
}
