//! # Vise Core
//!
//! Modal key dispatch on top of `vise-buffer`: keys, bindings, motions,
//! text objects, registers, macros and the editor that ties them together.
//!
//! ## Architecture Overview
//!
//! ```text
//!  key tokens
//!      │
//! ┌────▼──────────────────────────────────────────────────────┐
//! │ Editor                                                    │
//! │  ┌──────────┐   ┌─────────────┐   ┌────────────────────┐  │
//! │  │  Keymap  │──▶│ ActionState │──▶│ Motion/TextObject  │  │
//! │  │ (tries)  │   │ count, reg, │   │ resolve a range    │  │
//! │  └──────────┘   │ operator    │   └─────────┬──────────┘  │
//! │                 └─────────────┘             │             │
//! │  ┌───────────┐  ┌───────────┐  ┌────────────▼─────────┐   │
//! │  │ Registers │◀─│ operators │─▶│ Files: Text (chain + │   │
//! │  └───────────┘  └───────────┘  │ undo tree)           │   │
//! │                                └──────────────────────┘   │
//! └────────────────────────┬──────────────────────────────────┘
//!                          ▼
//!                  EventBus (FileChanged, CursorMoved, ...)
//! ```
//!
//! ## Learning: Module Organization
//!
//! Rust modules map to files:
//! - `mod foo;` looks for `foo.rs` or `foo/mod.rs`
//! - `editor.rs` plus `editor/dispatch.rs` splits one type's `impl` over
//!   several files while the child modules still see its private fields
//! - `pub use` re-exports items for cleaner public APIs

pub mod action;
pub mod bindings;
pub mod config;
pub mod editor;
pub mod event;
pub mod file;
pub mod key;
pub mod keymap;
pub mod motion;
pub mod register;
pub mod registry;
pub mod script;
pub mod textobject;
pub mod window;

pub use action::{Action, ActionState, Mode, Operator, Put};
pub use config::{Config, ConfigError};
pub use editor::{Editor, KeyQueue, KeySource};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use file::{File, FileId};
pub use key::Key;
pub use keymap::{Binding, Keymap, Lookup};
pub use motion::Motion;
pub use register::{Clipboard, MemoryClipboard, Register, RegisterName, RegisterRef, Registers};
pub use registry::DynArray;
pub use script::{ActionHandler, ScriptHost};
pub use textobject::{ObjectKind, TextObject, TextObjectId};
pub use window::{Window, WindowId};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("File not found: {0}")]
    FileNotFound(FileId),

    #[error("Window not found: {0}")]
    WindowNotFound(WindowId),

    #[error("No active window")]
    NoActiveWindow,

    #[error("Invalid register: {0}")]
    InvalidRegister(String),

    #[error("Unknown text object: #{0}")]
    UnknownTextObject(usize),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Index {0} is out of bounds")]
    IndexOutOfBounds(usize),

    #[error("Buffer error: {0}")]
    Buffer(#[from] vise_buffer::BufferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid search pattern: {0}")]
    Regex(#[from] regex::Error),
}
