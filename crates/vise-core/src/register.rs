//! Registers and macros.
//!
//! A register holds the text of the last yank or delete plus a linewise
//! flag that decides whether a put goes on a line of its own. A macro is a
//! key sequence stored in a register; its rendered key string doubles as
//! the register's text, so `"qp` pastes a recorded macro.
//!
//! | Name | Register |
//! |------|----------|
//! | `"` | unnamed, the default |
//! | `a`-`z` | named; `A`-`Z` append to them |
//! | `_` | blackhole: writes vanish, reads are empty |
//! | `*`, `+` | system clipboard through [`Clipboard`] |
//! | `0` | last yank |

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::key::{render, Key};
use crate::registry::DynArray;
use crate::{CoreError, CoreResult};

/// Register identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterName {
    Unnamed,
    /// `a`-`z`
    Named(char),
    Blackhole,
    Clipboard,
    /// `0`
    Yank,
    /// Registered at runtime
    User(usize),
}

impl RegisterName {
    pub fn to_char(self) -> Option<char> {
        match self {
            RegisterName::Unnamed => Some('"'),
            RegisterName::Named(c) => Some(c),
            RegisterName::Blackhole => Some('_'),
            RegisterName::Clipboard => Some('*'),
            RegisterName::Yank => Some('0'),
            RegisterName::User(_) => None,
        }
    }
}

/// A register selection as typed: which register, and whether to append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterRef {
    pub name: RegisterName,
    pub append: bool,
}

impl RegisterRef {
    pub fn new(name: RegisterName) -> Self {
        Self {
            name,
            append: false,
        }
    }

    /// Parses the key after `"`, `q` or `@`.
    pub fn parse(c: char) -> Option<Self> {
        let (name, append) = match c {
            '"' => (RegisterName::Unnamed, false),
            'a'..='z' => (RegisterName::Named(c), false),
            'A'..='Z' => (RegisterName::Named(c.to_ascii_lowercase()), true),
            '_' => (RegisterName::Blackhole, false),
            '*' | '+' => (RegisterName::Clipboard, false),
            '0' => (RegisterName::Yank, false),
            _ => return None,
        };
        Some(Self { name, append })
    }
}

/// Content of one register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    data: Vec<u8>,
    linewise: bool,
    keys: Option<Vec<Key>>,
}

impl Register {
    pub fn new(data: impl Into<Vec<u8>>, linewise: bool) -> Self {
        Self {
            data: data.into(),
            linewise,
            keys: None,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn linewise(&self) -> bool {
        self.linewise
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The content as a key sequence, for macro replay.
    pub fn keys(&self) -> Vec<Key> {
        match &self.keys {
            Some(keys) => keys.clone(),
            None => Key::parse_sequence(&String::from_utf8_lossy(&self.data)),
        }
    }

    fn put(&mut self, data: &[u8], linewise: bool) -> CoreResult<()> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(data.len())?;
        buf.extend_from_slice(data);
        self.data = buf;
        self.linewise = linewise;
        self.keys = None;
        Ok(())
    }

    fn append(&mut self, data: &[u8], linewise: bool) -> CoreResult<()> {
        self.data.try_reserve(data.len())?;
        self.data.extend_from_slice(data);
        self.linewise |= linewise;
        self.keys = None;
        Ok(())
    }
}

// ==================== Clipboard ====================

/// The system clipboard, as seen by the `*` and `+` registers.
pub trait Clipboard: Send {
    fn get(&mut self) -> Vec<u8>;
    fn set(&mut self, data: &[u8]);
}

/// Process-local clipboard, used when no system clipboard is attached.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    content: Vec<u8>,
}

impl Clipboard for MemoryClipboard {
    fn get(&mut self) -> Vec<u8> {
        self.content.clone()
    }

    fn set(&mut self, data: &[u8]) {
        self.content = data.to_vec();
    }
}

// ==================== Register File ====================

/// All registers of an editor.
pub struct Registers {
    unnamed: Register,
    yank: Register,
    /// Created on first write
    named: HashMap<char, Register>,
    user: DynArray<Register>,
    clipboard: Box<dyn Clipboard>,
}

impl Registers {
    pub fn new() -> Self {
        Self::with_clipboard(Box::new(MemoryClipboard::default()))
    }

    pub fn with_clipboard(clipboard: Box<dyn Clipboard>) -> Self {
        Self {
            unnamed: Register::default(),
            yank: Register::default(),
            named: HashMap::new(),
            user: DynArray::new(),
            clipboard,
        }
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    /// Adds a register at runtime.
    pub fn add(&mut self) -> CoreResult<RegisterName> {
        let idx = self.user.push(Register::default())?;
        Ok(RegisterName::User(idx))
    }

    fn slot(&mut self, name: RegisterName) -> CoreResult<Option<&mut Register>> {
        Ok(match name {
            RegisterName::Unnamed => Some(&mut self.unnamed),
            RegisterName::Yank => Some(&mut self.yank),
            RegisterName::Named(c) if c.is_ascii_lowercase() => {
                Some(self.named.entry(c).or_default())
            }
            RegisterName::User(idx) => Some(
                self.user
                    .get_mut(idx)
                    .ok_or_else(|| CoreError::InvalidRegister(format!("user register {}", idx)))?,
            ),
            RegisterName::Blackhole | RegisterName::Clipboard => None,
            RegisterName::Named(c) => return Err(CoreError::InvalidRegister(c.to_string())),
        })
    }

    /// Replaces the register's content.
    pub fn put(&mut self, name: RegisterName, data: &[u8], linewise: bool) -> CoreResult<()> {
        if name == RegisterName::Clipboard {
            self.clipboard.set(data);
            return Ok(());
        }
        match self.slot(name)? {
            Some(reg) => reg.put(data, linewise),
            None => Ok(()),
        }
    }

    /// Appends to the register; the linewise flag becomes the OR of both.
    pub fn append(&mut self, name: RegisterName, data: &[u8], linewise: bool) -> CoreResult<()> {
        if name == RegisterName::Clipboard {
            let mut content = self.clipboard.get();
            content.try_reserve(data.len())?;
            content.extend_from_slice(data);
            self.clipboard.set(&content);
            return Ok(());
        }
        match self.slot(name)? {
            Some(reg) => reg.append(data, linewise),
            None => Ok(()),
        }
    }

    /// Writes honouring the selection's append flag.
    pub fn store(&mut self, reg: RegisterRef, data: &[u8], linewise: bool) -> CoreResult<()> {
        if reg.append {
            self.append(reg.name, data, linewise)
        } else {
            self.put(reg.name, data, linewise)
        }
    }

    /// Reads a register. Unwritten registers and the blackhole are empty.
    pub fn get(&mut self, name: RegisterName) -> CoreResult<Cow<'_, Register>> {
        Ok(match name {
            RegisterName::Blackhole => Cow::Owned(Register::default()),
            RegisterName::Clipboard => {
                let data = self.clipboard.get();
                let linewise = data.ends_with(b"\n");
                Cow::Owned(Register::new(data, linewise))
            }
            RegisterName::Unnamed => Cow::Borrowed(&self.unnamed),
            RegisterName::Yank => Cow::Borrowed(&self.yank),
            RegisterName::Named(c) => match self.named.get(&c) {
                Some(reg) => Cow::Borrowed(reg),
                None if c.is_ascii_lowercase() => Cow::Owned(Register::default()),
                None => return Err(CoreError::InvalidRegister(c.to_string())),
            },
            RegisterName::User(idx) => Cow::Borrowed(
                self.user
                    .get(idx)
                    .ok_or_else(|| CoreError::InvalidRegister(format!("user register {}", idx)))?,
            ),
        })
    }

    /// Stores a recorded macro.
    pub fn put_keys(&mut self, reg: RegisterRef, keys: Vec<Key>) -> CoreResult<()> {
        let keys = if reg.append {
            let mut existing = self.get(reg.name)?.keys();
            existing.try_reserve(keys.len())?;
            existing.extend(keys);
            existing
        } else {
            keys
        };
        let text = render(&keys);
        if reg.name == RegisterName::Clipboard {
            self.clipboard.set(text.as_bytes());
            return Ok(());
        }
        if let Some(slot) = self.slot(reg.name)? {
            slot.put(text.as_bytes(), false)?;
            slot.keys = Some(keys);
        }
        Ok(())
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registers")
            .field("unnamed", &self.unnamed)
            .field("yank", &self.yank)
            .field("named", &self.named)
            .field("user", &self.user.len())
            .finish_non_exhaustive()
    }
}
