//! Key binding tries, one per mode.
//!
//! ## Learning: State Machines over a Trie
//!
//! Multi-key bindings such as `gg`, `di(` or `<C-w>j` share prefixes. A
//! trie answers the one question the dispatcher asks after every key:
//! "what do the keys typed so far mean?"
//!
//! ```text
//! "g"   -> Partial        wait for more keys
//! "gg"  -> Exact(..)      dispatch
//! "d"   -> Ambiguous(..)  bound, but "dd"... could follow
//! "gz"  -> NoMatch        abort
//! ```
//!
//! Tables are composed per mode and the **first** definition of a key
//! sequence wins. Later tables can add new sequences but never override
//! one that is already bound.

use std::collections::BTreeMap;

use crate::action::{Action, Mode};
use crate::bindings;
use crate::config::{BindingConfig, KeyboardConfig};
use crate::key::Key;

/// What a bound key sequence does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Action(Action),
    /// Replacement keys, fed back through the dispatcher
    Alias(Vec<Key>),
}

/// A binding as written in a static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bind {
    Action(Action),
    Alias(&'static str),
}

impl Bind {
    fn to_binding(self) -> Binding {
        match self {
            Bind::Action(action) => Binding::Action(action),
            Bind::Alias(keys) => Binding::Alias(Key::parse_sequence(keys)),
        }
    }
}

/// A named, static list of bindings.
#[derive(Debug, Clone, Copy)]
pub struct BindingTable {
    pub name: &'static str,
    pub bindings: &'static [(&'static str, Bind)],
}

/// Result of looking up a key sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    NoMatch,
    /// A prefix of at least one binding, not bound itself
    Partial,
    /// Bound, and no longer binding starts with it
    Exact(&'a Binding),
    /// Bound, and also a prefix of longer bindings
    Ambiguous(&'a Binding),
}

#[derive(Debug, Clone, Default)]
struct Node {
    binding: Option<Binding>,
    children: BTreeMap<Key, Node>,
}

/// Bound key sequences of one mode.
#[derive(Debug, Clone, Default)]
pub struct KeyTrie {
    root: Node,
    len: usize,
}

impl KeyTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composes tables in order; the first definition of a sequence wins.
    pub fn from_tables(tables: &[&BindingTable]) -> Self {
        let mut trie = Self::new();
        for table in tables {
            trie.add_table(table);
        }
        trie
    }

    pub fn add_table(&mut self, table: &BindingTable) {
        for (keys, bind) in table.bindings {
            let keys = Key::parse_sequence(keys);
            if !self.insert(&keys, bind.to_binding()) {
                tracing::trace!(table = table.name, keys = %crate::key::render(&keys), "shadowed binding");
            }
        }
    }

    /// Binds `keys` unless already bound. Returns whether it was added.
    pub fn insert(&mut self, keys: &[Key], binding: Binding) -> bool {
        if keys.is_empty() {
            return false;
        }
        let mut node = &mut self.root;
        for key in keys {
            node = node.children.entry(key.clone()).or_default();
        }
        if node.binding.is_some() {
            return false;
        }
        node.binding = Some(binding);
        self.len += 1;
        true
    }

    pub fn lookup(&self, keys: &[Key]) -> Lookup<'_> {
        let mut node = &self.root;
        for key in keys {
            match node.children.get(key) {
                Some(child) => node = child,
                None => return Lookup::NoMatch,
            }
        }
        match (&node.binding, node.children.is_empty()) {
            (Some(binding), true) => Lookup::Exact(binding),
            (Some(binding), false) => Lookup::Ambiguous(binding),
            (None, false) => Lookup::Partial,
            (None, true) => Lookup::NoMatch,
        }
    }

    /// Number of bound sequences.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One trie per mode.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    modes: [KeyTrie; 6],
}

impl Keymap {
    /// A keymap without any bindings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in bindings only.
    pub fn new() -> Self {
        Self::from_config(&KeyboardConfig::default())
    }

    /// User bindings first, then the built-in tables, then `<vise-NAME>`
    /// keys for every action.
    pub fn from_config(config: &KeyboardConfig) -> Self {
        let mut keymap = Self::empty();
        for mode in Mode::ALL {
            for (keys, entry) in config.mode(mode) {
                let binding = match entry {
                    BindingConfig::Alias { alias } => Binding::Alias(Key::parse_sequence(alias)),
                    BindingConfig::Action { action } => match Action::from_name(action) {
                        Some(action) => Binding::Action(action),
                        None => {
                            tracing::warn!(%mode, %keys, %action, "unknown action in key binding");
                            continue;
                        }
                    },
                };
                keymap.map(mode, keys, binding);
            }
            for table in bindings::tables(mode) {
                keymap.trie_mut(mode).add_table(table);
            }
        }
        keymap.bind_action_keys();
        keymap
    }

    /// Makes every built-in action reachable as `<vise-NAME>` in every mode.
    fn bind_action_keys(&mut self) {
        for action in Action::builtins() {
            if let Some(name) = action.name() {
                self.map_all(&format!("<vise-{}>", name), Binding::Action(action));
            }
        }
    }

    pub fn trie(&self, mode: Mode) -> &KeyTrie {
        &self.modes[mode as usize]
    }

    pub fn trie_mut(&mut self, mode: Mode) -> &mut KeyTrie {
        &mut self.modes[mode as usize]
    }

    pub fn lookup(&self, mode: Mode, keys: &[Key]) -> Lookup<'_> {
        self.trie(mode).lookup(keys)
    }

    /// Adds a binding to one mode. Returns false if `keys` is already bound.
    pub fn map(&mut self, mode: Mode, keys: &str, binding: Binding) -> bool {
        self.trie_mut(mode)
            .insert(&Key::parse_sequence(keys), binding)
    }

    /// Adds a binding to every mode.
    pub fn map_all(&mut self, keys: &str, binding: Binding) {
        for mode in Mode::ALL {
            self.map(mode, keys, binding.clone());
        }
    }
}
