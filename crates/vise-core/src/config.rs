//! Editor configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! `#[derive(Serialize, Deserialize)]` generates the TOML mapping, and
//! `#[serde(default)]` on every section means a config file only needs the
//! keys it changes:
//!
//! ```toml
//! [editor]
//! shift_width = 2
//!
//! [keyboard.normal]
//! "gj" = { action = "cursor-line-down" }
//! "Q" = { alias = "@q" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::action::Mode;

/// Main editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editing behaviour and safety limits
    pub editor: EditorConfig,

    /// User key bindings, per mode
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("vise").join("config.toml"))
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Editing behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Display width of a tab character
    pub tab_width: usize,

    /// Insert spaces instead of a tab character
    pub expand_tab: bool,

    /// Columns added or removed by `>` and `<`
    pub shift_width: usize,

    /// Nested alias expansions before a key sequence is dropped
    pub max_alias_depth: usize,

    /// Nested macro replays before a replay is aborted
    pub max_macro_depth: usize,

    /// Upper bound for any count
    pub max_count: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: 8,
            expand_tab: false,
            shift_width: 8,
            max_alias_depth: 16,
            max_macro_depth: 8,
            max_count: 99_999,
        }
    }
}

/// One user binding: either an action by name or an alias key string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindingConfig {
    Action { action: String },
    Alias { alias: String },
}

/// User key bindings. Keys are key sequences such as `"<C-w>j"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct KeyboardConfig {
    pub normal: BTreeMap<String, BindingConfig>,
    pub operator_pending: BTreeMap<String, BindingConfig>,
    pub visual: BTreeMap<String, BindingConfig>,
    pub visual_line: BTreeMap<String, BindingConfig>,
    pub insert: BTreeMap<String, BindingConfig>,
    pub replace: BTreeMap<String, BindingConfig>,
}

impl KeyboardConfig {
    /// Bindings configured for `mode`.
    pub fn mode(&self, mode: Mode) -> &BTreeMap<String, BindingConfig> {
        match mode {
            Mode::Normal => &self.normal,
            Mode::OperatorPending => &self.operator_pending,
            Mode::Visual => &self.visual,
            Mode::VisualLine => &self.visual_line,
            Mode::Insert => &self.insert,
            Mode::Replace => &self.replace,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
