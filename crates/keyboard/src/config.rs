//! Keyboard configuration, loaded from `osk.toml` with environment overrides.

use crate::layouts::{LayoutKind, LayoutTables};
use core_types::Millis;
use keypad::ButtonTheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "osk.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("layout mode `{0}` is missing")]
    MissingLayout(String),

    #[error("layout mode `{0}` has no keys")]
    EmptyLayout(String),

    #[error("unknown layout mode `{0}` in theme table")]
    UnknownThemeMode(String),

    #[error("numeric edge margin must be a finite non-negative number, got {0}")]
    InvalidMargin(f32),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct KeyboardConfig {
    pub placement: PlacementConfig,
    pub timing: TimingConfig,
    pub classes: ClassNames,
    pub mount: MountConfig,
    pub layouts: LayoutsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementConfig {
    /// A numeric field closer than this to the right viewport edge gets the
    /// keyboard on its left.
    pub numeric_edge_margin: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between focus and geometry sampling.
    pub focus_debounce_ms: Millis,
    /// Time a blur waits for focus to land on another bound input.
    pub blur_grace_ms: Millis,
    /// Upper bound on a show/hide transition before it is treated as finished.
    pub animation_timeout_ms: Millis,
}

/// Class names the container and bound inputs carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClassNames {
    /// Set on every input that has been set up.
    pub marker: String,
    pub base: String,
    pub visible: String,
    pub no_transition: String,
    pub top: String,
    pub bottom: String,
    pub left: String,
    pub right: String,
    pub default_layout: String,
    pub numeric_layout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MountConfig {
    /// Element names that get the container mounted inside them while one of
    /// their descendants is bound.
    pub modal_hosts: Vec<String>,
}

/// Overrides merged over the built-in layout tables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutsConfig {
    pub modes: BTreeMap<String, Vec<String>>,
    pub display: BTreeMap<String, String>,
    pub themes: BTreeMap<String, Vec<ThemeEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeEntry {
    pub class: String,
    pub buttons: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            numeric_edge_margin: 250.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            focus_debounce_ms: 50,
            blur_grace_ms: 100,
            animation_timeout_ms: 1000,
        }
    }
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            marker: "keyboard-enabled".into(),
            base: "simple-keyboard".into(),
            visible: "kb-visible".into(),
            no_transition: "kb-no-transition".into(),
            top: "kb-top".into(),
            bottom: "kb-bottom".into(),
            left: "kb-left".into(),
            right: "kb-right".into(),
            default_layout: "kb-default".into(),
            numeric_layout: "kb-numeric".into(),
        }
    }
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            modal_hosts: ["ha-dialog", "dialog", "ha-drawer", "mwc-dialog"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl KeyboardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `osk.toml` from the working directory, falling back to defaults.
    pub fn load_or_default() -> Self {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Io { .. }) => Self::default(),
            Err(err) => {
                log::warn!(target: "keyboard.config", "ignoring {DEFAULT_CONFIG_FILE}: {err}");
                Self::default()
            }
        }
    }

    /// Environment variables take precedence over file values.
    pub fn merge_with_env(&mut self) {
        if let Some(margin) = env_parse::<f32>("OSK_NUMERIC_MARGIN") {
            if margin.is_finite() && margin >= 0.0 {
                self.placement.numeric_edge_margin = margin;
            }
        }
        if let Some(ms) = env_parse::<Millis>("OSK_FOCUS_DEBOUNCE_MS") {
            self.timing.focus_debounce_ms = ms;
        }
        if let Some(ms) = env_parse::<Millis>("OSK_BLUR_GRACE_MS") {
            self.timing.blur_grace_ms = ms;
        }
        if let Some(ms) = env_parse::<Millis>("OSK_ANIMATION_TIMEOUT_MS") {
            self.timing.animation_timeout_ms = ms;
        }
    }

    /// Load `osk.toml` (or defaults), then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let margin = self.placement.numeric_edge_margin;
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigError::InvalidMargin(margin));
        }
        self.layout_tables().map(|_| ())
    }

    /// Built-in tables with the `[layouts]` overrides applied.
    pub fn layout_tables(&self) -> Result<LayoutTables, ConfigError> {
        let mut tables = LayoutTables::builtin();
        for (mode, rows) in &self.layouts.modes {
            tables.table.insert(mode, rows.iter().cloned());
        }
        for (token, label) in &self.layouts.display {
            tables.display.insert(token.clone(), label.clone());
        }
        for (mode, entries) in &self.layouts.themes {
            let kind = LayoutKind::from_mode_name(mode)
                .ok_or_else(|| ConfigError::UnknownThemeMode(mode.clone()))?;
            let themes = entries
                .iter()
                .map(|e| ButtonTheme::new(&e.class, &e.buttons))
                .collect();
            tables.themes.insert(kind, themes);
        }

        for kind in LayoutKind::ALL {
            let name = kind.mode_name();
            let Some(rows) = tables.table.rows(name) else {
                return Err(ConfigError::MissingLayout(name.to_string()));
            };
            if rows.iter().all(|row| row.split_whitespace().next().is_none()) {
                return Err(ConfigError::EmptyLayout(name.to_string()));
            }
        }
        Ok(tables)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!(target: "keyboard.config", "ignoring {name}={raw:?}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = KeyboardConfig::default();
        assert_eq!(config.placement.numeric_edge_margin, 250.0);
        assert_eq!(config.timing.focus_debounce_ms, 50);
        assert_eq!(config.timing.blur_grace_ms, 100);
        assert_eq!(config.classes.marker, "keyboard-enabled");
        assert!(config.mount.modal_hosts.iter().any(|h| h == "ha-dialog"));
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = KeyboardConfig::from_toml_str(
            r#"
            [placement]
            numeric_edge_margin = 120.0

            [classes]
            visible = "shown"
            "#,
        )
        .unwrap();
        assert_eq!(config.placement.numeric_edge_margin, 120.0);
        assert_eq!(config.classes.visible, "shown");
        assert_eq!(config.classes.base, "simple-keyboard");
        assert_eq!(config.timing, TimingConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let config = KeyboardConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = KeyboardConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn layout_overrides_replace_modes_and_labels() {
        let config = KeyboardConfig::from_toml_str(
            r#"
            [layouts.modes]
            numeric = ["1 2 3", "{bksp} 0 {hide}"]

            [layouts.display]
            "{hide}" = "close"
            "#,
        )
        .unwrap();
        let tables = config.layout_tables().unwrap();
        assert_eq!(tables.table.tokens("numeric")[0], vec!["1", "2", "3"]);
        assert_eq!(tables.display["{hide}"], "close");
        assert!(tables.table.rows("default").is_some());
    }

    #[test]
    fn empty_layout_is_rejected() {
        let err = KeyboardConfig::from_toml_str(
            r#"
            [layouts.modes]
            shift = ["   "]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLayout(ref m) if m == "shift"));
    }

    #[test]
    fn theme_for_unknown_mode_is_rejected() {
        let err = KeyboardConfig::from_toml_str(
            r#"
            [[layouts.themes.emoji]]
            class = "x"
            buttons = "{space}"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownThemeMode(_)));
    }

    #[test]
    fn negative_margin_is_rejected() {
        let err = KeyboardConfig::from_toml_str("[placement]\nnumeric_edge_margin = -1.0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMargin(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = KeyboardConfig::load_from_file("/nonexistent/osk.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
