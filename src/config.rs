use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::parse::Syntax;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub syntax: Syntax,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Prompt templates, formatted against the shell environment.
#[derive(Debug, Deserialize, Serialize)]
pub struct PromptConfig {
    #[serde(default = "default_primary")]
    pub primary: String,
    /// Shown while a statement, quote or continuation is still open.
    #[serde(default = "default_continuation")]
    pub continuation: String,
}

fn default_primary() -> String {
    "$ ".into()
}

fn default_continuation() -> String {
    "> ".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            continuation: default_continuation(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    /// One of off, error, warn, info, debug, trace.
    #[serde(default)]
    pub level: String,
    /// Log file; `~` is expanded. Empty disables file logging.
    #[serde(default)]
    pub file: String,
}

impl LoggingConfig {
    /// The configured level, or `Warn` when unset or unrecognized.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Warn)
    }

    /// The log file with `~` expanded, if one is configured.
    pub fn file_path(&self) -> Option<PathBuf> {
        if self.file.trim().is_empty() {
            return None;
        }
        Some(PathBuf::from(shellexpand::tilde(&self.file).into_owned()))
    }
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    prompt: PromptOverlay,
    #[serde(default)]
    syntax: SyntaxOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct PromptOverlay {
    primary: Option<String>,
    continuation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SyntaxOverlay {
    whitespace: Option<String>,
    separators: Option<String>,
    escape: Option<char>,
    double_quote: Option<char>,
    single_quote: Option<char>,
    comment: Option<char>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

// ── Merge logic ──

/// Replace `base` when the overlay sets a value.
fn merge<T>(base: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *base = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/lineshell/config.toml (if exists)
    ///
    /// Every overlay field is a scalar that overrides its default; fields
    /// left out keep the default.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/lineshell/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/lineshell/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("lineshell: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let p = overlay.prompt;
        merge(&mut self.prompt.primary, p.primary);
        merge(&mut self.prompt.continuation, p.continuation);

        let s = overlay.syntax;
        merge(&mut self.syntax.whitespace, s.whitespace);
        merge(&mut self.syntax.separators, s.separators);
        merge(&mut self.syntax.escape, s.escape);
        merge(&mut self.syntax.double_quote, s.double_quote);
        merge(&mut self.syntax.single_quote, s.single_quote);
        merge(&mut self.syntax.comment, s.comment);

        let l = overlay.logging;
        merge(&mut self.logging.level, l.level);
        merge(&mut self.logging.file, l.file);
    }

    /// Render the merged configuration as TOML (for --dump-config).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
