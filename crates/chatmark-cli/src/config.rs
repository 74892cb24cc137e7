//! User configuration
//!
//! Loaded from `--config` or `<config dir>/chatmark/config.toml`. A missing
//! default file means defaults; a missing explicit file is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chatmark_core::style::StyleSheet;
use chatmark_core::{RenderMode, StyleAttributes, StyleRegistry};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Built-in palette name ("light" or "dark")
    pub theme: Option<String>,
    /// Base point size, 8..=24
    pub font_size: Option<u16>,
    /// Mode used by `render` and at `stream` start
    pub mode: RenderMode,
    pub stream: StreamConfig,
    /// Per-kind overrides, keyed by style kind name
    pub styles: BTreeMap<String, StyleAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Characters per chunk
    pub chunk_size: usize,
    /// Pause between chunks
    pub delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8,
            delay_ms: 30,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chatmark").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => {
                    tracing::debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&source)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Style registry for this config's theme, size and overrides
    pub fn style_registry(&self) -> Result<StyleRegistry> {
        let sheet = StyleSheet {
            theme: self.theme.clone(),
            font_size: self.font_size,
            styles: self.styles.clone(),
        };
        StyleRegistry::from_sheet(&sheet).context("invalid style configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmark_core::{Rgb, StyleKind};
    use std::io::Write;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"
theme = "dark"
font_size = 14
mode = "plain_text"

[stream]
chunk_size = 3

[styles.link]
fg = "#112233"
underline = true
"##
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.mode, RenderMode::PlainText);
        assert_eq!(config.stream.chunk_size, 3);
        assert_eq!(config.stream.delay_ms, 30);

        let registry = config.style_registry().unwrap();
        assert_eq!(registry.font_size(), 14);
        assert_eq!(
            registry.get(StyleKind::Link).unwrap().fg,
            Some(Rgb(0x11, 0x22, 0x33))
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.mode, RenderMode::Markdown);
        assert_eq!(config.style_registry().unwrap(), StyleRegistry::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_bad_style_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[styles.sparkle]\nbold = true\n").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.style_registry().is_err());
    }
}
