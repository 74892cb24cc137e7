//! Style registry
//!
//! Maps semantic style kinds to plain visual attributes. The registry is
//! injected into the renderer; nothing here knows about a UI toolkit, sinks
//! translate [`StyleAttributes`] into whatever their backend draws with.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markdown::{BlockKind, InlineKind};

/// Default base point size
pub const DEFAULT_FONT_SIZE: u16 = 11;

/// Accepted base point sizes
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<u16> = 8..=24;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColor(String),
    #[error("unknown style kind {0:?}")]
    UnknownKind(String),
    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
    #[error("failed to parse style sheet: {0}")]
    Parse(#[from] toml::de::Error),
}

/// 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(StyleError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| StyleError::InvalidColor(s.to_string()))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Semantic style kinds the renderer asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleKind {
    Normal,
    Heading(u8),
    CodeBlock,
    InlineCode,
    Bold,
    Italic,
    BoldItalic,
    Strikethrough,
    Link,
    ListItem,
    Blockquote,
    HorizontalRule,
    SearchHighlight,
}

impl StyleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Heading(1) => "h1",
            Self::Heading(2) => "h2",
            Self::Heading(3) => "h3",
            Self::Heading(_) => "h4",
            Self::CodeBlock => "code_block",
            Self::InlineCode => "inline_code",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::BoldItalic => "bold_italic",
            Self::Strikethrough => "strikethrough",
            Self::Link => "link",
            Self::ListItem => "list_item",
            Self::Blockquote => "blockquote",
            Self::HorizontalRule => "horizontal_rule",
            Self::SearchHighlight => "search_highlight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "h1" => Some(Self::Heading(1)),
            "h2" => Some(Self::Heading(2)),
            "h3" => Some(Self::Heading(3)),
            "h4" => Some(Self::Heading(4)),
            "code_block" => Some(Self::CodeBlock),
            "inline_code" => Some(Self::InlineCode),
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "bold_italic" => Some(Self::BoldItalic),
            "strikethrough" => Some(Self::Strikethrough),
            "link" => Some(Self::Link),
            "list_item" => Some(Self::ListItem),
            "blockquote" => Some(Self::Blockquote),
            "horizontal_rule" => Some(Self::HorizontalRule),
            "search_highlight" => Some(Self::SearchHighlight),
            _ => None,
        }
    }

    /// Block-wide style, if the block kind carries one
    pub fn for_block(kind: &BlockKind) -> Option<Self> {
        match kind {
            BlockKind::Heading(level) => Some(Self::Heading(*level)),
            BlockKind::CodeFence(_) => Some(Self::CodeBlock),
            BlockKind::Blockquote => Some(Self::Blockquote),
            BlockKind::ListItem { .. } => Some(Self::ListItem),
            BlockKind::HorizontalRule => Some(Self::HorizontalRule),
            BlockKind::Paragraph => None,
        }
    }
}

impl From<InlineKind> for StyleKind {
    fn from(kind: InlineKind) -> Self {
        match kind {
            InlineKind::InlineCode => Self::InlineCode,
            InlineKind::Strikethrough => Self::Strikethrough,
            InlineKind::BoldItalic => Self::BoldItalic,
            InlineKind::Bold => Self::Bold,
            InlineKind::Italic => Self::Italic,
            InlineKind::Link => Self::Link,
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual attributes of one style kind
///
/// `indent` is a left margin in character cells; `size` is a point size that
/// sinks without font control may ignore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleAttributes {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
    pub size: Option<u16>,
    pub indent: u16,
}

impl StyleAttributes {
    pub fn fg(mut self, color: Rgb) -> Self {
        self.fg = Some(color);
        self
    }

    pub fn bg(mut self, color: Rgb) -> Self {
        self.bg = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub fn monospace(mut self) -> Self {
        self.monospace = true;
        self
    }

    pub fn size(mut self, size: u16) -> Self {
        self.size = Some(size);
        self
    }

    pub fn indent(mut self, cells: u16) -> Self {
        self.indent = cells;
        self
    }

    /// Layer `top` over `self`: colours and size are replaced when set,
    /// flags accumulate, the wider indent wins
    pub fn overlay(&self, top: &StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            fg: top.fg.or(self.fg),
            bg: top.bg.or(self.bg),
            bold: self.bold || top.bold,
            italic: self.italic || top.italic,
            underline: self.underline || top.underline,
            strikethrough: self.strikethrough || top.strikethrough,
            monospace: self.monospace || top.monospace,
            size: top.size.or(self.size),
            indent: self.indent.max(top.indent),
        }
    }
}

/// A TOML style sheet: optional theme, base size and per-kind overrides
///
/// ```toml
/// theme = "dark"
/// font_size = 12
///
/// [styles.bold]
/// bold = true
/// fg = "#ff8800"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub theme: Option<String>,
    pub font_size: Option<u16>,
    pub styles: BTreeMap<String, StyleAttributes>,
}

/// Kind -> attributes lookup injected into the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRegistry {
    styles: HashMap<StyleKind, StyleAttributes>,
    font_size: u16,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::light()
    }
}

impl StyleRegistry {
    /// Registry with no styles at all; every lookup falls back to defaults
    pub fn empty() -> Self {
        Self {
            styles: HashMap::new(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Light palette for white backgrounds
    pub fn light() -> Self {
        let mut registry = Self::empty();
        let base = DEFAULT_FONT_SIZE;
        let heading_colors = [
            Rgb(0x2E, 0x86, 0xAB),
            Rgb(0xA2, 0x3B, 0x72),
            Rgb(0xF1, 0x8F, 0x01),
            Rgb(0xC7, 0x3E, 0x1D),
        ];
        for (idx, color) in heading_colors.into_iter().enumerate() {
            let level = idx as u8 + 1;
            registry.set(
                StyleKind::Heading(level),
                StyleAttributes::default()
                    .fg(color)
                    .bold()
                    .size(heading_size(base, level)),
            );
        }
        registry.set(
            StyleKind::CodeBlock,
            StyleAttributes::default()
                .fg(Rgb(0x24, 0x29, 0x2e))
                .bg(Rgb(0xf6, 0xf8, 0xfa))
                .monospace()
                .size(base)
                .indent(2),
        );
        registry.set(
            StyleKind::InlineCode,
            StyleAttributes::default()
                .fg(Rgb(0xe1, 0x1d, 0x48))
                .bg(Rgb(0xf3, 0xf4, 0xf6))
                .monospace()
                .size(base - 1),
        );
        registry.set(
            StyleKind::Blockquote,
            StyleAttributes::default()
                .fg(Rgb(0x6a, 0x73, 0x7d))
                .bg(Rgb(0xf8, 0xf9, 0xfa))
                .size(base)
                .indent(2),
        );
        registry.set(
            StyleKind::Link,
            StyleAttributes::default()
                .fg(Rgb(0x03, 0x66, 0xd6))
                .underline()
                .size(base),
        );
        registry.set(
            StyleKind::SearchHighlight,
            StyleAttributes::default()
                .fg(Rgb(0, 0, 0))
                .bg(Rgb(0xff, 0xff, 0x00)),
        );
        registry.insert_plain_kinds(base);
        registry
    }

    /// Dark palette for terminals
    pub fn dark() -> Self {
        let mut registry = Self::empty();
        let base = DEFAULT_FONT_SIZE;
        let heading_colors = [
            Rgb(139, 233, 253),
            Rgb(189, 147, 249),
            Rgb(255, 184, 108),
            Rgb(255, 121, 198),
        ];
        for (idx, color) in heading_colors.into_iter().enumerate() {
            let level = idx as u8 + 1;
            registry.set(
                StyleKind::Heading(level),
                StyleAttributes::default()
                    .fg(color)
                    .bold()
                    .size(heading_size(base, level)),
            );
        }
        registry.set(
            StyleKind::CodeBlock,
            StyleAttributes::default()
                .fg(Rgb(203, 213, 225))
                .bg(Rgb(30, 30, 45))
                .monospace()
                .size(base)
                .indent(2),
        );
        registry.set(
            StyleKind::InlineCode,
            StyleAttributes::default()
                .fg(Rgb(189, 147, 249))
                .bg(Rgb(30, 30, 45))
                .monospace()
                .size(base - 1),
        );
        registry.set(
            StyleKind::Blockquote,
            StyleAttributes::default()
                .fg(Rgb(148, 163, 184))
                .italic()
                .size(base)
                .indent(2),
        );
        registry.set(
            StyleKind::Link,
            StyleAttributes::default()
                .fg(Rgb(139, 233, 253))
                .underline()
                .size(base),
        );
        registry.set(
            StyleKind::SearchHighlight,
            StyleAttributes::default()
                .fg(Rgb(24, 24, 37))
                .bg(Rgb(255, 203, 107)),
        );
        registry.insert_plain_kinds(base);
        registry
    }

    /// Built-in palette by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    /// Build a registry from a TOML style sheet
    pub fn from_toml_str(source: &str) -> Result<Self, StyleError> {
        let sheet: StyleSheet = toml::from_str(source)?;
        Self::from_sheet(&sheet)
    }

    /// Build a registry from a parsed style sheet
    pub fn from_sheet(sheet: &StyleSheet) -> Result<Self, StyleError> {
        let mut registry = match sheet.theme.as_deref() {
            Some(name) => {
                Self::preset(name).ok_or_else(|| StyleError::UnknownTheme(name.to_string()))?
            }
            None => Self::default(),
        };
        if let Some(size) = sheet.font_size {
            registry.set_font_size(size);
        }
        registry.apply_overrides(&sheet.styles)?;
        Ok(registry)
    }

    /// Replace the attributes of each named kind
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, StyleAttributes>,
    ) -> Result<(), StyleError> {
        for (name, attributes) in overrides {
            let kind =
                StyleKind::parse(name).ok_or_else(|| StyleError::UnknownKind(name.clone()))?;
            self.set(kind, attributes.clone());
        }
        Ok(())
    }

    /// Register or replace a kind's attributes
    pub fn set(&mut self, kind: StyleKind, attributes: StyleAttributes) {
        self.styles.insert(kind, attributes);
    }

    pub fn remove(&mut self, kind: StyleKind) -> Option<StyleAttributes> {
        self.styles.remove(&kind)
    }

    pub fn get(&self, kind: StyleKind) -> Option<&StyleAttributes> {
        self.styles.get(&kind)
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Look up `kind`, falling back to `fallback`, then `Normal`, then defaults
    pub fn resolve(&self, kind: StyleKind, fallback: StyleKind) -> StyleAttributes {
        self.styles
            .get(&kind)
            .or_else(|| self.styles.get(&fallback))
            .or_else(|| self.styles.get(&StyleKind::Normal))
            .cloned()
            .unwrap_or_default()
    }

    /// Rescale every registered size from a new base point size
    ///
    /// Returns false and leaves the registry untouched when `base` is outside
    /// [`FONT_SIZE_RANGE`].
    pub fn set_font_size(&mut self, base: u16) -> bool {
        if !FONT_SIZE_RANGE.contains(&base) {
            tracing::warn!(
                size = base,
                min = *FONT_SIZE_RANGE.start(),
                max = *FONT_SIZE_RANGE.end(),
                "Font size out of range, ignoring"
            );
            return false;
        }
        self.font_size = base;
        for (kind, attributes) in self.styles.iter_mut() {
            if attributes.size.is_none() {
                continue;
            }
            attributes.size = Some(match kind {
                StyleKind::Heading(level) => heading_size(base, *level),
                StyleKind::InlineCode => base - 1,
                _ => base,
            });
        }
        true
    }

    fn insert_plain_kinds(&mut self, base: u16) {
        self.set(StyleKind::Normal, StyleAttributes::default().size(base));
        self.set(StyleKind::HorizontalRule, StyleAttributes::default().size(base));
        self.set(StyleKind::Bold, StyleAttributes::default().bold().size(base));
        self.set(StyleKind::Italic, StyleAttributes::default().italic().size(base));
        self.set(
            StyleKind::BoldItalic,
            StyleAttributes::default().bold().italic().size(base),
        );
        self.set(
            StyleKind::Strikethrough,
            StyleAttributes::default().strikethrough().size(base),
        );
        self.set(StyleKind::ListItem, StyleAttributes::default().indent(2));
    }
}

fn heading_size(base: u16, level: u8) -> u16 {
    match level {
        1 => base + 6,
        2 => base + 4,
        3 => base + 2,
        _ => base + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_parse_and_display() {
        assert_eq!("#2E86AB".parse::<Rgb>().unwrap(), Rgb(0x2E, 0x86, 0xAB));
        assert_eq!("0366d6".parse::<Rgb>().unwrap(), Rgb(0x03, 0x66, 0xd6));
        assert_eq!(Rgb(255, 0, 16).to_string(), "#ff0010");
        assert!(matches!(
            "#12345".parse::<Rgb>(),
            Err(StyleError::InvalidColor(_))
        ));
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert!("#ééé".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_kind_names_round_trip() {
        let kinds = [
            StyleKind::Normal,
            StyleKind::Heading(1),
            StyleKind::Heading(4),
            StyleKind::CodeBlock,
            StyleKind::InlineCode,
            StyleKind::BoldItalic,
            StyleKind::SearchHighlight,
        ];
        for kind in kinds {
            assert_eq!(StyleKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StyleKind::parse("h5"), None);
    }

    #[test]
    fn test_resolve_falls_back() {
        let mut registry = StyleRegistry::light();
        registry.remove(StyleKind::Bold);
        let quote = registry.get(StyleKind::Blockquote).cloned().unwrap();
        assert_eq!(
            registry.resolve(StyleKind::Bold, StyleKind::Blockquote),
            quote
        );

        let normal = registry.get(StyleKind::Normal).cloned().unwrap();
        assert_eq!(registry.resolve(StyleKind::Bold, StyleKind::Bold), normal);

        let empty = StyleRegistry::empty();
        assert_eq!(
            empty.resolve(StyleKind::Link, StyleKind::Normal),
            StyleAttributes::default()
        );
    }

    #[test]
    fn test_set_font_size_rescales() {
        let mut registry = StyleRegistry::light();
        assert!(registry.set_font_size(14));
        assert_eq!(registry.font_size(), 14);
        assert_eq!(registry.get(StyleKind::Heading(1)).unwrap().size, Some(20));
        assert_eq!(registry.get(StyleKind::Heading(4)).unwrap().size, Some(15));
        assert_eq!(registry.get(StyleKind::InlineCode).unwrap().size, Some(13));
        assert_eq!(registry.get(StyleKind::Bold).unwrap().size, Some(14));
        // Kinds without a size stay without one
        assert_eq!(registry.get(StyleKind::ListItem).unwrap().size, None);
    }

    #[test]
    fn test_set_font_size_rejects_out_of_range() {
        let mut registry = StyleRegistry::light();
        let before = registry.clone();
        assert!(!registry.set_font_size(7));
        assert!(!registry.set_font_size(25));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_overlay() {
        let base = StyleAttributes::default().fg(Rgb(1, 1, 1)).indent(2);
        let top = StyleAttributes::default().bold().bg(Rgb(2, 2, 2));
        let merged = base.overlay(&top);
        assert_eq!(merged.fg, Some(Rgb(1, 1, 1)));
        assert_eq!(merged.bg, Some(Rgb(2, 2, 2)));
        assert!(merged.bold);
        assert_eq!(merged.indent, 2);
    }

    #[test]
    fn test_style_sheet_from_toml() {
        let source = r##"
            theme = "dark"
            font_size = 12

            [styles.bold]
            bold = true
            fg = "#ff8800"

            [styles.h2]
            underline = true
        "##;
        let registry = StyleRegistry::from_toml_str(source).unwrap();
        assert_eq!(registry.font_size(), 12);
        let bold = registry.get(StyleKind::Bold).unwrap();
        assert!(bold.bold);
        assert_eq!(bold.fg, Some(Rgb(0xff, 0x88, 0x00)));
        let h2 = registry.get(StyleKind::Heading(2)).unwrap();
        assert!(h2.underline);
        assert!(!h2.bold);
        // Untouched kinds keep the dark palette, rescaled
        let link = registry.get(StyleKind::Link).unwrap();
        assert_eq!(link.fg, Some(Rgb(139, 233, 253)));
        assert_eq!(link.size, Some(12));
    }

    #[test]
    fn test_style_sheet_errors() {
        assert!(matches!(
            StyleRegistry::from_toml_str("theme = \"neon\""),
            Err(StyleError::UnknownTheme(_))
        ));
        assert!(matches!(
            StyleRegistry::from_toml_str("[styles.h9]\nbold = true"),
            Err(StyleError::UnknownKind(_))
        ));
        assert!(matches!(
            StyleRegistry::from_toml_str("[styles.bold]\nfg = \"red\""),
            Err(StyleError::Parse(_))
        ));
    }
}
