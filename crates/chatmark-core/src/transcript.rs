//! Markdown transcript
//!
//! Owns the raw buffer of a streamed conversation and re-renders it into a
//! [`DisplaySink`] on request. Appending never renders; the host decides when.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::markdown::{self, build_document, RenderMode, RenderedDocument, Renderer};
use crate::sink::DisplaySink;
use crate::style::{StyleAttributes, StyleKind, StyleRegistry};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One match in the raw buffer (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Canned snippets that can be appended to the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    CodeBlock,
    Quote,
    List,
    NumberedList,
    Link,
    HorizontalRule,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CodeBlock => "code_block",
            Self::Quote => "quote",
            Self::List => "list",
            Self::NumberedList => "numbered_list",
            Self::Link => "link",
            Self::HorizontalRule => "horizontal_rule",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "code_block" => Some(Self::CodeBlock),
            "quote" => Some(Self::Quote),
            "list" => Some(Self::List),
            "numbered_list" => Some(Self::NumberedList),
            "link" => Some(Self::Link),
            "horizontal_rule" => Some(Self::HorizontalRule),
            _ => None,
        }
    }

    pub fn snippet(&self) -> &'static str {
        match self {
            Self::CodeBlock => "\n```python\n# your code here\nprint('Hello, World!')\n```\n",
            Self::Quote => "\n> A quoted block\n> spanning several lines\n",
            Self::List => "\n- Item 1\n- Item 2\n- Item 3\n",
            Self::NumberedList => "\n1. First\n2. Second\n3. Third\n",
            Self::Link => "[link text](https://example.com)",
            Self::HorizontalRule => "\n---\n",
        }
    }
}

/// A chat transcript rendered through a display sink
pub struct MarkdownTranscript<S: DisplaySink> {
    raw: String,
    styles: StyleRegistry,
    sink: S,
    mode: RenderMode,
    highlight: Option<Regex>,
    /// Parsed form of `raw`; dropped on every mutation of the buffer
    document: Option<RenderedDocument>,
}

impl<S: DisplaySink> MarkdownTranscript<S> {
    pub fn new(sink: S, styles: StyleRegistry) -> Self {
        Self {
            raw: String::new(),
            styles,
            sink,
            mode: RenderMode::default(),
            highlight: None,
            document: None,
        }
    }

    /// Append `text` followed by a newline
    pub fn append(&mut self, text: &str) {
        self.append_with(text, "\n");
    }

    /// Append `text` followed by `terminator`; streamed chunks use `""`
    pub fn append_with(&mut self, text: &str, terminator: &str) {
        self.raw.push_str(text);
        self.raw.push_str(terminator);
        self.document = None;
    }

    /// Append and render in one step
    pub fn append_and_render(&mut self, text: &str, mode: RenderMode) {
        self.append(text);
        self.render(mode);
    }

    pub fn set_content(&mut self, text: &str) {
        self.raw.clear();
        self.raw.push_str(text);
        self.document = None;
    }

    pub fn content(&self) -> &str {
        &self.raw
    }

    /// Mode of the last render
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Rebuild the sink from the raw buffer
    pub fn render(&mut self, mode: RenderMode) {
        self.mode = mode;
        let renderer = Renderer::new(&self.styles).with_highlight(self.highlight.as_ref());
        match mode {
            RenderMode::Markdown => {
                let doc = self
                    .document
                    .get_or_insert_with(|| build_document(&self.raw));
                renderer.markdown(doc, &mut self.sink);
            }
            RenderMode::PlainText => renderer.plain(&self.raw, &mut self.sink),
        }
        tracing::debug!(mode = %mode, bytes = self.raw.len(), "rendered transcript");
    }

    /// Re-render in `mode`; the raw buffer is untouched
    pub fn switch_render_mode(&mut self, mode: RenderMode) {
        self.render(mode);
    }

    /// Empty the raw buffer and the sink
    pub fn clear(&mut self) {
        self.raw.clear();
        self.document = None;
        self.sink.clear();
        self.sink.finish();
    }

    pub fn export_as_html(&self) -> String {
        markdown::html::to_html(&self.raw)
    }

    /// The text as Markdown mode renders it, not the raw buffer with markup characters removed
    pub fn export_as_plain(&self) -> String {
        match &self.document {
            Some(doc) => doc.to_text(),
            None => build_document(&self.raw).to_text(),
        }
    }

    /// Replace one kind's attributes; applies on the next render
    pub fn update_style(&mut self, kind: StyleKind, attributes: StyleAttributes) {
        self.styles.set(kind, attributes);
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleRegistry {
        &mut self.styles
    }

    pub fn set_styles(&mut self, styles: StyleRegistry) {
        self.styles = styles;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Number of `\n`-separated lines; an empty buffer has one
    pub fn line_count(&self) -> usize {
        self.raw.split('\n').count()
    }

    pub fn word_count(&self) -> usize {
        WORD.find_iter(&self.raw).count()
    }

    /// Character (not byte) count
    pub fn char_count(&self, include_spaces: bool) -> usize {
        if include_spaces {
            self.raw.chars().count()
        } else {
            self.raw.chars().filter(|c| !c.is_whitespace()).count()
        }
    }

    /// Regex search over the raw buffer
    pub fn search(
        &self,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Vec<SearchMatch>, SearchError> {
        let regex = compile(pattern, case_sensitive)?;
        Ok(regex
            .find_iter(&self.raw)
            .map(|found| SearchMatch {
                start: found.start(),
                end: found.end(),
                text: found.as_str().to_string(),
            })
            .collect())
    }

    /// Tag matches of `pattern` in the rendered text from the next render on
    pub fn highlight(&mut self, pattern: &str, case_sensitive: bool) -> Result<(), SearchError> {
        self.highlight = Some(compile(pattern, case_sensitive)?);
        Ok(())
    }

    pub fn clear_highlights(&mut self) {
        self.highlight = None;
    }

    /// Append a canned snippet and re-render in the current mode
    pub fn insert_template(&mut self, template: Template) {
        self.append_with(template.snippet(), "");
        self.render(self.mode);
    }
}

fn compile(pattern: &str, case_sensitive: bool) -> Result<Regex, SearchError> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()?)
}
