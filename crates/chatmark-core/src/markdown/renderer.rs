//! Span rendering
//!
//! Writes a [`RenderedDocument`] (or the raw buffer, in plain mode) into a
//! [`DisplaySink`] and tags every styled byte range. Each call is a full
//! clear-and-rebuild; there is no patch mode.

use regex::Regex;

use super::elements::RenderedDocument;
use crate::sink::DisplaySink;
use crate::style::{StyleKind, StyleRegistry};

/// Drives a sink from a document and a style registry
pub struct Renderer<'a> {
    styles: &'a StyleRegistry,
    highlight: Option<&'a Regex>,
}

impl<'a> Renderer<'a> {
    pub fn new(styles: &'a StyleRegistry) -> Self {
        Self {
            styles,
            highlight: None,
        }
    }

    /// Also tag every match of `pattern` in the written text
    pub fn with_highlight(mut self, pattern: Option<&'a Regex>) -> Self {
        self.highlight = pattern;
        self
    }

    /// Rebuild the sink from a segmented, formatted document
    pub fn markdown<S: DisplaySink + ?Sized>(&self, doc: &RenderedDocument, sink: &mut S) {
        sink.clear();
        let mut written = String::new();

        for block in &doc.blocks {
            if block.emits_line() {
                let start = written.len();
                sink.insert(&block.text);
                sink.insert("\n");
                written.push_str(&block.text);
                written.push('\n');

                let block_kind = StyleKind::for_block(&block.kind);
                if let Some(kind) = block_kind {
                    let style = self.styles.resolve(kind, StyleKind::Normal);
                    sink.tag(start..written.len(), kind, &style);
                }

                let fallback = block_kind.unwrap_or(StyleKind::Normal);
                for span in &block.spans {
                    let kind = StyleKind::from(span.kind);
                    let style = self.styles.resolve(kind, fallback);
                    sink.tag(start + span.start..start + span.end, kind, &style);
                }
            }

            for _ in 0..block.blank_lines_after {
                sink.insert("\n");
                written.push('\n');
            }
        }

        self.tag_highlights(&written, sink);
        tracing::trace!(
            blocks = doc.blocks.len(),
            bytes = written.len(),
            "rendered markdown"
        );
        sink.finish();
    }

    /// Rebuild the sink with the raw text and one uniform style
    pub fn plain<S: DisplaySink + ?Sized>(&self, raw: &str, sink: &mut S) {
        sink.clear();
        sink.insert(raw);
        let style = self.styles.resolve(StyleKind::Normal, StyleKind::Normal);
        sink.tag(0..raw.len(), StyleKind::Normal, &style);
        self.tag_highlights(raw, sink);
        sink.finish();
    }

    fn tag_highlights<S: DisplaySink + ?Sized>(&self, text: &str, sink: &mut S) {
        let Some(pattern) = self.highlight else {
            return;
        };
        let style = self
            .styles
            .resolve(StyleKind::SearchHighlight, StyleKind::Normal);
        for found in pattern.find_iter(text) {
            sink.tag(found.range(), StyleKind::SearchHighlight, &style);
        }
    }
}
