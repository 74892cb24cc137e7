//! Markdown subset for chat transcripts
//!
//! Block segmentation, inline formatting, span rendering and HTML export.
//! Everything is a pure function of the raw text except the renderer, which
//! drives a [`DisplaySink`](crate::sink::DisplaySink).

use std::fmt;

use serde::{Deserialize, Serialize};

mod elements;
pub mod html;
pub mod inline;
pub mod parser;
pub mod renderer;

pub use elements::{
    Block, BlockKind, InlineKind, InlineSpan, RenderedBlock, RenderedDocument,
};
pub use inline::{format_inline, Formatted};
pub use parser::segment;
pub use renderer::Renderer;

/// How the transcript is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Markdown,
    PlainText,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Markdown => Self::PlainText,
            Self::PlainText => Self::Markdown,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Markdown => write!(f, "Markdown"),
            RenderMode::PlainText => write!(f, "Plain text"),
        }
    }
}

/// Segment and format the whole buffer
///
/// This is the single entry point the renderer and the exporters share; an
/// incremental strategy would replace this function and nothing else.
pub fn build_document(raw: &str) -> RenderedDocument {
    let blocks = segment(raw)
        .into_iter()
        .map(|block| {
            let text = block.text();
            let (text, spans) = if block.kind.takes_inline_formatting() {
                let formatted = format_inline(&text);
                (formatted.text, formatted.spans)
            } else {
                (text, Vec::new())
            };
            RenderedBlock {
                kind: block.kind,
                text,
                spans,
                blank_lines_after: block.blank_lines_after,
            }
        })
        .collect();
    RenderedDocument { blocks }
}
