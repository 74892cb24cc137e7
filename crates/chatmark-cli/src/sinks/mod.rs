//! Terminal display sinks
//!
//! Both sinks record into a [`BufferSink`] and convert its merged style runs
//! into terminal lines once a rebuild finishes.

mod ansi;
mod text;

pub use ansi::AnsiSink;
pub use text::TextSink;

use chatmark_core::{BufferSink, StyleAttributes};

/// One output line: left margin plus styled segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub indent: u16,
    pub segments: Vec<(String, StyleAttributes)>,
}

/// Split a buffer's style runs into lines
///
/// A line's indent is the widest indent of any text run on it. The newline that
/// ends the buffer does not open an extra line.
pub fn styled_lines(buffer: &BufferSink) -> Vec<StyledLine> {
    let text = buffer.text();
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![StyledLine::default()];
    for (range, style) in buffer.runs() {
        for (idx, piece) in text[range].split('\n').enumerate() {
            if idx > 0 {
                lines.push(StyledLine::default());
            }
            let Some(line) = lines.last_mut() else {
                continue;
            };
            if !piece.is_empty() {
                line.indent = line.indent.max(style.indent);
                line.segments.push((piece.to_string(), style.clone()));
            }
        }
    }

    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmark_core::markdown::Renderer;
    use chatmark_core::{build_document, StyleKind, StyleRegistry};

    fn buffer(raw: &str) -> BufferSink {
        let styles = StyleRegistry::default();
        let mut sink = BufferSink::new();
        Renderer::new(&styles).markdown(&build_document(raw), &mut sink);
        sink
    }

    #[test]
    fn test_lines_follow_newlines() {
        let lines = styled_lines(&buffer("# Title\n\nSome **bold**"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].segments[0].0, "Title");
        assert!(lines[1].segments.is_empty());
        let text: Vec<&str> = lines[2].segments.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(text, vec!["Some ", "bold"]);
        assert!(lines[2].segments[1].1.bold);
    }

    #[test]
    fn test_indent_comes_from_block_style() {
        let styles = StyleRegistry::default();
        let quote_indent = styles.get(StyleKind::Blockquote).unwrap().indent;
        let lines = styled_lines(&buffer("> a\n> b\nplain"));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].indent, quote_indent);
        assert_eq!(lines[1].indent, quote_indent);
        assert_eq!(lines[2].indent, 0);
    }

    #[test]
    fn test_empty_buffer_has_no_lines() {
        assert!(styled_lines(&BufferSink::new()).is_empty());
    }
}
