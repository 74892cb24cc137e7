//! ANSI escape output for `chatmark render`

use std::io::{self, Write};
use std::ops::Range;

use chatmark_core::{BufferSink, DisplaySink, Rgb, StyleAttributes, StyleKind};
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};

use super::styled_lines;

/// Sink that writes the last rebuild as ANSI-styled text
#[derive(Debug, Default)]
pub struct AnsiSink {
    buffer: BufferSink,
}

impl AnsiSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the current content, one terminal line per rendered line
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for line in styled_lines(&self.buffer) {
            if line.indent > 0 {
                queue!(out, Print(" ".repeat(line.indent as usize)))?;
            }
            for (text, style) in &line.segments {
                write_segment(out, text, style)?;
            }
            queue!(out, Print("\n"))?;
        }
        out.flush()
    }
}

fn write_segment<W: Write>(out: &mut W, text: &str, style: &StyleAttributes) -> io::Result<()> {
    if *style == StyleAttributes::default() {
        return queue!(out, Print(text));
    }
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(color(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(color(bg)))?;
    }
    let attributes = [
        (style.bold, Attribute::Bold),
        (style.italic, Attribute::Italic),
        (style.underline, Attribute::Underlined),
        (style.strikethrough, Attribute::CrossedOut),
    ];
    for (enabled, attribute) in attributes {
        if enabled {
            queue!(out, SetAttribute(attribute))?;
        }
    }
    queue!(out, Print(text), SetAttribute(Attribute::Reset), ResetColor)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.0,
        g: rgb.1,
        b: rgb.2,
    }
}

impl DisplaySink for AnsiSink {
    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert(text);
    }

    fn tag(&mut self, range: Range<usize>, kind: StyleKind, style: &StyleAttributes) {
        self.buffer.tag(range, kind, style);
    }

    fn finish(&mut self) {
        self.buffer.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmark_core::{MarkdownTranscript, RenderMode, StyleRegistry};

    fn render(raw: &str, mode: RenderMode) -> String {
        let mut transcript = MarkdownTranscript::new(AnsiSink::new(), StyleRegistry::default());
        transcript.set_content(raw);
        transcript.render(mode);
        let mut out = Vec::new();
        transcript.sink().write_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bold_is_escaped() {
        let out = render("a **b** c", RenderMode::Markdown);
        assert!(out.contains("\x1b[1m"));
        assert!(out.contains('b'));
        assert!(!out.contains("**"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_heading_colour() {
        let out = render("# T", RenderMode::Markdown);
        assert!(out.contains("\x1b[38;2;46;134;171m"));
    }

    #[test]
    fn test_unstyled_text_passes_through() {
        let styles = StyleRegistry::empty();
        let mut transcript = MarkdownTranscript::new(AnsiSink::new(), styles);
        transcript.set_content("just text\nmore");
        transcript.render(RenderMode::PlainText);
        let mut out = Vec::new();
        transcript.sink().write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "just text\nmore\n");
    }
}
