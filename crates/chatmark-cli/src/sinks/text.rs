//! ratatui `Text` output for the stream view

use std::ops::Range;

use chatmark_core::{BufferSink, DisplaySink, Rgb, StyleAttributes, StyleKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use super::styled_lines;

/// Sink that rebuilds a ratatui [`Text`] after every render
#[derive(Debug, Default)]
pub struct TextSink {
    buffer: BufferSink,
    text: Text<'static>,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &Text<'static> {
        &self.text
    }

    /// Bytes of rendered text
    pub fn rendered_bytes(&self) -> usize {
        self.buffer.text().len()
    }

    fn rebuild(&mut self) {
        let lines: Vec<Line<'static>> = styled_lines(&self.buffer)
            .into_iter()
            .map(|line| {
                let mut spans = Vec::with_capacity(line.segments.len() + 1);
                if line.indent > 0 {
                    spans.push(Span::raw(" ".repeat(line.indent as usize)));
                }
                spans.extend(
                    line.segments
                        .into_iter()
                        .map(|(text, attributes)| Span::styled(text, style(&attributes))),
                );
                Line::from(spans)
            })
            .collect();
        self.text = Text::from(lines);
    }
}

fn style(attributes: &StyleAttributes) -> Style {
    let mut style = Style::default();
    if let Some(fg) = attributes.fg {
        style = style.fg(color(fg));
    }
    if let Some(bg) = attributes.bg {
        style = style.bg(color(bg));
    }
    let modifiers = [
        (attributes.bold, Modifier::BOLD),
        (attributes.italic, Modifier::ITALIC),
        (attributes.underline, Modifier::UNDERLINED),
        (attributes.strikethrough, Modifier::CROSSED_OUT),
    ];
    for (enabled, modifier) in modifiers {
        if enabled {
            style = style.add_modifier(modifier);
        }
    }
    style
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

impl DisplaySink for TextSink {
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
        self.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmark_core::{MarkdownTranscript, RenderMode, StyleRegistry};

    #[test]
    fn test_text_rebuilt_on_render() {
        let mut transcript = MarkdownTranscript::new(TextSink::new(), StyleRegistry::default());
        transcript.set_content("# Title\n- ~~gone~~");
        transcript.render(RenderMode::Markdown);

        let text = transcript.sink().text();
        assert_eq!(text.lines.len(), 2);
        let heading = &text.lines[0].spans[0];
        assert_eq!(heading.content, "Title");
        assert_eq!(heading.style.fg, Some(Color::Rgb(0x2E, 0x86, 0xAB)));
        assert!(heading.style.add_modifier.contains(Modifier::BOLD));

        let item = &text.lines[1];
        assert_eq!(item.spans[0].content, "  ");
        let struck = item
            .spans
            .iter()
            .find(|span| span.content == "gone")
            .unwrap();
        assert!(struck.style.add_modifier.contains(Modifier::CROSSED_OUT));
    }

    #[test]
    fn test_clear_empties_text() {
        let mut transcript = MarkdownTranscript::new(TextSink::new(), StyleRegistry::default());
        transcript.append_and_render("hello", RenderMode::Markdown);
        assert_eq!(transcript.sink().text().lines.len(), 1);
        transcript.clear();
        assert!(transcript.sink().text().lines.is_empty());
        assert_eq!(transcript.sink().rendered_bytes(), 0);
    }
}
