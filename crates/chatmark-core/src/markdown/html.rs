//! HTML export
//!
//! Best-effort structural mapping of segmented blocks and inline spans to
//! HTML. Works from the raw buffer, independent of the active render mode.

use super::build_document;
use super::elements::{BlockKind, InlineKind, InlineSpan, RenderedBlock};
use super::parser::BULLET;

/// Export the raw buffer as an HTML fragment
pub fn to_html(raw: &str) -> String {
    let doc = build_document(raw);
    let mut out = HtmlBuilder::default();

    for block in &doc.blocks {
        match &block.kind {
            BlockKind::Paragraph => {
                out.close_list();
                if block.text.trim().is_empty() {
                    out.close_paragraph();
                } else {
                    out.paragraph.push(inline_html(&block.text, &block.spans, 0));
                }
            }
            BlockKind::ListItem { ordered } => {
                out.close_paragraph();
                let body_start = list_body_start(&block.text, *ordered);
                out.list_item(
                    *ordered,
                    list_number(&block.text),
                    inline_html(&block.text, &block.spans, body_start),
                );
            }
            kind => {
                out.close_paragraph();
                out.close_list();
                out.parts.push(block_html(kind, block));
            }
        }

        if block.blank_lines_after > 0 {
            out.close_paragraph();
            out.close_list();
        }
    }

    out.finish()
}

#[derive(Default)]
struct HtmlBuilder {
    parts: Vec<String>,
    paragraph: Vec<String>,
    /// (ordered, first number, items)
    list: Option<(bool, Option<u64>, Vec<String>)>,
}

impl HtmlBuilder {
    fn close_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let lines = std::mem::take(&mut self.paragraph);
            self.parts.push(format!("<p>{}</p>", lines.join("<br>")));
        }
    }

    fn list_item(&mut self, ordered: bool, number: Option<u64>, item: String) {
        if matches!(&self.list, Some((open_ordered, _, _)) if *open_ordered != ordered) {
            self.close_list();
        }
        let (_, _, items) = self.list.get_or_insert_with(|| (ordered, number, Vec::new()));
        items.push(format!("<li>{}</li>", item));
    }

    fn close_list(&mut self) {
        let Some((ordered, number, items)) = self.list.take() else {
            return;
        };
        let open = match (ordered, number) {
            (true, Some(start)) if start != 1 => format!("<ol start=\"{}\">", start),
            (true, _) => "<ol>".to_string(),
            (false, _) => "<ul>".to_string(),
        };
        let close = if ordered { "</ol>" } else { "</ul>" };
        self.parts
            .push(format!("{}\n{}\n{}", open, items.join("\n"), close));
    }

    fn finish(mut self) -> String {
        self.close_paragraph();
        self.close_list();
        self.parts.join("\n")
    }
}

fn block_html(kind: &BlockKind, block: &RenderedBlock) -> String {
    match kind {
        BlockKind::Heading(level) => {
            format!("<h{level}>{}</h{level}>", escape(&block.text))
        }
        BlockKind::CodeFence(Some(lang)) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape(lang),
            escape(&block.text)
        ),
        BlockKind::CodeFence(None) => format!("<pre><code>{}</code></pre>", escape(&block.text)),
        BlockKind::Blockquote => {
            let lines: Vec<String> = block.text.split('\n').map(escape).collect();
            format!("<blockquote>{}</blockquote>", lines.join("<br>"))
        }
        BlockKind::HorizontalRule => "<hr>".to_string(),
        // Paragraphs and list items are grouped by the caller
        BlockKind::Paragraph | BlockKind::ListItem { .. } => {
            format!("<p>{}</p>", inline_html(&block.text, &block.spans, 0))
        }
    }
}

/// Escaped text from `from` onward, with spans turned into tags
fn inline_html(text: &str, spans: &[InlineSpan], from: usize) -> String {
    let mut out = String::new();
    let mut cursor = from;

    for span in spans.iter().filter(|span| span.start >= from) {
        out.push_str(&escape(&text[cursor..span.start]));
        let inner = escape(&text[span.start..span.end]);
        match span.kind {
            InlineKind::InlineCode => out.push_str(&format!("<code>{}</code>", inner)),
            InlineKind::Strikethrough => out.push_str(&format!("<del>{}</del>", inner)),
            InlineKind::BoldItalic => {
                out.push_str(&format!("<strong><em>{}</em></strong>", inner))
            }
            InlineKind::Bold => out.push_str(&format!("<strong>{}</strong>", inner)),
            InlineKind::Italic => out.push_str(&format!("<em>{}</em>", inner)),
            InlineKind::Link => {
                let href = span.href.as_deref().unwrap_or_default();
                out.push_str(&format!("<a href=\"{}\">{}</a>", escape(href), inner))
            }
        }
        cursor = span.end;
    }

    out.push_str(&escape(&text[cursor..]));
    out
}

/// Byte offset where a list item's body starts, after indent and marker
fn list_body_start(text: &str, ordered: bool) -> usize {
    let indent = text.len() - text.trim_start().len();
    let rest = &text[indent..];
    let marker = if ordered {
        rest.find('.').map(|dot| dot + 1)
    } else {
        rest.strip_prefix(BULLET).map(|_| BULLET.len_utf8())
    }
    .unwrap_or(0);
    let after = &rest[marker..];
    indent + marker + (after.len() - after.trim_start().len())
}

fn list_number(text: &str) -> Option<u64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
