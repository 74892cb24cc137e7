//! Markdown element types

/// Block-level classification of a run of lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Single-line heading, level 1-4
    Heading(u8),
    /// Fenced code block with optional language tag
    CodeFence(Option<String>),
    /// Run of consecutive `>` lines
    Blockquote,
    /// Single list line (bullet or numbered)
    ListItem { ordered: bool },
    /// Thematic break, rendered as a fixed rule
    HorizontalRule,
    /// Anything else, one block per line
    Paragraph,
}

impl BlockKind {
    /// Whether the inline formatter runs over this block's content
    pub fn takes_inline_formatting(&self) -> bool {
        matches!(self, Self::Paragraph | Self::ListItem { .. })
    }
}

/// A segmented block of the raw buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Display lines, markers already stripped / normalized
    pub lines: Vec<String>,
    /// Byte offset of the block's first source line in the raw buffer
    pub start_offset: usize,
    /// Blank separator lines that followed this block in the source
    pub blank_lines_after: usize,
}

impl Block {
    pub(crate) fn new(kind: BlockKind, lines: Vec<String>, start_offset: usize) -> Self {
        Self {
            kind,
            lines,
            start_offset,
            blank_lines_after: 0,
        }
    }

    /// Content lines joined the way they are displayed
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Inline construct kinds, in pass order (highest precedence first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineKind {
    InlineCode,
    Strikethrough,
    BoldItalic,
    Bold,
    Italic,
    Link,
}

/// A styled range of a formatted line
///
/// Offsets are bytes into the delimiter-stripped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub start: usize,
    pub end: usize,
    pub kind: InlineKind,
    /// Link target; only set for [`InlineKind::Link`]
    pub href: Option<String>,
}

impl InlineSpan {
    pub fn new(start: usize, end: usize, kind: InlineKind) -> Self {
        Self {
            start,
            end,
            kind,
            href: None,
        }
    }

    /// Half-open overlap test; adjacent spans do not overlap
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// One block after inline formatting, ready for a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub kind: BlockKind,
    /// Display text without the trailing line terminator
    pub text: String,
    pub spans: Vec<InlineSpan>,
    pub blank_lines_after: usize,
}

impl RenderedBlock {
    /// Empty code fences emit no line at all
    pub fn emits_line(&self) -> bool {
        !(self.text.is_empty() && matches!(self.kind, BlockKind::CodeFence(_)))
    }
}

/// The whole buffer, segmented and formatted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub blocks: Vec<RenderedBlock>,
}

impl RenderedDocument {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Concatenated display text, exactly as the renderer writes it
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            if block.emits_line() {
                out.push_str(&block.text);
                out.push('\n');
            }
            for _ in 0..block.blank_lines_after {
                out.push('\n');
            }
        }
        out
    }
}
