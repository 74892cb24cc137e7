//! Block segmentation
//!
//! One forward pass over the buffer's lines. Fences look ahead for their
//! closing line, quotes group consecutive `>` lines, everything else is a
//! single-line block. Malformed input degrades to paragraphs, never errors.

use once_cell::sync::Lazy;
use regex::Regex;

use super::elements::{Block, BlockKind};

/// Opening / closing marker of a fenced code block
pub const FENCE: &str = "```";

/// Glyph replacing `-`, `*` and `+` list markers
pub const BULLET: char = '•';

/// Number of glyphs in a rendered horizontal rule
pub const RULE_WIDTH: usize = 50;

const RULE_GLYPH: &str = "─";

const MAX_HEADING_LEVEL: usize = 4;

static BULLET_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)[-*+]\s+").unwrap());
static ORDERED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s+").unwrap());
static RULE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*_]{3,}\s*$").unwrap());

/// Fixed replacement content of every horizontal rule
pub fn rule_text() -> String {
    RULE_GLYPH.repeat(RULE_WIDTH)
}

/// A source line and where it starts in the raw buffer
struct SourceLine<'a> {
    text: &'a str,
    offset: usize,
}

fn source_lines(raw: &str) -> Vec<SourceLine<'_>> {
    let mut offset = 0;
    raw.split_inclusive('\n')
        .map(|chunk| {
            let text = match chunk.strip_suffix('\n') {
                Some(line) => line.strip_suffix('\r').unwrap_or(line),
                None => chunk,
            };
            let line = SourceLine { text, offset };
            offset += chunk.len();
            line
        })
        .collect()
}

/// Split the raw buffer into typed blocks
pub fn segment(raw: &str) -> Vec<Block> {
    let lines = source_lines(raw);
    let mut blocks: Vec<Block> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let line = &lines[idx];
        let trimmed = line.text.trim();

        if let Some(info) = trimmed.strip_prefix(FENCE) {
            let (block, next_idx) = collect_fence(&lines, idx, info);
            blocks.push(block);
            idx = next_idx;
            continue;
        }

        if trimmed.is_empty() {
            match blocks.last_mut() {
                Some(prev) => prev.blank_lines_after += 1,
                None => blocks.push(Block::new(
                    BlockKind::Paragraph,
                    vec![String::new()],
                    line.offset,
                )),
            }
            idx += 1;
            continue;
        }

        if let Some((level, title)) = parse_heading(trimmed) {
            blocks.push(Block::new(
                BlockKind::Heading(level),
                vec![title.to_string()],
                line.offset,
            ));
            idx += 1;
            continue;
        }

        if trimmed.starts_with('>') {
            let (block, next_idx) = collect_quote(&lines, idx);
            blocks.push(block);
            idx = next_idx;
            continue;
        }

        if let Some((ordered, text)) = parse_list_item(line.text) {
            blocks.push(Block::new(
                BlockKind::ListItem { ordered },
                vec![text],
                line.offset,
            ));
            idx += 1;
            continue;
        }

        if RULE_REGEX.is_match(line.text) {
            blocks.push(Block::new(
                BlockKind::HorizontalRule,
                vec![rule_text()],
                line.offset,
            ));
            idx += 1;
            continue;
        }

        blocks.push(Block::new(
            BlockKind::Paragraph,
            vec![line.text.to_string()],
            line.offset,
        ));
        idx += 1;
    }

    blocks
}

/// Consume a fence starting at `start`; returns the block and the next line index
fn collect_fence(lines: &[SourceLine<'_>], start: usize, info: &str) -> (Block, usize) {
    let language = info.trim_start_matches('`').trim();
    let language = (!language.is_empty()).then(|| language.to_string());

    let mut code = Vec::new();
    let mut idx = start + 1;
    while idx < lines.len() {
        if lines[idx].text.trim().starts_with(FENCE) {
            // Closing fence belongs to this block
            idx += 1;
            let block = Block::new(BlockKind::CodeFence(language), code, lines[start].offset);
            return (block, idx);
        }
        code.push(lines[idx].text.to_string());
        idx += 1;
    }

    tracing::trace!(offset = lines[start].offset, "unterminated code fence");
    let block = Block::new(BlockKind::CodeFence(language), code, lines[start].offset);
    (block, idx)
}

fn collect_quote(lines: &[SourceLine<'_>], start: usize) -> (Block, usize) {
    let mut quoted = Vec::new();
    let mut idx = start;
    while idx < lines.len() {
        let trimmed = lines[idx].text.trim();
        if !trimmed.starts_with('>') {
            break;
        }
        quoted.push(trimmed.trim_start_matches('>').trim().to_string());
        idx += 1;
    }
    (
        Block::new(BlockKind::Blockquote, quoted, lines[start].offset),
        idx,
    )
}

/// `(level, title)` for 1-4 leading `#` with a non-empty title
fn parse_heading(trimmed: &str) -> Option<(u8, &str)> {
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > MAX_HEADING_LEVEL {
        return None;
    }
    let title = trimmed[hashes..].trim();
    if title.is_empty() {
        return None;
    }
    Some((hashes as u8, title))
}

/// `(ordered, display text)`; bullets are normalized, numbers kept verbatim
fn parse_list_item(line: &str) -> Option<(bool, String)> {
    if let Some(caps) = BULLET_REGEX.captures(line) {
        let marker = caps.get(0)?;
        let indent = caps.get(1).map_or("", |m| m.as_str());
        let rest = &line[marker.end()..];
        return Some((false, format!("{indent}{BULLET} {rest}")));
    }
    if ORDERED_REGEX.is_match(line) {
        return Some((true, line.to_string()));
    }
    None
}
