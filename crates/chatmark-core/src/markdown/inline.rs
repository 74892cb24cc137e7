//! Inline formatting passes
//!
//! Six regex passes run in fixed precedence order over a single line:
//! inline code, strikethrough, bold-italic, bold, italic, link. Each pass
//! strips the delimiters of its matches and records a span over the
//! remaining content.
//!
//! Two invariants make this work:
//!
//! - Matches within a pass are applied right-to-left, so stripping one match
//!   never moves the offsets of matches still waiting to its left.
//! - Claimed spans always live in the coordinates of the *current* text.
//!   Whenever delimiters are stripped, every span to the right is shifted
//!   left by the same amount, so a later pass can compare its own match
//!   offsets against earlier claims directly and skip anything overlapping.
//!
//! The passes are a fold over [`Formatted`], which carries the text, the
//! claimed spans, and the running count of stripped bytes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::elements::{InlineKind, InlineSpan};

/// Accumulator threaded through the passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatted {
    /// Line text with all accepted delimiters removed
    pub text: String,
    /// Claimed spans, in `text` coordinates
    pub spans: Vec<InlineSpan>,
    /// Total delimiter bytes stripped so far
    pub removed: usize,
}

impl Formatted {
    /// Unformatted starting point for a line
    pub fn plain(line: &str) -> Self {
        Self {
            text: line.to_string(),
            spans: Vec::new(),
            removed: 0,
        }
    }
}

/// One formatting pass: a delimiter pattern and the span kind it yields
///
/// Capture group 1 is the kept content; group 2 (links only) is the target.
pub struct Pass {
    pub kind: InlineKind,
    pattern: Regex,
}

impl Pass {
    fn new(kind: InlineKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).unwrap(),
        }
    }
}

/// Passes in precedence order, highest first
pub static PASSES: Lazy<[Pass; 6]> = Lazy::new(|| {
    [
        Pass::new(InlineKind::InlineCode, r"`([^`]+)`"),
        Pass::new(InlineKind::Strikethrough, r"~~([^~]+?)~~"),
        Pass::new(InlineKind::BoldItalic, r"\*\*\*([^*]+?)\*\*\*"),
        Pass::new(InlineKind::Bold, r"\*\*([^*]+?)\*\*"),
        Pass::new(InlineKind::Italic, r"\*([^*]+?)\*"),
        Pass::new(InlineKind::Link, r"\[([^\]]+?)\]\(([^)]+?)\)"),
    ]
});

/// A match found by a pass, in current-text coordinates
struct Candidate {
    start: usize,
    end: usize,
    content_start: usize,
    content_end: usize,
    href: Option<String>,
}

/// Format a single line: strip delimiters and collect spans
pub fn format_inline(line: &str) -> Formatted {
    let mut formatted = PASSES
        .iter()
        .fold(Formatted::plain(line), |acc, pass| apply_pass(acc, pass));
    formatted.spans.sort_by_key(|span| (span.start, span.end));
    formatted
}

/// Run one pass over the accumulator
pub fn apply_pass(mut acc: Formatted, pass: &Pass) -> Formatted {
    let candidates: Vec<Candidate> = pass
        .pattern
        .captures_iter(&acc.text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let content = caps.get(1)?;
            Some(Candidate {
                start: whole.start(),
                end: whole.end(),
                content_start: content.start(),
                content_end: content.end(),
                href: caps.get(2).map(|m| m.as_str().to_string()),
            })
        })
        .collect();

    for candidate in candidates.into_iter().rev() {
        let claimed = acc
            .spans
            .iter()
            .any(|span| span.overlaps(candidate.start, candidate.end));
        if claimed {
            continue;
        }

        let content = acc.text[candidate.content_start..candidate.content_end].to_string();
        let removed = (candidate.end - candidate.start) - content.len();
        acc.text
            .replace_range(candidate.start..candidate.end, &content);

        for span in acc.spans.iter_mut() {
            if span.start >= candidate.end {
                span.start -= removed;
                span.end -= removed;
            }
        }

        let mut span = InlineSpan::new(
            candidate.start,
            candidate.start + content.len(),
            pass.kind,
        );
        span.href = candidate.href;
        acc.spans.push(span);
        acc.removed += removed;
    }

    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_of(formatted: &Formatted) -> Vec<(InlineKind, &str)> {
        formatted
            .spans
            .iter()
            .map(|s| (s.kind, &formatted.text[s.start..s.end]))
            .collect()
    }

    #[test]
    fn test_end_to_end_line() {
        let formatted = format_inline("Some **bold** and *italic* and `code`.");
        assert_eq!(formatted.text, "Some bold and italic and code.");
        assert_eq!(
            formatted.spans,
            vec![
                InlineSpan::new(5, 9, InlineKind::Bold),
                InlineSpan::new(14, 20, InlineKind::Italic),
                InlineSpan::new(25, 29, InlineKind::InlineCode),
            ]
        );
        assert_eq!(formatted.removed, 8);
    }

    #[test]
    fn test_code_is_immune_to_emphasis() {
        let formatted = format_inline("see `**not bold**` here");
        assert_eq!(formatted.text, "see **not bold** here");
        assert_eq!(
            spans_of(&formatted),
            vec![(InlineKind::InlineCode, "**not bold**")]
        );
    }

    #[test]
    fn test_precedence_determinism() {
        let bold_italic = format_inline("***x***");
        assert_eq!(bold_italic.text, "x");
        assert_eq!(bold_italic.spans, vec![InlineSpan::new(0, 1, InlineKind::BoldItalic)]);

        let bold = format_inline("**x**");
        assert_eq!(bold.text, "x");
        assert_eq!(bold.spans, vec![InlineSpan::new(0, 1, InlineKind::Bold)]);

        let italic = format_inline("*x*");
        assert_eq!(italic.text, "x");
        assert_eq!(italic.spans, vec![InlineSpan::new(0, 1, InlineKind::Italic)]);
    }

    #[test]
    fn test_earlier_spans_shift_when_delimiters_strip_to_their_left() {
        // Code is claimed first at its pre-strip position, then the bold pass
        // strips four bytes to its left.
        let formatted = format_inline("**a** `b` ~~c~~");
        assert_eq!(formatted.text, "a b c");
        assert_eq!(
            spans_of(&formatted),
            vec![
                (InlineKind::Bold, "a"),
                (InlineKind::InlineCode, "b"),
                (InlineKind::Strikethrough, "c"),
            ]
        );
    }

    #[test]
    fn test_link_keeps_label_and_href() {
        let formatted = format_inline("Read [the docs](https://example.com) now");
        assert_eq!(formatted.text, "Read the docs now");
        assert_eq!(formatted.spans.len(), 1);
        let link = &formatted.spans[0];
        assert_eq!(link.kind, InlineKind::Link);
        assert_eq!(&formatted.text[link.start..link.end], "the docs");
        assert_eq!(link.href.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_overlapping_match_stays_literal() {
        // Bold would wrap the code span, so it is skipped
        let formatted = format_inline("**a `b` c**");
        assert_eq!(formatted.text, "**a b c**");
        assert_eq!(spans_of(&formatted), vec![(InlineKind::InlineCode, "b")]);
    }

    #[test]
    fn test_unbalanced_delimiters_are_literal() {
        for line in ["a lone * star", "half **bold", "`open code", "~~nope", "[x](", "**"] {
            let formatted = format_inline(line);
            assert_eq!(formatted.text, line);
            assert!(formatted.spans.is_empty(), "unexpected spans for {:?}", line);
        }
    }

    #[test]
    fn test_adjacent_spans_allowed() {
        let formatted = format_inline("`a`**b**");
        assert_eq!(formatted.text, "ab");
        assert_eq!(
            formatted.spans,
            vec![
                InlineSpan::new(0, 1, InlineKind::InlineCode),
                InlineSpan::new(1, 2, InlineKind::Bold),
            ]
        );
    }

    #[test]
    fn test_multiple_matches_in_one_pass() {
        let formatted = format_inline("*a* and *b* and *c*");
        assert_eq!(formatted.text, "a and b and c");
        assert_eq!(
            spans_of(&formatted),
            vec![
                (InlineKind::Italic, "a"),
                (InlineKind::Italic, "b"),
                (InlineKind::Italic, "c"),
            ]
        );
    }

    #[test]
    fn test_multibyte_offsets_are_bytes() {
        let formatted = format_inline("héllo **wörld**");
        assert_eq!(formatted.text, "héllo wörld");
        let span = &formatted.spans[0];
        assert_eq!(&formatted.text[span.start..span.end], "wörld");
        assert_eq!(span.start, "héllo ".len());
    }

    #[test]
    fn test_single_pass_in_isolation() {
        let after_code = apply_pass(Formatted::plain("`x` *y*"), &PASSES[0]);
        assert_eq!(after_code.text, "x *y*");
        assert_eq!(after_code.removed, 2);

        let after_italic = apply_pass(after_code, &PASSES[4]);
        assert_eq!(after_italic.text, "x y");
        assert_eq!(after_italic.removed, 4);
    }

    #[test]
    fn test_spans_never_overlap() {
        let lines = [
            "***a*** **b** *c* `d` ~~e~~ [f](g)",
            "`*`*`*`",
            "**`x`** and *[y](z)*",
            "~~**a**~~ `~~b~~`",
            "* * * ** ** *** ***",
            "[a](b)[c](d)`e``f`",
        ];
        for line in lines {
            let formatted = format_inline(line);
            for (i, a) in formatted.spans.iter().enumerate() {
                assert!(a.start <= a.end);
                assert!(a.end <= formatted.text.len());
                for b in formatted.spans.iter().skip(i + 1) {
                    assert!(
                        !(a.start < b.end && b.start < a.end),
                        "overlap in {:?}: {:?} vs {:?}",
                        line,
                        a,
                        b
                    );
                }
            }
        }
    }
}
