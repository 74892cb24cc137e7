//! Display sink interface
//!
//! The renderer drives a sink through a full clear-and-rebuild on every
//! render: `clear`, a sequence of `insert` / `tag` calls, then `finish`.
//! Tag ranges are byte offsets into everything inserted since the last
//! `clear`. Later tags layer over earlier ones.

use std::ops::Range;

use crate::style::{StyleAttributes, StyleKind};

/// Something that can show styled text
pub trait DisplaySink {
    /// Drop all content and styling
    fn clear(&mut self);

    /// Append text at the end of the content
    fn insert(&mut self, text: &str);

    /// Style a byte range of the content
    fn tag(&mut self, range: Range<usize>, kind: StyleKind, style: &StyleAttributes);

    /// Called once after a rebuild completes
    fn finish(&mut self) {}
}

/// A tag as recorded by [`BufferSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub range: Range<usize>,
    pub kind: StyleKind,
    pub style: StyleAttributes,
}

/// In-memory sink: keeps the text and every tag applied to it
///
/// Useful on its own for tests and snapshots, and as the backing store of
/// sinks that convert to a toolkit format once a rebuild finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSink {
    text: String,
    tags: Vec<Tag>,
    rebuilds: usize,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Number of completed rebuilds
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Tagged text for every tag of `kind`, in application order
    pub fn tagged(&self, kind: StyleKind) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|tag| tag.kind == kind)
            .filter_map(|tag| self.text.get(tag.range.clone()))
            .collect()
    }

    /// Split the text into maximal runs with a single merged style
    ///
    /// Run boundaries fall on tag edges; overlapping tags are layered in
    /// application order with [`StyleAttributes::overlay`].
    pub fn runs(&self) -> Vec<(Range<usize>, StyleAttributes)> {
        let len = self.text.len();
        let mut edges: Vec<usize> = vec![0, len];
        for tag in &self.tags {
            edges.push(tag.range.start.min(len));
            edges.push(tag.range.end.min(len));
        }
        edges.sort_unstable();
        edges.dedup();

        let mut runs: Vec<(Range<usize>, StyleAttributes)> = Vec::new();
        for pair in edges.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if start == end {
                continue;
            }
            let style = self
                .tags
                .iter()
                .filter(|tag| tag.range.start <= start && end <= tag.range.end)
                .fold(StyleAttributes::default(), |acc, tag| acc.overlay(&tag.style));

            match runs.last_mut() {
                Some((range, last)) if *last == style => range.end = end,
                _ => runs.push((start..end, style)),
            }
        }
        runs
    }
}

impl DisplaySink for BufferSink {
    fn clear(&mut self) {
        self.text.clear();
        self.tags.clear();
    }

    fn insert(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn tag(&mut self, range: Range<usize>, kind: StyleKind, style: &StyleAttributes) {
        if range.start >= range.end {
            return;
        }
        self.tags.push(Tag {
            range,
            kind,
            style: style.clone(),
        });
    }

    fn finish(&mut self) {
        self.rebuilds += 1;
    }
}
