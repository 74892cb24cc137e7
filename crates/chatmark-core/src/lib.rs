//! Core library for chatmark
//!
//! Turns the accumulated text of a streamed chat transcript into styled spans.
//! The host owns the display; this crate only decides *what* text goes where and
//! which semantic style each byte range carries.

pub mod feed;
pub mod markdown;
pub mod sink;
pub mod style;
pub mod transcript;

pub use feed::{ChunkFeed, ChunkProducer, FeedStatus};
pub use markdown::{build_document, RenderMode, RenderedBlock, RenderedDocument};
pub use sink::{BufferSink, DisplaySink};
pub use style::{Rgb, StyleAttributes, StyleKind, StyleRegistry};
pub use transcript::{MarkdownTranscript, SearchError, SearchMatch, Template};
