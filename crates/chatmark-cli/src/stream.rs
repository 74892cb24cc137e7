//! `chatmark stream`: full-screen view of a simulated streamed reply
//!
//! A producer task sends the input in small chunks; the UI loop drains the
//! feed every tick and re-renders the whole transcript.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use chatmark_core::feed::{self, ChunkFeed, ChunkProducer};
use chatmark_core::{MarkdownTranscript, RenderMode, StyleRegistry};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{execute, ExecutableCommand};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::task::JoinHandle;

use crate::config::{Config, StreamConfig};
use crate::sinks::TextSink;

const TICK_RATE: Duration = Duration::from_millis(33);

pub async fn run(text: String, config: &Config, styles: StyleRegistry) -> Result<()> {
    let (mut view, task) = start(&text, &config.stream, styles, config.mode);
    let result = event_loop(&mut view);

    view.feed.cancel();
    if let Err(err) = task.await {
        tracing::warn!(error = %err, "stream producer failed");
    }
    result
}

/// Spawn the producer task and build the view draining it
///
/// The task owns the only sender, so the feed reports `finished` as soon as
/// the last chunk has been drained.
fn start(
    text: &str,
    stream: &StreamConfig,
    styles: StyleRegistry,
    mode: RenderMode,
) -> (StreamView, JoinHandle<()>) {
    let (producer, feed) = feed::channel();
    let chunks = chunk_text(text, stream.chunk_size);
    tracing::debug!(chunks = chunks.len(), "starting stream");
    let task = tokio::spawn(produce(
        producer,
        chunks,
        Duration::from_millis(stream.delay_ms),
    ));
    (StreamView::new(feed, styles, mode), task)
}

async fn produce(producer: ChunkProducer, chunks: Vec<String>, delay: Duration) {
    for chunk in chunks {
        if !producer.send(chunk) {
            break;
        }
        tokio::select! {
            _ = producer.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Split into chunks of at most `size` characters (at least one)
fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Finished,
    Stopped,
}

impl StreamState {
    fn label(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Finished => "done",
            Self::Stopped => "stopped",
        }
    }
}

struct StreamView {
    transcript: MarkdownTranscript<TextSink>,
    feed: ChunkFeed,
    mode: RenderMode,
    state: StreamState,
    /// Transcript body for the last drawn area; dropped whenever the text changes
    body: Option<(Rect, Paragraph<'static>)>,
}

impl StreamView {
    fn new(feed: ChunkFeed, styles: StyleRegistry, mode: RenderMode) -> Self {
        let mut transcript = MarkdownTranscript::new(TextSink::new(), styles);
        transcript.render(mode);
        Self {
            transcript,
            feed,
            mode,
            state: StreamState::Streaming,
            body: None,
        }
    }

    /// Apply pending chunks and re-render if any arrived
    fn tick(&mut self) {
        let status = self.feed.drain_into(&mut self.transcript);
        if status.applied > 0 {
            self.transcript.render(self.mode);
            self.body = None;
        }
        if status.finished && self.state == StreamState::Streaming {
            self.state = if self.feed.is_cancelled() {
                StreamState::Stopped
            } else {
                StreamState::Finished
            };
            tracing::debug!(state = self.state.label(), "stream ended");
        }
    }

    /// Returns true when the view should close
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('m') => {
                self.mode = self.mode.toggled();
                self.transcript.switch_render_mode(self.mode);
                self.body = None;
            }
            KeyCode::Char('s') => self.feed.cancel(),
            KeyCode::Char('c') => {
                self.transcript.clear();
                self.body = None;
            }
            _ => {}
        }
        false
    }

    /// Wrapped transcript scrolled to its tail, rebuilt only when stale
    fn body_paragraph(&mut self, area: Rect) -> &Paragraph<'static> {
        if !matches!(&self.body, Some((cached, _)) if *cached == area) {
            self.body = None;
        }
        let transcript = &self.transcript;
        let (_, paragraph) = self.body.get_or_insert_with(|| {
            let text = transcript.sink().text().clone();
            let scroll = wrapped_height(&text, area.width).saturating_sub(area.height);
            let paragraph = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            (area, paragraph)
        });
        paragraph
    }

    fn status_line(&self) -> String {
        format!(
            " {} | {} | {} words, {} bytes shown | m mode  s stop  c clear  q quit",
            self.mode,
            self.state.label(),
            self.transcript.word_count(),
            self.transcript.sink().rendered_bytes(),
        )
    }
}

fn event_loop(view: &mut StreamView) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    loop {
        view.tick();
        terminal.draw(|frame| draw(frame, view))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && view.handle_key(key) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, view: &mut StreamView) {
    let [body, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let status_line = view.status_line();
    frame.render_widget(view.body_paragraph(body), body);
    frame.render_widget(
        Paragraph::new(status_line).style(Style::default().add_modifier(Modifier::REVERSED)),
        status,
    );
}

/// Rows `text` takes when wrapped at `width`
fn wrapped_height(text: &Text<'_>, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = text
        .lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn rendered(view: &StreamView) -> String {
        view.transcript
            .sink()
            .text()
            .lines
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_chunk_text() {
        assert_eq!(chunk_text("abcde", 2), vec!["ab", "cd", "e"]);
        assert_eq!(chunk_text("héé", 1), vec!["h", "é", "é"]);
        assert_eq!(chunk_text("ab", 0), vec!["a", "b"]);
        assert!(chunk_text("", 4).is_empty());
    }

    #[test]
    fn test_wrapped_height() {
        let text = Text::from("abcdef\n\nab");
        assert_eq!(wrapped_height(&text, 4), 4);
        assert_eq!(wrapped_height(&text, 10), 3);
    }

    #[tokio::test]
    async fn test_view_renders_chunks_and_finishes() {
        let (producer, feed) = feed::channel();
        let mut view = StreamView::new(feed, StyleRegistry::default(), RenderMode::Markdown);

        producer.send("**he");
        view.tick();
        assert_eq!(rendered(&view), "**he");
        assert_eq!(view.state, StreamState::Streaming);

        producer.send("llo**");
        drop(producer);
        view.tick();
        assert_eq!(rendered(&view), "hello");
        assert_eq!(view.state, StreamState::Finished);
    }

    #[tokio::test]
    async fn test_started_stream_finishes_when_producer_completes() {
        let stream = StreamConfig {
            chunk_size: 2,
            delay_ms: 0,
        };
        let (mut view, task) = start(
            "# done",
            &stream,
            StyleRegistry::default(),
            RenderMode::Markdown,
        );
        task.await.unwrap();

        view.tick();
        assert_eq!(view.transcript.content(), "# done");
        assert_eq!(rendered(&view), "done");
        assert_eq!(view.state, StreamState::Finished);
    }

    #[tokio::test]
    async fn test_body_rebuilt_only_when_text_or_area_changes() {
        let (producer, feed) = feed::channel();
        let mut view = StreamView::new(feed, StyleRegistry::default(), RenderMode::Markdown);
        let area = Rect::new(0, 0, 20, 5);

        view.body_paragraph(area);
        assert!(view.body.is_some());
        view.tick();
        assert!(view.body.is_some());

        view.body_paragraph(Rect::new(0, 0, 30, 5));
        assert_eq!(view.body.as_ref().map(|(cached, _)| cached.width), Some(30));

        producer.send("more");
        view.tick();
        assert!(view.body.is_none());

        view.body_paragraph(area);
        view.handle_key(press(KeyCode::Char('m')));
        assert!(view.body.is_none());
    }

    #[tokio::test]
    async fn test_keys() {
        let (producer, feed) = feed::channel();
        let mut view = StreamView::new(feed, StyleRegistry::default(), RenderMode::Markdown);
        producer.send("# Hi");
        view.tick();

        assert!(!view.handle_key(press(KeyCode::Char('m'))));
        assert_eq!(view.mode, RenderMode::PlainText);
        assert_eq!(rendered(&view), "# Hi");

        assert!(!view.handle_key(press(KeyCode::Char('s'))));
        assert!(!producer.send("more"));
        view.tick();
        assert_eq!(view.state, StreamState::Stopped);
        assert_eq!(view.transcript.content(), "# Hi");

        assert!(!view.handle_key(press(KeyCode::Char('c'))));
        assert_eq!(view.transcript.content(), "");

        assert!(view.handle_key(press(KeyCode::Char('q'))));
        assert!(view.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }
}
