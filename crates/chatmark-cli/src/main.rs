//! chatmark: render chat-style markdown in the terminal

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chatmark_core::{MarkdownTranscript, RenderMode, StyleRegistry};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod sinks;
mod stream;

use config::Config;
use sinks::AnsiSink;

#[derive(Parser)]
#[command(name = "chatmark", version, about = "Render chat-style markdown in the terminal")]
struct Cli {
    /// Config file (default: <config dir>/chatmark/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in palette, overrides the config ("light" or "dark")
    #[arg(long, global = true)]
    theme: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rendered transcript with ANSI styling
    Render {
        /// Input file, or - for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Show the raw text instead of formatted markdown
        #[arg(long)]
        plain: bool,
    },
    /// Print the transcript as an HTML fragment
    Html {
        #[arg(default_value = "-")]
        input: String,
    },
    /// Print line, word and character counts
    Stats {
        #[arg(default_value = "-")]
        input: String,
    },
    /// Replay the input as a streamed reply in a full-screen view
    Stream {
        #[arg(default_value = "-")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.theme.is_some() {
        config.theme = cli.theme;
    }
    let styles = config.style_registry()?;

    match cli.command {
        Command::Render { input, plain } => {
            let mode = if plain {
                RenderMode::PlainText
            } else {
                config.mode
            };
            let mut transcript = MarkdownTranscript::new(AnsiSink::new(), styles);
            transcript.set_content(&read_input(&input)?);
            transcript.render(mode);
            transcript
                .sink()
                .write_to(&mut io::stdout().lock())
                .context("failed to write output")?;
        }
        Command::Html { input } => {
            let transcript = loaded(&input, styles)?;
            println!("{}", transcript.export_as_html());
        }
        Command::Stats { input } => {
            let transcript = loaded(&input, styles)?;
            println!("lines:      {}", transcript.line_count());
            println!("words:      {}", transcript.word_count());
            println!("characters: {}", transcript.char_count(true));
            println!("non-space:  {}", transcript.char_count(false));
        }
        Command::Stream { input } => {
            let text = read_input(&input)?;
            stream::run(text, &config, styles).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so they never mix with rendered output
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn loaded(input: &str, styles: StyleRegistry) -> Result<MarkdownTranscript<AnsiSink>> {
    let mut transcript = MarkdownTranscript::new(AnsiSink::new(), styles);
    transcript.set_content(&read_input(input)?);
    Ok(transcript)
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
}
