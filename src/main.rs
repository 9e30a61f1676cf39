//! # Vise - A Modal Editing Core
//!
//! Headless front end: opens a file, feeds key tokens through the editor
//! and optionally writes or prints the result.
//!
//! ## Quick Start
//!
//! ```bash
//! # Delete the first word of every line and print the result
//! cargo run -- notes.txt --keys 'qqdwjq100@q' --print
//!
//! # Feed keys from stdin, one line of tokens at a time
//! printf 'ggdd\nGx\n' | cargo run -- notes.txt --write
//! ```

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vise_core::{Config, Editor, EditorEvent, EventHandler, Key, KeyQueue, KeySource};

/// Vise - modal editing from the command line
#[derive(Parser, Debug)]
#[command(name = "vise")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Key tokens to feed, e.g. "d2w<Escape>". Read from stdin when absent.
    #[arg(short, long, value_name = "SEQ")]
    keys: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the file after the keys ran
    #[arg(short, long)]
    write: bool,

    /// Print the buffer after the keys ran
    #[arg(short, long)]
    print: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Reads stdin lazily, one line of key tokens at a time.
struct StdinKeys<R> {
    lines: io::Lines<R>,
    queue: KeyQueue,
}

impl<R: BufRead> StdinKeys<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            queue: KeyQueue::new(),
        }
    }
}

impl<R: BufRead> KeySource for StdinKeys<R> {
    fn next_key(&mut self) -> Option<Key> {
        while self.queue.is_empty() {
            match self.lines.next()? {
                Ok(line) => self.queue.push_str(&line),
                Err(e) => {
                    tracing::warn!("stopped reading keys: {}", e);
                    return None;
                }
            }
        }
        self.queue.next_key()
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting vise v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_ref())?;
    let mut editor = Editor::with_config(config);

    match &args.file {
        Some(path) => editor
            .open_file(path)
            .with_context(|| format!("failed to open {}", path.display()))?,
        None => editor.new_file()?,
    };

    // Surface warnings such as cut-off alias loops on stderr.
    let mut events = EventHandler::new(editor.subscribe());
    let reporter = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if let EditorEvent::Warning(message) = event {
                eprintln!("vise: {}", message);
            }
        }
    });

    match &args.keys {
        Some(keys) => editor.run(&mut KeyQueue::parse(keys))?,
        None => editor.run(&mut StdinKeys::new(io::stdin().lock()))?,
    }

    if args.write {
        editor.save().context("failed to write file")?;
    }
    if args.print {
        io::stdout().write_all(&editor.content())?;
    }

    drop(editor);
    reporter.await?;

    Ok(())
}
