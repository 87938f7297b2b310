//! # Setflow - Playlist Ordering Engine
//!
//! Reads tracks from a file or stdin, reorders them and prints the result
//! as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Tempo first, key within 4 BPM buckets
//! setflow --input tracks.json sort --by bpm,key
//!
//! # Energy rising to a peak and falling off again
//! setflow --input tracks.json curve --attribute energy --points 0:20 60:95 100:40
//!
//! # Follow a live analysis stream, then publish alphabetically
//! analyzer | setflow alpha --publish "Crate Dig"
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{info, warn};
use setflow::cli::{self, Command};
use setflow::completion;
use setflow::config::EngineConfig;
use setflow::curve::AlphaCanvas;
use setflow::egress::{self, JsonFilePublisher};
use setflow::ingest::{self, IngestOutcome};
use setflow::session::OrderingSession;
use std::path::Path;
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Whether the input opens with a JSON array, skipping leading whitespace.
async fn starts_with_array<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<bool> {
    loop {
        let (skip, first) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(false);
            }
            match buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(i) => (i, Some(buf[i])),
                None => (buf.len(), None),
            }
        };
        reader.consume(skip);
        if let Some(byte) = first {
            return Ok(byte == b'[');
        }
    }
}

/// Fill the session from a batch or an event stream. Returns whether the
/// input was read to a successful end.
async fn load_input(session: &mut OrderingSession, path: Option<&Path>) -> Result<bool> {
    let source: Box<dyn AsyncRead + Unpin + Send> = match path {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut reader = BufReader::new(source);

    if starts_with_array(&mut reader).await.context("Failed to read input")? {
        let mut text = String::new();
        reader.read_to_string(&mut text).await.context("Failed to read track batch")?;
        session.load(ingest::parse_batch(&text).context("Invalid track batch")?);
        return Ok(true);
    }

    let report = ingest::consume(session, ingest::spawn_line_reader(reader)).await;
    match &report.outcome {
        IngestOutcome::Completed { .. } => {
            info!("Ingested {} records ({} skipped)", report.merged(), report.skipped);
        }
        IngestOutcome::Failed { message } => {
            warn!("Analysis failed after {} records: {message}", report.merged());
            eprintln!("analysis failed: {message}");
        }
        IngestOutcome::Interrupted => {
            warn!("Analysis stream ended early after {} records", report.merged());
            eprintln!("analysis stream ended before completion");
        }
    }
    Ok(report.outcome.is_success())
}

/// Main entry point for the Setflow binary.
///
/// The ordered tracks are always printed. The exit status is non-zero when
/// an analysis stream failed or ended early.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug setflow sort` - Enable debug logging
/// - `RUST_LOG=setflow::ingest=trace setflow ingest` - Module-specific logging
#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    let args = cli::Args::parse();

    let config = EngineConfig::load(args.config.as_deref())?;
    let mut session = OrderingSession::new(&config);
    let input_complete = if args.command.reads_input() {
        load_input(&mut session, args.input.as_deref()).await?
    } else {
        true
    };
    let status = if input_complete { ExitCode::SUCCESS } else { ExitCode::FAILURE };

    match args.command {
        Command::Completion { shell } => {
            completion::print_completions(shell, &mut cli::Args::command());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Sort { by } => {
            session.apply_criteria(by);
        }
        Command::Curve { attribute, points, width, height, brush } => {
            let mut canvas = AlphaCanvas::new(width, height);
            canvas.stroke_values(&points, brush);
            session.apply_curve(attribute, &canvas)?;
        }
        Command::Move { from, to } => {
            session.move_track(from, to)?;
        }
        Command::Alpha => session.reset(),
        Command::Ingest => {}
        Command::Pending => {
            let pending = session.tracks_needing_analysis();
            println!("{}", serde_json::to_string_pretty(&pending)?);
            return Ok(status);
        }
    }

    if let Some(name) = args.publish.as_deref() {
        let publisher = JsonFilePublisher::new(config.publish_dir()?);
        let playlist = egress::publish(&publisher, name, session.tracks()).await?;
        eprintln!("Published {}", playlist.url);
    }

    println!("{}", serde_json::to_string_pretty(session.tracks())?);
    Ok(status)
}
