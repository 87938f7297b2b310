//! # Command-Line Interface Module
//!
//! Clap definitions for the `setflow` binary.
//!
//! Every ordering command reads tracks from `--input` (or stdin), applies
//! one trigger and prints the resulting order as JSON. Input that starts
//! with `[` is a one-shot batch of track records; anything else is read as
//! a newline-delimited stream of analysis events.
//!
//! ## Examples
//!
//! ```bash
//! setflow --input tracks.json sort --by bpm,key
//! setflow --input tracks.json curve --attribute energy --points 0:20 50:90 100:30
//! analyzer | setflow ingest --publish "Friday Warm Up"
//! ```

use crate::cascade::CriteriaStack;
use crate::track::Attribute;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "setflow")]
#[command(about = "Setflow: reorder playlists by tempo, key and energy, or by a drawn curve")]
#[command(version)]
pub struct Args {
    /// Track records: a JSON array, or NDJSON analysis events. Defaults to stdin.
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SETFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Hand the final order to the playlist publisher under this name
    #[arg(long, global = true)]
    pub publish: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sort by a stack of criteria, highest priority first
    ///
    /// When tempo leads a multi-criteria stack it is compared in 4 BPM
    /// buckets so the next criterion can decide between close tempos.
    Sort {
        /// Comma-separated criteria from bpm, key, energy
        #[arg(long, default_value = "bpm,key")]
        by: CriteriaStack,
    },

    /// Fit tracks to a drawn curve
    ///
    /// The curve is drawn through the given points onto a canvas and
    /// sampled once per track; tracks are then assigned to positions so the
    /// chosen attribute follows the curve as closely as possible.
    Curve {
        /// Attribute the curve describes: bpm, key or energy
        #[arg(long, default_value = "energy")]
        attribute: Attribute,

        /// Curve points as `x:value`, both on a 0-100 scale, left to right
        #[arg(long, num_args = 1.., required = true, value_parser = parse_point)]
        points: Vec<(f64, f64)>,

        /// Canvas width in pixels
        #[arg(long, default_value = "800")]
        width: u32,

        /// Canvas height in pixels
        #[arg(long, default_value = "200")]
        height: u32,

        /// Brush radius in pixels
        #[arg(long, default_value = "2.0")]
        brush: f64,
    },

    /// Move one track to a new position (0-based)
    Move {
        from: usize,
        to: usize,
    },

    /// Reset to alphabetical order by title
    Alpha,

    /// Load tracks and print them in arrival order
    Ingest,

    /// List tracks that should be sent for re-analysis
    Pending,

    /// Generate shell completions
    ///
    /// Usage: setflow completion bash > ~/.local/share/bash-completion/completions/setflow
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Command {
    /// Whether the command needs tracks from `--input` or stdin.
    #[must_use]
    pub fn reads_input(&self) -> bool {
        !matches!(self, Command::Completion { .. })
    }
}

/// Parse an `x:value` curve point.
fn parse_point(raw: &str) -> Result<(f64, f64), String> {
    let (x, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected x:value, got `{raw}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid number `{part}` in `{raw}`: {e}"))
    };
    Ok((parse(x)?, parse(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("25:80"), Ok((25.0, 80.0)));
        assert_eq!(parse_point(" 0 : 12.5 "), Ok((0.0, 12.5)));
        assert!(parse_point("25").is_err());
        assert!(parse_point("a:1").is_err());
    }

    #[test]
    fn test_sort_command_parses_criteria() {
        let args = Args::try_parse_from(["setflow", "sort", "--by", "energy,bpm"]).unwrap();
        match args.command {
            Command::Sort { by } => assert_eq!(by.as_slice(), &[Attribute::Energy, Attribute::Bpm]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_curve_command_with_global_flags() {
        let args = Args::try_parse_from([
            "setflow", "curve", "--attribute", "key", "--points", "0:10", "100:90", "--input", "t.json",
            "--publish", "Night",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("t.json")));
        assert_eq!(args.publish.as_deref(), Some("Night"));
        match args.command {
            Command::Curve { attribute, points, width, .. } => {
                assert_eq!(attribute, Attribute::Key);
                assert_eq!(points, vec![(0.0, 10.0), (100.0, 90.0)]);
                assert_eq!(width, 800);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_only_completion_skips_input() {
        let completion = Args::try_parse_from(["setflow", "completion", "zsh"]).unwrap();
        assert!(!completion.command.reads_input());

        let alpha = Args::try_parse_from(["setflow", "alpha"]).unwrap();
        assert!(alpha.command.reads_input());
    }

    #[test]
    fn test_unknown_criterion_rejected() {
        assert!(Args::try_parse_from(["setflow", "sort", "--by", "genre"]).is_err());
    }
}
