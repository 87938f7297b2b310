//! Playlist ordering engine: smooth tempo, key and energy across a set.
//!
//! Core modules:
//! - [`key`] - Camelot key distance model
//! - [`cascade`] - Cascading multi-criteria sort
//! - [`curve`] - Curve sampler for drawn strokes
//! - [`assign`] - Best-fit assignment of tracks to curve targets
//! - [`session`] - Ordering state controller
//!
//! ### Supporting Modules
//!
//! - [`track`] - Track records and orderable attributes
//! - [`ingest`] - Batch and streaming ingestion of analysis results
//! - [`egress`] - Hand-off of the final order to a playlist publisher
//! - [`config`] - Engine tunables and platform directories
//! - [`error`] - Engine error type
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use setflow::config::EngineConfig;
//! use setflow::session::OrderingSession;
//! use setflow::track::{Attribute, Track};
//!
//! let mut session = OrderingSession::with_tracks(
//!     &EngineConfig::default(),
//!     vec![
//!         Track::new("a", "Opener").with_bpm(100.0).with_energy(5.0),
//!         Track::new("b", "Builder").with_bpm(80.0).with_energy(50.0),
//!         Track::new("c", "Peak").with_bpm(120.0).with_energy(95.0),
//!     ],
//! );
//!
//! // Rule-based: tempo ascending
//! session.apply_criteria("bpm".parse()?);
//! let bpms: Vec<f64> = session.tracks().iter().map(|t| t.bpm).collect();
//! assert_eq!(bpms, vec![80.0, 100.0, 120.0]);
//!
//! // Curve-based: low, high, medium energy
//! session.apply_targets(Attribute::Energy, vec![10.0, 90.0, 50.0])?;
//! let ids: Vec<&str> = session.tracks().iter().map(|t| t.id.as_str()).collect();
//! assert_eq!(ids, vec!["a", "c", "b"]);
//! # Ok::<(), setflow::error::EngineError>(())
//! ```
//!
//! ## Ordering Modes
//!
//! ### Cascading sort
//! Criteria are compared in priority order. When tempo leads a stack of
//! several criteria it is compared in 4 BPM buckets, so close tempos count as
//! equal and the next criterion decides. Ties on every criterion keep their
//! previous relative order.
//!
//! ### Curve fitting
//! A stroke is sampled into one target per position, and tracks are paired
//! with targets by rank, which minimizes the total absolute deviation.
//! Running it clears the criteria stack; running a cascade discards the curve.
//!
//! ## Logging
//!
//! The library logs through the `log` facade. The binary initializes
//! `env_logger`, so `RUST_LOG=setflow::ingest=debug` shows every merged
//! track.

pub mod assign;
pub mod cascade;
pub mod cli;
pub mod completion;
pub mod config;
pub mod curve;
pub mod egress;
pub mod error;
pub mod ingest;
pub mod key;
pub mod session;
pub mod track;
