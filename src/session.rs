//! Ordering state controller.
//!
//! [`OrderingSession`] owns the working set and its current order. Every
//! change goes through one of its triggers:
//!
//! - ingestion merges ([`OrderingSession::merge`], [`OrderingSession::load`])
//! - cascading sort ([`OrderingSession::apply_criteria`], [`OrderingSession::toggle_criterion`])
//! - curve assignment ([`OrderingSession::apply_curve`], [`OrderingSession::apply_targets`])
//! - manual relocation ([`OrderingSession::move_track`])
//! - reset ([`OrderingSession::reset`])
//!
//! Cascade and curve modes exclude each other: running one discards the
//! other's state. There is no undo; each trigger replaces the sequence.
//!
//! Each change publishes a fresh snapshot and bumps [`OrderingSession::version`],
//! so observers holding an earlier [`OrderingSession::snapshot`] keep a
//! consistent view and can detect changes with `Arc::ptr_eq` or by version.

use crate::assign;
use crate::cascade::{self, CascadeContext, CriteriaStack};
use crate::config::EngineConfig;
use crate::curve::{CurveSampler, StrokeSurface};
use crate::error::{EngineError, Result};
use crate::track::{self, Attribute, Track};
use log::{debug, info, trace};
use std::sync::Arc;

/// Which trigger produced the current order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderMode {
    /// Arrival order from ingestion.
    Loaded,
    Cascade,
    Curve,
    Manual,
    Alphabetical,
}

/// The targets behind the current curve-assigned order.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveState {
    pub attribute: Attribute,
    pub targets: Vec<f64>,
}

/// Result of merging one record into the working set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// An existing track at this index was replaced.
    Replaced(usize),
    /// The track was unseen and now sits at this index.
    Appended(usize),
}

/// Session-scoped ordering state.
#[derive(Debug, Clone)]
pub struct OrderingSession {
    tracks: Arc<Vec<Track>>,
    version: u64,
    criteria: CriteriaStack,
    curve: Option<CurveState>,
    mode: OrderMode,
    cascade: CascadeContext,
    sampler: CurveSampler,
    normalize_bpm: bool,
}

impl Default for OrderingSession {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl OrderingSession {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tracks: Arc::new(Vec::new()),
            version: 0,
            criteria: CriteriaStack::new(),
            curve: None,
            mode: OrderMode::Loaded,
            cascade: config.cascade_context(),
            sampler: config.curve_sampler(),
            normalize_bpm: config.normalize_bpm,
        }
    }

    /// Session seeded with a one-shot batch.
    #[must_use]
    pub fn with_tracks(config: &EngineConfig, tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut session = Self::new(config);
        session.load(tracks);
        session
    }

    /// Current order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Shared handle to the current order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Track>> {
        Arc::clone(&self.tracks)
    }

    /// Incremented on every change to the sequence.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn criteria(&self) -> &CriteriaStack {
        &self.criteria
    }

    #[must_use]
    pub fn curve(&self) -> Option<&CurveState> {
        self.curve.as_ref()
    }

    #[must_use]
    pub fn mode(&self) -> OrderMode {
        self.mode
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn publish(&mut self, tracks: Vec<Track>, mode: OrderMode) {
        self.tracks = Arc::new(tracks);
        self.version += 1;
        self.mode = mode;
    }

    /// Merge one record by id: replace in place if known, append otherwise.
    pub fn merge(&mut self, mut track: Track) -> MergeOutcome {
        if self.normalize_bpm {
            track.bpm = track::normalize_bpm(track.bpm);
        }

        // Copies only while an observer still holds the previous snapshot.
        let tracks = Arc::make_mut(&mut self.tracks);
        let outcome = match tracks.iter().position(|t| t.id == track.id) {
            Some(index) => {
                trace!("Replacing track {} at {index}", track.id);
                tracks[index] = track;
                MergeOutcome::Replaced(index)
            }
            None => {
                trace!("Appending track {}", track.id);
                tracks.push(track);
                MergeOutcome::Appended(tracks.len() - 1)
            }
        };

        self.version += 1;
        outcome
    }

    /// Merge a one-shot batch in order.
    pub fn load(&mut self, tracks: impl IntoIterator<Item = Track>) {
        let mut merged = 0;
        for track in tracks {
            self.merge(track);
            merged += 1;
        }
        info!("Loaded {merged} tracks, working set now {}", self.len());
    }

    /// Replace the criteria stack and sort by it. Clears curve state. An
    /// empty stack leaves the order untouched.
    pub fn apply_criteria(&mut self, criteria: CriteriaStack) -> &[Track] {
        self.criteria = criteria;
        self.curve = None;
        self.resort();
        &self.tracks
    }

    /// Activate or deactivate one criterion and re-sort. Returns whether the
    /// criterion is active afterwards.
    pub fn toggle_criterion(&mut self, attribute: Attribute) -> bool {
        let active = self.criteria.toggle(attribute);
        debug!("Criterion {attribute} now {}", if active { "active" } else { "inactive" });
        self.curve = None;
        self.resort();
        active
    }

    fn resort(&mut self) {
        if self.criteria.is_empty() || self.is_empty() {
            return;
        }
        let sorted = cascade::cascade_sort(&self.tracks, &self.criteria, &self.cascade);
        self.publish(sorted, OrderMode::Cascade);
    }

    /// Sample a drawn curve and assign tracks to it by `attribute`.
    ///
    /// # Errors
    ///
    /// Never fails in practice: the sampler always yields one target per
    /// track. The signature mirrors [`OrderingSession::apply_targets`].
    pub fn apply_curve<S: StrokeSurface + ?Sized>(&mut self, attribute: Attribute, surface: &S) -> Result<&[Track]> {
        let targets = self.sampler.sample(surface, self.len());
        self.apply_targets(attribute, targets)
    }

    /// Assign tracks to explicit per-slot targets. Clears the criteria stack.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TargetCountMismatch`] unless there is one target
    /// per track.
    pub fn apply_targets(&mut self, attribute: Attribute, targets: Vec<f64>) -> Result<&[Track]> {
        if self.is_empty() && targets.is_empty() {
            return Ok(&self.tracks);
        }

        let ordered = assign::best_fit_order(&self.tracks, attribute, &targets)?;
        info!(
            "Curve assignment by {attribute}, total deviation {:.1}",
            assign::total_deviation(&ordered, attribute, &targets)
        );

        self.criteria.clear();
        self.curve = Some(CurveState { attribute, targets });
        self.publish(ordered, OrderMode::Curve);
        Ok(&self.tracks)
    }

    /// Move the track at `from` so it ends up at `to`, shifting the tracks in
    /// between. Leaves criteria and curve state as they are.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MoveOutOfRange`] if either index is outside the
    /// sequence; the order is left unchanged.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.len();
        if from >= len || to >= len {
            return Err(EngineError::MoveOutOfRange { from, to, len });
        }
        if from == to {
            return Ok(());
        }

        let mut tracks = self.tracks.as_ref().clone();
        let track = tracks.remove(from);
        debug!("Moving {} from {from} to {to}", track.id);
        tracks.insert(to, track);
        self.publish(tracks, OrderMode::Manual);
        Ok(())
    }

    /// Drop all mode state and order alphabetically by title.
    pub fn reset(&mut self) {
        self.criteria.clear();
        self.curve = None;
        let sorted = cascade::alphabetical(&self.tracks);
        self.publish(sorted, OrderMode::Alphabetical);
        info!("Reset to alphabetical order");
    }

    /// Tracks a targeted re-analysis should be issued for.
    #[must_use]
    pub fn tracks_needing_analysis(&self) -> Vec<Track> {
        self.tracks.iter().filter(|t| t.needs_analysis()).cloned().collect()
    }
}
