//! Cascading multi-criteria sort.
//!
//! The criteria stack is consulted in priority order; a lower criterion only
//! decides when every higher one ties. Tempo gets special treatment when it
//! leads a multi-criteria stack: it is quantized into buckets so that tracks
//! a few BPM apart count as equal and the next criterion (typically key)
//! gets a say.

use crate::error::EngineError;
use crate::track::{Attribute, Track};
use log::{debug, trace};
use std::cmp::Ordering;
use std::str::FromStr;

/// Default width of a tempo bucket in BPM.
pub const DEFAULT_BPM_BUCKET_WIDTH: f64 = 4.0;

/// Ordered set of active criteria. Position is priority; membership is
/// activation. Never holds duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaStack(Vec<Attribute>);

impl CriteriaStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a stack from criteria in priority order. Repeats keep their
    /// first position.
    pub fn from_attributes(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        let mut stack = Self::new();
        for attribute in attributes {
            stack.push(attribute);
        }
        stack
    }

    /// Append at lowest priority. Returns `false` if already active.
    pub fn push(&mut self, attribute: Attribute) -> bool {
        if self.contains(attribute) {
            return false;
        }
        self.0.push(attribute);
        true
    }

    /// Deactivate a criterion. Returns `false` if it was not active.
    pub fn remove(&mut self, attribute: Attribute) -> bool {
        let before = self.0.len();
        self.0.retain(|a| *a != attribute);
        self.0.len() != before
    }

    /// Flip membership. Returns whether the criterion is active afterwards.
    pub fn toggle(&mut self, attribute: Attribute) -> bool {
        if self.remove(attribute) {
            false
        } else {
            self.0.push(attribute);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.0.contains(&attribute)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Attribute] {
        &self.0
    }
}

impl FromStr for CriteriaStack {
    type Err = EngineError;

    /// Parse a comma-separated list such as `"bpm,key"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Attribute::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from_attributes)
    }
}

/// Tunables for the cascade comparator
#[derive(Debug, Clone, Copy)]
pub struct CascadeContext {
    pub bpm_bucket_width: f64,
}

impl Default for CascadeContext {
    fn default() -> Self {
        Self {
            bpm_bucket_width: DEFAULT_BPM_BUCKET_WIDTH,
        }
    }
}

impl CascadeContext {
    /// Tempo bucket index, `floor(bpm / width)`.
    #[must_use]
    pub fn bpm_bucket(&self, bpm: f64) -> f64 {
        if self.bpm_bucket_width > 0.0 {
            (bpm / self.bpm_bucket_width).floor()
        } else {
            bpm
        }
    }
}

/// Compare two tracks under the stack. `Equal` means every criterion tied.
#[must_use]
pub fn compare_tracks(a: &Track, b: &Track, stack: &CriteriaStack, context: &CascadeContext) -> Ordering {
    let bucketed = stack.len() > 1;

    stack
        .as_slice()
        .iter()
        .enumerate()
        .map(|(rank, &criterion)| match criterion {
            Attribute::Bpm if rank == 0 && bucketed => context
                .bpm_bucket(a.bpm)
                .total_cmp(&context.bpm_bucket(b.bpm)),
            other => a.attribute_value(other).total_cmp(&b.attribute_value(other)),
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Produce a new order of `tracks` under the criteria stack.
///
/// The sort is stable: tracks that tie on every active criterion keep their
/// current relative order. An empty stack returns the input order unchanged.
#[must_use]
pub fn cascade_sort(tracks: &[Track], stack: &CriteriaStack, context: &CascadeContext) -> Vec<Track> {
    let mut sorted = tracks.to_vec();
    if stack.is_empty() {
        trace!("Empty criteria stack, order unchanged");
        return sorted;
    }

    debug!("Cascade sorting {} tracks by {:?}", tracks.len(), stack.as_slice());
    sorted.sort_by(|a, b| compare_tracks(a, b, stack, context));
    sorted
}

/// Alphabetical order by title, case-insensitive, used on reset.
#[must_use]
pub fn alphabetical(tracks: &[Track]) -> Vec<Track> {
    let mut sorted = tracks.to_vec();
    sorted.sort_by_cached_key(|track| track.title.to_lowercase());
    sorted
}
