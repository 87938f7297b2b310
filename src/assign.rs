//! Best-fit assignment of tracks to curve slots.
//!
//! Minimizes the summed absolute difference between each track's attribute
//! value and the target of the slot it lands in. In one dimension the sorted
//! pairing is optimal: pair the i-th smallest value with the i-th smallest
//! target. Any crossed pair can be uncrossed without raising the cost, so
//! repeated uncrossing turns every optimum into the sorted pairing.

use crate::error::{EngineError, Result};
use crate::track::{Attribute, Track};
use log::debug;

/// Slot index for every value, `slots[i]` being where value `i` goes.
///
/// Equal values share their group's slots in ascending slot order, so
/// values that tie keep their relative order and re-solving an already
/// solved sequence changes nothing.
///
/// # Errors
///
/// Returns [`EngineError::TargetCountMismatch`] unless there is exactly one
/// target per value.
pub fn best_fit_slots(values: &[f64], targets: &[f64]) -> Result<Vec<usize>> {
    if values.len() != targets.len() {
        return Err(EngineError::TargetCountMismatch {
            expected: values.len(),
            actual: targets.len(),
        });
    }

    let by_value = ascending_indices(values);
    let by_target = ascending_indices(targets);

    let mut slots = vec![0; values.len()];
    let mut start = 0;
    while start < by_value.len() {
        let value = values[by_value[start]];
        let end = by_value[start..]
            .iter()
            .position(|&i| values[i].total_cmp(&value).is_ne())
            .map_or(by_value.len(), |offset| start + offset);

        let mut group_slots = by_target[start..end].to_vec();
        group_slots.sort_unstable();
        for (&track, slot) in by_value[start..end].iter().zip(group_slots) {
            slots[track] = slot;
        }
        start = end;
    }

    Ok(slots)
}

/// Stable ascending permutation of `values`.
fn ascending_indices(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    indices
}

/// Reorder `tracks` so that `attribute` follows `targets` as closely as
/// possible.
///
/// # Errors
///
/// Returns [`EngineError::TargetCountMismatch`] when `targets` and `tracks`
/// differ in length.
pub fn best_fit_order(tracks: &[Track], attribute: Attribute, targets: &[f64]) -> Result<Vec<Track>> {
    let values: Vec<f64> = tracks.iter().map(|t| t.attribute_value(attribute)).collect();
    let slots = best_fit_slots(&values, targets)?;

    let mut placed: Vec<Option<Track>> = vec![None; tracks.len()];
    for (track, slot) in tracks.iter().zip(slots) {
        placed[slot] = Some(track.clone());
    }

    debug!("Assigned {} tracks to curve by {attribute}", tracks.len());
    Ok(placed.into_iter().flatten().collect())
}

/// Summed absolute deviation of a sequence from its targets.
#[must_use]
pub fn total_deviation(tracks: &[Track], attribute: Attribute, targets: &[f64]) -> f64 {
    tracks
        .iter()
        .zip(targets)
        .map(|(track, target)| (track.attribute_value(attribute) - target).abs())
        .sum()
}
