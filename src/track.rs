//! Track records and the attributes the engine orders by.

use crate::error::EngineError;
use crate::key;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One playlist entry as delivered by the analysis collaborator.
///
/// Only `bpm`, `key`, `energy` and `title` are interpreted by the engine.
/// The remaining fields are payload carried through to egress untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier, unique within a working set.
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Playback reference handed to the persistence collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// `0` means unknown.
    #[serde(default, deserialize_with = "bpm_or_zero")]
    pub bpm: f64,
    /// Camelot label, e.g. `"8A"`.
    #[serde(default)]
    pub key: Option<String>,
    /// 0–100 when known.
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub status: TrackStatus,
}

fn bpm_or_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let bpm = Option::<f64>::deserialize(deserializer)?;
    Ok(bpm.filter(|b| b.is_finite() && *b > 0.0).unwrap_or(0.0))
}

impl Track {
    /// Minimal record with every attribute unknown.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: String::new(),
            image: None,
            duration_ms: None,
            uri: None,
            bpm: 0.0,
            key: None,
            energy: None,
            status: TrackStatus::Pending,
        }
    }

    #[must_use]
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: TrackStatus) -> Self {
        self.status = status;
        self
    }

    /// Scalar used by both ordering modes for the given attribute.
    ///
    /// Unknown bpm stays `0`, an unknown key maps to the key sentinel and
    /// missing energy reads as `0`.
    #[must_use]
    pub fn attribute_value(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Bpm => self.bpm,
            Attribute::Key => f64::from(key::key_distance(self.key.as_deref())),
            Attribute::Energy => self.energy.unwrap_or(0.0),
        }
    }

    /// Whether a targeted re-analysis should be issued for this track.
    #[must_use]
    pub fn needs_analysis(&self) -> bool {
        self.status != TrackStatus::Ok || self.bpm <= 0.0
    }
}

/// Analysis outcome reported by the collaborator. Read-only to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    #[serde(alias = "analyzed_audio", alias = "soundnet")]
    Ok,
    #[serde(alias = "failed_download", alias = "error")]
    NoPreview,
    #[default]
    Pending,
}

/// Track attribute usable as a sort criterion or a curve target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Bpm,
    Key,
    Energy,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Bpm, Attribute::Key, Attribute::Energy];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Attribute::Bpm => "bpm",
            Attribute::Key => "key",
            Attribute::Energy => "energy",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bpm" | "tempo" => Ok(Attribute::Bpm),
            "key" => Ok(Attribute::Key),
            "energy" => Ok(Attribute::Energy),
            other => Err(EngineError::UnknownCriterion(other.to_string())),
        }
    }
}

/// Fold a tempo into the 90–180 range DJs usually mean.
///
/// Half- and double-time detections are common in automated analysis, so a
/// reading of 64 becomes 128 and 250 becomes 125. Non-positive input is
/// unknown and stays `0`.
#[must_use]
pub fn normalize_bpm(bpm: f64) -> f64 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return 0.0;
    }
    let mut folded = bpm;
    while folded < 90.0 {
        folded *= 2.0;
    }
    while folded > 180.0 {
        folded /= 2.0;
    }
    (folded * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_collaborator_record() {
        let json = r#"{
            "id": "4uLU6hMCjMI75M1A2tKUQC",
            "name": "Never Gonna Give You Up",
            "artist": "Rick Astley",
            "duration_ms": 213573,
            "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
            "bpm": 113.3,
            "key": "10B",
            "energy": 84.0,
            "status": "analyzed_audio"
        }"#;

        let track: Track = serde_json::from_str(json).expect("record should parse");
        assert_eq!(track.title, "Never Gonna Give You Up");
        assert_eq!(track.status, TrackStatus::Ok);
        assert_eq!(track.key.as_deref(), Some("10B"));
        assert_eq!(track.duration_ms, Some(213_573));
    }

    #[test]
    fn test_deserialize_sparse_record_uses_fallbacks() {
        let track: Track = serde_json::from_str(r#"{"id": "x", "bpm": null, "key": null}"#)
            .expect("sparse record should parse");

        assert_eq!(track.bpm, 0.0);
        assert_eq!(track.key, None);
        assert_eq!(track.energy, None);
        assert_eq!(track.status, TrackStatus::Pending);
        assert!(track.needs_analysis());
    }

    #[test]
    fn test_legacy_failure_statuses_map_to_no_preview() {
        for status in ["no_preview", "failed_download", "error"] {
            let json = format!(r#"{{"id": "x", "status": "{status}"}}"#);
            let track: Track = serde_json::from_str(&json).expect("status should parse");
            assert_eq!(track.status, TrackStatus::NoPreview, "status {status}");
        }
    }

    #[test]
    fn test_attribute_value_fallbacks() {
        let track = Track::new("a", "A");
        assert_eq!(track.attribute_value(Attribute::Bpm), 0.0);
        assert_eq!(track.attribute_value(Attribute::Energy), 0.0);
        assert_eq!(
            track.attribute_value(Attribute::Key),
            f64::from(key::UNKNOWN_KEY_DISTANCE)
        );

        let known = Track::new("b", "B").with_bpm(124.0).with_key("8B").with_energy(61.5);
        assert_eq!(known.attribute_value(Attribute::Bpm), 124.0);
        assert_eq!(known.attribute_value(Attribute::Key), 85.0);
        assert_eq!(known.attribute_value(Attribute::Energy), 61.5);
    }

    #[test]
    fn test_attribute_parsing() {
        assert_eq!("BPM".parse::<Attribute>().unwrap(), Attribute::Bpm);
        assert_eq!(" key ".parse::<Attribute>().unwrap(), Attribute::Key);
        assert_eq!("energy".parse::<Attribute>().unwrap(), Attribute::Energy);
        assert!(matches!(
            "genre".parse::<Attribute>(),
            Err(EngineError::UnknownCriterion(name)) if name == "genre"
        ));
    }

    #[test]
    fn test_normalize_bpm_folds_into_range() {
        assert_eq!(normalize_bpm(0.0), 0.0);
        assert_eq!(normalize_bpm(-12.0), 0.0);
        assert_eq!(normalize_bpm(64.0), 128.0);
        assert_eq!(normalize_bpm(250.0), 125.0);
        assert_eq!(normalize_bpm(123.456), 123.5);
        assert_eq!(normalize_bpm(90.0), 90.0);
        assert_eq!(normalize_bpm(180.0), 180.0);
    }
}
