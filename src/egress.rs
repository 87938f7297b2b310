//! Hand-off of the final order to a persistence collaborator.

use crate::error::{EngineError, Result};
use crate::track::Track;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Most playback references the collaborator accepts per request.
pub const MAX_BATCH: usize = 100;

/// Reference to a created playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
    pub url: String,
}

/// Creates a playlist from an ordered track sequence.
#[async_trait]
pub trait PlaylistPublisher {
    async fn create_playlist(&self, name: &str, tracks: &[Track]) -> Result<PlaylistRef>;
}

/// Validate the name and hand the sequence to `publisher`.
///
/// # Errors
///
/// Returns [`EngineError::BlankPlaylistName`] for a blank name, or whatever
/// the publisher reports.
pub async fn publish<P>(publisher: &P, name: &str, tracks: &[Track]) -> Result<PlaylistRef>
where
    P: PlaylistPublisher + Sync + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::BlankPlaylistName);
    }

    let playlist = publisher.create_playlist(name, tracks).await?;
    info!("Published \"{name}\" with {} tracks: {}", tracks.len(), playlist.url);
    Ok(playlist)
}

/// Playback references in request-sized batches. Tracks without a
/// reference are left out.
#[must_use]
pub fn uri_batches(tracks: &[Track]) -> Vec<Vec<&str>> {
    let uris: Vec<&str> = tracks.iter().filter_map(|t| t.uri.as_deref()).collect();
    uris.chunks(MAX_BATCH).map(<[&str]>::to_vec).collect()
}

/// Publisher that writes each playlist as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePublisher {
    dir: PathBuf,
}

#[derive(Serialize)]
struct PlaylistFile<'a> {
    name: &'a str,
    uris: Vec<Vec<&'a str>>,
    tracks: &'a [Track],
}

impl JsonFilePublisher {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PlaylistPublisher for JsonFilePublisher {
    async fn create_playlist(&self, name: &str, tracks: &[Track]) -> Result<PlaylistRef> {
        let id = slug(name);
        if id.is_empty() {
            return Err(EngineError::Publish(format!("no usable file name in \"{name}\"")));
        }

        let path = self.dir.join(format!("{id}.json"));
        let body = serde_json::to_vec_pretty(&PlaylistFile {
            name,
            uris: uri_batches(tracks),
            tracks,
        })?;
        debug!("Writing {} bytes to {}", body.len(), path.display());
        tokio::fs::write(&path, body).await?;

        Ok(PlaylistRef {
            id,
            url: format!("file://{}", path.display()),
        })
    }
}

/// Lower-case file-name stem: alphanumerics kept, runs of anything else
/// collapsed to `-`.
fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
