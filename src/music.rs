//! Listening-history enrichment
//!
//! Search and audio-feature lookup live behind [`AudioFeatureSource`], which an
//! API client implements. The client receives its credentials explicitly
//! through [`MusicApiConfig`]; nothing here reads global state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::TrendError;

/// Maximum number of track ids per audio-feature request
pub const FEATURE_BATCH_SIZE: usize = 50;

/// Scope requested when acquiring a user token
pub const DEFAULT_SCOPE: &str = "user-read-recently-played";

/// One play from the streaming history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingPlay {
    pub end_time: DateTime<Utc>,
    pub artist_name: String,
    pub track_name: String,
    pub ms_played: u64,
}

/// Audio analysis for a single track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
    pub id: String,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub loudness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub speechiness: Option<f64>,
    pub liveness: Option<f64>,
    pub key: Option<i32>,
    pub mode: Option<i32>,
    pub duration_ms: Option<u64>,
}

/// A play merged with the track it resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedPlay {
    #[serde(flatten)]
    pub play: StreamingPlay,
    pub track_id: String,
    /// `None` when the service has no analysis for the track
    pub features: Option<AudioFeatures>,
}

/// Credentials and redirect settings for the music API client.
///
/// The client secret is never written out by `Debug` or serialization.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicApiConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub username: String,
    pub redirect_url: String,
    pub scope: String,
}

impl MusicApiConfig {
    /// Create a config with the default scope
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            redirect_url: redirect_url.into(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    /// Build a config from `SPOTIFY_*` environment variables
    pub fn from_env() -> Result<Self, TrendError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrendError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| TrendError::MissingField(key.to_string()))
        };

        Ok(Self::new(
            require("SPOTIFY_API_PUBLIC")?,
            require("SPOTIFY_API_PRIVATE")?,
            require("SPOTIFY_USERNAME")?,
            require("SPOTIFY_REDIRECT_URL")?,
        ))
    }
}

impl fmt::Debug for MusicApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MusicApiConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("redirect_url", &self.redirect_url)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Track search and audio-feature lookup against an external service
pub trait AudioFeatureSource {
    /// Resolve a track/artist pair to the id of the best match
    fn search_track(&self, track_name: &str, artist_name: &str) -> Result<String, TrendError>;

    /// Look up features for at most [`FEATURE_BATCH_SIZE`] ids.
    ///
    /// The result is index-aligned with `ids`.
    fn audio_features(&self, ids: &[String]) -> Result<Vec<Option<AudioFeatures>>, TrendError>;
}

/// Split ids into request-sized batches
pub fn feature_batches(ids: &[String]) -> impl Iterator<Item = &[String]> {
    ids.chunks(FEATURE_BATCH_SIZE)
}

/// Resolve every play to a track and attach its audio features
pub fn enrich_plays(
    plays: Vec<StreamingPlay>,
    source: &dyn AudioFeatureSource,
) -> Result<Vec<EnrichedPlay>, TrendError> {
    let ids = plays
        .iter()
        .map(|play| source.search_track(&play.track_name, &play.artist_name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut features = Vec::with_capacity(ids.len());
    for batch in feature_batches(&ids) {
        let found = source.audio_features(batch)?;
        if found.len() != batch.len() {
            return Err(TrendError::MusicApiError(format!(
                "requested features for {} tracks, received {}",
                batch.len(),
                found.len()
            )));
        }
        features.extend(found);
    }

    Ok(plays
        .into_iter()
        .zip(ids)
        .zip(features)
        .map(|((play, track_id), features)| EnrichedPlay {
            play,
            track_id,
            features,
        })
        .collect())
}

/// Aggregate view of a listening history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningSummary {
    pub plays: usize,
    pub total_minutes: f64,
    pub first_play: Option<DateTime<Utc>>,
    pub last_play: Option<DateTime<Utc>>,
    /// Most-played artists, by play count then name
    pub top_artists: Vec<ArtistCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistCount {
    pub artist: String,
    pub plays: usize,
}

/// Summarize plays, keeping the `top` most-played artists
pub fn summarize_plays(plays: &[StreamingPlay], top: usize) -> ListeningSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for play in plays {
        *counts.entry(play.artist_name.as_str()).or_insert(0) += 1;
    }

    let mut top_artists: Vec<ArtistCount> = counts
        .into_iter()
        .map(|(artist, plays)| ArtistCount {
            artist: artist.to_string(),
            plays,
        })
        .collect();
    top_artists.sort_by(|a, b| b.plays.cmp(&a.plays).then_with(|| a.artist.cmp(&b.artist)));
    top_artists.truncate(top);

    ListeningSummary {
        plays: plays.len(),
        total_minutes: plays.iter().map(|p| p.ms_played as f64).sum::<f64>() / 60_000.0,
        first_play: plays.iter().map(|p| p.end_time).min(),
        last_play: plays.iter().map(|p| p.end_time).max(),
        top_artists,
    }
}
