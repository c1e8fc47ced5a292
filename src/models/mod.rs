//! Domain models for the playlist ingestion service
//!
//! These are the persistence-facing records produced by the source handlers
//! and stored through the repository layer. Relationships are expressed as
//! explicit foreign-key identifiers rather than ORM-managed links; joins
//! happen at the repository level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Playlist source configuration (M3U URL or Xtream Codes account)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub playlist_type: PlaylistType,
    pub last_updated: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaylistType {
    M3u,
    Xtream,
}

/// Kind of content a category groups together
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    Live,
    Movie,
    Series,
}

/// Content category, owned by a playlist
///
/// Invariant: `content_kind` matches the kind of every record referencing
/// this category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub name: String,
    pub content_kind: ContentKind,
}

/// Live TV channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Uuid,
    pub playlist_id: Uuid,
    /// Unset when the source's category id did not match a fetched category
    pub category_id: Option<Uuid>,
    pub name: String,
    pub stream_url: String,
    pub logo_url: Option<String>,
    /// External EPG channel id (tvg-id / epg_channel_id)
    pub epg_id: Option<String>,
}

/// VOD movie entry with descriptive metadata from the Xtream listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub stream_url: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub year: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub rating_5based: Option<f64>,
    pub stream_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub trailer: Option<String>,
    pub added: Option<String>,
}

/// TV series entry; episodes are harvested on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvSeries {
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub cover_url: Option<String>,
    /// Xtream-side series id, needed for the episode fetch
    pub series_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub last_modified: Option<String>,
    pub youtube_trailer: Option<String>,
}

/// Single episode of a series
///
/// Season/episode numbers are non-negative and default to 0 when the source
/// data is malformed. No uniqueness is enforced; re-importing a series
/// duplicates its episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvEpisode {
    pub id: Uuid,
    pub series_id: Uuid,
    pub title: String,
    pub stream_url: String,
    pub season_number: i32,
    pub episode_number: i32,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub stream_id: Option<String>,
}

/// EPG schedule entry keyed by the external XMLTV channel id
///
/// EPG records are not owned by a playlist; they are replaced wholesale on
/// the next Xtream ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpgProgram {
    pub id: Uuid,
    pub channel_xmltv_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
}

/// Channel metadata from the XMLTV `<channel>` elements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpgChannelInfo {
    pub id: Uuid,
    pub channel_xmltv_id: String,
    pub display_name: String,
    pub icon_url: Option<String>,
}

/// Request for creating a playlist through the service layer
#[derive(Debug, Clone)]
pub struct PlaylistCreateRequest {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub playlist_type: PlaylistType,
}

impl PlaylistCreateRequest {
    /// Materialize the request into a playlist record with a fresh id
    pub fn into_playlist(self) -> Playlist {
        Playlist {
            id: Uuid::new_v4(),
            name: self.name,
            url: self.url,
            username: self.username,
            password: self.password,
            playlist_type: self.playlist_type,
            last_updated: Utc::now(),
        }
    }
}
