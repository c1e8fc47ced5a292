//! Xtream Codes source handler
//!
//! Harvests the `player_api.php` endpoint families of an Xtream panel:
//! live categories and streams, VOD categories and streams, series
//! categories and series listings, plus the per-series episode fetch
//! (`get_series_info`). The endpoint families are fetched strictly
//! sequentially; stream URLs are synthesized from the panel base URL,
//! credentials, stream id and container extension.
//!
//! Panels are notoriously sloppy about JSON types (ids arrive as strings or
//! numbers depending on the backend version), so all id-like fields go
//! through lenient deserializers.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{Category, Channel, ContentKind, Movie, Playlist, TvEpisode, TvSeries};
use crate::services::progress::{IngestStage, ProgressReporter};
use crate::utils::url::UrlUtils;
use crate::utils::DecompressingHttpClient;

/// Everything a full Xtream harvest produces
#[derive(Debug, Default)]
pub struct XtreamHarvest {
    pub categories: Vec<Category>,
    pub channels: Vec<Channel>,
    pub movies: Vec<Movie>,
    pub series: Vec<TvSeries>,
}

/// Xtream Codes source handler
pub struct XtreamSourceHandler<C: DecompressingHttpClient> {
    http_client: C,
}

/// Resolved credentials and base URL for one panel
struct PanelAccess {
    base_url: String,
    username: String,
    password: String,
}

impl<C: DecompressingHttpClient> XtreamSourceHandler<C> {
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    fn panel_access(&self, playlist: &Playlist) -> AppResult<PanelAccess> {
        let base_url = UrlUtils::base_url(&playlist.url)
            .map_err(|e| AppError::validation(format!("Invalid Xtream URL '{}': {e}", playlist.url)))?;
        let username = playlist
            .username
            .clone()
            .ok_or_else(|| AppError::validation("Xtream playlist requires a username"))?;
        let password = playlist
            .password
            .clone()
            .ok_or_else(|| AppError::validation("Xtream playlist requires a password"))?;

        Ok(PanelAccess {
            base_url,
            username,
            password,
        })
    }

    /// Fetch all content families for the playlist, strictly sequentially
    pub async fn harvest(
        &self,
        playlist: &Playlist,
        progress: &ProgressReporter,
    ) -> AppResult<XtreamHarvest> {
        let access = self.panel_access(playlist)?;
        let mut harvest = XtreamHarvest::default();

        progress.message(IngestStage::Fetching, "Fetching live TV data...");
        let live_categories = self
            .fetch_categories(&access, "get_live_categories", ContentKind::Live, playlist)
            .await?;
        progress.message(
            IngestStage::Fetching,
            format!(
                "Found {} live categories. Fetching channels...",
                live_categories.len()
            ),
        );
        harvest.channels = self.fetch_live_streams(&access, playlist, &live_categories).await?;
        progress.message(
            IngestStage::Fetching,
            format!("Found {} live channels.", harvest.channels.len()),
        );

        progress.message(IngestStage::Fetching, "Fetching movie data...");
        let movie_categories = self
            .fetch_categories(&access, "get_vod_categories", ContentKind::Movie, playlist)
            .await?;
        progress.message(
            IngestStage::Fetching,
            format!(
                "Found {} movie categories. Fetching movies...",
                movie_categories.len()
            ),
        );
        harvest.movies = self.fetch_vod_streams(&access, playlist, &movie_categories).await?;
        progress.message(
            IngestStage::Fetching,
            format!("Found {} movies.", harvest.movies.len()),
        );

        progress.message(IngestStage::Fetching, "Fetching series data...");
        let series_categories = self
            .fetch_categories(&access, "get_series_categories", ContentKind::Series, playlist)
            .await?;
        progress.message(
            IngestStage::Fetching,
            format!(
                "Found {} series categories. Fetching series...",
                series_categories.len()
            ),
        );
        harvest.series = self.fetch_series(&access, playlist, &series_categories).await?;
        progress.message(
            IngestStage::Fetching,
            format!("Found {} series.", harvest.series.len()),
        );

        harvest.categories = live_categories
            .into_values()
            .chain(movie_categories.into_values())
            .chain(series_categories.into_values())
            .collect();

        info!(
            "Xtream harvest for '{}': {} categories, {} channels, {} movies, {} series",
            playlist.name,
            harvest.categories.len(),
            harvest.channels.len(),
            harvest.movies.len(),
            harvest.series.len()
        );

        Ok(harvest)
    }

    /// Fetch a category family, keyed by the panel-side category id
    async fn fetch_categories(
        &self,
        access: &PanelAccess,
        action: &str,
        content_kind: ContentKind,
        playlist: &Playlist,
    ) -> AppResult<HashMap<String, Category>> {
        let url = UrlUtils::build_xtream_api_url(
            &access.base_url,
            &access.username,
            &access.password,
            action,
        );
        let raw: Vec<XtreamCategory> = self.http_client.fetch_json(&url).await?;

        let mut categories = HashMap::with_capacity(raw.len());
        for entry in raw {
            categories.insert(
                entry.category_id,
                Category {
                    id: Uuid::new_v4(),
                    playlist_id: playlist.id,
                    name: entry.category_name,
                    content_kind,
                },
            );
        }
        Ok(categories)
    }

    async fn fetch_live_streams(
        &self,
        access: &PanelAccess,
        playlist: &Playlist,
        categories: &HashMap<String, Category>,
    ) -> AppResult<Vec<Channel>> {
        let url = UrlUtils::build_xtream_api_url(
            &access.base_url,
            &access.username,
            &access.password,
            "get_live_streams",
        );
        let raw: Vec<XtreamLiveStream> = self.http_client.fetch_json(&url).await?;

        let channels = raw
            .into_iter()
            .map(|stream| {
                let stream_url = format!(
                    "{}/live/{}/{}/{}.ts",
                    access.base_url, access.username, access.password, stream.stream_id
                );
                Channel {
                    id: Uuid::new_v4(),
                    playlist_id: playlist.id,
                    category_id: resolve_category(&stream.category_id, categories),
                    name: stream.name,
                    stream_url,
                    logo_url: stream.stream_icon,
                    epg_id: stream.epg_channel_id,
                }
            })
            .collect();

        Ok(channels)
    }

    async fn fetch_vod_streams(
        &self,
        access: &PanelAccess,
        playlist: &Playlist,
        categories: &HashMap<String, Category>,
    ) -> AppResult<Vec<Movie>> {
        let url = UrlUtils::build_xtream_api_url(
            &access.base_url,
            &access.username,
            &access.password,
            "get_vod_streams",
        );
        let raw: Vec<XtreamVodStream> = self.http_client.fetch_json(&url).await?;

        let movies = raw
            .into_iter()
            .map(|vod| map_vod_stream(vod, access, playlist, categories))
            .collect();

        Ok(movies)
    }

    async fn fetch_series(
        &self,
        access: &PanelAccess,
        playlist: &Playlist,
        categories: &HashMap<String, Category>,
    ) -> AppResult<Vec<TvSeries>> {
        let url = UrlUtils::build_xtream_api_url(
            &access.base_url,
            &access.username,
            &access.password,
            "get_series",
        );
        let raw: Vec<XtreamSeriesListing> = self.http_client.fetch_json(&url).await?;

        let series = raw
            .into_iter()
            .map(|listing| TvSeries {
                id: Uuid::new_v4(),
                playlist_id: playlist.id,
                category_id: resolve_category(&listing.category_id, categories),
                name: listing.name,
                cover_url: listing.cover,
                series_id: listing.series_id,
                tmdb_id: listing.tmdb,
                last_modified: listing.last_modified,
                youtube_trailer: listing.youtube_trailer,
            })
            .collect();

        Ok(series)
    }

    /// Fetch and flatten all episodes for one series
    ///
    /// Any failure is logged and reported, then degraded to an empty list;
    /// there is no partial-episode retry.
    pub async fn fetch_series_episodes(
        &self,
        playlist: &Playlist,
        series: &TvSeries,
        progress: &ProgressReporter,
    ) -> Vec<TvEpisode> {
        progress.message(
            IngestStage::Fetching,
            format!("Fetching episodes for {}...", series.name),
        );

        match self.try_fetch_series_episodes(playlist, series).await {
            Ok(episodes) => {
                progress.message(
                    IngestStage::Fetching,
                    format!("Found {} episodes for {}", episodes.len(), series.name),
                );
                episodes
            }
            Err(e) => {
                warn!("Failed to fetch episodes for '{}': {e}", series.name);
                progress.message(IngestStage::Failed, format!("Failed to fetch episodes: {e}"));
                Vec::new()
            }
        }
    }

    async fn try_fetch_series_episodes(
        &self,
        playlist: &Playlist,
        series: &TvSeries,
    ) -> AppResult<Vec<TvEpisode>> {
        let access = self.panel_access(playlist)?;
        let series_panel_id = series
            .series_id
            .as_deref()
            .ok_or_else(|| AppError::validation("Series has no panel-side id"))?;

        let url = format!(
            "{}&series_id={}",
            UrlUtils::build_xtream_api_url(
                &access.base_url,
                &access.username,
                &access.password,
                "get_series_info",
            ),
            series_panel_id
        );

        let info: XtreamSeriesInfo = self.http_client.fetch_json(&url).await?;
        let Some(seasons) = info.episodes else {
            return Ok(Vec::new());
        };

        let mut episodes = Vec::new();
        for (season_key, season_value) in seasons {
            let season_number = parse_season_number(&season_key);

            let season_episodes: Vec<XtreamEpisode> =
                match serde_json::from_value(season_value) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(
                            "Skipping malformed season '{}' for series '{}': {e}",
                            season_key, series.name
                        );
                        continue;
                    }
                };

            for episode in season_episodes {
                episodes.push(map_episode(episode, season_number, series, &access));
            }
        }

        debug!(
            "Flattened {} episodes for series '{}'",
            episodes.len(),
            series.name
        );
        Ok(episodes)
    }
}

/// Resolve a panel category id against the fetched categories
///
/// Unmatched or absent ids leave the reference unset.
fn resolve_category(
    category_id: &Option<String>,
    categories: &HashMap<String, Category>,
) -> Option<Uuid> {
    category_id
        .as_deref()
        .and_then(|id| categories.get(id))
        .map(|category| category.id)
}

/// `season_N` maps to season N; malformed keys default to 0
fn parse_season_number(season_key: &str) -> i32 {
    season_key
        .strip_prefix("season_")
        .unwrap_or(season_key)
        .parse()
        .unwrap_or(0)
}

fn map_vod_stream(
    vod: XtreamVodStream,
    access: &PanelAccess,
    playlist: &Playlist,
    categories: &HashMap<String, Category>,
) -> Movie {
    let container = vod.container_extension.as_deref().unwrap_or("mp4");
    let stream_url = format!(
        "{}/movie/{}/{}/{}.{}",
        access.base_url, access.username, access.password, vod.stream_id, container
    );

    // The nested info object takes precedence over the listing fields
    let info = vod.info.unwrap_or_default();

    Movie {
        id: Uuid::new_v4(),
        playlist_id: playlist.id,
        category_id: resolve_category(&vod.category_id, categories),
        name: vod.name,
        stream_url,
        cover_url: vod.stream_icon,
        description: info.plot.or(vod.plot),
        year: info.releasedate.or(vod.releasedate),
        duration: info.duration.or(vod.duration),
        rating: info.rating.or(vod.rating),
        rating_5based: info.rating_5based.or(vod.rating_5based),
        stream_id: Some(vod.stream_id),
        tmdb_id: vod.tmdb,
        trailer: info.trailer.or(vod.trailer),
        added: vod.added,
    }
}

fn map_episode(
    episode: XtreamEpisode,
    season_number: i32,
    series: &TvSeries,
    access: &PanelAccess,
) -> TvEpisode {
    let episode_number = episode
        .episode_num
        .or(episode.episode)
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    let title = episode
        .title
        .unwrap_or_else(|| format!("Episode {episode_number}"));

    let container = episode.container_extension.as_deref().unwrap_or("mp4");
    let stream_id = episode.id.or(episode.stream_id);
    let stream_url = match &stream_id {
        Some(id) => format!(
            "{}/series/{}/{}/{}.{}",
            access.base_url, access.username, access.password, id, container
        ),
        None => String::new(),
    };

    let info = episode.info.unwrap_or_default();

    // Layered fallback: nested info, then direct fields, then series level
    let cover_url = info
        .movie_image
        .or(episode.cover)
        .or_else(|| series.cover_url.clone());
    let description = info.plot.or(episode.plot).or(episode.overview);
    let duration = info.duration.or(episode.duration);

    TvEpisode {
        id: Uuid::new_v4(),
        series_id: series.id,
        title,
        stream_url,
        season_number,
        episode_number,
        cover_url,
        description,
        duration,
        stream_id,
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct XtreamCategory {
    #[serde(deserialize_with = "string_or_number")]
    category_id: String,
    category_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct XtreamLiveStream {
    name: String,
    #[serde(deserialize_with = "string_or_number")]
    stream_id: String,
    #[serde(default)]
    stream_icon: Option<String>,
    #[serde(default)]
    epg_channel_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    category_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct XtreamVodStream {
    name: String,
    #[serde(deserialize_with = "string_or_number")]
    stream_id: String,
    #[serde(default)]
    stream_icon: Option<String>,
    #[serde(default)]
    container_extension: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    category_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    tmdb: Option<String>,
    #[serde(default)]
    added: Option<String>,
    #[serde(default)]
    info: Option<XtreamVodInfo>,
    // Listing-level fallbacks for panels that inline the metadata
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    releasedate: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    duration: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "optional_lenient_f64")]
    rating_5based: Option<f64>,
    #[serde(default)]
    trailer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct XtreamVodInfo {
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    releasedate: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    duration: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "optional_lenient_f64")]
    rating_5based: Option<f64>,
    #[serde(default)]
    trailer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct XtreamSeriesListing {
    name: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    series_id: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    category_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    tmdb: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    last_modified: Option<String>,
    #[serde(default)]
    youtube_trailer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XtreamSeriesInfo {
    /// Keyed `season_N` (occasionally a bare number) to an episode array
    #[serde(default)]
    episodes: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
struct XtreamEpisode {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    stream_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    episode_num: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    episode: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    container_extension: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    duration: Option<String>,
    #[serde(default)]
    info: Option<XtreamEpisodeInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct XtreamEpisodeInfo {
    #[serde(default)]
    movie_image: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    duration: Option<String>,
}

// Panels disagree on whether ids are JSON strings or numbers; accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct OptionalStringOrNumberVisitor;

    impl<'de> Visitor<'de> for OptionalStringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            if value.is_empty() {
                Ok(None)
            } else {
                Ok(Some(value.to_string()))
            }
        }
    }

    deserializer.deserialize_any(OptionalStringOrNumberVisitor)
}

fn optional_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct OptionalLenientF64Visitor;

    impl<'de> Visitor<'de> for OptionalLenientF64Visitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a number, numeric string, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value.parse().ok())
        }
    }

    deserializer.deserialize_any(OptionalLenientF64Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistType;
    use crate::utils::StandardHttpClient;
    use chrono::Utc;

    fn test_playlist() -> Playlist {
        Playlist {
            id: Uuid::new_v4(),
            name: "Panel".to_string(),
            url: "http://panel.example.com:8080".to_string(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            playlist_type: PlaylistType::Xtream,
            last_updated: Utc::now(),
        }
    }

    fn test_access() -> PanelAccess {
        PanelAccess {
            base_url: "http://panel.example.com:8080".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        }
    }

    fn category_map(playlist: &Playlist, panel_id: &str, kind: ContentKind) -> HashMap<String, Category> {
        let mut map = HashMap::new();
        map.insert(
            panel_id.to_string(),
            Category {
                id: Uuid::new_v4(),
                playlist_id: playlist.id,
                name: "Some Category".to_string(),
                content_kind: kind,
            },
        );
        map
    }

    #[test]
    fn season_keys_parse_with_default_zero() {
        assert_eq!(parse_season_number("season_3"), 3);
        assert_eq!(parse_season_number("2"), 2);
        assert_eq!(parse_season_number("season_x"), 0);
        assert_eq!(parse_season_number("bonus"), 0);
    }

    #[test]
    fn live_streams_accept_numeric_and_string_ids() {
        let json = r#"[
            {"name": "One", "stream_id": 101, "category_id": "5", "epg_channel_id": "one.tv"},
            {"name": "Two", "stream_id": "102", "category_id": 5}
        ]"#;
        let streams: Vec<XtreamLiveStream> = serde_json::from_str(json).unwrap();
        assert_eq!(streams[0].stream_id, "101");
        assert_eq!(streams[1].stream_id, "102");
        assert_eq!(streams[1].category_id.as_deref(), Some("5"));
    }

    #[test]
    fn category_linkage_matches_or_leaves_unset() {
        let playlist = test_playlist();
        let access = test_access();
        let categories = category_map(&playlist, "7", ContentKind::Movie);
        let expected_id = categories["7"].id;

        let json = r#"[
            {"name": "Matched", "stream_id": 1, "category_id": "7"},
            {"name": "Unmatched", "stream_id": 2, "category_id": "99"},
            {"name": "Absent", "stream_id": 3}
        ]"#;
        let raw: Vec<XtreamVodStream> = serde_json::from_str(json).unwrap();
        let movies: Vec<Movie> = raw
            .into_iter()
            .map(|vod| map_vod_stream(vod, &access, &playlist, &categories))
            .collect();

        assert_eq!(movies[0].category_id, Some(expected_id));
        assert_eq!(movies[1].category_id, None);
        assert_eq!(movies[2].category_id, None);
    }

    #[test]
    fn vod_stream_url_uses_container_extension() {
        let playlist = test_playlist();
        let access = test_access();
        let json = r#"[{"name": "Film", "stream_id": 42, "container_extension": "mkv"}]"#;
        let raw: Vec<XtreamVodStream> = serde_json::from_str(json).unwrap();
        let movie = map_vod_stream(raw.into_iter().next().unwrap(), &access, &playlist, &HashMap::new());
        assert_eq!(
            movie.stream_url,
            "http://panel.example.com:8080/movie/user/pass/42.mkv"
        );
    }

    #[test]
    fn vod_info_object_takes_precedence() {
        let playlist = test_playlist();
        let access = test_access();
        let json = r#"[{
            "name": "Film",
            "stream_id": 1,
            "plot": "listing plot",
            "rating_5based": "3.5",
            "info": {"plot": "info plot", "duration": "01:30:00"}
        }]"#;
        let raw: Vec<XtreamVodStream> = serde_json::from_str(json).unwrap();
        let movie = map_vod_stream(raw.into_iter().next().unwrap(), &access, &playlist, &HashMap::new());
        assert_eq!(movie.description.as_deref(), Some("info plot"));
        assert_eq!(movie.duration.as_deref(), Some("01:30:00"));
        assert_eq!(movie.rating_5based, Some(3.5));
    }

    #[test]
    fn episode_metadata_falls_back_in_layers() {
        let playlist = test_playlist();
        let access = test_access();
        let series = TvSeries {
            id: Uuid::new_v4(),
            playlist_id: playlist.id,
            category_id: None,
            name: "Show".to_string(),
            cover_url: Some("http://covers/series.jpg".to_string()),
            series_id: Some("10".to_string()),
            tmdb_id: None,
            last_modified: None,
            youtube_trailer: None,
        };

        // Episode with a full info object: info wins
        let with_info: XtreamEpisode = serde_json::from_str(
            r#"{"id": 1, "episode_num": 1, "title": "Pilot",
                "info": {"movie_image": "http://covers/ep1.jpg", "plot": "info plot", "duration": 1800}}"#,
        )
        .unwrap();
        let episode = map_episode(with_info, 1, &series, &access);
        assert_eq!(episode.cover_url.as_deref(), Some("http://covers/ep1.jpg"));
        assert_eq!(episode.description.as_deref(), Some("info plot"));
        assert_eq!(episode.duration.as_deref(), Some("1800"));
        assert_eq!(
            episode.stream_url,
            "http://panel.example.com:8080/series/user/pass/1.mp4"
        );

        // No info, no cover: falls back to the series cover
        let bare: XtreamEpisode =
            serde_json::from_str(r#"{"id": 2, "episode": "2", "overview": "overview text"}"#)
                .unwrap();
        let episode = map_episode(bare, 1, &series, &access);
        assert_eq!(episode.cover_url.as_deref(), Some("http://covers/series.jpg"));
        assert_eq!(episode.description.as_deref(), Some("overview text"));
        assert_eq!(episode.title, "Episode 2");
        assert_eq!(episode.episode_number, 2);
    }

    #[test]
    fn episode_without_stream_id_gets_empty_url() {
        let playlist = test_playlist();
        let access = test_access();
        let series = TvSeries {
            id: Uuid::new_v4(),
            playlist_id: playlist.id,
            category_id: None,
            name: "Show".to_string(),
            cover_url: None,
            series_id: Some("10".to_string()),
            tmdb_id: None,
            last_modified: None,
            youtube_trailer: None,
        };
        let episode: XtreamEpisode = serde_json::from_str(r#"{"title": "Lost"}"#).unwrap();
        let mapped = map_episode(episode, 0, &series, &access);
        assert!(mapped.stream_url.is_empty());
        assert_eq!(mapped.season_number, 0);
        assert_eq!(mapped.episode_number, 0);
    }

    #[test]
    fn malformed_season_payloads_are_skipped() {
        let info: XtreamSeriesInfo = serde_json::from_str(
            r#"{"episodes": {"season_1": [{"id": 1, "title": "Ok"}], "season_2": "garbage"}}"#,
        )
        .unwrap();
        let seasons = info.episodes.unwrap();
        let good: Result<Vec<XtreamEpisode>, _> =
            serde_json::from_value(seasons["season_1"].clone());
        let bad: Result<Vec<XtreamEpisode>, _> =
            serde_json::from_value(seasons["season_2"].clone());
        assert!(good.is_ok());
        assert!(bad.is_err());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let handler = XtreamSourceHandler::new(
            StandardHttpClient::new(
                std::time::Duration::from_secs(1),
                std::time::Duration::from_secs(1),
            )
            .unwrap(),
        );
        let mut playlist = test_playlist();
        playlist.username = None;
        assert!(handler.panel_access(&playlist).is_err());
    }
}
