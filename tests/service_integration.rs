//! Playlist service integration tests
//!
//! Covers the orchestration layer end to end against a stub HTTP transport:
//! request validation, not-found handling, the full clear, reading back
//! stored episodes, cooperative cancellation during EPG ingestion and the
//! non-fatal EPG failure path.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use playlist_ingest::{
    config::{Config, DatabaseConfig},
    database::{
        repositories::{ChannelRepository, PlaylistRepository, TvEpisodeRepository, TvSeriesRepository},
        Database,
    },
    errors::{AppError, AppResult},
    models::*,
    services::{PlaylistService, ProgressReporter},
    utils::DecompressingHttpClient,
};

/// Canned-response transport for driving ingestion without a provider
#[derive(Clone, Default)]
struct StubHttpClient {
    m3u_body: Option<String>,
    epg_body: Option<String>,
    fail_epg: bool,
}

#[async_trait]
impl DecompressingHttpClient for StubHttpClient {
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        if url.contains("xmltv.php") {
            if self.fail_epg {
                return Err(AppError::source_error("guide unavailable"));
            }
            return self
                .epg_body
                .clone()
                .ok_or_else(|| AppError::source_error("no guide configured"));
        }

        if url.contains("player_api.php") {
            let action = url
                .split("action=")
                .nth(1)
                .and_then(|rest| rest.split('&').next())
                .unwrap_or("");
            let body = match action {
                "get_live_categories" => {
                    r#"[{"category_id":"1","category_name":"News"}]"#
                }
                "get_live_streams" => {
                    r#"[{"name":"One","stream_id":11,"category_id":"1"},
                        {"name":"Two","stream_id":12,"category_id":"1"}]"#
                }
                "get_vod_categories" | "get_vod_streams" | "get_series_categories"
                | "get_series" => "[]",
                other => {
                    return Err(AppError::source_error(format!("unexpected action {other}")))
                }
            };
            return Ok(body.to_string());
        }

        self.m3u_body
            .clone()
            .ok_or_else(|| AppError::source_error("no playlist configured"))
    }

    async fn fetch_json<T: DeserializeOwned + Send>(&self, url: &str) -> AppResult<T> {
        let text = self.fetch_text(url).await?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::source_error(format!("stub JSON error: {e}")))
    }

    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        Ok(self.fetch_text(url).await?.into_bytes())
    }
}

const EPG_GUIDE: &str = r#"<tv>
  <channel id="one.tv"><display-name>Channel One</display-name></channel>
  <programme channel="one.tv" start="20260829180000 +0000"><title>News</title></programme>
  <programme channel="one.tv" start="20260829190000 +0000"><title>Late</title></programme>
</tv>"#;

async fn create_database(dir: &TempDir) -> (Database, Config) {
    let mut config = Config::default();
    config.database = DatabaseConfig {
        url: format!("sqlite://{}/test.db", dir.path().display()),
        max_connections: Some(2),
    };
    let database = Database::new(&config.database).await.expect("Failed to open database");
    database.migrate().await.expect("Failed to run migrations");
    (database, config)
}

async fn create_service(dir: &TempDir) -> (Database, PlaylistService) {
    let (database, config) = create_database(dir).await;
    let service = PlaylistService::new(&database, &config).expect("Failed to build service");
    (database, service)
}

async fn create_stub_service(
    dir: &TempDir,
    client: StubHttpClient,
) -> (Database, PlaylistService<StubHttpClient>) {
    let (database, config) = create_database(dir).await;
    let service = PlaylistService::with_http_client(&database, &config, client);
    (database, service)
}

fn xtream_request(name: &str) -> PlaylistCreateRequest {
    PlaylistCreateRequest {
        name: name.to_string(),
        url: "http://panel.example.com:8080".to_string(),
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        playlist_type: PlaylistType::Xtream,
    }
}

fn sample_playlist(name: &str) -> Playlist {
    Playlist {
        id: Uuid::new_v4(),
        name: name.to_string(),
        url: "http://provider.example.com:8080".to_string(),
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        playlist_type: PlaylistType::Xtream,
        last_updated: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn add_playlist_rejects_blank_fields() {
    let dir = TempDir::new().unwrap();
    let (_db, service) = create_service(&dir).await;
    let progress = ProgressReporter::disabled();
    let cancel = CancellationToken::new();

    let no_name = PlaylistCreateRequest {
        name: "  ".to_string(),
        url: "http://provider.example.com/playlist.m3u".to_string(),
        username: None,
        password: None,
        playlist_type: PlaylistType::M3u,
    };
    let err = service
        .add_playlist(no_name, &progress, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let no_url = PlaylistCreateRequest {
        name: "Valid".to_string(),
        url: String::new(),
        username: None,
        password: None,
        playlist_type: PlaylistType::M3u,
    };
    let err = service
        .add_playlist(no_url, &progress, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    // Nothing was persisted
    assert!(service.list_playlists().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_resources_map_to_not_found() {
    let dir = TempDir::new().unwrap();
    let (_db, service) = create_service(&dir).await;
    let progress = ProgressReporter::disabled();
    let cancel = CancellationToken::new();

    let err = service.delete_playlist(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = service
        .refresh_playlist(Uuid::new_v4(), &progress, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = service
        .fetch_series_episodes(Uuid::new_v4(), &progress)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn stored_episodes_are_read_back_in_order() {
    let dir = TempDir::new().unwrap();
    let (database, service) = create_service(&dir).await;
    let connection = database.connection();

    let playlist = sample_playlist("Shows");
    PlaylistRepository::new(connection.clone())
        .create(&playlist)
        .await
        .unwrap();

    let series = TvSeries {
        id: Uuid::new_v4(),
        playlist_id: playlist.id,
        category_id: None,
        name: "Show".to_string(),
        cover_url: None,
        series_id: Some("9".to_string()),
        tmdb_id: None,
        last_modified: None,
        youtube_trailer: None,
    };
    TvSeriesRepository::new(connection.clone())
        .bulk_insert(&[series.clone()])
        .await
        .unwrap();

    let episodes = vec![
        TvEpisode {
            id: Uuid::new_v4(),
            series_id: series.id,
            title: "Second".to_string(),
            stream_url: String::new(),
            season_number: 1,
            episode_number: 2,
            cover_url: None,
            description: None,
            duration: None,
            stream_id: None,
        },
        TvEpisode {
            id: Uuid::new_v4(),
            series_id: series.id,
            title: "First".to_string(),
            stream_url: String::new(),
            season_number: 1,
            episode_number: 1,
            cover_url: None,
            description: None,
            duration: None,
            stream_id: None,
        },
    ];
    TvEpisodeRepository::new(connection)
        .bulk_insert(&episodes)
        .await
        .unwrap();

    let stored = service.stored_episodes(series.id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].title, "First");
    assert_eq!(stored[1].title, "Second");

    let listed = service.list_series(playlist.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn clear_database_removes_everything() {
    let dir = TempDir::new().unwrap();
    let (database, service) = create_service(&dir).await;
    let connection = database.connection();

    let playlist = sample_playlist("Soon Gone");
    PlaylistRepository::new(connection.clone())
        .create(&playlist)
        .await
        .unwrap();
    ChannelRepository::new(connection)
        .bulk_insert(&[Channel {
            id: Uuid::new_v4(),
            playlist_id: playlist.id,
            category_id: None,
            name: "One".to_string(),
            stream_url: "http://provider.example.com/live/1.ts".to_string(),
            logo_url: None,
            epg_id: None,
        }])
        .await
        .unwrap();

    service.clear_database().await.unwrap();

    assert!(service.list_playlists().await.unwrap().is_empty());
    let summary = service.content_summary().await.unwrap();
    assert_eq!(summary.channels, 0);
    assert_eq!(summary.categories, 0);
    assert_eq!(summary.epg_programs, 0);
}

#[tokio::test]
async fn xtream_ingestion_stores_content_and_epg() {
    let dir = TempDir::new().unwrap();
    let client = StubHttpClient {
        epg_body: Some(EPG_GUIDE.to_string()),
        ..Default::default()
    };
    let (_db, service) = create_stub_service(&dir, client).await;
    let progress = ProgressReporter::disabled();
    let cancel = CancellationToken::new();

    let playlist = service
        .add_playlist(xtream_request("Panel"), &progress, &cancel)
        .await
        .unwrap();

    let summary = service.content_summary().await.unwrap();
    assert_eq!(summary.categories, 1);
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.epg_programs, 2);
    assert_eq!(summary.epg_channels, 1);

    let listed = service.list_playlists().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, playlist.id);
}

#[tokio::test]
async fn cancelled_token_aborts_epg_but_keeps_harvested_content() {
    let dir = TempDir::new().unwrap();
    let client = StubHttpClient {
        epg_body: Some(EPG_GUIDE.to_string()),
        ..Default::default()
    };
    let (_db, service) = create_stub_service(&dir, client).await;
    let progress = ProgressReporter::disabled();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service
        .add_playlist(xtream_request("Panel"), &progress, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Cancelled { .. }));

    // Content committed before the checkpoint stays committed; no EPG batch
    // was stored
    let summary = service.content_summary().await.unwrap();
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.categories, 1);
    assert_eq!(summary.epg_programs, 0);
    assert_eq!(summary.epg_channels, 0);
}

#[tokio::test]
async fn epg_failure_does_not_fail_the_ingestion() {
    let dir = TempDir::new().unwrap();
    let client = StubHttpClient {
        fail_epg: true,
        ..Default::default()
    };
    let (_db, service) = create_stub_service(&dir, client).await;
    let progress = ProgressReporter::disabled();
    let cancel = CancellationToken::new();

    let playlist = service
        .add_playlist(xtream_request("Panel"), &progress, &cancel)
        .await
        .unwrap();

    let summary = service.content_summary().await.unwrap();
    assert_eq!(summary.channels, 2);
    assert_eq!(summary.epg_programs, 0);
    assert!(service
        .list_playlists()
        .await
        .unwrap()
        .iter()
        .any(|p| p.id == playlist.id));
}

#[tokio::test]
async fn refresh_appends_content_and_bumps_last_updated() {
    let dir = TempDir::new().unwrap();
    let client = StubHttpClient {
        m3u_body: Some(
            "#EXTM3U\n\
             #EXTINF:-1 group-title=\"News\",One\n\
             http://host/1.ts\n\
             #EXTINF:-1 group-title=\"News\",Two\n\
             http://host/2.ts\n"
                .to_string(),
        ),
        ..Default::default()
    };
    let (_db, service) = create_stub_service(&dir, client).await;
    let progress = ProgressReporter::disabled();
    let cancel = CancellationToken::new();

    let request = PlaylistCreateRequest {
        name: "Feed".to_string(),
        url: "http://host/playlist.m3u".to_string(),
        username: None,
        password: None,
        playlist_type: PlaylistType::M3u,
    };
    let created = service.add_playlist(request, &progress, &cancel).await.unwrap();
    assert_eq!(service.content_summary().await.unwrap().channels, 2);

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let refreshed = service
        .refresh_playlist(created.id, &progress, &cancel)
        .await
        .unwrap();

    // Refresh appends rather than deduplicating
    assert_eq!(service.content_summary().await.unwrap().channels, 4);

    // A successful refresh moves the timestamp forward, in memory and in
    // the stored row
    assert!(refreshed.last_updated > created.last_updated);
    let stored = service.list_playlists().await.unwrap();
    assert!(stored[0].last_updated > created.last_updated);
}
