//! Playlist ingestion orchestration
//!
//! Coordinates the source handlers and repositories for the full playlist
//! lifecycle: add, refresh, on-demand episode harvesting, listing, cascading
//! delete and full clear. Ingestion progress is surfaced through a
//! [`ProgressReporter`]; long-running EPG ingestion honors a
//! [`CancellationToken`] checked before every batch store.
//!
//! Re-ingesting a playlist appends rather than deduplicates: adding the same
//! source twice doubles its content. Deduplication is left to the caller.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::database::repositories::{
    CategoryRepository, ChannelRepository, EpgRepository, MovieRepository, PlaylistRepository,
    TvEpisodeRepository, TvSeriesRepository,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Playlist, PlaylistCreateRequest, PlaylistType, TvEpisode, TvSeries,
};
use crate::sources::{M3uSourceHandler, XmltvIngestor, XtreamSourceHandler};
use crate::utils::url::UrlUtils;
use crate::utils::{DecompressingHttpClient, StandardHttpClient};

use super::progress::{IngestStage, ProgressEvent, ProgressReporter};

/// High-level content counts across the whole store
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentSummary {
    pub categories: u64,
    pub channels: u64,
    pub movies: u64,
    pub series: u64,
    pub episodes: u64,
    pub epg_programs: u64,
    pub epg_channels: u64,
}

/// Orchestrates playlist ingestion over the source handlers and repositories
///
/// Generic over the HTTP transport so tests can drive the full ingestion
/// flow with a stub client.
pub struct PlaylistService<C: DecompressingHttpClient = StandardHttpClient> {
    playlist_repo: PlaylistRepository,
    category_repo: CategoryRepository,
    channel_repo: ChannelRepository,
    movie_repo: MovieRepository,
    series_repo: TvSeriesRepository,
    episode_repo: TvEpisodeRepository,
    epg_repo: EpgRepository,
    m3u_handler: M3uSourceHandler<C>,
    xtream_handler: XtreamSourceHandler<C>,
    xmltv_ingestor: XmltvIngestor<C>,
}

impl PlaylistService<StandardHttpClient> {
    pub fn new(database: &Database, config: &Config) -> AppResult<Self> {
        let http_client = StandardHttpClient::new(
            config.http.connect_timeout(),
            config.http.request_timeout(),
        )?;
        Ok(Self::with_http_client(database, config, http_client))
    }
}

impl<C: DecompressingHttpClient + Clone> PlaylistService<C> {
    pub fn with_http_client(database: &Database, config: &Config, http_client: C) -> Self {
        let connection = database.connection();

        Self {
            playlist_repo: PlaylistRepository::new(Arc::clone(&connection)),
            category_repo: CategoryRepository::new(Arc::clone(&connection)),
            channel_repo: ChannelRepository::new(Arc::clone(&connection)),
            movie_repo: MovieRepository::new(Arc::clone(&connection)),
            series_repo: TvSeriesRepository::new(Arc::clone(&connection)),
            episode_repo: TvEpisodeRepository::new(Arc::clone(&connection)),
            epg_repo: EpgRepository::new(connection),
            m3u_handler: M3uSourceHandler::new(http_client.clone()),
            xtream_handler: XtreamSourceHandler::new(http_client.clone()),
            xmltv_ingestor: XmltvIngestor::new(http_client, config.ingestion.epg_batch_size),
        }
    }

    /// Register a playlist and ingest its content
    pub async fn add_playlist(
        &self,
        request: PlaylistCreateRequest,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> AppResult<Playlist> {
        if request.name.trim().is_empty() {
            return Err(AppError::validation("Playlist name must not be empty"));
        }
        if request.url.trim().is_empty() {
            return Err(AppError::validation("Playlist URL must not be empty"));
        }

        let playlist = request.into_playlist();
        info!(
            "Adding {} playlist '{}' from {}",
            playlist.playlist_type,
            playlist.name,
            UrlUtils::obfuscate_credentials(&playlist.url)
        );

        let playlist = self.playlist_repo.create(&playlist).await?;
        self.ingest_content(&playlist, progress, cancel).await?;

        progress.message(IngestStage::Completed, "Playlist added successfully");
        Ok(playlist)
    }

    /// Re-ingest an existing playlist, appending its current content
    pub async fn refresh_playlist(
        &self,
        id: Uuid,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> AppResult<Playlist> {
        let mut playlist = self
            .playlist_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("playlist", id.to_string()))?;

        info!("Refreshing playlist '{}'", playlist.name);
        self.ingest_content(&playlist, progress, cancel).await?;

        let refreshed_at = Utc::now();
        self.playlist_repo
            .touch_last_updated(&id, refreshed_at)
            .await?;
        playlist.last_updated = refreshed_at;

        progress.message(IngestStage::Completed, "Playlist refreshed");
        Ok(playlist)
    }

    async fn ingest_content(
        &self,
        playlist: &Playlist,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        match playlist.playlist_type {
            PlaylistType::M3u => self.ingest_m3u(playlist, progress).await,
            PlaylistType::Xtream => self.ingest_xtream(playlist, progress, cancel).await,
        }
    }

    async fn ingest_m3u(
        &self,
        playlist: &Playlist,
        progress: &ProgressReporter,
    ) -> AppResult<()> {
        progress.message(IngestStage::Fetching, "Downloading M3U playlist...");
        let parsed = self.m3u_handler.ingest(playlist).await?;

        progress.report(
            ProgressEvent::new(
                IngestStage::Storing,
                format!("Storing {} channels...", parsed.channels.len()),
            )
            .with_processed(parsed.channels.len()),
        );
        self.category_repo.bulk_insert(&parsed.categories).await?;
        self.channel_repo.bulk_insert(&parsed.channels).await?;

        Ok(())
    }

    async fn ingest_xtream(
        &self,
        playlist: &Playlist,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        // EPG data is global; a fresh Xtream ingestion replaces the guide
        let removed = self.epg_repo.clear().await?;
        if removed > 0 {
            info!("Cleared {removed} stale EPG records before ingestion");
        }

        let harvest = self.xtream_handler.harvest(playlist, progress).await?;

        progress.report(
            ProgressEvent::new(IngestStage::Storing, "Storing harvested content...")
                .with_processed(
                    harvest.channels.len() + harvest.movies.len() + harvest.series.len(),
                ),
        );
        self.category_repo.bulk_insert(&harvest.categories).await?;
        self.channel_repo.bulk_insert(&harvest.channels).await?;
        self.movie_repo.bulk_insert(&harvest.movies).await?;
        self.series_repo.bulk_insert(&harvest.series).await?;

        // EPG failure does not invalidate the already stored content
        if let Err(e) = self.ingest_epg(playlist, progress, cancel).await {
            if matches!(e, AppError::Cancelled { .. }) {
                return Err(e);
            }
            warn!("EPG ingestion failed for '{}': {e}", playlist.name);
            progress.message(IngestStage::Failed, format!("EPG ingestion failed: {e}"));
        }

        Ok(())
    }

    /// Fetch the XMLTV guide and store it batch by batch
    ///
    /// Batches already committed stay committed when a later batch fails or
    /// the token is cancelled.
    async fn ingest_epg(
        &self,
        playlist: &Playlist,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let base_url = UrlUtils::base_url(&playlist.url)
            .map_err(|e| AppError::validation(format!("Invalid Xtream URL: {e}")))?;
        let username = playlist
            .username
            .as_deref()
            .ok_or_else(|| AppError::validation("Xtream playlist requires a username"))?;
        let password = playlist
            .password
            .as_deref()
            .ok_or_else(|| AppError::validation("Xtream playlist requires a password"))?;

        progress.message(IngestStage::Epg, "Downloading EPG guide...");
        let mut batch_stream = self
            .xmltv_ingestor
            .fetch(&base_url, username, password)
            .await?;

        // Each batch is stored and dropped before the next one is parsed
        let mut stored = 0usize;
        let mut batches = 0usize;
        while let Some(batch) = batch_stream.next_batch()? {
            if cancel.is_cancelled() {
                info!("EPG ingestion cancelled after {stored} records");
                return Err(AppError::cancelled("EPG ingestion"));
            }
            self.epg_repo
                .insert_batch(&batch.programs, &batch.channel_infos)
                .await?;
            stored += batch.len();
            batches += 1;
            progress.report(
                ProgressEvent::new(IngestStage::Epg, format!("Stored {stored} EPG records..."))
                    .with_processed(stored),
            );
        }

        info!("EPG ingestion complete: {stored} records in {batches} batches");
        Ok(())
    }

    /// Fetch, store and return the episodes of one series
    ///
    /// A fetch failure degrades to an empty list; nothing is stored then.
    pub async fn fetch_series_episodes(
        &self,
        series_id: Uuid,
        progress: &ProgressReporter,
    ) -> AppResult<Vec<TvEpisode>> {
        let series = self
            .series_repo
            .find_by_id(&series_id)
            .await?
            .ok_or_else(|| AppError::not_found("series", series_id.to_string()))?;
        let playlist = self
            .playlist_repo
            .find_by_id(&series.playlist_id)
            .await?
            .ok_or_else(|| AppError::not_found("playlist", series.playlist_id.to_string()))?;

        let episodes = self
            .xtream_handler
            .fetch_series_episodes(&playlist, &series, progress)
            .await;
        self.episode_repo.bulk_insert(&episodes).await?;

        Ok(episodes)
    }

    /// Previously stored episodes of a series, ordered by season and episode
    pub async fn stored_episodes(&self, series_id: Uuid) -> AppResult<Vec<TvEpisode>> {
        Ok(self.episode_repo.find_by_series_id(&series_id).await?)
    }

    pub async fn list_playlists(&self) -> AppResult<Vec<Playlist>> {
        Ok(self.playlist_repo.find_all().await?)
    }

    pub async fn list_series(&self, playlist_id: Uuid) -> AppResult<Vec<TvSeries>> {
        Ok(self.series_repo.find_by_playlist_id(&playlist_id).await?)
    }

    /// Delete a playlist and all of its dependent content
    ///
    /// EPG data is global and survives the delete.
    pub async fn delete_playlist(&self, id: Uuid) -> AppResult<()> {
        let deleted = self.playlist_repo.delete_cascading(&id).await?;
        if !deleted {
            return Err(AppError::not_found("playlist", id.to_string()));
        }
        Ok(())
    }

    /// Remove every playlist, all content and all EPG data
    pub async fn clear_database(&self) -> AppResult<()> {
        self.epg_repo.clear().await?;
        self.episode_repo.delete_all().await?;
        self.series_repo.delete_all().await?;
        self.movie_repo.delete_all().await?;
        self.channel_repo.delete_all().await?;
        self.category_repo.delete_all().await?;
        self.playlist_repo.delete_all().await?;
        info!("Cleared all playlists, content and EPG data");
        Ok(())
    }

    /// Count stored content across all playlists
    pub async fn content_summary(&self) -> AppResult<ContentSummary> {
        Ok(ContentSummary {
            categories: self.category_repo.count_all().await?,
            channels: self.channel_repo.count_all().await?,
            movies: self.movie_repo.count_all().await?,
            series: self.series_repo.count_all().await?,
            episodes: self.episode_repo.count_all().await?,
            epg_programs: self.epg_repo.count_programs().await?,
            epg_channels: self.epg_repo.count_channels().await?,
        })
    }
}
