//! Playlist repository
//!
//! Owns the playlist lifecycle, including the cascading delete of all
//! dependent records. The cascade is explicit here rather than delegated to
//! the store: categories, channels, movies, series and episodes all go in a
//! single transaction with the playlist row.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{
    playlists,
    prelude::{Categories, Channels, Movies, Playlists, TvEpisodes, TvSeries},
    categories, channels, movies, tv_episodes, tv_series,
};
use crate::models::{Playlist, PlaylistType};

/// SeaORM repository for playlist records
#[derive(Clone)]
pub struct PlaylistRepository {
    connection: Arc<DatabaseConnection>,
}

impl PlaylistRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Insert a new playlist record
    pub async fn create(&self, playlist: &Playlist) -> Result<Playlist> {
        let active_model = playlists::ActiveModel {
            id: Set(playlist.id),
            name: Set(playlist.name.clone()),
            url: Set(playlist.url.clone()),
            username: Set(playlist.username.clone()),
            password: Set(playlist.password.clone()),
            playlist_type: Set(playlist.playlist_type.to_string()),
            last_updated: Set(playlist.last_updated),
        };

        let model = active_model.insert(&*self.connection).await?;
        Self::model_to_domain(model)
    }

    /// Find a playlist by ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Playlist>> {
        let model = Playlists::find_by_id(*id).one(&*self.connection).await?;
        model.map(Self::model_to_domain).transpose()
    }

    /// Find all playlists
    pub async fn find_all(&self) -> Result<Vec<Playlist>> {
        let models = Playlists::find().all(&*self.connection).await?;
        models.into_iter().map(Self::model_to_domain).collect()
    }

    /// Record a successful refresh by bumping the last-updated timestamp
    pub async fn touch_last_updated(
        &self,
        id: &Uuid,
        last_updated: DateTime<Utc>,
    ) -> Result<()> {
        let active_model = playlists::ActiveModel {
            id: Set(*id),
            last_updated: Set(last_updated),
            ..Default::default()
        };
        active_model.update(&*self.connection).await?;
        Ok(())
    }

    /// Delete a playlist and every record that belongs to it
    ///
    /// Episodes hang off series rather than the playlist directly, so their
    /// series ids are collected first. Everything happens in one transaction.
    pub async fn delete_cascading(&self, id: &Uuid) -> Result<bool> {
        let txn = self.connection.begin().await?;

        let exists = Playlists::find_by_id(*id).one(&txn).await?.is_some();
        if !exists {
            txn.rollback().await?;
            return Ok(false);
        }

        let series_ids: Vec<Uuid> = TvSeries::find()
            .filter(tv_series::Column::PlaylistId.eq(*id))
            .select_only()
            .column(tv_series::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        if !series_ids.is_empty() {
            TvEpisodes::delete_many()
                .filter(tv_episodes::Column::SeriesId.is_in(series_ids))
                .exec(&txn)
                .await?;
        }
        TvSeries::delete_many()
            .filter(tv_series::Column::PlaylistId.eq(*id))
            .exec(&txn)
            .await?;
        Movies::delete_many()
            .filter(movies::Column::PlaylistId.eq(*id))
            .exec(&txn)
            .await?;
        Channels::delete_many()
            .filter(channels::Column::PlaylistId.eq(*id))
            .exec(&txn)
            .await?;
        Categories::delete_many()
            .filter(categories::Column::PlaylistId.eq(*id))
            .exec(&txn)
            .await?;
        Playlists::delete_by_id(*id).exec(&txn).await?;

        txn.commit().await?;

        info!("Deleted playlist {} and its dependent records", id);
        Ok(true)
    }

    /// Delete all playlists (without dependents; used by clear_database,
    /// which empties the other collections itself)
    pub async fn delete_all(&self) -> Result<u64> {
        let result = Playlists::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn model_to_domain(model: playlists::Model) -> Result<Playlist> {
        let playlist_type = PlaylistType::from_str(&model.playlist_type).map_err(|_| {
            anyhow::anyhow!("Unknown playlist type in database: {}", model.playlist_type)
        })?;

        Ok(Playlist {
            id: model.id,
            name: model.name,
            url: model.url,
            username: model.username,
            password: model.password,
            playlist_type,
            last_updated: model.last_updated,
        })
    }
}
