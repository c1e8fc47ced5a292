//! TV episode repository

use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use super::INSERT_CHUNK_SIZE;
use crate::entities::{prelude::TvEpisodes, tv_episodes};
use crate::models::TvEpisode;

/// SeaORM repository for series episodes
#[derive(Clone)]
pub struct TvEpisodeRepository {
    connection: Arc<DatabaseConnection>,
}

impl TvEpisodeRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Bulk insert episodes, chunked below the bind-variable limit
    pub async fn bulk_insert(&self, records: &[TvEpisode]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|e| tv_episodes::ActiveModel {
                id: Set(e.id),
                series_id: Set(e.series_id),
                title: Set(e.title.clone()),
                stream_url: Set(e.stream_url.clone()),
                season_number: Set(e.season_number),
                episode_number: Set(e.episode_number),
                cover_url: Set(e.cover_url.clone()),
                description: Set(e.description.clone()),
                duration: Set(e.duration.clone()),
                stream_id: Set(e.stream_id.clone()),
            });
            TvEpisodes::insert_many(models).exec(&*self.connection).await?;
        }

        Ok(records.len())
    }

    /// Find all episodes for a series, in season/episode order
    pub async fn find_by_series_id(&self, series_id: &Uuid) -> Result<Vec<TvEpisode>> {
        let models = TvEpisodes::find()
            .filter(tv_episodes::Column::SeriesId.eq(*series_id))
            .order_by_asc(tv_episodes::Column::SeasonNumber)
            .order_by_asc(tv_episodes::Column::EpisodeNumber)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(TvEpisodes::find().count(&*self.connection).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = TvEpisodes::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn model_to_domain(model: tv_episodes::Model) -> TvEpisode {
        TvEpisode {
            id: model.id,
            series_id: model.series_id,
            title: model.title,
            stream_url: model.stream_url,
            season_number: model.season_number,
            episode_number: model.episode_number,
            cover_url: model.cover_url,
            description: model.description,
            duration: model.duration,
            stream_id: model.stream_id,
        }
    }
}
