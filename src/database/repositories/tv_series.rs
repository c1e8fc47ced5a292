//! TV series repository

use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

use super::INSERT_CHUNK_SIZE;
use crate::entities::{prelude::TvSeries as TvSeriesEntity, tv_series};
use crate::models::TvSeries;

/// SeaORM repository for TV series
#[derive(Clone)]
pub struct TvSeriesRepository {
    connection: Arc<DatabaseConnection>,
}

impl TvSeriesRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Bulk insert series, chunked below the bind-variable limit
    pub async fn bulk_insert(&self, records: &[TvSeries]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|s| tv_series::ActiveModel {
                id: Set(s.id),
                playlist_id: Set(s.playlist_id),
                category_id: Set(s.category_id),
                name: Set(s.name.clone()),
                cover_url: Set(s.cover_url.clone()),
                series_id: Set(s.series_id.clone()),
                tmdb_id: Set(s.tmdb_id.clone()),
                last_modified: Set(s.last_modified.clone()),
                youtube_trailer: Set(s.youtube_trailer.clone()),
            });
            TvSeriesEntity::insert_many(models)
                .exec(&*self.connection)
                .await?;
        }

        Ok(records.len())
    }

    /// Find a series by ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<TvSeries>> {
        let model = TvSeriesEntity::find_by_id(*id).one(&*self.connection).await?;
        Ok(model.map(Self::model_to_domain))
    }

    /// Find all series for a playlist
    pub async fn find_by_playlist_id(&self, playlist_id: &Uuid) -> Result<Vec<TvSeries>> {
        let models = TvSeriesEntity::find()
            .filter(tv_series::Column::PlaylistId.eq(*playlist_id))
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(TvSeriesEntity::find().count(&*self.connection).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = TvSeriesEntity::delete_many()
            .exec(&*self.connection)
            .await?;
        Ok(result.rows_affected)
    }

    fn model_to_domain(model: tv_series::Model) -> TvSeries {
        TvSeries {
            id: model.id,
            playlist_id: model.playlist_id,
            category_id: model.category_id,
            name: model.name,
            cover_url: model.cover_url,
            series_id: model.series_id,
            tmdb_id: model.tmdb_id,
            last_modified: model.last_modified,
            youtube_trailer: model.youtube_trailer,
        }
    }
}
