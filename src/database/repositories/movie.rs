//! Movie repository

use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

use super::INSERT_CHUNK_SIZE;
use crate::entities::{movies, prelude::Movies};
use crate::models::Movie;

/// SeaORM repository for VOD movies
#[derive(Clone)]
pub struct MovieRepository {
    connection: Arc<DatabaseConnection>,
}

impl MovieRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Bulk insert movies, chunked below the bind-variable limit
    pub async fn bulk_insert(&self, records: &[Movie]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|m| movies::ActiveModel {
                id: Set(m.id),
                playlist_id: Set(m.playlist_id),
                category_id: Set(m.category_id),
                name: Set(m.name.clone()),
                stream_url: Set(m.stream_url.clone()),
                cover_url: Set(m.cover_url.clone()),
                description: Set(m.description.clone()),
                year: Set(m.year.clone()),
                duration: Set(m.duration.clone()),
                rating: Set(m.rating.clone()),
                rating_5based: Set(m.rating_5based),
                stream_id: Set(m.stream_id.clone()),
                tmdb_id: Set(m.tmdb_id.clone()),
                trailer: Set(m.trailer.clone()),
                added: Set(m.added.clone()),
            });
            Movies::insert_many(models).exec(&*self.connection).await?;
        }

        Ok(records.len())
    }

    /// Find all movies for a playlist
    pub async fn find_by_playlist_id(&self, playlist_id: &Uuid) -> Result<Vec<Movie>> {
        let models = Movies::find()
            .filter(movies::Column::PlaylistId.eq(*playlist_id))
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(Movies::find().count(&*self.connection).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = Movies::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn model_to_domain(model: movies::Model) -> Movie {
        Movie {
            id: model.id,
            playlist_id: model.playlist_id,
            category_id: model.category_id,
            name: model.name,
            stream_url: model.stream_url,
            cover_url: model.cover_url,
            description: model.description,
            year: model.year,
            duration: model.duration,
            rating: model.rating,
            rating_5based: model.rating_5based,
            stream_id: model.stream_id,
            tmdb_id: model.tmdb_id,
            trailer: model.trailer,
            added: model.added,
        }
    }
}
