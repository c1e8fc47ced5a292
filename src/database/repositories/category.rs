//! Category repository

use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::INSERT_CHUNK_SIZE;
use crate::entities::{categories, prelude::Categories};
use crate::models::{Category, ContentKind};

/// SeaORM repository for content categories
#[derive(Clone)]
pub struct CategoryRepository {
    connection: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Bulk insert categories, chunked below the bind-variable limit
    pub async fn bulk_insert(&self, records: &[Category]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|c| categories::ActiveModel {
                id: Set(c.id),
                playlist_id: Set(c.playlist_id),
                name: Set(c.name.clone()),
                content_kind: Set(c.content_kind.to_string()),
            });
            Categories::insert_many(models).exec(&*self.connection).await?;
        }

        Ok(records.len())
    }

    /// Find all categories for a playlist
    pub async fn find_by_playlist_id(&self, playlist_id: &Uuid) -> Result<Vec<Category>> {
        let models = Categories::find()
            .filter(categories::Column::PlaylistId.eq(*playlist_id))
            .all(&*self.connection)
            .await?;
        models.into_iter().map(Self::model_to_domain).collect()
    }

    /// Find a category by ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<Category>> {
        let model = Categories::find_by_id(*id).one(&*self.connection).await?;
        model.map(Self::model_to_domain).transpose()
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(Categories::find().count(&*self.connection).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = Categories::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn model_to_domain(model: categories::Model) -> Result<Category> {
        let content_kind = ContentKind::from_str(&model.content_kind).map_err(|_| {
            anyhow::anyhow!("Unknown content kind in database: {}", model.content_kind)
        })?;

        Ok(Category {
            id: model.id,
            playlist_id: model.playlist_id,
            name: model.name,
            content_kind,
        })
    }
}
