//! Channel repository

use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

use super::INSERT_CHUNK_SIZE;
use crate::entities::{channels, prelude::Channels};
use crate::models::Channel;

/// SeaORM repository for live TV channels
#[derive(Clone)]
pub struct ChannelRepository {
    connection: Arc<DatabaseConnection>,
}

impl ChannelRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Bulk insert channels, chunked below the bind-variable limit
    pub async fn bulk_insert(&self, records: &[Channel]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|c| channels::ActiveModel {
                id: Set(c.id),
                playlist_id: Set(c.playlist_id),
                category_id: Set(c.category_id),
                name: Set(c.name.clone()),
                stream_url: Set(c.stream_url.clone()),
                logo_url: Set(c.logo_url.clone()),
                epg_id: Set(c.epg_id.clone()),
            });
            Channels::insert_many(models).exec(&*self.connection).await?;
        }

        Ok(records.len())
    }

    /// Find all channels for a playlist
    pub async fn find_by_playlist_id(&self, playlist_id: &Uuid) -> Result<Vec<Channel>> {
        let models = Channels::find()
            .filter(channels::Column::PlaylistId.eq(*playlist_id))
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    /// Find channels belonging to a category
    pub async fn find_by_category_id(&self, category_id: &Uuid) -> Result<Vec<Channel>> {
        let models = Channels::find()
            .filter(channels::Column::CategoryId.eq(*category_id))
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::model_to_domain).collect())
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(Channels::find().count(&*self.connection).await?)
    }

    pub async fn delete_all(&self) -> Result<u64> {
        let result = Channels::delete_many().exec(&*self.connection).await?;
        Ok(result.rows_affected)
    }

    fn model_to_domain(model: channels::Model) -> Channel {
        Channel {
            id: model.id,
            playlist_id: model.playlist_id,
            category_id: model.category_id,
            name: model.name,
            stream_url: model.stream_url,
            logo_url: model.logo_url,
            epg_id: model.epg_id,
        }
    }
}
