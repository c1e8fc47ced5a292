//! EPG repository
//!
//! Programs and channel infos arrive in batches from the XMLTV parser; each
//! batch is stored in its own transaction so a failure partway through an
//! ingestion leaves earlier batches committed (documented behavior, see the
//! playlist service).

use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;

use super::INSERT_CHUNK_SIZE;
use crate::entities::{
    epg_channels, epg_programs,
    prelude::{EpgChannels, EpgPrograms},
};
use crate::models::{EpgChannelInfo, EpgProgram};

/// SeaORM repository for EPG programs and channel infos
#[derive(Clone)]
pub struct EpgRepository {
    connection: Arc<DatabaseConnection>,
}

impl EpgRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Store one ingestion batch transactionally
    pub async fn insert_batch(
        &self,
        programs: &[EpgProgram],
        channel_infos: &[EpgChannelInfo],
    ) -> Result<()> {
        if programs.is_empty() && channel_infos.is_empty() {
            return Ok(());
        }

        let txn = self.connection.begin().await?;

        for chunk in programs.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|p| epg_programs::ActiveModel {
                id: Set(p.id),
                channel_xmltv_id: Set(p.channel_xmltv_id.clone()),
                title: Set(p.title.clone()),
                description: Set(p.description.clone()),
                start_time: Set(p.start_time),
                stop_time: Set(p.stop_time),
            });
            EpgPrograms::insert_many(models).exec(&txn).await?;
        }

        for chunk in channel_infos.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(|c| epg_channels::ActiveModel {
                id: Set(c.id),
                channel_xmltv_id: Set(c.channel_xmltv_id.clone()),
                display_name: Set(c.display_name.clone()),
                icon_url: Set(c.icon_url.clone()),
            });
            EpgChannels::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Find programs for an external channel id, in schedule order
    pub async fn find_programs_by_channel(
        &self,
        channel_xmltv_id: &str,
    ) -> Result<Vec<EpgProgram>> {
        let models = EpgPrograms::find()
            .filter(epg_programs::Column::ChannelXmltvId.eq(channel_xmltv_id))
            .order_by_asc(epg_programs::Column::StartTime)
            .all(&*self.connection)
            .await?;
        Ok(models.into_iter().map(Self::program_to_domain).collect())
    }

    pub async fn count_programs(&self) -> Result<u64> {
        Ok(EpgPrograms::find().count(&*self.connection).await?)
    }

    pub async fn count_channels(&self) -> Result<u64> {
        Ok(EpgChannels::find().count(&*self.connection).await?)
    }

    /// Remove all EPG data (both programs and channel infos)
    pub async fn clear(&self) -> Result<u64> {
        let programs = EpgPrograms::delete_many().exec(&*self.connection).await?;
        let channels = EpgChannels::delete_many().exec(&*self.connection).await?;
        Ok(programs.rows_affected + channels.rows_affected)
    }

    fn program_to_domain(model: epg_programs::Model) -> EpgProgram {
        EpgProgram {
            id: model.id,
            channel_xmltv_id: model.channel_xmltv_id,
            title: model.title,
            description: model.description,
            start_time: model.start_time,
            stop_time: model.stop_time,
        }
    }
}
