use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tables in order of dependencies
        self.create_playlists_table(manager).await?;
        self.create_categories_table(manager).await?;
        self.create_channels_table(manager).await?;
        self.create_movies_table(manager).await?;
        self.create_tv_series_table(manager).await?;
        self.create_tv_episodes_table(manager).await?;
        self.create_epg_programs_table(manager).await?;
        self.create_epg_channels_table(manager).await?;

        self.create_indexes(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(EpgChannels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EpgPrograms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TvEpisodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TvSeries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlists::Table).to_owned())
            .await?;

        Ok(())
    }
}

impl Migration {
    // UUIDs and timestamps are stored as strings in SQLite
    fn id_column(&self, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        col.string().not_null();
        col
    }

    fn fk_column(&self, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        col.string().not_null();
        col
    }

    fn nullable_fk_column(&self, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        col.string();
        col
    }

    async fn create_playlists_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Playlists::Table)
                    .if_not_exists()
                    .col(self.id_column(Playlists::Id).primary_key())
                    .col(ColumnDef::new(Playlists::Name).string().not_null())
                    .col(ColumnDef::new(Playlists::Url).string().not_null())
                    .col(ColumnDef::new(Playlists::Username).string())
                    .col(ColumnDef::new(Playlists::Password).string())
                    .col(ColumnDef::new(Playlists::PlaylistType).string().not_null())
                    .col(ColumnDef::new(Playlists::LastUpdated).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn create_categories_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(self.id_column(Categories::Id).primary_key())
                    .col(self.fk_column(Categories::PlaylistId))
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::ContentKind).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn create_channels_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Channels::Table)
                    .if_not_exists()
                    .col(self.id_column(Channels::Id).primary_key())
                    .col(self.fk_column(Channels::PlaylistId))
                    .col(self.nullable_fk_column(Channels::CategoryId))
                    .col(ColumnDef::new(Channels::Name).string().not_null())
                    .col(ColumnDef::new(Channels::StreamUrl).string().not_null())
                    .col(ColumnDef::new(Channels::LogoUrl).string())
                    .col(ColumnDef::new(Channels::EpgId).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_movies_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(self.id_column(Movies::Id).primary_key())
                    .col(self.fk_column(Movies::PlaylistId))
                    .col(self.nullable_fk_column(Movies::CategoryId))
                    .col(ColumnDef::new(Movies::Name).string().not_null())
                    .col(ColumnDef::new(Movies::StreamUrl).string().not_null())
                    .col(ColumnDef::new(Movies::CoverUrl).string())
                    .col(ColumnDef::new(Movies::Description).string())
                    .col(ColumnDef::new(Movies::Year).string())
                    .col(ColumnDef::new(Movies::Duration).string())
                    .col(ColumnDef::new(Movies::Rating).string())
                    .col(ColumnDef::new(Movies::Rating5based).double())
                    .col(ColumnDef::new(Movies::StreamId).string())
                    .col(ColumnDef::new(Movies::TmdbId).string())
                    .col(ColumnDef::new(Movies::Trailer).string())
                    .col(ColumnDef::new(Movies::Added).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_tv_series_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TvSeries::Table)
                    .if_not_exists()
                    .col(self.id_column(TvSeries::Id).primary_key())
                    .col(self.fk_column(TvSeries::PlaylistId))
                    .col(self.nullable_fk_column(TvSeries::CategoryId))
                    .col(ColumnDef::new(TvSeries::Name).string().not_null())
                    .col(ColumnDef::new(TvSeries::CoverUrl).string())
                    .col(ColumnDef::new(TvSeries::SeriesId).string())
                    .col(ColumnDef::new(TvSeries::TmdbId).string())
                    .col(ColumnDef::new(TvSeries::LastModified).string())
                    .col(ColumnDef::new(TvSeries::YoutubeTrailer).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_tv_episodes_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TvEpisodes::Table)
                    .if_not_exists()
                    .col(self.id_column(TvEpisodes::Id).primary_key())
                    .col(self.fk_column(TvEpisodes::SeriesId))
                    .col(ColumnDef::new(TvEpisodes::Title).string().not_null())
                    .col(ColumnDef::new(TvEpisodes::StreamUrl).string().not_null())
                    .col(
                        ColumnDef::new(TvEpisodes::SeasonNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TvEpisodes::EpisodeNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TvEpisodes::CoverUrl).string())
                    .col(ColumnDef::new(TvEpisodes::Description).string())
                    .col(ColumnDef::new(TvEpisodes::Duration).string())
                    .col(ColumnDef::new(TvEpisodes::StreamId).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_epg_programs_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EpgPrograms::Table)
                    .if_not_exists()
                    .col(self.id_column(EpgPrograms::Id).primary_key())
                    .col(
                        ColumnDef::new(EpgPrograms::ChannelXmltvId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EpgPrograms::Title).string().not_null())
                    .col(ColumnDef::new(EpgPrograms::Description).string())
                    .col(ColumnDef::new(EpgPrograms::StartTime).string())
                    .col(ColumnDef::new(EpgPrograms::StopTime).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_epg_channels_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EpgChannels::Table)
                    .if_not_exists()
                    .col(self.id_column(EpgChannels::Id).primary_key())
                    .col(
                        ColumnDef::new(EpgChannels::ChannelXmltvId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EpgChannels::DisplayName).string().not_null())
                    .col(ColumnDef::new(EpgChannels::IconUrl).string())
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_categories_playlist_id")
                    .table(Categories::Table)
                    .col(Categories::PlaylistId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_channels_playlist_id")
                    .table(Channels::Table)
                    .col(Channels::PlaylistId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_channels_category_id")
                    .table(Channels::Table)
                    .col(Channels::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movies_playlist_id")
                    .table(Movies::Table)
                    .col(Movies::PlaylistId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tv_series_playlist_id")
                    .table(TvSeries::Table)
                    .col(TvSeries::PlaylistId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tv_episodes_series_id")
                    .table(TvEpisodes::Table)
                    .col(TvEpisodes::SeriesId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_epg_programs_channel_xmltv_id")
                    .table(EpgPrograms::Table)
                    .col(EpgPrograms::ChannelXmltvId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Playlists {
    Table,
    Id,
    Name,
    Url,
    Username,
    Password,
    PlaylistType,
    LastUpdated,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    PlaylistId,
    Name,
    ContentKind,
}

#[derive(DeriveIden)]
enum Channels {
    Table,
    Id,
    PlaylistId,
    CategoryId,
    Name,
    StreamUrl,
    LogoUrl,
    EpgId,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    PlaylistId,
    CategoryId,
    Name,
    StreamUrl,
    CoverUrl,
    Description,
    Year,
    Duration,
    Rating,
    #[sea_orm(iden = "rating_5based")]
    Rating5based,
    StreamId,
    TmdbId,
    Trailer,
    Added,
}

#[derive(DeriveIden)]
enum TvSeries {
    Table,
    Id,
    PlaylistId,
    CategoryId,
    Name,
    CoverUrl,
    SeriesId,
    TmdbId,
    LastModified,
    YoutubeTrailer,
}

#[derive(DeriveIden)]
enum TvEpisodes {
    Table,
    Id,
    SeriesId,
    Title,
    StreamUrl,
    SeasonNumber,
    EpisodeNumber,
    CoverUrl,
    Description,
    Duration,
    StreamId,
}

#[derive(DeriveIden)]
enum EpgPrograms {
    Table,
    Id,
    ChannelXmltvId,
    Title,
    Description,
    StartTime,
    StopTime,
}

#[derive(DeriveIden)]
enum EpgChannels {
    Table,
    Id,
    ChannelXmltvId,
    DisplayName,
    IconUrl,
}
