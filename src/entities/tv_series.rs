use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tv_series")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub cover_url: Option<String>,
    /// Xtream-side series id used for get_series_info
    pub series_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub last_modified: Option<String>,
    pub youtube_trailer: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
