use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub playlist_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub stream_url: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub year: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<String>,
    pub rating_5based: Option<f64>,
    pub stream_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub trailer: Option<String>,
    pub added: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
