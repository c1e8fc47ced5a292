//! Re-exports of all entity types for convenient imports

pub use super::categories::Entity as Categories;
pub use super::channels::Entity as Channels;
pub use super::epg_channels::Entity as EpgChannels;
pub use super::epg_programs::Entity as EpgPrograms;
pub use super::movies::Entity as Movies;
pub use super::playlists::Entity as Playlists;
pub use super::tv_episodes::Entity as TvEpisodes;
pub use super::tv_series::Entity as TvSeries;
