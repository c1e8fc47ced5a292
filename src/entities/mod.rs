//! SeaORM entity definitions
//!
//! One entity per persisted collection. Relationships are plain foreign-key
//! columns; the repository layer performs the joins.

pub mod categories;
pub mod channels;
pub mod epg_channels;
pub mod epg_programs;
pub mod movies;
pub mod playlists;
pub mod prelude;
pub mod tv_episodes;
pub mod tv_series;
