//! SeaORM repositories for the playlist store
//!
//! Each repository wraps an `Arc<DatabaseConnection>` and converts between
//! entity models and domain models. Bulk writes are chunked to stay below
//! the SQLite bind-variable limit.

pub mod category;
pub mod channel;
pub mod epg;
pub mod movie;
pub mod playlist;
pub mod tv_episode;
pub mod tv_series;

pub use category::CategoryRepository;
pub use channel::ChannelRepository;
pub use epg::EpgRepository;
pub use movie::MovieRepository;
pub use playlist::PlaylistRepository;
pub use tv_episode::TvEpisodeRepository;
pub use tv_series::TvSeriesRepository;

/// Rows per INSERT statement. The widest table (movies) has 16 columns, so
/// 500 rows stays well below SQLite's bind-variable limit.
pub(crate) const INSERT_CHUNK_SIZE: usize = 500;
