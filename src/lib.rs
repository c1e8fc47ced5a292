//! Playlist ingestion service
//!
//! Ingests IPTV playlists from M3U documents and Xtream Codes panels into an
//! embedded SQLite store, including the XMLTV EPG guide that Xtream panels
//! expose. The crate is organized as:
//!
//! - [`sources`]: M3U parsing, Xtream harvesting and XMLTV ingestion
//! - [`services`]: orchestration and progress reporting
//! - [`database`]: SeaORM store, migrations and repositories
//! - [`models`] / [`entities`]: domain records and their persistence mapping

pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;
