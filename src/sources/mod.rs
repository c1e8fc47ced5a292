//! Source handlers for the supported playlist backends
//!
//! - [`m3u`]: plain-text M3U playlist parsing
//! - [`xtream`]: Xtream Codes `player_api.php` harvesting
//! - [`xmltv`]: streaming XMLTV EPG ingestion

pub mod m3u;
pub mod xmltv;
pub mod xtream;

pub use m3u::{M3uParseResult, M3uSourceHandler};
pub use xmltv::{EpgBatch, EpgBatchStream, XmltvIngestor};
pub use xtream::{XtreamHarvest, XtreamSourceHandler};
