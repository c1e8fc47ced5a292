use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use playlist_ingest::{
    config::Config,
    database::Database,
    models::{PlaylistCreateRequest, PlaylistType},
    services::{PlaylistService, ProgressReporter},
};

#[derive(Parser)]
#[command(name = "playlist-ingest")]
#[command(version = "0.1.0")]
#[command(about = "IPTV playlist ingestion service for M3U and Xtream Codes sources")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a playlist and ingest its content
    Add {
        /// Display name for the playlist
        name: String,
        /// Playlist URL (M3U document or Xtream panel base URL)
        url: String,
        /// Source type
        #[arg(short = 't', long, value_enum, default_value_t = SourceType::M3u)]
        source_type: SourceType,
        /// Xtream account username
        #[arg(short, long)]
        username: Option<String>,
        /// Xtream account password
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Re-ingest an existing playlist (appends, does not deduplicate)
    Refresh {
        /// Playlist id
        id: Uuid,
    },
    /// Fetch and store the episodes of a series
    Episodes {
        /// Series id
        series_id: Uuid,
    },
    /// List playlists and content counts
    List,
    /// Delete a playlist and all of its content
    Delete {
        /// Playlist id
        id: Uuid,
    },
    /// Remove all playlists, content and EPG data
    Clear,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SourceType {
    M3u,
    Xtream,
}

impl From<SourceType> for PlaylistType {
    fn from(source_type: SourceType) -> Self {
        match source_type {
            SourceType::M3u => PlaylistType::M3u,
            SourceType::Xtream => PlaylistType::Xtream,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("playlist_ingest={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    let service = PlaylistService::new(&database, &config)?;
    run_command(cli.command, &service).await
}

async fn run_command(command: Command, service: &PlaylistService) -> Result<()> {
    match command {
        Command::Add {
            name,
            url,
            source_type,
            username,
            password,
        } => {
            let request = PlaylistCreateRequest {
                name,
                url,
                username,
                password,
                playlist_type: source_type.into(),
            };
            let (progress, mut events) = ProgressReporter::channel(64);
            let printer = tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    println!("[{}] {}", event.stage, event.message);
                }
            });

            let cancel = CancellationToken::new();
            let result = service.add_playlist(request, &progress, &cancel).await;
            drop(progress);
            let _ = printer.await;

            let playlist = result?;
            println!("Added playlist '{}' with id {}", playlist.name, playlist.id);
        }

        Command::Refresh { id } => {
            let (progress, mut events) = ProgressReporter::channel(64);
            let printer = tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    println!("[{}] {}", event.stage, event.message);
                }
            });

            let cancel = CancellationToken::new();
            let result = service.refresh_playlist(id, &progress, &cancel).await;
            drop(progress);
            let _ = printer.await;

            let playlist = result?;
            println!("Refreshed playlist '{}'", playlist.name);
        }

        Command::Episodes { series_id } => {
            let progress = ProgressReporter::disabled();
            let episodes = service.fetch_series_episodes(series_id, &progress).await?;
            if episodes.is_empty() {
                warn!("No episodes found for series {series_id}");
            }
            for episode in &episodes {
                println!(
                    "S{:02}E{:02} {}",
                    episode.season_number, episode.episode_number, episode.title
                );
            }
            println!("Stored {} episodes", episodes.len());
        }

        Command::List => {
            let playlists = service.list_playlists().await?;
            if playlists.is_empty() {
                println!("No playlists configured");
            }
            for playlist in &playlists {
                println!(
                    "{}  {}  [{}]  last updated {}",
                    playlist.id, playlist.name, playlist.playlist_type, playlist.last_updated
                );
            }

            let summary = service.content_summary().await?;
            println!(
                "Content: {} categories, {} channels, {} movies, {} series, {} episodes",
                summary.categories,
                summary.channels,
                summary.movies,
                summary.series,
                summary.episodes
            );
            println!(
                "EPG: {} programs, {} channels",
                summary.epg_programs, summary.epg_channels
            );
        }

        Command::Delete { id } => {
            service.delete_playlist(id).await?;
            info!("Deleted playlist {id}");
            println!("Deleted playlist {id}");
        }

        Command::Clear => {
            service.clear_database().await?;
            println!("Database cleared");
        }
    }

    Ok(())
}
