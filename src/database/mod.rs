//! SeaORM-based database implementation
//!
//! The playlist store is an embedded SQLite database. This module owns the
//! connection lifecycle and schema migrations; data access goes through the
//! repositories in [`repositories`].

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

pub mod migrations;
pub mod repositories;

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    connection: Arc<DatabaseConnection>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let connection_url = Self::ensure_sqlite_auto_creation(&config.url)?;

        let mut connect_options = ConnectOptions::new(&connection_url);
        connect_options
            .max_connections(config.max_connections.unwrap_or(5))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600))
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        let connection = SeaOrmDatabase::connect(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database at '{}'", config.url))?;

        debug!("Database connection established");

        Ok(Self {
            connection: Arc::new(connection),
        })
    }

    /// Ensure SQLite URL includes auto-creation mode if the file is missing
    fn ensure_sqlite_auto_creation(url: &str) -> Result<String> {
        if !url.starts_with("sqlite:") {
            anyhow::bail!("Unsupported database URL format: {}", url);
        }

        // In-memory databases and URLs with an explicit mode need no changes
        if url.contains("mode=") || url.contains(":memory:") {
            return Ok(url.to_string());
        }

        let file_path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        let path = std::path::Path::new(file_path);
        if path.exists() {
            return Ok(url.to_string());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create directory for SQLite database: {}",
                        parent.display()
                    )
                })?;
                info!("Created directory for SQLite database: {}", parent.display());
            }
        }

        // mode=rwc lets SQLite create the file on first open
        let auto_create_url = if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        };
        Ok(auto_create_url)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        use migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        info!("Running database migrations");

        Migrator::up(&*self.connection, None)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Get the shared database connection
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.connection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_url_is_left_untouched() {
        let url = "sqlite::memory:";
        assert_eq!(Database::ensure_sqlite_auto_creation(url).unwrap(), url);
    }

    #[test]
    fn missing_file_gets_rwc_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("playlists.db");
        let url = format!("sqlite://{}", db_path.display());
        let adjusted = Database::ensure_sqlite_auto_creation(&url).unwrap();
        assert!(adjusted.ends_with("?mode=rwc"));
    }

    #[test]
    fn non_sqlite_url_is_rejected() {
        assert!(Database::ensure_sqlite_auto_creation("postgres://localhost/db").is_err());
    }
}
