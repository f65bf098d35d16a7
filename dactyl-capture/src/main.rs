//! dactyl-capture - Fingerprint Capture Microservice
//!
//! Accepts fingerprint scans per person, archives the retained variants and
//! serves them back for comparison.
//!
//! Default port: 5740

use anyhow::{Context, Result};
use clap::Parser;
use dactyl_common::config::{
    ArchiveBackend, CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dactyl_capture::archive::{ArchiveClient, FsArchive, MemoryArchive};
use dactyl_capture::{build_router, AppState};

/// Command-line arguments (override config file and environment)
#[derive(Debug, Parser)]
#[command(name = "dactyl-capture", version, about = "Fingerprint capture and archival service")]
struct Args {
    /// Root folder holding the database
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP bind address, e.g. 127.0.0.1:5740
    #[arg(long, env = "DACTYL_BIND")]
    bind: Option<String>,

    /// Archive root directory (filesystem backend)
    #[arg(long)]
    archive_root: Option<PathBuf>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref());

    init_tracing(&config)?;

    info!(
        "Starting Dactyl Fingerprint Capture (dactyl-capture) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let defaults = CompiledDefaults::for_current_platform();

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = dactyl_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let archive: Arc<dyn ArchiveClient> = match config.archive.backend {
        ArchiveBackend::Filesystem => {
            let archive_root = args
                .archive_root
                .or_else(|| config.archive.root.clone())
                .unwrap_or_else(|| initializer.default_archive_root());
            info!("Archive root: {}", archive_root.display());
            Arc::new(FsArchive::new(archive_root))
        }
        ArchiveBackend::Memory => {
            warn!("Using in-memory archive: stored fingerprints are lost on exit");
            Arc::new(MemoryArchive::new())
        }
    };

    let state = AppState::new(pool, archive, config.language);
    let app = build_router(state);

    let bind = args
        .bind
        .or_else(|| config.bind_address.clone())
        .unwrap_or(defaults.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
