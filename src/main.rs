//! # Chroma Viewer CLI (`chroma-viewer`)
//!
//! Starts the web viewer, optionally connecting to a database first.
//!
//! ## Usage
//!
//! ```bash
//! chroma-viewer [DB_PATH] [--host 127.0.0.1] [--port 8000] [--config viewer.toml]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chroma_viewer::config::{self, Config};
use chroma_viewer::server;
use chroma_viewer::session::{ChromaOpener, SessionStore};

/// Chroma Viewer: browse the collections and documents of a local Chroma database.
#[derive(Parser)]
#[command(
    name = "chroma-viewer",
    about = "Chroma Viewer, a web-based viewer for local Chroma databases",
    version,
    long_about = "Serves a local web interface that lists the collections of a Chroma \
    persistent database and pages through their documents, metadata, and embeddings. \
    The database is opened read-only."
)]
struct Cli {
    /// Path to the Chroma database directory (or its `chroma.sqlite3` file).
    ///
    /// When omitted, the server starts disconnected and a database can be
    /// opened from the web interface.
    db_path: Option<PathBuf>,

    /// Host to bind the web server to.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the web server to.
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    if let Some(host) = cli.host {
        cfg.server.host = host;
    }
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }

    let session = Arc::new(SessionStore::new(Arc::new(ChromaOpener::new(
        cfg.db.clone(),
    ))));

    match &cli.db_path {
        Some(path) => {
            tracing::info!("Connecting to Chroma database at {}", path.display());
            session
                .connect(path)
                .await
                .with_context(|| format!("Failed to connect to database at {}", path.display()))?;
        }
        None => tracing::info!("No database path provided. Connect via the web interface."),
    }

    server::run_server(Arc::new(cfg), session).await
}
