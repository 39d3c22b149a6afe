//! Mathboard server binary

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mathboard_server::ServerConfig;

#[derive(Parser)]
#[command(name = "mathboard-server")]
#[command(about = "Mathboard multiplication practice app server")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "MATHBOARD_ADDR")]
    addr: Option<SocketAddr>,

    /// SQLite database path
    #[arg(long, env = "MATHBOARD_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Directory with the built frontend
    #[arg(long, env = "MATHBOARD_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Mathboard server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    // CLI and environment override the file
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }
    if let Some(static_dir) = cli.static_dir {
        config.static_dir = static_dir;
    }

    mathboard_server::server::serve(config).await
}
