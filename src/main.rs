//! Loupe: a desktop quick-launcher engine
//!
//! This is the main entry point for the application.

use anyhow::Result;
use loupe::{
    config,
    web::{create_router, AppState},
    Launcher,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::args().nth(1).as_deref() {
        Some("-h" | "--help") => {
            print_usage();
            return Ok(());
        }
        Some("-V" | "--version") => {
            println!("loupe {}", loupe::VERSION);
            return Ok(());
        }
        _ => {}
    }

    // Load configuration
    let settings = config::load()?;

    // Initialize logging
    let default_level = if settings.general.debug { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting Loupe v{}", loupe::VERSION);
    info!("Data directory: {}", settings.data_dir().display());

    // Sync or install providers, then load them
    let launcher = Launcher::start(&settings).await?;

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    // Create router
    let app = create_router(AppState::new(settings, launcher));

    info!("Starting server on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Loupe v{}
A desktop quick-launcher engine

USAGE:
    loupe [OPTIONS]

OPTIONS:
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    LOUPE_SETTINGS_PATH    Path to settings.yml
    LOUPE_DEBUG            Enable debug logging (true/false)
    LOUPE_PORT             Server port
    LOUPE_BIND_ADDRESS     Bind address
    LOUPE_DATA_DIR         Directory for providers, aliases and state
    LOUPE_PLUGIN_INDEX_URL JSON index of remote provider manifests
    RUST_LOG               Log filter (overrides LOUPE_DEBUG)
"#,
        loupe::VERSION
    );
}
