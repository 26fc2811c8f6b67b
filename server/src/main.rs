//! FileMaker CWP Gateway server binary.

use fmcwp_server::client::{Credentials, FileMakerServer, HttpTransport};
use fmcwp_server::config::Config;
use fmcwp_server::{app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fmcwp_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting FileMaker CWP Gateway on {}:{}", config.host, config.port);

    let transport = HttpTransport::new(config.fm_timeout)?;
    let server = FileMakerServer::new(
        config.fm_host.clone(),
        config.fm_port,
        Credentials::new(config.fm_username.clone(), config.fm_password.clone()),
        Arc::new(transport),
    );
    tracing::info!("Forwarding to {}", server.endpoint());

    let state = AppState {
        server,
        config: Arc::new(config.clone()),
    };

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
