use std::sync::Arc;

use clap::Parser;
use core_runtime::init_logging;
use stylesync_server::args::Args;
use stylesync_server::{create_router, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.logging()) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!("stylesync-server starting");

    let config = args.into_config().unwrap_or_else(|e| {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    });
    let bind_address = config.bind_address;
    let api_key = config.api_key.clone();

    let service = core_service::bootstrap(config).await.unwrap_or_else(|e| {
        error!("Failed to start service: {e}");
        std::process::exit(1);
    });

    if api_key.is_some() {
        info!("API key authentication enabled");
    }

    let app = create_router(Arc::new(AppState::new(service, api_key)));

    info!("Binding to {bind_address}");
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {bind_address}: {e}");
            std::process::exit(1);
        });

    info!("stylesync-server listening on http://{bind_address}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
