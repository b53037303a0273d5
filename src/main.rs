use std::future::IntoFuture;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod models;
mod routes;
mod services;
mod utils;

use api::YahooClient;
use routes::AppState;
use services::page_service;
use utils::AppConfig;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tickerplot=debug,tower_http=info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("📈 Starting tickerplot...");

    if let Err(e) = page_service::check_templates() {
        error!("Failed to load page templates: {:?}", e);
        return;
    }

    let config = AppConfig::from_env();
    info!("Configuration: {:?}", config);

    let client = match YahooClient::with_base_url(
        config.yahoo_base_url.clone(),
        config.provider_timeout,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create market-data client: {}", e);
            return;
        }
    };

    let state = AppState::new(
        Arc::new(client),
        config.static_dir.clone(),
        config.chart_retention,
    );

    let analysis_listener = match TcpListener::bind(config.analysis_addr()).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind analysis service on {}: {}", config.analysis_addr(), e);
            return;
        }
    };
    let compare_listener = match TcpListener::bind(config.compare_addr()).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind compare service on {}: {}", config.compare_addr(), e);
            return;
        }
    };

    info!("Stock analysis listening on http://{}", config.analysis_addr());
    info!("Stock comparison listening on http://{}", config.compare_addr());

    let analysis = axum::serve(analysis_listener, routes::analysis_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal());
    let compare = axum::serve(compare_listener, routes::compare_router(state))
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = tokio::try_join!(analysis.into_future(), compare.into_future()) {
        error!("Server error: {}", e);
    }

    info!("Shut down");
}
