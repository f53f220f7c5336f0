//! HTTP server wiring

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use templatecache::{FsSource, TemplateCache};

use crate::config::Config;
use crate::render::PageRenderer;
use crate::routes::{AppState, checkout_handler, home_handler, menu_handler, product_handler};

/// Build the template cache and shared state from configuration
pub fn build_state(config: &Config) -> Result<Arc<AppState>> {
    let source = Arc::new(FsSource::new(&config.paths.templates));
    let cache = TemplateCache::new(source, config.mode)
        .context(format!("Failed to load templates from {}", config.paths.templates.display()))?;

    let renderer = PageRenderer::new(Arc::new(cache), config.site.name.clone());
    Ok(AppState::new(renderer, config.site.locale.clone()))
}

/// All routes, static file services and the request trace layer
pub fn build_router(state: Arc<AppState>, static_dir: &Path, snapshots_dir: &Path) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/menu", get(menu_handler))
        .route("/checkout", get(checkout_handler))
        .route("/product/{slug}", get(product_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/snapshots", ServeDir::new(snapshots_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the site until Ctrl+C or SIGTERM
pub async fn serve(config: &Config) -> Result<()> {
    info!("Initializing state...");
    let state = build_state(config)?;
    info!(
        "Template cache mode: {} (templates: {})",
        config.mode,
        config.paths.templates.display()
    );

    let app = build_router(state, &config.paths.static_dir, &config.paths.snapshots);

    let address = config.server.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind {address}"))?;

    println!("Server starting on {address}...");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
