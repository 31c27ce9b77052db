// Run and routing helpers (build_router, run_server).

use std::future::IntoFuture;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::{routing::get, Router};
use tower_http::services::{ServeDir, ServeFile};

use crate::catalog::{DirectoryCatalog, MediaCatalog};
use crate::config::Config;
use crate::server::AppState;

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let index = config.static_path.join("index.html");
    let serve_static = ServeDir::new(&config.static_path)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(index));

    Router::new()
        .route("/health", get(crate::server::http::health_handler))
        .route("/ws", get(crate::server::ws::ws_handler))
        .route("/api/videos", get(crate::server::http::videos_handler))
        .route("/api/images", get(crate::server::http::images_handler))
        .nest_service("/vids", ServeDir::new(&config.videos_path))
        .nest_service("/images", ServeDir::new(&config.images_path))
        .nest_service("/thumbnails", ServeDir::new(&config.thumbnails_path))
        .fallback_service(serve_static)
        .with_state(state)
}

/// Start the coordinator and serve until either the HTTP server or the
/// coordinator stops.
pub async fn run_server(config: Config) -> Result<()> {
    let catalog: Arc<dyn MediaCatalog> = Arc::new(DirectoryCatalog::new(
        config.videos_path.clone(),
        config.images_path.clone(),
    ));

    let port = find_available_port(&config.address, config.port)?;
    if port != config.port {
        tracing::warn!(configured = config.port, port, "configured port was not available, using alternative port");
    }
    let addr: SocketAddr = format!("{}:{}", config.address, port)
        .parse()
        .with_context(|| format!("parsing listen address '{}:{}'", config.address, port))?;

    let (state, coordinator) = AppState::spawn(config, catalog);
    let app = build_router(state);

    let display_addr = if addr.ip().is_unspecified() || addr.ip().is_loopback() {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    };
    tracing::info!(display_addr = %display_addr, "watch party server running");

    println!("\n\x1b[1;36m=== Watch Party ===\x1b[0m");
    println!(
        "\x1b[1mURL:\x1b[0m       \x1b[4;34mhttp://{}\x1b[0m",
        display_addr
    );
    println!("\x1b[1;36m===================\x1b[0m\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", display_addr))?;

    tokio::select! {
        served = axum::serve(listener, app).into_future() => {
            served.context("http server stopped")?;
        }
        finished = coordinator => {
            match finished {
                Ok(Ok(())) => tracing::info!("coordinator finished"),
                Ok(Err(e)) => return Err(anyhow::Error::new(e).context("coordinator failed")),
                Err(e) => return Err(anyhow::Error::new(e).context("coordinator task panicked")),
            }
        }
    }
    Ok(())
}

/// Find the first available port starting from the given port number
fn find_available_port(address: &str, start_port: u16) -> Result<u16> {
    let end = start_port.saturating_add(100);
    for port in start_port..end {
        if TcpListener::bind((address, port)).is_ok() {
            return Ok(port);
        }
    }
    Err(anyhow!(
        "No available ports found in range {}..{}",
        start_port,
        end
    ))
}
