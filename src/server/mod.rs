//! Web server module

pub mod http;

use anyhow::{Context, Result};
use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, DisplayConfig};
use crate::predictor::RetrainOutcome;
use crate::service::SalaryService;
use crate::store::SqliteObservationStore;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub service: SalaryService,
    pub display: Arc<DisplayConfig>,
}

impl ServerState {
    pub fn new(service: SalaryService, display: DisplayConfig) -> Self {
        Self {
            service,
            display: Arc::new(display),
        }
    }
}

/// Build the application router
pub fn router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_page))
        .route("/api/predict/", post(http::predict_handler))
        .route("/api/train/", post(http::add_observation_handler))
        .route("/api/delete/", post(http::delete_observation_handler))
        .route("/api/reset/", post(http::reset_handler))
        .route("/api/delete-all/", post(http::delete_all_handler))
        .route("/api/training-stats/", get(http::training_stats_handler))
        .route("/api/observations/", get(http::observations_handler))
        .route("/api/status/", get(http::status_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the store, train once, and serve until Ctrl-C
pub async fn start(config: &Config) -> Result<()> {
    let store = SqliteObservationStore::new(&config.storage.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database {}",
                config.storage.database_path.display()
            )
        })?;

    let service = SalaryService::new(store);
    let outcome = service
        .initialize(config.storage.seed_on_empty)
        .await
        .context("Failed to initialize predictor")?;

    let state = ServerState::new(service, config.display.clone());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     Salary Predictor Server Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("✓ Database: {}", config.storage.database_path.display());
    match outcome {
        RetrainOutcome::Trained { rows } => println!("✓ Model trained on {} observations", rows),
        RetrainOutcome::Empty => {
            println!("⚠ No observations yet, predictions disabled");
            println!("  Tip: POST /api/reset/ to load the default dataset");
        }
        RetrainOutcome::Failed => println!("⚠ Model failed to train, see logs"),
    }
    println!();
    println!("🚀 Listening on http://{}", addr);
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Handler for the index page
async fn index_page() -> Html<&'static str> {
    Html(r#"<!DOCTYPE html>
<html>
<head>
    <title>Salary Predictor</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
        }
        .endpoint {
            background: #eee;
            padding: 10px;
            margin: 10px 0;
            border-radius: 4px;
            font-family: monospace;
        }
    </style>
</head>
<body>
    <h1>Salary Predictor</h1>
    <h2>API Endpoints:</h2>
    <div class="endpoint">POST /api/predict/ - {"years", "level"} → yearly and monthly salary</div>
    <div class="endpoint">POST /api/train/ - {"years", "level", "salary"} → add an observation</div>
    <div class="endpoint">POST /api/delete/ - {"id"} → delete an observation</div>
    <div class="endpoint">POST /api/reset/ - restore the default observations</div>
    <div class="endpoint">POST /api/delete-all/ - delete every observation</div>
    <div class="endpoint">GET /api/training-stats/ - dataset statistics</div>
    <div class="endpoint">GET /api/observations/ - dataset ordered by years</div>
    <div class="endpoint">GET /api/status/ - server status</div>
</body>
</html>"#)
}
