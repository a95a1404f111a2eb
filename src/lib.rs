//! Heritage discovery backend for Timor-Leste places and trips.
//!
//! REST API over an S3-compatible bucket holding one JSON document per
//! entity (`<prefix>/<id>.json`). Places support filtered/sorted listing,
//! trips carry an ordered stop list with distance/time estimates, and the
//! authentication layer is an acknowledged mock.
//!
//! # Layout
//! - [`store`]  — object store trait (S3 + in-memory) and JSON bucket gateway
//! - [`model`]  — Place/Trip entities, canonicalization, merge, validation
//! - [`filter`] — in-memory filtering/sorting of place collections
//! - [`stats`]  — trip distance/time/day estimation
//! - [`auth`]   — observer registry + mock credentials
//! - [`routes`] — axum handlers
//!
//! # Running
//! ```sh
//! S3_REGION=... S3_BUCKET=... S3_ACCESS_KEY_ID=... S3_SECRET_ACCESS_KEY=... \
//!     cargo run
//! ```
//! The server starts without storage configuration too; storage-backed
//! routes then answer 500 naming the missing settings.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod routes;
pub mod state;
pub mod stats;
pub mod store;

use routes::{
    create_place, create_trip, delete_place, delete_trip, get_place, get_trip, list_places,
    list_trips, login, trip_stats, update_place, update_trip,
};
use state::AppState;

/// Builds the full router; separate from [`start_server`] so tests can drive
/// it directly.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/places", get(list_places).post(create_place))
        .route(
            "/places/{id}",
            get(get_place).patch(update_place).delete(delete_place),
        )
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/{id}",
            get(get_trip).patch(update_trip).delete(delete_trip),
        )
        .route("/trips/{id}/stats", get(trip_stats))
        .route("/auth/login", post(login))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
