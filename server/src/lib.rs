//! HTTP surface for the Mezban chef application workflow.
//!
//! # Trust boundary
//!
//! This service sits behind the marketplace gateway, which terminates TLS
//! and verifies the caller's token. The verified identity is forwarded as
//! `x-user-id` / `x-user-role` headers; requests missing them are
//! rejected (see [`auth`]). Nothing here parses or verifies tokens.

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post, put},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use routes::{
    create_application_handler, get_application_handler, list_applications_handler,
    update_status_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = std::env::var_os("MEZBAN_CONFIG").map(PathBuf::from);
    let config = mezban::load_config(config_path.as_deref()).expect("Failed to load config");

    info!("Initializing state...");
    let state = AppState::new(config).expect("Failed to initialize state");

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route(
            "/chef-applications",
            post(create_application_handler).get(list_applications_handler),
        )
        .route("/chef-applications/:id", get(get_application_handler))
        .route("/chef-applications/:id/status", put(update_status_handler))
        .layer(cors)
        .with_state(state.clone());

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
