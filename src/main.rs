mod api_docs;
mod config;
mod controllers;
mod error;
mod models;
mod routes;
mod services;
mod shared_state;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{Router, response::Html, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::estimate_routes::api_routes;
use crate::services::geocoding_service::GeocodingClient;
use crate::services::irradiance_service::{FixedIrradiance, IrradianceSource, NasaPowerClient};
use crate::shared_state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load configuration
    let config = match Config::load("config.json") {
        Ok(c) => c,
        Err(e) => {
            warn!("config.json not loaded ({e}); using built-in defaults");
            Config::default()
        }
    };

    // 2. Wire the irradiance source: real NASA POWER client, or the fixed
    //    regional value when offline mode is requested.
    let irradiance: Arc<dyn IrradianceSource> = if config.irradiance.offline_mode {
        info!("offline mode: serving the fixed regional irradiance value");
        Arc::new(FixedIrradiance::constant(
            config.irradiance.fallback_daily_kwh_m2,
        ))
    } else {
        match NasaPowerClient::new(&config.irradiance) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                warn!("NASA POWER client unavailable ({e}); serving the fixed regional value");
                Arc::new(FixedIrradiance::constant(
                    config.irradiance.fallback_daily_kwh_m2,
                ))
            }
        }
    };

    let geocoding = match GeocodingClient::new(&config.geocoding) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("failed to build geocoding client: {e}");
            return;
        }
    };

    let state = AppState::new(config.clone(), irradiance, geocoding);

    // 3. HTTP server: API, Scalar docs, static frontend, CORS for the
    //    browser clients.
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route(
            "/scalar",
            get(|| async { Html(Scalar::new(ApiDoc::openapi()).to_html()) }),
        )
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .unwrap_or_else(|_| IpAddr::from([0, 0, 0, 0]));
    let addr = SocketAddr::new(ip, config.server.port);
    info!("API server listening on http://{addr}");
    info!("Scalar UI: http://{addr}/scalar");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
