use axum::{
    Router,
    routing::{get, post},
};

use crate::controllers::estimate_controller::{
    calcular, geocode, health, radiacion, reverse_geocode, system_params,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
/// Handlers extract `State<AppState>` or `State<Config>` via
/// `FromRef<AppState>`; a single `.with_state(state)` covers both.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/calcular", post(calcular))
        .route("/radiacion/{lat}/{lon}", get(radiacion))
        .route("/geocode", get(geocode))
        .route("/reverse-geocode/{lat}/{lon}", get(reverse_geocode))
        .route("/system/params", get(system_params))
        .route("/health", get(health))
        .with_state(state)
}
