use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::IntoParams;

use crate::config::Config;
use crate::error::EstimatorError;
use crate::models::estimate::{
    Coordinate, EstimateRequest, EstimateResponse, EstimationInput, HealthStatus,
    IrradianceResponse,
};
use crate::services::solar_estimator;
use crate::shared_state::AppState;

/// POST /api/calcular
/// Run the full estimation pipeline
///
/// Validates the coordinate and user parameters, resolves irradiance from
/// NASA POWER (falling back to the fixed regional value when the upstream is
/// unavailable) and returns the generation, savings and environmental report.
#[utoipa::path(
    post,
    path = "/api/calcular",
    request_body = EstimateRequest,
    responses(
        (status = 200, description = "Estimation report", body = EstimateResponse),
        (status = 400, description = "Invalid coordinates or parameters"),
        (status = 500, description = "Internal computation failure")
    )
)]
pub async fn calcular(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<impl IntoResponse, EstimatorError> {
    let coordinate = request.coordinate()?;
    let params = &state.config.estimator;
    let input = EstimationInput {
        coordinate,
        monthly_consumption_kwh: request.consumo,
        system_cost: request.costo,
        panel_area_m2: request.superficie.unwrap_or(params.default_panel_area_m2),
        tariff_per_kwh: request.tarifa.unwrap_or(params.default_tariff_per_kwh),
    };
    // Refuse bad parameters before spending an upstream call.
    solar_estimator::validate_input(&input)?;

    let reading = state.irradiance.fetch(&coordinate).await;
    let report = solar_estimator::estimate(&input, &reading, params)?;

    info!(
        lat = coordinate.latitude(),
        lon = coordinate.longitude(),
        monthly_generation_kwh = report.monthly_generation_kwh,
        "estimation served"
    );

    let response = EstimateResponse {
        timestamp: Utc::now(),
        ubicacion: coordinate,
        report,
    };
    Ok(Json(json!({ "success": true, "data": response })))
}

/// GET /api/radiacion/{lat}/{lon}
/// Irradiance reading for a coordinate
///
/// Returns the daily average and, when the climatology source responded,
/// the month-by-month detail.
#[utoipa::path(
    get,
    path = "/api/radiacion/{lat}/{lon}",
    params(
        ("lat" = String, Path, description = "Latitude inside the supported region"),
        ("lon" = String, Path, description = "Longitude inside the supported region")
    ),
    responses(
        (status = 200, description = "Irradiance reading", body = IrradianceResponse),
        (status = 400, description = "Invalid or out-of-region coordinates")
    )
)]
pub async fn radiacion(
    Path((lat, lon)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, EstimatorError> {
    let coordinate = Coordinate::parse(&lat, &lon)?;
    let reading = state.irradiance.fetch(&coordinate).await;
    let response = IrradianceResponse {
        radiacion_diaria: solar_estimator::round2(reading.daily_average),
        radiacion_mensual: reading.monthly,
        ubicacion: coordinate,
    };
    Ok(Json(json!({ "success": true, "data": response })))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GeocodeQuery {
    /// Free-text place name to search for.
    pub q: String,
}

/// GET /api/geocode
/// Forward geocoding
///
/// Searches Nominatim for the given place name, biased to the service
/// region; results outside the supported bounding box are filtered out.
#[utoipa::path(
    get,
    path = "/api/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Matching places inside the supported region"),
        (status = 400, description = "Empty search query"),
        (status = 502, description = "Geocoding service unavailable")
    )
)]
pub async fn geocode(
    Query(query): Query<GeocodeQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, EstimatorError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(EstimatorError::InvalidParameters(
            "search query must not be empty".to_string(),
        ));
    }
    let results = state.geocoding.search(q).await?;
    Ok(Json(json!({ "success": true, "data": results })))
}

/// GET /api/reverse-geocode/{lat}/{lon}
/// Reverse geocoding
#[utoipa::path(
    get,
    path = "/api/reverse-geocode/{lat}/{lon}",
    params(
        ("lat" = String, Path, description = "Latitude inside the supported region"),
        ("lon" = String, Path, description = "Longitude inside the supported region")
    ),
    responses(
        (status = 200, description = "Address for the coordinate"),
        (status = 400, description = "Invalid or out-of-region coordinates"),
        (status = 502, description = "Geocoding service unavailable")
    )
)]
pub async fn reverse_geocode(
    Path((lat, lon)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, EstimatorError> {
    let coordinate = Coordinate::parse(&lat, &lon)?;
    let result = state.geocoding.reverse(&coordinate).await?;
    Ok(Json(json!({ "success": true, "data": result })))
}

/// GET /api/system/params
/// Model constants in effect
///
/// The physical and financial constants the estimator is currently running
/// with, as loaded from configuration.
#[utoipa::path(
    get,
    path = "/api/system/params",
    responses(
        (status = 200, description = "Estimation model constants", body = crate::config::SystemParams)
    )
)]
pub async fn system_params(State(config): State<Config>) -> impl IntoResponse {
    Json(config.estimator)
}

/// GET /api/health
/// Service health
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service health", body = HealthStatus))
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        offline_mode: state.config.irradiance.offline_mode,
    })
}
