use utoipa::OpenApi;

use crate::config;
use crate::controllers::estimate_controller;
use crate::models::estimate;

#[derive(OpenApi)]
#[openapi(
    paths(
        estimate_controller::calcular,
        estimate_controller::radiacion,
        estimate_controller::geocode,
        estimate_controller::reverse_geocode,
        estimate_controller::system_params,
        estimate_controller::health,
    ),
    components(
        schemas(
            estimate::Coordinate,
            estimate::EstimateRequest,
            estimate::EstimateResponse,
            estimate::EstimationReport,
            estimate::SeasonalBreakdown,
            estimate::IrradianceReading,
            estimate::IrradianceResponse,
            estimate::GeocodeResult,
            estimate::ReverseGeocodeResult,
            estimate::HealthStatus,
            config::SystemParams,
        )
    ),
    tags(
        (name = "senergi", description = "Residential solar estimation API")
    )
)]
pub struct ApiDoc;
