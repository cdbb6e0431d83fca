use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::services::geocoding_service::GeocodingClient;
use crate::services::irradiance_service::IrradianceSource;

/// Immutable dependencies shared by every handler.
///
/// Estimation is stateless: nothing in here is mutated after startup, and
/// concurrent requests never interact through it: no caches, locks or
/// counters.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub irradiance: Arc<dyn IrradianceSource>,
    pub geocoding: Arc<GeocodingClient>,
}

impl AppState {
    pub fn new(
        config: Config,
        irradiance: Arc<dyn IrradianceSource>,
        geocoding: Arc<GeocodingClient>,
    ) -> Self {
        Self {
            config,
            irradiance,
            geocoding,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Config {
        state.config.clone()
    }
}
