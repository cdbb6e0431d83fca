use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub irradiance: IrradianceConfig,
    pub geocoding: GeocodingConfig,
    pub estimator: SystemParams,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IrradianceConfig {
    /// NASA POWER API root, without a trailing slash.
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Regional daily irradiance (kWh/m²/day) served whenever the upstream
    /// call fails or returns no usable values.
    pub fallback_daily_kwh_m2: f64,
    /// Skip the upstream entirely and always serve the fallback value.
    pub offline_mode: bool,
}

impl Default for IrradianceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://power.larc.nasa.gov".to_string(),
            timeout_seconds: 10,
            fallback_daily_kwh_m2: 4.5,
            offline_mode: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Nominatim API root, without a trailing slash.
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Physical and financial constants of the estimation model.
///
/// Kept in configuration rather than inlined so deployments can tune them
/// and tests can pin them deterministically.
#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
#[serde(default)]
pub struct SystemParams {
    /// Panel conversion efficiency (fraction of irradiance turned into DC).
    pub panel_efficiency: f64,
    /// Inverter DC→AC conversion efficiency.
    pub inverter_efficiency: f64,
    /// Wiring, soiling and mismatch losses.
    pub loss_factor: f64,
    /// Grid emission factor, kg CO₂ per kWh displaced.
    pub emission_factor_kg_per_kwh: f64,
    /// Panel service life used for the ROI horizon, years.
    pub panel_lifetime_years: f64,
    /// Panel area assumed when the caller does not supply one, m².
    pub default_panel_area_m2: f64,
    /// Electricity tariff assumed when the caller does not supply one,
    /// COP per kWh.
    pub default_tariff_per_kwh: f64,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            panel_efficiency: 0.20,
            inverter_efficiency: 0.95,
            loss_factor: 0.85,
            emission_factor_kg_per_kwh: 0.5,
            panel_lifetime_years: 25.0,
            default_panel_area_m2: 10.0,
            default_tariff_per_kwh: 700.0,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
