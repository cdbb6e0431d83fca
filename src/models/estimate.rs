use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::EstimatorError;

// ─── Supported region ────────────────────────────────────────────────────────

// Approximate bounding box of Colombia. Coordinates outside it are rejected
// before any upstream call is made.
pub const MIN_LATITUDE: f64 = -4.5;
pub const MAX_LATITUDE: f64 = 13.5;
pub const MIN_LONGITUDE: f64 = -82.0;
pub const MAX_LONGITUDE: f64 = -66.0;

/// A validated geographic position inside the supported region.
///
/// Can only be built through [`Coordinate::new`] / [`Coordinate::parse`],
/// so every instance in the system is already range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinate {
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "lon")]
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, EstimatorError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(EstimatorError::InvalidCoordinateFormat);
        }
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude)
            || !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude)
        {
            return Err(EstimatorError::OutOfRegion);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse raw textual coordinates, as they arrive from path segments or
    /// HTML forms, then range-check them.
    pub fn parse(lat_raw: &str, lon_raw: &str) -> Result<Self, EstimatorError> {
        let latitude = lat_raw
            .trim()
            .parse::<f64>()
            .map_err(|_| EstimatorError::InvalidCoordinateFormat)?;
        let longitude = lon_raw
            .trim()
            .parse::<f64>()
            .map_err(|_| EstimatorError::InvalidCoordinateFormat)?;
        Self::new(latitude, longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

// ─── Irradiance ──────────────────────────────────────────────────────────────

/// Monthly-climatology irradiance resolved for one request.
///
/// `monthly` maps month number (1–12) to average-daily irradiance for that
/// month in kWh/m²/day. It is `None` when the upstream call failed or
/// returned no usable values, in which case `daily_average` carries the
/// fixed regional fallback.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IrradianceReading {
    pub daily_average: f64,
    pub monthly: Option<BTreeMap<u8, f64>>,
}

impl IrradianceReading {
    pub fn fallback(daily_average: f64) -> Self {
        Self {
            daily_average,
            monthly: None,
        }
    }
}

// ─── Estimation input / report ───────────────────────────────────────────────

/// Validated user parameters for one estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationInput {
    pub coordinate: Coordinate,
    pub monthly_consumption_kwh: f64,
    pub system_cost: f64,
    pub panel_area_m2: f64,
    pub tariff_per_kwh: f64,
}

/// Average irradiance over the two seasons of the supported region.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SeasonalBreakdown {
    /// December–March mean, kWh/m²/day.
    pub dry_season: f64,
    /// April–November mean, kWh/m²/day.
    pub wet_season: f64,
}

/// Complete generation / financial / environmental report.
///
/// All figures are already rounded for display: currency to whole pesos,
/// physical and percentage figures to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EstimationReport {
    pub daily_generation_kwh: f64,
    pub monthly_generation_kwh: f64,
    pub annual_generation_kwh: f64,
    /// Peak DC capacity of the sized system, kW.
    pub installed_capacity_kw: f64,
    pub system_efficiency_percent: f64,
    /// Generated energy consumed on-site each month, kWh.
    pub self_consumed_kwh: f64,
    /// Generated energy beyond the household's consumption, kWh/month.
    pub excess_kwh: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    /// Years until accumulated savings cover the system cost.
    /// `null` when savings never accumulate.
    pub payback_years: Option<f64>,
    /// Return on investment over the panel lifetime, percent.
    pub roi_percent: f64,
    pub co2_avoided_annual_kg: f64,
    /// Daily irradiance the report was computed from, kWh/m²/day.
    pub daily_irradiance: f64,
    /// Present only when monthly climatology was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_irradiance: Option<SeasonalBreakdown>,
}

// ─── REST API request / response types ───────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct EstimateRequest {
    /// Latitude, as a number or a numeric string (the HTML form sends strings).
    #[schema(value_type = f64)]
    pub lat: serde_json::Value,
    /// Longitude, as a number or a numeric string (the HTML form sends strings).
    #[schema(value_type = f64)]
    pub lon: serde_json::Value,
    /// Monthly household consumption, kWh.
    pub consumo: f64,
    /// Installed system cost, COP.
    pub costo: f64,
    /// Panel area, m². Defaults to the configured value.
    #[serde(default)]
    pub superficie: Option<f64>,
    /// Electricity tariff, COP/kWh. Defaults to the configured value.
    #[serde(default)]
    pub tarifa: Option<f64>,
}

impl EstimateRequest {
    pub fn coordinate(&self) -> Result<Coordinate, EstimatorError> {
        let latitude = raw_coordinate(&self.lat)?;
        let longitude = raw_coordinate(&self.lon)?;
        Coordinate::new(latitude, longitude)
    }
}

fn raw_coordinate(value: &serde_json::Value) -> Result<f64, EstimatorError> {
    match value {
        serde_json::Value::Number(n) => {
            n.as_f64().ok_or(EstimatorError::InvalidCoordinateFormat)
        }
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| EstimatorError::InvalidCoordinateFormat),
        _ => Err(EstimatorError::InvalidCoordinateFormat),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstimateResponse {
    pub timestamp: DateTime<Utc>,
    pub ubicacion: Coordinate,
    #[serde(flatten)]
    pub report: EstimationReport,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IrradianceResponse {
    /// Daily average irradiance, kWh/m²/day.
    pub radiacion_diaria: f64,
    /// Month number (1–12) to kWh/m²/day; absent when the fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radiacion_mensual: Option<BTreeMap<u8, f64>>,
    pub ubicacion: Coordinate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    #[schema(value_type = Object)]
    pub address: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReverseGeocodeResult {
    pub display_name: String,
    #[schema(value_type = Object)]
    pub address: serde_json::Value,
    pub ubicacion: Coordinate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub offline_mode: bool,
}

// ─── NASA POWER wire types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PowerClimatologyResponse {
    pub properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
pub struct PowerProperties {
    pub parameter: PowerParameters,
}

#[derive(Debug, Deserialize)]
pub struct PowerParameters {
    /// Month key ("1".."12") to irradiance; null months do happen.
    #[serde(rename = "ALLSKY_SFC_SW_DWN", default)]
    pub allsky_sfc_sw_dwn: HashMap<String, Option<f64>>,
}

// ─── Nominatim wire types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    // Nominatim serializes coordinates as strings.
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default)]
    pub address: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct NominatimReverseResponse {
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Pasto, the regional reference point.
    #[case(1.2136, -77.2811)]
    // Bounding-box corners are inclusive.
    #[case(MIN_LATITUDE, MIN_LONGITUDE)]
    #[case(MAX_LATITUDE, MAX_LONGITUDE)]
    #[case(MIN_LATITUDE, MAX_LONGITUDE)]
    #[case(MAX_LATITUDE, MIN_LONGITUDE)]
    #[case(4.711, -74.0721)] // Bogotá
    fn test_coordinates_inside_region_accepted(#[case] lat: f64, #[case] lon: f64) {
        let coordinate = Coordinate::new(lat, lon).expect("inside the region");
        assert_eq!(coordinate.latitude(), lat);
        assert_eq!(coordinate.longitude(), lon);
    }

    #[rstest]
    #[case(-4.51, -77.0)] // just south of the box
    #[case(13.51, -77.0)] // just north
    #[case(1.2, -82.01)] // just west
    #[case(1.2, -65.99)] // just east
    #[case(40.4168, -3.7038)] // Madrid
    #[case(-33.4489, -70.6693)] // Santiago
    fn test_coordinates_outside_region_rejected(#[case] lat: f64, #[case] lon: f64) {
        assert!(matches!(
            Coordinate::new(lat, lon),
            Err(EstimatorError::OutOfRegion)
        ));
    }

    #[test]
    fn test_non_finite_coordinates_are_a_format_error() {
        assert!(matches!(
            Coordinate::new(f64::NAN, -77.0),
            Err(EstimatorError::InvalidCoordinateFormat)
        ));
        assert!(matches!(
            Coordinate::new(1.2, f64::INFINITY),
            Err(EstimatorError::InvalidCoordinateFormat)
        ));
    }

    #[test]
    fn test_parse_accepts_numeric_text() {
        let coordinate = Coordinate::parse(" 1.2 ", "-77.3").expect("numeric text");
        assert_eq!(coordinate.latitude(), 1.2);
        assert_eq!(coordinate.longitude(), -77.3);
    }

    #[rstest]
    #[case("abc", "-77.3")]
    #[case("1.2", "west")]
    #[case("", "")]
    #[case("1,2", "-77.3")] // comma decimal separator is not accepted
    fn test_parse_rejects_non_numeric_text(#[case] lat: &str, #[case] lon: &str) {
        assert!(matches!(
            Coordinate::parse(lat, lon),
            Err(EstimatorError::InvalidCoordinateFormat)
        ));
    }

    #[test]
    fn test_request_coordinate_accepts_numbers_and_numeric_strings() {
        let request: EstimateRequest = serde_json::from_str(
            r#"{ "lat": 1.2, "lon": "-77.3", "consumo": 300.0, "costo": 8000000.0 }"#,
        )
        .expect("valid request");
        let coordinate = request.coordinate().expect("valid coordinate");
        assert_eq!(coordinate.latitude(), 1.2);
        assert_eq!(coordinate.longitude(), -77.3);
        assert_eq!(request.superficie, None);
        assert_eq!(request.tarifa, None);
    }

    #[test]
    fn test_request_coordinate_rejects_other_json_types() {
        let request: EstimateRequest = serde_json::from_str(
            r#"{ "lat": true, "lon": -77.3, "consumo": 300.0, "costo": 8000000.0 }"#,
        )
        .expect("deserializes; validation happens later");
        assert!(matches!(
            request.coordinate(),
            Err(EstimatorError::InvalidCoordinateFormat)
        ));
    }

    #[test]
    fn test_coordinate_serializes_as_lat_lon() {
        let coordinate = Coordinate::new(1.2, -77.3).unwrap();
        let json = serde_json::to_value(coordinate).unwrap();
        assert_eq!(json, serde_json::json!({ "lat": 1.2, "lon": -77.3 }));
    }
}
