//! Forward and reverse geocoding via Nominatim.
//!
//! Pure pass-through: the estimation core never depends on it. Unlike the
//! irradiance path there is no meaningful fallback here, so failures
//! surface to the caller as `ProviderUnavailable`.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use crate::config::GeocodingConfig;
use crate::error::EstimatorError;
use crate::models::estimate::{
    Coordinate, GeocodeResult, NominatimPlace, NominatimReverseResponse, ReverseGeocodeResult,
};

const USER_AGENT: &str = "SENERGI/1.0";

pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Forward search, biased to the service region and filtered to the
    /// supported bounding box.
    pub async fn search(&self, query: &str) -> Result<Vec<GeocodeResult>, EstimatorError> {
        // Regional suffix gives Nominatim much better hit rates for the
        // small towns this service is used for.
        let search_query = format!("{query}, Nariño, Colombia");
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept-Language", "es")
            .query(&[
                ("q", search_query.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "10"),
                ("countrycodes", "co"),
            ])
            .send()
            .await
            .map_err(provider_error)?;

        if !response.status().is_success() {
            return Err(provider_status(response.status()));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(provider_error)?;
        let results = places_in_region(places);
        debug!(query, results = results.len(), "geocoding search resolved");
        Ok(results)
    }

    /// Reverse lookup for an already-validated coordinate.
    pub async fn reverse(
        &self,
        coordinate: &Coordinate,
    ) -> Result<ReverseGeocodeResult, EstimatorError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept-Language", "es")
            .query(&[("format", "json"), ("addressdetails", "1")])
            .query(&[
                ("lat", coordinate.latitude()),
                ("lon", coordinate.longitude()),
            ])
            .send()
            .await
            .map_err(provider_error)?;

        if !response.status().is_success() {
            return Err(provider_status(response.status()));
        }

        let place: NominatimReverseResponse = response.json().await.map_err(provider_error)?;
        Ok(ReverseGeocodeResult {
            display_name: place
                .display_name
                .unwrap_or_else(|| "Dirección no disponible".to_string()),
            address: place.address,
            ubicacion: *coordinate,
        })
    }
}

/// Keep only places whose coordinates parse and fall inside the supported
/// bounding box.
fn places_in_region(places: Vec<NominatimPlace>) -> Vec<GeocodeResult> {
    places
        .into_iter()
        .filter_map(|place| {
            let coordinate = Coordinate::parse(&place.lat, &place.lon).ok()?;
            Some(GeocodeResult {
                lat: coordinate.latitude(),
                lon: coordinate.longitude(),
                display_name: place.display_name,
                address: place.address,
            })
        })
        .collect()
}

fn provider_error(err: reqwest::Error) -> EstimatorError {
    error!(%err, "geocoding request failed");
    EstimatorError::ProviderUnavailable(err.to_string())
}

fn provider_status(status: reqwest::StatusCode) -> EstimatorError {
    error!(%status, "geocoding request rejected");
    EstimatorError::ProviderUnavailable(format!("geocoding service returned {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(lat: &str, lon: &str, name: &str) -> NominatimPlace {
        NominatimPlace {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: name.to_string(),
            address: serde_json::json!({}),
        }
    }

    #[test]
    fn test_out_of_region_places_are_dropped() {
        let places = vec![
            place("1.2136", "-77.2811", "Pasto, Nariño"),
            place("40.4168", "-3.7038", "Madrid"),
            place("not-a-number", "-77.0", "Broken"),
        ];
        let results = places_in_region(places);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "Pasto, Nariño");
        assert_eq!(results[0].lat, 1.2136);
        assert_eq!(results[0].lon, -77.2811);
    }

    #[test]
    fn test_reverse_wire_shape_tolerates_missing_fields() {
        let parsed: NominatimReverseResponse = serde_json::from_str("{}").expect("wire shape");
        assert_eq!(parsed.display_name, None);
        assert_eq!(parsed.address, serde_json::Value::Null);
    }
}
