//! Solar irradiance retrieval from NASA POWER.
//!
//! The climatology endpoint returns, per parameter, one long-term average
//! value per month. Those values already represent average-daily irradiance
//! for their month, so the annual daily figure is the plain mean of the
//! usable monthly values, not a division by 365.
//!
//! Retrieval never fails outward: every transport, status, or shape problem
//! degrades to the fixed regional fallback so the estimator always receives
//! a usable reading.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::IrradianceConfig;
use crate::models::estimate::{Coordinate, IrradianceReading, PowerClimatologyResponse};

pub const IRRADIANCE_PARAMETER: &str = "ALLSKY_SFC_SW_DWN";

/// Source of irradiance readings. One network-backed implementation and one
/// fixed-value stub, so the estimator and its tests never need live access.
#[async_trait]
pub trait IrradianceSource: Send + Sync {
    async fn fetch(&self, coordinate: &Coordinate) -> IrradianceReading;
}

// ─── NASA POWER client ───────────────────────────────────────────────────────

pub struct NasaPowerClient {
    client: Client,
    base_url: String,
    fallback: f64,
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("no usable monthly values in response")]
    EmptyParameter,
}

impl NasaPowerClient {
    pub fn new(config: &IrradianceConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            fallback: config.fallback_daily_kwh_m2,
        })
    }

    async fn request(&self, coordinate: &Coordinate) -> Result<IrradianceReading, FetchError> {
        let url = format!("{}/api/temporal/climatology/point", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("parameters", IRRADIANCE_PARAMETER),
                ("community", "RE"),
                ("format", "JSON"),
            ])
            .query(&[
                ("latitude", coordinate.latitude()),
                ("longitude", coordinate.longitude()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body: PowerClimatologyResponse = response.json().await?;
        reading_from_monthly(body.properties.parameter.allsky_sfc_sw_dwn)
            .ok_or(FetchError::EmptyParameter)
    }
}

#[async_trait]
impl IrradianceSource for NasaPowerClient {
    async fn fetch(&self, coordinate: &Coordinate) -> IrradianceReading {
        match self.request(coordinate).await {
            Ok(reading) => {
                debug!(
                    lat = coordinate.latitude(),
                    lon = coordinate.longitude(),
                    daily_average = reading.daily_average,
                    "irradiance resolved from NASA POWER"
                );
                reading
            }
            Err(reason) => {
                warn!(
                    lat = coordinate.latitude(),
                    lon = coordinate.longitude(),
                    %reason,
                    "irradiance fetch failed, serving regional fallback"
                );
                IrradianceReading::fallback(self.fallback)
            }
        }
    }
}

/// Build a reading from the raw monthly map, keeping only months 1–12 with
/// a finite positive value. Returns `None` when nothing usable remains.
fn reading_from_monthly(raw: HashMap<String, Option<f64>>) -> Option<IrradianceReading> {
    let mut monthly = BTreeMap::new();
    for (key, value) in raw {
        let Ok(month) = key.parse::<u8>() else {
            continue;
        };
        if !(1..=12).contains(&month) {
            continue;
        }
        if let Some(v) = value
            && v.is_finite()
            && v > 0.0
        {
            monthly.insert(month, v);
        }
    }

    if monthly.is_empty() {
        return None;
    }
    let daily_average = monthly.values().sum::<f64>() / monthly.len() as f64;
    Some(IrradianceReading {
        daily_average,
        monthly: Some(monthly),
    })
}

// ─── Fixed-value stub ────────────────────────────────────────────────────────

/// Irradiance source that always returns the same reading. Used in offline
/// mode and injected in tests.
pub struct FixedIrradiance {
    reading: IrradianceReading,
}

impl FixedIrradiance {
    pub fn new(reading: IrradianceReading) -> Self {
        Self { reading }
    }

    pub fn constant(daily_average: f64) -> Self {
        Self::new(IrradianceReading::fallback(daily_average))
    }
}

#[async_trait]
impl IrradianceSource for FixedIrradiance {
    async fn fetch(&self, _coordinate: &Coordinate) -> IrradianceReading {
        self.reading.clone()
    }
}
