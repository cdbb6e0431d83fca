//! Generation, financial and environmental estimation.
//!
//! Pure computation over a validated input, a resolved irradiance reading
//! and the configured model constants. Deterministic: identical arguments
//! always produce the identical report.

use std::collections::BTreeMap;

use tracing::error;

use crate::config::SystemParams;
use crate::error::EstimatorError;
use crate::models::estimate::{
    EstimationInput, EstimationReport, IrradianceReading, SeasonalBreakdown,
};

/// Mean calendar month length, days.
const DAYS_PER_MONTH: f64 = 30.44;
const DAYS_PER_YEAR: f64 = 365.0;

// The supported region has two seasons, not four. Both buckets always
// divide by their full size; a month missing from the climatology counts
// as zero. That skews the mean downward but matches the historical report
// format consumers already depend on.
const DRY_SEASON_MONTHS: [u8; 4] = [12, 1, 2, 3];
const WET_SEASON_MONTHS: [u8; 8] = [4, 5, 6, 7, 8, 9, 10, 11];

/// Reject non-positive (or non-finite) user parameters. Called by
/// [`estimate`], and also exposed so the request handler can refuse bad
/// input before the irradiance fetch is even issued.
pub fn validate_input(input: &EstimationInput) -> Result<(), EstimatorError> {
    let checks = [
        ("consumo", input.monthly_consumption_kwh),
        ("costo", input.system_cost),
        ("superficie", input.panel_area_m2),
        ("tarifa", input.tariff_per_kwh),
    ];
    for (name, value) in checks {
        if !value.is_finite() || value <= 0.0 {
            return Err(EstimatorError::InvalidParameters(format!(
                "{name} must be a positive number"
            )));
        }
    }
    Ok(())
}

pub fn estimate(
    input: &EstimationInput,
    reading: &IrradianceReading,
    params: &SystemParams,
) -> Result<EstimationReport, EstimatorError> {
    validate_input(input)?;

    let system_efficiency =
        params.panel_efficiency * params.inverter_efficiency * params.loss_factor;
    let installed_capacity_kw = input.panel_area_m2 * params.panel_efficiency;

    // Generation: irradiance × DC capacity, derated by the AC chain.
    let daily_generation_kwh = reading.daily_average
        * installed_capacity_kw
        * params.inverter_efficiency
        * params.loss_factor;
    let monthly_generation_kwh = daily_generation_kwh * DAYS_PER_MONTH;
    let annual_generation_kwh = daily_generation_kwh * DAYS_PER_YEAR;

    // Financials: only self-consumed energy saves money.
    let self_consumed_kwh = monthly_generation_kwh.min(input.monthly_consumption_kwh);
    let excess_kwh = (monthly_generation_kwh - input.monthly_consumption_kwh).max(0.0);
    let monthly_savings = self_consumed_kwh * input.tariff_per_kwh;
    let annual_savings = monthly_savings * 12.0;

    let (payback_years, roi_percent) = if annual_savings > 0.0 {
        let payback = input.system_cost / annual_savings;
        let lifetime_savings = annual_savings * params.panel_lifetime_years;
        let roi = (lifetime_savings - input.system_cost) / input.system_cost * 100.0;
        (Some(payback), roi)
    } else {
        (None, 0.0)
    };

    let co2_avoided_annual_kg = annual_generation_kwh * params.emission_factor_kg_per_kwh;

    let seasonal_irradiance = reading.monthly.as_ref().map(|monthly| SeasonalBreakdown {
        dry_season: round2(bucket_average(monthly, &DRY_SEASON_MONTHS)),
        wet_season: round2(bucket_average(monthly, &WET_SEASON_MONTHS)),
    });

    // Rounding happens here and only here; everything above ran at full
    // precision.
    let report = EstimationReport {
        daily_generation_kwh: round2(daily_generation_kwh),
        monthly_generation_kwh: round2(monthly_generation_kwh),
        annual_generation_kwh: round2(annual_generation_kwh),
        installed_capacity_kw: round2(installed_capacity_kw),
        system_efficiency_percent: round2(system_efficiency * 100.0),
        self_consumed_kwh: round2(self_consumed_kwh),
        excess_kwh: round2(excess_kwh),
        monthly_savings: round_currency(monthly_savings),
        annual_savings: round_currency(annual_savings),
        payback_years: payback_years.map(round2),
        roi_percent: round2(roi_percent),
        co2_avoided_annual_kg: round2(co2_avoided_annual_kg),
        daily_irradiance: round2(reading.daily_average),
        seasonal_irradiance,
    };

    ensure_finite(&report, input)?;
    Ok(report)
}

fn bucket_average(monthly: &BTreeMap<u8, f64>, months: &[u8]) -> f64 {
    let total: f64 = months
        .iter()
        .map(|month| monthly.get(month).copied().unwrap_or(0.0))
        .sum();
    total / months.len() as f64
}

/// Round to two decimals, for physical and percentage figures.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to whole currency units (COP has no practical subunit).
fn round_currency(value: f64) -> f64 {
    value.round()
}

/// A non-finite figure means a logic error upstream, not bad user input.
/// Log everything we know and surface an opaque failure.
fn ensure_finite(report: &EstimationReport, input: &EstimationInput) -> Result<(), EstimatorError> {
    let figures = [
        report.daily_generation_kwh,
        report.monthly_generation_kwh,
        report.annual_generation_kwh,
        report.installed_capacity_kw,
        report.system_efficiency_percent,
        report.self_consumed_kwh,
        report.excess_kwh,
        report.monthly_savings,
        report.annual_savings,
        report.payback_years.unwrap_or(0.0),
        report.roi_percent,
        report.co2_avoided_annual_kg,
    ];
    if figures.iter().all(|figure| figure.is_finite()) {
        Ok(())
    } else {
        error!(?input, ?report, "estimation produced a non-finite figure");
        Err(EstimatorError::Computation(
            "non-finite estimation figure".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::estimate::Coordinate;
    use rstest::rstest;

    fn input() -> EstimationInput {
        EstimationInput {
            coordinate: Coordinate::new(1.2, -77.3).unwrap(),
            monthly_consumption_kwh: 300.0,
            system_cost: 8_000_000.0,
            panel_area_m2: 10.0,
            tariff_per_kwh: 700.0,
        }
    }

    fn fallback_reading() -> IrradianceReading {
        IrradianceReading::fallback(4.5)
    }

    fn params() -> SystemParams {
        SystemParams::default()
    }

    #[test]
    fn test_reference_scenario_pasto() {
        let report = estimate(&input(), &fallback_reading(), &params()).unwrap();

        assert_eq!(report.installed_capacity_kw, 2.0);
        // 4.5 × 2.0 × 0.95 × 0.85
        assert!((report.daily_generation_kwh - 7.27).abs() < 1e-9);
        assert!((report.monthly_generation_kwh - 221.22).abs() < 1e-9);
        assert!((report.annual_generation_kwh - 2652.64).abs() < 1e-9);
        // Generation below consumption: everything is self-consumed.
        assert_eq!(report.self_consumed_kwh, report.monthly_generation_kwh);
        assert_eq!(report.excess_kwh, 0.0);
        // 221.2227 kWh × 700 COP, rounded to whole pesos.
        assert_eq!(report.monthly_savings, 154_856.0);
        assert_eq!(report.annual_savings, 1_858_271.0);
        assert!((report.payback_years.unwrap() - 4.31).abs() < 1e-9);
        assert!((report.roi_percent - 480.71).abs() < 1e-9);
        assert!((report.co2_avoided_annual_kg - 1326.32).abs() < 1e-9);
        assert_eq!(report.system_efficiency_percent, 16.15);
        assert_eq!(report.daily_irradiance, 4.5);
        // The fallback reading carries no monthly detail.
        assert!(report.seasonal_irradiance.is_none());
    }

    #[rstest]
    #[case(0.0, 8_000_000.0, 10.0, 700.0)]
    #[case(300.0, -1.0, 10.0, 700.0)]
    #[case(300.0, 8_000_000.0, 0.0, 700.0)]
    #[case(300.0, 8_000_000.0, 10.0, -700.0)]
    #[case(f64::NAN, 8_000_000.0, 10.0, 700.0)]
    fn test_non_positive_parameters_rejected(
        #[case] consumption: f64,
        #[case] cost: f64,
        #[case] area: f64,
        #[case] tariff: f64,
    ) {
        let input = EstimationInput {
            coordinate: Coordinate::new(1.2, -77.3).unwrap(),
            monthly_consumption_kwh: consumption,
            system_cost: cost,
            panel_area_m2: area,
            tariff_per_kwh: tariff,
        };
        assert!(matches!(
            estimate(&input, &fallback_reading(), &params()),
            Err(EstimatorError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_zero_savings_reports_payback_not_applicable() {
        // Zero irradiance → zero generation → zero savings.
        let reading = IrradianceReading::fallback(0.0);
        let report = estimate(&input(), &reading, &params()).unwrap();
        assert_eq!(report.annual_savings, 0.0);
        assert_eq!(report.payback_years, None);
        assert_eq!(report.roi_percent, 0.0);
    }

    #[test]
    fn test_generation_is_monotonic_in_panel_area() {
        let mut previous = 0.0;
        for area in [1.0, 5.0, 10.0, 25.0, 100.0] {
            let mut varied = input();
            varied.panel_area_m2 = area;
            let report = estimate(&varied, &fallback_reading(), &params()).unwrap();
            assert!(
                report.monthly_generation_kwh >= previous,
                "area {area} m² generated less than a smaller array"
            );
            previous = report.monthly_generation_kwh;
        }
    }

    #[test]
    fn test_excess_energy_when_generation_beats_consumption() {
        let mut small_home = input();
        small_home.monthly_consumption_kwh = 100.0;
        let report = estimate(&small_home, &fallback_reading(), &params()).unwrap();
        assert_eq!(report.self_consumed_kwh, 100.0);
        assert!((report.excess_kwh - 121.22).abs() < 1e-9);
        // Savings are capped by consumption.
        assert_eq!(report.monthly_savings, 70_000.0);
    }

    #[test]
    fn test_seasonal_buckets_use_fixed_denominators() {
        // Only three months reported; both buckets still divide by their
        // full size.
        let monthly = BTreeMap::from([(1u8, 5.0), (2u8, 5.0), (7u8, 4.0)]);
        let reading = IrradianceReading {
            daily_average: 4.5,
            monthly: Some(monthly),
        };
        let report = estimate(&input(), &reading, &params()).unwrap();
        let seasonal = report.seasonal_irradiance.expect("monthly data present");
        // Dry: (0 + 5 + 5 + 0) / 4
        assert_eq!(seasonal.dry_season, 2.5);
        // Wet: 4 / 8
        assert_eq!(seasonal.wet_season, 0.5);
    }

    #[test]
    fn test_full_year_seasonal_means() {
        let monthly: BTreeMap<u8, f64> = (1u8..=12).map(|m| (m, f64::from(m))).collect();
        let reading = IrradianceReading {
            daily_average: 6.5,
            monthly: Some(monthly),
        };
        let report = estimate(&input(), &reading, &params()).unwrap();
        let seasonal = report.seasonal_irradiance.unwrap();
        // Dry {12,1,2,3}: (12+1+2+3)/4; wet {4..11}: (4+…+11)/8.
        assert_eq!(seasonal.dry_season, 4.5);
        assert_eq!(seasonal.wet_season, 7.5);
    }

    #[test]
    fn test_identical_inputs_give_identical_reports() {
        let reading = IrradianceReading {
            daily_average: 5.1,
            monthly: Some(BTreeMap::from([(1u8, 5.0), (6u8, 5.2)])),
        };
        let first = estimate(&input(), &reading, &params()).unwrap();
        let second = estimate(&input(), &reading, &params()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parameter_overrides_flow_through() {
        let mut tuned = params();
        tuned.panel_efficiency = 0.15;
        let report = estimate(&input(), &fallback_reading(), &tuned).unwrap();
        assert_eq!(report.installed_capacity_kw, 1.5);
        // 0.15 × 0.95 × 0.85 = 12.1125 %
        assert_eq!(report.system_efficiency_percent, 12.11);
    }
}
