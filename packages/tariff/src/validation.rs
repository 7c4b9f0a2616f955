//! Input validation and advisory alerts.
//!
//! Validation rejects inputs the formulas cannot price. Alerts flag valid
//! inputs that deserve a second look; they never block a calculation.
//!
//! Size class, leachate scenario and period ranges are enforced when those
//! values are constructed or deserialized, so they never reach this module
//! out of range.

use thiserror::Error;
use waste_tariff_models::{
    ServiceArea,
    calculation::CalculationInput,
    result::{AlertCode, ValidationAlert},
};

use crate::regulation::RegulationTables;

/// A rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the field in the JSON input, e.g. `"metrics.tonnage.landfilled"`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every rejected field of one input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid input: {}", join(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Paths of the rejected fields.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.reject(field, format!("must be a non-negative number, got {value}"));
        }
    }

    fn positive(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.reject(field, format!("must be greater than 0, got {value}"));
        }
    }

    fn within(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if !(min..=max).contains(&value) {
            self.reject(field, format!("must be between {min} and {max}, got {value}"));
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Checks every field of `input` and `area`.
///
/// # Errors
///
/// Returns all offending fields at once.
pub fn validate(
    input: &CalculationInput,
    area: &ServiceArea,
    tables: &RegulationTables,
) -> Result<(), ValidationErrors> {
    let mut check = Checker::default();

    check.non_negative("area.distanceToDisposalKm", area.distance_to_disposal_km);
    check.within("area.unpavedRoadPct", area.unpaved_road_pct, 0.0, 100.0);
    if let Some(km) = area.transfer_station_distance_km {
        check.non_negative("area.transferStationDistanceKm", km);
    }

    let metrics = &input.metrics;
    if metrics.area_id != area.id {
        check.reject(
            "metrics.areaId",
            format!("belongs to area {}, not area {}", metrics.area_id, area.id),
        );
    }
    if metrics.records_used == 0 {
        check.reject("metrics.recordsUsed", "must average at least one record");
    }

    let subscribers = &metrics.subscribers;
    check.non_negative("metrics.subscribers.total", subscribers.total);
    check.non_negative("metrics.subscribers.vacant", subscribers.vacant);
    check.non_negative(
        "metrics.subscribers.meteredLargeProducers",
        subscribers.metered_large_producers,
    );
    if subscribers.vacant > subscribers.total {
        check.reject("metrics.subscribers.vacant", "must not exceed total subscribers");
    }
    for (class, count) in subscribers.by_class.iter() {
        check.non_negative(&format!("metrics.subscribers.byClass.{class}"), *count);
    }

    let tonnage = &metrics.tonnage;
    check.positive("metrics.tonnage.nonRecyclable", tonnage.non_recyclable);
    check.positive("metrics.tonnage.landfilled", tonnage.landfilled);
    check.non_negative("metrics.tonnage.sweeping", tonnage.sweeping);
    check.non_negative("metrics.tonnage.urbanCleaning", tonnage.urban_cleaning);
    check.non_negative("metrics.tonnage.recyclable", tonnage.recyclable);
    check.non_negative("metrics.tonnage.rejected", tonnage.rejected);
    check.non_negative(
        "metrics.tonnage.meteredLargeProducers",
        tonnage.metered_large_producers,
    );

    let cleaning = &metrics.urban_cleaning;
    check.non_negative("metrics.urbanCleaning.treePruningCost", cleaning.tree_pruning_cost);
    check.non_negative("metrics.urbanCleaning.lawnAreaM2", cleaning.lawn_area_m2);
    check.non_negative("metrics.urbanCleaning.washedAreaM2", cleaning.washed_area_m2);
    check.non_negative("metrics.urbanCleaning.beachAreaM2", cleaning.beach_area_m2);
    check.non_negative("metrics.urbanCleaning.basketsInstalled", cleaning.baskets_installed);
    check.non_negative("metrics.urbanCleaning.basketsMaintained", cleaning.baskets_maintained);

    check.non_negative("metrics.sweeping.lengthKm", metrics.sweeping.length_km);
    check.non_negative("metrics.sweeping.areaM2", metrics.sweeping.area_m2);
    check.non_negative("metrics.leachateVolumeM3", metrics.leachate_volume_m3);
    check.non_negative("metrics.environmentalTaxRate", metrics.environmental_tax_rate);
    check.non_negative("metrics.fleetAverageAgeYears", metrics.fleet_average_age_years);
    check.non_negative("metrics.tollSpend", metrics.toll_spend);
    if metrics.fleet_daily_shifts < 1 {
        check.reject("metrics.fleetDailyShifts", "must be at least 1");
    }

    check.non_negative("inflationRate", input.inflation_rate);
    check.non_negative("waterTariffPerM3", input.water_tariff_per_m3);

    let recycling = &input.recycling;
    check.non_negative(
        "recycling.weightedCollectionCost",
        recycling.weighted_collection_cost,
    );
    check.non_negative(
        "recycling.weightedDisposalCost",
        recycling.weighted_disposal_cost,
    );
    check.within(
        "recycling.incentiveDiscount",
        recycling.incentive_discount,
        0.0,
        tables.recycling.max_incentive_discount,
    );

    for class in input.subsidy_schedule.out_of_range() {
        check.reject(
            &format!("subsidySchedule.{class}"),
            format!(
                "must be between -1 and 1, got {}",
                input.subsidy_schedule.factor(class)
            ),
        );
    }

    check.finish()
}

/// Advisory alerts for a valid input.
#[must_use]
pub fn alerts(
    input: &CalculationInput,
    area: &ServiceArea,
    tables: &RegulationTables,
) -> Vec<ValidationAlert> {
    let mut alerts = Vec::new();
    let thresholds = &tables.alerts;

    let distance = area.effective_distance();
    if distance > thresholds.max_distance_km {
        alerts.push(ValidationAlert {
            code: AlertCode::LongHaulDistance,
            message: format!(
                "Effective distance {distance} km exceeds {} km; consider a transfer station",
                thresholds.max_distance_km
            ),
            reference: "Art. 24".to_string(),
        });
    }

    let landfilled = input.metrics.tonnage.landfilled;
    if landfilled < tables.disposal.small_landfill_threshold_tons {
        alerts.push(ValidationAlert {
            code: AlertCode::SmallLandfill,
            message: format!(
                "Landfill intake {landfilled} t/month is below {} t/month; small-landfill adjustment applies",
                tables.disposal.small_landfill_threshold_tons
            ),
            reference: "Art. 28 Par. 2".to_string(),
        });
    }

    let age = input.metrics.fleet_average_age_years;
    if age > thresholds.max_fleet_age_years {
        alerts.push(ValidationAlert {
            code: AlertCode::AgedFleet,
            message: format!(
                "Fleet average age {age} years exceeds {} years; age discount applies",
                thresholds.max_fleet_age_years
            ),
            reference: "Art. 27".to_string(),
        });
    }

    alerts
}
