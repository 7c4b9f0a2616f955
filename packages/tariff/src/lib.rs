#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::suboptimal_flops)]

//! CRA Resolution 720 of 2015 tariff engine.
//!
//! Computes the monthly per-subscriber cleaning-service tariff of a
//! service area from its averaged operating metrics:
//!
//! 1. **Fixed costs** (CFT) per subscriber: commercial management, urban
//!    cleaning and sweeping ([`fixed`]).
//! 2. **Variable costs** (CVNA) per ton: collection and transport, final
//!    disposal and leachate treatment ([`variable`]).
//! 3. **Recycling base value** (VBA) per ton ([`recycling`]).
//! 4. **Tonnage shares** per subscriber and class ([`allocation`]).
//! 5. **Class tariffs** with subsidies and contributions ([`composer`]).
//!
//! Constants come from an embedded [`registry`] of regulation revisions.
//! The engine is pure: [`calculate`] has no side effects, and identical
//! inputs give identical output because every monetary value is rounded
//! to two decimals where it is computed.
//!
//! Arithmetic is kept in the order the resolution writes it, without fused
//! multiply-add, so results match published reference calculations.

pub mod allocation;
pub mod averaging;
pub mod composer;
pub mod fixed;
pub mod recycling;
pub mod registry;
pub mod regulation;
pub mod validation;
pub mod variable;

use thiserror::Error;
use waste_tariff_models::{
    ServiceArea, calculation::CalculationInput, result::TariffCalculationResult,
};

pub use averaging::average_period;
pub use regulation::RegulationTables;
pub use validation::{FieldError, ValidationErrors};

/// Errors from [`calculate`].
#[derive(Debug, Error)]
pub enum CalculationError {
    /// One or more inputs are out of range.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The regulation tables lack the costs of a leachate scenario.
    #[error("Regulation '{regulation}' has no costs for leachate scenario {scenario}")]
    MissingScenario {
        /// Regulation id.
        regulation: String,
        /// Scenario id.
        scenario: u8,
    },
}

/// Computes the auditable tariff of `area` for the averaged metrics in
/// `input`.
///
/// # Errors
///
/// * [`CalculationError::Validation`] if any input is out of range. Every
///   offending field is reported.
/// * [`CalculationError::MissingScenario`] if `tables` has no costs for
///   the averaged leachate scenario.
pub fn calculate(
    input: &CalculationInput,
    area: &ServiceArea,
    tables: &RegulationTables,
) -> Result<TariffCalculationResult, CalculationError> {
    if let Err(e) = validation::validate(input, area, tables) {
        log::warn!(
            "calculate: rejected input for area {} period {}: {e}",
            area.id,
            input.metrics.end_period
        );
        return Err(e.into());
    }

    let mut adjustments = Vec::new();

    let fixed = fixed::fixed_costs(input, area, tables, &mut adjustments);
    let variable = variable::variable_costs(input, area, tables, &mut adjustments)?;
    let recycling = recycling::recycling_value(&input.recycling);
    let allocation = allocation::allocate(&input.metrics, &tables.production_weights);
    let tariffs = composer::compose(
        &fixed,
        &variable,
        &recycling,
        &allocation,
        &input.subsidy_schedule,
        &mut adjustments,
    );
    let alerts = validation::alerts(input, area, tables);

    log::debug!(
        "calculate: area={} period={} cft={} cvna={} vba={} alerts={}",
        area.id,
        input.metrics.end_period,
        fixed.total,
        variable.total,
        recycling.total,
        alerts.len()
    );

    Ok(TariffCalculationResult {
        regulation: tables.reference(),
        area_id: area.id,
        period: input.metrics.end_period,
        size_class: area.size_class,
        input: input.clone(),
        fixed,
        variable,
        recycling,
        allocation,
        tariffs,
        adjustments,
        alerts,
        formulas: tables.formulas.clone(),
    })
}

/// Rounds a monetary value to two decimals.
#[must_use]
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds a tonnage ratio to six decimals.
#[must_use]
pub fn round_tons(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Raises a base-date price by the cumulative inflation `rate`.
#[must_use]
pub fn inflate(value: f64, rate: f64) -> f64 {
    value * (1.0 + rate)
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
#[must_use]
pub fn per(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
