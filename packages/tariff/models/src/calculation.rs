//! Inputs of a single tariff calculation.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::operations::{AveragedMetrics, LeachateScenario};
use crate::{PerClass, SubscriberClass};

/// Signed subsidy (negative) or contribution (positive) factor per class.
///
/// Each factor must lie in `[-1, 1]`; it multiplies the class base tariff
/// as `base * (1 + factor)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsidyContributionSchedule(pub PerClass<f64>);

impl SubsidyContributionSchedule {
    /// A schedule with no subsidies or contributions.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Factor for `class`.
    #[must_use]
    pub const fn factor(&self, class: SubscriberClass) -> f64 {
        *self.0.get(class)
    }

    /// Classes whose factor lies outside `[-1, 1]` (or is not finite).
    #[must_use]
    pub fn out_of_range(&self) -> Vec<SubscriberClass> {
        self.0
            .iter()
            .filter(|(_, f)| !(-1.0..=1.0).contains(*f))
            .map(|(class, _)| class)
            .collect()
    }
}

/// Cost components for which the public sector contributed equipment or
/// infrastructure, triggering the capital-cost discounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicContribution {
    /// Sweeping equipment (CBLS).
    #[serde(default)]
    pub sweeping: bool,
    /// Collection vehicles (CRT).
    #[serde(default)]
    pub collection: bool,
    /// Landfill infrastructure (CDF).
    #[serde(default)]
    pub disposal: bool,
    /// Leachate treatment plant (CTL).
    #[serde(default)]
    pub leachate: bool,
}

/// Municipality-level figures feeding the recycling base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecyclingInputs {
    /// Weighted average collection-and-transport cost of the municipality.
    pub weighted_collection_cost: f64,
    /// Weighted average final-disposal cost of the municipality.
    pub weighted_disposal_cost: f64,
    /// Incentive discount (DINC), in `[0, 0.04]`.
    #[serde(default)]
    pub incentive_discount: f64,
}

/// Everything a tariff calculation needs besides the area and the
/// regulation tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationInput {
    /// Six-month averaged operating metrics.
    pub metrics: AveragedMetrics,
    /// Cumulative inflation since the base-price date, as a fraction.
    #[serde(default)]
    pub inflation_rate: f64,
    /// Water tariff per m3 used to price surface washing.
    #[serde(default)]
    pub water_tariff_per_m3: f64,
    /// Public equipment contributions.
    #[serde(default)]
    pub public_contribution: PublicContribution,
    /// Years of landfill post-closure beyond the base period.
    #[serde(default)]
    pub extended_post_closure_years: u32,
    /// Recycling base-value inputs.
    pub recycling: RecyclingInputs,
    /// Subsidy and contribution factors.
    #[serde(default)]
    pub subsidy_schedule: SubsidyContributionSchedule,
}

/// Kind of a stored calculation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalculationKind {
    /// The monthly tariff of record. Unique per area and period.
    Official,
    /// A what-if run. Unconstrained.
    Simulation,
    /// A calculation made to check the engine or the data. Unconstrained.
    Test,
}

/// Replacements applied to averaged metrics before a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOverrides {
    /// Replaces the mean non-recyclable tons collected.
    pub non_recyclable_tons: Option<f64>,
    /// Replaces the mean tons received at the landfill.
    pub landfilled_tons: Option<f64>,
    /// Replaces the mean recyclable tons.
    pub recyclable_tons: Option<f64>,
    /// Replaces the mean leachate volume.
    pub leachate_volume_m3: Option<f64>,
    /// Replaces the leachate scenario.
    pub leachate_scenario: Option<LeachateScenario>,
    /// Replaces the mean fleet age.
    pub fleet_average_age_years: Option<f64>,
    /// Replaces the shift count.
    pub fleet_daily_shifts: Option<u8>,
    /// Replaces the mean monthly toll spend.
    pub toll_spend: Option<f64>,
}

impl MetricOverrides {
    /// Writes every set override into `metrics`.
    pub fn apply(&self, metrics: &mut AveragedMetrics) {
        if let Some(v) = self.non_recyclable_tons {
            metrics.tonnage.non_recyclable = v;
        }
        if let Some(v) = self.landfilled_tons {
            metrics.tonnage.landfilled = v;
        }
        if let Some(v) = self.recyclable_tons {
            metrics.tonnage.recyclable = v;
        }
        if let Some(v) = self.leachate_volume_m3 {
            metrics.leachate_volume_m3 = v;
        }
        if let Some(v) = self.leachate_scenario {
            metrics.leachate_scenario = v;
        }
        if let Some(v) = self.fleet_average_age_years {
            metrics.fleet_average_age_years = v;
        }
        if let Some(v) = self.fleet_daily_shifts {
            metrics.fleet_daily_shifts = v;
        }
        if let Some(v) = self.toll_spend {
            metrics.toll_spend = v;
        }
    }

    /// Whether no override is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
