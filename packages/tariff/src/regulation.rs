//! Constant tables of one regulation revision.
//!
//! Every unit price is expressed at the revision's base date and is
//! inflated by the caller-supplied rate when a calculation runs.

use serde::Deserialize;
use waste_tariff_models::{
    BillingChannel, PerClass, SizeClass,
    calculation::SubsidyContributionSchedule,
    operations::LeachateScenario,
    result::{FormulaReference, RegulationRef},
};

/// Complete set of constants for one regulation revision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegulationTables {
    /// Stable identifier (e.g., `"cra_720_2015"`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// `YYYY-MM` date of the unit prices.
    pub price_base: String,
    /// Commercial management (CCS).
    pub commercial: CommercialTable,
    /// Urban cleaning (CLUS).
    pub urban_cleaning: UrbanCleaningTable,
    /// Sweeping (CBLS).
    pub sweeping: SweepingTable,
    /// Collection and transport (CRT).
    pub collection: CollectionTable,
    /// Final disposal (CDF).
    pub disposal: DisposalTable,
    /// Leachate treatment (CTL).
    pub leachate: LeachateTable,
    /// Recycling base value (VBA).
    pub recycling: RecyclingTable,
    /// Production weight per subscriber class. Vacant units weigh 0.
    pub production_weights: PerClass<f64>,
    /// Default subsidy and contribution factors.
    pub subsidy_schedule: SubsidyContributionSchedule,
    /// Advisory alert thresholds.
    pub alerts: AlertThresholds,
    /// Formula catalogue in evaluation order.
    pub formulas: Vec<FormulaReference>,
}

impl RegulationTables {
    /// Identifier and name for result provenance.
    #[must_use]
    pub fn reference(&self) -> RegulationRef {
        RegulationRef {
            id: self.id.clone(),
            name: self.name.clone(),
            price_base: self.price_base.clone(),
        }
    }

    /// Catalogue entry for `component`, if listed.
    #[must_use]
    pub fn formula(&self, component: &str) -> Option<&FormulaReference> {
        self.formulas.iter().find(|f| f.component == component)
    }
}

/// CCS base cost per segment and billing channel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CommercialTable {
    pub segment_1_water: f64,
    pub segment_1_energy: f64,
    pub segment_2_water: f64,
    pub segment_2_energy: f64,
    /// Uplift applied when the area recycles.
    pub recycling_uplift: f64,
}

impl CommercialTable {
    /// Base cost for a segment and billing channel.
    #[must_use]
    pub const fn base(&self, size_class: SizeClass, channel: BillingChannel) -> f64 {
        match (size_class, channel) {
            (SizeClass::One, BillingChannel::Water) => self.segment_1_water,
            (SizeClass::One, BillingChannel::Energy) => self.segment_1_energy,
            (SizeClass::Two, BillingChannel::Water) => self.segment_2_water,
            (SizeClass::Two, BillingChannel::Energy) => self.segment_2_energy,
        }
    }
}

/// CLUS unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct UrbanCleaningTable {
    /// Lawn mowing per m2, segment 1.
    pub lawn_segment_1: f64,
    /// Lawn mowing per m2, segment 2.
    pub lawn_segment_2: f64,
    /// Surface washing per m2 before water.
    pub washing_base: f64,
    /// Multiplier on the water tariff per thousand m3.
    pub washing_water_factor: f64,
    /// Beach cleaning per km.
    pub beach_per_km: f64,
    /// Beach m2 to km conversion.
    pub beach_km_per_m2: f64,
    /// Per basket installed.
    pub basket_installation: f64,
    /// Per basket maintained.
    pub basket_maintenance: f64,
}

impl UrbanCleaningTable {
    /// Lawn price per m2 for a segment.
    #[must_use]
    pub const fn lawn_price(&self, size_class: SizeClass) -> f64 {
        match size_class {
            SizeClass::One => self.lawn_segment_1,
            SizeClass::Two => self.lawn_segment_2,
        }
    }
}

/// CBLS unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SweepingTable {
    pub cost_per_km: f64,
    /// Swept m2 to km conversion.
    pub km_per_m2: f64,
    /// Share of the price that is capital, discounted on public equipment.
    pub capital_proportion: f64,
}

/// `base + distance_factor * D + scale / T`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HaulFunction {
    pub base: f64,
    pub distance_factor: f64,
    pub scale: f64,
}

/// CRT constants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CollectionTable {
    /// Direct haul (f1).
    pub direct: HaulFunction,
    /// Haul through a transfer station (f2).
    pub via_transfer_station: HaulFunction,
    pub coastal_adjustment: f64,
    pub capital_proportion: f64,
    pub fleet_age_discount_per_year: f64,
    pub fleet_age_threshold_single_shift: f64,
    pub fleet_age_threshold_multi_shift: f64,
}

impl CollectionTable {
    /// Fleet age beyond which the per-year discount applies.
    #[must_use]
    pub const fn fleet_age_threshold(&self, daily_shifts: u8) -> f64 {
        if daily_shifts <= 1 {
            self.fleet_age_threshold_single_shift
        } else {
            self.fleet_age_threshold_multi_shift
        }
    }
}

/// `min(base + scale / q, cap)`, applied after inflation on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CappedCost {
    pub base: f64,
    pub scale: f64,
    pub cap: f64,
}

/// `coefficient * ln(base_years + extra) - offset`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExtensionFactor {
    pub coefficient: f64,
    pub offset: f64,
    pub base_years: f64,
}

impl ExtensionFactor {
    /// Factor for `extra_years` beyond the base period; 1 when not extended.
    #[must_use]
    pub fn factor(&self, extra_years: u32) -> f64 {
        if extra_years == 0 {
            return 1.0;
        }
        self.coefficient * (self.base_years + f64::from(extra_years)).ln() - self.offset
    }
}

/// CDF constants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DisposalTable {
    pub useful_life: CappedCost,
    pub post_closure: CappedCost,
    pub extension: ExtensionFactor,
    /// Monthly intake below which a landfill is small.
    pub small_landfill_threshold_tons: f64,
    pub small_landfill_surcharge: f64,
    pub capital_discount: f64,
}

/// Useful-life and post-closure costs of one treatment scenario.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScenarioCosts {
    pub scenario: LeachateScenario,
    pub useful_life: CappedCost,
    pub post_closure: CappedCost,
    pub public_discount: f64,
}

/// CTL constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeachateTable {
    /// Scenarios 1-4.
    pub scenarios: Vec<ScenarioCosts>,
    /// Flat cost per m3 for scenario 5.
    pub recirculation_cost: f64,
    pub recirculation_public_discount: f64,
    pub extension: ExtensionFactor,
}

impl LeachateTable {
    /// Costs of a treatment scenario. `None` for recirculation.
    #[must_use]
    pub fn scenario(&self, scenario: LeachateScenario) -> Option<&ScenarioCosts> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }

    /// Public-contribution discount for a scenario.
    #[must_use]
    pub fn public_discount(&self, scenario: LeachateScenario) -> f64 {
        match scenario {
            LeachateScenario::Recirculation => self.recirculation_public_discount,
            other => self.scenario(other).map_or(0.0, |s| s.public_discount),
        }
    }
}

/// VBA limits.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RecyclingTable {
    pub max_incentive_discount: f64,
}

/// Thresholds for advisory alerts.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AlertThresholds {
    /// Effective distance above which a transfer station should be considered.
    pub max_distance_km: f64,
    pub max_fleet_age_years: f64,
}
