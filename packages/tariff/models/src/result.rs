//! Typed, auditable output of a tariff calculation.
//!
//! All monetary values are rounded to two decimals and tonnage ratios to
//! six at the point they are computed.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::calculation::CalculationInput;
use crate::operations::LeachateScenario;
use crate::{AreaId, PerClass, PeriodKey, SizeClass, SubscriberClass};

/// Urban-cleaning (CLUS) per-subscriber components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrbanCleaningBreakdown {
    /// Tree pruning.
    pub tree_pruning: f64,
    /// Lawn mowing.
    pub lawn_mowing: f64,
    /// Washing of public surfaces.
    pub surface_washing: f64,
    /// Beach cleaning.
    pub beach_cleaning: f64,
    /// Litter basket installation and maintenance.
    pub baskets: f64,
    /// CLUS.
    pub total: f64,
}

/// Fixed cost per subscriber (CFT) and its components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostBreakdown {
    /// Commercial management cost (CCS).
    pub commercial: f64,
    /// Urban cleaning (CLUS).
    pub urban_cleaning: UrbanCleaningBreakdown,
    /// Sweeping and cleaning (CBLS).
    pub sweeping: f64,
    /// Kilometres priced by CBLS, swept areas included.
    pub swept_km: f64,
    /// CFT.
    pub total: f64,
}

/// Collection cost formula that produced CRT.
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
pub enum CollectionFormula {
    /// Direct haul to the disposal site (f1).
    Direct,
    /// Haul through a transfer station (f2).
    ViaTransferStation,
}

/// Collection and transport cost (CRT) per ton.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTransportBreakdown {
    /// Effective distance fed into the formulas, km.
    pub effective_distance_km: f64,
    /// Direct-haul formula value.
    pub direct: f64,
    /// Transfer-station formula value, when the area is eligible.
    pub via_transfer_station: Option<f64>,
    /// Formula selected.
    pub formula: CollectionFormula,
    /// Fleet-age discount applied, as a fraction.
    pub fleet_age_discount: f64,
    /// Cost after the coastal, fleet and public adjustments.
    pub adjusted: f64,
    /// Tolls per ton, added after adjustments.
    pub tolls_per_ton: f64,
    /// CRT.
    pub total: f64,
}

/// Final disposal cost (CDF) per ton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalBreakdown {
    /// Useful-life component.
    pub useful_life: f64,
    /// Post-closure component, after any extension factor.
    pub post_closure: f64,
    /// Post-closure extension factor applied (1 when not extended).
    pub extension_factor: f64,
    /// Small-landfill surcharge.
    pub small_landfill_adjustment: f64,
    /// CDF.
    pub total: f64,
}

/// Leachate treatment cost (CTL) per ton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeachateBreakdown {
    /// Treatment scenario.
    pub scenario: LeachateScenario,
    /// Useful-life cost per m3 (scenario 5: recirculation cost).
    pub useful_life: f64,
    /// Post-closure cost per m3 after any extension factor (0 for
    /// scenario 5).
    pub post_closure: f64,
    /// Post-closure extension factor of the leachate curve (1 when not
    /// extended or for scenario 5).
    pub extension_factor: f64,
    /// Management cost per m3 (CTLM).
    pub management_cost: f64,
    /// Environmental tax for the treated volume (CMTLX).
    pub environmental_tax: f64,
    /// CTL.
    pub total: f64,
}

/// Variable cost per ton (CVNA) and its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCostBreakdown {
    /// CRT.
    pub collection_transport: CollectionTransportBreakdown,
    /// CDF.
    pub disposal: DisposalBreakdown,
    /// CTL.
    pub leachate: LeachateBreakdown,
    /// CVNA.
    pub total: f64,
}

/// Recycling base value (VBA) per ton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecyclingValueBreakdown {
    /// Municipal weighted collection cost.
    pub weighted_collection_cost: f64,
    /// Municipal weighted disposal cost.
    pub weighted_disposal_cost: f64,
    /// Incentive discount applied.
    pub incentive_discount: f64,
    /// VBA.
    pub total: f64,
}

/// Tons per subscriber assigned to each tariff term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TonnageAllocation {
    /// Sweeping tons per subscriber (TRBL).
    pub sweeping: f64,
    /// Urban-cleaning tons per subscriber (TRLU).
    pub urban_cleaning: f64,
    /// Recycling rejects per occupied subscriber (TRRA).
    pub rejected: f64,
    /// Recyclable tons per billable subscriber (TRA).
    pub recyclable: f64,
    /// Non-recyclable tons available for class allocation.
    pub available_non_recyclable: f64,
    /// Weighted subscriber count, `sum(count * weight)`.
    pub weighted_subscribers: f64,
    /// Non-recyclable tons per subscriber, per class (TRNA).
    pub non_recyclable: PerClass<f64>,
}

/// Tariff of one subscriber class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTariff {
    /// Tariff before subsidy or contribution.
    pub base: f64,
    /// Subsidy (negative) or contribution (positive) factor.
    pub factor: f64,
    /// Tariff billed.
    pub final_tariff: f64,
}

/// A regulatory adjustment that changed the computed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AppliedAdjustment {
    /// CCS raised for areas with recycling.
    RecyclingUplift { factor: f64 },
    /// Unpaved kilometres weighted in the effective distance.
    UnpavedRoads { unpaved_km: f64, multiplier: f64 },
    /// Transfer-station formula chosen over direct haul.
    TransferStation { saving_per_ton: f64 },
    /// Coastal salinity adjustment on CRT.
    Coastal { factor: f64 },
    /// CRT discount for an aged fleet.
    FleetAge { years_over_threshold: f64, discount: f64 },
    /// Sweeping equipment contributed by the public sector.
    PublicSweepingEquipment { discount: f64 },
    /// Collection vehicles contributed by the public sector.
    PublicCollectionFleet { discount: f64 },
    /// Landfill contributed by the public sector.
    PublicDisposalSite { discount: f64 },
    /// Leachate plant contributed by the public sector.
    PublicLeachatePlant { discount: f64 },
    /// Surcharge for landfills under the intake threshold.
    SmallLandfill { surcharge: f64 },
    /// Landfill post-closure extended beyond the base period (CDF).
    PostClosureExtension { extra_years: u32, factor: f64 },
    /// Leachate post-closure extended beyond the base period (CTL).
    LeachatePostClosureExtension { extra_years: u32, factor: f64 },
    /// Subsidy or contribution on a class tariff.
    SubsidyContribution { class: SubscriberClass, factor: f64 },
}

/// Advisory alert raised on a successful calculation.
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
pub enum AlertCode {
    /// Haul distance long enough to consider a transfer station.
    LongHaulDistance,
    /// Landfill intake under the small-landfill threshold.
    SmallLandfill,
    /// Collection fleet older than the discount threshold.
    AgedFleet,
}

/// An advisory alert with its regulatory reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationAlert {
    /// Alert kind.
    pub code: AlertCode,
    /// Human-readable description.
    pub message: String,
    /// Article of the resolution.
    pub reference: String,
}

/// A formula used in the calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaReference {
    /// Component symbol, e.g. `"CRT"`.
    pub component: String,
    /// The formula as written in the resolution.
    pub formula: String,
    /// Articles and annexes defining it.
    pub reference: String,
}

/// Regulation revision a result was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationRef {
    /// Stable identifier, e.g. `"cra_720_2015"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// `YYYY-MM` date of the unit prices.
    pub price_base: String,
}

/// Complete auditable tariff for one area and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffCalculationResult {
    /// Regulation revision applied.
    pub regulation: RegulationRef,
    /// Area calculated.
    pub area_id: AreaId,
    /// Last month of the averaging window.
    pub period: PeriodKey,
    /// Size class of the area.
    pub size_class: SizeClass,
    /// Snapshot of the input.
    pub input: CalculationInput,
    /// CFT and components.
    pub fixed: FixedCostBreakdown,
    /// CVNA and components.
    pub variable: VariableCostBreakdown,
    /// VBA.
    pub recycling: RecyclingValueBreakdown,
    /// Tonnage shares.
    pub allocation: TonnageAllocation,
    /// Per-class base and final tariffs.
    pub tariffs: PerClass<ClassTariff>,
    /// Adjustments that changed the computed values.
    pub adjustments: Vec<AppliedAdjustment>,
    /// Advisory alerts.
    pub alerts: Vec<ValidationAlert>,
    /// Formulas used, in evaluation order.
    pub formulas: Vec<FormulaReference>,
}

impl TariffCalculationResult {
    /// Whether an alert with `code` was raised.
    #[must_use]
    pub fn has_alert(&self, code: AlertCode) -> bool {
        self.alerts.iter().any(|a| a.code == code)
    }
}
