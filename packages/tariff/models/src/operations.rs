//! Monthly operating records and their six-month averages.

use serde::{Deserialize, Serialize};

use crate::{AreaId, PerClass, PeriodKey};

/// Leachate treatment scenario from Annex II of the resolution.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum LeachateScenario {
    /// Suspended solids and organic matter removal.
    SolidsOrganic = 1,
    /// Scenario 1 plus nitrogen removal.
    #[default]
    SolidsOrganicNitrogen = 2,
    /// Scenario 1 plus inorganic salts and colour removal.
    SolidsOrganicSalts = 3,
    /// Scenario 2 plus inorganic salts and colour removal.
    FullTreatment = 4,
    /// Recirculation only.
    Recirculation = 5,
}

impl LeachateScenario {
    /// Returns the numeric scenario id.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a scenario from its numeric id.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidScenarioError> {
        match value {
            1 => Ok(Self::SolidsOrganic),
            2 => Ok(Self::SolidsOrganicNitrogen),
            3 => Ok(Self::SolidsOrganicSalts),
            4 => Ok(Self::FullTreatment),
            5 => Ok(Self::Recirculation),
            _ => Err(InvalidScenarioError { value }),
        }
    }
}

impl TryFrom<u8> for LeachateScenario {
    type Error = InvalidScenarioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<LeachateScenario> for u8 {
    fn from(value: LeachateScenario) -> Self {
        value.value()
    }
}

/// Error returned when a leachate scenario id is outside 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid leachate scenario {value}: expected 1-5")]
pub struct InvalidScenarioError {
    /// The rejected value.
    pub value: u8,
}

/// Subscriber counts for one month (`u32`) or averaged (`f64`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberCounts<T> {
    /// All subscribers in the area (N).
    pub total: T,
    /// Vacant units (ND).
    pub vacant: T,
    /// Large producers billed on measured tonnage (NA).
    #[serde(default)]
    pub metered_large_producers: T,
    /// Occupied subscribers per tariff class.
    pub by_class: PerClass<T>,
}

/// Tonnage by waste category, tons per month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tonnage {
    /// Non-recyclable waste collected (QNA).
    pub non_recyclable: f64,
    /// Sweeping and cleaning waste (QBL).
    #[serde(default)]
    pub sweeping: f64,
    /// Urban-cleaning waste (QLU).
    #[serde(default)]
    pub urban_cleaning: f64,
    /// Recovered recyclable material (QA).
    #[serde(default)]
    pub recyclable: f64,
    /// Rejects from the recycling stream (QR).
    #[serde(default)]
    pub rejected: f64,
    /// Tons received at the landfill (QRS).
    pub landfilled: f64,
    /// Measured tons of metered large producers (TAFNA).
    #[serde(default)]
    pub metered_large_producers: f64,
}

/// Urban-cleaning activity volumes.
///
/// `C` is the basket count type: `u32` on monthly records, `f64` once
/// averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrbanCleaningActivity<C> {
    /// Tree-pruning spend for the month.
    #[serde(default)]
    pub tree_pruning_cost: f64,
    /// Lawn area cut (m2).
    #[serde(default)]
    pub lawn_area_m2: f64,
    /// Public surfaces washed (m2).
    #[serde(default)]
    pub washed_area_m2: f64,
    /// Beach area cleaned (m2).
    #[serde(default)]
    pub beach_area_m2: f64,
    /// Litter baskets installed.
    #[serde(default)]
    pub baskets_installed: C,
    /// Litter baskets maintained.
    #[serde(default)]
    pub baskets_maintained: C,
}

/// Street sweeping volumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sweeping {
    /// Kilometres of kerb swept (LBL).
    #[serde(default)]
    pub length_km: f64,
    /// Open areas swept (m2), converted to km by the sweeping calculator.
    #[serde(default)]
    pub area_m2: f64,
}

/// One calendar month of operating metrics for a service area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingPeriodRecord {
    /// Area the metrics belong to.
    pub area_id: AreaId,
    /// Month covered.
    pub period: PeriodKey,
    /// Subscriber counts.
    pub subscribers: SubscriberCounts<u32>,
    /// Tonnage by category.
    pub tonnage: Tonnage,
    /// Urban-cleaning activity volumes.
    #[serde(default)]
    pub urban_cleaning: UrbanCleaningActivity<u32>,
    /// Sweeping volumes.
    #[serde(default)]
    pub sweeping: Sweeping,
    /// Leachate treated (m3).
    #[serde(default)]
    pub leachate_volume_m3: f64,
    /// Leachate treatment scenario.
    #[serde(default)]
    pub leachate_scenario: LeachateScenario,
    /// Environmental discharge tax per m3 of leachate (CMTLX).
    #[serde(default)]
    pub environmental_tax_rate: f64,
    /// Average collection fleet age in years.
    #[serde(default)]
    pub fleet_average_age_years: f64,
    /// Daily collection shifts.
    #[serde(default = "default_shifts")]
    pub fleet_daily_shifts: u8,
    /// Toll spend of the collection fleet for the month.
    #[serde(default)]
    pub toll_spend: f64,
    /// Set once an auditor has verified the record.
    #[serde(default)]
    pub verified: bool,
}

const fn default_shifts() -> u8 {
    1
}

/// Error returned when amending a verified record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operating record for area {area_id} period {period} is verified and cannot be amended")]
pub struct RecordLockedError {
    /// Area of the locked record.
    pub area_id: AreaId,
    /// Period of the locked record.
    pub period: PeriodKey,
}

impl OperatingPeriodRecord {
    /// Applies `change` to an unverified record.
    ///
    /// The area and period are restored after `change` runs, so an
    /// amendment never moves a record to another key.
    ///
    /// # Errors
    ///
    /// Returns [`RecordLockedError`] if the record has been verified.
    pub fn amend(&mut self, change: impl FnOnce(&mut Self)) -> Result<(), RecordLockedError> {
        if self.verified {
            return Err(RecordLockedError {
                area_id: self.area_id,
                period: self.period,
            });
        }
        let (area_id, period) = (self.area_id, self.period);
        change(self);
        self.area_id = area_id;
        self.period = period;
        self.verified = false;
        Ok(())
    }

    /// Marks the record verified. Verification is permanent.
    pub const fn mark_verified(&mut self) {
        self.verified = true;
    }
}

/// Mean of up to six trailing operating records.
///
/// Additive fields are arithmetic means over [`Self::records_used`];
/// the leachate scenario and shift count are carried over from the most
/// recent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragedMetrics {
    /// Area the records belong to.
    pub area_id: AreaId,
    /// Last month of the averaging window.
    pub end_period: PeriodKey,
    /// Number of records averaged (1-6).
    pub records_used: usize,
    /// Periods that contributed, most recent first.
    pub periods: Vec<PeriodKey>,
    /// Mean subscriber counts.
    pub subscribers: SubscriberCounts<f64>,
    /// Mean tonnage.
    pub tonnage: Tonnage,
    /// Mean urban-cleaning volumes.
    pub urban_cleaning: UrbanCleaningActivity<f64>,
    /// Mean sweeping volumes.
    pub sweeping: Sweeping,
    /// Mean leachate volume (m3).
    pub leachate_volume_m3: f64,
    /// Scenario of the most recent record.
    pub leachate_scenario: LeachateScenario,
    /// Mean environmental tax rate per m3.
    pub environmental_tax_rate: f64,
    /// Mean fleet age in years.
    pub fleet_average_age_years: f64,
    /// Shift count of the most recent record.
    pub fleet_daily_shifts: u8,
    /// Mean monthly toll spend.
    pub toll_spend: f64,
}

impl AveragedMetrics {
    /// Occupied subscribers (N - ND).
    #[must_use]
    pub fn occupied_subscribers(&self) -> f64 {
        self.subscribers.total - self.subscribers.vacant
    }

    /// Whether the area recovered any recyclable material.
    #[must_use]
    pub fn has_recycling(&self) -> bool {
        self.tonnage.recyclable > 0.0
    }
}
