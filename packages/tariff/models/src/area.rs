//! Service-area (APS) parameters.
//!
//! A service area is the zone in which one operator collects
//! non-recyclable waste. Its parameters change rarely and are shared by
//! every monthly calculation for the zone.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Kilometres of paved road equivalent to one unpaved kilometre.
pub const UNPAVED_ROAD_MULTIPLIER: f64 = 1.25;

/// Identifier of a service area.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AreaId(pub u64);

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Regulatory size class (segment) of a service area.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum SizeClass {
    /// Segment 1: large municipalities.
    #[strum(serialize = "1")]
    One = 1,
    /// Segment 2: small municipalities.
    #[strum(serialize = "2")]
    Two = 2,
}

impl SizeClass {
    /// Returns the numeric segment.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a size class from its numeric segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not 1 or 2.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSizeClassError> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(InvalidSizeClassError { value }),
        }
    }
}

impl TryFrom<u8> for SizeClass {
    type Error = InvalidSizeClassError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<SizeClass> for u8 {
    fn from(value: SizeClass) -> Self {
        value.value()
    }
}

/// Error returned when a size class is neither 1 nor 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid size class {value}: expected 1 or 2")]
pub struct InvalidSizeClassError {
    /// The rejected value.
    pub value: u8,
}

/// Utility bill that carries the cleaning charge.
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
pub enum BillingChannel {
    /// Billed with the water utility.
    #[serde(alias = "acueducto")]
    #[strum(to_string = "water", serialize = "acueducto")]
    Water,
    /// Billed with the electricity utility.
    #[serde(alias = "energia")]
    #[strum(to_string = "energy", serialize = "energia")]
    Energy,
}

/// Static cost parameters of a collection zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    /// Area identifier.
    pub id: AreaId,
    /// Human-readable name (e.g., `"APS Norte"`).
    pub name: String,
    /// Regulatory segment.
    pub size_class: SizeClass,
    /// Distance from the area centroid to the disposal site, in km.
    pub distance_to_disposal_km: f64,
    /// Share of [`Self::distance_to_disposal_km`] that is unpaved (0-100).
    #[serde(default)]
    pub unpaved_road_pct: f64,
    /// Coastal municipalities get the salinity adjustment on collection.
    #[serde(default)]
    pub coastal: bool,
    /// Which utility bill carries the charge.
    pub billing_channel: BillingChannel,
    /// Whether waste passes through a transfer station.
    #[serde(default)]
    pub uses_transfer_station: bool,
    /// Distance between the transfer station and the disposal site, in km.
    #[serde(default)]
    pub transfer_station_distance_km: Option<f64>,
}

impl ServiceArea {
    /// Distance to the disposal site with unpaved kilometres weighted by
    /// [`UNPAVED_ROAD_MULTIPLIER`], rounded to two decimals.
    #[must_use]
    pub fn effective_distance(&self) -> f64 {
        let unpaved_share = self.unpaved_road_pct / 100.0;
        let paved_km = self.distance_to_disposal_km * (1.0 - unpaved_share);
        let unpaved_km = self.distance_to_disposal_km * unpaved_share;
        let effective = paved_km + unpaved_km * UNPAVED_ROAD_MULTIPLIER;
        ((effective * 100.0).round() / 100.0).max(0.0)
    }

    /// Unpaved kilometres on the route to the disposal site.
    #[must_use]
    pub fn unpaved_km(&self) -> f64 {
        self.distance_to_disposal_km * self.unpaved_road_pct / 100.0
    }

    /// Whether the transfer-station formula may be considered.
    #[must_use]
    pub fn transfer_station_eligible(&self) -> bool {
        self.uses_transfer_station && self.transfer_station_distance_km.is_some_and(|d| d > 0.0)
    }
}
