#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Domain types for the CRA 720 waste-collection tariff engine.
//!
//! This crate defines the service-area parameters, monthly operating
//! records, averaged metrics, calculation inputs, and the typed result
//! breakdowns shared by the engine (`waste_tariff`), the store, and the
//! service layer. It carries invariants but no tariff formulas.

pub mod area;
pub mod calculation;
pub mod operations;
pub mod period;
pub mod result;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use area::{AreaId, BillingChannel, ServiceArea, SizeClass};
pub use period::{PeriodKey, PeriodParseError};

/// A subscriber class (stratum) that receives its own tariff.
///
/// Residential subscribers fall into six socioeconomic strata; small
/// non-residential producers form the commercial class.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriberClass {
    /// Residential stratum 1 (lowest income)
    #[serde(rename = "stratum_1")]
    #[strum(serialize = "stratum_1")]
    Stratum1,
    /// Residential stratum 2
    #[serde(rename = "stratum_2")]
    #[strum(serialize = "stratum_2")]
    Stratum2,
    /// Residential stratum 3
    #[serde(rename = "stratum_3")]
    #[strum(serialize = "stratum_3")]
    Stratum3,
    /// Residential stratum 4
    #[serde(rename = "stratum_4")]
    #[strum(serialize = "stratum_4")]
    Stratum4,
    /// Residential stratum 5
    #[serde(rename = "stratum_5")]
    #[strum(serialize = "stratum_5")]
    Stratum5,
    /// Residential stratum 6 (highest income)
    #[serde(rename = "stratum_6")]
    #[strum(serialize = "stratum_6")]
    Stratum6,
    /// Small non-residential producers
    Commercial,
}

impl SubscriberClass {
    /// Returns all variants of this enum, in tariff-table order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Stratum1,
            Self::Stratum2,
            Self::Stratum3,
            Self::Stratum4,
            Self::Stratum5,
            Self::Stratum6,
            Self::Commercial,
        ]
    }
}

/// One value per [`SubscriberClass`].
///
/// The fixed shape keeps every per-class figure (counts, weights, tonnage
/// shares, tariffs) statically addressable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerClass<T> {
    /// Residential stratum 1.
    pub stratum_1: T,
    /// Residential stratum 2.
    pub stratum_2: T,
    /// Residential stratum 3.
    pub stratum_3: T,
    /// Residential stratum 4.
    pub stratum_4: T,
    /// Residential stratum 5.
    pub stratum_5: T,
    /// Residential stratum 6.
    pub stratum_6: T,
    /// Small non-residential producers.
    pub commercial: T,
}

impl<T> PerClass<T> {
    /// Builds a record by evaluating `f` once per class.
    pub fn from_fn(mut f: impl FnMut(SubscriberClass) -> T) -> Self {
        Self {
            stratum_1: f(SubscriberClass::Stratum1),
            stratum_2: f(SubscriberClass::Stratum2),
            stratum_3: f(SubscriberClass::Stratum3),
            stratum_4: f(SubscriberClass::Stratum4),
            stratum_5: f(SubscriberClass::Stratum5),
            stratum_6: f(SubscriberClass::Stratum6),
            commercial: f(SubscriberClass::Commercial),
        }
    }

    /// Returns the value for `class`.
    #[must_use]
    pub const fn get(&self, class: SubscriberClass) -> &T {
        match class {
            SubscriberClass::Stratum1 => &self.stratum_1,
            SubscriberClass::Stratum2 => &self.stratum_2,
            SubscriberClass::Stratum3 => &self.stratum_3,
            SubscriberClass::Stratum4 => &self.stratum_4,
            SubscriberClass::Stratum5 => &self.stratum_5,
            SubscriberClass::Stratum6 => &self.stratum_6,
            SubscriberClass::Commercial => &self.commercial,
        }
    }

    /// Returns a mutable reference to the value for `class`.
    pub const fn get_mut(&mut self, class: SubscriberClass) -> &mut T {
        match class {
            SubscriberClass::Stratum1 => &mut self.stratum_1,
            SubscriberClass::Stratum2 => &mut self.stratum_2,
            SubscriberClass::Stratum3 => &mut self.stratum_3,
            SubscriberClass::Stratum4 => &mut self.stratum_4,
            SubscriberClass::Stratum5 => &mut self.stratum_5,
            SubscriberClass::Stratum6 => &mut self.stratum_6,
            SubscriberClass::Commercial => &mut self.commercial,
        }
    }

    /// Iterates `(class, value)` pairs in tariff-table order.
    pub fn iter(&self) -> impl Iterator<Item = (SubscriberClass, &T)> {
        SubscriberClass::all()
            .iter()
            .map(move |&class| (class, self.get(class)))
    }

    /// Applies `f` to every value.
    pub fn map<U>(&self, mut f: impl FnMut(SubscriberClass, &T) -> U) -> PerClass<U> {
        PerClass::from_fn(|class| f(class, self.get(class)))
    }
}
