#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Storage seams of the waste tariff engine.
//!
//! The service layer reads operating records and service areas, and
//! persists calculation results, only through the traits defined here.
//! [`memory::InMemoryStore`] implements all three for tests and embedded
//! use.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use waste_tariff_models::{
    AreaId, PeriodKey, ServiceArea,
    calculation::CalculationKind,
    operations::{OperatingPeriodRecord, RecordLockedError},
    result::TariffCalculationResult,
};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An official calculation already exists for the area and period.
    #[error(
        "Official calculation for area {area_id} period {period} already exists: {existing}"
    )]
    OfficialExists {
        /// Area of the existing calculation.
        area_id: AreaId,
        /// Period of the existing calculation.
        period: PeriodKey,
        /// ID of the existing calculation.
        existing: Uuid,
    },

    /// No operating record exists for the area and period.
    #[error("Operating record for area {area_id} period {period} not found")]
    RecordNotFound {
        /// Requested area.
        area_id: AreaId,
        /// Requested period.
        period: PeriodKey,
    },

    /// The operating record is verified and cannot be replaced.
    #[error(transparent)]
    RecordLocked(#[from] RecordLockedError),
}

/// A persisted calculation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCalculation {
    /// Unique ID.
    pub id: Uuid,
    /// Area calculated.
    pub area_id: AreaId,
    /// Period calculated.
    pub period: PeriodKey,
    /// Official, simulation or test.
    pub kind: CalculationKind,
    /// Simulation name.
    pub name: Option<String>,
    /// Calculation a simulation is compared against.
    pub compared_with: Option<Uuid>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the calculation ran.
    pub calculated_at: DateTime<Utc>,
    /// The result.
    pub result: TariffCalculationResult,
}

impl StoredCalculation {
    /// Wraps `result` with a fresh ID and the current time.
    #[must_use]
    pub fn new(kind: CalculationKind, result: TariffCalculationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            area_id: result.area_id,
            period: result.period,
            kind,
            name: None,
            compared_with: None,
            notes: None,
            calculated_at: Utc::now(),
            result,
        }
    }

    /// Sets the simulation name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the calculation this one is compared against.
    #[must_use]
    pub const fn with_compared_with(mut self, id: Option<Uuid>) -> Self {
        self.compared_with = id;
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Source of monthly operating records.
#[async_trait::async_trait]
pub trait OperatingRecordLookup: Send + Sync {
    /// Records of `area_id` for any of `periods`. Missing months are
    /// simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    async fn records_for(
        &self,
        area_id: AreaId,
        periods: &[PeriodKey],
    ) -> Result<Vec<OperatingPeriodRecord>, StoreError>;
}

/// Source of service-area parameters.
#[async_trait::async_trait]
pub trait ServiceAreaLookup: Send + Sync {
    /// The area with `id`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    async fn area(&self, id: AreaId) -> Result<Option<ServiceArea>, StoreError>;
}

/// Persistence of calculation results.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Stores an official calculation unless one already exists for its
    /// area and period. The check and the insert are atomic.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OfficialExists`] with the existing ID on
    /// conflict.
    async fn insert_official_if_absent(
        &self,
        calculation: StoredCalculation,
    ) -> Result<Uuid, StoreError>;

    /// Stores a calculation. Official calculations go through
    /// [`Self::insert_official_if_absent`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the calculation cannot be stored.
    async fn insert(&self, calculation: StoredCalculation) -> Result<Uuid, StoreError>;

    /// The calculation with `id`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    async fn by_id(&self, id: Uuid) -> Result<Option<StoredCalculation>, StoreError>;

    /// The official calculation of an area and period, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    async fn official_for(
        &self,
        area_id: AreaId,
        period: PeriodKey,
    ) -> Result<Option<StoredCalculation>, StoreError>;

    /// All calculations of an area, newest period first and newest
    /// calculation first within a period.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store fails.
    async fn history(&self, area_id: AreaId) -> Result<Vec<StoredCalculation>, StoreError>;
}
