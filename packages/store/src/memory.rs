//! In-memory implementation of every store trait.
//!
//! Official uniqueness is enforced by checking and inserting under one
//! write lock, so concurrent official creations for the same area and
//! period cannot both succeed.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use uuid::Uuid;
use waste_tariff_models::{
    AreaId, PeriodKey, ServiceArea, calculation::CalculationKind,
    operations::OperatingPeriodRecord,
};

use crate::{
    OperatingRecordLookup, ResultStore, ServiceAreaLookup, StoreError, StoredCalculation,
};

#[derive(Debug, Default)]
struct Calculations {
    by_id: BTreeMap<Uuid, StoredCalculation>,
    officials: BTreeMap<(AreaId, PeriodKey), Uuid>,
}

impl Calculations {
    fn insert_official(&mut self, calculation: StoredCalculation) -> Result<Uuid, StoreError> {
        let key = (calculation.area_id, calculation.period);
        if let Some(existing) = self.officials.get(&key) {
            return Err(StoreError::OfficialExists {
                area_id: calculation.area_id,
                period: calculation.period,
                existing: *existing,
            });
        }
        let id = calculation.id;
        self.officials.insert(key, id);
        self.by_id.insert(id, calculation);
        Ok(id)
    }
}

/// Thread-safe in-memory store of areas, operating records and results.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    areas: RwLock<BTreeMap<AreaId, ServiceArea>>,
    records: RwLock<BTreeMap<(AreaId, PeriodKey), OperatingPeriodRecord>>,
    calculations: RwLock<Calculations>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a service area.
    pub async fn put_area(&self, area: ServiceArea) {
        self.areas.write().await.insert(area.id, area);
    }

    /// Adds an operating record, or amends the unverified record already
    /// stored for the same area and period.
    ///
    /// # Errors
    ///
    /// * [`StoreError::RecordLocked`] if the stored record is verified.
    pub async fn upsert_record(&self, record: OperatingPeriodRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let key = (record.area_id, record.period);
        if let Some(existing) = records.get_mut(&key) {
            existing.amend(|r| *r = record)?;
            log::debug!("upsert_record: amended area={} period={}", key.0, key.1);
        } else {
            records.insert(key, record);
        }
        Ok(())
    }

    /// Marks a stored operating record verified.
    ///
    /// # Errors
    ///
    /// * [`StoreError::RecordNotFound`] if no record exists for the key.
    pub async fn verify_record(
        &self,
        area_id: AreaId,
        period: PeriodKey,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(area_id, period))
            .ok_or(StoreError::RecordNotFound { area_id, period })?;
        record.mark_verified();
        Ok(())
    }

    /// The stored record of an area and period.
    pub async fn record(
        &self,
        area_id: AreaId,
        period: PeriodKey,
    ) -> Option<OperatingPeriodRecord> {
        self.records.read().await.get(&(area_id, period)).cloned()
    }
}

#[async_trait::async_trait]
impl OperatingRecordLookup for InMemoryStore {
    async fn records_for(
        &self,
        area_id: AreaId,
        periods: &[PeriodKey],
    ) -> Result<Vec<OperatingPeriodRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(periods
            .iter()
            .filter_map(|period| records.get(&(area_id, *period)).cloned())
            .collect())
    }
}

#[async_trait::async_trait]
impl ServiceAreaLookup for InMemoryStore {
    async fn area(&self, id: AreaId) -> Result<Option<ServiceArea>, StoreError> {
        Ok(self.areas.read().await.get(&id).cloned())
    }
}

#[async_trait::async_trait]
impl ResultStore for InMemoryStore {
    async fn insert_official_if_absent(
        &self,
        calculation: StoredCalculation,
    ) -> Result<Uuid, StoreError> {
        self.calculations.write().await.insert_official(calculation)
    }

    async fn insert(&self, calculation: StoredCalculation) -> Result<Uuid, StoreError> {
        let mut calculations = self.calculations.write().await;
        if calculation.kind == CalculationKind::Official {
            return calculations.insert_official(calculation);
        }
        let id = calculation.id;
        calculations.by_id.insert(id, calculation);
        Ok(id)
    }

    async fn by_id(&self, id: Uuid) -> Result<Option<StoredCalculation>, StoreError> {
        Ok(self.calculations.read().await.by_id.get(&id).cloned())
    }

    async fn official_for(
        &self,
        area_id: AreaId,
        period: PeriodKey,
    ) -> Result<Option<StoredCalculation>, StoreError> {
        let calculations = self.calculations.read().await;
        Ok(calculations
            .officials
            .get(&(area_id, period))
            .and_then(|id| calculations.by_id.get(id))
            .cloned())
    }

    async fn history(&self, area_id: AreaId) -> Result<Vec<StoredCalculation>, StoreError> {
        let calculations = self.calculations.read().await;
        let mut history: Vec<StoredCalculation> = calculations
            .by_id
            .values()
            .filter(|c| c.area_id == area_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            b.period
                .cmp(&a.period)
                .then_with(|| b.calculated_at.cmp(&a.calculated_at))
        });
        Ok(history)
    }
}
