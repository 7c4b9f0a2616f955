#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Official and simulated tariff calculations.
//!
//! [`TariffService`] ties the pure engine to the store: it averages the
//! trailing operating records of an area, runs the calculation, and
//! persists the result. At most one official calculation exists per area
//! and period; simulations and test runs are unconstrained.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use waste_tariff::{
    CalculationError, FieldError, RegulationTables, ValidationErrors,
    averaging::{AVERAGING_WINDOW, average_period},
};
use waste_tariff_models::{
    AreaId, PeriodKey, ServiceArea,
    calculation::{
        CalculationInput, CalculationKind, MetricOverrides, PublicContribution, RecyclingInputs,
        SubsidyContributionSchedule,
    },
    operations::AveragedMetrics,
};
use waste_tariff_store::{
    OperatingRecordLookup, ResultStore, ServiceAreaLookup, StoreError, StoredCalculation,
};

/// Errors from [`TariffService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service area does not exist.
    #[error("Service area {0} not found")]
    AreaNotFound(AreaId),

    /// No operating record falls inside the averaging window.
    #[error("No operating records for area {area_id} in the six months ending {period}")]
    InsufficientData {
        /// Requested area.
        area_id: AreaId,
        /// Last month of the window.
        period: PeriodKey,
    },

    /// The calculation does not exist.
    #[error("Calculation {0} not found")]
    CalculationNotFound(Uuid),

    /// An official calculation already exists for the area and period.
    #[error("Official tariff for area {area_id} period {period} already exists: {existing}")]
    Conflict {
        /// Requested area.
        area_id: AreaId,
        /// Requested period.
        period: PeriodKey,
        /// ID of the existing official calculation.
        existing: Uuid,
    },

    /// The engine rejected the input.
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::OfficialExists {
                area_id,
                period,
                existing,
            } => Self::Conflict {
                area_id,
                period,
                existing,
            },
            other => Self::Store(other),
        }
    }
}

/// Per-calculation knobs supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    /// Cumulative inflation since the base-price date.
    #[serde(default)]
    pub inflation_rate: f64,
    /// Water tariff per m3 for surface washing.
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
    /// Subsidy schedule. The regulation default when absent.
    #[serde(default)]
    pub subsidy_schedule: Option<SubsidyContributionSchedule>,
    /// Notes stored with the result.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CalculationRequest {
    fn into_input(
        self,
        metrics: AveragedMetrics,
        tables: &RegulationTables,
    ) -> (CalculationInput, Option<String>) {
        let input = CalculationInput {
            metrics,
            inflation_rate: self.inflation_rate,
            water_tariff_per_m3: self.water_tariff_per_m3,
            public_contribution: self.public_contribution,
            extended_post_closure_years: self.extended_post_closure_years,
            recycling: self.recycling,
            subsidy_schedule: self.subsidy_schedule.unwrap_or(tables.subsidy_schedule),
        };
        (input, self.notes)
    }
}

/// A named what-if calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Simulation name. Must not be blank.
    pub name: String,
    /// Knobs of the calculation.
    #[serde(flatten)]
    pub calculation: CalculationRequest,
    /// Replacements applied to the averaged metrics.
    #[serde(default)]
    pub overrides: MetricOverrides,
    /// Official calculation this simulation is compared against.
    #[serde(default)]
    pub compared_with: Option<Uuid>,
}

/// Tariff calculations backed by a store.
#[derive(Clone)]
pub struct TariffService {
    records: Arc<dyn OperatingRecordLookup>,
    areas: Arc<dyn ServiceAreaLookup>,
    results: Arc<dyn ResultStore>,
    tables: Arc<RegulationTables>,
}

impl std::fmt::Debug for TariffService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TariffService")
            .field("regulation", &self.tables.id)
            .finish_non_exhaustive()
    }
}

impl TariffService {
    /// Creates a service over separate lookups and result store.
    #[must_use]
    pub fn new(
        records: Arc<dyn OperatingRecordLookup>,
        areas: Arc<dyn ServiceAreaLookup>,
        results: Arc<dyn ResultStore>,
        tables: RegulationTables,
    ) -> Self {
        Self {
            records,
            areas,
            results,
            tables: Arc::new(tables),
        }
    }

    /// Creates a service over one store implementing every trait.
    #[must_use]
    pub fn with_store<S>(store: Arc<S>, tables: RegulationTables) -> Self
    where
        S: OperatingRecordLookup + ServiceAreaLookup + ResultStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store, tables)
    }

    /// Calculates and stores the official tariff of an area for the
    /// averaging window ending at `period`.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::AreaNotFound`] if the area does not exist.
    /// * [`ServiceError::Conflict`] if an official calculation already
    ///   exists for the area and period.
    /// * [`ServiceError::InsufficientData`] if no record falls inside the
    ///   window.
    /// * [`ServiceError::Calculation`] if the engine rejects the input.
    pub async fn create_official(
        &self,
        area_id: AreaId,
        period: PeriodKey,
        request: CalculationRequest,
    ) -> Result<StoredCalculation, ServiceError> {
        if let Some(existing) = self.results.official_for(area_id, period).await? {
            log::warn!(
                "create_official: area {area_id} period {period} already has official {}",
                existing.id
            );
            return Err(ServiceError::Conflict {
                area_id,
                period,
                existing: existing.id,
            });
        }

        let area = self.area(area_id).await?;
        let metrics = self.averaged_metrics(area_id, period).await?;
        let (input, notes) = request.into_input(metrics, &self.tables);
        let result = waste_tariff::calculate(&input, &area, &self.tables)?;

        let stored = StoredCalculation::new(CalculationKind::Official, result).with_notes(notes);
        if let Err(e) = self.results.insert_official_if_absent(stored.clone()).await {
            log::warn!("create_official: area {area_id} period {period}: {e}");
            return Err(e.into());
        }

        log::info!(
            "Stored official tariff {} for area {area_id} period {period}",
            stored.id
        );
        Ok(stored)
    }

    /// Runs and stores a named simulation.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Calculation`] if the name is blank or the engine
    ///   rejects the input.
    /// * [`ServiceError::CalculationNotFound`] if `compared_with` names an
    ///   unknown calculation.
    /// * [`ServiceError::Calculation`] if `compared_with` names a
    ///   calculation that is not official.
    /// * [`ServiceError::AreaNotFound`] and
    ///   [`ServiceError::InsufficientData`] as for
    ///   [`Self::create_official`].
    pub async fn simulate(
        &self,
        area_id: AreaId,
        period: PeriodKey,
        request: SimulationRequest,
    ) -> Result<StoredCalculation, ServiceError> {
        let SimulationRequest {
            name,
            calculation,
            overrides,
            compared_with,
        } = request;

        if name.trim().is_empty() {
            let errors = ValidationErrors(vec![FieldError {
                field: "name".to_string(),
                message: "must not be blank".to_string(),
            }]);
            log::warn!("simulate: area {area_id} period {period}: {errors}");
            return Err(CalculationError::from(errors).into());
        }

        if let Some(id) = compared_with {
            let target = self.get(id).await?;
            if target.kind != CalculationKind::Official {
                let errors = ValidationErrors(vec![FieldError {
                    field: "comparedWith".to_string(),
                    message: format!("{id} is a {} calculation, not official", target.kind),
                }]);
                log::warn!("simulate: area {area_id} period {period}: {errors}");
                return Err(CalculationError::from(errors).into());
            }
        }

        let area = self.area(area_id).await?;
        let mut metrics = self.averaged_metrics(area_id, period).await?;
        overrides.apply(&mut metrics);
        let (input, notes) = calculation.into_input(metrics, &self.tables);
        let result = waste_tariff::calculate(&input, &area, &self.tables)?;

        let stored = StoredCalculation::new(CalculationKind::Simulation, result)
            .with_name(name)
            .with_compared_with(compared_with)
            .with_notes(notes);
        self.results.insert(stored.clone()).await?;

        log::info!(
            "Stored simulation '{}' ({}) for area {area_id} period {period}",
            stored.name.as_deref().unwrap_or_default(),
            stored.id
        );
        Ok(stored)
    }

    /// Runs and stores a test calculation.
    ///
    /// # Errors
    ///
    /// As for [`Self::create_official`], without the uniqueness check.
    pub async fn run_test(
        &self,
        area_id: AreaId,
        period: PeriodKey,
        request: CalculationRequest,
    ) -> Result<StoredCalculation, ServiceError> {
        let area = self.area(area_id).await?;
        let metrics = self.averaged_metrics(area_id, period).await?;
        let (input, notes) = request.into_input(metrics, &self.tables);
        let result = waste_tariff::calculate(&input, &area, &self.tables)?;

        let stored = StoredCalculation::new(CalculationKind::Test, result).with_notes(notes);
        self.results.insert(stored.clone()).await?;
        log::info!(
            "Stored test calculation {} for area {area_id} period {period}",
            stored.id
        );
        Ok(stored)
    }

    /// A stored calculation by ID.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::CalculationNotFound`] if no calculation has `id`.
    pub async fn get(&self, id: Uuid) -> Result<StoredCalculation, ServiceError> {
        self.results
            .by_id(id)
            .await?
            .ok_or(ServiceError::CalculationNotFound(id))
    }

    /// The official calculation of an area and period, if any.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Store`] if the store fails.
    pub async fn official(
        &self,
        area_id: AreaId,
        period: PeriodKey,
    ) -> Result<Option<StoredCalculation>, ServiceError> {
        Ok(self.results.official_for(area_id, period).await?)
    }

    /// Every stored calculation of an area, newest period first.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Store`] if the store fails.
    pub async fn history(&self, area_id: AreaId) -> Result<Vec<StoredCalculation>, ServiceError> {
        Ok(self.results.history(area_id).await?)
    }

    async fn area(&self, area_id: AreaId) -> Result<ServiceArea, ServiceError> {
        self.areas
            .area(area_id)
            .await?
            .ok_or(ServiceError::AreaNotFound(area_id))
    }

    async fn averaged_metrics(
        &self,
        area_id: AreaId,
        period: PeriodKey,
    ) -> Result<AveragedMetrics, ServiceError> {
        let periods = period.trailing(AVERAGING_WINDOW);
        let records = self.records.records_for(area_id, &periods).await?;
        average_period(&records, area_id, period).ok_or_else(|| {
            log::warn!("No operating records for area {area_id} ending {period}");
            ServiceError::InsufficientData { area_id, period }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waste_tariff_models::{
        BillingChannel, PerClass, SizeClass,
        operations::{
            LeachateScenario, OperatingPeriodRecord, SubscriberCounts, Sweeping, Tonnage,
            UrbanCleaningActivity,
        },
    };
    use waste_tariff_store::memory::InMemoryStore;

    /// Result store that never reports an existing official, so that
    /// uniqueness rests on the atomic insert alone.
    struct UncheckedOfficials(Arc<InMemoryStore>);

    #[async_trait::async_trait]
    impl ResultStore for UncheckedOfficials {
        async fn insert_official_if_absent(
            &self,
            calculation: StoredCalculation,
        ) -> Result<Uuid, StoreError> {
            self.0.insert_official_if_absent(calculation).await
        }

        async fn insert(&self, calculation: StoredCalculation) -> Result<Uuid, StoreError> {
            self.0.insert(calculation).await
        }

        async fn by_id(&self, id: Uuid) -> Result<Option<StoredCalculation>, StoreError> {
            self.0.by_id(id).await
        }

        async fn official_for(
            &self,
            _area_id: AreaId,
            _period: PeriodKey,
        ) -> Result<Option<StoredCalculation>, StoreError> {
            Ok(None)
        }

        async fn history(&self, area_id: AreaId) -> Result<Vec<StoredCalculation>, StoreError> {
            self.0.history(area_id).await
        }
    }

    fn area() -> ServiceArea {
        ServiceArea {
            id: AreaId(1),
            name: "APS Centro".to_string(),
            size_class: SizeClass::One,
            distance_to_disposal_km: 15.5,
            unpaved_road_pct: 2.0 / 15.5 * 100.0,
            coastal: false,
            billing_channel: BillingChannel::Water,
            uses_transfer_station: false,
            transfer_station_distance_km: None,
        }
    }

    fn record(period: &str) -> OperatingPeriodRecord {
        OperatingPeriodRecord {
            area_id: AreaId(1),
            period: period.parse().unwrap(),
            subscribers: SubscriberCounts {
                total: 1000,
                vacant: 0,
                metered_large_producers: 0,
                by_class: PerClass {
                    stratum_1: 200,
                    stratum_2: 250,
                    stratum_3: 250,
                    stratum_4: 150,
                    stratum_5: 80,
                    stratum_6: 30,
                    commercial: 40,
                },
            },
            tonnage: Tonnage {
                non_recyclable: 100.0,
                sweeping: 5.0,
                urban_cleaning: 2.0,
                recyclable: 8.0,
                rejected: 1.0,
                landfilled: 95.0,
                metered_large_producers: 0.0,
            },
            urban_cleaning: UrbanCleaningActivity {
                lawn_area_m2: 5000.0,
                baskets_maintained: 50,
                ..UrbanCleaningActivity::default()
            },
            sweeping: Sweeping {
                length_km: 0.0,
                area_m2: 10_000.0,
            },
            leachate_volume_m3: 500.0,
            leachate_scenario: LeachateScenario::SolidsOrganicSalts,
            environmental_tax_rate: 0.0,
            fleet_average_age_years: 5.0,
            fleet_daily_shifts: 1,
            toll_spend: 50_000.0,
            verified: true,
        }
    }

    fn request() -> CalculationRequest {
        CalculationRequest {
            inflation_rate: 0.03,
            recycling: RecyclingInputs {
                weighted_collection_cost: 175_000.0,
                weighted_disposal_cost: 160_000.0,
                incentive_discount: 0.02,
            },
            ..CalculationRequest::default()
        }
    }

    fn period() -> PeriodKey {
        "2026-06".parse().unwrap()
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.put_area(area()).await;
        for p in ["2026-01", "2026-02", "2026-03", "2026-04", "2026-05", "2026-06"] {
            store.upsert_record(record(p)).await.unwrap();
        }
        store
    }

    async fn service() -> TariffService {
        TariffService::with_store(
            seeded_store().await,
            waste_tariff::registry::default_regulation(),
        )
    }

    #[tokio::test]
    async fn official_tariff_matches_reference_values() {
        let service = service().await;
        let stored = service
            .create_official(AreaId(1), period(), request())
            .await
            .unwrap();

        assert_eq!(stored.kind, CalculationKind::Official);
        assert_eq!(stored.result.input.metrics.records_used, 6);
        assert!((stored.result.fixed.total - 2558.17).abs() <= 0.01);
        assert!((stored.result.variable.total - 447_554.18).abs() <= 0.01);
        assert!((stored.result.tariffs.stratum_1.final_tariff - 13_255.87).abs() <= 0.01);

        let fetched = service.get(stored.id).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn second_official_is_a_conflict() {
        let service = service().await;
        let first = service
            .create_official(AreaId(1), period(), request())
            .await
            .unwrap();
        let err = service
            .create_official(AreaId(1), period(), request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conflict { existing, .. } if existing == first.id
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_officials_admit_exactly_one() {
        let store = seeded_store().await;
        let service = TariffService::new(
            store.clone(),
            store.clone(),
            Arc::new(UncheckedOfficials(store.clone())),
            waste_tariff::registry::default_regulation(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create_official(AreaId(1), period(), request())
                        .await
                })
            })
            .collect();
        let outcomes: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        let winners: Vec<Uuid> = outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok().map(|c| c.id))
            .collect();
        assert_eq!(winners.len(), 1);
        for outcome in &outcomes {
            if let Err(err) = outcome {
                assert!(
                    matches!(
                        err,
                        ServiceError::Conflict { existing, .. } if *existing == winners[0]
                    ),
                    "unexpected error: {err}"
                );
            }
        }
        let official = store.official_for(AreaId(1), period()).await.unwrap().unwrap();
        assert_eq!(official.id, winners[0]);
        assert_eq!(store.history(AreaId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn simulation_cannot_compare_with_another_simulation() {
        let service = service().await;
        let baseline = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "Baseline".to_string(),
                    calculation: request(),
                    ..SimulationRequest::default()
                },
            )
            .await
            .unwrap();
        let err = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "Versus baseline".to_string(),
                    calculation: request(),
                    compared_with: Some(baseline.id),
                    ..SimulationRequest::default()
                },
            )
            .await
            .unwrap_err();
        let ServiceError::Calculation(CalculationError::Validation(errors)) = err else {
            panic!("expected a validation error, got {err}");
        };
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["comparedWith"]);
        assert_eq!(service.history(AreaId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_shift_override_is_rejected() {
        let service = service().await;
        let err = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "No shifts".to_string(),
                    calculation: request(),
                    overrides: MetricOverrides {
                        fleet_daily_shifts: Some(0),
                        fleet_average_age_years: Some(10.0),
                        ..MetricOverrides::default()
                    },
                    compared_with: None,
                },
            )
            .await
            .unwrap_err();
        let ServiceError::Calculation(CalculationError::Validation(errors)) = err else {
            panic!("expected a validation error, got {err}");
        };
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            ["metrics.fleetDailyShifts"]
        );
    }

    #[tokio::test]
    async fn simulations_never_conflict_and_apply_overrides() {
        let service = service().await;
        let official = service
            .create_official(AreaId(1), period(), request())
            .await
            .unwrap();

        let simulation = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "Older fleet".to_string(),
                    calculation: request(),
                    overrides: MetricOverrides {
                        fleet_average_age_years: Some(14.0),
                        ..MetricOverrides::default()
                    },
                    compared_with: Some(official.id),
                },
            )
            .await
            .unwrap();
        let again = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "Baseline".to_string(),
                    calculation: request(),
                    ..SimulationRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(simulation.kind, CalculationKind::Simulation);
        assert_eq!(simulation.name.as_deref(), Some("Older fleet"));
        assert_eq!(simulation.compared_with, Some(official.id));
        assert!(
            simulation.result.variable.collection_transport.total
                < official.result.variable.collection_transport.total
        );
        assert_eq!(again.result.tariffs, official.result.tariffs);
        assert_eq!(service.history(AreaId(1)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_simulation_name_is_rejected() {
        let service = service().await;
        let err = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "  ".to_string(),
                    calculation: request(),
                    ..SimulationRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Calculation(CalculationError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn comparing_with_unknown_calculation_fails() {
        let service = service().await;
        let missing = Uuid::new_v4();
        let err = service
            .simulate(
                AreaId(1),
                period(),
                SimulationRequest {
                    name: "What if".to_string(),
                    calculation: request(),
                    compared_with: Some(missing),
                    ..SimulationRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::CalculationNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn unknown_area_is_not_found() {
        let service = service().await;
        let err = service
            .create_official(AreaId(9), period(), request())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AreaNotFound(AreaId(9))));
    }

    #[tokio::test]
    async fn window_without_records_is_insufficient_data() {
        let service = service().await;
        let err = service
            .create_official(AreaId(1), "2025-06".parse().unwrap(), request())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientData { .. }));
        assert!(service.history(AreaId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_window_averages_records_found() {
        let service = service().await;
        let stored = service
            .run_test(AreaId(1), "2026-02".parse().unwrap(), request())
            .await
            .unwrap();
        assert_eq!(stored.kind, CalculationKind::Test);
        assert_eq!(stored.result.input.metrics.records_used, 2);
        assert!(
            service
                .official(AreaId(1), "2026-02".parse().unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn invalid_request_stores_nothing() {
        let service = service().await;
        let mut bad = request();
        bad.recycling.incentive_discount = 0.5;
        let err = service
            .create_official(AreaId(1), period(), bad)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Calculation(_)));
        assert!(service.official(AreaId(1), period()).await.unwrap().is_none());
    }
}
