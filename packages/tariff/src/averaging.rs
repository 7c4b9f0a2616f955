//! Six-month trailing averages of operating records.

use std::collections::BTreeMap;

use waste_tariff_models::{
    AreaId, PerClass, PeriodKey,
    operations::{
        AveragedMetrics, OperatingPeriodRecord, SubscriberCounts, Sweeping, Tonnage,
        UrbanCleaningActivity,
    },
};

/// Number of trailing months averaged.
pub const AVERAGING_WINDOW: usize = 6;

/// Averages the records of `area_id` for the [`AVERAGING_WINDOW`] months
/// ending at `end`.
///
/// Additive fields are divided by the number of months found, not by the
/// window length. When several records share a period the last one in
/// `records` wins. The leachate scenario and the shift count come from the
/// most recent month found.
///
/// Returns `None` when no record of the area falls inside the window.
#[must_use]
pub fn average_period(
    records: &[OperatingPeriodRecord],
    area_id: AreaId,
    end: PeriodKey,
) -> Option<AveragedMetrics> {
    let window = end.trailing(AVERAGING_WINDOW);

    let mut by_period: BTreeMap<PeriodKey, &OperatingPeriodRecord> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.area_id == area_id && window.contains(&r.period))
    {
        by_period.insert(record.period, record);
    }

    let (_, latest) = by_period.iter().next_back()?;
    let latest = *latest;
    let matched: Vec<&OperatingPeriodRecord> = by_period.values().copied().collect();

    log::debug!(
        "average_period: area={area_id} end={end} records_used={}",
        matched.len()
    );

    Some(AveragedMetrics {
        area_id,
        end_period: end,
        records_used: matched.len(),
        periods: by_period.keys().rev().copied().collect(),
        subscribers: SubscriberCounts {
            total: mean(&matched, |r| f64::from(r.subscribers.total)),
            vacant: mean(&matched, |r| f64::from(r.subscribers.vacant)),
            metered_large_producers: mean(&matched, |r| {
                f64::from(r.subscribers.metered_large_producers)
            }),
            by_class: PerClass::from_fn(|class| {
                mean(&matched, |r| f64::from(*r.subscribers.by_class.get(class)))
            }),
        },
        tonnage: Tonnage {
            non_recyclable: mean(&matched, |r| r.tonnage.non_recyclable),
            sweeping: mean(&matched, |r| r.tonnage.sweeping),
            urban_cleaning: mean(&matched, |r| r.tonnage.urban_cleaning),
            recyclable: mean(&matched, |r| r.tonnage.recyclable),
            rejected: mean(&matched, |r| r.tonnage.rejected),
            landfilled: mean(&matched, |r| r.tonnage.landfilled),
            metered_large_producers: mean(&matched, |r| r.tonnage.metered_large_producers),
        },
        urban_cleaning: UrbanCleaningActivity {
            tree_pruning_cost: mean(&matched, |r| r.urban_cleaning.tree_pruning_cost),
            lawn_area_m2: mean(&matched, |r| r.urban_cleaning.lawn_area_m2),
            washed_area_m2: mean(&matched, |r| r.urban_cleaning.washed_area_m2),
            beach_area_m2: mean(&matched, |r| r.urban_cleaning.beach_area_m2),
            baskets_installed: mean(&matched, |r| {
                f64::from(r.urban_cleaning.baskets_installed)
            }),
            baskets_maintained: mean(&matched, |r| {
                f64::from(r.urban_cleaning.baskets_maintained)
            }),
        },
        sweeping: Sweeping {
            length_km: mean(&matched, |r| r.sweeping.length_km),
            area_m2: mean(&matched, |r| r.sweeping.area_m2),
        },
        leachate_volume_m3: mean(&matched, |r| r.leachate_volume_m3),
        leachate_scenario: latest.leachate_scenario,
        environmental_tax_rate: mean(&matched, |r| r.environmental_tax_rate),
        fleet_average_age_years: mean(&matched, |r| r.fleet_average_age_years),
        fleet_daily_shifts: latest.fleet_daily_shifts,
        toll_spend: mean(&matched, |r| r.toll_spend),
    })
}

fn mean(records: &[&OperatingPeriodRecord], field: impl Fn(&OperatingPeriodRecord) -> f64) -> f64 {
    let mut sum = 0.0;
    let mut count = 0.0;
    for record in records {
        sum += field(record);
        count += 1.0;
    }
    if count > 0.0 { sum / count } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waste_tariff_models::operations::LeachateScenario;

    fn record(area: u64, period: &str, tons: f64) -> OperatingPeriodRecord {
        OperatingPeriodRecord {
            area_id: AreaId(area),
            period: period.parse().unwrap(),
            subscribers: SubscriberCounts {
                total: 1000,
                vacant: 10,
                metered_large_producers: 0,
                by_class: PerClass::from_fn(|_| 140),
            },
            tonnage: Tonnage {
                non_recyclable: tons,
                landfilled: tons - 5.0,
                ..Tonnage::default()
            },
            urban_cleaning: UrbanCleaningActivity::default(),
            sweeping: Sweeping::default(),
            leachate_volume_m3: 500.0,
            leachate_scenario: LeachateScenario::SolidsOrganicNitrogen,
            environmental_tax_rate: 0.0,
            fleet_average_age_years: 5.0,
            fleet_daily_shifts: 1,
            toll_spend: 0.0,
            verified: true,
        }
    }

    fn end() -> PeriodKey {
        "2026-03".parse().unwrap()
    }

    #[test]
    fn divides_by_records_found() {
        let records = vec![
            record(1, "2026-01", 100.0),
            record(1, "2026-02", 110.0),
            record(1, "2026-03", 120.0),
        ];
        let avg = average_period(&records, AreaId(1), end()).unwrap();
        assert_eq!(avg.records_used, 3);
        assert!((avg.tonnage.non_recyclable - 110.0).abs() < 1e-9);
        assert!((avg.subscribers.total - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn window_wraps_year_and_excludes_older_months() {
        let records = vec![
            record(1, "2025-09", 1000.0),
            record(1, "2025-10", 100.0),
            record(1, "2025-12", 100.0),
            record(1, "2026-04", 1000.0),
        ];
        let avg = average_period(&records, AreaId(1), end()).unwrap();
        assert_eq!(avg.records_used, 2);
        let periods: Vec<String> = avg.periods.iter().map(ToString::to_string).collect();
        assert_eq!(periods, ["2025-12", "2025-10"]);
        assert!((avg.tonnage.non_recyclable - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ignores_other_areas() {
        let records = vec![record(2, "2026-03", 100.0)];
        assert!(average_period(&records, AreaId(1), end()).is_none());
    }

    #[test]
    fn empty_input_is_insufficient() {
        assert!(average_period(&[], AreaId(1), end()).is_none());
    }

    #[test]
    fn duplicate_period_counts_once_last_wins() {
        let records = vec![
            record(1, "2026-02", 100.0),
            record(1, "2026-02", 200.0),
            record(1, "2026-03", 300.0),
        ];
        let avg = average_period(&records, AreaId(1), end()).unwrap();
        assert_eq!(avg.records_used, 2);
        assert!((avg.tonnage.non_recyclable - 250.0).abs() < 1e-9);
    }

    #[test]
    fn non_additive_fields_come_from_latest_month() {
        let mut latest = record(1, "2026-03", 100.0);
        latest.leachate_scenario = LeachateScenario::Recirculation;
        latest.fleet_daily_shifts = 2;
        let records = vec![latest, record(1, "2026-01", 100.0)];
        let avg = average_period(&records, AreaId(1), end()).unwrap();
        assert_eq!(avg.leachate_scenario, LeachateScenario::Recirculation);
        assert_eq!(avg.fleet_daily_shifts, 2);
    }
}
