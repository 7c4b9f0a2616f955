//! Variable costs per ton (CVNA = CRT + CDF + CTL).

use waste_tariff_models::{
    ServiceArea,
    area::UNPAVED_ROAD_MULTIPLIER,
    calculation::CalculationInput,
    operations::{AveragedMetrics, LeachateScenario},
    result::{
        AppliedAdjustment, CollectionFormula, CollectionTransportBreakdown, DisposalBreakdown,
        LeachateBreakdown, VariableCostBreakdown,
    },
};

use crate::{
    CalculationError, inflate, per,
    regulation::{
        CappedCost, CollectionTable, DisposalTable, HaulFunction, LeachateTable, RegulationTables,
    },
    round_money,
};

/// Evaluates a haul function at distance `km` for `tons` collected.
#[must_use]
pub fn haul_cost(function: &HaulFunction, km: f64, tons: f64, inflation_rate: f64) -> f64 {
    inflate(
        function.base + function.distance_factor * km + per(function.scale, tons),
        inflation_rate,
    )
}

/// `min(inflate(base + scale / quantity), inflate(cap))`.
#[must_use]
pub fn capped_cost(cost: &CappedCost, quantity: f64, inflation_rate: f64) -> f64 {
    inflate(cost.base + per(cost.scale, quantity), inflation_rate)
        .min(inflate(cost.cap, inflation_rate))
}

/// Fleet-age discount as a fraction, capped at 100%.
#[must_use]
pub fn fleet_age_discount(table: &CollectionTable, age_years: f64, daily_shifts: u8) -> f64 {
    let threshold = table.fleet_age_threshold(daily_shifts);
    if age_years > threshold {
        (table.fleet_age_discount_per_year * (age_years - threshold)).min(1.0)
    } else {
        0.0
    }
}

/// Collection and transport cost per ton (CRT).
///
/// The direct-haul formula is used unless the area hauls through a
/// transfer station with a positive distance, in which case the cheaper
/// of the two wins. Coastal, fleet-age and public-fleet adjustments apply
/// in that order; tolls per ton are added last and never discounted.
pub fn collection_transport(
    table: &CollectionTable,
    area: &ServiceArea,
    metrics: &AveragedMetrics,
    public_fleet: bool,
    inflation_rate: f64,
    adjustments: &mut Vec<AppliedAdjustment>,
) -> CollectionTransportBreakdown {
    let km = area.effective_distance();
    let tons = metrics.tonnage.non_recyclable;

    if area.unpaved_km() > 0.0 {
        adjustments.push(AppliedAdjustment::UnpavedRoads {
            unpaved_km: area.unpaved_km(),
            multiplier: UNPAVED_ROAD_MULTIPLIER,
        });
    }

    let direct = haul_cost(&table.direct, km, tons, inflation_rate);
    let via_transfer_station = area
        .transfer_station_eligible()
        .then(|| haul_cost(&table.via_transfer_station, km, tons, inflation_rate));

    let (formula, mut cost) = match via_transfer_station {
        Some(via) if via < direct => {
            adjustments.push(AppliedAdjustment::TransferStation {
                saving_per_ton: round_money(direct - via),
            });
            (CollectionFormula::ViaTransferStation, via)
        }
        _ => (CollectionFormula::Direct, direct),
    };

    if area.coastal {
        cost *= 1.0 + table.coastal_adjustment;
        adjustments.push(AppliedAdjustment::Coastal {
            factor: table.coastal_adjustment,
        });
    }

    let fleet_discount = fleet_age_discount(
        table,
        metrics.fleet_average_age_years,
        metrics.fleet_daily_shifts,
    );
    if fleet_discount > 0.0 {
        cost *= 1.0 - fleet_discount;
        adjustments.push(AppliedAdjustment::FleetAge {
            years_over_threshold: metrics.fleet_average_age_years
                - table.fleet_age_threshold(metrics.fleet_daily_shifts),
            discount: fleet_discount,
        });
    }

    if public_fleet {
        cost *= 1.0 - table.capital_proportion;
        adjustments.push(AppliedAdjustment::PublicCollectionFleet {
            discount: table.capital_proportion,
        });
    }

    let tolls_per_ton = per(metrics.toll_spend, tons);
    let total = round_money(cost + tolls_per_ton);

    log::debug!(
        "collection_transport: distance={km} tons={tons} formula={formula} \
         fleet_discount={fleet_discount} crt={total}"
    );

    CollectionTransportBreakdown {
        effective_distance_km: km,
        direct: round_money(direct),
        via_transfer_station: via_transfer_station.map(round_money),
        formula,
        fleet_age_discount: fleet_discount,
        adjusted: round_money(cost),
        tolls_per_ton: round_money(tolls_per_ton),
        total,
    }
}

/// Final disposal cost per ton (CDF) at `landfilled_tons` a month.
pub fn disposal(
    table: &DisposalTable,
    landfilled_tons: f64,
    extended_post_closure_years: u32,
    public_site: bool,
    inflation_rate: f64,
    adjustments: &mut Vec<AppliedAdjustment>,
) -> DisposalBreakdown {
    let useful_life = capped_cost(&table.useful_life, landfilled_tons, inflation_rate);

    let extension_factor = table.extension.factor(extended_post_closure_years);
    let post_closure =
        capped_cost(&table.post_closure, landfilled_tons, inflation_rate) * extension_factor;
    if extended_post_closure_years > 0 {
        adjustments.push(AppliedAdjustment::PostClosureExtension {
            extra_years: extended_post_closure_years,
            factor: extension_factor,
        });
    }

    let mut cost = useful_life + post_closure;

    let mut small_landfill_adjustment = 0.0;
    if landfilled_tons < table.small_landfill_threshold_tons {
        small_landfill_adjustment = cost * table.small_landfill_surcharge;
        cost += small_landfill_adjustment;
        adjustments.push(AppliedAdjustment::SmallLandfill {
            surcharge: table.small_landfill_surcharge,
        });
    }

    if public_site {
        cost *= 1.0 - table.capital_discount;
        adjustments.push(AppliedAdjustment::PublicDisposalSite {
            discount: table.capital_discount,
        });
    }

    let total = round_money(cost);
    log::debug!("disposal: tons={landfilled_tons} cdf={total}");

    DisposalBreakdown {
        useful_life: round_money(useful_life),
        post_closure: round_money(post_closure),
        extension_factor,
        small_landfill_adjustment: round_money(small_landfill_adjustment),
        total,
    }
}

/// Leachate-treatment parameters of one calculation.
#[derive(Debug, Clone, Copy)]
pub struct LeachateLoad {
    /// Treatment scenario.
    pub scenario: LeachateScenario,
    /// Leachate treated a month (m3).
    pub volume_m3: f64,
    /// Tons received at the landfill a month.
    pub landfilled_tons: f64,
    /// Environmental tax per m3.
    pub environmental_tax_rate: f64,
}

/// Leachate treatment cost per landfilled ton (CTL).
///
/// # Errors
///
/// * [`CalculationError::MissingScenario`] if `table` has no costs for a
///   treatment scenario (1-4).
pub fn leachate(
    table: &LeachateTable,
    regulation_id: &str,
    load: LeachateLoad,
    extended_post_closure_years: u32,
    public_plant: bool,
    inflation_rate: f64,
    adjustments: &mut Vec<AppliedAdjustment>,
) -> Result<LeachateBreakdown, CalculationError> {
    let LeachateLoad {
        scenario,
        volume_m3,
        landfilled_tons,
        environmental_tax_rate,
    } = load;

    let (useful_life, post_closure, extension_factor, environmental_tax) =
        if scenario == LeachateScenario::Recirculation {
            (inflate(table.recirculation_cost, inflation_rate), 0.0, 1.0, 0.0)
        } else {
            let costs = table
                .scenario(scenario)
                .ok_or_else(|| CalculationError::MissingScenario {
                    regulation: regulation_id.to_string(),
                    scenario: scenario.value(),
                })?;
            let useful_life = capped_cost(&costs.useful_life, volume_m3, inflation_rate);
            let extension_factor = table.extension.factor(extended_post_closure_years);
            let post_closure =
                capped_cost(&costs.post_closure, volume_m3, inflation_rate) * extension_factor;
            if extended_post_closure_years > 0 {
                adjustments.push(AppliedAdjustment::LeachatePostClosureExtension {
                    extra_years: extended_post_closure_years,
                    factor: extension_factor,
                });
            }
            (
                useful_life,
                post_closure,
                extension_factor,
                environmental_tax_rate * volume_m3,
            )
        };

    let management_cost = useful_life + post_closure;
    let mut cost = per(management_cost * volume_m3 + environmental_tax, landfilled_tons);

    if public_plant {
        let discount = table.public_discount(scenario);
        cost *= 1.0 - discount;
        adjustments.push(AppliedAdjustment::PublicLeachatePlant { discount });
    }

    let total = round_money(cost);
    log::debug!(
        "leachate: scenario={} volume={volume_m3} ctlm={management_cost} ctl={total}",
        scenario.value()
    );

    Ok(LeachateBreakdown {
        scenario,
        useful_life: round_money(useful_life),
        post_closure: round_money(post_closure),
        extension_factor,
        management_cost: round_money(management_cost),
        environmental_tax: round_money(environmental_tax),
        total,
    })
}

/// All variable costs of a calculation.
///
/// # Errors
///
/// * [`CalculationError::MissingScenario`] if the tables lack the
///   averaged leachate scenario.
pub fn variable_costs(
    input: &CalculationInput,
    area: &ServiceArea,
    tables: &RegulationTables,
    adjustments: &mut Vec<AppliedAdjustment>,
) -> Result<VariableCostBreakdown, CalculationError> {
    let metrics = &input.metrics;
    let public = &input.public_contribution;

    let collection_transport = collection_transport(
        &tables.collection,
        area,
        metrics,
        public.collection,
        input.inflation_rate,
        adjustments,
    );
    let disposal = disposal(
        &tables.disposal,
        metrics.tonnage.landfilled,
        input.extended_post_closure_years,
        public.disposal,
        input.inflation_rate,
        adjustments,
    );
    let leachate = leachate(
        &tables.leachate,
        &tables.id,
        LeachateLoad {
            scenario: metrics.leachate_scenario,
            volume_m3: metrics.leachate_volume_m3,
            landfilled_tons: metrics.tonnage.landfilled,
            environmental_tax_rate: metrics.environmental_tax_rate,
        },
        input.extended_post_closure_years,
        public.leachate,
        input.inflation_rate,
        adjustments,
    )?;

    let total = round_money(collection_transport.total + disposal.total + leachate.total);
    log::debug!("variable_costs: cvna={total}");

    Ok(VariableCostBreakdown {
        collection_transport,
        disposal,
        leachate,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_regulation;
    use waste_tariff_models::{
        AreaId, BillingChannel, PerClass, SizeClass,
        operations::{SubscriberCounts, Sweeping, Tonnage, UrbanCleaningActivity},
    };

    fn area() -> ServiceArea {
        ServiceArea {
            id: AreaId(1),
            name: "APS Centro".to_string(),
            size_class: SizeClass::One,
            distance_to_disposal_km: 16.0,
            unpaved_road_pct: 0.0,
            coastal: false,
            billing_channel: BillingChannel::Water,
            uses_transfer_station: false,
            transfer_station_distance_km: None,
        }
    }

    fn metrics(tons: f64, fleet_age: f64, shifts: u8) -> AveragedMetrics {
        AveragedMetrics {
            area_id: AreaId(1),
            end_period: "2026-03".parse().unwrap(),
            records_used: 6,
            periods: Vec::new(),
            subscribers: SubscriberCounts {
                total: 1000.0,
                vacant: 0.0,
                metered_large_producers: 0.0,
                by_class: PerClass::default(),
            },
            tonnage: Tonnage {
                non_recyclable: tons,
                landfilled: tons,
                ..Tonnage::default()
            },
            urban_cleaning: UrbanCleaningActivity::default(),
            sweeping: Sweeping::default(),
            leachate_volume_m3: 0.0,
            leachate_scenario: LeachateScenario::default(),
            environmental_tax_rate: 0.0,
            fleet_average_age_years: fleet_age,
            fleet_daily_shifts: shifts,
            toll_spend: 50_000.0,
        }
    }

    #[test]
    fn direct_haul_matches_reference() {
        let tables = default_regulation();
        let mut adjustments = Vec::new();
        let crt = collection_transport(
            &tables.collection,
            &area(),
            &metrics(100.0, 5.0, 1),
            false,
            0.03,
            &mut adjustments,
        );
        assert_eq!(crt.formula, CollectionFormula::Direct);
        assert!(crt.via_transfer_station.is_none());
        assert!((crt.direct - 168_293.20).abs() < 1e-6);
        assert!((crt.tolls_per_ton - 500.0).abs() < 1e-9);
        assert!((crt.total - 168_793.20).abs() < 1e-6);
        assert!(adjustments.is_empty());
    }

    #[test]
    fn fleet_at_threshold_gets_no_discount() {
        let table = default_regulation().collection;
        assert!(fleet_age_discount(&table, 12.0, 1).abs() < f64::EPSILON);
        assert!((fleet_age_discount(&table, 14.0, 1) - 0.04).abs() < 1e-12);
        assert!((fleet_age_discount(&table, 8.0, 2) - 0.04).abs() < 1e-12);
        assert!((fleet_age_discount(&table, 200.0, 1) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aged_fleet_discounts_before_tolls() {
        let tables = default_regulation();
        let mut adjustments = Vec::new();
        let young = collection_transport(
            &tables.collection,
            &area(),
            &metrics(100.0, 5.0, 1),
            false,
            0.0,
            &mut adjustments,
        );
        let old = collection_transport(
            &tables.collection,
            &area(),
            &metrics(100.0, 14.0, 1),
            false,
            0.0,
            &mut adjustments,
        );
        assert!((old.adjusted - round_money(young.adjusted * 0.96)).abs() < 0.01);
        assert!((old.tolls_per_ton - young.tolls_per_ton).abs() < f64::EPSILON);
        assert!(
            adjustments
                .iter()
                .any(|a| matches!(a, AppliedAdjustment::FleetAge { .. }))
        );
    }

    #[test]
    fn transfer_station_wins_when_cheaper() {
        let tables = default_regulation();
        let mut a = area();
        a.distance_to_disposal_km = 120.0;
        a.uses_transfer_station = true;
        a.transfer_station_distance_km = Some(20.0);
        let mut adjustments = Vec::new();
        let crt = collection_transport(
            &tables.collection,
            &a,
            &metrics(1000.0, 0.0, 1),
            false,
            0.0,
            &mut adjustments,
        );
        // f1 = 64745 + 738*120 + 8683.846; f2 = 87823 + 278*120 + 25211.213
        assert_eq!(crt.formula, CollectionFormula::ViaTransferStation);
        assert!((crt.direct - 161_988.85).abs() < 1e-6);
        assert!((crt.via_transfer_station.unwrap() - 146_394.21).abs() < 1e-6);
        assert!(
            adjustments
                .iter()
                .any(|a| matches!(a, AppliedAdjustment::TransferStation { .. }))
        );
    }

    #[test]
    fn zero_tons_guards_scale_and_tolls() {
        let tables = default_regulation();
        let mut adjustments = Vec::new();
        let crt = collection_transport(
            &tables.collection,
            &area(),
            &metrics(0.0, 0.0, 1),
            false,
            0.0,
            &mut adjustments,
        );
        assert!((crt.direct - (64_745.0 + 738.0 * 16.0)).abs() < 1e-9);
        assert!(crt.tolls_per_ton.abs() < f64::EPSILON);
        assert!(crt.total.is_finite());
    }

    #[test]
    fn coastal_and_public_fleet_adjust_in_order() {
        let tables = default_regulation();
        let mut a = area();
        a.coastal = true;
        let mut adjustments = Vec::new();
        let crt = collection_transport(
            &tables.collection,
            &a,
            &metrics(100.0, 0.0, 1),
            true,
            0.0,
            &mut adjustments,
        );
        let expected = (64_745.0 + 738.0 * 16.0 + 86_838.46) * 1.0197 * 0.78;
        assert!((crt.adjusted - round_money(expected)).abs() < 1e-6);
        assert_eq!(adjustments.len(), 2);
    }

    #[test]
    fn disposal_matches_reference_with_small_landfill() {
        let table = default_regulation().disposal;
        let mut adjustments = Vec::new();
        let cdf = disposal(&table, 95.0, 0, false, 0.03, &mut adjustments);
        assert!((cdf.useful_life - 144_092.88).abs() < 1e-6);
        assert!((cdf.post_closure - 6370.55).abs() < 1e-6);
        assert!((cdf.small_landfill_adjustment - 15_046.34).abs() < 1e-6);
        assert!((cdf.total - 165_509.77).abs() < 1e-6);
        assert_eq!(
            adjustments,
            vec![AppliedAdjustment::SmallLandfill { surcharge: 0.10 }]
        );
    }

    #[test]
    fn large_landfill_uses_scale_term() {
        let table = default_regulation().disposal;
        let mut adjustments = Vec::new();
        let cdf = disposal(&table, 10_000.0, 0, false, 0.0, &mut adjustments);
        // 18722 + 13292.4379 ; 242 + 1165.2352
        assert!((cdf.useful_life - 32_014.44).abs() < 1e-6);
        assert!((cdf.post_closure - 1407.24).abs() < 1e-6);
        assert!(cdf.small_landfill_adjustment.abs() < f64::EPSILON);
        assert!(adjustments.is_empty());
    }

    #[test]
    fn post_closure_extension_factor() {
        let table = default_regulation().disposal;
        let mut adjustments = Vec::new();
        let cdf = disposal(&table, 10_000.0, 5, false, 0.0, &mut adjustments);
        let k = 0.8211 * 15.0_f64.ln() - 0.8954;
        assert!((cdf.extension_factor - k).abs() < 1e-12);
        assert!((cdf.post_closure - round_money(1407.2352 * k)).abs() < 1e-6);
    }

    #[test]
    fn leachate_scenario_three_matches_reference() {
        let table = default_regulation().leachate;
        let mut adjustments = Vec::new();
        let ctl = leachate(
            &table,
            "cra_720_2015",
            LeachateLoad {
                scenario: LeachateScenario::SolidsOrganicSalts,
                volume_m3: 500.0,
                landfilled_tons: 95.0,
                environmental_tax_rate: 0.0,
            },
            0,
            false,
            0.03,
            &mut adjustments,
        )
        .unwrap();
        assert!((ctl.useful_life - 19_350.61).abs() < 1e-6);
        assert!((ctl.post_closure - 2167.12).abs() < 1e-6);
        assert!((ctl.management_cost - 21_517.73).abs() < 1e-6);
        assert!((ctl.total - 113_251.21).abs() < 1e-6);
    }

    #[test]
    fn recirculation_has_no_post_closure_or_tax() {
        let table = default_regulation().leachate;
        let mut adjustments = Vec::new();
        let ctl = leachate(
            &table,
            "cra_720_2015",
            LeachateLoad {
                scenario: LeachateScenario::Recirculation,
                volume_m3: 100.0,
                landfilled_tons: 200.0,
                environmental_tax_rate: 50.0,
            },
            5,
            true,
            0.0,
            &mut adjustments,
        )
        .unwrap();
        assert!(ctl.post_closure.abs() < f64::EPSILON);
        assert!((ctl.extension_factor - 1.0).abs() < f64::EPSILON);
        assert!(ctl.environmental_tax.abs() < f64::EPSILON);
        // 2348 * 100 / 200 * (1 - 0.80)
        assert!((ctl.total - 234.8).abs() < 1e-6);
        assert_eq!(
            adjustments,
            vec![AppliedAdjustment::PublicLeachatePlant { discount: 0.80 }]
        );
    }

    #[test]
    fn leachate_environmental_tax_is_per_volume() {
        let table = default_regulation().leachate;
        let mut adjustments = Vec::new();
        let ctl = leachate(
            &table,
            "cra_720_2015",
            LeachateLoad {
                scenario: LeachateScenario::SolidsOrganicSalts,
                volume_m3: 500.0,
                landfilled_tons: 95.0,
                environmental_tax_rate: 19.0,
            },
            0,
            false,
            0.03,
            &mut adjustments,
        )
        .unwrap();
        assert!((ctl.environmental_tax - 9500.0).abs() < 1e-9);
        assert!((ctl.total - 113_351.21).abs() < 1e-6);
    }

    #[test]
    fn leachate_without_landfill_tons_is_zero() {
        let table = default_regulation().leachate;
        let mut adjustments = Vec::new();
        let ctl = leachate(
            &table,
            "cra_720_2015",
            LeachateLoad {
                scenario: LeachateScenario::SolidsOrganic,
                volume_m3: 500.0,
                landfilled_tons: 0.0,
                environmental_tax_rate: 0.0,
            },
            0,
            false,
            0.0,
            &mut adjustments,
        )
        .unwrap();
        assert!(ctl.total.abs() < f64::EPSILON);
    }
}
