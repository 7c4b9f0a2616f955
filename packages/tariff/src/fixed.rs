//! Fixed costs per subscriber (CFT = CCS + CLUS + CBLS).

use waste_tariff_models::{
    BillingChannel, ServiceArea, SizeClass,
    calculation::CalculationInput,
    operations::{Sweeping, UrbanCleaningActivity},
    result::{AppliedAdjustment, FixedCostBreakdown, UrbanCleaningBreakdown},
};

use crate::{
    inflate, per,
    regulation::{CommercialTable, RegulationTables, SweepingTable, UrbanCleaningTable},
    round_money,
};

/// Commercial management cost per subscriber (CCS).
#[must_use]
pub fn commercial_cost(
    table: &CommercialTable,
    size_class: SizeClass,
    channel: BillingChannel,
    has_recycling: bool,
    inflation_rate: f64,
) -> f64 {
    let mut base = table.base(size_class, channel);
    if has_recycling {
        base *= 1.0 + table.recycling_uplift;
    }
    round_money(inflate(base, inflation_rate))
}

/// Urban-cleaning cost per subscriber (CLUS), by activity.
///
/// Tree-pruning spend is passed through as incurred; every other activity
/// is priced from the inflated unit prices. Beach area is converted to
/// kilometres before pricing.
#[must_use]
pub fn urban_cleaning_cost(
    table: &UrbanCleaningTable,
    size_class: SizeClass,
    activity: &UrbanCleaningActivity<f64>,
    subscribers: f64,
    water_tariff_per_m3: f64,
    inflation_rate: f64,
) -> UrbanCleaningBreakdown {
    let tree_pruning = per(activity.tree_pruning_cost, subscribers);

    let lawn_price = inflate(table.lawn_price(size_class), inflation_rate);
    let lawn_mowing = per(activity.lawn_area_m2 * lawn_price, subscribers);

    let washing_price = inflate(
        table.washing_base + table.washing_water_factor * (water_tariff_per_m3 / 1000.0),
        inflation_rate,
    );
    let surface_washing = per(activity.washed_area_m2 * washing_price, subscribers);

    let beach_km = activity.beach_area_m2 * table.beach_km_per_m2;
    let beach_price = inflate(table.beach_per_km, inflation_rate);
    let beach_cleaning = per(beach_km * beach_price, subscribers);

    let installation = inflate(table.basket_installation, inflation_rate);
    let maintenance = inflate(table.basket_maintenance, inflation_rate);
    let baskets = per(
        activity.baskets_installed * installation + activity.baskets_maintained * maintenance,
        subscribers,
    );

    let total = tree_pruning + lawn_mowing + surface_washing + beach_cleaning + baskets;

    UrbanCleaningBreakdown {
        tree_pruning: round_money(tree_pruning),
        lawn_mowing: round_money(lawn_mowing),
        surface_washing: round_money(surface_washing),
        beach_cleaning: round_money(beach_cleaning),
        baskets: round_money(baskets),
        total: round_money(total),
    }
}

/// Kilometres priced by sweeping: kerb length plus converted open areas.
#[must_use]
pub fn swept_km(table: &SweepingTable, sweeping: &Sweeping) -> f64 {
    sweeping.length_km + sweeping.area_m2 * table.km_per_m2
}

/// Sweeping cost per subscriber (CBLS).
#[must_use]
pub fn sweeping_cost(
    table: &SweepingTable,
    km: f64,
    subscribers: f64,
    public_equipment: bool,
    inflation_rate: f64,
) -> f64 {
    let mut price = inflate(table.cost_per_km, inflation_rate);
    if public_equipment {
        price *= 1.0 - table.capital_proportion;
    }
    round_money(per(price * km, subscribers))
}

/// All fixed costs of a calculation.
pub fn fixed_costs(
    input: &CalculationInput,
    area: &ServiceArea,
    tables: &RegulationTables,
    adjustments: &mut Vec<AppliedAdjustment>,
) -> FixedCostBreakdown {
    let metrics = &input.metrics;
    let subscribers = metrics.subscribers.total;
    let has_recycling = metrics.has_recycling();

    let commercial = commercial_cost(
        &tables.commercial,
        area.size_class,
        area.billing_channel,
        has_recycling,
        input.inflation_rate,
    );
    if has_recycling {
        adjustments.push(AppliedAdjustment::RecyclingUplift {
            factor: tables.commercial.recycling_uplift,
        });
    }

    let urban_cleaning = urban_cleaning_cost(
        &tables.urban_cleaning,
        area.size_class,
        &metrics.urban_cleaning,
        subscribers,
        input.water_tariff_per_m3,
        input.inflation_rate,
    );

    let km = swept_km(&tables.sweeping, &metrics.sweeping);
    let sweeping = sweeping_cost(
        &tables.sweeping,
        km,
        subscribers,
        input.public_contribution.sweeping,
        input.inflation_rate,
    );
    if input.public_contribution.sweeping {
        adjustments.push(AppliedAdjustment::PublicSweepingEquipment {
            discount: tables.sweeping.capital_proportion,
        });
    }

    let total = round_money(commercial + urban_cleaning.total + sweeping);

    log::debug!(
        "fixed_costs: ccs={commercial} clus={} cbls={sweeping} swept_km={km} cft={total}",
        urban_cleaning.total
    );

    FixedCostBreakdown {
        commercial,
        urban_cleaning,
        sweeping,
        swept_km: km,
        total,
    }
}
