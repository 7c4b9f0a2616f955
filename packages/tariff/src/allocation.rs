//! Tons per subscriber assigned to each tariff term (Art. 40-41).

use waste_tariff_models::{
    PerClass, operations::AveragedMetrics, result::TonnageAllocation,
};

use crate::{per, round_tons};

/// Splits the averaged tonnage among subscribers.
///
/// * TRBL and TRLU divide sweeping and urban-cleaning tons by all
///   subscribers.
/// * TRRA divides recycling rejects by occupied subscribers.
/// * TRA divides recyclable tons by occupied subscribers that are not
///   metered large producers.
/// * TRNA shares the non-recyclable tons left after rejects and metered
///   tons among classes by production weight.
///
/// Any non-positive denominator yields 0. Ratios are rounded to six
/// decimals.
#[must_use]
pub fn allocate(metrics: &AveragedMetrics, weights: &PerClass<f64>) -> TonnageAllocation {
    let subscribers = &metrics.subscribers;
    let tonnage = &metrics.tonnage;

    let total = subscribers.total;
    let occupied = metrics.occupied_subscribers();
    let billable = occupied - subscribers.metered_large_producers;

    let available =
        tonnage.non_recyclable - tonnage.rejected - tonnage.metered_large_producers;

    let weighted: f64 = subscribers
        .by_class
        .iter()
        .map(|(class, count)| count * weights.get(class))
        .sum();

    let non_recyclable = weights.map(|_, weight| round_tons(per(available * weight, weighted)));

    let allocation = TonnageAllocation {
        sweeping: round_tons(per(tonnage.sweeping, total)),
        urban_cleaning: round_tons(per(tonnage.urban_cleaning, total)),
        rejected: round_tons(per(tonnage.rejected, occupied)),
        recyclable: round_tons(per(tonnage.recyclable, billable)),
        available_non_recyclable: available,
        weighted_subscribers: weighted,
        non_recyclable,
    };

    log::debug!(
        "allocate: trbl={} trlu={} trra={} tra={} weighted_subscribers={weighted}",
        allocation.sweeping,
        allocation.urban_cleaning,
        allocation.rejected,
        allocation.recyclable
    );

    allocation
}
