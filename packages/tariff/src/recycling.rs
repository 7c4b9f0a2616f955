//! Recycling base value (VBA).

use waste_tariff_models::{calculation::RecyclingInputs, result::RecyclingValueBreakdown};

use crate::round_money;

/// `VBA = (weighted collection + weighted disposal) * (1 - incentive)`.
///
/// The weighted costs are municipality-wide averages supplied by the
/// caller; the incentive discount is range-checked during validation.
#[must_use]
pub fn recycling_value(inputs: &RecyclingInputs) -> RecyclingValueBreakdown {
    let total = round_money(
        (inputs.weighted_collection_cost + inputs.weighted_disposal_cost)
            * (1.0 - inputs.incentive_discount),
    );
    log::debug!("recycling_value: vba={total}");

    RecyclingValueBreakdown {
        weighted_collection_cost: inputs.weighted_collection_cost,
        weighted_disposal_cost: inputs.weighted_disposal_cost,
        incentive_discount: inputs.incentive_discount,
        total,
    }
}
