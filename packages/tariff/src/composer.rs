//! Per-class tariff composition (Art. 39).

use waste_tariff_models::{
    PerClass,
    calculation::SubsidyContributionSchedule,
    result::{
        AppliedAdjustment, ClassTariff, FixedCostBreakdown, RecyclingValueBreakdown,
        TonnageAllocation, VariableCostBreakdown,
    },
};

use crate::round_money;

/// Base tariff of a class:
/// `CFT + CVNA * (TRBL + TRLU + TRNA + TRRA) + VBA * TRA`.
#[must_use]
pub fn base_tariff(
    cft: f64,
    cvna: f64,
    vba: f64,
    allocation: &TonnageAllocation,
    class_tons: f64,
) -> f64 {
    round_money(
        cft + cvna
            * (allocation.sweeping + allocation.urban_cleaning + class_tons + allocation.rejected)
            + vba * allocation.recyclable,
    )
}

/// Applies a subsidy (negative) or contribution (positive) factor.
#[must_use]
pub fn apply_factor(base: f64, factor: f64) -> f64 {
    round_money(base * (1.0 + factor))
}

/// Base and final tariff of every class.
pub fn compose(
    fixed: &FixedCostBreakdown,
    variable: &VariableCostBreakdown,
    recycling: &RecyclingValueBreakdown,
    allocation: &TonnageAllocation,
    schedule: &SubsidyContributionSchedule,
    adjustments: &mut Vec<AppliedAdjustment>,
) -> PerClass<ClassTariff> {
    allocation.non_recyclable.map(|class, class_tons| {
        let base = base_tariff(
            fixed.total,
            variable.total,
            recycling.total,
            allocation,
            *class_tons,
        );
        let factor = schedule.factor(class);
        if factor.abs() > f64::EPSILON {
            adjustments.push(AppliedAdjustment::SubsidyContribution { class, factor });
        }
        let final_tariff = apply_factor(base, factor);
        log::debug!("compose: class={class} base={base} factor={factor} final={final_tariff}");
        ClassTariff {
            base,
            factor,
            final_tariff,
        }
    })
}
