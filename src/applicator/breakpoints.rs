//! Breakpoints
//!
//! Measures a rule's breakpoint over the lines its promotion may touch.

use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::{
    context::{InvariantViolation, LineKey, OrderItemContext, PromotionContext},
    discounts::minor_to_major,
    promotions::{BreakpointBasis, BreakpointType, Promotion, PromotionRule},
};

/// A line the promotion may touch, measured for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleLine {
    /// Line key in the context
    pub key: LineKey,

    /// What the line adds to the breakpoint
    pub contribution: Decimal,

    /// Line value under the rule's basis, in minor units
    pub value_minor: i64,
}

/// A rule's breakpoint value and the lines it was measured over, in order line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Breakpoint value, in the rule's breakpoint units
    pub value: Decimal,

    /// Eligible lines
    pub lines: SmallVec<[EligibleLine; 10]>,
}

/// Measure `rule`'s breakpoint over the lines of `context` not excluded by `promotion`.
///
/// # Errors
///
/// Returns [`InvariantViolation::Overflow`] if a contribution or the sum does not fit in a decimal.
pub fn measure(
    context: &PromotionContext<'_>,
    promotion: &Promotion<'_>,
    rule: &PromotionRule<'_>,
) -> Result<Breakpoint, InvariantViolation> {
    let currency = context.currency();

    let lines = context
        .lines()
        .filter(|(_, item)| !promotion.excludes(item.line().product()))
        .map(|(key, item)| {
            let value_minor = basis_value(item, rule.breakpoint_basis());

            let contribution = match rule.breakpoint_type() {
                BreakpointType::Amount => minor_to_major(value_minor, currency),
                BreakpointType::Quantity => Decimal::from(item.available_quantity()),
                BreakpointType::SkuPoints => item
                    .line()
                    .total_sku_points()
                    .ok_or(InvariantViolation::Overflow)?,
            };

            Ok(EligibleLine {
                key,
                contribution,
                value_minor,
            })
        })
        .collect::<Result<SmallVec<[EligibleLine; 10]>, InvariantViolation>>()?;

    let value = lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.contribution))
        .ok_or(InvariantViolation::Overflow)?;

    Ok(Breakpoint { value, lines })
}

/// Line value under `basis`, in minor units.
pub fn basis_value(item: &OrderItemContext<'_>, basis: BreakpointBasis) -> i64 {
    match basis {
        BreakpointBasis::OriginalPrice => item.original_minor(),
        BreakpointBasis::CurrentPrice => item.current_minor(),
    }
}
