//! Reward Applicator
//!
//! Turns a rule's met tiers into discounts, free items and benefits on a [`PromotionContext`].

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use smallvec::{SmallVec, smallvec};
use tracing::trace;

use crate::{
    context::{InvariantViolation, PromotionContext},
    discounts::allocate_proportionally,
    engine::CalculationError,
    ids::PromotionCode,
    promotions::{BreakpointType, Promotion, PromotionTier, Reward, RewardTarget, RuleId},
};

pub mod breakpoints;

use breakpoints::Breakpoint;

/// Outcome of applying one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleApplication {
    /// Rule applied
    pub rule: RuleId,

    /// Tier rewards granted
    pub tiers_granted: u32,

    /// Discount taken off the order, in minor units
    pub discount_minor: i64,

    /// Free units granted
    pub free_units: u64,
}

impl RuleApplication {
    fn nothing(rule: RuleId) -> Self {
        Self {
            rule,
            tiers_granted: 0,
            discount_minor: 0,
            free_units: 0,
        }
    }

    /// Whether the rule granted anything.
    pub fn granted(&self) -> bool {
        self.tiers_granted > 0
    }
}

/// Outcome of applying a promotion's retained rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionApplication {
    /// Promotion applied
    pub code: PromotionCode,

    /// Discount taken off the order, in minor units
    pub discount_minor: i64,

    /// Per-rule outcomes, in application order
    pub rules: SmallVec<[RuleApplication; 2]>,
}

impl PromotionApplication {
    /// Whether any rule granted anything.
    pub fn granted(&self) -> bool {
        self.rules.iter().any(RuleApplication::granted)
    }
}

/// Applies promotion rules to a [`PromotionContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardApplicator;

impl RewardApplicator {
    /// Apply the rules at `rule_indexes` of `promotion`, in that order.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculationError`] if any rule fails to apply. The context may have been
    /// partially updated; callers discard it.
    pub fn apply_promotion(
        context: &mut PromotionContext<'_>,
        promotion: &Promotion<'_>,
        rule_indexes: &[usize],
    ) -> Result<PromotionApplication, CalculationError> {
        let mut application = PromotionApplication {
            code: promotion.code().clone(),
            discount_minor: 0,
            rules: SmallVec::new(),
        };

        for &rule_index in rule_indexes {
            let rule = Self::apply(context, promotion, rule_index)?;

            application.discount_minor = application
                .discount_minor
                .checked_add(rule.discount_minor)
                .ok_or(InvariantViolation::Overflow)?;

            application.rules.push(rule);
        }

        Ok(application)
    }

    /// Apply rule `rule_index` of `promotion`.
    ///
    /// Bracket rules grant their highest met tier, cumulative rules every met tier. Monetary
    /// rewards are computed against the state before this rule and spread across their target
    /// lines by value. A rule with no met tier, or whose repetition cap is used up, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculationError`] if the rule does not exist, if discount arithmetic fails,
    /// or if a line would be discounted below zero.
    pub fn apply(
        context: &mut PromotionContext<'_>,
        promotion: &Promotion<'_>,
        rule_index: usize,
    ) -> Result<RuleApplication, CalculationError> {
        let rule_id = RuleId::new(promotion.code().clone(), rule_index);

        let rule = promotion
            .rules()
            .get(rule_index)
            .ok_or_else(|| InvariantViolation::UnknownRule(rule_id.clone()))?;

        let breakpoint = breakpoints::measure(context, promotion, rule)?;
        let mut tiers = rule.applicable_tiers(breakpoint.value);

        if let Some(cap) = rule.repetition() {
            let remaining = cap.get().saturating_sub(context.rule_grants(&rule_id));

            tiers.truncate(usize::try_from(remaining).unwrap_or(usize::MAX));
        }

        if tiers.is_empty() {
            trace!(rule = %rule_id, breakpoint = %breakpoint.value, "no tier granted");

            return Ok(RuleApplication::nothing(rule_id));
        }

        let code = promotion.code();
        let mut line_discounts: SmallVec<[i64; 10]> = smallvec![0; breakpoint.lines.len()];
        let mut free_units = 0_u64;

        for tier in &tiers {
            match tier.reward() {
                reward @ (Reward::DiscountPercentage { target, .. }
                | Reward::DiscountAmount { target, .. }) => {
                    allocate_reward(context, reward, target, &breakpoint, &mut line_discounts)?;
                }
                Reward::FreeProduct {
                    product,
                    name,
                    quantity,
                } => {
                    context.grant_free_item(product, name, *quantity, code);
                    free_units = free_units.saturating_add(u64::from(*quantity));
                }
                Reward::FreeShipping => {
                    let benefits = context.benefits_mut();
                    benefits.free_shipping = true;
                    benefits.record(code);
                }
                Reward::LoyaltyPoints { points } => {
                    let benefits = context.benefits_mut();
                    benefits.loyalty_points = benefits.loyalty_points.saturating_add(*points);
                    benefits.record(code);
                }
                Reward::GiftCard { amount } => {
                    let benefits = context.benefits_mut();
                    benefits.gift_card_minor = benefits
                        .gift_card_minor
                        .checked_add(amount.to_minor_units())
                        .ok_or(InvariantViolation::Overflow)?;
                    benefits.record(code);
                }
                Reward::Cashback { amount } => {
                    let benefits = context.benefits_mut();
                    benefits.cashback_minor = benefits
                        .cashback_minor
                        .checked_add(amount.to_minor_units())
                        .ok_or(InvariantViolation::Overflow)?;
                    benefits.record(code);
                }
            }
        }

        if rule.breakpoint_type() == BreakpointType::Quantity && free_units > 0 {
            consume_triggering_units(context, &breakpoint, &tiers)?;
        }

        let mut discount_minor = 0_i64;

        for (line, amount) in breakpoint.lines.iter().zip(&line_discounts) {
            if *amount == 0 {
                continue;
            }

            context.apply_line_discount(line.key, *amount, code)?;

            discount_minor = discount_minor
                .checked_add(*amount)
                .ok_or(InvariantViolation::Overflow)?;
        }

        let tiers_granted = u32::try_from(tiers.len()).unwrap_or(u32::MAX);

        context.record_rule_grants(&rule_id, tiers_granted);
        context.record_promotion(code, promotion.name(), discount_minor);

        trace!(
            rule = %rule_id,
            breakpoint = %breakpoint.value,
            tiers_granted,
            discount_minor,
            free_units,
            "rule applied"
        );

        Ok(RuleApplication {
            rule: rule_id,
            tiers_granted,
            discount_minor,
            free_units,
        })
    }
}

/// Compute a monetary reward against its target lines and add each line's share to
/// `line_discounts`.
///
/// Lines are weighted by their value under the rule's basis, so no share exceeds its line.
/// A reward whose target lines have no value is skipped.
fn allocate_reward(
    context: &PromotionContext<'_>,
    reward: &Reward<'_>,
    target: &RewardTarget,
    breakpoint: &Breakpoint,
    line_discounts: &mut [i64],
) -> Result<(), CalculationError> {
    let weights: SmallVec<[Decimal; 10]> = breakpoint
        .lines
        .iter()
        .map(|line| {
            let covered = context
                .line(line.key)
                .is_some_and(|item| item.line().quantity() > 0 && target.covers(item.line()));

            if covered && line.value_minor > 0 {
                Decimal::from(line.value_minor)
            } else {
                Decimal::ZERO
            }
        })
        .collect();

    let base_minor = breakpoint
        .lines
        .iter()
        .zip(&weights)
        .filter(|(_, weight)| !weight.is_zero())
        .try_fold(0_i64, |sum, (line, _)| sum.checked_add(line.value_minor))
        .ok_or(InvariantViolation::Overflow)?;

    if base_minor == 0 {
        return Ok(());
    }

    let currency: &Currency = context.currency();
    let discount = reward
        .calculate_discount(Money::from_minor(base_minor, currency))?
        .to_minor_units();

    let shares = allocate_proportionally(discount, &weights)?;
    let allocated: i64 = shares.iter().sum();

    if allocated != discount {
        return Err(InvariantViolation::AllocationMismatch {
            expected: discount,
            allocated,
        }
        .into());
    }

    for (slot, share) in line_discounts.iter_mut().zip(shares) {
        *slot = slot.checked_add(share).ok_or(InvariantViolation::Overflow)?;
    }

    Ok(())
}

/// Consume the units that met the highest granted tier, from the eligible lines in order.
fn consume_triggering_units(
    context: &mut PromotionContext<'_>,
    breakpoint: &Breakpoint,
    tiers: &[&PromotionTier<'_>],
) -> Result<(), CalculationError> {
    let Some(highest) = tiers.last() else {
        return Ok(());
    };

    let mut outstanding = highest
        .minimum_threshold()
        .ceil()
        .to_u32()
        .ok_or(InvariantViolation::Overflow)?;

    for line in &breakpoint.lines {
        if outstanding == 0 {
            break;
        }

        let available = context
            .line(line.key)
            .map_or(0, |item| item.available_quantity());

        let take = available.min(outstanding);

        if take > 0 {
            context.consume_quantity(line.key, take)?;
            outstanding -= take;
        }
    }

    Ok(())
}
