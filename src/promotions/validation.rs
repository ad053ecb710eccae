//! Promotion Validation
//!
//! Configuration checks run on every active promotion before the order is touched.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{conditions::Condition, discounts::percentage_fraction};

use super::{Promotion, rewards::Reward};

/// A promotion whose configuration cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionValidationError {
    /// The promotion has no rules.
    #[error("promotion has no rules")]
    NoRules,

    /// A percentage reward is negative, or above 100% when that is not allowed.
    #[error("rule {rule} tier {tier}: percentage {percent} is out of range")]
    PercentageOutOfRange {
        /// Rule position
        rule: usize,

        /// Tier position
        tier: usize,

        /// Offending percentage as a fraction
        percent: Decimal,
    },

    /// A tier reward carries a negative amount.
    #[error("rule {rule} tier {tier}: amount is negative")]
    NegativeAmount {
        /// Rule position
        rule: usize,

        /// Tier position
        tier: usize,
    },

    /// A tier threshold is negative.
    #[error("rule {rule} tier {tier}: threshold is negative")]
    NegativeThreshold {
        /// Rule position
        rule: usize,

        /// Tier position
        tier: usize,
    },

    /// A free product reward gives away no units.
    #[error("rule {rule} tier {tier}: free product quantity is zero")]
    ZeroFreeQuantity {
        /// Rule position
        rule: usize,

        /// Tier position
        tier: usize,
    },

    /// A reward or condition amount is in a different currency from the order.
    #[error("rule {rule}: amount has currency {actual}, but order has currency {expected}")]
    CurrencyMismatch {
        /// Rule position
        rule: usize,

        /// Order currency
        expected: &'static str,

        /// Currency found in the promotion
        actual: &'static str,
    },
}

/// Check that `promotion` can be applied to an order in `currency`.
///
/// # Errors
///
/// Returns the first [`PromotionValidationError`] found, in rule then tier order.
pub fn validate_promotion(
    promotion: &Promotion<'_>,
    currency: &'static Currency,
    allow_percentage_over_100: bool,
) -> Result<(), PromotionValidationError> {
    if promotion.rules().is_empty() {
        return Err(PromotionValidationError::NoRules);
    }

    for (rule_idx, rule) in promotion.rules().iter().enumerate() {
        for condition in rule.conditions() {
            if let Condition::CartSubtotal { amount, .. } = condition {
                check_currency(rule_idx, amount, currency)?;
            }
        }

        for (tier_idx, tier) in rule.tiers().iter().enumerate() {
            if tier.minimum_threshold().is_sign_negative() && !tier.minimum_threshold().is_zero() {
                return Err(PromotionValidationError::NegativeThreshold {
                    rule: rule_idx,
                    tier: tier_idx,
                });
            }

            validate_reward(
                tier.reward(),
                rule_idx,
                tier_idx,
                currency,
                allow_percentage_over_100,
            )?;
        }
    }

    Ok(())
}

fn validate_reward(
    reward: &Reward<'_>,
    rule: usize,
    tier: usize,
    currency: &'static Currency,
    allow_percentage_over_100: bool,
) -> Result<(), PromotionValidationError> {
    match reward {
        Reward::DiscountPercentage { percent, .. } => {
            let fraction = percentage_fraction(percent);

            if fraction < Decimal::ZERO || (!allow_percentage_over_100 && fraction > Decimal::ONE)
            {
                return Err(PromotionValidationError::PercentageOutOfRange {
                    rule,
                    tier,
                    percent: fraction,
                });
            }
        }
        Reward::DiscountAmount { amount, .. }
        | Reward::GiftCard { amount }
        | Reward::Cashback { amount } => {
            check_currency(rule, amount, currency)?;

            if amount.to_minor_units() < 0 {
                return Err(PromotionValidationError::NegativeAmount { rule, tier });
            }
        }
        Reward::FreeProduct { quantity, .. } => {
            if *quantity == 0 {
                return Err(PromotionValidationError::ZeroFreeQuantity { rule, tier });
            }
        }
        Reward::FreeShipping | Reward::LoyaltyPoints { .. } => {}
    }

    Ok(())
}

fn check_currency(
    rule: usize,
    amount: &Money<'_, Currency>,
    currency: &'static Currency,
) -> Result<(), PromotionValidationError> {
    if amount.currency() == currency {
        Ok(())
    } else {
        Err(PromotionValidationError::CurrencyMismatch {
            rule,
            expected: currency.iso_alpha_code,
            actual: amount.currency().iso_alpha_code,
        })
    }
}
