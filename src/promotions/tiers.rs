//! Promotion Tiers

use rust_decimal::Decimal;

use super::rewards::Reward;

/// A threshold on a rule's breakpoint and the reward granted once it is met.
///
/// Thresholds are in breakpoint units: major currency units for amount breakpoints, units for
/// quantity breakpoints, points for SKU point breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionTier<'a> {
    minimum_threshold: Decimal,
    reward: Reward<'a>,
}

impl<'a> PromotionTier<'a> {
    /// Create a new tier.
    pub fn new(minimum_threshold: Decimal, reward: Reward<'a>) -> Self {
        Self {
            minimum_threshold,
            reward,
        }
    }

    /// Lowest breakpoint value that meets this tier
    pub fn minimum_threshold(&self) -> Decimal {
        self.minimum_threshold
    }

    /// Reward granted by this tier
    pub fn reward(&self) -> &Reward<'a> {
        &self.reward
    }

    /// Whether `breakpoint` meets this tier.
    pub fn is_met_by(&self, breakpoint: Decimal) -> bool {
        self.minimum_threshold <= breakpoint
    }
}
