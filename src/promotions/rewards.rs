//! Rewards
//!
//! What a promotion tier grants once its threshold is met.

use decimal_percentage::Percentage;
use rusty_money::{Money, MoneyError, iso::Currency};

use crate::{
    discounts::{DiscountError, percent_of_minor},
    ids::{FamilyId, ProductId},
    orders::OrderLine,
};

/// Which eligible lines a monetary reward is spread across.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RewardTarget {
    /// Every line eligible for the promotion
    #[default]
    EligibleLines,

    /// Eligible lines of a single product
    Product(ProductId),

    /// Eligible lines of a single product family
    Family(FamilyId),
}

impl RewardTarget {
    /// Whether `line` is covered by this target.
    pub fn covers(&self, line: &OrderLine<'_>) -> bool {
        match self {
            Self::EligibleLines => true,
            Self::Product(product) => line.product() == product,
            Self::Family(family) => line.family() == Some(family),
        }
    }
}

/// Reward granted by a promotion tier.
#[derive(Debug, Clone, PartialEq)]
pub enum Reward<'a> {
    /// Percentage off the target lines
    DiscountPercentage {
        /// Percentage taken off
        percent: Percentage,

        /// Lines the discount is spread across
        target: RewardTarget,
    },

    /// Fixed amount off the target lines, capped at their value
    DiscountAmount {
        /// Amount taken off
        amount: Money<'a, Currency>,

        /// Lines the discount is spread across
        target: RewardTarget,
    },

    /// Units of a product given away
    FreeProduct {
        /// Product given away
        product: ProductId,

        /// Display name of the product
        name: String,

        /// Units given per grant
        quantity: u32,
    },

    /// Free shipping for the order
    FreeShipping,

    /// Loyalty points credited to the customer
    LoyaltyPoints {
        /// Points credited
        points: u64,
    },

    /// Gift card issued with the order
    GiftCard {
        /// Gift card value
        amount: Money<'a, Currency>,
    },

    /// Cashback paid after the order
    Cashback {
        /// Cashback value
        amount: Money<'a, Currency>,
    },
}

impl<'a> Reward<'a> {
    /// Calculate the discount this reward takes off `base`.
    ///
    /// Percentages are taken of `base` as they are, so one above 100% discounts more than
    /// `base`. Fixed amounts are capped at `base`. Non-monetary rewards discount nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the percentage calculation overflows, or if a fixed amount
    /// is in a different currency from `base`.
    pub fn calculate_discount<'b>(
        &self,
        base: Money<'b, Currency>,
    ) -> Result<Money<'b, Currency>, DiscountError> {
        let base_minor = base.to_minor_units();

        let discount_minor = match self {
            Self::DiscountPercentage { percent, .. } => percent_of_minor(percent, base_minor)?,
            Self::DiscountAmount { amount, .. } => {
                if amount.currency() != base.currency() {
                    return Err(DiscountError::Money(MoneyError::CurrencyMismatch {
                        expected: base.currency().iso_alpha_code,
                        actual: amount.currency().iso_alpha_code,
                    }));
                }

                amount.to_minor_units().clamp(0, base_minor.max(0))
            }
            Self::FreeProduct { .. }
            | Self::FreeShipping
            | Self::LoyaltyPoints { .. }
            | Self::GiftCard { .. }
            | Self::Cashback { .. } => 0,
        };

        Ok(Money::from_minor(discount_minor, base.currency()))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percentage_discount_rounds_to_minor_units() -> TestResult {
        let reward = Reward::DiscountPercentage {
            percent: Percentage::from(0.10),
            target: RewardTarget::EligibleLines,
        };

        let discount = reward.calculate_discount(Money::from_minor(6500, USD))?;

        assert_eq!(discount, Money::from_minor(650, USD));

        Ok(())
    }

    #[test]
    fn fixed_discount_is_capped_at_base() -> TestResult {
        let reward = Reward::DiscountAmount {
            amount: Money::from_minor(500, USD),
            target: RewardTarget::EligibleLines,
        };

        assert_eq!(
            reward.calculate_discount(Money::from_minor(6500, USD))?,
            Money::from_minor(500, USD)
        );

        assert_eq!(
            reward.calculate_discount(Money::from_minor(300, USD))?,
            Money::from_minor(300, USD)
        );

        Ok(())
    }

    #[test]
    fn percentage_over_one_hundred_is_not_capped() -> TestResult {
        let reward = Reward::DiscountPercentage {
            percent: Percentage::from(1.5),
            target: RewardTarget::EligibleLines,
        };

        assert_eq!(
            reward.calculate_discount(Money::from_minor(6500, USD))?,
            Money::from_minor(9750, USD)
        );

        Ok(())
    }

    #[test]
    fn fixed_discount_in_other_currency_errors() {
        let reward = Reward::DiscountAmount {
            amount: Money::from_minor(500, GBP),
            target: RewardTarget::EligibleLines,
        };

        let result = reward.calculate_discount(Money::from_minor(6500, USD));

        assert!(matches!(
            result,
            Err(DiscountError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn non_monetary_rewards_discount_nothing() -> TestResult {
        let rewards = [
            Reward::FreeProduct {
                product: ProductId::from("gift"),
                name: "Gift".to_string(),
                quantity: 1,
            },
            Reward::FreeShipping,
            Reward::LoyaltyPoints { points: 100 },
            Reward::GiftCard {
                amount: Money::from_minor(1000, USD),
            },
            Reward::Cashback {
                amount: Money::from_minor(200, USD),
            },
        ];

        for reward in rewards {
            assert_eq!(
                reward.calculate_discount(Money::from_minor(6500, USD))?,
                Money::from_minor(0, USD)
            );
        }

        Ok(())
    }

    #[test]
    fn targets_cover_matching_lines() {
        let line = OrderLine::new("A", "Apple", Money::from_minor(100, USD), 1).with_family("fruit");

        assert!(RewardTarget::EligibleLines.covers(&line));
        assert!(RewardTarget::Product(ProductId::from("A")).covers(&line));
        assert!(!RewardTarget::Product(ProductId::from("B")).covers(&line));
        assert!(RewardTarget::Family(FamilyId::from("fruit")).covers(&line));
        assert!(!RewardTarget::Family(FamilyId::from("veg")).covers(&line));
    }
}
