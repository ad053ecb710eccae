//! Reward Fixtures

use serde::Deserialize;

use crate::{
    fixtures::{
        FixtureError,
        prices::{parse_money, parse_percentage},
    },
    ids::{FamilyId, ProductId},
    promotions::{Reward, RewardTarget},
};

/// Lines a discount is spread across. Omitted means every eligible line.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewardTargetFixture {
    /// Only lines of this product
    #[serde(default)]
    pub product: Option<String>,

    /// Only lines of this family
    #[serde(default)]
    pub family: Option<String>,
}

impl TryFrom<RewardTargetFixture> for RewardTarget {
    type Error = FixtureError;

    fn try_from(fixture: RewardTargetFixture) -> Result<Self, Self::Error> {
        match (fixture.product, fixture.family) {
            (None, None) => Ok(RewardTarget::EligibleLines),
            (Some(product), None) => Ok(RewardTarget::Product(ProductId::from(product))),
            (None, Some(family)) => Ok(RewardTarget::Family(FamilyId::from(family))),
            (Some(_), Some(_)) => Err(FixtureError::InvalidPromotionData(
                "reward target names both a product and a family".to_string(),
            )),
        }
    }
}

fn one() -> u32 {
    1
}

/// Reward configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardFixture {
    /// Percentage off (e.g., "10%" or "0.10")
    DiscountPercentage {
        /// Percentage string
        percent: String,

        /// Target lines
        #[serde(default)]
        target: RewardTargetFixture,
    },

    /// Fixed amount off (e.g., "5.00 USD")
    DiscountAmount {
        /// Price string
        amount: String,

        /// Target lines
        #[serde(default)]
        target: RewardTargetFixture,
    },

    /// Free units of a product
    FreeProduct {
        /// Product identifier
        product: String,

        /// Display name, defaults to the product identifier
        #[serde(default)]
        name: Option<String>,

        /// Units per grant
        #[serde(default = "one")]
        quantity: u32,
    },

    /// Free shipping
    FreeShipping,

    /// Loyalty points
    LoyaltyPoints {
        /// Points credited
        points: u64,
    },

    /// Gift card issued
    GiftCard {
        /// Price string
        amount: String,
    },

    /// Cashback earned
    Cashback {
        /// Price string
        amount: String,
    },
}

impl TryFrom<RewardFixture> for Reward<'static> {
    type Error = FixtureError;

    fn try_from(fixture: RewardFixture) -> Result<Self, Self::Error> {
        Ok(match fixture {
            RewardFixture::DiscountPercentage { percent, target } => Reward::DiscountPercentage {
                percent: parse_percentage(&percent)?,
                target: target.try_into()?,
            },
            RewardFixture::DiscountAmount { amount, target } => Reward::DiscountAmount {
                amount: parse_money(&amount)?,
                target: target.try_into()?,
            },
            RewardFixture::FreeProduct {
                product,
                name,
                quantity,
            } => Reward::FreeProduct {
                name: name.unwrap_or_else(|| product.clone()),
                product: ProductId::from(product),
                quantity,
            },
            RewardFixture::FreeShipping => Reward::FreeShipping,
            RewardFixture::LoyaltyPoints { points } => Reward::LoyaltyPoints { points },
            RewardFixture::GiftCard { amount } => Reward::GiftCard {
                amount: parse_money(&amount)?,
            },
            RewardFixture::Cashback { amount } => Reward::Cashback {
                amount: parse_money(&amount)?,
            },
        })
    }
}
