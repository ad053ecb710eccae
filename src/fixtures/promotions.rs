//! Promotion Fixtures

use std::num::NonZeroU32;

use jiff::civil::DateTime;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    conditions::{Condition, ConditionLogic},
    fixtures::{
        FixtureError,
        promotions::{conditions::ConditionFixture, rewards::RewardFixture},
    },
    promotions::{
        BreakpointBasis, BreakpointType, CalculationMethod, Promotion, PromotionRule,
        PromotionTier, Reward,
    },
};

pub mod conditions;
pub mod rewards;

/// Wrapper for promotions in YAML
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Map of promotion code -> promotion fixture
    pub promotions: FxHashMap<String, PromotionFixture>,
}

fn active() -> bool {
    true
}

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromotionFixture {
    /// Display name
    pub name: String,

    /// Start of the validity window (inclusive)
    pub starts_at: DateTime,

    /// End of the validity window (exclusive)
    #[serde(default)]
    pub ends_at: Option<DateTime>,

    /// Whether the promotion is switched on
    #[serde(default = "active")]
    pub active: bool,

    /// Priority, lower applies first
    #[serde(default)]
    pub priority: i32,

    /// Applied alone when eligible
    #[serde(default)]
    pub exclusive: bool,

    /// Combinability group
    #[serde(default)]
    pub combinability_group: Option<String>,

    /// Apply only the first rule whose conditions hold
    #[serde(default)]
    pub apply_first_matching_rule_only: bool,

    /// Products this promotion never discounts
    #[serde(default)]
    pub excluded_products: Vec<String>,

    /// Rules, in declaration order
    pub rules: Vec<RuleFixture>,
}

/// Rule fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFixture {
    /// Rule name
    pub name: String,

    /// How conditions combine
    #[serde(default)]
    pub condition_logic: ConditionLogic,

    /// Conditions
    #[serde(default)]
    pub conditions: Vec<ConditionFixture>,

    /// Bracket or cumulative tiers
    #[serde(default)]
    pub calculation_method: CalculationMethod,

    /// What tier thresholds measure
    #[serde(default)]
    pub breakpoint_type: BreakpointType,

    /// Prices the amount breakpoint is measured on
    #[serde(default)]
    pub breakpoint_basis: BreakpointBasis,

    /// Maximum tier grants per calculation
    #[serde(default)]
    pub repetition: Option<NonZeroU32>,

    /// Tiers
    pub tiers: Vec<TierFixture>,
}

/// Tier fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierFixture {
    /// Minimum breakpoint value, in breakpoint units
    #[serde(default)]
    pub threshold: Decimal,

    /// Reward granted
    pub reward: RewardFixture,
}

impl TryFrom<TierFixture> for PromotionTier<'static> {
    type Error = FixtureError;

    fn try_from(fixture: TierFixture) -> Result<Self, Self::Error> {
        Ok(PromotionTier::new(
            fixture.threshold,
            Reward::try_from(fixture.reward)?,
        ))
    }
}

impl TryFrom<RuleFixture> for PromotionRule<'static> {
    type Error = FixtureError;

    fn try_from(fixture: RuleFixture) -> Result<Self, Self::Error> {
        let tiers = fixture
            .tiers
            .into_iter()
            .map(PromotionTier::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let conditions = fixture
            .conditions
            .into_iter()
            .map(Condition::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let rule = PromotionRule::new(fixture.name, tiers)
            .with_conditions(fixture.condition_logic, conditions)
            .with_calculation_method(fixture.calculation_method)
            .with_breakpoint(fixture.breakpoint_type, fixture.breakpoint_basis);

        Ok(match fixture.repetition {
            Some(repetition) => rule.with_repetition(repetition),
            None => rule,
        })
    }
}

impl PromotionFixture {
    /// Convert to a [`Promotion`] with the given code.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule, condition or reward is invalid.
    pub fn try_into_promotion(self, code: String) -> Result<Promotion<'static>, FixtureError> {
        let rules = self
            .rules
            .into_iter()
            .map(PromotionRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut promotion = Promotion::new(code, self.name, self.starts_at, rules)
            .with_active(self.active)
            .with_priority(self.priority)
            .with_exclusive(self.exclusive)
            .with_first_matching_rule_only(self.apply_first_matching_rule_only);

        if let Some(ends_at) = self.ends_at {
            promotion = promotion.with_ends_at(ends_at);
        }

        if let Some(group) = self.combinability_group {
            promotion = promotion.with_combinability_group(group);
        }

        Ok(self
            .excluded_products
            .into_iter()
            .fold(promotion, Promotion::with_excluded_product))
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use crate::ids::ProductId;

    use super::*;

    const TIERED: &str = "
promotions:
  SPEND:
    name: Spend and save
    starts_at: 2024-01-01T00:00:00
    ends_at: 2025-01-01T00:00:00
    priority: 2
    combinability_group: seasonal
    excluded_products: [gift-card]
    rules:
      - name: Spend tiers
        condition_logic: any
        conditions:
          - { type: cart_quantity, quantity: 2 }
        calculation_method: cumulative
        breakpoint_type: amount
        repetition: 1
        tiers:
          - threshold: 50
            reward: { type: discount_amount, amount: 5.00 USD }
          - threshold: 20
            reward: { type: discount_amount, amount: 2.00 USD }
";

    #[test]
    fn promotion_fixture_converts_every_field() -> TestResult {
        let fixture: PromotionsFixture = serde_norway::from_str(TIERED)?;
        let (code, promotion) = fixture.promotions.into_iter().next().ok_or("no promotions")?;

        let promotion = promotion.try_into_promotion(code)?;

        assert_eq!(promotion.code().as_str(), "SPEND");
        assert_eq!(promotion.priority(), 2);
        assert_eq!(promotion.combinability_group(), Some("seasonal"));
        assert_eq!(promotion.ends_at(), Some(date(2025, 1, 1).at(0, 0, 0, 0)));
        assert!(promotion.active());
        assert!(promotion.excludes(&ProductId::from("gift-card")));

        let rule = promotion.rules().first().ok_or("no rules")?;

        assert_eq!(rule.calculation_method(), CalculationMethod::Cumulative);
        assert_eq!(rule.condition_logic(), ConditionLogic::Any);
        assert_eq!(rule.repetition().map(NonZeroU32::get), Some(1));

        let thresholds: Vec<Decimal> = rule
            .tiers()
            .iter()
            .map(PromotionTier::minimum_threshold)
            .collect();

        assert_eq!(thresholds, [Decimal::from(20), Decimal::from(50)]);

        Ok(())
    }

    #[test]
    fn promotion_fixture_rejects_zero_repetition() {
        let yaml = TIERED.replace("repetition: 1", "repetition: 0");
        let result: Result<PromotionsFixture, _> = serde_norway::from_str(&yaml);

        assert!(result.is_err());
    }

    #[test]
    fn promotion_fixture_rejects_unknown_fields() {
        let yaml = TIERED.replace("priority: 2", "priority: 2\n    colour: red");
        let result: Result<PromotionsFixture, _> = serde_norway::from_str(&yaml);

        assert!(result.is_err());
    }
}
