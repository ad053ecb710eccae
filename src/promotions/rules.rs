//! Promotion Rules

use std::{fmt, num::NonZeroU32};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    conditions::{Condition, ConditionEvaluator, ConditionLogic, EvaluationContext},
    ids::PromotionCode,
};

use super::tiers::PromotionTier;

/// How met tiers turn into rewards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Only the highest met tier rewards.
    #[default]
    Bracket,

    /// Every met tier rewards, and the rewards are summed.
    Cumulative,
}

/// What a rule's tiers are measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakpointType {
    /// Value of the eligible lines, in major currency units
    #[default]
    Amount,

    /// Unconsumed units on the eligible lines
    Quantity,

    /// SKU points of the eligible lines
    SkuPoints,
}

/// Which line value amount breakpoints and monetary rewards use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakpointBasis {
    /// Line totals before any discount
    #[default]
    OriginalPrice,

    /// Line totals after the discounts applied so far
    CurrentPrice,
}

/// Identifies a rule within the catalog: its promotion's code and its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId {
    /// Code of the owning promotion
    pub promotion: PromotionCode,

    /// Position of the rule within the promotion
    pub index: usize,
}

impl RuleId {
    /// Create a new rule identifier.
    pub fn new(promotion: PromotionCode, index: usize) -> Self {
        Self { promotion, index }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.promotion, self.index)
    }
}

/// A rule: conditions to meet, and tiers of rewards measured against a breakpoint.
#[derive(Debug, Clone)]
pub struct PromotionRule<'a> {
    name: String,
    condition_logic: ConditionLogic,
    conditions: SmallVec<[Condition<'a>; 2]>,
    calculation_method: CalculationMethod,
    breakpoint_type: BreakpointType,
    breakpoint_basis: BreakpointBasis,
    repetition: Option<NonZeroU32>,
    tiers: SmallVec<[PromotionTier<'a>; 4]>,
}

impl<'a> PromotionRule<'a> {
    /// Create an unconditional bracket rule over the original order amount.
    ///
    /// Tiers are sorted by ascending threshold, keeping declaration order for equal thresholds.
    pub fn new(name: impl Into<String>, tiers: impl IntoIterator<Item = PromotionTier<'a>>) -> Self {
        let mut tiers: SmallVec<[PromotionTier<'a>; 4]> = tiers.into_iter().collect();

        tiers.sort_by_key(PromotionTier::minimum_threshold);

        Self {
            name: name.into(),
            condition_logic: ConditionLogic::All,
            conditions: SmallVec::new(),
            calculation_method: CalculationMethod::Bracket,
            breakpoint_type: BreakpointType::Amount,
            breakpoint_basis: BreakpointBasis::OriginalPrice,
            repetition: None,
            tiers,
        }
    }

    /// Return a copy of this rule with the given conditions and logic.
    #[must_use]
    pub fn with_conditions(
        self,
        logic: ConditionLogic,
        conditions: impl IntoIterator<Item = Condition<'a>>,
    ) -> Self {
        Self {
            condition_logic: logic,
            conditions: conditions.into_iter().collect(),
            ..self
        }
    }

    /// Return a copy of this rule using the given calculation method.
    #[must_use]
    pub fn with_calculation_method(self, calculation_method: CalculationMethod) -> Self {
        Self {
            calculation_method,
            ..self
        }
    }

    /// Return a copy of this rule measuring the given breakpoint.
    #[must_use]
    pub fn with_breakpoint(self, breakpoint_type: BreakpointType, basis: BreakpointBasis) -> Self {
        Self {
            breakpoint_type,
            breakpoint_basis: basis,
            ..self
        }
    }

    /// Return a copy of this rule granting at most `repetition` tier rewards per order.
    #[must_use]
    pub fn with_repetition(self, repetition: NonZeroU32) -> Self {
        Self {
            repetition: Some(repetition),
            ..self
        }
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the conditions are combined
    pub fn condition_logic(&self) -> ConditionLogic {
        self.condition_logic
    }

    /// Conditions of the rule
    pub fn conditions(&self) -> &[Condition<'a>] {
        &self.conditions
    }

    /// Calculation method
    pub fn calculation_method(&self) -> CalculationMethod {
        self.calculation_method
    }

    /// Breakpoint type
    pub fn breakpoint_type(&self) -> BreakpointType {
        self.breakpoint_type
    }

    /// Breakpoint basis
    pub fn breakpoint_basis(&self) -> BreakpointBasis {
        self.breakpoint_basis
    }

    /// Maximum number of tier rewards per order; `None` is unbounded.
    pub fn repetition(&self) -> Option<NonZeroU32> {
        self.repetition
    }

    /// Tiers in ascending threshold order
    pub fn tiers(&self) -> &[PromotionTier<'a>] {
        &self.tiers
    }

    /// Whether the rule's conditions hold.
    pub fn conditions_hold(&self, context: &EvaluationContext<'_>) -> bool {
        ConditionEvaluator::evaluate(&self.conditions, self.condition_logic, context)
    }

    /// Tiers met by `breakpoint`, in ascending threshold order.
    ///
    /// Bracket rules yield at most the single highest met tier; among equal thresholds the one
    /// declared last wins. Cumulative rules yield every met tier.
    pub fn applicable_tiers(&self, breakpoint: Decimal) -> SmallVec<[&PromotionTier<'a>; 4]> {
        let mut met = self.tiers.iter().filter(|tier| tier.is_met_by(breakpoint));

        match self.calculation_method {
            CalculationMethod::Bracket => met.next_back().into_iter().collect(),
            CalculationMethod::Cumulative => met.collect(),
        }
    }
}
