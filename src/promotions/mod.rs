//! Promotions
//!
//! A promotion is an immutable tree: identity, validity window, combinability settings and an
//! ordered list of rules. Rules refer back to their promotion only through [`rules::RuleId`].

use jiff::civil::DateTime;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::ids::{ProductId, PromotionCode};

pub mod rewards;
pub mod rules;
pub mod tiers;
pub mod validation;

pub use rewards::{Reward, RewardTarget};
pub use rules::{BreakpointBasis, BreakpointType, CalculationMethod, PromotionRule, RuleId};
pub use tiers::PromotionTier;
pub use validation::{PromotionValidationError, validate_promotion};

/// Promotion
#[derive(Debug, Clone)]
pub struct Promotion<'a> {
    code: PromotionCode,
    name: String,
    starts_at: DateTime,
    ends_at: Option<DateTime>,
    active: bool,
    priority: i32,
    exclusive: bool,
    combinability_group: Option<String>,
    apply_first_matching_rule_only: bool,
    excluded_products: FxHashSet<ProductId>,
    rules: SmallVec<[PromotionRule<'a>; 2]>,
}

impl<'a> Promotion<'a> {
    /// Create an active, open-ended, non-exclusive promotion with priority 0.
    pub fn new(
        code: impl Into<PromotionCode>,
        name: impl Into<String>,
        starts_at: DateTime,
        rules: impl IntoIterator<Item = PromotionRule<'a>>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            starts_at,
            ends_at: None,
            active: true,
            priority: 0,
            exclusive: false,
            combinability_group: None,
            apply_first_matching_rule_only: false,
            excluded_products: FxHashSet::default(),
            rules: rules.into_iter().collect(),
        }
    }

    /// Return a copy of this promotion ending (exclusively) at `ends_at`.
    #[must_use]
    pub fn with_ends_at(self, ends_at: DateTime) -> Self {
        Self {
            ends_at: Some(ends_at),
            ..self
        }
    }

    /// Return a copy of this promotion with the given active flag.
    #[must_use]
    pub fn with_active(self, active: bool) -> Self {
        Self { active, ..self }
    }

    /// Return a copy of this promotion with the given priority. Lower values apply first.
    #[must_use]
    pub fn with_priority(self, priority: i32) -> Self {
        Self { priority, ..self }
    }

    /// Return a copy of this promotion with the given exclusive flag.
    #[must_use]
    pub fn with_exclusive(self, exclusive: bool) -> Self {
        Self { exclusive, ..self }
    }

    /// Return a copy of this promotion in the given combinability group.
    #[must_use]
    pub fn with_combinability_group(self, group: impl Into<String>) -> Self {
        Self {
            combinability_group: Some(group.into()),
            ..self
        }
    }

    /// Return a copy of this promotion that only applies its first matching rule.
    #[must_use]
    pub fn with_first_matching_rule_only(self, first_only: bool) -> Self {
        Self {
            apply_first_matching_rule_only: first_only,
            ..self
        }
    }

    /// Return a copy of this promotion that never applies to `product`.
    #[must_use]
    pub fn with_excluded_product(mut self, product: impl Into<ProductId>) -> Self {
        self.excluded_products.insert(product.into());
        self
    }

    /// Promotion code
    pub fn code(&self) -> &PromotionCode {
        &self.code
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start of the validity window (inclusive)
    pub fn starts_at(&self) -> DateTime {
        self.starts_at
    }

    /// End of the validity window (exclusive), if any
    pub fn ends_at(&self) -> Option<DateTime> {
        self.ends_at
    }

    /// Whether the promotion is switched on
    pub fn active(&self) -> bool {
        self.active
    }

    /// Priority; lower values apply first
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether the promotion refuses to combine with any other
    pub fn exclusive(&self) -> bool {
        self.exclusive
    }

    /// Combinability group, if any
    pub fn combinability_group(&self) -> Option<&str> {
        self.combinability_group.as_deref()
    }

    /// Whether only the first matching rule applies
    pub fn apply_first_matching_rule_only(&self) -> bool {
        self.apply_first_matching_rule_only
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[PromotionRule<'a>] {
        &self.rules
    }

    /// Whether `at` falls within `[starts_at, ends_at)`.
    pub fn is_within_window(&self, at: DateTime) -> bool {
        self.starts_at <= at && self.ends_at.is_none_or(|ends_at| at < ends_at)
    }

    /// Whether the promotion is switched on and within its validity window at `at`.
    pub fn is_active_at(&self, at: DateTime) -> bool {
        self.active && self.is_within_window(at)
    }

    /// Whether `product` is excluded from this promotion's rules.
    pub fn excludes(&self, product: &ProductId) -> bool {
        self.excluded_products.contains(product)
    }

    /// Whether this promotion may be applied alongside `other`.
    ///
    /// Neither may be exclusive, and both must share a combinability group (or both have none).
    pub fn can_combine_with(&self, other: &Promotion<'_>) -> bool {
        !self.exclusive
            && !other.exclusive
            && self.combinability_group() == other.combinability_group()
    }

    /// Application order: ascending priority, then code.
    pub fn ordering_key(&self) -> (i32, &PromotionCode) {
        (self.priority, &self.code)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn promotion(code: &str) -> Promotion<'static> {
        Promotion::new(code, code, date(2024, 1, 1).at(0, 0, 0, 0), [])
    }

    #[test]
    fn validity_window_is_half_open() {
        let promotion = promotion("P").with_ends_at(date(2024, 2, 1).at(0, 0, 0, 0));

        assert!(!promotion.is_active_at(date(2023, 12, 31).at(23, 59, 59, 0)));
        assert!(promotion.is_active_at(date(2024, 1, 1).at(0, 0, 0, 0)));
        assert!(promotion.is_active_at(date(2024, 1, 31).at(23, 59, 59, 0)));
        assert!(!promotion.is_active_at(date(2024, 2, 1).at(0, 0, 0, 0)));
    }

    #[test]
    fn open_ended_promotions_never_expire() {
        let promotion = promotion("P");

        assert!(promotion.is_active_at(date(2099, 1, 1).at(0, 0, 0, 0)));
    }

    #[test]
    fn inactive_promotions_are_never_active() {
        let promotion = promotion("P").with_active(false);

        assert!(promotion.is_within_window(date(2024, 6, 1).at(0, 0, 0, 0)));
        assert!(!promotion.is_active_at(date(2024, 6, 1).at(0, 0, 0, 0)));
    }

    #[test]
    fn combinability_requires_matching_groups_and_no_exclusivity() {
        let a = promotion("A");
        let b = promotion("B");
        let c = promotion("C").with_combinability_group("seasonal");
        let d = promotion("D").with_combinability_group("seasonal");
        let x = promotion("X").with_exclusive(true);

        assert!(a.can_combine_with(&b));
        assert!(!a.can_combine_with(&c));
        assert!(c.can_combine_with(&d));
        assert!(!x.can_combine_with(&a));
        assert!(!a.can_combine_with(&x));
    }

    #[test]
    fn exclusions_match_products() {
        let promotion = promotion("P").with_excluded_product("gift-card");

        assert!(promotion.excludes(&ProductId::from("gift-card")));
        assert!(!promotion.excludes(&ProductId::from("coffee")));
    }
}
