//! Promotion Context
//!
//! All mutable state of one calculation. Created per request from an order, cloned for dry runs,
//! and rendered into a breakdown at the end. Nothing in here outlives the calculation.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    ids::{ProductId, PromotionCode},
    orders::{Order, OrderError},
    promotions::RuleId,
};

pub mod items;

pub use items::OrderItemContext;

new_key_type! {
    /// Order line key
    pub struct LineKey;
}

/// A defect detected while applying rewards. Aborts the calculation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A discount would take a line below zero.
    #[error("discount of {amount} on {product} exceeds the remaining line total of {remaining}")]
    DiscountExceedsLine {
        /// Product of the line
        product: ProductId,

        /// Requested discount, in minor units
        amount: i64,

        /// Line total left, in minor units
        remaining: i64,
    },

    /// A negative discount was requested.
    #[error("negative discount of {amount} on {product}")]
    NegativeDiscount {
        /// Product of the line
        product: ProductId,

        /// Requested discount, in minor units
        amount: i64,
    },

    /// More units were consumed than the line has left.
    #[error("cannot consume {requested} units of {product}, only {available} available")]
    QuantityOverConsumed {
        /// Product of the line
        product: ProductId,

        /// Units requested
        requested: u32,

        /// Units left
        available: u32,
    },

    /// Allocated shares do not add up to the discount being allocated.
    #[error("allocated {allocated} minor units of a {expected} discount")]
    AllocationMismatch {
        /// Discount being allocated, in minor units
        expected: i64,

        /// Sum of the allocated shares, in minor units
        allocated: i64,
    },

    /// A line key does not belong to this context.
    #[error("unknown order line")]
    UnknownLine,

    /// A rule position does not exist on its promotion.
    #[error("rule {0} does not exist")]
    UnknownRule(RuleId),

    /// A running total left the representable range.
    #[error("running total overflowed")]
    Overflow,
}

/// Units of a product given away, and the promotions that gave them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeItemGrant {
    /// Product given away
    pub product: ProductId,

    /// Display name of the product
    pub name: String,

    /// Units given away
    pub quantity: u64,

    /// Codes of the granting promotions, in grant order
    pub promotions: SmallVec<[PromotionCode; 2]>,
}

/// Discount ledger entry of one applied promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromotion {
    /// Promotion code
    pub code: PromotionCode,

    /// Promotion name
    pub name: String,

    /// Discount taken off the order, in minor units
    pub discount_minor: i64,
}

/// Order-level rewards that do not change line prices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Benefits {
    /// Whether shipping is free
    pub free_shipping: bool,

    /// Loyalty points credited
    pub loyalty_points: u64,

    /// Gift card value issued, in minor units
    pub gift_card_minor: i64,

    /// Cashback owed, in minor units
    pub cashback_minor: i64,

    /// Codes of the granting promotions, in grant order
    pub promotions: SmallVec<[PromotionCode; 2]>,
}

impl Benefits {
    /// Whether no benefit has been granted.
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }

    /// Attribute a grant to `code`.
    pub fn record(&mut self, code: &PromotionCode) {
        if !self.promotions.contains(code) {
            self.promotions.push(code.clone());
        }
    }
}

/// Promotion Context
#[derive(Debug, Clone)]
pub struct PromotionContext<'a> {
    currency: &'static Currency,
    lines: SlotMap<LineKey, OrderItemContext<'a>>,
    free_items: SmallVec<[FreeItemGrant; 2]>,
    applied: SmallVec<[AppliedPromotion; 4]>,
    rule_grants: FxHashMap<RuleId, u32>,
    benefits: Benefits,
    original_minor: i64,
    discount_minor: i64,
}

impl<'a> PromotionContext<'a> {
    /// Create a fresh context for `order`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::TotalOverflow`] if a line total does not fit in minor units.
    pub fn new(order: &'a Order<'a>) -> Result<Self, OrderError> {
        let mut lines = SlotMap::with_capacity_and_key(order.len());
        let mut original_minor = 0_i64;

        for (idx, line) in order.iter().enumerate() {
            let item = OrderItemContext::new(line).ok_or(OrderError::TotalOverflow(idx))?;

            original_minor = original_minor
                .checked_add(item.original_minor())
                .ok_or(OrderError::TotalOverflow(idx))?;

            lines.insert(item);
        }

        Ok(Self {
            currency: order.currency(),
            lines,
            free_items: SmallVec::new(),
            applied: SmallVec::new(),
            rule_grants: FxHashMap::default(),
            benefits: Benefits::default(),
            original_minor,
            discount_minor: 0,
        })
    }

    /// Currency of every amount in the context
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Line contexts in order line order.
    pub fn lines(&self) -> impl Iterator<Item = (LineKey, &OrderItemContext<'a>)> {
        self.lines.iter()
    }

    /// Look up a line context.
    pub fn line(&self, key: LineKey) -> Option<&OrderItemContext<'a>> {
        self.lines.get(key)
    }

    /// Free-item ledger, in first-grant order
    pub fn free_items(&self) -> &[FreeItemGrant] {
        &self.free_items
    }

    /// Applied-promotion ledger, in application order
    pub fn applied_promotions(&self) -> &[AppliedPromotion] {
        &self.applied
    }

    /// Order-level benefits
    pub fn benefits(&self) -> &Benefits {
        &self.benefits
    }

    /// Order total before discounts, in minor units
    pub fn original_minor(&self) -> i64 {
        self.original_minor
    }

    /// Discount applied so far, in minor units
    pub fn discount_minor(&self) -> i64 {
        self.discount_minor
    }

    /// Order total after the discounts applied so far, in minor units
    pub fn final_minor(&self) -> i64 {
        self.original_minor - self.discount_minor
    }

    /// Order total before discounts
    pub fn original_total(&self) -> Money<'static, Currency> {
        Money::from_minor(self.original_minor, self.currency)
    }

    /// Discount applied so far
    pub fn total_discount(&self) -> Money<'static, Currency> {
        Money::from_minor(self.discount_minor, self.currency)
    }

    /// Order total after the discounts applied so far
    pub fn final_total(&self) -> Money<'static, Currency> {
        Money::from_minor(self.final_minor(), self.currency)
    }

    /// Tier rewards granted so far by `rule`.
    pub fn rule_grants(&self, rule: &RuleId) -> u32 {
        self.rule_grants.get(rule).copied().unwrap_or(0)
    }

    /// Count `grants` more tier rewards against `rule`.
    pub fn record_rule_grants(&mut self, rule: &RuleId, grants: u32) {
        let count = self.rule_grants.entry(rule.clone()).or_insert(0);
        *count = count.saturating_add(grants);
    }

    /// Take `amount` minor units off a line on behalf of `code`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if the key is unknown or the line rejects the discount.
    pub fn apply_line_discount(
        &mut self,
        key: LineKey,
        amount: i64,
        code: &PromotionCode,
    ) -> Result<(), InvariantViolation> {
        let item = self.lines.get_mut(key).ok_or(InvariantViolation::UnknownLine)?;

        let discount_minor = self
            .discount_minor
            .checked_add(amount)
            .ok_or(InvariantViolation::Overflow)?;

        item.apply_discount(amount, code)?;

        self.discount_minor = discount_minor;

        Ok(())
    }

    /// Mark `quantity` units of a line as used.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if the key is unknown or too few units are left.
    pub fn consume_quantity(
        &mut self,
        key: LineKey,
        quantity: u32,
    ) -> Result<(), InvariantViolation> {
        self.lines
            .get_mut(key)
            .ok_or(InvariantViolation::UnknownLine)?
            .consume_quantity(quantity)
    }

    /// Add `quantity` free units of `product` to the ledger, granted by `code`.
    pub fn grant_free_item(
        &mut self,
        product: &ProductId,
        name: &str,
        quantity: u32,
        code: &PromotionCode,
    ) {
        let quantity = u64::from(quantity);

        if let Some(grant) = self.free_items.iter_mut().find(|g| &g.product == product) {
            grant.quantity = grant.quantity.saturating_add(quantity);

            if !grant.promotions.contains(code) {
                grant.promotions.push(code.clone());
            }

            return;
        }

        let mut promotions = SmallVec::new();
        promotions.push(code.clone());

        self.free_items.push(FreeItemGrant {
            product: product.clone(),
            name: name.to_string(),
            quantity,
            promotions,
        });
    }

    /// Mutable access to the benefits ledger.
    pub fn benefits_mut(&mut self) -> &mut Benefits {
        &mut self.benefits
    }

    /// Add `discount_minor` to the ledger entry of promotion `code`.
    pub fn record_promotion(&mut self, code: &PromotionCode, name: &str, discount_minor: i64) {
        if let Some(entry) = self.applied.iter_mut().find(|entry| &entry.code == code) {
            entry.discount_minor = entry.discount_minor.saturating_add(discount_minor);
            return;
        }

        self.applied.push(AppliedPromotion {
            code: code.clone(),
            name: name.to_string(),
            discount_minor,
        });
    }
}
