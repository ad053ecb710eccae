//! Order Item Context

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{ids::PromotionCode, orders::OrderLine};

use super::InvariantViolation;

/// Mutable pricing state of one order line during a calculation.
#[derive(Debug, Clone)]
pub struct OrderItemContext<'a> {
    line: &'a OrderLine<'a>,
    original_minor: i64,
    discount_minor: i64,
    applied_promotions: SmallVec<[PromotionCode; 2]>,
    consumed_quantity: u32,
}

impl<'a> OrderItemContext<'a> {
    /// Wrap an order line with no discount applied.
    ///
    /// Returns `None` if the line total overflows.
    pub fn new(line: &'a OrderLine<'a>) -> Option<Self> {
        Some(Self {
            line,
            original_minor: line.total_minor()?,
            discount_minor: 0,
            applied_promotions: SmallVec::new(),
            consumed_quantity: 0,
        })
    }

    /// Underlying order line
    pub fn line(&self) -> &'a OrderLine<'a> {
        self.line
    }

    /// Line total before discounts, in minor units
    pub fn original_minor(&self) -> i64 {
        self.original_minor
    }

    /// Discount applied so far, in minor units
    pub fn discount_minor(&self) -> i64 {
        self.discount_minor
    }

    /// Line total after the discounts applied so far, in minor units
    pub fn current_minor(&self) -> i64 {
        self.original_minor - self.discount_minor
    }

    /// Line total before discounts
    pub fn original_total(&self) -> Money<'a, Currency> {
        Money::from_minor(self.original_minor, self.line.unit_price().currency())
    }

    /// Line total after the discounts applied so far
    pub fn current_total(&self) -> Money<'a, Currency> {
        Money::from_minor(self.current_minor(), self.line.unit_price().currency())
    }

    /// Codes of the promotions that discounted this line, in application order
    pub fn applied_promotions(&self) -> &[PromotionCode] {
        &self.applied_promotions
    }

    /// The promotion that discounted this line last, if any
    pub fn last_applied_promotion(&self) -> Option<&PromotionCode> {
        self.applied_promotions.last()
    }

    /// Units already used to trigger a reward
    pub fn consumed_quantity(&self) -> u32 {
        self.consumed_quantity
    }

    /// Units not yet used to trigger a reward
    pub fn available_quantity(&self) -> u32 {
        self.line.quantity() - self.consumed_quantity
    }

    /// Take `amount` minor units off the line on behalf of `code`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if `amount` is negative or exceeds what is left of the
    /// line total. The line is left untouched in that case.
    pub fn apply_discount(
        &mut self,
        amount: i64,
        code: &PromotionCode,
    ) -> Result<(), InvariantViolation> {
        if amount < 0 {
            return Err(InvariantViolation::NegativeDiscount {
                product: self.line.product().clone(),
                amount,
            });
        }

        let remaining = self.current_minor();

        if amount > remaining {
            return Err(InvariantViolation::DiscountExceedsLine {
                product: self.line.product().clone(),
                amount,
                remaining,
            });
        }

        self.discount_minor += amount;

        if self.applied_promotions.last() != Some(code) {
            self.applied_promotions.push(code.clone());
        }

        Ok(())
    }

    /// Mark `quantity` units as used.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantViolation`] if fewer than `quantity` units are available.
    pub fn consume_quantity(&mut self, quantity: u32) -> Result<(), InvariantViolation> {
        let available = self.available_quantity();

        if quantity > available {
            return Err(InvariantViolation::QuantityOverConsumed {
                product: self.line.product().clone(),
                requested: quantity,
                available,
            });
        }

        self.consumed_quantity += quantity;

        Ok(())
    }
}
