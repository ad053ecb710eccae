//! Orders
//!
//! The immutable order snapshot priced by the engine.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::ids::{FamilyId, ProductId};

pub mod lines;

pub use lines::OrderLine;

/// Errors raised while validating an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The order has no lines.
    #[error("order has no lines")]
    Empty,

    /// A line's currency differs from the order currency (index, line currency, order currency).
    #[error("Line {0} has currency {1}, but order has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A line has a negative unit price.
    #[error("line {0} has a negative unit price")]
    NegativePrice(usize),

    /// A line has negative SKU points.
    #[error("line {0} has negative SKU points")]
    NegativeSkuPoints(usize),

    /// A line total (or the order total) does not fit in minor units.
    #[error("line {0} total overflows")]
    TotalOverflow(usize),

    /// A line's SKU points (or the order's) do not fit in a decimal.
    #[error("line {0} SKU points overflow")]
    SkuPointsOverflow(usize),
}

/// Order
#[derive(Debug, Clone)]
pub struct Order<'a> {
    lines: Vec<OrderLine<'a>>,
    currency: &'static Currency,
    subtotal_minor: i64,
}

impl<'a> Order<'a> {
    /// Create a validated order from its lines.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] if the order is empty, mixes currencies, has negative prices or
    /// SKU points, or if a price or SKU point total overflows.
    pub fn with_lines(
        lines: impl Into<Vec<OrderLine<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, OrderError> {
        let lines = lines.into();

        if lines.is_empty() {
            return Err(OrderError::Empty);
        }

        let mut subtotal_minor = 0_i64;
        let mut sku_points = Decimal::ZERO;

        for (idx, line) in lines.iter().enumerate() {
            let line_currency = line.unit_price().currency();

            if line_currency != currency {
                return Err(OrderError::CurrencyMismatch(
                    idx,
                    line_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if line.unit_price().to_minor_units() < 0 {
                return Err(OrderError::NegativePrice(idx));
            }

            if line.sku_points().is_sign_negative() && !line.sku_points().is_zero() {
                return Err(OrderError::NegativeSkuPoints(idx));
            }

            let total = line.total_minor().ok_or(OrderError::TotalOverflow(idx))?;

            subtotal_minor = subtotal_minor
                .checked_add(total)
                .ok_or(OrderError::TotalOverflow(idx))?;

            sku_points = line
                .total_sku_points()
                .and_then(|points| sku_points.checked_add(points))
                .ok_or(OrderError::SkuPointsOverflow(idx))?;
        }

        Ok(Self {
            lines,
            currency,
            subtotal_minor,
        })
    }

    /// Iterate over the order lines in order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderLine<'a>> {
        self.lines.iter()
    }

    /// Order lines as a slice.
    pub fn lines(&self) -> &[OrderLine<'a>] {
        &self.lines
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false for a validated order; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the order.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Sum of all line totals before any discount.
    pub fn subtotal(&self) -> Money<'static, Currency> {
        Money::from_minor(self.subtotal_minor, self.currency)
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Number of units of any of the given products.
    pub fn quantity_of_products(&self, products: &[ProductId]) -> u64 {
        self.lines
            .iter()
            .filter(|line| products.contains(line.product()))
            .map(|line| u64::from(line.quantity()))
            .sum()
    }

    /// Number of units belonging to any of the given families.
    pub fn quantity_of_families(&self, families: &[FamilyId]) -> u64 {
        self.lines
            .iter()
            .filter(|line| line.family().is_some_and(|family| families.contains(family)))
            .map(|line| u64::from(line.quantity()))
            .sum()
    }
}
