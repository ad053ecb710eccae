//! Order Lines

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::ids::{FamilyId, ProductId};

/// A single priced line of an order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderLine<'a> {
    product: ProductId,
    family: Option<FamilyId>,
    name: String,
    unit_price: Money<'a, Currency>,
    quantity: u32,
    sku_points: Decimal,
}

impl<'a> OrderLine<'a> {
    /// Create a new line with no family and zero SKU points.
    pub fn new(
        product: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        Self {
            product: product.into(),
            family: None,
            name: name.into(),
            unit_price,
            quantity,
            sku_points: Decimal::ZERO,
        }
    }

    /// Return a copy of this line in the given product family.
    #[must_use]
    pub fn with_family(self, family: impl Into<FamilyId>) -> Self {
        Self {
            family: Some(family.into()),
            ..self
        }
    }

    /// Return a copy of this line with the given per-unit SKU points.
    #[must_use]
    pub fn with_sku_points(self, sku_points: Decimal) -> Self {
        Self { sku_points, ..self }
    }

    /// Product of the line
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Product family of the line, if known
    pub fn family(&self) -> Option<&FamilyId> {
        self.family.as_ref()
    }

    /// Display name of the product
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of a single unit
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Number of units
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// SKU points of a single unit
    pub fn sku_points(&self) -> Decimal {
        self.sku_points
    }

    /// SKU points of the whole line, or `None` on overflow.
    pub fn total_sku_points(&self) -> Option<Decimal> {
        self.sku_points.checked_mul(Decimal::from(self.quantity))
    }

    /// Unit price times quantity in minor units, or `None` on overflow.
    pub fn total_minor(&self) -> Option<i64> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
    }
}
