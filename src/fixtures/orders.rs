//! Order Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, prices::parse_money},
    orders::{Order, OrderLine},
};

/// Wrapper for an order in YAML
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Order lines, in order
    pub lines: Vec<OrderLineFixture>,
}

/// Order Line Fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderLineFixture {
    /// Product identifier
    pub product: String,

    /// Display name
    pub name: String,

    /// Product family
    #[serde(default)]
    pub family: Option<String>,

    /// Unit price (e.g., "2.99 GBP")
    pub price: String,

    /// Units ordered
    pub quantity: u32,

    /// SKU points per unit
    #[serde(default)]
    pub sku_points: Decimal,
}

impl TryFrom<OrderLineFixture> for OrderLine<'static> {
    type Error = FixtureError;

    fn try_from(fixture: OrderLineFixture) -> Result<Self, Self::Error> {
        let line = OrderLine::new(
            fixture.product,
            fixture.name,
            parse_money(&fixture.price)?,
            fixture.quantity,
        )
        .with_sku_points(fixture.sku_points);

        Ok(match fixture.family {
            Some(family) => line.with_family(family),
            None => line,
        })
    }
}

impl TryFrom<OrderFixture> for Order<'static> {
    type Error = FixtureError;

    fn try_from(fixture: OrderFixture) -> Result<Self, Self::Error> {
        let lines = fixture
            .lines
            .into_iter()
            .map(OrderLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let currency = lines
            .first()
            .map(|line| line.unit_price().currency())
            .ok_or(FixtureError::NoLines)?;

        Ok(Order::with_lines(lines, currency)?)
    }
}
