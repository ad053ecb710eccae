//! Condition Fixtures

use jiff::civil::{Time, Weekday};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    conditions::{Condition, Operator},
    fixtures::{FixtureError, prices::parse_money},
    ids::{FamilyId, GroupId, PaymentMethod, ProductId},
};

/// Condition configuration from YAML fixtures.
///
/// Kinds this crate does not know are kept as [`Condition::Unsupported`] and never hold.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionFixture {
    /// Condition kind (e.g. `cart_subtotal`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Comparison operator; each kind has a default
    #[serde(default)]
    pub operator: Option<Operator>,

    /// Price string for `cart_subtotal`
    #[serde(default)]
    pub amount: Option<String>,

    /// Unit count for quantity kinds
    #[serde(default)]
    pub quantity: Option<u64>,

    /// Products for `product_in_cart`
    #[serde(default)]
    pub products: Vec<String>,

    /// Families for `product_family_in_cart`
    #[serde(default)]
    pub families: Vec<String>,

    /// Group for `customer_in_group`
    #[serde(default)]
    pub group: Option<String>,

    /// Level for `customer_loyalty_level`
    #[serde(default)]
    pub level: Option<u32>,

    /// Methods for `payment_method`
    #[serde(default)]
    pub methods: Vec<String>,

    /// Time for `time_of_day` (e.g. "14:00")
    #[serde(default)]
    pub time: Option<Time>,

    /// Days for `day_of_week` (e.g. "monday" or "mon")
    #[serde(default)]
    pub days: Vec<String>,
}

impl TryFrom<ConditionFixture> for Condition<'static> {
    type Error = FixtureError;

    fn try_from(fixture: ConditionFixture) -> Result<Self, Self::Error> {
        let ConditionFixture {
            kind,
            operator,
            amount,
            quantity,
            products,
            families,
            group,
            level,
            methods,
            time,
            days,
        } = fixture;

        let at_least = operator.unwrap_or(Operator::GreaterThanOrEqual);
        let member = operator.unwrap_or(Operator::In);

        Ok(match kind.as_str() {
            "cart_subtotal" => Condition::CartSubtotal {
                operator: at_least,
                amount: parse_money(&required(amount, &kind, "amount")?)?,
            },
            "cart_quantity" => Condition::CartQuantity {
                operator: at_least,
                quantity: required(quantity, &kind, "quantity")?,
            },
            "product_in_cart" => Condition::ProductInCart {
                operator: member,
                products: non_empty(products, &kind, "products")?
                    .into_iter()
                    .map(ProductId::from)
                    .collect(),
                quantity: quantity.unwrap_or(1),
            },
            "product_family_in_cart" => Condition::ProductFamilyInCart {
                operator: member,
                families: non_empty(families, &kind, "families")?
                    .into_iter()
                    .map(FamilyId::from)
                    .collect(),
                quantity: quantity.unwrap_or(1),
            },
            "customer_in_group" => Condition::CustomerInGroup {
                operator: member,
                group: GroupId::from(required(group, &kind, "group")?),
            },
            "customer_loyalty_level" => Condition::CustomerLoyaltyLevel {
                operator: at_least,
                level: required(level, &kind, "level")?,
            },
            "payment_method" => Condition::PaymentMethod {
                operator: member,
                methods: non_empty(methods, &kind, "methods")?
                    .into_iter()
                    .map(PaymentMethod::from)
                    .collect(),
            },
            "time_of_day" => Condition::TimeOfDay {
                operator: at_least,
                time: required(time, &kind, "time")?,
            },
            "day_of_week" => Condition::DayOfWeek {
                operator: member,
                days: non_empty(days, &kind, "days")?
                    .iter()
                    .map(|day| parse_weekday(day))
                    .collect::<Result<SmallVec<_>, _>>()?,
            },
            _ => Condition::Unsupported { kind },
        })
    }
}

fn required<T>(value: Option<T>, kind: &str, field: &str) -> Result<T, FixtureError> {
    value.ok_or_else(|| FixtureError::InvalidPromotionData(format!("{kind} condition needs `{field}`")))
}

fn non_empty(values: Vec<String>, kind: &str, field: &str) -> Result<Vec<String>, FixtureError> {
    if values.is_empty() {
        return Err(FixtureError::InvalidPromotionData(format!(
            "{kind} condition needs at least one entry in `{field}`"
        )));
    }

    Ok(values)
}

fn parse_weekday(day: &str) -> Result<Weekday, FixtureError> {
    Ok(match day.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Weekday::Monday,
        "tuesday" | "tue" => Weekday::Tuesday,
        "wednesday" | "wed" => Weekday::Wednesday,
        "thursday" | "thu" => Weekday::Thursday,
        "friday" | "fri" => Weekday::Friday,
        "saturday" | "sat" => Weekday::Saturday,
        "sunday" | "sun" => Weekday::Sunday,
        _ => {
            return Err(FixtureError::InvalidPromotionData(format!(
                "unknown day of week: {day}"
            )));
        }
    })
}
