//! Promotion Conditions
//!
//! Predicates a promotion rule tests against the order, the customer and the calculation time.
//! Conditions are pure: everything they need arrives through an [`EvaluationContext`]. Anything
//! that cannot be evaluated (missing customer data, unknown condition kinds, operators that make
//! no sense for the condition) evaluates to `false`, so a malformed condition disables its rule
//! rather than failing the calculation.

use std::cmp::Ordering;

use jiff::civil::{DateTime, Time, Weekday};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    customers::CustomerContext,
    ids::{FamilyId, GroupId, PaymentMethod, ProductId},
    orders::Order,
};

pub mod evaluator;

pub use evaluator::{ConditionEvaluator, ConditionLogic};

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal to / is
    #[serde(alias = "eq")]
    Equal,

    /// Not equal to / is not
    #[serde(alias = "ne")]
    NotEqual,

    /// Strictly greater than
    #[serde(alias = "gt")]
    GreaterThan,

    /// Greater than or equal to
    #[serde(alias = "gte")]
    GreaterThanOrEqual,

    /// Strictly less than
    #[serde(alias = "lt")]
    LessThan,

    /// Less than or equal to
    #[serde(alias = "lte")]
    LessThanOrEqual,

    /// Collection contains the value
    Contains,

    /// Collection does not contain the value
    NotContains,

    /// Value is one of a set
    In,

    /// Value is none of a set
    NotIn,
}

impl Operator {
    /// Compare an observed value with the configured one.
    ///
    /// Returns `None` for membership operators, which have no ordering meaning.
    pub fn compare<T: Ord + ?Sized>(self, actual: &T, expected: &T) -> Option<bool> {
        let ordering = actual.cmp(expected);

        match self {
            Self::Equal => Some(ordering == Ordering::Equal),
            Self::NotEqual => Some(ordering != Ordering::Equal),
            Self::GreaterThan => Some(ordering == Ordering::Greater),
            Self::GreaterThanOrEqual => Some(ordering != Ordering::Less),
            Self::LessThan => Some(ordering == Ordering::Less),
            Self::LessThanOrEqual => Some(ordering != Ordering::Greater),
            Self::Contains | Self::NotContains | Self::In | Self::NotIn => None,
        }
    }

    /// Turn a membership test into the operator's answer.
    ///
    /// `Equal`, `Contains` and `In` keep the result, their negations invert it. Returns `None`
    /// for ordering operators.
    pub fn membership(self, is_member: bool) -> Option<bool> {
        match self {
            Self::Equal | Self::Contains | Self::In => Some(is_member),
            Self::NotEqual | Self::NotContains | Self::NotIn => Some(!is_member),
            Self::GreaterThan
            | Self::GreaterThanOrEqual
            | Self::LessThan
            | Self::LessThanOrEqual => None,
        }
    }

    /// Whether this is one of the membership operators.
    pub fn is_membership(self) -> bool {
        self.membership(true).is_some()
    }
}

/// Everything a condition may look at.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    order: &'a Order<'a>,
    customer: Option<&'a CustomerContext>,
    now: DateTime,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context.
    pub fn new(order: &'a Order<'a>, customer: Option<&'a CustomerContext>, now: DateTime) -> Self {
        Self {
            order,
            customer,
            now,
        }
    }

    /// Order being priced
    pub fn order(&self) -> &'a Order<'a> {
        self.order
    }

    /// Customer attributes, if supplied
    pub fn customer(&self) -> Option<&'a CustomerContext> {
        self.customer
    }

    /// Wall-clock time of the calculation
    pub fn now(&self) -> DateTime {
        self.now
    }
}

/// A single promotion condition.
#[derive(Debug, Clone)]
pub enum Condition<'a> {
    /// Order subtotal (before discounts) compared with an amount.
    CartSubtotal {
        /// Comparison operator
        operator: Operator,

        /// Amount to compare against
        amount: Money<'a, Currency>,
    },

    /// Total number of units in the order compared with a quantity.
    CartQuantity {
        /// Comparison operator
        operator: Operator,

        /// Quantity to compare against
        quantity: u64,
    },

    /// Presence (membership operators) or quantity (ordering operators) of products.
    ProductInCart {
        /// Comparison operator
        operator: Operator,

        /// Products of interest
        products: SmallVec<[ProductId; 2]>,

        /// Quantity to compare against for ordering operators
        quantity: u64,
    },

    /// Presence or quantity of products from the given families.
    ProductFamilyInCart {
        /// Comparison operator
        operator: Operator,

        /// Families of interest
        families: SmallVec<[FamilyId; 2]>,

        /// Quantity to compare against for ordering operators
        quantity: u64,
    },

    /// Customer membership of a group.
    CustomerInGroup {
        /// Membership operator
        operator: Operator,

        /// Group of interest
        group: GroupId,
    },

    /// Customer loyalty level compared with a level.
    CustomerLoyaltyLevel {
        /// Comparison operator
        operator: Operator,

        /// Level to compare against
        level: u32,
    },

    /// Payment method membership of a set.
    PaymentMethod {
        /// Membership operator
        operator: Operator,

        /// Payment methods of interest
        methods: SmallVec<[PaymentMethod; 2]>,
    },

    /// Calculation time of day compared with a time.
    TimeOfDay {
        /// Comparison operator
        operator: Operator,

        /// Time to compare against
        time: Time,
    },

    /// Calculation weekday membership of a set of days.
    DayOfWeek {
        /// Membership operator
        operator: Operator,

        /// Days of interest
        days: SmallVec<[Weekday; 7]>,
    },

    /// A condition kind this engine does not understand. Never holds.
    Unsupported {
        /// Kind name as supplied by the catalog
        kind: String,
    },
}

impl Condition<'_> {
    /// Short name of the condition kind, for logs.
    pub fn kind(&self) -> &str {
        match self {
            Self::CartSubtotal { .. } => "cart_subtotal",
            Self::CartQuantity { .. } => "cart_quantity",
            Self::ProductInCart { .. } => "product_in_cart",
            Self::ProductFamilyInCart { .. } => "product_family_in_cart",
            Self::CustomerInGroup { .. } => "customer_in_group",
            Self::CustomerLoyaltyLevel { .. } => "customer_loyalty_level",
            Self::PaymentMethod { .. } => "payment_method",
            Self::TimeOfDay { .. } => "time_of_day",
            Self::DayOfWeek { .. } => "day_of_week",
            Self::Unsupported { kind } => kind,
        }
    }

    /// Evaluate the condition. Anything that cannot be evaluated is `false`.
    pub fn evaluate(&self, context: &EvaluationContext<'_>) -> bool {
        let outcome = self.try_evaluate(context);

        if outcome.is_none() {
            debug!(condition = self.kind(), "condition could not be evaluated");
        }

        outcome.unwrap_or(false)
    }

    fn try_evaluate(&self, context: &EvaluationContext<'_>) -> Option<bool> {
        let order = context.order();

        match self {
            Self::CartSubtotal { operator, amount } => {
                if amount.currency() != order.currency() {
                    return None;
                }

                operator.compare(
                    &order.subtotal().to_minor_units(),
                    &amount.to_minor_units(),
                )
            }
            Self::CartQuantity { operator, quantity } => {
                operator.compare(&order.total_quantity(), quantity)
            }
            Self::ProductInCart {
                operator,
                products,
                quantity,
            } => {
                let in_cart = order.quantity_of_products(products);

                quantity_or_presence(*operator, in_cart, *quantity)
            }
            Self::ProductFamilyInCart {
                operator,
                families,
                quantity,
            } => {
                let in_cart = order.quantity_of_families(families);

                quantity_or_presence(*operator, in_cart, *quantity)
            }
            Self::CustomerInGroup { operator, group } => {
                let customer = context.customer()?;

                operator.membership(customer.in_group(group))
            }
            Self::CustomerLoyaltyLevel { operator, level } => {
                let actual = context.customer()?.loyalty_level()?;

                operator.compare(&actual, level)
            }
            Self::PaymentMethod { operator, methods } => {
                let method = context.customer()?.payment_method()?;

                operator.membership(methods.contains(method))
            }
            Self::TimeOfDay { operator, time } => operator.compare(&context.now().time(), time),
            Self::DayOfWeek { operator, days } => {
                operator.membership(days.contains(&context.now().weekday()))
            }
            Self::Unsupported { .. } => None,
        }
    }
}

/// Membership operators test for any units at all, ordering operators compare the quantity.
fn quantity_or_presence(operator: Operator, in_cart: u64, quantity: u64) -> Option<bool> {
    if operator.is_membership() {
        operator.membership(in_cart > 0 && in_cart >= quantity)
    } else {
        operator.compare(&in_cart, &quantity)
    }
}
