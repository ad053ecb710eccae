//! Breakdown
//!
//! The result of a calculation: per-line prices, free items, order-level benefits and an
//! auditable ledger of applied and skipped promotions. Serializes to JSON with every amount as a
//! decimal string in the order currency.

use rusty_money::{Money, iso::Currency};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::{
    context::PromotionContext,
    discounts::minor_to_major,
    engine::SkippedPromotion,
    ids::{ProductId, PromotionCode},
};

pub mod table;

/// Errors rendering a breakdown.
#[derive(Debug, Error)]
pub enum BreakdownError {
    /// JSON serialization failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One order line after promotions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBreakdown {
    /// Product of the line
    pub product: ProductId,

    /// Display name
    pub name: String,

    /// Units on the line
    pub quantity: u32,

    /// Line total before discounts
    #[serde(serialize_with = "serialize_money")]
    pub original_price: Money<'static, Currency>,

    /// Discount taken off the line
    #[serde(serialize_with = "serialize_money")]
    pub total_discount: Money<'static, Currency>,

    /// Line total after discounts
    #[serde(serialize_with = "serialize_money")]
    pub final_price: Money<'static, Currency>,

    /// Promotions that discounted the line, in application order
    pub applied_promotion_codes: Vec<PromotionCode>,
}

/// A free item granted by one or more promotions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeItem {
    /// Product given away
    pub product: ProductId,

    /// Display name
    pub name: String,

    /// Units given away
    pub quantity: u64,

    /// Which promotions granted it
    pub reason: String,
}

/// A promotion that was applied, and what it was worth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedPromotionSummary {
    /// Promotion code
    pub code: PromotionCode,

    /// Display name
    pub name: String,

    /// Discount taken off the order
    #[serde(serialize_with = "serialize_money")]
    pub discount: Money<'static, Currency>,
}

/// Order-level benefits that do not reduce line prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenefitsSummary {
    /// Shipping is free
    pub free_shipping: bool,

    /// Loyalty points earned
    pub loyalty_points: u64,

    /// Gift card value issued
    #[serde(serialize_with = "serialize_money")]
    pub gift_card: Money<'static, Currency>,

    /// Cashback earned
    #[serde(serialize_with = "serialize_money")]
    pub cashback: Money<'static, Currency>,

    /// Promotions that granted any of the above
    pub promotions: Vec<PromotionCode>,
}

/// Breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    /// ISO code of the order currency
    pub currency: &'static str,

    /// Order total before discounts
    #[serde(serialize_with = "serialize_money")]
    pub original_total: Money<'static, Currency>,

    /// Sum of all line discounts
    #[serde(serialize_with = "serialize_money")]
    pub discount_total: Money<'static, Currency>,

    /// Order total after discounts
    #[serde(serialize_with = "serialize_money")]
    pub final_total: Money<'static, Currency>,

    /// Lines in order line order
    pub lines: Vec<LineBreakdown>,

    /// Free items, in first-grant order
    pub free_items: Vec<FreeItem>,

    /// Applied promotions, in application order
    pub applied_promotions: Vec<AppliedPromotionSummary>,

    /// Order-level benefits
    pub benefits: BenefitsSummary,

    /// Promotions that were considered but not applied
    pub skipped: Vec<SkippedPromotion>,
}

impl Breakdown {
    /// Render the final state of a calculation.
    pub fn render(context: &PromotionContext<'_>, skipped: Vec<SkippedPromotion>) -> Self {
        let currency = context.currency();
        let money = |minor: i64| Money::from_minor(minor, currency);

        let lines = context
            .lines()
            .map(|(_, item)| LineBreakdown {
                product: item.line().product().clone(),
                name: item.line().name().to_string(),
                quantity: item.line().quantity(),
                original_price: money(item.original_minor()),
                total_discount: money(item.discount_minor()),
                final_price: money(item.current_minor()),
                applied_promotion_codes: item.applied_promotions().to_vec(),
            })
            .collect();

        let free_items = context
            .free_items()
            .iter()
            .map(|grant| FreeItem {
                product: grant.product.clone(),
                name: grant.name.clone(),
                quantity: grant.quantity,
                reason: join_codes(&grant.promotions),
            })
            .collect();

        let applied_promotions = context
            .applied_promotions()
            .iter()
            .map(|applied| AppliedPromotionSummary {
                code: applied.code.clone(),
                name: applied.name.clone(),
                discount: money(applied.discount_minor),
            })
            .collect();

        let benefits = context.benefits();

        Self {
            currency: currency.iso_alpha_code,
            original_total: context.original_total(),
            discount_total: context.total_discount(),
            final_total: context.final_total(),
            lines,
            free_items,
            applied_promotions,
            benefits: BenefitsSummary {
                free_shipping: benefits.free_shipping,
                loyalty_points: benefits.loyalty_points,
                gift_card: money(benefits.gift_card_minor),
                cashback: money(benefits.cashback_minor),
                promotions: benefits.promotions.to_vec(),
            },
            skipped,
        }
    }

    /// Whether no promotion changed anything.
    pub fn is_empty(&self) -> bool {
        self.applied_promotions.is_empty()
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BreakdownError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, BreakdownError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn join_codes(codes: &[PromotionCode]) -> String {
    codes
        .iter()
        .map(PromotionCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn serialize_money<S: Serializer>(
    money: &Money<'static, Currency>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&minor_to_major(money.to_minor_units(), money.currency()))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        engine::SkipReason,
        orders::{Order, OrderLine},
    };

    use super::*;

    fn order<'a>() -> Result<Order<'a>, crate::orders::OrderError> {
        Order::with_lines(
            [
                OrderLine::new("A", "Product A", Money::from_minor(1000, USD), 2),
                OrderLine::new("B", "Product B", Money::from_minor(1500, USD), 3),
            ],
            USD,
        )
    }

    #[test]
    fn render_reflects_context_state() -> TestResult {
        let order = order()?;
        let mut context = PromotionContext::new(&order)?;
        let code = PromotionCode::from("TEN");

        let (key, _) = context.lines().next().ok_or("no lines")?;
        context.apply_line_discount(key, 250, &code)?;
        context.record_promotion(&code, "Ten off", 250);
        context.grant_free_item(&ProductId::from("G"), "Gift", 1, &code);

        let breakdown = Breakdown::render(&context, Vec::new());

        assert_eq!(breakdown.currency, "USD");
        assert_eq!(breakdown.original_total, Money::from_minor(6500, USD));
        assert_eq!(breakdown.discount_total, Money::from_minor(250, USD));
        assert_eq!(breakdown.final_total, Money::from_minor(6250, USD));

        let first = breakdown.lines.first().ok_or("no lines")?;

        assert_eq!(first.final_price, Money::from_minor(1750, USD));
        assert_eq!(first.applied_promotion_codes, vec![code.clone()]);

        assert_eq!(
            breakdown.free_items,
            vec![FreeItem {
                product: ProductId::from("G"),
                name: "Gift".to_string(),
                quantity: 1,
                reason: "TEN".to_string(),
            }]
        );

        assert!(!breakdown.is_empty());

        Ok(())
    }

    #[test]
    fn json_uses_decimal_strings() -> TestResult {
        let order = order()?;
        let context = PromotionContext::new(&order)?;

        let skipped = vec![SkippedPromotion {
            code: PromotionCode::from("OLD"),
            reason: SkipReason::OutsideValidityWindow,
        }];

        let breakdown = Breakdown::render(&context, skipped);
        let json: serde_json::Value = serde_json::from_str(&breakdown.to_json()?)?;

        assert_eq!(json["original_total"], "65.00");
        assert_eq!(json["discount_total"], "0.00");
        assert_eq!(json["lines"][1]["final_price"], "45.00");
        assert_eq!(json["skipped"][0]["reason"], "outside_validity_window");
        assert_eq!(json["benefits"]["free_shipping"], false);

        Ok(())
    }
}
