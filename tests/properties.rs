//! Property tests over randomly generated orders and catalogs.

use decimal_percentage::Percentage;
use jiff::civil::{DateTime, date};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::USD};

use rebate::prelude::*;

fn now() -> DateTime {
    date(2024, 6, 7).at(12, 0, 0, 0)
}

fn launched() -> DateTime {
    date(2024, 1, 1).at(0, 0, 0, 0)
}

/// Lines priced at least $5.00 so that small amount rewards never exhaust a line.
fn lines_strategy() -> impl Strategy<Value = Vec<(i64, u32)>> {
    prop::collection::vec((500_i64..=20_000, 1_u32..=5), 1..=4)
}

fn build_order(lines: &[(i64, u32)]) -> Result<Order<'static>, OrderError> {
    Order::with_lines(
        lines
            .iter()
            .enumerate()
            .map(|(idx, (price, quantity))| {
                OrderLine::new(
                    format!("P{idx}"),
                    format!("Product {idx}"),
                    Money::from_minor(*price, USD),
                    *quantity,
                )
            })
            .collect::<Vec<_>>(),
        USD,
    )
}

#[derive(Debug, Clone)]
struct GeneratedPromotion {
    percent: Option<u8>,
    amount: i64,
    threshold: u8,
    priority: i32,
    group: Option<u8>,
    exclusive: bool,
    cumulative: bool,
}

/// At most 25% or $1.00 off per promotion, so three promotions never exceed a line.
fn promotion_strategy() -> impl Strategy<Value = GeneratedPromotion> {
    (
        prop::option::of(1_u8..=25),
        1_i64..=100,
        0_u8..=100,
        0_i32..=5,
        prop::option::of(0_u8..=1),
        prop::bool::weighted(0.2),
        any::<bool>(),
    )
        .prop_map(
            |(percent, amount, threshold, priority, group, exclusive, cumulative)| GeneratedPromotion {
                percent,
                amount,
                threshold,
                priority,
                group,
                exclusive,
                cumulative,
            },
        )
}

fn build_promotion(idx: usize, generated: &GeneratedPromotion) -> Promotion<'static> {
    let reward = match generated.percent {
        Some(percent) => Reward::DiscountPercentage {
            percent: Percentage::from(f64::from(percent) / 100.0),
            target: RewardTarget::EligibleLines,
        },
        None => Reward::DiscountAmount {
            amount: Money::from_minor(generated.amount, USD),
            target: RewardTarget::EligibleLines,
        },
    };

    let method = if generated.cumulative {
        CalculationMethod::Cumulative
    } else {
        CalculationMethod::Bracket
    };

    let rule = PromotionRule::new(
        "rule",
        [PromotionTier::new(Decimal::from(generated.threshold), reward)],
    )
    .with_calculation_method(method);

    let promotion = Promotion::new(format!("PROMO{idx}"), format!("Promotion {idx}"), launched(), [rule])
        .with_priority(generated.priority)
        .with_exclusive(generated.exclusive);

    match generated.group {
        Some(group) => promotion.with_combinability_group(format!("group-{group}")),
        None => promotion,
    }
}

fn build_catalog(generated: &[GeneratedPromotion]) -> Vec<Promotion<'static>> {
    generated
        .iter()
        .enumerate()
        .map(|(idx, generated)| build_promotion(idx, generated))
        .collect()
}

proptest! {
    #[test]
    fn calculations_are_idempotent(
        lines in lines_strategy(),
        generated in prop::collection::vec(promotion_strategy(), 0..=3),
    ) {
        let order = build_order(&lines)?;
        let catalog = build_catalog(&generated);
        let engine = PromotionEngine::default();
        let request = CalculationRequest::new(&order, &catalog, now());

        let first = engine.calculate(&request)?;
        let second = engine.calculate(&request)?;

        prop_assert_eq!(first, second);
    }

    #[test]
    fn discounts_stay_within_each_line(
        lines in lines_strategy(),
        generated in prop::collection::vec(promotion_strategy(), 0..=3),
    ) {
        let order = build_order(&lines)?;
        let catalog = build_catalog(&generated);
        let breakdown =
            PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, now()))?;

        let mut discount_sum = 0_i64;

        for line in &breakdown.lines {
            let discount = line.total_discount.to_minor_units();
            let original = line.original_price.to_minor_units();

            prop_assert!(discount >= 0, "negative discount on {}", line.product);
            prop_assert!(discount <= original, "discount exceeds {}", line.product);
            prop_assert_eq!(line.final_price.to_minor_units(), original - discount);

            discount_sum += discount;
        }

        prop_assert_eq!(breakdown.discount_total.to_minor_units(), discount_sum);
        prop_assert_eq!(
            breakdown.final_total.to_minor_units(),
            breakdown.original_total.to_minor_units() - breakdown.discount_total.to_minor_units()
        );
    }

    #[test]
    fn bracket_discounts_never_shrink_as_the_order_grows(
        price in 100_i64..=5_000,
        quantity in 1_u32..=20,
    ) {
        let tier = |threshold: i64, percent: f64| {
            PromotionTier::new(
                Decimal::from(threshold),
                Reward::DiscountPercentage {
                    percent: Percentage::from(percent),
                    target: RewardTarget::EligibleLines,
                },
            )
        };

        let catalog = [Promotion::new(
            "TIERED",
            "Tiered",
            launched(),
            [PromotionRule::new(
                "tiers",
                [tier(25, 0.05), tier(100, 0.10), tier(250, 0.15)],
            )],
        )];

        let engine = PromotionEngine::default();

        let smaller = build_order(&[(price, quantity)])?;
        let larger = build_order(&[(price, quantity + 1)])?;

        let small = engine.calculate(&CalculationRequest::new(&smaller, &catalog, now()))?;
        let large = engine.calculate(&CalculationRequest::new(&larger, &catalog, now()))?;

        prop_assert!(large.discount_total.to_minor_units() >= small.discount_total.to_minor_units());
    }

    #[test]
    fn free_items_never_exceed_the_reward(
        lines in lines_strategy(),
        quantity in 1_u32..=3,
        cumulative in any::<bool>(),
    ) {
        let order = build_order(&lines)?;

        let gift = |threshold: i64| {
            PromotionTier::new(
                Decimal::from(threshold),
                Reward::FreeProduct {
                    product: ProductId::from("gift"),
                    name: "Gift".to_string(),
                    quantity,
                },
            )
        };

        let method = if cumulative {
            CalculationMethod::Cumulative
        } else {
            CalculationMethod::Bracket
        };

        let catalog = [Promotion::new(
            "GIFT",
            "Gift",
            launched(),
            [PromotionRule::new("gift", [gift(1), gift(2)])
                .with_calculation_method(method)
                .with_breakpoint(BreakpointType::Quantity, BreakpointBasis::OriginalPrice)],
        )];

        let breakdown =
            PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, now()))?;

        let granted: u64 = breakdown.free_items.iter().map(|item| item.quantity).sum();
        let tiers = if cumulative { 2 } else { 1 };

        prop_assert!(granted <= u64::from(quantity) * tiers);
        prop_assert!(granted >= u64::from(quantity));
    }

    #[test]
    fn exclusive_promotions_never_share(
        lines in lines_strategy(),
        exclusive_priority in 0_i32..=5,
        other_priority in 0_i32..=5,
    ) {
        let order = build_order(&lines)?;

        let promotion = |code: &str, priority: i32| {
            Promotion::new(
                code,
                code,
                launched(),
                [PromotionRule::new(
                    "rule",
                    [PromotionTier::new(
                        Decimal::ZERO,
                        Reward::DiscountPercentage {
                            percent: Percentage::from(0.10),
                            target: RewardTarget::EligibleLines,
                        },
                    )],
                )],
            )
            .with_priority(priority)
        };

        let catalog = [
            promotion("A", exclusive_priority).with_exclusive(true),
            promotion("B", other_priority),
        ];

        let breakdown =
            PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, now()))?;

        let codes: Vec<&str> = breakdown
            .applied_promotions
            .iter()
            .map(|applied| applied.code.as_str())
            .collect();

        prop_assert_eq!(codes, vec!["A"]);
    }
}
