//! End-to-end calculations through [`PromotionEngine`].
//!
//! The reference order is two lines: 2 × $10.00 and 3 × $15.00, a $65.00 subtotal.

use decimal_percentage::Percentage;
use jiff::civil::{DateTime, date};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::USD};
use testresult::TestResult;

use rebate::prelude::*;

fn reference_order<'a>() -> Result<Order<'a>, OrderError> {
    Order::with_lines(
        [
            OrderLine::new("A", "Product A", Money::from_minor(1000, USD), 2),
            OrderLine::new("B", "Product B", Money::from_minor(1500, USD), 3),
        ],
        USD,
    )
}

fn friday() -> DateTime {
    date(2024, 6, 7).at(12, 0, 0, 0)
}

fn launched() -> DateTime {
    date(2024, 1, 1).at(0, 0, 0, 0)
}

fn amount_off<'a>(threshold: i64, minor: i64) -> PromotionTier<'a> {
    PromotionTier::new(
        Decimal::from(threshold),
        Reward::DiscountAmount {
            amount: Money::from_minor(minor, USD),
            target: RewardTarget::EligibleLines,
        },
    )
}

fn percent_off<'a>(threshold: i64, percent: f64) -> PromotionTier<'a> {
    PromotionTier::new(
        Decimal::from(threshold),
        Reward::DiscountPercentage {
            percent: Percentage::from(percent),
            target: RewardTarget::EligibleLines,
        },
    )
}

fn applied_codes(breakdown: &Breakdown) -> Vec<&str> {
    breakdown
        .applied_promotions
        .iter()
        .map(|applied| applied.code.as_str())
        .collect()
}

#[test]
fn cumulative_tiers_add_up() -> TestResult {
    let order = reference_order()?;

    let catalog = [Promotion::new(
        "SPEND",
        "Spend and save",
        launched(),
        [PromotionRule::new("tiers", [amount_off(20, 200), amount_off(50, 300)])
            .with_calculation_method(CalculationMethod::Cumulative)],
    )];

    let breakdown =
        PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, friday()))?;

    assert_eq!(breakdown.discount_total, Money::from_minor(500, USD));
    assert_eq!(breakdown.final_total, Money::from_minor(6000, USD));

    Ok(())
}

#[test]
fn bracket_tiers_grant_only_the_highest() -> TestResult {
    let order = reference_order()?;

    let catalog = [Promotion::new(
        "TIERED",
        "Tiered percentage",
        launched(),
        [PromotionRule::new("tiers", [percent_off(20, 0.05), percent_off(50, 0.10)])],
    )];

    let breakdown =
        PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, friday()))?;

    assert_eq!(breakdown.discount_total, Money::from_minor(650, USD));

    let line_discounts: Vec<i64> = breakdown
        .lines
        .iter()
        .map(|line| line.total_discount.to_minor_units())
        .collect();

    assert_eq!(line_discounts, [200, 450]);

    Ok(())
}

#[test]
fn current_price_basis_chains_promotions() -> TestResult {
    let order = Order::with_lines(
        [OrderLine::new("A", "Product A", Money::from_minor(10_000, USD), 1)],
        USD,
    )?;

    let catalog = [
        Promotion::new(
            "FIRST",
            "First",
            launched(),
            [PromotionRule::new("first", [percent_off(0, 0.05)])],
        )
        .with_priority(1),
        Promotion::new(
            "SECOND",
            "Second",
            launched(),
            [PromotionRule::new("second", [percent_off(0, 0.05)])
                .with_breakpoint(BreakpointType::Amount, BreakpointBasis::CurrentPrice)],
        )
        .with_priority(2),
    ];

    let breakdown =
        PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, friday()))?;

    assert_eq!(applied_codes(&breakdown), ["FIRST", "SECOND"]);
    assert_eq!(breakdown.discount_total, Money::from_minor(975, USD));
    assert_eq!(breakdown.final_total, Money::from_minor(9025, USD));

    let discounts: Vec<i64> = breakdown
        .applied_promotions
        .iter()
        .map(|applied| applied.discount.to_minor_units())
        .collect();

    assert_eq!(discounts, [500, 475]);

    Ok(())
}

#[test]
fn exclusive_promotion_is_applied_alone() -> TestResult {
    let order = reference_order()?;

    let catalog = [
        Promotion::new(
            "X",
            "Exclusive",
            launched(),
            [PromotionRule::new("x", [percent_off(0, 0.10)])],
        )
        .with_priority(1)
        .with_exclusive(true),
        Promotion::new(
            "Y",
            "Regular",
            launched(),
            [PromotionRule::new("y", [percent_off(0, 0.20)])],
        )
        .with_priority(2),
    ];

    let breakdown =
        PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, friday()))?;

    assert_eq!(applied_codes(&breakdown), ["X"]);
    assert_eq!(
        breakdown.skipped,
        [SkippedPromotion {
            code: PromotionCode::from("Y"),
            reason: SkipReason::NotCombinable,
        }]
    );

    Ok(())
}

#[test]
fn subtotal_conditions_gate_rules() -> TestResult {
    let order = reference_order()?;

    let big_spender = |amount: i64| {
        Promotion::new(
            "BIG",
            "Big spender",
            launched(),
            [PromotionRule::new("big", [percent_off(0, 0.10)]).with_conditions(
                ConditionLogic::All,
                [Condition::CartSubtotal {
                    operator: Operator::GreaterThanOrEqual,
                    amount: Money::from_minor(amount, USD),
                }],
            )],
        )
    };

    let engine = PromotionEngine::default();

    let met = [big_spender(6500)];
    let unmet = [big_spender(6501)];

    let breakdown = engine.calculate(&CalculationRequest::new(&order, &met, friday()))?;
    assert_eq!(breakdown.discount_total, Money::from_minor(650, USD));

    let breakdown = engine.calculate(&CalculationRequest::new(&order, &unmet, friday()))?;
    assert!(breakdown.is_empty());
    assert_eq!(breakdown.final_total, Money::from_minor(6500, USD));

    Ok(())
}

#[test]
fn percentages_over_100_pass_validation_only_when_allowed() -> TestResult {
    let order = reference_order()?;

    let catalog = [Promotion::new(
        "HUGE",
        "Huge",
        launched(),
        [PromotionRule::new("huge", [percent_off(0, 1.5)])],
    )];

    let request = CalculationRequest::new(&order, &catalog, friday());

    let strict = PromotionEngine::default().calculate(&request);
    assert!(strict.as_ref().is_err_and(CalculationError::is_validation));

    // Allowed through validation, 150% of $65.00 still cannot be taken off the lines.
    let lenient = PromotionEngine::new(EngineConfig::default().with_percentage_over_100(true))
        .calculate(&request);

    assert!(lenient.as_ref().is_err_and(CalculationError::is_invariant_violation));

    Ok(())
}

#[test]
fn overlapping_discounts_are_invariant_violations() -> TestResult {
    let order = reference_order()?;

    let catalog = [
        Promotion::new(
            "SEVENTY",
            "Seventy",
            launched(),
            [PromotionRule::new("a", [percent_off(0, 0.70)])],
        )
        .with_priority(1),
        Promotion::new(
            "SIXTY",
            "Sixty",
            launched(),
            [PromotionRule::new("b", [percent_off(0, 0.60)])],
        )
        .with_priority(2),
    ];

    let request = CalculationRequest::new(&order, &catalog, friday()).with_promo_code("SIXTY");
    let breakdown = PromotionEngine::default().calculate(&request)?;

    assert_eq!(breakdown.discount_total, Money::from_minor(3900, USD));

    let result =
        PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, friday()));

    assert!(result.as_ref().is_err_and(CalculationError::is_invariant_violation));

    Ok(())
}

#[test]
fn overlapping_discounts_fail_even_beside_a_valid_group() -> TestResult {
    let order = Order::with_lines(
        [OrderLine::new("A", "Product A", Money::from_minor(10_000, USD), 1)],
        USD,
    )?;

    let catalog = [
        Promotion::new(
            "SEVENTY",
            "Seventy",
            launched(),
            [PromotionRule::new("a", [percent_off(0, 0.70)])],
        )
        .with_priority(1),
        Promotion::new(
            "SIXTY",
            "Sixty",
            launched(),
            [PromotionRule::new("b", [percent_off(0, 0.60)])],
        )
        .with_priority(2),
        Promotion::new(
            "SAFE",
            "Safe",
            launched(),
            [PromotionRule::new("c", [percent_off(0, 0.05)])],
        )
        .with_priority(3)
        .with_combinability_group("x"),
    ];

    let result =
        PromotionEngine::default().calculate(&CalculationRequest::new(&order, &catalog, friday()));

    assert!(result.as_ref().is_err_and(CalculationError::is_invariant_violation));

    Ok(())
}

#[test]
fn overflowing_sku_points_are_rejected_before_calculating() {
    let result = Order::with_lines(
        [OrderLine::new("A", "Product A", Money::from_minor(1000, USD), 3)
            .with_sku_points(Decimal::MAX)],
        USD,
    );

    assert_eq!(result.as_ref().err(), Some(&OrderError::SkuPointsOverflow(0)));
    assert!(result.map_err(CalculationError::from).is_err_and(|err| err.is_validation()));
}

#[test]
fn bundled_fixture_set_prices_a_weekday() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let customer = fixture.customer().ok_or("no customer")?;

    let request = CalculationRequest::new(fixture.order()?, fixture.promotions(), friday())
        .with_customer(customer);

    let breakdown = PromotionEngine::default().calculate(&request)?;

    assert_eq!(applied_codes(&breakdown), ["SPEND5", "BEANS10", "VIP"]);
    assert_eq!(breakdown.original_total, Money::from_minor(4648, USD));
    assert_eq!(breakdown.discount_total, Money::from_minor(446, USD));
    assert_eq!(breakdown.final_total, Money::from_minor(4202, USD));
    assert!(breakdown.benefits.free_shipping);
    assert_eq!(breakdown.benefits.loyalty_points, 100);

    let mug = breakdown
        .lines
        .iter()
        .find(|line| line.product.as_str() == "mug")
        .ok_or("no mug line")?;

    assert_eq!(mug.total_discount, Money::from_minor(0, USD));

    let reason = |code: &str| {
        breakdown
            .skipped
            .iter()
            .find(|skipped| skipped.code.as_str() == code)
            .map(|skipped| skipped.reason)
    };

    assert_eq!(reason("ESPRESSO4"), Some(SkipReason::NotCombinable));
    assert_eq!(reason("DRINKS20"), Some(SkipReason::NotCombinable));
    assert_eq!(reason("WEEKEND15"), Some(SkipReason::ConditionsNotMet));
    assert_eq!(reason("SUMMER23"), Some(SkipReason::OutsideValidityWindow));
    assert_eq!(reason("RETIRED"), Some(SkipReason::Inactive));

    Ok(())
}

#[test]
fn bundled_fixture_set_prices_a_weekend() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let saturday = date(2024, 6, 8).at(10, 0, 0, 0);

    let request = CalculationRequest::new(fixture.order()?, fixture.promotions(), saturday);
    let breakdown = PromotionEngine::default().calculate(&request)?;

    assert_eq!(applied_codes(&breakdown), ["WEEKEND15"]);
    assert_eq!(breakdown.discount_total, Money::from_minor(697, USD));

    Ok(())
}

#[test]
fn bundled_fixture_set_validates_a_single_code() -> TestResult {
    let fixture = Fixture::from_set("scenarios")?;
    let customer = fixture.customer().ok_or("no customer")?;

    let request = CalculationRequest::new(fixture.order()?, fixture.promotions(), friday())
        .with_customer(customer)
        .with_promo_code("DRINKS20");

    let breakdown = PromotionEngine::default().calculate(&request)?;

    assert_eq!(applied_codes(&breakdown), ["DRINKS20"]);
    assert_eq!(breakdown.discount_total, Money::from_minor(240, USD));

    Ok(())
}
