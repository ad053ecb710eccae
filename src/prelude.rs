//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    breakdown::{Breakdown, BreakdownError},
    conditions::{Condition, ConditionLogic, EvaluationContext, Operator},
    context::{InvariantViolation, PromotionContext},
    customers::CustomerContext,
    discounts::DiscountError,
    engine::{
        CalculationError, CalculationRequest, CalculationResult, EngineConfig, PromotionEngine,
        SkipReason, SkippedPromotion,
    },
    fixtures::{Fixture, FixtureError},
    ids::{CustomerId, FamilyId, GroupId, PaymentMethod, ProductId, PromotionCode},
    orders::{Order, OrderError, OrderLine},
    promotions::{
        BreakpointBasis, BreakpointType, CalculationMethod, Promotion, PromotionRule,
        PromotionTier, PromotionValidationError, Reward, RewardTarget,
    },
};
