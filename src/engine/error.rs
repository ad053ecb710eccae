//! Calculation Errors

use rusty_money::MoneyError;
use thiserror::Error;

use crate::{
    breakdown::Breakdown,
    context::InvariantViolation,
    discounts::DiscountError,
    ids::PromotionCode,
    orders::OrderError,
    promotions::PromotionValidationError,
};

/// Why a calculation produced no breakdown.
#[derive(Debug, Error)]
pub enum CalculationError {
    /// The order is invalid.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// An active promotion is misconfigured.
    #[error("promotion {code} is invalid: {source}")]
    InvalidPromotion {
        /// Code of the offending promotion
        code: PromotionCode,

        /// What is wrong with it
        #[source]
        source: PromotionValidationError,
    },

    /// The requested promotion code is not in the catalog.
    #[error("unknown promotion code: {0}")]
    UnknownPromotionCode(PromotionCode),

    /// Applying rewards broke a pricing invariant.
    #[error("pricing invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl CalculationError {
    /// Whether the caller can fix this by correcting its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Order(_) | Self::InvalidPromotion { .. } | Self::UnknownPromotionCode(_)
        )
    }

    /// Whether this is a defect detected while applying rewards.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Either a full breakdown or the reason there is none.
pub type CalculationResult = Result<Breakdown, CalculationError>;
