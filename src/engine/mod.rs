//! Promotion Engine
//!
//! Prices one order against a promotion catalog. Each calculation walks
//! `Loaded → Filtered → Evaluated → Combined → Applied → Rendered` over its own
//! [`PromotionContext`]; the engine itself holds nothing but configuration.

use std::fmt;

use jiff::civil::DateTime;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, instrument};

use crate::{
    applicator::RewardApplicator,
    breakdown::Breakdown,
    combinability::{CombinabilityResolver, EligiblePromotion},
    conditions::EvaluationContext,
    context::PromotionContext,
    customers::CustomerContext,
    ids::PromotionCode,
    orders::Order,
    promotions::{Promotion, validate_promotion},
};

pub mod config;
pub mod error;

pub use config::{ConfigError, EngineConfig};
pub use error::{CalculationError, CalculationResult};

/// Everything one calculation needs.
#[derive(Debug, Clone)]
pub struct CalculationRequest<'a, 'p> {
    order: &'a Order<'p>,
    catalog: &'a [Promotion<'p>],
    customer: Option<&'a CustomerContext>,
    now: DateTime,
    promo_code: Option<PromotionCode>,
}

impl<'a, 'p> CalculationRequest<'a, 'p> {
    /// Price `order` against `catalog` at `now`, with no customer data.
    pub fn new(order: &'a Order<'p>, catalog: &'a [Promotion<'p>], now: DateTime) -> Self {
        Self {
            order,
            catalog,
            customer: None,
            now,
            promo_code: None,
        }
    }

    /// Return a copy of this request with customer data.
    #[must_use]
    pub fn with_customer(self, customer: &'a CustomerContext) -> Self {
        Self {
            customer: Some(customer),
            ..self
        }
    }

    /// Return a copy of this request that only considers the promotion `code`.
    #[must_use]
    pub fn with_promo_code(self, code: impl Into<PromotionCode>) -> Self {
        Self {
            promo_code: Some(code.into()),
            ..self
        }
    }

    /// Order being priced
    pub fn order(&self) -> &'a Order<'p> {
        self.order
    }

    /// Candidate promotions
    pub fn catalog(&self) -> &'a [Promotion<'p>] {
        self.catalog
    }

    /// Customer data, if supplied
    pub fn customer(&self) -> Option<&'a CustomerContext> {
        self.customer
    }

    /// Calculation time
    pub fn now(&self) -> DateTime {
        self.now
    }

    /// Single promotion code to validate, if any
    pub fn promo_code(&self) -> Option<&PromotionCode> {
        self.promo_code.as_ref()
    }
}

/// Stages of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationStage {
    /// Order and candidates received
    Loaded,

    /// Inactive and out-of-window promotions dropped
    Filtered,

    /// Conditions evaluated
    Evaluated,

    /// Promotions to apply chosen
    Combined,

    /// Rewards applied
    Applied,

    /// Breakdown produced
    Rendered,
}

impl fmt::Display for CalculationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loaded => "loaded",
            Self::Filtered => "filtered",
            Self::Evaluated => "evaluated",
            Self::Combined => "combined",
            Self::Applied => "applied",
            Self::Rendered => "rendered",
        })
    }
}

/// Why a candidate promotion was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Switched off
    Inactive,

    /// Not yet started, or already ended
    OutsideValidityWindow,

    /// No rule's conditions hold
    ConditionsNotMet,

    /// Lost out to a better or exclusive combination
    NotCombinable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inactive => "inactive",
            Self::OutsideValidityWindow => "outside validity window",
            Self::ConditionsNotMet => "conditions not met",
            Self::NotCombinable => "not combinable",
        })
    }
}

/// A candidate promotion that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPromotion {
    /// Promotion code
    pub code: PromotionCode,

    /// Why it was skipped
    pub reason: SkipReason,
}

/// Promotion Engine
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionEngine {
    config: EngineConfig,
}

impl PromotionEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Price the request's order.
    ///
    /// Missing customer data never fails a calculation: the conditions that need it are simply
    /// false. An empty breakdown means no promotion applied.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculationError`] if the requested promotion code is unknown, if an active
    /// promotion is misconfigured, or if applying rewards breaks a pricing invariant.
    #[instrument(
        name = "promotions.engine.calculate",
        skip_all,
        fields(
            lines = request.order().len(),
            candidates = request.catalog().len(),
            validation_only = request.promo_code().is_some(),
        )
    )]
    pub fn calculate(&self, request: &CalculationRequest<'_, '_>) -> CalculationResult {
        let order = request.order();
        let mut skipped: Vec<SkippedPromotion> = Vec::new();

        let candidates: SmallVec<[&Promotion<'_>; 8]> = match request.promo_code() {
            Some(code) => {
                let promotion = request
                    .catalog()
                    .iter()
                    .find(|promotion| promotion.code() == code)
                    .ok_or_else(|| CalculationError::UnknownPromotionCode(code.clone()))?;

                SmallVec::from_elem(promotion, 1)
            }
            None => request.catalog().iter().collect(),
        };

        let mut context = PromotionContext::new(order)?;

        debug!(stage = %CalculationStage::Loaded, candidates = candidates.len());

        let mut active: SmallVec<[&Promotion<'_>; 8]> = SmallVec::new();

        for promotion in candidates {
            if promotion.is_active_at(request.now()) {
                active.push(promotion);
                continue;
            }

            let reason = if promotion.active() {
                SkipReason::OutsideValidityWindow
            } else {
                SkipReason::Inactive
            };

            skip(&mut skipped, promotion.code(), reason);
        }

        for promotion in &active {
            validate_promotion(
                promotion,
                order.currency(),
                self.config.allow_percentage_over_100,
            )
            .map_err(|source| CalculationError::InvalidPromotion {
                code: promotion.code().clone(),
                source,
            })?;
        }

        debug!(stage = %CalculationStage::Filtered, active = active.len());

        let evaluation = EvaluationContext::new(order, request.customer(), request.now());
        let mut eligible: Vec<EligiblePromotion<'_, '_>> = Vec::new();

        for promotion in active {
            let mut matching = promotion
                .rules()
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.conditions_hold(&evaluation))
                .map(|(idx, _)| idx);

            let rules: SmallVec<[usize; 4]> = if promotion.apply_first_matching_rule_only() {
                matching.next().into_iter().collect()
            } else {
                matching.collect()
            };

            if rules.is_empty() {
                skip(&mut skipped, promotion.code(), SkipReason::ConditionsNotMet);
            } else {
                eligible.push(EligiblePromotion::new(promotion, rules));
            }
        }

        debug!(stage = %CalculationStage::Evaluated, eligible = eligible.len());

        let chosen: SmallVec<[usize; 8]> = if request.promo_code().is_some() {
            (0..eligible.len()).collect()
        } else {
            let resolver = CombinabilityResolver::new(self.config.exhaustive_search_limit);
            let selection = resolver.select(&eligible, &context)?;

            for (position, candidate) in eligible.iter().enumerate() {
                if !selection.contains(position) {
                    skip(
                        &mut skipped,
                        candidate.promotion.code(),
                        SkipReason::NotCombinable,
                    );
                }
            }

            debug!(strategy = ?selection.strategy, "combination selected");

            selection.chosen
        };

        debug!(stage = %CalculationStage::Combined, chosen = chosen.len());

        let mut applying: SmallVec<[&EligiblePromotion<'_, '_>; 8]> = chosen
            .iter()
            .filter_map(|position| eligible.get(*position))
            .collect();

        applying.sort_by(|a, b| a.promotion.ordering_key().cmp(&b.promotion.ordering_key()));

        for candidate in applying {
            let application =
                RewardApplicator::apply_promotion(&mut context, candidate.promotion, &candidate.rules)?;

            debug!(
                promotion = %application.code,
                discount_minor = application.discount_minor,
                granted = application.granted(),
                "promotion applied"
            );
        }

        debug!(
            stage = %CalculationStage::Applied,
            discount_minor = context.discount_minor(),
        );

        let breakdown = Breakdown::render(&context, skipped);

        debug!(stage = %CalculationStage::Rendered);

        Ok(breakdown)
    }
}

fn skip(skipped: &mut Vec<SkippedPromotion>, code: &PromotionCode, reason: SkipReason) {
    debug!(promotion = %code, %reason, "promotion skipped");

    skipped.push(SkippedPromotion {
        code: code.clone(),
        reason,
    });
}
