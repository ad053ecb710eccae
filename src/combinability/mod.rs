//! Combinability
//!
//! Chooses which eligible promotions are applied together.
//!
//! An eligible exclusive promotion always wins: the highest priority one is applied alone.
//! Otherwise every maximal subset of mutually combinable promotions is dry run on a scratch copy
//! of the context and the subset with the largest total discount is kept. That search is
//! exponential in the number of eligible promotions, so above a configurable limit the resolver
//! falls back to a greedy walk in priority order.

use std::cmp::Ordering;

use smallvec::SmallVec;
use tracing::debug;

use crate::{
    applicator::RewardApplicator,
    context::PromotionContext,
    engine::CalculationError,
    ids::PromotionCode,
    promotions::Promotion,
};

pub mod search;

use search::Subset;

/// Default number of eligible promotions above which the search turns greedy.
pub const DEFAULT_EXHAUSTIVE_SEARCH_LIMIT: usize = 12;

/// A promotion whose conditions hold, and the rules that will be applied.
#[derive(Debug, Clone)]
pub struct EligiblePromotion<'a, 'p> {
    /// The promotion
    pub promotion: &'a Promotion<'p>,

    /// Positions of the retained rules, in declaration order
    pub rules: SmallVec<[usize; 4]>,
}

impl<'a, 'p> EligiblePromotion<'a, 'p> {
    /// Create a new eligible promotion.
    pub fn new(promotion: &'a Promotion<'p>, rules: impl IntoIterator<Item = usize>) -> Self {
        Self {
            promotion,
            rules: rules.into_iter().collect(),
        }
    }

    /// Apply the retained rules to `context`.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculationError`] if any rule fails to apply.
    pub fn apply_to(&self, context: &mut PromotionContext<'_>) -> Result<i64, CalculationError> {
        RewardApplicator::apply_promotion(context, self.promotion, &self.rules)
            .map(|application| application.discount_minor)
    }
}

/// How a selection was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// An exclusive promotion was eligible and won alone.
    Exclusive,

    /// Every maximal combinable subset was dry run.
    Exhaustive {
        /// Number of subsets dry run
        subsets_evaluated: usize,
    },

    /// Too many candidates; promotions were kept greedily in priority order.
    Greedy,
}

/// Promotions chosen for application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Positions in the eligible list, in application order
    pub chosen: SmallVec<[usize; 8]>,

    /// How the choice was made
    pub strategy: SelectionStrategy,
}

impl Selection {
    /// Whether the eligible promotion at `position` was chosen.
    pub fn contains(&self, position: usize) -> bool {
        self.chosen.contains(&position)
    }
}

/// Combinability Resolver
#[derive(Debug, Clone, Copy)]
pub struct CombinabilityResolver {
    exhaustive_search_limit: usize,
}

impl Default for CombinabilityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_EXHAUSTIVE_SEARCH_LIMIT)
    }
}

impl CombinabilityResolver {
    /// Create a resolver that searches exhaustively up to `exhaustive_search_limit` candidates.
    pub fn new(exhaustive_search_limit: usize) -> Self {
        Self {
            exhaustive_search_limit,
        }
    }

    /// Candidate count above which the search turns greedy
    pub fn exhaustive_search_limit(&self) -> usize {
        self.exhaustive_search_limit
    }

    /// Choose which of `eligible` to apply to `context`.
    ///
    /// # Errors
    ///
    /// Returns the [`CalculationError`] of the first candidate subset whose dry run fails, so a
    /// misconfigured combination aborts the calculation even when other subsets would succeed.
    pub fn select(
        &self,
        eligible: &[EligiblePromotion<'_, '_>],
        context: &PromotionContext<'_>,
    ) -> Result<Selection, CalculationError> {
        let mut order: SmallVec<[usize; 8]> = (0..eligible.len()).collect();

        order.sort_by(|a, b| {
            let a = eligible.get(*a).map(|e| e.promotion.ordering_key());
            let b = eligible.get(*b).map(|e| e.promotion.ordering_key());

            a.cmp(&b)
        });

        let sorted: SmallVec<[&EligiblePromotion<'_, '_>; 8]> =
            order.iter().filter_map(|idx| eligible.get(*idx)).collect();

        let to_eligible = |subset: &[usize]| -> SmallVec<[usize; 8]> {
            subset
                .iter()
                .filter_map(|position| order.get(*position).copied())
                .collect()
        };

        if let Some(position) = sorted.iter().position(|e| e.promotion.exclusive()) {
            debug!(
                promotion = %sorted.get(position).map_or("", |e| e.promotion.code().as_str()),
                "exclusive promotion selected"
            );

            return Ok(Selection {
                chosen: to_eligible(std::slice::from_ref(&position)),
                strategy: SelectionStrategy::Exclusive,
            });
        }

        let promotions: SmallVec<[&Promotion<'_>; 8]> =
            sorted.iter().map(|e| e.promotion).collect();

        if sorted.len() > self.exhaustive_search_limit {
            debug!(
                candidates = sorted.len(),
                limit = self.exhaustive_search_limit,
                "too many candidates for exhaustive search, selecting greedily"
            );

            return Ok(Selection {
                chosen: to_eligible(search::greedy_subset(&promotions).as_slice()),
                strategy: SelectionStrategy::Greedy,
            });
        }

        let subsets = search::maximal_subsets(&promotions);
        let subsets_evaluated = subsets.len();

        let mut best: Option<(i64, Subset)> = None;

        for subset in subsets {
            let mut scratch = context.clone();

            subset
                .iter()
                .try_for_each(|position| {
                    sorted
                        .get(*position)
                        .map_or(Ok(0), |candidate| candidate.apply_to(&mut scratch))
                        .map(|_| ())
                })
                .inspect_err(|err| debug!(error = %err, "subset dry run failed"))?;

            let discount = scratch.discount_minor();

            let better = match &best {
                None => true,
                Some((best_discount, best_subset)) => {
                    compare(
                        (discount, &subset),
                        (*best_discount, best_subset),
                        &promotions,
                    ) == Ordering::Less
                }
            };

            if better {
                best = Some((discount, subset));
            }
        }

        match best {
            Some((discount, subset)) => {
                debug!(
                    subsets_evaluated,
                    discount_minor = discount,
                    "best combination selected"
                );

                Ok(Selection {
                    chosen: to_eligible(subset.as_slice()),
                    strategy: SelectionStrategy::Exhaustive { subsets_evaluated },
                })
            }
            None => Ok(Selection {
                chosen: SmallVec::new(),
                strategy: SelectionStrategy::Exhaustive { subsets_evaluated },
            }),
        }
    }
}

/// Order two dry-run results: larger discount first, then ascending priorities, then codes.
fn compare(
    (a_discount, a): (i64, &Subset),
    (b_discount, b): (i64, &Subset),
    promotions: &[&Promotion<'_>],
) -> Ordering {
    let priorities = |subset: &Subset| -> SmallVec<[i32; 8]> {
        subset
            .iter()
            .filter_map(|position| promotions.get(*position).map(|p| p.priority()))
            .collect()
    };

    let codes = |subset: &Subset| -> SmallVec<[PromotionCode; 8]> {
        subset
            .iter()
            .filter_map(|position| promotions.get(*position).map(|p| p.code().clone()))
            .collect()
    };

    b_discount
        .cmp(&a_discount)
        .then_with(|| priorities(a).cmp(&priorities(b)))
        .then_with(|| codes(a).cmp(&codes(b)))
}
