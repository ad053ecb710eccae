//! Condition Evaluator
//!
//! Combines a rule's conditions with boolean logic.

use serde::{Deserialize, Serialize};

use super::{Condition, EvaluationContext};

/// How a rule's conditions are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionLogic {
    /// All conditions must hold.
    #[default]
    #[serde(alias = "and")]
    All,

    /// At least one condition must hold.
    #[serde(alias = "or")]
    Any,
}

/// Evaluates a set of conditions under [`ConditionLogic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate `conditions` against `context`.
    ///
    /// An empty condition list always holds. Evaluation short-circuits.
    #[must_use]
    pub fn evaluate(
        conditions: &[Condition<'_>],
        logic: ConditionLogic,
        context: &EvaluationContext<'_>,
    ) -> bool {
        if conditions.is_empty() {
            return true;
        }

        match logic {
            ConditionLogic::All => conditions
                .iter()
                .all(|condition| condition.evaluate(context)),
            ConditionLogic::Any => conditions
                .iter()
                .any(|condition| condition.evaluate(context)),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{
        conditions::Operator,
        orders::{Order, OrderLine},
    };

    use super::*;

    fn conditions<'a>() -> [Condition<'a>; 2] {
        [
            Condition::CartQuantity {
                operator: Operator::GreaterThanOrEqual,
                quantity: 1,
            },
            Condition::CartQuantity {
                operator: Operator::GreaterThan,
                quantity: 10,
            },
        ]
    }

    #[test]
    fn empty_conditions_always_hold() -> TestResult {
        let order = Order::with_lines(
            [OrderLine::new("A", "A", Money::from_minor(100, USD), 1)],
            USD,
        )?;

        let context = EvaluationContext::new(&order, None, date(2024, 1, 1).at(0, 0, 0, 0));

        assert!(ConditionEvaluator::evaluate(&[], ConditionLogic::All, &context));
        assert!(ConditionEvaluator::evaluate(&[], ConditionLogic::Any, &context));

        Ok(())
    }

    #[test]
    fn all_requires_every_condition_and_any_requires_one() -> TestResult {
        let order = Order::with_lines(
            [OrderLine::new("A", "A", Money::from_minor(100, USD), 2)],
            USD,
        )?;

        let context = EvaluationContext::new(&order, None, date(2024, 1, 1).at(0, 0, 0, 0));
        let conditions = conditions();

        assert!(!ConditionEvaluator::evaluate(
            &conditions,
            ConditionLogic::All,
            &context
        ));

        assert!(ConditionEvaluator::evaluate(
            &conditions,
            ConditionLogic::Any,
            &context
        ));

        Ok(())
    }

    #[test]
    fn logic_accepts_boolean_aliases() -> TestResult {
        let all: ConditionLogic = serde_norway::from_str("and")?;
        let any: ConditionLogic = serde_norway::from_str("any")?;

        assert_eq!(all, ConditionLogic::All);
        assert_eq!(any, ConditionLogic::Any);

        Ok(())
    }
}
