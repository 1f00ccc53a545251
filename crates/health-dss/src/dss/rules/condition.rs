use super::{ConditionNode, ConditionRef, Operator, Predicate};
use crate::dss::facts::{FactKey, FactKind, FactMap, FactValue};

/// A fact held a value whose shape the leaf operator cannot compare against.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("fact '{fact}' holds a {found} value that operator '{operator}' cannot evaluate")]
pub struct EvaluationError {
    pub fact: &'static str,
    pub operator: Operator,
    pub found: FactKind,
}

/// `all` requires every leaf, `any` at least one; with both present both blocks must hold.
pub fn evaluate_condition<K: FactKey>(
    node: &ConditionNode<K>,
    facts: &FactMap<K>,
) -> Result<bool, EvaluationError> {
    if let Some(all) = &node.all {
        for leaf in all {
            if !evaluate_leaf(leaf, facts)? {
                return Ok(false);
            }
        }
    }

    if let Some(any) = &node.any {
        for leaf in any {
            if evaluate_leaf(leaf, facts)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    Ok(true)
}

pub fn evaluate_leaf<K: FactKey>(
    leaf: &ConditionRef<K>,
    facts: &FactMap<K>,
) -> Result<bool, EvaluationError> {
    let actual = facts.get(leaf.fact);

    match &leaf.predicate {
        Predicate::Equal(expected) => Ok(actual == expected),
        Predicate::NotEqual(expected) => Ok(actual != expected),
        Predicate::In(options) => Ok(options.contains(actual)),
        Predicate::Contains(needle) => match actual {
            FactValue::Text(haystack) => Ok(haystack.contains(needle.as_str())),
            other => Err(mismatch(leaf, other)),
        },
        Predicate::GreaterThan(threshold) => numeric(leaf, actual).map(|value| value > *threshold),
        Predicate::GreaterThanInclusive(threshold) => {
            numeric(leaf, actual).map(|value| value >= *threshold)
        }
        Predicate::LessThan(threshold) => numeric(leaf, actual).map(|value| value < *threshold),
    }
}

fn numeric<K: FactKey>(leaf: &ConditionRef<K>, actual: &FactValue) -> Result<f64, EvaluationError> {
    actual.as_number().ok_or_else(|| mismatch(leaf, actual))
}

fn mismatch<K: FactKey>(leaf: &ConditionRef<K>, actual: &FactValue) -> EvaluationError {
    EvaluationError {
        fact: leaf.fact.path(),
        operator: leaf.predicate.operator(),
        found: actual.kind(),
    }
}
