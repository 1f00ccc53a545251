//! Serialized rule documents and their compilation into the typed rule AST.

use serde::Deserialize;
use serde_json::Value;

use super::{ConditionNode, ConditionRef, Operator, Predicate, Rule, RuleEvent};
use crate::dss::facts::{FactKey, FactKind, FactValue};

/// One versioned rule group as stored under `rules/<domain>/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroupDocument {
    pub group: String,
    #[serde(default)]
    pub version: Option<String>,
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub name: String,
    pub conditions: ConditionDefinition,
    pub event: RuleEvent,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDefinition {
    #[serde(default)]
    pub all: Option<Vec<LeafDefinition>>,
    #[serde(default)]
    pub any: Option<Vec<LeafDefinition>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeafDefinition {
    pub fact: String,
    pub operator: String,
    pub value: Value,
}

/// Defects in a rule library. Raised while the registry is built, never per request.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("rule document '{label}' is malformed: {source}")]
    Malformed {
        label: String,
        source: serde_json::Error,
    },
    #[error("rule '{rule}' uses unknown operator '{operator}'")]
    UnknownOperator { rule: String, operator: String },
    #[error("rule '{rule}' references unknown fact '{fact}'")]
    UnknownFact { rule: String, fact: String },
    #[error("rule '{rule}' has a missing or empty condition block")]
    EmptyCondition { rule: String },
    #[error("rule '{rule}': operator '{operator}' on fact '{fact}' expects {expected}")]
    OperandMismatch {
        rule: String,
        fact: String,
        operator: Operator,
        expected: &'static str,
    },
    #[error("{domain} library has no rule group named '{group}'")]
    UnknownGroup { domain: &'static str, group: String },
    #[error("{domain} library declares rule group '{group}' more than once")]
    DuplicateGroup { domain: &'static str, group: String },
    #[error("{domain} library is missing rule group '{group}'")]
    MissingGroup {
        domain: &'static str,
        group: &'static str,
    },
    #[error("rule '{rule}' in group '{group}' emits a {found} event")]
    EventMismatch {
        rule: String,
        group: &'static str,
        found: &'static str,
    },
}

/// Compile every rule of a parsed document, preserving declaration order.
pub fn compile_document<K: FactKey>(
    document: RuleGroupDocument,
) -> Result<Vec<Rule<K>>, LibraryError> {
    document.rules.into_iter().map(compile_rule).collect()
}

fn compile_rule<K: FactKey>(definition: RuleDefinition) -> Result<Rule<K>, LibraryError> {
    let RuleDefinition {
        name,
        conditions,
        event,
    } = definition;

    let all = compile_block(&name, conditions.all)?;
    let any = compile_block(&name, conditions.any)?;
    if all.is_none() && any.is_none() {
        return Err(LibraryError::EmptyCondition { rule: name });
    }

    Ok(Rule {
        name,
        conditions: ConditionNode { all, any },
        event,
    })
}

fn compile_block<K: FactKey>(
    rule: &str,
    block: Option<Vec<LeafDefinition>>,
) -> Result<Option<Vec<ConditionRef<K>>>, LibraryError> {
    match block {
        None => Ok(None),
        Some(leaves) if leaves.is_empty() => Err(LibraryError::EmptyCondition {
            rule: rule.to_string(),
        }),
        Some(leaves) => leaves
            .into_iter()
            .map(|leaf| compile_leaf(rule, leaf))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
    }
}

fn compile_leaf<K: FactKey>(
    rule: &str,
    leaf: LeafDefinition,
) -> Result<ConditionRef<K>, LibraryError> {
    let fact = K::from_path(&leaf.fact).ok_or_else(|| LibraryError::UnknownFact {
        rule: rule.to_string(),
        fact: leaf.fact.clone(),
    })?;
    let operator =
        Operator::from_name(&leaf.operator).ok_or_else(|| LibraryError::UnknownOperator {
            rule: rule.to_string(),
            operator: leaf.operator.clone(),
        })?;

    let fact_kind = fact.default_value().kind();
    let mismatch = |expected: &'static str| LibraryError::OperandMismatch {
        rule: rule.to_string(),
        fact: leaf.fact.clone(),
        operator,
        expected,
    };

    let predicate = match operator {
        Operator::Equal | Operator::NotEqual => {
            let value = scalar(&leaf.value)
                .filter(|value| compatible(fact_kind, value))
                .ok_or_else(|| mismatch("a scalar matching the fact's type"))?;
            if operator == Operator::Equal {
                Predicate::Equal(value)
            } else {
                Predicate::NotEqual(value)
            }
        }
        Operator::In => {
            let Value::Array(items) = &leaf.value else {
                return Err(mismatch("a list of values"));
            };
            let options = items
                .iter()
                .map(|item| scalar(item).filter(|value| compatible(fact_kind, value)))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| mismatch("a list of scalars matching the fact's type"))?;
            Predicate::In(options)
        }
        Operator::Contains => {
            if fact_kind != FactKind::Text {
                return Err(mismatch("a string fact"));
            }
            let needle = leaf
                .value
                .as_str()
                .ok_or_else(|| mismatch("a string value"))?;
            Predicate::Contains(needle.to_string())
        }
        Operator::GreaterThan | Operator::GreaterThanInclusive | Operator::LessThan => {
            if fact_kind != FactKind::Number {
                return Err(mismatch("a numeric fact"));
            }
            let threshold = leaf
                .value
                .as_f64()
                .ok_or_else(|| mismatch("a numeric value"))?;
            match operator {
                Operator::GreaterThan => Predicate::GreaterThan(threshold),
                Operator::GreaterThanInclusive => Predicate::GreaterThanInclusive(threshold),
                _ => Predicate::LessThan(threshold),
            }
        }
    };

    Ok(ConditionRef { fact, predicate })
}

fn scalar(value: &Value) -> Option<FactValue> {
    match value {
        Value::Bool(flag) => Some(FactValue::Bool(*flag)),
        Value::Number(number) => number.as_f64().map(FactValue::Number),
        Value::String(text) => Some(FactValue::Text(text.clone())),
        Value::Null => Some(FactValue::Null),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn compatible(fact_kind: FactKind, value: &FactValue) -> bool {
    fact_kind == FactKind::Null || value.kind() == FactKind::Null || value.kind() == fact_kind
}
