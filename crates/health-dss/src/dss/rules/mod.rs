mod condition;
mod definition;

pub use condition::{evaluate_condition, evaluate_leaf, EvaluationError};
pub use definition::{
    compile_document, ConditionDefinition, LeafDefinition, LibraryError, RuleDefinition,
    RuleGroupDocument,
};

use std::fmt;

use serde::{Deserialize, Serialize};

use super::facts::{FactKey, FactValue};

/// Closed operator set understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    In,
    GreaterThan,
    GreaterThanInclusive,
    LessThan,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::Contains,
        Operator::In,
        Operator::GreaterThan,
        Operator::GreaterThanInclusive,
        Operator::LessThan,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "notEqual",
            Operator::Contains => "contains",
            Operator::In => "in",
            Operator::GreaterThan => "greaterThan",
            Operator::GreaterThanInclusive => "greaterThanInclusive",
            Operator::LessThan => "lessThan",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|operator| operator.name() == name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator fused with its compiled operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(FactValue),
    NotEqual(FactValue),
    Contains(String),
    In(Vec<FactValue>),
    GreaterThan(f64),
    GreaterThanInclusive(f64),
    LessThan(f64),
}

impl Predicate {
    pub const fn operator(&self) -> Operator {
        match self {
            Predicate::Equal(_) => Operator::Equal,
            Predicate::NotEqual(_) => Operator::NotEqual,
            Predicate::Contains(_) => Operator::Contains,
            Predicate::In(_) => Operator::In,
            Predicate::GreaterThan(_) => Operator::GreaterThan,
            Predicate::GreaterThanInclusive(_) => Operator::GreaterThanInclusive,
            Predicate::LessThan(_) => Operator::LessThan,
        }
    }
}

/// Leaf predicate over one fact.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRef<K: FactKey> {
    pub fact: K,
    pub predicate: Predicate,
}

/// Single-level condition tree. At least one block is always present after compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionNode<K: FactKey> {
    pub all: Option<Vec<ConditionRef<K>>>,
    pub any: Option<Vec<ConditionRef<K>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule<K: FactKey> {
    pub name: String,
    pub conditions: ConditionNode<K>,
    pub event: RuleEvent,
}

/// Event appended verbatim to a group's output when its rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "camelCase")]
pub enum RuleEvent {
    Flag(FlagEvent),
    Stratification(StratificationEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FlagEvent {
    pub category: String,
    pub severity: Severity,
    pub counter: String,
    pub flag: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Lower `priority` is more severe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StratificationEvent {
    pub risk_level: RiskLevel,
    pub priority: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Unclassified")]
    Unclassified,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::Low => "Low Risk",
            RiskLevel::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
