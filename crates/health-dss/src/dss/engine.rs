//! Compiled rule libraries and per-group evaluation.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::info;

use super::facts::{FactKey, FactMap};
use super::rules::{
    compile_document, evaluate_condition, EvaluationError, LibraryError, Rule, RuleEvent,
    RuleGroupDocument,
};

/// Named rule group of a domain. `ALL` is the fixed evaluation order.
pub trait RuleGroupId: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    /// Groups whose rules emit risk-level events instead of flags.
    fn is_stratification(self) -> bool;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|group| group.name() == name)
    }
}

/// Raw rule document handed to [`RuleLibrary::compile`].
#[derive(Debug, Clone, Copy)]
pub struct RuleSource<'a> {
    pub label: &'a str,
    pub document: &'a str,
}

/// Group failed while being evaluated against one fact map.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rule '{rule}' in group '{group}' failed: {source}")]
pub struct GroupEvaluationError {
    pub group: &'static str,
    pub rule: String,
    pub source: EvaluationError,
}

/// Immutable, fully compiled set of rule groups for one domain.
#[derive(Debug)]
pub struct RuleLibrary<K: FactKey, G: RuleGroupId> {
    domain: &'static str,
    groups: HashMap<G, Vec<Rule<K>>>,
}

impl<K: FactKey, G: RuleGroupId> RuleLibrary<K, G> {
    pub fn compile<'a>(
        domain: &'static str,
        sources: impl IntoIterator<Item = RuleSource<'a>>,
    ) -> Result<Self, LibraryError> {
        let mut groups: HashMap<G, Vec<Rule<K>>> = HashMap::new();

        for source in sources {
            let document: RuleGroupDocument =
                serde_json::from_str(source.document).map_err(|err| LibraryError::Malformed {
                    label: source.label.to_string(),
                    source: err,
                })?;

            let group = G::from_name(&document.group).ok_or_else(|| {
                LibraryError::UnknownGroup {
                    domain,
                    group: document.group.clone(),
                }
            })?;
            if groups.contains_key(&group) {
                return Err(LibraryError::DuplicateGroup {
                    domain,
                    group: document.group,
                });
            }

            let rules = compile_document::<K>(document)?;
            for rule in &rules {
                check_event_kind(group, rule)?;
            }
            groups.insert(group, rules);
        }

        if let Some(missing) = G::ALL.iter().find(|group| !groups.contains_key(*group)) {
            return Err(LibraryError::MissingGroup {
                domain,
                group: missing.name(),
            });
        }

        let library = Self { domain, groups };
        info!(
            domain,
            groups = library.groups.len(),
            rules = library.rule_count(),
            "rule library compiled"
        );
        Ok(library)
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    pub fn rules(&self, group: G) -> &[Rule<K>] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn rule_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Evaluate every rule of `group` independently; fired events keep declaration order.
    pub fn run_group(
        &self,
        group: G,
        facts: &FactMap<K>,
    ) -> Result<Vec<RuleEvent>, GroupEvaluationError> {
        let mut fired = Vec::new();
        for rule in self.rules(group) {
            let matched =
                evaluate_condition(&rule.conditions, facts).map_err(|source| {
                    GroupEvaluationError {
                        group: group.name(),
                        rule: rule.name.clone(),
                        source,
                    }
                })?;
            if matched {
                fired.push(rule.event.clone());
            }
        }
        Ok(fired)
    }
}

fn check_event_kind<K: FactKey, G: RuleGroupId>(
    group: G,
    rule: &Rule<K>,
) -> Result<(), LibraryError> {
    let found = match (&rule.event, group.is_stratification()) {
        (RuleEvent::Flag(_), false) | (RuleEvent::Stratification(_), true) => return Ok(()),
        (RuleEvent::Flag(_), true) => "flag",
        (RuleEvent::Stratification(_), false) => "stratification",
    };
    Err(LibraryError::EventMismatch {
        rule: rule.name.clone(),
        group: group.name(),
        found,
    })
}
