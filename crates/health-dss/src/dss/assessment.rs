//! Per-individual assessment: group selection, ordered merge, flag deduplication, fitness
//! derivation and risk stratification.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::engine::{GroupEvaluationError, RuleGroupId, RuleLibrary, RuleSource};
use super::facts::{FactKey, FactMap, Gender};
use super::rules::{LibraryError, RiskLevel, RuleEvent, Severity, StratificationEvent};

/// Flag labels carrying this marker gate the individual behind a clearance.
pub const CLEARANCE_MARKER: &str = "fitness-to-work clearance";

/// What happens when a rule group cannot be evaluated for one individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and treat the group as having fired nothing.
    FailOpen,
    /// Abort the individual's assessment with the evaluation error.
    FailFast,
}

/// Identity and demographics of the person behind a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub age: Option<f64>,
}

/// Binds a fact schema, its rule groups and its raw record shape together.
pub trait Domain: Send + Sync + 'static {
    type Fact: FactKey;
    type Group: RuleGroupId;
    type Record: Send + Sync + 'static;

    const NAME: &'static str;

    fn rule_sources() -> Vec<RuleSource<'static>>;

    /// Build the fully-defaulted fact map for one record.
    fn extract(record: &Self::Record, today: NaiveDate)
        -> Result<FactMap<Self::Fact>, ExtractionError>;

    /// Flag groups to run for these facts, in fixed merge order.
    fn applicable_groups(facts: &FactMap<Self::Fact>) -> Vec<Self::Group>;

    fn stratification_group() -> Self::Group;

    fn subject(record: &Self::Record) -> Subject;
}

/// Raw record holds a measurement no fact can represent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("field '{field}' holds invalid measurement {value}")]
pub struct ExtractionError {
    pub field: &'static str,
    pub value: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("{domain} assessment failed: {source}")]
    Evaluation {
        domain: &'static str,
        source: GroupEvaluationError,
    },
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("assessment exceeded {0:?}")]
    TimedOut(Duration),
    #[error("assessment task did not complete: {0}")]
    Join(String),
}

/// Fitness-to-work decision derived from surviving flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitnessDecision {
    #[serde(rename = "Fit")]
    Fit,
    #[serde(rename = "Needs clearance")]
    NeedsClearance,
}

impl FitnessDecision {
    pub const fn label(self) -> &'static str {
        match self {
            FitnessDecision::Fit => "Fit",
            FitnessDecision::NeedsClearance => "Needs clearance",
        }
    }
}

/// One surviving flag with the recommendations it contributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedRisk {
    pub flag: String,
    pub category: String,
    pub severity: Severity,
    pub counter: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualAssessment {
    pub risks_flagged: Vec<String>,
    pub recommendations: Vec<String>,
    pub fitness_to_work: FitnessDecision,
    pub risk_level: RiskLevel,
    pub risks: Vec<FlaggedRisk>,
    pub risks_count: usize,
}

impl IndividualAssessment {
    /// Placeholder for an individual whose evaluation failed inside a batch.
    pub fn unclassified() -> Self {
        Self {
            risks_flagged: Vec::new(),
            recommendations: Vec::new(),
            fitness_to_work: FitnessDecision::Fit,
            risk_level: RiskLevel::Unclassified,
            risks: Vec::new(),
            risks_count: 0,
        }
    }

    pub fn has_flag(&self, label: &str) -> bool {
        self.risks_flagged.iter().any(|flag| flag == label)
    }
}

/// Runs one domain's rule library for single individuals.
pub struct Assessor<D: Domain> {
    library: Arc<RuleLibrary<D::Fact, D::Group>>,
    policy: FailurePolicy,
}

impl<D: Domain> Clone for Assessor<D> {
    fn clone(&self) -> Self {
        Self {
            library: Arc::clone(&self.library),
            policy: self.policy,
        }
    }
}

impl<D: Domain> Assessor<D> {
    /// Compile the domain's shipped rule library.
    pub fn load(policy: FailurePolicy) -> Result<Self, LibraryError> {
        let library = RuleLibrary::compile(D::NAME, D::rule_sources())?;
        Ok(Self::with_library(Arc::new(library), policy))
    }

    pub fn with_library(
        library: Arc<RuleLibrary<D::Fact, D::Group>>,
        policy: FailurePolicy,
    ) -> Self {
        Self { library, policy }
    }

    pub fn library(&self) -> &RuleLibrary<D::Fact, D::Group> {
        &self.library
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn assess_record(
        &self,
        record: &D::Record,
        today: NaiveDate,
    ) -> Result<IndividualAssessment, AssessmentError> {
        let facts = D::extract(record, today)?;
        let assessment = self.assess(&facts)?;
        debug!(
            domain = D::NAME,
            subject = %D::subject(record).id,
            risk_level = %assessment.risk_level,
            flags = assessment.risks_count,
            "individual assessed"
        );
        Ok(assessment)
    }

    /// Same output as [`Assessor::assess_record`], with the flag groups evaluated through
    /// [`Assessor::assess_concurrent`].
    pub async fn assess_record_concurrent(
        &self,
        record: &D::Record,
        today: NaiveDate,
    ) -> Result<IndividualAssessment, AssessmentError> {
        let facts = D::extract(record, today)?;
        let assessment = self.assess_concurrent(facts).await?;
        debug!(
            domain = D::NAME,
            subject = %D::subject(record).id,
            risk_level = %assessment.risk_level,
            flags = assessment.risks_count,
            "individual assessed with concurrent groups"
        );
        Ok(assessment)
    }

    /// Evaluate groups one after another in fixed order.
    pub fn assess(
        &self,
        facts: &FactMap<D::Fact>,
    ) -> Result<IndividualAssessment, AssessmentError> {
        let batches = D::applicable_groups(facts)
            .into_iter()
            .map(|group| self.fire(group, facts))
            .collect::<Result<Vec<_>, _>>()?;
        let stratification = self.fire(D::stratification_group(), facts)?;
        Ok(merge_events(batches, &stratification))
    }

    /// Evaluate groups as concurrent blocking tasks and gather them back by slot, so the merge
    /// sees the same order as [`Assessor::assess`] whatever the completion order.
    pub async fn assess_concurrent(
        &self,
        facts: FactMap<D::Fact>,
    ) -> Result<IndividualAssessment, AssessmentError> {
        let facts = Arc::new(facts);
        let groups = D::applicable_groups(&facts);
        let mut slots: Vec<Option<Vec<RuleEvent>>> = vec![None; groups.len()];

        let mut tasks = JoinSet::new();
        for (slot, group) in groups.into_iter().enumerate() {
            let assessor = self.clone();
            let facts = Arc::clone(&facts);
            tasks.spawn_blocking(move || (slot, assessor.fire(group, &facts)));
        }

        while let Some(joined) = tasks.join_next().await {
            let (slot, fired) = joined.map_err(|err| AssessmentError::Join(err.to_string()))?;
            slots[slot] = Some(fired?);
        }

        let batches = slots.into_iter().map(Option::unwrap_or_default).collect();
        let stratification = self.fire(D::stratification_group(), &facts)?;
        Ok(merge_events(batches, &stratification))
    }

    fn fire(
        &self,
        group: D::Group,
        facts: &FactMap<D::Fact>,
    ) -> Result<Vec<RuleEvent>, AssessmentError> {
        match self.library.run_group(group, facts) {
            Ok(events) => Ok(events),
            Err(error) => match self.policy {
                FailurePolicy::FailOpen => {
                    warn!(
                        domain = D::NAME,
                        group = error.group,
                        rule = %error.rule,
                        error = %error.source,
                        "rule group failed; continuing with no events"
                    );
                    Ok(Vec::new())
                }
                FailurePolicy::FailFast => Err(AssessmentError::Evaluation {
                    domain: D::NAME,
                    source: error,
                }),
            },
        }
    }
}

/// Merge group outputs in the given order. The first event carrying a flag label wins; later
/// events with the same label are dropped together with their recommendations.
pub fn merge_events(
    batches: Vec<Vec<RuleEvent>>,
    stratification: &[RuleEvent],
) -> IndividualAssessment {
    let mut seen = HashSet::new();
    let mut risks = Vec::new();

    for event in batches.into_iter().flatten() {
        let RuleEvent::Flag(flag) = event else {
            continue;
        };
        if !seen.insert(flag.flag.clone()) {
            continue;
        }
        risks.push(FlaggedRisk {
            flag: flag.flag,
            category: flag.category,
            severity: flag.severity,
            counter: flag.counter,
            recommendations: flag.recommendations,
        });
    }

    let mut recommendations: Vec<String> = Vec::new();
    for recommendation in risks.iter().flat_map(|risk| risk.recommendations.iter()) {
        if !recommendations.contains(recommendation) {
            recommendations.push(recommendation.clone());
        }
    }

    let fitness_to_work = if risks.iter().any(|risk| risk.flag.contains(CLEARANCE_MARKER)) {
        FitnessDecision::NeedsClearance
    } else {
        FitnessDecision::Fit
    };

    IndividualAssessment {
        risks_flagged: risks.iter().map(|risk| risk.flag.clone()).collect(),
        recommendations,
        fitness_to_work,
        risk_level: select_risk_level(stratification),
        risks_count: risks.len(),
        risks,
    }
}

/// Lowest priority number wins; on equal priority the first-declared event is kept.
pub fn select_risk_level(events: &[RuleEvent]) -> RiskLevel {
    let mut selected: Option<&StratificationEvent> = None;
    for event in events {
        if let RuleEvent::Stratification(candidate) = event {
            if selected.map_or(true, |current| candidate.priority < current.priority) {
                selected = Some(candidate);
            }
        }
    }
    selected.map_or(RiskLevel::Unclassified, |event| event.risk_level)
}
