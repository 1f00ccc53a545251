use serde::{Deserialize, Serialize};
use tracing::debug;

use super::assessment::{FitnessDecision, IndividualAssessment};
use super::population::BatchEntry;
use super::rules::RiskLevel;

const TOP_RECOMMENDATIONS: usize = 3;
const JOIN_SEPARATOR: &str = "; ";

/// Exact predicate selecting individuals for one case-management list.
pub trait Category {
    fn matches(&self, assessment: &IndividualAssessment) -> bool;
}

/// Row of a filtered case-management list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProjection {
    pub id: String,
    pub name: String,
    pub risk_level: RiskLevel,
    pub identified_risks: String,
    pub risk_count: usize,
    pub fitness_to_work: FitnessDecision,
    pub top_recommendations: String,
}

impl CategoryProjection {
    pub fn new(id: &str, name: &str, assessment: &IndividualAssessment) -> Self {
        let top = assessment
            .recommendations
            .iter()
            .take(TOP_RECOMMENDATIONS)
            .map(String::as_str)
            .collect::<Vec<_>>();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            risk_level: assessment.risk_level,
            identified_risks: assessment.risks_flagged.join(JOIN_SEPARATOR),
            risk_count: assessment.risks_count,
            fitness_to_work: assessment.fitness_to_work,
            top_recommendations: top.join(JOIN_SEPARATOR),
        }
    }
}

/// Project the batch members whose assessment matches `category`, in input order. Failed
/// individuals are left out.
pub fn project<R, C: Category>(entries: &[BatchEntry<R>], category: &C) -> Vec<CategoryProjection> {
    entries
        .iter()
        .filter_map(|entry| match &entry.outcome {
            Ok(assessment) => Some((entry, assessment)),
            Err(err) => {
                debug!(subject = %entry.subject.id, reason = %err, "skipping failed individual");
                None
            }
        })
        .filter(|(_, assessment)| category.matches(assessment))
        .map(|(entry, assessment)| {
            CategoryProjection::new(&entry.subject.id, &entry.subject.name, assessment)
        })
        .collect()
}
