//! Clinical decision support: declarative rule libraries evaluated over normalized fact maps,
//! per-individual assessments, and population dashboards for the personnel and school domains.

pub mod assessment;
pub mod engine;
pub mod facts;
pub mod filter;
pub mod personnel;
pub mod population;
pub mod registry;
pub mod rules;
pub mod school;

#[cfg(test)]
mod tests;

pub use assessment::{
    merge_events, select_risk_level, AssessmentError, Assessor, Domain, ExtractionError,
    FailurePolicy, FitnessDecision, FlaggedRisk, IndividualAssessment, Subject, CLEARANCE_MARKER,
};
pub use engine::{GroupEvaluationError, RuleGroupId, RuleLibrary, RuleSource};
pub use facts::{FactKey, FactKind, FactMap, FactValue, Gender};
pub use filter::{project, Category, CategoryProjection};
pub use population::{BatchEntry, PopulationRunner};
pub use registry::{DssRegistry, StudentAssessment};
pub use rules::{EvaluationError, LibraryError, Operator, RiskLevel, RuleEvent, Severity};
