//! School-age parameterization of the DSS: student exam findings, the school rule library, the
//! population summary with predictive insights, and alert translation.

mod alerts;
mod facts;
mod summary;

pub use alerts::{
    assignee_for, translate, AlertBundle, AlertPriority, AlertSeverity, AlertType, Assignee,
    FlaggedCondition, HealthAlert, RecommendedAction,
};
pub use facts::{
    canonical_category, skin_finding, ExamFindings, SchoolFact, StudentRecord,
    BMI_FOR_AGE_ALIASES, HEIGHT_FOR_AGE_ALIASES, SKIN_PRECEDENCE,
};
pub use summary::{
    generate_insights, ConcernCounters, SchoolInsight, SchoolPopulationReport, SchoolSummary,
    StudentReport, NO_CONCERN_INSIGHT,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::assessment::{Domain, ExtractionError, IndividualAssessment, Subject};
use super::engine::{RuleGroupId, RuleSource};
use super::facts::{FactMap, Gender};
use super::filter::Category;
use super::rules::RiskLevel;

const RULE_SOURCES: &[RuleSource<'static>] = &[
    RuleSource {
        label: "school/nutrition.json",
        document: include_str!("../../../rules/school/nutrition.json"),
    },
    RuleSource {
        label: "school/vision-hearing.json",
        document: include_str!("../../../rules/school/vision-hearing.json"),
    },
    RuleSource {
        label: "school/communicable-disease.json",
        document: include_str!("../../../rules/school/communicable-disease.json"),
    },
    RuleSource {
        label: "school/preventive-care.json",
        document: include_str!("../../../rules/school/preventive-care.json"),
    },
    RuleSource {
        label: "school/risk-stratification.json",
        document: include_str!("../../../rules/school/risk-stratification.json"),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchoolGroup {
    Nutrition,
    VisionHearing,
    CommunicableDisease,
    PreventiveCare,
    RiskStratification,
}

impl RuleGroupId for SchoolGroup {
    const ALL: &'static [Self] = &[
        SchoolGroup::Nutrition,
        SchoolGroup::VisionHearing,
        SchoolGroup::CommunicableDisease,
        SchoolGroup::PreventiveCare,
        SchoolGroup::RiskStratification,
    ];

    fn name(self) -> &'static str {
        match self {
            SchoolGroup::Nutrition => "nutrition",
            SchoolGroup::VisionHearing => "vision-hearing",
            SchoolGroup::CommunicableDisease => "communicable-disease",
            SchoolGroup::PreventiveCare => "preventive-care",
            SchoolGroup::RiskStratification => "risk-stratification",
        }
    }

    fn is_stratification(self) -> bool {
        self == SchoolGroup::RiskStratification
    }
}

/// School health domain marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct School;

impl Domain for School {
    type Fact = SchoolFact;
    type Group = SchoolGroup;
    type Record = StudentRecord;

    const NAME: &'static str = "school";

    fn rule_sources() -> Vec<RuleSource<'static>> {
        RULE_SOURCES.to_vec()
    }

    fn extract(
        record: &StudentRecord,
        _today: NaiveDate,
    ) -> Result<FactMap<SchoolFact>, ExtractionError> {
        facts::extract(record)
    }

    fn applicable_groups(_facts: &FactMap<SchoolFact>) -> Vec<SchoolGroup> {
        SchoolGroup::ALL
            .iter()
            .copied()
            .filter(|group| !group.is_stratification())
            .collect()
    }

    fn stratification_group() -> SchoolGroup {
        SchoolGroup::RiskStratification
    }

    fn subject(record: &StudentRecord) -> Subject {
        Subject {
            id: record.id.clone(),
            name: record.name.clone(),
            gender: Gender::parse(record.gender.as_deref()),
            age: record.age,
        }
    }
}

/// Population-level concerns tracked by the school summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchoolConcern {
    UnderNutrition,
    OverNutrition,
    Stunting,
    VisionHearing,
    NotDewormed,
    IncompleteImmunization,
    Communicable,
}

const COMMUNICABLE_CATEGORY: &str = "Communicable Disease";

impl SchoolConcern {
    pub const ALL: [SchoolConcern; 7] = [
        SchoolConcern::UnderNutrition,
        SchoolConcern::OverNutrition,
        SchoolConcern::Stunting,
        SchoolConcern::VisionHearing,
        SchoolConcern::NotDewormed,
        SchoolConcern::IncompleteImmunization,
        SchoolConcern::Communicable,
    ];

    /// Flag labels that count toward this concern.
    pub const fn flags(self) -> &'static [&'static str] {
        match self {
            SchoolConcern::UnderNutrition => {
                &["Severe Under Nutrition Risk", "Under Nutrition Risk"]
            }
            SchoolConcern::OverNutrition => &["Over Nutrition Risk", "Obesity Risk"],
            SchoolConcern::Stunting => &["Severely Stunted Growth", "Stunted Growth Risk"],
            SchoolConcern::VisionHearing => &["Vision Problem", "Hearing Problem"],
            SchoolConcern::NotDewormed => &["Not Dewormed"],
            SchoolConcern::IncompleteImmunization => &["Incomplete Immunization"],
            SchoolConcern::Communicable => &[],
        }
    }

    pub fn observed_in(self, assessment: &IndividualAssessment) -> bool {
        match self {
            SchoolConcern::Communicable => assessment
                .risks
                .iter()
                .any(|risk| risk.category == COMMUNICABLE_CATEGORY),
            _ => self.flags().iter().any(|label| assessment.has_flag(label)),
        }
    }
}

/// Case-management list keys for the school population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchoolCategory {
    UnderNutrition,
    OverNutrition,
    VisionHearing,
    NotDewormed,
    IncompleteImmunization,
    HighRisk,
    MediumRisk,
    LowRisk,
    Unclassified,
}

impl Category for SchoolCategory {
    fn matches(&self, assessment: &IndividualAssessment) -> bool {
        match self {
            SchoolCategory::UnderNutrition => SchoolConcern::UnderNutrition.observed_in(assessment),
            SchoolCategory::OverNutrition => SchoolConcern::OverNutrition.observed_in(assessment),
            SchoolCategory::VisionHearing => SchoolConcern::VisionHearing.observed_in(assessment),
            SchoolCategory::NotDewormed => SchoolConcern::NotDewormed.observed_in(assessment),
            SchoolCategory::IncompleteImmunization => {
                SchoolConcern::IncompleteImmunization.observed_in(assessment)
            }
            SchoolCategory::HighRisk => assessment.risk_level == RiskLevel::High,
            SchoolCategory::MediumRisk => assessment.risk_level == RiskLevel::Medium,
            SchoolCategory::LowRisk => assessment.risk_level == RiskLevel::Low,
            SchoolCategory::Unclassified => assessment.risk_level == RiskLevel::Unclassified,
        }
    }
}
