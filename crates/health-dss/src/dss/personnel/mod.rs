//! Occupational-health parameterization of the DSS: employee health cards, the personnel rule
//! library, the population dashboard and its preventive action plan.

mod dashboard;
mod facts;
mod planner;

pub use dashboard::{ConditionCounters, ConditionRates, PopulationDashboard, WatchedCondition};
pub use facts::{
    canonical_drinking_frequency, pack_years, AlcoholUse, BloodSugar, FamilyHistory, HealthCard,
    OccupationalHistory, PastMedicalHistory, PersonnelFact, PersonnelRecord, PhysicalExam,
    PresentHealthStatus, ReproductiveHealth, SmokingHistory, VitalSigns,
    DRINKING_FREQUENCY_ALIASES,
};
pub use planner::{preventive_action_plan, PreventiveAction};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::assessment::{Domain, ExtractionError, IndividualAssessment, Subject};
use super::engine::{RuleGroupId, RuleSource};
use super::facts::{FactMap, FactValue, Gender};
use super::filter::Category;
use super::population::BatchEntry;
use super::rules::RiskLevel;

const RULE_SOURCES: &[RuleSource<'static>] = &[
    RuleSource {
        label: "personnel/hypertension.json",
        document: include_str!("../../../rules/personnel/hypertension.json"),
    },
    RuleSource {
        label: "personnel/diabetes.json",
        document: include_str!("../../../rules/personnel/diabetes.json"),
    },
    RuleSource {
        label: "personnel/cvd.json",
        document: include_str!("../../../rules/personnel/cvd.json"),
    },
    RuleSource {
        label: "personnel/ptb.json",
        document: include_str!("../../../rules/personnel/ptb.json"),
    },
    RuleSource {
        label: "personnel/malaria.json",
        document: include_str!("../../../rules/personnel/malaria.json"),
    },
    RuleSource {
        label: "personnel/occupational-fitness.json",
        document: include_str!("../../../rules/personnel/occupational-fitness.json"),
    },
    RuleSource {
        label: "personnel/smoking.json",
        document: include_str!("../../../rules/personnel/smoking.json"),
    },
    RuleSource {
        label: "personnel/alcohol.json",
        document: include_str!("../../../rules/personnel/alcohol.json"),
    },
    RuleSource {
        label: "personnel/female-repro.json",
        document: include_str!("../../../rules/personnel/female-repro.json"),
    },
    RuleSource {
        label: "personnel/male-repro.json",
        document: include_str!("../../../rules/personnel/male-repro.json"),
    },
    RuleSource {
        label: "personnel/risk-stratification.json",
        document: include_str!("../../../rules/personnel/risk-stratification.json"),
    },
];

/// Rule groups of the personnel library, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonnelGroup {
    Hypertension,
    Diabetes,
    Cvd,
    Ptb,
    Malaria,
    OccupationalFitness,
    Smoking,
    Alcohol,
    FemaleRepro,
    MaleRepro,
    RiskStratification,
}

impl RuleGroupId for PersonnelGroup {
    const ALL: &'static [Self] = &[
        PersonnelGroup::Hypertension,
        PersonnelGroup::Diabetes,
        PersonnelGroup::Cvd,
        PersonnelGroup::Ptb,
        PersonnelGroup::Malaria,
        PersonnelGroup::OccupationalFitness,
        PersonnelGroup::Smoking,
        PersonnelGroup::Alcohol,
        PersonnelGroup::FemaleRepro,
        PersonnelGroup::MaleRepro,
        PersonnelGroup::RiskStratification,
    ];

    fn name(self) -> &'static str {
        match self {
            PersonnelGroup::Hypertension => "hypertension",
            PersonnelGroup::Diabetes => "diabetes",
            PersonnelGroup::Cvd => "cvd",
            PersonnelGroup::Ptb => "ptb",
            PersonnelGroup::Malaria => "malaria",
            PersonnelGroup::OccupationalFitness => "occupational-fitness",
            PersonnelGroup::Smoking => "smoking",
            PersonnelGroup::Alcohol => "alcohol",
            PersonnelGroup::FemaleRepro => "female-repro",
            PersonnelGroup::MaleRepro => "male-repro",
            PersonnelGroup::RiskStratification => "risk-stratification",
        }
    }

    fn is_stratification(self) -> bool {
        self == PersonnelGroup::RiskStratification
    }
}

impl PersonnelGroup {
    /// Gender a gender-specific group is restricted to.
    pub const fn required_gender(self) -> Option<Gender> {
        match self {
            PersonnelGroup::FemaleRepro => Some(Gender::Female),
            PersonnelGroup::MaleRepro => Some(Gender::Male),
            _ => None,
        }
    }
}

/// Occupational-health domain marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Personnel;

impl Domain for Personnel {
    type Fact = PersonnelFact;
    type Group = PersonnelGroup;
    type Record = PersonnelRecord;

    const NAME: &'static str = "personnel";

    fn rule_sources() -> Vec<RuleSource<'static>> {
        RULE_SOURCES.to_vec()
    }

    fn extract(
        record: &PersonnelRecord,
        today: NaiveDate,
    ) -> Result<FactMap<PersonnelFact>, ExtractionError> {
        facts::extract(record, today)
    }

    fn applicable_groups(facts: &FactMap<PersonnelFact>) -> Vec<PersonnelGroup> {
        let gender = facts.get(PersonnelFact::Gender);
        PersonnelGroup::ALL
            .iter()
            .copied()
            .filter(|group| !group.is_stratification())
            .filter(|group| match group.required_gender() {
                Some(required) => *gender == FactValue::from(required.label()),
                None => true,
            })
            .collect()
    }

    fn stratification_group() -> PersonnelGroup {
        PersonnelGroup::RiskStratification
    }

    fn subject(record: &PersonnelRecord) -> Subject {
        Subject {
            id: record.id.clone(),
            name: record.name.clone(),
            gender: Gender::parse(record.gender.as_deref()),
            age: record.age,
        }
    }
}

/// Case-management list keys for the personnel population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonnelCategory {
    Hypertension,
    Diabetes,
    Cvd,
    Ptb,
    Smoking,
    NeedsClearance,
    HighRisk,
    MediumRisk,
    LowRisk,
    Unclassified,
}

impl Category for PersonnelCategory {
    fn matches(&self, assessment: &IndividualAssessment) -> bool {
        match self {
            PersonnelCategory::Hypertension => {
                WatchedCondition::Hypertension.observed_in(assessment)
            }
            PersonnelCategory::Diabetes => WatchedCondition::Diabetes.observed_in(assessment),
            PersonnelCategory::Cvd => {
                WatchedCondition::CardiovascularDisease.observed_in(assessment)
            }
            PersonnelCategory::Ptb => WatchedCondition::PtbSuspect.observed_in(assessment),
            PersonnelCategory::Smoking => WatchedCondition::Smoking.observed_in(assessment),
            PersonnelCategory::NeedsClearance => {
                WatchedCondition::NeedsClearance.observed_in(assessment)
            }
            PersonnelCategory::HighRisk => assessment.risk_level == RiskLevel::High,
            PersonnelCategory::MediumRisk => assessment.risk_level == RiskLevel::Medium,
            PersonnelCategory::LowRisk => assessment.risk_level == RiskLevel::Low,
            PersonnelCategory::Unclassified => assessment.risk_level == RiskLevel::Unclassified,
        }
    }
}

/// Batch output of the personnel dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonnelPopulationReport {
    pub dashboard: PopulationDashboard,
    pub preventive_action_plan: Vec<String>,
}

impl PersonnelPopulationReport {
    pub fn from_entries(entries: &[BatchEntry<PersonnelRecord>]) -> Self {
        let dashboard = PopulationDashboard::from_entries(entries);
        let preventive_action_plan = preventive_action_plan(&dashboard);
        Self {
            dashboard,
            preventive_action_plan,
        }
    }
}
