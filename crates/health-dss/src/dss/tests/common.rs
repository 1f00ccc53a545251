use std::sync::Arc;

use chrono::NaiveDate;

use crate::dss::assessment::{Assessor, Domain, FailurePolicy};
use crate::dss::engine::{RuleGroupId, RuleLibrary, RuleSource};
use crate::dss::facts::FactMap;
use crate::dss::personnel::{Personnel, PersonnelFact, PersonnelGroup, PersonnelRecord};
use crate::dss::school::{ExamFindings, School, StudentRecord};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn personnel_assessor(policy: FailurePolicy) -> Assessor<Personnel> {
    Assessor::load(policy).expect("shipped personnel library compiles")
}

pub(super) fn school_assessor() -> Assessor<School> {
    Assessor::load(FailurePolicy::FailOpen).expect("shipped school library compiles")
}

pub(super) fn personnel_facts() -> FactMap<PersonnelFact> {
    FactMap::with_defaults()
}

/// Personnel library where the listed groups are replaced and every other group is empty.
pub(super) fn personnel_library_with(
    overrides: &[(PersonnelGroup, &str)],
) -> Arc<RuleLibrary<PersonnelFact, PersonnelGroup>> {
    let documents: Vec<(String, String)> = PersonnelGroup::ALL
        .iter()
        .map(|group| {
            let document = overrides
                .iter()
                .find(|(candidate, _)| candidate == group)
                .map(|(_, document)| document.to_string())
                .unwrap_or_else(|| format!(r#"{{ "group": "{}", "rules": [] }}"#, group.name()));
            (group.name().to_string(), document)
        })
        .collect();
    let sources = documents.iter().map(|(label, document)| RuleSource {
        label,
        document,
    });
    Arc::new(RuleLibrary::compile(Personnel::NAME, sources).expect("test library compiles"))
}

pub(super) fn flag_rule(group: &str, flag: &str, recommendations: &[&str]) -> String {
    let recommendations = serde_json::to_string(recommendations).expect("serializes");
    format!(
        r#"{{
            "group": "{group}",
            "rules": [{{
                "name": "{group}-{flag}",
                "conditions": {{
                    "all": [{{ "fact": "familyHistory.hypertension", "operator": "equal", "value": true }}]
                }},
                "event": {{
                    "type": "flag",
                    "params": {{
                        "category": "Test",
                        "severity": "moderate",
                        "counter": "test",
                        "flag": "{flag}",
                        "recommendations": {recommendations}
                    }}
                }}
            }}]
        }}"#
    )
}

pub(super) fn personnel_record(id: &str) -> PersonnelRecord {
    PersonnelRecord {
        id: id.to_string(),
        name: format!("Employee {id}"),
        gender: Some("M".to_string()),
        age: Some(35.0),
        ..PersonnelRecord::default()
    }
}

pub(super) fn hypertensive_record(id: &str) -> PersonnelRecord {
    let mut record = personnel_record(id);
    record.health_card.family_history.hypertension = true;
    record
}

pub(super) fn invalid_record(id: &str) -> PersonnelRecord {
    let mut record = personnel_record(id);
    record.health_card.vital_signs.systolic = Some(-5.0);
    record
}

pub(super) fn student_record(id: &str, findings: ExamFindings) -> StudentRecord {
    StudentRecord {
        id: id.to_string(),
        name: format!("Student {id}"),
        gender: Some("Male".to_string()),
        age: Some(9.0),
        findings,
    }
}

/// Findings of a healthy, fully dewormed student.
pub(super) fn healthy_findings() -> ExamFindings {
    ExamFindings {
        bmi_for_age: Some("Normal".to_string()),
        height_for_age: Some("Normal".to_string()),
        deworming: Some("1st and 2nd round".to_string()),
        immunization: Some("Complete".to_string()),
        ..ExamFindings::default()
    }
}
