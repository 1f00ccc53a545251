use super::common::*;
use crate::config::DssConfig;
use crate::dss::assessment::FitnessDecision;
use crate::dss::filter::project;
use crate::dss::population::PopulationRunner;
use crate::dss::registry::DssRegistry;
use crate::dss::rules::{RiskLevel, Severity};
use crate::dss::school::{
    AlertPriority, AlertSeverity, AlertType, Assignee, ExamFindings, SchoolCategory,
    SchoolInsight, SchoolPopulationReport, NO_CONCERN_INSIGHT,
};

fn wasted_findings() -> ExamFindings {
    ExamFindings {
        bmi_for_age: Some("Wasted/Underweight".to_string()),
        ..healthy_findings()
    }
}

async fn school_batch(findings: Vec<ExamFindings>) -> SchoolPopulationReport {
    let records = findings
        .into_iter()
        .enumerate()
        .map(|(index, findings)| student_record(&format!("S-{index}"), findings))
        .collect();
    let entries = PopulationRunner::new(4, None)
        .run(&school_assessor(), records, today())
        .await;
    SchoolPopulationReport::from_entries(&entries)
}

#[test]
fn healthy_student_is_low_risk_without_flags() {
    let assessment = school_assessor()
        .assess_record(&student_record("S-1", healthy_findings()), today())
        .expect("assessment succeeds");

    assert!(assessment.risks_flagged.is_empty());
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert_eq!(assessment.fitness_to_work, FitnessDecision::Fit);
}

#[test]
fn severely_wasted_student_is_critical_and_high_risk() {
    let findings = ExamFindings {
        bmi_for_age: Some("Severely Wasted".to_string()),
        ..healthy_findings()
    };
    let assessment = school_assessor()
        .assess_record(&student_record("S-2", findings), today())
        .expect("assessment succeeds");

    assert_eq!(
        assessment.risks_flagged,
        vec!["Severe Under Nutrition Risk".to_string()]
    );
    assert_eq!(assessment.risks[0].severity, Severity::Critical);
    assert_eq!(assessment.risks[0].category, "Nutrition");
    assert_eq!(assessment.risk_level, RiskLevel::High);
}

#[test]
fn undocumented_deworming_and_competing_skin_findings() {
    let findings = ExamFindings {
        skin_scalp: Some("Scabies and head lice".to_string()),
        deworming: None,
        ..healthy_findings()
    };
    let assessment = school_assessor()
        .assess_record(&student_record("S-3", findings), today())
        .expect("assessment succeeds");

    assert_eq!(
        assessment.risks_flagged,
        vec![
            "Pediculosis (Head Lice)".to_string(),
            "Not Dewormed".to_string(),
        ]
    );
    assert_eq!(assessment.risk_level, RiskLevel::Low);
}

#[test]
fn unrecognised_nutrition_category_is_never_low_risk() {
    let findings = ExamFindings {
        bmi_for_age: Some("chubby".to_string()),
        ..healthy_findings()
    };
    let assessment = school_assessor()
        .assess_record(&student_record("S-4", findings), today())
        .expect("assessment succeeds");

    assert!(assessment.risks_flagged.is_empty());
    assert_eq!(assessment.risk_level, RiskLevel::Unclassified);
}

#[test]
fn iron_supplementation_applies_to_girls_from_ten() {
    let mut record = student_record("S-5", healthy_findings());
    record.gender = Some("F".to_string());
    record.age = Some(11.0);

    let assessment = school_assessor()
        .assess_record(&record, today())
        .expect("assessment succeeds");
    assert!(assessment.has_flag("Iron Supplementation Needed"));

    record.findings.iron_supplementation = true;
    let assessment = school_assessor()
        .assess_record(&record, today())
        .expect("assessment succeeds");
    assert!(!assessment.has_flag("Iron Supplementation Needed"));
}

#[tokio::test]
async fn insights_fire_strictly_above_threshold() {
    let mut findings = vec![healthy_findings(); 9];
    findings.push(wasted_findings());
    let report = school_batch(findings).await;
    assert_eq!(report.summary.concerns.under_nutrition, 1);
    assert_eq!(report.insights, vec![NO_CONCERN_INSIGHT.to_string()]);

    let mut findings = vec![healthy_findings(); 8];
    findings.extend([wasted_findings(), wasted_findings()]);
    let report = school_batch(findings).await;
    assert_eq!(
        report.insights,
        vec![SchoolInsight::UnderNutrition.message(20.0)]
    );
    assert!(report.insights[0].starts_with("20.0% of students"));
    assert_eq!(report.summary.risk_distribution.count(RiskLevel::Medium), 2);
    assert_eq!(report.summary.risk_distribution.count(RiskLevel::Low), 8);
}

#[tokio::test]
async fn empty_school_batch_reports_no_concern() {
    let report = school_batch(Vec::new()).await;

    assert_eq!(report.summary.total, 0);
    assert!(report.reports.is_empty());
    assert!(report
        .summary
        .concern_percentages
        .values()
        .all(|share| *share == 0.0));
    assert_eq!(report.insights, vec![NO_CONCERN_INSIGHT.to_string()]);
}

#[tokio::test]
async fn failed_student_stays_in_report_as_unclassified() {
    let mut broken = student_record("S-bad", healthy_findings());
    broken.age = Some(-1.0);
    let records = vec![
        student_record("S-ok", healthy_findings()),
        broken,
    ];
    let entries = PopulationRunner::new(2, None)
        .run(&school_assessor(), records, today())
        .await;
    let report = SchoolPopulationReport::from_entries(&entries);

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.failed, 1);
    assert!(report.reports[1].failed);
    assert_eq!(report.reports[1].assessment.risk_level, RiskLevel::Unclassified);
    assert_eq!(report.summary.risk_distribution.count(RiskLevel::Unclassified), 1);

    let json = serde_json::to_value(&report.reports[0]).expect("serializes");
    assert_eq!(json["id"], serde_json::json!("S-ok"));
    assert_eq!(json["riskLevel"], serde_json::json!("Low Risk"));
}

#[tokio::test]
async fn school_category_lists_matching_students() {
    let registry = DssRegistry::load(&DssConfig::default()).expect("libraries compile");
    let records = vec![
        student_record("S-1", wasted_findings()),
        student_record("S-2", healthy_findings()),
        student_record(
            "S-3",
            ExamFindings {
                vision_screening: Some("Failed, refer".to_string()),
                ..wasted_findings()
            },
        ),
    ];

    let rows = registry
        .school_category(records.clone(), SchoolCategory::UnderNutrition, today())
        .await;
    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, vec!["S-1", "S-3"]);
    assert_eq!(rows[1].identified_risks, "Under Nutrition Risk; Vision Problem");

    let entries = registry.runner().run(registry.school(), records, today()).await;
    let low = project(&entries, &SchoolCategory::LowRisk);
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, "S-2");
}

#[tokio::test]
async fn student_assessment_carries_translated_alerts() {
    let registry = DssRegistry::load(&DssConfig::default()).expect("libraries compile");
    let findings = ExamFindings {
        bmi_for_age: Some("Severely Wasted".to_string()),
        ..healthy_findings()
    };
    let result = registry
        .assess_student(&student_record("S-9", findings), today())
        .await
        .expect("assessment succeeds");

    let alerts = &result.alerts;
    assert_eq!(alerts.alerts.len(), 1);
    let alert = &alerts.alerts[0];
    assert_eq!(alert.alert_type, AlertType::Nutrition);
    assert_eq!(alert.title, "Severe Under Nutrition Risk");
    // Keyword classification: "Severe" is not "Severely", so the flag lands on "Risk".
    assert_eq!(alert.severity, AlertSeverity::Moderate);
    assert_eq!(alert.priority, AlertPriority::High);
    assert_eq!(alert.assigned_to, Assignee::Doctor);

    let assignees: Vec<Assignee> = alerts
        .recommendations
        .iter()
        .map(|action| action.assigned_to)
        .collect();
    assert_eq!(
        assignees,
        vec![Assignee::Doctor, Assignee::Nutritionist, Assignee::Parent]
    );
    assert_eq!(alerts.flagged_conditions[0].clinical_severity, Severity::Critical);
}
