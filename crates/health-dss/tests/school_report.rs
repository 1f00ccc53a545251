use chrono::NaiveDate;
use health_dss::config::DssConfig;
use health_dss::dss::school::{SchoolCategory, SchoolInsight, StudentRecord};
use health_dss::dss::{DssRegistry, RiskLevel};
use serde_json::json;

fn exam_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid exam date")
}

fn student(id: &str, findings: serde_json::Value) -> StudentRecord {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("Learner {id}"),
        "gender": "Female",
        "age": 8,
        "findings": findings,
    }))
    .expect("student record deserializes")
}

fn dewormed_and_immunized() -> serde_json::Value {
    json!({
        "bmiForAge": "Normal",
        "heightForAge": "Normal",
        "deworming": "1st and 2nd round",
        "immunization": "Complete"
    })
}

/// Five learners: one never dewormed, one obese with failed vision screening, three healthy.
fn classroom() -> Vec<StudentRecord> {
    vec![
        student(
            "L-1",
            json!({ "bmiForAge": "Normal", "heightForAge": "Normal", "immunization": "Complete" }),
        ),
        student(
            "L-2",
            json!({
                "bmiForAge": "Obese",
                "heightForAge": "Tall",
                "visionScreening": "Failed - refer",
                "deworming": "1st round",
                "immunization": "Complete"
            }),
        ),
        student("L-3", dewormed_and_immunized()),
        student("L-4", dewormed_and_immunized()),
        student("L-5", dewormed_and_immunized()),
    ]
}

#[tokio::test]
async fn report_keeps_roster_order_and_raises_insights() {
    let registry = DssRegistry::load(&DssConfig::default()).expect("rule libraries compile");
    let report = registry.school_report(classroom(), exam_day()).await;

    let ids: Vec<&str> = report.reports.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, vec!["L-1", "L-2", "L-3", "L-4", "L-5"]);

    assert_eq!(report.reports[0].assessment.risks_flagged, vec!["Not Dewormed"]);
    assert_eq!(
        report.reports[1].assessment.risks_flagged,
        vec!["Obesity Risk", "Vision Problem", "Second Deworming Round Due"]
    );
    assert_eq!(report.reports[1].assessment.risk_level, RiskLevel::Medium);

    let summary = &report.summary;
    assert_eq!(summary.total, 5);
    assert_eq!(summary.concerns.over_nutrition, 1);
    assert_eq!(summary.concerns.vision_hearing, 1);
    assert_eq!(summary.concerns.not_dewormed, 1);
    assert_eq!(summary.risk_distribution.count(RiskLevel::Low), 4);
    assert_eq!(summary.gender_distribution.female, 5);

    assert_eq!(
        report.insights,
        vec![
            SchoolInsight::OverNutrition.message(20.0),
            SchoolInsight::VisionHearing.message(20.0),
        ]
    );
}

#[tokio::test]
async fn vision_hearing_list_for_referral_day() {
    let registry = DssRegistry::load(&DssConfig::default()).expect("rule libraries compile");
    let rows = registry
        .school_category(classroom(), SchoolCategory::VisionHearing, exam_day())
        .await;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "L-2");
    assert_eq!(rows[0].name, "Learner L-2");
    assert_eq!(rows[0].risk_count, 3);
}

#[tokio::test]
async fn critical_referral_becomes_urgent_alert() {
    let registry = DssRegistry::load(&DssConfig::default()).expect("rule libraries compile");
    let record = student(
        "L-9",
        json!({
            "bmiForAge": "Normal",
            "heightForAge": "Normal",
            "heart": "Murmur",
            "deworming": "1st and 2nd round",
            "immunization": "Complete"
        }),
    );

    let result = registry
        .assess_student(&record, exam_day())
        .await
        .expect("assessment succeeds");
    assert_eq!(result.assessment.risk_level, RiskLevel::High);

    let json = serde_json::to_value(&result).expect("serializes");
    let alert = &json["alerts"]["alerts"][0];
    assert_eq!(alert["type"], json!("REFERRAL"));
    assert_eq!(alert["severity"], json!("SEVERE"));
    assert_eq!(alert["priority"], json!("URGENT"));
    assert_eq!(alert["targetDate"], json!("2025-07-08"));
    assert_eq!(alert["assignedTo"], json!("DOCTOR"));
    assert_eq!(
        json["alerts"]["flaggedConditions"][0]["clinicalSeverity"],
        json!("critical")
    );
}
