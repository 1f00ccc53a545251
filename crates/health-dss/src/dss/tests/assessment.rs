use super::common::*;
use crate::config::DssConfig;
use crate::dss::assessment::{
    AssessmentError, Assessor, Domain, FailurePolicy, FitnessDecision, CLEARANCE_MARKER,
};
use crate::dss::personnel::{Personnel, PersonnelFact, PersonnelGroup};
use crate::dss::registry::DssRegistry;
use crate::dss::school::ExamFindings;
use crate::dss::rules::{RiskLevel, Severity};

fn personnel_with(policy: FailurePolicy) -> Assessor<Personnel> {
    personnel_assessor(policy)
}

#[test]
fn record_with_every_field_defaulted_is_low_risk_and_fit() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let assessment = assessor
        .assess_record(&personnel_record("E-1"), today())
        .expect("assessment succeeds");

    assert!(assessment.risks_flagged.is_empty());
    assert!(assessment.recommendations.is_empty());
    assert_eq!(assessment.risks_count, 0);
    assert_eq!(assessment.fitness_to_work, FitnessDecision::Fit);
    assert_eq!(assessment.risk_level, RiskLevel::Low);
}

#[test]
fn family_history_of_hypertension_is_flagged_and_medium_risk() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let assessment = assessor
        .assess_record(&hypertensive_record("E-2"), today())
        .expect("assessment succeeds");

    assert_eq!(assessment.risks_flagged, vec!["Hypertension".to_string()]);
    assert_eq!(
        assessment.recommendations,
        vec![
            "Monitor blood pressure monthly".to_string(),
            "Reduce dietary salt intake".to_string(),
            "Refer to physician for antihypertensive review".to_string(),
        ]
    );
    assert_eq!(assessment.risk_level, RiskLevel::Medium);
    assert_eq!(assessment.fitness_to_work, FitnessDecision::Fit);
}

#[test]
fn positive_malaria_is_critical_and_high_risk() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut record = personnel_record("E-3");
    record.health_card.present_health_status.malaria = true;
    record.health_card.present_health_status.fever = true;
    record.health_card.present_health_status.chills = true;

    let assessment = assessor
        .assess_record(&record, today())
        .expect("assessment succeeds");

    assert!(assessment.has_flag("Malaria"));
    assert!(!assessment.has_flag("Possible Malaria"));
    assert_eq!(assessment.risks[0].severity, Severity::Critical);
    assert_eq!(assessment.risk_level, RiskLevel::High);
}

#[test]
fn duplicate_flag_keeps_the_earlier_group_and_its_recommendations() {
    let library = personnel_library_with(&[
        (
            PersonnelGroup::Hypertension,
            &flag_rule("hypertension", "Hypertension", &["first"]),
        ),
        (PersonnelGroup::Cvd, &flag_rule("cvd", "Hypertension", &["second"])),
    ]);
    let assessor = Assessor::<Personnel>::with_library(library, FailurePolicy::FailOpen);
    let mut facts = personnel_facts();
    facts.set(PersonnelFact::FamilyHypertension, true);

    let assessment = assessor.assess(&facts).expect("assessment succeeds");

    assert_eq!(assessment.risks_flagged, vec!["Hypertension".to_string()]);
    assert_eq!(assessment.recommendations, vec!["first".to_string()]);
    assert_eq!(assessment.risks_count, 1);
    assert_eq!(assessment.risk_level, RiskLevel::Unclassified);
}

#[test]
fn shipped_cvd_hypertension_flag_loses_to_the_hypertension_group() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut record = personnel_record("E-4");
    record.health_card.vital_signs.systolic = Some(150.0);
    record.health_card.present_health_status.chest_pain = true;

    let assessment = assessor
        .assess_record(&record, today())
        .expect("assessment succeeds");

    let occurrences = assessment
        .risks_flagged
        .iter()
        .filter(|flag| *flag == "Hypertension")
        .count();
    assert_eq!(occurrences, 1);
    assert_eq!(assessment.risks[0].severity, Severity::Moderate);
    assert!(assessment
        .recommendations
        .contains(&"Monitor blood pressure monthly".to_string()));
    assert!(!assessment
        .recommendations
        .contains(&"Echocardiogram referral".to_string()));
    assert_eq!(assessment.risk_level, RiskLevel::Medium);
}

#[test]
fn assessing_the_same_record_twice_is_identical() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut record = hypertensive_record("E-5");
    record.health_card.smoking.current = true;
    record.health_card.smoking.sticks_per_day = Some(30.0);
    record.health_card.smoking.year_started = Some(2005);
    record.health_card.present_health_status.cough = true;
    record.health_card.present_health_status.cough_weeks = Some(3.0);

    let first = assessor.assess_record(&record, today()).expect("first run");
    let second = assessor.assess_record(&record, today()).expect("second run");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serializes"),
        serde_json::to_string(&second).expect("serializes")
    );
}

#[test]
fn fail_open_skips_a_broken_group_and_continues() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut facts = personnel_facts();
    facts.set(PersonnelFact::Systolic, "high");
    facts.set(PersonnelFact::Smoker, true);

    let assessment = assessor.assess(&facts).expect("fail-open never errors");

    assert!(!assessment.has_flag("Hypertension"));
    assert!(assessment.has_flag("High risk: Smoking"));
    assert_eq!(assessment.risk_level, RiskLevel::Unclassified);
}

#[test]
fn fail_fast_reports_the_first_broken_group() {
    let assessor = personnel_with(FailurePolicy::FailFast);
    let mut facts = personnel_facts();
    facts.set(PersonnelFact::Systolic, "high");

    match assessor.assess(&facts) {
        Err(AssessmentError::Evaluation { domain, source }) => {
            assert_eq!(domain, Personnel::NAME);
            assert_eq!(source.group, "hypertension");
            assert_eq!(source.source.fact, "vitalSigns.systolic");
        }
        other => panic!("expected evaluation failure, got {other:?}"),
    }
}

#[test]
fn invalid_measurement_is_an_extraction_error() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    match assessor.assess_record(&invalid_record("E-6"), today()) {
        Err(AssessmentError::Extraction(error)) => {
            assert_eq!(error.field, "vitalSigns.systolic");
            assert_eq!(error.value, -5.0);
        }
        other => panic!("expected extraction failure, got {other:?}"),
    }
}

#[test]
fn clearance_marker_in_any_surviving_flag_requires_clearance() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut record = personnel_record("E-7");
    record.health_card.vital_signs.systolic = Some(190.0);

    let assessment = assessor
        .assess_record(&record, today())
        .expect("assessment succeeds");

    assert!(assessment
        .risks_flagged
        .iter()
        .any(|flag| flag.contains(CLEARANCE_MARKER)));
    assert_eq!(assessment.fitness_to_work, FitnessDecision::NeedsClearance);
    assert_eq!(assessment.risk_level, RiskLevel::High);
}

#[test]
fn gender_specific_groups_only_run_for_matching_gender() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut female = personnel_record("E-8");
    female.gender = Some("F".to_string());
    female.health_card.reproductive.breast_mass = true;
    female.health_card.reproductive.cervical_screening_up_to_date = true;

    let assessment = assessor
        .assess_record(&female, today())
        .expect("assessment succeeds");
    assert_eq!(assessment.risks_flagged, vec!["Breast Mass".to_string()]);

    let mut male = female.clone();
    male.gender = Some("Male".to_string());
    let assessment = assessor
        .assess_record(&male, today())
        .expect("assessment succeeds");
    assert!(!assessment.has_flag("Breast Mass"));

    let groups = Personnel::applicable_groups(&Personnel::extract(&male, today()).expect("valid"));
    assert!(groups.contains(&PersonnelGroup::MaleRepro));
    assert!(!groups.contains(&PersonnelGroup::FemaleRepro));
    assert!(!groups.contains(&PersonnelGroup::RiskStratification));
}

#[test]
fn unknown_gender_runs_neither_reproductive_group() {
    let mut record = personnel_record("E-9");
    record.gender = None;
    let facts = Personnel::extract(&record, today()).expect("valid");
    let groups = Personnel::applicable_groups(&facts);

    assert!(!groups.contains(&PersonnelGroup::MaleRepro));
    assert!(!groups.contains(&PersonnelGroup::FemaleRepro));
    assert_eq!(groups.first(), Some(&PersonnelGroup::Hypertension));
}

#[tokio::test]
async fn concurrent_group_evaluation_matches_sequential_merge() {
    let assessor = personnel_with(FailurePolicy::FailOpen);
    let mut record = hypertensive_record("E-10");
    record.health_card.vital_signs.systolic = Some(185.0);
    record.health_card.present_health_status.chest_pain = true;
    record.health_card.present_health_status.palpitations = true;
    record.health_card.vital_signs.bmi = Some(32.0);

    let facts = Personnel::extract(&record, today()).expect("valid");
    let sequential = assessor.assess(&facts).expect("sequential");
    let concurrent = assessor
        .assess_concurrent(facts)
        .await
        .expect("concurrent");

    assert_eq!(sequential, concurrent);
    assert_eq!(
        concurrent.risks_flagged.first().map(String::as_str),
        Some("Hypertension")
    );
}

#[tokio::test]
async fn registry_group_concurrency_switch_keeps_assessments_identical() {
    let sequential = DssRegistry::load(&DssConfig::default()).expect("libraries compile");
    let concurrent = DssRegistry::load(&DssConfig {
        concurrent_groups: true,
        ..DssConfig::default()
    })
    .expect("libraries compile");

    let mut employee = hypertensive_record("E-11");
    employee.health_card.vital_signs.systolic = Some(190.0);
    employee.health_card.smoking.current = true;
    let expected = sequential
        .assess_personnel(&employee, today())
        .await
        .expect("sequential assessment");
    let actual = concurrent
        .assess_personnel(&employee, today())
        .await
        .expect("concurrent assessment");
    assert_eq!(actual, expected);
    assert_eq!(actual.fitness_to_work, FitnessDecision::NeedsClearance);

    let student = student_record(
        "S-11",
        ExamFindings {
            bmi_for_age: Some("Wasted".to_string()),
            vision_screening: Some("Failed".to_string()),
            ..healthy_findings()
        },
    );
    let expected = sequential
        .assess_student(&student, today())
        .await
        .expect("sequential assessment");
    let actual = concurrent
        .assess_student(&student, today())
        .await
        .expect("concurrent assessment");
    assert_eq!(actual, expected);

    let broken = invalid_record("E-12");
    assert!(matches!(
        concurrent.assess_personnel(&broken, today()).await,
        Err(AssessmentError::Extraction(_))
    ));
}
