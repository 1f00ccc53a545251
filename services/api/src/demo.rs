use crate::infra::{parse_date, reference_date};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use health_dss::config::AppConfig;
use health_dss::dss::personnel::{
    HealthCard, PersonnelCategory, PersonnelPopulationReport, PersonnelRecord,
};
use health_dss::dss::school::{ExamFindings, SchoolCategory, SchoolPopulationReport, StudentRecord};
use health_dss::dss::{CategoryProjection, DssRegistry};
use health_dss::error::AppError;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DomainArg {
    Personnel,
    School,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Rule library the records are assessed against
    #[arg(long, value_enum)]
    pub(crate) domain: DomainArg,
    /// JSON file holding an array of records
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Reference date for age-dependent facts (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Only list individuals in this category (for example `hypertension` or `highRisk`)
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Print the JSON payload instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reporting date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        domain,
        input,
        today,
        category,
        json,
    } = args;

    let config = AppConfig::load()?;
    let registry = DssRegistry::load(&config.dss)?;
    let today = reference_date(today);
    let raw = std::fs::read_to_string(&input)?;

    match domain {
        DomainArg::Personnel => {
            let records: Vec<PersonnelRecord> = serde_json::from_str(&raw)?;
            match category {
                Some(category) => {
                    let category: PersonnelCategory = parse_category(&category)?;
                    let rows = registry.personnel_category(records, category, today).await;
                    emit(json, &rows, |rows| render_projection(&format!("{category:?}"), rows));
                }
                None => {
                    let report = registry.personnel_dashboard(records, today).await;
                    emit(json, &report, render_personnel_report);
                }
            }
        }
        DomainArg::School => {
            let records: Vec<StudentRecord> = serde_json::from_str(&raw)?;
            match category {
                Some(category) => {
                    let category: SchoolCategory = parse_category(&category)?;
                    let rows = registry.school_category(records, category, today).await;
                    emit(json, &rows, |rows| render_projection(&format!("{category:?}"), rows));
                }
                None => {
                    let report = registry.school_report(records, today).await;
                    emit(json, &report, render_school_report);
                }
            }
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let registry = DssRegistry::load(&config.dss)?;
    let today = reference_date(args.today);

    println!("Health decision support demo (evaluated {today})");
    println!(
        "Rule libraries: {} personnel rules, {} school rules",
        registry.personnel().library().rule_count(),
        registry.school().library().rule_count()
    );

    let report = registry.personnel_dashboard(demo_workforce(), today).await;
    render_personnel_report(&report);

    let rows = registry
        .personnel_category(demo_workforce(), PersonnelCategory::NeedsClearance, today)
        .await;
    render_projection("NeedsClearance", &rows);

    println!();
    let report = registry.school_report(demo_classroom(), today).await;
    render_school_report(&report);

    if let Some(student) = demo_classroom().first() {
        let result = registry.assess_student(student, today).await?;
        println!("\nAlerts for {}", student.name);
        for alert in &result.alerts.alerts {
            println!(
                "- [{:?}] {} -> {:?} by {}",
                alert.priority, alert.title, alert.assigned_to, alert.target_date
            );
        }
    }

    Ok(())
}

fn parse_category<C: serde::de::DeserializeOwned>(raw: &str) -> Result<C, AppError> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string())).map_err(AppError::from)
}

fn emit<T: Serialize>(json: bool, payload: &T, render: impl FnOnce(&T)) {
    if !json {
        render(payload);
        return;
    }
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{text}"),
        Err(err) => println!("JSON output unavailable: {err}"),
    }
}

pub(crate) fn render_personnel_report(report: &PersonnelPopulationReport) {
    let dashboard = &report.dashboard;
    println!("Personnel health dashboard");
    println!(
        "- {} individuals | {} assessed | {} failed",
        dashboard.total, dashboard.assessed, dashboard.failed
    );

    let rates = &dashboard.condition_rates;
    let counts = &dashboard.conditions;
    println!("\nConditions");
    for (label, count, rate) in [
        ("Hypertension", counts.hypertension, rates.hypertension),
        ("Diabetes", counts.diabetes, rates.diabetes),
        ("Cardiovascular disease", counts.cardiovascular_disease, rates.cardiovascular_disease),
        ("PTB suspect", counts.ptb_suspect, rates.ptb_suspect),
        ("Malaria", counts.malaria, rates.malaria),
        ("Smoking", counts.smoking, rates.smoking),
        ("Needs clearance", counts.needs_clearance, rates.needs_clearance),
    ] {
        println!("- {label}: {count} ({rate:.2}%)");
    }

    let ages = &dashboard.age_statistics;
    println!(
        "\nAge: mean {:.2} | median {:.2} | mode {} | sd {:.2} ({} valid ages)",
        ages.mean, ages.median, ages.mode, ages.standard_deviation, ages.count
    );
    println!("Risk levels");
    for (label, share) in &dashboard.risk_percentages {
        println!("- {label}: {share:.2}%");
    }

    if report.preventive_action_plan.is_empty() {
        println!("\nPreventive action plan: no threshold exceeded");
    } else {
        println!("\nPreventive action plan");
        for action in &report.preventive_action_plan {
            println!("- {action}");
        }
    }
}

pub(crate) fn render_school_report(report: &SchoolPopulationReport) {
    let summary = &report.summary;
    println!("School health summary");
    println!(
        "- {} students | {} assessed | {} failed",
        summary.total, summary.assessed, summary.failed
    );
    println!("\nConcerns");
    for (label, share) in &summary.concern_percentages {
        println!("- {label}: {share:.2}%");
    }
    println!("Risk levels");
    for (label, share) in &summary.risk_percentages {
        println!("- {label}: {share:.2}%");
    }

    println!("\nStudents");
    for row in &report.reports {
        let flags = if row.assessment.risks_flagged.is_empty() {
            "no findings".to_string()
        } else {
            row.assessment.risks_flagged.join(", ")
        };
        println!("- {} {}: {} [{}]", row.id, row.name, row.assessment.risk_level, flags);
    }

    println!("\nInsights");
    for insight in &report.insights {
        println!("- {insight}");
    }
}

pub(crate) fn render_projection(category: &str, rows: &[CategoryProjection]) {
    println!("\n{category}: {} individuals", rows.len());
    for row in rows {
        println!(
            "- {} {} | {} | {} | {} risks: {}",
            row.id,
            row.name,
            row.risk_level,
            row.fitness_to_work.label(),
            row.risk_count,
            row.identified_risks
        );
        if !row.top_recommendations.is_empty() {
            println!("    next: {}", row.top_recommendations);
        }
    }
}

fn demo_workforce() -> Vec<PersonnelRecord> {
    let employee = |id: &str, name: &str, gender: &str, age: f64, card: HealthCard| PersonnelRecord {
        id: id.to_string(),
        name: name.to_string(),
        gender: Some(gender.to_string()),
        age: Some(age),
        health_card: card,
    };

    let mut smoker = HealthCard::default();
    smoker.smoking.current = true;
    smoker.smoking.sticks_per_day = Some(25.0);
    smoker.smoking.year_started = Some(1998);

    let mut hypertensive = HealthCard::default();
    hypertensive.vital_signs.systolic = Some(184.0);
    hypertensive.vital_signs.diastolic = Some(102.0);
    hypertensive.present_health_status.headache = true;

    let mut cough = HealthCard::default();
    cough.present_health_status.cough = true;
    cough.present_health_status.cough_weeks = Some(4.0);
    cough.present_health_status.night_sweats = true;

    let mut diabetic = HealthCard::default();
    diabetic.past_medical_history.diabetes = true;
    diabetic.blood_sugar.fasting = Some(138.0);
    diabetic.reproductive.cervical_screening_up_to_date = true;

    vec![
        employee("EMP-001", "Welder", "M", 47.0, smoker),
        employee("EMP-002", "Shift Supervisor", "F", 56.0, hypertensive),
        employee("EMP-003", "Forklift Operator", "M", 33.0, cough),
        employee("EMP-004", "Payroll Clerk", "Female", 38.0, diabetic),
        employee("EMP-005", "Apprentice", "Male", 19.0, HealthCard::default()),
    ]
}

fn demo_classroom() -> Vec<StudentRecord> {
    let student = |id: &str, name: &str, gender: &str, age: f64, findings: ExamFindings| {
        StudentRecord {
            id: id.to_string(),
            name: name.to_string(),
            gender: Some(gender.to_string()),
            age: Some(age),
            findings,
        }
    };
    let routine = ExamFindings {
        bmi_for_age: Some("Normal".to_string()),
        height_for_age: Some("Normal".to_string()),
        deworming: Some("1st and 2nd round".to_string()),
        immunization: Some("Complete".to_string()),
        ..ExamFindings::default()
    };

    vec![
        student(
            "STU-01",
            "Grade 2 learner",
            "F",
            7.0,
            ExamFindings {
                bmi_for_age: Some("Severely Wasted".to_string()),
                deworming: None,
                ..routine.clone()
            },
        ),
        student(
            "STU-02",
            "Grade 5 learner",
            "M",
            10.0,
            ExamFindings {
                vision_screening: Some("Failed - refer".to_string()),
                skin_scalp: Some("Head lice".to_string()),
                ..routine.clone()
            },
        ),
        student(
            "STU-03",
            "Grade 6 learner",
            "F",
            12.0,
            ExamFindings {
                bmi_for_age: Some("Overweight".to_string()),
                immunization: Some("Incomplete".to_string()),
                ..routine.clone()
            },
        ),
        student("STU-04", "Grade 3 learner", "M", 8.0, routine),
    ]
}
