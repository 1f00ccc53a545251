//! Maps assessed flags into the alert, recommendation and flagged-condition records the school
//! health record keeps. Classification here is keyword heuristics over labels and advice text;
//! it never consults the rule library.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::dss::assessment::{FlaggedRisk, IndividualAssessment};
use crate::dss::rules::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Severe,
    Moderate,
    Mild,
}

impl AlertSeverity {
    pub fn classify(flag: &str) -> Self {
        if ["Severely", "Critical", "High Risk"]
            .iter()
            .any(|marker| flag.contains(marker))
        {
            AlertSeverity::Severe
        } else if ["Risk", "Problem", "Delay"]
            .iter()
            .any(|marker| flag.contains(marker))
        {
            AlertSeverity::Moderate
        } else {
            AlertSeverity::Mild
        }
    }

    pub const fn priority(self) -> AlertPriority {
        match self {
            AlertSeverity::Severe => AlertPriority::Urgent,
            AlertSeverity::Moderate => AlertPriority::High,
            AlertSeverity::Mild => AlertPriority::Medium,
        }
    }

    pub const fn response_days(self) -> i64 {
        match self {
            AlertSeverity::Severe => 7,
            AlertSeverity::Moderate => 14,
            AlertSeverity::Mild => 30,
        }
    }

    pub fn target_date(self, today: NaiveDate) -> NaiveDate {
        today + Duration::days(self.response_days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Urgent,
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assignee {
    Doctor,
    Parent,
    Nutritionist,
    Nurse,
}

const ASSIGNEE_KEYWORDS: &[(Assignee, &[&str])] = &[
    (Assignee::Doctor, &["doctor", "physician", "dentist", "specialist"]),
    (Assignee::Parent, &["parent", "guardian"]),
    (Assignee::Nutritionist, &["nutritionist", "feeding", "diet"]),
];

/// First matching role in keyword order; the school nurse otherwise.
pub fn assignee_for(text: &str) -> Assignee {
    let text = text.to_lowercase();
    ASSIGNEE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map_or(Assignee::Nurse, |(assignee, _)| *assignee)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Nutrition,
    VisionHearing,
    CommunicableDisease,
    PreventiveCare,
    Referral,
    General,
}

impl AlertType {
    pub fn from_category(category: &str) -> Self {
        match category {
            "Nutrition" => AlertType::Nutrition,
            "Vision/Hearing" => AlertType::VisionHearing,
            "Communicable Disease" => AlertType::CommunicableDisease,
            "Preventive Care" => AlertType::PreventiveCare,
            "Referral" => AlertType::Referral,
            _ => AlertType::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub priority: AlertPriority,
    pub target_date: NaiveDate,
    pub assigned_to: Assignee,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    pub flag: String,
    pub action: String,
    pub priority: AlertPriority,
    pub assigned_to: Assignee,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedCondition {
    pub condition: String,
    pub category: String,
    pub clinical_severity: Severity,
    pub severity: AlertSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertBundle {
    pub alerts: Vec<HealthAlert>,
    pub recommendations: Vec<RecommendedAction>,
    pub flagged_conditions: Vec<FlaggedCondition>,
}

/// One alert and one flagged condition per surviving flag, one action per recommendation.
pub fn translate(assessment: &IndividualAssessment, today: NaiveDate) -> AlertBundle {
    let mut bundle = AlertBundle::default();
    for risk in &assessment.risks {
        let severity = AlertSeverity::classify(&risk.flag);
        let priority = severity.priority();
        let target_date = severity.target_date(today);

        bundle.alerts.push(HealthAlert {
            alert_type: AlertType::from_category(&risk.category),
            title: risk.flag.clone(),
            description: describe(risk),
            severity,
            priority,
            target_date,
            assigned_to: assignee_for(&risk.recommendations.join(" ")),
        });

        bundle
            .recommendations
            .extend(risk.recommendations.iter().map(|action| RecommendedAction {
                flag: risk.flag.clone(),
                action: action.clone(),
                priority,
                assigned_to: assignee_for(action),
                target_date,
            }));

        bundle.flagged_conditions.push(FlaggedCondition {
            condition: risk.flag.clone(),
            category: risk.category.clone(),
            clinical_severity: risk.severity,
            severity,
        });
    }
    bundle
}

fn describe(risk: &FlaggedRisk) -> String {
    if risk.recommendations.is_empty() {
        format!("{} flagged during school health examination", risk.flag)
    } else {
        format!("{}: {}", risk.flag, risk.recommendations.join("; "))
    }
}
