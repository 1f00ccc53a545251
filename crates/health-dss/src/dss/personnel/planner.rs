use super::dashboard::{PopulationDashboard, WatchedCondition};
use crate::dss::rules::RiskLevel;

/// Population-level programs, checked in this order. Every action whose threshold is exceeded is
/// recommended; none suppresses another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreventiveAction {
    SmokingCessation,
    BloodPressureScreening,
    NutritionWorkshops,
    TuberculosisCampaign,
    EcgProgram,
    OccupationalHealthClinic,
    GeriatricPrograms,
    PriorityIntervention,
    ExpandedPreventivePrograms,
}

impl PreventiveAction {
    pub const ALL: [PreventiveAction; 9] = [
        PreventiveAction::SmokingCessation,
        PreventiveAction::BloodPressureScreening,
        PreventiveAction::NutritionWorkshops,
        PreventiveAction::TuberculosisCampaign,
        PreventiveAction::EcgProgram,
        PreventiveAction::OccupationalHealthClinic,
        PreventiveAction::GeriatricPrograms,
        PreventiveAction::PriorityIntervention,
        PreventiveAction::ExpandedPreventivePrograms,
    ];

    /// Percentage of the population that must be strictly exceeded.
    pub const fn threshold(self) -> f64 {
        match self {
            PreventiveAction::SmokingCessation => 20.0,
            PreventiveAction::BloodPressureScreening => 15.0,
            PreventiveAction::NutritionWorkshops => 10.0,
            PreventiveAction::TuberculosisCampaign => 5.0,
            PreventiveAction::EcgProgram => 10.0,
            PreventiveAction::OccupationalHealthClinic => 15.0,
            PreventiveAction::GeriatricPrograms => 25.0,
            PreventiveAction::PriorityIntervention => 15.0,
            PreventiveAction::ExpandedPreventivePrograms => 40.0,
        }
    }

    /// Unrounded share this action is judged on.
    pub fn observed_share(self, dashboard: &PopulationDashboard) -> f64 {
        match self {
            PreventiveAction::SmokingCessation => {
                dashboard.condition_share(WatchedCondition::Smoking)
            }
            PreventiveAction::BloodPressureScreening => {
                dashboard.condition_share(WatchedCondition::Hypertension)
            }
            PreventiveAction::NutritionWorkshops => {
                dashboard.condition_share(WatchedCondition::Diabetes)
            }
            PreventiveAction::TuberculosisCampaign => {
                dashboard.condition_share(WatchedCondition::PtbSuspect)
            }
            PreventiveAction::EcgProgram => {
                dashboard.condition_share(WatchedCondition::CardiovascularDisease)
            }
            PreventiveAction::OccupationalHealthClinic => {
                dashboard.condition_share(WatchedCondition::NeedsClearance)
            }
            PreventiveAction::GeriatricPrograms => {
                dashboard.share(dashboard.age_distribution.older())
            }
            PreventiveAction::PriorityIntervention => {
                dashboard.share(dashboard.risk_distribution.count(RiskLevel::High))
            }
            PreventiveAction::ExpandedPreventivePrograms => dashboard.share(
                dashboard.risk_distribution.count(RiskLevel::High)
                    + dashboard.risk_distribution.count(RiskLevel::Medium),
            ),
        }
    }

    pub fn triggered(self, dashboard: &PopulationDashboard) -> bool {
        self.observed_share(dashboard) > self.threshold()
    }

    pub const fn recommendation(self) -> &'static str {
        match self {
            PreventiveAction::SmokingCessation => {
                "Launch a workplace smoking cessation program"
            }
            PreventiveAction::BloodPressureScreening => {
                "Schedule quarterly blood pressure screening for all staff"
            }
            PreventiveAction::NutritionWorkshops => {
                "Run nutrition and diabetes-prevention workshops"
            }
            PreventiveAction::TuberculosisCampaign => {
                "Conduct a TB case-finding campaign with sputum testing and chest X-ray"
            }
            PreventiveAction::EcgProgram => "Offer an annual ECG screening program",
            PreventiveAction::OccupationalHealthClinic => {
                "Set up an occupational-health clinic to process fitness-to-work clearances"
            }
            PreventiveAction::GeriatricPrograms => {
                "Introduce age-appropriate (50+) health programs and screening"
            }
            PreventiveAction::PriorityIntervention => {
                "Prioritize individual case management for high-risk staff"
            }
            PreventiveAction::ExpandedPreventivePrograms => {
                "Expand preventive health programs across the workforce"
            }
        }
    }
}

/// Ordered recommendations for every exceeded threshold.
pub fn preventive_action_plan(dashboard: &PopulationDashboard) -> Vec<String> {
    PreventiveAction::ALL
        .into_iter()
        .filter(|action| action.triggered(dashboard))
        .map(|action| action.recommendation().to_string())
        .collect()
}
