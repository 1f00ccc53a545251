use std::collections::BTreeMap;

use serde::Serialize;

use super::PersonnelRecord;
use crate::dss::assessment::{FitnessDecision, IndividualAssessment};
use crate::dss::population::{
    percentage, round2, valid_age, AgeBuckets, AgeStatistics, BatchEntry, GenderDistribution,
    RiskDistribution,
};

/// Conditions counted on the dashboard. Flag-backed entries match the label exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedCondition {
    Hypertension,
    Diabetes,
    CardiovascularDisease,
    PtbSuspect,
    Malaria,
    Smoking,
    NeedsClearance,
}

impl WatchedCondition {
    pub const ALL: [WatchedCondition; 7] = [
        WatchedCondition::Hypertension,
        WatchedCondition::Diabetes,
        WatchedCondition::CardiovascularDisease,
        WatchedCondition::PtbSuspect,
        WatchedCondition::Malaria,
        WatchedCondition::Smoking,
        WatchedCondition::NeedsClearance,
    ];

    pub const fn flag(self) -> Option<&'static str> {
        match self {
            WatchedCondition::Hypertension => Some("Hypertension"),
            WatchedCondition::Diabetes => Some("Diabetes"),
            WatchedCondition::CardiovascularDisease => Some("Cardiovascular Disease"),
            WatchedCondition::PtbSuspect => Some("PTB Suspect"),
            WatchedCondition::Malaria => Some("Malaria"),
            WatchedCondition::Smoking => Some("High risk: Smoking"),
            WatchedCondition::NeedsClearance => None,
        }
    }

    pub fn observed_in(self, assessment: &IndividualAssessment) -> bool {
        match self.flag() {
            Some(label) => assessment.has_flag(label),
            None => assessment.fitness_to_work == FitnessDecision::NeedsClearance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionCounters {
    pub hypertension: usize,
    pub diabetes: usize,
    pub cardiovascular_disease: usize,
    pub ptb_suspect: usize,
    pub malaria: usize,
    pub smoking: usize,
    pub needs_clearance: usize,
}

impl ConditionCounters {
    pub fn get(&self, condition: WatchedCondition) -> usize {
        match condition {
            WatchedCondition::Hypertension => self.hypertension,
            WatchedCondition::Diabetes => self.diabetes,
            WatchedCondition::CardiovascularDisease => self.cardiovascular_disease,
            WatchedCondition::PtbSuspect => self.ptb_suspect,
            WatchedCondition::Malaria => self.malaria,
            WatchedCondition::Smoking => self.smoking,
            WatchedCondition::NeedsClearance => self.needs_clearance,
        }
    }

    fn slot(&mut self, condition: WatchedCondition) -> &mut usize {
        match condition {
            WatchedCondition::Hypertension => &mut self.hypertension,
            WatchedCondition::Diabetes => &mut self.diabetes,
            WatchedCondition::CardiovascularDisease => &mut self.cardiovascular_disease,
            WatchedCondition::PtbSuspect => &mut self.ptb_suspect,
            WatchedCondition::Malaria => &mut self.malaria,
            WatchedCondition::Smoking => &mut self.smoking,
            WatchedCondition::NeedsClearance => &mut self.needs_clearance,
        }
    }

    pub fn record(&mut self, assessment: &IndividualAssessment) {
        for condition in WatchedCondition::ALL {
            if condition.observed_in(assessment) {
                *self.slot(condition) += 1;
            }
        }
    }

    /// Display rates, rounded to two decimals.
    pub fn rates(&self, total: usize) -> ConditionRates {
        let rate = |condition| round2(percentage(self.get(condition), total));
        ConditionRates {
            hypertension: rate(WatchedCondition::Hypertension),
            diabetes: rate(WatchedCondition::Diabetes),
            cardiovascular_disease: rate(WatchedCondition::CardiovascularDisease),
            ptb_suspect: rate(WatchedCondition::PtbSuspect),
            malaria: rate(WatchedCondition::Malaria),
            smoking: rate(WatchedCondition::Smoking),
            needs_clearance: rate(WatchedCondition::NeedsClearance),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRates {
    pub hypertension: f64,
    pub diabetes: f64,
    pub cardiovascular_disease: f64,
    pub ptb_suspect: f64,
    pub malaria: f64,
    pub smoking: f64,
    pub needs_clearance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationDashboard {
    pub total: usize,
    pub assessed: usize,
    pub failed: usize,
    pub conditions: ConditionCounters,
    pub condition_rates: ConditionRates,
    pub age_statistics: AgeStatistics,
    pub age_distribution: AgeBuckets,
    pub gender_distribution: GenderDistribution,
    pub risk_distribution: RiskDistribution,
    pub risk_percentages: BTreeMap<&'static str, f64>,
}

impl PopulationDashboard {
    /// Single coordinating pass over positionally ordered batch results. Failed individuals stay
    /// in `total` and the demographics, land in `Unclassified`, and feed no condition counter.
    pub fn from_entries(entries: &[BatchEntry<PersonnelRecord>]) -> Self {
        let mut dashboard = Self {
            total: entries.len(),
            ..Self::default()
        };
        let mut ages = Vec::new();

        for entry in entries {
            if let Some(age) = valid_age(entry.subject.age) {
                ages.push(age);
                dashboard.age_distribution.record(age);
            }
            dashboard.gender_distribution.record(entry.subject.gender);

            match entry.assessment() {
                Some(assessment) => {
                    dashboard.assessed += 1;
                    dashboard.conditions.record(assessment);
                    dashboard.risk_distribution.record(assessment.risk_level);
                }
                None => {
                    dashboard.failed += 1;
                    dashboard
                        .risk_distribution
                        .record(IndividualAssessment::unclassified().risk_level);
                }
            }
        }

        dashboard.age_statistics = AgeStatistics::from_ages(&ages);
        dashboard.condition_rates = dashboard.conditions.rates(dashboard.total);
        dashboard.risk_percentages = dashboard.risk_distribution.percentages(dashboard.total);
        dashboard
    }

    /// Unrounded share of the population, for threshold checks.
    pub fn share(&self, count: usize) -> f64 {
        percentage(count, self.total)
    }

    pub fn condition_share(&self, condition: WatchedCondition) -> f64 {
        self.share(self.conditions.get(condition))
    }
}
