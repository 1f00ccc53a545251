use std::collections::BTreeMap;

use serde::Serialize;

use super::{SchoolConcern, StudentRecord};
use crate::dss::assessment::IndividualAssessment;
use crate::dss::facts::Gender;
use crate::dss::population::{
    percentage, round2, valid_age, AgeStatistics, BatchEntry, GenderDistribution,
    RiskDistribution,
};
use crate::dss::rules::RiskLevel;

pub const NO_CONCERN_INSIGHT: &str =
    "No population-level health concern exceeded its threshold; continue routine school health services";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcernCounters {
    pub under_nutrition: usize,
    pub over_nutrition: usize,
    pub stunting: usize,
    pub vision_hearing: usize,
    pub not_dewormed: usize,
    pub incomplete_immunization: usize,
    pub communicable: usize,
}

impl ConcernCounters {
    pub fn get(&self, concern: SchoolConcern) -> usize {
        match concern {
            SchoolConcern::UnderNutrition => self.under_nutrition,
            SchoolConcern::OverNutrition => self.over_nutrition,
            SchoolConcern::Stunting => self.stunting,
            SchoolConcern::VisionHearing => self.vision_hearing,
            SchoolConcern::NotDewormed => self.not_dewormed,
            SchoolConcern::IncompleteImmunization => self.incomplete_immunization,
            SchoolConcern::Communicable => self.communicable,
        }
    }

    fn slot(&mut self, concern: SchoolConcern) -> &mut usize {
        match concern {
            SchoolConcern::UnderNutrition => &mut self.under_nutrition,
            SchoolConcern::OverNutrition => &mut self.over_nutrition,
            SchoolConcern::Stunting => &mut self.stunting,
            SchoolConcern::VisionHearing => &mut self.vision_hearing,
            SchoolConcern::NotDewormed => &mut self.not_dewormed,
            SchoolConcern::IncompleteImmunization => &mut self.incomplete_immunization,
            SchoolConcern::Communicable => &mut self.communicable,
        }
    }

    pub fn record(&mut self, assessment: &IndividualAssessment) {
        for concern in SchoolConcern::ALL {
            if concern.observed_in(assessment) {
                *self.slot(concern) += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSummary {
    pub total: usize,
    pub assessed: usize,
    pub failed: usize,
    pub concerns: ConcernCounters,
    pub concern_percentages: BTreeMap<&'static str, f64>,
    pub age_statistics: AgeStatistics,
    pub gender_distribution: GenderDistribution,
    pub risk_distribution: RiskDistribution,
    pub risk_percentages: BTreeMap<&'static str, f64>,
}

impl SchoolSummary {
    /// Unrounded share of the population, for threshold checks.
    pub fn share(&self, count: usize) -> f64 {
        percentage(count, self.total)
    }
}

/// Ordered, non-exclusive predictive insights over the school summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolInsight {
    UnderNutrition,
    OverNutrition,
    VisionHearing,
    NotDewormed,
    IncompleteImmunization,
    HighRisk,
}

impl SchoolInsight {
    pub const ALL: [SchoolInsight; 6] = [
        SchoolInsight::UnderNutrition,
        SchoolInsight::OverNutrition,
        SchoolInsight::VisionHearing,
        SchoolInsight::NotDewormed,
        SchoolInsight::IncompleteImmunization,
        SchoolInsight::HighRisk,
    ];

    pub const fn threshold(self) -> f64 {
        match self {
            SchoolInsight::UnderNutrition => 10.0,
            SchoolInsight::OverNutrition => 10.0,
            SchoolInsight::VisionHearing => 5.0,
            SchoolInsight::NotDewormed => 20.0,
            SchoolInsight::IncompleteImmunization => 10.0,
            SchoolInsight::HighRisk => 15.0,
        }
    }

    pub fn observed_share(self, summary: &SchoolSummary) -> f64 {
        let count = match self {
            SchoolInsight::UnderNutrition => summary.concerns.under_nutrition,
            SchoolInsight::OverNutrition => summary.concerns.over_nutrition,
            SchoolInsight::VisionHearing => summary.concerns.vision_hearing,
            SchoolInsight::NotDewormed => summary.concerns.not_dewormed,
            SchoolInsight::IncompleteImmunization => summary.concerns.incomplete_immunization,
            SchoolInsight::HighRisk => summary.risk_distribution.count(RiskLevel::High),
        };
        summary.share(count)
    }

    pub fn message(self, share: f64) -> String {
        match self {
            SchoolInsight::UnderNutrition => format!(
                "{share:.1}% of students are at risk of under-nutrition; expand the school feeding program"
            ),
            SchoolInsight::OverNutrition => format!(
                "{share:.1}% of students are overweight or obese; strengthen physical activity and healthy canteen policies"
            ),
            SchoolInsight::VisionHearing => format!(
                "{share:.1}% of students have vision or hearing problems; arrange a referral day with eye and ear specialists"
            ),
            SchoolInsight::NotDewormed => format!(
                "{share:.1}% of students are not dewormed; schedule a mass deworming day"
            ),
            SchoolInsight::IncompleteImmunization => format!(
                "{share:.1}% of students have incomplete immunization; coordinate a catch-up vaccination drive"
            ),
            SchoolInsight::HighRisk => format!(
                "{share:.1}% of students are high risk; assign case management for priority follow-up"
            ),
        }
    }
}

/// Insights for every exceeded threshold, or the single no-concern insight.
pub fn generate_insights(summary: &SchoolSummary) -> Vec<String> {
    let insights: Vec<String> = SchoolInsight::ALL
        .into_iter()
        .filter_map(|insight| {
            let share = insight.observed_share(summary);
            (share > insight.threshold()).then(|| insight.message(share))
        })
        .collect();

    if insights.is_empty() {
        vec![NO_CONCERN_INSIGHT.to_string()]
    } else {
        insights
    }
}

/// Per-student row of the school report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub age: Option<f64>,
    #[serde(flatten)]
    pub assessment: IndividualAssessment,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolPopulationReport {
    pub reports: Vec<StudentReport>,
    pub summary: SchoolSummary,
    pub insights: Vec<String>,
}

impl SchoolPopulationReport {
    /// Single coordinating pass over positionally ordered batch results.
    pub fn from_entries(entries: &[BatchEntry<StudentRecord>]) -> Self {
        let mut summary = SchoolSummary {
            total: entries.len(),
            ..SchoolSummary::default()
        };
        let mut ages = Vec::new();
        let mut reports = Vec::with_capacity(entries.len());

        for entry in entries {
            if let Some(age) = valid_age(entry.subject.age) {
                ages.push(age);
            }
            summary.gender_distribution.record(entry.subject.gender);

            let assessment = match entry.assessment() {
                Some(assessment) => {
                    summary.assessed += 1;
                    summary.concerns.record(assessment);
                    assessment.clone()
                }
                None => {
                    summary.failed += 1;
                    IndividualAssessment::unclassified()
                }
            };
            summary.risk_distribution.record(assessment.risk_level);

            reports.push(StudentReport {
                id: entry.subject.id.clone(),
                name: entry.subject.name.clone(),
                gender: entry.subject.gender,
                age: entry.subject.age,
                failed: entry.is_failed(),
                assessment,
            });
        }

        summary.age_statistics = AgeStatistics::from_ages(&ages);
        summary.concern_percentages = SchoolConcern::ALL
            .into_iter()
            .map(|concern| {
                (
                    concern_key(concern),
                    round2(percentage(summary.concerns.get(concern), summary.total)),
                )
            })
            .collect();
        summary.risk_percentages = summary.risk_distribution.percentages(summary.total);

        let insights = generate_insights(&summary);
        Self {
            reports,
            summary,
            insights,
        }
    }
}

fn concern_key(concern: SchoolConcern) -> &'static str {
    match concern {
        SchoolConcern::UnderNutrition => "underNutrition",
        SchoolConcern::OverNutrition => "overNutrition",
        SchoolConcern::Stunting => "stunting",
        SchoolConcern::VisionHearing => "visionHearing",
        SchoolConcern::NotDewormed => "notDewormed",
        SchoolConcern::IncompleteImmunization => "incompleteImmunization",
        SchoolConcern::Communicable => "communicable",
    }
}
