//! Batch evaluation with bounded concurrency plus the descriptive statistics shared by the
//! population dashboards.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::warn;

use super::assessment::{AssessmentError, Assessor, Domain, IndividualAssessment, Subject};
use super::facts::Gender;
use super::rules::RiskLevel;
use crate::config::DssConfig;

const MAX_VALID_AGE: f64 = 130.0;

/// Outcome for one record of a batch, kept at the record's input position.
#[derive(Debug)]
pub struct BatchEntry<R> {
    pub record: Arc<R>,
    pub subject: Subject,
    pub outcome: Result<IndividualAssessment, AssessmentError>,
}

impl<R> BatchEntry<R> {
    pub fn assessment(&self) -> Option<&IndividualAssessment> {
        self.outcome.as_ref().ok()
    }

    pub fn is_failed(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Schedules individual assessments across the blocking pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationRunner {
    concurrency: usize,
    item_timeout: Option<Duration>,
}

impl PopulationRunner {
    pub fn new(concurrency: usize, item_timeout: Option<Duration>) -> Self {
        Self {
            concurrency: concurrency.max(1),
            item_timeout,
        }
    }

    pub fn from_config(config: &DssConfig) -> Self {
        Self::new(config.population_concurrency, config.item_timeout)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Assess every record. Results come back in input order; a failed record never aborts the
    /// batch and is reported through its entry's `outcome`.
    pub async fn run<D: Domain>(
        &self,
        assessor: &Assessor<D>,
        records: Vec<D::Record>,
        today: NaiveDate,
    ) -> Vec<BatchEntry<D::Record>> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut pending = Vec::with_capacity(records.len());

        for record in records {
            let record = Arc::new(record);
            let task_record = Arc::clone(&record);
            let assessor = assessor.clone();
            let permits = Arc::clone(&permits);
            let item_timeout = self.item_timeout;

            let handle = tokio::spawn(async move {
                let permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|err| AssessmentError::Join(err.to_string()))?;
                // The permit travels with the blocking work, so a timed-out assessment keeps
                // its slot until it actually finishes.
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    assessor.assess_record(&task_record, today)
                });
                let joined = match item_timeout {
                    Some(limit) => tokio::time::timeout(limit, work)
                        .await
                        .map_err(|_| AssessmentError::TimedOut(limit))?,
                    None => work.await,
                };
                joined.map_err(|err| AssessmentError::Join(err.to_string()))?
            });
            pending.push((record, handle));
        }

        let mut entries = Vec::with_capacity(pending.len());
        for (index, (record, handle)) in pending.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(err) => Err(AssessmentError::Join(err.to_string())),
            };
            let subject = D::subject(&record);
            if let Err(err) = &outcome {
                warn!(
                    domain = D::NAME,
                    index,
                    subject = %subject.id,
                    reason = %err,
                    "individual assessment failed; counted as unclassified"
                );
            }
            entries.push(BatchEntry {
                record,
                subject,
                outcome,
            });
        }
        entries
    }
}

/// `count / total * 100`, or 0 for an empty population. Unrounded.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Display rounding to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Keep only finite ages inside a plausible human range.
pub fn valid_age(age: Option<f64>) -> Option<f64> {
    age.filter(|value| value.is_finite() && *value > 0.0 && *value <= MAX_VALID_AGE)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeStatistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub standard_deviation: f64,
}

impl AgeStatistics {
    /// Mode ties resolve to the smallest age; standard deviation is the population form.
    pub fn from_ages(ages: &[f64]) -> Self {
        if ages.is_empty() {
            return Self::default();
        }

        let mut sorted = ages.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        let mut frequencies: Vec<(f64, usize)> = Vec::new();
        for age in &sorted {
            match frequencies.last_mut() {
                Some((value, seen)) if *value == *age => *seen += 1,
                _ => frequencies.push((*age, 1)),
            }
        }
        let mut mode = sorted[0];
        let mut best = 0;
        for (value, seen) in frequencies {
            if seen > best {
                best = seen;
                mode = value;
            }
        }

        let variance = sorted
            .iter()
            .map(|age| (age - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Self {
            count,
            mean: round2(mean),
            median: round2(median),
            mode,
            standard_deviation: round2(variance.sqrt()),
        }
    }
}

/// Fixed adult age brackets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgeBuckets {
    #[serde(rename = "<20")]
    pub under_20: usize,
    #[serde(rename = "20-29")]
    pub twenties: usize,
    #[serde(rename = "30-39")]
    pub thirties: usize,
    #[serde(rename = "40-49")]
    pub forties: usize,
    #[serde(rename = "50-59")]
    pub fifties: usize,
    #[serde(rename = "60+")]
    pub sixty_plus: usize,
}

impl AgeBuckets {
    pub fn record(&mut self, age: f64) {
        let bucket = match age {
            age if age < 20.0 => &mut self.under_20,
            age if age < 30.0 => &mut self.twenties,
            age if age < 40.0 => &mut self.thirties,
            age if age < 50.0 => &mut self.forties,
            age if age < 60.0 => &mut self.fifties,
            _ => &mut self.sixty_plus,
        };
        *bucket += 1;
    }

    /// Individuals aged 50 and above.
    pub fn older(&self) -> usize {
        self.fifties + self.sixty_plus
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenderDistribution {
    pub female: usize,
    pub male: usize,
    pub unknown: usize,
}

impl GenderDistribution {
    pub fn record(&mut self, gender: Gender) {
        match gender {
            Gender::Female => self.female += 1,
            Gender::Male => self.male += 1,
            Gender::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskDistribution {
    #[serde(rename = "High")]
    pub high: usize,
    #[serde(rename = "Medium")]
    pub medium: usize,
    #[serde(rename = "Low")]
    pub low: usize,
    #[serde(rename = "Unclassified")]
    pub unclassified: usize,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
            RiskLevel::Unclassified => self.unclassified += 1,
        }
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
            RiskLevel::Unclassified => self.unclassified,
        }
    }

    /// Rounded display percentages keyed by bucket label.
    pub fn percentages(&self, total: usize) -> BTreeMap<&'static str, f64> {
        [
            ("High", self.high),
            ("Medium", self.medium),
            ("Low", self.low),
            ("Unclassified", self.unclassified),
        ]
        .into_iter()
        .map(|(label, count)| (label, round2(percentage(count, total))))
        .collect()
    }
}
