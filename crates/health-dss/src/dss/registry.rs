use chrono::NaiveDate;
use serde::Serialize;

use super::assessment::{AssessmentError, Assessor, Domain, IndividualAssessment};
use super::filter::{project, CategoryProjection};
use super::personnel::{Personnel, PersonnelCategory, PersonnelPopulationReport, PersonnelRecord};
use super::population::PopulationRunner;
use super::rules::LibraryError;
use super::school::{
    translate, AlertBundle, School, SchoolCategory, SchoolPopulationReport, StudentRecord,
};
use crate::config::DssConfig;

/// Single-student output: the assessment plus its translated alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssessment {
    pub assessment: IndividualAssessment,
    pub alerts: AlertBundle,
}

/// Both compiled rule libraries and the batch scheduler, built once at startup.
pub struct DssRegistry {
    personnel: Assessor<Personnel>,
    school: Assessor<School>,
    runner: PopulationRunner,
    concurrent_groups: bool,
}

impl DssRegistry {
    pub fn load(config: &DssConfig) -> Result<Self, LibraryError> {
        Ok(Self {
            personnel: Assessor::load(config.failure_policy)?,
            school: Assessor::load(config.failure_policy)?,
            runner: PopulationRunner::from_config(config),
            concurrent_groups: config.concurrent_groups,
        })
    }

    pub fn personnel(&self) -> &Assessor<Personnel> {
        &self.personnel
    }

    pub fn school(&self) -> &Assessor<School> {
        &self.school
    }

    pub fn runner(&self) -> &PopulationRunner {
        &self.runner
    }

    pub async fn assess_personnel(
        &self,
        record: &PersonnelRecord,
        today: NaiveDate,
    ) -> Result<IndividualAssessment, AssessmentError> {
        self.assess_single(&self.personnel, record, today).await
    }

    pub async fn personnel_dashboard(
        &self,
        records: Vec<PersonnelRecord>,
        today: NaiveDate,
    ) -> PersonnelPopulationReport {
        let entries = self.runner.run(&self.personnel, records, today).await;
        PersonnelPopulationReport::from_entries(&entries)
    }

    pub async fn personnel_category(
        &self,
        records: Vec<PersonnelRecord>,
        category: PersonnelCategory,
        today: NaiveDate,
    ) -> Vec<CategoryProjection> {
        let entries = self.runner.run(&self.personnel, records, today).await;
        project(&entries, &category)
    }

    pub async fn assess_student(
        &self,
        record: &StudentRecord,
        today: NaiveDate,
    ) -> Result<StudentAssessment, AssessmentError> {
        let assessment = self.assess_single(&self.school, record, today).await?;
        let alerts = translate(&assessment, today);
        Ok(StudentAssessment { assessment, alerts })
    }

    pub async fn school_report(
        &self,
        records: Vec<StudentRecord>,
        today: NaiveDate,
    ) -> SchoolPopulationReport {
        let entries = self.runner.run(&self.school, records, today).await;
        SchoolPopulationReport::from_entries(&entries)
    }

    pub async fn school_category(
        &self,
        records: Vec<StudentRecord>,
        category: SchoolCategory,
        today: NaiveDate,
    ) -> Vec<CategoryProjection> {
        let entries = self.runner.run(&self.school, records, today).await;
        project(&entries, &category)
    }

    /// Single-record requests run their flag groups concurrently when configured; batches
    /// always parallelize across individuals instead.
    async fn assess_single<D: Domain>(
        &self,
        assessor: &Assessor<D>,
        record: &D::Record,
        today: NaiveDate,
    ) -> Result<IndividualAssessment, AssessmentError> {
        if self.concurrent_groups {
            assessor.assess_record_concurrent(record, today).await
        } else {
            assessor.assess_record(record, today)
        }
    }
}
