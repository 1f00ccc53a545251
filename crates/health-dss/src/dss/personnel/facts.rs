use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dss::assessment::ExtractionError;
use crate::dss::facts::{absent, fact_keys, text, zero, FactMap, Gender};

fact_keys! {
    /// Every fact the personnel rule library can reference.
    pub enum PersonnelFact {
        Gender => "gender" = text("Unknown"),
        Age => "age" = zero(),

        FamilyHypertension => "familyHistory.hypertension" = absent(),
        FamilyDiabetes => "familyHistory.diabetes" = absent(),
        FamilyHeartDisease => "familyHistory.heartDisease" = absent(),
        FamilyTuberculosis => "familyHistory.tuberculosis" = absent(),
        FamilyCancer => "familyHistory.cancer" = absent(),
        FamilyAsthma => "familyHistory.asthma" = absent(),

        PastHypertension => "pastMedicalHistory.hypertension" = absent(),
        PastDiabetes => "pastMedicalHistory.diabetes" = absent(),
        PastHeartDisease => "pastMedicalHistory.heartDisease" = absent(),
        PastTuberculosis => "pastMedicalHistory.tuberculosis" = absent(),
        PastAsthma => "pastMedicalHistory.asthma" = absent(),
        PastKidneyDisease => "pastMedicalHistory.kidneyDisease" = absent(),

        Cough => "presentHealthStatus.cough" = absent(),
        CoughWeeks => "presentHealthStatus.coughWeeks" = zero(),
        Fever => "presentHealthStatus.fever" = absent(),
        Chills => "presentHealthStatus.chills" = absent(),
        WeightLoss => "presentHealthStatus.weightLoss" = absent(),
        NightSweats => "presentHealthStatus.nightSweats" = absent(),
        Hemoptysis => "presentHealthStatus.hemoptysis" = absent(),
        ChestPain => "presentHealthStatus.chestPain" = absent(),
        Palpitations => "presentHealthStatus.palpitations" = absent(),
        ShortnessOfBreath => "presentHealthStatus.shortnessOfBreath" = absent(),
        Headache => "presentHealthStatus.headache" = absent(),
        Dizziness => "presentHealthStatus.dizziness" = absent(),
        BlurredVision => "presentHealthStatus.blurredVision" = absent(),
        Polyuria => "presentHealthStatus.polyuria" = absent(),
        Polydipsia => "presentHealthStatus.polydipsia" = absent(),
        Numbness => "presentHealthStatus.numbness" = absent(),
        Malaria => "presentHealthStatus.malaria" = absent(),

        Systolic => "vitalSigns.systolic" = zero(),
        Diastolic => "vitalSigns.diastolic" = zero(),
        Bmi => "vitalSigns.bmi" = zero(),
        FastingBloodSugar => "bloodSugar.fasting" = zero(),

        Smoker => "smoking.current" = absent(),
        SticksPerDay => "smoking.sticksPerDay" = zero(),
        PackYears => "smokingPackYears" = zero(),
        DrinksPerWeek => "alcohol.drinksPerWeek" = zero(),
        DrinkingFrequency => "alcohol.frequency" = text("Never"),

        HeartLungAbnormal => "physicalExam.heartLungAbnormal" = absent(),
        VisionImpaired => "physicalExam.visionImpaired" = absent(),
        HearingImpaired => "physicalExam.hearingImpaired" = absent(),
        MusculoskeletalComplaint => "physicalExam.musculoskeletalComplaint" = absent(),
        OccupationalExposure => "occupational.exposure" = text("none"),

        BreastMass => "reproductive.breastMass" = absent(),
        IrregularMenses => "reproductive.irregularMenses" = absent(),
        AbnormalBleeding => "reproductive.abnormalBleeding" = absent(),
        CervicalScreeningUpToDate => "reproductive.cervicalScreeningUpToDate" = absent(),
        Pregnant => "reproductive.pregnant" = absent(),
        ProstateSymptoms => "reproductive.prostateSymptoms" = absent(),
        TesticularMass => "reproductive.testicularMass" = absent(),
    }
}

/// One employee's health card together with the demographics of the linked person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonnelRecord {
    pub id: String,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<f64>,
    pub health_card: HealthCard,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthCard {
    pub family_history: FamilyHistory,
    pub past_medical_history: PastMedicalHistory,
    pub present_health_status: PresentHealthStatus,
    pub vital_signs: VitalSigns,
    pub blood_sugar: BloodSugar,
    pub smoking: SmokingHistory,
    pub alcohol: AlcoholUse,
    pub physical_exam: PhysicalExam,
    pub occupational: OccupationalHistory,
    pub reproductive: ReproductiveHealth,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamilyHistory {
    pub hypertension: bool,
    pub diabetes: bool,
    pub heart_disease: bool,
    pub tuberculosis: bool,
    pub cancer: bool,
    pub asthma: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PastMedicalHistory {
    pub hypertension: bool,
    pub diabetes: bool,
    pub heart_disease: bool,
    pub tuberculosis: bool,
    pub asthma: bool,
    pub kidney_disease: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresentHealthStatus {
    pub cough: bool,
    pub cough_weeks: Option<f64>,
    pub fever: bool,
    pub chills: bool,
    pub weight_loss: bool,
    pub night_sweats: bool,
    pub hemoptysis: bool,
    pub chest_pain: bool,
    pub palpitations: bool,
    pub shortness_of_breath: bool,
    pub headache: bool,
    pub dizziness: bool,
    pub blurred_vision: bool,
    pub polyuria: bool,
    pub polydipsia: bool,
    pub numbness: bool,
    pub malaria: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalSigns {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub bmi: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BloodSugar {
    pub fasting: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmokingHistory {
    pub current: bool,
    pub sticks_per_day: Option<f64>,
    /// Calendar year the person started smoking. Older health cards send it as `ageStarted`.
    #[serde(alias = "ageStarted")]
    pub year_started: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlcoholUse {
    pub drinks_per_week: Option<f64>,
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicalExam {
    pub heart_abnormal: bool,
    pub lung_abnormal: bool,
    pub vision_impaired: bool,
    pub hearing_impaired: bool,
    pub musculoskeletal_complaint: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OccupationalHistory {
    pub exposure: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReproductiveHealth {
    pub breast_mass: bool,
    pub irregular_menses: bool,
    pub abnormal_bleeding: bool,
    pub cervical_screening_up_to_date: bool,
    pub pregnant: bool,
    pub prostate_symptoms: bool,
    pub testicular_mass: bool,
}

/// Canonical drinking-frequency categories and the raw labels folded into each.
pub const DRINKING_FREQUENCY_ALIASES: &[(&str, &[&str])] = &[
    ("Never", &["never", "none", "no", "abstain", "abstainer"]),
    (
        "Occasional",
        &["occasional", "occasionally", "rarely", "social", "socially", "monthly"],
    ),
    ("Weekly", &["weekly", "weekends", "weekend", "several times a week"]),
    ("Daily", &["daily", "everyday", "every day", "always"]),
];

/// Fold a raw drinking-frequency label into its canonical category. Missing input means never;
/// unrecognised input is kept visible as `Unknown`.
pub fn canonical_drinking_frequency(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw.map(|value| value.trim().to_ascii_lowercase()) else {
        return "Never";
    };
    if raw.is_empty() {
        return "Never";
    }
    DRINKING_FREQUENCY_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&raw.as_str()))
        .map_or("Unknown", |(canonical, _)| *canonical)
}

/// `(sticksPerDay / 20) * max(0, currentYear - yearStarted)`; an unknown start year counts as
/// zero years smoked.
pub fn pack_years(sticks_per_day: f64, year_started: Option<i32>, today: NaiveDate) -> f64 {
    let years = year_started
        .map(|started| f64::from((today.year() - started).max(0)))
        .unwrap_or(0.0);
    (sticks_per_day / 20.0) * years
}

fn measurement(field: &'static str, value: Option<f64>) -> Result<f64, ExtractionError> {
    match value {
        None => Ok(0.0),
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Some(value) => Err(ExtractionError { field, value }),
    }
}

/// Build the fully-defaulted personnel fact map for one record.
pub fn extract(
    record: &PersonnelRecord,
    today: NaiveDate,
) -> Result<FactMap<PersonnelFact>, ExtractionError> {
    use PersonnelFact as F;

    let card = &record.health_card;
    let mut facts = FactMap::with_defaults();

    facts.set(F::Gender, Gender::parse(record.gender.as_deref()).label());
    facts.set(F::Age, measurement("age", record.age)?);

    let family = &card.family_history;
    facts.set(F::FamilyHypertension, family.hypertension);
    facts.set(F::FamilyDiabetes, family.diabetes);
    facts.set(F::FamilyHeartDisease, family.heart_disease);
    facts.set(F::FamilyTuberculosis, family.tuberculosis);
    facts.set(F::FamilyCancer, family.cancer);
    facts.set(F::FamilyAsthma, family.asthma);

    let past = &card.past_medical_history;
    facts.set(F::PastHypertension, past.hypertension);
    facts.set(F::PastDiabetes, past.diabetes);
    facts.set(F::PastHeartDisease, past.heart_disease);
    facts.set(F::PastTuberculosis, past.tuberculosis);
    facts.set(F::PastAsthma, past.asthma);
    facts.set(F::PastKidneyDisease, past.kidney_disease);

    let status = &card.present_health_status;
    facts.set(F::Cough, status.cough);
    facts.set(
        F::CoughWeeks,
        measurement("presentHealthStatus.coughWeeks", status.cough_weeks)?,
    );
    facts.set(F::Fever, status.fever);
    facts.set(F::Chills, status.chills);
    facts.set(F::WeightLoss, status.weight_loss);
    facts.set(F::NightSweats, status.night_sweats);
    facts.set(F::Hemoptysis, status.hemoptysis);
    facts.set(F::ChestPain, status.chest_pain);
    facts.set(F::Palpitations, status.palpitations);
    facts.set(F::ShortnessOfBreath, status.shortness_of_breath);
    facts.set(F::Headache, status.headache);
    facts.set(F::Dizziness, status.dizziness);
    facts.set(F::BlurredVision, status.blurred_vision);
    facts.set(F::Polyuria, status.polyuria);
    facts.set(F::Polydipsia, status.polydipsia);
    facts.set(F::Numbness, status.numbness);
    facts.set(F::Malaria, status.malaria);

    let vitals = &card.vital_signs;
    facts.set(F::Systolic, measurement("vitalSigns.systolic", vitals.systolic)?);
    facts.set(F::Diastolic, measurement("vitalSigns.diastolic", vitals.diastolic)?);
    facts.set(F::Bmi, measurement("vitalSigns.bmi", vitals.bmi)?);
    facts.set(
        F::FastingBloodSugar,
        measurement("bloodSugar.fasting", card.blood_sugar.fasting)?,
    );

    let sticks = measurement("smoking.sticksPerDay", card.smoking.sticks_per_day)?;
    facts.set(F::Smoker, card.smoking.current);
    facts.set(F::SticksPerDay, sticks);
    facts.set(
        F::PackYears,
        pack_years(sticks, card.smoking.year_started, today),
    );
    facts.set(
        F::DrinksPerWeek,
        measurement("alcohol.drinksPerWeek", card.alcohol.drinks_per_week)?,
    );
    facts.set(
        F::DrinkingFrequency,
        canonical_drinking_frequency(card.alcohol.frequency.as_deref()),
    );

    let exam = &card.physical_exam;
    facts.set(F::HeartLungAbnormal, exam.heart_abnormal || exam.lung_abnormal);
    facts.set(F::VisionImpaired, exam.vision_impaired);
    facts.set(F::HearingImpaired, exam.hearing_impaired);
    facts.set(F::MusculoskeletalComplaint, exam.musculoskeletal_complaint);

    if let Some(exposure) = card
        .occupational
        .exposure
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        facts.set(F::OccupationalExposure, exposure.to_lowercase());
    }

    let repro = &card.reproductive;
    facts.set(F::BreastMass, repro.breast_mass);
    facts.set(F::IrregularMenses, repro.irregular_menses);
    facts.set(F::AbnormalBleeding, repro.abnormal_bleeding);
    facts.set(
        F::CervicalScreeningUpToDate,
        repro.cervical_screening_up_to_date,
    );
    facts.set(F::Pregnant, repro.pregnant);
    facts.set(F::ProstateSymptoms, repro.prostate_symptoms);
    facts.set(F::TesticularMass, repro.testicular_mass);

    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dss::facts::{FactKey, FactValue};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    #[test]
    fn empty_record_extracts_to_declared_defaults() {
        let facts = extract(&PersonnelRecord::default(), today()).expect("extracts");
        for key in PersonnelFact::ALL {
            assert_eq!(facts.get(*key), &key.default_value(), "{}", key.path());
        }
    }

    #[test]
    fn pack_years_use_start_year_and_never_go_negative() {
        assert_eq!(pack_years(20.0, Some(2005), today()), 20.0);
        assert_eq!(pack_years(10.0, Some(2015), today()), 5.0);
        assert_eq!(pack_years(20.0, Some(2030), today()), 0.0);
        assert_eq!(pack_years(20.0, None, today()), 0.0);
    }

    #[test]
    fn legacy_age_started_field_feeds_pack_years() {
        let record: PersonnelRecord = serde_json::from_value(serde_json::json!({
            "id": "EMP-7",
            "healthCard": {
                "smoking": { "current": true, "sticksPerDay": 20, "ageStarted": 2005 }
            }
        }))
        .expect("legacy card deserializes");
        assert_eq!(record.health_card.smoking.year_started, Some(2005));

        let facts = extract(&record, today()).expect("extracts");
        assert_eq!(facts.get(PersonnelFact::PackYears), &FactValue::Number(20.0));
    }

    #[test]
    fn heart_or_lung_finding_sets_the_union_fact() {
        let mut record = PersonnelRecord::default();
        record.health_card.physical_exam.lung_abnormal = true;
        let facts = extract(&record, today()).expect("extracts");
        assert!(facts.is_set(PersonnelFact::HeartLungAbnormal));
    }

    #[test]
    fn drinking_frequency_aliases_fold_to_canonical_labels() {
        assert_eq!(canonical_drinking_frequency(None), "Never");
        assert_eq!(canonical_drinking_frequency(Some("  ")), "Never");
        assert_eq!(canonical_drinking_frequency(Some("Socially")), "Occasional");
        assert_eq!(canonical_drinking_frequency(Some("WEEKENDS")), "Weekly");
        assert_eq!(canonical_drinking_frequency(Some("every day")), "Daily");
        assert_eq!(canonical_drinking_frequency(Some("binge")), "Unknown");
    }

    #[test]
    fn gender_and_exposure_are_canonicalised() {
        let mut record = PersonnelRecord {
            gender: Some("F".to_string()),
            ..PersonnelRecord::default()
        };
        record.health_card.occupational.exposure = Some(" Chemical Fumes ".to_string());
        let facts = extract(&record, today()).expect("extracts");
        assert_eq!(facts.get(PersonnelFact::Gender), &FactValue::from("Female"));
        assert_eq!(
            facts.get(PersonnelFact::OccupationalExposure),
            &FactValue::from("chemical fumes")
        );
    }

    #[test]
    fn negative_vitals_are_rejected() {
        let mut record = PersonnelRecord::default();
        record.health_card.vital_signs.systolic = Some(-5.0);
        let error = extract(&record, today()).expect_err("negative systolic");
        assert_eq!(error.field, "vitalSigns.systolic");
    }
}
