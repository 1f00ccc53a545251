use serde::{Deserialize, Serialize};

use crate::dss::assessment::ExtractionError;
use crate::dss::facts::{absent, fact_keys, text, zero, FactMap, Gender};

fact_keys! {
    /// Every fact the school rule library can reference.
    pub enum SchoolFact {
        Gender => "gender" = text("Unknown"),
        Age => "age" = zero(),
        BmiForAge => "nutrition.bmiForAge" = text("Normal"),
        HeightForAge => "nutrition.heightForAge" = text("Normal"),
        VisionImpaired => "vision.impaired" = absent(),
        HearingImpaired => "hearing.impaired" = absent(),
        EarDischarge => "ears.discharge" = absent(),
        Lice => "skin.lice" = absent(),
        Scabies => "skin.scabies" = absent(),
        Boils => "skin.boils" = absent(),
        SkinInfection => "skin.infection" = absent(),
        HeartLungAbnormal => "heartLung.abnormal" = absent(),
        Fever => "symptoms.fever" = absent(),
        Cough => "symptoms.cough" = absent(),
        Diarrhea => "symptoms.diarrhea" = absent(),
        Rash => "symptoms.rash" = absent(),
        DentalCaries => "dental.caries" = absent(),
        DewormingFirstRound => "deworming.firstRound" = absent(),
        DewormingSecondRound => "deworming.secondRound" = absent(),
        ImmunizationIncomplete => "immunization.incomplete" = absent(),
        IronSupplemented => "supplementation.iron" = absent(),
    }
}

/// One student's school health examination and the linked learner's demographics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<f64>,
    pub findings: ExamFindings,
}

/// Free-text and checkbox findings as recorded by the examining nurse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamFindings {
    pub bmi_for_age: Option<String>,
    pub height_for_age: Option<String>,
    pub vision_screening: Option<String>,
    pub hearing_screening: Option<String>,
    pub ears: Option<String>,
    pub skin_scalp: Option<String>,
    pub heart: Option<String>,
    pub lungs: Option<String>,
    pub teeth: Option<String>,
    pub fever: bool,
    pub cough: bool,
    pub diarrhea: bool,
    pub rash: bool,
    pub deworming: Option<String>,
    pub immunization: Option<String>,
    pub iron_supplementation: bool,
}

/// Canonical BMI-for-age categories and the raw labels folded into each.
pub const BMI_FOR_AGE_ALIASES: &[(&str, &[&str])] = &[
    (
        "Severely Wasted",
        &["severely wasted", "severely underweight", "severe wasting", "sw"],
    ),
    (
        "Wasted",
        &["wasted", "wasted/underweight", "underweight", "moderately wasted", "w"],
    ),
    ("Normal", &["normal", "n"]),
    ("Overweight", &["overweight", "ow"]),
    ("Obese", &["obese", "obesity", "ob"]),
];

/// Canonical height-for-age categories and the raw labels folded into each.
pub const HEIGHT_FOR_AGE_ALIASES: &[(&str, &[&str])] = &[
    (
        "Severely Stunted",
        &["severely stunted", "severe stunting", "ss"],
    ),
    (
        "Stunted",
        &["stunted", "moderately stunted", "stunting", "s"],
    ),
    ("Normal", &["normal", "n"]),
    ("Tall", &["tall", "t"]),
];

/// Skin and scalp findings in precedence order. Only the first matching finding is recorded.
pub const SKIN_PRECEDENCE: &[(SchoolFact, &[&str])] = &[
    (SchoolFact::Lice, &["lice", "pediculosis", "nits"]),
    (SchoolFact::Scabies, &["scabies"]),
    (SchoolFact::Boils, &["boil", "impetigo"]),
    (
        SchoolFact::SkinInfection,
        &["infection", "fungal", "ringworm", "tinea"],
    ),
];

/// Fold a raw category label through an alias table. Missing input is `Normal`; unrecognised
/// input stays visible as `Unknown`.
pub fn canonical_category(aliases: &[(&'static str, &[&str])], raw: Option<&str>) -> &'static str {
    let Some(raw) = raw.map(|value| value.trim().to_ascii_lowercase()) else {
        return "Normal";
    };
    if raw.is_empty() {
        return "Normal";
    }
    aliases
        .iter()
        .find(|(_, labels)| labels.contains(&raw.as_str()))
        .map_or("Unknown", |(canonical, _)| *canonical)
}

/// The single skin fact implied by a free-text finding, if any.
pub fn skin_finding(raw: Option<&str>) -> Option<SchoolFact> {
    let raw = raw?.to_lowercase();
    SKIN_PRECEDENCE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| raw.contains(keyword)))
        .map(|(fact, _)| *fact)
}

fn mentions(raw: Option<&str>, keywords: &[&str]) -> bool {
    raw.map(str::to_lowercase)
        .is_some_and(|value| keywords.iter().any(|keyword| value.contains(keyword)))
}

fn abnormal(raw: Option<&str>) -> bool {
    raw.map(|value| value.trim().to_ascii_lowercase())
        .is_some_and(|value| !value.is_empty() && value != "normal" && value != "n")
}

/// Build the fully-defaulted school fact map for one record.
pub fn extract(record: &StudentRecord) -> Result<FactMap<SchoolFact>, ExtractionError> {
    use SchoolFact as F;

    let findings = &record.findings;
    let mut facts = FactMap::with_defaults();

    facts.set(F::Gender, Gender::parse(record.gender.as_deref()).label());
    match record.age {
        Some(age) if !age.is_finite() || age < 0.0 => {
            return Err(ExtractionError {
                field: "age",
                value: age,
            })
        }
        Some(age) => facts.set(F::Age, age),
        None => {}
    }

    facts.set(
        F::BmiForAge,
        canonical_category(BMI_FOR_AGE_ALIASES, findings.bmi_for_age.as_deref()),
    );
    facts.set(
        F::HeightForAge,
        canonical_category(HEIGHT_FOR_AGE_ALIASES, findings.height_for_age.as_deref()),
    );

    let screening_failed = ["fail", "impair", "refer"];
    facts.set(
        F::VisionImpaired,
        mentions(findings.vision_screening.as_deref(), &screening_failed),
    );
    facts.set(
        F::HearingImpaired,
        mentions(findings.hearing_screening.as_deref(), &screening_failed),
    );
    facts.set(
        F::EarDischarge,
        mentions(findings.ears.as_deref(), &["discharge", "otitis"]),
    );

    if let Some(fact) = skin_finding(findings.skin_scalp.as_deref()) {
        facts.set(fact, true);
    }

    facts.set(
        F::HeartLungAbnormal,
        abnormal(findings.heart.as_deref()) || abnormal(findings.lungs.as_deref()),
    );
    facts.set(F::Fever, findings.fever);
    facts.set(F::Cough, findings.cough);
    facts.set(F::Diarrhea, findings.diarrhea);
    facts.set(F::Rash, findings.rash);
    facts.set(
        F::DentalCaries,
        mentions(findings.teeth.as_deref(), &["caries", "decay", "cavit"]),
    );

    let deworming = findings.deworming.as_deref();
    facts.set(F::DewormingFirstRound, mentions(deworming, &["1st", "first"]));
    facts.set(F::DewormingSecondRound, mentions(deworming, &["2nd", "second"]));
    facts.set(
        F::ImmunizationIncomplete,
        mentions(findings.immunization.as_deref(), &["incomplete"]),
    );
    facts.set(F::IronSupplemented, findings.iron_supplementation);

    Ok(facts)
}
