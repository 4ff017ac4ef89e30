use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{DashboardError, Result};
use crate::model::GradeModel;
use crate::preprocess::LabelEncoder;

pub const PASS_MARK: f64 = 10.0;
pub const TOP_MARK: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentStatus {
    Together,
    Apart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Education {
    #[serde(rename = "No Education")]
    NoEducation,
    Primary,
    Secondary,
    #[serde(rename = "Higher Secondary")]
    HigherSecondary,
    Degree,
}

impl Education {
    pub const ALL: [Education; 5] = [
        Education::NoEducation,
        Education::Primary,
        Education::Secondary,
        Education::HigherSecondary,
        Education::Degree,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Education::NoEducation => "No Education",
            Education::Primary => "Primary",
            Education::Secondary => "Secondary",
            Education::HigherSecondary => "Higher Secondary",
            Education::Degree => "Degree",
        }
    }

    pub fn level(self) -> f64 {
        match self {
            Education::NoEducation => 0.0,
            Education::Primary => 1.0,
            Education::Secondary => 2.0,
            Education::HigherSecondary => 3.0,
            Education::Degree => 4.0,
        }
    }
}

/// Inputs of the prediction form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionForm {
    pub gender: Gender,
    pub age: u32,
    pub term_1: u32,
    pub term_2: u32,
    pub medu: Education,
    pub fedu: Education,
    pub pstatus: ParentStatus,
    pub absences: u32,
    pub activities: YesNo,
    pub internet: YesNo,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 17,
            term_1: 10,
            term_2: 10,
            medu: Education::NoEducation,
            fedu: Education::NoEducation,
            pstatus: ParentStatus::Together,
            absences: 0,
            activities: YesNo::Yes,
            internet: YesNo::Yes,
        }
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(DashboardError::InvalidInput(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

impl PredictionForm {
    pub fn validate(&self) -> Result<()> {
        check_range("Age", self.age, 15, 22)?;
        check_range("Term 1 Grade", self.term_1, 0, 20)?;
        check_range("Term 2 Grade", self.term_2, 0, 20)?;
        check_range("Number of Absences", self.absences, 0, 93)?;
        Ok(())
    }

    /// Model input keyed by dataset column. Categorical answers use the
    /// dataset's own encoding when the column was label-encoded and the
    /// encoder recognises the answer; otherwise the fixed 0/1 codes apply.
    pub fn to_features(&self, encoders: &BTreeMap<String, LabelEncoder>) -> HashMap<String, f64> {
        let categorical = |column: &str, label: &str, fixed: f64| -> f64 {
            encoders
                .get(column)
                .and_then(|enc| enc.code_for_label(label))
                .map(|code| code as f64)
                .unwrap_or(fixed)
        };

        let (gender_label, gender_code) = match self.gender {
            Gender::Female => ("Female", 1.0),
            Gender::Male => ("Male", 0.0),
        };
        let (pstatus_label, pstatus_code) = match self.pstatus {
            ParentStatus::Together => ("Together", 1.0),
            ParentStatus::Apart => ("Apart", 0.0),
        };
        let yes_no = |answer: YesNo| match answer {
            YesNo::Yes => ("Yes", 1.0),
            YesNo::No => ("No", 0.0),
        };
        let (activities_label, activities_code) = yes_no(self.activities);
        let (internet_label, internet_code) = yes_no(self.internet);

        HashMap::from([
            ("gender".to_string(), categorical("gender", gender_label, gender_code)),
            ("age".to_string(), self.age as f64),
            ("Medu".to_string(), categorical("Medu", self.medu.label(), self.medu.level())),
            ("Fedu".to_string(), categorical("Fedu", self.fedu.label(), self.fedu.level())),
            ("Pstatus".to_string(), categorical("Pstatus", pstatus_label, pstatus_code)),
            ("Term_1".to_string(), self.term_1 as f64),
            ("Term_2".to_string(), self.term_2 as f64),
            ("activities".to_string(), categorical("activities", activities_label, activities_code)),
            ("internet".to_string(), categorical("internet", internet_label, internet_code)),
            ("absences".to_string(), self.absences as f64),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    BelowPassing,
    Average,
    Excellent,
}

impl Outcome {
    pub fn for_grade(grade: i64) -> Self {
        let grade = grade as f64;
        if grade < PASS_MARK {
            Outcome::BelowPassing
        } else if grade < TOP_MARK {
            Outcome::Average
        } else {
            Outcome::Excellent
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Outcome::BelowPassing => "⚠️ Below Passing Grade",
            Outcome::Average => "📝 Average Performance",
            Outcome::Excellent => "🎉 Excellent Performance Predicted!",
        }
    }

    pub fn advice_title(self) -> &'static str {
        match self {
            Outcome::BelowPassing => "Recommendations:",
            Outcome::Average => "Suggestions for Improvement:",
            Outcome::Excellent => "Keep up the good work!",
        }
    }

    pub fn advice(self) -> &'static [&'static str] {
        match self {
            Outcome::BelowPassing => &[
                "Increase study hours",
                "Seek additional tutoring",
                "Improve attendance",
                "Review previous materials",
                "Consider joining study groups",
            ],
            Outcome::Average => &[
                "Join study groups",
                "Participate more in class",
                "Regular practice",
                "Focus on weak areas",
                "Set higher goals",
            ],
            Outcome::Excellent => &[
                "Maintain study routine",
                "Help classmates",
                "Consider advanced topics",
                "Participate in competitions",
                "Share study techniques",
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GradePrediction {
    pub raw: f64,
    pub grade: i64,
    pub outcome: Outcome,
    pub headline: String,
    pub advice: Vec<String>,
}

pub fn predict_grade(
    model: &GradeModel,
    encoders: &BTreeMap<String, LabelEncoder>,
    form: &PredictionForm,
) -> Result<GradePrediction> {
    form.validate()?;
    let raw = model.predict(&form.to_features(encoders))?;
    if !raw.is_finite() {
        return Err(DashboardError::Model(format!("model produced {raw}")));
    }

    // half-way cases go to the even grade
    let grade = raw.round_ties_even() as i64;
    let outcome = Outcome::for_grade(grade);

    Ok(GradePrediction {
        raw,
        grade,
        outcome,
        headline: outcome.headline().to_string(),
        advice: outcome.advice().iter().map(|s| s.to_string()).collect(),
    })
}
