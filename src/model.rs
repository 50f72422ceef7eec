use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub nom: String,
    pub prenom: String,
    pub email: String,
}

/// Raw subject as stored. Grades are on a 0..=20 scale; `None` means "not entered yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub coefficient: f64,
    pub ue_id: String,
    pub interrogation: Option<f64>,
    pub devoir: Option<f64>,
    pub rattrapage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ue {
    pub id: String,
    pub name: String,
    pub credits: f64,
    pub semester_id: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: String,
    pub title: String,
    pub academic_year_id: String,
    #[serde(default)]
    pub ues: Vec<Ue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: String,
    pub title: String,
    pub user_id: String,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Grades {
    pub interrogation: Option<f64>,
    pub devoir: Option<f64>,
    pub rattrapage: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct UePatch {
    pub name: Option<String>,
    pub credits: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub coefficient: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    Success,
    Warning,
    Danger,
}

// Derived views. These are projections over the raw entities and are never persisted.

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectWithCalculations {
    pub id: String,
    pub name: String,
    pub coefficient: f64,
    pub ue_id: String,
    pub interrogation: Option<f64>,
    pub devoir: Option<f64>,
    pub rattrapage: Option<f64>,
    pub initial_average: Option<f64>,
    pub final_average: Option<f64>,
    pub status: SubjectStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UeWithCalculations {
    pub id: String,
    pub name: String,
    pub credits: f64,
    pub semester_id: String,
    pub average: Option<f64>,
    pub is_valid: bool,
    pub subjects: Vec<SubjectWithCalculations>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterWithCalculations {
    pub id: String,
    pub title: String,
    pub academic_year_id: String,
    pub average: Option<f64>,
    pub total_credits: f64,
    pub validated_credits: f64,
    pub ues: Vec<UeWithCalculations>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYearWithCalculations {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub total_credits: f64,
    pub validated_credits: f64,
    pub can_progress: bool,
    pub semesters: Vec<SemesterWithCalculations>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub minimum_grades: std::collections::BTreeMap<String, f64>,
    pub is_possible: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfResult {
    pub is_valid: bool,
    pub average: Option<f64>,
    pub message: String,
}
