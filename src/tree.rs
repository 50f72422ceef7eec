use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::calc::{self, GradingRules};
use crate::model::{
    AcademicYear, AcademicYearWithCalculations, Grades, Semester, SemesterWithCalculations,
    SimulationResult, Subject, SubjectPatch, SubjectWithCalculations, Ue, UePatch,
    UeWithCalculations, WhatIfResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    AcademicYear,
    Semester,
    Ue,
    Subject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AcademicYear => "academic year",
            Self::Semester => "semester",
            Self::Ue => "UE",
            Self::Subject => "subject",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },
    #[error("no user is signed in")]
    Unauthenticated,
}

impl TreeError {
    fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    fn duplicate(kind: EntityKind, id: &str) -> Self {
        Self::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Debug, Clone)]
struct YearNode {
    title: String,
    semesters: Vec<String>,
}

#[derive(Debug, Clone)]
struct SemesterNode {
    title: String,
    year_id: String,
    ues: Vec<String>,
}

#[derive(Debug, Clone)]
struct UeNode {
    name: String,
    credits: f64,
    semester_id: String,
    subjects: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreeCounts {
    pub years: usize,
    pub semesters: usize,
    pub ues: usize,
    pub subjects: usize,
}

/// One user's academic data, held as an arena of entities indexed by id. Parents keep
/// the ordered ids of their children; children keep the id of their parent. The nested
/// `AcademicYear` shape is only materialized on read and for persistence.
#[derive(Debug, Clone)]
pub struct AcademicTree {
    user_id: String,
    year_order: Vec<String>,
    years: HashMap<String, YearNode>,
    semesters: HashMap<String, SemesterNode>,
    ues: HashMap<String, UeNode>,
    subjects: HashMap<String, Subject>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl AcademicTree {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            year_order: Vec::new(),
            years: HashMap::new(),
            semesters: HashMap::new(),
            ues: HashMap::new(),
            subjects: HashMap::new(),
        }
    }

    /// Rebuild the arena from the nested shape. Back-references and the owning user are
    /// rewritten from the nesting itself. An id that appears twice anywhere in its kind is
    /// rejected, since the arena could only keep one of the copies.
    pub fn from_years(user_id: &str, years: Vec<AcademicYear>) -> TreeResult<Self> {
        let mut tree = Self::new(user_id);
        for year in years {
            if tree.years.contains_key(&year.id) {
                return Err(TreeError::duplicate(EntityKind::AcademicYear, &year.id));
            }
            let mut semester_ids = Vec::with_capacity(year.semesters.len());
            for semester in year.semesters {
                if tree.semesters.contains_key(&semester.id) {
                    return Err(TreeError::duplicate(EntityKind::Semester, &semester.id));
                }
                let mut ue_ids = Vec::with_capacity(semester.ues.len());
                for ue in semester.ues {
                    if tree.ues.contains_key(&ue.id) {
                        return Err(TreeError::duplicate(EntityKind::Ue, &ue.id));
                    }
                    let mut subject_ids = Vec::with_capacity(ue.subjects.len());
                    for mut subject in ue.subjects {
                        if tree.subjects.contains_key(&subject.id) {
                            return Err(TreeError::duplicate(EntityKind::Subject, &subject.id));
                        }
                        subject.ue_id = ue.id.clone();
                        subject_ids.push(subject.id.clone());
                        tree.subjects.insert(subject.id.clone(), subject);
                    }
                    ue_ids.push(ue.id.clone());
                    tree.ues.insert(
                        ue.id,
                        UeNode {
                            name: ue.name,
                            credits: ue.credits,
                            semester_id: semester.id.clone(),
                            subjects: subject_ids,
                        },
                    );
                }
                semester_ids.push(semester.id.clone());
                tree.semesters.insert(
                    semester.id,
                    SemesterNode {
                        title: semester.title,
                        year_id: year.id.clone(),
                        ues: ue_ids,
                    },
                );
            }
            tree.year_order.push(year.id.clone());
            tree.years.insert(
                year.id,
                YearNode {
                    title: year.title,
                    semesters: semester_ids,
                },
            );
        }
        Ok(tree)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn counts(&self) -> TreeCounts {
        TreeCounts {
            years: self.years.len(),
            semesters: self.semesters.len(),
            ues: self.ues.len(),
            subjects: self.subjects.len(),
        }
    }

    /// All years in insertion order, fully nested.
    pub fn years(&self) -> Vec<AcademicYear> {
        self.year_order
            .iter()
            .filter_map(|id| self.year(id).ok())
            .collect()
    }

    // -- academic years ------------------------------------------------------

    pub fn create_year(&mut self, title: &str) -> AcademicYear {
        let id = new_id();
        self.years.insert(
            id.clone(),
            YearNode {
                title: title.to_string(),
                semesters: Vec::new(),
            },
        );
        self.year_order.push(id.clone());
        AcademicYear {
            id,
            title: title.to_string(),
            user_id: self.user_id.clone(),
            semesters: Vec::new(),
        }
    }

    pub fn update_year(&mut self, id: &str, title: &str) -> TreeResult<AcademicYear> {
        let node = self
            .years
            .get_mut(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::AcademicYear, id))?;
        node.title = title.to_string();
        self.year(id)
    }

    pub fn delete_year(&mut self, id: &str) -> TreeResult<()> {
        let node = self
            .years
            .remove(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::AcademicYear, id))?;
        self.year_order.retain(|y| y != id);
        for semester_id in node.semesters {
            self.drop_semester(&semester_id);
        }
        Ok(())
    }

    pub fn year(&self, id: &str) -> TreeResult<AcademicYear> {
        let node = self
            .years
            .get(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::AcademicYear, id))?;
        Ok(AcademicYear {
            id: id.to_string(),
            title: node.title.clone(),
            user_id: self.user_id.clone(),
            semesters: node
                .semesters
                .iter()
                .filter_map(|s| self.semester(s).ok())
                .collect(),
        })
    }

    // -- semesters -------------------------------------------------------------

    pub fn create_semester(&mut self, year_id: &str, title: &str) -> TreeResult<Semester> {
        let year = self
            .years
            .get_mut(year_id)
            .ok_or_else(|| TreeError::not_found(EntityKind::AcademicYear, year_id))?;
        let id = new_id();
        year.semesters.push(id.clone());
        self.semesters.insert(
            id.clone(),
            SemesterNode {
                title: title.to_string(),
                year_id: year_id.to_string(),
                ues: Vec::new(),
            },
        );
        Ok(Semester {
            id,
            title: title.to_string(),
            academic_year_id: year_id.to_string(),
            ues: Vec::new(),
        })
    }

    pub fn update_semester(&mut self, id: &str, title: &str) -> TreeResult<Semester> {
        let node = self
            .semesters
            .get_mut(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Semester, id))?;
        node.title = title.to_string();
        self.semester(id)
    }

    pub fn delete_semester(&mut self, id: &str) -> TreeResult<()> {
        let year_id = self
            .semesters
            .get(id)
            .map(|s| s.year_id.clone())
            .ok_or_else(|| TreeError::not_found(EntityKind::Semester, id))?;
        if let Some(year) = self.years.get_mut(&year_id) {
            year.semesters.retain(|s| s != id);
        }
        self.drop_semester(id);
        Ok(())
    }

    pub fn semester(&self, id: &str) -> TreeResult<Semester> {
        let node = self
            .semesters
            .get(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Semester, id))?;
        Ok(Semester {
            id: id.to_string(),
            title: node.title.clone(),
            academic_year_id: node.year_id.clone(),
            ues: node.ues.iter().filter_map(|u| self.ue(u).ok()).collect(),
        })
    }

    // -- UEs -------------------------------------------------------------------

    pub fn create_ue(&mut self, semester_id: &str, name: &str, credits: f64) -> TreeResult<Ue> {
        let semester = self
            .semesters
            .get_mut(semester_id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Semester, semester_id))?;
        let id = new_id();
        semester.ues.push(id.clone());
        self.ues.insert(
            id.clone(),
            UeNode {
                name: name.to_string(),
                credits,
                semester_id: semester_id.to_string(),
                subjects: Vec::new(),
            },
        );
        Ok(Ue {
            id,
            name: name.to_string(),
            credits,
            semester_id: semester_id.to_string(),
            subjects: Vec::new(),
        })
    }

    pub fn update_ue(&mut self, id: &str, patch: UePatch) -> TreeResult<Ue> {
        let node = self
            .ues
            .get_mut(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Ue, id))?;
        if let Some(name) = patch.name {
            node.name = name;
        }
        if let Some(credits) = patch.credits {
            node.credits = credits;
        }
        self.ue(id)
    }

    pub fn delete_ue(&mut self, id: &str) -> TreeResult<()> {
        let semester_id = self
            .ues
            .get(id)
            .map(|u| u.semester_id.clone())
            .ok_or_else(|| TreeError::not_found(EntityKind::Ue, id))?;
        if let Some(semester) = self.semesters.get_mut(&semester_id) {
            semester.ues.retain(|u| u != id);
        }
        self.drop_ue(id);
        Ok(())
    }

    pub fn ue(&self, id: &str) -> TreeResult<Ue> {
        let node = self
            .ues
            .get(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Ue, id))?;
        Ok(Ue {
            id: id.to_string(),
            name: node.name.clone(),
            credits: node.credits,
            semester_id: node.semester_id.clone(),
            subjects: node
                .subjects
                .iter()
                .filter_map(|s| self.subjects.get(s).cloned())
                .collect(),
        })
    }

    // -- subjects ----------------------------------------------------------------

    /// New subjects start with every grade unset.
    pub fn create_subject(&mut self, ue_id: &str, name: &str, coefficient: f64) -> TreeResult<Subject> {
        let ue = self
            .ues
            .get_mut(ue_id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Ue, ue_id))?;
        let subject = Subject {
            id: new_id(),
            name: name.to_string(),
            coefficient,
            ue_id: ue_id.to_string(),
            interrogation: None,
            devoir: None,
            rattrapage: None,
        };
        ue.subjects.push(subject.id.clone());
        self.subjects.insert(subject.id.clone(), subject.clone());
        Ok(subject)
    }

    pub fn update_subject(&mut self, id: &str, patch: SubjectPatch) -> TreeResult<Subject> {
        let subject = self
            .subjects
            .get_mut(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Subject, id))?;
        if let Some(name) = patch.name {
            subject.name = name;
        }
        if let Some(coefficient) = patch.coefficient {
            subject.coefficient = coefficient;
        }
        Ok(subject.clone())
    }

    /// Replaces all three grades at once; `None` clears a grade.
    pub fn update_subject_grades(&mut self, id: &str, grades: Grades) -> TreeResult<Subject> {
        let subject = self
            .subjects
            .get_mut(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Subject, id))?;
        subject.interrogation = grades.interrogation;
        subject.devoir = grades.devoir;
        subject.rattrapage = grades.rattrapage;
        Ok(subject.clone())
    }

    pub fn delete_subject(&mut self, id: &str) -> TreeResult<()> {
        let subject = self
            .subjects
            .remove(id)
            .ok_or_else(|| TreeError::not_found(EntityKind::Subject, id))?;
        if let Some(ue) = self.ues.get_mut(&subject.ue_id) {
            ue.subjects.retain(|s| s != id);
        }
        Ok(())
    }

    pub fn subject(&self, id: &str) -> TreeResult<Subject> {
        self.subjects
            .get(id)
            .cloned()
            .ok_or_else(|| TreeError::not_found(EntityKind::Subject, id))
    }

    // -- cascade helpers (parent link already detached) ------------------------

    fn drop_semester(&mut self, id: &str) {
        if let Some(node) = self.semesters.remove(id) {
            for ue_id in node.ues {
                self.drop_ue(&ue_id);
            }
        }
    }

    fn drop_ue(&mut self, id: &str) {
        if let Some(node) = self.ues.remove(id) {
            for subject_id in node.subjects {
                self.subjects.remove(&subject_id);
            }
        }
    }

    // -- calculated views ----------------------------------------------------------

    pub fn year_with_calculations(
        &self,
        id: &str,
        rules: &GradingRules,
    ) -> TreeResult<AcademicYearWithCalculations> {
        Ok(calc::year_with_calculations(&self.year(id)?, rules))
    }

    pub fn semester_with_calculations(
        &self,
        id: &str,
        rules: &GradingRules,
    ) -> TreeResult<SemesterWithCalculations> {
        Ok(calc::semester_with_calculations(&self.semester(id)?, rules))
    }

    pub fn ue_with_calculations(
        &self,
        id: &str,
        rules: &GradingRules,
    ) -> TreeResult<UeWithCalculations> {
        Ok(calc::ue_with_calculations(&self.ue(id)?, rules))
    }

    pub fn subject_with_calculations(
        &self,
        id: &str,
        rules: &GradingRules,
    ) -> TreeResult<SubjectWithCalculations> {
        Ok(calc::subject_with_calculations(&self.subject(id)?, rules))
    }

    pub fn simulate_minimum_grades(
        &self,
        ue_id: &str,
        rules: &GradingRules,
    ) -> TreeResult<SimulationResult> {
        Ok(calc::simulate_minimum_grades(&self.ue(ue_id)?, rules))
    }

    pub fn evaluate_what_if(
        &self,
        ue_id: &str,
        grades: &HashMap<String, f64>,
        rules: &GradingRules,
    ) -> TreeResult<WhatIfResult> {
        Ok(calc::evaluate_what_if(&self.ue(ue_id)?, grades, rules))
    }
}
