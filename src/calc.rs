use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    AcademicYear, AcademicYearWithCalculations, Semester, SemesterWithCalculations,
    SimulationResult, Subject, SubjectStatus, SubjectWithCalculations, Ue, UeWithCalculations,
    WhatIfResult,
};

/// Grading thresholds and weights. `Default` is the standard LMD rule set:
/// subject average = 40% interrogation + 60% devoir, a subject passes at 7/20,
/// a UE at 10/20, and a 60-credit year progresses at 48 validated credits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRules {
    pub interrogation_weight: f64,
    pub devoir_weight: f64,
    pub subject_pass_mark: f64,
    pub ue_pass_mark: f64,
    pub year_nominal_credits: f64,
    pub progression_credits: f64,
    pub semester_credit_cap: f64,
    pub max_grade: f64,
    pub rounding_step: f64,
}

impl Default for GradingRules {
    fn default() -> Self {
        Self {
            interrogation_weight: 0.4,
            devoir_weight: 0.6,
            subject_pass_mark: 7.0,
            ue_pass_mark: 10.0,
            year_nominal_credits: 60.0,
            progression_credits: 48.0,
            semester_credit_cap: 30.0,
            max_grade: 20.0,
            rounding_step: 0.5,
        }
    }
}

/// Round up to the next multiple of `step` (`ceil(x * 2) / 2` for the default 0.5).
pub fn round_up_to_step(x: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return x;
    }
    (x / step).ceil() * step
}

// ---------------------------------------------------------------------------
// Subject level
// ---------------------------------------------------------------------------

/// `None` until both interrogation and devoir are entered. A lone rattrapage never
/// produces an average.
pub fn subject_initial_average(subject: &Subject, rules: &GradingRules) -> Option<f64> {
    let (Some(interrogation), Some(devoir)) = (subject.interrogation, subject.devoir) else {
        return None;
    };
    Some(interrogation * rules.interrogation_weight + devoir * rules.devoir_weight)
}

/// The retake only counts when the initial average is below the subject pass mark,
/// and then only if it improves on it.
pub fn subject_final_average(subject: &Subject, rules: &GradingRules) -> Option<f64> {
    let initial = subject_initial_average(subject, rules)?;
    if initial >= rules.subject_pass_mark {
        return Some(initial);
    }
    match subject.rattrapage {
        Some(retake) => Some(initial.max(retake)),
        None => Some(initial),
    }
}

pub fn is_subject_validated(subject: &Subject, rules: &GradingRules) -> bool {
    subject_final_average(subject, rules)
        .map(|avg| avg >= rules.subject_pass_mark)
        .unwrap_or(false)
}

pub fn subject_status(subject: &Subject, rules: &GradingRules) -> SubjectStatus {
    let initial = subject_initial_average(subject, rules);
    match subject_final_average(subject, rules) {
        None => SubjectStatus::Warning,
        Some(f) if f < rules.subject_pass_mark => SubjectStatus::Danger,
        // Passed, but only thanks to the retake.
        Some(_) if initial.map(|i| i < rules.subject_pass_mark).unwrap_or(false) => {
            SubjectStatus::Warning
        }
        Some(_) => SubjectStatus::Success,
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Coefficient-weighted mean of the subjects' final averages. Any subject without a
/// final average blocks the whole UE; missing data is never counted as zero.
pub fn ue_average(ue: &Ue, rules: &GradingRules) -> Option<f64> {
    if ue.subjects.is_empty() {
        return None;
    }
    let mut weighted_sum = 0.0;
    let mut total_coefficients = 0.0;
    for subject in &ue.subjects {
        let final_average = subject_final_average(subject, rules)?;
        weighted_sum += final_average * subject.coefficient;
        total_coefficients += subject.coefficient;
    }
    if total_coefficients == 0.0 {
        return None;
    }
    Some(weighted_sum / total_coefficients)
}

/// Every subject must pass individually AND the UE average must reach the UE pass
/// mark. A UE without subjects is not valid.
pub fn is_ue_valid(ue: &Ue, rules: &GradingRules) -> bool {
    let all_subjects_validated =
        !ue.subjects.is_empty() && ue.subjects.iter().all(|s| is_subject_validated(s, rules));
    let has_required_average = ue_average(ue, rules)
        .map(|avg| avg >= rules.ue_pass_mark)
        .unwrap_or(false);
    all_subjects_validated && has_required_average
}

pub fn semester_average(semester: &Semester, rules: &GradingRules) -> Option<f64> {
    if semester.ues.is_empty() {
        return None;
    }
    let mut weighted_sum = 0.0;
    let mut total_credits = 0.0;
    for ue in &semester.ues {
        let average = ue_average(ue, rules)?;
        weighted_sum += average * ue.credits;
        total_credits += ue.credits;
    }
    if total_credits == 0.0 {
        return None;
    }
    Some(weighted_sum / total_credits)
}

/// Credits actually entered for the semester's UEs (not the nominal 30).
pub fn semester_total_credits(semester: &Semester) -> f64 {
    semester.ues.iter().map(|ue| ue.credits).sum()
}

/// Only fully validated UEs contribute; there are no partial credits.
pub fn semester_validated_credits(semester: &Semester, rules: &GradingRules) -> f64 {
    semester
        .ues
        .iter()
        .filter(|ue| is_ue_valid(ue, rules))
        .map(|ue| ue.credits)
        .sum()
}

pub fn year_validated_credits(year: &AcademicYear, rules: &GradingRules) -> f64 {
    year.semesters
        .iter()
        .map(|s| semester_validated_credits(s, rules))
        .sum()
}

pub fn year_can_progress(year: &AcademicYear, rules: &GradingRules) -> bool {
    year_validated_credits(year, rules) >= rules.progression_credits
}

// ---------------------------------------------------------------------------
// Projections ("with calculations" views)
// ---------------------------------------------------------------------------

pub fn subject_with_calculations(
    subject: &Subject,
    rules: &GradingRules,
) -> SubjectWithCalculations {
    SubjectWithCalculations {
        id: subject.id.clone(),
        name: subject.name.clone(),
        coefficient: subject.coefficient,
        ue_id: subject.ue_id.clone(),
        interrogation: subject.interrogation,
        devoir: subject.devoir,
        rattrapage: subject.rattrapage,
        initial_average: subject_initial_average(subject, rules),
        final_average: subject_final_average(subject, rules),
        status: subject_status(subject, rules),
    }
}

pub fn ue_with_calculations(ue: &Ue, rules: &GradingRules) -> UeWithCalculations {
    UeWithCalculations {
        id: ue.id.clone(),
        name: ue.name.clone(),
        credits: ue.credits,
        semester_id: ue.semester_id.clone(),
        average: ue_average(ue, rules),
        is_valid: is_ue_valid(ue, rules),
        subjects: ue
            .subjects
            .iter()
            .map(|s| subject_with_calculations(s, rules))
            .collect(),
    }
}

pub fn semester_with_calculations(
    semester: &Semester,
    rules: &GradingRules,
) -> SemesterWithCalculations {
    SemesterWithCalculations {
        id: semester.id.clone(),
        title: semester.title.clone(),
        academic_year_id: semester.academic_year_id.clone(),
        average: semester_average(semester, rules),
        total_credits: semester_total_credits(semester),
        validated_credits: semester_validated_credits(semester, rules),
        ues: semester
            .ues
            .iter()
            .map(|ue| ue_with_calculations(ue, rules))
            .collect(),
    }
}

pub fn year_with_calculations(
    year: &AcademicYear,
    rules: &GradingRules,
) -> AcademicYearWithCalculations {
    AcademicYearWithCalculations {
        id: year.id.clone(),
        title: year.title.clone(),
        user_id: year.user_id.clone(),
        // Nominal, independent of the credits actually entered.
        total_credits: rules.year_nominal_credits,
        validated_credits: year_validated_credits(year, rules),
        can_progress: year_can_progress(year, rules),
        semesters: year
            .semesters
            .iter()
            .map(|s| semester_with_calculations(s, rules))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

fn fmt_grade(x: f64) -> String {
    format!("{}", x)
}

/// Minimum retake grade(s) needed for the UE average to reach the UE pass mark.
///
/// With a single subject to retake the exact required grade is proposed (rounded up
/// to the rounding step, not floored at the subject pass mark). With several, one
/// shared target is proposed for all of them, floored at the subject pass mark.
pub fn simulate_minimum_grades(ue: &Ue, rules: &GradingRules) -> SimulationResult {
    let retake: Vec<&Subject> = ue
        .subjects
        .iter()
        .filter(|s| {
            subject_final_average(s, rules)
                .map(|avg| avg < rules.subject_pass_mark)
                .unwrap_or(true)
        })
        .collect();

    if retake.is_empty() {
        if let Some(avg) = ue_average(ue, rules) {
            if avg < rules.ue_pass_mark {
                return SimulationResult {
                    minimum_grades: BTreeMap::new(),
                    is_possible: false,
                    message: format!(
                        "Every subject is at or above {} but the UE average is below {}. No retake can validate this UE.",
                        fmt_grade(rules.subject_pass_mark),
                        fmt_grade(rules.ue_pass_mark)
                    ),
                };
            }
        }
        return SimulationResult {
            minimum_grades: BTreeMap::new(),
            is_possible: true,
            message: "This UE is already validated or needs no retake.".to_string(),
        };
    }

    let total_coefficients: f64 = ue.subjects.iter().map(|s| s.coefficient).sum();
    let points_needed = rules.ue_pass_mark * total_coefficients;

    if let [subject] = retake.as_slice() {
        let total_points: f64 = ue
            .subjects
            .iter()
            .filter(|s| s.id != subject.id)
            .filter_map(|s| subject_final_average(s, rules).map(|avg| avg * s.coefficient))
            .sum();
        let required = (points_needed - total_points) / subject.coefficient;

        if required > rules.max_grade {
            let mut minimum_grades = BTreeMap::new();
            minimum_grades.insert(subject.id.clone(), rules.max_grade);
            return SimulationResult {
                minimum_grades,
                is_possible: false,
                message: format!(
                    "Even with {} in the {} retake, the UE average stays below {}.",
                    fmt_grade(rules.max_grade),
                    subject.name,
                    fmt_grade(rules.ue_pass_mark)
                ),
            };
        }

        let grade = round_up_to_step(required, rules.rounding_step);
        let mut minimum_grades = BTreeMap::new();
        minimum_grades.insert(subject.id.clone(), grade);
        return SimulationResult {
            minimum_grades,
            is_possible: true,
            message: format!(
                "Scoring at least {} in the {} retake validates the UE.",
                fmt_grade(grade),
                subject.name
            ),
        };
    }

    let is_retake = |s: &Subject| retake.iter().any(|r| r.id == s.id);
    let mut total_points = 0.0;
    let mut total_retake_coefficients = 0.0;
    for subject in &ue.subjects {
        if is_retake(subject) {
            total_retake_coefficients += subject.coefficient;
        } else if let Some(avg) = subject_final_average(subject, rules) {
            total_points += avg * subject.coefficient;
        }
    }
    let required = (points_needed - total_points) / total_retake_coefficients;

    if required > rules.max_grade {
        return SimulationResult {
            minimum_grades: retake
                .iter()
                .map(|s| (s.id.clone(), rules.max_grade))
                .collect(),
            is_possible: false,
            message: "Even with the maximum grade in every retake, the UE cannot be validated."
                .to_string(),
        };
    }

    let grade = rules
        .subject_pass_mark
        .max(round_up_to_step(required, rules.rounding_step));
    let mut minimum_grades = BTreeMap::new();
    let mut message = String::from("To validate the UE, score at least:\n");
    for subject in &retake {
        minimum_grades.insert(subject.id.clone(), grade);
        message.push_str(&format!(
            "- {} in the {} retake\n",
            fmt_grade(grade),
            subject.name
        ));
    }

    SimulationResult {
        minimum_grades,
        is_possible: true,
        message,
    }
}

/// Evaluate hypothetical final grades (subject id -> grade) against the UE rules.
pub fn evaluate_what_if(
    ue: &Ue,
    grades: &HashMap<String, f64>,
    rules: &GradingRules,
) -> WhatIfResult {
    if ue.subjects.is_empty() {
        return WhatIfResult {
            is_valid: false,
            average: None,
            message: "This UE has no subjects to simulate.".to_string(),
        };
    }
    if !ue.subjects.iter().all(|s| grades.contains_key(&s.id)) {
        return WhatIfResult {
            is_valid: false,
            average: None,
            message: "Enter a grade for every subject to simulate the UE.".to_string(),
        };
    }
    if ue
        .subjects
        .iter()
        .any(|s| grades[&s.id] < rules.subject_pass_mark)
    {
        return WhatIfResult {
            is_valid: false,
            average: None,
            message: format!(
                "The UE cannot be validated: at least one subject is below {}.",
                fmt_grade(rules.subject_pass_mark)
            ),
        };
    }

    let mut weighted_sum = 0.0;
    let mut total_coefficients = 0.0;
    for subject in &ue.subjects {
        weighted_sum += grades[&subject.id] * subject.coefficient;
        total_coefficients += subject.coefficient;
    }
    if total_coefficients == 0.0 {
        return WhatIfResult {
            is_valid: false,
            average: None,
            message: "The subjects of this UE carry no coefficient.".to_string(),
        };
    }

    let average = weighted_sum / total_coefficients;
    if average >= rules.ue_pass_mark {
        WhatIfResult {
            is_valid: true,
            average: Some(average),
            message: format!(
                "The UE is validated with these grades. Simulated average: {:.2}/{}",
                average,
                fmt_grade(rules.max_grade)
            ),
        }
    } else {
        WhatIfResult {
            is_valid: false,
            average: Some(average),
            message: format!(
                "The UE is not validated with these grades. It needs at least {}/{}, the simulated average is {:.2}/{}.",
                fmt_grade(rules.ue_pass_mark),
                fmt_grade(rules.max_grade),
                average,
                fmt_grade(rules.max_grade)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> GradingRules {
        GradingRules::default()
    }

    fn subject(id: &str, coefficient: f64, i: Option<f64>, d: Option<f64>, r: Option<f64>) -> Subject {
        Subject {
            id: id.to_string(),
            name: id.to_uppercase(),
            coefficient,
            ue_id: "ue".to_string(),
            interrogation: i,
            devoir: d,
            rattrapage: r,
        }
    }

    /// Subject whose final average is exactly `avg` (interrogation == devoir == avg).
    fn graded(id: &str, coefficient: f64, avg: f64) -> Subject {
        subject(id, coefficient, Some(avg), Some(avg), None)
    }

    fn ue(credits: f64, subjects: Vec<Subject>) -> Ue {
        Ue {
            id: "ue".to_string(),
            name: "UE".to_string(),
            credits,
            semester_id: "sem".to_string(),
            subjects,
        }
    }

    fn semester(ues: Vec<Ue>) -> Semester {
        Semester {
            id: "sem".to_string(),
            title: "S1".to_string(),
            academic_year_id: "year".to_string(),
            ues,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn initial_average_weights_interrogation_and_devoir() {
        let s = subject("a", 1.0, Some(10.0), Some(15.0), None);
        let avg = subject_initial_average(&s, &rules()).expect("average");
        assert!(approx(avg, 0.4 * 10.0 + 0.6 * 15.0));
    }

    #[test]
    fn initial_average_needs_both_components() {
        let r = rules();
        assert_eq!(subject_initial_average(&subject("a", 1.0, Some(12.0), None, None), &r), None);
        assert_eq!(subject_initial_average(&subject("a", 1.0, None, Some(12.0), None), &r), None);
        // Retake alone never yields an average.
        let only_retake = subject("a", 1.0, None, None, Some(15.0));
        assert_eq!(subject_final_average(&only_retake, &r), None);
        assert_eq!(subject_status(&only_retake, &r), SubjectStatus::Warning);
    }

    #[test]
    fn retake_ignored_when_initial_passes() {
        let s = subject("a", 1.0, Some(8.0), Some(8.0), Some(19.0));
        assert_eq!(subject_final_average(&s, &rules()), Some(8.0));
        assert_eq!(subject_status(&s, &rules()), SubjectStatus::Success);
    }

    #[test]
    fn retake_takes_the_better_grade_when_initial_fails() {
        let r = rules();
        let improved = subject("a", 1.0, Some(5.0), Some(5.0), Some(12.0));
        assert_eq!(subject_final_average(&improved, &r), Some(12.0));
        assert!(is_subject_validated(&improved, &r));
        assert_eq!(subject_status(&improved, &r), SubjectStatus::Warning);

        let worse = subject("a", 1.0, Some(5.0), Some(5.0), Some(3.0));
        assert_eq!(subject_final_average(&worse, &r), Some(5.0));
        assert!(!is_subject_validated(&worse, &r));
        assert_eq!(subject_status(&worse, &r), SubjectStatus::Danger);

        let no_retake = subject("a", 1.0, Some(5.0), Some(5.0), None);
        assert_eq!(subject_final_average(&no_retake, &r), Some(5.0));
    }

    #[test]
    fn ue_average_blocks_on_incomplete_subject() {
        let r = rules();
        let u = ue(6.0, vec![graded("a", 2.0, 14.0), subject("b", 1.0, Some(12.0), None, None)]);
        assert_eq!(ue_average(&u, &r), None);
        assert!(!is_ue_valid(&u, &r));
        assert_eq!(ue_average(&ue(6.0, vec![]), &r), None);
    }

    #[test]
    fn ue_average_is_coefficient_weighted() {
        let u = ue(6.0, vec![graded("a", 2.0, 14.0), graded("b", 1.0, 8.0)]);
        let avg = ue_average(&u, &rules()).expect("average");
        assert!(approx(avg, (14.0 * 2.0 + 8.0) / 3.0));
        assert!(is_ue_valid(&u, &rules()));
    }

    #[test]
    fn ue_invalid_when_a_subject_fails_despite_high_average() {
        let u = ue(6.0, vec![graded("a", 3.0, 18.0), graded("b", 1.0, 5.0)]);
        let avg = ue_average(&u, &rules()).expect("average");
        assert!(avg >= 10.0);
        assert!(!is_ue_valid(&u, &rules()));
    }

    #[test]
    fn ue_invalid_when_average_short_despite_all_subjects_passing() {
        let u = ue(6.0, vec![graded("a", 1.0, 8.0), graded("b", 1.0, 9.0)]);
        assert!(u.subjects.iter().all(|s| is_subject_validated(s, &rules())));
        assert!(!is_ue_valid(&u, &rules()));
    }

    #[test]
    fn empty_ue_is_not_valid() {
        assert!(!is_ue_valid(&ue(6.0, vec![]), &rules()));
    }

    #[test]
    fn semester_average_blocks_on_incomplete_ue() {
        let r = rules();
        let complete = ue(6.0, vec![graded("a", 1.0, 12.0)]);
        let incomplete = ue(4.0, vec![subject("b", 1.0, None, None, None)]);
        assert_eq!(semester_average(&semester(vec![complete.clone(), incomplete]), &r), None);

        let mut other = ue(4.0, vec![graded("c", 1.0, 7.0)]);
        other.id = "ue2".to_string();
        let avg = semester_average(&semester(vec![complete, other]), &r).expect("average");
        assert!(approx(avg, (12.0 * 6.0 + 7.0 * 4.0) / 10.0));
        assert_eq!(semester_average(&semester(vec![]), &r), None);
    }

    #[test]
    fn validated_credits_only_count_valid_ues() {
        let r = rules();
        let valid = ue(6.0, vec![graded("a", 1.0, 12.0)]);
        let invalid = ue(4.0, vec![graded("b", 1.0, 9.0)]);
        let s = semester(vec![valid, invalid]);
        assert_eq!(semester_total_credits(&s), 10.0);
        assert_eq!(semester_validated_credits(&s, &r), 6.0);
    }

    #[test]
    fn year_progression_threshold_is_48_credits() {
        let r = rules();
        let year_with = |credits: f64| AcademicYear {
            id: "year".to_string(),
            title: "L1".to_string(),
            user_id: "u".to_string(),
            semesters: vec![
                semester(vec![ue(30.0, vec![graded("a", 1.0, 12.0)])]),
                semester(vec![ue(credits, vec![graded("b", 1.0, 12.0)])]),
            ],
        };
        let passing = year_with(18.0);
        assert_eq!(year_validated_credits(&passing, &r), 48.0);
        assert!(year_can_progress(&passing, &r));

        let short = year_with(17.0);
        assert!(!year_can_progress(&short, &r));

        let view = year_with_calculations(&short, &r);
        assert_eq!(view.total_credits, 60.0);
        assert_eq!(view.validated_credits, 47.0);
        assert!(!view.can_progress);
    }

    #[test]
    fn round_up_to_half_points() {
        assert_eq!(round_up_to_step(7.01, 0.5), 7.5);
        assert_eq!(round_up_to_step(7.5, 0.5), 7.5);
        assert_eq!(round_up_to_step(7.51, 0.5), 8.0);
        assert_eq!(round_up_to_step(2.0, 0.5), 2.0);
    }

    #[test]
    fn simulate_single_retake_is_not_floored_at_pass_mark() {
        // 14 (coef 2) + retake (coef 1): (30 - 28) / 1 = 2. Proposed as-is, not raised to 7.
        let u = ue(6.0, vec![graded("a", 2.0, 14.0), subject("b", 1.0, None, None, None)]);
        let result = simulate_minimum_grades(&u, &rules());
        assert!(result.is_possible);
        assert_eq!(result.minimum_grades.get("b"), Some(&2.0));
        assert_eq!(result.minimum_grades.len(), 1);
    }

    #[test]
    fn simulate_single_retake_rounds_up_to_half() {
        // (30 - 11.2 * 2) / 1 = 7.6, rounded up to 8.
        let u = ue(6.0, vec![graded("a", 2.0, 11.2), graded("b", 1.0, 4.0)]);
        let result = simulate_minimum_grades(&u, &rules());
        assert!(result.is_possible);
        assert_eq!(result.minimum_grades.get("b"), Some(&8.0));
    }

    #[test]
    fn simulate_single_retake_impossible_caps_at_max_grade() {
        // (50 - 7 * 4) / 1 = 22 > 20.
        let u = ue(6.0, vec![graded("a", 4.0, 7.0), graded("b", 1.0, 3.0)]);
        let result = simulate_minimum_grades(&u, &rules());
        assert!(!result.is_possible);
        assert_eq!(result.minimum_grades.get("b"), Some(&20.0));
    }

    #[test]
    fn simulate_multiple_retakes_share_a_floored_target() {
        // a = 16 (coef 2), b and c missing (coef 1 each): (40 - 32) / 2 = 4 -> floored to 7.
        let u = ue(
            6.0,
            vec![
                graded("a", 2.0, 16.0),
                subject("b", 1.0, None, None, None),
                subject("c", 1.0, Some(4.0), Some(4.0), None),
            ],
        );
        let result = simulate_minimum_grades(&u, &rules());
        assert!(result.is_possible);
        assert_eq!(result.minimum_grades.get("b"), Some(&7.0));
        assert_eq!(result.minimum_grades.get("c"), Some(&7.0));
        assert!(result.message.contains("B retake"));
    }

    #[test]
    fn simulate_multiple_retakes_above_floor() {
        // a = 10 (coef 1), b and c retake (coef 1 each): (30 - 10) / 2 = 10.
        let u = ue(
            6.0,
            vec![
                graded("a", 1.0, 10.0),
                graded("b", 1.0, 2.0),
                graded("c", 1.0, 1.0),
            ],
        );
        let result = simulate_minimum_grades(&u, &rules());
        assert!(result.is_possible);
        assert_eq!(result.minimum_grades.get("b"), Some(&10.0));
        assert_eq!(result.minimum_grades.get("c"), Some(&10.0));
    }

    #[test]
    fn simulate_multiple_retakes_impossible() {
        // a = 7 (coef 10), b and c retake (coef 1): (120 - 70) / 2 = 25 > 20.
        let u = ue(
            6.0,
            vec![
                graded("a", 10.0, 7.0),
                graded("b", 1.0, 2.0),
                graded("c", 1.0, 1.0),
            ],
        );
        let result = simulate_minimum_grades(&u, &rules());
        assert!(!result.is_possible);
        assert_eq!(result.minimum_grades.get("b"), Some(&20.0));
        assert_eq!(result.minimum_grades.get("c"), Some(&20.0));
    }

    #[test]
    fn simulate_no_retake_but_short_average_is_impossible() {
        let u = ue(6.0, vec![graded("a", 1.0, 8.0), graded("b", 1.0, 9.0)]);
        let result = simulate_minimum_grades(&u, &rules());
        assert!(!result.is_possible);
        assert!(result.minimum_grades.is_empty());
    }

    #[test]
    fn simulate_already_valid_ue() {
        let u = ue(6.0, vec![graded("a", 1.0, 12.0)]);
        let result = simulate_minimum_grades(&u, &rules());
        assert!(result.is_possible);
        assert!(result.minimum_grades.is_empty());
    }

    #[test]
    fn what_if_requires_every_grade_and_the_subject_floor() {
        let r = rules();
        let u = ue(6.0, vec![graded("a", 2.0, 0.0), graded("b", 1.0, 0.0)]);

        let partial = HashMap::from([("a".to_string(), 15.0)]);
        let res = evaluate_what_if(&u, &partial, &r);
        assert!(!res.is_valid);
        assert_eq!(res.average, None);

        let below_floor = HashMap::from([("a".to_string(), 18.0), ("b".to_string(), 6.5)]);
        let res = evaluate_what_if(&u, &below_floor, &r);
        assert!(!res.is_valid);
        assert_eq!(res.average, None);

        let passing = HashMap::from([("a".to_string(), 12.0), ("b".to_string(), 7.0)]);
        let res = evaluate_what_if(&u, &passing, &r);
        assert!(res.is_valid);
        assert!(approx(res.average.expect("average"), 31.0 / 3.0));

        let short = HashMap::from([("a".to_string(), 9.0), ("b".to_string(), 8.0)]);
        let res = evaluate_what_if(&u, &short, &r);
        assert!(!res.is_valid);
        assert!(res.average.is_some());
    }
}
