use crate::calc::GradingRules;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};

const GRADING_KEY: &str = "setup.grading";

#[derive(Clone, Copy)]
enum SetupSection {
    Grading,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "grading" => Some(Self::Grading),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Grading => GRADING_KEY,
        }
    }
}

fn parse_f64_range(v: &Value, key: &str, min: f64, max: f64) -> Result<f64, String> {
    let n = v
        .as_f64()
        .ok_or_else(|| format!("{} must be a number", key))?;
    if !n.is_finite() || !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn merge_grading_patch(current: &mut GradingRules, patch: &Map<String, Value>) -> Result<(), String> {
    for (k, v) in patch {
        match k.as_str() {
            "interrogationWeight" => current.interrogation_weight = parse_f64_range(v, k, 0.0, 1.0)?,
            "devoirWeight" => current.devoir_weight = parse_f64_range(v, k, 0.0, 1.0)?,
            "subjectPassMark" => current.subject_pass_mark = parse_f64_range(v, k, 0.0, 100.0)?,
            "uePassMark" => current.ue_pass_mark = parse_f64_range(v, k, 0.0, 100.0)?,
            "maxGrade" => current.max_grade = parse_f64_range(v, k, 1.0, 100.0)?,
            "yearNominalCredits" => {
                current.year_nominal_credits = parse_f64_range(v, k, 1.0, 600.0)?
            }
            "progressionCredits" => {
                current.progression_credits = parse_f64_range(v, k, 0.0, 600.0)?
            }
            "semesterCreditCap" => current.semester_credit_cap = parse_f64_range(v, k, 1.0, 600.0)?,
            "roundingStep" => current.rounding_step = parse_f64_range(v, k, 0.01, 100.0)?,
            _ => return Err(format!("unknown grading field: {}", k)),
        }
    }
    validate_grading(current)
}

fn validate_grading(rules: &GradingRules) -> Result<(), String> {
    if (rules.interrogation_weight + rules.devoir_weight - 1.0).abs() > 1e-9 {
        return Err("interrogationWeight + devoirWeight must equal 1".into());
    }
    if rules.subject_pass_mark > rules.max_grade || rules.ue_pass_mark > rules.max_grade {
        return Err("pass marks must not exceed maxGrade".into());
    }
    if rules.progression_credits > rules.year_nominal_credits {
        return Err("progressionCredits must not exceed yearNominalCredits".into());
    }
    if rules.semester_credit_cap > rules.year_nominal_credits {
        return Err("semesterCreditCap must not exceed yearNominalCredits".into());
    }
    Ok(())
}

/// Stored rules merged over the defaults.
pub fn load_grading_rules(conn: &rusqlite::Connection) -> anyhow::Result<GradingRules> {
    let mut current = GradingRules::default();
    if let Some(saved) = db::settings_get_json(conn, GRADING_KEY)? {
        if let Some(saved_obj) = saved.as_object() {
            let mut merged = current.clone();
            // A stored set that no longer validates is ignored as a whole.
            if merge_grading_patch(&mut merged, saved_obj).is_ok() {
                current = merged;
            }
        }
    }
    Ok(current)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let grading = match load_grading_rules(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    ok(&req.id, json!({ "grading": grading }))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_grading_rules(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_grading_patch(&mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    let stored = match serde_json::to_value(&current) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    };
    if let Err(e) = db::settings_set_json(conn, section.key(), &stored) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(section = section_raw, "setup updated");
    state.rules = current;
    ok(&req.id, json!({ "grading": stored }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
