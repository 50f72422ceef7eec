use crate::calc;
use crate::ipc::error::{err, ok, tree_err};
use crate::ipc::helpers::{check_grade, required_str, session_ctx};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::collections::HashMap;

fn handle_calc_year(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let year_id = match required_str(req, "yearId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().year_with_calculations(year_id, ctx.rules) {
        Ok(year) => ok(&req.id, json!({ "year": year })),
        Err(e) => tree_err(&req.id, &e),
    }
}

fn handle_calc_semester(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let semester_id = match required_str(req, "semesterId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx
        .session
        .tree()
        .semester_with_calculations(semester_id, ctx.rules)
    {
        Ok(semester) => ok(&req.id, json!({ "semester": semester })),
        Err(e) => tree_err(&req.id, &e),
    }
}

fn handle_calc_ue(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().ue_with_calculations(ue_id, ctx.rules) {
        Ok(ue) => ok(&req.id, json!({ "ue": ue })),
        Err(e) => tree_err(&req.id, &e),
    }
}

fn handle_calc_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx
        .session
        .tree()
        .subject_with_calculations(subject_id, ctx.rules)
    {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => tree_err(&req.id, &e),
    }
}

fn handle_calc_simulate(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().simulate_minimum_grades(ue_id, ctx.rules) {
        Ok(result) => ok(&req.id, json!({ "simulation": result })),
        Err(e) => tree_err(&req.id, &e),
    }
}

fn handle_calc_what_if(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("grades").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "grades must be an object", None);
    };
    let mut grades: HashMap<String, f64> = HashMap::with_capacity(raw.len());
    for (subject_id, v) in raw {
        // Null means "no hypothetical grade" for that subject.
        if v.is_null() {
            continue;
        }
        let Some(n) = v.as_f64() else {
            return err(
                &req.id,
                "bad_params",
                format!("grades.{} must be a number", subject_id),
                None,
            );
        };
        match check_grade(req, &format!("grades.{}", subject_id), n, ctx.rules) {
            Ok(n) => grades.insert(subject_id.clone(), n),
            Err(resp) => return resp,
        };
    }
    match ctx.session.tree().evaluate_what_if(ue_id, &grades, ctx.rules) {
        Ok(result) => ok(&req.id, json!({ "whatIf": result })),
        Err(e) => tree_err(&req.id, &e),
    }
}

fn handle_calc_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let years: Vec<_> = ctx
        .session
        .tree()
        .years()
        .iter()
        .map(|y| calc::year_with_calculations(y, ctx.rules))
        .collect();
    let validated_credits: f64 = years.iter().map(|y| y.validated_credits).sum();
    let progressing = years.iter().filter(|y| y.can_progress).count();
    ok(
        &req.id,
        json!({
            "user": ctx.session.user,
            "years": years,
            "totals": {
                "yearCount": years.len(),
                "validatedCredits": validated_credits,
                "progressingYears": progressing,
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.year" => Some(handle_calc_year(state, req)),
        "calc.semester" => Some(handle_calc_semester(state, req)),
        "calc.ue" => Some(handle_calc_ue(state, req)),
        "calc.subject" => Some(handle_calc_subject(state, req)),
        "calc.simulate" => Some(handle_calc_simulate(state, req)),
        "calc.whatIf" => Some(handle_calc_what_if(state, req)),
        "calc.dashboard" => Some(handle_calc_dashboard(state, req)),
        _ => None,
    }
}
