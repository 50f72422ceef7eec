use rusqlite::Connection;
use serde_json::Value;

use crate::calc::GradingRules;
use crate::ipc::error::{err, tree_err};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;
use crate::tree::TreeError;

/// Everything a tree handler needs, borrowed out of the app state at once.
pub struct SessionCtx<'a> {
    pub conn: &'a Connection,
    pub session: &'a mut Session,
    pub rules: &'a GradingRules,
}

pub fn session_ctx<'a>(state: &'a mut AppState, req: &Request) -> Result<SessionCtx<'a>, Value> {
    let Some(conn) = state.db.as_ref() else {
        return Err(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    let Some(session) = state.session.as_mut() else {
        return Err(tree_err(&req.id, &TreeError::Unauthenticated));
    };
    Ok(SessionCtx {
        conn,
        session,
        rules: &state.rules,
    })
}

pub fn required_str<'r>(req: &'r Request, key: &str) -> Result<&'r str, Value> {
    match req.params.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(v) if !v.is_null() => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string", key),
            None,
        )),
        _ => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

/// Trimmed, non-empty title or name.
pub fn required_name(req: &Request, key: &str) -> Result<String, Value> {
    let raw = required_str(req, key)?;
    non_empty(req, key, raw)
}

pub fn optional_name(req: &Request, key: &str) -> Result<Option<String>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => non_empty(req, key, s).map(Some),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string", key),
            None,
        )),
    }
}

/// Sums of fractional credits may overshoot the cap by rounding noise.
const CREDIT_EPSILON: f64 = 1e-9;

pub fn is_positive(n: f64) -> bool {
    n.is_finite() && n > 0.0
}

pub fn grade_in_range(n: f64, rules: &GradingRules) -> bool {
    n.is_finite() && (0.0..=rules.max_grade).contains(&n)
}

pub fn exceeds_credit_cap(total: f64, cap: f64) -> bool {
    total > cap + CREDIT_EPSILON
}

fn non_empty(req: &Request, key: &str, raw: &str) -> Result<String, Value> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(err(
            &req.id,
            "constraint_violation",
            format!("{} must not be empty", key),
            None,
        ));
    }
    Ok(name.to_string())
}

pub fn required_positive(req: &Request, key: &str) -> Result<f64, Value> {
    match optional_positive(req, key)? {
        Some(v) => Ok(v),
        None => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

/// Coefficients and credits: absent is fine, present must be a finite number > 0.
pub fn optional_positive(req: &Request, key: &str) -> Result<Option<f64>, Value> {
    let Some(v) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let Some(n) = v.as_f64() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a number", key),
            None,
        ));
    };
    if !is_positive(n) {
        return Err(err(
            &req.id,
            "constraint_violation",
            format!("{} must be greater than 0", key),
            Some(serde_json::json!({ "field": key, "value": n })),
        ));
    }
    Ok(Some(n))
}

pub fn check_grade(req: &Request, key: &str, n: f64, rules: &GradingRules) -> Result<f64, Value> {
    if !grade_in_range(n, rules) {
        return Err(err(
            &req.id,
            "constraint_violation",
            format!("{} must be between 0 and {}", key, rules.max_grade),
            Some(serde_json::json!({ "field": key, "value": n })),
        ));
    }
    Ok(n)
}

/// A grade parameter: absent or null clears it, otherwise 0..=max_grade.
pub fn optional_grade(req: &Request, key: &str, rules: &GradingRules) -> Result<Option<f64>, Value> {
    let Some(v) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let Some(n) = v.as_f64() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a number or null", key),
            None,
        ));
    };
    check_grade(req, key, n, rules).map(Some)
}
