use crate::calc;
use crate::ipc::error::{err, mutate_err, ok, tree_err};
use crate::ipc::helpers::{
    exceeds_credit_cap, optional_name, optional_positive, required_name, required_positive,
    required_str, session_ctx,
};
use crate::ipc::types::{AppState, Request};
use crate::model::UePatch;
use serde_json::json;

/// Semester credit cap; the core accepts any credits, this layer enforces the limit.
fn check_credit_cap(
    req: &Request,
    other_credits: f64,
    credits: f64,
    cap: f64,
) -> Result<(), serde_json::Value> {
    let new_total = other_credits + credits;
    if exceeds_credit_cap(new_total, cap) {
        return Err(err(
            &req.id,
            "constraint_violation",
            format!(
                "semester credits cannot exceed {} (currently {}, would become {})",
                cap, other_credits, new_total
            ),
            Some(json!({
                "cap": cap,
                "currentTotal": other_credits,
                "newTotal": new_total,
            })),
        ));
    }
    Ok(())
}

fn handle_ues_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let semester_id = match required_str(req, "semesterId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_name(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let credits = match required_positive(req, "credits") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let semester = match ctx.session.tree().semester(semester_id) {
        Ok(s) => s,
        Err(e) => return tree_err(&req.id, &e),
    };
    let current = calc::semester_total_credits(&semester);
    if let Err(resp) = check_credit_cap(req, current, credits, ctx.rules.semester_credit_cap) {
        return resp;
    }

    match ctx
        .session
        .mutate(ctx.conn, |tree| tree.create_ue(semester_id, &name, credits))
    {
        Ok(ue) => ok(&req.id, json!({ "ue": ue })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_ues_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = UePatch {
        name: match optional_name(req, "name") {
            Ok(v) => v,
            Err(resp) => return resp,
        },
        credits: match optional_positive(req, "credits") {
            Ok(v) => v,
            Err(resp) => return resp,
        },
    };

    if let Some(credits) = patch.credits {
        let tree = ctx.session.tree();
        let ue = match tree.ue(ue_id) {
            Ok(u) => u,
            Err(e) => return tree_err(&req.id, &e),
        };
        let semester = match tree.semester(&ue.semester_id) {
            Ok(s) => s,
            Err(e) => return tree_err(&req.id, &e),
        };
        let others = calc::semester_total_credits(&semester) - ue.credits;
        if let Err(resp) = check_credit_cap(req, others, credits, ctx.rules.semester_credit_cap) {
            return resp;
        }
    }

    match ctx.session.mutate(ctx.conn, |tree| tree.update_ue(ue_id, patch)) {
        Ok(ue) => ok(&req.id, json!({ "ue": ue })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_ues_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.mutate(ctx.conn, |tree| tree.delete_ue(ue_id)) {
        Ok(()) => ok(&req.id, json!({ "deleted": ue_id })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_ues_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().ue(ue_id) {
        Ok(ue) => ok(&req.id, json!({ "ue": ue })),
        Err(e) => tree_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ues.create" => Some(handle_ues_create(state, req)),
        "ues.update" => Some(handle_ues_update(state, req)),
        "ues.delete" => Some(handle_ues_delete(state, req)),
        "ues.get" => Some(handle_ues_get(state, req)),
        _ => None,
    }
}
