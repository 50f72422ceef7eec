use crate::ipc::error::{mutate_err, ok, tree_err};
use crate::ipc::helpers::{required_name, required_str, session_ctx};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_semesters_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let year_id = match required_str(req, "yearId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let title = match required_name(req, "title") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx
        .session
        .mutate(ctx.conn, |tree| tree.create_semester(year_id, &title))
    {
        Ok(semester) => ok(&req.id, json!({ "semester": semester })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_semesters_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let semester_id = match required_str(req, "semesterId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let title = match required_name(req, "title") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx
        .session
        .mutate(ctx.conn, |tree| tree.update_semester(semester_id, &title))
    {
        Ok(semester) => ok(&req.id, json!({ "semester": semester })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_semesters_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
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
        .mutate(ctx.conn, |tree| tree.delete_semester(semester_id))
    {
        Ok(()) => ok(&req.id, json!({ "deleted": semester_id })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_semesters_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let semester_id = match required_str(req, "semesterId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().semester(semester_id) {
        Ok(semester) => ok(&req.id, json!({ "semester": semester })),
        Err(e) => tree_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "semesters.create" => Some(handle_semesters_create(state, req)),
        "semesters.update" => Some(handle_semesters_update(state, req)),
        "semesters.delete" => Some(handle_semesters_delete(state, req)),
        "semesters.get" => Some(handle_semesters_get(state, req)),
        _ => None,
    }
}
