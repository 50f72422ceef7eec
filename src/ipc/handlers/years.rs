use crate::ipc::error::{mutate_err, ok, tree_err};
use crate::ipc::helpers::{required_name, required_str, session_ctx};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_years_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "years": ctx.session.tree().years() }))
}

fn handle_years_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let title = match required_name(req, "title") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx
        .session
        .mutate(ctx.conn, |tree| Ok(tree.create_year(&title)))
    {
        Ok(year) => ok(&req.id, json!({ "year": year })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_years_update(state: &mut AppState, req: &Request) -> serde_json::Value {
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
        .mutate(ctx.conn, |tree| tree.update_year(year_id, &title))
    {
        Ok(year) => ok(&req.id, json!({ "year": year })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_years_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let year_id = match required_str(req, "yearId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.mutate(ctx.conn, |tree| tree.delete_year(year_id)) {
        Ok(()) => ok(&req.id, json!({ "deleted": year_id })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_years_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let year_id = match required_str(req, "yearId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().year(year_id) {
        Ok(year) => ok(&req.id, json!({ "year": year })),
        Err(e) => tree_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "years.list" => Some(handle_years_list(state, req)),
        "years.create" => Some(handle_years_create(state, req)),
        "years.update" => Some(handle_years_update(state, req)),
        "years.delete" => Some(handle_years_delete(state, req)),
        "years.get" => Some(handle_years_get(state, req)),
        _ => None,
    }
}
