use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::load_grading_rules;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "signedIn": state.session.is_some(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            // Malformed stored rules must not prevent the workspace from opening.
            let rules = match load_grading_rules(&conn) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "grading rules unreadable, using defaults");
                    Default::default()
                }
            };

            // Users belong to a workspace; switching workspaces ends the session.
            if let Some(session) = state.session.take() {
                tracing::info!(user_id = %session.user.id, "signed out on workspace switch");
            }
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.rules = rules;
            tracing::info!(workspace = %path.to_string_lossy(), "workspace opened");
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => {
            tracing::warn!(error = %e, "workspace open failed");
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
