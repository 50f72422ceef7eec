use crate::db;
use crate::ipc::error::{err, ok, tree_err};
use crate::ipc::helpers::{optional_name, required_name, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::User;
use crate::session::Session;
use crate::tree::TreeError;
use serde_json::json;
use uuid::Uuid;

fn sign_in(state: &mut AppState, req: &Request, user: User) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match Session::open(conn, user) {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "signed in");
            let result = json!({
                "user": session.user,
                "yearCount": session.tree().counts().years,
            });
            state.session = Some(session);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

fn handle_users_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let nom = match required_name(req, "nom") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let prenom = match required_name(req, "prenom") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let email = match required_name(req, "email") {
        Ok(v) => db::normalize_email(&v),
        Err(resp) => return resp,
    };

    match db::user_find_by_email(conn, &email) {
        Ok(Some(_)) => {
            return err(
                &req.id,
                "conflict",
                "an account with this email already exists",
                Some(json!({ "email": email })),
            )
        }
        Ok(None) => {}
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        nom,
        prenom,
        email,
    };
    if let Err(e) = db::user_insert(conn, &user) {
        return err(
            &req.id,
            "db_insert_failed",
            format!("{e:#}"),
            Some(json!({ "table": "users" })),
        );
    }
    tracing::info!(user_id = %user.id, "user registered");
    sign_in(state, req, user)
}

fn handle_session_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let email = match required_str(req, "email") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let user = match db::user_find_by_email(conn, email) {
        Ok(Some(u)) => u,
        Ok(None) => return err(&req.id, "not_found", "no account with this email", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    sign_in(state, req, user)
}

fn handle_session_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    let signed_out = match state.session.take() {
        Some(session) => {
            tracing::info!(user_id = %session.user.id, "signed out");
            true
        }
        None => false,
    };
    ok(&req.id, json!({ "signedOut": signed_out }))
}

fn handle_session_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "user": state.session.as_ref().map(|s| &s.user) }),
    )
}

fn handle_users_update_profile(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(session) = state.session.as_mut() else {
        return tree_err(&req.id, &TreeError::Unauthenticated);
    };
    let Some(patch) = req.params.get("patch").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };
    let patch_req = Request {
        id: req.id.clone(),
        method: req.method.clone(),
        params: patch.clone(),
    };

    let mut user = match db::user_get(conn, &session.user.id) {
        Ok(Some(u)) => u,
        Ok(None) => return err(&req.id, "not_found", "user not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match optional_name(&patch_req, "nom") {
        Ok(Some(v)) => user.nom = v,
        Ok(None) => {}
        Err(resp) => return resp,
    }
    match optional_name(&patch_req, "prenom") {
        Ok(Some(v)) => user.prenom = v,
        Ok(None) => {}
        Err(resp) => return resp,
    }
    match optional_name(&patch_req, "email") {
        Ok(Some(v)) => {
            let email = db::normalize_email(&v);
            match db::user_find_by_email(conn, &email) {
                Ok(Some(other)) if other.id != user.id => {
                    return err(
                        &req.id,
                        "conflict",
                        "an account with this email already exists",
                        Some(json!({ "email": email })),
                    )
                }
                Ok(_) => {}
                Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
            }
            user.email = email;
        }
        Ok(None) => {}
        Err(resp) => return resp,
    }

    if let Err(e) = db::user_update(conn, &user) {
        return err(&req.id, "db_update_failed", format!("{e:#}"), None);
    }
    session.user = user;
    ok(&req.id, json!({ "user": session.user }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.register" => Some(handle_users_register(state, req)),
        "users.updateProfile" => Some(handle_users_update_profile(state, req)),
        "session.signIn" => Some(handle_session_sign_in(state, req)),
        "session.signOut" => Some(handle_session_sign_out(state, req)),
        "session.current" => Some(handle_session_current(state, req)),
        _ => None,
    }
}
