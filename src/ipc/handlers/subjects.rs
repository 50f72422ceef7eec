use crate::ipc::error::{mutate_err, ok, tree_err};
use crate::ipc::helpers::{
    optional_grade, optional_name, optional_positive, required_name, required_positive,
    required_str, session_ctx,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Grades, SubjectPatch};
use serde_json::json;

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ue_id = match required_str(req, "ueId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let name = match required_name(req, "name") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let coefficient = match required_positive(req, "coefficient") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx
        .session
        .mutate(ctx.conn, |tree| tree.create_subject(ue_id, &name, coefficient))
    {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = SubjectPatch {
        name: match optional_name(req, "name") {
            Ok(v) => v,
            Err(resp) => return resp,
        },
        coefficient: match optional_positive(req, "coefficient") {
            Ok(v) => v,
            Err(resp) => return resp,
        },
    };
    match ctx
        .session
        .mutate(ctx.conn, |tree| tree.update_subject(subject_id, patch))
    {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_subjects_update_grades(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut grades = Grades::default();
    for (key, slot) in [
        ("interrogation", &mut grades.interrogation),
        ("devoir", &mut grades.devoir),
        ("rattrapage", &mut grades.rattrapage),
    ] {
        match optional_grade(req, key, ctx.rules) {
            Ok(v) => *slot = v,
            Err(resp) => return resp,
        }
    }
    match ctx
        .session
        .mutate(ctx.conn, |tree| tree.update_subject_grades(subject_id, grades))
    {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
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
        .mutate(ctx.conn, |tree| tree.delete_subject(subject_id))
    {
        Ok(()) => ok(&req.id, json!({ "deleted": subject_id })),
        Err(e) => mutate_err(&req.id, &e),
    }
}

fn handle_subjects_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match ctx.session.tree().subject(subject_id) {
        Ok(subject) => ok(&req.id, json!({ "subject": subject })),
        Err(e) => tree_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.updateGrades" => Some(handle_subjects_update_grades(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        "subjects.get" => Some(handle_subjects_get(state, req)),
        _ => None,
    }
}
