use serde_json::json;

use crate::session::MutateError;
use crate::tree::TreeError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn tree_err(id: &str, e: &TreeError) -> serde_json::Value {
    let details = match e {
        TreeError::NotFound { kind, id: missing }
        | TreeError::DuplicateId { kind, id: missing } => {
            Some(json!({ "kind": kind.to_string(), "id": missing }))
        }
        TreeError::Unauthenticated => None,
    };
    err(id, e.code(), e.to_string(), details)
}

pub fn mutate_err(id: &str, e: &MutateError) -> serde_json::Value {
    match e {
        MutateError::Tree(t) => tree_err(id, t),
        MutateError::Store(_) => err(id, "db_update_failed", e.to_string(), None),
    }
}
