use crate::backup;
use crate::calc::{self, GradingRules};
use crate::ipc::error::{err, mutate_err, ok};
use crate::ipc::helpers::{
    exceeds_credit_cap, grade_in_range, is_positive, required_str, session_ctx,
};
use crate::ipc::types::{AppState, Request};
use crate::tree::AcademicTree;
use serde_json::json;
use std::path::PathBuf;

/// A bundle is held to the same limits as the per-entity methods: non-blank names,
/// positive credits and coefficients, grades within range and the semester credit cap.
fn check_imported_tree(
    tree: &AcademicTree,
    rules: &GradingRules,
) -> Result<(), (String, serde_json::Value)> {
    let blank = |kind: &str, id: &str| {
        (
            format!("{} {} has an empty name", kind, id),
            json!({ "kind": kind, "id": id }),
        )
    };
    for year in tree.years() {
        if year.title.trim().is_empty() {
            return Err(blank("academic year", &year.id));
        }
        for semester in &year.semesters {
            if semester.title.trim().is_empty() {
                return Err(blank("semester", &semester.id));
            }
            let total = calc::semester_total_credits(semester);
            if exceeds_credit_cap(total, rules.semester_credit_cap) {
                return Err((
                    format!(
                        "semester {} carries {} credits, more than {}",
                        semester.id, total, rules.semester_credit_cap
                    ),
                    json!({ "kind": "semester", "id": semester.id, "total": total }),
                ));
            }
            for ue in &semester.ues {
                if ue.name.trim().is_empty() {
                    return Err(blank("UE", &ue.id));
                }
                if !is_positive(ue.credits) {
                    return Err((
                        format!("UE {} credits must be greater than 0", ue.id),
                        json!({ "kind": "UE", "id": ue.id, "field": "credits" }),
                    ));
                }
                for subject in &ue.subjects {
                    if subject.name.trim().is_empty() {
                        return Err(blank("subject", &subject.id));
                    }
                    if !is_positive(subject.coefficient) {
                        return Err((
                            format!("subject {} coefficient must be greater than 0", subject.id),
                            json!({ "kind": "subject", "id": subject.id, "field": "coefficient" }),
                        ));
                    }
                    for (field, grade) in [
                        ("interrogation", subject.interrogation),
                        ("devoir", subject.devoir),
                        ("rattrapage", subject.rattrapage),
                    ] {
                        if let Some(n) = grade.filter(|n| !grade_in_range(*n, rules)) {
                            return Err((
                                format!(
                                    "subject {} {} must be between 0 and {}",
                                    subject.id, field, rules.max_grade
                                ),
                                json!({
                                    "kind": "subject",
                                    "id": subject.id,
                                    "field": field,
                                    "value": n,
                                }),
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn handle_backup_export_tree(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    match backup::export_tree_bundle(ctx.session.tree(), &out_path) {
        Ok(summary) => {
            tracing::info!(path = %out_path.to_string_lossy(), "tree exported");
            ok(
                &req.id,
                json!({
                    "path": out_path.to_string_lossy(),
                    "bundleFormat": summary.bundle_format,
                    "yearCount": summary.year_count,
                    "sha256": summary.sha256,
                }),
            )
        }
        Err(e) => err(&req.id, "backup_export_failed", format!("{e:#}"), None),
    }
}

fn handle_backup_import_tree(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ctx = match session_ctx(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    // Imported years always belong to the signed-in user.
    let imported = match backup::import_tree_bundle(&in_path, &ctx.session.user.id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "backup_import_failed", format!("{e:#}"), None),
    };
    if let Err((message, details)) = check_imported_tree(&imported.tree, ctx.rules) {
        tracing::warn!(path = %in_path.to_string_lossy(), "rejected bundle: {}", message);
        return err(&req.id, "constraint_violation", message, Some(details));
    }

    let counts = imported.tree.counts();
    if let Err(e) = ctx.session.replace(ctx.conn, imported.tree) {
        return mutate_err(&req.id, &e);
    }
    tracing::info!(path = %in_path.to_string_lossy(), years = counts.years, "tree imported");
    ok(
        &req.id,
        json!({
            "bundleFormat": imported.bundle_format,
            "counts": {
                "years": counts.years,
                "semesters": counts.semesters,
                "ues": counts.ues,
                "subjects": counts.subjects,
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportTree" => Some(handle_backup_export_tree(state, req)),
        "backup.importTree" => Some(handle_backup_import_tree(state, req)),
        _ => None,
    }
}
