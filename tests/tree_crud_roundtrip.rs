use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_validetud");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn validetud");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn sign_up(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
    email: &str,
) -> String {
    let _ = request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let reg = request_ok(
        stdin,
        reader,
        "reg",
        "users.register",
        json!({ "nom": "Kone", "prenom": "Awa", "email": email }),
    );
    reg["user"]["id"].as_str().expect("user id").to_string()
}

#[test]
fn create_update_get_links_every_level() {
    let workspace = temp_dir("validetu-crud");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let user_id = sign_up(&mut stdin, &mut reader, &workspace, "awa@example.com");

    let year = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "years.create",
        json!({ "title": "L1" }),
    );
    let year_id = year["year"]["id"].as_str().expect("year id").to_string();
    assert_eq!(year["year"]["userId"], json!(user_id));
    assert_eq!(year["year"]["semesters"], json!([]));

    let semester = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "semesters.create",
        json!({ "yearId": year_id, "title": "Semestre 1" }),
    );
    let semester_id = semester["semester"]["id"].as_str().expect("semester id").to_string();
    assert_eq!(semester["semester"]["academicYearId"], json!(year_id));

    let ue = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "ues.create",
        json!({ "semesterId": semester_id, "name": "Informatique", "credits": 6 }),
    );
    let ue_id = ue["ue"]["id"].as_str().expect("ue id").to_string();
    assert_eq!(ue["ue"]["semesterId"], json!(semester_id));

    let subject = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "subjects.create",
        json!({ "ueId": ue_id, "name": "Algorithmique", "coefficient": 3 }),
    );
    let subject_id = subject["subject"]["id"].as_str().expect("subject id").to_string();
    assert_eq!(subject["subject"]["ueId"], json!(ue_id));
    assert!(subject["subject"]["interrogation"].is_null());

    let renamed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "years.update",
        json!({ "yearId": year_id, "title": "L1 Informatique" }),
    );
    assert_eq!(renamed["year"]["title"], json!("L1 Informatique"));

    let patched = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "ues.update",
        json!({ "ueId": ue_id, "credits": 8 }),
    );
    assert_eq!(patched["ue"]["name"], json!("Informatique"));
    assert_eq!(patched["ue"]["credits"], json!(8.0));

    let patched = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "subjects.update",
        json!({ "subjectId": subject_id, "name": "Algo" }),
    );
    assert_eq!(patched["subject"]["name"], json!("Algo"));
    assert_eq!(patched["subject"]["coefficient"], json!(3.0));

    let graded = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "subjects.updateGrades",
        json!({ "subjectId": subject_id, "interrogation": 11, "devoir": 14.5 }),
    );
    assert_eq!(graded["subject"]["interrogation"], json!(11.0));
    assert_eq!(graded["subject"]["devoir"], json!(14.5));
    assert!(graded["subject"]["rattrapage"].is_null());

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "years.get",
        json!({ "yearId": year_id }),
    );
    let nested = &got["year"]["semesters"][0]["ues"][0]["subjects"][0];
    assert_eq!(nested["id"], json!(subject_id));
    assert_eq!(nested["name"], json!("Algo"));
    assert_eq!(nested["devoir"], json!(14.5));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn delete_cascades_and_later_lookups_are_not_found() {
    let workspace = temp_dir("validetu-cascade");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = sign_up(&mut stdin, &mut reader, &workspace, "cascade@example.com");

    let year = request_ok(&mut stdin, &mut reader, "1", "years.create", json!({ "title": "L2" }));
    let year_id = year["year"]["id"].as_str().expect("year id").to_string();
    let s1 = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "semesters.create",
        json!({ "yearId": year_id, "title": "S3" }),
    );
    let s1_id = s1["semester"]["id"].as_str().expect("semester id").to_string();
    let s2 = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "semesters.create",
        json!({ "yearId": year_id, "title": "S4" }),
    );
    let s2_id = s2["semester"]["id"].as_str().expect("semester id").to_string();
    let ue = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "ues.create",
        json!({ "semesterId": s1_id, "name": "Physique", "credits": 5 }),
    );
    let ue_id = ue["ue"]["id"].as_str().expect("ue id").to_string();
    let subject = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "subjects.create",
        json!({ "ueId": ue_id, "name": "Optique", "coefficient": 1 }),
    );
    let subject_id = subject["subject"]["id"].as_str().expect("subject id").to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "semesters.delete",
        json!({ "semesterId": s1_id }),
    );
    for (i, (method, key, id)) in [
        ("semesters.get", "semesterId", &s1_id),
        ("ues.get", "ueId", &ue_id),
        ("subjects.get", "subjectId", &subject_id),
    ]
    .into_iter()
    .enumerate()
    {
        let code = request_err_code(
            &mut stdin,
            &mut reader,
            &format!("7.{}", i),
            method,
            json!({ key: id }),
        );
        assert_eq!(code, "not_found", "{} after cascade", method);
    }

    let got = request_ok(&mut stdin, &mut reader, "8", "years.get", json!({ "yearId": year_id }));
    let semesters = got["year"]["semesters"].as_array().expect("semesters");
    assert_eq!(semesters.len(), 1);
    assert_eq!(semesters[0]["id"], json!(s2_id));

    let _ = request_ok(&mut stdin, &mut reader, "9", "years.delete", json!({ "yearId": year_id }));
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "10",
        "semesters.get",
        json!({ "semesterId": s2_id }),
    );
    assert_eq!(code, "not_found");
    let listed = request_ok(&mut stdin, &mut reader, "11", "years.list", json!({}));
    assert_eq!(listed["years"], json!([]));

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "12",
        "years.delete",
        json!({ "yearId": year_id }),
    );
    assert_eq!(code, "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn creating_under_a_missing_parent_reports_the_parent_kind() {
    let workspace = temp_dir("validetu-missing-parent");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = sign_up(&mut stdin, &mut reader, &workspace, "orphan@example.com");

    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "ues.create",
        json!({ "semesterId": "nope", "name": "Chimie", "credits": 4 }),
    );
    assert_eq!(resp["ok"], json!(false));
    assert_eq!(resp["error"]["code"], json!("not_found"));
    assert_eq!(resp["error"]["details"]["kind"], json!("semester"));
    assert_eq!(resp["error"]["details"]["id"], json!("nope"));

    let listed = request_ok(&mut stdin, &mut reader, "2", "years.list", json!({}));
    assert_eq!(listed["years"], json!([]));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
