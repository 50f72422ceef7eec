use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::model::{AcademicYear, User};
use crate::tree::AcademicTree;

pub const DB_FILE_NAME: &str = "validetu.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            nom TEXT NOT NULL,
            prenom TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        [],
    )?;

    // One row per user: the raw nested tree as JSON. Derived values are never stored.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS trees(
            user_id TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

/// Emails are matched case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn user_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        nom: r.get(1)?,
        prenom: r.get(2)?,
        email: r.get(3)?,
    })
}

pub fn user_insert(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users(id, nom, prenom, email) VALUES(?, ?, ?, ?)",
        (&user.id, &user.nom, &user.prenom, normalize_email(&user.email)),
    )
    .context("failed to insert user")?;
    Ok(())
}

pub fn user_get(conn: &Connection, user_id: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, nom, prenom, email FROM users WHERE id = ?",
            [user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn user_find_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, nom, prenom, email FROM users WHERE email = ?",
            [normalize_email(email)],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn user_update(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE users SET nom = ?, prenom = ?, email = ? WHERE id = ?",
        (
            &user.nom,
            &user.prenom,
            normalize_email(&user.email),
            &user.id,
        ),
    )
    .context("failed to update user")?;
    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(
            serde_json::from_str(&text).with_context(|| format!("setting {} is not JSON", key))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, value.to_string()),
    )?;
    Ok(())
}

/// Whole-tree persistence keyed by user id. Two users' trees never share a row.
pub trait TreeStore {
    fn load_tree(&self, user_id: &str) -> anyhow::Result<Option<AcademicTree>>;
    fn save_tree(&self, user_id: &str, tree: &AcademicTree) -> anyhow::Result<()>;
}

impl TreeStore for Connection {
    fn load_tree(&self, user_id: &str) -> anyhow::Result<Option<AcademicTree>> {
        let payload: Option<String> = self
            .query_row(
                "SELECT payload FROM trees WHERE user_id = ?",
                [user_id],
                |r| r.get(0),
            )
            .optional()
            .context("failed to read tree")?;
        let Some(payload) = payload else {
            return Ok(None);
        };
        let years: Vec<AcademicYear> = serde_json::from_str(&payload)
            .with_context(|| format!("stored tree for user {} is invalid", user_id))?;
        let tree = AcademicTree::from_years(user_id, years)
            .with_context(|| format!("stored tree for user {} is inconsistent", user_id))?;
        Ok(Some(tree))
    }

    fn save_tree(&self, user_id: &str, tree: &AcademicTree) -> anyhow::Result<()> {
        let payload =
            serde_json::to_string(&tree.years()).context("failed to serialize tree")?;
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.execute(
            "INSERT INTO trees(user_id, payload, updated_at) VALUES(?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
               payload = excluded.payload,
               updated_at = excluded.updated_at",
            (user_id, &payload, &updated_at),
        )
        .context("failed to write tree")?;
        Ok(())
    }
}
