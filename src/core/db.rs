//! SQLite connection setup, schema migrations and catalog seed data.
use std::fs;
use std::path::Path;

use anyhow::{Error, Result};
use rusqlite::Connection;

pub const DB_FILE_NAME: &str = "multichat.sqlite3";

/// Each entry moves the schema up one version. Never edit an entry
/// that has shipped, append a new one instead.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS conversation (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS conversation_user_idx
        ON conversation (user_id, created_at);

    CREATE TABLE IF NOT EXISTS message (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversation (id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        model TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS message_conversation_idx
        ON message (conversation_id, created_at);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS available_model (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        provider TEXT NOT NULL,
        model_id TEXT NOT NULL,
        model_type TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        capabilities TEXT NOT NULL DEFAULT '[]',
        is_active INTEGER NOT NULL DEFAULT 1,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
    );

    CREATE TABLE IF NOT EXISTS user_model_preference (
        user_id TEXT NOT NULL,
        model_id TEXT NOT NULL REFERENCES available_model (id),
        is_enabled INTEGER NOT NULL DEFAULT 1,
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
        PRIMARY KEY (user_id, model_id)
    );
    "#,
];

/// (id, name, provider, model_id, model_type, description, capabilities, sort_order)
const SEED_MODELS: &[(&str, &str, &str, &str, &str, &str, &str, i64)] = &[
    (
        "openai-gpt-4-1-nano",
        "gpt-4.1-nano",
        "openai",
        "gpt-4.1-nano",
        "text",
        "Fastest, most affordable GPT-4.1 model",
        r#"["fast","tool-calling"]"#,
        1,
    ),
    (
        "openai-gpt-3-5-turbo",
        "gpt-3.5-turbo",
        "openai",
        "gpt-3.5-turbo",
        "text",
        "Legacy fast chat model",
        r#"["fast"]"#,
        2,
    ),
    (
        "openai-gpt-4",
        "gpt-4",
        "openai",
        "gpt-4",
        "reasoning",
        "Large GPT-4 model",
        r#"["tool-calling"]"#,
        1,
    ),
    (
        "google-gemini-1-5-flash",
        "gemini-1.5-flash",
        "google",
        "gemini-1.5-flash",
        "multimodal",
        "Fast multimodal Gemini model",
        r#"["vision","fast"]"#,
        1,
    ),
    (
        "google-gemini-2-0-flash",
        "gemini-2.0-flash",
        "google",
        "gemini-2.0-flash",
        "multimodal",
        "Next generation Gemini Flash",
        r#"["vision","tool-calling","fast"]"#,
        2,
    ),
];

/// Open the async connection to the database in directory `db_path`.
pub async fn async_db(db_path: &str) -> Result<tokio_rusqlite::Connection, Error> {
    let path = Path::new(db_path).join(DB_FILE_NAME);
    let db = tokio_rusqlite::Connection::open(path).await?;
    db.call(|conn| {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    })
    .await?;
    Ok(db)
}

pub fn schema_version(conn: &Connection) -> Result<usize, Error> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version as usize)
}

/// Apply migrations newer than the current schema version.
pub fn migrate_db(conn: &mut Connection) -> Result<usize, Error> {
    let current = schema_version(conn)?;
    let tx = conn.transaction()?;
    for (idx, migration) in MIGRATIONS.iter().enumerate().skip(current) {
        tracing::info!("Applying migration {}", idx + 1);
        tx.execute_batch(migration)?;
    }
    tx.pragma_update(None, "user_version", MIGRATIONS.len() as i64)?;
    tx.commit()?;
    Ok(MIGRATIONS.len().saturating_sub(current))
}

/// Insert any catalog models that don't exist yet.
pub fn seed_models(conn: &mut Connection) -> Result<usize, Error> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    for (id, name, provider, model_id, model_type, description, capabilities, sort_order) in
        SEED_MODELS
    {
        inserted += tx.execute(
            r#"
            INSERT OR IGNORE INTO available_model
                (id, name, provider, model_id, model_type, description, capabilities, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                id,
                name,
                provider,
                model_id,
                model_type,
                description,
                capabilities,
                sort_order
            ],
        )?;
    }
    tx.commit()?;
    Ok(inserted)
}

/// Bring a new or existing database fully up to date.
pub fn initialize_db(conn: &mut Connection) -> Result<(), Error> {
    migrate_db(conn)?;
    seed_models(conn)?;
    Ok(())
}

/// Make sure the database directory exists.
pub fn ensure_db_dir(db_path: &str) -> Result<(), Error> {
    fs::create_dir_all(db_path)?;
    Ok(())
}
