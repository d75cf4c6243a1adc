//! Database queries for per-user model preferences
use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use tokio_rusqlite::Connection;

use super::public::UserModelPreference;
use crate::api::routes::models::public::ModelConfig;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Every preference the user has set, keyed by catalog model id.
pub async fn user_preferences(
    db: &Connection,
    user_id: &str,
) -> Result<HashMap<String, bool>, anyhow::Error> {
    let user_id = user_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            r"
            SELECT model_id, is_enabled
            FROM user_model_preference
            WHERE user_id = ?1
            ",
        )?;
        let prefs = stmt
            .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<String, bool>, _>>()?;
        Ok(prefs)
    })
    .await
    .map_err(anyhow::Error::from)
}

/// Insert or update a single preference.
pub async fn upsert_preference(
    db: &Connection,
    user_id: &str,
    model_id: &str,
    is_enabled: bool,
) -> Result<UserModelPreference, anyhow::Error> {
    let preference = UserModelPreference {
        user_id: user_id.to_string(),
        model_id: model_id.to_string(),
        is_enabled,
        updated_at: now(),
    };
    let result = preference.clone();
    db.call(move |conn| {
        conn.execute(
            r"
            INSERT INTO user_model_preference (user_id, model_id, is_enabled, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id, model_id) DO UPDATE SET
                is_enabled = excluded.is_enabled,
                updated_at = excluded.updated_at
            ",
            rusqlite::params![
                preference.user_id,
                preference.model_id,
                preference.is_enabled,
                preference.updated_at
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(result)
}

/// Upsert many preferences in a single transaction. Returns the number
/// of rows written.
pub async fn upsert_preferences(
    db: &Connection,
    user_id: &str,
    updates: Vec<(String, bool)>,
) -> Result<usize, anyhow::Error> {
    let user_id = user_id.to_string();
    let updated_at = now();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO user_model_preference (user_id, model_id, is_enabled, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (user_id, model_id) DO UPDATE SET
                    is_enabled = excluded.is_enabled,
                    updated_at = excluded.updated_at
                ",
            )?;
            for (model_id, is_enabled) in updates {
                written += stmt.execute(rusqlite::params![user_id, model_id, is_enabled, updated_at])?;
            }
        }
        tx.commit()?;
        Ok(written)
    })
    .await
    .map_err(anyhow::Error::from)
}

/// Whether the user may chat with `model`. The first use of a model
/// without a stored preference records it as enabled.
pub async fn validate_user_model_access(
    db: &Connection,
    user_id: &str,
    model: &ModelConfig,
) -> Result<bool, anyhow::Error> {
    let prefs = user_preferences(db, user_id).await?;
    if let Some(is_enabled) = prefs.get(&model.id) {
        return Ok(*is_enabled);
    }
    upsert_preference(db, user_id, &model.id, true).await?;
    Ok(true)
}
