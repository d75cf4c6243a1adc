//! Database queries for the model catalog
use rusqlite::Row;
use tokio_rusqlite::Connection;

use super::public::ModelConfig;

const MODEL_COLUMNS: &str = r"
    id,
    name,
    provider,
    model_id,
    model_type,
    description,
    capabilities,
    is_active,
    sort_order,
    created_at
";

pub(crate) fn model_from_row(row: &Row<'_>) -> rusqlite::Result<ModelConfig> {
    let capabilities: String = row.get(6)?;
    Ok(ModelConfig {
        id: row.get(0)?,
        name: row.get(1)?,
        provider: row.get(2)?,
        model_id: row.get(3)?,
        model_type: row.get(4)?,
        description: row.get(5)?,
        capabilities: serde_json::from_str(&capabilities).unwrap_or_default(),
        is_active: row.get(7)?,
        sort_order: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Every active model ordered by type, then sort order.
pub async fn list_available_models(db: &Connection) -> Result<Vec<ModelConfig>, anyhow::Error> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            r"
            SELECT {MODEL_COLUMNS}
            FROM available_model
            WHERE is_active = 1
            ORDER BY model_type, sort_order, name
            "
        ))?;
        let models = stmt
            .query_map([], model_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    })
    .await
    .map_err(anyhow::Error::from)
}

async fn find_active_model_by(
    db: &Connection,
    column: &'static str,
    value: &str,
) -> Result<Option<ModelConfig>, anyhow::Error> {
    let value = value.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(&format!(
            r"
            SELECT {MODEL_COLUMNS}
            FROM available_model
            WHERE {column} = ?1 AND is_active = 1
            LIMIT 1
            "
        ))?;
        let model = stmt.query_map([value], model_from_row)?.next().transpose()?;
        Ok(model)
    })
    .await
    .map_err(anyhow::Error::from)
}

/// Look up an active model by its catalog id.
pub async fn find_active_model(
    db: &Connection,
    id: &str,
) -> Result<Option<ModelConfig>, anyhow::Error> {
    find_active_model_by(db, "id", id).await
}

/// Look up an active model by the name clients send.
pub async fn find_active_model_by_name(
    db: &Connection,
    name: &str,
) -> Result<Option<ModelConfig>, anyhow::Error> {
    find_active_model_by(db, "name", name).await
}
