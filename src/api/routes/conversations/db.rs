//! Database queries for the conversations API
use chrono::{SecondsFormat, Utc};
use rusqlite::Row;
use tokio_rusqlite::Connection;

use super::public::Conversation;

fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// All of a user's conversations, newest first.
pub async fn list_conversations(
    db: &Connection,
    user_id: &str,
) -> Result<Vec<Conversation>, anyhow::Error> {
    let user_id = user_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            r"
            SELECT id, user_id, title, created_at
            FROM conversation
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            ",
        )?;
        let conversations = stmt
            .query_map([user_id], conversation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(conversations)
    })
    .await
    .map_err(anyhow::Error::from)
}

pub async fn insert_conversation(
    db: &Connection,
    user_id: &str,
    title: &str,
) -> Result<Conversation, anyhow::Error> {
    let conversation = Conversation {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        title: title.to_string(),
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };
    let row = conversation.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO conversation (id, user_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![row.id, row.user_id, row.title, row.created_at],
        )?;
        Ok(())
    })
    .await?;
    Ok(conversation)
}

/// Fetch a conversation only if it belongs to `user_id`.
pub async fn find_conversation(
    db: &Connection,
    user_id: &str,
    id: &str,
) -> Result<Option<Conversation>, anyhow::Error> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            r"
            SELECT id, user_id, title, created_at
            FROM conversation
            WHERE id = ?1 AND user_id = ?2
            LIMIT 1
            ",
        )?;
        let conversation = stmt
            .query_map([id, user_id], conversation_from_row)?
            .next()
            .transpose()?;
        Ok(conversation)
    })
    .await
    .map_err(anyhow::Error::from)
}

pub async fn update_conversation_title(
    db: &Connection,
    user_id: &str,
    id: &str,
    title: &str,
) -> Result<Option<Conversation>, anyhow::Error> {
    let (user_id_, id_, title_) = (user_id.to_string(), id.to_string(), title.to_string());
    let updated = db
        .call(move |conn| {
            let count = conn.execute(
                "UPDATE conversation SET title = ?1 WHERE id = ?2 AND user_id = ?3",
                [title_, id_, user_id_],
            )?;
            Ok(count)
        })
        .await?;
    if updated == 0 {
        return Ok(None);
    }
    find_conversation(db, user_id, id).await
}

/// Delete a conversation and its messages. Returns false when there
/// was nothing of the user's to delete.
pub async fn delete_conversation(
    db: &Connection,
    user_id: &str,
    id: &str,
) -> Result<bool, anyhow::Error> {
    let user_id = user_id.to_string();
    let id = id.to_string();
    db.call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
            r"
            DELETE FROM message
            WHERE conversation_id IN (
                SELECT id FROM conversation WHERE id = ?1 AND user_id = ?2
            )
            ",
            [&id, &user_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM conversation WHERE id = ?1 AND user_id = ?2",
            [&id, &user_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    })
    .await
    .map_err(anyhow::Error::from)
}
