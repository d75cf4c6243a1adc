//! Database queries for the messages API
use chrono::{SecondsFormat, Utc};
use tokio_rusqlite::Connection;

use super::public::{ChatMessage, CreateMessageRequest};

/// Messages in a conversation, oldest first.
pub async fn list_messages(
    db: &Connection,
    user_id: &str,
    conversation_id: &str,
) -> Result<Vec<ChatMessage>, anyhow::Error> {
    let user_id = user_id.to_string();
    let conversation_id = conversation_id.to_string();
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            r"
            SELECT id, conversation_id, user_id, model, role, content, created_at
            FROM message
            WHERE conversation_id = ?1 AND user_id = ?2
            ORDER BY created_at ASC, rowid ASC
            ",
        )?;
        let messages = stmt
            .query_map([conversation_id, user_id], |row| {
                Ok(ChatMessage {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    user_id: row.get(2)?,
                    model: row.get(3)?,
                    role: row.get(4)?,
                    content: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    })
    .await
    .map_err(anyhow::Error::from)
}

pub async fn insert_message(
    db: &Connection,
    user_id: &str,
    request: CreateMessageRequest,
) -> Result<ChatMessage, anyhow::Error> {
    let message = ChatMessage {
        id: uuid::Uuid::new_v4().to_string(),
        conversation_id: request.conversation_id,
        user_id: user_id.to_string(),
        model: request.model,
        role: request.role,
        content: request.content,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };
    let row = message.clone();
    db.call(move |conn| {
        conn.execute(
            r"
            INSERT INTO message (id, conversation_id, user_id, model, role, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            rusqlite::params![
                row.id,
                row.conversation_id,
                row.user_id,
                row.model,
                row.role,
                row.content,
                row.created_at
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(message)
}
