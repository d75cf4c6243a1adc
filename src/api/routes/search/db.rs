//! Database queries for the search API
use tokio_rusqlite::Connection;

use super::public::{ConversationHit, MessageHit};

const CONVERSATION_LIMIT: usize = 10;
const MESSAGE_LIMIT: usize = 20;
const UNTITLED: &str = "Untitled Chat";

/// Substring LIKE pattern with the wildcards in `query` matched
/// literally. Use with `ESCAPE '\'`.
///
/// SQLite's LIKE only folds case for ASCII letters, so "rust" finds
/// "Rust" but "été" does not find "Été".
pub fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Conversations whose title contains `query`, newest first.
pub async fn search_conversations(
    db: &Connection,
    user_id: &str,
    query: &str,
) -> Result<Vec<ConversationHit>, anyhow::Error> {
    let user_id = user_id.to_string();
    let pattern = like_pattern(query);
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            r"
            SELECT id, title, created_at
            FROM conversation
            WHERE user_id = ?1 AND title LIKE ?2 ESCAPE '\'
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3
            ",
        )?;
        let hits = stmt
            .query_map(
                rusqlite::params![user_id, pattern, CONVERSATION_LIMIT],
                |row| {
                    Ok(ConversationHit {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    })
    .await
    .map_err(anyhow::Error::from)
}

/// User authored messages containing `query`, newest first, with the
/// title of the conversation they belong to.
pub async fn search_messages(
    db: &Connection,
    user_id: &str,
    query: &str,
) -> Result<Vec<MessageHit>, anyhow::Error> {
    let user_id = user_id.to_string();
    let pattern = like_pattern(query);
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            r"
            SELECT
              m.id,
              m.content,
              m.created_at,
              m.role,
              m.model,
              m.conversation_id,
              c.title
            FROM message m
            JOIN conversation c ON c.id = m.conversation_id
            WHERE m.user_id = ?1
              AND m.role = 'user'
              AND m.content LIKE ?2 ESCAPE '\'
            ORDER BY m.created_at DESC, m.rowid DESC
            LIMIT ?3
            ",
        )?;
        let hits = stmt
            .query_map(rusqlite::params![user_id, pattern, MESSAGE_LIMIT], |row| {
                let title: String = row.get(6)?;
                Ok(MessageHit {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                    role: row.get(3)?,
                    model: row.get(4)?,
                    conversation_id: row.get(5)?,
                    conversation_title: if title.is_empty() {
                        UNTITLED.to_string()
                    } else {
                        title
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    })
    .await
    .map_err(anyhow::Error::from)
}
