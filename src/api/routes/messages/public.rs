//! Public types for the messages API
use serde::{Deserialize, Serialize};

use crate::llm::Role;

/// A persisted message in a signed in user's conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub model: String,
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub conversation_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub conversation_id: String,
    pub model: String,
    pub role: Role,
    pub content: String,
}
