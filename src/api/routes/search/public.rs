//! Public types for the search API
use serde::{Deserialize, Serialize};

use crate::llm::Role;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationHit {
    pub id: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageHit {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub role: Role,
    pub model: String,
    pub conversation_id: String,
    pub conversation_title: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SearchResponse {
    pub conversations: Vec<ConversationHit>,
    pub messages: Vec<MessageHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}
