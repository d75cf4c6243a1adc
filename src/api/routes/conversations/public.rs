//! Public types for the conversations API
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Deserialize, Default)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize)]
pub struct UpdateConversationRequest {
    pub title: String,
}

#[derive(Serialize)]
pub struct DeleteConversationResponse {
    pub success: bool,
}
