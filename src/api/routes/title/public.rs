//! Public types for the title generation API
use serde::{Deserialize, Serialize};

use crate::llm::Message;

#[derive(Deserialize)]
pub struct GenerateTitleRequest {
    pub messages: Option<Vec<Message>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GenerateTitleResponse {
    pub title: String,
}
