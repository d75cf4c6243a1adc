//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::llm::Message;

#[derive(Deserialize, Default)]
pub struct ChatRequestData {
    pub model: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    // Some clients nest the model under `data`
    #[serde(default)]
    pub data: ChatRequestData,
}

impl ChatRequest {
    pub fn model_name(&self) -> Option<&str> {
        self.model
            .as_deref()
            .or(self.data.model.as_deref())
            .filter(|m| !m.is_empty())
    }
}

/// One server-sent event of the completion stream.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ChatChunk {
    Content { content: String },
    Error { error: String },
}

/// Terminates the event stream.
pub const DONE: &str = "[DONE]";
