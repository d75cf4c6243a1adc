use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use crate::core::AppConfig;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
    // Client side annotations, never sent to a provider
    #[serde(rename = "data")]
    Data,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::Data => "data",
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        // Serde can only parse an enum from a double quoted string
        serde_json::from_str(&format!("\"{}\"", value.as_str()?))
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// A chat completion backend.
#[async_trait]
pub trait ChatProvider {
    /// Stream the next assistant turn. Each text delta is sent to `tx`
    /// as it arrives and the full text is returned at the end.
    async fn stream(
        &self,
        tx: mpsc::UnboundedSender<String>,
        messages: &[Message],
    ) -> Result<String, Error>;

    /// Single non-streaming completion for a prompt.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, Error>;

    fn provider_name(&self) -> &'static str;
}

pub type BoxedChatProvider = Box<dyn ChatProvider + Send + Sync + 'static>;

/// Build the provider client for a catalog entry.
pub fn provider_for(
    config: &AppConfig,
    provider: &str,
    model_id: &str,
) -> Result<BoxedChatProvider, Error> {
    match provider {
        "openai" => Ok(Box::new(OpenAiProvider::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            model_id,
        ))),
        "google" => Ok(Box::new(GeminiProvider::new(
            &config.gemini_api_hostname,
            &config.gemini_api_key,
            model_id,
        ))),
        other => Err(anyhow!("Unknown provider: {}", other)),
    }
}

/// Messages a provider should see.
pub fn conversational(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| m.role != Role::Data)
}

/// Pull every complete server-sent event out of `buffer`, returning
/// the `data:` payloads. Partial events stay in the buffer until the
/// rest arrives since events, and the characters inside them, can be
/// split across HTTP frames. Bytes are only decoded once the event
/// they belong to is complete.
pub fn drain_sse_data(buffer: &mut Vec<u8>) -> Vec<String> {
    if buffer.contains(&b'\r') {
        let mut normalized = Vec::with_capacity(buffer.len());
        let mut bytes = buffer.iter().copied().peekable();
        while let Some(byte) = bytes.next() {
            // A trailing `\r` is kept until its `\n` arrives
            if byte == b'\r' && bytes.peek() == Some(&b'\n') {
                continue;
            }
            normalized.push(byte);
        }
        *buffer = normalized;
    }

    let mut payloads = Vec::new();
    while let Some(event_end) = buffer.windows(2).position(|w| w == b"\n\n") {
        let event: Vec<u8> = buffer.drain(..event_end + 2).collect();
        let event = String::from_utf8_lossy(&event);
        let data = event
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        // Data can sometimes be empty
        if !data.is_empty() {
            payloads.push(data);
        }
    }
    payloads
}
