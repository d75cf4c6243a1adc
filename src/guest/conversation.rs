//! A guest's in-progress conversation, kept in session storage so it
//! can be restored once they sign in.
use std::collections::HashMap;

use anyhow::{Error, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::clock::{BoxedClock, Clock, SystemClock};
use super::storage::BoxedStoragePort;
use crate::llm::Role;

pub const GUEST_CONVERSATION_KEY: &str = "guest-conversation";
pub const GUEST_MODELS: [&str; 2] = ["gpt-4.1-nano", "gemini-2.0-flash"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestMessage {
    pub id: String,
    pub model: String,
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

impl GuestMessage {
    pub fn new(model: &str, role: Role, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            model: model.to_string(),
            role,
            content: content.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Snapshot handed over when a guest conversation is restored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversationData {
    pub messages: Vec<GuestMessage>,
    pub shared_input: String,
    pub timestamp: i64,
    pub models: Vec<String>,
}

#[derive(Default, Serialize, Deserialize)]
struct PersistedConversation {
    messages: Vec<GuestMessage>,
    shared_input: String,
}

pub struct GuestConversation {
    storage: BoxedStoragePort,
    clock: BoxedClock,
    messages: Vec<GuestMessage>,
    shared_input: String,
    is_restoring: bool,
}

impl GuestConversation {
    /// Load whatever is in session storage. Anything unreadable starts
    /// an empty conversation.
    pub fn load(storage: BoxedStoragePort) -> Self {
        let persisted = match Self::read(&storage) {
            Ok(persisted) => persisted.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable guest conversation: {}", e);
                PersistedConversation::default()
            }
        };
        Self {
            storage,
            clock: Box::new(SystemClock),
            messages: persisted.messages,
            shared_input: persisted.shared_input,
            is_restoring: false,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn read(storage: &BoxedStoragePort) -> Result<Option<PersistedConversation>, Error> {
        match storage.get(GUEST_CONVERSATION_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn persist(&self) {
        let persisted = PersistedConversation {
            messages: self.messages.clone(),
            shared_input: self.shared_input.clone(),
        };
        let result = serde_json::to_string(&persisted)
            .map_err(Error::from)
            .and_then(|raw| self.storage.set(GUEST_CONVERSATION_KEY, &raw));
        if let Err(e) = result {
            tracing::warn!("Failed to persist guest conversation: {}", e);
        }
    }

    pub fn add_message(&mut self, message: GuestMessage) {
        tracing::debug!("Added guest message {}", message.id);
        self.messages.push(message);
        self.persist();
    }

    pub fn add_messages(&mut self, messages: Vec<GuestMessage>) {
        tracing::debug!("Added {} guest messages", messages.len());
        self.messages.extend(messages);
        self.persist();
    }

    pub fn update_shared_input(&mut self, input: &str) {
        self.shared_input = input.to_string();
        self.persist();
    }

    pub fn clear(&mut self) {
        tracing::debug!("Clearing guest conversation");
        self.messages.clear();
        self.shared_input.clear();
        self.is_restoring = false;
        if let Err(e) = self.storage.remove(GUEST_CONVERSATION_KEY) {
            tracing::warn!("Failed to clear guest conversation: {}", e);
        }
    }

    pub fn set_restoring(&mut self, restoring: bool) {
        self.is_restoring = restoring;
    }

    pub fn is_restoring(&self) -> bool {
        self.is_restoring
    }

    pub fn messages(&self) -> &[GuestMessage] {
        &self.messages
    }

    pub fn shared_input(&self) -> &str {
        &self.shared_input
    }

    pub fn has_active_conversation(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Messages grouped per model card, each in the order they were sent.
    pub fn messages_by_model(&self) -> HashMap<String, Vec<GuestMessage>> {
        self.messages
            .iter()
            .cloned()
            .into_group_map_by(|m| m.model.clone())
    }

    pub fn conversation_data(&self) -> Option<ConversationData> {
        if self.messages.is_empty() {
            return None;
        }
        Some(ConversationData {
            messages: self.messages.clone(),
            shared_input: self.shared_input.clone(),
            timestamp: self.clock.now_ms(),
            models: GUEST_MODELS.iter().map(|m| m.to_string()).collect(),
        })
    }
}
