use std::env;

use crate::guest::quota::DEFAULT_MAX_GUEST_MESSAGES;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub guest_path: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub gemini_api_hostname: String,
    pub gemini_api_key: String,
    pub title_provider: String,
    pub title_model: String,
    pub guest_message_limit: u32,
}

impl AppConfig {
    /// Config with every default filled in and no secrets, rooted at
    /// `storage_path`.
    pub fn new(storage_path: &str) -> Self {
        Self {
            storage_path: storage_path.to_string(),
            db_path: format!("{}/db", storage_path),
            guest_path: format!("{}/guest", storage_path),
            openai_api_hostname: "https://api.openai.com".to_string(),
            openai_api_key: "thiswontworkforopenai".to_string(),
            gemini_api_hostname: "https://generativelanguage.googleapis.com".to_string(),
            gemini_api_key: "thiswontworkforgemini".to_string(),
            title_provider: "google".to_string(),
            title_model: "gemini-2.0-flash-lite-preview-02-05".to_string(),
            guest_message_limit: DEFAULT_MAX_GUEST_MESSAGES,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("MULTICHAT_STORAGE_PATH").unwrap_or("./".to_string());
        let defaults = Self::new(storage_path.trim_end_matches('/'));

        let openai_api_hostname =
            env::var("MULTICHAT_OPENAI_HOST").unwrap_or(defaults.openai_api_hostname);
        let openai_api_key = env::var("OPENAI_API_KEY").unwrap_or(defaults.openai_api_key);
        let gemini_api_hostname =
            env::var("MULTICHAT_GEMINI_HOST").unwrap_or(defaults.gemini_api_hostname);
        let gemini_api_key =
            env::var("GOOGLE_GENERATIVE_AI_API_KEY").unwrap_or(defaults.gemini_api_key);
        let title_provider =
            env::var("MULTICHAT_TITLE_PROVIDER").unwrap_or(defaults.title_provider);
        let title_model = env::var("MULTICHAT_TITLE_MODEL").unwrap_or(defaults.title_model);
        let guest_message_limit = env::var("MULTICHAT_GUEST_MESSAGE_LIMIT")
            .ok()
            .and_then(|limit| {
                limit
                    .parse()
                    .inspect_err(|e| {
                        tracing::warn!("Ignoring invalid MULTICHAT_GUEST_MESSAGE_LIMIT: {}", e)
                    })
                    .ok()
            })
            .unwrap_or(defaults.guest_message_limit);

        Self {
            openai_api_hostname,
            openai_api_key,
            gemini_api_hostname,
            gemini_api_key,
            title_provider,
            title_model,
            guest_message_limit,
            ..defaults
        }
    }
}
