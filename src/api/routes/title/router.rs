//! Router for generating conversation titles
use std::sync::{Arc, LazyLock, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use regex::Regex;

use super::public::{GenerateTitleRequest, GenerateTitleResponse};
use crate::api::public::json_error;
use crate::api::state::AppState;
use crate::llm::{GenerateOptions, Message, Role, conversational, provider_for};

type SharedState = Arc<RwLock<AppState>>;

const PROMPT_MESSAGES: usize = 4;
const MAX_TITLE_CHARS: usize = 60;
const MIN_TITLE_CHARS: usize = 3;
const FALLBACK_CHARS: usize = 50;
const DEFAULT_TITLE: &str = "New Chat";

static SURROUNDING_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["']+|["']+$"#).expect("Invalid quote regex"));
static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+$").expect("Invalid punctuation regex"));

/// Prompt asking for a short title summarizing the start of a
/// conversation.
pub fn title_prompt(messages: &[Message]) -> String {
    let transcript = conversational(messages)
        .take(PROMPT_MESSAGES)
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Based on the following conversation, generate a short, descriptive title (3-6 words maximum) that captures the main topic or question being discussed. The title should be concise and clear.

Conversation:
{transcript}

Generate only the title, nothing else. Do not use quotes or special formatting."#
    )
}

/// Strip quotes and trailing punctuation then cap the length.
pub fn clean_title(raw: &str) -> String {
    let title = raw.trim();
    let title = SURROUNDING_QUOTES.replace_all(title, "");
    let title = TRAILING_PUNCTUATION.replace(title.trim(), "");
    title.trim().chars().take(MAX_TITLE_CHARS).collect::<String>().trim().to_string()
}

/// Title derived from the first user message when the model gave
/// nothing usable.
pub fn fallback_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.role == Role::User) else {
        return DEFAULT_TITLE.to_string();
    };
    let content = first.content.trim();
    if content.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if content.chars().count() > FALLBACK_CHARS {
        let prefix: String = content.chars().take(FALLBACK_CHARS).collect();
        format!("{}...", prefix)
    } else {
        content.to_string()
    }
}

/// Generate a title for the opening messages of a conversation
async fn generate_title(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<GenerateTitleRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let messages = payload.messages.unwrap_or_default();
    if messages.is_empty() {
        return Ok(json_error(StatusCode::BAD_REQUEST, "No messages provided"));
    }

    let config = state
        .read()
        .expect("Unable to read share state")
        .config
        .clone();
    let provider = provider_for(&config, &config.title_provider, &config.title_model)?;
    let options = GenerateOptions {
        max_tokens: Some(20),
        temperature: Some(0.3),
    };

    let raw = match provider.generate(&title_prompt(&messages), &options).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Title generation failed: {}", e);
            return Ok(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate title",
            ));
        }
    };

    let mut title = clean_title(&raw);
    if title.chars().count() < MIN_TITLE_CHARS {
        title = fallback_title(&messages);
    }
    Ok(axum::Json(GenerateTitleResponse { title }).into_response())
}

/// Create the title generation router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(generate_title))
}
