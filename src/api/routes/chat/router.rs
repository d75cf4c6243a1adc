//! Router for the chat API

use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response, sse::Event, sse::KeepAlive, sse::Sse},
    routing::post,
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public::{ChatChunk, ChatRequest, DONE};
use crate::api::auth::MaybeUser;
use crate::api::public::json_error;
use crate::api::routes::models::db::find_active_model_by_name;
use crate::api::routes::user_models::db::validate_user_model_access;
use crate::api::state::AppState;
use crate::llm::{Message, provider_for};

type SharedState = Arc<RwLock<AppState>>;

fn chunk_json(chunk: &ChatChunk) -> String {
    // Serializing a two variant enum of strings can't fail
    serde_json::to_string(chunk).unwrap_or_default()
}

/// Stream the next assistant turn for a transcript
async fn chat_handler(
    State(state): State<SharedState>,
    MaybeUser(user_id): MaybeUser,
    axum::Json(payload): axum::Json<ChatRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let (db, config) = {
        let shared_state = state.read().expect("Unable to read share state");
        (shared_state.db.clone(), shared_state.config.clone())
    };

    let model = match payload.model_name() {
        Some(name) => find_active_model_by_name(&db, name).await?,
        None => None,
    };
    let Some(model) = model else {
        return Ok(json_error(StatusCode::BAD_REQUEST, "Unknown model"));
    };

    if let Some(user_id) = &user_id {
        if !validate_user_model_access(&db, user_id, &model).await? {
            return Ok(json_error(StatusCode::FORBIDDEN, "Model disabled"));
        }
    }

    let provider = provider_for(&config, &model.provider, &model.model_id)?;
    let messages: Vec<Message> = payload.messages;
    tracing::info!(
        "Chat with {} ({}) for {}",
        model.name,
        provider.provider_name(),
        user_id.as_deref().unwrap_or("guest")
    );

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let sse_stream = UnboundedReceiverStream::new(rx)
        .map(|chunk| Ok::<Event, Infallible>(Event::default().data(chunk)));

    tokio::spawn(async move {
        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<String>();
        let forward_tx = tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(content) = delta_rx.recv().await {
                // Client went away
                if forward_tx
                    .send(chunk_json(&ChatChunk::Content { content }))
                    .is_err()
                {
                    break;
                }
            }
        });

        let result = provider.stream(delta_tx, &messages).await;
        let _ = forwarder.await;

        match result {
            Ok(text) => tracing::debug!("Chat completed with {} chars", text.len()),
            Err(e) => {
                tracing::error!("Chat handler error: {}. Root cause: {}", e, e.root_cause());
                let _ = tx.send(chunk_json(&ChatChunk::Error {
                    error: format!("Something went wrong: {}", e),
                }));
            }
        }
        let _ = tx.send(DONE.to_string());
    });

    let resp = Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_millis(100)),
        )
        .into_response();

    Ok(resp)
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(chat_handler))
}
