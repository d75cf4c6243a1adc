//! Router for the conversations API
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use super::db::{
    delete_conversation, find_conversation, insert_conversation, list_conversations,
    update_conversation_title,
};
use super::public::{
    Conversation, CreateConversationRequest, DeleteConversationResponse,
    UpdateConversationRequest,
};
use crate::api::auth::AuthUser;
use crate::api::public::json_error;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

const NOT_FOUND: &str = "Conversation not found";

/// List the caller's conversations
async fn conversations_list(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<axum::Json<Vec<Conversation>>, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    let conversations = list_conversations(&db, &user_id).await?;
    Ok(axum::Json(conversations))
}

/// Start a new conversation
async fn conversation_create(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    payload: Option<axum::Json<CreateConversationRequest>>,
) -> Result<axum::Json<Conversation>, crate::api::public::ApiError> {
    let payload = payload.map(|axum::Json(p)| p).unwrap_or_default();
    let db = state.read().expect("Unable to read share state").db.clone();
    let conversation = insert_conversation(&db, &user_id, payload.title.trim()).await?;
    tracing::debug!("Created conversation {}", conversation.id);
    Ok(axum::Json(conversation))
}

async fn conversation_view(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    match find_conversation(&db, &user_id, &id).await? {
        Some(conversation) => Ok(axum::Json(conversation).into_response()),
        None => Ok(json_error(StatusCode::NOT_FOUND, NOT_FOUND)),
    }
}

/// Rename a conversation
async fn conversation_update(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<UpdateConversationRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    match update_conversation_title(&db, &user_id, &id, payload.title.trim()).await? {
        Some(conversation) => Ok(axum::Json(conversation).into_response()),
        None => Ok(json_error(StatusCode::NOT_FOUND, NOT_FOUND)),
    }
}

async fn conversation_delete(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    if delete_conversation(&db, &user_id, &id).await? {
        Ok(axum::Json(DeleteConversationResponse { success: true }).into_response())
    } else {
        Ok(json_error(StatusCode::NOT_FOUND, NOT_FOUND))
    }
}

/// Create the conversations router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(conversations_list).post(conversation_create))
        .route(
            "/{id}",
            get(conversation_view)
                .patch(conversation_update)
                .delete(conversation_delete),
        )
}
