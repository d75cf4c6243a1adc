//! Router for the messages API
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query;

use super::db::{insert_message, list_messages};
use super::public::{CreateMessageRequest, MessagesQuery};
use crate::api::auth::AuthUser;
use crate::api::public::json_error;
use crate::api::routes::conversations::db::find_conversation;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// List the messages of one conversation
async fn messages_list(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<MessagesQuery>,
) -> Result<Response, crate::api::public::ApiError> {
    let Some(conversation_id) = params.conversation_id.filter(|id| !id.is_empty()) else {
        return Ok(json_error(StatusCode::BAD_REQUEST, "No conversation_id"));
    };
    let db = state.read().expect("Unable to read share state").db.clone();
    let messages = list_messages(&db, &user_id, &conversation_id).await?;
    Ok(axum::Json(messages).into_response())
}

/// Append a message to one of the caller's conversations
async fn message_create(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    axum::Json(payload): axum::Json<CreateMessageRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    if find_conversation(&db, &user_id, &payload.conversation_id)
        .await?
        .is_none()
    {
        return Ok(json_error(StatusCode::NOT_FOUND, "Conversation not found"));
    }
    let message = insert_message(&db, &user_id, payload).await?;
    Ok(axum::Json(message).into_response())
}

/// Create the messages router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(messages_list).post(message_create))
}
