//! Router for the search API
use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, routing::get};
use axum_extra::extract::Query;

use super::db::{search_conversations, search_messages};
use super::public::{SearchQuery, SearchResponse};
use crate::api::auth::AuthUser;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

const MIN_QUERY_CHARS: usize = 2;

/// Search the caller's conversation titles and messages
async fn search(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<axum::Json<SearchResponse>, crate::api::public::ApiError> {
    let query = params.q.unwrap_or_default().trim().to_string();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Ok(axum::Json(SearchResponse::default()));
    }

    let db = state.read().expect("Unable to read share state").db.clone();
    let (conversations, messages) = tokio::try_join!(
        search_conversations(&db, &user_id, &query),
        search_messages(&db, &user_id, &query),
    )?;
    tracing::debug!(
        "Search '{}' found {} conversations and {} messages",
        query,
        conversations.len(),
        messages.len()
    );

    Ok(axum::Json(SearchResponse {
        conversations,
        messages,
        query: Some(query),
    }))
}

/// Create the search router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(search))
}
