//! API routes module

pub mod chat;
pub mod conversations;
pub mod messages;
pub mod models;
pub mod search;
pub mod title;
pub mod user_models;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Signed in conversation history
        .nest("/conversations", conversations::router())
        .nest("/messages", messages::router())
        .nest("/search", search::router())
        // Model catalog and per-user preferences
        .nest("/models", models::router())
        .nest("/user-models", user_models::router())
        // Completions, open to guests
        .nest("/chat", chat::router())
        .nest("/generate-title", title::router())
}
