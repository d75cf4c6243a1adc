//! Router for the model catalog API
use std::sync::{Arc, RwLock};

use axum::{Router, extract::State, routing::get};
use axum_extra::extract::Query;

use super::db::list_available_models;
use super::public::{GroupedModels, ModelsQuery, ModelsResponse};
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// List every active model, optionally grouped by type
async fn models_list(
    State(state): State<SharedState>,
    Query(params): Query<ModelsQuery>,
) -> Result<axum::Json<ModelsResponse>, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    let models = list_available_models(&db).await?;

    if params.grouped {
        return Ok(axum::Json(ModelsResponse::Grouped(GroupedModels::group(
            models,
            |m| m.model_type,
        ))));
    }
    Ok(axum::Json(ModelsResponse::List(models)))
}

/// Create the model catalog router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(models_list))
}
