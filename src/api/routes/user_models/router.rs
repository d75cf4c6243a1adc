//! Router for the per-user model preferences API
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::Query;

use super::db::{upsert_preference, upsert_preferences, user_preferences};
use super::public::{
    BulkAction, BulkUpdateRequest, BulkUpdateResponse, UpdatePreferenceRequest,
    UpdatePreferenceResponse, UserModel, UserModelsQuery, UserModelsResponse,
};
use crate::api::auth::AuthUser;
use crate::api::public::json_error;
use crate::api::routes::models::db::{find_active_model, list_available_models};
use crate::api::routes::models::public::{GroupedModels, ModelConfig};
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Models eligible for the `recommended` preset
fn is_recommended(model: &ModelConfig) -> bool {
    model.has_capability("fast") || model.capabilities.len() >= 2
}

/// List the catalog with the user's preferences applied.
///
/// With `enabled=true` a model without a preference row counts as
/// enabled, so the full catalog comes back until the user disables
/// something. A user who disabled every model gets an empty list rather
/// than falling back to the full catalog.
async fn user_models_list(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<UserModelsQuery>,
) -> Result<axum::Json<UserModelsResponse>, crate::api::public::ApiError> {
    let db = state.read().expect("Unable to read share state").db.clone();
    let models = list_available_models(&db).await?;
    let prefs = user_preferences(&db, &user_id).await?;

    if params.enabled {
        // Nothing configured yet means everything is available
        let enabled: Vec<ModelConfig> = if prefs.is_empty() {
            models
        } else {
            models
                .into_iter()
                .filter(|m| prefs.get(&m.id).copied().unwrap_or(true))
                .collect()
        };
        let resp = if params.grouped {
            UserModelsResponse::EnabledGrouped(GroupedModels::group(enabled, |m| m.model_type))
        } else {
            UserModelsResponse::Enabled(enabled)
        };
        return Ok(axum::Json(resp));
    }

    let annotated: Vec<UserModel> = models
        .into_iter()
        .map(|model| {
            let is_enabled = prefs.get(&model.id).copied().unwrap_or(true);
            UserModel { model, is_enabled }
        })
        .collect();
    let resp = if params.grouped {
        UserModelsResponse::AllGrouped(GroupedModels::group(annotated, |m| m.model.model_type))
    } else {
        UserModelsResponse::All(annotated)
    };
    Ok(axum::Json(resp))
}

/// Enable or disable a single model
async fn user_model_update(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    axum::Json(payload): axum::Json<UpdatePreferenceRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let (Some(model_id), Some(is_enabled)) = (payload.model_id, payload.is_enabled) else {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            "modelId and isEnabled are required",
        ));
    };

    let db = state.read().expect("Unable to read share state").db.clone();
    if find_active_model(&db, &model_id).await?.is_none() {
        return Ok(json_error(StatusCode::NOT_FOUND, "Model not found"));
    }

    let preference = upsert_preference(&db, &user_id, &model_id, is_enabled).await?;
    tracing::debug!(
        "User {} set model {} enabled={}",
        user_id,
        model_id,
        is_enabled
    );
    Ok(axum::Json(UpdatePreferenceResponse { preference }).into_response())
}

/// Apply a preset or selection to many models at once
async fn user_models_bulk_update(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    axum::Json(payload): axum::Json<BulkUpdateRequest>,
) -> Result<Response, crate::api::public::ApiError> {
    let Some(action) = payload.action else {
        return Ok(json_error(StatusCode::BAD_REQUEST, "action is required"));
    };
    let action: BulkAction = match action.parse() {
        Ok(action) => action,
        Err(e) => return Ok(json_error(StatusCode::BAD_REQUEST, &e.to_string())),
    };

    let db = state.read().expect("Unable to read share state").db.clone();
    let models = list_available_models(&db).await?;

    let targets: Vec<String> = match (action, payload.model_ids, payload.model_type) {
        (BulkAction::Reset, _, _) => models.into_iter().map(|m| m.id).collect(),
        (BulkAction::Recommended, _, _) => models
            .into_iter()
            .filter(is_recommended)
            .map(|m| m.id)
            .collect(),
        (_, _, Some(model_type)) => models
            .into_iter()
            .filter(|m| {
                serde_json::to_value(m.model_type)
                    .map(|v| v == model_type.as_str())
                    .unwrap_or(false)
            })
            .map(|m| m.id)
            .collect(),
        // Unknown ids are dropped rather than violating the catalog foreign key
        (_, Some(ids), None) => models
            .into_iter()
            .filter(|m| ids.contains(&m.id))
            .map(|m| m.id)
            .collect(),
        (_, None, None) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "modelType or modelIds is required",
            ));
        }
    };

    if targets.is_empty() {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            "No models found to update",
        ));
    }

    let is_enabled = action != BulkAction::Disable;
    let updated = upsert_preferences(
        &db,
        &user_id,
        targets.into_iter().map(|id| (id, is_enabled)).collect(),
    )
    .await?;
    tracing::info!("Bulk {:?} for user {}: {} models", action, user_id, updated);

    Ok(axum::Json(BulkUpdateResponse {
        message: format!("Successfully {} {} models", action.past_tense(), updated),
        updated,
    })
    .into_response())
}

/// Create the user model preferences router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(user_models_list).patch(user_model_update))
        .route("/bulk", post(user_models_bulk_update))
}
