//! Public types for the per-user model preferences API
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::api::routes::models::public::{GroupedModels, ModelConfig};

/// A catalog model annotated with whether the user has it enabled.
#[derive(Serialize, Clone, Debug)]
pub struct UserModel {
    #[serde(flatten)]
    pub model: ModelConfig,
    #[serde(rename = "isEnabled")]
    pub is_enabled: bool,
}

#[derive(Serialize, Clone, Debug)]
pub struct UserModelPreference {
    pub user_id: String,
    pub model_id: String,
    pub is_enabled: bool,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct UserModelsQuery {
    // Only return models the user has enabled
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub grouped: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum UserModelsResponse {
    Enabled(Vec<ModelConfig>),
    EnabledGrouped(GroupedModels<ModelConfig>),
    All(Vec<UserModel>),
    AllGrouped(GroupedModels<UserModel>),
}

#[derive(Deserialize)]
pub struct UpdatePreferenceRequest {
    #[serde(rename = "modelId")]
    pub model_id: Option<String>,
    #[serde(rename = "isEnabled")]
    pub is_enabled: Option<bool>,
}

#[derive(Serialize)]
pub struct UpdatePreferenceResponse {
    pub preference: UserModelPreference,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BulkAction {
    /// Enable every model in the selection
    Enable,
    /// Disable every model in the selection
    Disable,
    /// Enable fast or versatile models
    Recommended,
    /// Back to the default of everything enabled
    Reset,
}

impl BulkAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Enable => "enabled",
            BulkAction::Disable => "disabled",
            BulkAction::Recommended => "enabled recommended",
            BulkAction::Reset => "reset",
        }
    }
}

impl FromStr for BulkAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enable" => Ok(BulkAction::Enable),
            "disable" => Ok(BulkAction::Disable),
            "recommended" => Ok(BulkAction::Recommended),
            "reset" => Ok(BulkAction::Reset),
            other => Err(anyhow!("Invalid action: {}", other)),
        }
    }
}

#[derive(Deserialize)]
pub struct BulkUpdateRequest {
    pub action: Option<String>,
    // Select every model of one type, takes precedence over `modelIds`
    #[serde(rename = "modelType")]
    pub model_type: Option<String>,
    // Explicit selection
    #[serde(rename = "modelIds")]
    pub model_ids: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct BulkUpdateResponse {
    pub message: String,
    pub updated: usize,
}
