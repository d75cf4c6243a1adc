//! Public types for the model catalog API
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Text,
    Multimodal,
    Reasoning,
    Visual,
}

impl FromSql for ModelType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        serde_json::from_str(&format!("\"{}\"", value.as_str()?))
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A model in the catalog.
#[derive(Serialize, Clone, Debug)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub model_id: String,
    pub model_type: ModelType,
    pub description: String,
    pub capabilities: Vec<String>,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: String,
}

impl ModelConfig {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Models bucketed by their type, each bucket keeping catalog order.
#[derive(Serialize, Debug)]
pub struct GroupedModels<T> {
    pub text: Vec<T>,
    pub multimodal: Vec<T>,
    pub reasoning: Vec<T>,
    pub visual: Vec<T>,
}

impl<T> GroupedModels<T> {
    pub fn group(items: Vec<T>, model_type: impl Fn(&T) -> ModelType) -> Self {
        let mut grouped = Self {
            text: vec![],
            multimodal: vec![],
            reasoning: vec![],
            visual: vec![],
        };
        for item in items {
            match model_type(&item) {
                ModelType::Text => grouped.text.push(item),
                ModelType::Multimodal => grouped.multimodal.push(item),
                ModelType::Reasoning => grouped.reasoning.push(item),
                ModelType::Visual => grouped.visual.push(item),
            }
        }
        grouped
    }
}

#[derive(Deserialize)]
pub struct ModelsQuery {
    #[serde(default)]
    pub grouped: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ModelsResponse {
    List(Vec<ModelConfig>),
    Grouped(GroupedModels<ModelConfig>),
}
