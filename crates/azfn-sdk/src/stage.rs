use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A stage as declared by the user in the application pipeline.
///
/// `index` is assigned by the orchestrator. It is neither guaranteed to be
/// contiguous nor sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub name: String,
    pub index: u32,
    /// Raw stage options, decoded by the plugin that owns the stage.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// What a user may do by hand while the stage is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManualOperation {
    #[default]
    None,
    Skip,
    Approve,
}

/// A stage of a full pipeline sync, as returned to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub name: String,
    pub index: u32,
    pub rollback: bool,
    pub metadata: BTreeMap<String, String>,
    pub available_operation: ManualOperation,
}

/// A stage of a quick sync. Order in the returned list is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSyncStage {
    pub name: String,
    pub description: String,
    pub rollback: bool,
    pub metadata: BTreeMap<String, String>,
    pub available_operation: ManualOperation,
}

/// Outcome of a stage execution. There is no partial success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Success,
    Failure,
}

impl StageStatus {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}
