use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;
use crate::input::ExecuteStageInput;
use crate::stage::{PipelineStage, QuickSyncStage, StageConfig, StageStatus};
use crate::target::DeployTarget;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPipelineSyncStagesInput {
    pub stages: Vec<StageConfig>,
    /// Whether piped should roll back automatically on failure.
    #[serde(default)]
    pub rollback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildQuickSyncStagesInput {
    #[serde(default)]
    pub rollback: bool,
}

/// A deployment plugin as seen by piped.
///
/// Planning methods are pure and run at plan time. `execute_stage` runs one
/// stage to completion and reports a single status; user-facing detail goes
/// through the input's log persister.
pub trait DeploymentPlugin: Send + Sync {
    type DeployTargetConfig: DeserializeOwned + Send + Sync + 'static;
    type ApplicationSpec: DeserializeOwned + Send + Sync + 'static;

    /// Plugin name reported to the host.
    fn name(&self) -> &str;

    /// Names of every stage this plugin can execute.
    fn fetch_defined_stages(&self) -> Vec<String>;

    fn build_pipeline_sync_stages(
        &self,
        input: &BuildPipelineSyncStagesInput,
    ) -> Result<Vec<PipelineStage>, SdkError>;

    fn build_quick_sync_stages(
        &self,
        input: &BuildQuickSyncStagesInput,
    ) -> Result<Vec<QuickSyncStage>, SdkError>;

    fn execute_stage<'a>(
        &'a self,
        input: &'a ExecuteStageInput<Self::ApplicationSpec>,
        targets: &'a [DeployTarget<Self::DeployTargetConfig>],
    ) -> BoxFuture<'a, Result<StageStatus, SdkError>>;
}
