mod rollback;
mod sync;

use std::sync::Arc;

use azfn_sdk::{
    BoxFuture, BuildPipelineSyncStagesInput, BuildQuickSyncStagesInput, DeployTarget,
    DeploymentPlugin, ExecuteStageInput, PipelineStage, QuickSyncStage, SdkError, StageStatus,
};

pub use crate::deployment::rollback::execute_rollback_stage;
pub use crate::deployment::sync::execute_sync_stage;

use crate::client::ClientFactory;
use crate::config::{AzureApplicationSpec, AzureDeployTargetConfig};
use crate::pipeline::{build_pipeline, build_quick_sync};
use crate::stage::Stage;

pub const PLUGIN_NAME: &str = "azure";

/// Deployment plugin for Azure function apps.
pub struct AzurePlugin {
    factory: Arc<dyn ClientFactory>,
}

impl AzurePlugin {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }
}

impl DeploymentPlugin for AzurePlugin {
    type DeployTargetConfig = AzureDeployTargetConfig;
    type ApplicationSpec = AzureApplicationSpec;

    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn fetch_defined_stages(&self) -> Vec<String> {
        Stage::ALL.iter().map(|stage| stage.to_string()).collect()
    }

    fn build_pipeline_sync_stages(
        &self,
        input: &BuildPipelineSyncStagesInput,
    ) -> Result<Vec<PipelineStage>, SdkError> {
        Ok(build_pipeline(&input.stages, input.rollback)?)
    }

    fn build_quick_sync_stages(
        &self,
        input: &BuildQuickSyncStagesInput,
    ) -> Result<Vec<QuickSyncStage>, SdkError> {
        Ok(build_quick_sync(input.rollback))
    }

    fn execute_stage<'a>(
        &'a self,
        input: &'a ExecuteStageInput<AzureApplicationSpec>,
        targets: &'a [DeployTarget<AzureDeployTargetConfig>],
    ) -> BoxFuture<'a, Result<StageStatus, SdkError>> {
        Box::pin(async move {
            let stage: Stage = input.request.stage_name.parse()?;
            tracing::info!(stage = %stage, "executing stage");

            let status = match stage {
                Stage::Sync => execute_sync_stage(self.factory.as_ref(), input, targets).await,
                Stage::Rollback => execute_rollback_stage(input, targets),
                Stage::Swap => {
                    input
                        .log()
                        .error("Slot swap is not supported by this plugin yet");
                    StageStatus::Failure
                }
            };
            Ok(status)
        })
    }
}
