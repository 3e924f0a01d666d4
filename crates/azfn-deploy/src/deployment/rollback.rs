use azfn_sdk::{DeployTarget, ExecuteStageInput, StageStatus};

use crate::config::{AzureApplicationSpec, AzureDeployTargetConfig};

/// Rollback has no compensating action yet: it leaves the function app as
/// it is and reports success so auto rollback does not wedge the pipeline.
pub fn execute_rollback_stage(
    input: &ExecuteStageInput<AzureApplicationSpec>,
    _targets: &[DeployTarget<AzureDeployTargetConfig>],
) -> StageStatus {
    // TODO: redeploy the package URI of the last successful deployment once
    // piped passes the running deployment source to rollback stages.
    input
        .log()
        .info("Rollback of Azure function apps is not implemented yet, nothing to do");
    StageStatus::Success
}
