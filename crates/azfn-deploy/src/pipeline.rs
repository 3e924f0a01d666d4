use std::collections::BTreeMap;

use azfn_sdk::{ManualOperation, PipelineStage, QuickSyncStage, StageConfig};

use crate::error::DeployError;
use crate::stage::Stage;

/// Stages of a quick sync: sync, then rollback when auto rollback is on.
pub fn build_quick_sync(auto_rollback: bool) -> Vec<QuickSyncStage> {
    let mut out = Vec::with_capacity(2);
    out.push(quick_sync_stage(Stage::Sync, false));
    if auto_rollback {
        out.push(quick_sync_stage(Stage::Rollback, true));
    }
    out
}

/// Stages of a pipeline sync.
///
/// Every declared stage is passed through with its name and index as given.
/// With auto rollback, one rollback stage is appended at the smallest
/// declared index so piped can reach it however far the pipeline got.
pub fn build_pipeline(
    stages: &[StageConfig],
    auto_rollback: bool,
) -> Result<Vec<PipelineStage>, DeployError> {
    let mut out = Vec::with_capacity(stages.len() + 1);
    for stage in stages {
        out.push(PipelineStage {
            name: stage.name.clone(),
            index: stage.index,
            rollback: false,
            metadata: BTreeMap::new(),
            available_operation: ManualOperation::None,
        });
    }

    if auto_rollback {
        // min_by_key keeps the first of equal minimums
        let min_index = stages
            .iter()
            .min_by_key(|stage| stage.index)
            .map(|stage| stage.index)
            .ok_or(DeployError::EmptyPipeline)?;

        out.push(PipelineStage {
            name: Stage::Rollback.to_string(),
            index: min_index,
            rollback: true,
            metadata: BTreeMap::new(),
            available_operation: ManualOperation::None,
        });
    }

    Ok(out)
}

fn quick_sync_stage(stage: Stage, rollback: bool) -> QuickSyncStage {
    QuickSyncStage {
        name: stage.to_string(),
        description: stage.description().to_string(),
        rollback,
        metadata: BTreeMap::new(),
        available_operation: ManualOperation::None,
    }
}
