//! azfn-sdk
//!
//! Contract between a deployment plugin and the piped orchestrator.
//!
//! Public API:
//! - `PipelineStage` / `QuickSyncStage` — stage records returned at plan time
//! - `DeployTarget` — one deploy target with its plugin-specific config
//! - `ExecuteStageInput` — everything a stage execution receives
//! - `DeploymentPlugin` — the trait a plugin implements
//! - `transport::serve()` — newline-delimited JSON host loop

pub mod error;
pub mod input;
pub mod log;
pub mod plugin;
pub mod stage;
pub mod target;
pub mod transport;

pub use crate::error::SdkError;
pub use crate::input::{
    ApplicationConfig, Deployment, DeploymentSource, ExecuteStageInput, ExecuteStageRequest,
};
pub use crate::log::{BufferedLogPersister, LogLevel, LogLine, LogPersister};
pub use crate::plugin::{
    BoxFuture, BuildPipelineSyncStagesInput, BuildQuickSyncStagesInput, DeploymentPlugin,
};
pub use crate::stage::{ManualOperation, PipelineStage, QuickSyncStage, StageConfig, StageStatus};
pub use crate::target::DeployTarget;
