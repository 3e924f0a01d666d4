//! azfn-deploy
//!
//! piped deployment plugin that publishes Azure function apps.
//!
//! Public API:
//! - `build_pipeline()` / `build_quick_sync()` — plan-time stage lists
//! - `AzurePlugin` — `DeploymentPlugin` impl dispatching sync / swap / rollback
//! - `execute_sync_stage()` — tag, template, validate, pick method, deploy
//! - `select_method()` — run-from-package vs. Kudu for a given function app
//! - `AzureClientFactory` — the ARM/Kudu backed `FunctionClient`

pub mod azure;
pub mod client;
pub mod config;
pub mod deployment;
pub mod error;
pub mod pipeline;
pub mod settings;
pub mod stage;
pub mod strategy;

pub use crate::azure::{AzureClient, AzureClientFactory};
pub use crate::client::{ClientFactory, Existence, FunctionClient, FunctionDescriptor};
pub use crate::config::{
    AzureApplicationSpec, AzureDeployTargetConfig, FunctionManifest, SyncStageConfig,
};
pub use crate::deployment::{execute_rollback_stage, execute_sync_stage, AzurePlugin};
pub use crate::error::DeployError;
pub use crate::pipeline::{build_pipeline, build_quick_sync};
pub use crate::settings::PluginSettings;
pub use crate::stage::Stage;
pub use crate::strategy::{select_method, DeploymentMethod};
