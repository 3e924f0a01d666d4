use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use azfn_sdk::BoxFuture;

use crate::config::{AzureDeployTargetConfig, DeployTemplate};
use crate::error::DeployError;

pub const LABEL_MANAGED_BY: &str = "pipecd-dev-managed-by";
pub const LABEL_PIPED: &str = "pipecd-dev-piped";
pub const LABEL_COMMIT_HASH: &str = "pipecd-dev-commit-hash";
pub const LABEL_APPLICATION: &str = "pipecd-dev-application";

pub const MANAGED_BY_PIPED: &str = "piped";

pub type ResourceTags = BTreeMap<String, String>;

/// The four tags every deployed function app carries.
pub fn deployment_tags(piped_id: &str, commit_hash: &str, application_id: &str) -> ResourceTags {
    BTreeMap::from([
        (LABEL_MANAGED_BY.to_string(), MANAGED_BY_PIPED.to_string()),
        (LABEL_PIPED.to_string(), piped_id.to_string()),
        (LABEL_COMMIT_HASH.to_string(), commit_hash.to_string()),
        (LABEL_APPLICATION.to_string(), application_id.to_string()),
    ])
}

/// Whether the function app (and every requested slot) is already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Exists,
    NeedsCreation,
}

/// Snapshot of a function app (or one of its slots) as reported by Azure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub id: String,
    pub name: String,
    /// Platform kind, e.g. `functionapp,linux`.
    pub kind: String,
    /// Hosting plan SKU, e.g. `Dynamic` for the consumption plan.
    pub sku: String,
    pub state: String,
    pub enabled_host_names: Vec<String>,
}

/// Management-plane operations the sync stage needs.
///
/// An empty `slot` addresses the production slot.
pub trait FunctionClient: Send + Sync {
    /// Tags applied to every resource this client writes afterwards.
    fn set_resource_tags(&self, tags: ResourceTags) -> BoxFuture<'_, Result<(), DeployError>>;

    /// Deploy an ARM template into the resource group. Template files are
    /// resolved against `app_dir`.
    fn deploy_arm_template<'a>(
        &'a self,
        resource_group: &'a str,
        app_dir: &'a Path,
        template: &'a DeployTemplate,
    ) -> BoxFuture<'a, Result<(), DeployError>>;

    /// Check that the function app and each of `slots` exist.
    fn validate_function<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slots: &'a [String],
    ) -> BoxFuture<'a, Result<Existence, DeployError>>;

    fn get_function<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
    ) -> BoxFuture<'a, Result<FunctionDescriptor, DeployError>>;

    /// Point `WEBSITE_RUN_FROM_PACKAGE` at the package.
    fn run_from_package_deploy<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
        package_uri: &'a str,
    ) -> BoxFuture<'a, Result<(), DeployError>>;

    /// Push the package through the Kudu zip deploy endpoint.
    fn kudu_deploy<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
        package_uri: &'a str,
    ) -> BoxFuture<'a, Result<(), DeployError>>;
}

/// Builds a client for one deploy target. One client serves one stage run.
pub trait ClientFactory: Send + Sync {
    fn connect<'a>(
        &'a self,
        target: &'a AzureDeployTargetConfig,
    ) -> BoxFuture<'a, Result<Arc<dyn FunctionClient>, DeployError>>;
}
