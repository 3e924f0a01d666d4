use azfn_sdk::{DeployTarget, ExecuteStageInput, LogPersister, StageStatus};

use crate::client::{deployment_tags, ClientFactory, Existence};
use crate::config::{
    decode_sync_stage_config, AzureApplicationSpec, AzureDeployTargetConfig, FunctionManifest,
};
use crate::error::{format_err_chain, DeployError};
use crate::strategy::{select_method, DeploymentMethod};

/// Run the sync stage: tag, optionally deploy the ARM template, check the
/// function app exists, then deploy the package with whichever method the
/// app's hosting plan supports.
///
/// Steps run strictly in order and stop at the first failure. Nothing that
/// already happened (tags, template) is undone.
pub async fn execute_sync_stage(
    factory: &dyn ClientFactory,
    input: &ExecuteStageInput<AzureApplicationSpec>,
    targets: &[DeployTarget<AzureDeployTargetConfig>],
) -> StageStatus {
    let log = input.log();
    log.info("Start azure function sync");

    match sync(factory, input, targets).await {
        Ok(function_name) => {
            log.success(&format!("Successfully deployed function app {function_name}"));
            StageStatus::Success
        }
        Err(e) => {
            tracing::warn!(error = %e, "azure function sync failed");
            StageStatus::Failure
        }
    }
}

async fn sync(
    factory: &dyn ClientFactory,
    input: &ExecuteStageInput<AzureApplicationSpec>,
    targets: &[DeployTarget<AzureDeployTargetConfig>],
) -> Result<String, DeployError> {
    let log = input.log();
    let request = &input.request;
    let source = &request.target_deployment_source;

    let [target] = targets else {
        return Err(fail(
            log,
            "Currently only one deploy target is supported",
            DeployError::TargetCount {
                count: targets.len(),
            },
        ));
    };

    let manifest = function_manifest(&source.application_config.spec)
        .map_err(|e| fail(log, "Invalid application config", e))?;
    let slots =
        resolve_slots(&request.stage_config).map_err(|e| fail(log, "Invalid sync stage config", e))?;

    let client = factory
        .connect(&target.config)
        .await
        .map_err(|e| fail(log, "Failed to create Azure client", e))?;

    client
        .set_resource_tags(deployment_tags(
            &request.deployment.piped_id,
            &source.commit_hash,
            &request.deployment.application_id,
        ))
        .await
        .map_err(|e| fail(log, "Failed to set resource tags", e))?;

    let resource_group = manifest.resource_group_name.as_str();
    let function_name = manifest.function_name.as_str();

    if let Some(template) = &manifest.arm_template {
        log.info(&format!(
            "Start using ARM template to deploy {}: template {}, parameter {}",
            template.deployment_name,
            template.deployment_template_file,
            template.deployment_parameter_file
        ));
        client
            .deploy_arm_template(resource_group, &source.application_directory, template)
            .await
            .map_err(|e| fail(log, "Failed to deploy ARM template", e))?;
    }
    if manifest.bicep_template.is_some() {
        log.info("Bicep template is declared but not deployed by this stage, skipping");
    }

    let existence = client
        .validate_function(resource_group, function_name, &slots)
        .await
        .map_err(|e| fail(log, "Failed to validate function app", e))?;
    if existence == Existence::NeedsCreation {
        let context = if manifest.arm_template.is_some() {
            "Cannot find resource even after deploying the ARM template"
        } else {
            "Cannot find resource and no ARM template is declared to create it"
        };
        return Err(fail(
            log,
            context,
            DeployError::FunctionNotFound {
                function_name: function_name.to_string(),
            },
        ));
    }

    let slot = slots.first().map(String::as_str).unwrap_or_default();
    let current = client
        .get_function(resource_group, function_name, slot)
        .await
        .map_err(|e| fail(log, &format!("Failed to get function app {function_name}"), e))?;

    let method = select_method(&current);
    log.info(&format!(
        "Deploying {} with {method} (kind {:?}, sku {:?})",
        display_name(function_name, slot),
        current.kind,
        current.sku
    ));
    tracing::info!(
        function = %function_name,
        slot = %slot,
        kind = %current.kind,
        sku = %current.sku,
        method = %method,
        "deploying function package"
    );

    let package_uri = manifest.package_uri.as_str();
    match method {
        DeploymentMethod::RunFromPackage => client
            .run_from_package_deploy(resource_group, function_name, slot, package_uri)
            .await
            .map_err(|e| {
                fail(
                    log,
                    &format!("Failed to deploy {function_name} with 'WEBSITE_RUN_FROM_PACKAGE'"),
                    e,
                )
            })?,
        DeploymentMethod::Kudu => client
            .kudu_deploy(resource_group, function_name, slot, package_uri)
            .await
            .map_err(|e| fail(log, &format!("Failed to deploy {function_name} with Kudu"), e))?,
    }

    Ok(display_name(function_name, slot))
}

fn function_manifest(spec: &AzureApplicationSpec) -> Result<&FunctionManifest, DeployError> {
    let manifest = spec
        .function_manifest
        .as_ref()
        .ok_or(DeployError::MissingManifest)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Slots named by the stage options. At most one today.
fn resolve_slots(raw: &[u8]) -> Result<Vec<String>, DeployError> {
    Ok(decode_sync_stage_config(raw)?
        .map(|config| config.slot_name)
        .filter(|slot| !slot.is_empty())
        .into_iter()
        .collect())
}

fn display_name(function_name: &str, slot: &str) -> String {
    if slot.is_empty() {
        function_name.to_string()
    } else {
        format!("{function_name}/{slot}")
    }
}

fn fail(log: &dyn LogPersister, context: &str, err: DeployError) -> DeployError {
    log.error(&format!("{context}: {}", format_err_chain(&err)));
    err
}
