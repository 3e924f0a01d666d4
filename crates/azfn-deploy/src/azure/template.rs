use std::path::Path;
use std::time::Instant;

use reqwest::Method;
use serde_json::{json, Value};

use crate::azure::{check, read_json, AzureClient, RESOURCES_API_VERSION};
use crate::client::ResourceTags;
use crate::config::DeployTemplate;
use crate::error::DeployError;

/// Build the body of a `Microsoft.Resources/deployments` PUT from the
/// template and parameter files under `app_dir`.
pub async fn load_deployment_body(
    app_dir: &Path,
    template: &DeployTemplate,
    tags: &ResourceTags,
) -> Result<Value, DeployError> {
    let template_body = read_json_file(&app_dir.join(&template.deployment_template_file)).await?;
    let parameter_file =
        read_json_file(&app_dir.join(&template.deployment_parameter_file)).await?;

    // Parameter files wrap the values next to `$schema` and `contentVersion`.
    let parameters = parameter_file
        .get("parameters")
        .cloned()
        .unwrap_or(parameter_file);

    Ok(json!({
        "properties": {
            "mode": "Incremental",
            "template": template_body,
            "parameters": parameters,
        },
        "tags": tags,
    }))
}

async fn read_json_file(path: &Path) -> Result<Value, DeployError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DeployError::TemplateFailed(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| DeployError::TemplateFailed(format!("cannot parse {}: {e}", path.display())))
}

/// Terminal `provisioningState` values of a deployment.
fn is_terminal(state: &str) -> bool {
    matches!(state, "Succeeded" | "Failed" | "Canceled")
}

fn provisioning_state(deployment: &Value) -> String {
    deployment
        .pointer("/properties/provisioningState")
        .and_then(Value::as_str)
        .unwrap_or("Accepted")
        .to_string()
}

fn deployment_error(deployment: &Value) -> String {
    deployment
        .pointer("/properties/error/message")
        .and_then(Value::as_str)
        .unwrap_or("no error detail")
        .to_string()
}

impl AzureClient {
    pub(crate) async fn deploy_template(
        &self,
        resource_group: &str,
        app_dir: &Path,
        template: &DeployTemplate,
    ) -> Result<(), DeployError> {
        let body = load_deployment_body(app_dir, template, &self.tags()).await?;
        let url = self.arm_url(
            &format!(
                "/subscriptions/{}/resourcegroups/{resource_group}/providers/Microsoft.Resources/deployments/{}",
                self.subscription_id, template.deployment_name
            ),
            RESOURCES_API_VERSION,
        );

        let response = check(self.send(Method::PUT, &url, Some(&body)).await?)
            .await
            .map_err(|e| DeployError::TemplateFailed(e.to_string()))?;
        let mut deployment = read_json(response).await?;
        let mut state = provisioning_state(&deployment);
        tracing::info!(
            deployment = %template.deployment_name,
            resource_group = %resource_group,
            state = %state,
            "ARM deployment submitted"
        );

        let started = Instant::now();
        while !is_terminal(&state) {
            if started.elapsed() >= self.operation_timeout {
                return Err(DeployError::Timeout {
                    operation: format!("ARM deployment {}", template.deployment_name),
                    seconds: self.operation_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;

            deployment = read_json(check(self.send(Method::GET, &url, None).await?).await?).await?;
            state = provisioning_state(&deployment);
            tracing::debug!(deployment = %template.deployment_name, state = %state, "polled ARM deployment");
        }

        if state == "Succeeded" {
            tracing::info!(deployment = %template.deployment_name, "ARM deployment succeeded");
            Ok(())
        } else {
            Err(DeployError::TemplateFailed(format!(
                "deployment ended in state {state}: {}",
                deployment_error(&deployment)
            )))
        }
    }
}
