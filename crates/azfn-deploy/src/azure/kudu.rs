use std::time::Instant;

use reqwest::header::LOCATION;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::azure::{check, read_json, AzureClient};
use crate::client::FunctionDescriptor;
use crate::error::DeployError;

/// Progress of a Kudu deployment, from the `status` field of
/// `/api/deployments/<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KuduStatus {
    Pending,
    Succeeded,
    Failed(String),
}

// Kudu DeployStatus: 0 pending, 1 building, 2 deploying, 3 failed, 4 success.
pub fn kudu_status(body: &Value) -> KuduStatus {
    match body.get("status").and_then(Value::as_i64) {
        Some(4) => KuduStatus::Succeeded,
        Some(3) => KuduStatus::Failed(
            body.get("status_text")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .unwrap_or("deployment failed")
                .to_string(),
        ),
        _ => KuduStatus::Pending,
    }
}

/// Host name of the SCM (Kudu) site of a function app or slot.
pub fn scm_host(current: &FunctionDescriptor, function_name: &str, slot: &str) -> String {
    if let Some(host) = current
        .enabled_host_names
        .iter()
        .find(|host| host.contains(".scm."))
    {
        return host.clone();
    }
    if slot.is_empty() {
        format!("{function_name}.scm.azurewebsites.net")
    } else {
        format!("{function_name}-{slot}.scm.azurewebsites.net")
    }
}

/// Base URL of the SCM site: the configured override, else `https://` plus
/// [`scm_host`].
pub fn scm_base_url(
    scm_endpoint: Option<&str>,
    current: &FunctionDescriptor,
    function_name: &str,
    slot: &str,
) -> String {
    match scm_endpoint {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => format!("https://{}", scm_host(current, function_name, slot)),
    }
}

impl AzureClient {
    pub(crate) async fn deploy_zip(
        &self,
        resource_group: &str,
        function_name: &str,
        slot: &str,
        package_uri: &str,
    ) -> Result<(), DeployError> {
        let current = self
            .describe_function(resource_group, function_name, slot)
            .await?;
        let scm = scm_base_url(self.scm_endpoint.as_deref(), &current, function_name, slot);
        let url = format!("{scm}/api/zipdeploy?isAsync=true");

        let response = check(
            self.send(Method::POST, &url, Some(&json!({ "packageUri": package_uri })))
                .await?,
        )
        .await
        .map_err(|e| DeployError::PackageFailed(e.to_string()))?;

        let status_url = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| format!("{scm}/api/deployments/latest"));
        tracing::info!(function = %function_name, slot = %slot, scm = %scm, "zip deployment accepted");

        self.wait_for_kudu(&status_url).await?;
        tracing::info!(function = %function_name, slot = %slot, "zip deployment finished");

        self.merge_tags(&self.site_path(resource_group, function_name, slot))
            .await
    }

    async fn wait_for_kudu(&self, status_url: &str) -> Result<(), DeployError> {
        let started = Instant::now();
        loop {
            let response = self.send(Method::GET, status_url, None).await?;
            // 202 while the deployment is still queued or running
            if response.status() != StatusCode::ACCEPTED {
                let body = read_json(check(response).await?).await?;
                match kudu_status(&body) {
                    KuduStatus::Succeeded => return Ok(()),
                    KuduStatus::Failed(reason) => return Err(DeployError::PackageFailed(reason)),
                    KuduStatus::Pending => {}
                }
            }

            if started.elapsed() >= self.operation_timeout {
                return Err(DeployError::Timeout {
                    operation: "Kudu zip deployment".into(),
                    seconds: self.operation_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
