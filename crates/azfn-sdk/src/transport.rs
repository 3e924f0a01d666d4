//! Newline-delimited JSON host loop.
//!
//! Each input line is one request:
//!
//! ```text
//! {"method":"fetchDefinedStages"}
//! {"method":"buildPipelineSyncStages","params":{"stages":[...],"rollback":true}}
//! {"method":"buildQuickSyncStages","params":{"rollback":true}}
//! {"method":"executeStage","params":{"request":{...},"deployTargets":[...]}}
//! ```
//!
//! Each request gets exactly one response line, either `{"result": ...}` or
//! `{"error": "..."}`. Requests are handled one at a time.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::Instrument;

use crate::error::SdkError;
use crate::input::{ExecuteStageInput, ExecuteStageRequest};
use crate::log::{BufferedLogPersister, LogLine, LogPersister};
use crate::plugin::{BuildPipelineSyncStagesInput, BuildQuickSyncStagesInput, DeploymentPlugin};
use crate::stage::StageStatus;
use crate::target::DeployTarget;

#[derive(Debug, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum PluginRequest<T, S> {
    FetchDefinedStages,
    BuildPipelineSyncStages(BuildPipelineSyncStagesInput),
    BuildQuickSyncStages(BuildQuickSyncStagesInput),
    ExecuteStage(ExecuteStageParams<T, S>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStageParams<T, S> {
    pub request: ExecuteStageRequest<S>,
    pub deploy_targets: Vec<DeployTarget<T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStageResponse {
    pub status: StageStatus,
    pub logs: Vec<LogLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum PluginResponse {
    Result(serde_json::Value),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Upper bound for one stage execution. Expiry drops the stage future,
    /// which aborts any in-flight remote call, and reports failure.
    pub stage_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<P, R, W>(
    plugin: &P,
    reader: R,
    mut writer: W,
    options: &ServeOptions,
) -> Result<(), SdkError>
where
    P: DeploymentPlugin,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(plugin = plugin.name(), "plugin host started");

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match handle_request(plugin, &line, options).await {
            Ok(value) => PluginResponse::Result(value),
            Err(e) => {
                tracing::warn!(error = %e, "plugin request failed");
                PluginResponse::Error(e.to_string())
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }

    tracing::info!(plugin = plugin.name(), "plugin host input closed");
    Ok(())
}

/// Decode one request line and dispatch it to the plugin.
pub async fn handle_request<P: DeploymentPlugin>(
    plugin: &P,
    line: &str,
    options: &ServeOptions,
) -> Result<serde_json::Value, SdkError> {
    let request: PluginRequest<P::DeployTargetConfig, P::ApplicationSpec> =
        serde_json::from_str(line)?;

    match request {
        PluginRequest::FetchDefinedStages => Ok(serde_json::to_value(plugin.fetch_defined_stages())?),
        PluginRequest::BuildPipelineSyncStages(input) => {
            Ok(serde_json::to_value(plugin.build_pipeline_sync_stages(&input)?)?)
        }
        PluginRequest::BuildQuickSyncStages(input) => {
            Ok(serde_json::to_value(plugin.build_quick_sync_stages(&input)?)?)
        }
        PluginRequest::ExecuteStage(params) => {
            let stage_name = params.request.stage_name.clone();
            let deployment_id = params.request.deployment.id.clone();
            let logs = Arc::new(BufferedLogPersister::new());
            let input = ExecuteStageInput::new(params.request, logs.clone());

            let span = tracing::info_span!(
                "execute_stage",
                stage = %stage_name,
                deployment = %deployment_id
            );
            let execution = plugin.execute_stage(&input, &params.deploy_targets);
            let status = match tokio::time::timeout(options.stage_timeout, execution)
                .instrument(span)
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    logs.error(&format!(
                        "Stage {stage_name} did not finish within {}s, cancelled",
                        options.stage_timeout.as_secs()
                    ));
                    StageStatus::Failure
                }
            };

            tracing::info!(
                stage = %stage_name,
                deployment = %deployment_id,
                success = status.is_success(),
                "stage finished"
            );

            Ok(serde_json::to_value(ExecuteStageResponse {
                status,
                logs: logs.lines(),
            })?)
        }
    }
}
