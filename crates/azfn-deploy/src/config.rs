//! Config shapes owned by this plugin: deploy target, application spec and
//! per-stage options.

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Deploy target as configured on the piped side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureDeployTargetConfig {
    #[serde(rename = "subscriptionID")]
    pub subscription_id: String,
    #[serde(default)]
    pub credentials: CredentialSource,
    /// Override for sovereign clouds, e.g. `https://management.chinacloudapi.cn`.
    #[serde(
        rename = "managementEndpoint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub management_endpoint: Option<String>,
    /// Base URL of the Kudu SCM site, used as is for every slot. Unset means
    /// the app's own `*.scm.*` host.
    #[serde(
        rename = "scmEndpoint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scm_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialSource {
    /// A bearer token for the management plane, used as is.
    AccessToken { token: String },
    /// Service principal, exchanged for a token via client credentials.
    #[serde(rename_all = "camelCase")]
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// `AZURE_ACCESS_TOKEN`, falling back to `AZURE_TENANT_ID` +
    /// `AZURE_CLIENT_ID` + `AZURE_CLIENT_SECRET`.
    #[default]
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationKind {
    Function,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureApplicationSpec {
    pub kind: ApplicationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_manifest: Option<FunctionManifest>,
}

/// An ARM or Bicep deployment. File paths are relative to the application
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployTemplate {
    pub deployment_name: String,
    pub deployment_template_file: String,
    pub deployment_parameter_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionManifest {
    pub function_name: String,
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm_template: Option<DeployTemplate>,
    /// Accepted for forward compatibility; the sync stage does not deploy it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bicep_template: Option<DeployTemplate>,
    pub package_uri: String,
}

impl FunctionManifest {
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.function_name.trim().is_empty() {
            return Err(DeployError::InvalidManifest("functionName is empty".into()));
        }
        if self.resource_group_name.trim().is_empty() {
            return Err(DeployError::InvalidManifest(
                "resourceGroupName is empty".into(),
            ));
        }
        for (field, template) in [
            ("armTemplate", &self.arm_template),
            ("bicepTemplate", &self.bicep_template),
        ] {
            if let Some(template) = template {
                template
                    .validate()
                    .map_err(|msg| DeployError::InvalidManifest(format!("{field}: {msg}")))?;
            }
        }
        Ok(())
    }
}

impl DeployTemplate {
    fn validate(&self) -> Result<(), String> {
        if self.deployment_name.trim().is_empty() {
            return Err("deploymentName is empty".into());
        }
        if self.deployment_template_file.trim().is_empty() {
            return Err("deploymentTemplateFile is empty".into());
        }
        if self.deployment_parameter_file.trim().is_empty() {
            return Err("deploymentParameterFile is empty".into());
        }
        Ok(())
    }
}

/// Options of the sync stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStageConfig {
    /// Deployment slot to deploy into. Empty means production.
    #[serde(rename = "slot", default)]
    pub slot_name: String,
}

/// Options of the swap stage. Declared so pipelines using it parse; the
/// stage itself has no executor yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapStageConfig {
    #[serde(rename = "slot1")]
    pub slot_name1: String,
    #[serde(rename = "slot2")]
    pub slot_name2: String,
}

/// Decode raw sync stage options. Empty input means no options.
pub fn decode_sync_stage_config(raw: &[u8]) -> Result<Option<SyncStageConfig>, DeployError> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| DeployError::StageConfig(e.to_string()))
}
