use std::time::Duration;

use crate::error::DeployError;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";

/// Process-wide plugin settings, read from `AZFN_*` environment variables.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    /// Azure Resource Manager base URL. A deploy target may override it.
    pub management_endpoint: String,
    /// Microsoft Entra ID authority used for client-secret logins.
    pub login_endpoint: String,
    /// Timeout of a single HTTP request.
    pub request_timeout: Duration,
    /// Delay between polls of a long-running operation.
    pub poll_interval: Duration,
    /// Give up on a template deployment or Kudu deployment after this long.
    pub operation_timeout: Duration,
    /// Deadline for one whole stage execution.
    pub stage_timeout: Duration,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            management_endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30 * 60),
            stage_timeout: Duration::from_secs(6 * 60 * 60),
        }
    }
}

impl PluginSettings {
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys keep their
    /// defaults; set but malformed keys are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DeployError> {
        let mut settings = Self::default();

        if let Some(endpoint) = lookup("AZFN_MANAGEMENT_ENDPOINT") {
            settings.management_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(endpoint) = lookup("AZFN_LOGIN_ENDPOINT") {
            settings.login_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(secs) = seconds(&lookup, "AZFN_REQUEST_TIMEOUT_SECS")? {
            settings.request_timeout = secs;
        }
        if let Some(secs) = seconds(&lookup, "AZFN_POLL_INTERVAL_SECS")? {
            settings.poll_interval = secs;
        }
        if let Some(secs) = seconds(&lookup, "AZFN_OPERATION_TIMEOUT_SECS")? {
            settings.operation_timeout = secs;
        }
        if let Some(secs) = seconds(&lookup, "AZFN_STAGE_TIMEOUT_SECS")? {
            settings.stage_timeout = secs;
        }

        Ok(settings)
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, DeployError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(DeployError::Settings {
            key: key.to_string(),
            message: "must be greater than 0".into(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(DeployError::Settings {
            key: key.to_string(),
            message: format!("{raw:?} is not a number of seconds: {e}"),
        }),
    }
}
