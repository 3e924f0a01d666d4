use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::log::LogPersister;

/// Identity of the deployment a stage belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub application_id: String,
    #[serde(default)]
    pub application_name: String,
    pub piped_id: String,
}

/// Application config as parsed by piped. `S` is the plugin-specific spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig<S> {
    #[serde(default)]
    pub name: String,
    pub spec: S,
}

/// The source checkout a deployment is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSource<S> {
    /// Root of the application inside the checked-out repository.
    /// Relative file paths in the application config resolve against it.
    pub application_directory: PathBuf,
    pub commit_hash: String,
    pub application_config: ApplicationConfig<S>,
}

/// Request half of a stage execution, as sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStageRequest<S> {
    pub stage_name: String,
    #[serde(default)]
    pub stage_index: u32,
    /// Raw JSON of the stage options. Empty when the stage declares none.
    #[serde(default, with = "raw_json")]
    pub stage_config: Vec<u8>,
    pub deployment: Deployment,
    pub target_deployment_source: DeploymentSource<S>,
}

/// Everything a stage execution receives: the request plus the log channel
/// the orchestrator shows to users.
#[derive(Clone)]
pub struct ExecuteStageInput<S> {
    pub request: ExecuteStageRequest<S>,
    log: Arc<dyn LogPersister>,
}

impl<S> ExecuteStageInput<S> {
    pub fn new(request: ExecuteStageRequest<S>, log: Arc<dyn LogPersister>) -> Self {
        Self { request, log }
    }

    pub fn log(&self) -> &dyn LogPersister {
        self.log.as_ref()
    }
}

/// Stage options travel as an arbitrary JSON value and are kept as bytes
/// until the owning plugin decodes them.
mod raw_json {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if bytes.is_empty() {
            return serializer.serialize_none();
        }
        let value: Value = serde_json::from_slice(bytes).map_err(S::Error::custom)?;
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::to_vec(&value).map_err(D::Error::custom),
        }
    }
}
