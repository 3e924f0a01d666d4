use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A deploy target configured on the piped side.
///
/// `C` is the plugin-specific config shape, e.g. the subscription a cloud
/// resource lives in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployTarget<C> {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub config: C,
}
