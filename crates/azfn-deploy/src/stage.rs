use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Every stage this plugin knows. The wire names are what piped stores in
/// pipeline definitions, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "AZURE_FUNCTION_SYNC")]
    Sync,
    #[serde(rename = "AZURE_FUNCTION_SWAP")]
    Swap,
    #[serde(rename = "AZURE_FUNCTION_ROLLBACK")]
    Rollback,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Sync, Stage::Swap, Stage::Rollback];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Sync => "AZURE_FUNCTION_SYNC",
            Stage::Swap => "AZURE_FUNCTION_SWAP",
            Stage::Rollback => "AZURE_FUNCTION_ROLLBACK",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Sync => "Deploy the function package to the function app",
            Stage::Swap => "Swap two deployment slots of the function app",
            Stage::Rollback => "Rollback placeholder, leaves the function app unchanged",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| DeployError::UnknownStage(s.to_string()))
    }
}
