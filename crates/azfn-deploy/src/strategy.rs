use std::fmt;

use crate::client::FunctionDescriptor;

/// Hosting plan SKU of the consumption plan.
pub const CONSUMPTION_SKU: &str = "Dynamic";

/// Marker inside the platform kind of Linux hosts, e.g. `functionapp,linux`.
pub const LINUX_KIND_MARKER: &str = "linux";

/// How a package gets onto the function app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMethod {
    /// The app runs straight from the package URI.
    RunFromPackage,
    /// Kudu downloads the package and extracts it onto the host file system.
    Kudu,
}

impl fmt::Display for DeploymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeploymentMethod::RunFromPackage => f.write_str("run-from-package"),
            DeploymentMethod::Kudu => f.write_str("kudu zip deploy"),
        }
    }
}

/// Linux consumption hosts have no persistent file system to extract into,
/// so they can only run from a package. Everything else goes through Kudu.
pub fn select_method(current: &FunctionDescriptor) -> DeploymentMethod {
    if current.kind.contains(LINUX_KIND_MARKER) && current.sku == CONSUMPTION_SKU {
        DeploymentMethod::RunFromPackage
    } else {
        DeploymentMethod::Kudu
    }
}
