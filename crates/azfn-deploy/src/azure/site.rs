use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::azure::{check, read_json, AzureClient, WEB_API_VERSION};
use crate::client::{Existence, FunctionDescriptor};
use crate::error::DeployError;

/// App setting that makes the host mount the package instead of the
/// `wwwroot` file share.
pub const RUN_FROM_PACKAGE_SETTING: &str = "WEBSITE_RUN_FROM_PACKAGE";

#[derive(Deserialize)]
struct SiteResource {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    properties: SiteProperties,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteProperties {
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    enabled_host_names: Vec<String>,
}

/// Decode a `Microsoft.Web/sites` (or `sites/slots`) resource body.
///
/// A missing kind or SKU reads as empty, which selects the Kudu path.
pub fn parse_site(body: Value) -> Result<FunctionDescriptor, DeployError> {
    let site: SiteResource = serde_json::from_value(body)?;
    Ok(FunctionDescriptor {
        id: site.id,
        name: site.name,
        kind: site.kind.unwrap_or_default(),
        sku: site.properties.sku.unwrap_or_default(),
        state: site.properties.state.unwrap_or_default(),
        enabled_host_names: site.properties.enabled_host_names,
    })
}

/// App settings from a `config/appsettings/list` body with the package
/// pointer set. All other settings are kept as they are.
pub fn with_run_from_package(current: &Value, package_uri: &str) -> Map<String, Value> {
    let mut settings = current
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    settings.insert(
        RUN_FROM_PACKAGE_SETTING.to_string(),
        Value::String(package_uri.to_string()),
    );
    settings
}

impl AzureClient {
    pub(crate) fn site_path(&self, resource_group: &str, function_name: &str, slot: &str) -> String {
        let mut path = format!(
            "/subscriptions/{}/resourceGroups/{resource_group}/providers/Microsoft.Web/sites/{function_name}",
            self.subscription_id
        );
        if !slot.is_empty() {
            path.push_str("/slots/");
            path.push_str(slot);
        }
        path
    }

    pub(crate) async fn function_existence(
        &self,
        resource_group: &str,
        function_name: &str,
        slots: &[String],
    ) -> Result<Existence, DeployError> {
        let url = self.arm_url(
            &self.site_path(resource_group, function_name, ""),
            WEB_API_VERSION,
        );
        if self.get_optional(&url).await?.is_none() {
            tracing::info!(function = %function_name, "function app does not exist");
            return Ok(Existence::NeedsCreation);
        }

        for slot in slots.iter().filter(|slot| !slot.is_empty()) {
            let url = self.arm_url(
                &self.site_path(resource_group, function_name, slot),
                WEB_API_VERSION,
            );
            if self.get_optional(&url).await?.is_none() {
                tracing::info!(function = %function_name, slot = %slot, "deployment slot does not exist");
                return Ok(Existence::NeedsCreation);
            }
        }

        Ok(Existence::Exists)
    }

    pub(crate) async fn describe_function(
        &self,
        resource_group: &str,
        function_name: &str,
        slot: &str,
    ) -> Result<FunctionDescriptor, DeployError> {
        let url = self.arm_url(
            &self.site_path(resource_group, function_name, slot),
            WEB_API_VERSION,
        );
        let body = self
            .get_optional(&url)
            .await?
            .ok_or_else(|| DeployError::FunctionNotFound {
                function_name: function_name.to_string(),
            })?;
        parse_site(body)
    }

    pub(crate) async fn deploy_run_from_package(
        &self,
        resource_group: &str,
        function_name: &str,
        slot: &str,
        package_uri: &str,
    ) -> Result<(), DeployError> {
        let site = self.site_path(resource_group, function_name, slot);

        let list_url = self.arm_url(&format!("{site}/config/appsettings/list"), WEB_API_VERSION);
        let current = read_json(check(self.send(Method::POST, &list_url, None).await?).await?).await?;
        let settings = with_run_from_package(&current, package_uri);

        let put_url = self.arm_url(&format!("{site}/config/appsettings"), WEB_API_VERSION);
        let body = serde_json::json!({ "properties": settings });
        check(self.send(Method::PUT, &put_url, Some(&body)).await?)
            .await
            .map_err(|e| DeployError::PackageFailed(e.to_string()))?;
        tracing::info!(function = %function_name, slot = %slot, "run-from-package setting updated");

        // Consumption hosts only pick up new triggers after a sync.
        let sync_url = self.arm_url(&format!("{site}/syncfunctiontriggers"), WEB_API_VERSION);
        check(self.send(Method::POST, &sync_url, None).await?).await?;

        self.merge_tags(&site).await
    }
}
