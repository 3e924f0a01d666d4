//! `FunctionClient` backed by Azure Resource Manager and the Kudu SCM site.

pub mod auth;
pub mod kudu;
pub mod site;
pub mod template;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::azure::auth::{acquire_token, resolve_credential, Credential};
use crate::client::{
    BoxFuture, ClientFactory, Existence, FunctionClient, FunctionDescriptor, ResourceTags,
};
use crate::config::{AzureDeployTargetConfig, DeployTemplate};
use crate::error::{format_err_chain, DeployError};
use crate::settings::PluginSettings;

pub const WEB_API_VERSION: &str = "2023-12-01";
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Creates one `AzureClient` per stage execution, sharing the HTTP
/// connection pool.
pub struct AzureClientFactory {
    http: reqwest::Client,
    settings: PluginSettings,
}

impl AzureClientFactory {
    pub fn new(settings: PluginSettings) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { http, settings })
    }
}

impl ClientFactory for AzureClientFactory {
    fn connect<'a>(
        &'a self,
        target: &'a AzureDeployTargetConfig,
    ) -> BoxFuture<'a, Result<Arc<dyn FunctionClient>, DeployError>> {
        Box::pin(async move {
            let credential =
                resolve_credential(&target.credentials, |key| std::env::var(key).ok())?;
            let client = AzureClient::new(self.http.clone(), target, credential, &self.settings);
            tracing::debug!(
                subscription = %target.subscription_id,
                endpoint = %client.management_endpoint,
                "created Azure client"
            );
            Ok(Arc::new(client) as Arc<dyn FunctionClient>)
        })
    }
}

pub struct AzureClient {
    http: reqwest::Client,
    subscription_id: String,
    management_endpoint: String,
    login_endpoint: String,
    scm_endpoint: Option<String>,
    credential: Credential,
    token: OnceCell<String>,
    tags: Mutex<ResourceTags>,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl AzureClient {
    pub fn new(
        http: reqwest::Client,
        target: &AzureDeployTargetConfig,
        credential: Credential,
        settings: &PluginSettings,
    ) -> Self {
        let management_endpoint = target
            .management_endpoint
            .as_deref()
            .unwrap_or(&settings.management_endpoint)
            .trim_end_matches('/')
            .to_string();

        Self {
            http,
            subscription_id: target.subscription_id.clone(),
            management_endpoint,
            login_endpoint: settings.login_endpoint.clone(),
            scm_endpoint: target
                .scm_endpoint
                .as_deref()
                .map(|endpoint| endpoint.trim_end_matches('/').to_string()),
            credential,
            token: OnceCell::new(),
            tags: Mutex::new(ResourceTags::new()),
            poll_interval: settings.poll_interval,
            operation_timeout: settings.operation_timeout,
        }
    }

    /// Tags set by the last `set_resource_tags` call.
    fn tags(&self) -> ResourceTags {
        match self.tags.lock() {
            Ok(tags) => tags.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn arm_url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}{path}?api-version={api_version}",
            self.management_endpoint
        )
    }

    async fn bearer_token(&self) -> Result<&str, DeployError> {
        let token = self
            .token
            .get_or_try_init(|| {
                acquire_token(
                    &self.http,
                    &self.credential,
                    &self.login_endpoint,
                    &self.management_endpoint,
                )
            })
            .await?;
        Ok(token.as_str())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, DeployError> {
        let token = self.bearer_token().await?;
        tracing::debug!(method = %method, url, "azure request");

        let mut request = self.http.request(method.clone(), url).bearer_auth(token);
        request = match body {
            Some(body) => request.json(body),
            // ARM rejects body-less POSTs without an explicit length
            None if method != Method::GET => {
                request.header(reqwest::header::CONTENT_LENGTH, "0")
            }
            None => request,
        };

        request
            .send()
            .await
            .map_err(|e| DeployError::Azure(format!("{method} {url}: {}", format_err_chain(&e))))
    }

    /// GET that maps 404 to `None`.
    async fn get_optional(&self, url: &str) -> Result<Option<Value>, DeployError> {
        let response = self.send(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response).await?;
        Ok(Some(read_json(response).await?))
    }

    /// Merge the current tag set onto the resource at `scope`.
    async fn merge_tags(&self, scope: &str) -> Result<(), DeployError> {
        let tags = self.tags();
        if tags.is_empty() {
            return Ok(());
        }
        let url = self.arm_url(
            &format!("{scope}/providers/Microsoft.Resources/tags/default"),
            RESOURCES_API_VERSION,
        );
        let body = serde_json::json!({
            "operation": "Merge",
            "properties": { "tags": tags },
        });
        check(self.send(Method::PATCH, &url, Some(&body)).await?).await?;
        tracing::debug!(scope, "resource tags merged");
        Ok(())
    }
}

impl FunctionClient for AzureClient {
    fn set_resource_tags(&self, tags: ResourceTags) -> BoxFuture<'_, Result<(), DeployError>> {
        Box::pin(async move {
            match self.tags.lock() {
                Ok(mut current) => *current = tags,
                Err(poisoned) => *poisoned.into_inner() = tags,
            }
            Ok(())
        })
    }

    fn deploy_arm_template<'a>(
        &'a self,
        resource_group: &'a str,
        app_dir: &'a Path,
        template: &'a DeployTemplate,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        Box::pin(async move {
            self.deploy_template(resource_group, app_dir, template)
                .await
                .map_err(|e| e.with_resource("ARM deployment", &template.deployment_name))
        })
    }

    fn validate_function<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slots: &'a [String],
    ) -> BoxFuture<'a, Result<Existence, DeployError>> {
        Box::pin(self.function_existence(resource_group, function_name, slots))
    }

    fn get_function<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
    ) -> BoxFuture<'a, Result<FunctionDescriptor, DeployError>> {
        Box::pin(async move {
            self.describe_function(resource_group, function_name, slot)
                .await
                .map_err(|e| e.with_resource("Function app", function_name))
        })
    }

    fn run_from_package_deploy<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
        package_uri: &'a str,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        Box::pin(async move {
            self.deploy_run_from_package(resource_group, function_name, slot, package_uri)
                .await
                .map_err(|e| e.with_resource("Function app", function_name))
        })
    }

    fn kudu_deploy<'a>(
        &'a self,
        resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
        package_uri: &'a str,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        Box::pin(async move {
            self.deploy_zip(resource_group, function_name, slot, package_uri)
                .await
                .map_err(|e| e.with_resource("Function app", function_name))
        })
    }
}

/// Turn a non-2xx response into an error carrying Azure's message.
async fn check(response: Response) -> Result<Response, DeployError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeployError::Azure(format!(
        "{status}: {}",
        azure_error_message(&body)
    )))
}

/// Body as JSON; an empty body reads as `null`.
async fn read_json(response: Response) -> Result<Value, DeployError> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull `error.code` / `error.message` out of an ARM error body, falling
/// back to the raw text.
pub fn azure_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let code = error.and_then(|e| e.get("code")).and_then(Value::as_str);
    let message = error.and_then(|e| e.get("message")).and_then(Value::as_str);
    match (code, message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message.to_string(),
        (Some(code), None) => code.to_string(),
        (None, None) => body.trim().to_string(),
    }
}
