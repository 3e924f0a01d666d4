use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use azfn_deploy::client::{
    BoxFuture, LABEL_APPLICATION, LABEL_COMMIT_HASH, LABEL_MANAGED_BY, LABEL_PIPED,
    MANAGED_BY_PIPED, ResourceTags,
};
use azfn_deploy::config::{ApplicationKind, CredentialSource, DeployTemplate};
use azfn_deploy::{
    AzureApplicationSpec, AzureDeployTargetConfig, AzurePlugin, ClientFactory, DeployError,
    Existence, FunctionClient, FunctionDescriptor, FunctionManifest, Stage, execute_sync_stage,
};
use azfn_sdk::{
    ApplicationConfig, BufferedLogPersister, DeployTarget, Deployment, DeploymentPlugin,
    DeploymentSource, ExecuteStageInput, ExecuteStageRequest, LogLevel, SdkError, StageStatus,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetTags(ResourceTags),
    DeployTemplate { resource_group: String, app_dir: PathBuf, deployment: String },
    Validate { function: String, slots: Vec<String> },
    Get { function: String, slot: String },
    RunFromPackage { function: String, slot: String, package_uri: String },
    Kudu { function: String, slot: String, package_uri: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    SetTags,
    DeployTemplate,
    Validate,
    Get,
    RunFromPackage,
    Kudu,
}

struct SpyClient {
    calls: Mutex<Vec<Call>>,
    existence: Existence,
    current: FunctionDescriptor,
    fail_on: Option<Op>,
}

impl SpyClient {
    fn new(kind: &str, sku: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            existence: Existence::Exists,
            current: FunctionDescriptor {
                id: "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Web/sites/hello-func"
                    .into(),
                name: "hello-func".into(),
                kind: kind.into(),
                sku: sku.into(),
                state: "Running".into(),
                enabled_host_names: vec![],
            },
            fail_on: None,
        }
    }

    fn failing(mut self, op: Op) -> Self {
        self.fail_on = Some(op);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Error injected for `op`, if the client was told to fail there.
    fn outcome(&self, op: Op) -> Result<(), DeployError> {
        if self.fail_on != Some(op) {
            return Ok(());
        }
        Err(match op {
            Op::DeployTemplate => {
                DeployError::TemplateFailed("InvalidTemplate: missing resource".into())
            }
            Op::RunFromPackage | Op::Kudu => {
                DeployError::PackageFailed("Extract failed: disk full".into())
            }
            Op::SetTags | Op::Validate | Op::Get => {
                DeployError::Azure("500 Internal Server Error: InternalError".into())
            }
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl FunctionClient for SpyClient {
    fn set_resource_tags(&self, tags: ResourceTags) -> BoxFuture<'_, Result<(), DeployError>> {
        self.record(Call::SetTags(tags));
        let result = self.outcome(Op::SetTags);
        Box::pin(async move { result })
    }

    fn deploy_arm_template<'a>(
        &'a self,
        resource_group: &'a str,
        app_dir: &'a Path,
        template: &'a DeployTemplate,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        self.record(Call::DeployTemplate {
            resource_group: resource_group.into(),
            app_dir: app_dir.to_path_buf(),
            deployment: template.deployment_name.clone(),
        });
        let result = self.outcome(Op::DeployTemplate);
        Box::pin(async move { result })
    }

    fn validate_function<'a>(
        &'a self,
        _resource_group: &'a str,
        function_name: &'a str,
        slots: &'a [String],
    ) -> BoxFuture<'a, Result<Existence, DeployError>> {
        self.record(Call::Validate {
            function: function_name.into(),
            slots: slots.to_vec(),
        });
        let result = self.outcome(Op::Validate).map(|()| self.existence);
        Box::pin(async move { result })
    }

    fn get_function<'a>(
        &'a self,
        _resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
    ) -> BoxFuture<'a, Result<FunctionDescriptor, DeployError>> {
        self.record(Call::Get {
            function: function_name.into(),
            slot: slot.into(),
        });
        let result = self.outcome(Op::Get).map(|()| self.current.clone());
        Box::pin(async move { result })
    }

    fn run_from_package_deploy<'a>(
        &'a self,
        _resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
        package_uri: &'a str,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        self.record(Call::RunFromPackage {
            function: function_name.into(),
            slot: slot.into(),
            package_uri: package_uri.into(),
        });
        let result = self.outcome(Op::RunFromPackage);
        Box::pin(async move { result })
    }

    fn kudu_deploy<'a>(
        &'a self,
        _resource_group: &'a str,
        function_name: &'a str,
        slot: &'a str,
        package_uri: &'a str,
    ) -> BoxFuture<'a, Result<(), DeployError>> {
        self.record(Call::Kudu {
            function: function_name.into(),
            slot: slot.into(),
            package_uri: package_uri.into(),
        });
        let result = self.outcome(Op::Kudu);
        Box::pin(async move { result })
    }
}

struct SpyFactory {
    client: Arc<SpyClient>,
    connects: AtomicUsize,
}

impl SpyFactory {
    fn new(client: SpyClient) -> Self {
        Self {
            client: Arc::new(client),
            connects: AtomicUsize::new(0),
        }
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ClientFactory for SpyFactory {
    fn connect<'a>(
        &'a self,
        _target: &'a AzureDeployTargetConfig,
    ) -> BoxFuture<'a, Result<Arc<dyn FunctionClient>, DeployError>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let client = self.client.clone() as Arc<dyn FunctionClient>;
        Box::pin(async move { Ok(client) })
    }
}

fn manifest() -> FunctionManifest {
    FunctionManifest {
        function_name: "hello-func".into(),
        resource_group_name: "rg-hello".into(),
        arm_template: None,
        bicep_template: None,
        package_uri: "https://storage.example.com/releases/hello-1.2.0.zip".into(),
    }
}

fn arm_template() -> DeployTemplate {
    DeployTemplate {
        deployment_name: "hello-infra".into(),
        deployment_template_file: "infra/main.json".into(),
        deployment_parameter_file: "infra/main.parameters.json".into(),
    }
}

fn target(name: &str) -> DeployTarget<AzureDeployTargetConfig> {
    DeployTarget {
        name: name.into(),
        labels: BTreeMap::new(),
        config: AzureDeployTargetConfig {
            subscription_id: "00000000-0000-0000-0000-000000000001".into(),
            credentials: CredentialSource::AccessToken {
                token: "token".into(),
            },
            management_endpoint: None,
            scm_endpoint: None,
        },
    }
}

fn stage_input(
    stage: &str,
    manifest: Option<FunctionManifest>,
    stage_config: &str,
) -> (ExecuteStageInput<AzureApplicationSpec>, Arc<BufferedLogPersister>) {
    let logs = Arc::new(BufferedLogPersister::new());
    let request = ExecuteStageRequest {
        stage_name: stage.into(),
        stage_index: 0,
        stage_config: stage_config.as_bytes().to_vec(),
        deployment: Deployment {
            id: "deployment-1".into(),
            application_id: "app-1".into(),
            application_name: "hello".into(),
            piped_id: "piped-1".into(),
        },
        target_deployment_source: DeploymentSource {
            application_directory: PathBuf::from("/workspace/apps/hello"),
            commit_hash: "3f2a9c1".into(),
            application_config: ApplicationConfig {
                name: "hello".into(),
                spec: AzureApplicationSpec {
                    kind: ApplicationKind::Function,
                    function_manifest: manifest,
                },
            },
        },
    };
    (ExecuteStageInput::new(request, logs.clone()), logs)
}

fn sync_input(
    manifest: Option<FunctionManifest>,
    stage_config: &str,
) -> (ExecuteStageInput<AzureApplicationSpec>, Arc<BufferedLogPersister>) {
    stage_input(Stage::Sync.as_str(), manifest, stage_config)
}

fn error_lines(logs: &BufferedLogPersister) -> Vec<String> {
    logs.lines()
        .into_iter()
        .filter(|line| line.level == LogLevel::Error)
        .map(|line| line.message)
        .collect()
}

#[tokio::test]
async fn zero_targets_fail_before_any_remote_call() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Dynamic"));
    let (input, logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[]).await;

    assert_eq!(status, StageStatus::Failure);
    assert_eq!(factory.connects(), 0);
    assert!(factory.client.calls().is_empty());
    assert!(error_lines(&logs)[0].contains("only one deploy target"));
}

#[tokio::test]
async fn two_targets_fail_before_any_remote_call() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Dynamic"));
    let (input, _logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("a"), target("b")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert_eq!(factory.connects(), 0);
    assert!(factory.client.calls().is_empty());
}

#[tokio::test]
async fn missing_manifest_fails_without_connecting() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Dynamic"));
    let (input, logs) = sync_input(None, "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert_eq!(factory.connects(), 0);
    assert!(error_lines(&logs)[0].contains("functionManifest"));
}

#[tokio::test]
async fn invalid_manifest_fails_without_connecting() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Dynamic"));
    let mut bad = manifest();
    bad.resource_group_name = String::new();
    let (input, logs) = sync_input(Some(bad), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert_eq!(factory.connects(), 0);
    assert!(error_lines(&logs)[0].contains("resourceGroupName"));
}

#[tokio::test]
async fn malformed_stage_config_fails_the_stage() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Dynamic"));
    let (input, logs) = sync_input(Some(manifest()), r#"{"slot": 5}"#);

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert_eq!(factory.connects(), 0);
    assert!(error_lines(&logs)[0].contains("Invalid sync stage config"));
}

#[tokio::test]
async fn successful_sync_writes_exactly_the_four_tags() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "ElasticPremium"));
    let (input, _logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);

    let tags: Vec<ResourceTags> = factory
        .client
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::SetTags(tags) => Some(tags),
            _ => None,
        })
        .collect();
    assert_eq!(tags.len(), 1);

    let expected = BTreeMap::from([
        (LABEL_MANAGED_BY.to_string(), MANAGED_BY_PIPED.to_string()),
        (LABEL_PIPED.to_string(), "piped-1".to_string()),
        (LABEL_COMMIT_HASH.to_string(), "3f2a9c1".to_string()),
        (LABEL_APPLICATION.to_string(), "app-1".to_string()),
    ]);
    assert_eq!(tags[0], expected);
}

#[tokio::test]
async fn windows_app_is_deployed_through_kudu_in_protocol_order() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Dynamic"));
    let (input, logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);
    assert_eq!(factory.connects(), 1);

    let calls = factory.client.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[0], Call::SetTags(_)));
    assert_eq!(
        calls[1..],
        [
            Call::Validate {
                function: "hello-func".into(),
                slots: vec![],
            },
            Call::Get {
                function: "hello-func".into(),
                slot: String::new(),
            },
            Call::Kudu {
                function: "hello-func".into(),
                slot: String::new(),
                package_uri: "https://storage.example.com/releases/hello-1.2.0.zip".into(),
            },
        ]
    );
    assert!(logs
        .lines()
        .iter()
        .any(|line| line.level == LogLevel::Success));
}

#[tokio::test]
async fn linux_consumption_app_runs_from_package() {
    let factory = SpyFactory::new(SpyClient::new("functionapp,linux", "Dynamic"));
    let (input, _logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);

    let calls = factory.client.calls();
    assert_eq!(
        calls.last(),
        Some(&Call::RunFromPackage {
            function: "hello-func".into(),
            slot: String::new(),
            package_uri: "https://storage.example.com/releases/hello-1.2.0.zip".into(),
        })
    );
    assert!(!calls.iter().any(|call| matches!(call, Call::Kudu { .. })));
}

#[tokio::test]
async fn linux_premium_app_uses_kudu() {
    let factory = SpyFactory::new(SpyClient::new("functionapp,linux", "ElasticPremium"));
    let (input, _logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);
    assert!(matches!(factory.client.calls().last(), Some(Call::Kudu { .. })));
}

#[tokio::test]
async fn slot_from_stage_config_scopes_every_call() {
    let factory = SpyFactory::new(SpyClient::new("functionapp,linux", "Dynamic"));
    let (input, _logs) = sync_input(Some(manifest()), r#"{"slot": "staging"}"#);

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);

    let calls = factory.client.calls();
    assert!(calls.contains(&Call::Validate {
        function: "hello-func".into(),
        slots: vec!["staging".into()],
    }));
    assert!(calls.contains(&Call::Get {
        function: "hello-func".into(),
        slot: "staging".into(),
    }));
    assert!(matches!(
        calls.last(),
        Some(Call::RunFromPackage { slot, .. }) if slot == "staging"
    ));
}

#[tokio::test]
async fn empty_slot_name_targets_production() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard"));
    let (input, _logs) = sync_input(Some(manifest()), r#"{"slot": ""}"#);

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);
    assert!(factory.client.calls().contains(&Call::Validate {
        function: "hello-func".into(),
        slots: vec![],
    }));
}

#[tokio::test]
async fn arm_template_is_deployed_from_the_application_directory() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard"));
    let mut with_template = manifest();
    with_template.arm_template = Some(arm_template());
    let (input, _logs) = sync_input(Some(with_template), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;
    assert_eq!(status, StageStatus::Success);

    let calls = factory.client.calls();
    assert_eq!(
        calls[1],
        Call::DeployTemplate {
            resource_group: "rg-hello".into(),
            app_dir: PathBuf::from("/workspace/apps/hello"),
            deployment: "hello-infra".into(),
        }
    );
    assert!(matches!(calls[2], Call::Validate { .. }));
}

#[tokio::test]
async fn needs_creation_after_template_fails_without_package_deploy() {
    let mut client = SpyClient::new("functionapp,linux", "Dynamic");
    client.existence = Existence::NeedsCreation;
    let factory = SpyFactory::new(client);
    let mut with_template = manifest();
    with_template.arm_template = Some(arm_template());
    let (input, logs) = sync_input(Some(with_template), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    let calls = factory.client.calls();
    assert!(calls.iter().any(|call| matches!(call, Call::DeployTemplate { .. })));
    assert!(!calls.iter().any(|call| matches!(
        call,
        Call::Get { .. } | Call::RunFromPackage { .. } | Call::Kudu { .. }
    )));
    assert!(error_lines(&logs)[0].contains("even after deploying the ARM template"));
}

#[tokio::test]
async fn template_failure_stops_the_stage() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard").failing(Op::DeployTemplate));
    let mut with_template = manifest();
    with_template.arm_template = Some(arm_template());
    let (input, logs) = sync_input(Some(with_template), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert!(!factory
        .client
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Validate { .. })));
    assert!(error_lines(&logs)[0].contains("InvalidTemplate"));
}

#[tokio::test]
async fn needs_creation_without_template_fails_without_package_deploy() {
    let mut client = SpyClient::new("functionapp", "Standard");
    client.existence = Existence::NeedsCreation;
    let factory = SpyFactory::new(client);
    let (input, logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    let calls = factory.client.calls();
    assert!(!calls.iter().any(|call| matches!(call, Call::DeployTemplate { .. })));
    assert!(matches!(calls.last(), Some(Call::Validate { .. })));
    assert!(error_lines(&logs)[0].contains("no ARM template is declared"));
}

#[tokio::test]
async fn tagging_failure_stops_before_validation() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard").failing(Op::SetTags));
    let mut with_template = manifest();
    with_template.arm_template = Some(arm_template());
    let (input, logs) = sync_input(Some(with_template), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    let calls = factory.client.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::SetTags(_)));
    assert!(error_lines(&logs)[0].starts_with("Failed to set resource tags"));
}

#[tokio::test]
async fn validation_failure_stops_before_describe() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard").failing(Op::Validate));
    let (input, logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert!(!factory
        .client
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Get { .. })));
    assert!(error_lines(&logs)[0].starts_with("Failed to validate function app"));
}

#[tokio::test]
async fn describe_failure_skips_package_deploy() {
    let factory = SpyFactory::new(SpyClient::new("functionapp,linux", "Dynamic").failing(Op::Get));
    let (input, logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    let calls = factory.client.calls();
    assert!(matches!(calls.last(), Some(Call::Get { .. })));
    assert!(!calls.iter().any(|call| matches!(
        call,
        Call::RunFromPackage { .. } | Call::Kudu { .. }
    )));
    let errors = error_lines(&logs);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Failed to get function app hello-func"));
}

#[tokio::test]
async fn run_from_package_failure_fails_the_stage() {
    let factory = SpyFactory::new(
        SpyClient::new("functionapp,linux", "Dynamic").failing(Op::RunFromPackage),
    );
    let (input, logs) = sync_input(Some(manifest()), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Failure);
    assert!(matches!(
        factory.client.calls().last(),
        Some(Call::RunFromPackage { .. })
    ));
    let errors = error_lines(&logs);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("WEBSITE_RUN_FROM_PACKAGE"));
    assert!(errors[0].contains("Extract failed"));
    assert!(!logs
        .lines()
        .iter()
        .any(|line| line.level == LogLevel::Success));
}

#[tokio::test]
async fn kudu_failure_fails_the_stage() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard").failing(Op::Kudu));
    let (input, logs) = sync_input(Some(manifest()), r#"{"slot": "staging"}"#);

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert!(!status.is_success());
    assert!(matches!(
        factory.client.calls().last(),
        Some(Call::Kudu { slot, .. }) if slot == "staging"
    ));
    let errors = error_lines(&logs);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Failed to deploy hello-func with Kudu"));
}

#[tokio::test]
async fn bicep_template_is_not_deployed() {
    let factory = SpyFactory::new(SpyClient::new("functionapp", "Standard"));
    let mut with_bicep = manifest();
    with_bicep.bicep_template = Some(arm_template());
    let (input, _logs) = sync_input(Some(with_bicep), "");

    let status = execute_sync_stage(&factory, &input, &[target("prod")]).await;

    assert_eq!(status, StageStatus::Success);
    assert!(!factory
        .client
        .calls()
        .iter()
        .any(|call| matches!(call, Call::DeployTemplate { .. })));
}

#[tokio::test]
async fn plugin_rollback_stage_reports_success_without_remote_calls() {
    let factory = Arc::new(SpyFactory::new(SpyClient::new("functionapp", "Dynamic")));
    let plugin = AzurePlugin::new(factory.clone());
    let (input, _logs) = stage_input(Stage::Rollback.as_str(), Some(manifest()), "");

    let status = plugin.execute_stage(&input, &[target("prod")]).await.unwrap();

    assert_eq!(status, StageStatus::Success);
    assert_eq!(factory.connects(), 0);
}

#[tokio::test]
async fn plugin_swap_stage_is_unsupported() {
    let factory = Arc::new(SpyFactory::new(SpyClient::new("functionapp", "Dynamic")));
    let plugin = AzurePlugin::new(factory.clone());
    let (input, logs) = stage_input(
        Stage::Swap.as_str(),
        Some(manifest()),
        r#"{"slot1": "staging", "slot2": "production"}"#,
    );

    let status = plugin.execute_stage(&input, &[target("prod")]).await.unwrap();

    assert_eq!(status, StageStatus::Failure);
    assert_eq!(factory.connects(), 0);
    assert_eq!(error_lines(&logs).len(), 1);
}

#[tokio::test]
async fn plugin_dispatches_sync_stage() {
    let factory = Arc::new(SpyFactory::new(SpyClient::new("functionapp", "Dynamic")));
    let plugin = AzurePlugin::new(factory.clone());
    let (input, _logs) = stage_input(Stage::Sync.as_str(), Some(manifest()), "");

    let status = plugin.execute_stage(&input, &[target("prod")]).await.unwrap();

    assert_eq!(status, StageStatus::Success);
    assert_eq!(factory.connects(), 1);
}

#[tokio::test]
async fn plugin_rejects_unknown_stage() {
    let factory = Arc::new(SpyFactory::new(SpyClient::new("functionapp", "Dynamic")));
    let plugin = AzurePlugin::new(factory);
    let (input, _logs) = stage_input("K8S_SYNC", Some(manifest()), "");

    let result = plugin.execute_stage(&input, &[target("prod")]).await;

    assert!(matches!(result, Err(SdkError::UnknownStage(name)) if name == "K8S_SYNC"));
}
