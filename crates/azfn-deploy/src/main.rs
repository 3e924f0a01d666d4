use std::sync::Arc;

use azfn_deploy::{AzureClientFactory, AzurePlugin, PluginSettings};
use azfn_sdk::transport::{serve, ServeOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // stdout carries the plugin protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let settings = PluginSettings::from_env()?;
    let options = ServeOptions {
        stage_timeout: settings.stage_timeout,
    };
    tracing::info!(
        management_endpoint = %settings.management_endpoint,
        stage_timeout_secs = settings.stage_timeout.as_secs(),
        "starting azure function plugin"
    );

    let plugin = AzurePlugin::new(Arc::new(AzureClientFactory::new(settings)?));
    serve(&plugin, tokio::io::stdin(), tokio::io::stdout(), &options).await?;

    Ok(())
}
