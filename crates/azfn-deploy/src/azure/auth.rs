use serde::Deserialize;

use crate::config::CredentialSource;
use crate::error::{format_err_chain, DeployError};

/// A credential ready to produce a bearer token.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    AccessToken(String),
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

// Secrets stay out of logs and error messages.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::AccessToken(_) => f.write_str("AccessToken(..)"),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Turn a configured credential source into a concrete credential.
/// `lookup` reads environment variables.
pub fn resolve_credential(
    source: &CredentialSource,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credential, DeployError> {
    match source {
        CredentialSource::AccessToken { token } => Ok(Credential::AccessToken(token.clone())),
        CredentialSource::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => Ok(Credential::ClientSecret {
            tenant_id: tenant_id.clone(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        }),
        CredentialSource::Environment => {
            let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            if let Some(token) = non_empty("AZURE_ACCESS_TOKEN") {
                return Ok(Credential::AccessToken(token));
            }
            match (
                non_empty("AZURE_TENANT_ID"),
                non_empty("AZURE_CLIENT_ID"),
                non_empty("AZURE_CLIENT_SECRET"),
            ) {
                (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                    Ok(Credential::ClientSecret {
                        tenant_id,
                        client_id,
                        client_secret,
                    })
                }
                _ => Err(DeployError::Auth(
                    "no Azure credentials in environment: set AZURE_ACCESS_TOKEN or \
                     AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET"
                        .into(),
                )),
            }
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtain a bearer token for `management_endpoint`.
pub(crate) async fn acquire_token(
    http: &reqwest::Client,
    credential: &Credential,
    login_endpoint: &str,
    management_endpoint: &str,
) -> Result<String, DeployError> {
    let (tenant_id, client_id, client_secret) = match credential {
        Credential::AccessToken(token) => return Ok(token.clone()),
        Credential::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => (tenant_id, client_id, client_secret),
    };

    let url = format!("{login_endpoint}/{tenant_id}/oauth2/v2.0/token");
    let scope = format!("{}/.default", management_endpoint.trim_end_matches('/'));
    let response = http
        .post(&url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("scope", scope.as_str()),
        ])
        .send()
        .await
        .map_err(|e| DeployError::Auth(format_err_chain(&e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DeployError::Auth(format!("{status}: {body}")));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| DeployError::Auth(format_err_chain(&e)))?;
    tracing::debug!(tenant_id = %tenant_id, client_id = %client_id, "obtained management token");
    Ok(token.access_token)
}
