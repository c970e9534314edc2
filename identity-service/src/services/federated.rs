//! Federated identity introspection (Google-style token sign-in).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::services::ServiceError;

/// Identity asserted by the external issuer.
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

#[async_trait]
pub trait FederatedIdentityProvider: Send + Sync {
    /// Verify an externally-issued identity token against the issuer.
    async fn introspect(&self, id_token: &str) -> Result<FederatedIdentity, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfoResponse {
    sub: String,
    email: String,
    #[serde(default)]
    email_verified: String,
    name: Option<String>,
    picture: Option<String>,
}

/// Google tokeninfo introspection client.
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: String,
}

impl GoogleIdentityProvider {
    pub fn new(tokeninfo_url: String, client_id: String) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build introspection client: {}", e))?;

        Ok(Self {
            client,
            tokeninfo_url,
            client_id,
        })
    }
}

#[async_trait]
impl FederatedIdentityProvider for GoogleIdentityProvider {
    async fn introspect(&self, id_token: &str) -> Result<FederatedIdentity, ServiceError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Identity introspection request failed");
                ServiceError::FederatedTokenInvalid
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::FederatedTokenInvalid);
        }

        #[derive(Deserialize)]
        struct WithAudience {
            #[serde(flatten)]
            info: TokenInfoResponse,
            aud: Option<String>,
        }

        let body: WithAudience = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed introspection response");
            ServiceError::FederatedTokenInvalid
        })?;

        // Token must have been minted for this application.
        if body.aud.as_deref() != Some(self.client_id.as_str()) {
            return Err(ServiceError::FederatedTokenInvalid);
        }

        Ok(FederatedIdentity {
            subject: body.info.sub,
            email: body.info.email,
            email_verified: body.info.email_verified == "true",
            name: body.info.name,
            picture_url: body.info.picture,
        })
    }
}

/// Scriptable provider for tests.
#[derive(Default)]
pub struct MockIdentityProvider {
    identities: std::sync::Mutex<std::collections::HashMap<String, FederatedIdentity>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_identity(&self, id_token: &str, identity: FederatedIdentity) {
        self.identities
            .lock()
            .unwrap()
            .insert(id_token.to_string(), identity);
    }
}

#[async_trait]
impl FederatedIdentityProvider for MockIdentityProvider {
    async fn introspect(&self, id_token: &str) -> Result<FederatedIdentity, ServiceError> {
        self.identities
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .ok_or(ServiceError::FederatedTokenInvalid)
    }
}
