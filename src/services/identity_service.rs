// src/services/identity_service.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing;
use uuid::Uuid;

use crate::errors::CampusRideError as AppError;

/// Result of creating an account with the identity provider. The core
/// treats `uid` as an opaque string; `id_token` is only kept so the
/// identity can be deleted again if a later registration step fails.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthIdentity, AppError>;

    /// Compensating rollback for a failed registration: removes the
    /// identity created by [`create_identity`].
    ///
    /// [`create_identity`]: IdentityProvider::create_identity
    async fn delete_identity(&self, identity: &AuthIdentity) -> Result<(), AppError>;
}

pub struct FirebaseAuthClient {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(rename = "idToken")]
    id_token: String,
    email: String,
}

impl FirebaseAuthClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
        }
    }

    fn url(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.endpoint, action, self.api_key)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthIdentity, AppError> {
        tracing::info!("Creating auth identity for: {}", email);

        let response = self.client
            .post(self.url("signUp"))
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::NetworkConnection(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Identity creation failed: {}", error_text);
            return Err(AppError::IdentityProvider(error_text));
        }

        let signup: SignUpResponse = response.json().await
            .map_err(|e| AppError::IdentityProvider(e.to_string()))?;

        Ok(AuthIdentity {
            uid: signup.local_id,
            email: signup.email,
            id_token: signup.id_token,
        })
    }

    async fn delete_identity(&self, identity: &AuthIdentity) -> Result<(), AppError> {
        tracing::info!("Deleting auth identity: {}", identity.uid);

        let response = self.client
            .post(self.url("delete"))
            .json(&json!({ "idToken": identity.id_token }))
            .send()
            .await
            .map_err(|e| AppError::NetworkConnection(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::IdentityProvider(error_text));
        }
        Ok(())
    }
}

/// Mock provider for development and tests: hands out random uids and
/// remembers which identities were rolled back.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    deleted: std::sync::Mutex<Vec<String>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deleted_uids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_identity(&self, email: &str, _password: &str) -> Result<AuthIdentity, AppError> {
        let uid = Uuid::new_v4().to_string();
        tracing::info!("[MOCK] Created identity {} for {}", uid, email);
        Ok(AuthIdentity {
            uid: uid.clone(),
            email: email.to_string(),
            id_token: format!("mock-token-{uid}"),
        })
    }

    async fn delete_identity(&self, identity: &AuthIdentity) -> Result<(), AppError> {
        tracing::info!("[MOCK] Deleted identity {}", identity.uid);
        self.deleted.lock().unwrap().push(identity.uid.clone());
        Ok(())
    }
}
