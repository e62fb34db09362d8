//! Login status checks against the backend
//!
//! Authentication itself is the backend's business; this module only asks
//! whether the cookie session is logged in and performs the logout call.

use crate::api::{ApiClient, ApiError, ApiResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Result of a login status check
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LoginStatus {
    pub is_logged_in: bool,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct UsernameReply {
    username: String,
}

#[derive(Debug, Deserialize)]
struct CsrfTokenReply {
    csrf_token: String,
}

/// Client for the session-cookie auth endpoints.
///
/// Shares the [`ApiClient`]'s HTTP client so the cookie session spans chat
/// and auth calls.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create an auth client sharing `api`'s cookie session.
    pub fn new(api: &ApiClient) -> Self {
        Self {
            client: api.http().clone(),
            base_url: api.base_url().to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        ApiClient::decode(response).await
    }

    /// Check whether the cookie session is logged in (and whether the user
    /// is an administrator).
    pub async fn check_login(&self) -> ApiResult<LoginStatus> {
        self.get_json("/check-login/").await
    }

    /// Fetch the logged-in user's name.
    pub async fn username(&self) -> ApiResult<String> {
        let reply: UsernameReply = self.get_json("/get-username/").await?;
        Ok(reply.username)
    }

    /// Fetch a CSRF token for state-changing auth calls.
    pub async fn csrf_token(&self) -> ApiResult<String> {
        let reply: CsrfTokenReply = self.get_json("/get-csrf-token/").await?;
        Ok(reply.csrf_token)
    }

    /// Log out the cookie session. Fetches a CSRF token first; logging out
    /// without one is refused by the backend.
    pub async fn logout(&self) -> ApiResult<()> {
        let token = self.csrf_token().await?;

        let url = format!("{}/logout/", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-CSRFToken", token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("user logged out");
        Ok(())
    }
}
