/// Identity provider client: the single point of entry for all
/// authentication calls.
///
/// ARCHITECTURAL RULE: No other module may call the identity provider
/// directly. The provider is a GoTrue-compatible REST service (Supabase
/// Auth or self-hosted GoTrue); this service trusts the user id it returns
/// and stores no credentials or accounts locally.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the request (bad credentials, unverified
    /// account, expired token). Carries the provider's own message.
    #[error("identity provider rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// The subset of the provider's user object this service consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    pub email: Option<String>,
}

/// Session returned by a successful password grant.
#[derive(Debug, Deserialize)]
pub struct IdentitySession {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: IdentityUser,
}

/// Response to a signup. Providers with email confirmation enabled return
/// the pending user; autoconfirm deployments return a session instead, in
/// which case both fields deserialize as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignUpReceipt {
    pub id: Option<String>,
    pub confirmation_sent_at: Option<String>,
}

/// The identity provider client shared by all handlers.
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Registers a new account. `POST /signup`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpReceipt, IdentityError> {
        let response = self
            .client
            .post(format!("{}/signup", self.base_url))
            .header("apikey", &self.api_key)
            .json(&CredentialsRequest { email, password })
            .send()
            .await?;
        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }

    /// Exchanges credentials for a session. `POST /token?grant_type=password`.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, IdentityError> {
        let response = self
            .client
            .post(format!("{}/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&CredentialsRequest { email, password })
            .send()
            .await?;
        let response = reject_on_error(response).await?;
        let session: IdentitySession = response.json().await?;
        debug!("Password grant succeeded for user {}", session.user.id);
        Ok(session)
    }

    /// Resolves an access token to its user. `GET /user`.
    pub async fn user_from_token(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = reject_on_error(response).await?;
        Ok(response.json().await?)
    }

    /// Revokes the session behind `access_token`. `POST /logout`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        reject_on_error(response).await?;
        Ok(())
    }
}

/// Single attempt, no retries: a failed call is reported to the caller and
/// the user retries the action manually.
async fn reject_on_error(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IdentityError::Rejected {
        status: status.as_u16(),
        message: provider_message(&body),
    })
}

/// Pulls the human-readable message out of a provider error body.
/// GoTrue deployments vary: some use `error_description`, some `msg`,
/// some `error`.
fn provider_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error_description", "msg", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    if body.is_empty() {
        "request rejected".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_prefers_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(provider_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_provider_message_reads_msg_field() {
        let body = r#"{"code":400,"msg":"Email not confirmed"}"#;
        assert_eq!(provider_message(body), "Email not confirmed");
    }

    #[test]
    fn test_provider_message_falls_back_to_raw_body() {
        assert_eq!(provider_message("service unavailable"), "service unavailable");
        assert_eq!(provider_message(""), "request rejected");
    }

    #[test]
    fn test_signup_receipt_tolerates_autoconfirm_session_body() {
        // Autoconfirm deployments answer /signup with a session object.
        let body = r#"{"access_token":"abc","token_type":"bearer","user":{"id":"u1"}}"#;
        let receipt: SignUpReceipt = serde_json::from_str(body).unwrap();
        assert!(receipt.id.is_none());
        assert!(receipt.confirmation_sent_at.is_none());
    }

    #[test]
    fn test_signup_receipt_reads_pending_user() {
        let body = r#"{"id":"u1","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#;
        let receipt: SignUpReceipt = serde_json::from_str(body).unwrap();
        assert_eq!(receipt.id.as_deref(), Some("u1"));
        assert!(receipt.confirmation_sent_at.is_some());
    }
}
