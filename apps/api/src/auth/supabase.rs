//! Supabase GoTrue client over REST.
//!
//! Every call authenticates with the service key, so admin endpoints and
//! password grants share one client.

use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Auth API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AlreadyRegistered => {
                AppError::Validation("User already registered".to_string())
            }
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid login credentials".to_string())
            }
            AuthError::Api { status, message } if (400..500).contains(&status) => {
                AppError::Validation(message)
            }
            other => AppError::AuthBackend(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user: AuthUser,
}

/// Sign-up answers with a bare user when confirmation is pending and with a
/// session when the project auto-confirms.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseAuth {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self::with_base_url(config.url.clone(), config.service_key.clone())
    }

    pub fn with_base_url(base_url: String, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, AuthError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await?;
        parse_response(response).await
    }

    /// Registers a user and triggers the confirmation e-mail with an OTP.
    pub async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<AuthUser, AuthError> {
        let response: SignUpResponse = self
            .post(
                "signup",
                json!({"email": email, "password": password, "data": metadata}),
            )
            .await?;
        Ok(match response {
            SignUpResponse::Session(session) => session.user,
            SignUpResponse::User(user) => user,
        })
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.post(
            "token?grant_type=password",
            json!({"email": email, "password": password}),
        )
        .await
        .map_err(|e| match e {
            AuthError::Api { status: 400, .. } => AuthError::InvalidCredentials,
            other => other,
        })
    }

    pub async fn verify_signup_otp(&self, email: &str, token: &str) -> Result<AuthSession, AuthError> {
        self.post(
            "verify",
            json!({"type": "signup", "email": email, "token": token}),
        )
        .await
    }

    /// Creates an already-confirmed user. Requires the service key.
    pub async fn admin_create_user(&self, email: &str, password: &str, metadata: Value) -> Result<AuthUser, AuthError> {
        self.post(
            "admin/users",
            json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": metadata
            }),
        )
        .await
    }

    /// Google sign-in URL using the PKCE code flow.
    pub fn google_authorize_url(&self, redirect_to: &str, code_challenge: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("provider", "google"),
                ("redirect_to", redirect_to),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "s256"),
            ],
        )
        .map_err(|e| AuthError::Api {
            status: 0,
            message: format!("Invalid auth URL: {e}"),
        })?;
        Ok(url.into())
    }

    pub async fn exchange_code(&self, auth_code: &str, code_verifier: &str) -> Result<AuthSession, AuthError> {
        self.post(
            "token?grant_type=pkce",
            json!({"auth_code": auth_code, "code_verifier": code_verifier}),
        )
        .await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let raw = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
    let message = body.message().unwrap_or(raw.as_str()).to_string();

    let already = matches!(
        body.error_code.as_deref(),
        Some("user_already_exists") | Some("email_exists")
    ) || message.contains("already registered");
    if already {
        return Err(AuthError::AlreadyRegistered);
    }

    warn!("Auth API returned {status}: {message}");
    Err(AuthError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const USER_ID: &str = "5b0c7f0e-8a7d-4c61-9d8c-1f1e2a3b4c5d";

    fn auth(server: &MockServer) -> SupabaseAuth {
        SupabaseAuth::with_base_url(server.base_url(), "service".to_string())
    }

    #[tokio::test]
    async fn test_sign_up_sends_metadata_and_keys() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/signup")
                .header("apikey", "service")
                .header("authorization", "Bearer service")
                .json_body(json!({
                    "email": "t@school.edu",
                    "password": "secret1",
                    "data": {"role": "teacher", "name": "Rao"}
                }));
            then.status(200)
                .json_body(json!({"id": USER_ID, "email": "t@school.edu"}));
        });

        let user = auth(&server)
            .sign_up("t@school.edu", "secret1", json!({"role": "teacher", "name": "Rao"}))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(user.id.to_string(), USER_ID);
    }

    #[tokio::test]
    async fn test_already_registered_is_distinguished() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/admin/users");
            then.status(422).json_body(json!({
                "code": 422,
                "error_code": "email_exists",
                "msg": "A user with this email address has already been registered"
            }));
        });

        let err = auth(&server)
            .admin_create_user("s@mit-university.edu", "pass123", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered));
    }

    #[tokio::test]
    async fn test_bad_password_maps_to_invalid_credentials() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "password");
            then.status(400).json_body(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            }));
        });

        let err = auth(&server)
            .sign_in_with_password("t@school.edu", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(matches!(AppError::from(err), AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_verify_otp_returns_session() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/verify")
                .json_body(json!({"type": "signup", "email": "s@x.edu", "token": "123456"}));
            then.status(200).json_body(json!({
                "access_token": "jwt",
                "user": {"id": USER_ID, "email": "s@x.edu"}
            }));
        });

        let session = auth(&server).verify_signup_otp("s@x.edu", "123456").await.unwrap();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.email.as_deref(), Some("s@x.edu"));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_verifier() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "pkce")
                .json_body(json!({"auth_code": "abc", "code_verifier": "ver"}));
            then.status(200).json_body(json!({
                "access_token": "jwt",
                "user": {"id": USER_ID, "email": "g@x.edu"}
            }));
        });

        auth(&server).exchange_code("abc", "ver").await.unwrap();
        mock.assert();
    }

    #[test]
    fn test_google_authorize_url() {
        let auth = SupabaseAuth::with_base_url("https://proj.supabase.co/".to_string(), "k".to_string());
        let url = auth
            .google_authorize_url("http://localhost:8080/api/v1/auth/callback?flow=f1", "chal")
            .unwrap();
        assert!(url.starts_with("https://proj.supabase.co/auth/v1/authorize?provider=google"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A8080%2Fapi%2Fv1%2Fauth%2Fcallback%3Fflow%3Df1"));
        assert!(url.contains("code_challenge=chal"));
        assert!(url.contains("code_challenge_method=s256"));
    }

    #[test]
    fn test_client_errors_become_validation() {
        let err = AuthError::Api {
            status: 403,
            message: "Token has expired or is invalid".to_string(),
        };
        assert!(matches!(AppError::from(err), AppError::Validation(m) if m.contains("expired")));
        let err = AuthError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(matches!(AppError::from(err), AppError::AuthBackend(_)));
    }
}
