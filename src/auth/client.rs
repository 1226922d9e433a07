//! Client for the backend's authentication endpoints.
//!
//! Login and signup persist the returned session via the `SessionStore`;
//! refresh returns the new session and leaves persistence to the caller
//! (the API client owns that step inside its retry protocol).

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::ApiError;

use super::{Session, SessionStore};

/// HTTP request timeout in seconds, shared with the API client.
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the store is just a path handle.
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    base_url: String,
    store: SessionStore,
}

impl AuthClient {
    pub fn new(base_url: String, store: SessionStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_http(http, base_url, store))
    }

    /// Build an auth client sharing an existing connection pool.
    pub fn with_http(http: Client, base_url: String, store: SessionStore) -> Self {
        Self {
            http,
            base_url,
            store,
        }
    }

    /// Authenticate and persist the resulting session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .post_auth("/auth/login", &LoginRequest { email, password }, "Login failed")
            .await?;
        self.store.save(&session)?;
        info!("Login successful");
        Ok(session)
    }

    /// Create an account and persist the resulting session.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        let session = self
            .post_auth(
                "/auth/signup",
                &SignupRequest {
                    username,
                    email,
                    password,
                },
                "Signup failed",
            )
            .await?;
        self.store.save(&session)?;
        info!("Signup successful");
        Ok(session)
    }

    /// Request a new access token using the stored refresh state.
    ///
    /// The refresh token is presented as the bearer credential (access
    /// token as fallback for servers that reissue against it). Claims the
    /// refresh response does not restate are carried forward from the old
    /// session. The caller is responsible for persisting the result.
    pub async fn refresh(&self) -> Result<Session> {
        let current = self
            .store
            .current()
            .ok_or_else(|| ApiError::Unauthorized("no session to refresh".to_string()))?;

        let refresh_bearer = current
            .refresh_token
            .clone()
            .unwrap_or_else(|| current.access_token.clone());

        let url = format!("{}/auth/refresh", self.base_url);
        debug!(url = %url, "Refreshing access token");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&refresh_bearer)
            .send()
            .await
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(
                ApiError::from_status_with_fallback(status, &body, "Token refresh failed").into(),
            );
        }

        let mut refreshed: Session = response
            .json()
            .await
            .context("Failed to parse refresh response")?;

        // Carry forward state the refresh response leaves out
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = current.refresh_token;
        }
        if refreshed.user_id.is_none() {
            refreshed.user_id = current.user_id;
        }

        debug!("Access token refreshed");
        Ok(refreshed)
    }

    /// Clear the stored session. Does not contact the server.
    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }

    async fn post_auth<B: Serialize>(&self, path: &str, body: &B, generic: &str) -> Result<Session> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Sending auth request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status_with_fallback(status, &text, generic).into());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse auth response from {}", url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> (tempfile::TempDir, AuthClient) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().to_path_buf());
        let client = AuthClient::new(server.url(), store).expect("client");
        (dir, client)
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let mock = server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(serde_json::json!({
                "email": "ada@example.com",
                "password": "hunter2",
            })))
            .with_status(200)
            .with_body(r#"{"access_token": "tok", "refresh_token": "keep", "user_id": "7"}"#)
            .create_async()
            .await;

        let session = client.login("ada@example.com", "hunter2").await.unwrap();
        assert_eq!(session.access_token, "tok");
        assert_eq!(session.user_id.as_deref(), Some("7"));

        assert!(client.store.is_authenticated());
        assert_eq!(client.store.access_token().as_deref(), Some("tok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_server_message() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"error": "Invalid credentials"}"#)
            .create_async()
            .await;

        let err = client.login("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized(m)) if m == "Invalid credentials"
        ));
        assert!(!client.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_failure_without_payload_uses_generic_message() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let _mock = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body("<html>nope</html>")
            .create_async()
            .await;

        let err = client.login("ada@example.com", "pw").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized(m)) if m == "Login failed"
        ));
    }

    #[tokio::test]
    async fn test_signup_persists_session() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let mock = server
            .mock("POST", "/auth/signup")
            .match_body(Matcher::Json(serde_json::json!({
                "username": "ada",
                "email": "ada@example.com",
                "password": "hunter2",
            })))
            .with_status(201)
            .with_body(r#"{"access_token": "tok"}"#)
            .create_async()
            .await;

        client
            .signup("ada", "ada@example.com", "hunter2")
            .await
            .unwrap();
        assert!(client.store.is_authenticated());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_presents_refresh_token_and_carries_state_forward() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let mut session = Session::with_token("old");
        session.refresh_token = Some("r1".to_string());
        session.user_id = Some("7".to_string());
        client.store.save(&session).unwrap();

        let mock = server
            .mock("POST", "/auth/refresh")
            .match_header("authorization", "Bearer r1")
            .with_status(200)
            .with_body(r#"{"access_token": "new"}"#)
            .create_async()
            .await;

        let refreshed = client.refresh().await.unwrap();
        assert_eq!(refreshed.access_token, "new");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("r1"));
        assert_eq!(refreshed.user_id.as_deref(), Some("7"));

        // Persistence is the caller's job
        assert_eq!(client.store.access_token().as_deref(), Some("old"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_access_token() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);
        client.store.save(&Session::with_token("only")).unwrap();

        let mock = server
            .mock("POST", "/auth/refresh")
            .match_header("authorization", "Bearer only")
            .with_status(200)
            .with_body(r#"{"access_token": "new"}"#)
            .create_async()
            .await;

        let refreshed = client.refresh().await.unwrap();
        assert_eq!(refreshed.access_token, "new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_without_session_fails() {
        let server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let err = client.refresh().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_session_without_contacting_server() {
        let server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);
        client.store.save(&Session::with_token("tok")).unwrap();

        client.logout().unwrap();
        assert!(!client.store.is_authenticated());
    }
}
