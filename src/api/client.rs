//! API client for the query backend.
//!
//! Every domain operation goes through `execute`, which attaches the
//! stored bearer token and runs the single-shot reauthentication
//! protocol: on a 401 whose payload reports an expired token, the
//! session is refreshed once and the original request resent once.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::{AuthClient, SessionStore};
use crate::models::{ConnectResponse, ConnectionDescriptor, ConnectionDetails, QueryRequest, QueryResponse};

use super::ApiError;

/// Per-request retry state. A request starts `Fresh`; the first
/// expired-token rejection moves it to `Retried`, after which any further
/// rejection is surfaced instead of triggering another refresh. This is
/// what prevents an infinite refresh loop against a server that keeps
/// rejecting newly issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryState {
    Fresh,
    Retried,
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the refresh gate is shared across clones so concurrent
/// requests still single-flight their refreshes.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: SessionStore,
    auth: AuthClient,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new API client. The session store is threaded through
    /// explicitly rather than living in ambient global state.
    pub fn new(base_url: String, store: SessionStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(
                crate::auth::client::REQUEST_TIMEOUT_SECS,
            ))
            .build()?;

        let auth = AuthClient::with_http(http.clone(), base_url.clone(), store.clone());

        Ok(Self {
            http,
            base_url,
            store,
            auth,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    /// The auth client sharing this client's connection pool and store.
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    // ===== Domain Operations =====

    /// Connect to a database and return the available collections/tables.
    pub async fn connect_database(&self, details: &ConnectionDetails) -> Result<ConnectResponse> {
        self.post("/database/connect", details).await
    }

    /// Execute a query, returning result rows and optimization details.
    pub async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.post("/query/execute", request).await
    }

    /// Fetch the saved connection descriptors for the current user.
    pub async fn available_connections(&self) -> Result<Vec<ConnectionDescriptor>> {
        self.get("/database/connections").await
    }

    // ===== Request Protocol =====

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Send a request with the reauthentication protocol described in the
    /// module docs. The loop runs at most twice: once `Fresh`, and once
    /// `Retried` after a successful refresh.
    async fn execute<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut state = RetryState::Fresh;

        loop {
            let token = self.store.access_token();

            let mut request = self.http.request(method.clone(), &url);
            if let Some(ref token) = token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(url = %url, retried = state == RetryState::Retried, authed = token.is_some(), "Sending request");

            let response = request.send().await.map_err(ApiError::Network)?;

            if response.status().is_success() {
                return response
                    .json()
                    .await
                    .with_context(|| format!("Failed to parse JSON response from {}", url));
            }

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let error = ApiError::from_status(status, &text);

            if error.is_auth_expired() && state == RetryState::Fresh {
                state = RetryState::Retried;
                self.refresh_session(token.as_deref()).await?;
                continue;
            }

            debug!(url = %url, status = %status, "Request failed");
            return Err(error.into());
        }
    }

    /// Refresh the stored session, single-flighting concurrent refreshes.
    ///
    /// `stale_token` is the token the failed request carried. If another
    /// request already rotated the stored token while this one waited on
    /// the gate, the refresh is skipped and the caller simply retries
    /// with whatever is now stored. A failed refresh clears the session
    /// (implicit logout) and surfaces the refresh error.
    async fn refresh_session(&self, stale_token: Option<&str>) -> Result<()> {
        let _guard = self.refresh_gate.lock().await;

        if self.store.access_token().as_deref() != stale_token {
            debug!("Token already rotated by a concurrent refresh");
            return Ok(());
        }

        match self.auth.refresh().await {
            Ok(session) => {
                self.store.save(&session)?;
                Ok(())
            }
            Err(refresh_err) => {
                warn!(error = %refresh_err, "Token refresh failed, clearing session");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear session after refresh failure");
                }
                Err(refresh_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use mockito::Matcher;

    const EXPIRED_BODY: &str = r#"{"msg": "Token has expired"}"#;

    fn client_for(server: &mockito::Server) -> (tempfile::TempDir, ApiClient) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().to_path_buf());
        let client = ApiClient::new(server.url(), store).expect("client");
        (dir, client)
    }

    fn seed_session(client: &ApiClient, access: &str, refresh: Option<&str>) {
        let mut session = Session::with_token(access);
        session.refresh_token = refresh.map(String::from);
        client.store.save(&session).unwrap();
    }

    #[tokio::test]
    async fn test_unauthenticated_request_sends_no_bearer() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);

        let mock = server
            .mock("GET", "/database/connections")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let connections = client.available_connections().await.unwrap();
        assert!(connections.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_and_request_retried_once() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);
        seed_session(&client, "stale", Some("keepalive"));

        let first = server
            .mock("POST", "/query/execute")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(EXPIRED_BODY)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .match_header("authorization", "Bearer keepalive")
            .with_status(200)
            .with_body(r#"{"access_token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        let retried = server
            .mock("POST", "/query/execute")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"results": [{"name": "ada"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let request = QueryRequest {
            query: "db.users.find()".to_string(),
            db_type: crate::models::DbType::MongoDb,
        };
        let response = client.execute_query(&request).await.unwrap();
        assert_eq!(response.results.len(), 1);

        first.assert_async().await;
        refresh.assert_async().await;
        retried.assert_async().await;

        // The rotated token is persisted and the refresh token carried over
        let stored = client.store.current().unwrap();
        assert_eq!(stored.access_token, "fresh");
        assert_eq!(stored.refresh_token.as_deref(), Some("keepalive"));
    }

    #[tokio::test]
    async fn test_refresh_failure_clears_session_and_surfaces_refresh_error() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);
        seed_session(&client, "stale", None);

        let op = server
            .mock("POST", "/database/connect")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(EXPIRED_BODY)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .with_body(r#"{"error": "refresh rejected"}"#)
            .expect(1)
            .create_async()
            .await;

        let details = ConnectionDetails {
            host: "localhost".to_string(),
            port: "27017".to_string(),
            username: String::new(),
            password: String::new(),
            database: "app".to_string(),
            db_type: crate::models::DbType::MongoDb,
        };
        let err = client.connect_database(&details).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized(m)) if m == "refresh rejected"
        ));

        // Implicit logout
        assert!(!client.store.is_authenticated());

        op.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_expiry_not_retried_twice() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);
        seed_session(&client, "stale", Some("keepalive"));

        let first = server
            .mock("POST", "/query/execute")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(EXPIRED_BODY)
            .expect(1)
            .create_async()
            .await;

        let refresh = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(r#"{"access_token": "fresh"}"#)
            .expect(1)
            .create_async()
            .await;

        // The server keeps rejecting even the freshly issued token
        let second = server
            .mock("POST", "/query/execute")
            .match_header("authorization", "Bearer fresh")
            .with_status(401)
            .with_body(EXPIRED_BODY)
            .expect(1)
            .create_async()
            .await;

        let request = QueryRequest {
            query: "SELECT 1".to_string(),
            db_type: crate::models::DbType::MySql,
        };
        let err = client.execute_query(&request).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::AuthExpired)
        ));

        first.assert_async().await;
        refresh.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_auth_failure_surfaced_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let (_dir, client) = client_for(&server);
        seed_session(&client, "valid", None);

        let op = server
            .mock("POST", "/database/connect")
            .with_status(400)
            .with_body(r#"{"error": "Unsupported database type"}"#)
            .expect(1)
            .create_async()
            .await;

        let details = ConnectionDetails {
            host: "localhost".to_string(),
            port: "3306".to_string(),
            username: "root".to_string(),
            password: String::new(),
            database: "app".to_string(),
            db_type: crate::models::DbType::MySql,
        };
        let err = client.connect_database(&details).await.unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::RequestFailed { status, message }) => {
                assert_eq!(*status, 400);
                assert_eq!(message, "Unsupported database type");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        op.assert_async().await;
        // Session untouched by a non-auth failure
        assert!(client.store.is_authenticated());
    }
}
