//! Application state management for QueryDeck.
//!
//! This module contains the core `App` struct that manages all
//! application state: UI state, form contents, the session store glue,
//! and background task coordination for network calls.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::auth::{CredentialStore, Session, SessionStore};
use crate::config::Config;
use crate::models::{
    ConnectResponse, ConnectionDescriptor, ConnectionDetails, DbType, QueryRequest, QueryResponse,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Requests are one-shot per user action, so a small buffer suffices.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for email/username inputs.
const MAX_IDENTITY_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for connect form text fields.
const MAX_FIELD_LENGTH: usize = 128;

/// Maximum length for the query editor.
const MAX_QUERY_LENGTH: usize = 4000;

/// Number of result rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Query,
    Connect,
    Connections,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Query => "Query",
            Tab::Connect => "Connect",
            Tab::Connections => "Connections",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Query => Tab::Connect,
            Tab::Connect => Tab::Connections,
            Tab::Connections => Tab::Query,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Query => Tab::Connections,
            Tab::Connect => Tab::Query,
            Tab::Connections => Tab::Connect,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    SigningUp,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
    SignupLink,
}

/// Signup form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupFocus {
    Username,
    Email,
    Password,
    Button,
    LoginLink,
}

/// Connect form field focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectField {
    Host,
    Port,
    Username,
    Password,
    Database,
    DbType,
    Button,
}

impl ConnectField {
    pub fn next(&self) -> Self {
        match self {
            ConnectField::Host => ConnectField::Port,
            ConnectField::Port => ConnectField::Username,
            ConnectField::Username => ConnectField::Password,
            ConnectField::Password => ConnectField::Database,
            ConnectField::Database => ConnectField::DbType,
            ConnectField::DbType => ConnectField::Button,
            ConnectField::Button => ConnectField::Host,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ConnectField::Host => ConnectField::Button,
            ConnectField::Port => ConnectField::Host,
            ConnectField::Username => ConnectField::Port,
            ConnectField::Password => ConnectField::Username,
            ConnectField::Database => ConnectField::Password,
            ConnectField::DbType => ConnectField::Database,
            ConnectField::Button => ConnectField::DbType,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned network tasks back to the event loop.
enum TaskResult {
    LoggedIn(Session),
    LoginFailed(String),
    SignedUp(Session),
    SignupFailed(String),
    Connected(ConnectResponse),
    ConnectFailed(String),
    QueryFinished(QueryResponse),
    QueryFailed(String),
    Connections(Vec<ConnectionDescriptor>),
    ConnectionsFailed(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub store: SessionStore,
    pub api: ApiClient,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Signup form state
    pub signup_username: String,
    pub signup_email: String,
    pub signup_password: String,
    pub signup_focus: SignupFocus,
    pub signup_error: Option<String>,

    // Connect form state
    pub connect_host: String,
    pub connect_port: String,
    pub connect_username: String,
    pub connect_password: String,
    pub connect_database: String,
    pub connect_db_type: DbType,
    pub connect_field: ConnectField,
    pub connect_error: Option<String>,
    pub available_collections: Vec<String>,
    pub collections_selection: usize,

    // Query tab state
    pub query_text: String,
    pub query_db_type: DbType,
    pub query_editing: bool,
    pub query_error: Option<String>,
    pub query_response: Option<QueryResponse>,
    pub results_selection: usize,

    // Connections tab state
    pub connections: Vec<ConnectionDescriptor>,
    pub connections_selection: usize,
    pub connections_loaded: bool,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    // Status bar
    pub status_message: Option<String>,
    pub in_flight: usize,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let data_dir = Config::data_dir()?;
        let store = SessionStore::new(data_dir);
        let api = ApiClient::new(config.api_url(), store.clone())?;

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill credentials from env vars, config, and the keychain
        let login_email = std::env::var("QUERYDECK_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();

        let login_password = std::env::var("QUERYDECK_PASSWORD")
            .ok()
            .or_else(|| {
                if login_email.is_empty() {
                    None
                } else {
                    CredentialStore::get_password(&login_email).ok()
                }
            })
            .unwrap_or_default();

        let connect_db_type = DbType::MongoDb;

        Ok(Self {
            config,
            store,
            api,

            state: AppState::Normal,
            current_tab: Tab::Query,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            signup_username: String::new(),
            signup_email: String::new(),
            signup_password: String::new(),
            signup_focus: SignupFocus::Username,
            signup_error: None,

            connect_host: "localhost".to_string(),
            connect_port: connect_db_type.default_port().to_string(),
            connect_username: String::new(),
            connect_password: String::new(),
            connect_database: String::new(),
            connect_db_type,
            connect_field: ConnectField::Host,
            connect_error: None,
            available_collections: Vec::new(),
            collections_selection: 0,

            query_text: String::new(),
            query_db_type: DbType::MongoDb,
            query_editing: false,
            query_error: None,
            query_response: None,
            results_selection: 0,

            connections: Vec::new(),
            connections_selection: 0,
            connections_loaded: false,

            task_rx,
            task_tx,

            status_message: None,
            in_flight: 0,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Show the login overlay
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Show the signup overlay
    pub fn start_signup(&mut self) {
        self.state = AppState::SigningUp;
        self.signup_focus = SignupFocus::Username;
        self.signup_error = None;
    }

    /// Submit the login form on a background task
    pub fn submit_login(&mut self) {
        if self.login_email.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }
        self.login_error = None;
        self.begin_task("Signing in...");

        let auth = self.api.auth().clone();
        let email = self.login_email.clone();
        let password = self.login_password.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match auth.login(&email, &password).await {
                Ok(session) => TaskResult::LoggedIn(session),
                Err(e) => {
                    error!(error = %e, "Login failed");
                    TaskResult::LoginFailed(friendly_auth_error(&e))
                }
            };
            let _ = tx.send(result).await;
        });
    }

    /// Submit the signup form on a background task
    pub fn submit_signup(&mut self) {
        if self.signup_username.is_empty()
            || self.signup_email.is_empty()
            || self.signup_password.is_empty()
        {
            self.signup_error = Some("Username, email and password required".to_string());
            return;
        }
        self.signup_error = None;
        self.begin_task("Creating account...");

        let auth = self.api.auth().clone();
        let username = self.signup_username.clone();
        let email = self.signup_email.clone();
        let password = self.signup_password.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match auth.signup(&username, &email, &password).await {
                Ok(session) => TaskResult::SignedUp(session),
                Err(e) => {
                    error!(error = %e, "Signup failed");
                    TaskResult::SignupFailed(friendly_auth_error(&e))
                }
            };
            let _ = tx.send(result).await;
        });
    }

    /// Clear the session and return to the login overlay
    pub fn logout(&mut self) {
        if let Err(e) = self.api.auth().logout() {
            warn!(error = %e, "Failed to clear session");
        }
        self.query_response = None;
        self.available_collections.clear();
        self.connections.clear();
        self.connections_loaded = false;
        self.login_password.clear();
        self.status_message = Some("Logged out".to_string());
        self.start_login();
    }

    // =========================================================================
    // Domain Operations
    // =========================================================================

    /// Submit the connect form on a background task
    pub fn submit_connect(&mut self) {
        if self.connect_host.is_empty() || self.connect_database.is_empty() {
            self.connect_error = Some("Host and database required".to_string());
            return;
        }
        self.connect_error = None;
        self.begin_task("Connecting...");

        let details = ConnectionDetails {
            host: self.connect_host.clone(),
            port: self.connect_port.clone(),
            username: self.connect_username.clone(),
            password: self.connect_password.clone(),
            database: self.connect_database.clone(),
            db_type: self.connect_db_type,
        };
        let api = self.api.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match api.connect_database(&details).await {
                Ok(response) => TaskResult::Connected(response),
                Err(e) => TaskResult::ConnectFailed(e.to_string()),
            };
            let _ = tx.send(result).await;
        });
    }

    /// Execute the query in the editor on a background task
    pub fn submit_query(&mut self) {
        if self.query_text.trim().is_empty() {
            self.query_error = Some("Enter a query first".to_string());
            return;
        }
        self.query_error = None;
        self.begin_task("Executing query...");

        let request = QueryRequest {
            query: self.query_text.clone(),
            db_type: self.query_db_type,
        };
        let api = self.api.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match api.execute_query(&request).await {
                Ok(response) => TaskResult::QueryFinished(response),
                Err(e) => TaskResult::QueryFailed(e.to_string()),
            };
            let _ = tx.send(result).await;
        });
    }

    /// Fetch the saved connection descriptors on a background task
    pub fn load_connections(&mut self) {
        self.begin_task("Loading connections...");
        self.connections_loaded = true;

        let api = self.api.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match api.available_connections().await {
                Ok(connections) => TaskResult::Connections(connections),
                Err(e) => TaskResult::ConnectionsFailed(e.to_string()),
            };
            let _ = tx.send(result).await;
        });
    }

    // =========================================================================
    // Background Task Handling
    // =========================================================================

    fn begin_task(&mut self, message: &str) {
        self.in_flight += 1;
        self.status_message = Some(message.to_string());
    }

    fn finish_task(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.status_message = None;
        }
    }

    /// Drain completed background tasks into application state
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.finish_task();
            self.process_task_result(result);
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::LoggedIn(session) => {
                let email = self.login_email.clone();
                let password = self.login_password.clone();
                self.after_authenticated(&email, &password);
                info!(user_id = ?session.user_id, "Signed in");
                self.status_message = Some("Signed in".to_string());
            }
            TaskResult::LoginFailed(message) => {
                self.login_error = Some(message);
            }
            TaskResult::SignedUp(session) => {
                let email = self.signup_email.clone();
                let password = self.signup_password.clone();
                self.login_email = email.clone();
                self.after_authenticated(&email, &password);
                self.signup_password.clear();
                info!(user_id = ?session.user_id, "Account created");
                self.status_message = Some("Account created".to_string());
            }
            TaskResult::SignupFailed(message) => {
                self.signup_error = Some(message);
            }
            TaskResult::Connected(response) => {
                self.available_collections = response.available_collections;
                self.collections_selection = 0;
                let count = self.available_collections.len();
                self.status_message = Some(
                    response
                        .message
                        .unwrap_or_else(|| format!("Connected ({} collections)", count)),
                );
                // A new connection invalidates the cached descriptor list
                self.connections_loaded = false;
            }
            TaskResult::ConnectFailed(message) => {
                self.connect_error = Some(message);
            }
            TaskResult::QueryFinished(response) => {
                self.results_selection = 0;
                let count = response.results.len();
                self.query_response = Some(response);
                self.status_message = Some(format!("{} rows", count));
            }
            TaskResult::QueryFailed(message) => {
                self.query_error = Some(message);
            }
            TaskResult::Connections(connections) => {
                self.connections = connections;
                self.connections_selection = 0;
            }
            TaskResult::ConnectionsFailed(message) => {
                self.status_message = Some(message);
            }
        }

        // A failed refresh inside any request clears the session; drop the
        // user back to the login overlay when that happens.
        if self.state == AppState::Normal && !self.is_authenticated() {
            self.start_login();
            self.login_error
                .get_or_insert_with(|| "Session expired - please sign in again".to_string());
        }
    }

    /// Persist config and remember-me credentials after login/signup
    fn after_authenticated(&mut self, email: &str, password: &str) {
        if let Err(e) = CredentialStore::store(email, password) {
            warn!(error = %e, "Failed to store credentials");
        }

        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.login_password.clear();
        self.state = AppState::Normal;
    }
}

// ============================================================================
// Input Validation
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_identity_char(current_len: usize, c: char) -> bool {
    current_len < MAX_IDENTITY_LENGTH && is_valid_input_char(c)
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_query_char(current_len: usize, c: char) -> bool {
    current_len < MAX_QUERY_LENGTH && is_valid_input_char(c)
}

/// Map auth failures to user-facing form errors
fn friendly_auth_error(e: &anyhow::Error) -> String {
    let text = e.to_string();
    let lower = text.to_lowercase();
    if lower.contains("unauthorized") || lower.contains("invalid credentials") {
        "Invalid email or password".to_string()
    } else if lower.contains("timed out") || lower.contains("timeout") {
        "Connection timed out. Please try again.".to_string()
    } else if lower.contains("network") || lower.contains("connect") {
        "Unable to reach the server. Check your connection.".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_next_wraps() {
        assert_eq!(Tab::Query.next(), Tab::Connect);
        assert_eq!(Tab::Connect.next(), Tab::Connections);
        assert_eq!(Tab::Connections.next(), Tab::Query);
    }

    #[test]
    fn test_tab_prev_wraps() {
        assert_eq!(Tab::Query.prev(), Tab::Connections);
        assert_eq!(Tab::Connections.prev(), Tab::Connect);
        assert_eq!(Tab::Connect.prev(), Tab::Query);
    }

    #[test]
    fn test_connect_field_cycle_covers_all_fields() {
        let mut field = ConnectField::Host;
        let mut seen = 0;
        loop {
            field = field.next();
            seen += 1;
            if field == ConnectField::Host {
                break;
            }
        }
        assert_eq!(seen, 7);
    }

    #[test]
    fn test_connect_field_prev_inverts_next() {
        for field in [
            ConnectField::Host,
            ConnectField::Port,
            ConnectField::Username,
            ConnectField::Password,
            ConnectField::Database,
            ConnectField::DbType,
            ConnectField::Button,
        ] {
            assert_eq!(field.next().prev(), field);
        }
    }

    #[test]
    fn test_can_add_identity_char() {
        assert!(can_add_identity_char(0, 'a'));
        assert!(!can_add_identity_char(MAX_IDENTITY_LENGTH, 'a'));
        assert!(!can_add_identity_char(0, '\u{7}'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, '!'));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'x'));
    }

    #[test]
    fn test_friendly_auth_error_mapping() {
        let err = anyhow::anyhow!("Unauthorized: Invalid credentials");
        assert_eq!(friendly_auth_error(&err), "Invalid email or password");

        let err = anyhow::anyhow!("operation timed out");
        assert!(friendly_auth_error(&err).contains("timed out"));

        let err = anyhow::anyhow!("something else entirely");
        assert_eq!(friendly_auth_error(&err), "something else entirely");
    }
}
