use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use shared_backend::BackendClient;
use shared_models::auth::Session;
use shared_prefs::{keys, PreferenceStore};

use crate::error::AuthError;
use crate::models::{LoginRequest, LoginResponse};
use crate::services::lockout::parse_lockout_message;

/// Login, session persistence and PIN verification against the remote
/// data service. One instance is shared by the whole application.
pub struct AuthService {
    backend: Arc<BackendClient>,
    prefs: Arc<dyn PreferenceStore>,
}

impl AuthService {
    pub fn new(backend: Arc<BackendClient>, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { backend, prefs }
    }

    /// Authenticate against the remote service and persist the session.
    /// Lockout counters in the server's error message are surfaced as
    /// structured errors so the caller can show remaining attempts.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AuthError> {
        info!("Logging in user {}", request.username);

        let body = json!({
            "username": request.username,
            "password": request.password,
            "database_name": request.database_name,
        });

        let response: LoginResponse = self
            .backend
            .request(Method::POST, "/api/login", None, Some(body))
            .await
            .map_err(|e| self.map_login_error(e))?;

        let session = Session {
            token: response.token,
            customer_id: response.customer_id,
            display_name: response.name,
            database_name: request.database_name,
            created_at: Some(Utc::now()),
        };

        self.persist_session(&session).await?;

        info!("Login succeeded for customer {}", session.customer_id);
        Ok(session)
    }

    fn map_login_error(&self, error: anyhow::Error) -> AuthError {
        let message = error.to_string();

        if let Some(lockout) = parse_lockout_message(&message) {
            warn!("Progressive lockout response: {}", lockout);
            return lockout;
        }

        if message.starts_with("Authentication error") {
            AuthError::InvalidCredentials
        } else {
            AuthError::Network(message)
        }
    }

    async fn persist_session(&self, session: &Session) -> Result<(), AuthError> {
        let name = session.display_name.clone().unwrap_or_default();
        self.prefs
            .multi_set(&[
                (keys::SESSION_TOKEN, &session.token),
                (keys::CUSTOMER_ID, &session.customer_id),
                (keys::PROFILE_NAME, &name),
                (keys::DATABASE_NAME, &session.database_name),
            ])
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// Rebuild a session from persisted keys, if one exists.
    pub async fn restore_session(&self) -> Result<Session, AuthError> {
        let token = self.get_pref(keys::SESSION_TOKEN).await?;
        let customer_id = self.get_pref(keys::CUSTOMER_ID).await?;

        match (token, customer_id) {
            (Some(token), Some(customer_id)) => {
                let display_name = self.get_pref(keys::PROFILE_NAME).await?.filter(|n| !n.is_empty());
                let database_name = self.get_pref(keys::DATABASE_NAME).await?.unwrap_or_default();
                debug!("Restored session for customer {}", customer_id);
                Ok(Session {
                    token,
                    customer_id,
                    display_name,
                    database_name,
                    created_at: None,
                })
            }
            _ => Err(AuthError::MissingSession),
        }
    }

    /// Local PIN check against the stored preference. No server round trip.
    pub async fn verify_pin(&self, entered: &str) -> Result<(), AuthError> {
        match self.get_pref(keys::STORED_PIN).await? {
            Some(stored) if stored == entered => Ok(()),
            Some(_) => Err(AuthError::PinMismatch),
            None => Err(AuthError::PinNotSet),
        }
    }

    pub async fn store_pin(&self, pin: &str) -> Result<(), AuthError> {
        self.prefs
            .set(keys::STORED_PIN, pin)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    pub async fn set_biometric_enabled(&self, enabled: bool) -> Result<(), AuthError> {
        self.prefs
            .set(keys::BIOMETRIC_ENABLED, if enabled { "true" } else { "false" })
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// Switch tenant database, remembering the previous selection.
    pub async fn select_tenant(&self, database_name: &str) -> Result<(), AuthError> {
        if let Some(current) = self.get_pref(keys::DATABASE_NAME).await? {
            if current != database_name {
                self.prefs
                    .set(keys::PREVIOUS_DATABASE_NAME, &current)
                    .await
                    .map_err(|e| AuthError::Storage(e.to_string()))?;
            }
        }

        info!("Selecting tenant database {}", database_name);
        self.prefs
            .set(keys::DATABASE_NAME, database_name)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// Clear session keys. Tenant selection, biometric preference and the
    /// stored PIN survive logout so the next login stays convenient.
    pub async fn logout(&self) -> Result<(), AuthError> {
        info!("Logging out");
        for key in [keys::SESSION_TOKEN, keys::CUSTOMER_ID, keys::PROFILE_NAME] {
            self.prefs
                .remove(key)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    async fn get_pref(&self, key: &str) -> Result<Option<String>, AuthError> {
        self.prefs
            .get(key)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }
}
