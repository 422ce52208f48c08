pub mod dto;
pub mod local;

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tokio::sync::watch;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::Session;

pub use local::LocalAuthClient;

/// The remote authentication collaborator. Credential verification and
/// session issuance live entirely on the other side of this trait.
///
/// Auth-state transitions (login, logout, sign-up, token refresh) are
/// broadcast to every receiver obtained from `subscribe`; dropping the
/// receiver releases the subscription.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>, AppError>;
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError>;
    async fn sign_out(&self) -> Result<(), AppError>;
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// HTTP client for a GoTrue-style password-grant auth API.
pub struct HttpAuthClient {
    client: Client,
    config: AppConfig,
    current: Mutex<Option<Session>>,
    tx: watch::Sender<Option<Session>>,
}

impl HttpAuthClient {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        let (tx, _rx) = watch::channel(None);
        Ok(Self {
            client,
            config,
            current: Mutex::new(None),
            tx,
        })
    }

    fn set_session(&self, session: Option<Session>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = session.clone();
        self.tx.send_replace(session);
    }

    async fn token_request(
        &self,
        path: &str,
        body: impl serde::Serialize,
    ) -> Result<Session, AppError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        let token: dto::TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse auth response: {}", e)))?;

        Ok(Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email.unwrap_or_default(),
        })
    }

    /// Exchange a refresh token for a fresh session. Used to resume a
    /// persisted session on startup.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AppError> {
        let session = self
            .token_request(
                "/auth/v1/token?grant_type=refresh_token",
                dto::RefreshGrantRequest { refresh_token },
            )
            .await?;
        self.set_session(Some(session.clone()));
        Ok(session)
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if current.is_some() {
            return Ok(current);
        }

        // No live session yet; a persisted refresh token lets a restarted
        // process resume where it left off.
        match &self.config.refresh_token {
            Some(token) => {
                let token = token.clone();
                match self.refresh_session(&token).await {
                    Ok(session) => Ok(Some(session)),
                    Err(e) => {
                        tracing::warn!("session restore failed: {}", e);
                        Ok(None)
                    }
                }
            }
            None => Ok(None),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let session = self
            .token_request(
                "/auth/v1/token?grant_type=password",
                dto::PasswordGrantRequest { email, password },
            )
            .await?;
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let session = self
            .token_request("/auth/v1/signup", dto::PasswordGrantRequest { email, password })
            .await?;
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        if let Some(session) = current {
            let url = format!("{}/auth/v1/logout", self.config.base_url);
            let response = self
                .client
                .post(&url)
                .header("apikey", &self.config.anon_key)
                .header("Authorization", format!("Bearer {}", session.access_token))
                .send()
                .await
                .map_err(|e| AppError::Auth(e.to_string()))?;

            if !response.status().is_success() {
                return Err(auth_error(response).await);
            }
        }

        self.set_session(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

async fn auth_error(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ErrorBody>(&body)
        .ok()
        .and_then(dto::ErrorBody::into_message)
        .unwrap_or_else(|| format!("Auth request failed with status {}", status));
    AppError::Auth(message)
}
