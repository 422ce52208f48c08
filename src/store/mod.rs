pub mod dto;
pub mod memory;

use async_trait::async_trait;
use reqwest::{Client, Response};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Session, Task, UpdateTaskRequest};

pub use memory::MemoryTaskStore;

/// The remote relational store holding the authoritative `todos` rows.
///
/// Every call carries the session so the bearer token rides the request; row
/// access control is enforced entirely on the store side. An update or
/// delete that matches no visible row succeeds without effect.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks visible to the session's owner, newest first.
    async fn list(&self, session: &Session) -> Result<Vec<Task>, AppError>;
    async fn insert(&self, session: &Session, task: NewTaskRequest) -> Result<(), AppError>;
    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        changes: UpdateTaskRequest,
    ) -> Result<(), AppError>;
    async fn set_completed(
        &self,
        session: &Session,
        id: Uuid,
        completed: bool,
    ) -> Result<(), AppError>;
    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), AppError>;
}

/// HTTP client for a PostgREST-style row API over the `todos` table.
pub struct HttpTaskStore {
    client: Client,
    config: AppConfig,
}

impl HttpTaskStore {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/todos", self.config.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
    }

    async fn expect_success(&self, response: Response) -> Result<(), AppError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(store_error(response).await)
        }
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self, session: &Session) -> Result<Vec<Task>, AppError> {
        let url = format!(
            "{}?select=*&user_id=eq.{}&order=created_at.desc",
            self.table_url(),
            session.user_id
        );

        let response = self
            .authed(self.client.get(&url), session)
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(store_error(response).await);
        }

        response
            .json::<Vec<Task>>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to parse store response: {}", e)))
    }

    async fn insert(&self, session: &Session, task: NewTaskRequest) -> Result<(), AppError> {
        let response = self
            .authed(self.client.post(self.table_url()), session)
            .header("Prefer", "return=minimal")
            .json(&task)
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        self.expect_success(response).await
    }

    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        changes: UpdateTaskRequest,
    ) -> Result<(), AppError> {
        let url = format!("{}?id=eq.{}", self.table_url(), id);
        let response = self
            .authed(self.client.patch(&url), session)
            .header("Prefer", "return=minimal")
            .json(&changes)
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        self.expect_success(response).await
    }

    async fn set_completed(
        &self,
        session: &Session,
        id: Uuid,
        completed: bool,
    ) -> Result<(), AppError> {
        let url = format!("{}?id=eq.{}", self.table_url(), id);
        let response = self
            .authed(self.client.patch(&url), session)
            .header("Prefer", "return=minimal")
            .json(&dto::CompletedPatch { completed })
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        self.expect_success(response).await
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), AppError> {
        let url = format!("{}?id=eq.{}", self.table_url(), id);
        let response = self
            .authed(self.client.delete(&url), session)
            .send()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;

        self.expect_success(response).await
    }
}

async fn store_error(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| format!("Store request failed with status {}", status));
    AppError::Store(message)
}
