use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Session;

use super::AuthClient;

struct Account {
    user_id: Uuid,
    password: String,
}

/// In-memory stand-in for the remote auth service. Backs local mode when no
/// remote is configured, and the tests.
pub struct LocalAuthClient {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<Session>>,
    tx: watch::Sender<Option<Session>>,
}

impl LocalAuthClient {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            tx,
        }
    }

    fn set_session(&self, session: Option<Session>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = session.clone();
        self.tx.send_replace(session);
    }

    fn issue_session(&self, user_id: Uuid, email: &str) -> Session {
        Session {
            access_token: format!("local-{}", Uuid::new_v4()),
            refresh_token: format!("local-{}", Uuid::new_v4()),
            user_id,
            email: email.to_string(),
        }
    }
}

impl Default for LocalAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthClient for LocalAuthClient {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let user_id = {
            let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
            match accounts.get(email) {
                Some(account) if account.password == password => account.user_id,
                _ => return Err(AppError::Auth("Invalid login credentials".to_string())),
            }
        };

        let session = self.issue_session(user_id, email);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user_id = {
            let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
            if accounts.contains_key(email) {
                return Err(AppError::Auth("User already registered".to_string()));
            }
            let user_id = Uuid::new_v4();
            accounts.insert(
                email.to_string(),
                Account {
                    user_id,
                    password: password.to_string(),
                },
            );
            user_id
        };

        // Sign-up yields a live session immediately, as the real service does.
        let session = self.issue_session(user_id, email);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.set_session(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let auth = LocalAuthClient::new();

        let signed_up = auth
            .sign_up("a@example.com", "secret")
            .await
            .expect("Failed to sign up");
        assert_eq!(signed_up.email, "a@example.com");

        auth.sign_out().await.expect("Failed to sign out");
        assert!(auth.get_session().await.expect("get_session").is_none());

        let signed_in = auth
            .sign_in_with_password("a@example.com", "secret")
            .await
            .expect("Failed to sign in");
        assert_eq!(signed_in.user_id, signed_up.user_id);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let auth = LocalAuthClient::new();
        auth.sign_up("a@example.com", "secret")
            .await
            .expect("Failed to sign up");

        let result = auth.sign_in_with_password("a@example.com", "wrong").await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_subscribe_sees_transitions() {
        let auth = LocalAuthClient::new();
        let mut rx = auth.subscribe();
        assert!(rx.borrow().is_none());

        auth.sign_up("a@example.com", "secret")
            .await
            .expect("Failed to sign up");
        rx.changed().await.expect("sender dropped");
        assert!(rx.borrow().is_some());

        auth.sign_out().await.expect("Failed to sign out");
        rx.changed().await.expect("sender dropped");
        assert!(rx.borrow().is_none());
    }
}
