use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::auth::AuthClient;
use crate::error::AppError;
use crate::models::Session;

/// Observes the auth collaborator and exposes "current session or none".
///
/// Holds the only persistent background subscription in the system; dropping
/// the tracker releases it. Until `init` resolves, the session is reported
/// as absent and `is_loading` as true.
pub struct SessionTracker {
    auth: Arc<dyn AuthClient>,
    rx: watch::Receiver<Option<Session>>,
    session: Option<Session>,
    loading: bool,
    initialized: bool,
}

impl SessionTracker {
    pub fn new(auth: Arc<dyn AuthClient>) -> Self {
        let rx = auth.subscribe();
        Self {
            auth,
            rx,
            session: None,
            loading: true,
            initialized: false,
        }
    }

    /// Queries the auth collaborator for the initial session. Runs the query
    /// exactly once per tracker lifetime; later calls return the tracked
    /// session without another round-trip.
    pub async fn init(&mut self) -> Result<Option<Session>, AppError> {
        if !self.initialized {
            self.initialized = true;
            let result = self.auth.get_session().await;
            self.loading = false;
            self.session = result?;
        }
        Ok(self.session.clone())
    }

    /// Waits for the next auth-state notification and returns the new
    /// session-or-none. The tracked session is replaced unconditionally.
    pub async fn changed(&mut self) -> Option<Session> {
        match self.rx.changed().await {
            Ok(()) => {
                self.session = self.rx.borrow_and_update().clone();
                debug!(present = self.session.is_some(), "auth state changed");
                self.session.clone()
            }
            // Subscription ended; no further transitions will arrive.
            Err(_) => std::future::pending().await,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
