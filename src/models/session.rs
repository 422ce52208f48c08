use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated identity issued by the auth collaborator. Replaced
/// wholesale on every auth-state change, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub email: String,
}
