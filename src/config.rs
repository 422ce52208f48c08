use std::env;

use crate::error::AppError;

/// Connection settings for the remote auth and store collaborators.
/// When `SUPABASE_URL` is unset the binary runs in local mode with
/// in-memory collaborators instead.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base_url: String,
    pub anon_key: String,
    pub refresh_token: Option<String>,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;
        let refresh_token = env::var("SUPABASE_REFRESH_TOKEN").ok();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            refresh_token,
        })
    }
}
