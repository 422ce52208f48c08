use thiserror::Error;

/// Failure taxonomy. All variants surface identically to the user as the
/// single current-error text; only the message differs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}
